#![warn(missing_docs)]

//! Core plumbing shared by anything speaking UA-TCP: message framing and
//! chunking, the secure channel state machine, the request/response message
//! enums, and the configuration trait.

pub mod comms;
pub mod config;
pub mod messages;

pub use messages::{Message, MessageType, RequestMessage, ResponseMessage};

/// Current version of the UA-TCP protocol spoken by this stack.
pub const PROTOCOL_VERSION: u32 = 0;
