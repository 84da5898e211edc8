#![warn(missing_docs)]

//! Umbrella crate for the uaserve OPC UA stack, re-exporting the member
//! crates under one roof:
//!
//! - [`types`]: built-in data types and the binary codec.
//! - [`core`]: UA-TCP framing, chunking and the secure channel.
//! - [`nodes`]: node class representations and the reference store.
//! - [`server`]: the server runtime.

pub use uaserve_core as core;
pub use uaserve_nodes as nodes;
pub use uaserve_server as server;
pub use uaserve_types as types;
