//! The server side of the UA-TCP transport.

pub mod tcp;
