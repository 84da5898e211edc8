//! Everything between the socket and a decoded service message: UA-TCP
//! framing, chunk assembly, and the secure channel.

pub mod buffer;
pub mod chunker;
pub mod message_chunk;
pub mod message_chunk_info;
pub mod secure_channel;
pub mod security_header;
pub mod security_policy;
pub mod tcp_codec;
pub mod tcp_types;
pub mod url;
