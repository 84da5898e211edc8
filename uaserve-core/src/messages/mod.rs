//! The [`RequestMessage`] and [`ResponseMessage`] enums and the traits
//! connecting them to the chunker.

use std::io::Read;

use uaserve_types::{BinaryEncodable, EncodingResult, NodeId, ObjectId};

mod request;
mod response;

pub use request::RequestMessage;
pub use response::ResponseMessage;

use crate::comms::message_chunk::MessageChunkType;

/// Trait implemented by messages, mapping them to their chunk type.
pub trait MessageType {
    /// The chunk type this message travels in: MSG, OPN or CLO.
    fn message_type(&self) -> MessageChunkType;
}

/// Trait implemented by the request and response message enums.
pub trait Message: BinaryEncodable + MessageType {
    /// The request handle from the message header.
    fn request_handle(&self) -> u32;

    /// Decode the message identified by `object_id` from the stream.
    fn decode_by_object_id<S: Read>(
        stream: &mut S,
        object_id: ObjectId,
        ctx: &uaserve_types::Context<'_>,
    ) -> EncodingResult<Self>
    where
        Self: Sized;

    /// The node id of the binary encoding of the message.
    fn type_id(&self) -> NodeId;
}
