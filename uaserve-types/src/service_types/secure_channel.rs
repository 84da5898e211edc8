//! OpenSecureChannel and CloseSecureChannel service types.

use super::{MessageInfo, MessageSecurityMode, SecurityTokenRequestType};
use crate::{
    byte_string::ByteString, date_time::DateTime, node_ids::ObjectId,
    request_header::RequestHeader, response_header::ResponseHeader,
};

#[allow(unused)]
mod uaserve {
    pub use crate as types;
}

/// The security token issued for a secure channel.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelSecurityToken {
    /// The id of the secure channel the token belongs to.
    pub channel_id: u32,
    /// The id of the token.
    pub token_id: u32,
    /// When the token was created, server wall clock.
    pub created_at: DateTime,
    /// Lifetime of the token in milliseconds.
    pub revised_lifetime: u32,
}

/// Open or renew a secure channel.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OpenSecureChannelRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// The protocol version the client supports.
    pub client_protocol_version: u32,
    /// Whether to issue a new channel or renew an existing one.
    pub request_type: SecurityTokenRequestType,
    /// The requested message security mode.
    pub security_mode: MessageSecurityMode,
    /// Random nonce chosen by the client.
    pub client_nonce: ByteString,
    /// The requested token lifetime in milliseconds, 0 for the server
    /// maximum.
    pub requested_lifetime: u32,
}

impl MessageInfo for OpenSecureChannelRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::OpenSecureChannelRequest_Encoding_DefaultBinary
    }
}

/// Response to [`OpenSecureChannelRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OpenSecureChannelResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// The protocol version the server supports.
    pub server_protocol_version: u32,
    /// The issued security token.
    pub security_token: ChannelSecurityToken,
    /// Random nonce chosen by the server.
    pub server_nonce: ByteString,
}

impl MessageInfo for OpenSecureChannelResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::OpenSecureChannelResponse_Encoding_DefaultBinary
    }
}

/// Close a secure channel. The server does not reply.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CloseSecureChannelRequest {
    /// Common request header.
    pub request_header: RequestHeader,
}

impl MessageInfo for CloseSecureChannelRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::CloseSecureChannelRequest_Encoding_DefaultBinary
    }
}

/// Response to [`CloseSecureChannelRequest`]. Never actually sent, defined
/// for completeness of the message table.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CloseSecureChannelResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
}

impl MessageInfo for CloseSecureChannelResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::CloseSecureChannelResponse_Encoding_DefaultBinary
    }
}
