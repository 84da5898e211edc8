//! The [`RequestHeader`] carried by every service request.

use crate::{
    date_time::DateTime, extension_object::ExtensionObject, node_id::NodeId, string::UAString,
};

#[allow(unused)]
mod uaserve {
    pub use crate as types;
}

/// The header passed with every service request.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestHeader {
    /// The secret session authentication token issued by CreateSession.
    pub authentication_token: NodeId,
    /// The time the client sent the request.
    pub timestamp: DateTime,
    /// Client assigned identifier returned in the response header.
    pub request_handle: u32,
    /// Bit mask of requested diagnostics, 0 for none.
    pub return_diagnostics: u32,
    /// Identifier that links the request to an audit event.
    pub audit_entry_id: UAString,
    /// How long the client is prepared to wait, in milliseconds. 0 means
    /// the client did not specify a timeout.
    pub timeout_hint: u32,
    /// Reserved for additional header fields.
    pub additional_header: ExtensionObject,
}

impl RequestHeader {
    /// Create a request header for the given token and handle, stamped now.
    pub fn new(
        authentication_token: impl Into<NodeId>,
        request_handle: u32,
    ) -> RequestHeader {
        RequestHeader {
            authentication_token: authentication_token.into(),
            timestamp: DateTime::now(),
            request_handle,
            return_diagnostics: 0,
            audit_entry_id: UAString::null(),
            timeout_hint: 0,
            additional_header: ExtensionObject::null(),
        }
    }
}
