//! Session service set: CreateSession, ActivateSession, CloseSession,
//! Cancel.

use super::{ApplicationDescription, EndpointDescription, MessageInfo, SignatureData,
    SignedSoftwareCertificate};
use crate::{
    byte_string::ByteString, diagnostic_info::DiagnosticInfo,
    extension_object::ExtensionObject, node_id::NodeId, node_ids::ObjectId,
    request_header::RequestHeader, response_header::ResponseHeader, status_code::StatusCode,
    string::UAString,
};

#[allow(unused)]
mod uaserve {
    pub use crate as types;
}

/// Create a new, unactivated session.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateSessionRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// Description of the client application.
    pub client_description: ApplicationDescription,
    /// URI of the server the client expects to talk to.
    pub server_uri: UAString,
    /// The endpoint URL the client connected to.
    pub endpoint_url: UAString,
    /// Human readable session name.
    pub session_name: UAString,
    /// Random nonce chosen by the client.
    pub client_nonce: ByteString,
    /// The client application instance certificate.
    pub client_certificate: ByteString,
    /// The requested session timeout in milliseconds.
    pub requested_session_timeout: f64,
    /// The largest response message the client accepts, 0 for no limit.
    pub max_response_message_size: u32,
}

impl MessageInfo for CreateSessionRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::CreateSessionRequest_Encoding_DefaultBinary
    }
}

/// Response to [`CreateSessionRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateSessionResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// The id of the new session.
    pub session_id: NodeId,
    /// The secret token identifying the session in request headers.
    pub authentication_token: NodeId,
    /// The granted session timeout in milliseconds.
    pub revised_session_timeout: f64,
    /// Random nonce chosen by the server.
    pub server_nonce: ByteString,
    /// The server application instance certificate.
    pub server_certificate: ByteString,
    /// The endpoints the server serves, for client verification.
    pub server_endpoints: Option<Vec<EndpointDescription>>,
    /// Obsolete, always empty.
    pub server_software_certificates: Option<Vec<SignedSoftwareCertificate>>,
    /// Server signature over client nonce and certificate.
    pub server_signature: SignatureData,
    /// The largest request message the server accepts, 0 for no limit.
    pub max_request_message_size: u32,
}

impl MessageInfo for CreateSessionResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::CreateSessionResponse_Encoding_DefaultBinary
    }
}

/// Activate a session, proving the user identity.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActivateSessionRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// Client signature over server nonce and certificate.
    pub client_signature: SignatureData,
    /// Obsolete, always empty.
    pub client_software_certificates: Option<Vec<SignedSoftwareCertificate>>,
    /// The locales the client prefers, in priority order.
    pub locale_ids: Option<Vec<UAString>>,
    /// The user identity token, one of the advertised token types.
    pub user_identity_token: ExtensionObject,
    /// Signature with the user token, for token types that sign.
    pub user_token_signature: SignatureData,
}

impl MessageInfo for ActivateSessionRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::ActivateSessionRequest_Encoding_DefaultBinary
    }
}

/// Response to [`ActivateSessionRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActivateSessionResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// A fresh server nonce for the next activation.
    pub server_nonce: ByteString,
    /// Results for the software certificates, unused.
    pub results: Option<Vec<StatusCode>>,
    /// Diagnostics for the results, unused.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

impl MessageInfo for ActivateSessionResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::ActivateSessionResponse_Encoding_DefaultBinary
    }
}

/// Close a session.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CloseSessionRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// Whether to delete the subscriptions owned by the session.
    pub delete_subscriptions: bool,
}

impl MessageInfo for CloseSessionRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::CloseSessionRequest_Encoding_DefaultBinary
    }
}

/// Response to [`CloseSessionRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CloseSessionResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
}

impl MessageInfo for CloseSessionResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::CloseSessionResponse_Encoding_DefaultBinary
    }
}

/// Cancel outstanding requests with a given request handle.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CancelRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// The handle of the requests to cancel.
    pub request_handle: u32,
}

impl MessageInfo for CancelRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::CancelRequest_Encoding_DefaultBinary
    }
}

/// Response to [`CancelRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CancelResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// The number of requests that were cancelled.
    pub cancel_count: u32,
}

impl MessageInfo for CancelResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::CancelResponse_Encoding_DefaultBinary
    }
}
