//! Structured types shared across service sets: application and endpoint
//! descriptions, identity tokens, signatures, server status.

use super::{ApplicationType, MessageInfo, MessageSecurityMode, ServerState, UserTokenType};
use crate::{
    byte_string::ByteString, date_time::DateTime, localized_text::LocalizedText,
    node_ids::ObjectId, string::UAString,
};

#[allow(unused)]
mod uaserve {
    pub use crate as types;
}

/// A digital signature over a block of data.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureData {
    /// URI of the algorithm used to create the signature.
    pub algorithm: UAString,
    /// The signature itself.
    pub signature: ByteString,
}

impl SignatureData {
    /// An empty signature, used on unsecured channels.
    pub fn null() -> SignatureData {
        SignatureData::default()
    }
}

/// A software certificate signed by a certificate authority.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignedSoftwareCertificate {
    /// The certificate data.
    pub certificate_data: ByteString,
    /// The signature over the certificate data.
    pub signature: ByteString,
}

/// Description of an OPC UA application.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApplicationDescription {
    /// Globally unique URI of the application instance.
    pub application_uri: UAString,
    /// URI of the product.
    pub product_uri: UAString,
    /// Human readable name of the application.
    pub application_name: LocalizedText,
    /// The kind of application.
    pub application_type: ApplicationType,
    /// URI of the gateway server, if any.
    pub gateway_server_uri: UAString,
    /// Discovery profile supported, if any.
    pub discovery_profile_uri: UAString,
    /// URLs where the application can be reached for discovery.
    pub discovery_urls: Option<Vec<UAString>>,
}

/// A user identity token policy advertised by an endpoint.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserTokenPolicy {
    /// Identifier for the policy, unique within the endpoint.
    pub policy_id: UAString,
    /// The kind of token the policy accepts.
    pub token_type: UserTokenType,
    /// The kind of token issued, for issued token policies.
    pub issued_token_type: UAString,
    /// Endpoint of the service issuing tokens, for issued token policies.
    pub issuer_endpoint_url: UAString,
    /// The security policy used to encrypt the token, if different from
    /// the channel's.
    pub security_policy_uri: UAString,
}

impl UserTokenPolicy {
    /// The policy accepting anonymous users.
    pub fn anonymous() -> UserTokenPolicy {
        UserTokenPolicy {
            policy_id: UAString::from("anonymous"),
            token_type: UserTokenType::Anonymous,
            ..Default::default()
        }
    }

    /// The policy accepting user name and password.
    pub fn username() -> UserTokenPolicy {
        UserTokenPolicy {
            policy_id: UAString::from("username"),
            token_type: UserTokenType::UserName,
            ..Default::default()
        }
    }
}

/// Description of one endpoint of a server.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EndpointDescription {
    /// The URL of the endpoint.
    pub endpoint_url: UAString,
    /// Description of the server the endpoint belongs to.
    pub server: ApplicationDescription,
    /// The application instance certificate of the server, DER encoded.
    pub server_certificate: ByteString,
    /// The message security mode.
    pub security_mode: MessageSecurityMode,
    /// URI of the security policy.
    pub security_policy_uri: UAString,
    /// The user identity token policies the endpoint accepts.
    pub user_identity_tokens: Option<Vec<UserTokenPolicy>>,
    /// URI of the transport profile.
    pub transport_profile_uri: UAString,
    /// Relative ranking the server assigns to the endpoint.
    pub security_level: u8,
}

/// An anonymous user identity token.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnonymousIdentityToken {
    /// The id of the policy the token conforms to.
    pub policy_id: UAString,
}

impl MessageInfo for AnonymousIdentityToken {
    fn type_id(&self) -> ObjectId {
        ObjectId::AnonymousIdentityToken_Encoding_DefaultBinary
    }
}

/// A user name and password identity token.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserNameIdentityToken {
    /// The id of the policy the token conforms to.
    pub policy_id: UAString,
    /// The user name.
    pub user_name: UAString,
    /// The password, possibly encrypted with the policy algorithm.
    pub password: ByteString,
    /// URI of the algorithm used to encrypt the password, null for none.
    pub encryption_algorithm: UAString,
}

impl MessageInfo for UserNameIdentityToken {
    fn type_id(&self) -> ObjectId {
        ObjectId::UserNameIdentityToken_Encoding_DefaultBinary
    }
}

/// An X509 certificate identity token.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct X509IdentityToken {
    /// The id of the policy the token conforms to.
    pub policy_id: UAString,
    /// The DER encoded certificate.
    pub certificate_data: ByteString,
}

impl MessageInfo for X509IdentityToken {
    fn type_id(&self) -> ObjectId {
        ObjectId::X509IdentityToken_Encoding_DefaultBinary
    }
}

/// Information about the software build of the server.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuildInfo {
    /// URI of the product.
    pub product_uri: UAString,
    /// Name of the manufacturer.
    pub manufacturer_name: UAString,
    /// Name of the product.
    pub product_name: UAString,
    /// The software version.
    pub software_version: UAString,
    /// The build number.
    pub build_number: UAString,
    /// The build date.
    pub build_date: DateTime,
}

impl MessageInfo for BuildInfo {
    fn type_id(&self) -> ObjectId {
        ObjectId::BuildInfo_Encoding_DefaultBinary
    }
}

/// The value of the ServerStatus variable.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServerStatusDataType {
    /// Time the server was started.
    pub start_time: DateTime,
    /// The current server time.
    pub current_time: DateTime,
    /// The running state of the server.
    pub state: ServerState,
    /// Information about the server build.
    pub build_info: BuildInfo,
    /// Seconds until the server shuts down, when shutting down.
    pub seconds_till_shutdown: u32,
    /// Reason for the shutdown, when shutting down.
    pub shutdown_reason: LocalizedText,
}

impl MessageInfo for ServerStatusDataType {
    fn type_id(&self) -> ObjectId {
        ObjectId::ServerStatusDataType_Encoding_DefaultBinary
    }
}
