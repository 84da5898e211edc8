use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uaserve_core::comms::security_policy::SecurityPolicy;
use uaserve_types::MessageSecurityMode;

/// The id of the user token granting anonymous access.
pub const ANONYMOUS_USER_TOKEN_ID: &str = "anonymous";

/// One endpoint the server serves, keyed by an id in the configuration.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct ServerEndpoint {
    /// The path of the endpoint relative to the base url, e.g. "/".
    pub path: String,
    /// Name of the security policy, e.g. "None".
    pub security_policy: String,
    /// Name of the security mode, e.g. "None".
    pub security_mode: String,
    /// The ids of the user tokens accepted on this endpoint.
    #[serde(default)]
    pub user_token_ids: BTreeSet<String>,
}

impl ServerEndpoint {
    /// An unsecured endpoint at `path` for anonymous users.
    pub fn new_none(path: &str) -> ServerEndpoint {
        ServerEndpoint {
            path: path.to_string(),
            security_policy: SecurityPolicy::None.name().to_string(),
            security_mode: "None".to_string(),
            user_token_ids: [ANONYMOUS_USER_TOKEN_ID.to_string()].into_iter().collect(),
        }
    }

    /// The parsed security policy of the endpoint.
    pub fn security_policy(&self) -> SecurityPolicy {
        match self.security_policy.as_str() {
            "None" => SecurityPolicy::None,
            "Basic256Sha256" => SecurityPolicy::Basic256Sha256,
            "Aes128-Sha256-RsaOaep" => SecurityPolicy::Aes128Sha256RsaOaep,
            "Aes256-Sha256-RsaPss" => SecurityPolicy::Aes256Sha256RsaPss,
            _ => SecurityPolicy::Unknown,
        }
    }

    /// The parsed security mode of the endpoint.
    pub fn security_mode(&self) -> MessageSecurityMode {
        match self.security_mode.as_str() {
            "None" => MessageSecurityMode::None,
            "Sign" => MessageSecurityMode::Sign,
            "SignAndEncrypt" => MessageSecurityMode::SignAndEncrypt,
            _ => MessageSecurityMode::Invalid,
        }
    }

    /// Whether the endpoint accepts anonymous users.
    pub fn supports_anonymous(&self) -> bool {
        self.user_token_ids.contains(ANONYMOUS_USER_TOKEN_ID)
    }

    /// Validation errors of this endpoint, if any.
    pub fn validate(&self, id: &str) -> Vec<String> {
        let mut errors = Vec::new();
        if self.security_policy() == SecurityPolicy::Unknown {
            errors.push(format!(
                "Endpoint {id} has an unrecognized security policy {}",
                self.security_policy
            ));
        }
        if self.security_mode() == MessageSecurityMode::Invalid {
            errors.push(format!(
                "Endpoint {id} has an unrecognized security mode {}",
                self.security_mode
            ));
        }
        if (self.security_policy() == SecurityPolicy::None)
            != (self.security_mode() == MessageSecurityMode::None)
        {
            errors.push(format!(
                "Endpoint {id} mixes policy {} with mode {}",
                self.security_policy, self.security_mode
            ));
        }
        if self.user_token_ids.is_empty() {
            errors.push(format!("Endpoint {id} has no user token policies"));
        }
        errors
    }
}

/// A user/password credential the server accepts, keyed by an id in the
/// configuration.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct ServerUserToken {
    /// The user name.
    pub user: String,
    /// The password, in plain text. Real deployments hook an authenticator
    /// instead of listing credentials in configuration.
    #[serde(default)]
    pub pass: Option<String>,
}
