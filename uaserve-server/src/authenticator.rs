//! The [`AuthManager`] trait, the access control capability the core
//! consumes, and the default implementation backed by the configured user
//! tokens.

use std::collections::BTreeMap;
use std::fmt::Debug;

use async_trait::async_trait;
use log::debug;
use uaserve_nodes::AccessLevel;
use uaserve_types::{AttributeId, Error, NodeId, StatusCode};

use crate::config::{ServerEndpoint, ServerUserToken, ANONYMOUS_USER_TOKEN_ID};
use crate::identity_token::IdentityToken;

/// Debug-safe wrapper around a password.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Password").field(&"****").finish()
    }
}

impl Password {
    /// Create a new debug-safe password.
    pub fn new(password: String) -> Self {
        Self(password)
    }

    /// The inner value. Make sure not to log this.
    pub fn get(&self) -> &str {
        &self.0
    }
}

/// A unique identifier for a _user_. Distinct from a session: a user can
/// hold multiple sessions at once, and this is the value access decisions
/// key on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserToken(pub String);

impl UserToken {
    /// `true` if this is the shared anonymous user token.
    pub fn is_anonymous(&self) -> bool {
        self.0 == ANONYMOUS_USER_TOKEN_ID
    }
}

/// Access control for the server. Validates user identities when sessions
/// activate, gates reads, writes and method calls, and observes session
/// teardown.
#[allow(unused_variables)]
#[async_trait]
pub trait AuthManager: Send + Sync + 'static {
    /// Validate the identity presented by ActivateSession against
    /// `endpoint`, returning the user token the session will act as.
    async fn activate_session(
        &self,
        endpoint: &ServerEndpoint,
        identity: &IdentityToken,
    ) -> Result<UserToken, Error>;

    /// Whether `token` may read the given attribute of the node. The
    /// default allows reading anything the node itself permits.
    fn allow_read(
        &self,
        token: &UserToken,
        node_id: &NodeId,
        attribute_id: AttributeId,
        node_access: AccessLevel,
    ) -> bool {
        attribute_id != AttributeId::Value || node_access.contains(AccessLevel::CURRENT_READ)
    }

    /// Whether `token` may write the given attribute of the node. The
    /// default allows writing anything the node itself permits.
    fn allow_write(
        &self,
        token: &UserToken,
        node_id: &NodeId,
        attribute_id: AttributeId,
        node_access: AccessLevel,
    ) -> bool {
        attribute_id != AttributeId::Value || node_access.contains(AccessLevel::CURRENT_WRITE)
    }

    /// Whether `token` may call the given method. The default defers to
    /// the method's user executable flag.
    fn allow_call(&self, token: &UserToken, method_id: &NodeId, user_executable: bool) -> bool {
        user_executable
    }

    /// Called exactly once when a session is closed or expires.
    fn session_closed(&self, session_id: &NodeId) {}
}

/// The default access control: anonymous users when the endpoint allows
/// them, and user name/password pairs from the configuration.
pub struct DefaultAuthenticator {
    user_tokens: BTreeMap<String, ServerUserToken>,
}

impl DefaultAuthenticator {
    /// Create the default authenticator from the configured tokens.
    pub fn new(user_tokens: BTreeMap<String, ServerUserToken>) -> Self {
        Self { user_tokens }
    }
}

#[async_trait]
impl AuthManager for DefaultAuthenticator {
    async fn activate_session(
        &self,
        endpoint: &ServerEndpoint,
        identity: &IdentityToken,
    ) -> Result<UserToken, Error> {
        match identity {
            IdentityToken::Anonymous => {
                if !endpoint.supports_anonymous() {
                    return Err(Error::new(
                        StatusCode::BadIdentityTokenRejected,
                        format!("Endpoint \"{}\" does not support anonymous access", endpoint.path),
                    ));
                }
                Ok(UserToken(ANONYMOUS_USER_TOKEN_ID.to_string()))
            }
            IdentityToken::UserName(user, password) => {
                for token_id in &endpoint.user_token_ids {
                    let Some(server_token) = self.user_tokens.get(token_id) else {
                        continue;
                    };
                    if &server_token.user != user {
                        continue;
                    }
                    if server_token.pass.as_deref() == Some(password.get()) {
                        return Ok(UserToken(token_id.clone()));
                    }
                    debug!("Password mismatch for user {user}");
                    return Err(Error::new(
                        StatusCode::BadIdentityTokenRejected,
                        "Invalid credentials",
                    ));
                }
                Err(Error::new(
                    StatusCode::BadIdentityTokenRejected,
                    "Invalid credentials",
                ))
            }
            IdentityToken::X509(_) => Err(Error::new(
                StatusCode::BadIdentityTokenRejected,
                "X509 identity tokens are not supported by the default authenticator",
            )),
            IdentityToken::Invalid => Err(Error::new(
                StatusCode::BadIdentityTokenInvalid,
                "Identity token could not be interpreted",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthManager, DefaultAuthenticator, Password};
    use crate::config::{ServerEndpoint, ServerUserToken};
    use crate::identity_token::IdentityToken;
    use std::collections::BTreeMap;

    fn authenticator() -> DefaultAuthenticator {
        let mut tokens = BTreeMap::new();
        tokens.insert(
            "sample_user".to_string(),
            ServerUserToken {
                user: "sample".to_string(),
                pass: Some("sample1".to_string()),
            },
        );
        DefaultAuthenticator::new(tokens)
    }

    #[tokio::test]
    async fn anonymous_against_anonymous_endpoint() {
        let endpoint = ServerEndpoint::new_none("/");
        let token = authenticator()
            .activate_session(&endpoint, &IdentityToken::Anonymous)
            .await
            .unwrap();
        assert!(token.is_anonymous());
    }

    #[tokio::test]
    async fn username_checked_against_configuration() {
        let mut endpoint = ServerEndpoint::new_none("/");
        endpoint.user_token_ids.insert("sample_user".to_string());

        let auth = authenticator();
        let ok = auth
            .activate_session(
                &endpoint,
                &IdentityToken::UserName("sample".to_string(), Password::new("sample1".into())),
            )
            .await;
        assert!(ok.is_ok());

        let bad = auth
            .activate_session(
                &endpoint,
                &IdentityToken::UserName("sample".to_string(), Password::new("wrong".into())),
            )
            .await;
        assert!(bad.is_err());
    }
}
