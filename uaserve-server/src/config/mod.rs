//! Server configuration, loadable from YAML through the
//! [`uaserve_core::config::Config`] trait.

mod endpoint;
mod limits;

pub use endpoint::{ServerEndpoint, ServerUserToken, ANONYMOUS_USER_TOKEN_ID};
pub use limits::{Limits, OperationalLimits, SubscriptionLimits};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uaserve_core::config::Config;

/// TCP listener configuration.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct TcpConfig {
    /// The host the listener binds to.
    pub host: String,
    /// The port the listener binds to.
    pub port: u16,
    /// Seconds a new connection gets to send its hello before being
    /// dropped.
    #[serde(default = "default_hello_timeout")]
    pub hello_timeout: u32,
}

fn default_hello_timeout() -> u32 {
    5
}

impl Default for TcpConfig {
    fn default() -> Self {
        TcpConfig {
            host: "127.0.0.1".to_string(),
            port: 4840,
            hello_timeout: default_hello_timeout(),
        }
    }
}

/// The server configuration.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Human readable name of the application.
    pub application_name: String,
    /// Globally unique URI of this application instance. Also registered
    /// as namespace 1 of the address space.
    pub application_uri: String,
    /// URI of the product.
    #[serde(default)]
    pub product_uri: String,
    /// The TCP listener configuration.
    #[serde(default)]
    pub tcp_config: TcpConfig,
    /// Server wide limits.
    #[serde(default)]
    pub limits: Limits,
    /// The endpoints served, keyed by an arbitrary id.
    pub endpoints: BTreeMap<String, ServerEndpoint>,
    /// User/password credentials accepted, keyed by the ids referenced
    /// from endpoints.
    #[serde(default)]
    pub user_tokens: BTreeMap<String, ServerUserToken>,
    /// Locale ids the server responds with.
    #[serde(default)]
    pub locale_ids: Vec<String>,
    /// Interval in milliseconds between subscription processing ticks.
    #[serde(default = "default_subscription_poll_interval_ms")]
    pub subscription_poll_interval_ms: u64,
    /// Interval in milliseconds between channel and session cleanup scans.
    #[serde(default = "default_cleanup_interval_ms")]
    pub cleanup_interval_ms: u64,
    /// Default timeout in milliseconds for publish requests whose request
    /// header carries no timeout hint.
    #[serde(default = "default_publish_timeout_ms")]
    pub publish_timeout_default_ms: u64,
}

fn default_subscription_poll_interval_ms() -> u64 {
    10
}

fn default_cleanup_interval_ms() -> u64 {
    10_000
}

fn default_publish_timeout_ms() -> u64 {
    30_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        let mut endpoints = BTreeMap::new();
        endpoints.insert("none".to_string(), ServerEndpoint::new_none("/"));
        ServerConfig {
            application_name: "uaserve".to_string(),
            application_uri: "urn:uaserve".to_string(),
            product_uri: "urn:uaserve".to_string(),
            tcp_config: TcpConfig::default(),
            limits: Limits::default(),
            endpoints,
            user_tokens: BTreeMap::new(),
            locale_ids: vec!["en".to_string()],
            subscription_poll_interval_ms: default_subscription_poll_interval_ms(),
            cleanup_interval_ms: default_cleanup_interval_ms(),
            publish_timeout_default_ms: default_publish_timeout_ms(),
        }
    }
}

impl Config for ServerConfig {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.application_uri.is_empty() {
            errors.push("Application uri must not be empty".to_string());
        }
        if self.endpoints.is_empty() {
            errors.push("Server configuration defines no endpoints".to_string());
        }
        for (id, endpoint) in &self.endpoints {
            errors.extend(endpoint.validate(id));
            for token_id in &endpoint.user_token_ids {
                if token_id != ANONYMOUS_USER_TOKEN_ID && !self.user_tokens.contains_key(token_id)
                {
                    errors.push(format!(
                        "Endpoint {id} references unknown user token {token_id}"
                    ));
                }
            }
        }
        if self.limits.max_sessions == 0 {
            errors.push("Max sessions must be at least 1".to_string());
        }
        if self.limits.max_secure_channels == 0 {
            errors.push("Max secure channels must be at least 1".to_string());
        }
        errors
    }
}

impl ServerConfig {
    /// The base endpoint url of the server.
    pub fn base_endpoint_url(&self) -> String {
        format!(
            "opc.tcp://{}:{}",
            self.tcp_config.host, self.tcp_config.port
        )
    }
}

#[cfg(test)]
mod tests {
    use super::ServerConfig;
    use uaserve_core::config::Config;

    #[test]
    fn default_config_is_valid() {
        assert!(ServerConfig::default().validate().is_empty());
    }

    #[test]
    fn endpoint_with_unknown_token_rejected() {
        let mut config = ServerConfig::default();
        config
            .endpoints
            .get_mut("none")
            .unwrap()
            .user_token_ids
            .insert("nosuch".to_string());
        assert!(!config.validate().is_empty());
    }
}
