//! The [`ServerBuilder`], assembling a server from configuration and
//! optional capability overrides.

use std::sync::Arc;

use crate::{
    authenticator::AuthManager,
    config::ServerConfig,
    server::{Server, ServerHandle},
};

/// Builder for a [`Server`].
pub struct ServerBuilder {
    pub(crate) config: ServerConfig,
    pub(crate) authenticator: Option<Arc<dyn AuthManager>>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    /// Start from the default configuration.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            authenticator: None,
        }
    }

    /// Start from an existing configuration.
    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            config,
            authenticator: None,
        }
    }

    /// The configuration being built.
    pub fn config(&mut self) -> &mut ServerConfig {
        &mut self.config
    }

    /// Set the application name and URI.
    pub fn application(mut self, name: &str, uri: &str) -> Self {
        self.config.application_name = name.to_string();
        self.config.application_uri = uri.to_string();
        self
    }

    /// Set the host and port to listen on.
    pub fn host_and_port(mut self, host: &str, port: u16) -> Self {
        self.config.tcp_config.host = host.to_string();
        self.config.tcp_config.port = port;
        self
    }

    /// Install a custom access control implementation.
    pub fn authenticator(mut self, authenticator: Arc<dyn AuthManager>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Build the server and its handle. Fails when the configuration is
    /// invalid.
    pub fn build(self) -> Result<(Server, ServerHandle), String> {
        Server::new_from_builder(self)
    }
}
