//! The [`ServerInfo`] struct, shared immutable-ish server state handed to
//! connections and services.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use uaserve_core::comms::url::url_matches_except_host;
use uaserve_types::{
    ApplicationDescription, ApplicationType, ByteString, DateTime, DecodingOptions,
    EndpointDescription, LocalizedText, MessageSecurityMode, ServerState, UAString,
    UserTokenPolicy,
};

use crate::{authenticator::AuthManager, config::ServerConfig};

/// URI of the UA-TCP binary transport profile.
pub const TRANSPORT_PROFILE_URI_BINARY: &str =
    "http://opcfoundation.org/UA-Profile/Transport/uatcp-uasc-uabinary";

/// A monotonically incrementing id allocator.
#[derive(Debug)]
pub struct AtomicHandle(AtomicU32);

impl AtomicHandle {
    /// Create a handle allocator starting at `start`.
    pub fn new(start: u32) -> Self {
        Self(AtomicU32::new(start))
    }

    /// The next id.
    pub fn next(&self) -> u32 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// Shared server state: configuration, identity, access control and the id
/// allocators used across connections.
pub struct ServerInfo {
    /// The server configuration, fixed after startup.
    pub config: Arc<ServerConfig>,
    /// The access control hook.
    pub authenticator: Arc<dyn AuthManager>,
    /// The application URI of this server instance.
    pub application_uri: UAString,
    /// The product URI.
    pub product_uri: UAString,
    /// The application name.
    pub application_name: LocalizedText,
    /// Wall clock time the server started.
    pub start_time: ArcSwap<DateTime>,
    /// The running state of the server.
    pub state: ArcSwap<ServerState>,
    /// Allocator for secure channel ids.
    pub secure_channel_id_handle: AtomicHandle,
    /// Allocator for channel token ids.
    pub token_id_handle: AtomicHandle,
    /// Allocator for subscription ids.
    pub subscription_id_handle: AtomicHandle,
    /// Allocator for monitored item ids.
    pub monitored_item_id_handle: AtomicHandle,
}

impl ServerInfo {
    /// Create the server info from a configuration and authenticator.
    pub fn new(config: Arc<ServerConfig>, authenticator: Arc<dyn AuthManager>) -> Self {
        Self {
            application_uri: UAString::from(&config.application_uri),
            product_uri: UAString::from(&config.product_uri),
            application_name: LocalizedText::new("", &config.application_name),
            config,
            authenticator,
            start_time: ArcSwap::new(Arc::new(DateTime::now())),
            state: ArcSwap::new(Arc::new(ServerState::Shutdown)),
            secure_channel_id_handle: AtomicHandle::new(1),
            token_id_handle: AtomicHandle::new(1),
            subscription_id_handle: AtomicHandle::new(1),
            monitored_item_id_handle: AtomicHandle::new(1),
        }
    }

    /// The decoding options matching the configured limits.
    pub fn decoding_options(&self) -> DecodingOptions {
        let limits = &self.config.limits;
        DecodingOptions {
            max_message_size: limits.max_message_size,
            max_chunk_count: limits.max_chunk_count,
            max_string_length: limits.max_string_length,
            max_byte_string_length: limits.max_byte_string_length,
            max_array_length: limits.max_array_length,
            ..Default::default()
        }
    }

    /// The application description of this server.
    pub fn application_description(&self) -> ApplicationDescription {
        ApplicationDescription {
            application_uri: self.application_uri.clone(),
            product_uri: self.product_uri.clone(),
            application_name: self.application_name.clone(),
            application_type: ApplicationType::Server,
            gateway_server_uri: UAString::null(),
            discovery_profile_uri: UAString::null(),
            discovery_urls: Some(vec![UAString::from(self.base_endpoint_url())]),
        }
    }

    /// The base endpoint url from the configuration.
    pub fn base_endpoint_url(&self) -> String {
        self.config.base_endpoint_url()
    }

    /// The endpoint descriptions the server advertises.
    pub fn endpoint_descriptions(&self) -> Vec<EndpointDescription> {
        let base = self.base_endpoint_url();
        self.config
            .endpoints
            .values()
            .map(|e| {
                let url = format!("{}{}", base, e.path.trim_end_matches('/'));
                let user_identity_tokens = e
                    .user_token_ids
                    .iter()
                    .map(|id| {
                        if id == crate::config::ANONYMOUS_USER_TOKEN_ID {
                            UserTokenPolicy::anonymous()
                        } else {
                            let mut policy = UserTokenPolicy::username();
                            policy.policy_id = UAString::from(id.as_str());
                            policy
                        }
                    })
                    .collect();
                EndpointDescription {
                    endpoint_url: UAString::from(url),
                    server: self.application_description(),
                    server_certificate: ByteString::null(),
                    security_mode: e.security_mode(),
                    security_policy_uri: UAString::from(e.security_policy().to_uri()),
                    user_identity_tokens: Some(user_identity_tokens),
                    transport_profile_uri: UAString::from(TRANSPORT_PROFILE_URI_BINARY),
                    security_level: if e.security_mode() == MessageSecurityMode::None {
                        0
                    } else {
                        1
                    },
                }
            })
            .collect()
    }

    /// Find the configured endpoint matching `endpoint_url`, ignoring the
    /// host part.
    pub fn find_endpoint(&self, endpoint_url: &str) -> Option<&crate::config::ServerEndpoint> {
        let base = self.base_endpoint_url();
        self.config.endpoints.values().find(|e| {
            let url = format!("{}{}", base, e.path.trim_end_matches('/'));
            url_matches_except_host(&url, endpoint_url)
        })
    }

    /// `true` if any configured endpoint matches `endpoint_url`, host
    /// ignored.
    pub fn endpoint_exists(&self, endpoint_url: &str) -> bool {
        self.find_endpoint(endpoint_url).is_some()
    }
}
