use serde::{Deserialize, Serialize};

/// Server wide limits.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct Limits {
    /// Max array length in elements.
    #[serde(default = "defaults::max_array_length")]
    pub max_array_length: usize,
    /// Max string length in bytes.
    #[serde(default = "defaults::max_string_length")]
    pub max_string_length: usize,
    /// Max bytestring length in bytes.
    #[serde(default = "defaults::max_byte_string_length")]
    pub max_byte_string_length: usize,
    /// Maximum message length in bytes.
    #[serde(default = "defaults::max_message_size")]
    pub max_message_size: usize,
    /// Maximum chunk count per message.
    #[serde(default = "defaults::max_chunk_count")]
    pub max_chunk_count: usize,
    /// Send buffer size in bytes.
    #[serde(default = "defaults::send_buffer_size")]
    pub send_buffer_size: usize,
    /// Receive buffer size in bytes.
    #[serde(default = "defaults::receive_buffer_size")]
    pub receive_buffer_size: usize,
    /// Maximum number of browse continuation points per session.
    #[serde(default = "defaults::max_browse_continuation_points")]
    pub max_browse_continuation_points: usize,
    /// Maximum number of open sessions before new ones are rejected.
    #[serde(default = "defaults::max_sessions")]
    pub max_sessions: usize,
    /// Maximum number of open secure channels.
    #[serde(default = "defaults::max_secure_channels")]
    pub max_secure_channels: usize,
    /// Maximum secure channel token lifetime in milliseconds.
    #[serde(default = "defaults::max_token_lifetime_ms")]
    pub max_token_lifetime_ms: u32,
    /// Maximum session timeout in milliseconds.
    #[serde(default = "defaults::max_session_timeout_ms")]
    pub max_session_timeout_ms: u64,
    /// Limits specific to subscriptions.
    #[serde(default)]
    pub subscriptions: SubscriptionLimits,
    /// Limits on individual service calls.
    #[serde(default)]
    pub operational: OperationalLimits,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_array_length: defaults::max_array_length(),
            max_string_length: defaults::max_string_length(),
            max_byte_string_length: defaults::max_byte_string_length(),
            max_message_size: defaults::max_message_size(),
            max_chunk_count: defaults::max_chunk_count(),
            send_buffer_size: defaults::send_buffer_size(),
            receive_buffer_size: defaults::receive_buffer_size(),
            max_browse_continuation_points: defaults::max_browse_continuation_points(),
            max_sessions: defaults::max_sessions(),
            max_secure_channels: defaults::max_secure_channels(),
            max_token_lifetime_ms: defaults::max_token_lifetime_ms(),
            max_session_timeout_ms: defaults::max_session_timeout_ms(),
            subscriptions: Default::default(),
            operational: Default::default(),
        }
    }
}

/// Subscription related limits.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionLimits {
    /// Maximum number of subscriptions per session.
    #[serde(default = "defaults::max_subscriptions_per_session")]
    pub max_subscriptions_per_session: usize,
    /// Maximum number of pending publish requests per session.
    #[serde(default = "defaults::max_pending_publish_requests")]
    pub max_pending_publish_requests: usize,
    /// Minimum publishing interval in milliseconds.
    #[serde(default = "defaults::min_publishing_interval_ms")]
    pub min_publishing_interval_ms: f64,
    /// Minimum sampling interval in milliseconds.
    #[serde(default = "defaults::min_sampling_interval_ms")]
    pub min_sampling_interval_ms: f64,
    /// Maximum value of the keep-alive count.
    #[serde(default = "defaults::max_keep_alive_count")]
    pub max_keep_alive_count: u32,
    /// Default keep-alive count, used when the client requests 0.
    #[serde(default = "defaults::default_keep_alive_count")]
    pub default_keep_alive_count: u32,
    /// Maximum lifetime count.
    #[serde(default = "defaults::max_lifetime_count")]
    pub max_lifetime_count: u32,
    /// Maximum number of monitored items per subscription.
    #[serde(default = "defaults::max_monitored_items_per_sub")]
    pub max_monitored_items_per_sub: usize,
    /// Maximum monitored item queue size.
    #[serde(default = "defaults::max_monitored_item_queue_size")]
    pub max_monitored_item_queue_size: usize,
    /// Maximum number of notifications per publish message, 0 for no
    /// limit.
    #[serde(default = "defaults::max_notifications_per_publish")]
    pub max_notifications_per_publish: usize,
    /// Number of notification messages retained per subscription for
    /// republishing; the oldest is overwritten beyond this.
    #[serde(default = "defaults::max_retransmission_queue_size")]
    pub max_retransmission_queue_size: usize,
}

impl Default for SubscriptionLimits {
    fn default() -> Self {
        Self {
            max_subscriptions_per_session: defaults::max_subscriptions_per_session(),
            max_pending_publish_requests: defaults::max_pending_publish_requests(),
            min_publishing_interval_ms: defaults::min_publishing_interval_ms(),
            min_sampling_interval_ms: defaults::min_sampling_interval_ms(),
            max_keep_alive_count: defaults::max_keep_alive_count(),
            default_keep_alive_count: defaults::default_keep_alive_count(),
            max_lifetime_count: defaults::max_lifetime_count(),
            max_monitored_items_per_sub: defaults::max_monitored_items_per_sub(),
            max_monitored_item_queue_size: defaults::max_monitored_item_queue_size(),
            max_notifications_per_publish: defaults::max_notifications_per_publish(),
            max_retransmission_queue_size: defaults::max_retransmission_queue_size(),
        }
    }
}

/// Limits on individual service calls. Exceeding one fails the call with
/// `BadTooManyOperations`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct OperationalLimits {
    /// Maximum number of nodes per Read call.
    #[serde(default = "defaults::max_nodes_per_operation")]
    pub max_nodes_per_read: usize,
    /// Maximum number of nodes per Write call.
    #[serde(default = "defaults::max_nodes_per_operation")]
    pub max_nodes_per_write: usize,
    /// Maximum number of nodes per Browse call.
    #[serde(default = "defaults::max_nodes_per_operation")]
    pub max_nodes_per_browse: usize,
    /// Maximum number of paths per TranslateBrowsePaths call.
    #[serde(default = "defaults::max_nodes_per_operation")]
    pub max_nodes_per_translate_browse_paths: usize,
    /// Maximum number of nodes per RegisterNodes call.
    #[serde(default = "defaults::max_nodes_per_operation")]
    pub max_nodes_per_register_nodes: usize,
    /// Maximum number of methods per Call call.
    #[serde(default = "defaults::max_nodes_per_operation")]
    pub max_nodes_per_method_call: usize,
    /// Maximum number of nodes per node management call.
    #[serde(default = "defaults::max_nodes_per_operation")]
    pub max_nodes_per_node_management: usize,
    /// Maximum number of references returned per browsed node, before a
    /// continuation point is issued.
    #[serde(default = "defaults::max_references_per_browse_node")]
    pub max_references_per_browse_node: usize,
    /// Maximum number of monitored items per call.
    #[serde(default = "defaults::max_nodes_per_operation")]
    pub max_monitored_items_per_call: usize,
}

impl Default for OperationalLimits {
    fn default() -> Self {
        Self {
            max_nodes_per_read: defaults::max_nodes_per_operation(),
            max_nodes_per_write: defaults::max_nodes_per_operation(),
            max_nodes_per_browse: defaults::max_nodes_per_operation(),
            max_nodes_per_translate_browse_paths: defaults::max_nodes_per_operation(),
            max_nodes_per_register_nodes: defaults::max_nodes_per_operation(),
            max_nodes_per_method_call: defaults::max_nodes_per_operation(),
            max_nodes_per_node_management: defaults::max_nodes_per_operation(),
            max_references_per_browse_node: defaults::max_references_per_browse_node(),
            max_monitored_items_per_call: defaults::max_nodes_per_operation(),
        }
    }
}

mod defaults {
    pub fn max_array_length() -> usize {
        65536
    }
    pub fn max_string_length() -> usize {
        65536
    }
    pub fn max_byte_string_length() -> usize {
        65536
    }
    pub fn max_message_size() -> usize {
        2 * 1024 * 1024
    }
    pub fn max_chunk_count() -> usize {
        64
    }
    pub fn send_buffer_size() -> usize {
        65536
    }
    pub fn receive_buffer_size() -> usize {
        65536
    }
    pub fn max_browse_continuation_points() -> usize {
        16
    }
    pub fn max_sessions() -> usize {
        100
    }
    pub fn max_secure_channels() -> usize {
        40
    }
    pub fn max_token_lifetime_ms() -> u32 {
        3_600_000
    }
    pub fn max_session_timeout_ms() -> u64 {
        60_000
    }
    pub fn max_subscriptions_per_session() -> usize {
        100
    }
    pub fn max_pending_publish_requests() -> usize {
        20
    }
    pub fn min_publishing_interval_ms() -> f64 {
        10.0
    }
    pub fn min_sampling_interval_ms() -> f64 {
        10.0
    }
    pub fn max_keep_alive_count() -> u32 {
        10_000
    }
    pub fn default_keep_alive_count() -> u32 {
        10
    }
    pub fn max_lifetime_count() -> u32 {
        30_000
    }
    pub fn max_monitored_items_per_sub() -> usize {
        1000
    }
    pub fn max_monitored_item_queue_size() -> usize {
        1000
    }
    pub fn max_notifications_per_publish() -> usize {
        1000
    }
    pub fn max_retransmission_queue_size() -> usize {
        32
    }
    pub fn max_nodes_per_operation() -> usize {
        1000
    }
    pub fn max_references_per_browse_node() -> usize {
        1000
    }
}
