//! Subscription service set: CreateSubscription, ModifySubscription,
//! SetPublishingMode, Publish, Republish, DeleteSubscriptions, and the
//! notification types they carry.

use super::MessageInfo;
use crate::{
    data_value::DataValue, date_time::DateTime, diagnostic_info::DiagnosticInfo,
    extension_object::ExtensionObject, node_ids::ObjectId, request_header::RequestHeader,
    response_header::ResponseHeader, status_code::StatusCode, variant::Variant,
};

#[allow(unused)]
mod uaserve {
    pub use crate as types;
}

/// Create a subscription on the session.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSubscriptionRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// Requested publishing interval in milliseconds.
    pub requested_publishing_interval: f64,
    /// Publish cycles without client traffic before the subscription dies.
    pub requested_lifetime_count: u32,
    /// Publish cycles without notifications before a keep-alive is sent.
    pub requested_max_keep_alive_count: u32,
    /// Maximum notifications per publish response, 0 for no limit.
    pub max_notifications_per_publish: u32,
    /// Whether publishing starts enabled.
    pub publishing_enabled: bool,
    /// Relative priority against other subscriptions of the session.
    pub priority: u8,
}

impl Default for CreateSubscriptionRequest {
    fn default() -> Self {
        CreateSubscriptionRequest {
            request_header: RequestHeader::default(),
            requested_publishing_interval: 0.0,
            requested_lifetime_count: 0,
            requested_max_keep_alive_count: 0,
            max_notifications_per_publish: 0,
            publishing_enabled: true,
            priority: 0,
        }
    }
}

impl MessageInfo for CreateSubscriptionRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::CreateSubscriptionRequest_Encoding_DefaultBinary
    }
}

/// Response to [`CreateSubscriptionRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateSubscriptionResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// The server assigned subscription id.
    pub subscription_id: u32,
    /// The granted publishing interval.
    pub revised_publishing_interval: f64,
    /// The granted lifetime count.
    pub revised_lifetime_count: u32,
    /// The granted keep-alive count.
    pub revised_max_keep_alive_count: u32,
}

impl MessageInfo for CreateSubscriptionResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::CreateSubscriptionResponse_Encoding_DefaultBinary
    }
}

/// Modify an existing subscription.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModifySubscriptionRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// The subscription to modify.
    pub subscription_id: u32,
    /// Requested publishing interval in milliseconds.
    pub requested_publishing_interval: f64,
    /// Requested lifetime count.
    pub requested_lifetime_count: u32,
    /// Requested keep-alive count.
    pub requested_max_keep_alive_count: u32,
    /// Maximum notifications per publish response, 0 for no limit.
    pub max_notifications_per_publish: u32,
    /// Relative priority against other subscriptions of the session.
    pub priority: u8,
}

impl MessageInfo for ModifySubscriptionRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::ModifySubscriptionRequest_Encoding_DefaultBinary
    }
}

/// Response to [`ModifySubscriptionRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModifySubscriptionResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// The granted publishing interval.
    pub revised_publishing_interval: f64,
    /// The granted lifetime count.
    pub revised_lifetime_count: u32,
    /// The granted keep-alive count.
    pub revised_max_keep_alive_count: u32,
}

impl MessageInfo for ModifySubscriptionResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::ModifySubscriptionResponse_Encoding_DefaultBinary
    }
}

/// Enable or disable publishing on subscriptions.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPublishingModeRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// The new publishing enabled flag.
    pub publishing_enabled: bool,
    /// The subscriptions to change.
    pub subscription_ids: Option<Vec<u32>>,
}

impl MessageInfo for SetPublishingModeRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::SetPublishingModeRequest_Encoding_DefaultBinary
    }
}

/// Response to [`SetPublishingModeRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPublishingModeResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// One status per subscription, same order.
    pub results: Option<Vec<StatusCode>>,
    /// Diagnostics per subscription, if requested.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

impl MessageInfo for SetPublishingModeResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::SetPublishingModeResponse_Encoding_DefaultBinary
    }
}

/// Delete subscriptions and everything they own.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteSubscriptionsRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// The subscriptions to delete.
    pub subscription_ids: Option<Vec<u32>>,
}

impl MessageInfo for DeleteSubscriptionsRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::DeleteSubscriptionsRequest_Encoding_DefaultBinary
    }
}

/// Response to [`DeleteSubscriptionsRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteSubscriptionsResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// One status per subscription, same order.
    pub results: Option<Vec<StatusCode>>,
    /// Diagnostics per subscription, if requested.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

impl MessageInfo for DeleteSubscriptionsResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::DeleteSubscriptionsResponse_Encoding_DefaultBinary
    }
}

/// Acknowledges receipt of one notification message.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubscriptionAcknowledgement {
    /// The subscription the notification belonged to.
    pub subscription_id: u32,
    /// The sequence number being acknowledged.
    pub sequence_number: u32,
}

/// One value change reported by a monitored item.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonitoredItemNotification {
    /// The client handle of the monitored item.
    pub client_handle: u32,
    /// The changed value.
    pub value: DataValue,
}

/// A batch of data change notifications.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataChangeNotification {
    /// The changed values.
    pub monitored_items: Option<Vec<MonitoredItemNotification>>,
    /// Diagnostics per item, if requested.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

impl MessageInfo for DataChangeNotification {
    fn type_id(&self) -> ObjectId {
        ObjectId::DataChangeNotification_Encoding_DefaultBinary
    }
}

/// The fields of one reported event.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventFieldList {
    /// The client handle of the monitored item.
    pub client_handle: u32,
    /// The selected fields, in select clause order.
    pub event_fields: Option<Vec<Variant>>,
}

/// A batch of event notifications.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventNotificationList {
    /// The reported events.
    pub events: Option<Vec<EventFieldList>>,
}

impl MessageInfo for EventNotificationList {
    fn type_id(&self) -> ObjectId {
        ObjectId::EventNotificationList_Encoding_DefaultBinary
    }
}

/// Notifies the client of a change of the subscription state itself.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusChangeNotification {
    /// The new status of the subscription.
    pub status: StatusCode,
    /// Diagnostics, if requested.
    pub diagnostic_info: DiagnosticInfo,
}

impl MessageInfo for StatusChangeNotification {
    fn type_id(&self) -> ObjectId {
        ObjectId::StatusChangeNotification_Encoding_DefaultBinary
    }
}

/// One message produced by a subscription publish cycle.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NotificationMessage {
    /// Sequence number of the message, gap free per subscription.
    pub sequence_number: u32,
    /// The time the message was produced.
    pub publish_time: DateTime,
    /// The notifications: data change, event, or status change lists.
    pub notification_data: Option<Vec<ExtensionObject>>,
}

impl NotificationMessage {
    /// `true` if the message carries no notifications, i.e. a keep-alive.
    pub fn is_keep_alive(&self) -> bool {
        self.notification_data
            .as_ref()
            .map(|d| d.is_empty())
            .unwrap_or(true)
    }
}

/// Ask for the next notification message of any subscription of the
/// session. The response is delayed until a message or keep-alive is due.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PublishRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// Acknowledgements for messages received so far.
    pub subscription_acknowledgements: Option<Vec<SubscriptionAcknowledgement>>,
}

impl MessageInfo for PublishRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::PublishRequest_Encoding_DefaultBinary
    }
}

/// Response to [`PublishRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PublishResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// The subscription the notification message belongs to.
    pub subscription_id: u32,
    /// Sequence numbers of the messages still held for republishing.
    pub available_sequence_numbers: Option<Vec<u32>>,
    /// Whether more notifications are waiting beyond this message.
    pub more_notifications: bool,
    /// The notification message.
    pub notification_message: NotificationMessage,
    /// One status per acknowledgement in the request, same order.
    pub results: Option<Vec<StatusCode>>,
    /// Diagnostics per acknowledgement, if requested.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

impl MessageInfo for PublishResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::PublishResponse_Encoding_DefaultBinary
    }
}

/// Ask for a retained notification message to be transmitted again.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RepublishRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// The subscription the message belonged to.
    pub subscription_id: u32,
    /// The sequence number of the message to retransmit.
    pub retransmit_sequence_number: u32,
}

impl MessageInfo for RepublishRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::RepublishRequest_Encoding_DefaultBinary
    }
}

/// Response to [`RepublishRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RepublishResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// The retained notification message.
    pub notification_message: NotificationMessage,
}

impl MessageInfo for RepublishResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::RepublishResponse_Encoding_DefaultBinary
    }
}
