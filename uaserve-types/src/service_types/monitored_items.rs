//! Monitored item service set: CreateMonitoredItems, ModifyMonitoredItems,
//! SetMonitoringMode, DeleteMonitoredItems, and the monitoring filters.

use super::{
    DataChangeTrigger, DeadbandType, FilterOperator, MessageInfo, MonitoringMode,
    ReadValueId, TimestampsToReturn,
};
use crate::{
    attribute::AttributeId, diagnostic_info::DiagnosticInfo, extension_object::ExtensionObject,
    node_id::NodeId, node_ids::ObjectId, qualified_name::QualifiedName,
    request_header::RequestHeader, response_header::ResponseHeader, status_code::StatusCode,
    string::UAString,
};

#[allow(unused)]
mod uaserve {
    pub use crate as types;
}

/// A filter reporting data changes of a monitored attribute.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq)]
pub struct DataChangeFilter {
    /// Which parts of the data value trigger a notification.
    pub trigger: DataChangeTrigger,
    /// The kind of deadband, a [`DeadbandType`] value.
    pub deadband_type: u32,
    /// The deadband value, interpretation depends on the type.
    pub deadband_value: f64,
}

impl Default for DataChangeFilter {
    fn default() -> Self {
        DataChangeFilter {
            trigger: DataChangeTrigger::StatusValue,
            deadband_type: DeadbandType::None as u32,
            deadband_value: 0.0,
        }
    }
}

impl MessageInfo for DataChangeFilter {
    fn type_id(&self) -> ObjectId {
        ObjectId::DataChangeFilter_Encoding_DefaultBinary
    }
}

/// Selects one attribute of nodes of a type for an event field.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimpleAttributeOperand {
    /// The type the browse path starts at.
    pub type_definition_id: NodeId,
    /// Browse path from the type to the field.
    pub browse_path: Option<Vec<QualifiedName>>,
    /// The attribute of the resolved node, an [`AttributeId`] value.
    pub attribute_id: u32,
    /// Index range into an array valued attribute.
    pub index_range: UAString,
}

/// One element of an event where clause.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentFilterElement {
    /// The operator of the element.
    pub filter_operator: FilterOperator,
    /// The operands, each an operand extension object.
    pub filter_operands: Option<Vec<ExtensionObject>>,
}

/// An event where clause.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentFilter {
    /// The elements of the filter, a tree in prefix order.
    pub elements: Option<Vec<ContentFilterElement>>,
}

/// A filter selecting and restricting events.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventFilter {
    /// The event fields delivered with each notification.
    pub select_clauses: Option<Vec<SimpleAttributeOperand>>,
    /// Restriction on which events are reported.
    pub where_clause: ContentFilter,
}

impl MessageInfo for EventFilter {
    fn type_id(&self) -> ObjectId {
        ObjectId::EventFilter_Encoding_DefaultBinary
    }
}

/// Requested monitoring parameters for an item.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoringParameters {
    /// Client supplied handle returned in each notification.
    pub client_handle: u32,
    /// Requested sampling interval in milliseconds. -1 means the
    /// publishing interval of the subscription.
    pub sampling_interval: f64,
    /// The monitoring filter, a [`DataChangeFilter`] or [`EventFilter`].
    pub filter: ExtensionObject,
    /// Requested queue depth.
    pub queue_size: u32,
    /// Whether a full queue discards the oldest or the newest entry.
    pub discard_oldest: bool,
}

impl Default for MonitoringParameters {
    fn default() -> Self {
        MonitoringParameters {
            client_handle: 0,
            sampling_interval: -1.0,
            filter: ExtensionObject::null(),
            queue_size: 1,
            discard_oldest: true,
        }
    }
}

/// One monitored item to create.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonitoredItemCreateRequest {
    /// The node and attribute to monitor.
    pub item_to_monitor: ReadValueId,
    /// The initial monitoring mode.
    pub monitoring_mode: MonitoringMode,
    /// The requested parameters.
    pub requested_parameters: MonitoringParameters,
}

impl MonitoredItemCreateRequest {
    /// Create a request monitoring the Value attribute of `node_id`.
    pub fn new_value(
        node_id: NodeId,
        client_handle: u32,
        sampling_interval: f64,
        queue_size: u32,
    ) -> MonitoredItemCreateRequest {
        MonitoredItemCreateRequest {
            item_to_monitor: ReadValueId {
                node_id,
                attribute_id: AttributeId::Value as u32,
                index_range: UAString::null(),
                data_encoding: QualifiedName::null(),
            },
            monitoring_mode: MonitoringMode::Reporting,
            requested_parameters: MonitoringParameters {
                client_handle,
                sampling_interval,
                queue_size,
                ..Default::default()
            },
        }
    }
}

/// Result of creating one monitored item.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonitoredItemCreateResult {
    /// Status of the operation.
    pub status_code: StatusCode,
    /// The server assigned id of the item.
    pub monitored_item_id: u32,
    /// The granted sampling interval.
    pub revised_sampling_interval: f64,
    /// The granted queue depth.
    pub revised_queue_size: u32,
    /// The revised filter, when the server adjusted it.
    pub filter_result: ExtensionObject,
}

/// Create monitored items on a subscription.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateMonitoredItemsRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// The subscription to add the items to.
    pub subscription_id: u32,
    /// Which timestamps to include in notifications.
    pub timestamps_to_return: TimestampsToReturn,
    /// The items to create.
    pub items_to_create: Option<Vec<MonitoredItemCreateRequest>>,
}

impl MessageInfo for CreateMonitoredItemsRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::CreateMonitoredItemsRequest_Encoding_DefaultBinary
    }
}

/// Response to [`CreateMonitoredItemsRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateMonitoredItemsResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// One result per item, same order.
    pub results: Option<Vec<MonitoredItemCreateResult>>,
    /// Diagnostics per item, if requested.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

impl MessageInfo for CreateMonitoredItemsResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::CreateMonitoredItemsResponse_Encoding_DefaultBinary
    }
}

/// One monitored item to modify.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonitoredItemModifyRequest {
    /// The id of the item to modify.
    pub monitored_item_id: u32,
    /// The new parameters.
    pub requested_parameters: MonitoringParameters,
}

/// Result of modifying one monitored item.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonitoredItemModifyResult {
    /// Status of the operation.
    pub status_code: StatusCode,
    /// The granted sampling interval.
    pub revised_sampling_interval: f64,
    /// The granted queue depth.
    pub revised_queue_size: u32,
    /// The revised filter, when the server adjusted it.
    pub filter_result: ExtensionObject,
}

/// Modify monitored items of a subscription.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModifyMonitoredItemsRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// The subscription holding the items.
    pub subscription_id: u32,
    /// Which timestamps to include in notifications.
    pub timestamps_to_return: TimestampsToReturn,
    /// The modifications to apply.
    pub items_to_modify: Option<Vec<MonitoredItemModifyRequest>>,
}

impl MessageInfo for ModifyMonitoredItemsRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::ModifyMonitoredItemsRequest_Encoding_DefaultBinary
    }
}

/// Response to [`ModifyMonitoredItemsRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModifyMonitoredItemsResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// One result per item, same order.
    pub results: Option<Vec<MonitoredItemModifyResult>>,
    /// Diagnostics per item, if requested.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

impl MessageInfo for ModifyMonitoredItemsResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::ModifyMonitoredItemsResponse_Encoding_DefaultBinary
    }
}

/// Change the monitoring mode of items.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetMonitoringModeRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// The subscription holding the items.
    pub subscription_id: u32,
    /// The new monitoring mode.
    pub monitoring_mode: MonitoringMode,
    /// The ids of the items to change.
    pub monitored_item_ids: Option<Vec<u32>>,
}

impl MessageInfo for SetMonitoringModeRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::SetMonitoringModeRequest_Encoding_DefaultBinary
    }
}

/// Response to [`SetMonitoringModeRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetMonitoringModeResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// One status per item, same order.
    pub results: Option<Vec<StatusCode>>,
    /// Diagnostics per item, if requested.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

impl MessageInfo for SetMonitoringModeResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::SetMonitoringModeResponse_Encoding_DefaultBinary
    }
}

/// Delete monitored items from a subscription.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteMonitoredItemsRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// The subscription holding the items.
    pub subscription_id: u32,
    /// The ids of the items to delete.
    pub monitored_item_ids: Option<Vec<u32>>,
}

impl MessageInfo for DeleteMonitoredItemsRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::DeleteMonitoredItemsRequest_Encoding_DefaultBinary
    }
}

/// Response to [`DeleteMonitoredItemsRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteMonitoredItemsResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// One status per item, same order.
    pub results: Option<Vec<StatusCode>>,
    /// Diagnostics per item, if requested.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

impl MessageInfo for DeleteMonitoredItemsResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::DeleteMonitoredItemsResponse_Encoding_DefaultBinary
    }
}
