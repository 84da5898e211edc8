//! Node management service set: AddNodes, AddReferences, DeleteNodes,
//! DeleteReferences, and the node attribute structures they carry.

use super::MessageInfo;
use crate::{
    diagnostic_info::DiagnosticInfo, expanded_node_id::ExpandedNodeId,
    extension_object::ExtensionObject, localized_text::LocalizedText, node_id::NodeId,
    node_ids::ObjectId, qualified_name::QualifiedName, request_header::RequestHeader,
    response_header::ResponseHeader, status_code::StatusCode, string::UAString,
    variant::Variant,
};

#[allow(unused)]
mod uaserve {
    pub use crate as types;
}

bitflags::bitflags! {
    /// Which fields of a node attributes structure carry a value.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct AttributesMask: u32 {
        /// AccessLevel is set.
        const ACCESS_LEVEL = 1;
        /// ArrayDimensions is set.
        const ARRAY_DIMENSIONS = 1 << 1;
        /// ContainsNoLoops is set.
        const CONTAINS_NO_LOOPS = 1 << 3;
        /// DataType is set.
        const DATA_TYPE = 1 << 4;
        /// Description is set.
        const DESCRIPTION = 1 << 5;
        /// DisplayName is set.
        const DISPLAY_NAME = 1 << 6;
        /// EventNotifier is set.
        const EVENT_NOTIFIER = 1 << 7;
        /// Executable is set.
        const EXECUTABLE = 1 << 8;
        /// Historizing is set.
        const HISTORIZING = 1 << 9;
        /// InverseName is set.
        const INVERSE_NAME = 1 << 10;
        /// IsAbstract is set.
        const IS_ABSTRACT = 1 << 11;
        /// MinimumSamplingInterval is set.
        const MINIMUM_SAMPLING_INTERVAL = 1 << 12;
        /// Symmetric is set.
        const SYMMETRIC = 1 << 15;
        /// UserAccessLevel is set.
        const USER_ACCESS_LEVEL = 1 << 16;
        /// UserExecutable is set.
        const USER_EXECUTABLE = 1 << 17;
        /// UserWriteMask is set.
        const USER_WRITE_MASK = 1 << 18;
        /// ValueRank is set.
        const VALUE_RANK = 1 << 19;
        /// WriteMask is set.
        const WRITE_MASK = 1 << 20;
        /// Value is set.
        const VALUE = 1 << 21;
    }
}

/// Attributes for a new object node.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectAttributes {
    /// Mask of fields that carry a value.
    pub specified_attributes: u32,
    /// Display name.
    pub display_name: LocalizedText,
    /// Description.
    pub description: LocalizedText,
    /// Write mask.
    pub write_mask: u32,
    /// User write mask.
    pub user_write_mask: u32,
    /// Event notifier byte.
    pub event_notifier: u8,
}

impl MessageInfo for ObjectAttributes {
    fn type_id(&self) -> ObjectId {
        ObjectId::ObjectAttributes_Encoding_DefaultBinary
    }
}

/// Attributes for a new variable node.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariableAttributes {
    /// Mask of fields that carry a value.
    pub specified_attributes: u32,
    /// Display name.
    pub display_name: LocalizedText,
    /// Description.
    pub description: LocalizedText,
    /// Write mask.
    pub write_mask: u32,
    /// User write mask.
    pub user_write_mask: u32,
    /// Initial value.
    pub value: Variant,
    /// Data type of the value.
    pub data_type: NodeId,
    /// Value rank.
    pub value_rank: i32,
    /// Array dimensions, when the rank requires them.
    pub array_dimensions: Option<Vec<u32>>,
    /// Access level byte.
    pub access_level: u8,
    /// User access level byte.
    pub user_access_level: u8,
    /// Minimum sampling interval in milliseconds.
    pub minimum_sampling_interval: f64,
    /// Whether the variable is historized.
    pub historizing: bool,
}

impl MessageInfo for VariableAttributes {
    fn type_id(&self) -> ObjectId {
        ObjectId::VariableAttributes_Encoding_DefaultBinary
    }
}

/// Attributes for a new method node.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MethodAttributes {
    /// Mask of fields that carry a value.
    pub specified_attributes: u32,
    /// Display name.
    pub display_name: LocalizedText,
    /// Description.
    pub description: LocalizedText,
    /// Write mask.
    pub write_mask: u32,
    /// User write mask.
    pub user_write_mask: u32,
    /// Whether the method may be called at all.
    pub executable: bool,
    /// Whether the current user may call the method.
    pub user_executable: bool,
}

impl MessageInfo for MethodAttributes {
    fn type_id(&self) -> ObjectId {
        ObjectId::MethodAttributes_Encoding_DefaultBinary
    }
}

/// Attributes for a new object type node.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectTypeAttributes {
    /// Mask of fields that carry a value.
    pub specified_attributes: u32,
    /// Display name.
    pub display_name: LocalizedText,
    /// Description.
    pub description: LocalizedText,
    /// Write mask.
    pub write_mask: u32,
    /// User write mask.
    pub user_write_mask: u32,
    /// Whether the type is abstract.
    pub is_abstract: bool,
}

impl MessageInfo for ObjectTypeAttributes {
    fn type_id(&self) -> ObjectId {
        ObjectId::ObjectTypeAttributes_Encoding_DefaultBinary
    }
}

/// Attributes for a new variable type node.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariableTypeAttributes {
    /// Mask of fields that carry a value.
    pub specified_attributes: u32,
    /// Display name.
    pub display_name: LocalizedText,
    /// Description.
    pub description: LocalizedText,
    /// Write mask.
    pub write_mask: u32,
    /// User write mask.
    pub user_write_mask: u32,
    /// Default value for instances.
    pub value: Variant,
    /// Data type of the value.
    pub data_type: NodeId,
    /// Value rank.
    pub value_rank: i32,
    /// Array dimensions, when the rank requires them.
    pub array_dimensions: Option<Vec<u32>>,
    /// Whether the type is abstract.
    pub is_abstract: bool,
}

impl MessageInfo for VariableTypeAttributes {
    fn type_id(&self) -> ObjectId {
        ObjectId::VariableTypeAttributes_Encoding_DefaultBinary
    }
}

/// Attributes for a new reference type node.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferenceTypeAttributes {
    /// Mask of fields that carry a value.
    pub specified_attributes: u32,
    /// Display name.
    pub display_name: LocalizedText,
    /// Description.
    pub description: LocalizedText,
    /// Write mask.
    pub write_mask: u32,
    /// User write mask.
    pub user_write_mask: u32,
    /// Whether the type is abstract.
    pub is_abstract: bool,
    /// Whether the reference reads the same in both directions.
    pub symmetric: bool,
    /// Name of the reference when followed inverted.
    pub inverse_name: LocalizedText,
}

impl MessageInfo for ReferenceTypeAttributes {
    fn type_id(&self) -> ObjectId {
        ObjectId::ReferenceTypeAttributes_Encoding_DefaultBinary
    }
}

/// Attributes for a new data type node.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataTypeAttributes {
    /// Mask of fields that carry a value.
    pub specified_attributes: u32,
    /// Display name.
    pub display_name: LocalizedText,
    /// Description.
    pub description: LocalizedText,
    /// Write mask.
    pub write_mask: u32,
    /// User write mask.
    pub user_write_mask: u32,
    /// Whether the type is abstract.
    pub is_abstract: bool,
}

impl MessageInfo for DataTypeAttributes {
    fn type_id(&self) -> ObjectId {
        ObjectId::DataTypeAttributes_Encoding_DefaultBinary
    }
}

/// Attributes for a new view node.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewAttributes {
    /// Mask of fields that carry a value.
    pub specified_attributes: u32,
    /// Display name.
    pub display_name: LocalizedText,
    /// Description.
    pub description: LocalizedText,
    /// Write mask.
    pub write_mask: u32,
    /// User write mask.
    pub user_write_mask: u32,
    /// Whether the view is guaranteed loop free.
    pub contains_no_loops: bool,
    /// Event notifier byte.
    pub event_notifier: u8,
}

impl MessageInfo for ViewAttributes {
    fn type_id(&self) -> ObjectId {
        ObjectId::ViewAttributes_Encoding_DefaultBinary
    }
}

/// One node to add.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AddNodesItem {
    /// The parent the new node hangs off.
    pub parent_node_id: ExpandedNodeId,
    /// The reference connecting parent and new node.
    pub reference_type_id: NodeId,
    /// The requested id for the new node, null to let the server choose.
    pub requested_new_node_id: ExpandedNodeId,
    /// The browse name of the new node.
    pub browse_name: QualifiedName,
    /// The class of the new node.
    pub node_class: super::NodeClass,
    /// The class specific attributes, one of the `...Attributes` types.
    pub node_attributes: ExtensionObject,
    /// Type definition for object and variable nodes.
    pub type_definition: ExpandedNodeId,
}

/// Result of adding one node.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AddNodesResult {
    /// Status of the operation.
    pub status_code: StatusCode,
    /// The id the node was added under.
    pub added_node_id: NodeId,
}

/// Add nodes to the address space.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AddNodesRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// The nodes to add.
    pub nodes_to_add: Option<Vec<AddNodesItem>>,
}

impl MessageInfo for AddNodesRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::AddNodesRequest_Encoding_DefaultBinary
    }
}

/// Response to [`AddNodesRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AddNodesResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// One result per item, same order.
    pub results: Option<Vec<AddNodesResult>>,
    /// Diagnostics per entry, if requested.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

impl MessageInfo for AddNodesResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::AddNodesResponse_Encoding_DefaultBinary
    }
}

/// One reference to add.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AddReferencesItem {
    /// The source node of the reference.
    pub source_node_id: NodeId,
    /// The type of the reference.
    pub reference_type_id: NodeId,
    /// Whether the reference points from source to target.
    pub is_forward: bool,
    /// URI of the server holding the target, null for local.
    pub target_server_uri: UAString,
    /// The target node of the reference.
    pub target_node_id: ExpandedNodeId,
    /// The class of the target node, for validation.
    pub target_node_class: super::NodeClass,
}

/// Add references between nodes.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AddReferencesRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// The references to add.
    pub references_to_add: Option<Vec<AddReferencesItem>>,
}

impl MessageInfo for AddReferencesRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::AddReferencesRequest_Encoding_DefaultBinary
    }
}

/// Response to [`AddReferencesRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AddReferencesResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// One status per item, same order.
    pub results: Option<Vec<StatusCode>>,
    /// Diagnostics per entry, if requested.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

impl MessageInfo for AddReferencesResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::AddReferencesResponse_Encoding_DefaultBinary
    }
}

/// One node to delete.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteNodesItem {
    /// The node to delete.
    pub node_id: NodeId,
    /// Whether references pointing at the node are deleted too.
    pub delete_target_references: bool,
}

/// Delete nodes from the address space.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteNodesRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// The nodes to delete.
    pub nodes_to_delete: Option<Vec<DeleteNodesItem>>,
}

impl MessageInfo for DeleteNodesRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::DeleteNodesRequest_Encoding_DefaultBinary
    }
}

/// Response to [`DeleteNodesRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteNodesResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// One status per item, same order.
    pub results: Option<Vec<StatusCode>>,
    /// Diagnostics per entry, if requested.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

impl MessageInfo for DeleteNodesResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::DeleteNodesResponse_Encoding_DefaultBinary
    }
}

/// One reference to delete.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteReferencesItem {
    /// The source node of the reference.
    pub source_node_id: NodeId,
    /// The type of the reference.
    pub reference_type_id: NodeId,
    /// Whether the reference points from source to target.
    pub is_forward: bool,
    /// The target node of the reference.
    pub target_node_id: ExpandedNodeId,
    /// Whether the opposite direction is deleted as well.
    pub delete_bidirectional: bool,
}

/// Delete references between nodes.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteReferencesRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// The references to delete.
    pub references_to_delete: Option<Vec<DeleteReferencesItem>>,
}

impl MessageInfo for DeleteReferencesRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::DeleteReferencesRequest_Encoding_DefaultBinary
    }
}

/// Response to [`DeleteReferencesRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteReferencesResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// One status per item, same order.
    pub results: Option<Vec<StatusCode>>,
    /// Diagnostics per entry, if requested.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

impl MessageInfo for DeleteReferencesResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::DeleteReferencesResponse_Encoding_DefaultBinary
    }
}
