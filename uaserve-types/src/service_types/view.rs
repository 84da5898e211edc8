//! View service set: Browse, BrowseNext, TranslateBrowsePathsToNodeIds,
//! RegisterNodes and UnregisterNodes.

use super::{BrowseDirection, MessageInfo, NodeClass};
use crate::{
    byte_string::ByteString, date_time::DateTime, diagnostic_info::DiagnosticInfo,
    expanded_node_id::ExpandedNodeId, localized_text::LocalizedText, node_id::NodeId,
    node_ids::ObjectId, qualified_name::QualifiedName, request_header::RequestHeader,
    response_header::ResponseHeader, status_code::StatusCode,
};

#[allow(unused)]
mod uaserve {
    pub use crate as types;
}

/// The view to browse, null for the whole address space.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewDescription {
    /// Node id of the view node, null for no view.
    pub view_id: NodeId,
    /// Server time at which the view applies, unused.
    pub timestamp: DateTime,
    /// Version of the view, 0 for the current one.
    pub view_version: u32,
}

/// What to browse from one starting node.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrowseDescription {
    /// The node to browse from.
    pub node_id: NodeId,
    /// The direction of references to follow.
    pub browse_direction: BrowseDirection,
    /// Filter on the reference type, null for all references.
    pub reference_type_id: NodeId,
    /// Whether subtypes of the reference type also match.
    pub include_subtypes: bool,
    /// Bit mask of node classes to return, 0 for all.
    pub node_class_mask: u32,
    /// Bit mask of the fields to fill in each reference description.
    pub result_mask: u32,
}

/// One reference found while browsing.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferenceDescription {
    /// The type of the reference.
    pub reference_type_id: NodeId,
    /// `true` if the reference is a forward reference.
    pub is_forward: bool,
    /// The target of the reference.
    pub node_id: ExpandedNodeId,
    /// Browse name of the target node.
    pub browse_name: QualifiedName,
    /// Display name of the target node.
    pub display_name: LocalizedText,
    /// Node class of the target node.
    pub node_class: NodeClass,
    /// Type definition of the target, for objects and variables.
    pub type_definition: ExpandedNodeId,
}

/// The references found for one browse description.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrowseResult {
    /// Status of the operation.
    pub status_code: StatusCode,
    /// Continuation point to pass to BrowseNext, null when the result is
    /// complete.
    pub continuation_point: ByteString,
    /// The references found.
    pub references: Option<Vec<ReferenceDescription>>,
}

/// Browse the references of a set of nodes.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrowseRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// The view to browse, null for the whole address space.
    pub view: ViewDescription,
    /// Maximum number of references to return per node, 0 for no limit.
    pub requested_max_references_per_node: u32,
    /// The nodes to browse.
    pub nodes_to_browse: Option<Vec<BrowseDescription>>,
}

impl MessageInfo for BrowseRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::BrowseRequest_Encoding_DefaultBinary
    }
}

/// Response to [`BrowseRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrowseResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// One result per browse description, same order.
    pub results: Option<Vec<BrowseResult>>,
    /// Diagnostics per entry, if requested.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

impl MessageInfo for BrowseResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::BrowseResponse_Encoding_DefaultBinary
    }
}

/// Continue or release previous browse results.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrowseNextRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// `true` to free the continuation points without returning results.
    pub release_continuation_points: bool,
    /// The continuation points to continue or release.
    pub continuation_points: Option<Vec<ByteString>>,
}

impl MessageInfo for BrowseNextRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::BrowseNextRequest_Encoding_DefaultBinary
    }
}

/// Response to [`BrowseNextRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrowseNextResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// One result per continuation point, same order.
    pub results: Option<Vec<BrowseResult>>,
    /// Diagnostics per entry, if requested.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

impl MessageInfo for BrowseNextResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::BrowseNextResponse_Encoding_DefaultBinary
    }
}

/// One element of a relative browse path.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RelativePathElement {
    /// The type of reference to follow, null for any hierarchical one.
    pub reference_type_id: NodeId,
    /// Whether to follow the reference inverted.
    pub is_inverse: bool,
    /// Whether subtypes of the reference type also match.
    pub include_subtypes: bool,
    /// The browse name of the target to step to.
    pub target_name: QualifiedName,
}

/// A relative path through the address space.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RelativePath {
    /// The elements of the path, applied in order.
    pub elements: Option<Vec<RelativePathElement>>,
}

/// A starting node and a relative path from it.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrowsePath {
    /// The node the path starts at.
    pub starting_node: NodeId,
    /// The path to follow.
    pub relative_path: RelativePath,
}

/// One node a browse path resolved to.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrowsePathTarget {
    /// The target node.
    pub target_id: ExpandedNodeId,
    /// Index of the first unprocessed path element, `u32::MAX` when the
    /// whole path was processed.
    pub remaining_path_index: u32,
}

/// The targets one browse path resolved to.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrowsePathResult {
    /// Status of the operation.
    pub status_code: StatusCode,
    /// All matching end nodes.
    pub targets: Option<Vec<BrowsePathTarget>>,
}

/// Translate browse paths into node ids.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranslateBrowsePathsToNodeIdsRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// The paths to translate.
    pub browse_paths: Option<Vec<BrowsePath>>,
}

impl MessageInfo for TranslateBrowsePathsToNodeIdsRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::TranslateBrowsePathsToNodeIdsRequest_Encoding_DefaultBinary
    }
}

/// Response to [`TranslateBrowsePathsToNodeIdsRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranslateBrowsePathsToNodeIdsResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// One result per browse path, same order.
    pub results: Option<Vec<BrowsePathResult>>,
    /// Diagnostics per entry, if requested.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

impl MessageInfo for TranslateBrowsePathsToNodeIdsResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::TranslateBrowsePathsToNodeIdsResponse_Encoding_DefaultBinary
    }
}

/// Register nodes for optimized repeated access.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegisterNodesRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// The nodes to register.
    pub nodes_to_register: Option<Vec<NodeId>>,
}

impl MessageInfo for RegisterNodesRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::RegisterNodesRequest_Encoding_DefaultBinary
    }
}

/// Response to [`RegisterNodesRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegisterNodesResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// One id per registered node, possibly aliased for fast access.
    pub registered_node_ids: Option<Vec<NodeId>>,
}

impl MessageInfo for RegisterNodesResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::RegisterNodesResponse_Encoding_DefaultBinary
    }
}

/// Unregister nodes registered with RegisterNodes.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UnregisterNodesRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// The nodes to unregister.
    pub nodes_to_unregister: Option<Vec<NodeId>>,
}

impl MessageInfo for UnregisterNodesRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::UnregisterNodesRequest_Encoding_DefaultBinary
    }
}

/// Response to [`UnregisterNodesRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UnregisterNodesResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
}

impl MessageInfo for UnregisterNodesResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::UnregisterNodesResponse_Encoding_DefaultBinary
    }
}

bitflags::bitflags! {
    /// The fields to fill in each returned [`ReferenceDescription`].
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct BrowseDescriptionResultMask: u32 {
        /// Include the reference type id.
        const RESULT_MASK_REFERENCE_TYPE = 1;
        /// Include the direction flag.
        const RESULT_MASK_IS_FORWARD = 1 << 1;
        /// Include the node class.
        const RESULT_MASK_NODE_CLASS = 1 << 2;
        /// Include the browse name.
        const RESULT_MASK_BROWSE_NAME = 1 << 3;
        /// Include the display name.
        const RESULT_MASK_DISPLAY_NAME = 1 << 4;
        /// Include the type definition.
        const RESULT_MASK_TYPE_DEFINITION = 1 << 5;
    }
}
