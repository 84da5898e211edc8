//! Attribute service set: Read and Write.

use super::{MessageInfo, TimestampsToReturn};
use crate::{
    data_value::DataValue, diagnostic_info::DiagnosticInfo, node_id::NodeId, node_ids::ObjectId,
    qualified_name::QualifiedName, request_header::RequestHeader,
    response_header::ResponseHeader, status_code::StatusCode, string::UAString,
};

#[allow(unused)]
mod uaserve {
    pub use crate as types;
}

/// Identifies one attribute of one node to read.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadValueId {
    /// The node to read.
    pub node_id: NodeId,
    /// The attribute to read, an [`crate::AttributeId`] value.
    pub attribute_id: u32,
    /// Index range into an array valued attribute, null for all.
    pub index_range: UAString,
    /// Requested data encoding of the value, null for binary.
    pub data_encoding: QualifiedName,
}

/// Read attributes of nodes.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// Maximum age in milliseconds of values served from a cache. 0 asks
    /// for a fresh read.
    pub max_age: f64,
    /// Which timestamps to return with each value.
    pub timestamps_to_return: TimestampsToReturn,
    /// The attributes to read.
    pub nodes_to_read: Option<Vec<ReadValueId>>,
}

impl MessageInfo for ReadRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::ReadRequest_Encoding_DefaultBinary
    }
}

/// Response to [`ReadRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// One data value per entry in the request, same order.
    pub results: Option<Vec<DataValue>>,
    /// Diagnostics per entry, if requested.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

impl MessageInfo for ReadResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::ReadResponse_Encoding_DefaultBinary
    }
}

/// One attribute of one node to write, and the value to write.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WriteValue {
    /// The node to write.
    pub node_id: NodeId,
    /// The attribute to write, an [`crate::AttributeId`] value.
    pub attribute_id: u32,
    /// Index range into an array valued attribute, null for all.
    pub index_range: UAString,
    /// The value to write.
    pub value: DataValue,
}

/// Write attributes of nodes.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WriteRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// The writes to perform.
    pub nodes_to_write: Option<Vec<WriteValue>>,
}

impl MessageInfo for WriteRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::WriteRequest_Encoding_DefaultBinary
    }
}

/// Response to [`WriteRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WriteResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// One status per write in the request, same order.
    pub results: Option<Vec<StatusCode>>,
    /// Diagnostics per entry, if requested.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

impl MessageInfo for WriteResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::WriteResponse_Encoding_DefaultBinary
    }
}
