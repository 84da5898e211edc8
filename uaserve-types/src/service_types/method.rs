//! Method service set: Call.

use super::MessageInfo;
use crate::{
    diagnostic_info::DiagnosticInfo, node_id::NodeId, node_ids::ObjectId,
    request_header::RequestHeader, response_header::ResponseHeader, status_code::StatusCode,
    variant::Variant,
};

#[allow(unused)]
mod uaserve {
    pub use crate as types;
}

/// A call of one method on one object.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallMethodRequest {
    /// The object the method is called on.
    pub object_id: NodeId,
    /// The method to call.
    pub method_id: NodeId,
    /// The input arguments, in declaration order.
    pub input_arguments: Option<Vec<Variant>>,
}

/// The result of one method call.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallMethodResult {
    /// Status of the call.
    pub status_code: StatusCode,
    /// One status per input argument.
    pub input_argument_results: Option<Vec<StatusCode>>,
    /// Diagnostics per input argument, if requested.
    pub input_argument_diagnostic_infos: Option<Vec<DiagnosticInfo>>,
    /// The output arguments, in declaration order.
    pub output_arguments: Option<Vec<Variant>>,
}

/// Call methods.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// The calls to perform.
    pub methods_to_call: Option<Vec<CallMethodRequest>>,
}

impl MessageInfo for CallRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::CallRequest_Encoding_DefaultBinary
    }
}

/// Response to [`CallRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// One result per call, same order.
    pub results: Option<Vec<CallMethodResult>>,
    /// Diagnostics per call, if requested.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

impl MessageInfo for CallResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::CallResponse_Encoding_DefaultBinary
    }
}
