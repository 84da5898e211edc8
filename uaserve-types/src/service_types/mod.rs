//! Request and response structures of the services the server implements,
//! plus the structured types they carry. Grouped by service set.

mod attribute_service;
mod common;
mod discovery;
mod enums;
mod method;
mod monitored_items;
mod node_management;
mod secure_channel;
mod session;
mod subscription_service;
mod view;

pub use attribute_service::*;
pub use common::*;
pub use discovery::*;
pub use enums::*;
pub use method::*;
pub use monitored_items::*;
pub use node_management::*;
pub use secure_channel::*;
pub use session::*;
pub use subscription_service::*;
pub use view::*;

use crate::{node_ids::ObjectId, request_header::RequestHeader, response_header::ResponseHeader};

#[allow(unused)]
mod uaserve {
    pub use crate as types;
}

/// Implemented by every type with a registered binary encoding id.
pub trait MessageInfo {
    /// The object id of the binary encoding of this type.
    fn type_id(&self) -> ObjectId;
}

/// The generic service failure response carrying only a response header.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceFault {
    /// The response header, carrying the failure status code.
    pub response_header: ResponseHeader,
}

impl MessageInfo for ServiceFault {
    fn type_id(&self) -> ObjectId {
        ObjectId::ServiceFault_Encoding_DefaultBinary
    }
}

impl ServiceFault {
    /// Create a service fault answering `request_handle` with
    /// `service_result`.
    pub fn new(request_handle: u32, service_result: crate::StatusCode) -> ServiceFault {
        ServiceFault {
            response_header: ResponseHeader::new_service_result(request_handle, service_result),
        }
    }

    /// Create a service fault answering `request_header`.
    pub fn new_from_request(
        request_header: &RequestHeader,
        service_result: crate::StatusCode,
    ) -> ServiceFault {
        Self::new(request_header.request_handle, service_result)
    }
}
