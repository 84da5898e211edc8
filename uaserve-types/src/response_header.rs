//! The [`ResponseHeader`] carried by every service response.

use crate::{
    date_time::DateTime, diagnostic_info::DiagnosticInfo, extension_object::ExtensionObject,
    request_header::RequestHeader, status_code::StatusCode, string::UAString,
};

#[allow(unused)]
mod uaserve {
    pub use crate as types;
}

/// The header returned with every service response.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseHeader {
    /// The time the server sent the response.
    pub timestamp: DateTime,
    /// The client assigned handle from the matching request.
    pub request_handle: u32,
    /// The overall result of the service call.
    pub service_result: StatusCode,
    /// Diagnostics for the service result, if requested.
    pub service_diagnostics: DiagnosticInfo,
    /// Table of strings referenced by the diagnostics.
    pub string_table: Option<Vec<UAString>>,
    /// Reserved for additional header fields.
    pub additional_header: ExtensionObject,
}

impl ResponseHeader {
    /// A good response header answering `request_header`.
    pub fn new_good(request_header: &RequestHeader) -> ResponseHeader {
        Self::new_service_result(request_header.request_handle, StatusCode::Good)
    }

    /// A response header answering the request with handle `request_handle`
    /// carrying `service_result`.
    pub fn new_service_result(
        request_handle: u32,
        service_result: StatusCode,
    ) -> ResponseHeader {
        ResponseHeader {
            timestamp: DateTime::now(),
            request_handle,
            service_result,
            service_diagnostics: DiagnosticInfo::null(),
            string_table: None,
            additional_header: ExtensionObject::null(),
        }
    }
}
