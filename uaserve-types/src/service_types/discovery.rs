//! Discovery service set: GetEndpoints and FindServers.

use super::{ApplicationDescription, EndpointDescription, MessageInfo};
use crate::{
    node_ids::ObjectId, request_header::RequestHeader, response_header::ResponseHeader,
    string::UAString,
};

#[allow(unused)]
mod uaserve {
    pub use crate as types;
}

/// Ask the server for its endpoint descriptions.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GetEndpointsRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// The URL the client used to reach the server.
    pub endpoint_url: UAString,
    /// Locales for the returned display names, in priority order.
    pub locale_ids: Option<Vec<UAString>>,
    /// Transport profiles to filter on, empty for all.
    pub profile_uris: Option<Vec<UAString>>,
}

impl MessageInfo for GetEndpointsRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::GetEndpointsRequest_Encoding_DefaultBinary
    }
}

/// Response to [`GetEndpointsRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GetEndpointsResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// The matching endpoints.
    pub endpoints: Option<Vec<EndpointDescription>>,
}

impl MessageInfo for GetEndpointsResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::GetEndpointsResponse_Encoding_DefaultBinary
    }
}

/// Ask for the servers known to this host.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FindServersRequest {
    /// Common request header.
    pub request_header: RequestHeader,
    /// The URL the client used to reach the server.
    pub endpoint_url: UAString,
    /// Locales for the returned application names, in priority order.
    pub locale_ids: Option<Vec<UAString>>,
    /// Server URIs to filter on, empty for all.
    pub server_uris: Option<Vec<UAString>>,
}

impl MessageInfo for FindServersRequest {
    fn type_id(&self) -> ObjectId {
        ObjectId::FindServersRequest_Encoding_DefaultBinary
    }
}

/// Response to [`FindServersRequest`].
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FindServersResponse {
    /// Common response header.
    pub response_header: ResponseHeader,
    /// The matching servers.
    pub servers: Option<Vec<ApplicationDescription>>,
}

impl MessageInfo for FindServersResponse {
    fn type_id(&self) -> ObjectId {
        ObjectId::FindServersResponse_Encoding_DefaultBinary
    }
}
