//! The discovery service set: GetEndpoints and FindServers.

use uaserve_types::{
    FindServersRequest, FindServersResponse, GetEndpointsRequest, GetEndpointsResponse,
    ResponseHeader, StatusCode, UAString,
};

use crate::info::{ServerInfo, TRANSPORT_PROFILE_URI_BINARY};

/// Handle a GetEndpoints request.
pub fn get_endpoints(
    info: &ServerInfo,
    request: &GetEndpointsRequest,
) -> Result<GetEndpointsResponse, StatusCode> {
    let mut endpoints = info.endpoint_descriptions();

    // Filter by the requested transport profiles, when given.
    if let Some(profile_uris) = &request.profile_uris {
        if !profile_uris.is_empty() {
            let keep = profile_uris
                .iter()
                .any(|uri| uri.as_ref() == TRANSPORT_PROFILE_URI_BINARY);
            if !keep {
                endpoints.clear();
            }
        }
    }

    Ok(GetEndpointsResponse {
        response_header: ResponseHeader::new_good(&request.request_header),
        endpoints: Some(endpoints),
    })
}

/// Handle a FindServers request. This server only knows itself.
pub fn find_servers(
    info: &ServerInfo,
    request: &FindServersRequest,
) -> Result<FindServersResponse, StatusCode> {
    let mut servers = vec![info.application_description()];

    if let Some(server_uris) = &request.server_uris {
        if !server_uris.is_empty() {
            servers.retain(|s| {
                server_uris
                    .iter()
                    .any(|uri| uri == &s.application_uri || uri == &UAString::from("*"))
            });
        }
    }

    Ok(FindServersResponse {
        response_header: ResponseHeader::new_good(&request.request_header),
        servers: Some(servers),
    })
}

#[cfg(test)]
mod tests {
    use super::{find_servers, get_endpoints};
    use crate::authenticator::DefaultAuthenticator;
    use crate::config::ServerConfig;
    use crate::info::ServerInfo;
    use std::sync::Arc;
    use uaserve_types::{FindServersRequest, GetEndpointsRequest, RequestHeader};

    fn info() -> ServerInfo {
        ServerInfo::new(
            Arc::new(ServerConfig::default()),
            Arc::new(DefaultAuthenticator::new(Default::default())),
        )
    }

    #[test]
    fn endpoints_advertised() {
        let info = info();
        let response = get_endpoints(
            &info,
            &GetEndpointsRequest {
                request_header: RequestHeader::default(),
                endpoint_url: "opc.tcp://localhost:4840/".into(),
                locale_ids: None,
                profile_uris: None,
            },
        )
        .unwrap();
        let endpoints = response.endpoints.unwrap();
        assert_eq!(endpoints.len(), 1);
        assert!(endpoints[0]
            .transport_profile_uri
            .as_ref()
            .ends_with("uatcp-uasc-uabinary"));
    }

    #[test]
    fn profile_filter() {
        let info = info();
        let response = get_endpoints(
            &info,
            &GetEndpointsRequest {
                request_header: RequestHeader::default(),
                endpoint_url: "opc.tcp://localhost:4840/".into(),
                locale_ids: None,
                profile_uris: Some(vec!["http://example.com/other-profile".into()]),
            },
        )
        .unwrap();
        assert!(response.endpoints.unwrap().is_empty());
    }

    #[test]
    fn finds_itself() {
        let info = info();
        let response = find_servers(
            &info,
            &FindServersRequest {
                request_header: RequestHeader::default(),
                endpoint_url: "opc.tcp://localhost:4840/".into(),
                locale_ids: None,
                server_uris: None,
            },
        )
        .unwrap();
        assert_eq!(response.servers.unwrap().len(), 1);
    }
}
