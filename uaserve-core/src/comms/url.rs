//! Endpoint URL helpers.

use url::Url;

/// The scheme of UA-TCP endpoint urls.
pub const OPC_TCP_SCHEME: &str = "opc.tcp";

/// Parse an `opc.tcp://` url.
pub fn opc_url_from_str(s: &str) -> Result<Url, ()> {
    let url = Url::parse(s).map_err(|_| ())?;
    if url.scheme() != OPC_TCP_SCHEME {
        return Err(());
    }
    Ok(url)
}

/// Compare two endpoint urls ignoring the host part. Clients frequently
/// reach the server through a different hostname (or raw address) than the
/// one its endpoints are configured with.
pub fn url_matches_except_host(url1: &str, url2: &str) -> bool {
    let (Ok(url1), Ok(url2)) = (opc_url_from_str(url1), opc_url_from_str(url2)) else {
        return false;
    };
    url1.port() == url2.port() && url1.path().trim_end_matches('/') == url2.path().trim_end_matches('/')
}

/// The path component of an endpoint url, normalized without a trailing
/// slash.
pub fn url_path(url: &str) -> Option<String> {
    opc_url_from_str(url)
        .ok()
        .map(|u| u.path().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::url_matches_except_host;

    #[test]
    fn host_is_ignored() {
        assert!(url_matches_except_host(
            "opc.tcp://localhost:4840/",
            "opc.tcp://192.168.1.10:4840"
        ));
        assert!(!url_matches_except_host(
            "opc.tcp://localhost:4840/a",
            "opc.tcp://localhost:4840/b"
        ));
        assert!(!url_matches_except_host(
            "http://localhost:4840",
            "opc.tcp://localhost:4840"
        ));
    }
}
