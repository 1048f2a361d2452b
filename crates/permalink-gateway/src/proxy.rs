//! Forwarding of non-redirected requests to the upstream renderer.

use std::time::{Duration, Instant};

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, HOST};
use http_body_util::{BodyExt, Full};
use permalink_middleware::stages::request_id::REQUEST_ID_HEADER;
use permalink_middleware::{Request, RequestId, Response};
use permalink_telemetry::record_upstream;
use reqwest::Client;
use tracing::debug;

use crate::error::{GatewayError, GatewayResult};

/// Header carrying the client-facing host to the upstream.
pub const FORWARDED_HOST_HEADER: &str = "x-forwarded-host";

/// HTTP client for the upstream renderer.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: Client,
    upstream_url: String,
    timeout: Duration,
}

impl ProxyClient {
    /// Creates a client for `upstream_url` (without trailing slash).
    pub fn new(upstream_url: &str, timeout: Duration) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| GatewayError::proxy(format!("failed to create client: {e}")))?;

        Ok(Self {
            client,
            upstream_url: upstream_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Upstream base URL.
    pub fn upstream_url(&self) -> &str {
        &self.upstream_url
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Forwards a request and returns the upstream's response.
    ///
    /// Upstream redirects are returned to the client, not followed.
    pub async fn forward(
        &self,
        request: Request,
        request_id: RequestId,
    ) -> GatewayResult<Response> {
        let start = Instant::now();
        let result = self.send(request, request_id).await;

        let status = result.as_ref().ok().map(|r| r.status().as_u16());
        record_upstream(status, start.elapsed());
        result
    }

    async fn send(&self, request: Request, request_id: RequestId) -> GatewayResult<Response> {
        let (parts, body) = request.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .map_or("/", http::uri::PathAndQuery::as_str);
        let url = format!("{}{}", self.upstream_url, path_and_query);

        let body = body
            .collect()
            .await
            .map_err(|e| GatewayError::proxy(format!("failed to read request body: {e}")))?
            .to_bytes();

        let mut headers = filter_headers(&parts.headers);
        if let Some(host) = parts.headers.get(HOST) {
            headers.insert(HeaderName::from_static(FORWARDED_HOST_HEADER), host.clone());
        }
        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }

        debug!(method = %parts.method, url = %url, "forwarding to upstream");

        let upstream = self
            .client
            .request(parts.method, &url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::upstream_timeout(format!("{url} timed out"))
                } else {
                    GatewayError::upstream(format!("request to {url} failed: {e}"))
                }
            })?;

        let status = upstream.status();
        let upstream_headers = filter_headers(upstream.headers());
        let bytes: Bytes = upstream
            .bytes()
            .await
            .map_err(|e| GatewayError::upstream(format!("failed to read body: {e}")))?;

        let mut response = http::Response::new(Full::new(bytes));
        *response.status_mut() = status;
        *response.headers_mut() = upstream_headers;
        Ok(response)
    }
}

/// Copies headers, dropping hop-by-hop ones and `Host`.
fn filter_headers(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if name != HOST && !is_hop_by_hop_header(name.as_str()) {
            filtered.append(name.clone(), value.clone());
        }
    }
    filtered
}

fn is_hop_by_hop_header(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "trailers"
            | "transfer-encoding"
            | "upgrade"
            | "content-length"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_hop_by_hop_header() {
        assert!(is_hop_by_hop_header("connection"));
        assert!(is_hop_by_hop_header("Transfer-Encoding"));
        assert!(!is_hop_by_hop_header("content-type"));
        assert!(!is_hop_by_hop_header("location"));
    }

    #[test]
    fn test_filter_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("www.test.com"));
        headers.insert("connection", HeaderValue::from_static("keep-alive"));
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));

        let filtered = filter_headers(&headers);
        assert!(filtered.get(HOST).is_none());
        assert!(filtered.get("connection").is_none());
        assert_eq!(filtered.get_all("set-cookie").iter().count(), 2);
    }

    #[test]
    fn test_upstream_url_trimmed() {
        let client = ProxyClient::new("http://127.0.0.1:8081/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.upstream_url(), "http://127.0.0.1:8081");
        assert_eq!(client.timeout(), Duration::from_secs(1));
    }
}
