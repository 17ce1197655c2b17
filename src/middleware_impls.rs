use crate::auth::Claims;
use crate::models::ClickMetadata;
use axum::{
    extract::{ConnectInfo, Request},
    http::{header, Extensions, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use tower_governor::key_extractor::KeyExtractor;
use uuid::Uuid;

/// Request ID wrapper for use in request extensions
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-request metadata, recorded with click events on redirect
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

impl RequestContext {
    pub fn from_headers(request_id: String, headers: &HeaderMap) -> Self {
        Self::new(request_id, headers, None)
    }

    /// Proxy headers win for the recorded client address; the TCP peer is
    /// the fallback.
    pub fn new(request_id: String, headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        Self {
            request_id,
            client_ip: extract_client_ip(headers).or_else(|| peer.map(|p| p.ip().to_string())),
            user_agent: header_string(headers, header::USER_AGENT.as_str()),
            referrer: header_string(headers, header::REFERER.as_str()),
        }
    }

    pub fn click_metadata(&self) -> ClickMetadata {
        ClickMetadata {
            referrer: self.referrer.clone(),
            ip_address: self.client_ip.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Extract client IP address from proxy headers
pub fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    // X-Forwarded-For carries the original client first
    if let Some(forwarded) = header_string(headers, "x-forwarded-for") {
        if let Some(first_ip) = forwarded.split(',').next() {
            let first_ip = first_ip.trim();
            if !first_ip.is_empty() {
                return Some(first_ip.to_string());
            }
        }
    }

    header_string(headers, "x-real-ip")
}

/// TCP peer address, present when served with connect info
pub fn peer_addr(extensions: &Extensions) -> Option<SocketAddr> {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

/// Request ID middleware - adds a unique ID to each request
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| RequestId(s.to_string()))
        .unwrap_or_default();

    tracing::info!(
        request_id = %request_id.as_str(),
        method = %req.method(),
        path = %req.uri().path(),
        "Incoming request"
    );

    let header_value = HeaderValue::from_str(request_id.as_str()).ok();
    req.extensions_mut().insert(request_id);

    let mut response = next.run(req).await;

    if let Some(header_value) = header_value {
        response.headers_mut().insert("x-request-id", header_value);
    }

    response
}

/// Request context middleware - adds context to each request
pub async fn request_context_middleware(mut req: Request, next: Next) -> Response {
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let context = RequestContext::new(request_id, req.headers(), peer_addr(req.extensions()));
    req.extensions_mut().insert(context);

    next.run(req).await
}

/// Rate limit key: the user for authenticated requests, otherwise the client IP.
///
/// Anonymous clients are keyed on the TCP peer. Proxy headers are only
/// consulted with `trust_proxy_headers`, since any client can set them.
#[derive(Clone, Debug)]
pub struct AuthAwareKeyExtractor {
    pub trust_proxy_headers: bool,
}

impl AuthAwareKeyExtractor {
    pub fn new(trust_proxy_headers: bool) -> Self {
        Self { trust_proxy_headers }
    }

    fn client_ip<T>(&self, req: &axum::http::Request<T>) -> Option<String> {
        let forwarded = if self.trust_proxy_headers {
            extract_client_ip(req.headers())
        } else {
            None
        };
        forwarded.or_else(|| peer_addr(req.extensions()).map(|p| p.ip().to_string()))
    }
}

impl KeyExtractor for AuthAwareKeyExtractor {
    type Key = String;

    fn extract<T>(
        &self,
        req: &axum::http::Request<T>,
    ) -> Result<Self::Key, tower_governor::GovernorError> {
        if let Some(claims) = req.extensions().get::<Claims>() {
            return Ok(format!("user:{}", claims.sub));
        }
        let ip = self.client_ip(req).unwrap_or_else(|| "unknown".to_string());
        Ok(format!("ip:{}", ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_new() {
        let id = RequestId::new();
        assert_eq!(id.as_str().len(), 36); // UUID v4 length
    }

    #[test]
    fn test_request_context_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "127.0.0.1".parse().unwrap());
        headers.insert(header::USER_AGENT, "Mozilla/5.0".parse().unwrap());
        headers.insert(header::REFERER, "https://news.example/".parse().unwrap());

        let ctx = RequestContext::from_headers("test-123".to_string(), &headers);
        assert_eq!(ctx.request_id, "test-123");

        let metadata = ctx.click_metadata();
        assert_eq!(metadata.ip_address.as_deref(), Some("127.0.0.1"));
        assert_eq!(metadata.user_agent.as_deref(), Some("Mozilla/5.0"));
        assert_eq!(metadata.referrer.as_deref(), Some("https://news.example/"));
    }

    #[test]
    fn test_extract_client_ip_from_multiple_forwarded() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "192.168.1.1, 10.0.0.1".parse().unwrap());

        assert_eq!(extract_client_ip(&headers).as_deref(), Some("192.168.1.1"));
    }

    #[test]
    fn test_extract_client_ip_unknown() {
        let headers = HeaderMap::new();
        assert_eq!(extract_client_ip(&headers), None);
    }

    fn request_from(peer: &str, forwarded: Option<&str>) -> axum::http::Request<()> {
        let mut builder = axum::http::Request::builder().uri("/RLUSAPNi");
        if let Some(forwarded) = forwarded {
            builder = builder.header("x-forwarded-for", forwarded);
        }
        let mut req = builder.body(()).unwrap();
        let addr: SocketAddr = peer.parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        req
    }

    #[test]
    fn test_distinct_peers_get_distinct_keys() {
        let extractor = AuthAwareKeyExtractor::new(false);

        let first = extractor.extract(&request_from("198.51.100.1:50000", None)).unwrap();
        let second = extractor.extract(&request_from("198.51.100.2:50000", None)).unwrap();

        assert_eq!(first, "ip:198.51.100.1");
        assert_eq!(second, "ip:198.51.100.2");
        assert_ne!(first, second);
    }

    #[test]
    fn test_same_peer_shares_key_across_ports() {
        let extractor = AuthAwareKeyExtractor::new(false);

        let first = extractor.extract(&request_from("198.51.100.1:50000", None)).unwrap();
        let second = extractor.extract(&request_from("198.51.100.1:50001", None)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_forwarded_header_ignored_unless_trusted() {
        let req = request_from("198.51.100.1:50000", Some("203.0.113.9"));

        assert_eq!(
            AuthAwareKeyExtractor::new(false).extract(&req).unwrap(),
            "ip:198.51.100.1"
        );
        assert_eq!(
            AuthAwareKeyExtractor::new(true).extract(&req).unwrap(),
            "ip:203.0.113.9"
        );
    }

    #[test]
    fn test_authenticated_requests_keyed_by_user() {
        let mut req = request_from("198.51.100.1:50000", None);
        req.extensions_mut().insert(Claims {
            sub: "42".to_string(),
            username: "alice".to_string(),
            role: crate::models::Role::User,
            exp: 0,
            iat: 0,
        });

        assert_eq!(AuthAwareKeyExtractor::new(false).extract(&req).unwrap(), "user:42");
    }

    #[test]
    fn test_request_context_falls_back_to_peer() {
        let peer: SocketAddr = "192.0.2.10:4000".parse().unwrap();
        let ctx = RequestContext::new("id".to_string(), &HeaderMap::new(), Some(peer));
        assert_eq!(ctx.client_ip.as_deref(), Some("192.0.2.10"));
    }
}
