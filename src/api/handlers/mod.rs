pub mod auth;
pub use self::auth::authenticate;

// common functions for the handlers
use axum::http::{header::HOST, HeaderMap, HeaderValue, Uri};

/// HTTP/2 requests carry the host as `:authority`, so fill in `Host` from the URI.
pub fn ensure_host(headers: &mut HeaderMap, uri: &Uri) {
    if headers.contains_key(HOST) {
        return;
    }
    if let Some(host) = uri
        .authority()
        .and_then(|authority| HeaderValue::from_str(authority.as_str()).ok())
    {
        headers.insert(HOST, host);
    }
}

/// Best-effort client address, as reported by the reverse proxy.
pub fn client_address(headers: &HeaderMap) -> &str {
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .or_else(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.split(',').next())
        })
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("unknown")
}
