//! Names allowed across the trust boundary between the client and the provider.
//!
//! Header lists follow the provider's nginx deployment guide. Built once at startup and
//! shared by reference, never mutated.

use http::{header, HeaderName};
use std::collections::HashSet;

/// Session cookie issued by the provider.
pub const SESSION_COOKIE_NAME: &str = "authelia_session";

/// Header the provider reads client credentials from on `/api/verify`.
pub const PROVIDER_AUTHORIZATION: HeaderName = header::PROXY_AUTHORIZATION;

/// Headers copied from the inbound request to every provider call.
pub const CLIENT_HEADERS: [HeaderName; 8] = [
    HeaderName::from_static("x-real-ip"),
    HeaderName::from_static("x-forwarded-for"),
    HeaderName::from_static("x-forwarded-proto"),
    HeaderName::from_static("x-forwarded-host"),
    HeaderName::from_static("x-forwarded-uri"),
    HeaderName::from_static("x-forwarded-ssl"),
    header::CONNECTION,
    // only sent when a call opts in, renamed to `PROVIDER_AUTHORIZATION`
    header::AUTHORIZATION,
];

/// Identity headers relayed from a successful verification back to the proxy.
pub const RELAY_HEADERS: [HeaderName; 4] = [
    HeaderName::from_static("remote-user"),
    HeaderName::from_static("remote-groups"),
    HeaderName::from_static("remote-name"),
    HeaderName::from_static("remote-email"),
];

/// Client cookies replayed to the provider.
pub const CLIENT_COOKIES: [&str; 1] = [SESSION_COOKIE_NAME];

#[derive(Debug, Clone)]
pub struct AllowList {
    client_headers: HashSet<HeaderName>,
    relay_headers: Vec<HeaderName>,
    client_cookies: HashSet<&'static str>,
}

impl Default for AllowList {
    fn default() -> Self {
        Self {
            client_headers: CLIENT_HEADERS.into_iter().collect(),
            relay_headers: RELAY_HEADERS.to_vec(),
            client_cookies: CLIENT_COOKIES.into_iter().collect(),
        }
    }
}

impl AllowList {
    /// `HeaderName` is always lowercase, so membership is case-insensitive.
    #[must_use]
    pub fn allows_client_header(&self, name: &HeaderName) -> bool {
        self.client_headers.contains(name)
    }

    #[must_use]
    pub fn relay_headers(&self) -> &[HeaderName] {
        &self.relay_headers
    }

    #[must_use]
    pub fn allows_client_cookie(&self, name: &str) -> bool {
        self.client_cookies.contains(name)
    }
}
