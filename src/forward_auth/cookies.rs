use axum_extra::extract::cookie::Cookie;
use std::collections::BTreeMap;

/// Request-scoped cookies keyed by name. Adding a cookie replaces any cookie of the same name.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: BTreeMap<String, Cookie<'static>>,
}

impl CookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, cookie: Cookie<'static>) {
        self.cookies.insert(cookie.name().to_string(), cookie);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Cookie<'static>> {
        self.cookies.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie<'static>> {
        self.cookies.values()
    }

    #[must_use]
    pub fn into_cookies(self) -> Vec<Cookie<'static>> {
        self.cookies.into_values().collect()
    }
}

/// Render the `Cookie` request header: `client` cookies not shadowed by a same-named
/// `provider` cookie, then every `provider` cookie. Attributes are dropped.
#[must_use]
pub fn request_header(client: &CookieJar, provider: &CookieJar) -> Option<String> {
    let pairs: Vec<String> = client
        .iter()
        .filter(|cookie| !provider.contains(cookie.name()))
        .chain(provider.iter())
        .map(|cookie| cookie.stripped().to_string())
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}
