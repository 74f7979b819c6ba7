//! Calls to the provider on behalf of the inbound client.
//!
//! Every call carries the inbound `Host`, the allow-listed inbound headers and the
//! request's cookies, so the provider sees the original client. Cookies set by the
//! provider are kept for the rest of the request and shadow client cookies of the
//! same name, both on later calls and when relayed back to the client.

use crate::forward_auth::{
    allow_list::{AllowList, PROVIDER_AUTHORIZATION},
    cookies::{self, CookieJar},
    credentials::Credentials,
    error::{Error, Result},
    provider::{Endpoint, FirstFactorRequest, Provider, StatusResponse, TotpRequest},
};
use axum_extra::extract::cookie::Cookie;
use http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, trace, warn};

/// Result of a call to the verification endpoint.
#[derive(Debug)]
pub enum Verification {
    /// Carries the allow-listed identity headers of the response.
    Valid(HeaderMap),
    Invalid,
}

#[derive(Debug)]
pub struct Gateway<'a> {
    provider: &'a Provider,
    allow_list: &'a AllowList,
    inbound: &'a HeaderMap,
    client_cookies: CookieJar,
    provider_cookies: CookieJar,
}

impl<'a> Gateway<'a> {
    /// Start a request scope. Client cookies not on the allow-list are dropped here.
    pub fn new(
        provider: &'a Provider,
        allow_list: &'a AllowList,
        inbound: &'a HeaderMap,
        cookies: impl IntoIterator<Item = Cookie<'static>>,
    ) -> Self {
        let mut client_cookies = CookieJar::new();
        for cookie in cookies {
            if allow_list.allows_client_cookie(cookie.name()) {
                debug!(cookie = cookie.name(), "Saving client cookie");
                client_cookies.add(cookie);
            } else {
                trace!(cookie = cookie.name(), "NOT saving client cookie");
            }
        }

        Self {
            provider,
            allow_list,
            inbound,
            client_cookies,
            provider_cookies: CookieJar::new(),
        }
    }

    /// The inbound `Authorization` header, if present and non-empty.
    #[must_use]
    pub fn authorization(&self) -> Option<&'a HeaderValue> {
        self.inbound
            .get(header::AUTHORIZATION)
            .filter(|value| !value.is_empty())
    }

    /// True when either jar holds a cookie with this name.
    #[must_use]
    pub fn has_cookie(&self, name: &str) -> bool {
        self.client_cookies.contains(name) || self.provider_cookies.contains(name)
    }

    #[must_use]
    pub fn provider_cookies(&self) -> &CookieJar {
        &self.provider_cookies
    }

    /// Close the request scope, yielding the cookies the provider set.
    #[must_use]
    pub fn into_provider_cookies(self) -> Vec<Cookie<'static>> {
        self.provider_cookies.into_cookies()
    }

    /// Check the session cookie. `Authorization` is never forwarded.
    /// # Errors
    /// Returns [`Error::Transport`] if the provider cannot be reached.
    pub async fn verify_session(&mut self) -> Result<Verification> {
        self.verify(false).await
    }

    /// Check the inbound `Authorization` header, forwarded as `Proxy-Authorization`.
    /// # Errors
    /// Returns [`Error::Transport`] if the provider cannot be reached.
    pub async fn verify_authorization_header(&mut self) -> Result<Verification> {
        self.verify(true).await
    }

    /// # Errors
    /// Returns [`Error::Transport`] if the provider cannot be reached and
    /// [`Error::Protocol`] if a 200 response does not carry a status body.
    pub async fn submit_first_factor(&mut self, credentials: &Credentials) -> Result<bool> {
        let body = FirstFactorRequest {
            username: &credentials.username,
            password: credentials.password.expose_secret(),
            keep_me_logged_in: false,
        };
        self.submit(Endpoint::FirstFactor, &body).await
    }

    /// # Errors
    /// Returns [`Error::Transport`] if the provider cannot be reached and
    /// [`Error::Protocol`] if a 200 response does not carry a status body.
    pub async fn submit_second_factor(&mut self, code: &SecretString) -> Result<bool> {
        let body = TotpRequest {
            token: code.expose_secret(),
        };
        self.submit(Endpoint::SecondFactorTotp, &body).await
    }

    async fn verify(&mut self, include_authorization: bool) -> Result<Verification> {
        let response = self
            .send::<()>(Endpoint::Verify, Method::GET, None, include_authorization)
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(%status, "Verification rejected");
            return Ok(Verification::Invalid);
        }

        Ok(Verification::Valid(self.relay_headers(response.headers())))
    }

    async fn submit<T: Serialize>(&mut self, endpoint: Endpoint, body: &T) -> Result<bool> {
        let response = self
            .send(endpoint, Method::POST, Some(body), false)
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(%endpoint, %status, "Factor rejected");
            return Ok(false);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| Error::Transport { endpoint, source })?;

        let status: StatusResponse =
            serde_json::from_slice(&bytes).map_err(|err| Error::Protocol {
                endpoint,
                reason: err.to_string(),
            })?;

        debug!(%endpoint, status = %status.status, "Factor response");

        Ok(status.is_ok())
    }

    async fn send<T: Serialize>(
        &mut self,
        endpoint: Endpoint,
        method: Method,
        body: Option<&T>,
        include_authorization: bool,
    ) -> Result<reqwest::Response> {
        let url = self.provider.endpoints().url(endpoint).clone();

        let mut headers = self.outgoing_headers(include_authorization);
        if let Some(cookie) = cookies::request_header(&self.client_cookies, &self.provider_cookies)
        {
            let value = HeaderValue::from_str(&cookie).map_err(|err| Error::Protocol {
                endpoint,
                reason: format!("cookie not representable as a header: {err}"),
            })?;
            headers.insert(header::COOKIE, value);
        }

        let mut request = self.provider.client().request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|source| Error::Transport { endpoint, source })?;

        self.store_cookies(response.headers());

        Ok(response)
    }

    fn outgoing_headers(&self, include_authorization: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Some(host) = self.inbound.get(header::HOST) {
            headers.insert(header::HOST, host.clone());
        }

        for (name, value) in self.inbound {
            if !self.allow_list.allows_client_header(name) {
                trace!(header = %name, "NOT restoring header");
                continue;
            }

            if *name == header::AUTHORIZATION {
                if include_authorization {
                    headers.append(PROVIDER_AUTHORIZATION, value.clone());
                }
                continue;
            }

            headers.append(name.clone(), value.clone());
        }

        headers
    }

    // Later responses overwrite earlier cookies of the same name.
    fn store_cookies(&mut self, response: &HeaderMap) {
        for value in response.get_all(header::SET_COOKIE) {
            let parsed = value
                .to_str()
                .ok()
                .and_then(|raw| Cookie::parse(raw.to_string()).ok());

            match parsed {
                Some(cookie) => {
                    debug!(cookie = cookie.name(), "Saving provider cookie");
                    self.provider_cookies.add(cookie);
                }
                None => warn!("Ignoring unparsable Set-Cookie from provider"),
            }
        }
    }

    fn relay_headers(&self, response: &HeaderMap) -> HeaderMap {
        let mut relayed = HeaderMap::new();
        for name in self.allow_list.relay_headers() {
            if let Some(value) = response.get(name) {
                relayed.insert(name.clone(), value.clone());
            }
        }
        relayed
    }
}
