//! Identity provider REST contract.
//!
//! Only the base URL is configured; endpoint paths and payloads are fixed by the
//! provider's API:
//! - `GET  /api/verify` validates the session cookie or the proxied authorization.
//! - `POST /api/firstfactor` checks username and password.
//! - `POST /api/secondfactor/totp` checks the one-time code.

use anyhow::{anyhow, Context, Result};
use reqwest::{redirect, Client};
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};
use url::Url;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Status the factor endpoints report on success.
pub const STATUS_OK: &str = "OK";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Verify,
    FirstFactor,
    SecondFactorTotp,
}

impl Endpoint {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Verify => "/api/verify",
            Self::FirstFactor => "/api/firstfactor",
            Self::SecondFactorTotp => "/api/secondfactor/totp",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Parse a provider base URL: absolute http(s) with a host, an optional path prefix,
/// no query and no fragment.
/// # Errors
/// Returns an error describing the first rule `raw` breaks.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let base = Url::parse(raw).with_context(|| format!("invalid provider URL: {raw}"))?;

    if !matches!(base.scheme(), "http" | "https") {
        return Err(anyhow!(
            "invalid provider URL: unsupported scheme {}",
            base.scheme()
        ));
    }

    if base.host().is_none() {
        return Err(anyhow!("invalid provider URL: no host specified"));
    }

    if base.query().is_some() || base.fragment().is_some() {
        return Err(anyhow!(
            "invalid provider URL: query and fragment are not allowed"
        ));
    }

    Ok(base)
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    verify: Url,
    first_factor: Url,
    second_factor_totp: Url,
}

impl Endpoints {
    /// Build endpoint URLs by appending the API paths to `base_url`, keeping any path prefix.
    /// # Errors
    /// Returns an error if `base_url` is not a valid provider base URL, see [`parse_base_url`].
    pub fn new(base_url: &str) -> Result<Self> {
        let base = parse_base_url(base_url)?;
        let prefix = base.path().trim_end_matches('/').to_string();

        let endpoint = |endpoint: Endpoint| -> Url {
            let mut url = base.clone();
            url.set_path(&format!("{prefix}{}", endpoint.path()));
            url
        };

        Ok(Self {
            verify: endpoint(Endpoint::Verify),
            first_factor: endpoint(Endpoint::FirstFactor),
            second_factor_totp: endpoint(Endpoint::SecondFactorTotp),
        })
    }

    #[must_use]
    pub fn url(&self, endpoint: Endpoint) -> &Url {
        match endpoint {
            Endpoint::Verify => &self.verify,
            Endpoint::FirstFactor => &self.first_factor,
            Endpoint::SecondFactorTotp => &self.second_factor_totp,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl ProviderConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Shared HTTP client and endpoints, built once per process.
#[derive(Debug, Clone)]
pub struct Provider {
    client: Client,
    endpoints: Endpoints,
}

impl Provider {
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let endpoints = Endpoints::new(&config.base_url)?;

        // Redirects are answers, not hops: a 3xx from /api/verify means "not valid".
        // Cookies are tracked per inbound request, never in the client.
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .redirect(redirect::Policy::none())
            .build()
            .context("failed to build provider HTTP client")?;

        Ok(Self { client, endpoints })
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

#[derive(Serialize, Debug)]
pub struct FirstFactorRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    #[serde(rename = "keepMeLoggedIn")]
    pub keep_me_logged_in: bool,
}

#[derive(Serialize, Debug)]
pub struct TotpRequest<'a> {
    pub token: &'a str,
}

#[derive(Deserialize, Debug)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}
