//! Forward-auth decision engine.
//!
//! A request is checked in a fixed order, each stage running at most once:
//!
//! 1. **Session**: the provider session cookie, if any, is verified.
//! 2. **Authorization**: a non-empty `Authorization` header is verified as is.
//! 3. **Manual login**: the header is decoded as packed `username:password<code>`
//!    Basic credentials, the first and second factor are submitted, and the freshly
//!    issued session is verified.
//!
//! Every stage yields a [`Step`]. The first non-[`Step::Continue`] ends the sequence,
//! a provider failure aborts it. Whatever the outcome, cookies set by the provider
//! during the request are returned in the [`Verdict`] so a session minted by a login
//! that later fails still reaches the client.

pub mod allow_list;
pub mod cookies;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod provider;

pub use self::{
    allow_list::AllowList,
    credentials::{CredentialError, Credentials},
    error::Error,
    gateway::{Gateway, Verification},
    provider::{Provider, ProviderConfig},
};

use crate::forward_auth::{allow_list::SESSION_COOKIE_NAME, error::Result};
use axum_extra::extract::cookie::Cookie;
use http::HeaderMap;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Session,
    Authorization,
    ManualLogin,
}

impl Stage {
    pub const SEQUENCE: [Self; 3] = [Self::Session, Self::Authorization, Self::ManualLogin];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Authorization => "authorization",
            Self::ManualLogin => "manual-login",
        }
    }
}

/// Outcome of a single stage.
#[derive(Debug)]
pub enum Step {
    /// Carries the identity headers to relay.
    Allow(HeaderMap),
    Deny,
    Continue,
}

#[derive(Debug)]
pub enum Decision {
    Allow,
    Deny,
    Error(Error),
}

impl Decision {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
            Self::Error(_) => "error",
        }
    }
}

/// Final answer for one inbound request.
#[derive(Debug)]
pub struct Verdict {
    pub decision: Decision,
    /// Identity headers for the response, empty unless the decision is [`Decision::Allow`].
    pub headers: HeaderMap,
    /// Provider cookies to set on the response, whatever the decision.
    pub cookies: Vec<Cookie<'static>>,
}

impl Verdict {
    fn new(outcome: Result<Step>, cookies: Vec<Cookie<'static>>) -> Self {
        let (decision, headers) = match outcome {
            Ok(Step::Allow(headers)) => (Decision::Allow, headers),
            Ok(Step::Deny | Step::Continue) => (Decision::Deny, HeaderMap::new()),
            Err(err) => (Decision::Error(err), HeaderMap::new()),
        };

        Self {
            decision,
            headers,
            cookies,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForwardAuth {
    provider: Provider,
    allow_list: AllowList,
}

impl ForwardAuth {
    #[must_use]
    pub fn new(provider: Provider, allow_list: AllowList) -> Self {
        Self {
            provider,
            allow_list,
        }
    }

    /// # Errors
    /// Returns an error if the provider client cannot be built from `config`.
    pub fn from_config(config: &ProviderConfig) -> anyhow::Result<Self> {
        Ok(Self::new(Provider::new(config)?, AllowList::default()))
    }

    /// Open a gateway scoped to one inbound request.
    pub fn gateway<'a>(
        &'a self,
        headers: &'a HeaderMap,
        cookies: impl IntoIterator<Item = Cookie<'static>>,
    ) -> Gateway<'a> {
        Gateway::new(&self.provider, &self.allow_list, headers, cookies)
    }

    /// Decide whether the request described by `headers` and `cookies` may pass.
    #[instrument(skip_all)]
    pub async fn decide(
        &self,
        headers: &HeaderMap,
        cookies: impl IntoIterator<Item = Cookie<'static>>,
    ) -> Verdict {
        let mut gateway = self.gateway(headers, cookies);

        let outcome = self.run(&mut gateway).await;

        // Runs on every exit path of `run`, errors included.
        let cookies = gateway.into_provider_cookies();
        for cookie in &cookies {
            debug!(cookie = cookie.name(), "Applying provider cookie");
        }

        Verdict::new(outcome, cookies)
    }

    async fn run(&self, gateway: &mut Gateway<'_>) -> Result<Step> {
        for stage in Stage::SEQUENCE {
            let step = self.attempt(stage, gateway).await?;
            debug!(stage = stage.name(), ?step, "Stage finished");

            if !matches!(step, Step::Continue) {
                return Ok(step);
            }
        }

        Ok(Step::Deny)
    }

    /// Run a single stage against `gateway`.
    /// # Errors
    /// Returns an error if the provider is unreachable or answers out of contract.
    pub async fn attempt(&self, stage: Stage, gateway: &mut Gateway<'_>) -> Result<Step> {
        match stage {
            Stage::Session => session_check(gateway).await,
            Stage::Authorization => authorization_check(gateway).await,
            Stage::ManualLogin => manual_login(gateway).await,
        }
    }
}

// The provider cannot validate a session without its cookie, so skip the call.
async fn verify_session(gateway: &mut Gateway<'_>) -> Result<Verification> {
    if !gateway.has_cookie(SESSION_COOKIE_NAME) {
        debug!("No session cookie, skipping session verification");
        return Ok(Verification::Invalid);
    }
    gateway.verify_session().await
}

async fn session_check(gateway: &mut Gateway<'_>) -> Result<Step> {
    debug!("Checking if user session is already valid");
    Ok(match verify_session(gateway).await? {
        Verification::Valid(headers) => Step::Allow(headers),
        Verification::Invalid => Step::Continue,
    })
}

async fn authorization_check(gateway: &mut Gateway<'_>) -> Result<Step> {
    if gateway.authorization().is_none() {
        return Ok(Step::Continue);
    }

    debug!("Checking if user authorization is valid");
    Ok(match gateway.verify_authorization_header().await? {
        Verification::Valid(headers) => Step::Allow(headers),
        Verification::Invalid => Step::Continue,
    })
}

async fn manual_login(gateway: &mut Gateway<'_>) -> Result<Step> {
    let Some(authorization) = gateway.authorization() else {
        debug!("No credentials for manual authentication");
        return Ok(Step::Deny);
    };

    let decoded = authorization
        .to_str()
        .map_err(|_| CredentialError::HeaderFormat)
        .and_then(Credentials::decode);

    let credentials = match decoded {
        Ok(credentials) => credentials,
        Err(err) => {
            debug!(%err, "Credentials not usable for manual authentication");
            return Ok(Step::Deny);
        }
    };

    debug!(username = %credentials.username, "Checking first factor authentication");
    if !gateway.submit_first_factor(&credentials).await? {
        return Ok(Step::Deny);
    }

    debug!(username = %credentials.username, "Checking TOTP authentication");
    if !gateway.submit_second_factor(&credentials.totp).await? {
        return Ok(Step::Deny);
    }

    debug!("Checking if new session is valid");
    Ok(match verify_session(gateway).await? {
        Verification::Valid(headers) => Step::Allow(headers),
        Verification::Invalid => Step::Deny,
    })
}
