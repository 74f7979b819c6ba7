use crate::forward_auth::provider::Endpoint;
use thiserror::Error;

/// Failures that abort a decision. Rejected credentials are not errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not reach provider {endpoint}: {source}")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected response from provider {endpoint}: {reason}")]
    Protocol { endpoint: Endpoint, reason: String },
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Protocol { .. } => "protocol",
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::Transport { endpoint, .. } | Self::Protocol { endpoint, .. } => *endpoint,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
