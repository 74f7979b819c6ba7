//! # basic2fa
//!
//! Forward-auth shim that sits between a reverse proxy and an Authelia-compatible
//! identity provider. The proxy sends every protected request here as a subrequest
//! and receives one of three answers:
//!
//! - **200** with `Remote-User`, `Remote-Groups`, `Remote-Name` and `Remote-Email`
//!   when the client is authenticated.
//! - **401** with a Basic challenge when it is not.
//! - **500** when the provider cannot be reached or answers out of contract.
//!
//! Clients that cannot run a browser login flow authenticate with plain HTTP Basic,
//! appending their six digit one-time code to the password:
//!
//! ```text
//! Authorization: Basic base64("alice:hunter2" + "123456")
//! ```
//!
//! The shim then performs both factors against the provider on the client's behalf
//! and hands the resulting session cookie back, so subsequent requests are served
//! from the session alone.

pub mod api;
pub mod cli;
pub mod forward_auth;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
