use crate::{
    cli::{
        actions::{server::Args, Action},
        commands::{provider, ARG_IP, ARG_PORT, ARG_REALM},
    },
    forward_auth::ProviderConfig,
};
use anyhow::{Context, Result};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let ip = matches
        .get_one::<IpAddr>(ARG_IP)
        .copied()
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8081);

    let url = matches
        .get_one::<String>(provider::ARG_URL)
        .cloned()
        .context("missing required argument: --url")?;

    let mut provider = ProviderConfig::new(url);
    if let Some(secs) = matches.get_one::<u64>(provider::ARG_REQUEST_TIMEOUT) {
        provider.request_timeout = Duration::from_secs(*secs);
    }
    if let Some(secs) = matches.get_one::<u64>(provider::ARG_CONNECT_TIMEOUT) {
        provider.connect_timeout = Duration::from_secs(*secs);
    }

    let realm = matches
        .get_one::<String>(ARG_REALM)
        .cloned()
        .context("missing required argument: --realm")?;

    Ok(Action::Server(Args {
        listen: SocketAddr::new(ip, port),
        provider,
        realm,
    }))
}
