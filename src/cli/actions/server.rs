use crate::{
    api::{self, AppState},
    cli::telemetry,
    forward_auth::{ForwardAuth, ProviderConfig},
};
use anyhow::Result;
use std::{fmt::Write as _, net::SocketAddr};
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub listen: SocketAddr,
    pub provider: ProviderConfig,
    pub realm: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the provider client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let forward_auth = ForwardAuth::from_config(&args.provider)?;
    let state = AppState::new(forward_auth, &args.realm)?;

    let served = api::new(args.listen, state).await;

    telemetry::shutdown_tracer();

    served
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", args.listen.to_string()),
        ("provider_url", args.provider.base_url.clone()),
        (
            "request_timeout",
            format!("{}s", args.provider.request_timeout.as_secs()),
        ),
        (
            "connect_timeout",
            format!("{}s", args.provider.connect_timeout.as_secs()),
        ),
        ("realm", args.realm.clone()),
    ];
    info!("{}", startup_message("Startup configuration", &entries));
}

fn startup_message(title: &str, entries: &[(&str, String)]) -> String {
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!("{}\n\n{title}:", banner());
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ = write!(message, "\n  {key}:{padding} {value}");
    }
    message
}

fn banner() -> String {
    let short_hash = short_commit(crate::GIT_COMMIT_HASH);
    BANNER.replace(
        "{VERSION}",
        &format!(" - {} - {}", env!("CARGO_PKG_VERSION"), short_hash),
    )
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.len() > 7 {
        trimmed[..7].to_string()
    } else {
        trimmed.to_string()
    }
}

const BANNER: &str = r"
  .-----.
  | 2FA |   B A S I C 2 F A {VERSION}
  '-----'";
