use crate::forward_auth::provider::parse_base_url;
use clap::{builder::ValueParser, Arg, Command};

pub const ARG_URL: &str = "url";
pub const ARG_REQUEST_TIMEOUT: &str = "request-timeout";
pub const ARG_CONNECT_TIMEOUT: &str = "connect-timeout";

pub const DEFAULT_URL: &str = "http://authelia:9091";

#[must_use]
pub fn validator_url() -> ValueParser {
    ValueParser::from(move |raw: &str| -> std::result::Result<String, String> {
        parse_base_url(raw)
            .map(|_| raw.to_string())
            .map_err(|err| err.to_string())
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_URL)
                .long("url")
                .help("Identity provider base URL, example: http://authelia:9091")
                .default_value(DEFAULT_URL)
                .env("BASIC2FA_URL")
                .value_parser(validator_url()),
        )
        .arg(
            Arg::new(ARG_REQUEST_TIMEOUT)
                .long("request-timeout")
                .help("Identity provider request timeout in seconds")
                .default_value("10")
                .env("BASIC2FA_REQUEST_TIMEOUT")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_CONNECT_TIMEOUT)
                .long("connect-timeout")
                .help("Identity provider connect timeout in seconds")
                .default_value("5")
                .env("BASIC2FA_CONNECT_TIMEOUT")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
