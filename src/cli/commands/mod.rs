pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const ARG_PORT: &str = "port";
pub const ARG_IDENTITY_URL: &str = "identity-url";
pub const ARG_PORTAL_ORIGIN: &str = "portal-origin";
pub const ARG_CHALLENGE_COOLDOWN: &str = "challenge-cooldown-seconds";
pub const ARG_MAX_ATTEMPTS: &str = "max-verification-attempts";
pub const ARG_ACCESS_TTL: &str = "access-token-ttl-seconds";
pub const ARG_REFRESH_TTL: &str = "refresh-token-ttl-seconds";
pub const ARG_RETRY_COUNT: &str = "retry-count";
pub const ARG_BACKOFF_BASE_MS: &str = "backoff-base-ms";
pub const ARG_BACKOFF_CAP_MS: &str = "backoff-cap-ms";
pub const ARG_REQUEST_TIMEOUT: &str = "request-timeout-seconds";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!(
            "{} - {}",
            env!("CARGO_PKG_VERSION"),
            crate::api::GIT_COMMIT_HASH
        )
        .into_boxed_str(),
    );

    let command = Command::new("ensaluto")
        .about("One-time code authentication and session token lifecycle")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("ENSALUTO_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_IDENTITY_URL)
                .long(ARG_IDENTITY_URL)
                .help("Identity provider base URL")
                .long_help(
                    "Identity provider base URL. When omitted the embedded in-process backend is used and issued codes are written to the log stream (local development only).",
                )
                .env("ENSALUTO_IDENTITY_URL"),
        )
        .arg(
            Arg::new(ARG_PORTAL_ORIGIN)
                .long(ARG_PORTAL_ORIGIN)
                .help("Portal origin allowed by CORS")
                .default_value("http://localhost:3000")
                .env("ENSALUTO_PORTAL_ORIGIN"),
        )
        .arg(
            Arg::new(ARG_CHALLENGE_COOLDOWN)
                .long(ARG_CHALLENGE_COOLDOWN)
                .help("Minimum interval between challenge requests per email and purpose")
                .default_value("60")
                .env("ENSALUTO_CHALLENGE_COOLDOWN_SECONDS")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_MAX_ATTEMPTS)
                .long(ARG_MAX_ATTEMPTS)
                .help("Verification attempts allowed per challenge")
                .default_value("3")
                .env("ENSALUTO_MAX_VERIFICATION_ATTEMPTS")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_ACCESS_TTL)
                .long(ARG_ACCESS_TTL)
                .help("Access token lifetime in seconds")
                .default_value("900")
                .env("ENSALUTO_ACCESS_TOKEN_TTL_SECONDS")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_REFRESH_TTL)
                .long(ARG_REFRESH_TTL)
                .help("Refresh token lifetime in seconds")
                .default_value("1209600")
                .env("ENSALUTO_REFRESH_TOKEN_TTL_SECONDS")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_RETRY_COUNT)
                .long(ARG_RETRY_COUNT)
                .help("Retry budget for transient provider failures")
                .default_value("3")
                .env("ENSALUTO_RETRY_COUNT")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_BACKOFF_BASE_MS)
                .long(ARG_BACKOFF_BASE_MS)
                .help("Exponential backoff base delay in milliseconds")
                .default_value("250")
                .env("ENSALUTO_BACKOFF_BASE_MS")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_BACKOFF_CAP_MS)
                .long(ARG_BACKOFF_CAP_MS)
                .help("Maximum backoff delay in milliseconds")
                .default_value("5000")
                .env("ENSALUTO_BACKOFF_CAP_MS")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_REQUEST_TIMEOUT)
                .long(ARG_REQUEST_TIMEOUT)
                .help("Per-request timeout for provider calls in seconds")
                .default_value("10")
                .env("ENSALUTO_REQUEST_TIMEOUT_SECONDS")
                .value_parser(clap::value_parser!(u64)),
        );

    logging::with_args(command)
}
