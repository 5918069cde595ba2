//! Command-line argument dispatch and server initialization.
//!
//! This module maps validated CLI arguments to the appropriate action,
//! such as starting the API server with its full configuration state.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands;
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches
        .get_one::<u16>(commands::ARG_PORT)
        .copied()
        .unwrap_or(8080);
    let portal_origin = matches
        .get_one::<String>(commands::ARG_PORTAL_ORIGIN)
        .cloned()
        .context("missing required argument: --portal-origin")?;

    Ok(Action::Server(Args {
        port,
        identity_url: matches.get_one::<String>(commands::ARG_IDENTITY_URL).cloned(),
        portal_origin,
        challenge_cooldown_seconds: matches
            .get_one::<i64>(commands::ARG_CHALLENGE_COOLDOWN)
            .copied()
            .unwrap_or(60),
        max_verification_attempts: matches
            .get_one::<u32>(commands::ARG_MAX_ATTEMPTS)
            .copied()
            .unwrap_or(3),
        access_token_ttl_seconds: matches
            .get_one::<i64>(commands::ARG_ACCESS_TTL)
            .copied()
            .unwrap_or(900),
        refresh_token_ttl_seconds: matches
            .get_one::<i64>(commands::ARG_REFRESH_TTL)
            .copied()
            .unwrap_or(1_209_600),
        retry_count: matches
            .get_one::<u32>(commands::ARG_RETRY_COUNT)
            .copied()
            .unwrap_or(3),
        backoff_base_ms: matches
            .get_one::<u64>(commands::ARG_BACKOFF_BASE_MS)
            .copied()
            .unwrap_or(250),
        backoff_cap_ms: matches
            .get_one::<u64>(commands::ARG_BACKOFF_CAP_MS)
            .copied()
            .unwrap_or(5_000),
        request_timeout_seconds: matches
            .get_one::<u64>(commands::ARG_REQUEST_TIMEOUT)
            .copied()
            .unwrap_or(10),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_maps_flags_to_server_args() -> Result<()> {
        temp_env::with_vars(
            [
                ("ENSALUTO_PORT", None::<&str>),
                ("ENSALUTO_IDENTITY_URL", None),
            ],
            || {
                let matches = commands::new().get_matches_from(vec![
                    "ensaluto",
                    "--port",
                    "9000",
                    "--identity-url",
                    "https://identity.test",
                    "--challenge-cooldown-seconds",
                    "45",
                ]);
                let action = handler(&matches)?;
                let Action::Server(args) = action;
                assert_eq!(args.port, 9000);
                assert_eq!(args.identity_url.as_deref(), Some("https://identity.test"));
                assert_eq!(args.challenge_cooldown_seconds, 45);
                assert_eq!(args.max_verification_attempts, 3);
                Ok(())
            },
        )
    }

    #[test]
    fn handler_defaults_to_embedded_backend() -> Result<()> {
        temp_env::with_vars([("ENSALUTO_IDENTITY_URL", None::<&str>)], || {
            let matches = commands::new().get_matches_from(vec!["ensaluto"]);
            let action = handler(&matches)?;
            let Action::Server(args) = action;
            assert_eq!(args.identity_url, None);
            assert_eq!(args.port, 8080);
            Ok(())
        })
    }
}
