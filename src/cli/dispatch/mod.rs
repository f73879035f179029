//! Map validated CLI arguments to the action executed by the binary.

use crate::cli::actions::Action;
use anyhow::Result;
use secrecy::SecretString;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        frontend_url: matches
            .get_one::<String>("frontend-url")
            .cloned()
            .unwrap_or_else(|| "http://localhost:3000".to_string()),
        resend_api_key: matches
            .get_one::<String>("resend-api-key")
            .cloned()
            .map(SecretString::from),
        email_from: matches
            .get_one::<String>("email-from")
            .cloned()
            .unwrap_or_else(|| "Unifind <onboarding@resend.dev>".to_string()),
        otp_ttl_seconds: matches
            .get_one::<u64>("otp-ttl-seconds")
            .copied()
            .unwrap_or(600),
        debug_otp: matches.get_flag("debug-otp"),
    })
}
