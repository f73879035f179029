//! # Unifind identity service
//!
//! `unifind` is the signup and login backend for the Unifind student
//! dashboard. It proves control of an email address with a short-lived
//! one-time password (OTP): signup issues a 6-digit code delivered by a
//! transactional email provider, and the same code later confirms an email
//! change or authenticates a credential login.
//!
//! ## OTP lifecycle
//!
//! At most one pending code exists per email address. Issuing again for the
//! same address supersedes the previous code; the old one is permanently
//! invalid from that instant. A code is deleted on first successful
//! verification (single-use) or on the first verification attempt made after
//! its expiry (lazy expiry, no background sweeper).
//!
//! > **Warning:** the pending-code store lives in process memory. It is not
//! > durable across restarts and is not shared between instances; run a
//! > single instance or put a shared store behind it before scaling out.
//!
//! ## Email keys
//!
//! Addresses are used as store keys exactly as submitted. No case folding or
//! whitespace trimming is applied, so `A@B.com` and `a@b.com` are distinct
//! identities.

pub mod api;
pub mod cli;
pub mod otp;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
