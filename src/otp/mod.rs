//! One-time password issuance and verification.
//!
//! The state machine per email address is `NoRecord -> Pending ->
//! {Consumed | Expired}`; both terminal states are represented by deleting
//! the entry, so a later lookup simply reports `NotFound`.

mod clock;
mod service;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use service::{
    DeliveryOutcome, IssueError, Issuance, OtpConfig, OtpService, VerifyError,
};
pub use store::{OtpStore, PendingVerification, SignupPayload};

use rand::Rng;

/// Generate a 6-digit OTP, uniform over [100000, 999999].
///
/// The lower bound keeps the leading digit non-zero so the code is always
/// exactly six ASCII digits.
#[must_use]
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// Syntactic plausibility check used at issuance time.
///
/// Intentionally permissive: anything non-empty containing an `@` may be
/// issued a code. The address only has to be deliverable, and the provider
/// is the authority on that.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    !email.is_empty() && email.contains('@')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..1_000 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(&code[0..1], "0");
        }
    }

    #[test]
    fn generated_codes_stay_in_range() {
        for _ in 0..1_000 {
            let value: u32 = generate_code().parse().expect("numeric code");
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[test]
    fn leading_digit_is_not_degenerate() {
        // Uniform over [100000, 999999] means every leading digit 1-9 shows
        // up quickly; 10k draws make a missing digit astronomically unlikely.
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let code = generate_code();
            seen.insert(code.as_bytes()[0]);
        }
        assert_eq!(seen.len(), 9, "expected all leading digits 1-9: {seen:?}");
    }

    #[test]
    fn valid_email_requires_an_at_sign() {
        assert!(valid_email("a@b.com"));
        assert!(valid_email("UPPER@CASE.COM"));
        assert!(!valid_email(""));
        assert!(!valid_email("missing-at.example.com"));
    }
}
