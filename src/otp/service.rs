//! Issuance and verification policy on top of the store.

use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::api::email::{Delivery, Mailer, OtpEmail};
use crate::otp::store::{OtpStore, PendingVerification, SignupPayload, Taken, Verdict};
use crate::otp::{generate_code, valid_email, Clock};

const DEFAULT_OTP_TTL_SECONDS: u64 = 10 * 60;
const DEFAULT_EMAIL_FROM: &str = "Unifind <onboarding@resend.dev>";
const DEFAULT_EMAIL_SUBJECT: &str = "Your Unifind Verification Code";

/// Issuance cannot proceed; nothing was stored or sent.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IssueError {
    #[error("Invalid email address")]
    InvalidEmail,
}

/// Verification rejections. Exactly one of these (or success) per call.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Email and OTP are required")]
    MissingParameters,
    /// Covers "never issued" as well as "already consumed or expired and
    /// swept" -- deletion is how terminal states are represented.
    #[error("OTP not found or expired")]
    NotFound,
    #[error("OTP expired")]
    Expired,
    #[error("Invalid OTP")]
    InvalidCode,
}

/// How the code left the building. A failed delivery never retracts the
/// stored record; the code stays valid until expiry or supersession.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Provider accepted the message.
    Sent { id: String },
    /// No provider configured; the code was written to the server log.
    Logged,
    /// Provider rejected the request or was unreachable.
    Failed { reason: String },
}

/// Result of a successful issuance.
#[derive(Clone, Debug)]
pub struct Issuance {
    pub code: String,
    pub delivery: DeliveryOutcome,
}

#[derive(Clone, Debug)]
pub struct OtpConfig {
    ttl: Duration,
    email_from: String,
    email_subject: String,
    surface_code: bool,
}

impl OtpConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_OTP_TTL_SECONDS),
            email_from: DEFAULT_EMAIL_FROM.to_string(),
            email_subject: DEFAULT_EMAIL_SUBJECT.to_string(),
            surface_code: false,
        }
    }

    #[must_use]
    pub fn with_ttl_seconds(mut self, seconds: u64) -> Self {
        self.ttl = Duration::from_secs(seconds);
        self
    }

    #[must_use]
    pub fn with_email_from(mut self, from: String) -> Self {
        self.email_from = from;
        self
    }

    #[must_use]
    pub fn with_email_subject(mut self, subject: String) -> Self {
        self.email_subject = subject;
        self
    }

    /// Surface raw codes in API responses when delivery is unavailable.
    /// Local/debug use only; never enable on a production-facing channel.
    #[must_use]
    pub fn with_surface_code(mut self, surface_code: bool) -> Self {
        self.surface_code = surface_code;
        self
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub fn email_from(&self) -> &str {
        &self.email_from
    }

    #[must_use]
    pub fn email_subject(&self) -> &str {
        &self.email_subject
    }

    #[must_use]
    pub fn surface_code(&self) -> bool {
        self.surface_code
    }
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the store, the clock, and the mailer. One instance per process;
/// tests construct their own with a [`ManualClock`](crate::otp::ManualClock).
pub struct OtpService {
    config: OtpConfig,
    store: OtpStore,
    clock: Arc<dyn Clock>,
    mailer: Arc<dyn Mailer>,
}

impl OtpService {
    #[must_use]
    pub fn new(config: OtpConfig, clock: Arc<dyn Clock>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            config,
            store: OtpStore::new(),
            clock,
            mailer,
        }
    }

    #[must_use]
    pub fn config(&self) -> &OtpConfig {
        &self.config
    }

    /// Generate, store, and dispatch a fresh code for `email`.
    ///
    /// Any prior pending code for the same address is superseded before the
    /// delivery attempt, so the stored record never depends on the provider.
    ///
    /// # Errors
    /// Returns [`IssueError::InvalidEmail`] when the address is not even
    /// syntactically plausible.
    pub async fn issue(
        &self,
        name: Option<String>,
        email: String,
        password: Option<SecretString>,
    ) -> Result<Issuance, IssueError> {
        if !valid_email(&email) {
            return Err(IssueError::InvalidEmail);
        }

        let code = generate_code();
        let record = PendingVerification {
            code: code.clone(),
            expires_at: self.clock.now() + self.config.ttl(),
            payload: SignupPayload {
                name: name.clone(),
                email: email.clone(),
                password,
            },
        };
        self.store.put(email.clone(), record).await;
        info!(%email, "stored pending verification");

        let message = OtpEmail {
            from: self.config.email_from().to_string(),
            to: email.clone(),
            subject: self.config.email_subject().to_string(),
            name,
            code: code.clone(),
        };
        let delivery = match self.mailer.send(&message).await {
            Ok(Delivery::Sent { id }) => {
                info!(%email, delivery_id = %id, "verification code sent");
                DeliveryOutcome::Sent { id }
            }
            Ok(Delivery::Logged) => DeliveryOutcome::Logged,
            Err(err) => {
                // The record stays stored; the code remains redeemable.
                warn!(%email, "verification email failed: {err:#}");
                DeliveryOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };

        Ok(Issuance { code, delivery })
    }

    /// Validate `code` against the pending record for `email`.
    ///
    /// Single verification path for both call sites (email-change
    /// confirmation and login); the lookup, expiry check, equality check,
    /// and removal happen atomically with respect to concurrent issuance.
    ///
    /// # Errors
    /// One of [`VerifyError::MissingParameters`], [`VerifyError::NotFound`],
    /// [`VerifyError::Expired`] (record removed) or
    /// [`VerifyError::InvalidCode`] (record retained, retries allowed).
    pub async fn verify(&self, email: &str, code: &str) -> Result<SignupPayload, VerifyError> {
        if email.is_empty() || code.is_empty() {
            return Err(VerifyError::MissingParameters);
        }

        let now = self.clock.now();
        let taken = self
            .store
            .take_if(email, |record| {
                if now > record.expires_at {
                    // Expiry wins even when the submitted code matches.
                    Verdict::Discard
                } else if record.code == code {
                    Verdict::Consume
                } else {
                    Verdict::Retain
                }
            })
            .await;

        match taken {
            Taken::Consumed(record) => {
                info!(%email, "verification code consumed");
                Ok(record.payload)
            }
            Taken::Discarded => {
                info!(%email, "verification code expired, record removed");
                Err(VerifyError::Expired)
            }
            Taken::Retained => Err(VerifyError::InvalidCode),
            Taken::Missing => Err(VerifyError::NotFound),
        }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &OtpStore {
        &self.store
    }
}
