//! Outbound verification email delivery.
//!
//! Issuance hands an [`OtpEmail`] to a [`Mailer`]. The production mailer
//! talks to the Resend transactional email API; the fallback mailer logs
//! the code so local signups work without provider credentials. Delivery is
//! fire-and-forget with respect to the stored record: a provider error is
//! reported to the caller but never retracts the pending code.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::APP_USER_AGENT;

const RESEND_BASE_URL: &str = "https://api.resend.com";

/// One verification message, rendered by the mailer that sends it.
#[derive(Clone, Debug)]
pub struct OtpEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub name: Option<String>,
    pub code: String,
}

/// How a mailer disposed of a message it accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the provider; `id` is the provider's delivery identifier.
    Sent { id: String },
    /// Written to the server log instead of being sent anywhere.
    Logged,
}

/// Email delivery abstraction consumed by the issuance service.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a message, or return an error to report a delivery failure.
    async fn send(&self, message: &OtpEmail) -> Result<Delivery>;
}

/// Local dev sender that logs the code instead of sending real email.
#[derive(Clone, Copy, Debug)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &OtpEmail) -> Result<Delivery> {
        info!(
            to_email = %message.to,
            code = %message.code,
            "no email provider configured, verification code logged"
        );
        Ok(Delivery::Logged)
    }
}

/// Resend API client (`POST /emails` with a bearer key).
#[derive(Clone, Debug)]
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl ResendMailer {
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(api_key: SecretString) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .context("failed to build email provider client")?;

        Ok(Self {
            client,
            api_key,
            base_url: RESEND_BASE_URL.to_string(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, message: &OtpEmail) -> Result<Delivery> {
        let body = serde_json::json!({
            "from": message.from,
            "to": [message.to],
            "subject": message.subject,
            "html": render_otp_html(message.name.as_deref(), &message.code),
        });

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .context("email provider unreachable")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("email provider returned {status}: {detail}"));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .context("email provider returned an unreadable response")?;
        let id = body
            .get("id")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown")
            .to_string();

        Ok(Delivery::Sent { id })
    }
}

/// HTML body for the verification email.
fn render_otp_html(name: Option<&str>, code: &str) -> String {
    let greeting = match name {
        Some(name) if !name.is_empty() => format!("Hi {name},"),
        _ => "Hi there,".to_string(),
    };

    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #2563eb;">Welcome to Unifind!</h2>
  <p>{greeting}</p>
  <p>Thank you for signing up. Please use the following verification code to complete your registration:</p>
  <div style="background-color: #f3f4f6; padding: 20px; text-align: center; margin: 20px 0; border-radius: 8px;">
    <h1 style="color: #1f2937; margin: 0; font-size: 32px; letter-spacing: 8px;">{code}</h1>
  </div>
  <p style="color: #6b7280;">This code will expire in 10 minutes.</p>
  <p style="color: #6b7280;">If you didn't request this code, please ignore this email.</p>
  <hr style="border: none; border-top: 1px solid #e5e7eb; margin: 20px 0;">
  <p style="color: #9ca3af; font-size: 12px;">This is an automated message from Unifind. Please do not reply to this email.</p>
</div>"#
    )
}
