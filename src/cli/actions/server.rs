use crate::api;
use crate::api::email::{LogMailer, Mailer, ResendMailer};
use crate::cli::actions::Action;
use crate::otp::OtpConfig;
use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            frontend_url,
            resend_api_key,
            email_from,
            otp_ttl_seconds,
            debug_otp,
        } => {
            let config = OtpConfig::new()
                .with_ttl_seconds(otp_ttl_seconds)
                .with_email_from(email_from)
                .with_surface_code(debug_otp);

            let mailer: Arc<dyn Mailer> = match resend_api_key {
                Some(api_key) => Arc::new(ResendMailer::new(api_key)?),
                None => {
                    warn!("no Resend API key configured, verification codes will be logged");
                    Arc::new(LogMailer)
                }
            };

            api::new(port, &frontend_url, config, mailer).await?;
        }
    }

    Ok(())
}
