pub mod server;

use secrecy::SecretString;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        frontend_url: String,
        resend_api_key: Option<SecretString>,
        email_from: String,
        otp_ttl_seconds: u64,
        debug_otp: bool,
    },
}
