use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("unifind")
        .about("Email OTP signup and login service")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("UNIFIND_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("frontend-url")
                .long("frontend-url")
                .help("Dashboard origin allowed by CORS, example: http://localhost:3000")
                .default_value("http://localhost:3000")
                .env("UNIFIND_FRONTEND_URL"),
        )
        .arg(
            Arg::new("resend-api-key")
                .long("resend-api-key")
                .help("Resend API key; without it verification codes are logged instead of emailed")
                .env("UNIFIND_RESEND_API_KEY"),
        )
        .arg(
            Arg::new("email-from")
                .long("email-from")
                .help("From header for verification emails")
                .default_value("Unifind <onboarding@resend.dev>")
                .env("UNIFIND_EMAIL_FROM"),
        )
        .arg(
            Arg::new("otp-ttl-seconds")
                .long("otp-ttl-seconds")
                .help("Seconds a verification code stays valid")
                .default_value("600")
                .env("UNIFIND_OTP_TTL_SECONDS")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("debug-otp")
                .long("debug-otp")
                .help("Surface raw codes in API responses when delivery is unavailable (local use only)")
                .env("UNIFIND_DEBUG_OTP")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("UNIFIND_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}
