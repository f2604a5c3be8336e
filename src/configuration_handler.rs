use crate::configuration::Configuration;
use clap::Parser;
use std::path::PathBuf;
use tracing::warn;

/// Session booking service. Every option can also be set through its environment variable or a
/// `.env` file.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct ConfigurationHandler {
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// PostgreSQL URL. Without it the built-in weekly schedule is served and bookings are kept in
    /// memory only.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// JSON weekly schedule used when no database is configured.
    #[arg(long, env = "SCHEDULE_FILE")]
    schedule_file: Option<PathBuf>,

    /// Endpoint of the transactional mail API. Without it emails are only logged.
    #[arg(long, env = "MAIL_API_URL")]
    mail_api_url: Option<String>,

    #[arg(long, env = "MAIL_API_KEY", default_value = "", hide_env_values = true)]
    mail_api_key: String,

    #[arg(long, env = "MAIL_FROM", default_value = "Session Booking <bookings@localhost>")]
    mail_from: String,

    /// Receives a copy of every booking and contact request.
    #[arg(long, env = "OPERATOR_EMAIL", default_value = "bookings@localhost")]
    operator_email: String,

    #[arg(long, env = "BOOKING_HORIZON_DAYS", default_value_t = 60)]
    booking_horizon_days: u32,

    /// Domain used in calendar event UIDs.
    #[arg(long, env = "CALENDAR_DOMAIN", default_value = "localhost")]
    calendar_domain: String,
}

impl ConfigurationHandler {
    pub fn parse_arguments() -> Self {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                warn!(?err, "Failed to load .env file");
            }
        }
        Self::parse()
    }
}

impl Configuration for ConfigurationHandler {
    fn port(&self) -> u16 {
        self.port
    }

    fn database_url(&self) -> Option<String> {
        self.database_url.clone().filter(|url| !url.is_empty())
    }

    fn schedule_file(&self) -> Option<PathBuf> {
        self.schedule_file.clone()
    }

    fn mail_api_url(&self) -> Option<String> {
        self.mail_api_url.clone().filter(|url| !url.is_empty())
    }

    fn mail_api_key(&self) -> String {
        self.mail_api_key.clone()
    }

    fn mail_from(&self) -> String {
        self.mail_from.clone()
    }

    fn operator_email(&self) -> String {
        self.operator_email.clone()
    }

    fn booking_horizon_days(&self) -> u32 {
        self.booking_horizon_days
    }

    fn calendar_domain(&self) -> String {
        self.calendar_domain.clone()
    }
}
