use std::{sync::Arc, time::Duration};

use crate::{
    configuration::Configuration,
    configuration_handler::ConfigurationHandler,
    database_interface::DatabaseInterface,
    default_schedule::DefaultSchedule,
    http::create_app,
    notifications::{HttpMailTransport, LogMailTransport, MailTransport, Mailer},
    types::WeeklySchedule,
};
use tokio::time::sleep;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod booking;
mod calendar;
mod configuration;
mod configuration_handler;
mod database_interface;
mod default_schedule;
mod display;
mod error;
mod http;
mod notifications;
mod scheduler;
mod schema;
mod slots;
#[cfg(test)]
mod testutils;
mod types;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("###################");
    println!("# Session Booking #");
    println!("###################");

    let configuration = ConfigurationHandler::parse_arguments();

    let transport: Arc<dyn MailTransport> = match configuration.mail_api_url() {
        Some(endpoint) => match HttpMailTransport::new(endpoint, configuration.mail_api_key()) {
            Ok(transport) => Arc::new(transport),
            Err(err) => {
                error!(?err, "Failed to create mail API client");
                return;
            }
        },
        None => {
            info!("No mail API configured, emails are only logged");
            Arc::new(LogMailTransport)
        }
    };
    let mailer = Mailer::new(
        transport,
        configuration.mail_from(),
        configuration.operator_email(),
    );

    let address = format!("0.0.0.0:{}", configuration.port());
    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(?err, "Failed to bind {address}");
            return;
        }
    };
    println!("Accessible at:\n{address}");

    let app = if let Some(database_url) = configuration.database_url() {
        let scheduler = loop {
            match DatabaseInterface::new(&database_url) {
                Ok(scheduler) => {
                    info!("Successfully connected to database");
                    break scheduler;
                }
                Err(err) => {
                    error!(?err, "Failed to establish database connection: {database_url}. Retry in 1 sec. You may want to restart it with database disabled (built-in schedule).");
                    sleep(Duration::from_secs(1)).await;
                }
            }
        };
        create_app(scheduler, mailer, configuration)
    } else {
        let schedule = match configuration.schedule_file() {
            Some(path) => match WeeklySchedule::from_file(&path) {
                Ok(schedule) => schedule,
                Err(err) => {
                    error!(?err, "Failed to load schedule from {}", path.display());
                    return;
                }
            },
            None => WeeklySchedule::default(),
        };
        info!("No database configured, serving the built-in schedule");
        create_app(DefaultSchedule::new(schedule), mailer, configuration)
    };

    if let Err(err) = axum::serve(listener, app).await {
        error!(?err, "Server stopped");
    }
}
