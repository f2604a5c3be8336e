use crate::{
    display::{format_booking_date, parse_timezone, utc_to_local},
    types::{Booking, ContactRequest},
};
use async_trait::async_trait;
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tracing::{error, info};

const MAIL_API_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Mail request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Mail API rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), NotificationError>;
}

/// Sends mail through a transactional mail HTTP API that accepts
/// `{"from", "to", "subject", "html"}` JSON with a bearer token.
pub struct HttpMailTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpMailTransport {
    pub fn new(endpoint: String, api_key: String) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(MAIL_API_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl MailTransport for HttpMailTransport {
    async fn send(&self, email: OutgoingEmail) -> Result<(), NotificationError> {
        info!(to = ?email.to, subject = %email.subject, "Sending email");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&email)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "Mail API returned an error");
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Used when no mail API is configured. Emails only show up in the log.
pub struct LogMailTransport;

#[async_trait]
impl MailTransport for LogMailTransport {
    async fn send(&self, email: OutgoingEmail) -> Result<(), NotificationError> {
        info!(to = ?email.to, subject = %email.subject, "Mail delivery disabled, email not sent");
        Ok(())
    }
}

#[derive(Clone)]
pub struct Mailer {
    transport: Arc<dyn MailTransport>,
    from: String,
    operator_email: String,
}

impl Mailer {
    pub fn new(transport: Arc<dyn MailTransport>, from: String, operator_email: String) -> Self {
        Self {
            transport,
            from,
            operator_email,
        }
    }

    /// Client confirmation and operator notification for a new booking.
    pub fn booking_emails(&self, booking: &Booking) -> (OutgoingEmail, OutgoingEmail) {
        let date = format_booking_date(booking.date);
        let time = match parse_timezone(&booking.timezone) {
            Ok(timezone) => format!(
                "{} - {} ({})",
                utc_to_local(booking.date, booking.start_time, timezone),
                utc_to_local(booking.date, booking.end_time, timezone),
                booking.timezone
            ),
            Err(_) => format!("{} - {} (UTC)", booking.start_time, booking.end_time),
        };
        let name = escape_html(&booking.client_name);
        let description = if booking.description.trim().is_empty() {
            "No description provided".to_string()
        } else {
            escape_html(&booking.description)
        };

        let client = OutgoingEmail {
            from: self.from.clone(),
            to: vec![booking.client_email.clone()],
            subject: "Discovery Session Confirmed".to_string(),
            html: format!(
                "<h1>Session Confirmed!</h1>\
                 <p>Hi {name}, your Discovery Session has been booked.</p>\
                 <p><strong>Date:</strong> {date}</p>\
                 <p><strong>Time:</strong> {time}</p>\
                 <p><strong>Duration:</strong> 60 minutes</p>\
                 <p>A meeting link will follow closer to the session.</p>"
            ),
        };

        let operator = OutgoingEmail {
            from: self.from.clone(),
            to: vec![self.operator_email.clone()],
            subject: format!("New Booking: {}", booking.client_name),
            html: format!(
                "<h2>New Discovery Session Booked</h2>\
                 <p><strong>Client:</strong> {name}</p>\
                 <p><strong>Email:</strong> {email}</p>\
                 <p><strong>Date:</strong> {date}</p>\
                 <p><strong>Time:</strong> {time}</p>\
                 <p><strong>UTC:</strong> {start} - {end}</p>\
                 <p><strong>Description:</strong> {description}</p>",
                email = escape_html(&booking.client_email),
                start = booking.start_time,
                end = booking.end_time,
            ),
        };

        (client, operator)
    }

    pub async fn send_booking_confirmation(&self, booking: &Booking) -> Result<(), NotificationError> {
        let (client, operator) = self.booking_emails(booking);
        let (client_result, operator_result) =
            futures::join!(self.transport.send(client), self.transport.send(operator));
        client_result.and(operator_result)
    }

    pub fn contact_email(&self, contact: &ContactRequest) -> OutgoingEmail {
        OutgoingEmail {
            from: self.from.clone(),
            to: vec![self.operator_email.clone()],
            subject: format!("New Contact: {}", contact.name),
            html: format!(
                "<h2>New Contact Form Submission</h2>\
                 <p><strong>Name:</strong> {}</p>\
                 <p><strong>Email:</strong> {}</p>\
                 <p><strong>Message:</strong></p>\
                 <p style=\"white-space: pre-wrap\">{}</p>",
                escape_html(&contact.name),
                escape_html(&contact.email),
                escape_html(&contact.message),
            ),
        }
    }

    pub async fn send_contact_notification(
        &self,
        contact: &ContactRequest,
    ) -> Result<(), NotificationError> {
        self.transport.send(self.contact_email(contact)).await
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
