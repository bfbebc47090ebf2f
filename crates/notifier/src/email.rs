//! SMTP email adapter.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use relay_common::config::SmtpConfig;
use relay_common::error::AppError;
use relay_common::types::EmailIntent;

use crate::Mailer;

/// Sends mail through one STARTTLS SMTP relay built at startup.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    default_from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::Config(format!("SMTP relay error: {e}")))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            default_from: config
                .from
                .clone()
                .unwrap_or_else(|| config.username.clone()),
        })
    }
}

/// Build the MIME message for an email intent.
///
/// With `html` present the mail is multipart/alternative, otherwise plain text.
pub fn build_message(default_from: &str, mail: &EmailIntent) -> Result<Message, AppError> {
    let sender = mail.sender.as_deref().unwrap_or(default_from);
    let from: Mailbox = sender
        .parse()
        .map_err(|e| AppError::channel("email", format!("Invalid from address: {e}")))?;
    let to: Mailbox = mail
        .to
        .parse()
        .map_err(|e| AppError::channel("email", format!("Invalid to address: {e}")))?;

    let builder = Message::builder().from(from).to(to).subject(mail.subject.as_str());

    let message = match &mail.html {
        Some(html) => builder.multipart(MultiPart::alternative_plain_html(
            mail.text.clone(),
            html.clone(),
        )),
        None => builder
            .header(ContentType::TEXT_PLAIN)
            .body(mail.text.clone()),
    };

    message.map_err(|e| AppError::channel("email", format!("Failed to build email: {e}")))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_email(&self, mail: &EmailIntent) -> Result<(), AppError> {
        let message = build_message(&self.default_from, mail)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::channel("email", format!("SMTP send failed: {e}")))?;

        tracing::info!(to = %mail.to, "Email sent");
        Ok(())
    }
}
