// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outbound mail: the message type handed to a transport, and the SMTP
//! transport used in production.

use crate::config::MailConfig;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;
use tracing::debug;

/// Mail delivery errors.
#[derive(Debug, Error, Clone)]
pub enum MailError {
    #[error("invalid mailbox {0:?}")]
    InvalidMailbox(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("mail transport error: {0}")]
    Transport(String),

    #[error("mail send timed out")]
    Timeout,
}

/// One email ready to be handed to a [`MailTransport`].
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub from: Mailbox,
    pub to: Mailbox,
    pub reply_to: Option<Mailbox>,
    pub subject: String,
    pub html_body: String,
}

/// Build a mailbox from an optional display name and a bare address.
pub fn mailbox(name: Option<&str>, address: &str) -> Result<Mailbox, MailError> {
    let email: Address = address
        .parse()
        .map_err(|_| MailError::InvalidMailbox(address.to_string()))?;
    Ok(Mailbox::new(name.map(str::to_string), email))
}

impl TryFrom<OutboundMessage> for Message {
    type Error = MailError;

    fn try_from(message: OutboundMessage) -> Result<Self, Self::Error> {
        let mut builder = Message::builder()
            .from(message.from)
            .to(message.to)
            .subject(message.subject)
            .header(ContentType::TEXT_HTML);
        if let Some(reply_to) = message.reply_to {
            builder = builder.reply_to(reply_to);
        }
        builder
            .body(message.html_body)
            .map_err(|err| MailError::Build(err.to_string()))
    }
}

/// Capability to deliver one message.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: OutboundMessage) -> Result<(), MailError>;
}

/// Authenticated SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer").finish_non_exhaustive()
    }
}

impl SmtpMailer {
    /// Build the relay transport from configuration.
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let smtp = &config.smtp;
        let builder = if smtp.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
        }
        .map_err(|err| MailError::Transport(err.to_string()))?;

        let mut builder = builder.timeout(Some(config.send_timeout()));
        if let Some(port) = smtp.port {
            builder = builder.port(port);
        }

        if let Some(password) = smtp.password.as_deref() {
            let username = smtp
                .username
                .clone()
                .or_else(|| config.operator_address.clone())
                .unwrap_or_default();
            builder = builder.credentials(Credentials::new(username, password.to_string()));
        }

        debug!(host = %smtp.host, port = ?smtp.port, starttls = smtp.starttls, "SMTP transport configured");
        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, message: OutboundMessage) -> Result<(), MailError> {
        let message = Message::try_from(message)?;
        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|err| MailError::Transport(err.to_string()))
    }
}
