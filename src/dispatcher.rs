// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Sends the two mails for an accepted submission.
//!
//! The operator notification goes first, then the acknowledgment to the
//! submitter. Each send is bounded by a timeout. A failure of the second send
//! does not recall the first.

use crate::config::{MailConfig, SiteConfig};
use crate::error::{GatekeeperError, StartupError};
use crate::mailer::{mailbox, MailError, MailTransport, OutboundMessage};
use crate::sanitizer::{escape_html, SanitizedSubmission};
use crate::validator::Submission;
use chrono::{DateTime, Utc};
use lettre::message::Mailbox;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Which of the two mails is being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailKind {
    OperatorNotification,
    SubmitterAcknowledgment,
}

impl MailKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OperatorNotification => "operator_notification",
            Self::SubmitterAcknowledgment => "submitter_acknowledgment",
        }
    }
}

/// Mail templates for one site.
#[derive(Debug, Clone)]
pub struct Templates {
    site: SiteConfig,
}

impl Templates {
    pub fn new(site: SiteConfig) -> Self {
        Self { site }
    }

    fn footer(&self, lead: &str) -> String {
        let url = escape_html(&self.site.url);
        let host = escape_html(
            self.site
                .url
                .trim_start_matches("https://")
                .trim_start_matches("http://")
                .trim_end_matches('/'),
        );
        format!(
            r#"<p style="font-size: 0.9em; color: gray;">{lead} <a href="{url}" target="_blank">{host}</a>.</p>"#
        )
    }

    /// Body of the notification sent to the operator.
    pub fn operator_notification(
        &self,
        fields: &SanitizedSubmission,
        received_at: DateTime<Utc>,
    ) -> String {
        format!(
            "<h2>New message from the contact form</h2>\n\
             <p><strong>Name:</strong> {name}</p>\n\
             <p><strong>Email:</strong> {email}</p>\n\
             <p><strong>Subject:</strong> {subject}</p>\n\
             <p><strong>Message:</strong><br>\n{message}</p>\n\
             <p><strong>Received:</strong> {received}</p>\n\
             <hr>\n{footer}\n",
            name = fields.name,
            email = fields.email,
            subject = fields.subject,
            message = fields.message,
            received = received_at.format("%Y-%m-%d %H:%M:%S UTC"),
            footer = self.footer("Sent from"),
        )
    }

    /// Body of the automatic reply sent to the submitter.
    pub fn submitter_acknowledgment(&self, fields: &SanitizedSubmission) -> String {
        format!(
            "<h3>Hello {name},</h3>\n\
             <p>Thank you for reaching out to {site}.</p>\n\
             <p>We have received your message and will respond as soon as possible.</p>\n\
             <hr>\n\
             <p><strong>Your message:</strong></p>\n\
             <p>{message}</p>\n\
             <br>\n{footer}\n",
            name = fields.name,
            site = escape_html(&self.site.name),
            message = fields.message,
            footer = self.footer("This is an automatic response from"),
        )
    }

    /// Subject line of the automatic reply.
    pub fn acknowledgment_subject(subject: &str) -> String {
        format!("We received your message: {}", subject)
    }
}

/// Builds and sends the two outbound mails.
pub struct Dispatcher {
    transport: Arc<dyn MailTransport>,
    operator: Mailbox,
    sender: Mailbox,
    templates: Templates,
    send_timeout: Duration,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("operator", &self.operator)
            .field("sender", &self.sender)
            .field("send_timeout", &self.send_timeout)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(
        config: &MailConfig,
        site: SiteConfig,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self, StartupError> {
        let operator = mailbox(None, config.operator()?)?;
        let sender = mailbox(Some(site.name.as_str()), config.sender()?)?;

        Ok(Self {
            transport,
            operator,
            sender,
            templates: Templates::new(site),
            send_timeout: config.send_timeout(),
        })
    }

    /// Build both messages for a validated submission, in send order.
    pub fn compose(
        &self,
        submission: &Submission,
        received_at: DateTime<Utc>,
    ) -> Result<[(MailKind, OutboundMessage); 2], MailError> {
        let fields = SanitizedSubmission::new(submission);
        let submitter = mailbox(Some(submission.name.as_str()), &submission.email)?;

        let notification = OutboundMessage {
            from: self.sender.clone(),
            to: self.operator.clone(),
            reply_to: Some(submitter.clone()),
            subject: submission.subject.clone(),
            html_body: self.templates.operator_notification(&fields, received_at),
        };

        let acknowledgment = OutboundMessage {
            from: self.sender.clone(),
            to: submitter,
            reply_to: Some(self.operator.clone()),
            subject: Templates::acknowledgment_subject(&submission.subject),
            html_body: self.templates.submitter_acknowledgment(&fields),
        };

        Ok([
            (MailKind::OperatorNotification, notification),
            (MailKind::SubmitterAcknowledgment, acknowledgment),
        ])
    }

    async fn send_one(&self, kind: MailKind, message: OutboundMessage) -> Result<(), MailError> {
        let to = message.to.email.to_string();
        match tokio::time::timeout(self.send_timeout, self.transport.send(message)).await {
            Ok(Ok(())) => {
                debug!(kind = kind.as_str(), %to, "Mail sent");
                Ok(())
            }
            Ok(Err(err)) => Err(err),
            Err(_) => Err(MailError::Timeout),
        }
    }

    /// Send the operator notification, then the acknowledgment.
    ///
    /// `on_sent` is told the outcome of every send attempt.
    pub async fn dispatch(
        &self,
        submission: &Submission,
        mut on_sent: impl FnMut(MailKind, bool) + Send,
    ) -> Result<(), GatekeeperError> {
        let messages = self.compose(submission, Utc::now()).map_err(|err| {
            error!(
                domain = %submission.email_domain(),
                error = %err,
                "Failed to compose outbound mail"
            );
            GatekeeperError::MailDispatchFailed(err)
        })?;

        for (kind, message) in messages {
            if let Err(err) = self.send_one(kind, message).await {
                on_sent(kind, false);
                error!(
                    kind = kind.as_str(),
                    error = %err,
                    "Mail dispatch failed"
                );
                return Err(GatekeeperError::MailDispatchFailed(err));
            }
            on_sent(kind, true);
        }

        info!(domain = %submission.email_domain(), "Submission dispatched");
        Ok(())
    }
}
