// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact-form submission validator.
//!
//! Checks run in a fixed order and stop at the first failure:
//! - Field presence (all four fields, non-empty after trimming)
//! - Email grammar, including header-injection characters
//! - Header safety of `name` and `subject`
//! - Domain acceptability (allow-list, block-list, MX lookup)

use crate::config::{DomainPolicy, ValidationConfig};
use crate::error::GatekeeperError;
use crate::resolver::DomainResolver;
use lettre::Address;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

/// Longest address accepted (RFC 5321 path limit).
const MAX_EMAIL_LEN: usize = 254;
/// Longest local part accepted.
const MAX_LOCAL_LEN: usize = 64;

/// Raw request body as posted by the form.
#[derive(Debug, Default, Deserialize)]
pub struct SubmissionForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl SubmissionForm {
    /// Parse a JSON request body.
    pub fn from_json(body: &[u8]) -> Result<Self, GatekeeperError> {
        serde_json::from_slice(body).map_err(|err| {
            debug!(error = %err, "Unparseable submission body");
            GatekeeperError::MalformedPayload
        })
    }

    /// Presence check. Values are trimmed.
    pub fn into_submission(self) -> Result<Submission, GatekeeperError> {
        fn required(value: Option<String>, field: &'static str) -> Result<String, GatekeeperError> {
            match value {
                Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
                _ => {
                    debug!(field, "Missing submission field");
                    Err(GatekeeperError::MissingField(field))
                }
            }
        }

        Ok(Submission {
            name: required(self.name, "name")?,
            email: required(self.email, "email")?,
            subject: required(self.subject, "subject")?,
            message: required(self.message, "message")?,
        })
    }
}

/// One contact-form payload with every field present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl Submission {
    /// Domain part of the email, lowercased.
    pub fn email_domain(&self) -> String {
        self.email
            .rsplit_once('@')
            .map(|(_, domain)| domain.to_lowercase())
            .unwrap_or_default()
    }
}

/// Static classification of an email domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainVerdict {
    /// Accepted without further checks
    Allowed,
    /// Rejected outright
    Blocked,
    /// Accepted only if the domain publishes an MX record
    RequiresResolution,
}

fn email_grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z0-9._%+\-]+@(?:[A-Za-z0-9](?:[A-Za-z0-9\-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,7}$",
        )
        .expect("email grammar is a valid regex")
    })
}

/// Check an address against the conservative grammar.
///
/// Anything that could terminate or extend a mail header (control
/// characters, whitespace, a second `@`, list or comment delimiters) fails.
pub fn validate_email_syntax(email: &str) -> Result<(), GatekeeperError> {
    if email.len() > MAX_EMAIL_LEN {
        return Err(GatekeeperError::InvalidEmailSyntax);
    }
    if email
        .chars()
        .any(|c| c.is_control() || c.is_whitespace() || ",;<>()[]\\\":".contains(c))
    {
        debug!("Email contains header delimiter or control characters");
        return Err(GatekeeperError::InvalidEmailSyntax);
    }
    if email.matches('@').count() != 1 {
        return Err(GatekeeperError::InvalidEmailSyntax);
    }

    let (local, _) = email
        .split_once('@')
        .ok_or(GatekeeperError::InvalidEmailSyntax)?;
    if local.len() > MAX_LOCAL_LEN
        || local.starts_with('.')
        || local.ends_with('.')
        || local.contains("..")
    {
        return Err(GatekeeperError::InvalidEmailSyntax);
    }

    if !email_grammar().is_match(email) {
        return Err(GatekeeperError::InvalidEmailSyntax);
    }

    // Anything accepted here must also be a mailbox the transport can build.
    email.parse::<Address>().map_err(|err| {
        debug!(error = %err, "Email rejected by mailbox parser");
        GatekeeperError::InvalidEmailSyntax
    })?;
    Ok(())
}

/// Reject values that would break out of a mail header line.
pub fn validate_header_text(field: &'static str, value: &str) -> Result<(), GatekeeperError> {
    if value.chars().any(char::is_control) {
        debug!(field, "Header field contains control characters");
        return Err(GatekeeperError::IllegalCharacters(field));
    }
    Ok(())
}

/// Contact-form validator.
pub struct SubmissionValidator {
    policy: DomainPolicy,
    allowed: HashSet<String>,
    blocked: HashSet<String>,
    resolver: Arc<dyn DomainResolver>,
}

impl std::fmt::Debug for SubmissionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionValidator")
            .field("policy", &self.policy)
            .field("allowed", &self.allowed)
            .field("blocked", &self.blocked)
            .finish_non_exhaustive()
    }
}

impl SubmissionValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: &ValidationConfig, resolver: Arc<dyn DomainResolver>) -> Self {
        let normalize = |domains: &[String]| {
            domains
                .iter()
                .map(|d| d.trim().trim_end_matches('.').to_lowercase())
                .filter(|d| !d.is_empty())
                .collect::<HashSet<_>>()
        };

        Self {
            policy: config.domain_policy,
            allowed: normalize(&config.allowed_domains),
            blocked: normalize(&config.blocked_domains),
            resolver,
        }
    }

    /// Classify a domain from the static lists alone.
    ///
    /// Block-list entries also cover their subdomains.
    pub fn classify_domain(&self, domain: &str) -> DomainVerdict {
        let domain = domain.trim_end_matches('.').to_lowercase();

        let blocked = self.blocked.contains(&domain)
            || self
                .blocked
                .iter()
                .any(|b| domain.ends_with(&format!(".{}", b)));

        match self.policy {
            DomainPolicy::Resolve if self.allowed.contains(&domain) => DomainVerdict::Allowed,
            _ if blocked => DomainVerdict::Blocked,
            DomainPolicy::Resolve => DomainVerdict::RequiresResolution,
            DomainPolicy::BlockListOnly => DomainVerdict::Allowed,
        }
    }

    /// Settle the domain verdict, resolving MX records when required.
    pub async fn check_domain(&self, domain: &str) -> Result<(), GatekeeperError> {
        let rejected = || GatekeeperError::UnacceptableDomain {
            domain: domain.to_string(),
        };

        match self.classify_domain(domain) {
            DomainVerdict::Allowed => Ok(()),
            DomainVerdict::Blocked => {
                info!(domain, "Blocked email domain");
                Err(rejected())
            }
            DomainVerdict::RequiresResolution => match self.resolver.mx_records(domain).await {
                Ok(count) if count > 0 => Ok(()),
                Ok(_) => {
                    info!(domain, "Email domain has no MX records");
                    Err(rejected())
                }
                Err(err) => {
                    info!(domain, error = %err, "Email domain did not resolve");
                    Err(rejected())
                }
            },
        }
    }

    /// Validate a complete submission.
    pub async fn validate(&self, form: SubmissionForm) -> Result<Submission, GatekeeperError> {
        let submission = form.into_submission()?;

        validate_email_syntax(&submission.email)?;
        validate_header_text("name", &submission.name)?;
        validate_header_text("subject", &submission.subject)?;

        self.check_domain(&submission.email_domain()).await?;

        debug!(domain = %submission.email_domain(), "Submission valid");
        Ok(submission)
    }
}
