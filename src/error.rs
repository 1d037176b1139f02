// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Rejections produced by the submission pipeline.

use crate::config::ConfigError;
use crate::mailer::MailError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Terminal outcome of a rejected submission.
#[derive(Debug, Error)]
pub enum GatekeeperError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Request body too large.")]
    PayloadTooLarge,

    #[error("Too many requests. Please try again later.")]
    RateLimitExceeded { retry_after: Duration },

    #[error("Invalid request body.")]
    MalformedPayload,

    #[error("All fields are required (missing: {0}).")]
    MissingField(&'static str),

    #[error("Invalid email format.")]
    InvalidEmailSyntax,

    #[error("Field {0} contains characters that are not allowed.")]
    IllegalCharacters(&'static str),

    #[error("Email domain not accepted.")]
    UnacceptableDomain { domain: String },

    #[error("Failed to send email")]
    MailDispatchFailed(#[source] MailError),
}

impl GatekeeperError {
    /// HTTP status for this rejection.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::MalformedPayload
            | Self::MissingField(_)
            | Self::InvalidEmailSyntax
            | Self::IllegalCharacters(_)
            | Self::UnacceptableDomain { .. } => StatusCode::BAD_REQUEST,
            Self::MailDispatchFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the caller caused the rejection.
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }

    /// Stable label used for the outcome metric.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed => "method_not_allowed",
            Self::PayloadTooLarge => "payload_too_large",
            Self::RateLimitExceeded { .. } => "rate_limited",
            Self::MalformedPayload => "malformed_payload",
            Self::MissingField(_) => "missing_field",
            Self::InvalidEmailSyntax => "invalid_email",
            Self::IllegalCharacters(_) => "illegal_characters",
            Self::UnacceptableDomain { .. } => "unacceptable_domain",
            Self::MailDispatchFailed(_) => "dispatch_failed",
        }
    }
}

/// Failures while assembling the service.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error("metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// JSON body returned by the submission endpoint.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
}

impl SubmitResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl IntoResponse for GatekeeperError {
    fn into_response(self) -> Response {
        // Display for MailDispatchFailed is generic; the source stays server-side.
        let body = Json(SubmitResponse::rejected(self.to_string()));
        let mut response = (self.status(), body).into_response();
        if let Self::RateLimitExceeded { retry_after } = self {
            let secs = retry_after.as_secs().max(1);
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
