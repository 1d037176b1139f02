// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Gatekeeper
//!
//! This crate guards a contact-form mail endpoint. Each submission passes
//! through a fixed sequence of stages, any of which may reject it:
//!
//! - Transport guard (CORS preflight, POST only)
//! - Per-address rate limiting (5 requests per 15 minutes default)
//! - Field presence, email grammar and domain checks
//! - HTML escaping of user text
//! - Dispatch of an operator notification and a submitter acknowledgment

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gatekeeper;
pub mod guard;
pub mod handlers;
pub mod limiter;
pub mod mailer;
pub mod metrics;
pub mod resolver;
pub mod sanitizer;
pub mod validator;

pub use crate::config::Config;
pub use crate::error::GatekeeperError;
pub use crate::gatekeeper::Gatekeeper;
pub use crate::limiter::{RateLimitResult, RateLimiter};
pub use crate::mailer::{MailTransport, OutboundMessage};
pub use crate::resolver::DomainResolver;
pub use crate::validator::{Submission, SubmissionValidator};
