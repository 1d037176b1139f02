// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! The submission pipeline: rate limit, validate, dispatch.

use crate::dispatcher::Dispatcher;
use crate::error::GatekeeperError;
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::metrics::GatekeeperMetrics;
use crate::validator::{SubmissionForm, SubmissionValidator};
use tracing::{debug, info};

/// An accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accepted {
    /// Submissions left for this source in the current window
    pub remaining: u32,
}

/// Runs every stage after the transport guard.
#[derive(Debug)]
pub struct Gatekeeper {
    limiter: RateLimiter,
    validator: SubmissionValidator,
    dispatcher: Dispatcher,
    metrics: GatekeeperMetrics,
}

impl Gatekeeper {
    pub fn new(
        limiter: RateLimiter,
        validator: SubmissionValidator,
        dispatcher: Dispatcher,
        metrics: GatekeeperMetrics,
    ) -> Self {
        Self {
            limiter,
            validator,
            dispatcher,
            metrics,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn metrics(&self) -> &GatekeeperMetrics {
        &self.metrics
    }

    /// Process one request body from `source` and record its outcome.
    pub async fn process(&self, source: &str, body: &[u8]) -> Result<Accepted, GatekeeperError> {
        let result = self.run(source, body).await;
        match &result {
            Ok(_) => self.metrics.record_outcome("accepted"),
            Err(err) => self.metrics.record_outcome(err.outcome()),
        }
        result
    }

    async fn run(&self, source: &str, body: &[u8]) -> Result<Accepted, GatekeeperError> {
        let remaining = match self.limiter.check(source).await {
            RateLimitResult::Allowed { remaining, .. } => remaining,
            RateLimitResult::Limited { retry_after } => {
                info!(
                    source,
                    retry_after_secs = retry_after.as_secs(),
                    "Submission rate limited"
                );
                return Err(GatekeeperError::RateLimitExceeded { retry_after });
            }
        };

        let form = SubmissionForm::from_json(body)?;
        let submission = self.validator.validate(form).await.map_err(|err| {
            debug!(source, error = %err, "Submission rejected");
            err
        })?;

        self.dispatcher
            .dispatch(&submission, |kind, ok| {
                self.metrics.record_mail(kind.as_str(), ok)
            })
            .await?;

        Ok(Accepted { remaining })
    }
}
