// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for submission outcomes and mail sends.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Counters exposed on the metrics endpoint.
#[derive(Clone)]
pub struct GatekeeperMetrics {
    registry: Registry,
    submissions: IntCounterVec,
    mails: IntCounterVec,
}

impl std::fmt::Debug for GatekeeperMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatekeeperMetrics").finish_non_exhaustive()
    }
}

impl GatekeeperMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let submissions = IntCounterVec::new(
            Opts::new(
                "contact_submissions_total",
                "Contact-form submissions by pipeline outcome",
            ),
            &["outcome"],
        )?;
        let mails = IntCounterVec::new(
            Opts::new("contact_mail_sent_total", "Outbound mail send attempts"),
            &["kind", "result"],
        )?;

        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(mails.clone()))?;

        Ok(Self {
            registry,
            submissions,
            mails,
        })
    }

    /// Count one finished submission.
    pub fn record_outcome(&self, outcome: &str) {
        self.submissions.with_label_values(&[outcome]).inc();
    }

    /// Count one send attempt.
    pub fn record_mail(&self, kind: &str, ok: bool) {
        let result = if ok { "ok" } else { "error" };
        self.mails.with_label_values(&[kind, result]).inc();
    }

    pub fn submissions(&self, outcome: &str) -> u64 {
        self.submissions.with_label_values(&[outcome]).get()
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
    }
}
