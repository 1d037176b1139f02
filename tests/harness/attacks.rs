// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Abuse patterns for security testing.

use std::time::Duration;

/// What the simulated client puts in its submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// Valid submission from an allow-listed provider
    Valid,
    /// Addresses on disposable/test domains
    DisposableDomain,
    /// Addresses carrying header-injection sequences
    HeaderInjection,
    /// Bodies with at least one field missing
    MissingFields,
    /// Valid submissions whose text fields carry markup
    Markup,
}

/// Attack pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total number of requests to send
    pub total_requests: usize,
    /// Simulated gap between requests
    pub interval: Duration,
    /// Number of unique client addresses to rotate through
    pub unique_ips: usize,
    /// Payload family
    pub payload: Payload,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            total_requests: 50,
            interval: Duration::from_millis(100),
            unique_ips: 1,
            payload: Payload::Valid,
        }
    }
}

/// Predefined attack patterns.
impl AttackConfig {
    /// Single address flood - one bot hammering the form.
    pub fn single_ip_flood() -> Self {
        Self {
            total_requests: 100,
            interval: Duration::from_millis(10),
            ..Default::default()
        }
    }

    /// Distributed attack - many addresses, few requests each.
    pub fn distributed_attack() -> Self {
        Self {
            total_requests: 300,
            unique_ips: 100,
            ..Default::default()
        }
    }

    /// Disposable-address spam spread over several addresses.
    pub fn disposable_domain_spam() -> Self {
        Self {
            total_requests: 40,
            unique_ips: 20,
            payload: Payload::DisposableDomain,
            ..Default::default()
        }
    }

    /// Attempts to add recipients through the email field.
    pub fn header_injection() -> Self {
        Self {
            total_requests: 45,
            unique_ips: 45,
            payload: Payload::HeaderInjection,
            ..Default::default()
        }
    }

    /// Incomplete form posts.
    pub fn missing_fields_attack() -> Self {
        Self {
            total_requests: 40,
            unique_ips: 40,
            payload: Payload::MissingFields,
            ..Default::default()
        }
    }

    /// Stored-XSS attempts aimed at the operator's mail client.
    pub fn markup_injection() -> Self {
        Self {
            total_requests: 10,
            unique_ips: 10,
            payload: Payload::Markup,
            ..Default::default()
        }
    }

    /// Slow drip - one address staying under the quota.
    pub fn slow_drip() -> Self {
        Self {
            total_requests: 20,
            interval: Duration::from_secs(4 * 60),
            ..Default::default()
        }
    }

    /// Calculate simulated duration for the attack.
    pub fn expected_duration(&self) -> Duration {
        self.interval * self.total_requests as u32
    }
}
