// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Mail-exchange lookups for email domains that are on neither list.

use async_trait::async_trait;
use hickory_resolver::{
    config::{ResolverConfig, ResolverOpts},
    TokioAsyncResolver,
};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Domain lookup failures.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("MX lookup for {domain} failed: {reason}")]
    Lookup { domain: String, reason: String },

    #[error("MX lookup for {domain} timed out after {timeout:?}")]
    Timeout { domain: String, timeout: Duration },
}

/// Capability to check whether a domain accepts mail.
#[async_trait]
pub trait DomainResolver: Send + Sync {
    /// Number of MX records published for `domain`.
    async fn mx_records(&self, domain: &str) -> Result<usize, ResolveError>;
}

/// DNS-backed resolver using the system configuration when available.
pub struct DnsMxResolver {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl std::fmt::Debug for DnsMxResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsMxResolver")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl DnsMxResolver {
    /// Build a resolver whose lookups give up after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let (config, mut opts) = match hickory_resolver::system_conf::read_system_conf() {
            Ok(system) => system,
            Err(err) => {
                debug!(error = %err, "System resolver config unavailable, using defaults");
                (ResolverConfig::default(), ResolverOpts::default())
            }
        };
        opts.timeout = timeout;
        opts.attempts = 1;

        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
            timeout,
        }
    }
}

#[async_trait]
impl DomainResolver for DnsMxResolver {
    async fn mx_records(&self, domain: &str) -> Result<usize, ResolveError> {
        // Fully qualified so the search list is never appended.
        let fqdn = format!("{}.", domain.trim_end_matches('.'));

        let lookup = tokio::time::timeout(self.timeout, self.resolver.mx_lookup(fqdn))
            .await
            .map_err(|_| ResolveError::Timeout {
                domain: domain.to_string(),
                timeout: self.timeout,
            })?
            .map_err(|err| ResolveError::Lookup {
                domain: domain.to_string(),
                reason: err.to_string(),
            })?;

        let count = lookup.iter().count();
        debug!(domain, count, "MX lookup complete");
        Ok(count)
    }
}
