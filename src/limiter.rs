// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter for contact-form submissions.
//!
//! Each client address gets a [`RateWindow`] holding a counter and the
//! instant the window opened. The window resets once its duration has
//! elapsed; the request that pushes the counter past the configured maximum
//! is rejected.
//!
//! Windows live in a [`WindowStore`]. The in-memory store keeps them in a
//! process-wide map, so each instance of a horizontally scaled deployment
//! enforces its own quota. A shared-cache store can be plugged in through
//! [`RateLimiter::with_store`].

use crate::config::RateLimitConfig;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::debug;

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Remaining requests in current window
        remaining: u32,
        /// Time until window resets
        reset_in: Duration,
    },
    /// Request is rate limited
    Limited {
        /// Time until the window resets
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Counter for one source within the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    /// Requests seen since `window_start`
    pub count: u32,
    /// When the current window opened
    pub window_start: Instant,
}

impl RateWindow {
    fn new(now: Instant) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }

    fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.window_start) >= window
    }

    /// Count one request, restarting the window first if it has elapsed.
    fn hit(&mut self, now: Instant, window: Duration) -> Self {
        if self.is_expired(now, window) {
            *self = Self::new(now);
        }
        self.count = self.count.saturating_add(1);
        *self
    }

    /// Time left until this window resets.
    pub fn remaining_time(&self, now: Instant, window: Duration) -> Duration {
        window.saturating_sub(now.saturating_duration_since(self.window_start))
    }
}

/// Storage for per-source windows.
///
/// Implementations must serialize increments for the same key so concurrent
/// bursts from one source are not undercounted.
#[async_trait]
pub trait WindowStore: Send + Sync {
    /// Record one request for `key` and return the window after the increment.
    async fn hit(&self, key: &str, now: Instant, window: Duration) -> RateWindow;

    /// Drop windows that have fully elapsed. Returns how many were removed.
    async fn evict_expired(&self, now: Instant, window: Duration) -> usize;
}

/// Process-local window table with a lock per entry.
#[derive(Debug, Default)]
pub struct InMemoryWindowStore {
    windows: RwLock<HashMap<String, Mutex<RateWindow>>>,
}

impl InMemoryWindowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked sources.
    pub async fn len(&self) -> usize {
        self.windows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.windows.read().await.is_empty()
    }
}

#[async_trait]
impl WindowStore for InMemoryWindowStore {
    async fn hit(&self, key: &str, now: Instant, window: Duration) -> RateWindow {
        // The map guard is held while the entry is locked so eviction cannot
        // remove a window that is mid-update.
        {
            let windows = self.windows.read().await;
            if let Some(entry) = windows.get(key) {
                return entry.lock().await.hit(now, window);
            }
        }

        let mut windows = self.windows.write().await;
        let entry = windows
            .entry(key.to_owned())
            .or_insert_with(|| Mutex::new(RateWindow::new(now)));
        entry.get_mut().hit(now, window)
    }

    async fn evict_expired(&self, now: Instant, window: Duration) -> usize {
        let mut windows = self.windows.write().await;
        let before = windows.len();
        windows.retain(|_, entry| !entry.get_mut().is_expired(now, window));
        before - windows.len()
    }
}

/// Per-source quota enforcement.
pub struct RateLimiter {
    /// Configuration
    config: RateLimitConfig,
    /// Window storage
    store: Arc<dyn WindowStore>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Create a rate limiter backed by the in-memory store.
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_store(config, Arc::new(InMemoryWindowStore::new()))
    }

    /// Create a rate limiter backed by a custom store.
    pub fn with_store(config: RateLimitConfig, store: Arc<dyn WindowStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count a request from `source` and decide whether it may proceed.
    pub async fn check(&self, source: &str) -> RateLimitResult {
        let now = Instant::now();
        let window = self.config.window_duration();
        let state = self.store.hit(source, now, window).await;
        let reset_in = state.remaining_time(now, window);

        if state.count > self.config.max_requests {
            debug!(
                source,
                count = state.count,
                retry_after_secs = reset_in.as_secs(),
                "Source rate limit exceeded"
            );
            RateLimitResult::Limited {
                retry_after: reset_in,
            }
        } else {
            RateLimitResult::Allowed {
                remaining: self.config.max_requests - state.count,
                reset_in,
            }
        }
    }

    /// Clean up expired windows (should be called periodically).
    pub async fn cleanup(&self) {
        let removed = self
            .store
            .evict_expired(Instant::now(), self.config.window_duration())
            .await;
        if removed > 0 {
            debug!(removed, "Evicted expired rate windows");
        }
    }
}
