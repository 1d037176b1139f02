// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Transport guard for the submission endpoint: method handling and CORS.

use crate::config::CorsConfig;
use crate::error::GatekeeperError;
use axum::http::{header, HeaderMap, HeaderValue, Method};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

const ALLOWED_METHODS: &str = "POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type";

/// What to do with a request once its method is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// CORS preflight: answer with an empty 200
    Preflight,
    /// Submission: run the pipeline
    Proceed,
}

/// Decide from the method alone whether the pipeline runs.
pub fn inspect(method: &Method) -> Result<GuardDecision, GatekeeperError> {
    if method == Method::OPTIONS {
        Ok(GuardDecision::Preflight)
    } else if method == Method::POST {
        Ok(GuardDecision::Proceed)
    } else {
        debug!(%method, "Method not allowed");
        Err(GatekeeperError::MethodNotAllowed)
    }
}

/// Which origins receive CORS headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    /// `Access-Control-Allow-Origin: *`
    AnyOrigin,
    /// Reflect the request origin only when it is in the set
    AllowList(HashSet<String>),
}

/// Reduce an origin to `scheme://host[:port]`, dropping default ports.
fn normalize_origin(origin: &str) -> Option<String> {
    let parsed = Url::parse(origin.trim()).ok()?;
    let origin = parsed.origin();
    origin
        .is_tuple()
        .then(|| origin.ascii_serialization())
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig) -> Self {
        if config.allow_any_origin {
            return Self::AnyOrigin;
        }
        Self::AllowList(
            config
                .allowed_origins
                .iter()
                .filter_map(|o| {
                    let normalized = normalize_origin(o);
                    if normalized.is_none() {
                        tracing::warn!(origin = %o, "Ignoring unparseable CORS origin");
                    }
                    normalized
                })
                .collect(),
        )
    }

    /// Value for `Access-Control-Allow-Origin`, if the origin is recognized.
    pub fn allow_origin(&self, origin: Option<&HeaderValue>) -> Option<HeaderValue> {
        match self {
            Self::AnyOrigin => Some(HeaderValue::from_static("*")),
            Self::AllowList(allowed) => {
                let origin = origin?.to_str().ok()?;
                let normalized = normalize_origin(origin)?;
                if allowed.contains(&normalized) {
                    HeaderValue::from_str(origin).ok()
                } else {
                    debug!(origin, "Origin not in CORS allow-list");
                    None
                }
            }
        }
    }

    /// Add CORS headers to a response for a request from `origin`.
    pub fn apply(&self, origin: Option<&HeaderValue>, headers: &mut HeaderMap) {
        if matches!(self, Self::AllowList(_)) {
            headers.append(header::VARY, HeaderValue::from_static("Origin"));
        }
        let Some(allow) = self.allow_origin(origin) else {
            return;
        };
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
    }
}
