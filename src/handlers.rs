// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the contact gatekeeper service.

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::error::{GatekeeperError, StartupError, SubmitResponse};
use crate::gatekeeper::Gatekeeper;
use crate::guard::{self, CorsPolicy, GuardDecision};
use crate::limiter::RateLimiter;
use crate::mailer::MailTransport;
use crate::metrics::GatekeeperMetrics;
use crate::resolver::DomainResolver;
use crate::validator::SubmissionValidator;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, ConnectInfo, DefaultBodyLimit, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{debug, error};

const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    pub gatekeeper: Gatekeeper,
    pub cors: CorsPolicy,
    pub config: Config,
}

impl AppState {
    /// Wire the pipeline stages from configuration and the two collaborators.
    pub fn new(
        config: Config,
        transport: Arc<dyn MailTransport>,
        resolver: Arc<dyn DomainResolver>,
    ) -> Result<Self, StartupError> {
        let limiter = RateLimiter::new(config.rate_limit.clone());
        let validator = SubmissionValidator::new(&config.validation, resolver);
        let dispatcher = Dispatcher::new(&config.mail, config.site.clone(), transport)?;
        let metrics = GatekeeperMetrics::new()?;

        Ok(Self {
            gatekeeper: Gatekeeper::new(limiter, validator, dispatcher, metrics),
            cors: CorsPolicy::from_config(&config.cors),
            config,
        })
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "contact-gatekeeper",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Prometheus exposition endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.gatekeeper.metrics().render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Client identifier used for rate limiting.
fn client_source(addr: SocketAddr, headers: &HeaderMap, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }
    addr.ip().to_string()
}

/// Map a body that could not be buffered to a rejection.
fn body_rejection(rejection: BytesRejection) -> GatekeeperError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        GatekeeperError::PayloadTooLarge
    } else {
        debug!(error = %rejection, "Failed to read submission body");
        GatekeeperError::MalformedPayload
    }
}

/// Contact-form submission endpoint.
///
/// Accepts every method so that the guard, not the router, answers
/// preflights, wrong methods and oversized bodies with the endpoint's JSON
/// shape.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    method: Method,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let decision = guard::inspect(&method)
        .and_then(|decision| match (decision, body) {
            (GuardDecision::Proceed, Ok(body)) => Ok(Some(body)),
            (GuardDecision::Proceed, Err(rejection)) => Err(body_rejection(rejection)),
            (GuardDecision::Preflight, _) => Ok(None),
        });

    let mut response = match decision {
        Ok(None) => StatusCode::OK.into_response(),
        Ok(Some(body)) => {
            let source = client_source(addr, &headers, state.config.server.trust_forwarded_for);
            debug!(%source, bytes = body.len(), "Processing submission");

            match state.gatekeeper.process(&source, &body).await {
                Ok(accepted) => {
                    let mut response = (
                        StatusCode::OK,
                        Json(SubmitResponse::ok("Email sent successfully")),
                    )
                        .into_response();
                    response
                        .headers_mut()
                        .insert(RATE_LIMIT_REMAINING, HeaderValue::from(accepted.remaining));
                    response
                }
                Err(err) => err.into_response(),
            }
        }
        Err(err) => {
            debug!(%method, outcome = err.outcome(), "Request refused before the pipeline");
            state.gatekeeper.metrics().record_outcome(err.outcome());
            err.into_response()
        }
    };

    state
        .cors
        .apply(headers.get(header::ORIGIN), response.headers_mut());
    response
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let server = &state.config.server;

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route(&server.submit_path, any(submit));

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    let body_limit = DefaultBodyLimit::max(server.body_limit_bytes);
    app.layer(body_limit).with_state(state)
}
