// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Gatekeeper Service
//!
//! Serves the contact-form endpoint: rate limits and validates each
//! submission, then mails the site operator and acknowledges the sender.
//!
//! ## Configuration
//!
//! Settings come from an optional `gatekeeper.toml`, `GATEKEEPER__*`
//! environment variables and a `.env` file:
//!
//! - `EMAIL_USER`: operator mailbox, also the SMTP login (required)
//! - `EMAIL_PASS`: SMTP credential (required)
//! - `GATEKEEPER__SERVER__BIND_ADDR`: bind address (default: 0.0.0.0:8080)
//! - `GATEKEEPER__RATE_LIMIT__MAX_REQUESTS`: per-window quota (default: 5)
//! - `GATEKEEPER__RATE_LIMIT__WINDOW_SECS`: window length (default: 900)
//! - `GATEKEEPER__CORS__ALLOW_ANY_ORIGIN` / `GATEKEEPER__CORS__ALLOWED_ORIGINS`
//! - `GATEKEEPER__VALIDATION__DOMAIN_POLICY`: `resolve` or `block_list_only`

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contact_gatekeeper::{
    config::Config,
    handlers::{router, AppState},
    mailer::SmtpMailer,
    resolver::DnsMxResolver,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = Config::load()?;
    info!(
        bind_addr = %config.server.bind_addr,
        submit_path = %config.server.submit_path,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        domain_policy = ?config.validation.domain_policy,
        smtp_host = %config.mail.smtp.host,
        "Starting contact gatekeeper"
    );

    // Create application state
    let transport = Arc::new(SmtpMailer::new(&config.mail)?);
    let resolver = Arc::new(DnsMxResolver::new(config.validation.resolve_timeout()));
    let state = Arc::new(AppState::new(config.clone(), transport, resolver)?);

    // Spawn cleanup task
    let cleanup_state = state.clone();
    let cleanup_interval = config.rate_limit.cleanup_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            cleanup_state.gatekeeper.limiter().cleanup().await;
        }
    });

    // Build router
    let app = router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config.server.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
