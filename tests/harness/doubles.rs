// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! In-memory mail transport and domain resolver, plus app builders.

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use contact_gatekeeper::{
    config::Config,
    handlers::{router, AppState},
    mailer::{MailError, MailTransport, OutboundMessage},
    resolver::{DomainResolver, ResolveError},
};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Relay credential used by test configurations.
pub const SMTP_PASSWORD: &str = "s3cr3t-app-password";
/// Operator mailbox used by test configurations.
pub const OPERATOR: &str = "owner@nkjconstructionllc.com";

/// Mail transport that records every message it is handed.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutboundMessage>>,
    attempts: AtomicUsize,
    /// Fail every send whose zero-based attempt index is listed
    fail_on: HashSet<usize>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A relay that rejects the listed attempts.
    pub fn failing_on(attempts: &[usize]) -> Arc<Self> {
        Arc::new(Self {
            fail_on: attempts.iter().copied().collect(),
            ..Default::default()
        })
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, message: OutboundMessage) -> Result<(), MailError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.contains(&attempt) {
            return Err(MailError::Transport(format!(
                "535-5.7.8 Username and Password not accepted for {OPERATOR}:{SMTP_PASSWORD}"
            )));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

/// Resolver answering from a fixed set of domains with MX records.
#[derive(Default)]
pub struct StaticResolver {
    with_mx: HashSet<String>,
    lookups: AtomicUsize,
}

impl StaticResolver {
    pub fn with_mx(domains: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            with_mx: domains.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        })
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DomainResolver for StaticResolver {
    async fn mx_records(&self, domain: &str) -> Result<usize, ResolveError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.with_mx.contains(domain) {
            Ok(1)
        } else {
            Err(ResolveError::Lookup {
                domain: domain.to_string(),
                reason: "no record found".to_string(),
            })
        }
    }
}

/// Configuration with credentials filled in and forwarded addresses trusted.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.mail.operator_address = Some(OPERATOR.to_string());
    config.mail.smtp.password = Some(SMTP_PASSWORD.to_string());
    config.server.trust_forwarded_for = true;
    config
}

pub fn state(
    config: Config,
    transport: Arc<RecordingTransport>,
    resolver: Arc<StaticResolver>,
) -> Arc<AppState> {
    Arc::new(AppState::new(config, transport, resolver).expect("test state"))
}

/// Router with a fixed peer address.
pub fn app(
    config: Config,
    transport: Arc<RecordingTransport>,
    resolver: Arc<StaticResolver>,
) -> Router {
    let peer: SocketAddr = "192.0.2.10:40000".parse().unwrap();
    router(state(config, transport, resolver)).layer(MockConnectInfo(peer))
}

/// POST a JSON body, optionally as a forwarded client address.
pub fn post_json(path: &str, body: &serde_json::Value, client_ip: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(ip) = client_ip {
        builder = builder.header("x-forwarded-for", ip);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Response pieces a test inspects.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("JSON body")
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    TestResponse {
        status,
        headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    }
}
