// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the contact gatekeeper.
//!
//! Values are read from an optional `gatekeeper.toml`, then from
//! `GATEKEEPER__*` environment variables (double underscore separates nested
//! keys, e.g. `GATEKEEPER__RATE_LIMIT__MAX_REQUESTS=10`). The operator mailbox
//! and SMTP credential may also come from `EMAIL_USER` / `EMAIL_PASS`.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),

    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid setting {0}: must be greater than zero")]
    Zero(&'static str),
}

/// Configuration for the gatekeeper service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Field and domain validation configuration
    #[serde(default)]
    pub validation: ValidationConfig,

    /// CORS policy for the submission endpoint
    #[serde(default)]
    pub cors: CorsConfig,

    /// Outbound mail configuration
    #[serde(default)]
    pub mail: MailConfig,

    /// Site identity used in mail templates
    #[serde(default)]
    pub site: SiteConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Path of the submission endpoint (default: /api/send-email)
    #[serde(default = "default_submit_path")]
    pub submit_path: String,

    /// Maximum accepted request body in bytes (default: 16 KiB)
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,

    /// Use the first `X-Forwarded-For` hop as the client address
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

/// Fixed-window rate limiting, per client address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per window (default: 5)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds (default: 900)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// How often expired windows are evicted, in seconds (default: 60)
    #[serde(default = "default_cleanup_secs")]
    pub cleanup_interval_secs: u64,
}

/// How unlisted email domains are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainPolicy {
    /// Allow-list accepts, block-list rejects, everything else needs an MX record.
    #[default]
    Resolve,
    /// Block-list rejects, everything else is accepted without DNS.
    BlockListOnly,
}

/// Validation configuration for submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Policy applied to the email domain
    #[serde(default)]
    pub domain_policy: DomainPolicy,

    /// Domains accepted without a DNS lookup
    #[serde(default = "default_allowed_domains")]
    pub allowed_domains: Vec<String>,

    /// Disposable or test domains that are always rejected
    #[serde(default = "default_blocked_domains")]
    pub blocked_domains: Vec<String>,

    /// Timeout for the MX lookup in milliseconds (default: 3000)
    #[serde(default = "default_resolve_timeout_ms")]
    pub resolve_timeout_ms: u64,
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Send `Access-Control-Allow-Origin: *` for every request
    #[serde(default = "default_true")]
    pub allow_any_origin: bool,

    /// Origins reflected when `allow_any_origin` is off
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Outbound mail configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Mailbox receiving operator notifications (`EMAIL_USER`)
    #[serde(default)]
    pub operator_address: Option<String>,

    /// Sender mailbox; defaults to the operator address
    #[serde(default)]
    pub from_address: Option<String>,

    /// Per-message send timeout in milliseconds (default: 10000)
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,

    /// SMTP relay settings
    #[serde(default)]
    pub smtp: SmtpConfig,
}

/// SMTP relay settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// Relay host (default: smtp.gmail.com)
    #[serde(default = "default_smtp_host")]
    pub host: String,

    /// Relay port; the transport default applies when unset
    #[serde(default)]
    pub port: Option<u16>,

    /// Use STARTTLS instead of implicit TLS
    #[serde(default)]
    pub starttls: bool,

    /// Login; defaults to the operator address
    #[serde(default)]
    pub username: Option<String>,

    /// Credential (`EMAIL_PASS`)
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

/// Site identity rendered into mail bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Display name of the site owner
    #[serde(default = "default_site_name")]
    pub name: String,

    /// Public URL of the site
    #[serde(default = "default_site_url")]
    pub url: String,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_submit_path() -> String {
    "/api/send-email".to_string()
}

fn default_body_limit() -> usize {
    16 * 1024
}

fn default_max_requests() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    15 * 60
}

fn default_cleanup_secs() -> u64 {
    60
}

fn default_allowed_domains() -> Vec<String> {
    ["gmail.com", "outlook.com", "hotmail.com", "yahoo.com"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_blocked_domains() -> Vec<String> {
    [
        "test.com",
        "example.com",
        "mailinator.com",
        "tempmail.com",
        "10minutemail.com",
        "guerrillamail.com",
        "yopmail.com",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_resolve_timeout_ms() -> u64 {
    3000
}

fn default_send_timeout_ms() -> u64 {
    10_000
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_site_name() -> String {
    "NKJ Construction LLC".to_string()
}

fn default_site_url() -> String {
    "https://nkjconstructionllc.com".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            submit_path: default_submit_path(),
            body_limit_bytes: default_body_limit(),
            trust_forwarded_for: false,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            cleanup_interval_secs: default_cleanup_secs(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            domain_policy: DomainPolicy::default(),
            allowed_domains: default_allowed_domains(),
            blocked_domains: default_blocked_domains(),
            resolve_timeout_ms: default_resolve_timeout_ms(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_any_origin: default_true(),
            allowed_origins: Vec::new(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            operator_address: None,
            from_address: None,
            send_timeout_ms: default_send_timeout_ms(),
            smtp: SmtpConfig::default(),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: None,
            starttls: false,
            username: None,
            password: None,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            url: default_site_url(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("starttls", &self.starttls)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Get the eviction interval
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.max(1))
    }
}

impl ValidationConfig {
    /// Get the MX lookup timeout
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }
}

impl MailConfig {
    /// Get the per-message send timeout
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    /// Operator mailbox, required for dispatch.
    pub fn operator(&self) -> Result<&str, ConfigError> {
        self.operator_address
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("mail.operator_address (EMAIL_USER)"))
    }

    /// Sender mailbox, falling back to the operator mailbox.
    pub fn sender(&self) -> Result<&str, ConfigError> {
        match self.from_address.as_deref() {
            Some(from) if !from.trim().is_empty() => Ok(from),
            _ => self.operator(),
        }
    }
}

impl Config {
    /// Load configuration from `gatekeeper.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config: Config = config::Config::builder()
            .add_source(config::File::with_name("gatekeeper").required(false))
            .add_source(
                config::Environment::with_prefix("GATEKEEPER")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("validation.allowed_domains")
                    .with_list_parse_key("validation.blocked_domains")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        if let Ok(user) = std::env::var("EMAIL_USER") {
            config.mail.operator_address.get_or_insert(user);
        }
        if let Ok(pass) = std::env::var("EMAIL_PASS") {
            config.mail.smtp.password.get_or_insert(pass);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check settings that have no usable default.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit.max_requests == 0 {
            return Err(ConfigError::Zero("rate_limit.max_requests"));
        }
        if self.rate_limit.window_secs == 0 {
            return Err(ConfigError::Zero("rate_limit.window_secs"));
        }
        self.mail.operator()?;
        if self
            .mail
            .smtp
            .password
            .as_deref()
            .map_or(true, |p| p.is_empty())
        {
            return Err(ConfigError::Missing("mail.smtp.password (EMAIL_PASS)"));
        }
        Ok(())
    }
}
