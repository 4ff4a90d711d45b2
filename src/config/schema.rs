//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the API gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener and request handling settings.
    pub server: ServerConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Google OAuth client settings.
    pub oauth: OAuthConfig,

    /// Session credential settings.
    pub session: SessionConfig,

    /// Where the browser lands after login.
    pub frontend: FrontendConfig,

    /// Relational store settings.
    pub database: DatabaseConfig,

    /// Health endpoint settings.
    pub health: HealthConfig,

    /// Reported by `/healthCheck`.
    pub build_version: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            observability: ObservabilityConfig::default(),
            oauth: OAuthConfig::default(),
            session: SessionConfig::default(),
            frontend: FrontendConfig::default(),
            database: DatabaseConfig::default(),
            health: HealthConfig::default(),
            build_version: "1.0.0".to_string(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Upper bound on handler time, in seconds.
    pub request_timeout_secs: u64,

    /// Origins allowed to call the API from a browser. Credentials are
    /// allowed, so origins must be listed exactly; `"*"` is rejected.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable lines for development, JSON for aggregation.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// OAuth2 client configuration for the identity provider.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OAuthConfig {
    pub client_id: String,

    pub client_secret: String,

    /// Callback registered with the provider.
    pub redirect_uri: String,

    pub auth_url: String,

    pub token_url: String,

    pub userinfo_url: String,

    pub scopes: Vec<String>,

    /// How long an issued state token stays redeemable.
    pub state_ttl_secs: u64,

    /// How often expired state tokens are purged.
    pub state_sweep_interval_secs: u64,

    /// Bound on each outbound call to the provider.
    pub http_timeout_secs: u64,

    /// Cap on unredeemed state tokens held at once.
    pub max_outstanding_states: usize,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "http://localhost:8080/api/v1/google-callback".to_string(),
            auth_url: "https://accounts.google.com/o/oauth2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
            scopes: vec![
                "https://www.googleapis.com/auth/userinfo.email".to_string(),
                "https://www.googleapis.com/auth/userinfo.profile".to_string(),
            ],
            state_ttl_secs: 600,
            state_sweep_interval_secs: 60,
            http_timeout_secs: 5,
            max_outstanding_states: 100_000,
        }
    }
}

impl OAuthConfig {
    pub fn state_ttl(&self) -> Duration {
        Duration::from_secs(self.state_ttl_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("userinfo_url", &self.userinfo_url)
            .field("scopes", &self.scopes)
            .field("state_ttl_secs", &self.state_ttl_secs)
            .field("state_sweep_interval_secs", &self.state_sweep_interval_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("max_outstanding_states", &self.max_outstanding_states)
            .finish()
    }
}

/// Shipped session secret. Validation refuses to run with it.
pub const PLACEHOLDER_SESSION_SECRET: &str = "CHANGE_ME_IN_PRODUCTION";

/// Session credential configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// HMAC key for signing session tokens. Set via `SESSION_SECRET`.
    pub secret: String,

    /// Lifetime of an issued session, in seconds.
    pub ttl_secs: u64,

    pub cookie_name: String,

    /// Mark the cookie `Secure` (HTTPS-only).
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: PLACEHOLDER_SESSION_SECRET.to_string(),
            ttl_secs: 24 * 60 * 60,
            cookie_name: "trego_session".to_string(),
            secure_cookie: false,
        }
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"[REDACTED]")
            .field("ttl_secs", &self.ttl_secs)
            .field("cookie_name", &self.cookie_name)
            .field("secure_cookie", &self.secure_cookie)
            .finish()
    }
}

/// Frontend location configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FrontendConfig {
    pub url: String,

    /// Appended to `url` for the post-login redirect.
    pub landing_path: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".to_string(),
            landing_path: "/dashboard".to_string(),
        }
    }
}

impl FrontendConfig {
    /// Absolute URL of the post-login landing page.
    pub fn landing_url(&self) -> String {
        format!("{}{}", self.url.trim_end_matches('/'), self.landing_path)
    }
}

/// Relational store configuration.
///
/// When `url` is unset the gateway falls back to an in-process store.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub url: Option<String>,

    pub max_connections: u32,

    pub min_connections: u32,

    /// Bound on establishing (and checking out) a connection.
    pub connect_timeout_secs: u64,

    pub idle_timeout_secs: u64,

    pub max_lifetime_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 25,
            min_connections: 5,
            connect_timeout_secs: 5,
            idle_timeout_secs: 30 * 60,
            max_lifetime_secs: 60 * 60,
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "[REDACTED]"))
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .field("max_lifetime_secs", &self.max_lifetime_secs)
            .finish()
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Bound on the store reachability probe, in milliseconds.
    pub store_timeout_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: 5_000,
        }
    }
}

impl HealthConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}
