//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and URLs parse
//! - Validate value ranges (timeouts > 0, pool sizes ordered)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, PLACEHOLDER_SESSION_SECRET};

/// Shortest accepted HS256 signing key, in bytes.
pub const MIN_SESSION_SECRET_BYTES: usize = 32;

/// Longest a login may stay pending.
pub const MAX_STATE_TTL_SECS: u64 = 60 * 60;

/// Longest an issued session may live.
pub const MAX_SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be > 0"));
    }
    if config.server.cors_origins.iter().any(|o| o.trim() == "*") {
        errors.push(ValidationError::new(
            "server.cors_origins",
            "'*' cannot be combined with credentials; list origins explicitly",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    for (field, value) in [
        ("oauth.redirect_uri", &config.oauth.redirect_uri),
        ("oauth.auth_url", &config.oauth.auth_url),
        ("oauth.token_url", &config.oauth.token_url),
        ("oauth.userinfo_url", &config.oauth.userinfo_url),
        ("frontend.url", &config.frontend.url),
    ] {
        if let Err(e) = Url::parse(value) {
            errors.push(ValidationError::new(field, format!("'{}' is not a URL: {}", value, e)));
        }
    }
    if config.oauth.scopes.is_empty() {
        errors.push(ValidationError::new("oauth.scopes", "at least one scope is required"));
    }
    if config.oauth.state_ttl_secs == 0 || config.oauth.state_ttl_secs > MAX_STATE_TTL_SECS {
        errors.push(ValidationError::new(
            "oauth.state_ttl_secs",
            format!("must be between 1 and {}", MAX_STATE_TTL_SECS),
        ));
    }
    if config.oauth.state_sweep_interval_secs == 0 {
        errors.push(ValidationError::new("oauth.state_sweep_interval_secs", "must be > 0"));
    }
    if config.oauth.http_timeout_secs == 0 {
        errors.push(ValidationError::new("oauth.http_timeout_secs", "must be > 0"));
    }
    if config.oauth.max_outstanding_states == 0 {
        errors.push(ValidationError::new("oauth.max_outstanding_states", "must be > 0"));
    }

    if config.session.secret == PLACEHOLDER_SESSION_SECRET {
        errors.push(ValidationError::new(
            "session.secret",
            "placeholder secret; set SESSION_SECRET",
        ));
    } else if config.session.secret.len() < MIN_SESSION_SECRET_BYTES {
        errors.push(ValidationError::new(
            "session.secret",
            format!("must be at least {} bytes", MIN_SESSION_SECRET_BYTES),
        ));
    }
    if config.session.ttl_secs == 0 || config.session.ttl_secs > MAX_SESSION_TTL_SECS {
        errors.push(ValidationError::new(
            "session.ttl_secs",
            format!("must be between 1 and {}", MAX_SESSION_TTL_SECS),
        ));
    }
    if config.session.cookie_name.is_empty() {
        errors.push(ValidationError::new("session.cookie_name", "must not be empty"));
    }

    if !config.frontend.landing_path.starts_with('/') {
        errors.push(ValidationError::new("frontend.landing_path", "must start with '/'"));
    }

    if config.database.max_connections == 0 {
        errors.push(ValidationError::new("database.max_connections", "must be > 0"));
    }
    if config.database.min_connections > config.database.max_connections {
        errors.push(ValidationError::new(
            "database.min_connections",
            "must not exceed max_connections",
        ));
    }

    if config.health.store_timeout_ms == 0 {
        errors.push(ValidationError::new("health.store_timeout_ms", "must be > 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.session.secret = "k".repeat(MIN_SESSION_SECRET_BYTES);
        config
    }

    #[test]
    fn defaults_are_valid_once_a_secret_is_set() {
        assert_eq!(validate_config(&valid_config()), Ok(()));
    }

    #[test]
    fn placeholder_session_secret_is_rejected() {
        let errors = validate_config(&GatewayConfig::default()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "session.secret");
        assert!(errors[0].reason.contains("SESSION_SECRET"));
    }

    #[test]
    fn short_session_secret_is_rejected() {
        let mut config = valid_config();
        config.session.secret = "k".repeat(MIN_SESSION_SECRET_BYTES - 1);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "session.secret");

        config.session.secret.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn ttls_are_bounded_above() {
        let mut config = valid_config();
        config.oauth.state_ttl_secs = u64::MAX;
        config.session.ttl_secs = MAX_SESSION_TTL_SECS + 1;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["oauth.state_ttl_secs", "session.ttl_secs"]);

        config.oauth.state_ttl_secs = MAX_STATE_TTL_SECS;
        config.session.ttl_secs = MAX_SESSION_TTL_SECS;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn wildcard_cors_origin_is_rejected() {
        let mut config = valid_config();
        config.server.cors_origins = vec!["*".into()];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "server.cors_origins");
    }

    #[test]
    fn reports_every_problem() {
        let mut config = valid_config();
        config.server.bind_address = "not-an-address".into();
        config.oauth.token_url = "::nope".into();
        config.oauth.state_ttl_secs = 0;
        config.database.min_connections = 50;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "server.bind_address",
                "oauth.token_url",
                "oauth.state_ttl_secs",
                "database.min_connections",
            ]
        );
    }

    #[test]
    fn metrics_address_checked_only_when_enabled() {
        let mut config = valid_config();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
