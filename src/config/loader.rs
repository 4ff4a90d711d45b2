//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration: TOML file (if given), then environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_file(path)?,
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn parse_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Layer environment variables over a loaded configuration.
///
/// Empty values are ignored. `lookup` is injected so callers can supply
/// something other than the real process environment.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(port) = get("PORT") {
        let host = config
            .server
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.server.bind_address = format!("{}:{}", host, port);
    }
    if let Some(level) = get("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    if let Some(version) = get("BUILD_VERSION") {
        config.build_version = version;
    }
    if let Some(id) = get("GOOGLE_CLIENT_ID") {
        config.oauth.client_id = id;
    }
    if let Some(secret) = get("GOOGLE_CLIENT_SECRET") {
        config.oauth.client_secret = secret;
    }
    if let Some(uri) = get("GOOGLE_REDIRECT_URI") {
        config.oauth.redirect_uri = uri;
    }
    if let Some(url) = get("FRONTEND_URL") {
        config.frontend.url = url;
    }
    if let Some(secret) = get("SESSION_SECRET") {
        config.session.secret = secret;
    }

    if let Some(url) = get("DATABASE_URL") {
        config.database.url = Some(url);
    } else if let Some(host) = get("DB_HOST") {
        config.database.url = Some(format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            get("DB_USER").unwrap_or_else(|| "postgres".to_string()),
            get("DB_PASSWORD").unwrap_or_default(),
            host,
            get("DB_PORT").unwrap_or_else(|| "5432".to_string()),
            get("DB_NAME").unwrap_or_else(|| "trego".to_string()),
            get("DB_SSL_MODE").unwrap_or_else(|| "disable".to_string()),
        ));
    }
}
