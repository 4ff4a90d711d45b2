//! Identity provider seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::auth::state::OAuthState;

/// Which provider call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Token,
    UserInfo,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Token => f.write_str("token"),
            Endpoint::UserInfo => f.write_str("userinfo"),
        }
    }
}

/// Errors talking to the identity provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider configuration cannot produce a request.
    #[error("provider misconfigured: {0}")]
    Config(String),

    /// Connection failed or was reset.
    #[error("{endpoint} request failed: {message}")]
    Transport { endpoint: Endpoint, message: String },

    /// No answer within the outbound timeout.
    #[error("{endpoint} request timed out")]
    Timeout { endpoint: Endpoint },

    /// Non-success HTTP status.
    #[error("{endpoint} endpoint returned status {status}")]
    Status { endpoint: Endpoint, status: u16 },

    /// Body could not be understood.
    #[error("{endpoint} response malformed: {message}")]
    Malformed { endpoint: Endpoint, message: String },
}

impl ProviderError {
    pub(crate) fn from_reqwest(endpoint: Endpoint, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout { endpoint }
        } else if err.is_decode() {
            ProviderError::Malformed {
                endpoint,
                message: err.to_string(),
            }
        } else {
            ProviderError::Transport {
                endpoint,
                message: err.to_string(),
            }
        }
    }
}

/// Opaque, short-lived provider access token. Never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Who the provider says the user is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdentity {
    /// Provider-scoped subject identifier.
    pub subject: String,
    pub email: String,
    pub email_verified: bool,
    pub name: String,
    pub picture_url: Option<String>,
}

/// The three legs of an authorization-code login.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Short provider name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Where to send the browser, with `state` embedded.
    fn authorization_url(&self, state: &OAuthState) -> Result<Url, ProviderError>;

    /// Trade a one-time authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<AccessToken, ProviderError>;

    /// Look up the authenticated identity.
    async fn fetch_identity(&self, token: &AccessToken) -> Result<ExternalIdentity, ProviderError>;
}
