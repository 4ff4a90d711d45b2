//! Session credentials issued after a successful login.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SessionConfig;
use crate::users::types::User;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to sign session token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("session ttl of {0:?} is out of range")]
    TtlOutOfRange(Duration),
}

/// Claims carried by the session JWT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Local user id.
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// A signed credential and how to hand it to the browser.
#[derive(Clone)]
pub struct SessionCredential {
    pub token: String,
    pub max_age: Duration,
}

impl std::fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredential")
            .field("token", &"[REDACTED]")
            .field("max_age", &self.max_age)
            .finish()
    }
}

/// Mints session credentials for authenticated users.
pub trait SessionIssuer: Send + Sync {
    fn issue(&self, user: &User) -> Result<SessionCredential, SessionError>;

    /// `Set-Cookie` value delivering `credential`.
    fn cookie(&self, credential: &SessionCredential) -> String;
}

/// HS256 JWT issuer.
pub struct JwtSessionIssuer {
    key: EncodingKey,
    ttl: Duration,
    cookie_name: String,
    secure: bool,
}

impl JwtSessionIssuer {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            key: EncodingKey::from_secret(config.secret.as_bytes()),
            ttl: Duration::from_secs(config.ttl_secs),
            cookie_name: config.cookie_name.clone(),
            secure: config.secure_cookie,
        }
    }
}

impl SessionIssuer for JwtSessionIssuer {
    fn issue(&self, user: &User) -> Result<SessionCredential, SessionError> {
        let iat = Utc::now().timestamp();
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|ttl| iat.checked_add(ttl))
            .ok_or(SessionError::TtlOutOfRange(self.ttl))?;
        let claims = SessionClaims {
            sub: user.user_id.clone(),
            email: user.email.clone(),
            iat,
            exp,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.key)?;
        Ok(SessionCredential {
            token,
            max_age: self.ttl,
        })
    }

    fn cookie(&self, credential: &SessionCredential) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_name,
            credential.token,
            credential.max_age.as_secs()
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}
