//! OAuth authorization-code login flow.
//!
//! # Data Flow
//! ```text
//! initiate_login:
//!     mint state → build provider URL → persist state (TTL)
//!
//! complete_callback:
//!     code present? → consume state → exchange code → fetch identity
//!         → upsert user → issue session → redirect to frontend
//! ```
//!
//! # Design Decisions
//! - State is consumed before any outbound call, so a replayed callback
//!   never reaches the provider
//! - Every failure is terminal; nothing is retried

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::auth::provider::{IdentityProvider, ProviderError};
use crate::auth::session::{SessionCredential, SessionError, SessionIssuer};
use crate::auth::state::{OAuthState, OAuthStateStore, StateError};
use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::observability::{Field, RequestLogger};
use crate::store::{StoreError, UserStore};
use crate::users::service::upsert_identity;
use crate::users::types::User;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization code missing")]
    MissingCode,

    #[error("oauth state missing, unknown or already used")]
    InvalidState,

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl AuthError {
    /// Metrics label for a failed callback.
    pub fn outcome(&self) -> &'static str {
        match self {
            AuthError::MissingCode => "missing_code",
            AuthError::InvalidState => "invalid_state",
            AuthError::State(_) => "state_store_error",
            AuthError::Provider(_) => "provider_error",
            AuthError::Store(_) => "store_error",
            AuthError::Session(_) => "session_error",
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCode => ApiError::BadRequest("authorization code is required".into()),
            AuthError::InvalidState => ApiError::Forbidden("invalid oauth state".into()),
            AuthError::State(StateError::Entropy(_)) => ApiError::Internal("could not start login".into()),
            AuthError::State(StateError::Store(_)) => ApiError::Unavailable("login state unavailable".into()),
            AuthError::Provider(ProviderError::Timeout { .. }) => {
                ApiError::Unavailable("identity provider timed out".into())
            }
            AuthError::Provider(_) => ApiError::Upstream("identity provider request failed".into()),
            AuthError::Store(e) => e.into(),
            AuthError::Session(_) => ApiError::Internal("could not issue session".into()),
        }
    }
}

/// Where to send the browser to start a login.
#[derive(Debug, Clone)]
pub struct LoginRedirect {
    pub url: String,
    pub state: OAuthState,
}

/// A completed login.
#[derive(Debug, Clone)]
pub struct CallbackOutcome {
    pub redirect_url: String,
    pub user: User,
    pub credential: SessionCredential,
}

/// Drives the login flow over its collaborators.
pub struct OAuthFlowController {
    provider: Arc<dyn IdentityProvider>,
    states: Arc<dyn OAuthStateStore>,
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionIssuer>,
    state_ttl: Duration,
    landing_url: String,
}

impl OAuthFlowController {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        states: Arc<dyn OAuthStateStore>,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionIssuer>,
        state_ttl: Duration,
        landing_url: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            states,
            users,
            sessions,
            state_ttl,
            landing_url: landing_url.into(),
        }
    }

    pub fn sessions(&self) -> &dyn SessionIssuer {
        self.sessions.as_ref()
    }

    /// Mint and persist a state token and build the provider URL around it.
    pub async fn initiate_login(&self, logger: &RequestLogger) -> Result<LoginRedirect, AuthError> {
        let state = OAuthState::generate()?;
        let url = self.provider.authorization_url(&state)?;
        self.states.put(&state, self.state_ttl).await?;

        logger.info(
            "OAuth login initiated",
            &[
                Field::new("provider", self.provider.name()),
                Field::new("state_ttl_secs", self.state_ttl.as_secs()),
            ],
        );
        Ok(LoginRedirect {
            url: url.to_string(),
            state,
        })
    }

    /// Validate the callback and finish the login.
    pub async fn complete_callback(
        &self,
        code: Option<&str>,
        state: Option<&str>,
        provider_error: Option<&str>,
        logger: &RequestLogger,
    ) -> Result<CallbackOutcome, AuthError> {
        let result = self.run_callback(code, state, provider_error, logger).await;
        match &result {
            Ok(outcome) => {
                metrics::record_oauth_callback("success");
                logger.info(
                    "OAuth login completed",
                    &[
                        Field::new("provider", self.provider.name()),
                        Field::new("user_id", outcome.user.user_id.as_str()),
                    ],
                );
            }
            Err(err) => {
                metrics::record_oauth_callback(err.outcome());
                let fields = [
                    Field::new("provider", self.provider.name()),
                    Field::new("outcome", err.outcome()),
                    Field::new("error", err.to_string()),
                ];
                match err {
                    AuthError::MissingCode | AuthError::InvalidState => {
                        logger.warn("OAuth callback rejected", &fields)
                    }
                    _ => logger.error("OAuth callback failed", &fields),
                }
            }
        }
        result
    }

    async fn run_callback(
        &self,
        code: Option<&str>,
        state: Option<&str>,
        provider_error: Option<&str>,
        logger: &RequestLogger,
    ) -> Result<CallbackOutcome, AuthError> {
        let code = match code.filter(|c| !c.is_empty()) {
            Some(code) => code,
            None => {
                if let Some(reason) = provider_error {
                    logger.warn(
                        "Provider reported an authorization error",
                        &[Field::new("provider_error", reason)],
                    );
                }
                return Err(AuthError::MissingCode);
            }
        };

        let state = state.unwrap_or_default();
        if !self.states.consume_if_valid(state).await? {
            return Err(AuthError::InvalidState);
        }

        let token = self.provider.exchange_code(code).await?;
        let identity = self.provider.fetch_identity(&token).await?;
        drop(token);

        logger.debug(
            "Fetched provider identity",
            &[
                Field::new("subject", identity.subject.as_str()),
                Field::new("email_verified", identity.email_verified),
            ],
        );

        let user = upsert_identity(self.users.as_ref(), &identity).await?;
        let credential = self.sessions.issue(&user)?;

        Ok(CallbackOutcome {
            redirect_url: self.landing_url.clone(),
            user,
            credential,
        })
    }
}
