//! Google OAuth login.
//!
//! # Data Flow
//! ```text
//! POST /api/v1/google-login
//!     → flow.rs (mint state, build URL) → state.rs (persist with TTL)
//!
//! GET /api/v1/google-callback?code=&state=
//!     → flow.rs → state.rs (consume once)
//!               → google.rs (token exchange, userinfo)
//!               → users::service (upsert)
//!               → session.rs (JWT cookie)
//!     → 302 to frontend
//! ```

pub mod flow;
pub mod google;
pub mod handlers;
pub mod provider;
pub mod session;
pub mod state;

pub use flow::{AuthError, CallbackOutcome, LoginRedirect, OAuthFlowController};
pub use google::GoogleProvider;
pub use provider::{AccessToken, ExternalIdentity, IdentityProvider, ProviderError};
pub use session::{JwtSessionIssuer, SessionCredential, SessionIssuer};
pub use state::{InMemoryStateStore, OAuthState, OAuthStateStore};
