//! User store collaborators.
//!
//! # Data Flow
//! ```text
//! handlers / OAuth flow
//!     → UserStore (find, create, update, list)
//!     → memory.rs (in-process, dev and tests)
//!       or postgres.rs (sqlx pool, injected at startup)
//!
//! health probe
//!     → StoreHealth::ping (bounded by a timeout)
//! ```
//!
//! # Design Decisions
//! - `Ok(None)` means not found; `Err` always means the store itself failed
//! - The pool is constructed once, injected, and closed once at shutdown
//! - Schema management is external; the Postgres store expects `users` to exist

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::users::types::{NewUser, User, UserUpdate};

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

/// Failures of the store itself (never "not found").
#[derive(Debug, Error)]
pub enum StoreError {
    /// Could not reach the store or check out a connection.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store answered with an error.
    #[error("query failed: {0}")]
    Query(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence of user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_by_id(&self, user_id: &str) -> StoreResult<Option<User>>;

    async fn create(&self, user: NewUser) -> StoreResult<User>;

    async fn update(&self, user_id: &str, update: UserUpdate) -> StoreResult<Option<User>>;

    async fn list(&self, limit: u32, offset: u32) -> StoreResult<Vec<User>>;
}

/// Reachability and lifecycle of the backing store.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    /// Release pooled resources. Called once at shutdown.
    async fn close(&self) {}
}
