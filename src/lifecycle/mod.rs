//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → store → provider + sessions → OAuth flow → AppState
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → server drains, sweeper exits → pool closed
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then collaborators, then listeners
//! - Ordered shutdown: stop accept, drain, close the store

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{initialize, StartupError};
