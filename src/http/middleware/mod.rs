//! Request middleware.

pub mod chain;
pub mod logger;
pub mod recovery;
pub mod trace_id;

pub use chain::MiddlewareChain;
