//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! GET /healthCheck   → handlers.rs → build version + timestamp
//! GET /dbHealthCheck → handlers.rs → probe.rs (ping under timeout) → 200 / 503
//! ```
//!
//! # Design Decisions
//! - The probe never hangs: a store that does not answer is unreachable
//! - Failure detail is logged; the response carries a summary only

pub mod handlers;
pub mod probe;

pub use probe::{check, HealthReport};
