//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Middleware binds a RequestLogger per request
//!     → logger.rs (request-scoped fields, trace_id first)
//!     → tracing events
//!     → logging.rs (subscriber: pretty or JSON to stdout)
//!
//! Handlers and middleware record:
//!     → metrics.rs (counters, gauges, histograms)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Trace ID flows through every log line of a request
//! - Derived loggers are copy-on-write; parents never change
//! - Metrics are cheap (atomic increments) and off by default

pub mod logger;
pub mod logging;
pub mod metrics;

pub use logger::{logger_for, Field, LogEntry, LogLevel, RequestLogger};
