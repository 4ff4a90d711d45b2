//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, route table)
//!     → middleware/ (recovery → trace id → logger bind → CORS → timeout)
//!     → handler (auth, users, health)
//!     → response.rs (ApiError → JSON body)
//!     → Send to client, x-trace-id echoed
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestContext, TraceId, X_TRACE_ID};
pub use response::ApiError;
pub use server::{build_router, AppState, HttpServer};
