//! Trego API gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!   Browser / frontend
//!        │
//!        ▼
//!   ┌──────────────────────────────────────────────────────────┐
//!   │ http::middleware                                         │
//!   │   recovery → trace id → logger bind → CORS → timeout     │
//!   └───────────────┬──────────────────────────────────────────┘
//!                   ▼
//!   ┌────────────┐ ┌────────────┐ ┌────────────┐
//!   │   health   │ │    auth    │ │   users    │
//!   │ probe      │ │ OAuth flow │ │ CRUD       │
//!   └─────┬──────┘ └──┬──────┬──┘ └─────┬──────┘
//!         │           │      │          │
//!         ▼           ▼      ▼          ▼
//!   ┌──────────┐  ┌────────┐ ┌──────────────────┐
//!   │  store   │◀─│ Google │ │ session (JWT)    │
//!   │ pg / mem │  └────────┘ └──────────────────┘
//!   └──────────┘
//!
//!   Cross-cutting: config, observability (logger, logging, metrics), lifecycle
//! ```

pub mod auth;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod store;
pub mod users;

pub use config::schema::GatewayConfig;
pub use http::{build_router, AppState, HttpServer};
pub use lifecycle::Shutdown;
