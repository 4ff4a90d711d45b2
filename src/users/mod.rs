//! Platform users: records, CRUD endpoints and identity linking.

pub mod handlers;
pub mod service;
pub mod types;

pub use service::upsert_identity;
pub use types::{validate_email, NewUser, User, UserUpdate};
