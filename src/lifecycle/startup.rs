//! Startup orchestration.
//!
//! # Responsibilities
//! - Build collaborators in dependency order: store, provider, sessions, flow
//! - Start background tasks (state sweeper)
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Without a database URL the gateway runs on an in-memory store

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::auth::flow::OAuthFlowController;
use crate::auth::google::GoogleProvider;
use crate::auth::provider::ProviderError;
use crate::auth::session::JwtSessionIssuer;
use crate::auth::state::InMemoryStateStore;
use crate::config::GatewayConfig;
use crate::http::server::AppState;
use crate::lifecycle::Shutdown;
use crate::store::{InMemoryUserStore, PgUserStore, StoreError, StoreHealth, UserStore};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database: {0}")]
    Store(#[from] StoreError),

    #[error("oauth provider: {0}")]
    Provider(#[from] ProviderError),
}

/// Build the application state. Background tasks stop on `shutdown`.
pub async fn initialize(config: GatewayConfig, shutdown: &Shutdown) -> Result<AppState, StartupError> {
    let config = Arc::new(config);

    let (users, store_health) = match &config.database.url {
        Some(url) => {
            let store = Arc::new(PgUserStore::connect(&config.database, url).await?);
            split_store(store)
        }
        None => {
            tracing::warn!("No database configured; users are kept in memory and lost on restart");
            split_store(Arc::new(InMemoryUserStore::new()))
        }
    };

    if config.oauth.client_id.is_empty() || config.oauth.client_secret.is_empty() {
        tracing::warn!("Google OAuth client credentials are not set; logins will fail at the provider");
    }
    let provider = Arc::new(GoogleProvider::new(config.oauth.clone())?);
    let sessions = Arc::new(JwtSessionIssuer::new(&config.session));

    let states = InMemoryStateStore::with_capacity_limit(config.oauth.max_outstanding_states);
    tokio::spawn(states.clone().run_sweeper(
        Duration::from_secs(config.oauth.state_sweep_interval_secs),
        shutdown.subscribe(),
    ));

    let oauth = Arc::new(OAuthFlowController::new(
        provider,
        Arc::new(states),
        users.clone(),
        sessions,
        config.oauth.state_ttl(),
        config.frontend.landing_url(),
    ));

    tracing::info!(
        store = if config.database.url.is_some() { "postgres" } else { "memory" },
        landing_url = %config.frontend.landing_url(),
        "Subsystems initialized"
    );

    Ok(AppState {
        config,
        users,
        store_health,
        oauth,
    })
}

fn split_store<S>(store: Arc<S>) -> (Arc<dyn UserStore>, Arc<dyn StoreHealth>)
where
    S: UserStore + StoreHealth + 'static,
{
    let users: Arc<dyn UserStore> = store.clone();
    let health: Arc<dyn StoreHealth> = store;
    (users, health)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn initializes_in_memory_without_database() {
        let shutdown = Shutdown::new();
        let state = initialize(GatewayConfig::default(), &shutdown).await.unwrap();

        assert!(state.store_health.ping().await.is_ok());
        assert_eq!(shutdown.receiver_count(), 1);
        shutdown.trigger();
    }
}
