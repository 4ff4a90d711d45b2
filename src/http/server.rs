//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the route table over shared application state
//! - Wrap it in the middleware chain
//! - Serve until the shutdown broadcast fires, then drain

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::auth::flow::OAuthFlowController;
use crate::auth::handlers::{google_callback, google_login};
use crate::config::GatewayConfig;
use crate::health::handlers::{db_health_check, health_check};
use crate::http::middleware::MiddlewareChain;
use crate::observability::RequestLogger;
use crate::store::{StoreHealth, UserStore};
use crate::users::handlers::{
    create_user, get_user_by_email, get_user_by_id, list_users, ping, update_user,
};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub users: Arc<dyn UserStore>,
    pub store_health: Arc<dyn StoreHealth>,
    pub oauth: Arc<OAuthFlowController>,
}

/// Route table plus middleware, ready to serve.
pub fn build_router(state: AppState) -> Router {
    let chain = MiddlewareChain::new(RequestLogger::new())
        .with_cors_origins(&state.config.server.cors_origins)
        .with_timeout(state.config.server.request_timeout());

    let api = Router::new()
        .route("/ping", get(ping))
        .route("/google-login", post(google_login))
        .route("/google-callback", get(google_callback))
        .route("/user", post(create_user))
        .route("/user/email/{email}", get(get_user_by_email))
        .route("/user/{user_id}", get(get_user_by_id).put(update_user))
        .route("/users", get(list_users));

    let router = Router::new()
        .route("/healthCheck", get(health_check))
        .route("/dbHealthCheck", get(db_health_check))
        .nest("/api/v1", api)
        .with_state(state);

    chain.apply(router)
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        Self {
            router: build_router(state),
        }
    }

    /// Serve on `listener` until `shutdown` fires; in-flight requests finish first.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
