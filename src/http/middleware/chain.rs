//! The fixed middleware stack applied to every route.

use std::time::Duration;

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;

use crate::http::middleware::logger::bind_request_logger;
use crate::http::middleware::recovery::recovery_layer;
use crate::http::middleware::trace_id::propagate_trace_id;
use crate::http::request::X_TRACE_ID;
use crate::observability::RequestLogger;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for the middleware stack.
///
/// **Ordering (outermost to innermost):**
/// 1. recovery: a panic below becomes a JSON 500
/// 2. trace id: assign or propagate `x-trace-id`, echo it on the response
/// 3. logger bind: request-scoped logger, start/completion lines, metrics
/// 4. CORS: answers pre-flight requests from the frontend origins
/// 5. timeout: `408` once the handler runs too long
#[derive(Clone)]
pub struct MiddlewareChain {
    base_logger: RequestLogger,
    cors_origins: Vec<String>,
    timeout: Duration,
}

impl MiddlewareChain {
    pub fn new(base_logger: RequestLogger) -> Self {
        Self {
            base_logger,
            cors_origins: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_cors_origins(mut self, origins: &[String]) -> Self {
        self.cors_origins = origins.to_vec();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Wrap every route of `router` in the stack.
    pub fn apply(self, router: Router) -> Router {
        let layers = ServiceBuilder::new()
            .layer(recovery_layer())
            .layer(middleware::from_fn(propagate_trace_id))
            .layer(middleware::from_fn_with_state(
                self.base_logger,
                bind_request_logger,
            ))
            .layer(build_cors_layer(&self.cors_origins))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                self.timeout,
            ));
        router.layer(layers)
    }
}

/// Explicit origin allowlist; `"*"` is not honoured since credentials are allowed.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, X_TRACE_ID])
        .expose_headers([X_TRACE_ID])
        .allow_credentials(true)
}
