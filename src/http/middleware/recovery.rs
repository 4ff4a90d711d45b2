//! Panic recovery.

use std::any::Any;

use axum::response::Response;
use tower_http::catch_panic::CatchPanicLayer;

use crate::http::response::internal_error_response;
use crate::observability::logger::LOG_TARGET;

pub type RecoveryLayer = CatchPanicLayer<fn(Box<dyn Any + Send + 'static>) -> Response>;

/// Layer turning a handler panic into a JSON 500.
pub fn recovery_layer() -> RecoveryLayer {
    CatchPanicLayer::custom(handle_panic as fn(Box<dyn Any + Send + 'static>) -> Response)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!(target: LOG_TARGET, panic = %detail, "Recovered from panic in request handler");
    internal_error_response()
}
