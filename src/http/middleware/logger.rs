//! Binds a request-scoped logger and logs request boundaries.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::http::request::{RequestContext, TraceId};
use crate::observability::metrics;
use crate::observability::{Field, RequestLogger};

/// Derive `base.with_field("trace_id", ..)` for this request and store it in
/// extensions as a [`RequestContext`].
pub async fn bind_request_logger(
    State(base): State<RequestLogger>,
    mut req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let trace_id = req
        .extensions()
        .get::<TraceId>()
        .cloned()
        .unwrap_or_else(TraceId::generate);

    let logger = base.with_field("trace_id", trace_id.as_str());
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    req.extensions_mut().insert(RequestContext {
        trace_id,
        logger: logger.clone(),
    });

    logger.info(
        "Request started",
        &[
            Field::new("method", method.as_str()),
            Field::new("path", path.as_str()),
        ],
    );

    let response = next.run(req).await;
    let status = response.status();
    let latency_ms = start.elapsed().as_millis() as u64;

    let fields = [
        Field::new("method", method.as_str()),
        Field::new("path", path.as_str()),
        Field::new("status", status.as_u16()),
        Field::new("latency_ms", latency_ms),
    ];
    if status.is_server_error() {
        logger.error("Request completed", &fields);
    } else if status.is_client_error() {
        logger.warn("Request completed", &fields);
    } else {
        logger.info("Request completed", &fields);
    }

    metrics::record_request(method.as_str(), status.as_u16(), start);
    response
}
