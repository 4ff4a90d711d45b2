//! Trace ID assignment and propagation.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::http::request::{TraceId, X_TRACE_ID};

/// Reuse the inbound `x-trace-id` or mint one, make it visible to every
/// layer below, and echo it on the response.
pub async fn propagate_trace_id(mut req: Request, next: Next) -> Response {
    let trace_id = TraceId::assign_or_propagate(req.headers().get(&X_TRACE_ID));
    let header = trace_id.to_header_value();

    if let Some(value) = &header {
        req.headers_mut().insert(X_TRACE_ID, value.clone());
    }
    req.extensions_mut().insert(trace_id);

    let mut response = next.run(req).await;
    if let Some(value) = header {
        response.headers_mut().insert(X_TRACE_ID, value);
    }
    response
}
