//! Request-scoped context.
//!
//! # Responsibilities
//! - Assign or propagate the per-request trace ID
//! - Carry the trace ID and the bound logger through request extensions
//!
//! # Design Decisions
//! - Trace ID assigned as early as possible for tracing
//! - Upstream IDs are trusted verbatim so hops can be correlated
//! - Context is a typed struct in extensions, never a string-keyed bag

use std::fmt;

use axum::http::header::HeaderName;
use axum::http::HeaderValue;
use uuid::Uuid;

use crate::observability::RequestLogger;

/// Correlation header read on the way in and echoed on the way out.
pub const X_TRACE_ID: HeaderName = HeaderName::from_static("x-trace-id");

/// Per-request correlation identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceId(String);

impl TraceId {
    /// Generate a fresh identifier (UUID v4, dashed hex).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Reuse an upstream identifier as-is.
    pub fn from_inbound(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Propagate a non-empty inbound header value, otherwise generate.
    ///
    /// Values that are not visible ASCII cannot be echoed back, so they are
    /// treated as absent.
    pub fn assign_or_propagate(inbound: Option<&HeaderValue>) -> Self {
        inbound
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(Self::from_inbound)
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Header form of this identifier.
    pub fn to_header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.0).ok()
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the middleware chain attaches to every request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub trace_id: TraceId,
    pub logger: RequestLogger,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_uuids() {
        let a = TraceId::assign_or_propagate(None);
        let b = TraceId::assign_or_propagate(None);
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn inbound_value_is_propagated_verbatim() {
        let inbound = HeaderValue::from_static("edge-7f3a  01");
        let id = TraceId::assign_or_propagate(Some(&inbound));
        assert_eq!(id.as_str(), "edge-7f3a  01");
    }

    #[test]
    fn empty_inbound_value_is_replaced() {
        let inbound = HeaderValue::from_static("");
        let id = TraceId::assign_or_propagate(Some(&inbound));
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn opaque_inbound_value_is_replaced() {
        let inbound = HeaderValue::from_bytes(b"caf\xc3\xa9").unwrap();
        let id = TraceId::assign_or_propagate(Some(&inbound));
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }
}
