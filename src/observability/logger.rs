//! Request-scoped structured logger.
//!
//! A [`RequestLogger`] carries a set of bound fields and renders every call
//! as a single `tracing` event under the [`LOG_TARGET`] target. Deriving a
//! logger with [`RequestLogger::with_field`] copies the field set; the parent
//! is never touched, so a logger can be handed to concurrent tasks freely.
//!
//! Each event carries `trace_id` as its own field and the remaining merged
//! fields as one JSON object in `fields`, so both the pretty and the JSON
//! subscriber output can be parsed back.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::Extensions;
use serde_json::{Map, Value};

use crate::http::request::RequestContext;

/// `tracing` target used for every line a [`RequestLogger`] emits.
pub const LOG_TARGET: &str = "trego_gateway::request";

/// Bound key emitted as a first-class event field.
pub const TRACE_ID_FIELD: &str = "trace_id";

/// Severity of a [`LogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// A call-site key/value pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: Value,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One rendered log record: bound fields merged with call-site fields.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub fields: BTreeMap<String, Value>,
}

impl LogEntry {
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.fields.get(TRACE_ID_FIELD).and_then(Value::as_str)
    }

    /// Every field except `trace_id`, as a JSON object.
    pub fn extra_fields(&self) -> Value {
        let extra: Map<String, Value> = self
            .fields
            .iter()
            .filter(|(key, _)| key.as_str() != TRACE_ID_FIELD)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Value::Object(extra)
    }
}

/// Structured logger with immutable, inheritable bound fields.
#[derive(Debug, Clone, Default)]
pub struct RequestLogger {
    fields: Arc<BTreeMap<String, Value>>,
}

impl RequestLogger {
    /// A logger with no bound fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a logger with one more bound field.
    pub fn with_field(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut fields = (*self.fields).clone();
        fields.insert(key.into(), value.into());
        Self {
            fields: Arc::new(fields),
        }
    }

    /// Derive a logger with several more bound fields. Supplied keys win.
    pub fn with_fields<I, K, V>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut fields = (*self.fields).clone();
        fields.extend(extra.into_iter().map(|(k, v)| (k.into(), v.into())));
        Self {
            fields: Arc::new(fields),
        }
    }

    /// Bound value for `key`, if any.
    pub fn bound(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Merge bound and call-site fields into a record without emitting it.
    ///
    /// Call-site fields override bound fields for this record only.
    pub fn entry(&self, level: LogLevel, message: &str, fields: &[Field]) -> LogEntry {
        let mut merged = (*self.fields).clone();
        for field in fields {
            merged.insert(field.key.clone(), field.value.clone());
        }
        LogEntry {
            level,
            message: message.to_string(),
            fields: merged,
        }
    }

    pub fn debug(&self, message: &str, fields: &[Field]) {
        emit(&self.entry(LogLevel::Debug, message, fields));
    }

    pub fn info(&self, message: &str, fields: &[Field]) {
        emit(&self.entry(LogLevel::Info, message, fields));
    }

    pub fn warn(&self, message: &str, fields: &[Field]) {
        emit(&self.entry(LogLevel::Warn, message, fields));
    }

    pub fn error(&self, message: &str, fields: &[Field]) {
        emit(&self.entry(LogLevel::Error, message, fields));
    }
}

macro_rules! emit_at {
    ($level:expr, $entry:expr) => {{
        let entry = $entry;
        tracing::event!(
            target: LOG_TARGET,
            $level,
            trace_id = entry.trace_id().map(tracing::field::display),
            fields = %entry.extra_fields(),
            "{}",
            entry.message
        )
    }};
}

fn emit(entry: &LogEntry) {
    match entry.level {
        LogLevel::Debug => emit_at!(tracing::Level::DEBUG, entry),
        LogLevel::Info => emit_at!(tracing::Level::INFO, entry),
        LogLevel::Warn => emit_at!(tracing::Level::WARN, entry),
        LogLevel::Error => emit_at!(tracing::Level::ERROR, entry),
    }
}

/// Logger bound to the current request, or a fresh one outside request scope.
pub fn logger_for(extensions: &Extensions) -> RequestLogger {
    extensions
        .get::<RequestContext>()
        .map(|ctx| ctx.logger.clone())
        .unwrap_or_default()
}

impl<S> FromRequestParts<S> for RequestLogger
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(logger_for(&parts.extensions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::TraceId;
    use serde_json::json;

    #[test]
    fn with_field_leaves_receiver_untouched() {
        let base = RequestLogger::new();
        let derived = base.with_field("a", 1);

        assert!(base.entry(LogLevel::Info, "m", &[]).field("a").is_none());
        assert_eq!(derived.entry(LogLevel::Info, "m", &[]).field("a"), Some(&json!(1)));
    }

    #[test]
    fn with_fields_merges_and_supplied_keys_win() {
        let base = RequestLogger::new().with_field("service", "gateway").with_field("a", 1);
        let derived = base.with_fields([("a", json!(2)), ("b", json!("x"))]);

        let entry = derived.entry(LogLevel::Debug, "m", &[]);
        assert_eq!(entry.field("service"), Some(&json!("gateway")));
        assert_eq!(entry.field("a"), Some(&json!(2)));
        assert_eq!(entry.field("b"), Some(&json!("x")));
        assert_eq!(base.bound("a"), Some(&json!(1)));
        assert!(base.bound("b").is_none());
    }

    #[test]
    fn call_site_fields_override_for_one_line_only() {
        let logger = RequestLogger::new().with_field("trace_id", "t-1");

        let overridden = logger.entry(LogLevel::Warn, "m", &[Field::new("trace_id", "other")]);
        assert_eq!(overridden.field("trace_id"), Some(&json!("other")));

        let next = logger.entry(LogLevel::Warn, "m", &[]);
        assert_eq!(next.field("trace_id"), Some(&json!("t-1")));
    }

    #[test]
    fn trace_id_is_split_from_the_other_fields() {
        let logger = RequestLogger::new().with_field("trace_id", "abc");
        let entry = logger.entry(
            LogLevel::Info,
            "Server health check requested",
            &[Field::new("path", "/x y"), Field::new("status", 200)],
        );
        assert_eq!(entry.trace_id(), Some("abc"));
        assert_eq!(entry.extra_fields(), json!({"path": "/x y", "status": 200}));

        let unbound = RequestLogger::new().entry(LogLevel::Info, "m", &[]);
        assert_eq!(unbound.trace_id(), None);
        assert_eq!(unbound.extra_fields(), json!({}));
    }

    #[test]
    fn logger_for_falls_back_to_empty_logger() {
        let extensions = Extensions::new();
        let logger = logger_for(&extensions);
        assert!(logger.entry(LogLevel::Info, "m", &[]).fields.is_empty());
    }

    #[test]
    fn logger_for_returns_bound_request_logger() {
        let mut extensions = Extensions::new();
        let trace_id = TraceId::from_inbound("req-42");
        extensions.insert(RequestContext {
            logger: RequestLogger::new().with_field("trace_id", trace_id.as_str()),
            trace_id,
        });

        let logger = logger_for(&extensions);
        assert_eq!(logger.bound("trace_id"), Some(&json!("req-42")));
    }
}
