//! Liveness and store health endpoints.

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::health::probe;
use crate::http::server::AppState;
use crate::observability::{Field, RequestLogger};

fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// `GET /healthCheck`
pub async fn health_check(
    State(state): State<AppState>,
    logger: RequestLogger,
    method: Method,
    headers: HeaderMap,
) -> Response {
    logger.info(
        "Server health check requested",
        &[
            Field::new("endpoint", "/healthCheck"),
            Field::new("method", method.as_str()),
            Field::new("user_agent", user_agent(&headers)),
        ],
    );
    logger.debug(
        "Server health check response",
        &[Field::new("build_version", state.config.build_version.as_str())],
    );

    let body = json!({
        "status": "ok",
        "buildVersion": state.config.build_version,
        "timestamp": Utc::now(),
    });

    logger.info("Server health check completed successfully", &[]);
    (StatusCode::OK, Json(body)).into_response()
}

/// `GET /dbHealthCheck`
pub async fn db_health_check(
    State(state): State<AppState>,
    logger: RequestLogger,
    method: Method,
    headers: HeaderMap,
) -> Response {
    logger.info(
        "Database health check requested",
        &[
            Field::new("endpoint", "/dbHealthCheck"),
            Field::new("method", method.as_str()),
            Field::new("user_agent", user_agent(&headers)),
        ],
    );

    let report = probe::check(state.store_health.as_ref(), state.config.health.store_timeout()).await;

    if report.store_reachable {
        logger.info("Database health check completed successfully", &[]);
        let body = json!({
            "status": "ok",
            "database": "ok",
            "timestamp": Utc::now(),
        });
        (StatusCode::OK, Json(body)).into_response()
    } else {
        let detail = report.error.unwrap_or_default();
        logger.error("Database health check failed", &[Field::new("error", detail.as_str())]);
        logger.warn("Database health check completed with errors", &[]);
        let body = json!({
            "status": "error",
            "database": "error",
            "timestamp": Utc::now(),
            "error": "database unreachable",
        });
        (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
    }
}
