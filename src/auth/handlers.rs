//! HTTP endpoints for Google login.

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::{Field, RequestLogger};

/// Query parameters the provider appends to the redirect URI.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// `POST /api/v1/google-login`
pub async fn google_login(
    State(state): State<AppState>,
    logger: RequestLogger,
) -> Result<Json<Value>, ApiError> {
    logger.info("Google login requested", &[Field::new("endpoint", "/api/v1/google-login")]);

    let login = state.oauth.initiate_login(&logger).await?;
    Ok(Json(json!({ "redirectUrl": login.url })))
}

/// `GET /api/v1/google-callback`
pub async fn google_callback(
    State(state): State<AppState>,
    logger: RequestLogger,
    Query(params): Query<CallbackParams>,
) -> Result<Response, ApiError> {
    logger.info(
        "Google callback received",
        &[
            Field::new("endpoint", "/api/v1/google-callback"),
            Field::new("has_code", params.code.is_some()),
            Field::new("has_state", params.state.is_some()),
        ],
    );

    let outcome = state
        .oauth
        .complete_callback(
            params.code.as_deref(),
            params.state.as_deref(),
            params.error.as_deref(),
            &logger,
        )
        .await?;

    let cookie = state.oauth.sessions().cookie(&outcome.credential);
    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, outcome.redirect_url),
            (header::SET_COOKIE, cookie),
        ],
    )
        .into_response())
}
