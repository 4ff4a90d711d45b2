//! User CRUD endpoints under `/api/v1`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::{Field, RequestLogger};
use crate::users::types::{validate_email, NewUser, User, UserUpdate};

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// `GET /api/v1/ping`
pub async fn ping() -> Json<Value> {
    Json(json!({ "message": "pong" }))
}

/// `GET /api/v1/user/email/{email}`
pub async fn get_user_by_email(
    State(state): State<AppState>,
    logger: RequestLogger,
    Path(email): Path<String>,
) -> Result<Json<User>, ApiError> {
    if let Err(reason) = validate_email(&email) {
        logger.warn(
            "Invalid email format",
            &[Field::new("email", email.as_str()), Field::new("error", reason)],
        );
        return Err(ApiError::BadRequest("invalid email format".into()));
    }

    logger.info("GetUserByEmail request received", &[Field::new("email", email.as_str())]);

    let user = state.users.find_by_email(&email).await.map_err(|e| {
        logger.error(
            "Failed to get user",
            &[Field::new("email", email.as_str()), Field::new("error", e.to_string())],
        );
        ApiError::from(e)
    })?;

    match user {
        Some(user) => {
            logger.info(
                "GetUserByEmail completed successfully",
                &[Field::new("user_id", user.user_id.as_str())],
            );
            Ok(Json(user))
        }
        None => {
            logger.info("User not found", &[Field::new("email", email.as_str())]);
            Err(ApiError::NotFound("user not found".into()))
        }
    }
}

/// `GET /api/v1/user/{user_id}`
pub async fn get_user_by_id(
    State(state): State<AppState>,
    logger: RequestLogger,
    Path(user_id): Path<String>,
) -> Result<Json<User>, ApiError> {
    logger.info("GetUserByID request received", &[Field::new("user_id", user_id.as_str())]);

    let user = state.users.find_by_id(&user_id).await.map_err(|e| {
        logger.error(
            "Failed to get user",
            &[Field::new("user_id", user_id.as_str()), Field::new("error", e.to_string())],
        );
        ApiError::from(e)
    })?;

    user.map(Json).ok_or_else(|| {
        logger.info("User not found", &[Field::new("user_id", user_id.as_str())]);
        ApiError::NotFound("user not found".into())
    })
}

/// `POST /api/v1/user`
pub async fn create_user(
    State(state): State<AppState>,
    logger: RequestLogger,
    body: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(new_user) = body.map_err(|rejection| {
        logger.warn("Invalid request body", &[Field::new("error", rejection.body_text())]);
        ApiError::BadRequest(format!("invalid request body: {}", rejection.body_text()))
    })?;

    if new_user.name.trim().is_empty() {
        logger.warn("Name is required", &[]);
        return Err(ApiError::BadRequest("name is required".into()));
    }
    if let Err(reason) = validate_email(&new_user.email) {
        logger.warn("Invalid email format", &[Field::new("error", reason)]);
        return Err(ApiError::BadRequest("invalid email format".into()));
    }

    logger.info(
        "CreateUser request received",
        &[
            Field::new("email", new_user.email.as_str()),
            Field::new("name", new_user.name.as_str()),
        ],
    );

    let email = new_user.email.clone();
    let user = state.users.create(new_user).await.map_err(|e| {
        logger.error(
            "Failed to create user",
            &[Field::new("email", email.as_str()), Field::new("error", e.to_string())],
        );
        ApiError::from(e)
    })?;

    logger.info(
        "CreateUser completed successfully",
        &[Field::new("user_id", user.user_id.as_str())],
    );
    Ok((StatusCode::CREATED, Json(user)))
}

/// `PUT /api/v1/user/{user_id}`
pub async fn update_user(
    State(state): State<AppState>,
    logger: RequestLogger,
    Path(user_id): Path<String>,
    body: Result<Json<UserUpdate>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(update) = body.map_err(|rejection| {
        logger.warn("Invalid request body", &[Field::new("error", rejection.body_text())]);
        ApiError::BadRequest(format!("invalid request body: {}", rejection.body_text()))
    })?;

    if update.is_empty() {
        logger.warn("No fields to update", &[Field::new("user_id", user_id.as_str())]);
        return Err(ApiError::BadRequest(
            "at least one field must be provided for update".into(),
        ));
    }

    logger.info("UpdateUser request received", &[Field::new("user_id", user_id.as_str())]);

    let user = state.users.update(&user_id, update).await.map_err(|e| {
        logger.error(
            "Failed to update user",
            &[Field::new("user_id", user_id.as_str()), Field::new("error", e.to_string())],
        );
        ApiError::from(e)
    })?;

    user.map(Json).ok_or_else(|| {
        logger.info("User not found", &[Field::new("user_id", user_id.as_str())]);
        ApiError::NotFound("user not found".into())
    })
}

/// Raw pagination parameters; parsed by hand so bad values get a clear message.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl ListParams {
    /// Validated `(limit, offset)`.
    pub fn parse(&self) -> Result<(u32, u32), ApiError> {
        let limit = match self.limit.as_deref() {
            None => DEFAULT_PAGE_LIMIT,
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|l| (1..=MAX_PAGE_LIMIT).contains(l))
                .ok_or_else(|| {
                    ApiError::BadRequest("limit must be a number between 1 and 100".into())
                })?,
        };
        let offset = match self.offset.as_deref() {
            None => 0,
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| ApiError::BadRequest("offset must be a non-negative number".into()))?,
        };
        Ok((limit, offset))
    }
}

/// `GET /api/v1/users?limit=&offset=`
pub async fn list_users(
    State(state): State<AppState>,
    logger: RequestLogger,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, ApiError> {
    let (limit, offset) = params.parse().inspect_err(|e| {
        logger.warn(
            "Invalid pagination parameters",
            &[
                Field::new("limit", params.limit.clone().unwrap_or_default()),
                Field::new("offset", params.offset.clone().unwrap_or_default()),
                Field::new("error", e.to_string()),
            ],
        );
    })?;

    logger.info(
        "ListUsers request received",
        &[Field::new("limit", limit), Field::new("offset", offset)],
    );

    let users = state.users.list(limit, offset).await.map_err(|e| {
        logger.error("Failed to list users", &[Field::new("error", e.to_string())]);
        ApiError::from(e)
    })?;

    logger.info("ListUsers completed successfully", &[Field::new("count", users.len())]);
    Ok(Json(json!({
        "users": users,
        "limit": limit,
        "offset": offset,
    })))
}
