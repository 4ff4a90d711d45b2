//! PostgreSQL user store on a shared sqlx pool.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::store::{StoreError, StoreHealth, StoreResult, UserStore};
use crate::users::types::{NewUser, User, UserUpdate};

const USER_COLUMNS: &str = "user_id, name, email, picture_url, phone_number, location, \
                            reputation, created_at, updated_at";

/// User store backed by a `PgPool`.
///
/// Cloning shares the pool.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Open the pool and verify the database answers.
    pub async fn connect(config: &DatabaseConfig, url: &str) -> StoreResult<Self> {
        let connect_timeout = Duration::from_secs(config.connect_timeout_secs);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(connect_timeout)
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_secs)))
            .max_lifetime(Some(Duration::from_secs(config.max_lifetime_secs)))
            .connect(url)
            .await
            .map_err(map_sqlx_error)?;

        let store = Self { pool };
        tokio::time::timeout(connect_timeout, store.ping())
            .await
            .map_err(|_| StoreError::Unavailable("initial ping timed out".into()))??;

        tracing::info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connected to PostgreSQL"
        );
        Ok(store)
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(db.message().to_string())
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        sqlx::Error::Tls(_) | sqlx::Error::Configuration(_) => StoreError::Unavailable(err.to_string()),
        other => StoreError::Query(other.to_string()),
    }
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        picture_url: row.try_get("picture_url")?,
        phone_number: row.try_get("phone_number")?,
        location: row.try_get("location")?,
        reputation: row.try_get("reputation")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.as_ref().map(user_from_row).transpose().map_err(map_sqlx_error)
    }

    async fn find_by_id(&self, user_id: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE user_id = $1", USER_COLUMNS))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.as_ref().map(user_from_row).transpose().map_err(map_sqlx_error)
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query(&format!(
            "INSERT INTO users (user_id, name, email, picture_url, phone_number, location) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.picture_url)
        .bind(&user.phone_number)
        .bind(&user.location)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        user_from_row(&row).map_err(map_sqlx_error)
    }

    async fn update(&self, user_id: &str, update: UserUpdate) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!(
            "UPDATE users SET \
                name = COALESCE($2, name), \
                picture_url = COALESCE($3, picture_url), \
                phone_number = COALESCE($4, phone_number), \
                location = COALESCE($5, location), \
                updated_at = NOW() \
             WHERE user_id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(&update.name)
        .bind(&update.picture_url)
        .bind(&update.phone_number)
        .bind(&update.location)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        row.as_ref().map(user_from_row).transpose().map_err(map_sqlx_error)
    }

    async fn list(&self, limit: u32, offset: u32) -> StoreResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users ORDER BY created_at, user_id LIMIT $1 OFFSET $2",
            USER_COLUMNS
        ))
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        rows.iter()
            .map(user_from_row)
            .collect::<Result<_, _>>()
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl StoreHealth for PgUserStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database connection pool closed");
    }
}
