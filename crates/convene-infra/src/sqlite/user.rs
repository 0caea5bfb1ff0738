//! SQLite user repository implementation.

use chrono::Utc;
use sqlx::Row;

use convene_core::repository::UserRepository;
use convene_types::error::RepositoryError;
use convene_types::user::User;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `UserRepository`.
#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct UserRow {
    id: i64,
    platform_id: i64,
    display_name: String,
    created_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            platform_id: row.try_get("platform_id")?,
            display_name: row.try_get("display_name")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_user(self) -> Result<User, RepositoryError> {
        Ok(User {
            id: self.id,
            platform_id: self.platform_id,
            display_name: self.display_name,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

impl UserRepository for SqliteUserRepository {
    async fn create(&self, platform_id: i64, display_name: &str) -> Result<User, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (platform_id, display_name, created_at) VALUES (?, ?, ?)",
        )
        .bind(platform_id)
        .bind(display_name)
        .bind(format_datetime(&now))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Conflict(
                format!("user with platform id {platform_id} already exists"),
            ),
            _ => RepositoryError::Query(e.to_string()),
        })?;

        Ok(User {
            id: result.last_insert_rowid(),
            platform_id,
            display_name: display_name.to_string(),
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<User, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .ok_or(RepositoryError::NotFound)?;

        UserRow::from_row(&row)
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .into_user()
    }

    async fn get_by_platform_id(&self, platform_id: i64) -> Result<User, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE platform_id = ?")
            .bind(platform_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .ok_or(RepositoryError::NotFound)?;

        UserRow::from_row(&row)
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .into_user()
    }
}
