//! SQLite repositories built on sqlx.
//!
//! All three repositories share one [`DatabasePool`] with split reader/writer
//! connections in WAL mode. Queries are raw SQL with private Row structs
//! mapping SQLite rows into domain types.

mod meeting;
mod pool;
mod user;
mod vote;

pub use meeting::SqliteMeetingRepository;
pub use pool::{DatabasePool, default_database_url};
pub use user::SqliteUserRepository;
pub use vote::SqliteVoteRepository;

use chrono::{DateTime, Utc};
use convene_types::error::RepositoryError;

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}
