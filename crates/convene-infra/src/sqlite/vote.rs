//! SQLite vote repository implementation.
//!
//! The `(user_id, time_slot_id)` primary key plus `ON CONFLICT DO UPDATE`
//! makes the one-current-vote-per-user-per-slot rule a database invariant.

use chrono::Utc;
use sqlx::Row;

use convene_core::repository::{NewVote, VoteRepository};
use convene_types::error::RepositoryError;
use convene_types::meeting::{Vote, VoteChoice};

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `VoteRepository`.
#[derive(Clone)]
pub struct SqliteVoteRepository {
    pool: DatabasePool,
}

impl SqliteVoteRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct VoteRow {
    meeting_id: i64,
    user_id: i64,
    time_slot_id: i64,
    vote_type: String,
    voted_at: String,
}

impl VoteRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            meeting_id: row.try_get("meeting_id")?,
            user_id: row.try_get("user_id")?,
            time_slot_id: row.try_get("time_slot_id")?,
            vote_type: row.try_get("vote_type")?,
            voted_at: row.try_get("voted_at")?,
        })
    }

    fn into_vote(self) -> Result<Vote, RepositoryError> {
        let choice: VoteChoice = self.vote_type.parse().map_err(RepositoryError::Query)?;
        Ok(Vote {
            meeting_id: self.meeting_id,
            user_id: self.user_id,
            time_slot_id: self.time_slot_id,
            choice,
            voted_at: parse_datetime(&self.voted_at)?,
        })
    }
}

impl VoteRepository for SqliteVoteRepository {
    async fn upsert(&self, vote: NewVote) -> Result<Vote, RepositoryError> {
        let now = Utc::now();
        sqlx::query(
            r#"INSERT INTO votes (meeting_id, user_id, time_slot_id, vote_type, voted_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT (user_id, time_slot_id) DO UPDATE SET
                   meeting_id = excluded.meeting_id,
                   vote_type = excluded.vote_type,
                   voted_at = excluded.voted_at"#,
        )
        .bind(vote.meeting_id)
        .bind(vote.user_id)
        .bind(vote.time_slot_id)
        .bind(vote.choice.to_string())
        .bind(format_datetime(&now))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                RepositoryError::NotFound
            }
            _ => RepositoryError::Query(e.to_string()),
        })?;

        Ok(Vote {
            meeting_id: vote.meeting_id,
            user_id: vote.user_id,
            time_slot_id: vote.time_slot_id,
            choice: vote.choice,
            voted_at: now,
        })
    }

    async fn remove(
        &self,
        meeting_id: i64,
        user_id: i64,
        time_slot_id: i64,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM votes WHERE meeting_id = ? AND user_id = ? AND time_slot_id = ?",
        )
        .bind(meeting_id)
        .bind(user_id)
        .bind(time_slot_id)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_by_meeting(&self, meeting_id: i64) -> Result<Vec<Vote>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM votes WHERE meeting_id = ?")
            .bind(meeting_id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                VoteRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_vote()
            })
            .collect()
    }

    async fn get_by_time_slot(&self, time_slot_id: i64) -> Result<Vec<Vote>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM votes WHERE time_slot_id = ?")
            .bind(time_slot_id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                VoteRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_vote()
            })
            .collect()
    }
}
