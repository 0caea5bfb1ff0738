//! SQLite meeting repository implementation.

use chrono::Utc;
use sqlx::Row;

use convene_core::repository::{MeetingRepository, NewMeeting, NewTimeSlot};
use convene_types::error::RepositoryError;
use convene_types::meeting::{Meeting, MeetingParticipant, MeetingStatus, TimeSlot};

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `MeetingRepository`.
#[derive(Clone)]
pub struct SqliteMeetingRepository {
    pool: DatabasePool,
}

impl SqliteMeetingRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct MeetingRow {
    id: i64,
    chat_id: i64,
    organizer_id: i64,
    title: String,
    description: Option<String>,
    status: String,
    final_time: Option<String>,
    created_at: String,
    updated_at: String,
}

impl MeetingRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            chat_id: row.try_get("chat_id")?,
            organizer_id: row.try_get("organizer_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            status: row.try_get("status")?,
            final_time: row.try_get("final_time")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_meeting(self) -> Result<Meeting, RepositoryError> {
        let status: MeetingStatus = self.status.parse().map_err(RepositoryError::Query)?;
        let final_time = self.final_time.as_deref().map(parse_datetime).transpose()?;
        Ok(Meeting {
            id: self.id,
            chat_id: self.chat_id,
            organizer_id: self.organizer_id,
            title: self.title,
            description: self.description,
            status,
            final_time,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct TimeSlotRow {
    id: i64,
    meeting_id: i64,
    start_time: String,
    end_time: String,
}

impl TimeSlotRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            meeting_id: row.try_get("meeting_id")?,
            start_time: row.try_get("start_time")?,
            end_time: row.try_get("end_time")?,
        })
    }

    fn into_slot(self) -> Result<TimeSlot, RepositoryError> {
        Ok(TimeSlot {
            id: self.id,
            meeting_id: self.meeting_id,
            start_time: parse_datetime(&self.start_time)?,
            end_time: parse_datetime(&self.end_time)?,
        })
    }
}

impl MeetingRepository for SqliteMeetingRepository {
    async fn create(&self, meeting: NewMeeting) -> Result<Meeting, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"INSERT INTO meetings (chat_id, organizer_id, title, description, status, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(meeting.chat_id)
        .bind(meeting.organizer_id)
        .bind(&meeting.title)
        .bind(&meeting.description)
        .bind(meeting.status.to_string())
        .bind(format_datetime(&now))
        .bind(format_datetime(&now))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(Meeting {
            id: result.last_insert_rowid(),
            chat_id: meeting.chat_id,
            organizer_id: meeting.organizer_id,
            title: meeting.title,
            description: meeting.description,
            status: meeting.status,
            final_time: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Meeting, RepositoryError> {
        let row = sqlx::query("SELECT * FROM meetings WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .ok_or(RepositoryError::NotFound)?;

        MeetingRow::from_row(&row)
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .into_meeting()
    }

    async fn update(&self, meeting: &Meeting) -> Result<Meeting, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"UPDATE meetings
               SET chat_id = ?, organizer_id = ?, title = ?, description = ?,
                   status = ?, final_time = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(meeting.chat_id)
        .bind(meeting.organizer_id)
        .bind(&meeting.title)
        .bind(&meeting.description)
        .bind(meeting.status.to_string())
        .bind(meeting.final_time.as_ref().map(format_datetime))
        .bind(format_datetime(&now))
        .bind(meeting.id)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let mut stored = meeting.clone();
        stored.updated_at = now;
        Ok(stored)
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        // Participants, slots, and votes go with it via ON DELETE CASCADE.
        sqlx::query("DELETE FROM meetings WHERE id = ?")
            .bind(id)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(())
    }

    async fn add_participant(
        &self,
        meeting_id: i64,
        user_id: i64,
    ) -> Result<MeetingParticipant, RepositoryError> {
        let now = Utc::now();
        sqlx::query(
            r#"INSERT INTO meeting_participants (meeting_id, user_id, joined_at)
               VALUES (?, ?, ?)
               ON CONFLICT (meeting_id, user_id) DO NOTHING"#,
        )
        .bind(meeting_id)
        .bind(user_id)
        .bind(format_datetime(&now))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                RepositoryError::NotFound
            }
            _ => RepositoryError::Query(e.to_string()),
        })?;

        Ok(MeetingParticipant {
            meeting_id,
            user_id,
            joined_at: now,
        })
    }

    async fn get_participants(
        &self,
        meeting_id: i64,
    ) -> Result<Vec<MeetingParticipant>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT meeting_id, user_id, joined_at FROM meeting_participants WHERE meeting_id = ?",
        )
        .bind(meeting_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let joined_at: String = row
                    .try_get("joined_at")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(MeetingParticipant {
                    meeting_id: row
                        .try_get("meeting_id")
                        .map_err(|e| RepositoryError::Query(e.to_string()))?,
                    user_id: row
                        .try_get("user_id")
                        .map_err(|e| RepositoryError::Query(e.to_string()))?,
                    joined_at: parse_datetime(&joined_at)?,
                })
            })
            .collect()
    }

    async fn add_time_slot(&self, slot: NewTimeSlot) -> Result<TimeSlot, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO time_slots (meeting_id, start_time, end_time) VALUES (?, ?, ?)",
        )
        .bind(slot.meeting_id)
        .bind(format_datetime(&slot.start_time))
        .bind(format_datetime(&slot.end_time))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                RepositoryError::NotFound
            }
            _ => RepositoryError::Query(e.to_string()),
        })?;

        Ok(TimeSlot {
            id: result.last_insert_rowid(),
            meeting_id: slot.meeting_id,
            start_time: slot.start_time,
            end_time: slot.end_time,
        })
    }

    async fn get_time_slots(&self, meeting_id: i64) -> Result<Vec<TimeSlot>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM time_slots WHERE meeting_id = ? ORDER BY id")
            .bind(meeting_id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                TimeSlotRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_slot()
            })
            .collect()
    }

    async fn list_by_organizer(&self, organizer_id: i64) -> Result<Vec<Meeting>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM meetings WHERE organizer_id = ? ORDER BY id")
            .bind(organizer_id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                MeetingRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_meeting()
            })
            .collect()
    }
}
