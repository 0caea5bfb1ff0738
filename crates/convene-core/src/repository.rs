//! Repository trait definitions.
//!
//! CRUD contracts for meetings (with their participants and time slots),
//! votes, and users. Implementations live in `convene-infra`
//! (`memory::*` and `sqlite::*`) and must satisfy identical semantics;
//! `convene-infra/tests/repository_contract.rs` holds the shared suite.
//!
//! Uses native async fn in traits (RPITIT, Rust 2024 edition). Ids are
//! assigned by the store: unique and strictly increasing per store instance.

use chrono::{DateTime, Utc};
use convene_types::error::RepositoryError;
use convene_types::meeting::{Meeting, MeetingParticipant, MeetingStatus, TimeSlot, Vote, VoteChoice};
use convene_types::user::User;

/// Input for creating a meeting. Id and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewMeeting {
    pub chat_id: i64,
    pub organizer_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: MeetingStatus,
}

/// Input for creating a time slot.
#[derive(Debug, Clone)]
pub struct NewTimeSlot {
    pub meeting_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Input for recording a vote. `voted_at` is stamped by the store.
#[derive(Debug, Clone)]
pub struct NewVote {
    pub meeting_id: i64,
    pub user_id: i64,
    pub time_slot_id: i64,
    pub choice: VoteChoice,
}

/// Repository trait for meeting, participant, and time slot persistence.
pub trait MeetingRepository: Send + Sync {
    /// Create a meeting, assigning its id and stamping created/updated times.
    fn create(
        &self,
        meeting: NewMeeting,
    ) -> impl std::future::Future<Output = Result<Meeting, RepositoryError>> + Send;

    /// Get a meeting by id. Fails with `NotFound` when absent.
    fn get_by_id(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Meeting, RepositoryError>> + Send;

    /// Update an existing meeting, re-stamping `updated_at`.
    ///
    /// Fails with `NotFound` if the target id does not exist. Returns the
    /// stored record including the fresh timestamp.
    fn update(
        &self,
        meeting: &Meeting,
    ) -> impl std::future::Future<Output = Result<Meeting, RepositoryError>> + Send;

    /// Delete a meeting together with its participants and time slots.
    fn delete(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Record that a user is invited to / aware of a meeting.
    fn add_participant(
        &self,
        meeting_id: i64,
        user_id: i64,
    ) -> impl std::future::Future<Output = Result<MeetingParticipant, RepositoryError>> + Send;

    /// List participants of a meeting. Empty vec when none.
    fn get_participants(
        &self,
        meeting_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<MeetingParticipant>, RepositoryError>> + Send;

    /// Add a candidate time slot to a meeting, assigning its id.
    fn add_time_slot(
        &self,
        slot: NewTimeSlot,
    ) -> impl std::future::Future<Output = Result<TimeSlot, RepositoryError>> + Send;

    /// List time slots of a meeting, ordered by slot id.
    fn get_time_slots(
        &self,
        meeting_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<TimeSlot>, RepositoryError>> + Send;

    /// List meetings organized by a user, ordered by meeting id.
    fn list_by_organizer(
        &self,
        organizer_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<Meeting>, RepositoryError>> + Send;
}

/// Repository trait for vote persistence.
///
/// At most one current vote exists per (user, time slot): `upsert` replaces
/// any previous vote for that pair, `remove` deletes it.
pub trait VoteRepository: Send + Sync {
    /// Record a vote, replacing the user's previous vote on the same slot.
    fn upsert(
        &self,
        vote: NewVote,
    ) -> impl std::future::Future<Output = Result<Vote, RepositoryError>> + Send;

    /// Remove the current vote for (user, slot). Returns whether one existed.
    fn remove(
        &self,
        meeting_id: i64,
        user_id: i64,
        time_slot_id: i64,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// All current votes for a meeting.
    fn get_by_meeting(
        &self,
        meeting_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<Vote>, RepositoryError>> + Send;

    /// All current votes for a single time slot.
    fn get_by_time_slot(
        &self,
        time_slot_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<Vote>, RepositoryError>> + Send;
}

/// Repository trait for user persistence.
pub trait UserRepository: Send + Sync {
    /// Create a user, assigning its id and creation time.
    fn create(
        &self,
        platform_id: i64,
        display_name: &str,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    /// Get a user by store id. Fails with `NotFound` when absent.
    fn get_by_id(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    /// Get a user by the chat platform's sender id. Fails with `NotFound` when absent.
    fn get_by_platform_id(
        &self,
        platform_id: i64,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;
}
