//! Meeting service orchestrating meeting creation and reads.
//!
//! Coordinates the meeting repository and user repository to create meetings
//! with their participants and candidate time slots, and to serve the reads
//! behind "my meetings" and the meeting summary re-render.

use chrono::{DateTime, Utc};
use convene_types::error::{MeetingError, RepositoryError};
use convene_types::meeting::{Meeting, MeetingParticipant, MeetingStatus, TimeSlot};
use convene_types::user::User;
use tracing::{info, warn};

use crate::repository::{MeetingRepository, NewMeeting, NewTimeSlot, UserRepository};

/// Request to create a meeting from a completed dialog.
#[derive(Debug, Clone)]
pub struct CreateMeetingRequest {
    pub chat_id: i64,
    pub organizer_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub participant_ids: Vec<i64>,
    /// Candidate (start, end) pairs, already parsed and validated.
    pub time_slots: Vec<(DateTime<Utc>, DateTime<Utc>)>,
}

/// A meeting together with the sub-entities stored for it.
#[derive(Debug, Clone)]
pub struct MeetingDetails {
    pub meeting: Meeting,
    pub participants: Vec<MeetingParticipant>,
    pub time_slots: Vec<TimeSlot>,
}

/// Orchestrates meeting lifecycle and reads.
///
/// Generic over the repository traits so the same service runs against the
/// in-memory and SQLite backends.
pub struct MeetingService<M: MeetingRepository, U: UserRepository> {
    meeting_repo: M,
    user_repo: U,
}

impl<M: MeetingRepository, U: UserRepository> MeetingService<M, U> {
    pub fn new(meeting_repo: M, user_repo: U) -> Self {
        Self {
            meeting_repo,
            user_repo,
        }
    }

    /// Create a meeting with its participants and time slots.
    ///
    /// The meeting row is inserted as `Pending`, sub-entities are attached,
    /// and the status flips to `Open` once they are stored. Participant and
    /// slot persistence is best-effort: an individual failure is logged and
    /// skipped, the meeting itself stands.
    pub async fn create_meeting(
        &self,
        req: CreateMeetingRequest,
    ) -> Result<MeetingDetails, MeetingError> {
        if req.title.trim().is_empty() {
            return Err(MeetingError::EmptyTitle);
        }

        let mut meeting = self
            .meeting_repo
            .create(NewMeeting {
                chat_id: req.chat_id,
                organizer_id: req.organizer_id,
                title: req.title,
                description: req.description,
                status: MeetingStatus::Pending,
            })
            .await?;

        let mut participants = Vec::with_capacity(req.participant_ids.len());
        for user_id in req.participant_ids {
            match self.meeting_repo.add_participant(meeting.id, user_id).await {
                Ok(p) => participants.push(p),
                Err(e) => {
                    warn!(meeting_id = meeting.id, user_id, error = %e, "failed to add participant, skipping");
                }
            }
        }

        let mut time_slots = Vec::with_capacity(req.time_slots.len());
        for (start_time, end_time) in req.time_slots {
            let slot = NewTimeSlot {
                meeting_id: meeting.id,
                start_time,
                end_time,
            };
            match self.meeting_repo.add_time_slot(slot).await {
                Ok(s) => time_slots.push(s),
                Err(e) => {
                    warn!(meeting_id = meeting.id, error = %e, "failed to add time slot, skipping");
                }
            }
        }

        meeting.status = MeetingStatus::Open;
        let meeting = self.meeting_repo.update(&meeting).await?;

        info!(
            meeting_id = meeting.id,
            slots = time_slots.len(),
            participants = participants.len(),
            "meeting created"
        );

        Ok(MeetingDetails {
            meeting,
            participants,
            time_slots,
        })
    }

    /// Get a meeting by id.
    pub async fn get_meeting(&self, meeting_id: i64) -> Result<Meeting, MeetingError> {
        self.meeting_repo
            .get_by_id(meeting_id)
            .await
            .map_err(map_not_found)
    }

    /// Get a meeting with its participants and time slots.
    pub async fn meeting_details(&self, meeting_id: i64) -> Result<MeetingDetails, MeetingError> {
        let meeting = self.get_meeting(meeting_id).await?;
        let participants = self.meeting_repo.get_participants(meeting_id).await?;
        let time_slots = self.meeting_repo.get_time_slots(meeting_id).await?;
        Ok(MeetingDetails {
            meeting,
            participants,
            time_slots,
        })
    }

    /// List meetings the user organizes.
    pub async fn user_meetings(&self, organizer_id: i64) -> Result<Vec<Meeting>, MeetingError> {
        Ok(self.meeting_repo.list_by_organizer(organizer_id).await?)
    }

    /// Look up a user by platform id, creating the record on first contact.
    pub async fn ensure_user(
        &self,
        platform_id: i64,
        display_name: &str,
    ) -> Result<User, MeetingError> {
        match self.user_repo.get_by_platform_id(platform_id).await {
            Ok(user) => Ok(user),
            Err(RepositoryError::NotFound) => {
                let user = self.user_repo.create(platform_id, display_name).await?;
                info!(user_id = user.id, platform_id, "registered new user");
                Ok(user)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Translate a repository `NotFound` into the domain-level variant.
pub(crate) fn map_not_found(e: RepositoryError) -> MeetingError {
    match e {
        RepositoryError::NotFound => MeetingError::NotFound,
        other => MeetingError::Repository(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MemRepo;
    use chrono::Duration;

    fn service() -> MeetingService<MemRepo, MemRepo> {
        let repo = MemRepo::default();
        MeetingService::new(repo.clone(), repo)
    }

    fn two_slot_request() -> CreateMeetingRequest {
        let start = Utc::now() + Duration::days(1);
        CreateMeetingRequest {
            chat_id: 100,
            organizer_id: 7,
            title: "Team Sync".to_string(),
            description: Some("weekly".to_string()),
            participant_ids: vec![7, 8],
            time_slots: vec![
                (start, start + Duration::hours(1)),
                (
                    start + Duration::days(1),
                    start + Duration::days(1) + Duration::hours(1),
                ),
            ],
        }
    }

    #[tokio::test]
    async fn test_create_meeting_with_two_slots() {
        let svc = service();
        let req = two_slot_request();
        let expected = req.time_slots.clone();

        let details = svc.create_meeting(req).await.unwrap();

        assert_eq!(details.meeting.title, "Team Sync");
        assert_eq!(details.meeting.status, MeetingStatus::Open);
        assert_eq!(details.time_slots.len(), 2);
        for (slot, (start, end)) in details.time_slots.iter().zip(expected) {
            assert_eq!(slot.start_time, start);
            assert_eq!(slot.end_time, end);
            assert_eq!(slot.meeting_id, details.meeting.id);
        }
        assert_eq!(details.participants.len(), 2);
    }

    #[tokio::test]
    async fn test_create_meeting_rejects_empty_title() {
        let svc = service();
        let mut req = two_slot_request();
        req.title = "   ".to_string();
        let err = svc.create_meeting(req).await.unwrap_err();
        assert!(matches!(err, MeetingError::EmptyTitle));
    }

    #[tokio::test]
    async fn test_meeting_ids_strictly_increasing() {
        let svc = service();
        let mut last = 0;
        for _ in 0..5 {
            let details = svc.create_meeting(two_slot_request()).await.unwrap();
            assert!(details.meeting.id > last);
            last = details.meeting.id;
        }
    }

    #[tokio::test]
    async fn test_get_meeting_not_found() {
        let svc = service();
        let err = svc.get_meeting(999).await.unwrap_err();
        assert!(matches!(err, MeetingError::NotFound));
    }

    #[tokio::test]
    async fn test_ensure_user_is_idempotent() {
        let svc = service();
        let first = svc.ensure_user(42, "Ada").await.unwrap();
        let second = svc.ensure_user(42, "Ada").await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_user_meetings_lists_only_own() {
        let svc = service();
        svc.create_meeting(two_slot_request()).await.unwrap();
        let mut other = two_slot_request();
        other.organizer_id = 99;
        svc.create_meeting(other).await.unwrap();

        let mine = svc.user_meetings(7).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].organizer_id, 7);
    }
}
