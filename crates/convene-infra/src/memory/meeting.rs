//! In-memory meeting repository.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use convene_core::repository::{MeetingRepository, NewMeeting, NewTimeSlot};
use convene_types::error::RepositoryError;
use convene_types::meeting::{Meeting, MeetingParticipant, TimeSlot};

#[derive(Default)]
struct State {
    next_meeting_id: i64,
    next_slot_id: i64,
    meetings: HashMap<i64, Meeting>,
    participants: Vec<MeetingParticipant>,
    slots: HashMap<i64, TimeSlot>,
}

/// Map-backed meeting store. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryMeetingRepository {
    state: Arc<RwLock<State>>,
}

impl InMemoryMeetingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MeetingRepository for InMemoryMeetingRepository {
    async fn create(&self, meeting: NewMeeting) -> Result<Meeting, RepositoryError> {
        let mut state = self.state.write().await;
        state.next_meeting_id += 1;
        let now = Utc::now();
        let stored = Meeting {
            id: state.next_meeting_id,
            chat_id: meeting.chat_id,
            organizer_id: meeting.organizer_id,
            title: meeting.title,
            description: meeting.description,
            status: meeting.status,
            final_time: None,
            created_at: now,
            updated_at: now,
        };
        state.meetings.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_by_id(&self, id: i64) -> Result<Meeting, RepositoryError> {
        let state = self.state.read().await;
        state
            .meetings
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn update(&self, meeting: &Meeting) -> Result<Meeting, RepositoryError> {
        let mut state = self.state.write().await;
        if !state.meetings.contains_key(&meeting.id) {
            return Err(RepositoryError::NotFound);
        }
        let mut stored = meeting.clone();
        stored.updated_at = Utc::now();
        state.meetings.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        state.meetings.remove(&id);
        state.participants.retain(|p| p.meeting_id != id);
        state.slots.retain(|_, s| s.meeting_id != id);
        Ok(())
    }

    async fn add_participant(
        &self,
        meeting_id: i64,
        user_id: i64,
    ) -> Result<MeetingParticipant, RepositoryError> {
        let mut state = self.state.write().await;
        if !state.meetings.contains_key(&meeting_id) {
            return Err(RepositoryError::NotFound);
        }
        if let Some(existing) = state
            .participants
            .iter()
            .find(|p| p.meeting_id == meeting_id && p.user_id == user_id)
        {
            return Ok(existing.clone());
        }
        let participant = MeetingParticipant {
            meeting_id,
            user_id,
            joined_at: Utc::now(),
        };
        state.participants.push(participant.clone());
        Ok(participant)
    }

    async fn get_participants(
        &self,
        meeting_id: i64,
    ) -> Result<Vec<MeetingParticipant>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .participants
            .iter()
            .filter(|p| p.meeting_id == meeting_id)
            .cloned()
            .collect())
    }

    async fn add_time_slot(&self, slot: NewTimeSlot) -> Result<TimeSlot, RepositoryError> {
        let mut state = self.state.write().await;
        if !state.meetings.contains_key(&slot.meeting_id) {
            return Err(RepositoryError::NotFound);
        }
        state.next_slot_id += 1;
        let stored = TimeSlot {
            id: state.next_slot_id,
            meeting_id: slot.meeting_id,
            start_time: slot.start_time,
            end_time: slot.end_time,
        };
        state.slots.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_time_slots(&self, meeting_id: i64) -> Result<Vec<TimeSlot>, RepositoryError> {
        let state = self.state.read().await;
        let mut slots: Vec<TimeSlot> = state
            .slots
            .values()
            .filter(|s| s.meeting_id == meeting_id)
            .cloned()
            .collect();
        slots.sort_by_key(|s| s.id);
        Ok(slots)
    }

    async fn list_by_organizer(&self, organizer_id: i64) -> Result<Vec<Meeting>, RepositoryError> {
        let state = self.state.read().await;
        let mut meetings: Vec<Meeting> = state
            .meetings
            .values()
            .filter(|m| m.organizer_id == organizer_id)
            .cloned()
            .collect();
        meetings.sort_by_key(|m| m.id);
        Ok(meetings)
    }
}
