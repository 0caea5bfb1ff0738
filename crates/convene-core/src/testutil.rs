//! In-process test doubles for the service and router tests.
//!
//! `MemRepo` is a deliberately small hashmap-backed implementation of all
//! three repository traits; the production-grade backends live in
//! `convene-infra` and are covered by their own contract suite.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use convene_types::error::RepositoryError;
use convene_types::event::Keyboard;
use convene_types::meeting::{Meeting, MeetingParticipant, TimeSlot, Vote};
use convene_types::user::User;

use crate::repository::{
    MeetingRepository, NewMeeting, NewTimeSlot, NewVote, UserRepository, VoteRepository,
};
use crate::transport::{ChatTransport, TransportError};

#[derive(Default)]
struct MemState {
    next_id: i64,
    meetings: HashMap<i64, Meeting>,
    participants: Vec<MeetingParticipant>,
    slots: BTreeMap<i64, TimeSlot>,
    /// Keyed by (user_id, time_slot_id): the upsert invariant.
    votes: HashMap<(i64, i64), Vote>,
    users: HashMap<i64, User>,
}

impl MemState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Hashmap-backed repo implementing all three repository traits.
#[derive(Clone, Default)]
pub struct MemRepo {
    state: Arc<Mutex<MemState>>,
}

impl MeetingRepository for MemRepo {
    async fn create(&self, meeting: NewMeeting) -> Result<Meeting, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        let stored = Meeting {
            id: state.next_id(),
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
        let state = self.state.lock().unwrap();
        state.meetings.get(&id).cloned().ok_or(RepositoryError::NotFound)
    }

    async fn update(&self, meeting: &Meeting) -> Result<Meeting, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if !state.meetings.contains_key(&meeting.id) {
            return Err(RepositoryError::NotFound);
        }
        let mut stored = meeting.clone();
        stored.updated_at = Utc::now();
        state.meetings.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
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
        let mut state = self.state.lock().unwrap();
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
        let state = self.state.lock().unwrap();
        Ok(state
            .participants
            .iter()
            .filter(|p| p.meeting_id == meeting_id)
            .cloned()
            .collect())
    }

    async fn add_time_slot(&self, slot: NewTimeSlot) -> Result<TimeSlot, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let stored = TimeSlot {
            id: state.next_id(),
            meeting_id: slot.meeting_id,
            start_time: slot.start_time,
            end_time: slot.end_time,
        };
        state.slots.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_time_slots(&self, meeting_id: i64) -> Result<Vec<TimeSlot>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .slots
            .values()
            .filter(|s| s.meeting_id == meeting_id)
            .cloned()
            .collect())
    }

    async fn list_by_organizer(&self, organizer_id: i64) -> Result<Vec<Meeting>, RepositoryError> {
        let state = self.state.lock().unwrap();
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

impl VoteRepository for MemRepo {
    async fn upsert(&self, vote: NewVote) -> Result<Vote, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let stored = Vote {
            meeting_id: vote.meeting_id,
            user_id: vote.user_id,
            time_slot_id: vote.time_slot_id,
            choice: vote.choice,
            voted_at: Utc::now(),
        };
        state
            .votes
            .insert((vote.user_id, vote.time_slot_id), stored.clone());
        Ok(stored)
    }

    async fn remove(
        &self,
        _meeting_id: i64,
        user_id: i64,
        time_slot_id: i64,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        Ok(state.votes.remove(&(user_id, time_slot_id)).is_some())
    }

    async fn get_by_meeting(&self, meeting_id: i64) -> Result<Vec<Vote>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .votes
            .values()
            .filter(|v| v.meeting_id == meeting_id)
            .cloned()
            .collect())
    }

    async fn get_by_time_slot(&self, time_slot_id: i64) -> Result<Vec<Vote>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .votes
            .values()
            .filter(|v| v.time_slot_id == time_slot_id)
            .cloned()
            .collect())
    }
}

impl UserRepository for MemRepo {
    async fn create(&self, platform_id: i64, display_name: &str) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let user = User {
            id: state.next_id(),
            platform_id,
            display_name: display_name.to_string(),
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: i64) -> Result<User, RepositoryError> {
        let state = self.state.lock().unwrap();
        state.users.get(&id).cloned().ok_or(RepositoryError::NotFound)
    }

    async fn get_by_platform_id(&self, platform_id: i64) -> Result<User, RepositoryError> {
        let state = self.state.lock().unwrap();
        state
            .users
            .values()
            .find(|u| u.platform_id == platform_id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }
}

/// An outbound call captured by [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Text { chat_id: i64, text: String },
    WithKeyboard { chat_id: i64, text: String, buttons: usize },
    Edit { chat_id: i64, message_id: String, text: String },
    CallbackAnswer { callback_id: String, text: String },
}

/// Transport double that records every outbound call.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    calls: Arc<Mutex<Vec<Outbound>>>,
    /// When set, every call fails with this message.
    pub fail_with: Arc<Mutex<Option<String>>>,
}

impl RecordingTransport {
    pub fn calls(&self) -> Vec<Outbound> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Outbound::Text { text, .. } | Outbound::WithKeyboard { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn callback_answers(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Outbound::CallbackAnswer { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Outbound) -> Result<(), TransportError> {
        if let Some(msg) = self.fail_with.lock().unwrap().clone() {
            return Err(TransportError(msg));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

impl ChatTransport for RecordingTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        self.record(Outbound::Text {
            chat_id,
            text: text.to_string(),
        })
    }

    async fn send_with_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<(), TransportError> {
        self.record(Outbound::WithKeyboard {
            chat_id,
            text: text.to_string(),
            buttons: keyboard.rows.iter().map(Vec::len).sum(),
        })
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: &str,
        text: &str,
        _keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError> {
        self.record(Outbound::Edit {
            chat_id,
            message_id: message_id.to_string(),
            text: text.to_string(),
        })
    }

    async fn answer_callback(&self, callback_id: &str, text: &str) -> Result<(), TransportError> {
        self.record(Outbound::CallbackAnswer {
            callback_id: callback_id.to_string(),
            text: text.to_string(),
        })
    }
}
