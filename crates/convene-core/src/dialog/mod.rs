//! Per-user meeting-creation dialog.
//!
//! Tracks one ephemeral session per user across a fixed three-step flow:
//! title, optional description, candidate time slots. Sessions live in a
//! `DashMap` keyed by user id; each entry wraps a `tokio::sync::Mutex` so two
//! messages from the same user are never processed against stale state while
//! different users proceed fully in parallel. Idle sessions are swept after a
//! timeout instead of living forever.

pub mod parse;

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

use convene_types::event::{Button, ButtonIntent, Keyboard};

use crate::meeting::{CreateMeetingRequest, MeetingDetails, MeetingService};
use crate::repository::{MeetingRepository, UserRepository};

/// Sentinel accepted at the description step to leave it empty.
pub const SKIP_SENTINEL: &str = "skip";

/// Sessions idle longer than this are swept.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Which input the session is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DialogStep {
    Title,
    Description,
    TimeSlots,
}

#[derive(Debug)]
struct DialogSession {
    step: DialogStep,
    title: Option<String>,
    description: Option<String>,
    last_active: Instant,
}

impl DialogSession {
    fn new() -> Self {
        Self {
            step: DialogStep::Title,
            title: None,
            description: None,
            last_active: Instant::now(),
        }
    }
}

/// Reply produced by a dialog interaction, to be rendered by the caller.
#[derive(Debug)]
pub enum DialogReply {
    /// Ask the user for the next (or repeated) input.
    Prompt {
        text: String,
        keyboard: Option<Keyboard>,
    },
    /// The flow finished and the meeting was created.
    Completed(MeetingDetails),
    /// The user cancelled; the session is gone.
    Cancelled,
    /// Meeting creation failed; the session is gone.
    Failed { text: String },
}

/// Manages per-user dialog sessions and drives meeting creation on completion.
pub struct DialogManager<M: MeetingRepository, U: UserRepository> {
    meetings: Arc<MeetingService<M, U>>,
    sessions: DashMap<i64, Arc<Mutex<DialogSession>>>,
    idle_timeout: Duration,
}

impl<M: MeetingRepository, U: UserRepository> DialogManager<M, U> {
    pub fn new(meetings: Arc<MeetingService<M, U>>) -> Self {
        Self::with_idle_timeout(meetings, DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(meetings: Arc<MeetingService<M, U>>, idle_timeout: Duration) -> Self {
        Self {
            meetings,
            sessions: DashMap::new(),
            idle_timeout,
        }
    }

    /// Whether the user has a live (non-expired) session.
    pub async fn has_session(&self, user_id: i64) -> bool {
        let Some(entry) = self.sessions.get(&user_id).map(|e| e.value().clone()) else {
            return false;
        };
        let expired = entry.lock().await.last_active.elapsed() > self.idle_timeout;
        if expired {
            self.sessions.remove(&user_id);
            info!(user_id, "dialog session expired");
        }
        !expired
    }

    /// Start (or restart) the creation flow for a user.
    pub fn begin(&self, user_id: i64) -> DialogReply {
        self.sessions
            .insert(user_id, Arc::new(Mutex::new(DialogSession::new())));
        DialogReply::Prompt {
            text: "Creating a meeting.\n\nStep 1/3: enter a title\n(or /cancel to abort)"
                .to_string(),
            keyboard: Some(cancel_keyboard()),
        }
    }

    /// Drop the user's session, if any. Returns whether one existed.
    pub fn cancel(&self, user_id: i64) -> bool {
        self.sessions.remove(&user_id).is_some()
    }

    /// Advance past the description step via the skip button.
    pub async fn skip_description(&self, user_id: i64) -> DialogReply {
        let Some(entry) = self.sessions.get(&user_id).map(|e| e.value().clone()) else {
            return DialogReply::Failed {
                text: "No meeting creation in progress. Use /create_meeting to start.".to_string(),
            };
        };
        let mut session = entry.lock().await;
        if session.step != DialogStep::Description {
            return DialogReply::Failed {
                text: "Nothing to skip right now.".to_string(),
            };
        }
        session.step = DialogStep::TimeSlots;
        session.last_active = Instant::now();
        slots_prompt()
    }

    /// Process a text message for a user with an active session.
    ///
    /// Returns `None` when the user has no session, so the caller can fall
    /// through to command handling.
    pub async fn handle_message(
        &self,
        chat_id: i64,
        user_id: i64,
        text: &str,
    ) -> Option<DialogReply> {
        if !self.has_session(user_id).await {
            return None;
        }
        let entry = self.sessions.get(&user_id).map(|e| e.value().clone())?;
        let mut session = entry.lock().await;
        session.last_active = Instant::now();

        let text = text.trim();
        if text == "/cancel" {
            drop(session);
            self.sessions.remove(&user_id);
            return Some(DialogReply::Cancelled);
        }

        let reply = match session.step {
            DialogStep::Title => {
                if text.is_empty() {
                    DialogReply::Prompt {
                        text: "The title must not be empty. Step 1/3: enter a title".to_string(),
                        keyboard: Some(cancel_keyboard()),
                    }
                } else {
                    session.title = Some(text.to_string());
                    session.step = DialogStep::Description;
                    DialogReply::Prompt {
                        text: format!(
                            "Step 2/3: enter a description\n(or '{SKIP_SENTINEL}' to leave it empty)"
                        ),
                        keyboard: Some(
                            Keyboard::new().row(vec![
                                Button::new("Skip", ButtonIntent::Default, "skip_description"),
                                Button::new("Cancel", ButtonIntent::Negative, "cancel"),
                            ]),
                        ),
                    }
                }
            }
            DialogStep::Description => {
                if !text.eq_ignore_ascii_case(SKIP_SENTINEL) {
                    session.description = Some(text.to_string());
                }
                session.step = DialogStep::TimeSlots;
                slots_prompt()
            }
            DialogStep::TimeSlots => match parse::parse_time_slots(text) {
                Err(e) => DialogReply::Prompt {
                    text: format!("{e}\n\nStep 3/3: enter candidate times, one per line"),
                    keyboard: Some(cancel_keyboard()),
                },
                Ok(time_slots) => {
                    let request = CreateMeetingRequest {
                        chat_id,
                        organizer_id: user_id,
                        title: session.title.clone().unwrap_or_default(),
                        description: session.description.clone(),
                        participant_ids: vec![user_id],
                        time_slots,
                    };
                    drop(session);
                    self.sessions.remove(&user_id);
                    match self.meetings.create_meeting(request).await {
                        Ok(details) => DialogReply::Completed(details),
                        Err(e) => {
                            warn!(user_id, error = %e, "meeting creation failed, session cleared");
                            DialogReply::Failed {
                                text: "Could not create the meeting. Please try again later."
                                    .to_string(),
                            }
                        }
                    }
                }
            },
        };
        Some(reply)
    }

    /// Remove idle sessions. Returns how many were dropped.
    ///
    /// Entries currently being processed are left alone.
    pub fn sweep_idle(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| match entry.try_lock() {
            Ok(session) => session.last_active.elapsed() <= self.idle_timeout,
            Err(_) => true,
        });
        let removed = before - self.sessions.len();
        if removed > 0 {
            info!(removed, "swept idle dialog sessions");
        }
        removed
    }
}

fn cancel_keyboard() -> Keyboard {
    Keyboard::new().row(vec![Button::new("Cancel", ButtonIntent::Negative, "cancel")])
}

fn slots_prompt() -> DialogReply {
    DialogReply::Prompt {
        text: "Step 3/3: enter candidate times, one per line.\n\
               Format: 2025-11-10 15:00\n\n\
               Example:\n2025-11-10 15:00\n2025-11-11 14:00"
            .to_string(),
        keyboard: Some(cancel_keyboard()),
    }
}
