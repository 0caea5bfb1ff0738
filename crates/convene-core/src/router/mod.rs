//! Inbound update routing.
//!
//! Translates transport events into service calls: text messages go to the
//! dialog manager first (an active session takes precedence over fresh
//! commands), then to slash-command handling; interactive callbacks are
//! parsed into typed actions and dispatched. Every failure is translated
//! into a short user-facing reply; internal error detail stays in the logs.

pub mod action;
pub mod render;

use std::sync::Arc;

use tracing::{debug, info, warn};

use convene_types::error::MeetingError;
use convene_types::event::UpdateEvent;
use convene_types::meeting::{MeetingStatus, VoteChoice};

use crate::dialog::{DialogManager, DialogReply};
use crate::meeting::MeetingService;
use crate::reminder::ReminderScheduler;
use crate::repository::{MeetingRepository, UserRepository, VoteRepository};
use crate::router::action::CallbackAction;
use crate::transport::{ChatTransport, TransportError};
use crate::voting::{ClosedVoting, VoteService};

/// Routes inbound updates to the dialog manager and domain services.
pub struct UpdateRouter<M, U, V, T>
where
    M: MeetingRepository,
    U: UserRepository,
    V: VoteRepository,
    T: ChatTransport + 'static,
{
    meetings: Arc<MeetingService<M, U>>,
    voting: Arc<VoteService<V, M>>,
    dialogs: Arc<DialogManager<M, U>>,
    reminders: Arc<ReminderScheduler<T>>,
    transport: Arc<T>,
}

impl<M, U, V, T> UpdateRouter<M, U, V, T>
where
    M: MeetingRepository,
    U: UserRepository,
    V: VoteRepository,
    T: ChatTransport + 'static,
{
    pub fn new(
        meetings: Arc<MeetingService<M, U>>,
        voting: Arc<VoteService<V, M>>,
        dialogs: Arc<DialogManager<M, U>>,
        reminders: Arc<ReminderScheduler<T>>,
        transport: Arc<T>,
    ) -> Self {
        Self {
            meetings,
            voting,
            dialogs,
            reminders,
            transport,
        }
    }

    /// Handle one inbound event end to end.
    pub async fn handle_update(&self, event: UpdateEvent) -> Result<(), TransportError> {
        match event {
            UpdateEvent::MessageCreated {
                chat_id,
                user_id,
                sender_name,
                text,
            } => {
                self.register_user(user_id, sender_name.as_deref()).await;
                self.handle_message(chat_id, user_id, &text).await
            }
            UpdateEvent::CallbackPressed {
                callback_id,
                chat_id,
                user_id,
                sender_name,
                message_id,
                payload,
            } => {
                self.register_user(user_id, sender_name.as_deref()).await;
                self.handle_callback(&callback_id, chat_id, user_id, message_id.as_deref(), &payload)
                    .await
            }
            UpdateEvent::BotAdded { chat_id } => {
                info!(chat_id, "bot added to chat");
                self.transport
                    .send_with_keyboard(chat_id, render::start_text(), &render::main_keyboard())
                    .await
            }
            UpdateEvent::BotRemoved { chat_id } => {
                info!(chat_id, "bot removed from chat");
                Ok(())
            }
        }
    }

    /// Create the user record on first contact. Best-effort.
    async fn register_user(&self, user_id: i64, sender_name: Option<&str>) {
        let name = sender_name.unwrap_or("unknown");
        if let Err(e) = self.meetings.ensure_user(user_id, name).await {
            warn!(user_id, error = %e, "failed to register user");
        }
    }

    async fn handle_message(
        &self,
        chat_id: i64,
        user_id: i64,
        text: &str,
    ) -> Result<(), TransportError> {
        debug!(chat_id, user_id, "received message");

        // Dialog state takes precedence over fresh commands.
        if let Some(reply) = self.dialogs.handle_message(chat_id, user_id, text).await {
            return self.render_dialog_reply(chat_id, reply).await;
        }

        match text.trim() {
            "/start" => {
                self.transport
                    .send_with_keyboard(chat_id, render::start_text(), &render::main_keyboard())
                    .await
            }
            "/help" => {
                self.transport
                    .send_with_keyboard(chat_id, render::help_text(), &render::main_keyboard())
                    .await
            }
            "/create_meeting" => {
                let reply = self.dialogs.begin(user_id);
                self.render_dialog_reply(chat_id, reply).await
            }
            "/my_meetings" => self.send_my_meetings(chat_id, user_id).await,
            "/cancel" => {
                let text = if self.dialogs.cancel(user_id) {
                    "Action cancelled."
                } else {
                    "Nothing to cancel."
                };
                self.transport.send_text(chat_id, text).await
            }
            cmd if cmd.starts_with('/') => {
                self.transport
                    .send_text(chat_id, &format!("Unknown command: {cmd}\nUse /help."))
                    .await
            }
            _ => {
                self.transport
                    .send_text(chat_id, "I didn't understand that. Use /help for commands.")
                    .await
            }
        }
    }

    async fn handle_callback(
        &self,
        callback_id: &str,
        chat_id: i64,
        user_id: i64,
        message_id: Option<&str>,
        payload: &str,
    ) -> Result<(), TransportError> {
        debug!(user_id, payload, "received callback");

        let action = match payload.parse::<CallbackAction>() {
            Ok(action) => action,
            Err(e) => {
                warn!(user_id, payload, error = %e, "malformed callback payload");
                return self
                    .transport
                    .answer_callback(callback_id, "Invalid callback format.")
                    .await;
            }
        };

        let answer = match action {
            CallbackAction::Vote { meeting_id, slot_id } => {
                self.cast_vote(chat_id, user_id, message_id, meeting_id, slot_id)
                    .await
            }
            CallbackAction::Unvote { meeting_id, slot_id } => {
                match self.voting.unvote(meeting_id, user_id, slot_id).await {
                    Ok(()) => {
                        self.refresh_meeting_message(chat_id, message_id, meeting_id).await;
                        "Vote removed.".to_string()
                    }
                    Err(e) => {
                        warn!(meeting_id, user_id, error = %e, "unvote failed");
                        "Could not remove your vote.".to_string()
                    }
                }
            }
            CallbackAction::ShowResults { meeting_id } => {
                match self.send_results(chat_id, meeting_id).await {
                    Ok(()) => "Results sent.".to_string(),
                    Err(MeetingError::NotFound) => "Meeting not found.".to_string(),
                    Err(e) => {
                        warn!(meeting_id, error = %e, "failed to fetch results");
                        "Could not fetch the results.".to_string()
                    }
                }
            }
            CallbackAction::CloseVoting { meeting_id } => {
                self.close_voting(chat_id, user_id, message_id, meeting_id).await
            }
            CallbackAction::CreateMeeting => {
                let reply = self.dialogs.begin(user_id);
                if let Err(e) = self.render_dialog_reply(chat_id, reply).await {
                    warn!(user_id, error = %e, "failed to send dialog prompt");
                }
                "Starting meeting creation.".to_string()
            }
            CallbackAction::MyMeetings => {
                if let Err(e) = self.send_my_meetings(chat_id, user_id).await {
                    warn!(user_id, error = %e, "failed to send meeting list");
                }
                String::new()
            }
            CallbackAction::Help => {
                if let Err(e) = self
                    .transport
                    .send_with_keyboard(chat_id, render::help_text(), &render::main_keyboard())
                    .await
                {
                    warn!(user_id, error = %e, "failed to send help");
                }
                String::new()
            }
            CallbackAction::Cancel => {
                let text = if self.dialogs.cancel(user_id) {
                    "Action cancelled."
                } else {
                    "Nothing to cancel."
                };
                if let Err(e) = self.transport.send_text(chat_id, text).await {
                    warn!(user_id, error = %e, "failed to confirm cancel");
                }
                text.to_string()
            }
            CallbackAction::SkipDescription => {
                let reply = self.dialogs.skip_description(user_id).await;
                if let Err(e) = self.render_dialog_reply(chat_id, reply).await {
                    warn!(user_id, error = %e, "failed to send dialog prompt");
                }
                "Description skipped.".to_string()
            }
        };

        self.transport.answer_callback(callback_id, &answer).await
    }

    /// Record an approval vote. Voting must be open; the tally engine itself
    /// does not enforce status.
    async fn cast_vote(
        &self,
        chat_id: i64,
        user_id: i64,
        message_id: Option<&str>,
        meeting_id: i64,
        slot_id: i64,
    ) -> String {
        let meeting = match self.meetings.get_meeting(meeting_id).await {
            Ok(m) => m,
            Err(MeetingError::NotFound) => return "Meeting not found.".to_string(),
            Err(e) => {
                warn!(meeting_id, error = %e, "failed to load meeting for vote");
                return "Could not register your vote.".to_string();
            }
        };
        if meeting.status != MeetingStatus::Open {
            return "Voting is closed for this meeting.".to_string();
        }

        match self
            .voting
            .vote(meeting_id, user_id, slot_id, VoteChoice::Approve)
            .await
        {
            Ok(_) => {
                self.refresh_meeting_message(chat_id, message_id, meeting_id).await;
                "Vote recorded.".to_string()
            }
            Err(e) => {
                warn!(meeting_id, user_id, slot_id, error = %e, "vote failed");
                "Could not register your vote.".to_string()
            }
        }
    }

    async fn close_voting(
        &self,
        chat_id: i64,
        user_id: i64,
        message_id: Option<&str>,
        meeting_id: i64,
    ) -> String {
        match self.voting.close_voting(meeting_id, user_id).await {
            Ok(ClosedVoting::Confirmed { meeting, slot }) => {
                self.reminders
                    .schedule_reminder(meeting.id, meeting.chat_id, slot.start_time);
                self.reminders
                    .notify_voting_results(&meeting, Some(slot.start_time))
                    .await;
                self.refresh_meeting_message(chat_id, message_id, meeting_id).await;
                "Voting closed, meeting confirmed.".to_string()
            }
            Ok(ClosedVoting::NoWinner { meeting }) => {
                self.reminders.notify_voting_results(&meeting, None).await;
                self.refresh_meeting_message(chat_id, message_id, meeting_id).await;
                "Voting closed. No time had approvals.".to_string()
            }
            Err(MeetingError::NotOrganizer) => {
                "Only the organizer can close voting.".to_string()
            }
            Err(MeetingError::NotFound) => "Meeting not found.".to_string(),
            Err(e) => {
                warn!(meeting_id, error = %e, "failed to close voting");
                "Could not close the voting.".to_string()
            }
        }
    }

    async fn send_results(&self, chat_id: i64, meeting_id: i64) -> Result<(), MeetingError> {
        let details = self.meetings.meeting_details(meeting_id).await?;
        let results = self.voting.vote_results(meeting_id).await?;
        let text = render::results_text(&details, &results);
        if let Err(e) = self.transport.send_text(chat_id, &text).await {
            warn!(meeting_id, error = %e, "failed to send results");
        }
        Ok(())
    }

    async fn send_my_meetings(&self, chat_id: i64, user_id: i64) -> Result<(), TransportError> {
        match self.meetings.user_meetings(user_id).await {
            Ok(meetings) if meetings.is_empty() => {
                self.transport
                    .send_with_keyboard(
                        chat_id,
                        "You have no meetings yet. Create the first one!",
                        &render::main_keyboard(),
                    )
                    .await
            }
            Ok(meetings) => {
                self.transport
                    .send_text(chat_id, &render::meetings_list_text(&meetings))
                    .await
            }
            Err(e) => {
                warn!(user_id, error = %e, "failed to list meetings");
                self.transport
                    .send_text(chat_id, "Could not fetch your meetings.")
                    .await
            }
        }
    }

    /// Re-render the meeting summary after a mutation.
    ///
    /// Best-effort: the vote/close already happened, a failed refresh is
    /// logged and never rolls it back.
    async fn refresh_meeting_message(
        &self,
        chat_id: i64,
        message_id: Option<&str>,
        meeting_id: i64,
    ) {
        let Some(message_id) = message_id else {
            return;
        };
        let (details, results) = match (
            self.meetings.meeting_details(meeting_id).await,
            self.voting.vote_results(meeting_id).await,
        ) {
            (Ok(d), Ok(r)) => (d, r),
            (Err(e), _) | (_, Err(e)) => {
                warn!(meeting_id, error = %e, "failed to load meeting for refresh");
                return;
            }
        };
        let text = render::meeting_text(&details, &results);
        let keyboard = render::meeting_keyboard(&details);
        if let Err(e) = self
            .transport
            .edit_message(chat_id, message_id, &text, Some(&keyboard))
            .await
        {
            warn!(meeting_id, error = %e, "failed to refresh meeting message");
        }
    }

    async fn render_dialog_reply(
        &self,
        chat_id: i64,
        reply: DialogReply,
    ) -> Result<(), TransportError> {
        match reply {
            DialogReply::Prompt { text, keyboard } => match keyboard {
                Some(kb) => self.transport.send_with_keyboard(chat_id, &text, &kb).await,
                None => self.transport.send_text(chat_id, &text).await,
            },
            DialogReply::Completed(details) => {
                self.reminders.notify_meeting_created(&details).await;
                let results = self
                    .voting
                    .vote_results(details.meeting.id)
                    .await
                    .unwrap_or_default();
                let text = render::meeting_text(&details, &results);
                let keyboard = render::meeting_keyboard(&details);
                self.transport
                    .send_with_keyboard(chat_id, &text, &keyboard)
                    .await
            }
            DialogReply::Cancelled => {
                self.transport
                    .send_with_keyboard(chat_id, "Action cancelled.", &render::main_keyboard())
                    .await
            }
            DialogReply::Failed { text } => self.transport.send_text(chat_id, &text).await,
        }
    }
}
