//! Reminder scheduling and outbound notifications.
//!
//! Each confirmed meeting gets at most one deferred reminder, fired a fixed
//! interval before the meeting time. Every scheduled reminder owns a
//! `CancellationToken`; cancelling a reminder cancels the sleeping task
//! itself, not just the bookkeeping entry, so no timer leaks past
//! `cancel_reminder` or `shutdown`.
//!
//! Reminders are in-process only: a restart drops pending timers.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use convene_types::meeting::Meeting;

use crate::meeting::MeetingDetails;
use crate::transport::ChatTransport;

/// Fixed interval between the reminder and the meeting start.
pub const REMINDER_OFFSET_MINUTES: i64 = 15;

/// Result of a scheduling request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// A reminder will fire at the given time.
    Scheduled { fire_at: DateTime<Utc> },
    /// The reminder time already passed; nothing was scheduled.
    ///
    /// A warning condition, not an error: near-term meetings simply get no
    /// reminder.
    AlreadyPast,
}

/// Schedules deferred reminders and sends boundary notifications.
pub struct ReminderScheduler<T: ChatTransport + 'static> {
    transport: Arc<T>,
    tokens: Arc<DashMap<i64, CancellationToken>>,
}

impl<T: ChatTransport + 'static> ReminderScheduler<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            tokens: Arc::new(DashMap::new()),
        }
    }

    /// Arrange a single reminder for a meeting, replacing any previous one.
    pub fn schedule_reminder(
        &self,
        meeting_id: i64,
        chat_id: i64,
        meeting_time: DateTime<Utc>,
    ) -> ScheduleOutcome {
        let fire_at = meeting_time - Duration::minutes(REMINDER_OFFSET_MINUTES);
        let delay = fire_at - Utc::now();
        let Ok(delay) = delay.to_std() else {
            warn!(meeting_id, %meeting_time, "reminder time already passed, not scheduling");
            return ScheduleOutcome::AlreadyPast;
        };

        let token = CancellationToken::new();
        if let Some(previous) = self.tokens.insert(meeting_id, token.clone()) {
            previous.cancel();
        }

        let transport = Arc::clone(&self.transport);
        let tokens = Arc::clone(&self.tokens);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(meeting_id, "reminder cancelled before firing");
                }
                _ = tokio::time::sleep(delay) => {
                    tokens.remove(&meeting_id);
                    let text = format!(
                        "Reminder: your meeting starts at {}.",
                        meeting_time.format("%Y-%m-%d %H:%M")
                    );
                    if let Err(e) = transport.send_text(chat_id, &text).await {
                        warn!(meeting_id, error = %e, "failed to send reminder");
                    }
                }
            }
        });

        info!(meeting_id, %fire_at, "reminder scheduled");
        ScheduleOutcome::Scheduled { fire_at }
    }

    /// Cancel a pending reminder, stopping its sleeping task.
    ///
    /// Returns whether a reminder was pending.
    pub fn cancel_reminder(&self, meeting_id: i64) -> bool {
        match self.tokens.remove(&meeting_id) {
            Some((_, token)) => {
                token.cancel();
                info!(meeting_id, "reminder cancelled");
                true
            }
            None => false,
        }
    }

    /// Number of reminders currently pending.
    pub fn pending(&self) -> usize {
        self.tokens.len()
    }

    /// Cancel all pending reminders (process shutdown).
    pub fn shutdown(&self) {
        for entry in self.tokens.iter() {
            entry.value().cancel();
        }
        self.tokens.clear();
    }

    /// Send a reminder immediately. Failures are logged, never escalated.
    pub async fn send_reminder(&self, meeting_id: i64, chat_id: i64, text: &str) {
        if let Err(e) = self.transport.send_text(chat_id, text).await {
            warn!(meeting_id, error = %e, "failed to send reminder");
        }
    }

    /// Announce a freshly created meeting to its chat.
    pub async fn notify_meeting_created(&self, details: &MeetingDetails) {
        let mut text = format!("Meeting created: {}", details.meeting.title);
        if let Some(desc) = &details.meeting.description {
            text.push_str(&format!("\n{desc}"));
        }
        text.push_str("\n\nParticipants can now vote for a convenient time.");
        if let Err(e) = self.transport.send_text(details.meeting.chat_id, &text).await {
            warn!(meeting_id = details.meeting.id, error = %e, "failed to announce meeting");
        }
    }

    /// Announce the voting outcome to the meeting's chat.
    pub async fn notify_voting_results(
        &self,
        meeting: &Meeting,
        final_time: Option<DateTime<Utc>>,
    ) {
        let text = match final_time {
            Some(t) => format!(
                "Voting closed for '{}'. Confirmed time: {}.",
                meeting.title,
                t.format("%Y-%m-%d %H:%M")
            ),
            None => format!(
                "Voting closed for '{}' with no approved votes.",
                meeting.title
            ),
        };
        if let Err(e) = self.transport.send_text(meeting.chat_id, &text).await {
            warn!(meeting_id = meeting.id, error = %e, "failed to announce voting results");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{Outbound, RecordingTransport};
    use std::time::Duration as StdDuration;

    fn scheduler() -> (ReminderScheduler<RecordingTransport>, RecordingTransport) {
        let transport = RecordingTransport::default();
        (ReminderScheduler::new(Arc::new(transport.clone())), transport)
    }

    #[tokio::test(start_paused = true)]
    async fn test_near_term_meeting_is_reported_already_past() {
        let (sched, transport) = scheduler();
        // 10 minutes out with a 15 minute offset: the reminder time has passed.
        let outcome = sched.schedule_reminder(1, 100, Utc::now() + Duration::minutes(10));
        assert_eq!(outcome, ScheduleOutcome::AlreadyPast);
        assert_eq!(sched.pending(), 0);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reminder_fires_at_offset() {
        let (sched, transport) = scheduler();
        let outcome = sched.schedule_reminder(1, 100, Utc::now() + Duration::hours(1));
        assert!(matches!(outcome, ScheduleOutcome::Scheduled { .. }));
        assert_eq!(sched.pending(), 1);

        // Paused clock auto-advances past the 45 minute sleep.
        tokio::time::sleep(StdDuration::from_secs(50 * 60)).await;

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            Outbound::Text { chat_id, text } => {
                assert_eq!(*chat_id, 100);
                assert!(text.starts_with("Reminder:"));
            }
            other => panic!("unexpected call: {other:?}"),
        }
        assert_eq!(sched.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_the_sleeping_task() {
        let (sched, transport) = scheduler();
        sched.schedule_reminder(1, 100, Utc::now() + Duration::hours(1));
        assert!(sched.cancel_reminder(1));
        assert_eq!(sched.pending(), 0);

        tokio::time::sleep(StdDuration::from_secs(2 * 60 * 60)).await;
        assert!(transport.calls().is_empty());

        // Cancelling again reports nothing pending.
        assert!(!sched.cancel_reminder(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescheduling_replaces_previous_reminder() {
        let (sched, transport) = scheduler();
        sched.schedule_reminder(1, 100, Utc::now() + Duration::hours(1));
        sched.schedule_reminder(1, 100, Utc::now() + Duration::hours(2));
        assert_eq!(sched.pending(), 1);

        tokio::time::sleep(StdDuration::from_secs(3 * 60 * 60)).await;
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_everything() {
        let (sched, transport) = scheduler();
        sched.schedule_reminder(1, 100, Utc::now() + Duration::hours(1));
        sched.schedule_reminder(2, 100, Utc::now() + Duration::hours(1));
        sched.shutdown();
        assert_eq!(sched.pending(), 0);

        tokio::time::sleep(StdDuration::from_secs(2 * 60 * 60)).await;
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_notifications_swallow_transport_failures() {
        let (sched, transport) = scheduler();
        *transport.fail_with.lock().unwrap() = Some("wire down".to_string());

        let meeting = Meeting {
            id: 1,
            chat_id: 100,
            organizer_id: 7,
            title: "Sync".to_string(),
            description: None,
            status: convene_types::meeting::MeetingStatus::Closed,
            final_time: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        // Must not panic or propagate.
        sched.notify_voting_results(&meeting, None).await;
        sched.send_reminder(1, 100, "Reminder").await;
    }
}
