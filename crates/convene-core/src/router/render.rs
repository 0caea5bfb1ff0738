//! Outbound text and keyboard construction for meeting views.

use std::collections::BTreeMap;

use convene_types::event::{Button, ButtonIntent, Keyboard};
use convene_types::meeting::{Meeting, MeetingStatus, VoteCount};

use crate::meeting::MeetingDetails;

/// Summary text for a meeting, with current per-slot tallies.
pub fn meeting_text(details: &MeetingDetails, results: &BTreeMap<i64, VoteCount>) -> String {
    let meeting = &details.meeting;
    let mut text = format!("{}\n", meeting.title);
    if let Some(desc) = &meeting.description {
        text.push_str(desc);
        text.push('\n');
    }
    text.push('\n');
    text.push_str(match meeting.status {
        MeetingStatus::Open => "Voting is open.\n",
        MeetingStatus::Confirmed => "Meeting confirmed.\n",
        _ => "Voting is closed.\n",
    });
    if let Some(t) = meeting.final_time {
        text.push_str(&format!("Final time: {}\n", t.format("%Y-%m-%d %H:%M")));
    }
    text.push('\n');
    for slot in &details.time_slots {
        let count = results.get(&slot.id).copied().unwrap_or_default();
        text.push_str(&format!(
            "{}: {} for, {} against\n",
            slot.start_time.format("%Y-%m-%d %H:%M"),
            count.approved,
            count.rejected
        ));
    }
    text
}

/// Keyboard for a meeting message: vote/unvote per slot while open, plus
/// results and (for the organizer view) close-voting controls.
pub fn meeting_keyboard(details: &MeetingDetails) -> Keyboard {
    let meeting = &details.meeting;
    let mut kb = Keyboard::new();

    if meeting.status == MeetingStatus::Open {
        for slot in &details.time_slots {
            kb = kb.row(vec![
                Button::new(
                    format!("For {}", slot.start_time.format("%d.%m %H:%M")),
                    ButtonIntent::Positive,
                    format!("vote:{}:{}", meeting.id, slot.id),
                ),
                Button::new(
                    "Retract",
                    ButtonIntent::Default,
                    format!("unvote:{}:{}", meeting.id, slot.id),
                ),
            ]);
        }
        kb = kb
            .row(vec![Button::new(
                "Show results",
                ButtonIntent::Default,
                format!("show_results:{}", meeting.id),
            )])
            .row(vec![Button::new(
                "Close voting",
                ButtonIntent::Negative,
                format!("close_voting:{}", meeting.id),
            )]);
    } else {
        kb = kb.row(vec![Button::new(
            "Show results",
            ButtonIntent::Default,
            format!("show_results:{}", meeting.id),
        )]);
    }
    kb
}

/// Standalone results view, including the current leader.
pub fn results_text(details: &MeetingDetails, results: &BTreeMap<i64, VoteCount>) -> String {
    let mut text = format!("Voting results for '{}':\n\n", details.meeting.title);
    if results.is_empty() {
        text.push_str("No votes yet.");
        return text;
    }

    // Same law as the tally engine: highest approved, lowest slot id on ties.
    let mut leader: Option<(i64, u32)> = None;
    for slot in &details.time_slots {
        let count = results.get(&slot.id).copied().unwrap_or_default();
        text.push_str(&format!(
            "{}: {} for, {} against\n",
            slot.start_time.format("%Y-%m-%d %H:%M"),
            count.approved,
            count.rejected
        ));
        if count.approved > leader.map_or(0, |(_, a)| a) {
            leader = Some((slot.id, count.approved));
        }
    }

    if let Some((slot_id, approved)) = leader {
        if let Some(slot) = details.time_slots.iter().find(|s| s.id == slot_id) {
            text.push_str(&format!(
                "\nLeading: {} ({} for)",
                slot.start_time.format("%Y-%m-%d %H:%M"),
                approved
            ));
        }
    }
    text
}

/// "My meetings" listing.
pub fn meetings_list_text(meetings: &[Meeting]) -> String {
    let mut text = "Your meetings:\n\n".to_string();
    for (i, meeting) in meetings.iter().enumerate() {
        text.push_str(&format!(
            "{}. {} (id {}, {})\n",
            i + 1,
            meeting.title,
            meeting.id,
            meeting.status
        ));
    }
    text
}

pub fn help_text() -> &'static str {
    "Commands:\n\n\
     /create_meeting — create a new meeting\n\
     /my_meetings — list your meetings\n\
     /cancel — abort the current action\n\n\
     Creating a meeting takes three steps: a title, an optional description,\n\
     and candidate times for voting."
}

pub fn start_text() -> &'static str {
    "Hi! I help schedule meetings: create a proposal, let participants vote\n\
     on candidate times, and confirm the winner.\n\nUse /help for commands."
}

/// Main menu keyboard shown with start/help/cancel replies.
pub fn main_keyboard() -> Keyboard {
    Keyboard::new()
        .row(vec![
            Button::new("Create meeting", ButtonIntent::Positive, "create_meeting"),
            Button::new("My meetings", ButtonIntent::Positive, "my_meetings"),
        ])
        .row(vec![Button::new("Help", ButtonIntent::Default, "help")])
}
