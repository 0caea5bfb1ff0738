//! Console transport for local development.
//!
//! Prints outbound messages to stdout and turns stdin lines into inbound
//! events, so the whole bot can be exercised without a chat platform.
//!
//! Line protocol:
//! - `as <user_id> <text>` sends a message as that user
//! - `cb <user_id> <payload>` presses a callback button as that user
//! - anything else is a message from user 1
//!
//! Everything happens in chat 1.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use convene_core::transport::{ChatTransport, TransportError};
use convene_types::event::{Keyboard, UpdateEvent};

const CONSOLE_CHAT_ID: i64 = 1;

/// Transport that writes outbound traffic to stdout.
#[derive(Clone, Default)]
pub struct ConsoleTransport;

impl ConsoleTransport {
    pub fn new() -> Self {
        Self
    }

    fn print_keyboard(keyboard: &Keyboard) {
        for row in &keyboard.rows {
            let rendered: Vec<String> = row
                .iter()
                .map(|b| format!("[{}|cb {}]", b.label, b.payload))
                .collect();
            println!("  {}", rendered.join(" "));
        }
    }
}

impl ChatTransport for ConsoleTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        println!("[chat {chat_id}] {text}");
        Ok(())
    }

    async fn send_with_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<(), TransportError> {
        println!("[chat {chat_id}] {text}");
        Self::print_keyboard(keyboard);
        Ok(())
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: &str,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError> {
        println!("[chat {chat_id}] (edit {message_id}) {text}");
        if let Some(kb) = keyboard {
            Self::print_keyboard(kb);
        }
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: &str) -> Result<(), TransportError> {
        if !text.is_empty() {
            println!("(callback {callback_id}) {text}");
        }
        Ok(())
    }
}

/// Translate one console line into an inbound event.
pub fn parse_console_line(line: &str) -> Option<UpdateEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(rest) = line.strip_prefix("as ") {
        let (user, text) = rest.split_once(' ')?;
        let user_id = user.parse().ok()?;
        return Some(message(user_id, text));
    }

    if let Some(rest) = line.strip_prefix("cb ") {
        let (user, payload) = rest.split_once(' ')?;
        let user_id: i64 = user.parse().ok()?;
        return Some(UpdateEvent::CallbackPressed {
            callback_id: format!("console-{user_id}"),
            chat_id: CONSOLE_CHAT_ID,
            user_id,
            sender_name: Some(format!("user{user_id}")),
            message_id: None,
            payload: payload.to_string(),
        });
    }

    Some(message(1, line))
}

fn message(user_id: i64, text: &str) -> UpdateEvent {
    UpdateEvent::MessageCreated {
        chat_id: CONSOLE_CHAT_ID,
        user_id,
        sender_name: Some(format!("user{user_id}")),
        text: text.to_string(),
    }
}

/// Read stdin lines and feed them into the update channel until EOF or
/// shutdown.
pub async fn read_stdin_events(tx: mpsc::Sender<UpdateEvent>, shutdown: CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!("console input closed");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "failed to read console input");
                    break;
                }
            },
        };
        if let Some(event) = parse_console_line(&line) {
            if tx.send(event).await.is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line_is_message_from_user_one() {
        match parse_console_line("/help").unwrap() {
            UpdateEvent::MessageCreated { user_id, text, .. } => {
                assert_eq!(user_id, 1);
                assert_eq!(text, "/help");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_as_prefix_sets_user() {
        match parse_console_line("as 42 hello there").unwrap() {
            UpdateEvent::MessageCreated { user_id, text, .. } => {
                assert_eq!(user_id, 42);
                assert_eq!(text, "hello there");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_cb_prefix_is_callback() {
        match parse_console_line("cb 7 vote:3:9").unwrap() {
            UpdateEvent::CallbackPressed { user_id, payload, .. } => {
                assert_eq!(user_id, 7);
                assert_eq!(payload, "vote:3:9");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_blank_and_malformed_lines_are_dropped() {
        assert!(parse_console_line("   ").is_none());
        assert!(parse_console_line("as notanumber hi").is_none());
        assert!(parse_console_line("cb 7").is_none());
    }
}
