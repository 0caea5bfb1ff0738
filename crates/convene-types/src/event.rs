//! Chat transport boundary types.
//!
//! The bot consumes a stream of [`UpdateEvent`]s from the chat platform and
//! replies with plain text or text plus an inline [`Keyboard`]. These types
//! are transport-agnostic: the platform client translates its wire encoding
//! into them at the edge.

use serde::{Deserialize, Serialize};

/// An inbound event from the chat platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UpdateEvent {
    /// A user sent a text message.
    MessageCreated {
        chat_id: i64,
        user_id: i64,
        /// Sender display name, when the platform provides it.
        sender_name: Option<String>,
        text: String,
    },
    /// A user pressed an inline keyboard button.
    CallbackPressed {
        callback_id: String,
        chat_id: i64,
        user_id: i64,
        sender_name: Option<String>,
        /// Id of the message carrying the keyboard, when the platform provides it.
        message_id: Option<String>,
        payload: String,
    },
    /// The bot was added to a conversation.
    BotAdded { chat_id: i64 },
    /// The bot was removed from a conversation.
    BotRemoved { chat_id: i64 },
}

/// Visual intent of a keyboard button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonIntent {
    Default,
    Positive,
    Negative,
}

/// A single callback button on an inline keyboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub intent: ButtonIntent,
    /// Colon-delimited action payload, e.g. `vote:3:7`.
    pub payload: String,
}

impl Button {
    pub fn new(label: impl Into<String>, intent: ButtonIntent, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            intent,
            payload: payload.into(),
        }
    }
}

/// An inline keyboard: rows of callback buttons attached to a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row of buttons, builder-style.
    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        self.rows.push(buttons);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
