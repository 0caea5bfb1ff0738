//! Chat transport seam.
//!
//! The core only needs four outbound operations from the chat platform client:
//! send text, send text with an inline keyboard, edit a previously sent
//! message, and acknowledge a callback. Everything transport-specific
//! (encoding, retries, credentials) stays behind this trait.

use convene_types::event::Keyboard;
use thiserror::Error;

/// Failure reported by the transport client.
///
/// The core treats these as boundary failures: logged, never escalated into
/// domain state.
#[derive(Debug, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// Outbound operations against the chat platform.
pub trait ChatTransport: Send + Sync {
    /// Send a plain text message to a conversation.
    fn send_text(
        &self,
        chat_id: i64,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;

    /// Send a text message with an inline keyboard attached.
    fn send_with_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: &Keyboard,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;

    /// Replace the text (and keyboard) of a previously sent message.
    fn edit_message(
        &self,
        chat_id: i64,
        message_id: &str,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;

    /// Acknowledge a pressed callback button with a short notice.
    fn answer_callback(
        &self,
        callback_id: &str,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;
}
