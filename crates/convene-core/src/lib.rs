//! Business logic for the Convene meeting bot.
//!
//! This crate defines the repository traits, the chat transport seam, and the
//! domain services: meeting creation, vote tallying, the multi-step creation
//! dialog, the reminder scheduler, the callback/command router, and the
//! supervised update-dispatch loop.
//!
//! Infrastructure implementations (in-memory and SQLite repositories, the
//! console transport) live in `convene-infra` and `convene-api`.

pub mod dialog;
pub mod dispatch;
pub mod meeting;
pub mod reminder;
pub mod repository;
pub mod router;
pub mod transport;
pub mod voting;

#[cfg(test)]
pub(crate) mod testutil;
