//! Shared domain types for Convene.
//!
//! This crate contains the core domain types used across the Convene meeting
//! bot: Meeting, TimeSlot, Vote, User, the chat transport event types, and
//! their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod error;
pub mod event;
pub mod meeting;
pub mod user;
