//! Meeting, time slot, vote, and participant types for Convene.
//!
//! These types model a proposed gathering: the meeting record itself, its
//! candidate time slots, the votes cast against those slots, and the users
//! invited to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a meeting.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (status IN ('pending', 'open', 'confirmed', 'closed', 'cancelled'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    /// Inserted but sub-entities (slots, participants) not yet stored.
    Pending,
    /// Voting is active.
    Open,
    /// Voting resolved to a final time.
    Confirmed,
    /// Voting closed without a winner.
    Closed,
    /// Explicitly cancelled by the organizer.
    Cancelled,
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeetingStatus::Pending => write!(f, "pending"),
            MeetingStatus::Open => write!(f, "open"),
            MeetingStatus::Confirmed => write!(f, "confirmed"),
            MeetingStatus::Closed => write!(f, "closed"),
            MeetingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for MeetingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(MeetingStatus::Pending),
            "open" => Ok(MeetingStatus::Open),
            "confirmed" => Ok(MeetingStatus::Confirmed),
            "closed" => Ok(MeetingStatus::Closed),
            "cancelled" => Ok(MeetingStatus::Cancelled),
            other => Err(format!("invalid meeting status: '{other}'")),
        }
    }
}

impl Default for MeetingStatus {
    fn default() -> Self {
        MeetingStatus::Pending
    }
}

/// A proposed gathering awaiting votes on its candidate time slots.
///
/// The id is assigned by the repository on create: store-unique and strictly
/// increasing within a store instance. Timestamps are stamped by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: i64,
    pub chat_id: i64,
    pub organizer_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: MeetingStatus,
    /// Resolved winning time, set when the meeting is confirmed.
    pub final_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One candidate date/time range attached to a meeting.
///
/// Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: i64,
    pub meeting_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Approval or rejection of a time slot.
///
/// Maps to the `vote_type` column: `CHECK (vote_type IN ('approve', 'reject'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Approve,
    Reject,
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteChoice::Approve => write!(f, "approve"),
            VoteChoice::Reject => write!(f, "reject"),
        }
    }
}

impl FromStr for VoteChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "approve" => Ok(VoteChoice::Approve),
            "reject" => Ok(VoteChoice::Reject),
            other => Err(format!("invalid vote choice: '{other}'")),
        }
    }
}

/// A user's current vote on a specific time slot.
///
/// At most one vote exists per (user, slot): a new vote replaces the previous
/// one, and unvoting deletes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub meeting_id: i64,
    pub user_id: i64,
    pub time_slot_id: i64,
    pub choice: VoteChoice,
    pub voted_at: DateTime<Utc>,
}

/// A user invited to (or aware of) a meeting, independent of whether they voted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingParticipant {
    pub meeting_id: i64,
    pub user_id: i64,
    pub joined_at: DateTime<Utc>,
}

/// Aggregated approve/reject counts for a single time slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCount {
    pub approved: u32,
    pub rejected: u32,
}
