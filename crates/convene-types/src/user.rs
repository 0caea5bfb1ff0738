//! User record for Convene.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user known to the bot.
///
/// Created on first interaction and immutable thereafter. `platform_id` is the
/// sender id assigned by the chat platform; `id` is assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub platform_id: i64,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}
