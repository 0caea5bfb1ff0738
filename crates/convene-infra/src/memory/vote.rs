//! In-memory vote repository.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use convene_core::repository::{NewVote, VoteRepository};
use convene_types::error::RepositoryError;
use convene_types::meeting::Vote;

/// Map-backed vote store keyed by (user_id, time_slot_id), which makes the
/// one-vote-per-user-per-slot rule structural. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryVoteRepository {
    votes: Arc<RwLock<HashMap<(i64, i64), Vote>>>,
}

impl InMemoryVoteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VoteRepository for InMemoryVoteRepository {
    async fn upsert(&self, vote: NewVote) -> Result<Vote, RepositoryError> {
        let mut votes = self.votes.write().await;
        let stored = Vote {
            meeting_id: vote.meeting_id,
            user_id: vote.user_id,
            time_slot_id: vote.time_slot_id,
            choice: vote.choice,
            voted_at: Utc::now(),
        };
        votes.insert((vote.user_id, vote.time_slot_id), stored.clone());
        Ok(stored)
    }

    async fn remove(
        &self,
        _meeting_id: i64,
        user_id: i64,
        time_slot_id: i64,
    ) -> Result<bool, RepositoryError> {
        let mut votes = self.votes.write().await;
        Ok(votes.remove(&(user_id, time_slot_id)).is_some())
    }

    async fn get_by_meeting(&self, meeting_id: i64) -> Result<Vec<Vote>, RepositoryError> {
        let votes = self.votes.read().await;
        Ok(votes
            .values()
            .filter(|v| v.meeting_id == meeting_id)
            .cloned()
            .collect())
    }

    async fn get_by_time_slot(&self, time_slot_id: i64) -> Result<Vec<Vote>, RepositoryError> {
        let votes = self.votes.read().await;
        Ok(votes
            .values()
            .filter(|v| v.time_slot_id == time_slot_id)
            .cloned()
            .collect())
    }
}
