//! Vote tally engine.
//!
//! Aggregates per-slot approve/reject counts for a meeting and resolves a
//! deterministic winning slot. Aggregation goes through a `BTreeMap` so
//! results iterate in slot-id order; combined with a strictly-greater
//! comparison this makes the tie-break "lowest slot id wins" by construction.

use std::collections::BTreeMap;

use convene_types::error::MeetingError;
use convene_types::meeting::{Meeting, MeetingStatus, TimeSlot, Vote, VoteChoice, VoteCount};
use tracing::{debug, info};

use crate::meeting::map_not_found;
use crate::repository::{MeetingRepository, NewVote, VoteRepository};

/// Outcome of closing a meeting's voting.
#[derive(Debug, Clone)]
pub enum ClosedVoting {
    /// A winning slot was resolved; the meeting is confirmed for its start time.
    Confirmed { meeting: Meeting, slot: TimeSlot },
    /// No slot had an approved vote; the meeting is closed without a time.
    NoWinner { meeting: Meeting },
}

/// Tally engine over the vote and meeting repositories.
///
/// Does not enforce meeting-open status on `vote`; callers check
/// `Meeting::status == Open` before recording.
pub struct VoteService<V: VoteRepository, M: MeetingRepository> {
    vote_repo: V,
    meeting_repo: M,
}

impl<V: VoteRepository, M: MeetingRepository> VoteService<V, M> {
    pub fn new(vote_repo: V, meeting_repo: M) -> Self {
        Self {
            vote_repo,
            meeting_repo,
        }
    }

    /// Record a vote. Replaces the user's previous vote on the same slot.
    pub async fn vote(
        &self,
        meeting_id: i64,
        user_id: i64,
        time_slot_id: i64,
        choice: VoteChoice,
    ) -> Result<Vote, MeetingError> {
        let vote = self
            .vote_repo
            .upsert(NewVote {
                meeting_id,
                user_id,
                time_slot_id,
                choice,
            })
            .await?;
        debug!(meeting_id, user_id, time_slot_id, %choice, "vote recorded");
        Ok(vote)
    }

    /// Remove the user's current vote on a slot.
    ///
    /// Idempotent: removing an absent vote succeeds quietly. Double-taps on
    /// the unvote button are common, so an error there helps nobody.
    pub async fn unvote(
        &self,
        meeting_id: i64,
        user_id: i64,
        time_slot_id: i64,
    ) -> Result<(), MeetingError> {
        let removed = self
            .vote_repo
            .remove(meeting_id, user_id, time_slot_id)
            .await?;
        if !removed {
            debug!(meeting_id, user_id, time_slot_id, "unvote with no current vote");
        }
        Ok(())
    }

    /// Aggregate approve/reject counts per slot for a meeting.
    ///
    /// Full scan over the meeting's vote records, O(votes). Slots with no
    /// votes do not appear in the map.
    pub async fn vote_results(
        &self,
        meeting_id: i64,
    ) -> Result<BTreeMap<i64, VoteCount>, MeetingError> {
        let votes = self.vote_repo.get_by_meeting(meeting_id).await?;

        let mut results: BTreeMap<i64, VoteCount> = BTreeMap::new();
        for vote in votes {
            let count = results.entry(vote.time_slot_id).or_default();
            match vote.choice {
                VoteChoice::Approve => count.approved += 1,
                VoteChoice::Reject => count.rejected += 1,
            }
        }
        Ok(results)
    }

    /// Resolve the slot with the highest approved count.
    ///
    /// Ties resolve to the lowest slot id. Fails with `NoVotes` when no slot
    /// has at least one approved vote.
    pub async fn best_time_slot(&self, meeting_id: i64) -> Result<i64, MeetingError> {
        let results = self.vote_results(meeting_id).await?;

        let mut best: Option<(i64, u32)> = None;
        for (slot_id, count) in results {
            if count.approved > best.map_or(0, |(_, approved)| approved) {
                best = Some((slot_id, count.approved));
            }
        }

        best.map(|(slot_id, _)| slot_id)
            .ok_or(MeetingError::NoVotes)
    }

    /// Mark a meeting as confirmed.
    pub async fn confirm_meeting(&self, meeting_id: i64) -> Result<Meeting, MeetingError> {
        let mut meeting = self
            .meeting_repo
            .get_by_id(meeting_id)
            .await
            .map_err(map_not_found)?;
        meeting.status = MeetingStatus::Confirmed;
        let meeting = self.meeting_repo.update(&meeting).await?;
        info!(meeting_id, "meeting confirmed");
        Ok(meeting)
    }

    /// Close voting on a meeting. Organizer only.
    ///
    /// Resolves the best slot: with votes the meeting is confirmed for the
    /// slot's start time, without votes it is closed with no final time.
    pub async fn close_voting(
        &self,
        meeting_id: i64,
        caller_id: i64,
    ) -> Result<ClosedVoting, MeetingError> {
        let mut meeting = self
            .meeting_repo
            .get_by_id(meeting_id)
            .await
            .map_err(map_not_found)?;

        if meeting.organizer_id != caller_id {
            return Err(MeetingError::NotOrganizer);
        }

        match self.best_time_slot(meeting_id).await {
            Ok(slot_id) => {
                let slot = self
                    .meeting_repo
                    .get_time_slots(meeting_id)
                    .await?
                    .into_iter()
                    .find(|s| s.id == slot_id)
                    .ok_or(MeetingError::NotFound)?;

                meeting.status = MeetingStatus::Confirmed;
                meeting.final_time = Some(slot.start_time);
                let meeting = self.meeting_repo.update(&meeting).await?;
                info!(meeting_id, slot_id, final_time = %slot.start_time, "voting closed, meeting confirmed");
                Ok(ClosedVoting::Confirmed { meeting, slot })
            }
            Err(MeetingError::NoVotes) => {
                meeting.status = MeetingStatus::Closed;
                let meeting = self.meeting_repo.update(&meeting).await?;
                info!(meeting_id, "voting closed with no approved votes");
                Ok(ClosedVoting::NoWinner { meeting })
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meeting::{CreateMeetingRequest, MeetingService};
    use crate::testutil::MemRepo;
    use chrono::{Duration, Utc};

    struct Fixture {
        meetings: MeetingService<MemRepo, MemRepo>,
        votes: VoteService<MemRepo, MemRepo>,
    }

    fn fixture() -> Fixture {
        let repo = MemRepo::default();
        Fixture {
            meetings: MeetingService::new(repo.clone(), repo.clone()),
            votes: VoteService::new(repo.clone(), repo),
        }
    }

    /// Creates an open meeting with three slots, returns (meeting_id, slot_ids).
    async fn open_meeting(fx: &Fixture) -> (i64, Vec<i64>) {
        let start = Utc::now() + Duration::days(1);
        let details = fx
            .meetings
            .create_meeting(CreateMeetingRequest {
                chat_id: 1,
                organizer_id: 7,
                title: "Planning".to_string(),
                description: None,
                participant_ids: vec![],
                time_slots: (0..3)
                    .map(|i| {
                        let s = start + Duration::days(i);
                        (s, s + Duration::hours(1))
                    })
                    .collect(),
            })
            .await
            .unwrap();
        let slot_ids = details.time_slots.iter().map(|s| s.id).collect();
        (details.meeting.id, slot_ids)
    }

    #[tokio::test]
    async fn test_results_count_every_stored_vote() {
        let fx = fixture();
        let (meeting_id, slots) = open_meeting(&fx).await;

        fx.votes.vote(meeting_id, 1, slots[0], VoteChoice::Approve).await.unwrap();
        fx.votes.vote(meeting_id, 2, slots[0], VoteChoice::Reject).await.unwrap();
        fx.votes.vote(meeting_id, 3, slots[1], VoteChoice::Approve).await.unwrap();

        let results = fx.votes.vote_results(meeting_id).await.unwrap();
        assert_eq!(results[&slots[0]], VoteCount { approved: 1, rejected: 1 });
        assert_eq!(results[&slots[1]], VoteCount { approved: 1, rejected: 0 });
        assert!(!results.contains_key(&slots[2]));
    }

    #[tokio::test]
    async fn test_vote_upserts_per_user_slot() {
        let fx = fixture();
        let (meeting_id, slots) = open_meeting(&fx).await;

        fx.votes.vote(meeting_id, 1, slots[0], VoteChoice::Reject).await.unwrap();
        fx.votes.vote(meeting_id, 1, slots[0], VoteChoice::Approve).await.unwrap();

        let results = fx.votes.vote_results(meeting_id).await.unwrap();
        assert_eq!(results[&slots[0]], VoteCount { approved: 1, rejected: 0 });
    }

    #[tokio::test]
    async fn test_best_slot_prefers_most_approvals() {
        let fx = fixture();
        let (meeting_id, slots) = open_meeting(&fx).await;

        // Two approvals for slot X, one for slot Y.
        fx.votes.vote(meeting_id, 1, slots[1], VoteChoice::Approve).await.unwrap();
        fx.votes.vote(meeting_id, 2, slots[1], VoteChoice::Approve).await.unwrap();
        fx.votes.vote(meeting_id, 3, slots[0], VoteChoice::Approve).await.unwrap();

        let best = fx.votes.best_time_slot(meeting_id).await.unwrap();
        assert_eq!(best, slots[1]);
    }

    #[tokio::test]
    async fn test_best_slot_tie_breaks_to_lowest_id() {
        let fx = fixture();
        let (meeting_id, slots) = open_meeting(&fx).await;

        fx.votes.vote(meeting_id, 1, slots[2], VoteChoice::Approve).await.unwrap();
        fx.votes.vote(meeting_id, 2, slots[1], VoteChoice::Approve).await.unwrap();

        let best = fx.votes.best_time_slot(meeting_id).await.unwrap();
        assert_eq!(best, slots[1].min(slots[2]));
    }

    #[tokio::test]
    async fn test_best_slot_requires_an_approval() {
        let fx = fixture();
        let (meeting_id, slots) = open_meeting(&fx).await;

        fx.votes.vote(meeting_id, 1, slots[0], VoteChoice::Reject).await.unwrap();

        let err = fx.votes.best_time_slot(meeting_id).await.unwrap_err();
        assert!(matches!(err, MeetingError::NoVotes));
    }

    #[tokio::test]
    async fn test_unvote_removes_and_revote_is_accepted() {
        let fx = fixture();
        let (meeting_id, slots) = open_meeting(&fx).await;

        fx.votes.vote(meeting_id, 1, slots[0], VoteChoice::Approve).await.unwrap();
        fx.votes.unvote(meeting_id, 1, slots[0]).await.unwrap();

        let results = fx.votes.vote_results(meeting_id).await.unwrap();
        assert!(!results.contains_key(&slots[0]));

        // Unvoting again is a quiet no-op; re-voting works.
        fx.votes.unvote(meeting_id, 1, slots[0]).await.unwrap();
        fx.votes.vote(meeting_id, 1, slots[0], VoteChoice::Approve).await.unwrap();
        let results = fx.votes.vote_results(meeting_id).await.unwrap();
        assert_eq!(results[&slots[0]].approved, 1);
    }

    #[tokio::test]
    async fn test_close_voting_confirms_winner() {
        let fx = fixture();
        let (meeting_id, slots) = open_meeting(&fx).await;

        fx.votes.vote(meeting_id, 1, slots[0], VoteChoice::Approve).await.unwrap();

        let closed = fx.votes.close_voting(meeting_id, 7).await.unwrap();
        match closed {
            ClosedVoting::Confirmed { meeting, slot } => {
                assert_eq!(meeting.status, MeetingStatus::Confirmed);
                assert_eq!(meeting.final_time, Some(slot.start_time));
                assert_eq!(slot.id, slots[0]);
            }
            other => panic!("expected confirmation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_close_voting_without_votes_closes() {
        let fx = fixture();
        let (meeting_id, _) = open_meeting(&fx).await;

        let closed = fx.votes.close_voting(meeting_id, 7).await.unwrap();
        match closed {
            ClosedVoting::NoWinner { meeting } => {
                assert_eq!(meeting.status, MeetingStatus::Closed);
                assert_eq!(meeting.final_time, None);
            }
            other => panic!("expected no winner, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_close_voting_rejects_non_organizer() {
        let fx = fixture();
        let (meeting_id, slots) = open_meeting(&fx).await;
        fx.votes.vote(meeting_id, 1, slots[0], VoteChoice::Approve).await.unwrap();

        let err = fx.votes.close_voting(meeting_id, 999).await.unwrap_err();
        assert!(matches!(err, MeetingError::NotOrganizer));

        // Nothing mutated.
        let meeting = fx.meetings.get_meeting(meeting_id).await.unwrap();
        assert_eq!(meeting.status, MeetingStatus::Open);
    }

    #[tokio::test]
    async fn test_confirm_meeting_sets_status() {
        let fx = fixture();
        let (meeting_id, _) = open_meeting(&fx).await;
        let meeting = fx.votes.confirm_meeting(meeting_id).await.unwrap();
        assert_eq!(meeting.status, MeetingStatus::Confirmed);
    }
}
