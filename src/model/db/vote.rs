use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{common::PollId, mongodb::Id};

use super::Poll;

/// Core vote data: one cast ballot for one choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCore {
    /// The poll the ballot was cast on. Denormalised from the choice for
    /// query convenience.
    pub poll_id: PollId,
    /// The ballot this row belongs to. A multiple-choice ballot inserts one
    /// row per selected choice, all sharing this ID.
    pub ballot_id: Id,
    /// The selected choice.
    pub choice_id: Id,
    /// The voter; absent for anonymous ballots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Id>,
    /// Was the poll single-choice when this ballot was cast? The one-vote-
    /// per-user unique index is filtered on this.
    pub single: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub cast_at: DateTime<Utc>,
}

impl VoteCore {
    /// One row of the given ballot on the given poll.
    pub fn new(poll: &Poll, ballot_id: Id, choice_id: Id, user_id: Option<Id>) -> Self {
        Self {
            poll_id: poll.id,
            ballot_id,
            choice_id,
            user_id,
            single: !poll.is_multiple,
            cast_at: Utc::now(),
        }
    }
}

/// A vote without an ID, for insertion.
pub type NewVote = VoteCore;

/// A vote from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub vote: VoteCore,
}

impl Deref for Vote {
    type Target = VoteCore;

    fn deref(&self) -> &Self::Target {
        &self.vote
    }
}
