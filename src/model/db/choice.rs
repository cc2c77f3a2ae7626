use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::{common::PollId, mongodb::Id};

/// Core choice data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceCore {
    /// The poll this choice belongs to.
    pub poll_id: PollId,
    /// Position within the poll, allocated from the poll's choice counter.
    /// Results are reported in position order.
    pub position: u32,
    /// Display label.
    pub label: String,
    /// Cached ballot tally, updated in the same transaction as vote inserts.
    pub votes: u64,
}

impl ChoiceCore {
    /// A fresh choice with no votes.
    pub fn new(poll_id: PollId, position: u32, label: impl Into<String>) -> Self {
        Self {
            poll_id,
            position,
            label: label.into(),
            votes: 0,
        }
    }
}

/// A choice without an ID, for insertion.
pub type NewChoice = ChoiceCore;

/// A choice from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub choice: ChoiceCore,
}

impl Deref for Choice {
    type Target = ChoiceCore;

    fn deref(&self) -> &Self::Target {
        &self.choice
    }
}

impl DerefMut for Choice {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.choice
    }
}
