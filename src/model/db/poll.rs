use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{PollId, VoteRejection},
    mongodb::Id,
};

/// Core poll data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollCore {
    /// The question being asked.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Does the poll accept ballots without an authenticated user?
    pub is_anonymous: bool,
    /// Does the poll accept more than one choice per ballot?
    pub is_multiple: bool,
    /// Has the owner closed the poll?
    pub is_closed: bool,
    /// Votes below which clients should withhold results.
    pub start_votes: Option<u32>,
    /// Total ballots after which the poll stops accepting votes.
    pub end_votes: Option<u32>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// A poll from the database, with its unique ID and owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    /// Unique ID, allocated from the poll ID counter.
    #[serde(rename = "_id")]
    pub id: PollId,
    /// The user who created the poll.
    pub owner: Id,
    /// Top-level poll data.
    #[serde(flatten)]
    pub poll: PollCore,
}

impl Poll {
    /// Check whether a ballot passes this poll's eligibility rules.
    ///
    /// `cast_ballots` is the number of ballots already recorded (a
    /// multiple-choice ballot counts once however many choices it selects),
    /// `identified` whether the request carries an authenticated user, and
    /// `selections` how many choices the ballot selects. The checks run in a
    /// fixed order, so the first violated rule is the one reported.
    ///
    /// The already-voted rule needs a database lookup and is enforced by the
    /// caller (and, for single-choice polls, by a unique index).
    pub fn check_votable(
        &self,
        cast_ballots: u64,
        identified: bool,
        selections: usize,
    ) -> Result<(), VoteRejection> {
        if self.is_closed {
            return Err(VoteRejection::PollClosed);
        }
        if let Some(end_votes) = self.end_votes {
            if cast_ballots >= u64::from(end_votes) {
                return Err(VoteRejection::PollNotOpen);
            }
        }
        if !identified && !self.is_anonymous {
            return Err(VoteRejection::PollNotAnonymous);
        }
        if selections > 1 && !self.is_multiple {
            return Err(VoteRejection::PollNotMultiple);
        }
        Ok(())
    }

    /// Can the given user modify this poll or its choices?
    pub fn modifiable_by(&self, user: &super::User) -> bool {
        user.is_superuser || self.owner == user.id
    }
}

impl Deref for Poll {
    type Target = PollCore;

    fn deref(&self) -> &Self::Target {
        &self.poll
    }
}

impl DerefMut for Poll {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.poll
    }
}
