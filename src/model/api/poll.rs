use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::{id::ApiId, pagination::PaginationResult},
    common::PollId,
    db::{Choice, NewChoice, Poll, PollCore},
    mongodb::Id,
};

/// A poll specification, as submitted on creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSpec {
    /// The question being asked.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Accept ballots without an authenticated user?
    #[serde(default)]
    pub is_anonymous: bool,
    /// Accept more than one choice per ballot?
    #[serde(default)]
    pub is_multiple: bool,
    /// Created already closed?
    #[serde(default)]
    pub is_closed: bool,
    /// Votes below which clients should withhold results.
    #[serde(default)]
    pub start_votes: Option<u32>,
    /// Total ballots after which the poll stops accepting votes.
    #[serde(default)]
    pub end_votes: Option<u32>,
    /// Choice labels to create along with the poll, in order.
    #[serde(default)]
    pub choices: Vec<String>,
}

impl PollSpec {
    /// Convert this spec into a poll with the given unique ID and owner,
    /// plus its inline choices.
    pub fn into_poll(self, id: PollId, owner: Id) -> (Poll, Vec<NewChoice>) {
        let choices = self
            .choices
            .into_iter()
            .enumerate()
            .map(|(i, label)| {
                let position = 1 + u32::try_from(i).expect("usize to u32");
                NewChoice::new(id, position, label)
            })
            .collect();
        let now = Utc::now();
        let poll = Poll {
            id,
            owner,
            poll: PollCore {
                title: self.title,
                description: self.description,
                is_anonymous: self.is_anonymous,
                is_multiple: self.is_multiple,
                is_closed: self.is_closed,
                start_votes: self.start_votes,
                end_votes: self.end_votes,
                created_at: now,
                updated_at: now,
            },
        };
        (poll, choices)
    }
}

/// A poll metadata update, as submitted on modification. Choices are managed
/// through their own resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollUpdate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub is_multiple: bool,
    #[serde(default)]
    pub is_closed: bool,
    #[serde(default)]
    pub start_votes: Option<u32>,
    #[serde(default)]
    pub end_votes: Option<u32>,
}

impl PollUpdate {
    /// Apply this update to a poll, refreshing its update timestamp.
    pub fn apply(self, poll: &mut Poll) {
        poll.poll.title = self.title;
        poll.poll.description = self.description;
        poll.poll.is_anonymous = self.is_anonymous;
        poll.poll.is_multiple = self.is_multiple;
        poll.poll.is_closed = self.is_closed;
        poll.poll.start_votes = self.start_votes;
        poll.poll.end_votes = self.end_votes;
        poll.poll.updated_at = Utc::now();
    }
}

/// A choice specification: just the label. Positions are allocated by the
/// server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceSpec {
    pub label: String,
}

/// An API-friendly choice description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceDescription {
    pub id: ApiId,
    pub position: u32,
    pub label: String,
    pub votes: u64,
}

impl From<Choice> for ChoiceDescription {
    fn from(choice: Choice) -> Self {
        Self {
            id: choice.id.into(),
            position: choice.choice.position,
            label: choice.choice.label,
            votes: choice.choice.votes,
        }
    }
}

/// A summary of a poll, as returned by the poll listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSummary {
    pub id: PollId,
    pub owner: ApiId,
    pub title: String,
    pub is_anonymous: bool,
    pub is_multiple: bool,
    pub is_closed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Poll> for PollSummary {
    fn from(poll: Poll) -> Self {
        Self {
            id: poll.id,
            owner: poll.owner.into(),
            title: poll.poll.title,
            is_anonymous: poll.poll.is_anonymous,
            is_multiple: poll.poll.is_multiple,
            is_closed: poll.poll.is_closed,
            created_at: poll.poll.created_at,
        }
    }
}

/// A page of poll summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollList {
    pub polls: Vec<PollSummary>,
    pub pagination: PaginationResult,
}

/// A full poll description, including its choices and whether the requesting
/// user has already voted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollDescription {
    pub id: PollId,
    pub owner: ApiId,
    pub title: String,
    pub description: String,
    pub is_anonymous: bool,
    pub is_multiple: bool,
    pub is_closed: bool,
    pub start_votes: Option<u32>,
    pub end_votes: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub choices: Vec<ChoiceDescription>,
    pub already_voted: bool,
}

impl PollDescription {
    /// Describe a poll along with its choices, in position order.
    pub fn new(poll: Poll, mut choices: Vec<Choice>, already_voted: bool) -> Self {
        choices.sort_by_key(|choice| choice.position);
        Self {
            id: poll.id,
            owner: poll.owner.into(),
            title: poll.poll.title,
            description: poll.poll.description,
            is_anonymous: poll.poll.is_anonymous,
            is_multiple: poll.poll.is_multiple,
            is_closed: poll.poll.is_closed,
            start_votes: poll.poll.start_votes,
            end_votes: poll.poll.end_votes,
            created_at: poll.poll.created_at,
            updated_at: poll.poll.updated_at,
            choices: choices.into_iter().map(Into::into).collect(),
            already_voted,
        }
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl PollSpec {
        /// A plain single-choice poll requiring an authenticated voter.
        pub fn example() -> Self {
            Self {
                title: "Favourite colour?".to_string(),
                description: "Pick one.".to_string(),
                is_anonymous: false,
                is_multiple: false,
                is_closed: false,
                start_votes: None,
                end_votes: None,
                choices: vec!["Red".to_string(), "Blue".to_string()],
            }
        }

        /// A poll that accepts anonymous ballots.
        pub fn anonymous_example() -> Self {
            Self {
                title: "Tabs or spaces?".to_string(),
                is_anonymous: true,
                ..Self::example()
            }
        }

        /// A poll that accepts several choices per ballot.
        pub fn multiple_example() -> Self {
            Self {
                title: "Pizza toppings?".to_string(),
                is_multiple: true,
                choices: vec![
                    "Mushroom".to_string(),
                    "Olive".to_string(),
                    "Anchovy".to_string(),
                ],
                ..Self::example()
            }
        }

        /// A poll that is already closed.
        pub fn closed_example() -> Self {
            Self {
                title: "Best defunct format?".to_string(),
                is_closed: true,
                ..Self::example()
            }
        }
    }
}
