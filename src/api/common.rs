use mongodb::bson::doc;

use crate::error::{Error, Result};
use crate::model::{
    common::PollId,
    db::{Choice, Poll, Vote},
    mongodb::{u32_id_filter, Coll, Id},
};

/// Look up a poll by ID.
pub async fn poll_by_id(poll_id: PollId, polls: &Coll<Poll>) -> Result<Poll> {
    polls
        .find_one(u32_id_filter(poll_id), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Poll with ID '{poll_id}'")))
}

/// Look up a choice by ID, checking that it belongs to the given poll.
pub async fn choice_in_poll(
    choice_id: Id,
    poll_id: PollId,
    choices: &Coll<Choice>,
) -> Result<Choice> {
    let filter = doc! {
        "_id": *choice_id,
        "poll_id": i64::from(poll_id),
    };
    choices
        .find_one(filter, None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Choice '{choice_id}' in poll '{poll_id}'")))
}

/// Has the given user already cast a ballot on this poll?
pub async fn already_voted(votes: &Coll<Vote>, poll_id: PollId, user_id: Id) -> Result<bool> {
    let filter = doc! {
        "poll_id": i64::from(poll_id),
        "user_id": *user_id,
    };
    Ok(votes.find_one(filter, None).await?.is_some())
}
