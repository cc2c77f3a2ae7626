use std::collections::HashSet;

use mongodb::{bson::doc, Client};
use rocket::{response::status::Created, serde::json::Json, Route, State};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{
        api::id::ApiId,
        common::{PollId, VoteRejection},
        db::{Choice, NewVote, Poll, User, Vote},
        mongodb::{is_duplicate_key_error, Coll, Id},
    },
};

use super::common::{choice_in_poll, poll_by_id};

pub fn routes() -> Vec<Route> {
    routes![cast_vote]
}

/// A ballot the user wishes to cast: one or more choices on the poll.
#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) struct VoteSpec {
    pub choices: Vec<ApiId>,
}

#[post("/polls/<poll_id>/votes", data = "<spec>", format = "json")]
pub(crate) async fn cast_vote(
    user: Option<User>,
    poll_id: PollId,
    spec: Json<VoteSpec>,
    polls: Coll<Poll>,
    choices: Coll<Choice>,
    votes: Coll<Vote>,
    new_votes: Coll<NewVote>,
    db_client: &State<Client>,
) -> Result<Created<()>> {
    let poll = poll_by_id(poll_id, &polls).await?;

    // Basic selection validity.
    let selection: Vec<Id> = spec.0.choices.iter().map(|id| **id).collect();
    if selection.is_empty() {
        return Err(Error::bad_request("A ballot must select at least one choice"));
    }
    let distinct: HashSet<Id> = selection.iter().copied().collect();
    if distinct.len() != selection.len() {
        return Err(Error::bad_request(
            "A ballot must not select the same choice twice",
        ));
    }

    // Eligibility checks, in order. The vote window is measured in ballots,
    // not vote rows: a multiple-choice ballot inserts one row per choice.
    let cast_ballots = votes
        .distinct("ballot_id", doc! { "poll_id": i64::from(poll_id) }, None)
        .await?
        .len() as u64;
    poll.check_votable(cast_ballots, user.is_some(), selection.len())?;

    // Ensure the selected choices exist on this poll.
    let mut selected = Vec::with_capacity(selection.len());
    for choice_id in &selection {
        selected.push(choice_in_poll(*choice_id, poll_id, &choices).await?);
    }

    // An identified user only gets one ballot per poll.
    let user_id = user.as_ref().map(|user| user.id);
    if let Some(user_id) = user_id {
        let filter = doc! {
            "poll_id": i64::from(poll_id),
            "user_id": *user_id,
        };
        if votes.find_one(filter, None).await?.is_some() {
            return Err(VoteRejection::AlreadyVoted.into());
        }
    }

    // Record the ballot and update the cached tallies atomically.
    {
        let ballot_id = Id::new();
        let mut session = db_client.start_session(None).await?;
        session.start_transaction(None).await?;

        for choice in &selected {
            let vote = NewVote::new(&poll, ballot_id, choice.id, user_id);
            let inserted = new_votes
                .insert_one_with_session(&vote, None, &mut session)
                .await;
            // A unique index violation means a concurrent ballot won the race.
            if is_duplicate_key_error(inserted.as_ref().map(|_| ())) {
                return Err(VoteRejection::AlreadyVoted.into());
            }
            inserted?;
            choices
                .update_one_with_session(
                    choice.id.as_doc(),
                    doc! { "$inc": { "votes": 1_i64 } },
                    None,
                    &mut session,
                )
                .await?;
        }

        session.commit_transaction().await?;
    }

    match &user {
        Some(user) => info!("User '{}' voted on poll {}", user.username, poll_id),
        None => info!("Anonymous ballot cast on poll {}", poll_id),
    }

    Ok(Created::new(format!("/polls/{poll_id}/results")))
}
