use mongodb::{bson::doc, options::FindOptions, Client};
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            pagination::Pagination,
            poll::{PollDescription, PollList, PollSpec, PollUpdate},
        },
        common::PollId,
        db::{Choice, NewChoice, Poll, User, Vote},
        mongodb::{choice_counter_id, u32_id_filter, Coll, Counter, POLL_ID_COUNTER_ID},
    },
};

use super::common::{already_voted, poll_by_id};

pub fn routes() -> Vec<Route> {
    routes![list_polls, poll_detail, create_poll, update_poll]
}

#[get("/polls")]
pub(crate) async fn list_polls(
    _user: User,
    pagination: Pagination,
    polls: Coll<Poll>,
) -> Result<Json<PollList>> {
    let options = FindOptions::builder()
        .sort(doc! { "_id": 1 })
        .skip(pagination.skip())
        .limit(pagination.page_size() as i64)
        .build();
    let page: Vec<Poll> = polls.find(None, options).await?.try_collect().await?;
    let total = polls.count_documents(None, None).await?;

    Ok(Json(PollList {
        polls: page.into_iter().map(Into::into).collect(),
        pagination: pagination.result(total as usize),
    }))
}

#[get("/polls/<poll_id>")]
pub(crate) async fn poll_detail(
    user: User,
    poll_id: PollId,
    polls: Coll<Poll>,
    choices: Coll<Choice>,
    votes: Coll<Vote>,
) -> Result<Json<PollDescription>> {
    let poll = poll_by_id(poll_id, &polls).await?;
    let poll_choices: Vec<Choice> = choices
        .find(doc! { "poll_id": i64::from(poll_id) }, None)
        .await?
        .try_collect()
        .await?;
    let voted = already_voted(&votes, poll_id, user.id).await?;

    Ok(Json(PollDescription::new(poll, poll_choices, voted)))
}

#[post("/polls", data = "<spec>", format = "json")]
pub(crate) async fn create_poll(
    user: User,
    spec: Json<PollSpec>,
    polls: Coll<Poll>,
    choices: Coll<Choice>,
    new_choices: Coll<NewChoice>,
    counters: Coll<Counter>,
    db_client: &State<Client>,
) -> Result<Json<PollDescription>> {
    let poll = {
        let mut session = db_client.start_session(None).await?;
        session.start_transaction(None).await?;

        // Allocate the next poll ID.
        let next = Counter::next_with_session(&counters, POLL_ID_COUNTER_ID, &mut session).await?;
        let poll_id = PollId::try_from(next).expect("poll ID counter overflowed u32");

        // Create and insert the poll and its inline choices.
        let (poll, inline_choices) = spec.0.into_poll(poll_id, user.id);
        polls
            .insert_one_with_session(&poll, None, &mut session)
            .await?;
        if !inline_choices.is_empty() {
            new_choices
                .insert_many_with_session(&inline_choices, None, &mut session)
                .await?;
        }

        // Create the counter that allocates further choice positions.
        let counter = Counter::new(choice_counter_id(poll_id), 1 + inline_choices.len() as u64);
        counters
            .insert_one_with_session(&counter, None, &mut session)
            .await?;

        session.commit_transaction().await?;
        poll
    };

    info!(
        "User '{}' created poll {} '{}'",
        user.username, poll.id, poll.title
    );

    // Read the choices back so the description carries their IDs.
    let stored_choices: Vec<Choice> = choices
        .find(doc! { "poll_id": i64::from(poll.id) }, None)
        .await?
        .try_collect()
        .await?;
    Ok(Json(PollDescription::new(poll, stored_choices, false)))
}

#[put("/polls/<poll_id>", data = "<update>", format = "json")]
pub(crate) async fn update_poll(
    user: User,
    poll_id: PollId,
    update: Json<PollUpdate>,
    polls: Coll<Poll>,
    choices: Coll<Choice>,
    votes: Coll<Vote>,
) -> Result<Json<PollDescription>> {
    let mut poll = poll_by_id(poll_id, &polls).await?;
    if !poll.modifiable_by(&user) {
        return Err(Error::Status(
            Status::Forbidden,
            format!("Only the owner may modify poll '{poll_id}'"),
        ));
    }

    update.0.apply(&mut poll);
    polls
        .replace_one(u32_id_filter(poll_id), &poll, None)
        .await?;
    info!("User '{}' updated poll {}", user.username, poll_id);

    let poll_choices: Vec<Choice> = choices
        .find(doc! { "poll_id": i64::from(poll_id) }, None)
        .await?
        .try_collect()
        .await?;
    let voted = already_voted(&votes, poll_id, user.id).await?;
    Ok(Json(PollDescription::new(poll, poll_choices, voted)))
}

/// Create a poll through the API as the client's current user and return its
/// description.
#[cfg(test)]
pub(in crate::api) async fn create_example_poll(
    client: &rocket::local::asynchronous::Client,
    spec: PollSpec,
) -> PollDescription {
    use rocket::serde::json::{serde_json, serde_json::json};

    let response = client
        .post(uri!(create_poll))
        .header(rocket::http::ContentType::JSON)
        .body(json!(spec).to_string())
        .dispatch()
        .await;
    assert_eq!(rocket::http::Status::Ok, response.status());
    serde_json::from_str(&response.into_string().await.unwrap()).unwrap()
}
