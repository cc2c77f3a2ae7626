use rocket::{http::Status, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::poll::{ChoiceDescription, ChoiceSpec},
        common::PollId,
        db::{Choice, NewChoice, Poll, User},
        mongodb::{choice_counter_id, Coll, Counter, Id},
    },
};

use super::common::{choice_in_poll, poll_by_id};

pub fn routes() -> Vec<Route> {
    routes![create_choice, update_choice]
}

#[post("/polls/<poll_id>/choices", data = "<spec>", format = "json")]
pub(crate) async fn create_choice(
    user: User,
    poll_id: PollId,
    spec: Json<ChoiceSpec>,
    polls: Coll<Poll>,
    new_choices: Coll<NewChoice>,
    counters: Coll<Counter>,
) -> Result<Json<ChoiceDescription>> {
    let poll = poll_by_id(poll_id, &polls).await?;
    if !poll.modifiable_by(&user) {
        return Err(Error::Status(
            Status::Forbidden,
            format!("Only the owner may add choices to poll '{poll_id}'"),
        ));
    }

    // Allocate the next position on this poll.
    let next = Counter::next(&counters, &choice_counter_id(poll_id)).await?;
    let position = u32::try_from(next).expect("choice counter overflowed u32");

    let choice = NewChoice::new(poll_id, position, spec.0.label);
    let new_id: Id = new_choices
        .insert_one(&choice, None)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB
        .into();
    info!(
        "User '{}' added choice '{}' to poll {}",
        user.username, choice.label, poll_id
    );

    Ok(Json(Choice {
        id: new_id,
        choice,
    }
    .into()))
}

#[put("/polls/<poll_id>/choices/<choice_id>", data = "<spec>", format = "json")]
pub(crate) async fn update_choice(
    user: User,
    poll_id: PollId,
    choice_id: Id,
    spec: Json<ChoiceSpec>,
    polls: Coll<Poll>,
    choices: Coll<Choice>,
) -> Result<Json<ChoiceDescription>> {
    let poll = poll_by_id(poll_id, &polls).await?;
    if !poll.modifiable_by(&user) {
        return Err(Error::Status(
            Status::Forbidden,
            format!("Only the owner may modify choices of poll '{poll_id}'"),
        ));
    }

    let mut choice = choice_in_poll(choice_id, poll_id, &choices).await?;
    choice.choice.label = spec.0.label;
    choices
        .replace_one(choice_id.as_doc(), &choice, None)
        .await?;

    Ok(Json(choice.into()))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::ContentType,
        local::asynchronous::Client,
        serde::json::{serde_json, serde_json::json},
    };

    use crate::model::api::poll::{PollDescription, PollSpec};

    use super::super::polls::create_example_poll;
    use super::*;

    #[backend_test(user)]
    async fn append_choice(client: Client) {
        let description = create_example_poll(&client, PollSpec::example()).await;

        let response = client
            .post(uri!(create_choice(description.id)))
            .header(ContentType::JSON)
            .body(json!(ChoiceSpec { label: "Green".to_string() }).to_string())
            .dispatch()
            .await;

        assert_eq!(rocket::http::Status::Ok, response.status());
        let raw_response = response.into_string().await.unwrap();
        let choice = serde_json::from_str::<ChoiceDescription>(&raw_response).unwrap();
        assert_eq!("Green", choice.label);
        // Positions continue after the inline choices.
        assert_eq!(3, choice.position);
        assert_eq!(0, choice.votes);

        // The new choice shows up in the poll detail.
        let response = client
            .get(uri!(super::super::polls::poll_detail(description.id)))
            .dispatch()
            .await;
        let raw_response = response.into_string().await.unwrap();
        let detail = serde_json::from_str::<PollDescription>(&raw_response).unwrap();
        assert_eq!(3, detail.choices.len());
        assert_eq!("Green", detail.choices[2].label);
    }

    #[backend_test(user)]
    async fn relabel_choice(client: Client) {
        let description = create_example_poll(&client, PollSpec::example()).await;
        let choice = &description.choices[0];

        let response = client
            .put(uri!(update_choice(description.id, *choice.id)))
            .header(ContentType::JSON)
            .body(json!(ChoiceSpec { label: "Crimson".to_string() }).to_string())
            .dispatch()
            .await;

        assert_eq!(rocket::http::Status::Ok, response.status());
        let raw_response = response.into_string().await.unwrap();
        let updated = serde_json::from_str::<ChoiceDescription>(&raw_response).unwrap();
        assert_eq!("Crimson", updated.label);
        assert_eq!(choice.position, updated.position);
    }

    #[backend_test(user)]
    async fn choice_from_another_poll_is_not_found(client: Client) {
        let first = create_example_poll(&client, PollSpec::example()).await;
        let second = create_example_poll(&client, PollSpec::anonymous_example()).await;

        // A choice ID from the second poll does not resolve under the first.
        let foreign = &second.choices[0];
        let response = client
            .put(uri!(update_choice(first.id, *foreign.id)))
            .header(ContentType::JSON)
            .body(json!(ChoiceSpec { label: "Mislabel".to_string() }).to_string())
            .dispatch()
            .await;

        assert_eq!(rocket::http::Status::NotFound, response.status());
    }
}
