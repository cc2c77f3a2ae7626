use mongodb::{bson::doc, options::FindOptions};
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::{
    error::Result,
    model::{
        api::results::PollResults,
        common::PollId,
        db::{Choice, Poll, User},
        mongodb::Coll,
    },
};

use super::common::poll_by_id;

pub fn routes() -> Vec<Route> {
    routes![poll_results]
}

#[get("/polls/<poll_id>/results")]
pub(crate) async fn poll_results(
    _user: User,
    poll_id: PollId,
    polls: Coll<Poll>,
    choices: Coll<Choice>,
) -> Result<Json<PollResults>> {
    // 404 for unknown polls; everything else aggregates to a valid result.
    let _poll = poll_by_id(poll_id, &polls).await?;

    let in_position_order = FindOptions::builder().sort(doc! { "position": 1 }).build();
    let tallied: Vec<Choice> = choices
        .find(doc! { "poll_id": i64::from(poll_id) }, in_position_order)
        .await?
        .try_collect()
        .await?;

    Ok(Json(PollResults::from_tallies(
        tallied
            .into_iter()
            .map(|choice| (choice.choice.label, choice.choice.votes)),
    )))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::{serde_json, serde_json::json},
    };

    use crate::model::api::{
        auth::Credentials,
        poll::{PollDescription, PollSpec},
    };

    use super::super::polls::create_example_poll;
    use super::*;

    async fn fetch_results(client: &Client, poll_id: PollId) -> PollResults {
        let response = client.get(uri!(poll_results(poll_id))).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        serde_json::from_str(&response.into_string().await.unwrap()).unwrap()
    }

    async fn cast_anonymous(client: &Client, poll: &PollDescription, choice_index: usize) {
        let response = client
            .post(uri!(super::super::votes::cast_vote(poll.id)))
            .header(ContentType::JSON)
            .body(json!({ "choices": [poll.choices[choice_index].id] }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Created, response.status());
    }

    #[backend_test(user)]
    async fn percentages_match_tallies(client: Client) {
        let poll = create_example_poll(&client, PollSpec::anonymous_example()).await;

        // Three anonymous ballots for the first choice, one for the second.
        client.delete(uri!(crate::api::auth::logout)).dispatch().await;
        for _ in 0..3 {
            cast_anonymous(&client, &poll, 0).await;
        }
        cast_anonymous(&client, &poll, 1).await;

        // Results require authentication; log back in.
        client
            .post(uri!(crate::api::auth::login))
            .header(ContentType::JSON)
            .body(json!(Credentials::example()).to_string())
            .dispatch()
            .await;

        let results = fetch_results(&client, poll.id).await;
        assert_eq!(vec![75.0, 25.0], results.values);
        assert_eq!(vec!["Red", "Blue"], results.labels);
        assert_eq!(4, results.votes);
    }

    #[backend_test(user)]
    async fn results_align_with_choice_order(client: Client) {
        let poll = create_example_poll(&client, PollSpec::multiple_example()).await;

        // One ballot selecting the last two choices.
        let response = client
            .post(uri!(super::super::votes::cast_vote(poll.id)))
            .header(ContentType::JSON)
            .body(
                json!({ "choices": [poll.choices[1].id, poll.choices[2].id] }).to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(Status::Created, response.status());

        let results = fetch_results(&client, poll.id).await;
        assert_eq!(vec!["Mushroom", "Olive", "Anchovy"], results.labels);
        assert_eq!(vec![0.0, 50.0, 50.0], results.values);
        assert_eq!(2, results.votes);
    }

    #[backend_test(user)]
    async fn no_votes_means_zero_percentages(client: Client) {
        let poll = create_example_poll(&client, PollSpec::example()).await;

        let results = fetch_results(&client, poll.id).await;
        assert_eq!(vec![0.0, 0.0], results.values);
        assert_eq!(0, results.votes);
    }

    #[backend_test(user)]
    async fn unknown_poll_is_not_found(client: Client) {
        let response = client.get(uri!(poll_results(999_u32))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }
}
