use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::user::UserDescription,
        db::{Superuser, User},
        mongodb::{Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        users_superuser,
        users_self,
        user_detail_superuser,
        user_detail_self,
    ]
}

/// Superusers get a list of all users.
#[get("/users", rank = 1)]
async fn users_superuser(
    _superuser: Superuser,
    users: Coll<User>,
) -> Result<Json<Vec<UserDescription>>> {
    let all_users: Vec<User> = users.find(None, None).await?.try_collect().await?;
    Ok(Json(all_users.into_iter().map(Into::into).collect()))
}

/// Everyone else only sees their own account.
#[get("/users", rank = 2)]
async fn users_self(user: User) -> Json<Vec<UserDescription>> {
    Json(vec![user.into()])
}

/// Superusers can fetch any user's record.
#[get("/users/<user_id>", rank = 1)]
async fn user_detail_superuser(
    _superuser: Superuser,
    user_id: Id,
    users: Coll<User>,
) -> Result<Json<UserDescription>> {
    let user = users
        .find_one(user_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("User with ID '{user_id}'")))?;
    Ok(Json(user.into()))
}

/// Everyone else can only fetch their own record. Other IDs get a 404, so
/// this route doesn't leak which accounts exist.
#[get("/users/<user_id>", rank = 2)]
async fn user_detail_self(user: User, user_id: Id) -> Result<Json<UserDescription>> {
    if user.id != user_id {
        return Err(Error::not_found(format!("User with ID '{user_id}'")));
    }
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::Status,
        local::asynchronous::Client,
        serde::json::{serde_json, serde_json::Value},
    };

    use crate::model::db::NewUser;

    use super::*;

    #[backend_test(user)]
    async fn listing_is_self_scoped(client: Client, users: Coll<NewUser>) {
        // A second user exists but must not be listed.
        users.insert_one(NewUser::example2(), None).await.unwrap();

        let response = client.get(uri!(users_self)).dispatch().await;

        assert_eq!(Status::Ok, response.status());
        let raw_response = response.into_string().await.unwrap();
        let listed = serde_json::from_str::<Vec<UserDescription>>(&raw_response).unwrap();
        assert_eq!(1, listed.len());
        assert_eq!("alice", listed[0].username);
    }

    #[backend_test(superuser)]
    async fn superuser_sees_everyone(client: Client, users: Coll<NewUser>) {
        users.insert_one(NewUser::example(), None).await.unwrap();
        users.insert_one(NewUser::example2(), None).await.unwrap();

        let response = client.get(uri!(users_superuser)).dispatch().await;

        assert_eq!(Status::Ok, response.status());
        let raw_response = response.into_string().await.unwrap();
        let listed = serde_json::from_str::<Vec<UserDescription>>(&raw_response).unwrap();
        let mut usernames: Vec<_> = listed.into_iter().map(|user| user.username).collect();
        usernames.sort();
        assert_eq!(vec!["alice", "bob", "overseer"], usernames);
    }

    #[backend_test(user)]
    async fn detail_hides_sensitive_fields(client: Client, users: Coll<User>) {
        let alice = users
            .find_one(mongodb::bson::doc! { "username": "alice" }, None)
            .await
            .unwrap()
            .unwrap();

        let response = client
            .get(uri!(user_detail_self(alice.id)))
            .dispatch()
            .await;

        assert_eq!(Status::Ok, response.status());
        let raw_response = response.into_string().await.unwrap();
        let value = serde_json::from_str::<Value>(&raw_response).unwrap();
        assert_eq!(
            Some("alice"),
            value.get("username").and_then(Value::as_str)
        );
        assert!(value.get("password_hash").is_none());
        assert!(value.get("is_superuser").is_none());
    }

    #[backend_test(user)]
    async fn detail_is_self_scoped(client: Client, users: Coll<User>, new_users: Coll<NewUser>) {
        // A second user exists, but their record is off limits.
        new_users
            .insert_one(NewUser::example2(), None)
            .await
            .unwrap();
        let bob = users
            .find_one(mongodb::bson::doc! { "username": "bob" }, None)
            .await
            .unwrap()
            .unwrap();

        let response = client
            .get(uri!(user_detail_self(bob.id)))
            .dispatch()
            .await;

        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(superuser)]
    async fn superuser_sees_any_detail(client: Client, users: Coll<User>, new_users: Coll<NewUser>) {
        new_users
            .insert_one(NewUser::example(), None)
            .await
            .unwrap();
        let alice = users
            .find_one(mongodb::bson::doc! { "username": "alice" }, None)
            .await
            .unwrap()
            .unwrap();

        let response = client
            .get(uri!(user_detail_superuser(alice.id)))
            .dispatch()
            .await;

        assert_eq!(Status::Ok, response.status());
        let raw_response = response.into_string().await.unwrap();
        let detail = serde_json::from_str::<UserDescription>(&raw_response).unwrap();
        assert_eq!("alice", detail.username);
    }

    #[backend_test]
    async fn listing_requires_authentication(client: Client) {
        let response = client.get("/users").dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());
    }
}
