use std::ops::Deref;

use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::model::db::{Choice, NewChoice, NewUser, NewVote, Poll, User, Vote};

use super::counter::Counter;

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromRequest<'r> for Coll<T>
where
    T: MongoCollection,
{
    type Error = ();

    /// Get the database connection from the managed state and wrap it in a collection.
    ///
    /// Panics iff the [`Database`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = req.guard::<&State<Database>>().await.unwrap();
        request::Outcome::Success(Coll::from_db(db))
    }
}

// User collections
const USERS: &str = "users";
impl MongoCollection for User {
    const NAME: &'static str = USERS;
}
impl MongoCollection for NewUser {
    const NAME: &'static str = USERS;
}

// Poll collection
const POLLS: &str = "polls";
impl MongoCollection for Poll {
    const NAME: &'static str = POLLS;
}

// Choice collections
const CHOICES: &str = "choices";
impl MongoCollection for Choice {
    const NAME: &'static str = CHOICES;
}
impl MongoCollection for NewChoice {
    const NAME: &'static str = CHOICES;
}

// Vote collections
const VOTES: &str = "votes";
impl MongoCollection for Vote {
    const NAME: &'static str = VOTES;
}
impl MongoCollection for NewVote {
    const NAME: &'static str = VOTES;
}

// Counter collection
const COUNTERS: &str = "counters";
impl MongoCollection for Counter {
    const NAME: &'static str = COUNTERS;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // User collection.
    let user_index = IndexModel::builder()
        .keys(doc! {"username": 1})
        .options(unique.clone())
        .build();
    Coll::<User>::from_db(db)
        .create_index(user_index, None)
        .await?;

    // Choice collection: positions are unique within a poll.
    let choice_index = IndexModel::builder()
        .keys(doc! {"poll_id": 1, "position": 1})
        .options(unique)
        .build();
    Coll::<Choice>::from_db(db)
        .create_index(choice_index, None)
        .await?;

    // Vote collection: an identified user gets at most one ballot per choice.
    // Anonymous ballots have no `user_id` and are exempt.
    let identified = IndexOptions::builder()
        .unique(true)
        .partial_filter_expression(doc! {"user_id": {"$exists": true}})
        .build();
    let vote_choice_index = IndexModel::builder()
        .keys(doc! {"poll_id": 1, "user_id": 1, "choice_id": 1})
        .options(identified)
        .build();
    Coll::<Vote>::from_db(db)
        .create_index(vote_choice_index, None)
        .await?;

    // Vote collection: on a single-choice poll, an identified user gets at
    // most one ballot full stop. This is what makes the eligibility check
    // race-free under concurrent requests.
    let single = IndexOptions::builder()
        .unique(true)
        .partial_filter_expression(doc! {"single": true, "user_id": {"$exists": true}})
        .build();
    let vote_single_index = IndexModel::builder()
        .keys(doc! {"poll_id": 1, "user_id": 1})
        .options(single)
        .build();
    Coll::<Vote>::from_db(db)
        .create_index(vote_single_index, None)
        .await?;

    Ok(())
}
