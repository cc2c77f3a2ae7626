use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, ReturnDocument, UpdateOptions},
    ClientSession,
};
use rocket::http::Status;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::common::PollId;
use crate::model::mongodb::Coll;

/// ID of the counter that allocates poll IDs.
pub const POLL_ID_COUNTER_ID: &str = "poll_ids";

/// ID of the counter that allocates choice positions within the given poll.
pub fn choice_counter_id(poll_id: PollId) -> String {
    format!("poll_{poll_id}_choices")
}

/// A counter object used to implement auto-increment fields.
///
/// Counters are keyed by well-known string IDs so they can be looked up
/// without a separate mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub id: String,
    pub next: u64,
}

impl Counter {
    /// Create a new `Counter` starting at the given value.
    pub fn new(id: impl Into<String>, start: u64) -> Self {
        Self {
            id: id.into(),
            next: start,
        }
    }

    /// Atomically retrieve the next value of the counter with the given ID.
    pub async fn next(counters: &Coll<Counter>, id: &str) -> Result<u64> {
        let update = doc! {
            "$inc": { "next": 1 }
        };
        let options: FindOneAndUpdateOptions = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::Before)
            .build();
        let counter = counters
            .find_one_and_update(doc! { "_id": id }, update, options)
            .await?
            .ok_or_else(|| {
                Error::Status(
                    Status::InternalServerError,
                    format!("Failed to find counter with ID {}", id),
                )
            })?;
        Ok(counter.next)
    }

    /// As [`Counter::next`], but inside a session.
    pub async fn next_with_session(
        counters: &Coll<Counter>,
        id: &str,
        session: &mut ClientSession,
    ) -> Result<u64> {
        let update = doc! {
            "$inc": { "next": 1 }
        };
        let options: FindOneAndUpdateOptions = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::Before)
            .build();
        let counter = counters
            .find_one_and_update_with_session(doc! { "_id": id }, update, options, session)
            .await?
            .ok_or_else(|| {
                Error::Status(
                    Status::InternalServerError,
                    format!("Failed to find counter with ID {}", id),
                )
            })?;
        Ok(counter.next)
    }
}

/// Ensure the poll ID counter exists, without disturbing it if it does.
///
/// This operation is idempotent.
pub async fn ensure_poll_id_counter_exists(counters: &Coll<Counter>) -> Result<()> {
    let options = UpdateOptions::builder().upsert(true).build();
    counters
        .update_one(
            doc! { "_id": POLL_ID_COUNTER_ID },
            doc! { "$setOnInsert": { "next": 1_i64 } },
            options,
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use mongodb::Database;

    #[backend_test]
    async fn counter_increment(db: Database) {
        const START: u64 = 5;

        // Create a counter and insert it.
        let counter = Counter::new("test_counter", START);
        let counters = Coll::<Counter>::from_db(&db);
        counters.insert_one(counter, None).await.unwrap();

        // Get the next value.
        let next = Counter::next(&counters, "test_counter").await.unwrap();
        assert_eq!(next, START);

        // Check the counter was incremented.
        let counter = counters
            .find_one(doc! { "_id": "test_counter" }, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(counter.next, START + 1);
    }

    #[backend_test]
    async fn poll_id_counter_bootstrap(db: Database) {
        let counters = Coll::<Counter>::from_db(&db);

        // The test database is bootstrapped with the counter already.
        let next = Counter::next(&counters, POLL_ID_COUNTER_ID).await.unwrap();
        assert_eq!(next, 1);

        // Re-running the bootstrap must not reset it.
        ensure_poll_id_counter_exists(&counters).await.unwrap();
        let next = Counter::next(&counters, POLL_ID_COUNTER_ID).await.unwrap();
        assert_eq!(next, 2);
    }
}
