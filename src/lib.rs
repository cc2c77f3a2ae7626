#[macro_use]
extern crate log;
#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use config::Config;

use rocket::{Build, Rocket};

/// Assemble the server: configuration, database connection, request logging,
/// and routes.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(config::ConfigFairing)
        .attach(config::DatabaseFairing)
        .attach(logging::LoggerFairing)
        .mount("/", api::routes())
}

/// Connect to the test database server configured via `db_uri`.
#[cfg(test)]
pub(crate) async fn db_client() -> mongodb::Client {
    log4rs_test_utils::test_logging::init_logging_once_for(["polls_backend"], None, None);
    let db_uri = rocket::build()
        .figment()
        .extract_inner::<String>("db_uri")
        .expect("`db_uri` not set");
    mongodb::Client::with_uri_str(&db_uri)
        .await
        .expect("Could not connect to the test database")
}

/// A random database name, so concurrent tests don't collide.
#[cfg(test)]
pub(crate) fn database() -> String {
    let random: u32 = rand::random();
    format!("test{random}")
}

/// Build a rocket instance against the given test database, performing the
/// same bootstrap the database fairing does in production (minus the
/// superuser: tests insert the accounts they need).
#[cfg(test)]
pub(crate) async fn rocket_for_db(client: mongodb::Client, db_name: &str) -> Rocket<Build> {
    use model::mongodb::{ensure_indexes_exist, ensure_poll_id_counter_exists, Coll};

    let db = client.database(db_name);
    ensure_indexes_exist(&db).await.unwrap();
    ensure_poll_id_counter_exists(&Coll::from_db(&db))
        .await
        .unwrap();

    rocket::build()
        .attach(config::ConfigFairing)
        .attach(logging::LoggerFairing)
        .manage(client)
        .manage(db)
        .mount("/", api::routes())
}
