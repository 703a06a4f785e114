#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};
use rocket_dyn_templates::Template;

use crate::config::{ConfigFairing, StoreFairing};
use crate::logging::LoggerFairing;
use crate::store::Polls;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod store;

/// Build the server, with the store chosen and connected at ignition
/// according to configuration.
pub fn build() -> Rocket<Build> {
    base().attach(StoreFairing)
}

/// Build the server around an already constructed store.
pub fn rocket_for_store(polls: Polls) -> Rocket<Build> {
    base().manage(polls)
}

fn base() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .attach(LoggerFairing)
        .attach(Template::fairing())
}

/// Connect to the test database server, on a fresh database.
#[cfg(all(test, feature = "mongo-tests"))]
async fn mongo_test_store() -> store::MongoStore {
    let db_uri = std::env::var("POLLS_TEST_DB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    config::connect(&db_uri, &config::database_name(None))
        .await
        .unwrap()
}
