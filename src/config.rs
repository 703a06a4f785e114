use log::{error, info};
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::model::mongodb::ensure_indexes_exist;
use crate::store::{MemoryStore, MongoStore, Polls};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_extra_choice_forms")]
    extra_choice_forms: usize,
}

impl Config {
    /// Number of blank choice rows offered when creating a question.
    pub fn extra_choice_forms(&self) -> usize {
        self.extra_choice_forms
    }
}

fn default_extra_choice_forms() -> usize {
    3
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the store fairing and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Which [`crate::store::PollStore`] backs the application.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    MongoDb,
    Memory,
}

/// Configuration for the store.
#[derive(Deserialize)]
struct StoreConfig {
    #[serde(default)]
    store: StoreKind,
    // secrets
    db_uri: Option<String>,
    db_name: Option<String>,
}

/// A fairing that loads the store config, connects to the database if one is
/// configured, performs any setup necessary, and places a [`Polls`] handle
/// into managed state.
pub struct StoreFairing;

#[rocket::async_trait]
impl Fairing for StoreFairing {
    fn info(&self) -> Info {
        Info {
            name: "Poll store",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<StoreConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load store config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        let polls = match config.store {
            StoreKind::Memory => {
                info!("Using in-memory store; nothing will be persisted");
                Polls::new(MemoryStore::new())
            }
            StoreKind::MongoDb => {
                let Some(db_uri) = config.db_uri else {
                    error!("`db_uri` must be set when `store` is \"mongodb\"");
                    return Err(rocket);
                };
                let db_name = database_name(config.db_name);
                match connect(&db_uri, &db_name).await {
                    Ok(store) => Polls::new(store),
                    Err(e) => {
                        error!("Failed to connect to database: {e}");
                        return Err(rocket);
                    }
                }
            }
        };

        // Manage the state.
        Ok(rocket.manage(polls))
    }
}

/// Connect to MongoDB and ensure the required indexes exist.
pub async fn connect(db_uri: &str, db_name: &str) -> mongodb::error::Result<MongoStore> {
    info!("Loaded database config, connecting...");
    let client = MongoClient::with_uri_str(db_uri).await?;
    ensure_indexes_exist(&client.database(db_name)).await?;
    info!("...database connection online!");
    Ok(MongoStore::new(client, db_name))
}

/// Get the name of the database to use (production version).
#[cfg(not(test))]
pub fn database_name(configured: Option<String>) -> String {
    configured.unwrap_or_else(|| "polls".to_string())
}

/// Get the name of the database to use (test version).
/// Use a random name to avoid collisions between tests.
#[cfg(test)]
pub fn database_name(_configured: Option<String>) -> String {
    let random: u32 = rand::random();
    let db = format!("test{random}");
    info!("Using database {db}");
    db
}

#[cfg(test)]
mod tests {
    use rocket::{
        error::ErrorKind,
        figment::{providers::Serialized, Figment},
    };

    use super::*;

    #[test]
    fn defaults() {
        let figment = Figment::new();
        let config = figment.extract::<Config>().unwrap();
        assert_eq!(config.extra_choice_forms(), 3);
        let store = figment.extract::<StoreConfig>().unwrap();
        assert_eq!(store.store, StoreKind::MongoDb);
        assert!(store.db_uri.is_none());
    }

    #[test]
    fn memory_store_selected() {
        let figment = Figment::new()
            .merge(Serialized::default("store", "memory"))
            .merge(Serialized::default("extra_choice_forms", 5));
        let store = figment.extract::<StoreConfig>().unwrap();
        assert_eq!(store.store, StoreKind::Memory);
        assert_eq!(figment.extract::<Config>().unwrap().extra_choice_forms(), 5);
    }

    #[test]
    fn test_databases_are_distinct() {
        let first = database_name(Some("polls".to_string()));
        assert!(first.starts_with("test"));
        // Vanishingly unlikely to collide.
        assert_ne!(first, database_name(None));
    }

    #[rocket::async_test]
    async fn missing_db_uri_aborts_ignition() {
        let figment = Figment::from(rocket::Config::default()).merge(("store", "mongodb"));
        let rocket = rocket::custom(figment).attach(StoreFairing);
        let err = rocket.ignite().await.unwrap_err();
        match err.kind() {
            ErrorKind::FailedFairings(failed) => {
                assert_eq!(failed.len(), 1);
                assert_eq!(failed[0].name, "Poll store");
            }
            other => panic!("unexpected ignition error: {other:?}"),
        }
    }

    #[rocket::async_test]
    async fn memory_store_is_managed() {
        let figment = Figment::from(rocket::Config::default()).merge(("store", "memory"));
        let rocket = rocket::custom(figment)
            .attach(StoreFairing)
            .ignite()
            .await
            .unwrap();
        assert!(rocket.state::<Polls>().is_some());
    }
}
