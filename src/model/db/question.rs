use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core question data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionCore {
    /// The poll prompt.
    pub question_text: String,
    /// When the question was published.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub pub_date: DateTime<Utc>,
}

/// A question from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub question: QuestionCore,
}

impl Deref for Question {
    type Target = QuestionCore;

    fn deref(&self) -> &Self::Target {
        &self.question
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use chrono::TimeZone;

    use super::*;

    impl QuestionCore {
        pub fn example() -> Self {
            Self {
                question_text: "Favorite color?".to_string(),
                pub_date: Utc.with_ymd_and_hms(2023, 4, 1, 12, 0, 0).unwrap(),
            }
        }

        pub fn example2() -> Self {
            Self {
                question_text: "What's up?".to_string(),
                pub_date: Utc.with_ymd_and_hms(2023, 5, 1, 9, 30, 0).unwrap(),
            }
        }
    }
}
