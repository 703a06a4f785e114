use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core choice data. A choice always belongs to exactly one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceCore {
    /// The owning question.
    pub question_id: Id,
    pub choice_text: String,
    pub votes: u32,
}

impl ChoiceCore {
    /// A fresh choice with no votes.
    pub fn new(question_id: Id, choice_text: String) -> Self {
        Self {
            question_id,
            choice_text,
            votes: 0,
        }
    }
}

/// A choice from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub choice: ChoiceCore,
}

impl Deref for Choice {
    type Target = ChoiceCore;

    fn deref(&self) -> &Self::Target {
        &self.choice
    }
}
