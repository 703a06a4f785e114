//! Persistence for questions and their choices.
//!
//! Handlers only ever see the [`PollStore`] trait, through the [`Polls`]
//! request guard. Which implementation backs it is decided at ignition by
//! [`crate::config::StoreFairing`].

use std::ops::Deref;
use std::sync::Arc;

use rocket::{
    http::Status,
    request::{self, FromRequest, Request},
};

use crate::error::Result;
use crate::model::{
    db::{Choice, Question, QuestionCore},
    mongodb::Id,
};

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Changes to a question's choices, as produced by a validated choice formset.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChoiceChanges {
    /// Text of new choices, in submission order.
    pub added: Vec<String>,
    /// Existing choices whose text changed.
    pub edited: Vec<(Id, String)>,
    /// Existing choices marked for deletion.
    pub removed: Vec<Id>,
}

impl ChoiceChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.edited.is_empty() && self.removed.is_empty()
    }
}

/// Data access for polls.
///
/// Every operation that touches choices of a particular question is scoped
/// to that question: a choice ID belonging to another question behaves as
/// if it did not exist.
#[rocket::async_trait]
pub trait PollStore: Send + Sync {
    /// All questions, most recently published first.
    async fn questions_by_recency(&self) -> Result<Vec<Question>>;

    /// The question with the given ID, if any.
    async fn question(&self, id: Id) -> Result<Option<Question>>;

    /// All choices of the given question, in creation order.
    async fn choices_of(&self, question_id: Id) -> Result<Vec<Choice>>;

    /// The given choice, if it exists and belongs to the given question.
    async fn choice_of(&self, question_id: Id, choice_id: Id) -> Result<Option<Choice>>;

    /// Persist a question, then one choice per entry of `choices`, each
    /// pointing back at the new question.
    async fn create_question(&self, question: QuestionCore, choices: Vec<String>)
        -> Result<Question>;

    /// Replace the question's fields and apply the choice changes.
    ///
    /// Returns false iff the question does not exist, in which case nothing
    /// is changed.
    async fn update_question(
        &self,
        id: Id,
        question: QuestionCore,
        changes: ChoiceChanges,
    ) -> Result<bool>;

    /// Delete the question and all of its choices.
    ///
    /// Returns false iff the question did not exist.
    async fn delete_question(&self, id: Id) -> Result<bool>;

    /// Delete a single choice.
    ///
    /// Returns false iff the choice did not exist.
    async fn delete_choice(&self, id: Id) -> Result<bool>;

    /// Atomically add one vote to the given choice of the given question.
    ///
    /// Returns false iff no such choice exists under that question, in which
    /// case no count is changed.
    async fn record_vote(&self, question_id: Id, choice_id: Id) -> Result<bool>;
}

/// A shared handle on the configured [`PollStore`], kept in managed state.
#[derive(Clone)]
pub struct Polls(Arc<dyn PollStore>);

impl Polls {
    pub fn new<S>(store: S) -> Self
    where
        S: PollStore + 'static,
    {
        Self(Arc::new(store))
    }
}

impl Deref for Polls {
    type Target = dyn PollStore;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Polls {
    type Error = ();

    /// Get the store from managed state.
    ///
    /// Fails with a server error iff no store has been placed in managed state.
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        match req.rocket().state::<Polls>() {
            Some(polls) => request::Outcome::Success(polls.clone()),
            None => request::Outcome::Failure((Status::InternalServerError, ())),
        }
    }
}
