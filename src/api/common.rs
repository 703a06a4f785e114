use crate::error::{Error, Result};
use crate::model::{
    db::{Choice, Question},
    mongodb::Id,
};
use crate::store::Polls;

/// Return the question with the given ID, or a not-found error.
pub async fn question_by_id(question_id: Id, polls: &Polls) -> Result<Question> {
    polls
        .question(question_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Question {question_id}")))
}

/// Return the given choice of the given question, or a not-found error.
pub async fn choice_of_question(question_id: Id, choice_id: Id, polls: &Polls) -> Result<Choice> {
    polls
        .choice_of(question_id, choice_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Choice {choice_id} of question {question_id}")))
}
