//! Validation of submitted HTML forms.
//!
//! Raw submissions are parsed leniently by Rocket into the `*Submission`
//! types here, which never reject a well-formed body. The `validate`
//! functions then turn them into either clean values or a [`FieldErrors`]
//! map keyed by input name, so the form can be redisplayed with each message
//! next to the input it belongs to.

use std::collections::BTreeMap;

use rocket::FromForm;
use serde::Serialize;

use crate::model::{db::Choice, db::QuestionCore, mongodb::Id};
use crate::store::ChoiceChanges;

pub mod choice;
pub mod question;

pub use choice::ChoiceRow;

/// Maximum length, in characters, of question and choice text.
pub const MAX_TEXT_LENGTH: usize = 200;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_DATETIME: &str = "Enter a valid date/time.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const DUPLICATE_ID: &str = "Please correct the duplicate data for id.";

/// Error messages keyed by the name of the input they refer to.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against the named input.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Messages recorded against the named input, if any.
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names of all inputs that have errors.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }
}

/// Combine two independent validations, keeping the errors of both.
pub fn both<A, B>(
    a: Result<A, FieldErrors>,
    b: Result<B, FieldErrors>,
) -> Result<(A, B), FieldErrors> {
    match (a, b) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (Err(errors), Ok(_)) | (Ok(_), Err(errors)) => Err(errors),
        (Err(mut errors), Err(more)) => {
            errors.merge(more);
            Err(errors)
        }
    }
}

/// A question form together with its choice rows.
#[derive(Debug, Default, Clone, FromForm)]
pub struct QuestionSubmission {
    pub question_text: Option<String>,
    pub pub_date: Option<String>,
    pub choices: Vec<ChoiceRow>,
}

impl QuestionSubmission {
    /// Validate the question fields and the choice rows together.
    ///
    /// `existing` is the current set of choices of the question being
    /// edited; it is empty when creating a question.
    pub fn validate(&self, existing: &[Choice]) -> Result<(QuestionCore, ChoiceChanges), FieldErrors> {
        both(
            question::validate(self.question_text.as_deref(), self.pub_date.as_deref()),
            choice::validate(&self.choices, existing),
        )
    }
}

/// The voting form on the detail page.
#[derive(Debug, Default, Clone, FromForm)]
pub struct VoteSubmission {
    pub choice: Option<String>,
}

impl VoteSubmission {
    /// The selected choice, if one was selected and it is a well-formed ID.
    pub fn choice_id(&self) -> Option<Id> {
        self.choice.as_deref()?.trim().parse().ok()
    }
}

/// Check a text value against [`MAX_TEXT_LENGTH`].
fn check_length(value: &str) -> Result<(), String> {
    let length = value.chars().count();
    if length > MAX_TEXT_LENGTH {
        Err(format!(
            "Ensure this value has at most {MAX_TEXT_LENGTH} characters (it has {length})."
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_merges_errors() {
        let mut first = FieldErrors::new();
        first.add("question_text", REQUIRED);
        let mut second = FieldErrors::new();
        second.add("choices[0].id", INVALID_CHOICE);
        second.add("question_text", "Another problem.");

        let errors = both::<(), ()>(Err(first), Err(second)).unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["choices[0].id", "question_text"]
        );
        assert_eq!(errors.get("question_text").len(), 2);
        assert!(errors.get("pub_date").is_empty());
    }

    #[test]
    fn both_keeps_values() {
        let ok = both(Ok::<_, FieldErrors>(1), Ok::<_, FieldErrors>("two"));
        assert_eq!(ok, Ok((1, "two")));
    }

    #[test]
    fn vote_choice_id() {
        let id = Id::new();
        let vote = VoteSubmission {
            choice: Some(id.to_string()),
        };
        assert_eq!(vote.choice_id(), Some(id));

        assert_eq!(VoteSubmission { choice: None }.choice_id(), None);
        let garbage = VoteSubmission {
            choice: Some("7".to_string()),
        };
        assert_eq!(garbage.choice_id(), None);
    }

    #[test]
    fn length_counts_characters() {
        assert!(check_length(&"é".repeat(MAX_TEXT_LENGTH)).is_ok());
        let message = check_length(&"x".repeat(MAX_TEXT_LENGTH + 1)).unwrap_err();
        assert_eq!(
            message,
            "Ensure this value has at most 200 characters (it has 201)."
        );
    }
}
