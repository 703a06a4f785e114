//! Template contexts.
//!
//! Everything here serialises to plain strings and numbers, so IDs appear in
//! templates as their hex form rather than as BSON's extended JSON.

use serde::Serialize;

use crate::model::{
    db::{Choice, Question},
    form::{choice::field_name, question::INPUT_FORMAT, ChoiceRow, FieldErrors, QuestionSubmission},
};

/// Message shown on the detail page when a vote names no valid choice.
pub const NO_CHOICE_SELECTED: &str = "You didn't select a choice.";

const DISPLAY_FORMAT: &str = "%B %-d, %Y, %H:%M UTC";

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub question_text: String,
    pub pub_date: String,
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id.to_string(),
            question_text: question.question_text.clone(),
            pub_date: question.pub_date.format(DISPLAY_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChoiceView {
    pub id: String,
    pub choice_text: String,
    pub votes: u32,
}

impl From<&Choice> for ChoiceView {
    fn from(choice: &Choice) -> Self {
        Self {
            id: choice.id.to_string(),
            choice_text: choice.choice_text.clone(),
            votes: choice.votes,
        }
    }
}

fn choice_views(choices: &[Choice]) -> Vec<ChoiceView> {
    choices.iter().map(ChoiceView::from).collect()
}

#[derive(Debug, Serialize)]
pub struct IndexPage {
    pub questions: Vec<QuestionView>,
}

impl IndexPage {
    pub fn new(questions: &[Question]) -> Self {
        Self {
            questions: questions.iter().map(QuestionView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DetailPage {
    pub question: QuestionView,
    pub choices: Vec<ChoiceView>,
    pub error_message: Option<&'static str>,
}

impl DetailPage {
    pub fn new(question: &Question, choices: &[Choice], error_message: Option<&'static str>) -> Self {
        Self {
            question: question.into(),
            choices: choice_views(choices),
            error_message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResultsPage {
    pub question: QuestionView,
    pub choices: Vec<ChoiceView>,
    pub total_votes: u64,
}

impl ResultsPage {
    pub fn new(question: &Question, choices: &[Choice]) -> Self {
        Self {
            question: question.into(),
            choices: choice_views(choices),
            total_votes: choices.iter().map(|choice| u64::from(choice.votes)).sum(),
        }
    }
}

/// A single input with its current value and any errors against it.
#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub name: String,
    pub value: String,
    pub errors: Vec<String>,
}

impl FieldView {
    fn new(name: String, value: Option<&str>, errors: &FieldErrors) -> Self {
        Self {
            errors: errors.get(&name).to_vec(),
            value: value.unwrap_or_default().to_string(),
            name,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChoiceRowView {
    /// Present for rows of existing choices.
    pub id: Option<FieldView>,
    pub choice_text: FieldView,
    pub delete_name: String,
    pub delete: bool,
}

impl ChoiceRowView {
    fn new(index: usize, row: &ChoiceRow, errors: &FieldErrors) -> Self {
        let id_name = field_name(index, "id");
        let has_id = row.id.as_deref().map_or(false, |id| !id.trim().is_empty())
            || !errors.get(&id_name).is_empty();
        Self {
            id: has_id.then(|| FieldView::new(id_name, row.id.as_deref(), errors)),
            choice_text: FieldView::new(
                field_name(index, "choice_text"),
                row.choice_text.as_deref(),
                errors,
            ),
            delete_name: field_name(index, "delete"),
            delete: row.delete,
        }
    }
}

/// The question form with its choice formset, used for both create and update.
#[derive(Debug, Serialize)]
pub struct QuestionFormPage {
    /// The question being edited; absent when creating.
    pub question: Option<QuestionView>,
    pub question_text: FieldView,
    pub pub_date: FieldView,
    pub choices: Vec<ChoiceRowView>,
    pub has_errors: bool,
}

impl QuestionFormPage {
    pub fn new(question: Option<&Question>, form: &QuestionSubmission, errors: &FieldErrors) -> Self {
        Self {
            question: question.map(QuestionView::from),
            question_text: FieldView::new(
                "question_text".to_string(),
                form.question_text.as_deref(),
                errors,
            ),
            pub_date: FieldView::new("pub_date".to_string(), form.pub_date.as_deref(), errors),
            choices: form
                .choices
                .iter()
                .enumerate()
                .map(|(index, row)| ChoiceRowView::new(index, row, errors))
                .collect(),
            has_errors: !errors.is_empty(),
        }
    }

    /// An unbound form for a new question, with `extra` blank choice rows.
    pub fn blank(extra: usize) -> Self {
        let form = QuestionSubmission {
            choices: vec![ChoiceRow::blank(); extra],
            ..Default::default()
        };
        Self::new(None, &form, &FieldErrors::new())
    }

    /// A form pre-filled from an existing question, with one blank row for a
    /// new choice.
    pub fn for_question(question: &Question, choices: &[Choice]) -> Self {
        let mut rows = choices.iter().map(ChoiceRow::existing).collect::<Vec<_>>();
        rows.push(ChoiceRow::blank());
        let form = QuestionSubmission {
            question_text: Some(question.question_text.clone()),
            pub_date: Some(question.pub_date.format(INPUT_FORMAT).to_string()),
            choices: rows,
        };
        Self::new(Some(question), &form, &FieldErrors::new())
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteQuestionPage {
    pub question: QuestionView,
    pub choice_count: usize,
}

impl DeleteQuestionPage {
    pub fn new(question: &Question, choices: &[Choice]) -> Self {
        Self {
            question: question.into(),
            choice_count: choices.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteChoicePage {
    pub question: QuestionView,
    pub choice: ChoiceView,
}

impl DeleteChoicePage {
    pub fn new(question: &Question, choice: &Choice) -> Self {
        Self {
            question: question.into(),
            choice: choice.into(),
        }
    }
}
