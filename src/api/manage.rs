use log::{debug, info};
use rocket::{form::Form, response::Redirect, Route, State};
use rocket_dyn_templates::Template;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    form::QuestionSubmission,
    mongodb::Id,
    view::{DeleteChoicePage, DeleteQuestionPage, QuestionFormPage},
};
use crate::store::Polls;

use super::{
    common::{choice_of_question, question_by_id},
    public, Page,
};

pub fn routes() -> Vec<Route> {
    routes![
        create_question_form,
        create_question,
        update_question_form,
        update_question,
        delete_question_confirm,
        delete_question,
        delete_choice_confirm,
        delete_choice,
    ]
}

#[get("/polls/create")]
pub async fn create_question_form(config: &State<Config>) -> Template {
    Template::render(
        "polls/create_question",
        QuestionFormPage::blank(config.extra_choice_forms()),
    )
}

#[post("/polls/create", data = "<form>")]
pub async fn create_question(
    form: Option<Form<QuestionSubmission>>,
    polls: Polls,
) -> Result<Page> {
    // A missing body is an empty submission, so it fails validation.
    let form = form.map(Form::into_inner).unwrap_or_default();
    let (question, changes) = match form.validate(&[]) {
        Ok(valid) => valid,
        Err(errors) => {
            debug!("Rejected new question: errors on {:?}", errors.fields().collect::<Vec<_>>());
            return Ok(Template::render(
                "polls/create_question",
                QuestionFormPage::new(None, &form, &errors),
            )
            .into());
        }
    };

    let choice_count = changes.added.len();
    let question = polls.create_question(question, changes.added).await?;
    info!("Created question {} with {choice_count} choices", question.id);

    Ok(Redirect::found(uri!(public::detail(question.id))).into())
}

#[get("/polls/<question_id>/update")]
pub async fn update_question_form(question_id: Id, polls: Polls) -> Result<Template> {
    let question = question_by_id(question_id, &polls).await?;
    let choices = polls.choices_of(question_id).await?;
    Ok(Template::render(
        "polls/update_question",
        QuestionFormPage::for_question(&question, &choices),
    ))
}

#[post("/polls/<question_id>/update", data = "<form>")]
pub async fn update_question(
    question_id: Id,
    form: Option<Form<QuestionSubmission>>,
    polls: Polls,
) -> Result<Page> {
    let question = question_by_id(question_id, &polls).await?;
    let form = form.map(Form::into_inner).unwrap_or_default();
    let existing = polls.choices_of(question_id).await?;

    let (fields, changes) = match form.validate(&existing) {
        Ok(valid) => valid,
        Err(errors) => {
            debug!(
                "Rejected update to question {question_id}: errors on {:?}",
                errors.fields().collect::<Vec<_>>()
            );
            return Ok(Template::render(
                "polls/update_question",
                QuestionFormPage::new(Some(&question), &form, &errors),
            )
            .into());
        }
    };

    let summary = format!(
        "{} added, {} edited, {} removed",
        changes.added.len(),
        changes.edited.len(),
        changes.removed.len()
    );
    // The question may have been deleted since we looked it up.
    if !polls.update_question(question_id, fields, changes).await? {
        return Err(Error::not_found(format!("Question {question_id}")));
    }
    info!("Updated question {question_id}: choices {summary}");

    Ok(Redirect::found(uri!(public::detail(question_id))).into())
}

#[get("/polls/<question_id>/delete")]
pub async fn delete_question_confirm(question_id: Id, polls: Polls) -> Result<Template> {
    let question = question_by_id(question_id, &polls).await?;
    let choices = polls.choices_of(question_id).await?;
    Ok(Template::render(
        "polls/delete_question",
        DeleteQuestionPage::new(&question, &choices),
    ))
}

#[post("/polls/<question_id>/delete")]
pub async fn delete_question(question_id: Id, polls: Polls) -> Result<Redirect> {
    if !polls.delete_question(question_id).await? {
        return Err(Error::not_found(format!("Question {question_id}")));
    }
    info!("Deleted question {question_id} and its choices");

    Ok(Redirect::found(uri!(public::index)))
}

#[get("/polls/<question_id>/choices/<choice_id>/delete")]
pub async fn delete_choice_confirm(
    question_id: Id,
    choice_id: Id,
    polls: Polls,
) -> Result<Template> {
    let question = question_by_id(question_id, &polls).await?;
    let choice = choice_of_question(question_id, choice_id, &polls).await?;
    Ok(Template::render(
        "polls/delete_choice",
        DeleteChoicePage::new(&question, &choice),
    ))
}

#[post("/polls/<question_id>/choices/<choice_id>/delete")]
pub async fn delete_choice(question_id: Id, choice_id: Id, polls: Polls) -> Result<Redirect> {
    question_by_id(question_id, &polls).await?;
    choice_of_question(question_id, choice_id, &polls).await?;

    if !polls.delete_choice(choice_id).await? {
        return Err(Error::not_found(format!("Choice {choice_id}")));
    }
    info!("Deleted choice {choice_id} of question {question_id}");

    Ok(Redirect::found(uri!(update_question_form(question_id))))
}
