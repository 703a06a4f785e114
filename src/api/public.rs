use log::{debug, info};
use rocket::{form::Form, response::Redirect, Route};
use rocket_dyn_templates::Template;

use crate::error::Result;
use crate::model::{
    form::VoteSubmission,
    mongodb::Id,
    view::{DetailPage, IndexPage, ResultsPage, NO_CHOICE_SELECTED},
};
use crate::store::Polls;

use super::{common::question_by_id, Page};

pub fn routes() -> Vec<Route> {
    routes![index, detail, vote, results]
}

#[get("/polls")]
pub async fn index(polls: Polls) -> Result<Template> {
    let questions = polls.questions_by_recency().await?;
    Ok(Template::render("polls/index", IndexPage::new(&questions)))
}

#[get("/polls/<question_id>")]
pub async fn detail(question_id: Id, polls: Polls) -> Result<Template> {
    let question = question_by_id(question_id, &polls).await?;
    let choices = polls.choices_of(question_id).await?;
    Ok(Template::render(
        "polls/detail",
        DetailPage::new(&question, &choices, None),
    ))
}

#[post("/polls/<question_id>/vote", data = "<vote>")]
pub async fn vote(
    question_id: Id,
    vote: Option<Form<VoteSubmission>>,
    polls: Polls,
) -> Result<Page> {
    let question = question_by_id(question_id, &polls).await?;

    // A missing or unreadable body selects nothing. The increment is scoped
    // to this question, so a choice of another question counts as no choice
    // at all.
    let recorded = match vote.as_deref().and_then(VoteSubmission::choice_id) {
        Some(choice_id) => {
            let recorded = polls.record_vote(question_id, choice_id).await?;
            if recorded {
                info!("Recorded vote for choice {choice_id} of question {question_id}");
            }
            recorded
        }
        None => false,
    };
    if recorded {
        return Ok(Redirect::found(uri!(results(question_id))).into());
    }

    // Not an error: redisplay the voting form with a message.
    debug!("Vote for question {question_id} selected no valid choice");
    let choices = polls.choices_of(question_id).await?;
    Ok(Template::render(
        "polls/detail",
        DetailPage::new(&question, &choices, Some(NO_CHOICE_SELECTED)),
    )
    .into())
}

#[get("/polls/<question_id>/results")]
pub async fn results(question_id: Id, polls: Polls) -> Result<Template> {
    let question = question_by_id(question_id, &polls).await?;
    let choices = polls.choices_of(question_id).await?;
    Ok(Template::render(
        "polls/results",
        ResultsPage::new(&question, &choices),
    ))
}
