use rocket::{response::Redirect, Responder, Route};
use rocket_dyn_templates::Template;

mod common;
mod manage;
mod public;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(public::routes());
    routes.extend(manage::routes());
    routes
}

/// The outcome of a handler that either shows a page or moves on.
#[derive(Responder)]
pub enum Page {
    Render(Template),
    Redirect(Redirect),
}

impl From<Template> for Page {
    fn from(template: Template) -> Self {
        Self::Render(template)
    }
}

impl From<Redirect> for Page {
    fn from(redirect: Redirect) -> Self {
        Self::Redirect(redirect)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use rocket::{
        http::RawStr,
        local::asynchronous::{Client, LocalResponse},
    };

    use crate::model::db::{Choice, Question, QuestionCore};
    use crate::store::Polls;

    /// The store behind the client's Rocket instance.
    pub fn polls(client: &Client) -> &Polls {
        client.rocket().state::<Polls>().unwrap()
    }

    /// Insert the example question, with choices "Red" and "Blue" in that order.
    pub async fn example_question(client: &Client) -> (Question, Vec<Choice>) {
        let store = polls(client);
        let question = store
            .create_question(
                QuestionCore::example(),
                vec!["Red".to_string(), "Blue".to_string()],
            )
            .await
            .unwrap();
        let choices = store.choices_of(question.id).await.unwrap();
        (question, choices)
    }

    /// Encode fields as an `application/x-www-form-urlencoded` body.
    pub fn form_body(fields: &[(&str, &str)]) -> String {
        fields
            .iter()
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    RawStr::new(name).percent_encode(),
                    RawStr::new(value).percent_encode()
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn location(response: &LocalResponse<'_>) -> Option<String> {
        response.headers().get_one("Location").map(str::to_string)
    }

    pub async fn body(response: LocalResponse<'_>) -> String {
        response.into_string().await.unwrap_or_default()
    }
}
