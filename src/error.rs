use log::{debug, error};
use mongodb::error::Error as DbError;
use rocket::{http::Status, response::Responder};
use thiserror::Error;

use crate::logging::RequestId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// A lookup miss for the described resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Db(_) => Status::InternalServerError,
            Self::NotFound(_) => Status::NotFound,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        let id = RequestId::of(req);
        if status.class().is_server_error() {
            error!("{id} {} {}: {self}", req.method(), req.uri());
        } else {
            debug!("{id} {} {}: {self}", req.method(), req.uri());
        }
        Err(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = Error::not_found("Question 42");
        assert_eq!(err.status(), Status::NotFound);
        assert_eq!(err.to_string(), "Not found: Question 42");
    }

    #[rocket::async_test]
    async fn responds_with_status() {
        let client = rocket::local::asynchronous::Client::untracked(rocket::build())
            .await
            .unwrap();
        let req = client.get("/polls/42");
        let outcome = Error::not_found("Question 42").respond_to(&req);
        assert_eq!(outcome.err(), Some(Status::NotFound));
    }
}
