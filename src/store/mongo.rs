use mongodb::{
    bson::{doc, DateTime as BsonDateTime},
    options::FindOptions,
    Client, Database,
};
use rocket::futures::TryStreamExt;

use crate::error::Result;
use crate::model::{
    db::{Choice, ChoiceCore, Question, QuestionCore},
    mongodb::{Coll, Id},
};

use super::{ChoiceChanges, PollStore};

/// The production store. Multi-document writes run in a transaction, so the
/// database must be a replica set.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// A store on the named database of the given connection.
    pub fn new(client: Client, db_name: &str) -> Self {
        let db = client.database(db_name);
        Self { client, db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn questions(&self) -> Coll<Question> {
        Coll::from_db(&self.db)
    }

    fn choices(&self) -> Coll<Choice> {
        Coll::from_db(&self.db)
    }
}

#[rocket::async_trait]
impl PollStore for MongoStore {
    async fn questions_by_recency(&self) -> Result<Vec<Question>> {
        let options = FindOptions::builder()
            .sort(doc! { "pub_date": -1, "_id": -1 })
            .build();
        let questions = self
            .questions()
            .find(None, options)
            .await?
            .try_collect()
            .await?;
        Ok(questions)
    }

    async fn question(&self, id: Id) -> Result<Option<Question>> {
        Ok(self.questions().find_one(id.as_doc(), None).await?)
    }

    async fn choices_of(&self, question_id: Id) -> Result<Vec<Choice>> {
        let filter = doc! {
            "question_id": question_id,
        };
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        let choices = self
            .choices()
            .find(filter, options)
            .await?
            .try_collect()
            .await?;
        Ok(choices)
    }

    async fn choice_of(&self, question_id: Id, choice_id: Id) -> Result<Option<Choice>> {
        let filter = doc! {
            "_id": choice_id,
            "question_id": question_id,
        };
        Ok(self.choices().find_one(filter, None).await?)
    }

    async fn create_question(
        &self,
        question: QuestionCore,
        choices: Vec<String>,
    ) -> Result<Question> {
        let question = Question {
            id: Id::new(),
            question,
        };
        let new_choices = choices
            .into_iter()
            .map(|choice_text| Choice {
                id: Id::new(),
                choice: ChoiceCore::new(question.id, choice_text),
            })
            .collect::<Vec<_>>();

        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        // The question goes in first so its choices never dangle.
        self.questions()
            .insert_one_with_session(&question, None, &mut session)
            .await?;
        if !new_choices.is_empty() {
            self.choices()
                .insert_many_with_session(&new_choices, None, &mut session)
                .await?;
        }

        session.commit_transaction().await?;
        Ok(question)
    }

    async fn update_question(
        &self,
        id: Id,
        question: QuestionCore,
        changes: ChoiceChanges,
    ) -> Result<bool> {
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        // Update the question itself.
        let update = doc! {
            "$set": {
                "question_text": question.question_text,
                "pub_date": BsonDateTime::from_chrono(question.pub_date),
            }
        };
        let result = self
            .questions()
            .update_one_with_session(id.as_doc(), update, None, &mut session)
            .await?;
        if result.matched_count == 0 {
            session.abort_transaction().await?;
            return Ok(false);
        }

        // Remove choices marked for deletion.
        if !changes.removed.is_empty() {
            let filter = doc! {
                "_id": { "$in": changes.removed },
                "question_id": id,
            };
            self.choices()
                .delete_many_with_session(filter, None, &mut session)
                .await?;
        }

        // Edit choices in place.
        for (choice_id, choice_text) in changes.edited {
            let filter = doc! {
                "_id": choice_id,
                "question_id": id,
            };
            let update = doc! {
                "$set": {
                    "choice_text": choice_text,
                }
            };
            self.choices()
                .update_one_with_session(filter, update, None, &mut session)
                .await?;
        }

        // Add new choices.
        let new_choices = changes
            .added
            .into_iter()
            .map(|choice_text| Choice {
                id: Id::new(),
                choice: ChoiceCore::new(id, choice_text),
            })
            .collect::<Vec<_>>();
        if !new_choices.is_empty() {
            self.choices()
                .insert_many_with_session(&new_choices, None, &mut session)
                .await?;
        }

        session.commit_transaction().await?;
        Ok(true)
    }

    async fn delete_question(&self, id: Id) -> Result<bool> {
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        let result = self
            .questions()
            .delete_one_with_session(id.as_doc(), None, &mut session)
            .await?;
        if result.deleted_count == 0 {
            session.abort_transaction().await?;
            return Ok(false);
        }

        let filter = doc! {
            "question_id": id,
        };
        self.choices()
            .delete_many_with_session(filter, None, &mut session)
            .await?;

        session.commit_transaction().await?;
        Ok(true)
    }

    async fn delete_choice(&self, id: Id) -> Result<bool> {
        let result = self.choices().delete_one(id.as_doc(), None).await?;
        Ok(result.deleted_count == 1)
    }

    async fn record_vote(&self, question_id: Id, choice_id: Id) -> Result<bool> {
        // A single server-side `$inc`: concurrent votes cannot overwrite each other.
        let filter = doc! {
            "_id": choice_id,
            "question_id": question_id,
        };
        let update = doc! {
            "$inc": { "votes": 1 }
        };
        let result = self.choices().update_one(filter, update, None).await?;
        Ok(result.matched_count == 1)
    }
}

#[cfg(all(test, feature = "mongo-tests"))]
mod tests {
    use std::sync::Arc;

    use rocket::tokio;

    use super::*;

    #[backend_test]
    async fn create_and_list(store: MongoStore) {
        let question = store
            .create_question(
                QuestionCore::example(),
                vec!["Red".to_string(), "Blue".to_string()],
            )
            .await
            .unwrap();
        store
            .create_question(QuestionCore::example2(), vec![])
            .await
            .unwrap();

        // Newest first.
        let listed = store.questions_by_recency().await.unwrap();
        let texts = listed
            .iter()
            .map(|q| q.question_text.as_str())
            .collect::<Vec<_>>();
        assert_eq!(texts, vec!["What's up?", "Favorite color?"]);

        // Choices in creation order, linked and unvoted.
        let choices = store.choices_of(question.id).await.unwrap();
        let texts = choices
            .iter()
            .map(|c| c.choice_text.as_str())
            .collect::<Vec<_>>();
        assert_eq!(texts, vec!["Red", "Blue"]);
        assert!(choices
            .iter()
            .all(|c| c.question_id == question.id && c.votes == 0));
    }

    #[backend_test]
    async fn concurrent_votes(store: MongoStore, choices: Coll<Choice>) {
        let store = Arc::new(store);
        let question = store
            .create_question(
                QuestionCore::example(),
                vec!["Red".to_string(), "Blue".to_string()],
            )
            .await
            .unwrap();
        let listed = store.choices_of(question.id).await.unwrap();
        let (red, blue) = (listed[0].id, listed[1].id);

        let tasks = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.record_vote(question.id, blue).await })
            })
            .collect::<Vec<_>>();
        for task in tasks {
            assert!(task.await.unwrap().unwrap());
        }

        let red = choices.find_one(red.as_doc(), None).await.unwrap().unwrap();
        let blue = choices.find_one(blue.as_doc(), None).await.unwrap().unwrap();
        assert_eq!(red.votes, 0);
        assert_eq!(blue.votes, 16);
    }

    #[backend_test]
    async fn delete_cascades(store: MongoStore, choices: Coll<Choice>) {
        let question = store
            .create_question(
                QuestionCore::example(),
                vec!["Red".to_string(), "Blue".to_string()],
            )
            .await
            .unwrap();
        let other = store
            .create_question(QuestionCore::example2(), vec!["Not much".to_string()])
            .await
            .unwrap();

        assert!(store.delete_question(question.id).await.unwrap());
        assert!(!store.delete_question(question.id).await.unwrap());

        let remaining = choices.count_documents(None, None).await.unwrap();
        assert_eq!(remaining, 1);
        assert_eq!(store.choices_of(other.id).await.unwrap().len(), 1);
    }

    #[backend_test]
    async fn update_is_scoped(store: MongoStore) {
        let question = store
            .create_question(QuestionCore::example(), vec!["Red".to_string()])
            .await
            .unwrap();
        let other = store
            .create_question(QuestionCore::example2(), vec!["Not much".to_string()])
            .await
            .unwrap();
        let foreign = store.choices_of(other.id).await.unwrap()[0].id;

        // Changes naming another question's choice are ignored.
        let changes = ChoiceChanges {
            added: vec!["Green".to_string()],
            edited: vec![(foreign, "Hijacked".to_string())],
            removed: vec![foreign],
        };
        assert!(store
            .update_question(question.id, QuestionCore::example(), changes)
            .await
            .unwrap());

        let theirs = store.choices_of(other.id).await.unwrap();
        assert_eq!(theirs.len(), 1);
        assert_eq!(theirs[0].choice_text, "Not much");
        let ours = store.choices_of(question.id).await.unwrap();
        assert_eq!(ours.len(), 2);
    }
}
