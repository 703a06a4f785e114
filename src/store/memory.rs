use std::collections::BTreeMap;

use rocket::tokio::sync::RwLock;

use crate::error::Result;
use crate::model::{
    db::{Choice, ChoiceCore, Question, QuestionCore},
    mongodb::Id,
};

use super::{ChoiceChanges, PollStore};

#[derive(Debug, Default)]
struct Tables {
    questions: BTreeMap<Id, QuestionCore>,
    choices: BTreeMap<Id, ChoiceCore>,
}

impl Tables {
    fn choices_of(&self, question_id: Id) -> impl Iterator<Item = (&Id, &ChoiceCore)> {
        self.choices
            .iter()
            .filter(move |(_, choice)| choice.question_id == question_id)
    }
}

/// An in-process store. Each operation holds the lock for its whole
/// duration, so every operation is atomic with respect to the others.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl PollStore for MemoryStore {
    async fn questions_by_recency(&self) -> Result<Vec<Question>> {
        let tables = self.tables.read().await;
        let mut questions = tables
            .questions
            .iter()
            .map(|(id, question)| Question {
                id: *id,
                question: question.clone(),
            })
            .collect::<Vec<_>>();
        questions.sort_by(|a, b| {
            b.pub_date
                .cmp(&a.pub_date)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(questions)
    }

    async fn question(&self, id: Id) -> Result<Option<Question>> {
        let tables = self.tables.read().await;
        Ok(tables.questions.get(&id).map(|question| Question {
            id,
            question: question.clone(),
        }))
    }

    async fn choices_of(&self, question_id: Id) -> Result<Vec<Choice>> {
        let tables = self.tables.read().await;
        Ok(tables
            .choices_of(question_id)
            .map(|(id, choice)| Choice {
                id: *id,
                choice: choice.clone(),
            })
            .collect())
    }

    async fn choice_of(&self, question_id: Id, choice_id: Id) -> Result<Option<Choice>> {
        let tables = self.tables.read().await;
        Ok(tables
            .choices
            .get(&choice_id)
            .filter(|choice| choice.question_id == question_id)
            .map(|choice| Choice {
                id: choice_id,
                choice: choice.clone(),
            }))
    }

    async fn create_question(
        &self,
        question: QuestionCore,
        choices: Vec<String>,
    ) -> Result<Question> {
        let mut tables = self.tables.write().await;
        let id = Id::new();
        tables.questions.insert(id, question.clone());
        for choice_text in choices {
            tables
                .choices
                .insert(Id::new(), ChoiceCore::new(id, choice_text));
        }
        Ok(Question { id, question })
    }

    async fn update_question(
        &self,
        id: Id,
        question: QuestionCore,
        changes: ChoiceChanges,
    ) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.questions.get_mut(&id) {
            Some(existing) => *existing = question,
            None => return Ok(false),
        }

        for choice_id in changes.removed {
            if tables
                .choices
                .get(&choice_id)
                .map_or(false, |choice| choice.question_id == id)
            {
                tables.choices.remove(&choice_id);
            }
        }
        for (choice_id, choice_text) in changes.edited {
            if let Some(choice) = tables
                .choices
                .get_mut(&choice_id)
                .filter(|choice| choice.question_id == id)
            {
                choice.choice_text = choice_text;
            }
        }
        for choice_text in changes.added {
            tables
                .choices
                .insert(Id::new(), ChoiceCore::new(id, choice_text));
        }
        Ok(true)
    }

    async fn delete_question(&self, id: Id) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.questions.remove(&id).is_none() {
            return Ok(false);
        }
        tables.choices.retain(|_, choice| choice.question_id != id);
        Ok(true)
    }

    async fn delete_choice(&self, id: Id) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.choices.remove(&id).is_some())
    }

    async fn record_vote(&self, question_id: Id, choice_id: Id) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables
            .choices
            .get_mut(&choice_id)
            .filter(|choice| choice.question_id == question_id)
        {
            Some(choice) => {
                choice.votes += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
