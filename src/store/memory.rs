// src/store/memory.rs
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PollStore, VoteWrite};
use crate::error::PollError;
use crate::models::{
    validate_text, Choice, ChoiceId, ChoiceTally, NewQuestion, Question, QuestionId, Vote, VoteId,
};

/// Process-local store. Every operation holds the lock for its whole duration,
/// so read-then-write sequences are atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    questions: BTreeMap<QuestionId, Question>,
    choices: BTreeMap<ChoiceId, Choice>,
    votes: BTreeMap<VoteId, Vote>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn vote_for(&self, user_id: Uuid, question_id: QuestionId) -> Option<&Vote> {
        self.votes.values().find(|vote| {
            vote.user_id == user_id
                && self
                    .choices
                    .get(&vote.choice_id)
                    .is_some_and(|choice| choice.question_id == question_id)
        })
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of votes held for the question across all of its choices.
    pub async fn vote_count(&self, question_id: QuestionId) -> usize {
        let tables = self.inner.read().await;
        tables
            .votes
            .values()
            .filter(|vote| {
                tables
                    .choices
                    .get(&vote.choice_id)
                    .is_some_and(|choice| choice.question_id == question_id)
            })
            .count()
    }
}

#[async_trait]
impl PollStore for MemoryStore {
    async fn create_question(&self, question: NewQuestion) -> Result<Question, PollError> {
        question.validate()?;

        let mut tables = self.inner.write().await;
        let id = tables.next_id();
        let question = Question {
            id,
            question_text: question.question_text,
            pub_date: question.pub_date,
            end_date: question.end_date,
        };
        tables.questions.insert(id, question.clone());

        Ok(question)
    }

    async fn add_choice(&self, question_id: QuestionId, choice_text: &str) -> Result<Choice, PollError> {
        validate_text("choice_text", choice_text)?;

        let mut tables = self.inner.write().await;
        if !tables.questions.contains_key(&question_id) {
            return Err(PollError::NotFound);
        }

        let id = tables.next_id();
        let choice = Choice {
            id,
            question_id,
            choice_text: choice_text.to_string(),
        };
        tables.choices.insert(id, choice.clone());

        Ok(choice)
    }

    async fn delete_question(&self, question_id: QuestionId) -> Result<bool, PollError> {
        let mut tables = self.inner.write().await;
        if tables.questions.remove(&question_id).is_none() {
            return Ok(false);
        }

        let Tables { choices, votes, .. } = &mut *tables;
        choices.retain(|_, choice| choice.question_id != question_id);
        votes.retain(|_, vote| choices.contains_key(&vote.choice_id));

        Ok(true)
    }

    async fn get_question(&self, question_id: QuestionId) -> Result<Option<Question>, PollError> {
        Ok(self.inner.read().await.questions.get(&question_id).cloned())
    }

    async fn published_questions(&self, now: DateTime<Utc>) -> Result<Vec<Question>, PollError> {
        let tables = self.inner.read().await;
        let mut questions: Vec<Question> = tables
            .questions
            .values()
            .filter(|question| question.pub_date <= now)
            .cloned()
            .collect();
        questions.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));

        Ok(questions)
    }

    async fn choices(&self, question_id: QuestionId) -> Result<Vec<Choice>, PollError> {
        Ok(self
            .inner
            .read()
            .await
            .choices
            .values()
            .filter(|choice| choice.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn find_choice(
        &self,
        question_id: QuestionId,
        choice_id: ChoiceId,
    ) -> Result<Option<Choice>, PollError> {
        Ok(self
            .inner
            .read()
            .await
            .choices
            .get(&choice_id)
            .filter(|choice| choice.question_id == question_id)
            .cloned())
    }

    async fn user_vote(&self, user_id: Uuid, question_id: QuestionId) -> Result<Option<Vote>, PollError> {
        Ok(self.inner.read().await.vote_for(user_id, question_id).cloned())
    }

    async fn upsert_vote(
        &self,
        user_id: Uuid,
        question_id: QuestionId,
        choice_id: ChoiceId,
    ) -> Result<VoteWrite, PollError> {
        let mut tables = self.inner.write().await;

        match tables.choices.get(&choice_id) {
            Some(choice) if choice.question_id == question_id => {}
            _ => return Err(PollError::InvalidSelection),
        }

        let existing = tables.vote_for(user_id, question_id).map(|vote| vote.id);
        if let Some(vote) = existing.and_then(|id| tables.votes.get_mut(&id)) {
            vote.choice_id = choice_id;

            return Ok(VoteWrite {
                vote: vote.clone(),
                created: false,
            });
        }

        let id = tables.next_id();
        let vote = Vote {
            id,
            choice_id,
            user_id,
        };
        tables.votes.insert(id, vote.clone());

        Ok(VoteWrite { vote, created: true })
    }

    async fn delete_vote(&self, user_id: Uuid, question_id: QuestionId) -> Result<Option<Vote>, PollError> {
        let mut tables = self.inner.write().await;
        let Some(id) = tables.vote_for(user_id, question_id).map(|vote| vote.id) else {
            return Ok(None);
        };

        Ok(tables.votes.remove(&id))
    }

    async fn tally(&self, question_id: QuestionId) -> Result<Vec<ChoiceTally>, PollError> {
        let tables = self.inner.read().await;

        Ok(tables
            .choices
            .values()
            .filter(|choice| choice.question_id == question_id)
            .map(|choice| ChoiceTally {
                choice: choice.clone(),
                votes: tables
                    .votes
                    .values()
                    .filter(|vote| vote.choice_id == choice.id)
                    .count() as i64,
            })
            .collect())
    }
}
