// src/store/mod.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::PollError;
use crate::models::{Choice, ChoiceId, ChoiceTally, NewQuestion, Question, QuestionId, Vote};

#[cfg(test)]
mod contract;
mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Result of writing a user's vote for a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteWrite {
    pub vote: Vote,
    /// `true` when no vote existed for this (user, question) before the write.
    pub created: bool,
}

/// Persistence for questions, choices and votes.
///
/// Implementations keep at most one vote per (user, question) and make
/// `upsert_vote` / `delete_vote` atomic with respect to concurrent callers.
#[async_trait]
pub trait PollStore: Send + Sync {
    async fn create_question(&self, question: NewQuestion) -> Result<Question, PollError>;

    async fn add_choice(&self, question_id: QuestionId, choice_text: &str) -> Result<Choice, PollError>;

    /// Removes the question along with its choices and their votes.
    async fn delete_question(&self, question_id: QuestionId) -> Result<bool, PollError>;

    async fn get_question(&self, question_id: QuestionId) -> Result<Option<Question>, PollError>;

    /// Questions with `pub_date <= now`, newest first.
    async fn published_questions(&self, now: DateTime<Utc>) -> Result<Vec<Question>, PollError>;

    async fn choices(&self, question_id: QuestionId) -> Result<Vec<Choice>, PollError>;

    /// The choice with this id, only if it belongs to `question_id`.
    async fn find_choice(
        &self,
        question_id: QuestionId,
        choice_id: ChoiceId,
    ) -> Result<Option<Choice>, PollError>;

    async fn user_vote(&self, user_id: Uuid, question_id: QuestionId) -> Result<Option<Vote>, PollError>;

    /// Points the user's vote for the question at `choice_id`, creating it if needed.
    async fn upsert_vote(
        &self,
        user_id: Uuid,
        question_id: QuestionId,
        choice_id: ChoiceId,
    ) -> Result<VoteWrite, PollError>;

    /// Deletes the user's vote for the question and returns it, if there was one.
    async fn delete_vote(&self, user_id: Uuid, question_id: QuestionId) -> Result<Option<Vote>, PollError>;

    /// Every choice of the question with its counted votes, in choice order.
    async fn tally(&self, question_id: QuestionId) -> Result<Vec<ChoiceTally>, PollError>;
}
