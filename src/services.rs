// src/services.rs
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::PollError;
use crate::models::{Choice, ChoiceTally, Question, QuestionId, User};
use crate::store::PollStore;

#[derive(Debug, Clone, Serialize)]
pub struct QuestionDetail {
    pub question: Question,
    pub choices: Vec<Choice>,
    /// The choice the requesting user currently has a vote on, if any.
    pub marked_choice: Option<Choice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionResults {
    pub question: Question,
    pub choices: Vec<ChoiceTally>,
}

/// Published questions, most recent first.
pub async fn list_published<S>(store: &S, now: DateTime<Utc>) -> Result<Vec<Question>, PollError>
where
    S: PollStore + ?Sized,
{
    store.published_questions(now).await
}

/// The voting form for a question. Only available while the question can be
/// voted on.
pub async fn get_detail<S>(
    store: &S,
    question_id: QuestionId,
    user: Option<&User>,
    now: DateTime<Utc>,
) -> Result<QuestionDetail, PollError>
where
    S: PollStore + ?Sized,
{
    let question = store
        .get_question(question_id)
        .await?
        .ok_or(PollError::NotFound)?;

    if !question.can_vote(now) {
        return Err(PollError::VotingClosed);
    }

    let choices = store.choices(question_id).await?;

    let marked_choice = match user {
        Some(user) => store
            .user_vote(user.id, question_id)
            .await?
            .and_then(|vote| choices.iter().find(|choice| choice.id == vote.choice_id).cloned()),
        None => None,
    };

    Ok(QuestionDetail {
        question,
        choices,
        marked_choice,
    })
}

pub async fn get_results<S>(store: &S, question_id: QuestionId) -> Result<QuestionResults, PollError>
where
    S: PollStore + ?Sized,
{
    let question = store
        .get_question(question_id)
        .await?
        .ok_or(PollError::NotFound)?;
    let choices = store.tally(question_id).await?;

    Ok(QuestionResults { question, choices })
}
