// src/models.rs
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PollError;

pub type QuestionId = i64;
pub type ChoiceId = i64;
pub type VoteId = i64;

/// Longest question or choice text accepted, in code points.
pub const MAX_TEXT_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Question {
    pub id: QuestionId,
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl Question {
    pub fn is_published(&self, now: DateTime<Utc>) -> bool {
        self.pub_date <= now
    }

    /// True when `pub_date` falls within the last day, both ends inclusive.
    /// Future publication dates never count as recent.
    pub fn was_published_recently(&self, now: DateTime<Utc>) -> bool {
        now - Duration::days(1) <= self.pub_date && self.pub_date <= now
    }

    /// Published, and either open-ended or not yet past `end_date`.
    pub fn can_vote(&self, now: DateTime<Utc>) -> bool {
        match self.end_date {
            Some(end_date) => self.is_published(now) && now <= end_date,
            None => self.is_published(now),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Choice {
    pub id: ChoiceId,
    pub question_id: QuestionId,
    pub choice_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vote {
    pub id: VoteId,
    pub choice_id: ChoiceId,
    pub user_id: Uuid,
}

/// A choice together with the number of votes currently pointing at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceTally {
    #[serde(flatten)]
    pub choice: Choice,
    pub votes: i64,
}

/// Input for creating a question.
#[derive(Debug, Clone, Deserialize)]
pub struct NewQuestion {
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

impl NewQuestion {
    /// A question published at `pub_date` with no voting deadline.
    pub fn new(question_text: impl Into<String>, pub_date: DateTime<Utc>) -> Self {
        Self {
            question_text: question_text.into(),
            pub_date,
            end_date: None,
        }
    }

    pub fn ending_at(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn validate(&self) -> Result<(), PollError> {
        validate_text("question_text", &self.question_text)
    }
}

pub fn validate_text(field: &'static str, text: &str) -> Result<(), PollError> {
    if text.trim().is_empty() {
        return Err(PollError::InvalidText {
            field,
            reason: "must not be empty",
        });
    }

    if text.chars().count() > MAX_TEXT_LEN {
        return Err(PollError::InvalidText {
            field,
            reason: "must be at most 200 characters",
        });
    }

    Ok(())
}

/// An authenticated user as forwarded by the session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: Option<String>,
}

impl User {
    pub fn new(id: Uuid) -> Self {
        Self { id, username: None }
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.username {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "{}", self.id),
        }
    }
}
