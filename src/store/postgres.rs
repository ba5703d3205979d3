// src/store/postgres.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{PollStore, VoteWrite};
use crate::error::PollError;
use crate::models::{validate_text, Choice, ChoiceId, ChoiceTally, NewQuestion, Question, QuestionId, Vote};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TallyRow {
    id: ChoiceId,
    question_id: QuestionId,
    choice_text: String,
    votes: i64,
}

#[derive(sqlx::FromRow)]
struct UpsertRow {
    id: i64,
    choice_id: ChoiceId,
    user_id: Uuid,
    inserted: bool,
}

#[async_trait]
impl PollStore for PgStore {
    async fn create_question(&self, question: NewQuestion) -> Result<Question, PollError> {
        question.validate()?;

        let question = sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (question_text, pub_date, end_date)
            VALUES ($1, $2, $3)
            RETURNING id, question_text, pub_date, end_date
            "#,
        )
        .bind(&question.question_text)
        .bind(question.pub_date)
        .bind(question.end_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(question)
    }

    async fn add_choice(&self, question_id: QuestionId, choice_text: &str) -> Result<Choice, PollError> {
        validate_text("choice_text", choice_text)?;

        let choice = sqlx::query_as::<_, Choice>(
            r#"
            INSERT INTO choices (question_id, choice_text)
            SELECT id, $2 FROM questions WHERE id = $1
            RETURNING id, question_id, choice_text
            "#,
        )
        .bind(question_id)
        .bind(choice_text)
        .fetch_optional(&self.pool)
        .await?;

        choice.ok_or(PollError::NotFound)
    }

    async fn delete_question(&self, question_id: QuestionId) -> Result<bool, PollError> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(question_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_question(&self, question_id: QuestionId) -> Result<Option<Question>, PollError> {
        let question = sqlx::query_as::<_, Question>(
            "SELECT id, question_text, pub_date, end_date FROM questions WHERE id = $1",
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(question)
    }

    async fn published_questions(&self, now: DateTime<Utc>) -> Result<Vec<Question>, PollError> {
        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, question_text, pub_date, end_date
            FROM questions
            WHERE pub_date <= $1
            ORDER BY pub_date DESC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }

    async fn choices(&self, question_id: QuestionId) -> Result<Vec<Choice>, PollError> {
        let choices = sqlx::query_as::<_, Choice>(
            "SELECT id, question_id, choice_text FROM choices WHERE question_id = $1 ORDER BY id ASC",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(choices)
    }

    async fn find_choice(
        &self,
        question_id: QuestionId,
        choice_id: ChoiceId,
    ) -> Result<Option<Choice>, PollError> {
        let choice = sqlx::query_as::<_, Choice>(
            "SELECT id, question_id, choice_text FROM choices WHERE id = $1 AND question_id = $2",
        )
        .bind(choice_id)
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(choice)
    }

    async fn user_vote(&self, user_id: Uuid, question_id: QuestionId) -> Result<Option<Vote>, PollError> {
        let vote = sqlx::query_as::<_, Vote>(
            "SELECT id, choice_id, user_id FROM votes WHERE user_id = $1 AND question_id = $2",
        )
        .bind(user_id)
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vote)
    }

    async fn upsert_vote(
        &self,
        user_id: Uuid,
        question_id: QuestionId,
        choice_id: ChoiceId,
    ) -> Result<VoteWrite, PollError> {
        // xmax is zero only for a row this statement inserted.
        let row = sqlx::query_as::<_, UpsertRow>(
            r#"
            INSERT INTO votes (user_id, question_id, choice_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, question_id) DO UPDATE
            SET choice_id = EXCLUDED.choice_id
            RETURNING id, choice_id, user_id, (xmax = 0) AS inserted
            "#,
        )
        .bind(user_id)
        .bind(question_id)
        .bind(choice_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(VoteWrite {
            vote: Vote {
                id: row.id,
                choice_id: row.choice_id,
                user_id: row.user_id,
            },
            created: row.inserted,
        })
    }

    async fn delete_vote(&self, user_id: Uuid, question_id: QuestionId) -> Result<Option<Vote>, PollError> {
        let vote = sqlx::query_as::<_, Vote>(
            r#"
            DELETE FROM votes
            WHERE user_id = $1 AND question_id = $2
            RETURNING id, choice_id, user_id
            "#,
        )
        .bind(user_id)
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vote)
    }

    async fn tally(&self, question_id: QuestionId) -> Result<Vec<ChoiceTally>, PollError> {
        let rows = sqlx::query_as::<_, TallyRow>(
            r#"
            SELECT c.id, c.question_id, c.choice_text, COUNT(v.id) AS votes
            FROM choices c
            LEFT JOIN votes v ON v.choice_id = c.id
            WHERE c.question_id = $1
            GROUP BY c.id, c.question_id, c.choice_text
            ORDER BY c.id ASC
            "#,
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ChoiceTally {
                choice: Choice {
                    id: row.id,
                    question_id: row.question_id,
                    choice_text: row.choice_text,
                },
                votes: row.votes,
            })
            .collect())
    }
}
