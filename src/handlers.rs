// src/handlers.rs
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::{AuthUser, MaybeUser};
use crate::error::{AppError, PollError};
use crate::models::{ChoiceId, Question, QuestionId};
use crate::poll::{self, Receipt, UnvoteOutcome, VoteOutcome};
use crate::services::{self, QuestionDetail, QuestionResults};
use crate::store::PollStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PollStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn PollStore>) -> Self {
        Self { store }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct VoteForm {
    pub choice: Option<ChoiceId>,
}

/// A successful response plus the page the client should show next.
#[derive(Debug, Serialize)]
pub struct Redirecting<T> {
    #[serde(flatten)]
    pub body: T,
    pub redirect: String,
}

fn index_path() -> String {
    "/polls".to_string()
}

fn detail_path(question_id: QuestionId) -> String {
    format!("/polls/{question_id}")
}

fn results_path(question_id: QuestionId) -> String {
    format!("/polls/{question_id}/results")
}

/// Published questions, newest first
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Question>>, AppError> {
    let questions = services::list_published(state.store.as_ref(), Utc::now()).await?;
    Ok(Json(questions))
}

/// Voting form for a question; closed questions send the client back to the index
pub async fn detail(
    State(state): State<AppState>,
    Path(question_id): Path<QuestionId>,
    MaybeUser(user): MaybeUser,
) -> Result<Json<QuestionDetail>, AppError> {
    match services::get_detail(state.store.as_ref(), question_id, user.as_ref(), Utc::now()).await {
        Ok(detail) => Ok(Json(detail)),
        Err(e @ PollError::VotingClosed) => Err(AppError::redirect_to(e, index_path())),
        Err(e) => Err(e.into()),
    }
}

/// Per-choice vote counts, always visible
pub async fn results(
    State(state): State<AppState>,
    Path(question_id): Path<QuestionId>,
) -> Result<Json<QuestionResults>, AppError> {
    let results = services::get_results(state.store.as_ref(), question_id).await?;
    Ok(Json(results))
}

/// Cast or change the caller's vote
pub async fn vote(
    State(state): State<AppState>,
    Path(question_id): Path<QuestionId>,
    AuthUser(user): AuthUser,
    body: Bytes,
) -> Result<Json<Redirecting<Receipt<VoteOutcome>>>, AppError> {
    // An unreadable form counts as no selection.
    let form: VoteForm = if body.is_empty() {
        VoteForm::default()
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|e| {
            warn!(user = %user, question_id, err = %e, "unreadable vote form");
            VoteForm::default()
        })
    };

    match poll::vote(state.store.as_ref(), question_id, form.choice, &user, Utc::now()).await {
        Ok(receipt) => Ok(Json(Redirecting {
            body: receipt,
            redirect: results_path(question_id),
        })),
        Err(e @ PollError::InvalidSelection) => Err(AppError::redirect_to(e, detail_path(question_id))),
        Err(e @ PollError::VotingClosed) => Err(AppError::redirect_to(e, index_path())),
        Err(e) => Err(e.into()),
    }
}

/// Withdraw the caller's vote
pub async fn unvote(
    State(state): State<AppState>,
    Path(question_id): Path<QuestionId>,
    AuthUser(user): AuthUser,
) -> Result<Json<Redirecting<Receipt<UnvoteOutcome>>>, AppError> {
    match poll::unvote(state.store.as_ref(), question_id, &user, Utc::now()).await {
        Ok(receipt) => Ok(Json(Redirecting {
            body: receipt,
            redirect: results_path(question_id),
        })),
        Err(e @ PollError::NoExistingVote) => Err(AppError::redirect_to(e, detail_path(question_id))),
        Err(e) => Err(e.into()),
    }
}

pub async fn health() -> &'static str {
    "ok"
}
