// src/error.rs
use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::{header::LOCATION, StatusCode};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PollError {
    #[error("Poll not found.")]
    NotFound,

    #[error("Please re-select the choice again.")]
    InvalidSelection,

    #[error("Please log in to continue.")]
    Unauthenticated,

    #[error("You haven't voted yet.")]
    NoExistingVote,

    #[error("Access Denied.")]
    VotingClosed,

    #[error("Invalid {field}: {reason}")]
    InvalidText {
        field: &'static str,
        reason: &'static str,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl PollError {
    /// Stable name reported to clients in the `outcome` field.
    pub fn kind(&self) -> &'static str {
        match self {
            PollError::NotFound => "not_found",
            PollError::InvalidSelection => "invalid_selection",
            PollError::Unauthenticated => "unauthenticated",
            PollError::NoExistingVote => "no_existing_vote",
            PollError::VotingClosed => "voting_closed",
            PollError::InvalidText { .. } => "invalid_text",
            PollError::Database(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            PollError::NotFound => StatusCode::NOT_FOUND,
            PollError::InvalidSelection | PollError::InvalidText { .. } => StatusCode::BAD_REQUEST,
            PollError::Unauthenticated => StatusCode::UNAUTHORIZED,
            PollError::NoExistingVote => StatusCode::CONFLICT,
            PollError::VotingClosed => StatusCode::FORBIDDEN,
            PollError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A [`PollError`] on its way out of an HTTP handler, optionally telling the
/// client where to go next.
#[derive(Debug)]
pub struct AppError {
    pub error: PollError,
    pub redirect: Option<String>,
}

impl AppError {
    pub fn redirect_to(error: PollError, location: impl Into<String>) -> Self {
        Self {
            error,
            redirect: Some(location.into()),
        }
    }
}

impl From<PollError> for AppError {
    fn from(error: PollError) -> Self {
        Self {
            error,
            redirect: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.error.status();

        // Store details stay in the logs.
        let message = match &self.error {
            PollError::Database(e) => {
                tracing::error!(err = %e, "database failure while handling request");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "outcome": self.error.kind(),
            "message": message,
            "redirect": self.redirect,
        }));

        match self.redirect {
            Some(location) => (status, [(LOCATION, location)], body).into_response(),
            None => (status, body).into_response(),
        }
    }
}

/// Failures that stop the server from starting.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}
