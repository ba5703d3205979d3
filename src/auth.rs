// src/auth.rs
use std::{convert::Infallible, net::SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use crate::audit::{self, AuthEvent};
use crate::error::{AppError, PollError};
use crate::models::User;

/// Header carrying the verified user id, set by the upstream session layer.
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";

pub const LOGIN_PATH: &str = "/accounts/login";

/// An authenticated user. Rejects the request with `Unauthenticated` otherwise.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// The user if one was forwarded, without requiring it.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

fn login_redirect(parts: &Parts) -> AppError {
    AppError::redirect_to(
        PollError::Unauthenticated,
        format!("{LOGIN_PATH}?next={}", parts.uri.path()),
    )
}

enum Forwarded {
    Absent,
    User(User),
    Malformed { username: Option<String> },
}

fn forwarded_user(parts: &Parts) -> Forwarded {
    let Some(raw) = parts.headers.get(USER_ID_HEADER) else {
        return Forwarded::Absent;
    };

    let username = parts
        .headers
        .get(USER_NAME_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    match raw.to_str().ok().and_then(|value| Uuid::parse_str(value.trim()).ok()) {
        Some(id) => Forwarded::User(User { id, username }),
        None => Forwarded::Malformed { username },
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match forwarded_user(parts) {
            Forwarded::User(user) => Ok(AuthUser(user)),
            Forwarded::Absent => Err(login_redirect(parts)),
            Forwarded::Malformed { username } => {
                let peer = parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| *addr);
                let client = audit::client_ip(&parts.headers, peer);
                let claimed = username.as_deref().unwrap_or("<unnamed>");
                audit::record(AuthEvent::LoginFailed, claimed, client);

                Err(login_redirect(parts))
            }
        }
    }
}

/// Never rejects: a malformed identity is served as anonymous.
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match forwarded_user(parts) {
            Forwarded::User(user) => Ok(MaybeUser(Some(user))),
            Forwarded::Absent => Ok(MaybeUser(None)),
            Forwarded::Malformed { .. } => {
                warn!(path = %parts.uri.path(), "ignoring malformed {USER_ID_HEADER} header");
                Ok(MaybeUser(None))
            }
        }
    }
}
