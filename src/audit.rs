// src/audit.rs
use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;
use tracing::{info, warn};

/// `LoggedIn` and `LoggedOut` are reported by the session layer in front of
/// this service; `LoginFailed` is also raised here for an unreadable forwarded
/// identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    LoggedIn,
    LoggedOut,
    LoginFailed,
}

/// Writes an authentication audit line. The session layer calls this at the
/// point a login, logout or failed login happens.
pub fn record(event: AuthEvent, user: &str, client: Option<IpAddr>) {
    let client = client.map(|ip| ip.to_string());
    let client = client.as_deref().unwrap_or("unknown");

    match event {
        AuthEvent::LoggedIn => info!(target: "audit", user, client, "logged in"),
        AuthEvent::LoggedOut => info!(target: "audit", user, client, "logged out"),
        AuthEvent::LoginFailed => warn!(target: "audit", user, client, "failed login"),
    }
}

/// The originating client: the first `X-Forwarded-For` hop when present and
/// parseable, otherwise the peer address of the connection.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .or_else(|| peer.map(|addr| addr.ip()))
}
