// src/routes.rs
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use http::{header::CONTENT_TYPE, Method};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{self, AppState};

pub fn create_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/polls", get(handlers::index))
        .route("/polls/{id}", get(handlers::detail))
        .route("/polls/{id}/results", get(handlers::results))
        .route("/polls/{id}/vote", post(handlers::vote))
        .route("/polls/{id}/unvote", post(handlers::unvote))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
