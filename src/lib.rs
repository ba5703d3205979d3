//! Poll backend: questions with a publication window, one vote per user per
//! question, and derived per-choice results.
//!
//! Identity is verified upstream and forwarded in the `x-user-id` header; see
//! [`auth`]. Persistence goes through [`store::PollStore`], backed by
//! PostgreSQL in production and by [`store::MemoryStore`] in tests or when
//! `POLLS_STORE=memory`.
use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum_server::Handle;
use tokio::signal;
use tracing::info;

pub mod audit;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod poll;
pub mod routes;
pub mod services;
pub mod store;

use config::{Config, StoreKind};
use error::ServerError;
use handlers::AppState;
use store::{MemoryStore, PgStore, PollStore};

pub async fn build_store(config: &Config) -> Result<Arc<dyn PollStore>, ServerError> {
    match config.store {
        StoreKind::Postgres => {
            let pool = db::create_pool(config).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        StoreKind::Memory => {
            info!("Using in-memory store, data will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

pub async fn start_server(config: Config) -> Result<(), ServerError> {
    info!("Initializing state...");
    let store = build_store(&config).await?;
    let app = routes::create_routes(AppState::new(store));

    let address = SocketAddr::new(config.bind_address, config.port);
    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    info!("Server running on {address}");
    axum_server::bind(address)
        .handle(handle)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(err = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(err = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    handle.graceful_shutdown(Some(Duration::from_secs(10)));
}
