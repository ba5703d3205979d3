// src/main.rs
use std::process::ExitCode;

use polls_backend::config::Config;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok(); // Load environment variables from .env file

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!(err = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = polls_backend::start_server(config).await {
        error!(err = %e, "server failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
