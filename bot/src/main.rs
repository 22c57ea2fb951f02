use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod services;
mod state;

use crate::services::monitor::run_pair;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!(
        "Starting MOST-RSI alert bot {} ({}, built {})",
        env!("GIT_TAG"),
        env!("GIT_HASH"),
        env!("BUILD_TIME")
    );

    let app_state = Arc::new(AppState::new()?);
    tracing::info!(
        "AppState initialized: {} symbols x {} intervals",
        app_state.config.symbols.len(),
        app_state.config.intervals.len()
    );

    let mut workers = Vec::new();
    for symbol in &app_state.config.symbols {
        for interval in &app_state.config.intervals {
            workers.push(tokio::spawn(run_pair(
                app_state.clone(),
                symbol.clone(),
                interval.clone(),
            )));
        }
    }

    tracing::info!("Bot is running with {} pair workers", workers.len());
    tokio::signal::ctrl_c().await?;
    tracing::info!("🛑 Shutting down...");

    for worker in workers {
        worker.abort();
    }
    Ok(())
}
