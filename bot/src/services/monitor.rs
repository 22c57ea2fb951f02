//! Per-pair pipeline: historical seed, live feed, engine, dispatch

use crate::services::kline_feed::{run_kline_feed, stream_url};
use crate::state::AppState;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Bars buffered between the feed and the engine
const FEED_BUFFER: usize = 256;

/// Seed one pair from history, then process its live bars until the feed ends.
///
/// A pair whose history cannot be loaded is skipped; other pairs keep running.
pub async fn run_pair(state: Arc<AppState>, symbol: String, interval: String) {
    let label = format!("{}:{}", symbol, interval);
    let limit = state.registry.config().candle_limit;

    let history = match state
        .retry
        .run(state.loader.as_ref(), &symbol, &interval, limit)
        .await
    {
        Ok(history) => history,
        Err(e) => {
            error!("❌ [{}] Skipping pair, no history: {}", label, e);
            return;
        }
    };

    match state.registry.register(&symbol, &interval, history).await {
        Ok(accepted) => info!("📊 [{}] Ready with {} bars", label, accepted),
        Err(e) => {
            error!("❌ [{}] Failed to initialise: {}", label, e);
            return;
        }
    }

    let (tx, mut rx) = mpsc::channel(FEED_BUFFER);
    let url = stream_url(&state.config.binance_ws_url, &symbol, &interval);
    let feed = tokio::spawn(run_kline_feed(url, label.clone(), tx));

    while let Some(bar) = rx.recv().await {
        match state
            .registry
            .process_bar(&symbol, &interval, bar, Utc::now())
            .await
        {
            Ok(events) => {
                if !events.is_empty() {
                    state.dispatcher.dispatch(events);
                }
            }
            Err(e) => warn!("⚠️ [{}] Dropped bar: {}", label, e),
        }
    }

    feed.abort();
    state.registry.remove(&symbol, &interval).await;
}
