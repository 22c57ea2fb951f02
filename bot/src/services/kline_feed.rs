//! Live kline feed with a supervising reconnect loop

use crate::services::binance::parse_kline_message;
use anyhow::Context;
use futures::{SinkExt, StreamExt};
use most_rsi::data::RawBar;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, error, info, warn};

const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// `wss://.../ws/btcusdt@kline_1h`
pub fn stream_url(base: &str, symbol: &str, interval: &str) -> String {
    format!(
        "{}/{}@kline_{}",
        base.trim_end_matches('/'),
        symbol.to_lowercase(),
        interval
    )
}

/// How a session ended
enum SessionEnd {
    /// Server closed or the stream broke; reconnect
    Disconnected,
    /// Nobody is listening anymore; stop
    ReceiverDropped,
}

/// Keep a kline stream open and forward every bar to `tx`.
///
/// Reconnects after a short delay whenever the connection drops and only
/// returns once the receiving side is gone.
pub async fn run_kline_feed(url: String, label: String, tx: mpsc::Sender<RawBar>) {
    loop {
        match run_session(&url, &label, &tx).await {
            Ok(SessionEnd::ReceiverDropped) => {
                info!("🛑 [{}] Feed receiver dropped, stopping", label);
                return;
            }
            Ok(SessionEnd::Disconnected) => {
                warn!("🔌 [{}] WebSocket closed. Reconnecting in {:?}...", label, RECONNECT_DELAY);
            }
            Err(e) => {
                error!("❌ [{}] WebSocket error: {:#}. Reconnecting in {:?}...", label, e, RECONNECT_DELAY);
            }
        }

        if tx.is_closed() {
            return;
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

async fn run_session(url: &str, label: &str, tx: &mpsc::Sender<RawBar>) -> Result<SessionEnd, anyhow::Error> {
    let (ws_stream, _) = connect_async(url)
        .await
        .with_context(|| format!("connect to {}", url))?;
    info!("✅ [{}] WebSocket opened", label);

    let (mut write, mut read) = ws_stream.split();
    let mut ping = tokio::time::interval(PING_INTERVAL);
    ping.tick().await;

    loop {
        tokio::select! {
            _ = ping.tick() => {
                write.send(Message::Ping(Vec::new())).await.context("send ping")?;
            }
            msg = read.next() => {
                let msg = match msg {
                    Some(Ok(m)) => m,
                    Some(Err(e)) => return Err(e).context("read frame"),
                    None => return Ok(SessionEnd::Disconnected),
                };

                match msg {
                    Message::Text(text) => {
                        let Some(bar) = parse_kline_message(&text) else {
                            debug!("[{}] Ignoring non-kline message", label);
                            continue;
                        };
                        if tx.send(bar).await.is_err() {
                            return Ok(SessionEnd::ReceiverDropped);
                        }
                    }
                    Message::Ping(payload) => {
                        write.send(Message::Pong(payload)).await.context("send pong")?;
                    }
                    Message::Close(frame) => {
                        debug!("[{}] Close frame: {:?}", label, frame);
                        return Ok(SessionEnd::Disconnected);
                    }
                    _ => {}
                }
            }
        }
    }
}
