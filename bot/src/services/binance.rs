//! Binance REST historical loader and kline message parsing

use async_trait::async_trait;
use most_rsi::data::RawBar;
use most_rsi::error::LoaderError;
use most_rsi::exchange::HistoricalLoader;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Binance caps a klines request at 1000 bars
const MAX_KLINES_PER_REQUEST: usize = 1000;

/// Loads klines from `GET /api/v3/klines`
pub struct BinanceRestLoader {
    base_url: String,
    client: reqwest::Client,
}

impl BinanceRestLoader {
    pub fn new(base_url: &str) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl HistoricalLoader for BinanceRestLoader {
    async fn load(&self, symbol: &str, timeframe: &str, limit: usize) -> Result<Vec<RawBar>, LoaderError> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let limit = limit.min(MAX_KLINES_PER_REQUEST).to_string();

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol), ("interval", timeframe), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|e| LoaderError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LoaderError::Response(format!("HTTP {}: {}", status, body)));
        }

        let rows: Vec<Vec<Value>> = response
            .json()
            .await
            .map_err(|e| LoaderError::Response(e.to_string()))?;

        let now_ms = chrono::Utc::now().timestamp_millis();
        Ok(rows.iter().map(|row| parse_rest_row(row, now_ms)).collect())
    }
}

/// Binance sends prices as strings; accept numbers too
fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// `[openTime, open, high, low, close, volume, closeTime, ...]`.
///
/// The newest row is still forming when its close time is in the future.
pub fn parse_rest_row(row: &[Value], now_ms: i64) -> RawBar {
    let close_time = row.get(6).and_then(Value::as_i64);
    RawBar {
        timestamp: row.first().and_then(Value::as_i64),
        open: number(row.get(1)),
        high: number(row.get(2)),
        low: number(row.get(3)),
        close: number(row.get(4)),
        volume: number(row.get(5)),
        is_final: close_time.map_or(true, |t| t < now_ms),
    }
}

#[derive(Debug, Deserialize)]
struct KlineEnvelope {
    k: KlinePayload,
}

#[derive(Debug, Deserialize)]
struct KlinePayload {
    #[serde(rename = "t")]
    open_time: Option<i64>,
    #[serde(rename = "o")]
    open: Option<String>,
    #[serde(rename = "h")]
    high: Option<String>,
    #[serde(rename = "l")]
    low: Option<String>,
    #[serde(rename = "c")]
    close: Option<String>,
    #[serde(rename = "v")]
    volume: Option<String>,
    #[serde(rename = "x", default)]
    is_final: bool,
}

/// Parse a `<symbol>@kline_<interval>` stream message.
///
/// Returns `None` for messages that are not kline events. Missing or
/// unparsable numbers are left empty so the engine rejects the bar.
pub fn parse_kline_message(text: &str) -> Option<RawBar> {
    let envelope: KlineEnvelope = serde_json::from_str(text).ok()?;
    let k = envelope.k;
    let parse = |s: Option<String>| s.and_then(|v| v.parse::<f64>().ok());

    Some(RawBar {
        timestamp: k.open_time,
        open: parse(k.open),
        high: parse(k.high),
        low: parse(k.low),
        close: parse(k.close),
        volume: parse(k.volume),
        is_final: k.is_final,
    })
}
