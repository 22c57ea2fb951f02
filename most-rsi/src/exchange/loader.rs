//! Historical bar loading with a bounded retry policy

use crate::data::RawBar;
use crate::error::LoaderError;
use async_trait::async_trait;
use std::time::Duration;

/// Source of historical bars for a pair
#[async_trait]
pub trait HistoricalLoader: Send + Sync {
    /// Up to `limit` bars, oldest first
    async fn load(&self, symbol: &str, timeframe: &str, limit: usize) -> Result<Vec<RawBar>, LoaderError>;
}

/// Fixed-delay retry for loader calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Call the loader until it succeeds or attempts run out.
    ///
    /// The last failure is wrapped in [`LoaderError::Exhausted`].
    pub async fn run<L>(
        &self,
        loader: &L,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<RawBar>, LoaderError>
    where
        L: HistoricalLoader + ?Sized,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match loader.load(symbol, timeframe, limit).await {
                Ok(bars) => {
                    tracing::info!("📥 Loaded {} bars for {} {} (attempt {})", bars.len(), symbol, timeframe, attempt);
                    return Ok(bars);
                }
                Err(e) if attempt < attempts => {
                    tracing::warn!(
                        "⚠️ Load {} {} failed (attempt {}/{}): {}; retrying in {:?}",
                        symbol,
                        timeframe,
                        attempt,
                        attempts,
                        e,
                        self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!("❌ Load {} {} failed after {} attempts: {}", symbol, timeframe, attempts, e);
                    return Err(LoaderError::Exhausted {
                        attempts,
                        last: Box::new(e),
                    });
                }
            }
        }
    }
}
