//! Engine Registry - owns one engine per (symbol, timeframe)

use crate::alerts::AlertEvent;
use crate::config::EngineConfig;
use crate::data::RawBar;
use crate::engine::{IndicatorSnapshot, PairEngine};
use crate::error::{ConfigError, EngineError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Registry key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    pub symbol: String,
    pub timeframe: String,
}

impl PairKey {
    pub fn new(symbol: &str, timeframe: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.symbol, self.timeframe)
    }
}

/// Process-wide set of pair engines.
///
/// Each engine sits behind its own lock, so bars for one pair are handled
/// strictly in order while different pairs run concurrently.
pub struct EngineRegistry {
    config: Arc<EngineConfig>,
    engines: RwLock<HashMap<PairKey, Arc<Mutex<PairEngine>>>>,
}

impl EngineRegistry {
    /// Build a registry; the config is validated before any pair can use it
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            engines: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &Arc<EngineConfig> {
        &self.config
    }

    /// Create (or replace) the engine for a pair and seed it with history.
    /// Returns the number of bars accepted.
    pub async fn register(
        &self,
        symbol: &str,
        timeframe: &str,
        history: Vec<RawBar>,
    ) -> Result<usize, EngineError> {
        let mut engine = PairEngine::new(symbol, timeframe, Arc::clone(&self.config));
        let accepted = engine.seed(history)?;

        let mut engines = self.engines.write().await;
        engines.insert(PairKey::new(symbol, timeframe), Arc::new(Mutex::new(engine)));
        tracing::info!("✅ Registered {}:{}", symbol, timeframe);
        Ok(accepted)
    }

    /// Feed a bar to a registered pair
    pub async fn process_bar(
        &self,
        symbol: &str,
        timeframe: &str,
        bar: RawBar,
        now: DateTime<Utc>,
    ) -> Result<Vec<AlertEvent>, EngineError> {
        let engine = self.engine(symbol, timeframe).await?;
        let mut engine = engine.lock().await;
        engine.on_bar(bar, now)
    }

    /// Drop a single pair
    pub async fn remove(&self, symbol: &str, timeframe: &str) -> bool {
        let mut engines = self.engines.write().await;
        let removed = engines.remove(&PairKey::new(symbol, timeframe)).is_some();
        if removed {
            tracing::info!("🛑 Removed {}:{}", symbol, timeframe);
        }
        removed
    }

    /// Drop every timeframe of a symbol; returns how many pairs were removed
    pub async fn remove_symbol(&self, symbol: &str) -> usize {
        let mut engines = self.engines.write().await;
        let before = engines.len();
        engines.retain(|key, _| key.symbol != symbol);
        let removed = before - engines.len();
        tracing::info!("🛑 Removed {} pairs for {}", removed, symbol);
        removed
    }

    /// Registered pairs, sorted
    pub async fn pairs(&self) -> Vec<PairKey> {
        let engines = self.engines.read().await;
        let mut keys: Vec<PairKey> = engines.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn contains(&self, symbol: &str, timeframe: &str) -> bool {
        let engines = self.engines.read().await;
        engines.contains_key(&PairKey::new(symbol, timeframe))
    }

    /// Copy of a pair's indicator cache
    pub async fn snapshot(&self, symbol: &str, timeframe: &str) -> Option<IndicatorSnapshot> {
        let engine = self.engine(symbol, timeframe).await.ok()?;
        let engine = engine.lock().await;
        Some(engine.snapshot().clone())
    }

    async fn engine(&self, symbol: &str, timeframe: &str) -> Result<Arc<Mutex<PairEngine>>, EngineError> {
        let engines = self.engines.read().await;
        engines
            .get(&PairKey::new(symbol, timeframe))
            .cloned()
            .ok_or_else(|| EngineError::UnknownPair {
                symbol: symbol.to_string(),
                timeframe: timeframe.to_string(),
            })
    }
}
