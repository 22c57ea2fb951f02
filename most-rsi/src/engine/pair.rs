//! Engine for a single (symbol, timeframe) pair

use crate::alerts::{AlertBook, AlertEvent, EvalContext};
use crate::config::EngineConfig;
use crate::data::{Bar, CandleWindow, RawBar};
use crate::engine::{IndicatorSnapshot, Readings};
use crate::error::{EngineError, IndicatorError};
use crate::indicators::compute_most_rsi;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Window, indicator cache and alert gates of one pair.
///
/// Every bar goes through validate -> append -> recompute -> rotate ->
/// evaluate before the next one is accepted.
#[derive(Debug, Clone)]
pub struct PairEngine {
    symbol: String,
    timeframe: String,
    window: CandleWindow,
    config: Arc<EngineConfig>,
    snapshot: IndicatorSnapshot,
    alerts: AlertBook,
    required_history: usize,
}

impl PairEngine {
    pub fn new(symbol: impl Into<String>, timeframe: impl Into<String>, config: Arc<EngineConfig>) -> Self {
        let required_history = config.required_history();
        Self {
            symbol: symbol.into(),
            timeframe: timeframe.into(),
            window: CandleWindow::new(config.candle_limit),
            alerts: AlertBook::new(&config.rules),
            snapshot: IndicatorSnapshot::default(),
            required_history,
            config,
        }
    }

    /// Load historical bars and prime the indicator cache.
    ///
    /// Malformed or out-of-order bars are skipped. No alerts are evaluated.
    /// Returns the number of bars accepted.
    pub fn seed(&mut self, bars: Vec<RawBar>) -> Result<usize, EngineError> {
        let mut accepted = 0;
        for raw in bars {
            let appended = Bar::try_from(raw)
                .and_then(|bar| self.window.append(bar));
            match appended {
                Ok(_) => accepted += 1,
                Err(e) => {
                    tracing::warn!("⚠️ {} {} skipped historical bar: {}", self.symbol, self.timeframe, e);
                }
            }
        }

        self.refresh()?;
        tracing::info!(
            "📈 {} {} seeded with {} bars (warm: {})",
            self.symbol,
            self.timeframe,
            accepted,
            self.is_warm()
        );
        Ok(accepted)
    }

    /// Process one live or closed bar and return the alerts it fires.
    ///
    /// A malformed or out-of-order bar is rejected and leaves all state
    /// untouched. While the window is shorter than the warm-up requirement
    /// this is a no-op returning no alerts.
    pub fn on_bar(&mut self, raw: RawBar, now: DateTime<Utc>) -> Result<Vec<AlertEvent>, EngineError> {
        let bar = Bar::try_from(raw)?;
        self.window.append(bar)?;

        if !self.refresh()? {
            return Ok(Vec::new());
        }

        let ctx = EvalContext {
            symbol: &self.symbol,
            timeframe: &self.timeframe,
            price: Some(bar.close),
            now,
        };
        Ok(self.alerts.evaluate(&self.config.rules, &self.snapshot, &ctx))
    }

    /// Readings of every profile computed from the current window.
    ///
    /// Pure: the same window always yields the same readings.
    pub fn recompute(&self) -> Result<Readings, IndicatorError> {
        let closes = self.window.closes();
        let volumes = self.window.volumes();

        let mut readings = Readings::new();
        for profile in &self.config.profiles {
            let series = compute_most_rsi(&closes, &volumes, profile)?;
            readings.insert(profile.name.clone(), series.last_reading());
        }
        Ok(readings)
    }

    fn refresh(&mut self) -> Result<bool, EngineError> {
        if !self.is_warm() {
            return Ok(false);
        }
        let readings = self.recompute()?;
        tracing::debug!("{} {} readings: {:?}", self.symbol, self.timeframe, readings);
        self.snapshot.rotate(readings);
        Ok(true)
    }

    pub fn is_warm(&self) -> bool {
        self.window.is_warm(self.required_history)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> &str {
        &self.timeframe
    }

    pub fn window(&self) -> &CandleWindow {
        &self.window
    }

    pub fn snapshot(&self) -> &IndicatorSnapshot {
        &self.snapshot
    }

    pub fn alerts(&self) -> &AlertBook {
        &self.alerts
    }

    pub fn required_history(&self) -> usize {
        self.required_history
    }
}
