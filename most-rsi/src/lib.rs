//! MOST-RSI: streaming indicator engine and alert state machine
//!
//! This crate turns a stream of OHLCV bars into deduplicated alerts using:
//! - [ta-rs](https://github.com/greyblake/ta-rs) for the base moving average
//! - Wilder RSI smoothed by a configurable moving average (VAR by default)
//! - The MOST trailing-stop line over the smoothed RSI
//!
//! # Features
//!
//! - **Data Management**: bar validation and a bounded per-pair window
//! - **Technical Indicators**: RSI, SMA, EMA, WMA, VWMA, SMMA, VAR, MOST
//! - **Engine**: per-pair recompute cycle with a current/previous cache
//! - **Alerts**: convergence, threshold, crossover and sequence rules with
//!   a shared cooldown ledger
//! - **Exchange Boundary**: historical loader trait with a retry policy
//!
//! # Example
//!
//! ```no_run
//! use most_rsi::prelude::*;
//!
//! # async fn run(loader: &dyn HistoricalLoader, bar: RawBar) -> Result<(), Box<dyn std::error::Error>> {
//! let registry = EngineRegistry::new(EngineConfig::default())?;
//! let history = RetryPolicy::default().run(loader, "BTCUSDT", "1h", 500).await?;
//! registry.register("BTCUSDT", "1h", history).await?;
//!
//! let events = registry.process_bar("BTCUSDT", "1h", bar, chrono::Utc::now()).await?;
//! for event in events {
//!     println!("{}: {}", event.rule, event.description);
//! }
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod exchange;
pub mod indicators;

// Re-export commonly used types
pub mod prelude {
    pub use crate::alerts::*;
    pub use crate::config::*;
    pub use crate::data::*;
    pub use crate::engine::*;
    pub use crate::error::*;
    pub use crate::exchange::*;
    pub use crate::indicators::*;
}
