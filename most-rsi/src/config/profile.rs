//! Oscillator profile configuration

use crate::indicators::MaType;
use serde::{Deserialize, Serialize};

/// One MOST-RSI parameter set (e.g. "fast" or "slow")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OscillatorProfile {
    /// Name rules refer to, e.g. "slow"
    pub name: String,
    /// RSI period
    pub rsi_length: usize,
    /// Period of the moving average applied to RSI
    pub ma_length: usize,
    /// Moving average applied to RSI
    pub ma_type: MaType,
    /// MOST band width as a percentage of the smoothed value
    pub stop_loss_percent: f64,
}

impl OscillatorProfile {
    pub fn new(
        name: impl Into<String>,
        rsi_length: usize,
        ma_length: usize,
        ma_type: MaType,
        stop_loss_percent: f64,
    ) -> Self {
        Self {
            name: name.into(),
            rsi_length,
            ma_length,
            ma_type,
            stop_loss_percent,
        }
    }

    /// RSI 7, VAR 7, 9% band
    pub fn fast() -> Self {
        Self::new("fast", 7, 7, MaType::Var, 9.0)
    }

    /// RSI 21, VAR 21, 9% band
    pub fn slow() -> Self {
        Self::new("slow", 21, 21, MaType::Var, 9.0)
    }

    /// Bars consumed before both RSI and its moving average are defined
    pub fn warmup(&self) -> usize {
        self.rsi_length + self.ma_length
    }
}
