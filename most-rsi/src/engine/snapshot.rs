//! Indicator cache: current and previous readings for one pair

use crate::indicators::OscillatorReading;
use std::collections::BTreeMap;

/// Readings of every configured profile, keyed by profile name
pub type Readings = BTreeMap<String, OscillatorReading>;

/// Latest two recompute results of one pair.
///
/// `previous` only changes through [`IndicatorSnapshot::rotate`], once per
/// recompute cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSnapshot {
    pub current: Readings,
    pub previous: Readings,
    /// Completed recompute cycles
    pub cycles: u64,
}

impl IndicatorSnapshot {
    /// Move `current` into `previous` and install `next`
    pub fn rotate(&mut self, next: Readings) {
        self.previous = std::mem::replace(&mut self.current, next);
        self.cycles += 1;
    }

    pub fn current(&self, profile: &str) -> Option<&OscillatorReading> {
        self.current.get(profile)
    }

    pub fn previous(&self, profile: &str) -> Option<&OscillatorReading> {
        self.previous.get(profile)
    }
}
