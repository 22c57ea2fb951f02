//! Ordered-condition gate for sequence alerts

use crate::alerts::Threshold;
use serde::{Deserialize, Serialize};

/// Progress of one sequence alert for one pair.
///
/// Flags are set in order, at most one per observation, and never cleared
/// individually. Once the last flag is set the gate has fired and stays
/// silent until the re-arm condition is observed, which clears every flag
/// together with `fired`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateState {
    pub flags: Vec<bool>,
    pub fired: bool,
}

impl GateState {
    pub fn new(stages: usize) -> Self {
        Self {
            flags: vec![false; stages],
            fired: false,
        }
    }

    /// Feed one value; returns true exactly when the final stage completes
    pub fn observe(&mut self, value: f64, stages: &[Threshold], rearm: &Threshold) -> bool {
        if self.flags.len() != stages.len() {
            self.flags = vec![false; stages.len()];
            self.fired = false;
        }
        if stages.is_empty() {
            return false;
        }

        if self.fired {
            if rearm.holds(value) {
                self.reset();
            }
            return false;
        }

        let Some(next) = self.flags.iter().position(|set| !set) else {
            return false;
        };
        if !stages[next].holds(value) {
            return false;
        }

        self.flags[next] = true;
        if next + 1 == stages.len() {
            self.fired = true;
            return true;
        }
        false
    }

    /// Number of stages completed so far
    pub fn progress(&self) -> usize {
        self.flags.iter().take_while(|set| **set).count()
    }

    fn reset(&mut self) {
        self.flags.iter_mut().for_each(|f| *f = false);
        self.fired = false;
    }
}
