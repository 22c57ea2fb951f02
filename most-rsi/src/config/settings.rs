//! Engine configuration: profiles, rules and history sizing

use crate::alerts::{default_rules, AlertKind, AlertRule};
use crate::config::OscillatorProfile;
use crate::data::DEFAULT_CAPACITY;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Extra bars kept on top of the longest profile warm-up
pub const DEFAULT_WARMUP_MARGIN: usize = 10;

/// Settings shared by every pair engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Window capacity and historical fetch size
    pub candle_limit: usize,
    /// Safety buffer added to the longest warm-up
    pub warmup_margin: usize,
    pub profiles: Vec<OscillatorProfile>,
    pub rules: Vec<AlertRule>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            candle_limit: DEFAULT_CAPACITY,
            warmup_margin: DEFAULT_WARMUP_MARGIN,
            profiles: vec![OscillatorProfile::fast(), OscillatorProfile::slow()],
            rules: default_rules(),
        }
    }
}

impl EngineConfig {
    /// Bars a window needs before the oscillators are computed
    pub fn required_history(&self) -> usize {
        self.profiles
            .iter()
            .map(OscillatorProfile::warmup)
            .max()
            .unwrap_or(0)
            + self.warmup_margin
    }

    /// Check profiles and rules against each other
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for profile in &self.profiles {
            if profile.rsi_length == 0 || profile.ma_length == 0 {
                return Err(ConfigError::InvalidProfile(profile.name.clone()));
            }
            if !names.insert(profile.name.as_str()) {
                return Err(ConfigError::DuplicateProfile(profile.name.clone()));
            }
        }

        for rule in &self.rules {
            if let AlertKind::Sequence { stages, .. } = &rule.kind {
                if stages.is_empty() {
                    return Err(ConfigError::EmptySequence(rule.name.clone()));
                }
            }
            if let Some(missing) = rule.kind.profiles().into_iter().find(|p| !names.contains(p)) {
                return Err(ConfigError::UnknownProfile {
                    rule: rule.name.clone(),
                    profile: missing.to_string(),
                });
            }
        }

        let required = self.required_history();
        if self.candle_limit < required {
            return Err(ConfigError::CapacityTooSmall {
                limit: self.candle_limit,
                required,
            });
        }

        Ok(())
    }
}

/// Read a JSON array of alert rules
pub fn load_rules(path: impl AsRef<Path>) -> Result<Vec<AlertRule>, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}
