//! Alert rule definitions
//!
//! Rules are plain data so thresholds, directions and the profiles feeding
//! each alert can be changed from a JSON file without touching the engine.

use crate::engine::Readings;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default cooldown between two sends of the same alert (1 hour)
pub const DEFAULT_COOLDOWN_SECS: u64 = 3600;

const MAX_COOLDOWN_SECS: u64 = 100 * 365 * 24 * 3600;

/// Oscillator value an alert reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Rsi,
    MovingAverage,
    MostLine,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rsi => "rsi",
            Self::MovingAverage => "ma",
            Self::MostLine => "most",
        }
    }
}

/// A field of a named oscillator profile, e.g. `slow.rsi`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Source {
    pub profile: String,
    pub field: Field,
}

impl Source {
    pub fn new(profile: impl Into<String>, field: Field) -> Self {
        Self {
            profile: profile.into(),
            field,
        }
    }

    /// Value of this source in a set of readings, if defined
    pub fn read(&self, readings: &Readings) -> Option<f64> {
        let reading = readings.get(&self.profile)?;
        match self.field {
            Field::Rsi => reading.rsi,
            Field::MovingAverage => reading.moving_average,
            Field::MostLine => reading.most_line,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.profile, self.field.name())
    }
}

/// Comparison operator of a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Above,
    AtLeast,
    Below,
    AtMost,
}

/// `value <op> level`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub op: Comparison,
    pub level: f64,
}

impl Threshold {
    pub fn above(level: f64) -> Self {
        Self { op: Comparison::Above, level }
    }

    pub fn at_least(level: f64) -> Self {
        Self { op: Comparison::AtLeast, level }
    }

    pub fn below(level: f64) -> Self {
        Self { op: Comparison::Below, level }
    }

    pub fn at_most(level: f64) -> Self {
        Self { op: Comparison::AtMost, level }
    }

    pub fn holds(&self, value: f64) -> bool {
        match self.op {
            Comparison::Above => value > self.level,
            Comparison::AtLeast => value >= self.level,
            Comparison::Below => value < self.level,
            Comparison::AtMost => value <= self.level,
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.op {
            Comparison::Above => ">",
            Comparison::AtLeast => ">=",
            Comparison::Below => "<",
            Comparison::AtMost => "<=",
        };
        write!(f, "{} {}", op, self.level)
    }
}

/// Side a crossover must end on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossDirection {
    /// From below to above the reference
    Bullish,
    /// From above to below the reference
    Bearish,
}

/// What an alert watches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertKind {
    /// Two sources within `max_distance` of each other, both passing `floor`
    Convergence {
        a: Source,
        b: Source,
        max_distance: f64,
        #[serde(default)]
        floor: Option<Threshold>,
    },
    /// A single source passing a threshold
    Threshold { source: Source, condition: Threshold },
    /// `value` crossing `reference` between the previous and current cycle
    Crossover {
        value: Source,
        reference: Source,
        direction: CrossDirection,
    },
    /// Ordered stages observed one after another, re-armed by `rearm`
    Sequence {
        source: Source,
        stages: Vec<Threshold>,
        rearm: Threshold,
    },
}

impl AlertKind {
    /// Profiles this alert reads from
    pub fn profiles(&self) -> Vec<&str> {
        match self {
            Self::Convergence { a, b, .. } => vec![a.profile.as_str(), b.profile.as_str()],
            Self::Threshold { source, .. } => vec![source.profile.as_str()],
            Self::Crossover {
                value, reference, ..
            } => vec![value.profile.as_str(), reference.profile.as_str()],
            Self::Sequence { source, .. } => vec![source.profile.as_str()],
        }
    }

    /// Short human description used in notifications
    pub fn describe(&self) -> String {
        match self {
            Self::Convergence { a, b, max_distance, .. } => {
                format!("{a} and {b} within {max_distance}")
            }
            Self::Threshold { source, condition } => format!("{source} {condition}"),
            Self::Crossover {
                value,
                reference,
                direction,
            } => match direction {
                CrossDirection::Bullish => format!("{value} crossed above {reference}"),
                CrossDirection::Bearish => format!("{value} crossed below {reference}"),
            },
            Self::Sequence { source, stages, .. } => {
                let path: Vec<String> = stages.iter().map(|s| s.to_string()).collect();
                format!("{source} {}", path.join(" then "))
            }
        }
    }
}

/// Which parts of an alert make up its cooldown key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownScope {
    /// One cooldown per (symbol, rule) across all timeframes
    Symbol,
    /// One cooldown per (symbol, rule, timeframe)
    #[default]
    SymbolTimeframe,
}

/// A named alert with its timeframe filter and cooldown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub name: String,
    /// Timeframes the rule runs on; `None` means every timeframe
    #[serde(default)]
    pub timeframes: Option<Vec<String>>,
    /// Seconds between two sends; `None` falls back to the deployment default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_secs: Option<u64>,
    #[serde(default)]
    pub cooldown_scope: CooldownScope,
    pub kind: AlertKind,
}

impl AlertRule {
    pub fn new(name: impl Into<String>, kind: AlertKind) -> Self {
        Self {
            name: name.into(),
            timeframes: None,
            cooldown_secs: None,
            cooldown_scope: CooldownScope::default(),
            kind,
        }
    }

    pub fn on_timeframes(mut self, timeframes: &[&str]) -> Self {
        self.timeframes = Some(timeframes.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn with_cooldown(mut self, secs: u64) -> Self {
        self.cooldown_secs = Some(secs);
        self
    }

    /// Give the rule `secs` of cooldown unless it sets its own
    pub fn inherit_cooldown(&mut self, secs: u64) {
        self.cooldown_secs.get_or_insert(secs);
    }

    pub fn with_scope(mut self, scope: CooldownScope) -> Self {
        self.cooldown_scope = scope;
        self
    }

    pub fn applies_to(&self, timeframe: &str) -> bool {
        self.timeframes
            .as_ref()
            .map_or(true, |t| t.iter().any(|tf| tf == timeframe))
    }

    pub fn cooldown(&self) -> chrono::Duration {
        // Keep within chrono::Duration range
        let secs = self
            .cooldown_secs
            .unwrap_or(DEFAULT_COOLDOWN_SECS)
            .min(MAX_COOLDOWN_SECS) as i64;
        chrono::Duration::seconds(secs)
    }
}

/// Rules that ship with the engine
pub fn default_rules() -> Vec<AlertRule> {
    let fast_ma = Source::new("fast", Field::MovingAverage);
    let slow_rsi = Source::new("slow", Field::Rsi);
    let slow_ma = Source::new("slow", Field::MovingAverage);

    vec![
        AlertRule::new(
            "difference_alert",
            AlertKind::Convergence {
                a: fast_ma.clone(),
                b: slow_rsi.clone(),
                max_distance: 1.0,
                floor: Some(Threshold::at_least(40.0)),
            },
        ),
        AlertRule::new(
            "bullish_crossover_1d",
            AlertKind::Crossover {
                value: slow_rsi.clone(),
                reference: slow_ma.clone(),
                direction: CrossDirection::Bullish,
            },
        )
        .on_timeframes(&["1d"]),
        AlertRule::new(
            "bearish_crossover_1h",
            AlertKind::Crossover {
                value: slow_rsi.clone(),
                reference: slow_ma,
                direction: CrossDirection::Bearish,
            },
        )
        .on_timeframes(&["1h"]),
        // On RSI input the line stays long, so these two seldom fire; kept
        // because existing deployments subscribe to them
        AlertRule::new(
            "most_buy",
            AlertKind::Crossover {
                value: fast_ma.clone(),
                reference: Source::new("fast", Field::MostLine),
                direction: CrossDirection::Bullish,
            },
        ),
        AlertRule::new(
            "most_sell",
            AlertKind::Crossover {
                value: fast_ma,
                reference: Source::new("fast", Field::MostLine),
                direction: CrossDirection::Bearish,
            },
        ),
        AlertRule::new(
            "rsi_recross_bullish",
            AlertKind::Sequence {
                source: slow_rsi.clone(),
                stages: vec![
                    Threshold::above(69.0),
                    Threshold::below(50.0),
                    Threshold::above(50.0),
                ],
                rearm: Threshold::below(50.0),
            },
        ),
        AlertRule::new(
            "rsi_recross_bearish",
            AlertKind::Sequence {
                source: slow_rsi,
                stages: vec![
                    Threshold::below(31.0),
                    Threshold::above(50.0),
                    Threshold::below(50.0),
                ],
                rearm: Threshold::above(50.0),
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::OscillatorReading;

    #[test]
    fn test_threshold_boundaries() {
        assert!(!Threshold::above(50.0).holds(50.0));
        assert!(Threshold::at_least(50.0).holds(50.0));
        assert!(!Threshold::below(50.0).holds(50.0));
        assert!(Threshold::at_most(50.0).holds(50.0));
    }

    #[test]
    fn test_source_read() {
        let mut readings = Readings::new();
        readings.insert(
            "slow".to_string(),
            OscillatorReading {
                rsi: Some(55.0),
                moving_average: None,
                most_line: Some(48.0),
                direction: None,
            },
        );

        assert_eq!(Source::new("slow", Field::Rsi).read(&readings), Some(55.0));
        assert_eq!(Source::new("slow", Field::MovingAverage).read(&readings), None);
        assert_eq!(Source::new("fast", Field::Rsi).read(&readings), None);
        assert_eq!(Source::new("slow", Field::MostLine).to_string(), "slow.most");
    }

    #[test]
    fn test_rule_from_json() {
        let json = r#"{
            "name": "oversold",
            "timeframes": ["4h"],
            "kind": {
                "type": "threshold",
                "source": { "profile": "fast", "field": "rsi" },
                "condition": { "op": "below", "level": 30.0 }
            }
        }"#;

        let rule: AlertRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.cooldown_secs, None);
        assert_eq!(rule.cooldown(), chrono::Duration::seconds(DEFAULT_COOLDOWN_SECS as i64));
        assert_eq!(rule.cooldown_scope, CooldownScope::SymbolTimeframe);
        assert!(rule.applies_to("4h"));
        assert!(!rule.applies_to("1h"));
        assert_eq!(rule.kind.describe(), "fast.rsi < 30");
    }

    #[test]
    fn test_explicit_cooldown_survives_inherit() {
        let mut explicit = AlertRule::new("a", default_rules()[0].kind.clone())
            .with_cooldown(DEFAULT_COOLDOWN_SECS);
        let mut unset = AlertRule::new("b", default_rules()[0].kind.clone());

        explicit.inherit_cooldown(600);
        unset.inherit_cooldown(600);
        assert_eq!(explicit.cooldown_secs, Some(DEFAULT_COOLDOWN_SECS));
        assert_eq!(unset.cooldown_secs, Some(600));
    }

    #[test]
    fn test_default_rules_shape() {
        let rules = default_rules();
        let names: Vec<&str> = rules.iter().map(|r| r.name.as_str()).collect();
        assert!(names.contains(&"difference_alert"));
        assert!(names.contains(&"rsi_recross_bullish"));

        let daily = rules.iter().find(|r| r.name == "bullish_crossover_1d").unwrap();
        assert!(daily.applies_to("1d"));
        assert!(!daily.applies_to("1h"));
    }
}
