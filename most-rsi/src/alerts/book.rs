//! Per-pair alert evaluation

use crate::alerts::{
    AlertKind, AlertRule, CooldownKey, CooldownScope, CrossDirection, GateState,
};
use crate::engine::{IndicatorSnapshot, Readings};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// A firing decision, ready for cooldown check and dispatch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    pub symbol: String,
    pub timeframe: String,
    pub rule: String,
    pub description: String,
    #[serde(skip)]
    pub cooldown_key: CooldownKey,
    #[serde(skip)]
    pub cooldown: Duration,
    /// Close of the bar that triggered the alert
    pub price: Option<f64>,
    /// Values the predicate looked at, labelled like `slow.rsi`
    pub values: Vec<(String, f64)>,
    pub triggered_at: DateTime<Utc>,
}

/// Where an evaluation happens
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub symbol: &'a str,
    pub timeframe: &'a str,
    pub price: Option<f64>,
    pub now: DateTime<Utc>,
}

/// Gate states for one pair, one slot per configured rule
#[derive(Debug, Clone, Default)]
pub struct AlertBook {
    gates: Vec<GateState>,
}

impl AlertBook {
    pub fn new(rules: &[AlertRule]) -> Self {
        let gates = rules
            .iter()
            .map(|rule| match &rule.kind {
                AlertKind::Sequence { stages, .. } => GateState::new(stages.len()),
                _ => GateState::default(),
            })
            .collect();
        Self { gates }
    }

    /// Evaluate every rule that applies to the context's timeframe against
    /// the latest snapshot.
    pub fn evaluate(
        &mut self,
        rules: &[AlertRule],
        snapshot: &IndicatorSnapshot,
        ctx: &EvalContext<'_>,
    ) -> Vec<AlertEvent> {
        if self.gates.len() != rules.len() {
            *self = Self::new(rules);
        }

        let mut events = Vec::new();
        for (rule, gate) in rules.iter().zip(self.gates.iter_mut()) {
            if !rule.applies_to(ctx.timeframe) {
                continue;
            }
            if let Some(values) = check(rule, gate, &snapshot.current, &snapshot.previous) {
                tracing::debug!(
                    "🔔 {} {} fired {} {:?}",
                    ctx.symbol,
                    ctx.timeframe,
                    rule.name,
                    values
                );
                events.push(event(rule, ctx, values));
            }
        }
        events
    }

    pub fn gates(&self) -> &[GateState] {
        &self.gates
    }
}

fn check(
    rule: &AlertRule,
    gate: &mut GateState,
    current: &Readings,
    previous: &Readings,
) -> Option<Vec<(String, f64)>> {
    match &rule.kind {
        AlertKind::Convergence {
            a,
            b,
            max_distance,
            floor,
        } => {
            let va = a.read(current)?;
            let vb = b.read(current)?;
            if let Some(floor) = floor {
                if !floor.holds(va) || !floor.holds(vb) {
                    return None;
                }
            }
            let distance = (va - vb).abs();
            (distance <= *max_distance).then(|| {
                vec![
                    (a.to_string(), va),
                    (b.to_string(), vb),
                    ("distance".to_string(), distance),
                ]
            })
        }
        AlertKind::Threshold { source, condition } => {
            let v = source.read(current)?;
            condition.holds(v).then(|| vec![(source.to_string(), v)])
        }
        AlertKind::Crossover {
            value,
            reference,
            direction,
        } => {
            let prev_v = value.read(previous)?;
            let prev_r = reference.read(previous)?;
            let cur_v = value.read(current)?;
            let cur_r = reference.read(current)?;
            let crossed = match direction {
                CrossDirection::Bullish => prev_v < prev_r && cur_v > cur_r,
                CrossDirection::Bearish => prev_v > prev_r && cur_v < cur_r,
            };
            crossed.then(|| vec![(value.to_string(), cur_v), (reference.to_string(), cur_r)])
        }
        AlertKind::Sequence {
            source,
            stages,
            rearm,
        } => {
            let v = source.read(current)?;
            gate.observe(v, stages, rearm)
                .then(|| vec![(source.to_string(), v)])
        }
    }
}

fn event(rule: &AlertRule, ctx: &EvalContext<'_>, values: Vec<(String, f64)>) -> AlertEvent {
    let timeframe = match rule.cooldown_scope {
        CooldownScope::Symbol => None,
        CooldownScope::SymbolTimeframe => Some(ctx.timeframe),
    };
    AlertEvent {
        symbol: ctx.symbol.to_string(),
        timeframe: ctx.timeframe.to_string(),
        rule: rule.name.clone(),
        description: rule.kind.describe(),
        cooldown_key: CooldownKey::new(ctx.symbol, &rule.name, timeframe),
        cooldown: rule.cooldown(),
        price: ctx.price,
        values,
        triggered_at: ctx.now,
    }
}
