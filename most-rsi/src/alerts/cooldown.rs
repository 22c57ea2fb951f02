//! Time-based alert deduplication shared by every pair

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Entries older than this (or than their own horizon, if longer) are
/// dropped on the next ledger access
pub const DEFAULT_RETENTION_HOURS: i64 = 24;

/// Ledger key: (symbol, rule[, timeframe])
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CooldownKey {
    pub symbol: String,
    pub rule: String,
    pub timeframe: Option<String>,
}

impl CooldownKey {
    pub fn new(symbol: &str, rule: &str, timeframe: Option<&str>) -> Self {
        Self {
            symbol: symbol.to_string(),
            rule: rule.to_string(),
            timeframe: timeframe.map(str::to_string),
        }
    }
}

impl fmt::Display for CooldownKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.timeframe {
            Some(tf) => write!(f, "{}_{}_{}", self.symbol, self.rule, tf),
            None => write!(f, "{}_{}", self.symbol, self.rule),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Stamp {
    sent: DateTime<Utc>,
    horizon: Duration,
}

/// Proof that a send slot was taken; hand it back with
/// [`CooldownLedger::release`] if the send fails
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub key: CooldownKey,
    pub stamped: DateTime<Utc>,
    previous: Option<Stamp>,
}

/// Last-sent timestamps guarded by a mutex so check-and-stamp is one step
#[derive(Debug)]
pub struct CooldownLedger {
    entries: Mutex<HashMap<CooldownKey, Stamp>>,
    retention: Duration,
}

impl CooldownLedger {
    pub fn new() -> Self {
        Self::with_retention(Duration::hours(DEFAULT_RETENTION_HOURS))
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            retention,
        }
    }

    /// Stamp `key` with `now` unless it was stamped less than `horizon` ago.
    ///
    /// Returns `None` when the alert is still cooling down.
    pub fn try_reserve(
        &self,
        key: &CooldownKey,
        now: DateTime<Utc>,
        horizon: Duration,
    ) -> Option<Reservation> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Self::purge_locked(&mut entries, now, self.retention);

        let previous = entries.get(key).copied();
        if let Some(last) = previous {
            if now - last.sent < horizon {
                return None;
            }
        }

        entries.insert(key.clone(), Stamp { sent: now, horizon });
        Some(Reservation {
            key: key.clone(),
            stamped: now,
            previous,
        })
    }

    /// Undo a reservation after a failed send.
    ///
    /// Only restores the prior stamp if nobody re-stamped the key since.
    pub fn release(&self, reservation: Reservation) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.get(&reservation.key).map(|s| s.sent) != Some(reservation.stamped) {
            return;
        }
        match reservation.previous {
            Some(previous) => {
                entries.insert(reservation.key, previous);
            }
            None => {
                entries.remove(&reservation.key);
            }
        }
    }

    pub fn last_sent(&self, key: &CooldownKey) -> Option<DateTime<Utc>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).map(|s| s.sent)
    }

    /// Drop entries older than both the retention and their own cooldown
    pub fn purge(&self, now: DateTime<Utc>) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Self::purge_locked(&mut entries, now, self.retention);
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge_locked(
        entries: &mut HashMap<CooldownKey, Stamp>,
        now: DateTime<Utc>,
        retention: Duration,
    ) {
        entries.retain(|_, stamp| now - stamp.sent <= retention.max(stamp.horizon));
    }
}

impl Default for CooldownLedger {
    fn default() -> Self {
        Self::new()
    }
}
