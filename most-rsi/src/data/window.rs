//! Bounded, time-ordered bar history for one (symbol, timeframe) pair

use crate::data::{Bar, BarField};
use crate::error::DataError;
use std::collections::VecDeque;

/// Default number of bars kept per pair
pub const DEFAULT_CAPACITY: usize = 500;

/// What `CandleWindow::append` did with a bar
#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    /// The newest bar had the same timestamp and was replaced in place
    Replaced,
    /// The bar was pushed
    Pushed,
    /// The bar was pushed and the oldest bar was evicted
    Evicted(Bar),
}

/// Fixed-capacity FIFO of bars with replace-last semantics
#[derive(Debug, Clone)]
pub struct CandleWindow {
    bars: VecDeque<Bar>,
    capacity: usize,
}

impl CandleWindow {
    /// Create an empty window (capacity is at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            bars: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a bar.
    ///
    /// A bar sharing the newest bar's timestamp replaces it, whether or not
    /// the stored bar was marked final. Older bars are rejected and leave the
    /// window untouched.
    pub fn append(&mut self, bar: Bar) -> Result<AppendOutcome, DataError> {
        if let Some(last) = self.bars.back_mut() {
            if last.timestamp == bar.timestamp {
                *last = bar;
                return Ok(AppendOutcome::Replaced);
            }
            if bar.timestamp < last.timestamp {
                return Err(DataError::OutOfOrder {
                    newest: last.timestamp,
                    got: bar.timestamp,
                });
            }
        }

        self.bars.push_back(bar);
        if self.bars.len() > self.capacity {
            if let Some(evicted) = self.bars.pop_front() {
                return Ok(AppendOutcome::Evicted(evicted));
            }
        }
        Ok(AppendOutcome::Pushed)
    }

    /// Ordered values of one field across all stored bars
    pub fn series(&self, field: BarField) -> Vec<f64> {
        self.bars.iter().map(|b| b.field(field)).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.series(BarField::Close)
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.series(BarField::Volume)
    }

    /// Whether enough bars are stored to run the oscillators
    pub fn is_warm(&self, required: usize) -> bool {
        self.bars.len() >= required
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.back()
    }

    pub fn bars(&self) -> impl Iterator<Item = &Bar> {
        self.bars.iter()
    }
}

impl Default for CandleWindow {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(ts: i64, close: f64) -> Bar {
        Bar::new(ts, close, close, close, close, 1.0, true)
    }

    #[test]
    fn test_replace_last_keeps_length() {
        let mut window = CandleWindow::new(3);
        window.append(bar(1, 10.0)).unwrap();
        window.append(bar(2, 11.0)).unwrap();

        let outcome = window.append(bar(2, 12.0)).unwrap();
        assert_eq!(outcome, AppendOutcome::Replaced);
        assert_eq!(window.len(), 2);
        assert_eq!(window.closes(), vec![10.0, 12.0]);
    }

    #[test]
    fn test_eviction_is_fifo() {
        let mut window = CandleWindow::new(3);
        for ts in 1..=3 {
            assert_eq!(window.append(bar(ts, ts as f64)).unwrap(), AppendOutcome::Pushed);
        }
        let outcome = window.append(bar(4, 4.0)).unwrap();
        assert_eq!(outcome, AppendOutcome::Evicted(bar(1, 1.0)));
        assert_eq!(window.len(), 3);
        assert_eq!(window.closes(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_out_of_order_rejected() {
        let mut window = CandleWindow::new(5);
        window.append(bar(10, 1.0)).unwrap();
        let err = window.append(bar(5, 2.0)).unwrap_err();
        assert_eq!(err, DataError::OutOfOrder { newest: 10, got: 5 });
        assert_eq!(window.closes(), vec![1.0]);
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let mut window = CandleWindow::new(7);
        for i in 0..100i64 {
            // Every third update re-sends the current bar
            let ts = i - i / 3;
            window.append(bar(ts, i as f64)).unwrap();
            assert!(window.len() <= window.capacity());
        }
        assert!(window.is_warm(7));
        assert!(!window.is_warm(8));
    }
}
