//! MOST (Moving Stop) trailing envelope over a smoothed oscillator

use crate::config::OscillatorProfile;
use crate::error::IndicatorError;
use crate::indicators::{rsi, smooth_sparse};
use serde::{Deserialize, Serialize};

/// Trend direction of the MOST line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// +1 for `Up`, -1 for `Down`
    pub fn sign(&self) -> i8 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

/// MOST line output, one entry per input bar
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MostSeries {
    pub line: Vec<Option<f64>>,
    pub direction: Vec<Option<Direction>>,
    /// Value crossed above the line on this bar
    pub crossover: Vec<bool>,
    /// Value crossed below the line on this bar
    pub crossunder: Vec<bool>,
}

impl MostSeries {
    fn with_len(n: usize) -> Self {
        Self {
            line: vec![None; n],
            direction: vec![None; n],
            crossover: vec![false; n],
            crossunder: vec![false; n],
        }
    }

    pub fn len(&self) -> usize {
        self.line.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }
}

/// Build the MOST line over `values`.
///
/// The long stop ratchets up while the value rises and the short stop
/// ratchets down while it falls; the line follows whichever stop matches the
/// current direction. Direction flips at most once per bar and `None`
/// inputs produce `None` line and direction.
pub fn most_line(values: &[Option<f64>], stop_loss_percent: f64) -> MostSeries {
    let mut out = MostSeries::with_len(values.len());

    for (i, value) in values.iter().enumerate() {
        let Some(v) = *value else { continue };

        let prev_line = i
            .checked_sub(1)
            .and_then(|p| out.line[p])
            .unwrap_or(v);
        let prev_dir = i
            .checked_sub(1)
            .and_then(|p| out.direction[p])
            .unwrap_or(Direction::Up);

        let band = v * stop_loss_percent / 100.0;

        let mut long_stop = v - band;
        if v > prev_line {
            long_stop = long_stop.max(prev_line);
        }
        let mut short_stop = v + band;
        if v < prev_line {
            short_stop = short_stop.min(prev_line);
        }

        let dir = match prev_dir {
            Direction::Down if v > short_stop => Direction::Up,
            Direction::Up if v < long_stop => Direction::Down,
            other => other,
        };
        let line = match dir {
            Direction::Up => long_stop,
            Direction::Down => short_stop,
        };

        out.line[i] = Some(line);
        out.direction[i] = Some(dir);

        if i > 0 {
            if let (Some(pv), Some(pl)) = (values[i - 1], out.line[i - 1]) {
                out.crossover[i] = pv < pl && v > line;
                out.crossunder[i] = pv > pl && v < line;
            }
        }
    }

    out
}

/// Latest values of one oscillator profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OscillatorReading {
    pub rsi: Option<f64>,
    pub moving_average: Option<f64>,
    pub most_line: Option<f64>,
    pub direction: Option<Direction>,
}

/// Full RSI -> moving average -> MOST pipeline for one profile
#[derive(Debug, Clone, PartialEq)]
pub struct MostRsiSeries {
    pub rsi: Vec<Option<f64>>,
    pub moving_average: Vec<Option<f64>>,
    pub most: MostSeries,
}

impl MostRsiSeries {
    /// Reading at the newest bar
    pub fn last_reading(&self) -> OscillatorReading {
        let last = |s: &[Option<f64>]| s.last().copied().flatten();
        OscillatorReading {
            rsi: last(&self.rsi),
            moving_average: last(&self.moving_average),
            most_line: last(&self.most.line),
            direction: self.most.direction.last().copied().flatten(),
        }
    }
}

/// Calculate RSI, smooth it with the profile's moving average and run the
/// MOST line over the result.
pub fn compute_most_rsi(
    closes: &[f64],
    volumes: &[f64],
    profile: &OscillatorProfile,
) -> Result<MostRsiSeries, IndicatorError> {
    let rsi = rsi(closes, profile.rsi_length)?;
    let moving_average =
        smooth_sparse(profile.ma_type, &rsi, Some(volumes), profile.ma_length)?;
    let most = most_line(&moving_average, profile.stop_loss_percent);

    Ok(MostRsiSeries {
        rsi,
        moving_average,
        most,
    })
}
