//! RSI (Relative Strength Index) with Wilder smoothing

use crate::error::IndicatorError;
use crate::indicators::ma::wilder;

/// Calculate RSI over a close series.
///
/// Average gain and loss are seeded with the simple mean of the first
/// `length` deltas and then smoothed recursively. `ta::indicators::RelativeStrengthIndex`
/// uses an EMA seeded from the first delta instead, so it is not used here. The result has the same
/// length as `closes`; the first `length` entries are `None`.
pub fn rsi(closes: &[f64], length: usize) -> Result<Vec<Option<f64>>, IndicatorError> {
    if length == 0 {
        return Err(IndicatorError::InvalidLength);
    }

    let mut out = vec![None; closes.len()];
    if closes.len() <= length {
        return Ok(out);
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = closes
        .windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            if change > 0.0 {
                (change, 0.0)
            } else {
                (0.0, -change)
            }
        })
        .unzip();

    let avg_gain = wilder(&gains, length);
    let avg_loss = wilder(&losses, length);

    for (k, (gain, loss)) in avg_gain.iter().zip(avg_loss.iter()).enumerate() {
        out[k + length] = Some(from_averages(*gain, *loss));
    }

    Ok(out)
}

/// RSI from smoothed averages. A flat series (no gains, no losses) is neutral.
pub fn from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
