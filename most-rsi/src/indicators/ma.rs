//! Moving average variants

use crate::error::IndicatorError;
use crate::indicators::var::var;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ta::indicators::SimpleMovingAverage;
use ta::Next;

/// Supported moving average types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MaType {
    /// Simple mean
    Sma,
    /// Exponential, smoothing constant 2/(length+1), seeded with the SMA
    Ema,
    /// Linearly weighted
    Wma,
    /// Volume weighted
    Vwma,
    /// Wilder running mean (RMA)
    Smma,
    /// Adaptive CMO-weighted smoother
    Var,
}

impl MaType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sma => "SMA",
            Self::Ema => "EMA",
            Self::Wma => "WMA",
            Self::Vwma => "VWMA",
            Self::Smma => "SMMA",
            Self::Var => "VAR",
        }
    }
}

impl fmt::Display for MaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MaType {
    type Err = IndicatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SMA" => Ok(Self::Sma),
            "EMA" => Ok(Self::Ema),
            "WMA" => Ok(Self::Wma),
            "VWMA" => Ok(Self::Vwma),
            "SMMA" | "RMA" => Ok(Self::Smma),
            "VAR" => Ok(Self::Var),
            _ => Err(IndicatorError::UnknownMaType(s.to_string())),
        }
    }
}

/// Calculate a moving average over a null-free series.
///
/// The result has the same length as `values`, left-padded with `None` until
/// the average is defined. `volumes` is only read by `Vwma` and must then be
/// aligned with `values`.
pub fn moving_average(
    kind: MaType,
    values: &[f64],
    volumes: Option<&[f64]>,
    length: usize,
) -> Result<Vec<Option<f64>>, IndicatorError> {
    if length == 0 {
        return Err(IndicatorError::InvalidLength);
    }

    let out = match kind {
        MaType::Sma => sma(values, length),
        MaType::Ema => ema(values, length),
        MaType::Wma => wma(values, length),
        MaType::Vwma => {
            let volumes = volumes.ok_or(IndicatorError::MissingVolume { kind: "VWMA" })?;
            if volumes.len() != values.len() {
                return Err(IndicatorError::VolumeMismatch {
                    expected: values.len(),
                    actual: volumes.len(),
                });
            }
            vwma(values, volumes, length)
        }
        MaType::Smma => left_pad(values.len(), wilder(values, length)),
        MaType::Var => var(values, length),
    };

    Ok(out)
}

/// Smooth a series that may start with a `None` warm-up prefix (e.g. RSI).
///
/// The prefix is stripped, the dense tail is smoothed with volumes cut to
/// the same tail, and the prefix is restored. A `None` after the first value
/// is an error.
pub fn smooth_sparse(
    kind: MaType,
    series: &[Option<f64>],
    volumes: Option<&[f64]>,
    length: usize,
) -> Result<Vec<Option<f64>>, IndicatorError> {
    if let Some(volumes) = volumes {
        if volumes.len() != series.len() {
            return Err(IndicatorError::VolumeMismatch {
                expected: series.len(),
                actual: volumes.len(),
            });
        }
    }

    let start = series
        .iter()
        .position(Option::is_some)
        .unwrap_or(series.len());
    let dense = series[start..]
        .iter()
        .enumerate()
        .map(|(i, v)| v.ok_or(IndicatorError::Gap(start + i)))
        .collect::<Result<Vec<f64>, _>>()?;

    let smoothed = moving_average(kind, &dense, volumes.map(|v| &v[start..]), length)?;

    let mut out = vec![None; start];
    out.extend(smoothed);
    Ok(out)
}

/// Wilder running mean, seeded with the simple mean of the first `length`
/// values. Returns one value per input from index `length - 1` onward.
pub(crate) fn wilder(values: &[f64], length: usize) -> Vec<f64> {
    if length == 0 || values.len() < length {
        return Vec::new();
    }

    let n = length as f64;
    let mut prev = values[..length].iter().sum::<f64>() / n;
    let mut out = Vec::with_capacity(values.len() - length + 1);
    out.push(prev);
    for &v in &values[length..] {
        prev = (prev * (n - 1.0) + v) / n;
        out.push(prev);
    }
    out
}

fn left_pad(total: usize, dense: Vec<f64>) -> Vec<Option<f64>> {
    let mut out = vec![None; total - dense.len()];
    out.extend(dense.into_iter().map(Some));
    out
}

fn sma(values: &[f64], length: usize) -> Vec<Option<f64>> {
    let mut inner = match SimpleMovingAverage::new(length) {
        Ok(inner) => inner,
        Err(_) => return vec![None; values.len()],
    };

    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let avg = inner.next(v);
            (i + 1 >= length).then_some(avg)
        })
        .collect()
}

// SMA-seeded; ta's ExponentialMovingAverage starts from the first sample
fn ema(values: &[f64], length: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if values.len() < length {
        return out;
    }

    let k = 2.0 / (length as f64 + 1.0);
    let mut prev = values[..length].iter().sum::<f64>() / length as f64;
    out[length - 1] = Some(prev);
    for i in length..values.len() {
        prev += (values[i] - prev) * k;
        out[i] = Some(prev);
    }
    out
}

fn wma(values: &[f64], length: usize) -> Vec<Option<f64>> {
    let denominator = (length * (length + 1)) as f64 / 2.0;
    let mut out = vec![None; values.len()];
    for i in length.saturating_sub(1)..values.len() {
        let window = &values[i + 1 - length..=i];
        let weighted: f64 = window
            .iter()
            .enumerate()
            .map(|(j, v)| v * (j + 1) as f64)
            .sum();
        out[i] = Some(weighted / denominator);
    }
    out
}

fn vwma(values: &[f64], volumes: &[f64], length: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    for i in length.saturating_sub(1)..values.len() {
        let range = i + 1 - length..=i;
        let volume: f64 = volumes[range.clone()].iter().sum();
        if volume == 0.0 {
            continue;
        }
        let weighted: f64 = values[range.clone()]
            .iter()
            .zip(&volumes[range])
            .map(|(v, vol)| v * vol)
            .sum();
        out[i] = Some(weighted / volume);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("value should be defined");
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_sma() {
        let out = moving_average(MaType::Sma, &[1.0, 2.0, 3.0, 4.0, 5.0], None, 3).unwrap();
        assert_eq!(out[..2], [None, None]);
        assert_close(out[2], 2.0);
        assert_close(out[4], 4.0);
    }

    #[test]
    fn test_ema_seeded_with_sma() {
        let out = moving_average(MaType::Ema, &[2.0, 4.0, 6.0, 8.0], None, 3).unwrap();
        assert_eq!(out[..2], [None, None]);
        assert_close(out[2], 4.0);
        // k = 0.5: 4 + (8 - 4) * 0.5
        assert_close(out[3], 6.0);
    }

    #[test]
    fn test_wma() {
        let out = moving_average(MaType::Wma, &[1.0, 2.0, 3.0], None, 3).unwrap();
        // (1*1 + 2*2 + 3*3) / 6
        assert_close(out[2], 14.0 / 6.0);
    }

    #[test]
    fn test_vwma_requires_volume() {
        let values = [10.0, 20.0];
        assert_eq!(
            moving_average(MaType::Vwma, &values, None, 2),
            Err(IndicatorError::MissingVolume { kind: "VWMA" })
        );
        assert_eq!(
            moving_average(MaType::Vwma, &values, Some(&[1.0][..]), 2),
            Err(IndicatorError::VolumeMismatch { expected: 2, actual: 1 })
        );

        let out = moving_average(MaType::Vwma, &values, Some(&[1.0, 3.0][..]), 2).unwrap();
        assert_close(out[1], 17.5);

        let zero = moving_average(MaType::Vwma, &values, Some(&[0.0, 0.0][..]), 2).unwrap();
        assert_eq!(zero, vec![None, None]);
    }

    #[test]
    fn test_smma() {
        let out = moving_average(MaType::Smma, &[3.0, 3.0, 3.0, 7.0], None, 3).unwrap();
        assert_eq!(out[..2], [None, None]);
        assert_close(out[2], 3.0);
        assert_close(out[3], (3.0 * 2.0 + 7.0) / 3.0);
    }

    #[test]
    fn test_smooth_sparse_restores_prefix() {
        let series = [None, None, Some(1.0), Some(2.0), Some(3.0)];
        let out = smooth_sparse(MaType::Sma, &series, None, 2).unwrap();
        assert_eq!(out.len(), series.len());
        assert_eq!(out[..3], [None, None, None]);
        assert_close(out[3], 1.5);
        assert_close(out[4], 2.5);
    }

    #[test]
    fn test_smooth_sparse_rejects_gaps() {
        let series = [None, Some(1.0), None, Some(2.0)];
        assert_eq!(
            smooth_sparse(MaType::Sma, &series, None, 2),
            Err(IndicatorError::Gap(2))
        );
    }

    #[test]
    fn test_ma_type_parsing() {
        assert_eq!("var".parse::<MaType>(), Ok(MaType::Var));
        assert_eq!("RMA".parse::<MaType>(), Ok(MaType::Smma));
        assert!("HMA".parse::<MaType>().is_err());
        assert_eq!(MaType::Vwma.to_string(), "VWMA");
    }

    #[test]
    fn test_zero_length_rejected() {
        assert_eq!(
            moving_average(MaType::Ema, &[1.0], None, 0),
            Err(IndicatorError::InvalidLength)
        );
    }
}
