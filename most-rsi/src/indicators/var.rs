//! VAR: variable index dynamic average weighted by the Chande Momentum Oscillator

/// Number of deltas summed for the CMO weight. Independent of the smoothing length.
pub const CMO_WINDOW: usize = 9;

/// Adaptive smoother.
///
/// Each bar blends the current sample with the previous output using the
/// weight `|cmo| * 2/(length+1)`, where `cmo` is built from the up and down
/// moves of the last [`CMO_WINDOW`] deltas. A choppy series (cmo near zero)
/// barely moves the output; a strongly trending one tracks the input at the
/// full EMA rate. Index 0 has no delta and stays `None`; index 1 blends
/// against itself.
pub fn var(values: &[f64], length: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut out = vec![None; n];
    if n < 2 || length == 0 {
        return out;
    }

    let alpha = 2.0 / (length as f64 + 1.0);
    let mut ups = vec![0.0; n];
    let mut downs = vec![0.0; n];
    for i in 1..n {
        let change = values[i] - values[i - 1];
        if change > 0.0 {
            ups[i] = change;
        } else if change < 0.0 {
            downs[i] = -change;
        }
    }

    let mut prev: Option<f64> = None;
    for i in 1..n {
        let from = (i + 1).saturating_sub(CMO_WINDOW);
        let up: f64 = ups[from..=i].iter().sum();
        let down: f64 = downs[from..=i].iter().sum();
        let cmo = if up + down == 0.0 {
            0.0
        } else {
            (up - down) / (up + down)
        };

        let weight = alpha * cmo.abs();
        let base = prev.unwrap_or(values[i]);
        let value = weight * values[i] + (1.0 - weight) * base;
        out[i] = Some(value);
        prev = Some(value);
    }

    out
}
