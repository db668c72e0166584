//! Small numeric helpers shared by the aggregation stages.
//!
//! Every function here returns `None` for an undefined statistic instead of
//! a NaN or a zero, so callers can carry "undefined" through to the output.

/// Monthly time index used to order and align series: `year * 12 + month`.
pub fn time_index(year: i32, month: u32) -> i32 {
    year * 12 + month as i32
}

/// Inverse of [`time_index`], returning `(year, month)` with month in 1..=12.
pub fn from_time_index(index: i32) -> (i32, u32) {
    let zero_based = index - 1;
    let year = zero_based.div_euclid(12);
    let month = zero_based.rem_euclid(12) as u32 + 1;
    (year, month)
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Mean over the present values only (SQL `AVG` semantics).
pub fn mean_present<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let present: Vec<f64> = values.into_iter().flatten().collect();
    mean(&present)
}

/// Sum over the present values only, `None` when nothing is present (SQL `SUM`).
pub fn sum_present<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values.into_iter().fold(None, |acc, value| match (acc, value) {
        (Some(total), Some(v)) => Some(total + v),
        (None, Some(v)) => Some(v),
        (acc, None) => acc,
    })
}

/// Sample standard deviation (n - 1 denominator). Undefined below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Pearson correlation of paired observations.
///
/// Undefined with fewer than two pairs, when either side has zero variance,
/// or when a non-finite value reaches the sums.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }

    let r = cov / (var_x.sqrt() * var_y.sqrt());
    if !r.is_finite() {
        return None;
    }
    // Rounding can push |r| a hair past 1 for perfectly aligned series
    Some(r.clamp(-1.0, 1.0))
}
