use crate::util::average;

/// First difference with an implicit zero baseline before the window.
///
/// Negative deltas are upstream revisions and are kept as-is.
pub fn daily_delta(series: &[i64]) -> Vec<i64> {
    let mut daily = Vec::with_capacity(series.len());
    let mut prev = 0i64;
    for &v in series {
        daily.push(v - prev);
        prev = v;
    }
    daily
}

/// Trailing simple moving average over `width` samples, left-padded with
/// `width - 1` zeros so the output has the input's length.
pub fn rolling_average(daily: &[i64], width: usize) -> Vec<f64> {
    let width = width.max(1);
    let mut padded = vec![0.0f64; width - 1];
    padded.extend(daily.iter().map(|v| *v as f64));
    padded.windows(width).map(average).collect()
}

/// Daily view of a cumulative series.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub daily: Vec<i64>,
    pub rolling: Vec<f64>,
    pub last_daily: i64,
    pub last_average: f64,
    pub peak: i64,
    /// Position of the first maximum within the date window (unpadded).
    pub peak_index: usize,
}

/// Summarize `series[start..]` while taking deltas and averages over the
/// whole series, so the first kept day still has its true predecessor.
/// `peak_index` is relative to `start`.
pub fn summarize_from(series: &[i64], width: usize, start: usize) -> DailySummary {
    let start = start.min(series.len());
    let mut daily = daily_delta(series);
    let rolling = rolling_average(&daily, width).split_off(start);
    let daily = daily.split_off(start);
    let (peak_index, peak) = daily
        .iter()
        .copied()
        .enumerate()
        .fold((0usize, i64::MIN), |best, (i, v)| if v > best.1 { (i, v) } else { best });
    DailySummary {
        last_daily: daily.last().copied().unwrap_or(0),
        last_average: rolling.last().copied().unwrap_or(0.0),
        peak: if daily.is_empty() { 0 } else { peak },
        peak_index,
        daily,
        rolling,
    }
}
