//! Per-second rate of change of a point sequence, as drawn by the console charts.

use crate::types::Point;

/// Computes the per-second change between consecutive points of a flat
/// `[t0, v0, t1, v1, ...]` sequence with millisecond timestamps.
///
/// For every `i >= 1` the output holds `time[i]` followed by
/// `(value[i] - value[i-1]) * 1000 / (time[i] - time[i-1])` (truncating), so its length is
/// `2 * (n - 1)` for `n` input points.
///
/// Callers are expected to pass at least two points. Shorter input yields an empty result,
/// a zero time delta yields a rate of `0` and rates beyond the `i64` range saturate.
pub fn per_second(points: &[i64]) -> Vec<i64> {
    let n = points.len() / 2;
    if n < 2 {
        return Vec::new();
    }
    let mut rates = Vec::with_capacity(2 * (n - 1));
    for pair in points[..2 * n].windows(4).step_by(2) {
        let (t0, v0, t1, v1) = (pair[0], pair[1], pair[2], pair[3]);
        rates.push(t1);
        rates.push(rate(t0, v0, t1, v1));
    }
    rates
}

/// Same as [`per_second`] over typed points: each output point carries the later point's
/// time and the rate towards it.
pub fn per_second_points(points: &[Point]) -> Vec<Point> {
    points
        .windows(2)
        .map(|pair| {
            let (a, b) = (pair[0], pair[1]);
            Point::new(b.time, rate(a.time, a.value, b.time, b.value))
        })
        .collect()
}

#[inline]
fn rate(t0: i64, v0: i64, t1: i64, v1: i64) -> i64 {
    let dt = i128::from(t1) - i128::from(t0);
    if dt == 0 {
        return 0;
    }
    let per_second = (i128::from(v1) - i128::from(v0)) * 1000 / dt;
    per_second.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}
