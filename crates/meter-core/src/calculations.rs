//! Derived display figures for consumption reports.

/// Period-over-period change, in percent.
///
/// When `previous` is zero there is no meaningful ratio: the result is `100`
/// if anything was consumed now, otherwise `0`.
///
/// # Examples
///
/// ```
/// use meter_core::calculations::percentage_change;
///
/// assert_eq!(percentage_change(150.0, 100.0), 50.0);
/// assert_eq!(percentage_change(5.0, 0.0), 100.0);
/// assert_eq!(percentage_change(0.0, 0.0), 0.0);
/// ```
pub fn percentage_change(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else if current > 0.0 {
        100.0
    } else {
        0.0
    }
}

/// Mean consumption per day over `days` days; `0.0` for a non-positive count.
pub fn average_daily(total: f64, days: i64) -> f64 {
    if days <= 0 {
        return 0.0;
    }
    total / days as f64
}

/// Clamped counter difference: `max(0, end - start)`.
pub fn clamped_delta(start: f64, end: f64) -> f64 {
    let delta = end - start;
    if delta > 0.0 {
        delta
    } else {
        0.0
    }
}
