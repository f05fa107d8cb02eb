use chrono::{DateTime, Datelike, Months, Utc};

/// Divide, returning `fallback` when the denominator is zero or the result
/// is not finite.
pub fn safe_div(numerator: f64, denominator: f64, fallback: f64) -> f64 {
    if denominator == 0.0 {
        return fallback;
    }
    let q = numerator / denominator;
    if q.is_finite() {
        q
    } else {
        fallback
    }
}

/// Whole units still missing to reach `target`, rounding the target up.
/// Never negative.
pub fn units_short(target: f64, have: u32) -> u32 {
    if !target.is_finite() || target <= 0.0 {
        return 0;
    }
    let needed = target.ceil() as i64 - i64::from(have);
    u32::try_from(needed.max(0)).unwrap_or(u32::MAX)
}

/// Position of `value` inside `[low, high]`, 0 at or below `low`, 1 at or
/// above `high`.
pub fn band_progress(value: f64, low: f64, high: f64) -> f64 {
    if value <= low {
        0.0
    } else if value >= high {
        1.0
    } else {
        (value - low) / (high - low)
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Reduce `a:b` to lowest terms, e.g. 10:4 -> 5:2.
pub fn simplify_ratio(a: u32, b: u32) -> (u32, u32) {
    match gcd(a, b) {
        0 => (0, 0),
        d => (a / d, b / d),
    }
}

/// Whole days elapsed from `from` to `to`, truncated toward zero.
pub fn whole_days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_days()
}

/// Calendar months from `from` to `to` plus the leftover whole days as a
/// fraction of a 30-day month. Zero when `to` is not after `from`.
pub fn months_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    if to <= from {
        return 0.0;
    }

    let mut months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    let mut anchor = add_months(from, months);
    while months > 0 && anchor > to {
        months -= 1;
        anchor = add_months(from, months);
    }

    let remainder_days = (to - anchor).num_days();
    f64::from(months) + remainder_days as f64 / 30.0
}

fn add_months(from: DateTime<Utc>, months: i32) -> DateTime<Utc> {
    from.checked_add_months(Months::new(months.max(0) as u32))
        .unwrap_or(from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn safe_div_guards_zero() {
        assert_eq!(safe_div(10.0, 4.0, 0.0), 2.5);
        assert_eq!(safe_div(10.0, 0.0, 2.5), 2.5);
        assert_eq!(safe_div(0.0, 0.0, -1.0), -1.0);
    }

    #[test]
    fn units_short_rounds_up_and_clamps() {
        assert_eq!(units_short(20.0, 4), 16);
        assert_eq!(units_short(10.333, 10), 1);
        assert_eq!(units_short(10.0, 10), 0);
        assert_eq!(units_short(3.0, 10), 0);
        assert_eq!(units_short(0.0, 0), 0);
        assert_eq!(units_short(f64::NAN, 0), 0);
    }

    #[test]
    fn units_short_saturates_instead_of_wrapping() {
        assert_eq!(units_short(2.0 * f64::from(u32::MAX), 1), u32::MAX);
        assert_eq!(units_short(f64::from(u32::MAX), 0), u32::MAX);
    }

    #[test]
    fn band_progress_interpolates() {
        assert_eq!(band_progress(1.0, 2.0, 3.0), 0.0);
        assert_eq!(band_progress(2.0, 2.0, 3.0), 0.0);
        assert!((band_progress(2.5, 2.0, 3.0) - 0.5).abs() < 1e-9);
        assert_eq!(band_progress(3.0, 2.0, 3.0), 1.0);
        assert_eq!(band_progress(7.0, 2.0, 3.0), 1.0);
    }

    #[test]
    fn simplify_ratio_reduces() {
        assert_eq!(simplify_ratio(10, 4), (5, 2));
        assert_eq!(simplify_ratio(25, 10), (5, 2));
        assert_eq!(simplify_ratio(7, 3), (7, 3));
        assert_eq!(simplify_ratio(6, 0), (1, 0));
        assert_eq!(simplify_ratio(0, 0), (0, 0));
    }

    #[test]
    fn whole_days_truncate() {
        let a = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 3, 7, 11, 0, 0).unwrap();
        assert_eq!(whole_days_between(a, b), 5);
        assert_eq!(whole_days_between(b, a), -5);
    }

    #[test]
    fn months_between_calendar_plus_fraction() {
        let from = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 3, 20, 8, 0, 0).unwrap();
        let months = months_between(from, to);
        assert!((months - (2.0 + 5.0 / 30.0)).abs() < 1e-9);
    }

    #[test]
    fn months_between_steps_back_when_day_not_reached() {
        let from = Utc.with_ymd_and_hms(2024, 1, 31, 10, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 2, 29, 9, 0, 0).unwrap();
        let months = months_between(from, to);
        assert!((months - 28.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn months_between_non_positive_span() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(months_between(t, t), 0.0);
        assert_eq!(months_between(t, t - chrono::Duration::days(3)), 0.0);
    }
}
