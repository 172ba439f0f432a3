//! Date/interval arithmetic (ambient helper surface named in SPEC_FULL
//! §4.E/§4.G: `DATE +/- INTERVAL`, `TIMESTAMP +/- INTERVAL`, `DATE - DATE`).
//! The binder only resolves the *type* of these expressions
//! ([`crate::binder::bind_binary_type`]); the actual value arithmetic lives
//! here so the expression evaluator in `execution` can share one
//! implementation rather than inlining it per operator.

use chrono::{Datelike, Duration, NaiveDate};

use crate::value::Interval;

/// Adds an interval to a DATE (days-since-epoch `i32`), applying the
/// months component first (calendar arithmetic, clamped to the shorter
/// month's last day the way `2024-01-31 + 1 month` clamps to `2024-02-29`),
/// then days, then truncating any sub-day micros component.
pub fn date_add_interval(days: i32, iv: &Interval) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let date = epoch + Duration::days(days as i64);
    let shifted = add_months(date, iv.months);
    let shifted = shifted + Duration::days(iv.days as i64);
    (shifted - epoch).num_days() as i32
}

pub fn date_sub_interval(days: i32, iv: &Interval) -> i32 {
    date_add_interval(days, &iv.negate())
}

/// `DATE - DATE` yields an INTERVAL expressed purely in days (no months
/// component, matching an `Interval::fromDifference`-style day-granularity
/// result for date subtraction).
pub fn date_sub_date(lhs_days: i32, rhs_days: i32) -> Interval {
    Interval::new(0, lhs_days - rhs_days, 0)
}

pub fn timestamp_add_interval(micros: i64, iv: &Interval) -> i64 {
    let days = micros.div_euclid(86_400_000_000);
    let time_micros = micros.rem_euclid(86_400_000_000);
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let date = epoch + Duration::days(days);
    let shifted = add_months(date, iv.months) + Duration::days(iv.days as i64);
    let shifted_days = (shifted - epoch).num_days();
    shifted_days * 86_400_000_000 + time_micros + iv.micros
}

pub fn timestamp_sub_interval(micros: i64, iv: &Interval) -> i64 {
    timestamp_add_interval(micros, &iv.negate())
}

pub fn timestamp_sub_timestamp(lhs_micros: i64, rhs_micros: i64) -> Interval {
    Interval::new(0, 0, lhs_micros - rhs_micros)
}

/// Adds whole calendar months to `date`, clamping the day-of-month to the
/// target month's length rather than overflowing into the next month.
fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    if months == 0 {
        return date;
    }
    let total_months = date.year() * 12 + (date.month0() as i32) + months;
    let target_year = total_months.div_euclid(12);
    let target_month0 = total_months.rem_euclid(12);
    let day = date.day();
    for candidate_day in (1..=day).rev() {
        if let Some(d) = NaiveDate::from_ymd_opt(target_year, target_month0 as u32 + 1, candidate_day) {
            return d;
        }
    }
    NaiveDate::from_ymd_opt(target_year, target_month0 as u32 + 1, 1).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn days_from_ymd(y: i32, m: u32, d: u32) -> i32 {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        (NaiveDate::from_ymd_opt(y, m, d).unwrap() - epoch).num_days() as i32
    }

    #[test]
    fn add_one_month_clamps_to_shorter_month() {
        let jan31 = days_from_ymd(2024, 1, 31);
        let iv = Interval::new(1, 0, 0);
        let result = date_add_interval(jan31, &iv);
        assert_eq!(result, days_from_ymd(2024, 2, 29));
    }

    #[test]
    fn date_minus_date_is_day_granularity_interval() {
        let a = days_from_ymd(2024, 3, 10);
        let b = days_from_ymd(2024, 3, 1);
        let iv = date_sub_date(a, b);
        assert_eq!(iv, Interval::new(0, 9, 0));
    }

    #[test]
    fn add_then_subtract_is_identity() {
        let d = days_from_ymd(2024, 6, 15);
        let iv = Interval::new(2, 10, 0);
        let forward = date_add_interval(d, &iv);
        let back = date_sub_interval(forward, &iv);
        assert_eq!(back, d);
    }
}
