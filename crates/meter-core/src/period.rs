//! Parsing of reporting-period expressions given on the command line.

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;

use crate::error::{MeterError, Result};
use crate::models::Period;
use crate::time_utils::parse_date;

/// Resolve a period expression relative to `today`.
///
/// Accepted forms:
/// * `YYYY-MM-DD..YYYY-MM-DD` – explicit inclusive range
/// * `YYYY-MM-DD` – a single day
/// * `<N>d` – the last `N` days ending today
/// * `today`, `week` (last 7 days), `month` (month to date), `year` (year to date)
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use meter_core::period::parse_period;
///
/// let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// let p = parse_period("month", today).unwrap();
/// assert_eq!(p.to_string(), "2024-03-01..2024-03-15");
/// ```
pub fn parse_period(expr: &str, today: NaiveDate) -> Result<Period> {
    let lower = expr.trim().to_lowercase();

    match lower.as_str() {
        "today" => return Ok(Period::single_day(today)),
        "week" => return last_days(7, today, expr),
        "month" => {
            let first = today.with_day(1).unwrap_or(today);
            return Period::new(first, today);
        }
        "year" => {
            let first = today.with_ordinal(1).unwrap_or(today);
            return Period::new(first, today);
        }
        _ => {}
    }

    let relative = Regex::new(r"^(\d{1,5})d$").expect("regex is valid");
    if let Some(caps) = relative.captures(&lower) {
        let days: i64 = caps[1]
            .parse()
            .map_err(|_| MeterError::InvalidPeriod(expr.to_string()))?;
        return last_days(days, today, expr);
    }

    let range = Regex::new(r"^(\d{4}-\d{2}-\d{2})(?:\.\.(\d{4}-\d{2}-\d{2}))?$")
        .expect("regex is valid");
    if let Some(caps) = range.captures(&lower) {
        let from = parse_date(&caps[1]).map_err(|_| MeterError::InvalidPeriod(expr.to_string()))?;
        let to = match caps.get(2) {
            Some(m) => {
                parse_date(m.as_str()).map_err(|_| MeterError::InvalidPeriod(expr.to_string()))?
            }
            None => from,
        };
        return Period::new(from, to);
    }

    Err(MeterError::InvalidPeriod(expr.to_string()))
}

/// The `days`-long period ending on `today`.
fn last_days(days: i64, today: NaiveDate, expr: &str) -> Result<Period> {
    if days < 1 {
        return Err(MeterError::InvalidPeriod(expr.to_string()));
    }
    let from = today
        .checked_sub_signed(Duration::days(days - 1))
        .ok_or_else(|| MeterError::InvalidPeriod(expr.to_string()))?;
    Period::new(from, today)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2024, 3, 15)
    }

    #[test]
    fn test_parse_today() {
        let p = parse_period("today", today()).unwrap();
        assert_eq!(p, Period::single_day(today()));
    }

    #[test]
    fn test_parse_week() {
        let p = parse_period("week", today()).unwrap();
        assert_eq!(p.from(), date(2024, 3, 9));
        assert_eq!(p.to(), today());
        assert_eq!(p.days(), 7);
    }

    #[test]
    fn test_parse_month_to_date() {
        let p = parse_period("Month", today()).unwrap();
        assert_eq!(p.from(), date(2024, 3, 1));
        assert_eq!(p.to(), today());
    }

    #[test]
    fn test_parse_year_to_date() {
        let p = parse_period("year", today()).unwrap();
        assert_eq!(p.from(), date(2024, 1, 1));
        assert_eq!(p.days(), 75);
    }

    #[test]
    fn test_parse_relative_days() {
        let p = parse_period("30d", today()).unwrap();
        assert_eq!(p.days(), 30);
        assert_eq!(p.from(), date(2024, 2, 15));
    }

    #[test]
    fn test_parse_relative_one_day_is_today() {
        let p = parse_period("1d", today()).unwrap();
        assert_eq!(p, Period::single_day(today()));
    }

    #[test]
    fn test_parse_relative_zero_days_rejected() {
        assert!(parse_period("0d", today()).is_err());
    }

    #[test]
    fn test_parse_explicit_range() {
        let p = parse_period("2024-01-01..2024-01-31", today()).unwrap();
        assert_eq!(p.from(), date(2024, 1, 1));
        assert_eq!(p.to(), date(2024, 1, 31));
    }

    #[test]
    fn test_parse_single_date() {
        let p = parse_period("2024-01-05", today()).unwrap();
        assert_eq!(p, Period::single_day(date(2024, 1, 5)));
    }

    #[test]
    fn test_parse_reversed_range_rejected() {
        let err = parse_period("2024-02-01..2024-01-01", today()).unwrap_err();
        assert!(matches!(err, MeterError::InvalidPeriod(_)));
    }

    #[test]
    fn test_parse_invalid_date_rejected() {
        assert!(parse_period("2024-02-30", today()).is_err());
    }

    #[test]
    fn test_parse_garbage_rejected() {
        assert!(parse_period("last quarter", today()).is_err());
        assert!(parse_period("", today()).is_err());
    }
}
