//! Time helpers - business timezone conversions
//!
//! Date string parsing happens at the API handler layer; everything below
//! works with `DateTime<Utc>`.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::utils::{AppError, AppResult};

/// Parse a date string (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// Parse a date-range query parameter: RFC 3339 or plain YYYY-MM-DD
///
/// A plain date resolves to midnight of that day in the business timezone.
pub fn parse_datetime_param(value: &str, tz: Tz) -> AppResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    parse_date(value).map(|date| day_start(date, tz))
}

/// Start of day (00:00:00) in the business timezone, as UTC
///
/// DST gap fallback: if local midnight does not exist, fall back to UTC.
pub fn day_start(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let naive = date.and_hms_opt(0, 0, 0).unwrap();
    tz.from_local_datetime(&naive)
        .latest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// Midnight of the current day in the business timezone, as UTC
pub fn today_start(tz: Tz) -> DateTime<Utc> {
    day_start(Utc::now().with_timezone(&tz).date_naive(), tz)
}

/// Calendar-day key (YYYY-MM-DD) of an instant in the business timezone
pub fn day_key(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso_day() {
        assert!(parse_date("2026-08-30").is_ok());
        assert!(parse_date("30/08/2026").is_err());
    }

    #[test]
    fn day_start_respects_timezone() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        let tunis = day_start(date, chrono_tz::Africa::Tunis);
        let utc = day_start(date, chrono_tz::UTC);
        // Tunis is UTC+1, so its midnight is an hour earlier in UTC
        assert_eq!((utc - tunis).num_hours(), 1);
    }

    #[test]
    fn day_key_uses_business_timezone() {
        // 23:30 UTC is already the next day in UTC+1
        let at = Utc.with_ymd_and_hms(2026, 8, 30, 23, 30, 0).unwrap();
        assert_eq!(day_key(at, chrono_tz::UTC), "2026-08-30");
        assert_eq!(day_key(at, chrono_tz::Africa::Tunis), "2026-08-31");
    }
}
