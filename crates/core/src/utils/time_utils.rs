use chrono::{DateTime, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;

/// Canonical timezone for valuation dates and the evening profit window.
/// Upstream publishes NAVs against the mainland China trading calendar, so
/// all "what day is it" and "what hour is it" questions use this zone.
pub const VALUATION_TZ: Tz = chrono_tz::Asia::Shanghai;

/// Converts a UTC instant to a valuation date in the given timezone.
///
/// This is the single source of truth for converting instants to domain
/// dates. Use this whenever you need to derive a "business date" from a
/// timestamp.
pub fn valuation_date_from_utc(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// The valuation date for an instant in the default valuation timezone.
pub fn valuation_date(instant: DateTime<Utc>) -> NaiveDate {
    valuation_date_from_utc(instant, VALUATION_TZ)
}

/// The hour of day (0-23) for an instant in the default valuation timezone.
pub fn valuation_hour(instant: DateTime<Utc>) -> u32 {
    instant.with_timezone(&VALUATION_TZ).hour()
}

/// Formats a date the way upstream publishes valuation dates.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parses an upstream `YYYY-MM-DD` date string.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn utc_evening_is_next_morning_in_the_valuation_zone() {
        // 2026-08-24 22:30 UTC is 2026-08-25 06:30 in Asia/Shanghai.
        let instant = Utc.with_ymd_and_hms(2026, 8, 24, 22, 30, 0).unwrap();
        assert_eq!(
            valuation_date(instant),
            NaiveDate::from_ymd_opt(2026, 8, 25).unwrap()
        );
        assert_eq!(valuation_hour(instant), 6);
    }

    #[test]
    fn dates_round_trip_through_the_upstream_format() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 25).unwrap();
        assert_eq!(format_date(date), "2026-08-25");
        assert_eq!(parse_date("2026-08-25"), Some(date));
        assert_eq!(parse_date(" 2026-08-25 "), Some(date));
        assert_eq!(parse_date("-"), None);
        assert_eq!(parse_date(""), None);
    }
}
