//! UTC timestamps at second precision.
//!
//! All timestamps are stored as RFC 3339 strings with a `Z` suffix and no
//! fractional seconds, so they compare correctly as plain text in SQL.

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};

/// Current time truncated to whole seconds.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.trunc_subsecs(0).to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_are_second_precision_and_sortable() {
        let a = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let b = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 6).unwrap();
        let fa = format_timestamp(a);
        assert_eq!(fa, "2026-01-02T03:04:05Z");
        assert!(fa < format_timestamp(b));
        assert_eq!(parse_timestamp(&fa), Some(a));
    }

    #[test]
    fn now_has_no_subseconds() {
        assert_eq!(now_utc().timestamp_subsec_nanos(), 0);
    }
}
