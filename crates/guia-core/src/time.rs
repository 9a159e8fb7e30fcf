//! Brasília-time helpers.
//!
//! Daily limits reset at midnight in Brasília. Brazil has not observed DST
//! since 2019, so a fixed UTC-3 offset is sufficient.

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Offset of Brasília time from UTC, in hours.
const BRASILIA_OFFSET_HOURS: i64 = 3;

/// Civil date in Brasília for a UTC instant.
#[must_use]
pub fn brasilia_date(at: DateTime<Utc>) -> NaiveDate {
    (at - Duration::hours(BRASILIA_OFFSET_HOURS)).date_naive()
}

/// Today's civil date in Brasília.
#[must_use]
pub fn brasilia_today() -> NaiveDate {
    brasilia_date(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn date_rolls_back_before_3am_utc() {
        // 02:59 UTC is still the previous day in Brasília.
        let at = Utc.with_ymd_and_hms(2025, 6, 10, 2, 59, 0).unwrap();
        assert_eq!(
            brasilia_date(at),
            NaiveDate::from_ymd_opt(2025, 6, 9).unwrap()
        );

        // 03:00 UTC is midnight in Brasília.
        let at = Utc.with_ymd_and_hms(2025, 6, 10, 3, 0, 0).unwrap();
        assert_eq!(
            brasilia_date(at),
            NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
        );
    }

    #[test]
    fn midday_matches_utc_date() {
        let at = Utc.with_ymd_and_hms(2025, 6, 10, 15, 0, 0).unwrap();
        assert_eq!(
            brasilia_date(at),
            NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
        );
    }
}
