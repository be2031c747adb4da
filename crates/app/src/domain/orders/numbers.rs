//! Human-readable order numbers: `PZ-YYYYMMDD-NNNN`, sequenced per UTC day.

use jiff::{Timestamp, civil::Date, tz::TimeZone};

const ORDER_NUMBER_PREFIX: &str = "PZ";

/// The `PZ-YYYYMMDD-` prefix shared by every order placed on `date`.
#[must_use]
pub fn day_prefix(date: Date) -> String {
    format!("{ORDER_NUMBER_PREFIX}-{}-", date.strftime("%Y%m%d"))
}

/// UTC calendar date of `now`.
#[must_use]
pub fn order_date(now: Timestamp) -> Date {
    now.to_zoned(TimeZone::UTC).date()
}

#[must_use]
pub fn format_order_number(prefix: &str, sequence: u32) -> String {
    format!("{prefix}{sequence:04}")
}

/// Sequence part of `number` if it carries `prefix`.
#[must_use]
pub fn parse_sequence(prefix: &str, number: &str) -> Option<u32> {
    number.strip_prefix(prefix)?.parse().ok()
}

/// The sequence to try after `latest`, the highest number issued today so far.
#[must_use]
pub fn next_sequence(prefix: &str, latest: Option<&str>) -> u32 {
    latest
        .and_then(|number| parse_sequence(prefix, number))
        .map_or(1, |sequence| sequence.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    #[test]
    fn numbers_are_date_scoped_and_padded() {
        let prefix = day_prefix(date(2026, 3, 7));

        assert_eq!(prefix, "PZ-20260307-");
        assert_eq!(format_order_number(&prefix, 1), "PZ-20260307-0001");
        assert_eq!(format_order_number(&prefix, 12345), "PZ-20260307-12345");
    }

    #[test]
    fn next_sequence_follows_latest_of_the_day() {
        let prefix = day_prefix(date(2026, 3, 7));

        assert_eq!(next_sequence(&prefix, None), 1);
        assert_eq!(next_sequence(&prefix, Some("PZ-20260307-0041")), 42);
        assert_eq!(next_sequence(&prefix, Some("PZ-20260306-0041")), 1);
        assert_eq!(next_sequence(&prefix, Some("PZ-20260307-junk")), 1);
    }

    #[test]
    fn order_date_uses_utc() -> Result<(), jiff::Error> {
        let late = "2026-03-07T23:30:00-05:00".parse::<Timestamp>()?;

        assert_eq!(order_date(late), date(2026, 3, 8));

        Ok(())
    }
}
