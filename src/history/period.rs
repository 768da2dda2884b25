//! Period keyword resolution for default date ranges.
//!
//! When a request carries no explicit `fecha_desde`/`fecha_hasta`, the
//! `periodo` keyword seeds the inclusive lower bound on entry timestamps;
//! the upper bound stays open.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};

/// Reporting period selected via the `periodo` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    /// The current UTC calendar day.
    Today,
    /// From the most recent Monday on or before today.
    #[default]
    Week,
    /// From the first day of the current month.
    Month,
}

impl Period {
    /// Parse the wire keyword. Anything unrecognized, including an absent
    /// parameter, falls back to the week.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("hoy") => Period::Today,
            Some("mes") => Period::Month,
            _ => Period::Week,
        }
    }

    /// First calendar day covered by this period, relative to `today`.
    pub fn start_date(self, today: NaiveDate) -> NaiveDate {
        match self {
            Period::Today => today,
            // Monday is day 0; a Sunday goes back the full six days.
            Period::Week => {
                today - Days::new(u64::from(today.weekday().num_days_from_monday()))
            }
            Period::Month => today.with_day(1).unwrap_or(today),
        }
    }
}

/// 00:00:00 UTC on the given date.
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// 23:59:59 UTC on the given date.
pub fn day_end(date: NaiveDate) -> DateTime<Utc> {
    day_start(date) + chrono::Duration::seconds(86_399)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn today_is_itself() {
        assert_eq!(Period::Today.start_date(date(2024, 7, 3)), date(2024, 7, 3));
    }

    #[test]
    fn week_starts_on_the_previous_monday() {
        // 2024-07-03 is a Wednesday.
        assert_eq!(Period::Week.start_date(date(2024, 7, 3)), date(2024, 7, 1));
    }

    #[test]
    fn monday_is_its_own_week_start() {
        assert_eq!(Period::Week.start_date(date(2024, 7, 1)), date(2024, 7, 1));
    }

    #[test]
    fn sunday_counts_as_the_last_day_of_the_week() {
        // 2024-07-07 is a Sunday; the week began six days earlier.
        assert_eq!(Period::Week.start_date(date(2024, 7, 7)), date(2024, 7, 1));
    }

    #[test]
    fn month_starts_on_the_first() {
        assert_eq!(Period::Month.start_date(date(2024, 7, 15)), date(2024, 7, 1));
    }

    #[test]
    fn unknown_keywords_default_to_week() {
        assert_eq!(Period::parse(None), Period::Week);
        assert_eq!(Period::parse(Some("semana")), Period::Week);
        assert_eq!(Period::parse(Some("trimestre")), Period::Week);
        assert_eq!(Period::parse(Some("hoy")), Period::Today);
        assert_eq!(Period::parse(Some("mes")), Period::Month);
    }

    #[test]
    fn day_bounds_cover_the_full_day() {
        let d = date(2024, 7, 3);
        assert_eq!(day_start(d).to_rfc3339(), "2024-07-03T00:00:00+00:00");
        assert_eq!(day_end(d).to_rfc3339(), "2024-07-03T23:59:59+00:00");
    }
}
