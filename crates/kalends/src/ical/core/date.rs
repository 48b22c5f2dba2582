//! iCalendar DATE value type (RFC 5545 §3.3.4).

use std::fmt;

use chrono::{Datelike, NaiveDate};

/// DATE value (RFC 5545 §3.3.4).
///
/// A calendar date without time component. Ordering is calendar order
/// (year, then month, then day).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date {
    /// Year (e.g., 2026).
    pub year: u16,
    /// Month (1-12).
    pub month: u8,
    /// Day of month (1-31).
    pub day: u8,
}

impl Date {
    /// Creates a new date.
    ///
    /// Field ranges are not checked here; [`Date::to_naive`] returns `None`
    /// for dates that do not exist on the calendar.
    #[must_use]
    pub const fn new(year: u16, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// Converts to a chrono [`NaiveDate`], or `None` if the date does not
    /// exist (e.g. February 30th).
    #[must_use]
    pub fn to_naive(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(i32::from(self.year), u32::from(self.month), u32::from(self.day))
    }

    /// Creates a date from a chrono [`NaiveDate`].
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "iCalendar dates are four-digit years; month and day always fit u8"
    )]
    pub fn from_naive(date: NaiveDate) -> Self {
        Self {
            year: date.year() as u16,
            month: date.month() as u8,
            day: date.day() as u8,
        }
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}{:02}", self.year, self.month, self.day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_display() {
        assert_eq!(Date::new(2008, 12, 25).to_string(), "20081225");
        assert_eq!(Date::new(305, 1, 2).to_string(), "03050102");
    }

    #[test]
    fn date_ordering() {
        assert!(Date::new(2008, 12, 25) < Date::new(2009, 1, 1));
        assert!(Date::new(2008, 2, 28) < Date::new(2008, 3, 1));
    }

    #[test]
    fn date_naive_round_trip() {
        let date = Date::new(2024, 2, 29);
        let naive = date.to_naive().unwrap();
        assert_eq!(Date::from_naive(naive), date);
    }

    #[test]
    fn invalid_date_has_no_naive() {
        assert!(Date::new(2023, 2, 29).to_naive().is_none());
        assert!(Date::new(2023, 4, 31).to_naive().is_none());
    }
}
