//! iCalendar DATE-TIME values and the temporal union (RFC 5545 §3.3.5).

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDateTime, Timelike};

use super::Date;

/// UTC offset representation (e.g., +0530, -0800, -043056).
///
/// Stored as total seconds from UTC. Valid range is roughly ±14 hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtcOffset {
    /// Total seconds from UTC (positive = east, negative = west).
    seconds: i32,
}

impl UtcOffset {
    /// Creates a UTC offset from hours and minutes. Minutes take the sign of
    /// the hour component, so `new(-4, 30)` is -04:30.
    ///
    /// ## Panics
    ///
    /// Panics if the offset is out of valid range (±14:00).
    #[must_use]
    pub fn new(hours: i8, minutes: u8) -> Self {
        let minute_sign = if hours < 0 { -1 } else { 1 };
        let seconds = i32::from(hours) * 3600 + minute_sign * i32::from(minutes) * 60;
        assert!(
            (-14 * 3600..=14 * 3600).contains(&seconds),
            "UTC offset out of valid range"
        );
        Self { seconds }
    }

    /// Creates a UTC offset from total seconds.
    #[must_use]
    pub const fn from_seconds(seconds: i32) -> Self {
        Self { seconds }
    }

    /// Returns the offset as total seconds from UTC.
    #[must_use]
    pub const fn as_seconds(self) -> i32 {
        self.seconds
    }

    /// Returns hours component (may be negative).
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "UTC offsets are bounded to ±14 hours per RFC 5545, truncation to i8 is safe"
    )]
    pub const fn hours(self) -> i8 {
        (self.seconds / 3600) as i8
    }

    /// Returns minutes component (always positive).
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "Minutes component is always 0-59 per RFC 5545, truncation to u8 is safe"
    )]
    pub const fn minutes(self) -> u8 {
        ((self.seconds.unsigned_abs() % 3600) / 60) as u8
    }

    /// UTC offset (zero).
    pub const UTC: Self = Self { seconds: 0 };
}

impl fmt::Display for UtcOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.seconds >= 0 { '+' } else { '-' };
        let hours = self.seconds.abs() / 3600;
        let minutes = (self.seconds.abs() % 3600) / 60;
        let seconds = self.seconds.abs() % 60;
        write!(f, "{sign}{hours:02}{minutes:02}")?;
        if seconds > 0 {
            write!(f, "{seconds:02}")?;
        }
        Ok(())
    }
}

/// Form of DATE-TIME value (RFC 5545 §3.3.5).
///
/// iCalendar DATE-TIME values come in three mutually exclusive forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DateTimeForm {
    /// Floating time - same wall-clock time in any timezone.
    ///
    /// Example: `19980118T230000`
    Floating,

    /// UTC time - absolute instant, indicated by 'Z' suffix.
    ///
    /// Example: `19980119T070000Z`
    Utc,

    /// Zoned time - local time with TZID reference.
    ///
    /// Example: `TZID=America/New_York:19980119T020000`
    Zoned {
        /// The IANA timezone identifier.
        tzid: String,
    },
}

/// DATE-TIME value (RFC 5545 §3.3.5).
///
/// A specific point in time, which may be floating, UTC, or zoned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DateTime {
    /// Year (e.g., 2026).
    pub year: u16,
    /// Month (1-12).
    pub month: u8,
    /// Day of month (1-31).
    pub day: u8,
    /// Hour (0-23).
    pub hour: u8,
    /// Minute (0-59).
    pub minute: u8,
    /// Second (0-60, allowing for leap seconds).
    pub second: u8,
    /// The form of this DATE-TIME (floating, UTC, or zoned).
    pub form: DateTimeForm,
}

impl DateTime {
    /// Creates a floating DATE-TIME.
    #[must_use]
    pub fn floating(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            form: DateTimeForm::Floating,
        }
    }

    /// Creates a UTC DATE-TIME.
    #[must_use]
    pub fn utc(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            form: DateTimeForm::Utc,
        }
    }

    /// Creates a zoned DATE-TIME.
    #[must_use]
    pub fn zoned(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        tzid: impl Into<String>,
    ) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            form: DateTimeForm::Zoned { tzid: tzid.into() },
        }
    }

    /// Returns whether this is a UTC time.
    #[must_use]
    pub fn is_utc(&self) -> bool {
        matches!(self.form, DateTimeForm::Utc)
    }

    /// Returns whether this is a floating time.
    #[must_use]
    pub fn is_floating(&self) -> bool {
        matches!(self.form, DateTimeForm::Floating)
    }

    /// Returns the timezone ID if this is a zoned time.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        match &self.form {
            DateTimeForm::Zoned { tzid } => Some(tzid),
            _ => None,
        }
    }

    /// Returns the date portion.
    #[must_use]
    pub const fn date(&self) -> Date {
        Date::new(self.year, self.month, self.day)
    }

    /// Converts the civil fields to a chrono [`NaiveDateTime`], or `None` if
    /// they do not name a real calendar time.
    #[must_use]
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        self.date().to_naive()?.and_hms_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
        )
    }

    /// Creates a DATE-TIME from chrono civil fields and a form.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "chrono time components are bounded well below the u8 range"
    )]
    pub fn from_naive(naive: NaiveDateTime, form: DateTimeForm) -> Self {
        let date = Date::from_naive(naive.date());
        Self {
            year: date.year,
            month: date.month,
            day: date.day,
            hour: naive.hour() as u8,
            minute: naive.minute() as u8,
            second: naive.second() as u8,
            form,
        }
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}{:02}{:02}T{:02}{:02}{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )?;
        if self.is_utc() {
            write!(f, "Z")?;
        }
        Ok(())
    }
}

/// Precision of a temporal value: whole days or clock times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    /// Date-only, no time component.
    Date,
    /// Time-bearing (floating, UTC, or zoned).
    DateTime,
}

impl Precision {
    /// Returns the RFC 5545 VALUE name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Date => "DATE",
            Self::DateTime => "DATE-TIME",
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error raised when an operation mixes date-only and time-bearing values.
///
/// Comparisons across precisions have no lossless definition, so they are
/// rejected instead of coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot combine {left} and {right} values in one operation")]
pub struct PrecisionError {
    /// Precision of the left-hand value.
    pub left: Precision,
    /// Precision of the right-hand value.
    pub right: Precision,
}

/// A point on the calendar: either a whole day or a clock time.
///
/// This is the value the recurrence engine emits and the period algebra
/// operates on. The time-bearing arm further splits into floating, UTC, and
/// zoned forms via [`DateTimeForm`], so every precision/anchoring kind is
/// covered by exhaustive matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Temporal {
    /// Date-only value (`VALUE=DATE`).
    Date(Date),
    /// Time-bearing value (`VALUE=DATE-TIME`).
    DateTime(DateTime),
}

impl Temporal {
    /// Returns the precision of this value.
    #[must_use]
    pub const fn precision(&self) -> Precision {
        match self {
            Self::Date(_) => Precision::Date,
            Self::DateTime(_) => Precision::DateTime,
        }
    }

    /// Returns the date portion (the day itself, or the day the time falls
    /// on).
    #[must_use]
    pub const fn date(&self) -> Date {
        match self {
            Self::Date(date) => *date,
            Self::DateTime(dt) => dt.date(),
        }
    }

    /// Returns the timezone ID if this is a zoned date-time.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        match self {
            Self::Date(_) => None,
            Self::DateTime(dt) => dt.tzid(),
        }
    }

    /// Returns the form of the time-bearing arm, if any.
    #[must_use]
    pub const fn form(&self) -> Option<&DateTimeForm> {
        match self {
            Self::Date(_) => None,
            Self::DateTime(dt) => Some(&dt.form),
        }
    }

    /// Converts to civil chrono time; date-only values map to midnight.
    ///
    /// Returns `None` for fields that do not name a real calendar time.
    #[must_use]
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Date(date) => date.to_naive()?.and_hms_opt(0, 0, 0),
            Self::DateTime(dt) => dt.to_naive(),
        }
    }

    /// Compares two values of the same precision in civil field order.
    ///
    /// Zoned and UTC values compare by their civil fields here; callers that
    /// need cross-zone instant ordering normalize through a timezone registry
    /// first.
    ///
    /// ## Errors
    ///
    /// Returns a [`PrecisionError`] when one value is date-only and the other
    /// time-bearing.
    pub fn compare(&self, other: &Self) -> Result<Ordering, PrecisionError> {
        if self.precision() != other.precision() {
            return Err(PrecisionError {
                left: self.precision(),
                right: other.precision(),
            });
        }
        Ok(self.civil_key().cmp(&other.civil_key()))
    }

    /// Tests whether two values denote the same occurrence after reducing
    /// both to their shared precision. A date-only value coincides with any
    /// value falling on that day.
    #[must_use]
    pub fn coincides_with(&self, other: &Self) -> bool {
        if self.precision() == other.precision() {
            self.civil_key() == other.civil_key()
        } else {
            self.date() == other.date()
        }
    }

    pub(crate) fn civil_key(&self) -> (u16, u8, u8, u8, u8, u8) {
        match self {
            Self::Date(date) => (date.year, date.month, date.day, 0, 0, 0),
            Self::DateTime(dt) => (dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second),
        }
    }
}

impl From<Date> for Temporal {
    fn from(date: Date) -> Self {
        Self::Date(date)
    }
}

impl From<DateTime> for Temporal {
    fn from(dt: DateTime) -> Self {
        Self::DateTime(dt)
    }
}

impl fmt::Display for Temporal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{date}"),
            Self::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}
