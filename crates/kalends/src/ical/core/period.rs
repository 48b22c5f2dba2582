//! iCalendar PERIOD value type and interval relations (RFC 5545 §3.3.9).

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};

use super::{Date, DateTime, Duration, Precision, PrecisionError, Temporal};

/// Period of time with half-open bounds `[start, end)` (RFC 5545 §3.3.9).
///
/// A period either names its end explicitly or carries a duration, in which
/// case [`Self::end`] derives the end lazily: nominal days land on the same
/// wall-clock time, exact time components add elapsed seconds. Both bounds
/// always share one precision, so every relation below is total over values
/// that construct successfully.
///
/// The end bound is exclusive throughout: a meeting `[09:00, 10:00)` and one
/// `[10:00, 11:00)` share no instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    start: Temporal,
    end: PeriodEnd,
}

/// How the end of a period is specified.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PeriodEnd {
    /// Explicit end bound (`start/end`).
    Explicit(Temporal),
    /// Duration from the start (`start/duration`).
    For(Duration),
}

impl Period {
    /// Creates a period from explicit start and end bounds.
    ///
    /// ## Errors
    ///
    /// Returns a [`PrecisionError`] when the bounds mix date-only and
    /// time-bearing values.
    ///
    /// ## Panics
    ///
    /// Panics if either bound does not name a real calendar time, or if the
    /// start is after the end.
    pub fn explicit(start: Temporal, end: Temporal) -> Result<Self, PrecisionError> {
        assert!(
            start.to_naive().is_some() && end.to_naive().is_some(),
            "period bounds must name real calendar times"
        );
        let ordering = start.compare(&end)?;
        assert!(
            ordering != Ordering::Greater,
            "period start must not be after its end"
        );
        Ok(Self {
            start,
            end: PeriodEnd::Explicit(end),
        })
    }

    /// Creates a period from a start and a duration.
    ///
    /// ## Panics
    ///
    /// Panics if the start does not name a real calendar time, if the
    /// duration is negative, or if a date-only start is paired with a
    /// duration carrying time components.
    #[must_use]
    pub fn from_duration(start: Temporal, duration: Duration) -> Self {
        assert!(
            start.to_naive().is_some(),
            "period start must name a real calendar time"
        );
        assert!(
            !duration.negative || duration.is_zero(),
            "period duration must not be negative"
        );
        assert!(
            start.precision() == Precision::DateTime || duration.time_seconds() == 0,
            "date-only periods take whole-day durations"
        );
        Self {
            start,
            end: PeriodEnd::For(duration),
        }
    }

    /// Returns the inclusive start bound.
    #[must_use]
    pub const fn start(&self) -> &Temporal {
        &self.start
    }

    /// Returns the exclusive end bound.
    ///
    /// For duration periods the end is derived on demand: week and day
    /// components step the civil calendar (same wall-clock time), time
    /// components add exact seconds. The result keeps the start's form, so a
    /// zoned period stays zoned until a registry normalizes it.
    ///
    /// ## Panics
    ///
    /// Panics if the derived end overflows the supported calendar range.
    #[must_use]
    pub fn end(&self) -> Temporal {
        match &self.end {
            PeriodEnd::Explicit(end) => end.clone(),
            PeriodEnd::For(duration) => {
                let naive = bound_naive(&self.start)
                    + TimeDelta::days(duration.nominal_days())
                    + TimeDelta::seconds(duration.time_seconds());
                match &self.start {
                    Temporal::Date(_) => Temporal::Date(Date::from_naive(naive.date())),
                    Temporal::DateTime(dt) => {
                        Temporal::DateTime(DateTime::from_naive(naive, dt.form.clone()))
                    }
                }
            }
        }
    }

    /// Returns the explicit end bound, if this period has one.
    #[must_use]
    pub const fn explicit_end(&self) -> Option<&Temporal> {
        match &self.end {
            PeriodEnd::Explicit(end) => Some(end),
            PeriodEnd::For(_) => None,
        }
    }

    /// Returns the duration, if this period carries one.
    #[must_use]
    pub const fn duration(&self) -> Option<Duration> {
        match &self.end {
            PeriodEnd::Explicit(_) => None,
            PeriodEnd::For(duration) => Some(*duration),
        }
    }

    /// Returns the precision of both bounds.
    #[must_use]
    pub const fn precision(&self) -> Precision {
        self.start.precision()
    }

    /// Returns the elapsed civil seconds between start and end.
    #[must_use]
    pub fn duration_seconds(&self) -> i64 {
        (bound_naive(&self.end()) - bound_naive(&self.start)).num_seconds()
    }

    /// Returns whether start and end coincide.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start_key() == self.end_key()
    }

    /// Returns whether the point falls inside `[start, end)`.
    ///
    /// ## Errors
    ///
    /// Returns a [`PrecisionError`] when the point's precision differs from
    /// the period's.
    pub fn includes(&self, point: &Temporal) -> Result<bool, PrecisionError> {
        self.start.compare(point)?;
        let key = point.civil_key();
        Ok(self.start_key() <= key && key < self.end_key())
    }

    /// Returns whether the two periods share at least one instant.
    ///
    /// Abutting periods do not intersect, and an empty period intersects
    /// nothing.
    ///
    /// ## Errors
    ///
    /// Returns a [`PrecisionError`] when the periods differ in precision.
    pub fn intersects(&self, other: &Self) -> Result<bool, PrecisionError> {
        self.start.compare(&other.start)?;
        Ok(self.start_key() < other.end_key() && other.start_key() < self.end_key())
    }

    /// Returns whether `other` lies entirely inside this period.
    ///
    /// ## Errors
    ///
    /// Returns a [`PrecisionError`] when the periods differ in precision.
    pub fn contains(&self, other: &Self) -> Result<bool, PrecisionError> {
        self.start.compare(&other.start)?;
        Ok(self.start_key() <= other.start_key() && other.end_key() <= self.end_key())
    }

    /// Returns whether this period ends on or before the other starts.
    ///
    /// A period ending exactly where the next begins is before it, matching
    /// the exclusive end bound.
    ///
    /// ## Errors
    ///
    /// Returns a [`PrecisionError`] when the periods differ in precision.
    pub fn before(&self, other: &Self) -> Result<bool, PrecisionError> {
        self.start.compare(&other.start)?;
        Ok(self.end_key() <= other.start_key())
    }

    /// Returns whether this period starts on or after the other ends.
    ///
    /// ## Errors
    ///
    /// Returns a [`PrecisionError`] when the periods differ in precision.
    pub fn after(&self, other: &Self) -> Result<bool, PrecisionError> {
        other.before(self)
    }

    /// Orders periods by start, then by end.
    ///
    /// ## Errors
    ///
    /// Returns a [`PrecisionError`] when the periods differ in precision.
    pub fn compare(&self, other: &Self) -> Result<Ordering, PrecisionError> {
        self.start.compare(&other.start)?;
        Ok(self
            .start_key()
            .cmp(&other.start_key())
            .then(self.end_key().cmp(&other.end_key())))
    }

    /// Merges two periods that overlap or abut into one covering both.
    ///
    /// Returns `None` when the periods are disjoint with a gap between them.
    ///
    /// ## Errors
    ///
    /// Returns a [`PrecisionError`] when the periods differ in precision.
    pub fn union(&self, other: &Self) -> Result<Option<Self>, PrecisionError> {
        let touches = self.intersects(other)?
            || self.end_key() == other.start_key()
            || other.end_key() == self.start_key();
        if !touches {
            return Ok(None);
        }

        let start = if self.start_key() <= other.start_key() {
            self.start.clone()
        } else {
            other.start.clone()
        };
        let end = if self.end_key() >= other.end_key() {
            self.end()
        } else {
            other.end()
        };
        Ok(Some(Self {
            start,
            end: PeriodEnd::Explicit(end),
        }))
    }

    /// Returns the overlap of two periods, or `None` when they are disjoint.
    ///
    /// ## Errors
    ///
    /// Returns a [`PrecisionError`] when the periods differ in precision.
    pub fn intersection(&self, other: &Self) -> Result<Option<Self>, PrecisionError> {
        if !self.intersects(other)? {
            return Ok(None);
        }

        let start = if self.start_key() >= other.start_key() {
            self.start.clone()
        } else {
            other.start.clone()
        };
        let end = if self.end_key() <= other.end_key() {
            self.end()
        } else {
            other.end()
        };
        Ok(Some(Self {
            start,
            end: PeriodEnd::Explicit(end),
        }))
    }

    /// Removes the overlap with `other` from this period.
    ///
    /// Yields zero pieces when `other` covers this period, one piece when it
    /// clips an edge or misses entirely, and two when it punches a hole.
    ///
    /// ## Errors
    ///
    /// Returns a [`PrecisionError`] when the periods differ in precision.
    pub fn subtract(&self, other: &Self) -> Result<Vec<Self>, PrecisionError> {
        if !self.intersects(other)? {
            return Ok(vec![self.clone()]);
        }

        let mut pieces = Vec::new();
        if self.start_key() < other.start_key() {
            pieces.push(Self {
                start: self.start.clone(),
                end: PeriodEnd::Explicit(other.start.clone()),
            });
        }
        if other.end_key() < self.end_key() {
            pieces.push(Self {
                start: other.end(),
                end: PeriodEnd::Explicit(self.end()),
            });
        }
        Ok(pieces)
    }

    fn start_key(&self) -> (u16, u8, u8, u8, u8, u8) {
        self.start.civil_key()
    }

    fn end_key(&self) -> (u16, u8, u8, u8, u8, u8) {
        self.end().civil_key()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.end {
            PeriodEnd::Explicit(end) => write!(f, "{}/{end}", self.start),
            PeriodEnd::For(duration) => write!(f, "{}/{duration}", self.start),
        }
    }
}

fn bound_naive(value: &Temporal) -> NaiveDateTime {
    #[expect(
        clippy::expect_used,
        reason = "Period construction rejects bounds that are not real calendar times"
    )]
    value
        .to_naive()
        .expect("period bounds are validated at construction")
}
