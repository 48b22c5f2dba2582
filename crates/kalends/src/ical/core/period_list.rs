//! Normalized period collections for busy-time arithmetic.

use std::cmp::Ordering;
use std::fmt;

use super::{DateTimeForm, Period, Precision, PrecisionError};

/// An immutable collection of periods of one shared precision.
///
/// Construction validates that all members compare, so [`Self::normalize`]
/// and the set operations are total afterwards. Normalization is on demand:
/// a freshly built list keeps its input order until asked to sort and merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodList {
    periods: Vec<Period>,
}

impl PeriodList {
    /// Creates an empty period list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            periods: Vec::new(),
        }
    }

    /// Creates a period list from the given periods.
    ///
    /// ## Errors
    ///
    /// Returns a [`PrecisionError`] when the periods mix date-only and
    /// time-bearing precisions.
    pub fn from_periods(periods: impl IntoIterator<Item = Period>) -> Result<Self, PrecisionError> {
        let periods: Vec<Period> = periods.into_iter().collect();
        if let Some((first, rest)) = periods.split_first() {
            for period in rest {
                first.start().compare(period.start())?;
            }
        }
        Ok(Self { periods })
    }

    /// Returns the periods in their current order.
    #[must_use]
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Returns the number of periods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Returns whether the list holds no periods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Returns an iterator over the periods.
    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, Period> {
        self.periods.iter()
    }

    /// Returns the shared precision, or `None` for an empty list.
    #[must_use]
    pub fn precision(&self) -> Option<Precision> {
        self.periods.first().map(Period::precision)
    }

    /// Returns whether every bound in the list is a UTC date-time.
    #[must_use]
    pub fn is_utc_normalized(&self) -> bool {
        self.periods.iter().all(|period| {
            matches!(period.start().form(), Some(DateTimeForm::Utc))
                && matches!(period.end().form(), Some(DateTimeForm::Utc))
        })
    }

    /// Returns a sorted copy in which overlapping or abutting periods are
    /// merged.
    ///
    /// After normalization the periods are ordered by start and pairwise
    /// disjoint with a gap between any two. Zero-length periods survive on
    /// their own but are absorbed by any period touching them. The list is
    /// precision-uniform by construction, so merging cannot fail.
    #[must_use]
    pub fn normalize(&self) -> Self {
        if self.periods.len() <= 1 {
            return self.clone();
        }

        let mut sorted = self.periods.clone();
        sorted.sort_by(|a, b| a.compare(b).unwrap_or(Ordering::Equal));

        let mut merged: Vec<Period> = Vec::with_capacity(sorted.len());
        for period in sorted {
            if let Some(last) = merged.last_mut()
                && let Ok(Some(combined)) = last.union(&period)
            {
                *last = combined;
                continue;
            }
            merged.push(period);
        }
        Self { periods: merged }
    }

    /// Unions two collections and normalizes the result.
    ///
    /// ## Errors
    ///
    /// Returns a [`PrecisionError`] when the collections differ in
    /// precision.
    pub fn add(&self, other: &Self) -> Result<Self, PrecisionError> {
        if let (Some(left), Some(right)) = (self.precision(), other.precision())
            && left != right
        {
            return Err(PrecisionError { left, right });
        }

        let mut combined = self.periods.clone();
        combined.extend(other.periods.iter().cloned());
        Ok(Self { periods: combined }.normalize())
    }

    /// Removes from every period in this list any overlap with any period
    /// in `other`, renormalizing afterward.
    ///
    /// Subtraction is left minus right, so argument order matters.
    ///
    /// ## Errors
    ///
    /// Returns a [`PrecisionError`] when the collections differ in
    /// precision.
    pub fn subtract(&self, other: &Self) -> Result<Self, PrecisionError> {
        let holes = other.normalize();
        let mut result = Vec::new();

        for period in &self.normalize().periods {
            let mut remaining = vec![period.clone()];
            for hole in &holes.periods {
                let mut next = Vec::new();
                for piece in &remaining {
                    next.extend(piece.subtract(hole)?);
                }
                remaining = next;
                if remaining.is_empty() {
                    break;
                }
            }
            result.extend(remaining);
        }

        Ok(Self { periods: result }.normalize())
    }
}

impl fmt::Display for PeriodList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<_> = self.periods.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(","))
    }
}

impl<'a> IntoIterator for &'a PeriodList {
    type Item = &'a Period;
    type IntoIter = std::slice::Iter<'a, Period>;

    fn into_iter(self) -> Self::IntoIter {
        self.periods.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ical::core::{Date, DateTime, Duration, Temporal};

    fn utc(day: u8, hour: u8) -> Temporal {
        Temporal::from(DateTime::utc(2026, 1, day, hour, 0, 0))
    }

    fn span(start_day: u8, start_hour: u8, end_day: u8, end_hour: u8) -> Period {
        Period::explicit(utc(start_day, start_hour), utc(end_day, end_hour)).unwrap()
    }

    #[test]
    fn normalize_sorts_and_merges() {
        let list = PeriodList::from_periods([
            span(2, 9, 2, 12),
            span(1, 9, 1, 11),
            span(1, 10, 1, 13),
        ])
        .unwrap();
        let normalized = list.normalize();
        assert_eq!(
            normalized.periods(),
            &[span(1, 9, 1, 13), span(2, 9, 2, 12)]
        );
    }

    #[test]
    fn normalize_merges_abutting() {
        let list = PeriodList::from_periods([span(1, 9, 1, 12), span(1, 12, 1, 17)]).unwrap();
        assert_eq!(list.normalize().periods(), &[span(1, 9, 1, 17)]);
    }

    #[test]
    fn normalize_is_idempotent() {
        let list = PeriodList::from_periods([
            span(1, 9, 1, 11),
            span(1, 10, 1, 14),
            span(3, 8, 3, 9),
        ])
        .unwrap();
        let once = list.normalize();
        assert_eq!(once.normalize(), once);
    }

    #[test]
    fn zero_length_marker_absorbed_by_touching_period() {
        let list = PeriodList::from_periods([span(1, 9, 1, 9), span(1, 9, 1, 12)]).unwrap();
        assert_eq!(list.normalize().periods(), &[span(1, 9, 1, 12)]);

        let lone = PeriodList::from_periods([span(1, 9, 1, 9)]).unwrap();
        assert_eq!(lone.normalize().periods(), &[span(1, 9, 1, 9)]);
    }

    #[test]
    fn add_unions_and_normalizes() {
        let a = PeriodList::from_periods([span(1, 9, 1, 12)]).unwrap();
        let b = PeriodList::from_periods([span(1, 11, 1, 14), span(2, 9, 2, 10)]).unwrap();
        let sum = a.add(&b).unwrap();
        assert_eq!(sum.periods(), &[span(1, 9, 1, 14), span(2, 9, 2, 10)]);
        assert_eq!(b.add(&a).unwrap(), sum);
    }

    #[test]
    fn subtract_removes_overlap_from_every_period() {
        let busy = PeriodList::from_periods([span(1, 9, 1, 17), span(2, 9, 2, 17)]).unwrap();
        let holes = PeriodList::from_periods([span(1, 12, 1, 13), span(2, 0, 2, 23)]).unwrap();
        let left = busy.subtract(&holes).unwrap();
        assert_eq!(left.periods(), &[span(1, 9, 1, 12), span(1, 13, 1, 17)]);
    }

    #[test]
    fn disjoint_add_then_subtract_restores_left() {
        let a = PeriodList::from_periods([span(1, 9, 1, 12)]).unwrap();
        let b = PeriodList::from_periods([span(2, 9, 2, 12)]).unwrap();
        let restored = a.add(&b).unwrap().subtract(&b).unwrap();
        assert_eq!(restored, a.normalize());
    }

    #[test]
    fn mixed_precision_rejected() {
        let timed = span(1, 9, 1, 12);
        let all_day =
            Period::from_duration(Temporal::from(Date::new(2026, 1, 1)), Duration::days(1));
        assert!(PeriodList::from_periods([timed, all_day]).is_err());
    }

    #[test]
    fn display_joins_with_commas() {
        let list = PeriodList::from_periods([span(1, 9, 1, 12), span(2, 9, 2, 12)]).unwrap();
        assert_eq!(
            list.to_string(),
            "20260101T090000Z/20260101T120000Z,20260102T090000Z/20260102T120000Z"
        );
    }

    #[test]
    fn utc_normalized_flag_tracks_forms() {
        let utc_list = PeriodList::from_periods([span(1, 9, 1, 12)]).unwrap();
        assert!(utc_list.is_utc_normalized());

        let zoned = Period::from_duration(
            Temporal::from(DateTime::zoned(2026, 1, 1, 9, 0, 0, "America/New_York")),
            Duration::hours(3),
        );
        let zoned_list = PeriodList::from_periods([zoned]).unwrap();
        assert!(!zoned_list.is_utc_normalized());
    }
}
