//! TZID resolution and conversion to UTC.
//!
//! Zone lookups consult custom [`ZoneRules`] registered from VTIMEZONE data
//! first and fall back to the bundled IANA database, so a calendar shipping
//! its own zone definition always wins over the system's idea of that zone.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone};
use chrono_tz::Tz;

use crate::ical::core::{DateTime, DateTimeForm, Period, Temporal, UtcOffset};

use super::observance::{Observance, ZoneRules};
use super::recur::ExpandError;

/// Error resolving a time zone or placing a local time in one.
#[derive(Debug, thiserror::Error)]
pub enum TimeZoneError {
    /// The TZID matches neither a registered zone nor the IANA database.
    #[error("unknown time zone: {0}")]
    UnknownTimeZone(String),

    /// The civil fields do not name a placeable instant.
    #[error("local time {0} does not exist in its time zone")]
    InvalidLocalTime(String),
}

/// Resolves TZIDs against registered custom zones and the IANA database.
#[derive(Debug, Default)]
pub struct TimeZoneRegistry {
    zones: HashMap<String, ZoneRules>,
}

impl TimeZoneRegistry {
    /// Creates a registry with no custom zones.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a custom zone, replacing any previous definition under the
    /// same identifier.
    pub fn register(&mut self, zone: ZoneRules) {
        self.zones.insert(zone.tzid().to_owned(), zone);
    }

    /// Returns the custom zone registered under `tzid`, if any.
    #[must_use]
    pub fn zone(&self, tzid: &str) -> Option<&ZoneRules> {
        self.zones.get(tzid)
    }

    /// ## Summary
    /// Offset in effect in `tzid` at the given UTC instant.
    ///
    /// ## Errors
    /// Returns an error when the TZID is unknown or the registered zone has
    /// no observances.
    pub fn offset_at(&self, tzid: &str, utc: NaiveDateTime) -> Result<UtcOffset, TimeZoneError> {
        if let Some(zone) = self.zones.get(tzid) {
            return zone
                .offset_at(utc, self)
                .ok_or_else(|| TimeZoneError::UnknownTimeZone(tzid.to_owned()));
        }
        let tz = resolve_tz(tzid)?;
        let seconds = tz.offset_from_utc_datetime(&utc).fix().local_minus_utc();
        Ok(UtcOffset::from_seconds(seconds))
    }

    /// ## Summary
    /// Resolves a temporal value to its UTC instant.
    ///
    /// Date-only values resolve to midnight, and floating values read their
    /// civil fields directly as UTC. This keeps floating anchors usable
    /// inside zone definitions without consulting the zone being defined.
    /// Zoned values resolve through the registry; a local time the zone
    /// skips (a DST gap) retries one hour later before failing.
    ///
    /// ## Errors
    /// Returns an error for an unknown zone, civil fields that name no real
    /// calendar time, or a skipped local time the retry cannot place.
    pub fn to_utc(&self, value: &Temporal) -> Result<NaiveDateTime, TimeZoneError> {
        let naive = value
            .to_naive()
            .ok_or_else(|| TimeZoneError::InvalidLocalTime(value.to_string()))?;
        match value.tzid() {
            None => Ok(naive),
            Some(tzid) => match self.zones.get(tzid) {
                Some(zone) => self.custom_to_utc(zone, naive, tzid),
                None => iana_to_utc(tzid, naive),
            },
        }
    }

    /// ## Summary
    /// Latest onset of `observance` at or before `limit`, as a floating
    /// local time. Returns `None` when every onset lies past the limit or
    /// the limit names no real calendar time.
    #[must_use]
    pub fn latest_onset_before(
        &self,
        observance: &Observance,
        limit: &Temporal,
    ) -> Option<Temporal> {
        let onset = observance.latest_onset_before(limit.to_naive()?, self)?;
        Some(Temporal::DateTime(DateTime::from_naive(
            onset,
            DateTimeForm::Floating,
        )))
    }

    /// ## Summary
    /// Rewrites a value as a UTC instant in DATE-TIME form.
    ///
    /// ## Errors
    /// Returns an error when the value cannot be resolved to UTC.
    pub fn normalize_temporal(&self, value: &Temporal) -> Result<Temporal, TimeZoneError> {
        let utc = self.to_utc(value)?;
        Ok(Temporal::DateTime(DateTime::from_naive(
            utc,
            DateTimeForm::Utc,
        )))
    }

    /// ## Summary
    /// Rewrites both period bounds as UTC instants.
    ///
    /// Interval relations compare civil fields, so periods must be brought
    /// into one frame before they are combined. A duration period resolves
    /// its derived end, capturing nominal-day semantics across DST
    /// transitions in the explicit UTC bounds.
    ///
    /// ## Errors
    /// Returns an error when a bound cannot be resolved to UTC, or when the
    /// bounds reorder once resolved (possible only when they carry
    /// different zones).
    pub fn normalize_period(&self, period: &Period) -> Result<Period, ExpandError> {
        let start = self.normalize_temporal(period.start())?;
        let end = self.normalize_temporal(&period.end())?;
        if matches!(start.compare(&end), Ok(Ordering::Greater)) {
            return Err(ExpandError::NegativeExtent);
        }
        Period::explicit(start, end).map_err(ExpandError::from)
    }

    /// Local-to-UTC through a custom zone: the offset at the local time read
    /// as UTC gives a first guess, then the offset at the guessed instant
    /// settles it.
    fn custom_to_utc(
        &self,
        zone: &ZoneRules,
        naive: NaiveDateTime,
        tzid: &str,
    ) -> Result<NaiveDateTime, TimeZoneError> {
        let first = zone
            .offset_at(naive, self)
            .ok_or_else(|| TimeZoneError::UnknownTimeZone(tzid.to_owned()))?;
        let guess = shift(naive, -first.as_seconds())
            .ok_or_else(|| TimeZoneError::InvalidLocalTime(naive.to_string()))?;
        let refined = zone
            .offset_at(guess, self)
            .ok_or_else(|| TimeZoneError::UnknownTimeZone(tzid.to_owned()))?;
        shift(naive, -refined.as_seconds())
            .ok_or_else(|| TimeZoneError::InvalidLocalTime(naive.to_string()))
    }
}

/// Applies a signed second offset to a civil time.
pub(super) fn shift(value: NaiveDateTime, seconds: i32) -> Option<NaiveDateTime> {
    value.checked_add_signed(TimeDelta::seconds(i64::from(seconds)))
}

fn iana_to_utc(tzid: &str, naive: NaiveDateTime) -> Result<NaiveDateTime, TimeZoneError> {
    let tz = resolve_tz(tzid)?;
    if let Some(instant) = mapped_local(tz, naive) {
        return Ok(instant);
    }
    // Clocks skipped this local time; retry one hour later before giving up
    let retried = shift(naive, 3600).and_then(|late| mapped_local(tz, late));
    retried.ok_or_else(|| TimeZoneError::InvalidLocalTime(naive.to_string()))
}

fn mapped_local(tz: Tz, naive: NaiveDateTime) -> Option<NaiveDateTime> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(mapped) => Some(mapped.naive_utc()),
        // RFC 5545 §3.3.5: an ambiguous local time resolves to its first
        // occurrence
        LocalResult::Ambiguous(first, _) => Some(first.naive_utc()),
        LocalResult::None => None,
    }
}

#[expect(
    clippy::map_err_ignore,
    reason = "The tz parse error carries no detail beyond the identifier itself"
)]
fn resolve_tz(tzid: &str) -> Result<Tz, TimeZoneError> {
    normalize_tzid(tzid)
        .parse()
        .map_err(|_| TimeZoneError::UnknownTimeZone(tzid.to_owned()))
}

/// Normalizes a TZID toward an IANA identifier.
///
/// Strips the registry prefixes some producers emit and maps common Windows
/// display names onto IANA zones.
#[must_use]
pub fn normalize_tzid(tzid: &str) -> &str {
    let trimmed = tzid
        .strip_prefix("/mozilla.org/20070129_1/")
        .or_else(|| tzid.strip_prefix("/softwarestudio.org/Olson_20011030_5/"))
        .unwrap_or(tzid);
    // TODO: Replace this alias table with data from icu
    match trimmed {
        "Eastern Standard Time" => "America/New_York",
        "Central Standard Time" => "America/Chicago",
        "Mountain Standard Time" => "America/Denver",
        "Pacific Standard Time" => "America/Los_Angeles",
        "GMT Standard Time" => "Europe/London",
        "W. Europe Standard Time" => "Europe/Berlin",
        other => other,
    }
}
