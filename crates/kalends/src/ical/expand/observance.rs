//! Time zone observances and onset resolution (RFC 5545 §3.6.5).
//!
//! A zone definition is a set of observances, each switching the zone onto a
//! new UTC offset at a series of onsets. Onset lists combine a first onset,
//! explicit RDATE onsets, and a recurrence rule, all expressed in the local
//! time that was in effect before the transition.

use std::fmt;

use chrono::NaiveDateTime;

use crate::ical::core::{DateTime, DateTimeForm, RecurrenceRule, Temporal, UtcOffset};

use super::recur::TimeRange;
use super::timezone::{TimeZoneRegistry, shift};

/// Which side of a daylight-saving transition an observance describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObservanceKind {
    /// Standard (winter) time.
    Standard,
    /// Daylight saving (summer) time.
    Daylight,
}

impl ObservanceKind {
    /// Returns the RFC 5545 component name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::Daylight => "DAYLIGHT",
        }
    }
}

impl fmt::Display for ObservanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One observance of a time zone: the offset it switches to and the onsets
/// at which it takes effect.
///
/// Onsets are local times expressed in the offset the zone ran before the
/// transition (`offset_from`), per RFC 5545 §3.8.2.4.
#[derive(Debug, Clone, PartialEq)]
pub struct Observance {
    /// Standard or daylight side of the transition.
    pub kind: ObservanceKind,
    /// First onset, also the anchor for the recurrence rule.
    pub onset: NaiveDateTime,
    /// Offset in effect before each onset.
    pub offset_from: UtcOffset,
    /// Offset this observance switches the zone to.
    pub offset_to: UtcOffset,
    /// Recurrence rule generating further onsets, if any.
    pub rule: Option<RecurrenceRule>,
    /// Explicit additional onsets.
    pub rdates: Vec<NaiveDateTime>,
    /// Zone name in effect under this observance (EST, CEST, ...).
    pub name: Option<String>,
}

impl Observance {
    /// Creates an observance with a single fixed onset.
    #[must_use]
    pub const fn new(
        kind: ObservanceKind,
        onset: NaiveDateTime,
        offset_from: UtcOffset,
        offset_to: UtcOffset,
    ) -> Self {
        Self {
            kind,
            onset,
            offset_from,
            offset_to,
            rule: None,
            rdates: Vec::new(),
            name: None,
        }
    }

    /// Adds a recurrence rule generating further onsets from the first.
    #[must_use]
    pub fn with_rule(mut self, rule: RecurrenceRule) -> Self {
        self.rule = Some(rule);
        self
    }

    /// Adds an explicit onset.
    #[must_use]
    pub fn with_rdate(mut self, rdate: NaiveDateTime) -> Self {
        self.rdates.push(rdate);
        self
    }

    /// Sets the zone name in effect under this observance.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// ## Summary
    /// Latest onset of this observance at or before `limit`, both in the
    /// observance's local time.
    ///
    /// Considers the first onset, the RDATE onsets, and the recurrence rule
    /// expanded from the first onset. Returns `None` when every onset lies
    /// past `limit`.
    #[must_use]
    pub fn latest_onset_before(
        &self,
        limit: NaiveDateTime,
        registry: &TimeZoneRegistry,
    ) -> Option<NaiveDateTime> {
        let direct = std::iter::once(self.onset)
            .chain(self.rdates.iter().copied())
            .filter(|candidate| *candidate <= limit);
        let ruled = self
            .rule
            .as_ref()
            .and_then(|rule| self.latest_rule_onset(rule, limit, registry));
        direct.chain(ruled).max()
    }

    /// Last rule-generated onset at or before `limit`.
    ///
    /// Onsets carry no zone of their own, so the rule expands from a
    /// floating anchor and candidates compare as plain local times.
    fn latest_rule_onset(
        &self,
        rule: &RecurrenceRule,
        limit: NaiveDateTime,
        registry: &TimeZoneRegistry,
    ) -> Option<NaiveDateTime> {
        let anchor = Temporal::DateTime(DateTime::from_naive(self.onset, DateTimeForm::Floating));
        match rule.occurrences(&anchor, &TimeRange::unbounded(), registry) {
            Ok(occurrences) => occurrences
                .filter_map(|value| value.to_naive())
                .take_while(|candidate| *candidate <= limit)
                .last(),
            Err(error) => {
                tracing::warn!(kind = %self.kind, %error, "skipping unusable observance rule");
                None
            }
        }
    }
}

/// Complete transition rules for one custom time zone.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneRules {
    tzid: String,
    observances: Vec<Observance>,
}

impl ZoneRules {
    /// Creates an empty zone definition.
    #[must_use]
    pub fn new(tzid: impl Into<String>) -> Self {
        Self {
            tzid: tzid.into(),
            observances: Vec::new(),
        }
    }

    /// Adds an observance.
    #[must_use]
    pub fn with_observance(mut self, observance: Observance) -> Self {
        self.observances.push(observance);
        self
    }

    /// The zone identifier.
    #[must_use]
    pub fn tzid(&self) -> &str {
        &self.tzid
    }

    /// The observances making up this zone.
    #[must_use]
    pub fn observances(&self) -> &[Observance] {
        &self.observances
    }

    /// ## Summary
    /// Offset in effect at the given UTC instant.
    ///
    /// Each observance's onsets are local times in its `offset_from`, so the
    /// instant shifts by that offset before the onset comparison and the
    /// winning onset shifts back to UTC. The observance with the greatest
    /// onset at or before the instant supplies `offset_to`; instants before
    /// every onset fall back to the earliest observance's prior offset.
    #[must_use]
    pub fn offset_at(&self, utc: NaiveDateTime, registry: &TimeZoneRegistry) -> Option<UtcOffset> {
        let mut best: Option<(NaiveDateTime, UtcOffset)> = None;
        for observance in &self.observances {
            let Some(limit) = shift(utc, observance.offset_from.as_seconds()) else {
                continue;
            };
            let Some(onset) = observance.latest_onset_before(limit, registry) else {
                continue;
            };
            let Some(onset_utc) = shift(onset, -observance.offset_from.as_seconds()) else {
                continue;
            };
            if best.is_none_or(|(current, _)| onset_utc > current) {
                best = Some((onset_utc, observance.offset_to));
            }
        }
        match best {
            Some((_, offset)) => Some(offset),
            None => self.earliest_offset(),
        }
    }

    /// Offset before the first transition on record.
    fn earliest_offset(&self) -> Option<UtcOffset> {
        self.observances
            .iter()
            .min_by_key(|observance| observance.onset)
            .map(|observance| observance.offset_from)
    }
}
