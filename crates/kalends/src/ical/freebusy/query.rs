//! Free/busy aggregation across schedules.
//!
//! [`free_busy`] answers the scheduling question behind an RFC 5545 VFREEBUSY
//! reply: over a request period, which stretches of time do a set of
//! schedules occupy, or dually, which gaps are open for a new booking.

use std::fmt;

use crate::ical::core::{Duration, Period, PeriodList};
use crate::ical::expand::{ExpandError, TimeZoneRegistry};

use super::schedule::Schedule;

/// Free/busy classification of a stretch of time (RFC 5545 §3.2.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FreeBusyKind {
    /// Open time.
    Free,
    /// Occupied time.
    #[default]
    Busy,
    /// Provisionally occupied time.
    BusyTentative,
    /// Occupied and not available for scheduling.
    BusyUnavailable,
}

impl FreeBusyKind {
    /// Returns the RFC 5545 FBTYPE name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Busy => "BUSY",
            Self::BusyTentative => "BUSY-TENTATIVE",
            Self::BusyUnavailable => "BUSY-UNAVAILABLE",
        }
    }

    /// Parses an FBTYPE name (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "FREE" => Self::Free,
            "BUSY" => Self::Busy,
            "BUSY-TENTATIVE" => Self::BusyTentative,
            "BUSY-UNAVAILABLE" => Self::BusyUnavailable,
            _ => return None,
        })
    }
}

impl fmt::Display for FreeBusyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An aggregation answer: one classification over a normalized period set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeBusy {
    kind: FreeBusyKind,
    periods: PeriodList,
}

impl FreeBusy {
    /// The classification every period in the answer carries.
    #[must_use]
    pub const fn kind(&self) -> FreeBusyKind {
        self.kind
    }

    /// The normalized periods.
    #[must_use]
    pub const fn periods(&self) -> &PeriodList {
        &self.periods
    }
}

/// ## Summary
/// Aggregates the consumed time of `schedules` over the `request` period.
///
/// Free-classified schedules never contribute busy time. Without `min_free`
/// (or with a zero-length one) the answer is the merged busy time, classified
/// BUSY unless every contributing schedule carries the same finer busy kind.
/// With a positive `min_free`, the busy time is subtracted from the request
/// and only gaps at least `min_free` long survive, classified FREE; when no
/// schedule intersects the request at all, the answer is the request period
/// itself, unchanged.
///
/// ## Errors
///
/// Returns an error when the request cannot be normalized or when expanding
/// one of the schedules fails.
#[tracing::instrument(skip_all, fields(schedules = schedules.len()))]
pub fn free_busy(
    request: &Period,
    schedules: &[Schedule],
    min_free: Option<Duration>,
    registry: &TimeZoneRegistry,
) -> Result<FreeBusy, ExpandError> {
    let request_utc = registry.normalize_period(request)?;

    let mut busy = PeriodList::new();
    let mut kinds: Vec<FreeBusyKind> = Vec::new();
    for schedule in schedules {
        if schedule.kind() == FreeBusyKind::Free {
            continue;
        }
        let consumed = schedule.consumed_time(request, registry)?;
        if consumed.is_empty() {
            continue;
        }
        if !kinds.contains(&schedule.kind()) {
            kinds.push(schedule.kind());
        }
        busy = busy.add(&consumed)?;
    }

    let min_gap = min_free.filter(|gap| !gap.is_zero() && !gap.negative);
    let Some(min_gap) = min_gap else {
        let kind = match kinds.as_slice() {
            &[kind] => kind,
            _ => FreeBusyKind::Busy,
        };
        return Ok(FreeBusy {
            kind,
            periods: busy,
        });
    };

    if busy.is_empty() {
        // Nothing intersects the request: hand the caller's period back
        // untouched.
        let periods = PeriodList::from_periods([request.clone()])?;
        return Ok(FreeBusy {
            kind: FreeBusyKind::Free,
            periods,
        });
    }

    let gaps = PeriodList::from_periods([request_utc])?.subtract(&busy)?;
    let threshold = min_gap.as_seconds();
    let free: Vec<Period> = gaps
        .iter()
        .filter(|gap| gap.duration_seconds() >= threshold)
        .cloned()
        .collect();
    Ok(FreeBusy {
        kind: FreeBusyKind::Free,
        periods: PeriodList::from_periods(free)?.normalize(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ical::core::Temporal;
    use crate::ical::freebusy::RecurrenceSet;
    use crate::ical::parse::{parse_period, parse_rrule, parse_temporal};

    fn at(text: &str) -> Temporal {
        parse_temporal(text, None).expect("valid temporal")
    }

    fn period(text: &str) -> Period {
        parse_period(text, None).expect("valid period")
    }

    fn busy_for(start: &str, duration: Duration) -> Schedule {
        Schedule::new(RecurrenceSet::new(at(start))).with_duration(duration)
    }

    fn spans(result: &FreeBusy) -> Vec<String> {
        result.periods().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn kind_text_round_trips() {
        for kind in [
            FreeBusyKind::Free,
            FreeBusyKind::Busy,
            FreeBusyKind::BusyTentative,
            FreeBusyKind::BusyUnavailable,
        ] {
            assert_eq!(FreeBusyKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(
            FreeBusyKind::parse("busy-tentative"),
            Some(FreeBusyKind::BusyTentative)
        );
        assert_eq!(FreeBusyKind::parse("MAYBE"), None);
    }

    #[test]
    fn overlapping_schedules_merge_into_one_busy_period() {
        let schedules = [
            busy_for("20260105T090000Z", Duration::hours(2)),
            busy_for("20260105T100000Z", Duration::hours(2)),
        ];
        let registry = TimeZoneRegistry::new();

        let result = free_busy(
            &period("20260105T000000Z/20260106T000000Z"),
            &schedules,
            None,
            &registry,
        )
        .expect("aggregation");
        assert_eq!(result.kind(), FreeBusyKind::Busy);
        assert_eq!(spans(&result), ["20260105T090000Z/20260105T120000Z"]);
    }

    #[test]
    fn uniform_tentative_classification_surfaces() {
        let schedules = [
            busy_for("20260105T090000Z", Duration::hours(1))
                .with_kind(FreeBusyKind::BusyTentative),
            busy_for("20260105T140000Z", Duration::hours(1))
                .with_kind(FreeBusyKind::BusyTentative),
        ];
        let registry = TimeZoneRegistry::new();

        let result = free_busy(
            &period("20260105T000000Z/20260106T000000Z"),
            &schedules,
            None,
            &registry,
        )
        .expect("aggregation");
        assert_eq!(result.kind(), FreeBusyKind::BusyTentative);
    }

    #[test]
    fn mixed_kinds_fall_back_to_busy() {
        let schedules = [
            busy_for("20260105T090000Z", Duration::hours(1))
                .with_kind(FreeBusyKind::BusyTentative),
            busy_for("20260105T140000Z", Duration::hours(1)),
        ];
        let registry = TimeZoneRegistry::new();

        let result = free_busy(
            &period("20260105T000000Z/20260106T000000Z"),
            &schedules,
            None,
            &registry,
        )
        .expect("aggregation");
        assert_eq!(result.kind(), FreeBusyKind::Busy);
    }

    #[test]
    fn free_schedules_never_contribute() {
        let schedules =
            [busy_for("20260105T090000Z", Duration::hours(8)).with_kind(FreeBusyKind::Free)];
        let registry = TimeZoneRegistry::new();

        let result = free_busy(
            &period("20260105T000000Z/20260106T000000Z"),
            &schedules,
            None,
            &registry,
        )
        .expect("aggregation");
        assert_eq!(result.kind(), FreeBusyKind::Busy);
        assert!(result.periods().is_empty());
    }

    #[test]
    fn untouched_request_comes_back_when_nothing_intersects() {
        let schedules = [busy_for("20260201T090000Z", Duration::hours(1))];
        let registry = TimeZoneRegistry::new();

        let result = free_busy(
            &period("20260105T000000Z/P7D"),
            &schedules,
            Some(Duration::hours(1)),
            &registry,
        )
        .expect("aggregation");
        assert_eq!(result.kind(), FreeBusyKind::Free);
        assert_eq!(
            spans(&result),
            ["20260105T000000Z/P7D"],
            "the request period is handed back without normalization"
        );
    }

    #[test]
    fn min_free_filters_short_gaps() {
        let schedules = [
            busy_for("20260105T000000Z", Duration::hours(9)),
            busy_for("20260105T093000Z", Duration::minutes(30)),
        ];
        let registry = TimeZoneRegistry::new();

        let result = free_busy(
            &period("20260105T000000Z/20260106T000000Z"),
            &schedules,
            Some(Duration::hours(1)),
            &registry,
        )
        .expect("aggregation");
        assert_eq!(result.kind(), FreeBusyKind::Free);
        assert_eq!(
            spans(&result),
            ["20260105T100000Z/20260106T000000Z"],
            "the half-hour gap between the busy blocks is too short"
        );
    }

    #[test]
    fn no_schedules_means_the_whole_request_is_free() {
        let registry = TimeZoneRegistry::new();

        let result = free_busy(
            &period("20260105T000000Z/20260112T000000Z"),
            &[],
            Some(Duration::weeks(1)),
            &registry,
        )
        .expect("aggregation");
        assert_eq!(result.kind(), FreeBusyKind::Free);
        assert_eq!(spans(&result), ["20260105T000000Z/20260112T000000Z"]);
    }

    #[test]
    fn busy_answer_clips_to_the_request_bounds() {
        let set = RecurrenceSet::new(at("20260104T230000Z"))
            .with_rule(parse_rrule("FREQ=DAILY").expect("valid rule"));
        let schedules = [Schedule::new(set).with_duration(Duration::hours(2))];
        let registry = TimeZoneRegistry::new();

        let result = free_busy(
            &period("20260105T000000Z/20260106T000000Z"),
            &schedules,
            None,
            &registry,
        )
        .expect("aggregation");
        assert_eq!(
            spans(&result),
            [
                "20260105T000000Z/20260105T010000Z",
                "20260105T230000Z/20260106T000000Z",
            ]
        );
    }
}
