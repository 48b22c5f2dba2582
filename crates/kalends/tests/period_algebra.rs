//! Property tests for the period algebra and the expansion laws, plus
//! pinned boundary conventions.
//!
//! Periods are built on a minute grid from a fixed UTC base so every
//! generated set shares one precision and the arithmetic stays exact.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use kalends::ical::core::{DateTime, DateTimeForm, Period, PeriodList, Temporal};
use kalends::ical::expand::{TimeRange, TimeZoneRegistry};
use kalends::ical::parse::parse_rrule;
use proptest::prelude::*;

fn naive_mark(offset: u32) -> NaiveDateTime {
    let base = NaiveDate::from_ymd_opt(2026, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_else(|| panic!("base instant is valid"));
    base + TimeDelta::minutes(i64::from(offset))
}

fn minute_mark(offset: u32) -> Temporal {
    Temporal::from(DateTime::from_naive(naive_mark(offset), DateTimeForm::Utc))
}

fn span(start: u32, end: u32) -> Period {
    Period::explicit(minute_mark(start), minute_mark(end))
        .unwrap_or_else(|error| panic!("span {start}..{end}: {error}"))
}

/// Property: normalizing twice changes nothing.
#[test]
fn proptest_normalize_is_idempotent() {
    proptest!(|(spans in prop::collection::vec((0u32..20_000, 1u32..600), 0..12))| {
        let periods: Vec<Period> = spans
            .iter()
            .map(|&(start, len)| span(start, start + len))
            .collect();
        let list = PeriodList::from_periods(periods).expect("uniform precision");

        let once = list.normalize();
        let twice = once.normalize();
        prop_assert_eq!(once, twice);
    });
}

/// Property: for disjoint lists, adding one and subtracting it again
/// restores the other.
#[test]
fn proptest_disjoint_add_then_subtract_restores() {
    proptest!(|(walk in prop::collection::vec((0u32..240, 1u32..240, any::<bool>()), 1..10))| {
        let mut cursor = 0u32;
        let mut left = Vec::new();
        let mut right = Vec::new();
        for &(gap, len, pick) in &walk {
            let start = cursor + gap;
            let end = start + len;
            cursor = end;
            if pick {
                left.push(span(start, end));
            } else {
                right.push(span(start, end));
            }
        }
        let left = PeriodList::from_periods(left).expect("uniform precision");
        let right = PeriodList::from_periods(right).expect("uniform precision");

        let restored = left
            .add(&right)
            .expect("uniform precision")
            .subtract(&right)
            .expect("uniform precision");
        prop_assert_eq!(restored, left.normalize());
    });
}

/// Property: a counted rule over an unbounded window yields exactly COUNT
/// values.
#[test]
fn proptest_counted_rules_yield_exactly_count() {
    let registry = TimeZoneRegistry::new();
    let anchor = minute_mark(14 * 24 * 60 + 8 * 60 + 30);
    proptest!(|(
        count in 1usize..40,
        freq in prop::sample::select(vec!["DAILY", "WEEKLY", "MONTHLY"])
    )| {
        let rule = parse_rrule(&format!("FREQ={freq};COUNT={count}")).expect("valid rule");

        let values: Vec<Temporal> = rule
            .occurrences(&anchor, &TimeRange::unbounded(), &registry)
            .expect("expansion starts")
            .collect();
        prop_assert_eq!(values.len(), count);
    });
}

/// Property: every value an unbounded rule yields through a window lies
/// inside the window, and a daily rule fills it day for day.
#[test]
fn proptest_window_contains_every_value() {
    let registry = TimeZoneRegistry::new();
    let anchor = minute_mark(6 * 60);
    proptest!(|(start_day in 0u32..200, window_days in 1u16..90)| {
        let window_start = start_day * 1440;
        let window_end = (start_day + u32::from(window_days)) * 1440;
        let window = TimeRange::between(minute_mark(window_start), minute_mark(window_end));
        let rule = parse_rrule("FREQ=DAILY").expect("valid rule");

        let values: Vec<Temporal> = rule
            .occurrences(&anchor, &window, &registry)
            .expect("expansion starts")
            .collect();

        prop_assert_eq!(values.len(), usize::from(window_days));
        for value in &values {
            let naive = value.to_naive().expect("UTC values are real");
            prop_assert!(naive >= naive_mark(window_start));
            prop_assert!(naive < naive_mark(window_end));
        }
    });
}

/// Property: a period ending exactly where another starts is before it,
/// does not intersect it, and the boundary instant belongs to the later
/// period only.
#[test]
fn proptest_shared_boundary_belongs_to_the_later_period() {
    proptest!(|(start in 0u32..10_000, first_len in 1u32..300, second_len in 1u32..300)| {
        let boundary = start + first_len;
        let earlier = span(start, boundary);
        let later = span(boundary, boundary + second_len);

        prop_assert!(earlier.before(&later).expect("uniform precision"));
        prop_assert!(later.after(&earlier).expect("uniform precision"));
        prop_assert!(!earlier.intersects(&later).expect("uniform precision"));

        let point = minute_mark(boundary);
        prop_assert!(!earlier.includes(&point).expect("uniform precision"));
        prop_assert!(later.includes(&point).expect("uniform precision"));
    });
}

#[test]
fn subtracting_a_contained_period_leaves_two_remainders() {
    let outer = span(0, 600);
    let inner = span(120, 180);

    let remainders = outer.subtract(&inner).expect("uniform precision");

    let texts: Vec<String> = remainders.iter().map(ToString::to_string).collect();
    assert_eq!(
        texts,
        ["20260101T000000Z/20260101T020000Z", "20260101T030000Z/20260101T100000Z"]
    );
}

#[test]
fn abutting_periods_merge_while_gapped_periods_do_not() {
    let first = span(0, 60);
    let flush = span(60, 120);
    let apart = span(121, 180);

    let merged = first.union(&flush).expect("uniform precision");
    assert_eq!(merged, Some(span(0, 120)));
    assert_eq!(first.union(&apart).expect("uniform precision"), None);
}
