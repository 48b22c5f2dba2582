//! Recurrence sets and the consumed-time calculator.
//!
//! A [`RecurrenceSet`] aggregates an entity's start, recurrence rules, and
//! addition and exclusion data into one deduplicated occurrence sequence
//! (RFC 5545 §3.8.5). A [`Schedule`] pairs that set with the entity's extent
//! and free/busy classification; [`Schedule::consumed_time`] reduces it to
//! the UTC periods the entity occupies within a query period.

use chrono::{NaiveDateTime, TimeDelta};

use crate::ical::core::{
    DateTime, DateTimeForm, Duration, Period, PeriodList, Precision, RecurrenceRule, Temporal,
};
use crate::ical::expand::{ExpandError, TimeRange, TimeZoneRegistry};

use super::query::FreeBusyKind;

/// Occurrence cap applied to a recurrence set without an explicit override.
pub const DEFAULT_MAX_INSTANCES: usize = 10_000;

/// The complete occurrence set of a recurring entity.
///
/// Occurrences are the union of the start itself, every rule seeded at that
/// start, and the explicit addition dates, minus any value matching an
/// exclusion date or exclusion rule. Period-valued addition dates carry their
/// own extent; they contribute to [`Schedule::consumed_time`] rather than to
/// [`Self::instances`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceSet {
    start: Temporal,
    rules: Vec<RecurrenceRule>,
    rdates: Vec<Temporal>,
    rdate_periods: Vec<Period>,
    exrules: Vec<RecurrenceRule>,
    exdates: Vec<Temporal>,
    max_instances: usize,
}

impl RecurrenceSet {
    /// Creates a set with only the starting occurrence.
    #[must_use]
    pub const fn new(start: Temporal) -> Self {
        Self {
            start,
            rules: Vec::new(),
            rdates: Vec::new(),
            rdate_periods: Vec::new(),
            exrules: Vec::new(),
            exdates: Vec::new(),
            max_instances: DEFAULT_MAX_INSTANCES,
        }
    }

    /// Adds a recurrence rule seeded at the start.
    #[must_use]
    pub fn with_rule(mut self, rule: RecurrenceRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds an explicit addition date.
    #[must_use]
    pub fn with_rdate(mut self, rdate: impl Into<Temporal>) -> Self {
        self.rdates.push(rdate.into());
        self
    }

    /// Adds a period-valued addition date.
    #[must_use]
    pub fn with_rdate_period(mut self, period: Period) -> Self {
        self.rdate_periods.push(period);
        self
    }

    /// Adds an exclusion rule seeded at the start.
    #[must_use]
    pub fn with_exrule(mut self, rule: RecurrenceRule) -> Self {
        self.exrules.push(rule);
        self
    }

    /// Adds an exclusion date. A date-only exclusion removes every occurrence
    /// on that calendar day.
    #[must_use]
    pub fn with_exdate(mut self, exdate: impl Into<Temporal>) -> Self {
        self.exdates.push(exdate.into());
        self
    }

    /// Overrides the occurrence cap.
    #[must_use]
    pub const fn with_max_instances(mut self, max_instances: usize) -> Self {
        self.max_instances = max_instances;
        self
    }

    /// The starting occurrence every rule is seeded at.
    #[must_use]
    pub const fn start(&self) -> &Temporal {
        &self.start
    }

    /// Period-valued addition dates.
    #[must_use]
    pub fn rdate_periods(&self) -> &[Period] {
        &self.rdate_periods
    }

    /// ## Summary
    /// Expands the set into its occurrence values within `window`, sorted by
    /// civil time and deduplicated.
    ///
    /// The start is always an occurrence when it falls inside the window,
    /// whether or not any rule regenerates it. Addition dates the registry
    /// cannot place are skipped with a warning rather than failing the whole
    /// set. The result is truncated at the configured instance cap, so an
    /// unbounded rule over an unbounded window still terminates.
    ///
    /// ## Errors
    ///
    /// Returns an error when the start, a window bound, or a rule's UNTIL
    /// value cannot be resolved to an instant.
    pub fn instances(
        &self,
        window: &TimeRange,
        registry: &TimeZoneRegistry,
    ) -> Result<Vec<Temporal>, ExpandError> {
        let start_key = registry.to_utc(&self.start)?;
        let window_start = window.start().map(|bound| registry.to_utc(bound)).transpose()?;
        let window_end = window.end().map(|bound| registry.to_utc(bound)).transpose()?;

        let mut collected = Vec::new();
        for rule in &self.rules {
            let budget = self.max_instances.saturating_sub(collected.len());
            collected.extend(rule.occurrences(&self.start, window, registry)?.take(budget));
        }
        if within(start_key, window_start, window_end)
            && !collected.iter().any(|value| value.coincides_with(&self.start))
        {
            collected.push(self.start.clone());
        }
        for rdate in &self.rdates {
            match registry.to_utc(rdate) {
                Ok(key) if within(key, window_start, window_end) => collected.push(rdate.clone()),
                Ok(_) => {}
                Err(error) => {
                    tracing::warn!(
                        value = %rdate,
                        %error,
                        "skipping addition date the time zone cannot place"
                    );
                }
            }
        }

        let exclusions = self.exclusions(window, registry)?;
        collected.sort_by_key(Temporal::to_naive);
        collected.dedup_by(|a, b| a.coincides_with(b));
        collected.retain(|occurrence| !exclusions.iter().any(|ex| ex.coincides_with(occurrence)));
        if collected.len() >= self.max_instances {
            collected.truncate(self.max_instances);
            tracing::warn!(
                limit = self.max_instances,
                "recurrence set expansion stopped at its instance cap"
            );
        }
        Ok(collected)
    }

    fn exclusions(
        &self,
        window: &TimeRange,
        registry: &TimeZoneRegistry,
    ) -> Result<Vec<Temporal>, ExpandError> {
        let mut exclusions = self.exdates.clone();
        for exrule in &self.exrules {
            let expanded = exrule.occurrences(&self.start, window, registry)?;
            exclusions.extend(expanded.take(self.max_instances));
        }
        Ok(exclusions)
    }

    fn excludes(&self, value: &Temporal) -> bool {
        self.exdates.iter().any(|exdate| exdate.coincides_with(value))
    }
}

/// A recurrence set paired with each occurrence's extent and its free/busy
/// classification.
///
/// The extent is an explicit end, an explicit duration, or zero when neither
/// is given. An end pins the exact elapsed time of the first occurrence, and
/// every later occurrence spans that same number of seconds. A duration is
/// nominal: day and week components land on the same wall-clock time across
/// daylight saving transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    set: RecurrenceSet,
    end: Option<Temporal>,
    duration: Option<Duration>,
    kind: FreeBusyKind,
}

impl Schedule {
    /// Creates a busy schedule over `set` with zero extent.
    #[must_use]
    pub const fn new(set: RecurrenceSet) -> Self {
        Self {
            set,
            end: None,
            duration: None,
            kind: FreeBusyKind::Busy,
        }
    }

    /// Sets the explicit end of the first occurrence, clearing any duration.
    #[must_use]
    pub fn with_end(mut self, end: impl Into<Temporal>) -> Self {
        self.end = Some(end.into());
        self.duration = None;
        self
    }

    /// Sets the nominal duration of every occurrence, clearing any end.
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self.end = None;
        self
    }

    /// Sets the free/busy classification carried into aggregation results.
    #[must_use]
    pub const fn with_kind(mut self, kind: FreeBusyKind) -> Self {
        self.kind = kind;
        self
    }

    /// The underlying recurrence set.
    #[must_use]
    pub const fn set(&self) -> &RecurrenceSet {
        &self.set
    }

    /// The free/busy classification.
    #[must_use]
    pub const fn kind(&self) -> FreeBusyKind {
        self.kind
    }

    /// ## Summary
    /// Computes the UTC periods this schedule occupies within `query`.
    ///
    /// Occurrences are expanded over the query window widened backward by the
    /// extent, so an occurrence straddling the query start still contributes.
    /// Each occurrence start becomes a period via the extent, is resolved to
    /// UTC through the registry, and is clipped to the query. Period-valued
    /// addition dates contribute their own extents. A schedule with zero
    /// extent and no period addition dates consumes nothing.
    ///
    /// ## Errors
    ///
    /// Returns an error when the query, the set's start, or the extent cannot
    /// be resolved, or when expanding one of the set's rules fails.
    #[tracing::instrument(skip_all)]
    pub fn consumed_time(
        &self,
        query: &Period,
        registry: &TimeZoneRegistry,
    ) -> Result<PeriodList, ExpandError> {
        let query_utc = registry.normalize_period(query)?;
        let extent = self.extent(registry)?;

        let mut busy = Vec::new();
        if !extent.is_zero() {
            let window = expansion_window(&query_utc, extent);
            for occurrence in self.set.instances(&window, registry)? {
                if let Some(period) = occurrence_period(&occurrence, extent, registry)?
                    && let Some(overlap) = period.intersection(&query_utc)?
                {
                    busy.push(overlap);
                }
            }
        }
        for addition in &self.set.rdate_periods {
            if self.set.excludes(addition.start()) {
                continue;
            }
            match registry.normalize_period(addition) {
                Ok(normalized) => {
                    if let Some(overlap) = normalized.intersection(&query_utc)? {
                        busy.push(overlap);
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        %error,
                        "skipping period addition date that does not normalize"
                    );
                }
            }
        }
        Ok(PeriodList::from_periods(busy)?.normalize())
    }

    fn extent(&self, registry: &TimeZoneRegistry) -> Result<Extent, ExpandError> {
        if let Some(duration) = self.duration {
            if duration.negative && !duration.is_zero() {
                return Err(ExpandError::NegativeExtent);
            }
            return Ok(Extent::Nominal(duration));
        }
        if let Some(end) = &self.end {
            let start = registry.to_utc(&self.set.start)?;
            let end = registry.to_utc(end)?;
            if end < start {
                return Err(ExpandError::NegativeExtent);
            }
            return Ok(Extent::Exact(end - start));
        }
        Ok(Extent::Exact(TimeDelta::zero()))
    }
}

/// How far each occurrence extends: the nominal duration written on the
/// schedule, or an exact second span pinned by an end value.
#[derive(Debug, Clone, Copy)]
enum Extent {
    Nominal(Duration),
    Exact(TimeDelta),
}

impl Extent {
    fn is_zero(self) -> bool {
        match self {
            Self::Nominal(duration) => duration.is_zero(),
            Self::Exact(delta) => delta.is_zero(),
        }
    }

    /// Upper bound on the elapsed time of one occurrence. Nominal days can
    /// stretch to 25 elapsed hours, so they get a day of headroom.
    fn slack(self) -> TimeDelta {
        match self {
            Self::Nominal(duration) => {
                TimeDelta::days(duration.nominal_days() + 1)
                    + TimeDelta::seconds(duration.time_seconds())
            }
            Self::Exact(delta) => delta,
        }
    }
}

/// Widens the query window backward so occurrences beginning before the
/// query but still overlapping it are expanded.
fn expansion_window(query: &Period, extent: Extent) -> TimeRange {
    let start = query
        .start()
        .to_naive()
        .and_then(|naive| naive.checked_sub_signed(extent.slack()))
        .map(|naive| Temporal::from(DateTime::from_naive(naive, DateTimeForm::Utc)));
    match start {
        Some(start) => TimeRange::between(start, query.end()),
        None => TimeRange::ending_at(query.end()),
    }
}

/// Maps one occurrence start to its UTC-normalized period, or `None` when
/// the occurrence cannot carry this extent.
fn occurrence_period(
    occurrence: &Temporal,
    extent: Extent,
    registry: &TimeZoneRegistry,
) -> Result<Option<Period>, ExpandError> {
    match extent {
        Extent::Nominal(duration) => {
            if occurrence.precision() == Precision::Date && duration.time_seconds() != 0 {
                tracing::warn!(
                    value = %occurrence,
                    "skipping date occurrence with a clocked duration"
                );
                return Ok(None);
            }
            let period = Period::from_duration(occurrence.clone(), duration);
            registry.normalize_period(&period).map(Some)
        }
        Extent::Exact(delta) => {
            let start = registry.to_utc(occurrence)?;
            let Some(end) = start.checked_add_signed(delta) else {
                return Ok(None);
            };
            let start = Temporal::from(DateTime::from_naive(start, DateTimeForm::Utc));
            let end = Temporal::from(DateTime::from_naive(end, DateTimeForm::Utc));
            Period::explicit(start, end).map(Some).map_err(ExpandError::from)
        }
    }
}

fn within(key: NaiveDateTime, start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> bool {
    start.is_none_or(|bound| key >= bound) && end.is_none_or(|bound| key < bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ical::parse::{parse_period, parse_rrule, parse_temporal};

    fn at(text: &str) -> Temporal {
        parse_temporal(text, None).expect("valid temporal")
    }

    fn zoned(text: &str, tzid: &str) -> Temporal {
        parse_temporal(text, Some(tzid)).expect("valid temporal")
    }

    fn period(text: &str) -> Period {
        parse_period(text, None).expect("valid period")
    }

    fn rule(text: &str) -> RecurrenceRule {
        parse_rrule(text).expect("valid rule")
    }

    fn spans(list: &PeriodList) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn weekly_workday_schedule_consumes_working_hours() {
        let set = RecurrenceSet::new(at("20050404T090000Z"))
            .with_rule(rule("FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR"));
        let schedule = Schedule::new(set).with_duration(Duration::hours(8));
        let registry = TimeZoneRegistry::new();

        let consumed = schedule
            .consumed_time(&period("20050404T000000Z/20050417T000000Z"), &registry)
            .expect("consumed time");
        let spans = spans(&consumed);
        assert_eq!(spans.len(), 10, "two work weeks of daily periods");
        assert_eq!(spans[0], "20050404T090000Z/20050404T170000Z");
        assert_eq!(spans[9], "20050415T090000Z/20050415T170000Z");
    }

    #[test]
    fn start_counts_without_any_rule() {
        let schedule = Schedule::new(RecurrenceSet::new(at("20260105T100000Z")))
            .with_duration(Duration::hours(1));
        let registry = TimeZoneRegistry::new();

        let consumed = schedule
            .consumed_time(&period("20260101T000000Z/20260201T000000Z"), &registry)
            .expect("consumed time");
        assert_eq!(spans(&consumed), ["20260105T100000Z/20260105T110000Z"]);
    }

    #[test]
    fn date_only_entity_without_duration_consumes_nothing() {
        let schedule = Schedule::new(RecurrenceSet::new(at("20081225")));
        let registry = TimeZoneRegistry::new();

        let consumed = schedule
            .consumed_time(&period("20081201T000000Z/20090101T000000Z"), &registry)
            .expect("consumed time");
        assert!(consumed.is_empty(), "a dateless extent occupies no time");
    }

    #[test]
    fn straddling_occurrence_clips_to_the_query_start() {
        let set = RecurrenceSet::new(at("20050403T230000Z")).with_rule(rule("FREQ=DAILY"));
        let schedule = Schedule::new(set).with_duration(Duration::hours(2));
        let registry = TimeZoneRegistry::new();

        let consumed = schedule
            .consumed_time(&period("20050405T000000Z/20050406T000000Z"), &registry)
            .expect("consumed time");
        assert_eq!(
            spans(&consumed),
            [
                "20050405T000000Z/20050405T010000Z",
                "20050405T230000Z/20050406T000000Z",
            ],
            "both bounds clip to the query"
        );
    }

    #[test]
    fn exdate_removes_one_occurrence() {
        let set = RecurrenceSet::new(at("20260106T090000Z"))
            .with_rule(rule("FREQ=DAILY;COUNT=3"))
            .with_exdate(at("20260107T090000Z"));
        let schedule = Schedule::new(set).with_duration(Duration::hours(1));
        let registry = TimeZoneRegistry::new();

        let consumed = schedule
            .consumed_time(&period("20260101T000000Z/20260201T000000Z"), &registry)
            .expect("consumed time");
        assert_eq!(
            spans(&consumed),
            [
                "20260106T090000Z/20260106T100000Z",
                "20260108T090000Z/20260108T100000Z",
            ]
        );
    }

    #[test]
    fn date_exclusion_removes_the_whole_day() {
        let set = RecurrenceSet::new(at("20260106T090000Z"))
            .with_rule(rule("FREQ=DAILY;COUNT=3"))
            .with_exdate(at("20260107"));
        let registry = TimeZoneRegistry::new();

        let instances = set
            .instances(&TimeRange::unbounded(), &registry)
            .expect("instances");
        let texts: Vec<String> = instances.iter().map(ToString::to_string).collect();
        assert_eq!(texts, ["20260106T090000Z", "20260108T090000Z"]);
    }

    #[test]
    fn exrule_removes_matching_occurrences() {
        let set = RecurrenceSet::new(at("20260105T090000Z"))
            .with_rule(rule("FREQ=DAILY;COUNT=7"))
            .with_exrule(rule("FREQ=WEEKLY;BYDAY=SA,SU"));
        let registry = TimeZoneRegistry::new();

        let instances = set
            .instances(&TimeRange::unbounded(), &registry)
            .expect("instances");
        let texts: Vec<String> = instances.iter().map(ToString::to_string).collect();
        assert_eq!(
            texts,
            [
                "20260105T090000Z",
                "20260106T090000Z",
                "20260107T090000Z",
                "20260108T090000Z",
                "20260109T090000Z",
            ],
            "the weekend days drop out"
        );
    }

    #[test]
    fn rdate_duplicate_of_rule_occurrence_collapses() {
        let set = RecurrenceSet::new(at("20260101T090000Z"))
            .with_rule(rule("FREQ=DAILY;COUNT=2"))
            .with_rdate(at("20260102T090000Z"))
            .with_rdate(at("20260103T090000Z"));
        let registry = TimeZoneRegistry::new();

        let instances = set
            .instances(&TimeRange::unbounded(), &registry)
            .expect("instances");
        let texts: Vec<String> = instances.iter().map(ToString::to_string).collect();
        assert_eq!(
            texts,
            ["20260101T090000Z", "20260102T090000Z", "20260103T090000Z"]
        );
    }

    #[test]
    fn instance_cap_truncates_runaway_rules() {
        let set = RecurrenceSet::new(at("20260101T000000Z"))
            .with_rule(rule("FREQ=DAILY"))
            .with_max_instances(5);
        let registry = TimeZoneRegistry::new();

        let instances = set
            .instances(&TimeRange::unbounded(), &registry)
            .expect("instances");
        assert_eq!(instances.len(), 5);
        assert_eq!(instances[4].to_string(), "20260105T000000Z");
    }

    #[test]
    fn period_addition_dates_carry_their_own_extent() {
        let set = RecurrenceSet::new(at("20260106T090000Z"))
            .with_rdate_period(period("20260110T120000Z/20260110T140000Z"));
        let schedule = Schedule::new(set);
        let registry = TimeZoneRegistry::new();

        let consumed = schedule
            .consumed_time(&period("20260101T000000Z/20260201T000000Z"), &registry)
            .expect("consumed time");
        assert_eq!(
            spans(&consumed),
            ["20260110T120000Z/20260110T140000Z"],
            "the zero-extent start contributes nothing, the period does"
        );
    }

    #[test]
    fn exdate_removes_a_period_addition_date() {
        let set = RecurrenceSet::new(at("20260106T090000Z"))
            .with_rdate_period(period("20260110T120000Z/20260110T140000Z"))
            .with_exdate(at("20260110T120000Z"));
        let schedule = Schedule::new(set);
        let registry = TimeZoneRegistry::new();

        let consumed = schedule
            .consumed_time(&period("20260101T000000Z/20260201T000000Z"), &registry)
            .expect("consumed time");
        assert!(consumed.is_empty());
    }

    #[test]
    fn explicit_end_pins_exact_seconds_across_transitions() {
        let set = RecurrenceSet::new(zoned("20260307T090000", "America/New_York"))
            .with_rule(rule("FREQ=DAILY;COUNT=2"));
        let schedule = Schedule::new(set).with_end(zoned("20260308T090000", "America/New_York"));
        let registry = TimeZoneRegistry::new();

        // The first occurrence spans 23 exact hours (its nominal day crosses
        // the spring-forward transition), and the second occurrence spans the
        // same 23 hours. They abut, so they merge.
        let consumed = schedule
            .consumed_time(&period("20260301T000000Z/20260315T000000Z"), &registry)
            .expect("consumed time");
        assert_eq!(spans(&consumed), ["20260307T140000Z/20260309T120000Z"]);
    }

    #[test]
    fn nominal_day_duration_follows_wall_clock() {
        let set = RecurrenceSet::new(zoned("20260307T090000", "America/New_York"));
        let schedule = Schedule::new(set).with_duration(Duration::days(1));
        let registry = TimeZoneRegistry::new();

        let consumed = schedule
            .consumed_time(&period("20260301T000000Z/20260315T000000Z"), &registry)
            .expect("consumed time");
        assert_eq!(spans(&consumed), ["20260307T140000Z/20260308T130000Z"]);
        assert_eq!(consumed.periods()[0].duration_seconds(), 23 * 3600);
    }

    #[test]
    fn negative_duration_is_an_error() {
        let schedule = Schedule::new(RecurrenceSet::new(at("20260105T090000Z")))
            .with_duration(Duration::minutes(30).negate());
        let registry = TimeZoneRegistry::new();

        let result =
            schedule.consumed_time(&period("20260101T000000Z/20260201T000000Z"), &registry);
        assert!(matches!(result, Err(ExpandError::NegativeExtent)));
    }

    #[test]
    fn end_before_start_is_an_error() {
        let schedule = Schedule::new(RecurrenceSet::new(at("20260105T090000Z")))
            .with_end(at("20260105T080000Z"));
        let registry = TimeZoneRegistry::new();

        let result =
            schedule.consumed_time(&period("20260101T000000Z/20260201T000000Z"), &registry);
        assert!(matches!(result, Err(ExpandError::NegativeExtent)));
    }
}
