//! Recurrence rule expansion (RFC 5545 §3.3.10).
//!
//! Occurrences are generated one frequency period at a time (one year, one
//! month, one week, ...), stepping the anchor forward by `INTERVAL` periods.
//! Within each period the by-parts refine a candidate set from the coarsest
//! component to the finest: BYMONTH, BYWEEKNO, BYYEARDAY, BYMONTHDAY, BYDAY,
//! BYHOUR, BYMINUTE, BYSECOND, with BYSETPOS selecting positions out of the
//! sorted per-period set last. A by-part coarser than the frequency expands
//! the set; one finer than the frequency limits it.
//!
//! The cursor tracks nominal field values rather than real calendar dates,
//! so a rule anchored on January 31st expanded monthly skips February rather
//! than sliding to March 2nd or 3rd.

use std::collections::VecDeque;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, TimeDelta, Timelike};

use crate::ical::core::{
    Date, DateTime, DateTimeForm, Frequency, PrecisionError, RecurrenceRule, Temporal, Weekday,
    WeekdayNum,
};

use super::timezone::{TimeZoneError, TimeZoneRegistry};

/// Consecutive frequency periods with no surviving candidates tolerated
/// before expansion of an unbounded rule gives up.
pub const MAX_EMPTY_PERIODS: u32 = 1000;

/// Error during recurrence expansion.
#[derive(Debug, thiserror::Error)]
pub enum ExpandError {
    /// Mixed date-only and time-bearing values where no lossless comparison
    /// is defined.
    #[error(transparent)]
    Precision(#[from] PrecisionError),

    /// Time zone resolution failed for the anchor, window, or UNTIL value.
    #[error(transparent)]
    TimeZone(#[from] TimeZoneError),

    /// A supplied value does not exist on the calendar.
    #[error("{0} is not a real calendar time")]
    InvalidTemporal(&'static str),

    /// A schedule's end precedes its start, or its duration is negative.
    #[error("schedule extent is negative")]
    NegativeExtent,
}

/// Half-open query window over occurrence instants.
///
/// A `None` bound is unbounded on that side. The start is inclusive and the
/// end is exclusive; zoned bounds are resolved to instants through the
/// registry supplied at expansion time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeRange {
    start: Option<Temporal>,
    end: Option<Temporal>,
}

impl TimeRange {
    /// A window covering all of time.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// A window from `start` (inclusive) onward.
    #[must_use]
    pub fn starting_at(start: impl Into<Temporal>) -> Self {
        Self {
            start: Some(start.into()),
            end: None,
        }
    }

    /// A window up to `end` (exclusive).
    #[must_use]
    pub fn ending_at(end: impl Into<Temporal>) -> Self {
        Self {
            start: None,
            end: Some(end.into()),
        }
    }

    /// A window from `start` (inclusive) to `end` (exclusive).
    #[must_use]
    pub fn between(start: impl Into<Temporal>, end: impl Into<Temporal>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
        }
    }

    /// Lower bound, if any.
    #[must_use]
    pub const fn start(&self) -> Option<&Temporal> {
        self.start.as_ref()
    }

    /// Upper bound, if any.
    #[must_use]
    pub const fn end(&self) -> Option<&Temporal> {
        self.end.as_ref()
    }
}

impl RecurrenceRule {
    /// ## Summary
    /// Expands this rule into the lazy occurrence sequence seeded at `anchor`
    /// and clipped to `window`.
    ///
    /// The anchor supplies every component the rule's by-parts leave
    /// unspecified, and its form (floating, UTC, or zoned) carries over to
    /// each occurrence. Candidates before the anchor are not occurrences and
    /// never count toward `COUNT`; candidates at or past the anchor but
    /// before the window start do. The sequence ends when `COUNT` is spent,
    /// a candidate passes `UNTIL` (inclusive) or the window end (exclusive),
    /// or the rule stops producing candidates.
    ///
    /// ## Errors
    /// Returns an error if the anchor, window bounds, or `UNTIL` value name a
    /// nonexistent calendar time or an unknown time zone.
    pub fn occurrences<'a>(
        &'a self,
        anchor: &Temporal,
        window: &TimeRange,
        registry: &'a TimeZoneRegistry,
    ) -> Result<Occurrences<'a>, ExpandError> {
        let anchor_naive = anchor
            .to_naive()
            .ok_or(ExpandError::InvalidTemporal("anchor"))?;
        registry.to_utc(anchor)?;

        let until_key = match self.until() {
            Some(until) => Some(instant_key(until, registry)?),
            None => None,
        };
        let window_start_key = match window.start() {
            Some(start) => Some(instant_key(start, registry)?),
            None => None,
        };
        let window_end_key = match window.end() {
            Some(end) => Some(instant_key(end, registry)?),
            None => None,
        };

        let form = match anchor {
            Temporal::Date(_) => None,
            Temporal::DateTime(value) => Some(value.form.clone()),
        };

        Ok(Occurrences {
            rule: self,
            registry,
            form,
            anchor: anchor_naive,
            cursor: Fields::from_naive(anchor_naive),
            until_key,
            window_start_key,
            window_end_key,
            pending: VecDeque::new(),
            remaining: self.count(),
            empty_streak: 0,
            exhausted: false,
        })
    }
}

/// UTC comparison key for a bound value.
fn instant_key(
    value: &Temporal,
    registry: &TimeZoneRegistry,
) -> Result<NaiveDateTime, ExpandError> {
    registry.to_utc(value).map_err(ExpandError::from)
}

/// Nominal cursor position within the calendar.
///
/// The day may name a date that does not exist in the cursor month (day 31
/// in February); such a period simply yields no candidate until the cursor
/// reaches a month where the date is real again.
#[derive(Debug, Clone, Copy)]
struct Fields {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
}

impl Fields {
    fn from_naive(value: NaiveDateTime) -> Self {
        Self {
            year: value.year(),
            month: value.month(),
            day: value.day(),
            hour: value.hour(),
            minute: value.minute(),
            second: value.second(),
        }
    }
}

/// Lazy occurrence sequence produced by [`RecurrenceRule::occurrences`].
#[derive(Debug)]
pub struct Occurrences<'a> {
    rule: &'a RecurrenceRule,
    registry: &'a TimeZoneRegistry,
    /// `None` for a date-only anchor.
    form: Option<DateTimeForm>,
    anchor: NaiveDateTime,
    cursor: Fields,
    until_key: Option<NaiveDateTime>,
    window_start_key: Option<NaiveDateTime>,
    window_end_key: Option<NaiveDateTime>,
    pending: VecDeque<NaiveDateTime>,
    remaining: Option<u32>,
    empty_streak: u32,
    exhausted: bool,
}

impl Iterator for Occurrences<'_> {
    type Item = Temporal;

    fn next(&mut self) -> Option<Temporal> {
        loop {
            if self.exhausted {
                return None;
            }
            let Some(candidate) = self.pending.pop_front() else {
                self.fill_next_period();
                continue;
            };
            if candidate < self.anchor {
                continue;
            }
            let Some(key) = self.candidate_key(candidate) else {
                continue;
            };
            if let Some(until) = self.until_key
                && key > until
            {
                self.exhausted = true;
                return None;
            }
            if let Some(end) = self.window_end_key
                && key >= end
            {
                self.exhausted = true;
                return None;
            }
            if let Some(remaining) = self.remaining.as_mut() {
                if *remaining == 0 {
                    self.exhausted = true;
                    return None;
                }
                *remaining -= 1;
            }
            if let Some(start) = self.window_start_key
                && key < start
            {
                continue;
            }
            return Some(self.wrap(candidate));
        }
    }
}

impl Occurrences<'_> {
    /// Wraps a civil candidate in the anchor's representation.
    fn wrap(&self, candidate: NaiveDateTime) -> Temporal {
        match &self.form {
            None => Temporal::Date(Date::from_naive(candidate.date())),
            Some(form) => Temporal::DateTime(DateTime::from_naive(candidate, form.clone())),
        }
    }

    /// UTC key for a civil candidate, or `None` when the zone cannot place
    /// it (a DST gap wider than the lenient retry).
    fn candidate_key(&self, candidate: NaiveDateTime) -> Option<NaiveDateTime> {
        match self.registry.to_utc(&self.wrap(candidate)) {
            Ok(instant) => Some(instant),
            Err(error) => {
                tracing::warn!(
                    %candidate, %error, "dropping occurrence the time zone cannot place"
                );
                None
            }
        }
    }

    /// Expands the current frequency period into `pending` and advances the
    /// cursor, terminating the sequence when the period lies past every
    /// bound or too many consecutive periods come up empty.
    fn fill_next_period(&mut self) {
        if self.period_out_of_reach() {
            self.exhausted = true;
            return;
        }
        let candidates = self.expand_period();
        self.advance_cursor();
        if candidates.is_empty() {
            self.empty_streak += 1;
            if self.empty_streak >= MAX_EMPTY_PERIODS {
                tracing::warn!(
                    rule = %self.rule,
                    limit = MAX_EMPTY_PERIODS,
                    "abandoning expansion after too many consecutive empty periods"
                );
                self.exhausted = true;
            }
            return;
        }
        self.empty_streak = 0;
        self.pending = candidates.into();
    }

    /// True when no candidate of the current period can precede the window
    /// end or UNTIL bound. The slack absorbs zone offsets and week overhang
    /// into the previous year.
    fn period_out_of_reach(&self) -> bool {
        let ceiling = match (self.until_key, self.window_end_key) {
            (Some(until), Some(end)) => until.min(end),
            (Some(until), None) => until,
            (None, Some(end)) => end,
            (None, None) => return false,
        };
        let Some(floor) = self.period_floor() else {
            return false;
        };
        match floor.checked_sub_signed(TimeDelta::days(7)) {
            Some(slack) => slack > ceiling,
            None => false,
        }
    }

    /// Earliest civil instant the current period can produce a candidate in.
    fn period_floor(&self) -> Option<NaiveDateTime> {
        let Fields {
            year,
            month,
            day,
            hour,
            minute,
            second,
        } = self.cursor;
        let clamped = day.min(days_in_month(year, month)?);
        let date = NaiveDate::from_ymd_opt(year, month, clamped)?;
        match self.rule.freq() {
            Frequency::Yearly => NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0),
            Frequency::Monthly => NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0),
            Frequency::Weekly => week_start_of(date, self.rule.week_start())?.and_hms_opt(0, 0, 0),
            Frequency::Daily => date.and_hms_opt(0, 0, 0),
            Frequency::Hourly => date.and_hms_opt(hour, 0, 0),
            Frequency::Minutely => date.and_hms_opt(hour, minute, 0),
            Frequency::Secondly => date.and_hms_opt(hour, minute, second),
        }
    }

    /// All candidates of the current period, sorted, deduplicated, and
    /// reduced by BYSETPOS.
    fn expand_period(&self) -> Vec<NaiveDateTime> {
        let months = self.expand_months();
        let dates = self.apply_by_day(self.expand_days(&months));
        let mut candidates = self.expand_times(&dates);
        candidates.sort_unstable();
        candidates.dedup();
        self.apply_set_pos(candidates)
    }

    /// BYMONTH stage: expands the cursor year into months for a yearly rule,
    /// limits the cursor month otherwise.
    fn expand_months(&self) -> Vec<(i32, u32)> {
        let by_month = self.rule.by_month();
        let base = (self.cursor.year, self.cursor.month);
        if by_month.is_empty() {
            return vec![base];
        }
        if self.rule.freq() == Frequency::Yearly {
            return by_month
                .iter()
                .map(|&month| (self.cursor.year, u32::from(month)))
                .collect();
        }
        if by_month.iter().any(|&month| u32::from(month) == base.1) {
            vec![base]
        } else {
            Vec::new()
        }
    }

    /// BYWEEKNO, BYYEARDAY, and BYMONTHDAY stages, or the nominal cursor day
    /// when none of them is present.
    fn expand_days(&self, months: &[(i32, u32)]) -> Vec<NaiveDate> {
        let rule = self.rule;
        if !rule.by_week_no().is_empty() {
            let anchor_weekday = Weekday::from_chrono(self.anchor.date().weekday());
            let offset = anchor_weekday.days_from(rule.week_start());
            let mut dates = Vec::new();
            for &week in rule.by_week_no() {
                if let Some(start) = week_no_start(self.cursor.year, week, rule.week_start())
                    && let Some(date) = start.checked_add_days(Days::new(u64::from(offset)))
                {
                    dates.push(date);
                }
            }
            return self.limit_day_filters(dates);
        }
        if !rule.by_year_day().is_empty() {
            if rule.freq() == Frequency::Yearly {
                let dates = rule
                    .by_year_day()
                    .iter()
                    .filter_map(|&day| year_day(self.cursor.year, day))
                    .collect();
                return self.limit_day_filters(dates);
            }
            // Sub-daily frequencies limit the nominal date instead
            return self
                .nominal_dates(months)
                .into_iter()
                .filter(|date| matches_year_day(*date, rule.by_year_day()))
                .collect();
        }
        if !rule.by_month_day().is_empty() {
            if matches!(rule.freq(), Frequency::Monthly | Frequency::Yearly) {
                let mut dates = Vec::new();
                for &(year, month) in months {
                    for &day in rule.by_month_day() {
                        if let Some(date) = resolve_month_day(year, month, day) {
                            dates.push(date);
                        }
                    }
                }
                return dates;
            }
            return self
                .nominal_dates(months)
                .into_iter()
                .filter(|date| matches_month_day(*date, rule.by_month_day()))
                .collect();
        }
        self.nominal_dates(months)
    }

    /// The cursor's nominal day materialized in each candidate month.
    /// Nonexistent combinations (day 31 in February) drop out here.
    fn nominal_dates(&self, months: &[(i32, u32)]) -> Vec<NaiveDate> {
        months
            .iter()
            .filter_map(|&(year, month)| NaiveDate::from_ymd_opt(year, month, self.cursor.day))
            .collect()
    }

    /// Applies the BYMONTH and BYMONTHDAY limits to week- or
    /// year-day-expanded dates.
    fn limit_day_filters(&self, mut dates: Vec<NaiveDate>) -> Vec<NaiveDate> {
        let by_month = self.rule.by_month();
        if !by_month.is_empty() {
            dates.retain(|date| by_month.iter().any(|&month| u32::from(month) == date.month()));
        }
        if !self.rule.by_month_day().is_empty() {
            dates.retain(|date| matches_month_day(*date, self.rule.by_month_day()));
        }
        dates
    }

    /// BYDAY stage. Expands within the week, month, or year depending on the
    /// frequency and the coarser by-parts present; limits by weekday when a
    /// day-level part has already fixed the dates.
    fn apply_by_day(&self, dates: Vec<NaiveDate>) -> Vec<NaiveDate> {
        let rule = self.rule;
        let entries = rule.by_day();
        if entries.is_empty() {
            return dates;
        }
        let day_fixed = !rule.by_year_day().is_empty() || !rule.by_month_day().is_empty();
        match rule.freq() {
            _ if day_fixed => limit_weekdays(dates, entries),
            Frequency::Weekly => self.expand_week_days(&dates, entries),
            Frequency::Monthly => self.expand_month_days(&dates, entries),
            Frequency::Yearly if !rule.by_week_no().is_empty() => {
                self.expand_week_days(&dates, entries)
            }
            Frequency::Yearly if !rule.by_month().is_empty() => {
                self.expand_month_days(&dates, entries)
            }
            Frequency::Yearly => self.expand_year_days(entries),
            _ => limit_weekdays(dates, entries),
        }
    }

    /// Replaces each candidate with the listed weekdays of its week.
    fn expand_week_days(&self, dates: &[NaiveDate], entries: &[WeekdayNum]) -> Vec<NaiveDate> {
        let week_start = self.rule.week_start();
        let mut out = Vec::new();
        for &date in dates {
            let Some(start) = week_start_of(date, week_start) else {
                continue;
            };
            for entry in entries {
                let offset = entry.weekday.days_from(week_start);
                if let Some(day) = start.checked_add_days(Days::new(u64::from(offset))) {
                    out.push(day);
                }
            }
        }
        out
    }

    /// Replaces each candidate month with the listed weekdays of that month,
    /// honoring ordinals (2TU = second Tuesday, -1FR = last Friday).
    fn expand_month_days(&self, dates: &[NaiveDate], entries: &[WeekdayNum]) -> Vec<NaiveDate> {
        let mut months: Vec<(i32, u32)> = dates.iter().map(|d| (d.year(), d.month())).collect();
        months.sort_unstable();
        months.dedup();
        let mut out = Vec::new();
        for (year, month) in months {
            for entry in entries {
                match entry.ordinal {
                    Some(ordinal) => {
                        if let Some(date) =
                            nth_weekday_in_month(year, month, entry.weekday, ordinal)
                        {
                            out.push(date);
                        }
                    }
                    None => out.extend(weekdays_in_month(year, month, entry.weekday)),
                }
            }
        }
        out
    }

    /// Expands the listed weekdays over the whole cursor year.
    fn expand_year_days(&self, entries: &[WeekdayNum]) -> Vec<NaiveDate> {
        let year = self.cursor.year;
        let mut out = Vec::new();
        for entry in entries {
            match entry.ordinal {
                Some(ordinal) => {
                    if let Some(date) = nth_weekday_in_year(year, entry.weekday, ordinal) {
                        out.push(date);
                    }
                }
                None => out.extend(weekdays_in_year(year, entry.weekday)),
            }
        }
        out
    }

    /// BYHOUR, BYMINUTE, and BYSECOND stages. Date-only anchors ignore the
    /// time-valued by-parts entirely.
    fn expand_times(&self, dates: &[NaiveDate]) -> Vec<NaiveDateTime> {
        if self.form.is_none() {
            return dates
                .iter()
                .filter_map(|date| date.and_hms_opt(0, 0, 0))
                .collect();
        }
        let hours = self.time_values(self.rule.by_hour(), Frequency::Hourly, self.cursor.hour);
        let minutes =
            self.time_values(self.rule.by_minute(), Frequency::Minutely, self.cursor.minute);
        let seconds =
            self.time_values(self.rule.by_second(), Frequency::Secondly, self.cursor.second);
        let mut out = Vec::new();
        for &date in dates {
            for &hour in &hours {
                for &minute in &minutes {
                    for &second in &seconds {
                        if let Some(candidate) = date.and_hms_opt(hour, minute, second) {
                            out.push(candidate);
                        }
                    }
                }
            }
        }
        out
    }

    /// Values for one time component: the listed values expand it when the
    /// frequency steps over a coarser unit, limit the cursor value otherwise.
    fn time_values(&self, listed: &[u8], component: Frequency, current: u32) -> Vec<u32> {
        if listed.is_empty() {
            return vec![current];
        }
        if self.rule.freq() > component {
            listed.iter().map(|&value| u32::from(value)).collect()
        } else if listed.iter().any(|&value| u32::from(value) == current) {
            vec![current]
        } else {
            Vec::new()
        }
    }

    /// BYSETPOS stage: selects 1-based positions (negative from the end) out
    /// of the sorted per-period candidate set.
    fn apply_set_pos(&self, candidates: Vec<NaiveDateTime>) -> Vec<NaiveDateTime> {
        let positions = self.rule.by_set_pos();
        if positions.is_empty() || candidates.is_empty() {
            return candidates;
        }
        let mut picked: Vec<NaiveDateTime> = positions
            .iter()
            .filter_map(|&position| {
                let index = if position > 0 {
                    usize::from(position.unsigned_abs()) - 1
                } else {
                    candidates
                        .len()
                        .checked_sub(usize::from(position.unsigned_abs()))?
                };
                candidates.get(index).copied()
            })
            .collect();
        picked.sort_unstable();
        picked.dedup();
        picked
    }

    /// Steps the cursor forward one interval. Day-based and finer
    /// frequencies use real date arithmetic; monthly and yearly steps stay
    /// nominal so invalid day/month combinations can drop out per period.
    fn advance_cursor(&mut self) {
        let interval = i64::from(self.rule.interval());
        match self.rule.freq() {
            Frequency::Yearly => {
                let step = i32::try_from(interval).unwrap_or(i32::MAX);
                self.cursor.year = self.cursor.year.saturating_add(step);
            }
            Frequency::Monthly => self.advance_months(interval),
            Frequency::Weekly => self.advance_delta(TimeDelta::days(interval * 7)),
            Frequency::Daily => self.advance_delta(TimeDelta::days(interval)),
            Frequency::Hourly => self.advance_delta(TimeDelta::hours(interval)),
            Frequency::Minutely => self.advance_delta(TimeDelta::minutes(interval)),
            Frequency::Secondly => self.advance_delta(TimeDelta::seconds(interval)),
        }
    }

    fn advance_months(&mut self, interval: i64) {
        let total = i64::from(self.cursor.year) * 12 + i64::from(self.cursor.month) - 1 + interval;
        if let Ok(year) = i32::try_from(total.div_euclid(12))
            && let Ok(month) = u32::try_from(total.rem_euclid(12))
        {
            self.cursor.year = year;
            self.cursor.month = month + 1;
        } else {
            self.exhausted = true;
        }
    }

    fn advance_delta(&mut self, delta: TimeDelta) {
        let next = self
            .materialized()
            .and_then(|current| current.checked_add_signed(delta));
        match next {
            Some(value) => self.cursor = Fields::from_naive(value),
            None => self.exhausted = true,
        }
    }

    /// Real datetime at the cursor. Frequencies finer than monthly keep the
    /// cursor on real dates, so this only fails at the edges of the
    /// supported calendar range.
    fn materialized(&self) -> Option<NaiveDateTime> {
        let Fields {
            year,
            month,
            day,
            hour,
            minute,
            second,
        } = self.cursor;
        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
    }
}

/// Keeps only dates whose weekday appears in the list, ignoring ordinals.
fn limit_weekdays(dates: Vec<NaiveDate>, entries: &[WeekdayNum]) -> Vec<NaiveDate> {
    dates
        .into_iter()
        .filter(|date| {
            let weekday = Weekday::from_chrono(date.weekday());
            entries.iter().any(|entry| entry.weekday == weekday)
        })
        .collect()
}

/// Start of the week containing `date`.
fn week_start_of(date: NaiveDate, week_start: Weekday) -> Option<NaiveDate> {
    let offset = Weekday::from_chrono(date.weekday()).days_from(week_start);
    date.checked_sub_days(Days::new(u64::from(offset)))
}

/// Start of week 1: the first `week_start`-based week containing at least
/// four days of the year (the ISO 8601 rule generalized to any week start).
fn first_week_start(year: i32, week_start: Weekday) -> Option<NaiveDate> {
    let jan_first = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let offset = Weekday::from_chrono(jan_first.weekday()).days_from(week_start);
    if offset <= 3 {
        jan_first.checked_sub_days(Days::new(u64::from(offset)))
    } else {
        jan_first.checked_add_days(Days::new(u64::from(7 - offset)))
    }
}

/// Number of numbered weeks in the year.
fn week_count(year: i32, week_start: Weekday) -> Option<i64> {
    let this_year = first_week_start(year, week_start)?;
    let next_year = first_week_start(year.checked_add(1)?, week_start)?;
    Some((next_year - this_year).num_days() / 7)
}

/// Start date of the given week number (negative weeks count from the end).
fn week_no_start(year: i32, week: i8, week_start: Weekday) -> Option<NaiveDate> {
    let count = week_count(year, week_start)?;
    let resolved = if week > 0 {
        i64::from(week)
    } else {
        count + i64::from(week) + 1
    };
    if resolved < 1 || resolved > count {
        return None;
    }
    let offset = u64::try_from((resolved - 1) * 7).ok()?;
    first_week_start(year, week_start)?.checked_add_days(Days::new(offset))
}

/// Date of the given ordinal day of the year (negative from the end), or
/// `None` when the year has no such day.
fn year_day(year: i32, day: i16) -> Option<NaiveDate> {
    let length = year_length(year)?;
    let resolved = if day > 0 {
        i64::from(day)
    } else {
        length + i64::from(day) + 1
    };
    if resolved < 1 || resolved > length {
        return None;
    }
    NaiveDate::from_yo_opt(year, u32::try_from(resolved).ok()?)
}

fn year_length(year: i32) -> Option<i64> {
    let this_year = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let next_year = NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?;
    Some((next_year - this_year).num_days())
}

fn matches_year_day(date: NaiveDate, days: &[i16]) -> bool {
    let Some(length) = year_length(date.year()) else {
        return false;
    };
    let ordinal = i64::from(date.ordinal());
    days.iter().any(|&day| {
        let resolved = if day > 0 {
            i64::from(day)
        } else {
            length + i64::from(day) + 1
        };
        resolved == ordinal
    })
}

/// Date for a day-of-month value (negative from the end), or `None` when the
/// month is too short.
fn resolve_month_day(year: i32, month: u32, day: i8) -> Option<NaiveDate> {
    if day > 0 {
        return NaiveDate::from_ymd_opt(year, month, u32::from(day.unsigned_abs()));
    }
    let last = days_in_month(year, month)?;
    let resolved = i64::from(last) + i64::from(day) + 1;
    if resolved < 1 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, u32::try_from(resolved).ok()?)
}

fn matches_month_day(date: NaiveDate, days: &[i8]) -> bool {
    let Some(last) = days_in_month(date.year(), date.month()) else {
        return false;
    };
    let day_of_month = i64::from(date.day());
    days.iter().any(|&day| {
        let resolved = if day > 0 {
            i64::from(day)
        } else {
            i64::from(last) + i64::from(day) + 1
        };
        resolved == day_of_month
    })
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    Some(first_of_next.pred_opt()?.day())
}

/// Date of the nth occurrence of `weekday` in the month (negative ordinals
/// count from the end), or `None` when the month has no such occurrence.
fn nth_weekday_in_month(
    year: i32,
    month: u32,
    weekday: Weekday,
    ordinal: i8,
) -> Option<NaiveDate> {
    if ordinal == 0 {
        return None;
    }
    if ordinal > 0 {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let offset = weekday.days_from(Weekday::from_chrono(first.weekday()));
        let day = 1 + u32::from(offset) + (u32::from(ordinal.unsigned_abs()) - 1) * 7;
        NaiveDate::from_ymd_opt(year, month, day)
    } else {
        let last_day = days_in_month(year, month)?;
        let last = NaiveDate::from_ymd_opt(year, month, last_day)?;
        let back = Weekday::from_chrono(last.weekday()).days_from(weekday);
        let resolved = i64::from(last_day) - i64::from(back) + (i64::from(ordinal) + 1) * 7;
        if resolved < 1 {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, u32::try_from(resolved).ok()?)
    }
}

/// Every occurrence of `weekday` in the month, in date order.
fn weekdays_in_month(year: i32, month: u32, weekday: Weekday) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut ordinal = 1;
    while let Some(date) = nth_weekday_in_month(year, month, weekday, ordinal) {
        dates.push(date);
        ordinal += 1;
    }
    dates
}

/// Date of the nth occurrence of `weekday` in the year (negative ordinals
/// count from the end).
fn nth_weekday_in_year(year: i32, weekday: Weekday, ordinal: i8) -> Option<NaiveDate> {
    if ordinal == 0 {
        return None;
    }
    let steps = (u64::from(ordinal.unsigned_abs()) - 1) * 7;
    if ordinal > 0 {
        let jan_first = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let offset = weekday.days_from(Weekday::from_chrono(jan_first.weekday()));
        let date = jan_first.checked_add_days(Days::new(u64::from(offset) + steps))?;
        (date.year() == year).then_some(date)
    } else {
        let dec_last = NaiveDate::from_ymd_opt(year, 12, 31)?;
        let back = Weekday::from_chrono(dec_last.weekday()).days_from(weekday);
        let date = dec_last.checked_sub_days(Days::new(u64::from(back) + steps))?;
        (date.year() == year).then_some(date)
    }
}

/// Every occurrence of `weekday` in the year, in date order.
fn weekdays_in_year(year: i32, weekday: Weekday) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut ordinal = 1;
    while let Some(date) = nth_weekday_in_year(year, weekday, ordinal) {
        dates.push(date);
        ordinal += 1;
    }
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ical::core::RecurrenceRuleBuilder;
    use crate::ical::parse::parse_rrule;

    fn expand(rule: &RecurrenceRule, anchor: &Temporal, window: &TimeRange) -> Vec<String> {
        let registry = TimeZoneRegistry::new();
        rule.occurrences(anchor, window, &registry)
            .expect("expansion starts")
            .map(|value| value.to_string())
            .collect()
    }

    fn floating(year: u16, month: u8, day: u8, hour: u8, minute: u8) -> Temporal {
        Temporal::DateTime(DateTime::floating(year, month, day, hour, minute, 0))
    }

    fn utc(year: u16, month: u8, day: u8, hour: u8, minute: u8) -> Temporal {
        Temporal::DateTime(DateTime::utc(year, month, day, hour, minute, 0))
    }

    fn rule(text: &str) -> RecurrenceRule {
        parse_rrule(text).expect("valid rule")
    }

    #[test]
    fn daily_count_stops_after_count() {
        let occurrences = expand(
            &rule("FREQ=DAILY;COUNT=10"),
            &floating(1997, 9, 2, 9, 0),
            &TimeRange::unbounded(),
        );
        assert_eq!(occurrences.len(), 10);
        assert_eq!(occurrences[0], "19970902T090000");
        assert_eq!(occurrences[9], "19970911T090000");
    }

    #[test]
    fn daily_until_is_inclusive() {
        let occurrences = expand(
            &rule("FREQ=DAILY;UNTIL=20260103T090000"),
            &floating(2026, 1, 1, 9, 0),
            &TimeRange::unbounded(),
        );
        assert_eq!(
            occurrences,
            ["20260101T090000", "20260102T090000", "20260103T090000"]
        );
    }

    #[test]
    fn count_is_consumed_by_occurrences_below_the_window() {
        let occurrences = expand(
            &rule("FREQ=DAILY;COUNT=10"),
            &utc(2026, 3, 1, 9, 0),
            &TimeRange::starting_at(utc(2026, 3, 6, 0, 0)),
        );
        assert_eq!(occurrences.len(), 5);
        assert_eq!(occurrences[0], "20260306T090000Z");
        assert_eq!(occurrences[4], "20260310T090000Z");
    }

    #[test]
    fn weekly_by_day_respects_week_start() {
        // RFC 5545 example: the same rule anchored 1997-08-05 gives
        // different sets under WKST=MO and WKST=SU.
        let anchor = floating(1997, 8, 5, 9, 0);
        let monday = expand(
            &rule("FREQ=WEEKLY;INTERVAL=2;COUNT=4;BYDAY=TU,SU;WKST=MO"),
            &anchor,
            &TimeRange::unbounded(),
        );
        assert_eq!(
            monday,
            [
                "19970805T090000",
                "19970810T090000",
                "19970819T090000",
                "19970824T090000"
            ]
        );

        let sunday = expand(
            &rule("FREQ=WEEKLY;INTERVAL=2;COUNT=4;BYDAY=TU,SU;WKST=SU"),
            &anchor,
            &TimeRange::unbounded(),
        );
        assert_eq!(
            sunday,
            [
                "19970805T090000",
                "19970817T090000",
                "19970819T090000",
                "19970831T090000"
            ]
        );
    }

    #[test]
    fn monthly_on_the_31st_skips_short_months() {
        let occurrences = expand(
            &rule("FREQ=MONTHLY;COUNT=4"),
            &floating(2026, 1, 31, 12, 0),
            &TimeRange::unbounded(),
        );
        assert_eq!(
            occurrences,
            [
                "20260131T120000",
                "20260331T120000",
                "20260531T120000",
                "20260731T120000"
            ]
        );
    }

    #[test]
    fn monthly_last_friday() {
        let occurrences = expand(
            &rule("FREQ=MONTHLY;COUNT=3;BYDAY=-1FR"),
            &floating(2026, 1, 30, 9, 0),
            &TimeRange::unbounded(),
        );
        assert_eq!(
            occurrences,
            ["20260130T090000", "20260227T090000", "20260327T090000"]
        );
    }

    #[test]
    fn set_pos_selects_last_weekday_of_month() {
        let occurrences = expand(
            &rule("FREQ=MONTHLY;COUNT=3;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1"),
            &floating(2026, 1, 30, 9, 0),
            &TimeRange::unbounded(),
        );
        assert_eq!(
            occurrences,
            ["20260130T090000", "20260227T090000", "20260331T090000"]
        );
    }

    #[test]
    fn yearly_by_week_no_follows_the_week_numbering_rule() {
        // RFC 5545 example: week 20 lands on May 12 1997, May 11 1998, and
        // May 17 1999.
        let occurrences = expand(
            &rule("FREQ=YEARLY;COUNT=3;BYWEEKNO=20;BYDAY=MO"),
            &floating(1997, 5, 12, 9, 0),
            &TimeRange::unbounded(),
        );
        assert_eq!(
            occurrences,
            ["19970512T090000", "19980511T090000", "19990517T090000"]
        );
    }

    #[test]
    fn multiple_by_parts_multiply_out() {
        // Every January Sunday at both 08:30 and 09:30.
        let occurrences = expand(
            &rule("FREQ=YEARLY;BYMONTH=1;BYDAY=SU;BYHOUR=8,9;BYMINUTE=30"),
            &floating(2026, 1, 4, 8, 30),
            &TimeRange::between(floating(2026, 1, 1, 0, 0), floating(2026, 2, 1, 0, 0)),
        );
        assert_eq!(occurrences.len(), 8);
        assert_eq!(occurrences[0], "20260104T083000");
        assert_eq!(occurrences[1], "20260104T093000");
        assert_eq!(occurrences[7], "20260125T093000");
    }

    #[test]
    fn hourly_interval_wraps_days() {
        let occurrences = expand(
            &rule("FREQ=HOURLY;INTERVAL=6;COUNT=5"),
            &floating(2026, 1, 1, 0, 0),
            &TimeRange::unbounded(),
        );
        assert_eq!(
            occurrences,
            [
                "20260101T000000",
                "20260101T060000",
                "20260101T120000",
                "20260101T180000",
                "20260102T000000"
            ]
        );
    }

    #[test]
    fn by_hour_limits_an_hourly_rule() {
        let occurrences = expand(
            &rule("FREQ=HOURLY;BYHOUR=9,10;COUNT=4"),
            &floating(2026, 1, 1, 9, 0),
            &TimeRange::unbounded(),
        );
        assert_eq!(
            occurrences,
            [
                "20260101T090000",
                "20260101T100000",
                "20260102T090000",
                "20260102T100000"
            ]
        );
    }

    #[test]
    fn date_anchor_yields_date_occurrences() {
        let anchor = Temporal::Date(Date::new(2026, 12, 25));
        let occurrences = expand(
            &rule("FREQ=YEARLY;COUNT=3"),
            &anchor,
            &TimeRange::unbounded(),
        );
        assert_eq!(occurrences, ["20261225", "20271225", "20281225"]);
    }

    #[test]
    fn leap_day_rule_skips_common_years() {
        let occurrences = expand(
            &rule("FREQ=YEARLY;COUNT=2"),
            &floating(2024, 2, 29, 12, 0),
            &TimeRange::unbounded(),
        );
        assert_eq!(occurrences, ["20240229T120000", "20280229T120000"]);
    }

    #[test]
    fn never_matching_rule_terminates() {
        // February 30th never exists; the empty-period guard must stop the
        // iteration rather than spin forever.
        let impossible = RecurrenceRuleBuilder::new(Frequency::Yearly)
            .by_month([2])
            .by_month_day([30])
            .build()
            .expect("structurally valid rule");
        let registry = TimeZoneRegistry::new();
        let anchor = floating(2026, 2, 1, 0, 0);
        let mut occurrences = impossible
            .occurrences(&anchor, &TimeRange::unbounded(), &registry)
            .expect("expansion starts");
        assert_eq!(occurrences.next(), None);
    }

    #[test]
    fn zoned_rule_window_comparison_is_exact() {
        // 09:00 America/New_York is 14:00Z before the spring-forward on
        // March 8 2026 and 13:00Z afterward. A window ending 13:30Z on
        // March 9 must therefore include the March 9 occurrence but not
        // March 10.
        let anchor = Temporal::DateTime(DateTime::zoned(2026, 3, 7, 9, 0, 0, "America/New_York"));
        let occurrences = expand(
            &rule("FREQ=DAILY"),
            &anchor,
            &TimeRange::ending_at(utc(2026, 3, 9, 13, 30)),
        );
        assert_eq!(
            occurrences,
            ["20260307T090000", "20260308T090000", "20260309T090000"]
        );
    }

    #[test]
    fn window_bounds_are_half_open() {
        let occurrences = expand(
            &rule("FREQ=DAILY"),
            &utc(2026, 1, 1, 9, 0),
            &TimeRange::between(utc(2026, 1, 2, 9, 0), utc(2026, 1, 4, 9, 0)),
        );
        assert_eq!(occurrences, ["20260102T090000Z", "20260103T090000Z"]);
    }

    #[test]
    fn first_week_start_honors_the_four_day_rule() {
        // 1997 begins on a Wednesday, so week 1 starts Dec 30 1996; 1999
        // begins on a Friday, so week 1 starts Jan 4 1999.
        assert_eq!(
            first_week_start(1997, Weekday::Monday),
            NaiveDate::from_ymd_opt(1996, 12, 30)
        );
        assert_eq!(
            first_week_start(1999, Weekday::Monday),
            NaiveDate::from_ymd_opt(1999, 1, 4)
        );
    }

    #[test]
    fn nth_weekday_in_month_from_both_ends() {
        // March 2026: Sundays fall on 1, 8, 15, 22, 29.
        assert_eq!(
            nth_weekday_in_month(2026, 3, Weekday::Sunday, 2),
            NaiveDate::from_ymd_opt(2026, 3, 8)
        );
        assert_eq!(
            nth_weekday_in_month(2026, 3, Weekday::Sunday, -1),
            NaiveDate::from_ymd_opt(2026, 3, 29)
        );
        assert_eq!(nth_weekday_in_month(2026, 3, Weekday::Sunday, 6), None);
    }

    #[test]
    fn negative_month_day_resolves_from_the_end() {
        assert_eq!(
            resolve_month_day(2026, 2, -1),
            NaiveDate::from_ymd_opt(2026, 2, 28)
        );
        assert_eq!(
            resolve_month_day(2024, 2, -1),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(resolve_month_day(2026, 2, 30), None);
    }

    #[test]
    fn year_day_resolves_negatives_and_rejects_out_of_range() {
        assert_eq!(year_day(2026, -1), NaiveDate::from_ymd_opt(2026, 12, 31));
        assert_eq!(year_day(2026, 60), NaiveDate::from_ymd_opt(2026, 3, 1));
        assert_eq!(year_day(2024, 60), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(year_day(2026, 366), None);
    }
}
