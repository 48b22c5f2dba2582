//! iCalendar RRULE (Recurrence Rule) value type (RFC 5545 §3.3.10, §3.8.5.3).

use std::fmt;

use super::Temporal;

/// Recurrence frequency (RFC 5545 §3.3.10).
///
/// Ordered by period length, so `Frequency::Yearly > Frequency::Daily`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Secondly => "SECONDLY",
            Self::Minutely => "MINUTELY",
            Self::Hourly => "HOURLY",
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }

    /// Parses a frequency from a string (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "SECONDLY" => Self::Secondly,
            "MINUTELY" => Self::Minutely,
            "HOURLY" => Self::Hourly,
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            "MONTHLY" => Self::Monthly,
            "YEARLY" => Self::Yearly,
            _ => return None,
        })
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    /// Returns the two-letter abbreviation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sunday => "SU",
            Self::Monday => "MO",
            Self::Tuesday => "TU",
            Self::Wednesday => "WE",
            Self::Thursday => "TH",
            Self::Friday => "FR",
            Self::Saturday => "SA",
        }
    }

    /// Parses a weekday from a two-letter abbreviation (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "SU" => Self::Sunday,
            "MO" => Self::Monday,
            "TU" => Self::Tuesday,
            "WE" => Self::Wednesday,
            "TH" => Self::Thursday,
            "FR" => Self::Friday,
            "SA" => Self::Saturday,
            _ => return None,
        })
    }

    /// Converts to the chrono weekday.
    #[must_use]
    pub const fn to_chrono(self) -> chrono::Weekday {
        match self {
            Self::Sunday => chrono::Weekday::Sun,
            Self::Monday => chrono::Weekday::Mon,
            Self::Tuesday => chrono::Weekday::Tue,
            Self::Wednesday => chrono::Weekday::Wed,
            Self::Thursday => chrono::Weekday::Thu,
            Self::Friday => chrono::Weekday::Fri,
            Self::Saturday => chrono::Weekday::Sat,
        }
    }

    /// Converts from the chrono weekday.
    #[must_use]
    pub const fn from_chrono(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Sun => Self::Sunday,
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
        }
    }

    /// Returns how many days this weekday falls after `week_start` (0-6).
    #[must_use]
    pub const fn days_from(self, week_start: Self) -> u8 {
        (self.index() + 7 - week_start.index()) % 7
    }

    const fn index(self) -> u8 {
        match self {
            Self::Sunday => 0,
            Self::Monday => 1,
            Self::Tuesday => 2,
            Self::Wednesday => 3,
            Self::Thursday => 4,
            Self::Friday => 5,
            Self::Saturday => 6,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Weekday with optional occurrence number.
///
/// Used in BYDAY rule part. Examples:
/// - `MO` - every Monday
/// - `1MO` - first Monday of the month/year
/// - `-1FR` - last Friday of the month/year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekdayNum {
    /// Optional occurrence number (-53 to 53, excluding 0).
    pub ordinal: Option<i8>,
    /// The day of the week.
    pub weekday: Weekday,
}

impl WeekdayNum {
    /// Creates a weekday occurrence without an ordinal.
    #[must_use]
    pub const fn every(weekday: Weekday) -> Self {
        Self {
            ordinal: None,
            weekday,
        }
    }

    /// Creates a weekday occurrence with an ordinal.
    ///
    /// ## Panics
    ///
    /// Panics if ordinal is 0 or outside the range -53..=53.
    #[must_use]
    pub fn nth(ordinal: i8, weekday: Weekday) -> Self {
        assert!(ordinal != 0 && (-53..=53).contains(&ordinal));
        Self {
            ordinal: Some(ordinal),
            weekday,
        }
    }
}

impl fmt::Display for WeekdayNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.ordinal {
            write!(f, "{n}")?;
        }
        write!(f, "{}", self.weekday)
    }
}

/// Error raised when a recurrence rule definition violates RFC 5545 §3.3.10.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    /// COUNT and UNTIL were both given.
    #[error("COUNT and UNTIL are mutually exclusive")]
    CountAndUntil,

    /// INTERVAL was zero.
    #[error("INTERVAL must be at least 1")]
    ZeroInterval,

    /// COUNT was zero.
    #[error("COUNT must be at least 1")]
    ZeroCount,

    /// BYSETPOS appeared without any other BY part to select from.
    #[error("BYSETPOS requires at least one other BY part")]
    SetPosWithoutByPart,

    /// Ordinal BYDAY (e.g., `2MO`) with a frequency that has no enclosing
    /// month or year to count within.
    #[error("ordinal BYDAY requires MONTHLY or YEARLY frequency, got {0}")]
    OrdinalByDay(Frequency),

    /// Ordinal BYDAY combined with BYWEEKNO.
    #[error("ordinal BYDAY cannot be combined with BYWEEKNO")]
    OrdinalByDayWithWeekNo,

    /// BYWEEKNO with a non-yearly frequency.
    #[error("BYWEEKNO requires YEARLY frequency, got {0}")]
    WeekNoRequiresYearly(Frequency),

    /// BYYEARDAY with a daily, weekly, or monthly frequency.
    #[error("BYYEARDAY cannot be used with {0} frequency")]
    YearDayFrequency(Frequency),

    /// BYMONTHDAY with a weekly frequency.
    #[error("BYMONTHDAY cannot be used with WEEKLY frequency")]
    MonthDayWithWeekly,

    /// A BY part value fell outside its RFC 5545 range.
    #[error("{part} value {value} is out of range")]
    OutOfRange {
        /// The rule part name (e.g., `BYMONTH`).
        part: &'static str,
        /// The offending value.
        value: i64,
    },
}

/// Recurrence rule (RFC 5545 §3.3.10, §3.8.5.3).
///
/// A validated recurrence pattern. Construction goes through
/// [`RecurrenceRuleBuilder`], which rejects definitions that violate the RFC
/// grammar (COUNT with UNTIL, zero interval, out-of-range BY values, ordinal
/// BYDAY outside MONTHLY/YEARLY). A value of this type can therefore always
/// be expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    freq: Frequency,
    interval: u32,
    count: Option<u32>,
    until: Option<Temporal>,
    wkst: Weekday,
    // BY parts in coarsest-to-finest evaluation order.
    by_month: Vec<u8>,
    by_week_no: Vec<i8>,
    by_year_day: Vec<i16>,
    by_month_day: Vec<i8>,
    by_day: Vec<WeekdayNum>,
    by_hour: Vec<u8>,
    by_minute: Vec<u8>,
    by_second: Vec<u8>,
    by_set_pos: Vec<i16>,
    // Unknown rule parts, preserved for round-trip but ignored by expansion.
    unknown: Vec<(String, String)>,
}

impl RecurrenceRule {
    /// Creates a builder for the given frequency.
    #[must_use]
    pub fn builder(freq: Frequency) -> RecurrenceRuleBuilder {
        RecurrenceRuleBuilder::new(freq)
    }

    /// Creates a daily recurrence rule builder.
    #[must_use]
    pub fn daily() -> RecurrenceRuleBuilder {
        RecurrenceRuleBuilder::new(Frequency::Daily)
    }

    /// Creates a weekly recurrence rule builder.
    #[must_use]
    pub fn weekly() -> RecurrenceRuleBuilder {
        RecurrenceRuleBuilder::new(Frequency::Weekly)
    }

    /// Creates a monthly recurrence rule builder.
    #[must_use]
    pub fn monthly() -> RecurrenceRuleBuilder {
        RecurrenceRuleBuilder::new(Frequency::Monthly)
    }

    /// Creates a yearly recurrence rule builder.
    #[must_use]
    pub fn yearly() -> RecurrenceRuleBuilder {
        RecurrenceRuleBuilder::new(Frequency::Yearly)
    }

    /// Returns the recurrence frequency.
    #[must_use]
    pub const fn freq(&self) -> Frequency {
        self.freq
    }

    /// Returns the recurrence interval (at least 1).
    #[must_use]
    pub const fn interval(&self) -> u32 {
        self.interval
    }

    /// Returns the occurrence count bound, if any.
    #[must_use]
    pub const fn count(&self) -> Option<u32> {
        self.count
    }

    /// Returns the inclusive UNTIL bound, if any.
    #[must_use]
    pub fn until(&self) -> Option<&Temporal> {
        self.until.as_ref()
    }

    /// Returns the week start day (default Monday).
    #[must_use]
    pub const fn week_start(&self) -> Weekday {
        self.wkst
    }

    /// Returns whether the rule terminates on its own (COUNT or UNTIL).
    #[must_use]
    pub const fn is_bounded(&self) -> bool {
        self.count.is_some() || self.until.is_some()
    }

    /// Returns the BYMONTH list (1-12).
    #[must_use]
    pub fn by_month(&self) -> &[u8] {
        &self.by_month
    }

    /// Returns the BYWEEKNO list (±1-53).
    #[must_use]
    pub fn by_week_no(&self) -> &[i8] {
        &self.by_week_no
    }

    /// Returns the BYYEARDAY list (±1-366).
    #[must_use]
    pub fn by_year_day(&self) -> &[i16] {
        &self.by_year_day
    }

    /// Returns the BYMONTHDAY list (±1-31).
    #[must_use]
    pub fn by_month_day(&self) -> &[i8] {
        &self.by_month_day
    }

    /// Returns the BYDAY list.
    #[must_use]
    pub fn by_day(&self) -> &[WeekdayNum] {
        &self.by_day
    }

    /// Returns the BYHOUR list (0-23).
    #[must_use]
    pub fn by_hour(&self) -> &[u8] {
        &self.by_hour
    }

    /// Returns the BYMINUTE list (0-59).
    #[must_use]
    pub fn by_minute(&self) -> &[u8] {
        &self.by_minute
    }

    /// Returns the BYSECOND list (0-60).
    #[must_use]
    pub fn by_second(&self) -> &[u8] {
        &self.by_second
    }

    /// Returns the BYSETPOS list (±1-366).
    #[must_use]
    pub fn by_set_pos(&self) -> &[i16] {
        &self.by_set_pos
    }

    /// Returns rule parts this library does not recognize, in input order.
    ///
    /// Unknown parts survive serialization unchanged but play no role in
    /// expansion.
    #[must_use]
    pub fn unknown_parts(&self) -> &[(String, String)] {
        &self.unknown
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        parts.push(format!("FREQ={}", self.freq));

        if self.interval != 1 {
            parts.push(format!("INTERVAL={}", self.interval));
        }

        if let Some(ref until) = self.until {
            parts.push(format!("UNTIL={until}"));
        }

        if let Some(count) = self.count {
            parts.push(format!("COUNT={count}"));
        }

        if self.wkst != Weekday::Monday {
            parts.push(format!("WKST={}", self.wkst));
        }

        if !self.by_second.is_empty() {
            let s: Vec<_> = self.by_second.iter().map(ToString::to_string).collect();
            parts.push(format!("BYSECOND={}", s.join(",")));
        }

        if !self.by_minute.is_empty() {
            let s: Vec<_> = self.by_minute.iter().map(ToString::to_string).collect();
            parts.push(format!("BYMINUTE={}", s.join(",")));
        }

        if !self.by_hour.is_empty() {
            let s: Vec<_> = self.by_hour.iter().map(ToString::to_string).collect();
            parts.push(format!("BYHOUR={}", s.join(",")));
        }

        if !self.by_day.is_empty() {
            let s: Vec<_> = self.by_day.iter().map(ToString::to_string).collect();
            parts.push(format!("BYDAY={}", s.join(",")));
        }

        if !self.by_month_day.is_empty() {
            let s: Vec<_> = self.by_month_day.iter().map(ToString::to_string).collect();
            parts.push(format!("BYMONTHDAY={}", s.join(",")));
        }

        if !self.by_year_day.is_empty() {
            let s: Vec<_> = self.by_year_day.iter().map(ToString::to_string).collect();
            parts.push(format!("BYYEARDAY={}", s.join(",")));
        }

        if !self.by_week_no.is_empty() {
            let s: Vec<_> = self.by_week_no.iter().map(ToString::to_string).collect();
            parts.push(format!("BYWEEKNO={}", s.join(",")));
        }

        if !self.by_month.is_empty() {
            let s: Vec<_> = self.by_month.iter().map(ToString::to_string).collect();
            parts.push(format!("BYMONTH={}", s.join(",")));
        }

        if !self.by_set_pos.is_empty() {
            let s: Vec<_> = self.by_set_pos.iter().map(ToString::to_string).collect();
            parts.push(format!("BYSETPOS={}", s.join(",")));
        }

        for (key, value) in &self.unknown {
            parts.push(format!("{key}={value}"));
        }

        write!(f, "{}", parts.join(";"))
    }
}

/// Builder for [`RecurrenceRule`] values.
///
/// Collects rule parts freely and validates the whole definition in
/// [`Self::build`].
#[derive(Debug, Clone)]
pub struct RecurrenceRuleBuilder {
    freq: Frequency,
    interval: u32,
    count: Option<u32>,
    until: Option<Temporal>,
    wkst: Weekday,
    by_month: Vec<u8>,
    by_week_no: Vec<i8>,
    by_year_day: Vec<i16>,
    by_month_day: Vec<i8>,
    by_day: Vec<WeekdayNum>,
    by_hour: Vec<u8>,
    by_minute: Vec<u8>,
    by_second: Vec<u8>,
    by_set_pos: Vec<i16>,
    unknown: Vec<(String, String)>,
}

impl RecurrenceRuleBuilder {
    /// Creates a new builder for the given frequency.
    #[must_use]
    pub const fn new(freq: Frequency) -> Self {
        Self {
            freq,
            interval: 1,
            count: None,
            until: None,
            wkst: Weekday::Monday,
            by_month: Vec::new(),
            by_week_no: Vec::new(),
            by_year_day: Vec::new(),
            by_month_day: Vec::new(),
            by_day: Vec::new(),
            by_hour: Vec::new(),
            by_minute: Vec::new(),
            by_second: Vec::new(),
            by_set_pos: Vec::new(),
            unknown: Vec::new(),
        }
    }

    /// Sets the interval.
    #[must_use]
    pub fn interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the count.
    #[must_use]
    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Sets the inclusive UNTIL bound.
    #[must_use]
    pub fn until(mut self, until: impl Into<Temporal>) -> Self {
        self.until = Some(until.into());
        self
    }

    /// Sets the week start day.
    #[must_use]
    pub fn week_start(mut self, wkst: Weekday) -> Self {
        self.wkst = wkst;
        self
    }

    /// Sets the BYMONTH list.
    #[must_use]
    pub fn by_month(mut self, months: impl IntoIterator<Item = u8>) -> Self {
        self.by_month = months.into_iter().collect();
        self
    }

    /// Sets the BYWEEKNO list.
    #[must_use]
    pub fn by_week_no(mut self, weeks: impl IntoIterator<Item = i8>) -> Self {
        self.by_week_no = weeks.into_iter().collect();
        self
    }

    /// Sets the BYYEARDAY list.
    #[must_use]
    pub fn by_year_day(mut self, days: impl IntoIterator<Item = i16>) -> Self {
        self.by_year_day = days.into_iter().collect();
        self
    }

    /// Sets the BYMONTHDAY list.
    #[must_use]
    pub fn by_month_day(mut self, days: impl IntoIterator<Item = i8>) -> Self {
        self.by_month_day = days.into_iter().collect();
        self
    }

    /// Sets the BYDAY list.
    #[must_use]
    pub fn by_day(mut self, days: impl IntoIterator<Item = WeekdayNum>) -> Self {
        self.by_day = days.into_iter().collect();
        self
    }

    /// Sets the BYHOUR list.
    #[must_use]
    pub fn by_hour(mut self, hours: impl IntoIterator<Item = u8>) -> Self {
        self.by_hour = hours.into_iter().collect();
        self
    }

    /// Sets the BYMINUTE list.
    #[must_use]
    pub fn by_minute(mut self, minutes: impl IntoIterator<Item = u8>) -> Self {
        self.by_minute = minutes.into_iter().collect();
        self
    }

    /// Sets the BYSECOND list.
    #[must_use]
    pub fn by_second(mut self, seconds: impl IntoIterator<Item = u8>) -> Self {
        self.by_second = seconds.into_iter().collect();
        self
    }

    /// Sets the BYSETPOS list.
    #[must_use]
    pub fn by_set_pos(mut self, positions: impl IntoIterator<Item = i16>) -> Self {
        self.by_set_pos = positions.into_iter().collect();
        self
    }

    /// Records an unrecognized rule part for round-trip preservation.
    #[must_use]
    pub fn unknown_part(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.unknown.push((key.into(), value.into()));
        self
    }

    /// Validates the collected rule parts and builds the rule.
    ///
    /// ## Errors
    ///
    /// Returns a [`RuleError`] if the definition violates RFC 5545 §3.3.10:
    /// zero interval or count, COUNT with UNTIL, out-of-range BY values, or
    /// a BY part invalid for the chosen frequency.
    pub fn build(self) -> Result<RecurrenceRule, RuleError> {
        if self.interval == 0 {
            return Err(RuleError::ZeroInterval);
        }
        if self.count == Some(0) {
            return Err(RuleError::ZeroCount);
        }
        if self.count.is_some() && self.until.is_some() {
            return Err(RuleError::CountAndUntil);
        }

        self.check_time_lists()?;
        self.check_day_lists()?;
        self.check_frequency_constraints()?;

        Ok(RecurrenceRule {
            freq: self.freq,
            interval: self.interval,
            count: self.count,
            until: self.until,
            wkst: self.wkst,
            by_month: self.by_month,
            by_week_no: self.by_week_no,
            by_year_day: self.by_year_day,
            by_month_day: self.by_month_day,
            by_day: self.by_day,
            by_hour: self.by_hour,
            by_minute: self.by_minute,
            by_second: self.by_second,
            by_set_pos: self.by_set_pos,
            unknown: self.unknown,
        })
    }

    fn check_time_lists(&self) -> Result<(), RuleError> {
        for &second in &self.by_second {
            if second > 60 {
                return Err(RuleError::OutOfRange {
                    part: "BYSECOND",
                    value: i64::from(second),
                });
            }
        }
        for &minute in &self.by_minute {
            if minute > 59 {
                return Err(RuleError::OutOfRange {
                    part: "BYMINUTE",
                    value: i64::from(minute),
                });
            }
        }
        for &hour in &self.by_hour {
            if hour > 23 {
                return Err(RuleError::OutOfRange {
                    part: "BYHOUR",
                    value: i64::from(hour),
                });
            }
        }
        Ok(())
    }

    fn check_day_lists(&self) -> Result<(), RuleError> {
        for &month in &self.by_month {
            if !(1..=12).contains(&month) {
                return Err(RuleError::OutOfRange {
                    part: "BYMONTH",
                    value: i64::from(month),
                });
            }
        }
        for &week in &self.by_week_no {
            if week == 0 || !(-53..=53).contains(&week) {
                return Err(RuleError::OutOfRange {
                    part: "BYWEEKNO",
                    value: i64::from(week),
                });
            }
        }
        for &day in &self.by_year_day {
            if day == 0 || !(-366..=366).contains(&day) {
                return Err(RuleError::OutOfRange {
                    part: "BYYEARDAY",
                    value: i64::from(day),
                });
            }
        }
        for &day in &self.by_month_day {
            if day == 0 || !(-31..=31).contains(&day) {
                return Err(RuleError::OutOfRange {
                    part: "BYMONTHDAY",
                    value: i64::from(day),
                });
            }
        }
        for &pos in &self.by_set_pos {
            if pos == 0 || !(-366..=366).contains(&pos) {
                return Err(RuleError::OutOfRange {
                    part: "BYSETPOS",
                    value: i64::from(pos),
                });
            }
        }
        Ok(())
    }

    fn check_frequency_constraints(&self) -> Result<(), RuleError> {
        if !self.by_set_pos.is_empty() && !self.has_other_by_part() {
            return Err(RuleError::SetPosWithoutByPart);
        }

        let has_ordinal_by_day = self.by_day.iter().any(|day| day.ordinal.is_some());
        if has_ordinal_by_day {
            if !matches!(self.freq, Frequency::Monthly | Frequency::Yearly) {
                return Err(RuleError::OrdinalByDay(self.freq));
            }
            if !self.by_week_no.is_empty() {
                return Err(RuleError::OrdinalByDayWithWeekNo);
            }
        }

        if !self.by_week_no.is_empty() && self.freq != Frequency::Yearly {
            return Err(RuleError::WeekNoRequiresYearly(self.freq));
        }
        if !self.by_year_day.is_empty()
            && matches!(
                self.freq,
                Frequency::Daily | Frequency::Weekly | Frequency::Monthly
            )
        {
            return Err(RuleError::YearDayFrequency(self.freq));
        }
        if !self.by_month_day.is_empty() && self.freq == Frequency::Weekly {
            return Err(RuleError::MonthDayWithWeekly);
        }
        Ok(())
    }

    fn has_other_by_part(&self) -> bool {
        !self.by_month.is_empty()
            || !self.by_week_no.is_empty()
            || !self.by_year_day.is_empty()
            || !self.by_month_day.is_empty()
            || !self.by_day.is_empty()
            || !self.by_hour.is_empty()
            || !self.by_minute.is_empty()
            || !self.by_second.is_empty()
    }
}
