//! Value type parsers for iCalendar temporal values (RFC 5545 §3.3).
#![expect(
    clippy::map_err_ignore,
    reason = "Value parsers intentionally discard error sources pending richer error types"
)]

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::ical::core::{
    Date, DateTime, DateTimeForm, Duration, DurationBuilder, Frequency, Period, RecurrenceRule,
    RecurrenceRuleBuilder, RuleError, Temporal, UtcOffset, Weekday, WeekdayNum,
};

/// Parses a DATE value (RFC 5545 §3.3.4).
///
/// Format: YYYYMMDD (e.g., "19970714"). Dates that do not exist in the
/// calendar (e.g., February 30) are rejected.
///
/// ## Errors
/// Returns an error if the string is not a valid 8-digit date.
pub fn parse_date(s: &str) -> ParseResult<Date> {
    if s.len() != 8 {
        return Err(ParseError::new(ParseErrorKind::InvalidDate));
    }

    let year = s[0..4]
        .parse::<u16>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidDate))?;
    let month = s[4..6]
        .parse::<u8>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidDate))?;
    let day = s[6..8]
        .parse::<u8>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidDate))?;

    let date = Date::new(year, month, day);
    if date.to_naive().is_none() {
        return Err(ParseError::new(ParseErrorKind::InvalidDate).with_context(s.to_string()));
    }

    Ok(date)
}

/// Parses a DATE-TIME value (RFC 5545 §3.3.5).
///
/// Format: YYYYMMDD"T"HHMMSS[Z] (e.g., "19970714T133000Z"). A trailing `Z`
/// yields the UTC form; otherwise a supplied TZID yields the zoned form and
/// its absence the floating form. TZID is carried at the property level in
/// iCalendar, so it arrives here as a separate argument.
///
/// ## Errors
/// Returns an error if the string is not a valid date-time format.
pub fn parse_datetime(s: &str, tzid: Option<&str>) -> ParseResult<DateTime> {
    let t_pos = s
        .find('T')
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidDateTime))?;

    let date = parse_date(&s[..t_pos]).map_err(|_| {
        ParseError::new(ParseErrorKind::InvalidDateTime).with_context(s.to_string())
    })?;

    let time_str = &s[t_pos + 1..];
    let (time_str, is_utc) = if let Some(stripped) = time_str.strip_suffix('Z') {
        (stripped, true)
    } else {
        (time_str, false)
    };

    if time_str.len() != 6 {
        return Err(ParseError::new(ParseErrorKind::InvalidDateTime));
    }

    let hour = time_str[0..2]
        .parse::<u8>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidDateTime))?;
    let minute = time_str[2..4]
        .parse::<u8>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidDateTime))?;
    let second = time_str[4..6]
        .parse::<u8>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidDateTime))?;

    // Allow 60 for leap seconds
    if hour > 23 || minute > 59 || second > 60 {
        return Err(ParseError::new(ParseErrorKind::InvalidDateTime));
    }

    let form = if is_utc {
        DateTimeForm::Utc
    } else if let Some(tz) = tzid {
        DateTimeForm::Zoned {
            tzid: tz.to_string(),
        }
    } else {
        DateTimeForm::Floating
    };

    Ok(DateTime {
        year: date.year,
        month: date.month,
        day: date.day,
        hour,
        minute,
        second,
        form,
    })
}

/// Parses a temporal value that may be either DATE or DATE-TIME.
///
/// ## Errors
/// Returns an error if the string fits neither format.
pub fn parse_temporal(s: &str, tzid: Option<&str>) -> ParseResult<Temporal> {
    if s.contains('T') {
        Ok(Temporal::DateTime(parse_datetime(s, tzid)?))
    } else {
        Ok(Temporal::Date(parse_date(s)?))
    }
}

/// Parses a DURATION value (RFC 5545 §3.3.6).
///
/// Format: [+|-]P[nW] or [+|-]P[nD][T[nH][nM][nS]]. The week form stands
/// alone and cannot mix with day or time components.
///
/// ## Errors
/// Returns an error if the string is not a valid duration format.
pub fn parse_duration(s: &str) -> ParseResult<Duration> {
    let mut rest = s;
    let mut negative = false;
    if let Some(stripped) = rest.strip_prefix('-') {
        negative = true;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    } else {
        // No sign, duration is positive
    }

    let rest = rest
        .strip_prefix('P')
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidDuration))?;

    let mut builder = Duration::builder();
    if negative {
        builder = builder.negative();
    }

    let mut digits = String::new();
    let mut in_time = false;
    let mut saw_week = false;
    let mut saw_other = false;

    for c in rest.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if c == 'T' && digits.is_empty() && !in_time {
            in_time = true;
        } else {
            let value = digits
                .parse::<u32>()
                .map_err(|_| ParseError::new(ParseErrorKind::InvalidDuration))?;
            digits.clear();
            builder = apply_duration_designator(builder, c, value, in_time)?;
            if c == 'W' {
                saw_week = true;
            } else {
                saw_other = true;
            }
        }
    }

    if !digits.is_empty() || (!saw_week && !saw_other) || (saw_week && saw_other) {
        return Err(ParseError::new(ParseErrorKind::InvalidDuration).with_context(s.to_string()));
    }

    Ok(builder.build())
}

/// Applies one duration designator to the builder.
fn apply_duration_designator(
    builder: DurationBuilder,
    designator: char,
    value: u32,
    in_time: bool,
) -> ParseResult<DurationBuilder> {
    Ok(match designator {
        'W' if !in_time => builder.weeks(value),
        'D' if !in_time => builder.days(value),
        'H' if in_time => builder.hours(value),
        'M' if in_time => builder.minutes(value),
        'S' if in_time => builder.seconds(value),
        _ => return Err(ParseError::new(ParseErrorKind::InvalidDuration)),
    })
}

/// Parses a PERIOD value (RFC 5545 §3.3.9).
///
/// Format: start"/"end or start"/"duration. Both bounds are date-times;
/// a reversed explicit period or a negative duration is rejected.
///
/// ## Errors
/// Returns an error if the string is not a valid period.
pub fn parse_period(s: &str, tzid: Option<&str>) -> ParseResult<Period> {
    let slash_pos = s
        .find('/')
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidPeriod))?;

    let start = parse_datetime(&s[..slash_pos], tzid)?;
    let start = Temporal::DateTime(start);
    if start.to_naive().is_none() {
        return Err(ParseError::new(ParseErrorKind::InvalidPeriod).with_context(s.to_string()));
    }

    let end_str = &s[slash_pos + 1..];
    if end_str.starts_with('P') || end_str.starts_with('+') || end_str.starts_with('-') {
        let duration = parse_duration(end_str)?;
        if duration.negative && !duration.is_zero() {
            return Err(
                ParseError::new(ParseErrorKind::InvalidPeriod).with_context(s.to_string())
            );
        }
        Ok(Period::from_duration(start, duration))
    } else {
        let end = Temporal::DateTime(parse_datetime(end_str, tzid)?);
        let reversed = end.to_naive().is_none()
            || matches!(
                start.compare(&end),
                Ok(std::cmp::Ordering::Greater) | Err(_)
            );
        if reversed {
            return Err(ParseError::new(ParseErrorKind::InvalidPeriod).with_context(s.to_string()));
        }
        Period::explicit(start, end)
            .map_err(|_| ParseError::new(ParseErrorKind::InvalidPeriod).with_context(s.to_string()))
    }
}

/// Parses a UTC-OFFSET value (RFC 5545 §3.3.14).
///
/// Format: (+|-)HHMM[SS] (e.g., "+0530", "-0800")
///
/// ## Errors
/// Returns an error if the string is not a valid UTC offset format.
pub fn parse_utc_offset(s: &str) -> ParseResult<UtcOffset> {
    if s.len() != 5 && s.len() != 7 {
        return Err(ParseError::new(ParseErrorKind::InvalidUtcOffset));
    }

    let sign = match s.chars().next() {
        Some('+') => 1,
        Some('-') => -1,
        _ => return Err(ParseError::new(ParseErrorKind::InvalidUtcOffset)),
    };

    let hours = s[1..3]
        .parse::<i32>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidUtcOffset))?;
    let minutes = s[3..5]
        .parse::<i32>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidUtcOffset))?;

    let seconds = if s.len() == 7 {
        s[5..7]
            .parse::<i32>()
            .map_err(|_| ParseError::new(ParseErrorKind::InvalidUtcOffset))?
    } else {
        0
    };

    if hours > 14 || minutes > 59 || seconds > 59 {
        return Err(ParseError::new(ParseErrorKind::InvalidUtcOffset));
    }

    let total = sign * (hours * 3600 + minutes * 60 + seconds);
    Ok(UtcOffset::from_seconds(total))
}

/// Parses a single weekday with optional ordinal (e.g., "MO", "1MO", "-1FR").
///
/// ## Errors
/// Returns an error for an unknown weekday or an ordinal of 0 or beyond ±53.
pub fn parse_weekday_num(s: &str) -> ParseResult<WeekdayNum> {
    let s = s.trim();

    // The last two characters name the weekday
    if s.len() < 2 {
        return Err(ParseError::new(ParseErrorKind::InvalidWeekday));
    }

    let weekday_str = &s[s.len() - 2..];
    let ordinal_str = &s[..s.len() - 2];

    let weekday = Weekday::parse(weekday_str).ok_or_else(|| {
        ParseError::new(ParseErrorKind::InvalidWeekday).with_context(s.to_string())
    })?;

    let ordinal = if ordinal_str.is_empty() {
        None
    } else {
        let ordinal = ordinal_str
            .parse::<i8>()
            .map_err(|_| ParseError::new(ParseErrorKind::InvalidNumber))?;
        if ordinal == 0 || !(-53..=53).contains(&ordinal) {
            return Err(
                ParseError::new(ParseErrorKind::InvalidNumber).with_context(s.to_string())
            );
        }
        Some(ordinal)
    };

    Ok(WeekdayNum { ordinal, weekday })
}

/// Parses a RECUR (RRULE) value (RFC 5545 §3.3.10).
///
/// Rule parts are order-insensitive key=value pairs. Unknown keys are
/// preserved on the rule for round-trip fidelity; expansion ignores them.
///
/// ## Errors
/// Returns an error if the string is not a valid recurrence rule or if the
/// assembled rule violates RFC 5545 §3.3.10 (e.g., COUNT with UNTIL).
pub fn parse_rrule(s: &str) -> ParseResult<RecurrenceRule> {
    if s.is_empty() {
        return Err(ParseError::new(ParseErrorKind::EmptyValue));
    }

    let mut pairs = Vec::new();
    for part in s.split(';') {
        let eq_pos = part.find('=').ok_or_else(|| {
            ParseError::new(ParseErrorKind::InvalidRecur).with_context(part.to_string())
        })?;
        pairs.push((&part[..eq_pos], &part[eq_pos + 1..]));
    }

    // FREQ seeds the builder, so find it before applying the other parts.
    let freq_value = pairs
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("FREQ"))
        .map(|(_, value)| *value)
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidRecur).with_context("missing FREQ"))?;
    let freq = Frequency::parse(freq_value).ok_or_else(|| {
        ParseError::new(ParseErrorKind::InvalidFrequency).with_context(freq_value.to_string())
    })?;

    let mut builder = RecurrenceRule::builder(freq);
    for (key, value) in pairs {
        builder = apply_rrule_part(builder, key, value)?;
    }

    builder.build().map_err(|err| match err {
        RuleError::CountAndUntil => ParseError::new(ParseErrorKind::UntilCountConflict),
        other => ParseError::new(ParseErrorKind::InvalidRecur).with_context(other.to_string()),
    })
}

/// Applies a single RRULE key-value pair to the builder.
fn apply_rrule_part(
    builder: RecurrenceRuleBuilder,
    key: &str,
    value: &str,
) -> ParseResult<RecurrenceRuleBuilder> {
    Ok(match key.to_ascii_uppercase().as_str() {
        // Consumed before the part loop
        "FREQ" => builder,
        "INTERVAL" => builder.interval(
            value
                .parse()
                .map_err(|_| ParseError::new(ParseErrorKind::InvalidNumber))?,
        ),
        "COUNT" => builder.count(
            value
                .parse()
                .map_err(|_| ParseError::new(ParseErrorKind::InvalidNumber))?,
        ),
        "UNTIL" => builder.until(parse_temporal(value, None)?),
        "WKST" => builder.week_start(
            Weekday::parse(value)
                .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidWeekday))?,
        ),
        "BYSECOND" => builder.by_second(parse_u8_list(value)?),
        "BYMINUTE" => builder.by_minute(parse_u8_list(value)?),
        "BYHOUR" => builder.by_hour(parse_u8_list(value)?),
        "BYDAY" => builder.by_day(parse_by_day(value)?),
        "BYMONTHDAY" => builder.by_month_day(parse_i8_list(value)?),
        "BYYEARDAY" => builder.by_year_day(parse_i16_list(value)?),
        "BYWEEKNO" => builder.by_week_no(parse_i8_list(value)?),
        "BYMONTH" => builder.by_month(parse_u8_list(value)?),
        "BYSETPOS" => builder.by_set_pos(parse_i16_list(value)?),
        _ => builder.unknown_part(key, value),
    })
}

/// Parses a comma-separated list of u8 values.
fn parse_u8_list(s: &str) -> ParseResult<Vec<u8>> {
    s.split(',')
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| ParseError::new(ParseErrorKind::InvalidNumber))
        })
        .collect()
}

/// Parses a comma-separated list of i8 values.
fn parse_i8_list(s: &str) -> ParseResult<Vec<i8>> {
    s.split(',')
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| ParseError::new(ParseErrorKind::InvalidNumber))
        })
        .collect()
}

/// Parses a comma-separated list of i16 values.
fn parse_i16_list(s: &str) -> ParseResult<Vec<i16>> {
    s.split(',')
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| ParseError::new(ParseErrorKind::InvalidNumber))
        })
        .collect()
}

/// Parses a BYDAY value (weekdays with optional ordinals).
fn parse_by_day(s: &str) -> ParseResult<Vec<WeekdayNum>> {
    s.split(',').map(parse_weekday_num).collect()
}
