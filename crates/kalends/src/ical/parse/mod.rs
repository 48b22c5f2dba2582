//! Parsers for the iCalendar value types the temporal engine consumes.
//!
//! These operate on isolated value strings (the text after the `:` or `=` of
//! a content line), not on full iCalendar streams. Property and component
//! parsing live upstream; this layer turns value text into the typed model
//! in [`crate::ical::core`].

mod error;
mod values;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use values::{
    parse_date, parse_datetime, parse_duration, parse_period, parse_rrule, parse_temporal,
    parse_utc_offset, parse_weekday_num,
};
