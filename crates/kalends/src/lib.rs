//! Temporal computation for iCalendar (RFC 5545) data.
//!
//! kalends expands recurrence rules into concrete occurrences, does interval
//! arithmetic over half-open periods, reduces recurring schedules to the
//! time they consume, and aggregates many schedules into one free/busy
//! answer. Time zone handling covers both custom VTIMEZONE-style observance
//! data and the bundled IANA database.
//!
//! The crate is a pure library: no I/O, no async, no global state. Every
//! operation that needs a UTC offset takes an explicit
//! [`ical::expand::TimeZoneRegistry`].
//!
//! ```
//! use kalends::ical::core::Duration;
//! use kalends::ical::expand::TimeZoneRegistry;
//! use kalends::ical::freebusy::{RecurrenceSet, Schedule, free_busy};
//! use kalends::ical::parse::{parse_period, parse_rrule, parse_temporal};
//!
//! # fn main() -> kalends::KalendsResult<()> {
//! let registry = TimeZoneRegistry::new();
//! let set = RecurrenceSet::new(parse_temporal("20260105T090000Z", None)?)
//!     .with_rule(parse_rrule("FREQ=WEEKLY;BYDAY=MO,WE,FR")?);
//! let schedule = Schedule::new(set).with_duration(Duration::hours(1));
//!
//! let request = parse_period("20260105T000000Z/20260112T000000Z", None)?;
//! let answer = free_busy(&request, &[schedule], None, &registry)?;
//! assert_eq!(answer.periods().len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod ical;

pub use error::{KalendsError, KalendsResult};
