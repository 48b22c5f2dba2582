//! Consumed time and free/busy aggregation.
//!
//! Builds on the expansion engine and the period algebra: a schedule's
//! occurrences become the periods it occupies, and aggregation reduces many
//! schedules to one classified busy or free answer over a request period.

mod query;
mod schedule;

pub use query::{FreeBusy, FreeBusyKind, free_busy};
pub use schedule::{DEFAULT_MAX_INSTANCES, RecurrenceSet, Schedule};
