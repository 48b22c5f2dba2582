//! Expansion of recurrence rules and time zone data into concrete instants.

mod observance;
mod recur;
mod timezone;

pub use observance::{Observance, ObservanceKind, ZoneRules};
pub use recur::{ExpandError, MAX_EMPTY_PERIODS, Occurrences, TimeRange};
pub use timezone::{TimeZoneError, TimeZoneRegistry, normalize_tzid};
