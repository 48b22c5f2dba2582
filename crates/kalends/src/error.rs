//! Crate-level error aggregation.

use thiserror::Error;

use crate::ical::core::{PrecisionError, RuleError};
use crate::ical::expand::{ExpandError, TimeZoneError};
use crate::ical::parse::ParseError;

/// Any error a kalends operation can raise.
///
/// Callers working a single layer deep can match the layer's own error type;
/// this aggregate exists for code that parses, expands, and aggregates in one
/// flow and wants a single `?` target.
#[derive(Error, Debug)]
pub enum KalendsError {
    /// A value string did not match its RFC 5545 text form.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A recurrence rule definition violates RFC 5545 §3.3.10.
    #[error(transparent)]
    Rule(#[from] RuleError),

    /// An operation mixed date-only and time-bearing values.
    #[error(transparent)]
    Precision(#[from] PrecisionError),

    /// A TZID could not be resolved, or a local time could not be placed.
    #[error(transparent)]
    TimeZone(#[from] TimeZoneError),

    /// Recurrence expansion or free/busy calculation failed.
    #[error(transparent)]
    Expand(#[from] ExpandError),
}

pub type KalendsResult<T> = std::result::Result<T, KalendsError>;
