//! Temporal value model (RFC 5545 §3.3).
//!
//! This module defines the value types the rest of the crate computes over.
//! These types are designed for:
//! - Round-trip fidelity: preserving unknown rule parts and input forms
//! - Validated construction: rule and period invariants hold by the time a
//!   value exists
//! - Closed unions: precision and timezone anchoring are exhaustive enums,
//!   never stringly-typed state

mod date;
mod datetime;
mod duration;
mod period;
mod period_list;
mod rrule;

pub use date::Date;
pub use datetime::{DateTime, DateTimeForm, Precision, PrecisionError, Temporal, UtcOffset};
pub use duration::{Duration, DurationBuilder};
pub use period::Period;
pub use period_list::PeriodList;
pub use rrule::{
    Frequency, RecurrenceRule, RecurrenceRuleBuilder, RuleError, Weekday, WeekdayNum,
};
