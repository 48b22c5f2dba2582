//! iCalendar temporal model, text forms, and computation layers.
//!
//! - `core`: the value model (dates, date-times, durations, rules) and the
//!   period algebra
//! - `parse`: RFC 5545 value text forms
//! - `expand`: recurrence expansion, observances, and TZID resolution
//! - `freebusy`: consumed time and free/busy aggregation

pub mod core;
pub mod expand;
pub mod freebusy;
pub mod parse;
