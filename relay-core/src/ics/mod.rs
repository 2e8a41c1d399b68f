//! ICS file generation and parsing.
//!
//! Exports follow a minimal RFC 5545 subset: one VEVENT per course event with
//! UID, DTSTAMP, DTSTART, optional DTEND, SUMMARY, DESCRIPTION and LOCATION.

mod generate;
mod parse;

pub use generate::{escape_newlines, generate_ics, generate_ics_at, PRODID};
pub use parse::{parse_calendar, IcsEvent};

/// UTC date-time format used for DTSTAMP, DTSTART and DTEND.
pub(crate) const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";
