//! ICS file generation.

use chrono::{DateTime, Utc};
use icalendar::{Calendar, Component, EventLike, Property};
use tracing::debug;

use super::UTC_FORMAT;
use crate::error::{RelayError, RelayResult};
use crate::event::Event;

pub const PRODID: &str = "-//Werelay//Syllabus//EN";

/// Generate a calendar file for `events`, stamped with the current time.
pub fn generate_ics(events: &[Event], calendar_name: &str) -> RelayResult<String> {
    generate_ics_at(events, calendar_name, Utc::now())
}

/// Generate a calendar file for `events` with an explicit DTSTAMP.
///
/// Output is identical for identical input and `stamp`. An empty event list
/// is refused with [`RelayError::NothingToExport`].
///
/// Only DESCRIPTION is escaped, and only its newlines. SUMMARY and LOCATION
/// are written as entered.
pub fn generate_ics_at(
    events: &[Event],
    calendar_name: &str,
    stamp: DateTime<Utc>,
) -> RelayResult<String> {
    if events.is_empty() {
        return Err(RelayError::NothingToExport);
    }

    let dtstamp = stamp.format(UTC_FORMAT).to_string();
    let mut cal = Calendar::new();
    if !calendar_name.trim().is_empty() {
        cal.append_property(Property::new("X-WR-CALNAME", calendar_name));
    }

    for event in events {
        let mut ics_event = icalendar::Event::new();
        ics_event.uid(event.id.as_str());
        ics_event.add_property("DTSTAMP", &dtstamp);
        ics_event.add_property("DTSTART", event.start.format(UTC_FORMAT).to_string());
        if let Some(end) = event.end {
            ics_event.add_property("DTEND", end.format(UTC_FORMAT).to_string());
        }
        ics_event.summary(&event.title);
        ics_event.description(&escape_newlines(event.description.as_deref().unwrap_or("")));
        ics_event.location(event.location.as_deref().unwrap_or(""));

        cal.push(ics_event.done());
    }

    let output = strip_ics_bloat(&cal.done().to_string());

    debug!(events = events.len(), calendar = calendar_name, "Generated ICS");
    Ok(output)
}

/// Replace line breaks with the two-character sequence `\n`.
pub fn escape_newlines(value: &str) -> String {
    value.replace("\r\n", "\n").replace('\n', "\\n")
}

/// Clean up ICS output from the icalendar crate
/// - Replace PRODID with relay's own
/// - Remove CALSCALE:GREGORIAN (it's the default)
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(PRODID);
            result.push_str("\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}
