//! ICS file parsing using the icalendar crate's parser.
//!
//! The parser decodes TEXT escapes itself, so values are taken as parsed.

use chrono::{DateTime, NaiveDateTime, Utc};
use icalendar::parser::{read_calendar, unfold, Component};

use super::UTC_FORMAT;
use crate::error::{RelayError, RelayResult};

/// The fields relay exports for an event, read back from an .ics file.
#[derive(Debug, Clone, PartialEq)]
pub struct IcsEvent {
    pub uid: String,
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub stamp: Option<DateTime<Utc>>,
}

/// Parse every VEVENT in `content`.
///
/// Events without a UID or a UTC DTSTART are skipped.
pub fn parse_calendar(content: &str) -> RelayResult<Vec<IcsEvent>> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| RelayError::IcsParse(e.to_string()))?;

    Ok(calendar
        .components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .filter_map(parse_event)
        .collect())
}

fn parse_event(vevent: &Component) -> Option<IcsEvent> {
    let uid = vevent.find_prop("UID")?.val.to_string();
    let start = parse_utc(vevent.find_prop("DTSTART")?.val.as_ref())?;
    let end = vevent
        .find_prop("DTEND")
        .and_then(|p| parse_utc(p.val.as_ref()));
    let stamp = vevent
        .find_prop("DTSTAMP")
        .and_then(|p| parse_utc(p.val.as_ref()));

    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| p.val.to_string())
        .unwrap_or_else(|| "(No title)".to_string());

    // Empty values are exported for absent fields
    let text = |name: &str| {
        vevent
            .find_prop(name)
            .map(|p| p.val.to_string())
            .filter(|v| !v.is_empty())
    };

    Some(IcsEvent {
        uid,
        summary,
        description: text("DESCRIPTION"),
        location: text("LOCATION"),
        start,
        end,
        stamp,
    })
}

fn parse_utc(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), UTC_FORMAT)
        .ok()
        .map(|dt| dt.and_utc())
}
