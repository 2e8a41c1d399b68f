//! Event form handling.
//!
//! An [`EventDraft`] is what a user fills in: free text plus two
//! time-of-day strings. [`EventDraft::compose`] validates it and anchors
//! both times to a single calendar day in the viewer's time zone.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{RelayError, RelayResult};
use crate::event::{Colour, Event, NewEvent};

/// Start time pre-filled on an empty form.
pub const DEFAULT_START_TIME: &str = "12:00";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub kind: Option<String>,
    pub colour: Option<Colour>,
    /// "HH:MM", 24-hour
    pub start_time: String,
    /// "HH:MM", 24-hour
    pub end_time: Option<String>,
}

impl Default for EventDraft {
    fn default() -> Self {
        EventDraft {
            title: String::new(),
            description: None,
            location: None,
            kind: None,
            colour: None,
            start_time: DEFAULT_START_TIME.to_string(),
            end_time: None,
        }
    }
}

impl EventDraft {
    /// Pre-fill a form from an existing record, with times shown in `tz`.
    pub fn from_event<Tz: TimeZone>(event: &Event, tz: &Tz) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        EventDraft {
            title: event.title.clone(),
            description: event.description.clone(),
            location: event.location.clone(),
            kind: event.kind.clone(),
            colour: Some(event.colour),
            start_time: event.start.with_timezone(tz).format("%H:%M").to_string(),
            end_time: event
                .end
                .map(|end| end.with_timezone(tz).format("%H:%M").to_string()),
        }
    }

    /// Validate the form and build a storable event for `day` (YYYY-MM-DD).
    ///
    /// Both times are anchored to the same `day` in `tz`. An end time earlier
    /// than the start time is accepted as-is and yields an event that ends
    /// before it starts.
    pub fn compose<Tz: TimeZone>(&self, day: &str, tz: &Tz) -> RelayResult<NewEvent> {
        if self.title.trim().is_empty() {
            return Err(RelayError::validation("Event title is required"));
        }

        let day = parse_day(day)?;
        let start_time = parse_time_of_day(&self.start_time)?;
        let end_time = non_blank(self.end_time.as_deref())
            .map(parse_time_of_day)
            .transpose()?;

        let start = instant_on(day, start_time, tz)?;
        let end = end_time
            .map(|time| instant_on(day, time, tz))
            .transpose()?;

        if end.is_some_and(|end| end < start) {
            warn!(
                title = %self.title,
                %day,
                "Event end time is earlier than its start time"
            );
        }

        Ok(NewEvent {
            title: self.title.clone(),
            description: non_blank(self.description.as_deref()).map(str::to_string),
            location: non_blank(self.location.as_deref()).map(str::to_string),
            kind: non_blank(self.kind.as_deref()).map(str::to_string),
            colour: self.colour.unwrap_or_default(),
            start,
            end,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse an ISO calendar day (YYYY-MM-DD).
pub fn parse_day(s: &str) -> RelayResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| RelayError::Validation(format!("Invalid day '{}'. Expected YYYY-MM-DD", s)))
}

/// Parse a strict "HH:MM" 24-hour time-of-day.
pub fn parse_time_of_day(s: &str) -> RelayResult<NaiveTime> {
    let invalid = || RelayError::Validation(format!("Invalid time '{}'. Expected HH:MM", s));

    let bytes = s.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return Err(invalid());
    }
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| invalid())
}

/// The absolute instant of `time` on `day` as seen in `tz`.
///
/// Ambiguous local times (clocks falling back) resolve to the earlier
/// instant; times skipped by a clock change are rejected.
fn instant_on<Tz: TimeZone>(day: NaiveDate, time: NaiveTime, tz: &Tz) -> RelayResult<DateTime<Utc>> {
    tz.from_local_datetime(&day.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            RelayError::Validation(format!(
                "{} {} does not exist in this time zone",
                day,
                time.format("%H:%M")
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventId;
    use chrono::{FixedOffset, Local};

    fn make_draft() -> EventDraft {
        EventDraft {
            title: "Midterm".to_string(),
            start_time: "09:00".to_string(),
            end_time: Some("10:30".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_compose_anchors_times_to_day_in_local_zone() {
        let event = make_draft().compose("2026-03-02", &Local).unwrap();

        let start = event.start.with_timezone(&Local).naive_local();
        let end = event.end.unwrap().with_timezone(&Local).naive_local();
        assert_eq!(start.to_string(), "2026-03-02 09:00:00");
        assert_eq!(end.to_string(), "2026-03-02 10:30:00");
    }

    #[test]
    fn test_compose_converts_to_utc() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let event = make_draft().compose("2026-03-02", &tz).unwrap();
        assert_eq!(event.start.to_rfc3339(), "2026-03-02T07:00:00+00:00");
    }

    #[test]
    fn test_compose_defaults_colour_and_drops_blank_fields() {
        let mut draft = make_draft();
        draft.location = Some("   ".to_string());
        draft.end_time = Some(String::new());

        let event = draft.compose("2026-03-02", &Utc).unwrap();
        assert_eq!(event.colour, Colour::Indigo);
        assert_eq!(event.location, None);
        assert_eq!(event.end, None);
    }

    #[test]
    fn test_compose_rejects_missing_title() {
        let mut draft = make_draft();
        draft.title = "  ".to_string();
        let err = draft.compose("2026-03-02", &Utc).unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
    }

    #[test]
    fn test_compose_rejects_malformed_time_and_day() {
        for bad in ["9:00", "09:0", "24:00", "0900", "09:60", ""] {
            let mut draft = make_draft();
            draft.start_time = bad.to_string();
            assert!(
                draft.compose("2026-03-02", &Utc).is_err(),
                "start time '{}' should be rejected",
                bad
            );
        }

        assert!(make_draft().compose("03/02/2026", &Utc).is_err());
        assert!(make_draft().compose("2026-02-30", &Utc).is_err());
    }

    #[test]
    fn test_compose_keeps_end_before_start() {
        let mut draft = make_draft();
        draft.start_time = "22:00".to_string();
        draft.end_time = Some("01:00".to_string());

        let event = draft.compose("2026-03-02", &Utc).unwrap();
        let end = event.end.unwrap();
        assert!(end < event.start, "end stays on the same day");
        assert_eq!(end.to_rfc3339(), "2026-03-02T01:00:00+00:00");
    }

    #[test]
    fn test_compose_rejects_skipped_local_time() {
        // Clocks in Berlin jump from 02:00 to 03:00 on 2026-03-29
        let tz = chrono_tz::Europe::Berlin;
        let mut draft = make_draft();
        draft.start_time = "02:30".to_string();
        draft.end_time = None;
        assert!(draft.compose("2026-03-29", &tz).is_err());
    }

    #[test]
    fn test_from_event_round_trips_times() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let composed = make_draft().compose("2026-03-02", &tz).unwrap();
        let event = composed.with_id(EventId::from("ev-1"));

        let draft = EventDraft::from_event(&event, &tz);
        assert_eq!(draft.start_time, "09:00");
        assert_eq!(draft.end_time.as_deref(), Some("10:30"));
        assert_eq!(draft.colour, Some(Colour::Indigo));
    }
}
