//! Bucketing events by calendar day.
//!
//! Day keys are always the event's start date in the viewer's time zone, the
//! same date semantics the month grid uses, so grid cells and buckets line up.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, TimeZone};

use crate::event::Event;

/// The calendar day `event` starts on, as seen in `tz`.
pub fn event_day<Tz: TimeZone>(event: &Event, tz: &Tz) -> NaiveDate {
    event.start.with_timezone(tz).date_naive()
}

/// Events bucketed by start day. Within a bucket, input order is kept.
pub fn group_by_day<'a, Tz: TimeZone>(
    events: &'a [Event],
    tz: &Tz,
) -> BTreeMap<NaiveDate, Vec<&'a Event>> {
    let mut days: BTreeMap<NaiveDate, Vec<&Event>> = BTreeMap::new();
    for event in events {
        days.entry(event_day(event, tz)).or_default().push(event);
    }
    days
}

/// Label of a timeline group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayLabel {
    Today,
    Tomorrow,
    Date(NaiveDate),
}

impl DayLabel {
    pub fn for_day(day: NaiveDate, today: NaiveDate) -> Self {
        match (day - today).num_days() {
            0 => DayLabel::Today,
            1 => DayLabel::Tomorrow,
            _ => DayLabel::Date(day),
        }
    }
}

impl fmt::Display for DayLabel {
    /// "Today", "Tomorrow" or e.g. "Monday, Mar 2"
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DayLabel::Today => f.write_str("Today"),
            DayLabel::Tomorrow => f.write_str("Tomorrow"),
            DayLabel::Date(day) => write!(f, "{}", day.format("%A, %b %-d")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineGroup<'a> {
    pub day: NaiveDate,
    pub label: DayLabel,
    pub events: Vec<&'a Event>,
}

/// Upcoming events grouped by day, for a linear "what's next" view.
///
/// Events starting before today (in `now`'s zone) are dropped; the rest are
/// sorted by start and grouped by day in chronological order. Empty input
/// gives an empty timeline.
pub fn timeline<'a, Tz: TimeZone>(events: &'a [Event], now: &DateTime<Tz>) -> Vec<TimelineGroup<'a>> {
    let tz = now.timezone();
    let today = now.date_naive();

    let mut upcoming: Vec<&Event> = events
        .iter()
        .filter(|event| event_day(event, &tz) >= today)
        .collect();
    upcoming.sort_by_key(|event| event.start);

    let mut groups: Vec<TimelineGroup> = Vec::new();
    for event in upcoming {
        let day = event_day(event, &tz);
        if let Some(group) = groups.last_mut().filter(|group| group.day == day) {
            group.events.push(event);
            continue;
        }
        groups.push(TimelineGroup {
            day,
            label: DayLabel::for_day(day, today),
            events: vec![event],
        });
    }
    groups
}
