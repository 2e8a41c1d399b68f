//! Course event records.
//!
//! An event belongs to exactly one course. Its `start` (and optional `end`)
//! are absolute instants; the calendar day an event lands on depends on the
//! viewer's time zone and is computed by the grouping code, never stored.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Opaque event identity, assigned by the store on creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        EventId(s.to_string())
    }
}

/// The fixed palette an event can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Colour {
    #[default]
    Indigo,
    Rose,
    Emerald,
    Amber,
    Slate,
}

impl Colour {
    pub const ALL: [Colour; 5] = [
        Colour::Indigo,
        Colour::Rose,
        Colour::Emerald,
        Colour::Amber,
        Colour::Slate,
    ];

    pub fn hex(self) -> &'static str {
        match self {
            Colour::Indigo => "#6366f1",
            Colour::Rose => "#f43f5e",
            Colour::Emerald => "#10b981",
            Colour::Amber => "#f59e0b",
            Colour::Slate => "#475569",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Colour::Indigo => "indigo",
            Colour::Rose => "rose",
            Colour::Emerald => "emerald",
            Colour::Amber => "amber",
            Colour::Slate => "slate",
        }
    }

    /// RGB components, for terminal rendering.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Colour::Indigo => (0x63, 0x66, 0xf1),
            Colour::Rose => (0xf4, 0x3f, 0x5e),
            Colour::Emerald => (0x10, 0xb9, 0x81),
            Colour::Amber => (0xf5, 0x9e, 0x0b),
            Colour::Slate => (0x47, 0x55, 0x69),
        }
    }
}

impl FromStr for Colour {
    type Err = RelayError;

    /// Accepts either the hex value (`#6366f1`, any case) or the palette name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Colour::ALL
            .into_iter()
            .find(|c| c.hex() == wanted || c.name() == wanted)
            .ok_or_else(|| {
                let options: Vec<_> = Colour::ALL.iter().map(|c| c.name()).collect();
                RelayError::Validation(format!(
                    "Unknown colour '{}'. Expected one of: {}",
                    s,
                    options.join(", ")
                ))
            })
    }
}

impl TryFrom<String> for Colour {
    type Error = RelayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Colour> for String {
    fn from(colour: Colour) -> Self {
        colour.hex().to_string()
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.hex())
    }
}

/// Event fields as submitted to the store, before an identity is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Free-text tag such as "Exam" or "Lab"
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub colour: Colour,
    pub start: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl NewEvent {
    pub fn with_id(self, id: EventId) -> Event {
        Event {
            id,
            title: self.title,
            description: self.description,
            location: self.location,
            kind: self.kind,
            colour: self.colour,
            start: self.start,
            end: self.end,
        }
    }
}

/// A persisted course event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub colour: Colour,
    pub start: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl Event {
    /// The tag shown next to the title, "Event" when untyped.
    pub fn kind_label(&self) -> &str {
        match self.kind.as_deref() {
            Some(kind) if !kind.trim().is_empty() => kind,
            _ => "Event",
        }
    }

    /// Whether the record ends before it starts (possible when the end
    /// time-of-day is earlier than the start time-of-day).
    pub fn ends_before_start(&self) -> bool {
        self.end.is_some_and(|end| end < self.start)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}
