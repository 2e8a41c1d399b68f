//! Core library for relay: shared course calendars.
//!
//! - `grid` and `grouping` lay events out for month and timeline views
//! - `draft` and `session` carry the event lifecycle against a [`Store`]
//! - `ics` writes (and reads back) iCalendar files

pub mod config;
pub mod course;
pub mod draft;
pub mod error;
pub mod event;
pub mod grid;
pub mod grouping;
pub mod ics;
pub mod session;
pub mod store;

pub use config::RelayConfig;
pub use course::{Course, CourseDetails, CourseId, UserId};
pub use draft::EventDraft;
pub use error::{RelayError, RelayResult};
pub use event::{Colour, Event, EventId, NewEvent};
pub use grid::MonthGrid;
pub use grouping::{DayLabel, TimelineGroup};
pub use session::{CourseSession, ExportFile};
pub use store::{DirStore, MemoryStore, Store};
