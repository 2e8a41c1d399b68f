//! Persistence for courses, their events and users' saved lists.
//!
//! The [`Store`] trait is the only way relay touches storage. It exposes
//! the small set of primitives the course session needs: whole-record
//! reads, event writes scoped to a course, and add-if-absent / remove
//! operations on the array-like fields (vouches, saved courses).

mod dir;
mod memory;

pub use dir::DirStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::course::{Course, CourseDetails, CourseId, UserId};
use crate::error::RelayResult;
use crate::event::{Event, EventId, NewEvent};

#[async_trait]
pub trait Store: Send + Sync {
    /// Read one course.
    async fn course(&self, id: &CourseId) -> RelayResult<Course>;

    /// All courses, ordered by name.
    async fn courses(&self) -> RelayResult<Vec<Course>>;

    /// Create a course with a fresh id, `created_at = now` and no vouches.
    async fn insert_course(&self, details: CourseDetails) -> RelayResult<Course>;

    /// Overwrite a course's descriptive fields and clear its vouches in the
    /// same write. Either both change or neither does.
    async fn write_course_details(&self, id: &CourseId, details: CourseDetails) -> RelayResult<()>;

    /// Add `user` to the course's vouch set if absent.
    async fn add_vouch(&self, id: &CourseId, user: &UserId) -> RelayResult<()>;

    /// Empty the course's vouch set.
    async fn clear_vouches(&self, id: &CourseId) -> RelayResult<()>;

    /// The course's events, ordered by start.
    async fn events(&self, course: &CourseId) -> RelayResult<Vec<Event>>;

    async fn insert_event(&self, course: &CourseId, event: NewEvent) -> RelayResult<EventId>;

    /// Replace the event stored under `id`.
    async fn replace_event(&self, course: &CourseId, id: &EventId, event: NewEvent) -> RelayResult<()>;

    async fn remove_event(&self, course: &CourseId, id: &EventId) -> RelayResult<()>;

    /// Ids of the courses `user` saved to their profile.
    async fn saved_courses(&self, user: &UserId) -> RelayResult<Vec<CourseId>>;

    /// Add `course` to `user`'s saved list if absent.
    async fn add_saved_course(&self, user: &UserId, course: &CourseId) -> RelayResult<()>;

    async fn remove_saved_course(&self, user: &UserId, course: &CourseId) -> RelayResult<()>;
}

/// Fresh opaque id for a new record.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Sort events the way every store returns them.
pub(crate) fn sort_events(events: &mut [Event]) {
    events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
}

/// Sort courses the way every store returns them.
pub(crate) fn sort_courses(courses: &mut [Course]) {
    courses.sort_by(|a, b| a.details.name.cmp(&b.details.name).then_with(|| a.id.cmp(&b.id)));
}
