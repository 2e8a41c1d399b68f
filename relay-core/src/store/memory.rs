//! In-memory store.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{new_id, sort_courses, sort_events, Store};
use crate::course::{Course, CourseDetails, CourseId, UserId};
use crate::error::{RelayError, RelayResult};
use crate::event::{Event, EventId, NewEvent};

#[derive(Default)]
struct Inner {
    courses: HashMap<CourseId, Course>,
    events: HashMap<CourseId, Vec<Event>>,
    saved: HashMap<UserId, Vec<CourseId>>,
}

/// A [`Store`] that keeps everything in process memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    fn course_mut(&mut self, id: &CourseId) -> RelayResult<&mut Course> {
        self.courses
            .get_mut(id)
            .ok_or_else(|| RelayError::CourseNotFound(id.to_string()))
    }

    fn events_mut(&mut self, course: &CourseId) -> RelayResult<&mut Vec<Event>> {
        if !self.courses.contains_key(course) {
            return Err(RelayError::CourseNotFound(course.to_string()));
        }
        Ok(self.events.entry(course.clone()).or_default())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn course(&self, id: &CourseId) -> RelayResult<Course> {
        self.inner
            .read()
            .await
            .courses
            .get(id)
            .cloned()
            .ok_or_else(|| RelayError::CourseNotFound(id.to_string()))
    }

    async fn courses(&self) -> RelayResult<Vec<Course>> {
        let mut courses: Vec<Course> = self.inner.read().await.courses.values().cloned().collect();
        sort_courses(&mut courses);
        Ok(courses)
    }

    async fn insert_course(&self, details: CourseDetails) -> RelayResult<Course> {
        let course = Course {
            id: CourseId(new_id()),
            details,
            vouched: BTreeSet::new(),
            created_at: Utc::now(),
        };
        self.inner
            .write()
            .await
            .courses
            .insert(course.id.clone(), course.clone());
        Ok(course)
    }

    async fn write_course_details(&self, id: &CourseId, details: CourseDetails) -> RelayResult<()> {
        let mut inner = self.inner.write().await;
        let course = inner.course_mut(id)?;
        course.details = details;
        course.vouched.clear();
        Ok(())
    }

    async fn add_vouch(&self, id: &CourseId, user: &UserId) -> RelayResult<()> {
        self.inner.write().await.course_mut(id)?.vouched.insert(user.clone());
        Ok(())
    }

    async fn clear_vouches(&self, id: &CourseId) -> RelayResult<()> {
        self.inner.write().await.course_mut(id)?.vouched.clear();
        Ok(())
    }

    async fn events(&self, course: &CourseId) -> RelayResult<Vec<Event>> {
        let inner = self.inner.read().await;
        if !inner.courses.contains_key(course) {
            return Err(RelayError::CourseNotFound(course.to_string()));
        }
        let mut events = inner.events.get(course).cloned().unwrap_or_default();
        sort_events(&mut events);
        Ok(events)
    }

    async fn insert_event(&self, course: &CourseId, event: NewEvent) -> RelayResult<EventId> {
        let id = EventId(new_id());
        self.inner
            .write()
            .await
            .events_mut(course)?
            .push(event.with_id(id.clone()));
        Ok(id)
    }

    async fn replace_event(&self, course: &CourseId, id: &EventId, event: NewEvent) -> RelayResult<()> {
        let mut inner = self.inner.write().await;
        let slot = inner
            .events_mut(course)?
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| RelayError::EventNotFound(id.to_string()))?;
        *slot = event.with_id(id.clone());
        Ok(())
    }

    async fn remove_event(&self, course: &CourseId, id: &EventId) -> RelayResult<()> {
        let mut inner = self.inner.write().await;
        let events = inner.events_mut(course)?;
        let before = events.len();
        events.retain(|e| &e.id != id);
        if events.len() == before {
            return Err(RelayError::EventNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn saved_courses(&self, user: &UserId) -> RelayResult<Vec<CourseId>> {
        Ok(self
            .inner
            .read()
            .await
            .saved
            .get(user)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_saved_course(&self, user: &UserId, course: &CourseId) -> RelayResult<()> {
        let mut inner = self.inner.write().await;
        let saved = inner.saved.entry(user.clone()).or_default();
        if !saved.contains(course) {
            saved.push(course.clone());
        }
        Ok(())
    }

    async fn remove_saved_course(&self, user: &UserId, course: &CourseId) -> RelayResult<()> {
        if let Some(saved) = self.inner.write().await.saved.get_mut(user) {
            saved.retain(|c| c != course);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Colour;
    use chrono::TimeZone;

    fn details(name: &str) -> CourseDetails {
        CourseDetails {
            name: name.to_string(),
            university: "UW".to_string(),
            code: "CS1".to_string(),
            description: String::new(),
        }
    }

    fn new_event(title: &str, hour: u32) -> NewEvent {
        NewEvent {
            title: title.to_string(),
            description: None,
            location: None,
            kind: None,
            colour: Colour::Indigo,
            start: Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap(),
            end: None,
        }
    }

    #[tokio::test]
    async fn test_events_come_back_ordered_by_start() {
        let store = MemoryStore::new();
        let course = store.insert_course(details("Algorithms")).await.unwrap();

        store.insert_event(&course.id, new_event("late", 16)).await.unwrap();
        store.insert_event(&course.id, new_event("early", 8)).await.unwrap();

        let titles: Vec<_> = store
            .events(&course.id)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["early", "late"]);
    }

    #[tokio::test]
    async fn test_vouch_and_saved_lists_are_sets() {
        let store = MemoryStore::new();
        let course = store.insert_course(details("Algorithms")).await.unwrap();
        let user = UserId::from("u1");

        store.add_vouch(&course.id, &user).await.unwrap();
        store.add_vouch(&course.id, &user).await.unwrap();
        assert_eq!(store.course(&course.id).await.unwrap().vouch_count(), 1);

        store.add_saved_course(&user, &course.id).await.unwrap();
        store.add_saved_course(&user, &course.id).await.unwrap();
        assert_eq!(store.saved_courses(&user).await.unwrap(), vec![course.id.clone()]);

        store.remove_saved_course(&user, &course.id).await.unwrap();
        assert!(store.saved_courses(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_detail_write_clears_vouches() {
        let store = MemoryStore::new();
        let course = store.insert_course(details("Algorithms")).await.unwrap();
        store.add_vouch(&course.id, &UserId::from("u1")).await.unwrap();

        store
            .write_course_details(&course.id, details("Advanced Algorithms"))
            .await
            .unwrap();

        let loaded = store.course(&course.id).await.unwrap();
        assert_eq!(loaded.name(), "Advanced Algorithms");
        assert_eq!(loaded.vouch_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_records_are_reported() {
        let store = MemoryStore::new();
        let missing = CourseId::from("nope");
        assert!(matches!(
            store.course(&missing).await,
            Err(RelayError::CourseNotFound(_))
        ));

        let course = store.insert_course(details("Algorithms")).await.unwrap();
        let err = store
            .remove_event(&course.id, &EventId::from("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::EventNotFound(_)));
    }

    #[tokio::test]
    async fn test_courses_ordered_by_name() {
        let store = MemoryStore::new();
        store.insert_course(details("Databases")).await.unwrap();
        store.insert_course(details("Compilers")).await.unwrap();

        let names: Vec<_> = store
            .courses()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.details.name)
            .collect();
        assert_eq!(names, vec!["Compilers", "Databases"]);
    }
}
