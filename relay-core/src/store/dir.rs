//! Directory-backed store.
//!
//! Layout under the data directory:
//!
//! ```text
//! courses/<course-id>/course.toml
//! courses/<course-id>/events/<event-id>.toml
//! users/<user-id>.toml
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::{new_id, sort_courses, sort_events, Store};
use crate::course::{Course, CourseDetails, CourseId, UserId};
use crate::error::{RelayError, RelayResult};
use crate::event::{Event, EventId, NewEvent};

const COURSE_FILE: &str = "course.toml";
const EVENTS_DIR: &str = "events";

/// Per-user profile file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct UserProfile {
    #[serde(default)]
    saved_courses: Vec<CourseId>,
}

/// A [`Store`] that keeps one TOML file per record.
pub struct DirStore {
    root: PathBuf,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirStore {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn courses_dir(&self) -> PathBuf {
        self.root.join("courses")
    }

    fn course_dir(&self, id: &CourseId) -> RelayResult<PathBuf> {
        if !is_safe_id(id.as_str()) {
            return Err(RelayError::CourseNotFound(id.to_string()));
        }
        let dir = self.courses_dir().join(id.as_str());
        if !dir.join(COURSE_FILE).exists() {
            return Err(RelayError::CourseNotFound(id.to_string()));
        }
        Ok(dir)
    }

    fn event_path(&self, course: &CourseId, id: &EventId) -> RelayResult<PathBuf> {
        if !is_safe_id(id.as_str()) {
            return Err(RelayError::EventNotFound(id.to_string()));
        }
        Ok(self
            .course_dir(course)?
            .join(EVENTS_DIR)
            .join(format!("{}.toml", id)))
    }

    fn user_path(&self, user: &UserId) -> RelayResult<PathBuf> {
        if !is_safe_id(user.as_str()) {
            return Err(RelayError::Validation(format!("Invalid user id '{}'", user)));
        }
        Ok(self.root.join("users").join(format!("{}.toml", user)))
    }

    fn load_course(&self, id: &CourseId) -> RelayResult<Course> {
        read_toml(&self.course_dir(id)?.join(COURSE_FILE))
    }

    fn save_course(&self, course: &Course) -> RelayResult<()> {
        let dir = self.courses_dir().join(course.id.as_str());
        write_toml(&dir.join(COURSE_FILE), course)
    }

    fn load_profile(&self, user: &UserId) -> RelayResult<UserProfile> {
        let path = self.user_path(user)?;
        if !path.exists() {
            return Ok(UserProfile::default());
        }
        read_toml(&path)
    }

    fn save_profile(&self, user: &UserId, profile: &UserProfile) -> RelayResult<()> {
        write_toml(&self.user_path(user)?, profile)
    }

    /// Read-modify-write a course file under the write lock.
    async fn update_course(&self, id: &CourseId, f: impl FnOnce(&mut Course) + Send) -> RelayResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut course = self.load_course(id)?;
        f(&mut course);
        self.save_course(&course)
    }

    async fn update_profile(
        &self,
        user: &UserId,
        f: impl FnOnce(&mut UserProfile) + Send,
    ) -> RelayResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut profile = self.load_profile(user)?;
        f(&mut profile);
        self.save_profile(user, &profile)
    }
}

#[async_trait]
impl Store for DirStore {
    async fn course(&self, id: &CourseId) -> RelayResult<Course> {
        self.load_course(id)
    }

    async fn courses(&self) -> RelayResult<Vec<Course>> {
        let Ok(entries) = std::fs::read_dir(self.courses_dir()) else {
            return Ok(Vec::new());
        };

        let mut courses = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path().join(COURSE_FILE))
            .filter(|path| path.exists())
            .map(|path| read_toml::<Course>(&path))
            .collect::<RelayResult<Vec<_>>>()?;

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

        let _guard = self.write_lock.lock().await;
        self.save_course(&course)?;
        debug!(course = %course.id, path = %self.root.display(), "Created course");
        Ok(course)
    }

    async fn write_course_details(&self, id: &CourseId, details: CourseDetails) -> RelayResult<()> {
        self.update_course(id, |course| {
            course.details = details;
            course.vouched.clear();
        })
        .await
    }

    async fn add_vouch(&self, id: &CourseId, user: &UserId) -> RelayResult<()> {
        let user = user.clone();
        self.update_course(id, |course| {
            course.vouched.insert(user);
        })
        .await
    }

    async fn clear_vouches(&self, id: &CourseId) -> RelayResult<()> {
        self.update_course(id, |course| course.vouched.clear()).await
    }

    async fn events(&self, course: &CourseId) -> RelayResult<Vec<Event>> {
        let dir = self.course_dir(course)?.join(EVENTS_DIR);
        let Ok(entries) = std::fs::read_dir(&dir) else {
            return Ok(Vec::new());
        };

        let mut events = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|e| e == "toml"))
            .map(|path| read_toml::<Event>(&path))
            .collect::<RelayResult<Vec<_>>>()?;

        sort_events(&mut events);
        Ok(events)
    }

    async fn insert_event(&self, course: &CourseId, event: NewEvent) -> RelayResult<EventId> {
        let id = EventId(new_id());
        let path = self.event_path(course, &id)?;
        write_toml(&path, &event.with_id(id.clone()))?;
        Ok(id)
    }

    async fn replace_event(&self, course: &CourseId, id: &EventId, event: NewEvent) -> RelayResult<()> {
        let path = self.event_path(course, id)?;
        if !path.exists() {
            return Err(RelayError::EventNotFound(id.to_string()));
        }
        write_toml(&path, &event.with_id(id.clone()))
    }

    async fn remove_event(&self, course: &CourseId, id: &EventId) -> RelayResult<()> {
        let path = self.event_path(course, id)?;
        if !path.exists() {
            return Err(RelayError::EventNotFound(id.to_string()));
        }
        std::fs::remove_file(&path).map_err(RelayError::persistence)
    }

    async fn saved_courses(&self, user: &UserId) -> RelayResult<Vec<CourseId>> {
        Ok(self.load_profile(user)?.saved_courses)
    }

    async fn add_saved_course(&self, user: &UserId, course: &CourseId) -> RelayResult<()> {
        let course = course.clone();
        self.update_profile(user, |profile| {
            if !profile.saved_courses.contains(&course) {
                profile.saved_courses.push(course);
            }
        })
        .await
    }

    async fn remove_saved_course(&self, user: &UserId, course: &CourseId) -> RelayResult<()> {
        self.update_profile(user, |profile| profile.saved_courses.retain(|c| c != course))
            .await
    }
}

/// Ids become file names, so only allow a conservative character set.
fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'))
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> RelayResult<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| RelayError::Persistence(format!("Failed to read {}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| RelayError::Persistence(format!("Failed to parse {}: {}", path.display(), e)))
}

fn write_toml<T: Serialize>(path: &Path, value: &T) -> RelayResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(RelayError::persistence)?;
    }
    let content = toml::to_string_pretty(value).map_err(RelayError::persistence)?;
    std::fs::write(path, content)
        .map_err(|e| RelayError::Persistence(format!("Failed to write {}: {}", path.display(), e)))
}
