//! Course session: the event lifecycle against a [`Store`].
//!
//! A [`CourseSession`] holds a snapshot of one course and its events. Every
//! mutation goes to the store first and then reloads the whole snapshot;
//! nothing is patched in place. A failed store call leaves the snapshot as it
//! was. Any schedule edit resets the course's vouches.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::course::{Course, CourseDetails, CourseId, UserId};
use crate::draft::EventDraft;
use crate::error::{RelayError, RelayResult};
use crate::event::{Event, EventId};
use crate::ics::generate_ics_at;
use crate::store::Store;

const FALLBACK_EXPORT_NAME: &str = "course";

/// An exported calendar, ready to be written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub filename: String,
    pub contents: String,
}

#[derive(Debug, Clone)]
struct Snapshot {
    course: Course,
    events: Vec<Event>,
}

pub struct CourseSession<S: Store + ?Sized> {
    store: Arc<S>,
    course_id: CourseId,
    snapshot: RwLock<Snapshot>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the mutation finishes, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: Store + ?Sized> CourseSession<S> {
    /// Load a course and its events.
    pub async fn open(store: Arc<S>, course_id: CourseId) -> RelayResult<Self> {
        let snapshot = load(store.as_ref(), &course_id).await?;
        Ok(CourseSession {
            store,
            course_id,
            snapshot: RwLock::new(snapshot),
            in_flight: AtomicBool::new(false),
        })
    }

    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    pub async fn course(&self) -> Course {
        self.snapshot.read().await.course.clone()
    }

    /// Events ordered by start.
    pub async fn events(&self) -> Vec<Event> {
        self.snapshot.read().await.events.clone()
    }

    pub async fn has_vouched(&self, user: &UserId) -> bool {
        self.snapshot.read().await.course.has_vouched(user)
    }

    /// Refetch the course and its events from the store.
    pub async fn refresh(&self) -> RelayResult<()> {
        let fresh = load(self.store.as_ref(), &self.course_id).await?;
        *self.snapshot.write().await = fresh;
        Ok(())
    }

    /// Create an event on `day`, or replace `editing` if given.
    ///
    /// The draft is validated before the store is touched. On success the
    /// course's vouches are cleared. Returns the event's id.
    ///
    /// The event write and the vouch reset are two store calls. If clearing
    /// the vouches fails after the insert or replace succeeded, the error is
    /// returned but the event stays written and the vouches are not reset.
    pub async fn save_event<Tz: TimeZone>(
        &self,
        user: Option<&UserId>,
        draft: &EventDraft,
        day: &str,
        editing: Option<&EventId>,
        tz: &Tz,
    ) -> RelayResult<EventId> {
        let user = require_user(user)?;
        let _guard = self.begin()?;
        let event = draft.compose(day, tz)?;

        let id = match editing {
            Some(id) => {
                self.store.replace_event(&self.course_id, id, event).await?;
                id.clone()
            }
            None => self.store.insert_event(&self.course_id, event).await?,
        };
        info!(course = %self.course_id, event = %id, %user, "Saved event");

        self.reset_vouches().await?;
        self.refresh().await?;
        Ok(id)
    }

    /// Remove an event and clear the course's vouches.
    ///
    /// Same two-step order as [`Self::save_event`]: a failed vouch reset
    /// leaves the event deleted.
    pub async fn delete_event(&self, user: Option<&UserId>, id: &EventId) -> RelayResult<()> {
        let user = require_user(user)?;
        let _guard = self.begin()?;

        self.store.remove_event(&self.course_id, id).await?;
        info!(course = %self.course_id, event = %id, %user, "Deleted event");

        self.reset_vouches().await?;
        self.refresh().await
    }

    /// Overwrite the course's name, university, code and description.
    ///
    /// The store clears the vouches in the same write, so the details and
    /// the vouch reset land together or not at all.
    pub async fn update_details(&self, user: Option<&UserId>, details: CourseDetails) -> RelayResult<()> {
        let user = require_user(user)?;
        details.validate()?;
        let _guard = self.begin()?;

        self.store.write_course_details(&self.course_id, details).await?;
        info!(course = %self.course_id, %user, "Updated course details and cleared vouches");

        self.refresh().await
    }

    /// Vouch that the current schedule is accurate. Vouching again is a no-op.
    pub async fn vouch(&self, user: Option<&UserId>) -> RelayResult<()> {
        let user = require_user(user)?;
        let _guard = self.begin()?;

        if self.has_vouched(user).await {
            debug!(course = %self.course_id, %user, "Already vouched");
            return Ok(());
        }

        self.store.add_vouch(&self.course_id, user).await?;
        info!(course = %self.course_id, %user, "Vouched");
        self.refresh().await
    }

    pub async fn save_to_profile(&self, user: Option<&UserId>) -> RelayResult<()> {
        let user = require_user(user)?;
        let _guard = self.begin()?;
        self.store.add_saved_course(user, &self.course_id).await
    }

    pub async fn remove_from_profile(&self, user: Option<&UserId>) -> RelayResult<()> {
        let user = require_user(user)?;
        let _guard = self.begin()?;
        self.store.remove_saved_course(user, &self.course_id).await
    }

    /// Build the course's calendar file, stamped with `now`.
    pub async fn export(&self, now: DateTime<Utc>) -> RelayResult<ExportFile> {
        let snapshot = self.snapshot.read().await;
        let name = snapshot.course.name();
        let contents = generate_ics_at(&snapshot.events, name, now)?;

        debug!(course = %self.course_id, events = snapshot.events.len(), "Built export");
        Ok(ExportFile {
            filename: export_filename(name),
            contents,
        })
    }

    fn begin(&self) -> RelayResult<InFlight<'_>> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            return Err(RelayError::Busy);
        }
        Ok(InFlight(&self.in_flight))
    }

    async fn reset_vouches(&self) -> RelayResult<()> {
        self.store.clear_vouches(&self.course_id).await?;
        debug!(course = %self.course_id, "Cleared vouches");
        Ok(())
    }
}

async fn load<S: Store + ?Sized>(store: &S, course_id: &CourseId) -> RelayResult<Snapshot> {
    let course = store.course(course_id).await?;
    let events = store.events(course_id).await?;
    Ok(Snapshot { course, events })
}

fn require_user(user: Option<&UserId>) -> RelayResult<&UserId> {
    user.ok_or(RelayError::NotSignedIn)
}

fn export_filename(name: &str) -> String {
    let name = name.trim();
    let stem = if name.is_empty() { FALLBACK_EXPORT_NAME } else { name };
    format!("{}.ics", stem.replace(['/', '\\'], "-"))
}

/// Create a course. Requires a signed-in `user`.
pub async fn create_course<S: Store + ?Sized>(
    store: &S,
    user: Option<&UserId>,
    details: CourseDetails,
) -> RelayResult<Course> {
    let user = require_user(user)?;
    details.validate()?;

    let course = store.insert_course(details).await?;
    info!(course = %course.id, %user, "Created course");
    Ok(course)
}

/// Courses whose name and university contain every word of `query`.
pub async fn search_courses<S: Store + ?Sized>(store: &S, query: &str) -> RelayResult<Vec<Course>> {
    let mut courses = store.courses().await?;
    courses.retain(|course| course.matches_search(query));
    Ok(courses)
}

/// `user`'s saved courses, narrowed by `filter`.
///
/// Saved ids whose course no longer exists are skipped.
pub async fn saved_courses<S: Store + ?Sized>(
    store: &S,
    user: Option<&UserId>,
    filter: &str,
) -> RelayResult<Vec<Course>> {
    let user = require_user(user)?;

    let mut courses = Vec::new();
    for id in store.saved_courses(user).await? {
        match store.course(&id).await {
            Ok(course) => courses.push(course),
            Err(RelayError::CourseNotFound(_)) => {
                debug!(course = %id, %user, "Skipping missing saved course");
            }
            Err(e) => return Err(e),
        }
    }

    courses.retain(|course| course.matches_filter(filter));
    Ok(courses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Colour, NewEvent};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::{FixedOffset, TimeZone};
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Semaphore;

    /// Wraps a MemoryStore; can fail or hold writes and counts them.
    struct TestStore {
        inner: MemoryStore,
        fail_writes: AtomicBool,
        fail_clear_vouches: AtomicBool,
        writes: AtomicUsize,
        /// When set, writes wait for a permit
        gate: Option<Semaphore>,
    }

    impl TestStore {
        fn new() -> Self {
            TestStore {
                inner: MemoryStore::new(),
                fail_writes: AtomicBool::new(false),
                fail_clear_vouches: AtomicBool::new(false),
                writes: AtomicUsize::new(0),
                gate: None,
            }
        }

        fn gated() -> Self {
            TestStore {
                gate: Some(Semaphore::new(0)),
                ..Self::new()
            }
        }

        fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        async fn write(&self) -> RelayResult<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.acquire().await.map_err(RelayError::persistence)?.forget();
            }
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(RelayError::Persistence("store unavailable".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Store for TestStore {
        async fn course(&self, id: &CourseId) -> RelayResult<Course> {
            self.inner.course(id).await
        }

        async fn courses(&self) -> RelayResult<Vec<Course>> {
            self.inner.courses().await
        }

        async fn insert_course(&self, details: CourseDetails) -> RelayResult<Course> {
            self.write().await?;
            self.inner.insert_course(details).await
        }

        async fn write_course_details(&self, id: &CourseId, details: CourseDetails) -> RelayResult<()> {
            self.write().await?;
            self.inner.write_course_details(id, details).await
        }

        async fn add_vouch(&self, id: &CourseId, user: &UserId) -> RelayResult<()> {
            self.write().await?;
            self.inner.add_vouch(id, user).await
        }

        async fn clear_vouches(&self, id: &CourseId) -> RelayResult<()> {
            self.write().await?;
            if self.fail_clear_vouches.load(Ordering::SeqCst) {
                return Err(RelayError::Persistence("vouch reset failed".to_string()));
            }
            self.inner.clear_vouches(id).await
        }

        async fn events(&self, course: &CourseId) -> RelayResult<Vec<Event>> {
            self.inner.events(course).await
        }

        async fn insert_event(&self, course: &CourseId, event: NewEvent) -> RelayResult<EventId> {
            self.write().await?;
            self.inner.insert_event(course, event).await
        }

        async fn replace_event(&self, course: &CourseId, id: &EventId, event: NewEvent) -> RelayResult<()> {
            self.write().await?;
            self.inner.replace_event(course, id, event).await
        }

        async fn remove_event(&self, course: &CourseId, id: &EventId) -> RelayResult<()> {
            self.write().await?;
            self.inner.remove_event(course, id).await
        }

        async fn saved_courses(&self, user: &UserId) -> RelayResult<Vec<CourseId>> {
            self.inner.saved_courses(user).await
        }

        async fn add_saved_course(&self, user: &UserId, course: &CourseId) -> RelayResult<()> {
            self.write().await?;
            self.inner.add_saved_course(user, course).await
        }

        async fn remove_saved_course(&self, user: &UserId, course: &CourseId) -> RelayResult<()> {
            self.write().await?;
            self.inner.remove_saved_course(user, course).await
        }
    }

    fn details(name: &str) -> CourseDetails {
        CourseDetails {
            name: name.to_string(),
            university: "University of Waterloo".to_string(),
            code: "CS350".to_string(),
            description: String::new(),
        }
    }

    fn tz() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    fn draft(title: &str) -> EventDraft {
        EventDraft {
            title: title.to_string(),
            start_time: "09:00".to_string(),
            end_time: Some("10:30".to_string()),
            ..EventDraft::default()
        }
    }

    fn u(id: &str) -> UserId {
        UserId::from(id)
    }

    async fn open_course(store: TestStore) -> CourseSession<TestStore> {
        let course = store.inner.insert_course(details("Operating Systems")).await.unwrap();
        CourseSession::open(Arc::new(store), course.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_editing_an_event_clears_vouches() {
        let session = open_course(TestStore::new()).await;
        let id = session
            .save_event(Some(&u("u1")), &draft("Midterm"), "2026-03-02", None, &tz())
            .await
            .unwrap();

        session.vouch(Some(&u("u1"))).await.unwrap();
        session.vouch(Some(&u("u2"))).await.unwrap();
        assert_eq!(session.course().await.vouch_count(), 2);

        let mut edit = draft("Midterm (room change)");
        edit.location = Some("DC 1350".to_string());
        session
            .save_event(Some(&u("u3")), &edit, "2026-03-02", Some(&id), &tz())
            .await
            .unwrap();

        let course = session.course().await;
        assert!(course.vouched.is_empty(), "vouches should reset: {:?}", course.vouched);
        let events = session.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].location.as_deref(), Some("DC 1350"));
    }

    #[tokio::test]
    async fn test_saved_event_is_anchored_in_viewer_zone() {
        let session = open_course(TestStore::new()).await;
        session
            .save_event(Some(&u("u1")), &draft("Midterm"), "2026-03-02", None, &tz())
            .await
            .unwrap();

        let event = &session.events().await[0];
        assert_eq!(event.start, tz().with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap());
        assert_eq!(
            event.end,
            Some(tz().with_ymd_and_hms(2026, 3, 2, 10, 30, 0).unwrap().with_timezone(&Utc))
        );
    }

    #[tokio::test]
    async fn test_delete_and_detail_update_clear_vouches() {
        let session = open_course(TestStore::new()).await;
        let id = session
            .save_event(Some(&u("u1")), &draft("Quiz"), "2026-03-04", None, &tz())
            .await
            .unwrap();

        session.vouch(Some(&u("u1"))).await.unwrap();
        session.delete_event(Some(&u("u1")), &id).await.unwrap();
        assert!(session.events().await.is_empty());
        assert_eq!(session.course().await.vouch_count(), 0);

        session.vouch(Some(&u("u1"))).await.unwrap();
        session
            .update_details(Some(&u("u1")), details("Operating Systems II"))
            .await
            .unwrap();
        let course = session.course().await;
        assert_eq!(course.name(), "Operating Systems II");
        assert_eq!(course.vouch_count(), 0);
    }

    #[tokio::test]
    async fn test_detail_update_does_not_depend_on_a_separate_vouch_reset() {
        let session = open_course(TestStore::new()).await;
        session.vouch(Some(&u("u1"))).await.unwrap();
        session.store.fail_clear_vouches.store(true, Ordering::SeqCst);

        let writes = session.store.writes();
        session
            .update_details(Some(&u("u2")), details("Operating Systems II"))
            .await
            .unwrap();

        assert_eq!(session.store.writes(), writes + 1, "one store write for details and vouches");
        let stored = session.store.inner.course(session.course_id()).await.unwrap();
        assert_eq!(stored.name(), "Operating Systems II");
        assert_eq!(stored.vouch_count(), 0);
        assert_eq!(session.course().await, stored);
    }

    #[tokio::test]
    async fn test_failed_vouch_reset_leaves_saved_event_in_place() {
        let session = open_course(TestStore::new()).await;
        session.vouch(Some(&u("u1"))).await.unwrap();
        session.store.fail_clear_vouches.store(true, Ordering::SeqCst);

        let err = session
            .save_event(Some(&u("u2")), &draft("Midterm"), "2026-03-02", None, &tz())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Persistence(_)));

        session.refresh().await.unwrap();
        assert_eq!(session.events().await.len(), 1, "the event write is kept");
        assert!(session.has_vouched(&u("u1")).await, "vouches are not reset");
    }

    #[tokio::test]
    async fn test_double_vouch_is_a_no_op() {
        let session = open_course(TestStore::new()).await;

        session.vouch(Some(&u("u1"))).await.unwrap();
        let writes = session.store.writes();
        session.vouch(Some(&u("u1"))).await.unwrap();

        assert_eq!(session.store.writes(), writes, "second vouch must not hit the store");
        let course = session.course().await;
        assert_eq!(course.vouched.iter().filter(|v| v.as_str() == "u1").count(), 1);
        assert!(session.has_vouched(&u("u1")).await);
    }

    #[tokio::test]
    async fn test_mutations_require_a_user() {
        let session = open_course(TestStore::new()).await;

        let err = session
            .save_event(None, &draft("Midterm"), "2026-03-02", None, &tz())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::NotSignedIn));
        assert!(matches!(session.vouch(None).await, Err(RelayError::NotSignedIn)));
        assert!(matches!(
            session.save_to_profile(None).await,
            Err(RelayError::NotSignedIn)
        ));
        assert_eq!(session.store.writes(), 0);
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_store() {
        let session = open_course(TestStore::new()).await;

        let mut bad = draft("Midterm");
        bad.start_time = "9am".to_string();
        let err = session
            .save_event(Some(&u("u1")), &bad, "2026-03-02", None, &tz())
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Validation(_)));
        assert_eq!(session.store.writes(), 0);

        // The guard is released after a failure
        session
            .save_event(Some(&u("u1")), &draft("Midterm"), "2026-03-02", None, &tz())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_store_failure_leaves_snapshot_untouched() {
        let session = open_course(TestStore::new()).await;
        session
            .save_event(Some(&u("u1")), &draft("Midterm"), "2026-03-02", None, &tz())
            .await
            .unwrap();
        session.vouch(Some(&u("u1"))).await.unwrap();
        let before_course = session.course().await;
        let before_events = session.events().await;

        session.store.fail_writes.store(true, Ordering::SeqCst);
        let err = session
            .save_event(Some(&u("u1")), &draft("Final"), "2026-04-20", None, &tz())
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Persistence(_)));
        assert_eq!(session.course().await, before_course);
        assert_eq!(session.events().await, before_events);
    }

    #[tokio::test]
    async fn test_second_submission_while_saving_is_busy() {
        let session = open_course(TestStore::gated()).await;
        let gate = session.store.gate.as_ref().unwrap();
        let first_draft = draft("Midterm");
        let second_draft = draft("Final");
        let user = u("u1");
        let zone = tz();

        let (first, second, _) = tokio::join!(
            session.save_event(Some(&user), &first_draft, "2026-03-02", None, &zone),
            session.save_event(Some(&user), &second_draft, "2026-04-20", None, &zone),
            async { gate.add_permits(10) },
        );

        assert!(first.is_ok(), "first save should complete: {:?}", first);
        assert!(matches!(second, Err(RelayError::Busy)));
        // insert + clear vouches, nothing from the rejected submission
        assert_eq!(session.store.writes(), 2);
        assert_eq!(session.events().await.len(), 1);
    }

    #[tokio::test]
    async fn test_export_builds_named_file() {
        let session = open_course(TestStore::new()).await;
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap();

        let err = session.export(now).await.unwrap_err();
        assert!(matches!(err, RelayError::NothingToExport));

        session
            .save_event(Some(&u("u1")), &draft("Midterm"), "2026-03-02", None, &tz())
            .await
            .unwrap();
        let file = session.export(now).await.unwrap();
        assert_eq!(file.filename, "Operating Systems.ics");
        assert!(file.contents.contains("SUMMARY:Midterm\r\n"));
        assert!(file.contents.contains("DTSTART:20260302T140000Z\r\n"));
    }

    #[test]
    fn test_export_filename_fallback() {
        assert_eq!(export_filename("  "), "course.ics");
        assert_eq!(export_filename("Math 1/2"), "Math 1-2.ics");
    }

    #[tokio::test]
    async fn test_profile_and_search() {
        let store = MemoryStore::new();
        let user = u("alice");

        assert!(matches!(
            create_course(&store, None, details("Algorithms")).await,
            Err(RelayError::NotSignedIn)
        ));
        let mut missing_code = details("Algorithms");
        missing_code.code.clear();
        assert!(matches!(
            create_course(&store, Some(&user), missing_code).await,
            Err(RelayError::Validation(_))
        ));

        let algo = create_course(&store, Some(&user), details("Algorithms")).await.unwrap();
        let db = create_course(&store, Some(&user), details("Databases")).await.unwrap();

        let found = search_courses(&store, "waterloo algo").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, algo.id);
        assert_eq!(search_courses(&store, "").await.unwrap().len(), 2);

        let store = Arc::new(store);
        for id in [&algo.id, &db.id] {
            let session = CourseSession::open(store.clone(), id.clone()).await.unwrap();
            session.save_to_profile(Some(&user)).await.unwrap();
        }

        let saved = saved_courses(store.as_ref(), Some(&user), "data").await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, db.id);

        let session = CourseSession::open(store.clone(), db.id.clone()).await.unwrap();
        session.remove_from_profile(Some(&user)).await.unwrap();
        let saved = saved_courses(store.as_ref(), Some(&user), "").await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, algo.id);
    }

    #[tokio::test]
    async fn test_refresh_sees_external_writes() {
        let session = open_course(TestStore::new()).await;
        session
            .store
            .inner
            .insert_event(
                session.course_id(),
                NewEvent {
                    title: "Added elsewhere".to_string(),
                    description: None,
                    location: None,
                    kind: None,
                    colour: Colour::Amber,
                    start: Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap(),
                    end: None,
                },
            )
            .await
            .unwrap();

        assert!(session.events().await.is_empty());
        session.refresh().await.unwrap();
        assert_eq!(session.events().await.len(), 1);
    }
}
