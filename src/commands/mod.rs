pub mod config;
pub mod event;
pub mod events;
pub mod export;
pub mod inspect;
pub mod new;
pub mod saved;
pub mod search;
pub mod show;
pub mod update;
pub mod upcoming;
pub mod vouch;

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::Args;
use relay_core::{
    Colour, CourseId, CourseSession, DirStore, Event, EventId, RelayConfig, RelayError, Store,
    UserId,
};
use tracing::debug;

/// Optional event fields shared by `add` and `edit`.
#[derive(Args, Debug, Default)]
pub struct EventArgs {
    /// End time (HH:MM), on the same day as the start
    #[arg(long)]
    pub end: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    /// Event type shown as a tag (e.g., "Exam", "Lecture")
    #[arg(long = "type")]
    pub kind: Option<String>,

    /// indigo, rose, emerald, amber, slate (or their hex values)
    #[arg(long)]
    pub colour: Option<Colour>,

    #[arg(long)]
    pub description: Option<String>,
}

/// Everything a command needs, loaded once per invocation.
pub struct Context {
    pub store: Arc<DirStore>,
    pub user: Option<UserId>,
    pub tz: Tz,
}

impl Context {
    pub fn load(user_override: Option<String>) -> Result<Self> {
        let config = RelayConfig::load()?;

        let user = user_override
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .map(UserId)
            .or_else(|| config.user());
        let tz = resolve_timezone(config.timezone()?);
        let store = Arc::new(DirStore::new(config.data_path()));

        debug!(data = %config.data_path().display(), %tz, "Loaded config");
        Ok(Context { store, user, tz })
    }

    /// The current user, or a hint on how to set one.
    pub fn signed_in(&self) -> Result<&UserId> {
        self.user.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "No user set.\n\n\
                Pass --user <ID>, or set `user` in {}",
                RelayConfig::config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "config.toml".to_string())
            )
        })
    }

    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }

    pub async fn open(&self, course: &str) -> Result<CourseSession<DirStore>> {
        let id = resolve_course(self.store.as_ref(), course).await?;
        Ok(CourseSession::open(self.store.clone(), id).await?)
    }
}

/// Configured zone, else the system zone, else UTC.
pub fn resolve_timezone(configured: Option<Tz>) -> Tz {
    configured
        .or_else(|| {
            iana_time_zone::get_timezone()
                .ok()
                .and_then(|name| name.parse::<Tz>().ok())
        })
        .unwrap_or(Tz::UTC)
}

/// Find a course by id or unique id prefix. A blank argument matches nothing.
pub async fn resolve_course<S: Store + ?Sized>(store: &S, arg: &str) -> Result<CourseId> {
    let arg = arg.trim();
    if arg.is_empty() {
        return Err(course_not_found(arg));
    }

    match store.course(&CourseId::from(arg)).await {
        Ok(course) => return Ok(course.id),
        Err(RelayError::CourseNotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    let matches: Vec<_> = store
        .courses()
        .await?
        .into_iter()
        .filter(|c| c.id.as_str().starts_with(arg))
        .collect();

    match matches.as_slice() {
        [course] => Ok(course.id.clone()),
        [] => Err(course_not_found(arg)),
        _ => {
            let available: Vec<_> = matches.iter().map(|c| format!("{} ({})", c.id, c)).collect();
            anyhow::bail!(
                "'{}' matches several courses: {}",
                arg,
                available.join(", ")
            )
        }
    }
}

fn course_not_found(arg: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Course '{}' not found.\n\n\
        Find one with:\n  \
        relay search <terms>",
        arg
    )
}

/// Find an event by id or unique id prefix.
pub fn resolve_event<'a>(events: &'a [Event], arg: &str) -> Result<&'a Event> {
    if let Some(event) = events.iter().find(|e| e.id.as_str() == arg) {
        return Ok(event);
    }

    let matches: Vec<_> = events
        .iter()
        .filter(|e| e.id.as_str().starts_with(arg))
        .collect();

    match matches.as_slice() {
        [event] => Ok(event),
        [] => anyhow::bail!("Event '{}' not found in this course", arg),
        _ => anyhow::bail!("'{}' matches {} events; use more of the id", arg, matches.len()),
    }
}

/// Short form of an id for display.
pub fn short_id(id: &EventId) -> &str {
    let s = id.as_str();
    s.get(..8).unwrap_or(s)
}
