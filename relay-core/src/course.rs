//! Course records and the search predicates used to find them.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RelayError, RelayResult};

/// Opaque course identity, assigned by the store on creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(pub String);

impl CourseId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CourseId {
    fn from(s: &str) -> Self {
        CourseId(s.to_string())
    }
}

/// Opaque user identity. Relay never authenticates; it only receives one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_string())
    }
}

/// The user-editable descriptive fields of a course.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CourseDetails {
    pub name: String,
    pub university: String,
    pub code: String,
    #[serde(default)]
    pub description: String,
}

impl CourseDetails {
    /// Name, university and code are required; description is free.
    pub fn validate(&self) -> RelayResult<()> {
        for (label, value) in [
            ("name", &self.name),
            ("university", &self.university),
            ("code", &self.code),
        ] {
            if value.trim().is_empty() {
                return Err(RelayError::Validation(format!("Course {} is required", label)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    #[serde(flatten)]
    pub details: CourseDetails,
    /// Users who vouched that the current schedule is accurate
    #[serde(default)]
    pub vouched: BTreeSet<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Course {
    pub fn name(&self) -> &str {
        &self.details.name
    }

    pub fn has_vouched(&self, user: &UserId) -> bool {
        self.vouched.contains(user)
    }

    pub fn vouch_count(&self) -> usize {
        self.vouched.len()
    }

    /// Search-page matching: every whitespace-separated word of `query`
    /// must occur in the course name or university. A blank query matches.
    pub fn matches_search(&self, query: &str) -> bool {
        let haystack = format!("{} {}", self.details.name, self.details.university).to_lowercase();
        query
            .to_lowercase()
            .split_whitespace()
            .all(|word| haystack.contains(word))
    }

    /// Saved-list filtering: `filter` must occur as a whole in the name,
    /// code or university.
    pub fn matches_filter(&self, filter: &str) -> bool {
        let haystack = format!(
            "{} {} {}",
            self.details.name, self.details.code, self.details.university
        )
        .to_lowercase();
        haystack.contains(&filter.to_lowercase())
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.details.name, self.details.code)
    }
}
