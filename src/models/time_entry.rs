use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ProjectSummary;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TimeEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub entry_date: NaiveDate,
    pub hours: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A time entry joined with the project it was logged against.
///
/// Only ever produced by reads; the embedded project is a snapshot and may
/// lag behind edits to the project itself until the cache is invalidated.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TimeEntryWithProject {
    #[serde(flatten)]
    pub entry: TimeEntry,
    #[serde(default)]
    pub project: Option<ProjectSummary>,
}

impl TimeEntryWithProject {
    pub fn hourly_rate(&self) -> f64 {
        self.project.as_ref().map_or(0.0, |p| p.hourly_rate)
    }

    pub fn earnings(&self) -> f64 {
        self.entry.hours * self.hourly_rate()
    }

    pub fn project_name(&self) -> &str {
        self.project.as_ref().map_or("Unknown project", |p| p.name.as_str())
    }
}

/// Writable time entry columns. `user_id` is filled in by the store on insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeEntryInput {
    pub project_id: Uuid,
    pub entry_date: NaiveDate,
    pub hours: f64,
    pub notes: Option<String>,
}
