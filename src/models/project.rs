use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A billable client or engagement, as stored in the `projects` table.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub hourly_rate: f64,
    pub currency: String,
    #[serde(default)]
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

/// Writable project columns. `user_id` is filled in by the store on insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectInput {
    pub name: String,
    pub description: Option<String>,
    pub hourly_rate: f64,
    pub currency: String,
}

/// The slice of a project embedded into time entry reads.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub currency: String,
    pub hourly_rate: f64,
}

impl From<&Project> for ProjectSummary {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id,
            name: project.name.clone(),
            currency: project.currency.clone(),
            hourly_rate: project.hourly_rate,
        }
    }
}
