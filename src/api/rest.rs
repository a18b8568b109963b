//! Row-level CRUD over the `projects` and `time_entries` tables.

use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{check, read_json, ApiError, AuthClient};
use crate::config::Config;
use crate::models::{Project, ProjectInput, TimeEntryInput, TimeEntryWithProject};

/// Columns selected for time entry reads, embedding the owning project.
const ENTRY_SELECT: &str = "*,project:projects(id,name,currency,hourly_rate)";

/// Row cap for date range reads.
pub const RANGE_LIMIT: usize = 100;

/// Ask for a single JSON object instead of a one-element array.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    auth: Arc<AuthClient>,
}

impl RestClient {
    pub fn new(config: &Config, http: reqwest::Client, auth: Arc<AuthClient>) -> Self {
        Self {
            http,
            base_url: format!("{}/rest/v1", config.supabase_url),
            anon_key: config.supabase_anon_key.clone(),
            auth,
        }
    }

    /// The signed-in user's id, stamped onto inserted rows.
    fn user_id(&self) -> Result<Uuid, ApiError> {
        self.auth.user().map(|u| u.id).ok_or(ApiError::NotAuthenticated)
    }

    async fn request(&self, method: Method, table: &str) -> Result<RequestBuilder, ApiError> {
        let token = self.auth.access_token().await?;
        Ok(self
            .http
            .request(method, format!("{}/{}", self.base_url, table))
            .header("apikey", &self.anon_key)
            .bearer_auth(token))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        read_json(request.send().await?).await
    }

    /// Send a write and decode the single row it returns.
    async fn write_one<T: DeserializeOwned, B: Serialize>(
        &self,
        request: RequestBuilder,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = request
            .header("Prefer", "return=representation")
            .header("Accept", SINGLE_OBJECT)
            .json(body);
        self.fetch(request).await
    }

    // Project operations

    /// All projects of the signed-in user, newest first.
    #[instrument(skip(self))]
    pub async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        let request = self
            .request(Method::GET, "projects")
            .await?
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        let projects: Vec<Project> = self.fetch(request).await?;
        debug!(count = projects.len(), "projects loaded");
        Ok(projects)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_project(&self, input: &ProjectInput) -> Result<Project, ApiError> {
        let mut body = serde_json::to_value(input).map_err(|e| ApiError::Decode(e.to_string()))?;
        body["user_id"] = json!(self.user_id()?);

        let request = self
            .request(Method::POST, "projects")
            .await?
            .query(&[("select", "*")]);
        self.write_one(request, &body).await
    }

    #[instrument(skip(self, input))]
    pub async fn update_project(&self, id: Uuid, input: &ProjectInput) -> Result<Project, ApiError> {
        let request = self
            .request(Method::PATCH, "projects")
            .await?
            .query(&[("id", format!("eq.{id}")), ("select", "*".to_string())]);
        self.write_one(request, input).await
    }

    #[instrument(skip(self))]
    pub async fn set_project_archived(&self, id: Uuid, archived: bool) -> Result<Project, ApiError> {
        let request = self
            .request(Method::PATCH, "projects")
            .await?
            .query(&[("id", format!("eq.{id}")), ("select", "*".to_string())]);
        self.write_one(request, &json!({ "archived": archived })).await
    }

    #[instrument(skip(self))]
    pub async fn delete_project(&self, id: Uuid) -> Result<(), ApiError> {
        let request = self
            .request(Method::DELETE, "projects")
            .await?
            .query(&[("id", format!("eq.{id}"))]);
        check(request.send().await?).await?;
        Ok(())
    }

    // Time entry operations

    /// Entries logged on `date`, newest first.
    #[instrument(skip(self))]
    pub async fn list_entries_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<TimeEntryWithProject>, ApiError> {
        let request = self.request(Method::GET, "time_entries").await?.query(&[
            ("select", ENTRY_SELECT.to_string()),
            ("entry_date", format!("eq.{date}")),
            ("order", "created_at.desc".to_string()),
        ]);
        self.fetch(request).await
    }

    /// Entries with `start <= entry_date <= end`, newest first, capped at
    /// [`RANGE_LIMIT`] rows.
    #[instrument(skip(self))]
    pub async fn list_entries_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TimeEntryWithProject>, ApiError> {
        let request = self.request(Method::GET, "time_entries").await?.query(&[
            ("select", ENTRY_SELECT.to_string()),
            ("entry_date", format!("gte.{start}")),
            ("entry_date", format!("lte.{end}")),
            ("order", "created_at.desc".to_string()),
            ("limit", RANGE_LIMIT.to_string()),
        ]);
        let entries: Vec<TimeEntryWithProject> = self.fetch(request).await?;
        debug!(count = entries.len(), "range loaded");
        Ok(entries)
    }

    #[instrument(skip(self, input), fields(date = %input.entry_date))]
    pub async fn create_entry(
        &self,
        input: &TimeEntryInput,
    ) -> Result<TimeEntryWithProject, ApiError> {
        let mut body = serde_json::to_value(input).map_err(|e| ApiError::Decode(e.to_string()))?;
        body["user_id"] = json!(self.user_id()?);

        let request = self
            .request(Method::POST, "time_entries")
            .await?
            .query(&[("select", ENTRY_SELECT)]);
        self.write_one(request, &body).await
    }

    #[instrument(skip(self, input))]
    pub async fn update_entry(
        &self,
        id: Uuid,
        input: &TimeEntryInput,
    ) -> Result<TimeEntryWithProject, ApiError> {
        let request = self.request(Method::PATCH, "time_entries").await?.query(&[
            ("id", format!("eq.{id}")),
            ("select", ENTRY_SELECT.to_string()),
        ]);
        self.write_one(request, input).await
    }

    #[instrument(skip(self))]
    pub async fn delete_entry(&self, id: Uuid) -> Result<(), ApiError> {
        let request = self
            .request(Method::DELETE, "time_entries")
            .await?
            .query(&[("id", format!("eq.{id}"))]);
        check(request.send().await?).await?;
        Ok(())
    }
}
