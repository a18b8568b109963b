//! Data access for the screens: API calls fronted by the query cache.
//!
//! Reads go through the cache; every mutation invalidates the keys whose
//! results it may have changed.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use crate::api::{ApiError, RestClient};
use crate::cache::{Entries, QueryCache};
use crate::models::{Project, ProjectInput, TimeEntryInput, TimeEntryWithProject};

pub struct DataStore {
    rest: RestClient,
    cache: QueryCache,
}

impl DataStore {
    pub fn new(rest: RestClient, cache: QueryCache) -> Self {
        Self { rest, cache }
    }

    // Project operations

    pub async fn projects(&self) -> Result<Arc<Vec<Project>>, ApiError> {
        if let Some(projects) = self.cache.projects().await {
            debug!("projects served from cache");
            return Ok(projects);
        }
        let projects = self.rest.list_projects().await?;
        Ok(self.cache.put_projects(projects).await)
    }

    pub async fn create_project(&self, input: &ProjectInput) -> Result<Project, ApiError> {
        let project = self.rest.create_project(input).await?;
        self.cache.invalidate_projects().await;
        Ok(project)
    }

    /// Entries embed a project snapshot, so they are dropped as well.
    pub async fn update_project(&self, id: Uuid, input: &ProjectInput) -> Result<Project, ApiError> {
        let project = self.rest.update_project(id, input).await?;
        self.invalidate_project_dependents().await;
        Ok(project)
    }

    pub async fn set_project_archived(&self, id: Uuid, archived: bool) -> Result<Project, ApiError> {
        let project = self.rest.set_project_archived(id, archived).await?;
        self.invalidate_project_dependents().await;
        Ok(project)
    }

    pub async fn delete_project(&self, id: Uuid) -> Result<(), ApiError> {
        self.rest.delete_project(id).await?;
        self.invalidate_project_dependents().await;
        Ok(())
    }

    async fn invalidate_project_dependents(&self) {
        self.cache.invalidate_projects().await;
        self.cache.invalidate_all_entries();
    }

    // Time entry operations

    pub async fn entries_for(&self, date: NaiveDate) -> Result<Entries, ApiError> {
        if let Some(entries) = self.cache.entries_for(date).await {
            return Ok(entries);
        }
        let entries = self.rest.list_entries_for_date(date).await?;
        Ok(self.cache.put_entries_for(date, entries).await)
    }

    pub async fn entries_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Entries, ApiError> {
        if let Some(entries) = self.cache.range(start, end).await {
            return Ok(entries);
        }
        let entries = self.rest.list_entries_in_range(start, end).await?;
        Ok(self.cache.put_range(start, end, entries).await)
    }

    pub async fn create_entry(&self, input: &TimeEntryInput) -> Result<TimeEntryWithProject, ApiError> {
        let entry = self.rest.create_entry(input).await?;
        self.cache.invalidate_date(entry.entry.entry_date).await;
        self.cache.invalidate_dashboard();
        Ok(entry)
    }

    /// `previous_date` is the date the entry had before the edit, so a moved
    /// entry disappears from its old day as well.
    pub async fn update_entry(
        &self,
        id: Uuid,
        previous_date: NaiveDate,
        input: &TimeEntryInput,
    ) -> Result<TimeEntryWithProject, ApiError> {
        let entry = self.rest.update_entry(id, input).await?;
        self.cache.invalidate_date(entry.entry.entry_date).await;
        if previous_date != entry.entry.entry_date {
            self.cache.invalidate_date(previous_date).await;
        }
        self.cache.invalidate_dashboard();
        Ok(entry)
    }

    pub async fn delete_entry(&self, id: Uuid, entry_date: NaiveDate) -> Result<(), ApiError> {
        self.rest.delete_entry(id).await?;
        self.cache.invalidate_date(entry_date).await;
        self.cache.invalidate_dashboard();
        Ok(())
    }

    /// Drop every cached result so the next reads hit the API. Also used
    /// on sign-out so nothing leaks to the next user.
    pub fn clear(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::rest::tests::{entry_json, project_json, signed_in_auth, ENTRY_ID, PROJECT_ID};
    use crate::config::Config;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer, dir: &tempfile::TempDir) -> DataStore {
        let config = Config::for_base_url(&server.uri());
        let rest = RestClient::new(&config, reqwest::Client::new(), signed_in_auth(server, dir));
        DataStore::new(rest, QueryCache::new(Duration::from_secs(60)))
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn input_on(day: u32) -> TimeEntryInput {
        TimeEntryInput {
            project_id: Uuid::parse_str(PROJECT_ID).unwrap(),
            entry_date: date(day),
            hours: 2.0,
            notes: None,
        }
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        Mock::given(method("GET"))
            .and(path("/rest/v1/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([project_json("Acme", 80.0, false)])))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server, &dir);
        store.projects().await.unwrap();
        let projects = store.projects().await.unwrap();

        assert_eq!(projects.len(), 1);
    }

    #[tokio::test]
    async fn creating_a_project_refetches_the_list() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        Mock::given(method("GET"))
            .and(path("/rest/v1/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/projects"))
            .respond_with(ResponseTemplate::new(201).set_body_json(project_json("Acme", 80.0, false)))
            .mount(&server)
            .await;

        let store = store_for(&server, &dir);
        store.projects().await.unwrap();
        store
            .create_project(&ProjectInput {
                name: "Acme".to_string(),
                description: None,
                hourly_rate: 80.0,
                currency: "EUR".to_string(),
            })
            .await
            .unwrap();
        store.projects().await.unwrap();
    }

    #[tokio::test]
    async fn failed_reads_are_not_cached() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        Mock::given(method("GET"))
            .and(path("/rest/v1/projects"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let store = store_for(&server, &dir);

        assert!(store.projects().await.is_err());
        assert!(store.projects().await.is_err());
    }

    #[tokio::test]
    async fn editing_a_project_refetches_entries() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        Mock::given(method("GET"))
            .and(path("/rest/v1/time_entries"))
            .and(query_param("entry_date", "eq.2024-03-04"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([entry_json("2024-03-04", 2.0)])))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/time_entries"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([entry_json("2024-03-04", 2.0)])))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/projects"))
            .and(query_param("id", format!("eq.{PROJECT_ID}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(project_json("Acme Ltd", 95.0, false)))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server, &dir);
        store.entries_for(date(4)).await.unwrap();
        store.entries_in_range(date(3), date(9)).await.unwrap();

        let id = Uuid::parse_str(PROJECT_ID).unwrap();
        let input = ProjectInput {
            name: "Acme Ltd".to_string(),
            description: None,
            hourly_rate: 95.0,
            currency: "EUR".to_string(),
        };
        store.update_project(id, &input).await.unwrap();

        store.entries_for(date(4)).await.unwrap();
        store.entries_in_range(date(3), date(9)).await.unwrap();
    }

    #[tokio::test]
    async fn rejected_token_ends_the_session() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        Mock::given(method("GET"))
            .and(path("/rest/v1/projects"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "JWT expired" })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let auth = signed_in_auth(&server, &dir);
        let rest = RestClient::new(&Config::for_base_url(&server.uri()), reqwest::Client::new(), auth.clone());
        let store = DataStore::new(rest, QueryCache::new(Duration::from_secs(60)));

        let err = store.projects().await.unwrap_err();

        assert!(auth.end_session_if_rejected(&err).await);
        assert!(!auth.is_signed_in());
        assert!(!dir.path().join("session.json").exists());
    }

    #[tokio::test]
    async fn other_failures_keep_the_session() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        Mock::given(method("GET"))
            .and(path("/rest/v1/projects"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let auth = signed_in_auth(&server, &dir);
        let rest = RestClient::new(&Config::for_base_url(&server.uri()), reqwest::Client::new(), auth.clone());
        let store = DataStore::new(rest, QueryCache::new(Duration::from_secs(60)));

        let err = store.projects().await.unwrap_err();

        assert!(!auth.end_session_if_rejected(&err).await);
        assert!(auth.is_signed_in());
    }

    #[tokio::test]
    async fn moving_an_entry_invalidates_both_days_and_ranges() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        for day in ["2024-03-04", "2024-03-05"] {
            Mock::given(method("GET"))
                .and(path("/rest/v1/time_entries"))
                .and(query_param("entry_date", format!("eq.{day}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
                .expect(2)
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/rest/v1/time_entries"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/time_entries"))
            .and(query_param("id", format!("eq.{ENTRY_ID}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(entry_json("2024-03-05", 2.0)))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server, &dir);
        store.entries_for(date(4)).await.unwrap();
        store.entries_for(date(5)).await.unwrap();
        store.entries_in_range(date(3), date(9)).await.unwrap();

        let id = Uuid::parse_str(ENTRY_ID).unwrap();
        store.update_entry(id, date(4), &input_on(5)).await.unwrap();

        store.entries_for(date(4)).await.unwrap();
        store.entries_for(date(5)).await.unwrap();
        store.entries_in_range(date(3), date(9)).await.unwrap();
    }

    #[tokio::test]
    async fn deleting_an_entry_leaves_other_days_cached() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        Mock::given(method("GET"))
            .and(path("/rest/v1/time_entries"))
            .and(query_param("entry_date", "eq.2024-03-04"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([entry_json("2024-03-04", 2.0)])))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/time_entries"))
            .and(query_param("entry_date", "eq.2024-03-06"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/time_entries"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let store = store_for(&server, &dir);
        store.entries_for(date(4)).await.unwrap();
        store.entries_for(date(6)).await.unwrap();

        let id = Uuid::parse_str(ENTRY_ID).unwrap();
        store.delete_entry(id, date(4)).await.unwrap();

        store.entries_for(date(4)).await.unwrap();
        store.entries_for(date(6)).await.unwrap();
    }
}
