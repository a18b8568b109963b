//! Client-side query cache.
//!
//! Results are keyed by entity and query parameters. Reads populate the
//! cache, mutations invalidate the keys they affect. Only successful
//! responses are ever stored.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use moka::future::Cache;
use tracing::debug;

use crate::models::{Project, TimeEntryWithProject};

/// Upper bound on cached entries per key space.
const MAX_CAPACITY: u64 = 256;

pub type Entries = Arc<Vec<TimeEntryWithProject>>;

#[derive(Clone)]
pub struct QueryCache {
    projects: Cache<(), Arc<Vec<Project>>>,
    entries_by_date: Cache<NaiveDate, Entries>,
    dashboard: Cache<(NaiveDate, NaiveDate), Entries>,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            projects: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
            entries_by_date: Cache::builder()
                .max_capacity(MAX_CAPACITY)
                .time_to_live(ttl)
                .build(),
            dashboard: Cache::builder()
                .max_capacity(MAX_CAPACITY)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn projects(&self) -> Option<Arc<Vec<Project>>> {
        self.projects.get(&()).await
    }

    pub async fn put_projects(&self, projects: Vec<Project>) -> Arc<Vec<Project>> {
        let projects = Arc::new(projects);
        self.projects.insert((), projects.clone()).await;
        projects
    }

    pub async fn entries_for(&self, date: NaiveDate) -> Option<Entries> {
        self.entries_by_date.get(&date).await
    }

    pub async fn put_entries_for(&self, date: NaiveDate, entries: Vec<TimeEntryWithProject>) -> Entries {
        let entries = Arc::new(entries);
        self.entries_by_date.insert(date, entries.clone()).await;
        entries
    }

    pub async fn range(&self, start: NaiveDate, end: NaiveDate) -> Option<Entries> {
        self.dashboard.get(&(start, end)).await
    }

    pub async fn put_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        entries: Vec<TimeEntryWithProject>,
    ) -> Entries {
        let entries = Arc::new(entries);
        self.dashboard.insert((start, end), entries.clone()).await;
        entries
    }

    pub async fn invalidate_projects(&self) {
        debug!("invalidating projects");
        self.projects.invalidate(&()).await;
    }

    pub async fn invalidate_date(&self, date: NaiveDate) {
        debug!(%date, "invalidating entries for date");
        self.entries_by_date.invalidate(&date).await;
    }

    /// Drop every cached range; any of them may contain a changed entry.
    pub fn invalidate_dashboard(&self) {
        debug!("invalidating dashboard ranges");
        self.dashboard.invalidate_all();
    }

    /// Drop every cached time entry list, by date and by range.
    pub fn invalidate_all_entries(&self) {
        self.entries_by_date.invalidate_all();
        self.invalidate_dashboard();
    }

    pub fn clear(&self) {
        debug!("clearing query cache");
        self.projects.invalidate_all();
        self.invalidate_all_entries();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[tokio::test]
    async fn invalidating_a_date_leaves_other_dates_cached() {
        let cache = QueryCache::new(Duration::from_secs(60));
        cache.put_entries_for(date(4), Vec::new()).await;
        cache.put_entries_for(date(5), Vec::new()).await;

        cache.invalidate_date(date(4)).await;

        assert!(cache.entries_for(date(4)).await.is_none());
        assert!(cache.entries_for(date(5)).await.is_some());
    }

    #[tokio::test]
    async fn dashboard_invalidation_drops_every_range() {
        let cache = QueryCache::new(Duration::from_secs(60));
        cache.put_range(date(1), date(7), Vec::new()).await;
        cache.put_range(date(1), date(31), Vec::new()).await;
        cache.put_projects(Vec::new()).await;

        cache.invalidate_dashboard();

        assert!(cache.range(date(1), date(7)).await.is_none());
        assert!(cache.range(date(1), date(31)).await.is_none());
        assert!(cache.projects().await.is_some());
    }

    #[tokio::test]
    async fn clear_empties_everything() {
        let cache = QueryCache::new(Duration::from_secs(60));
        cache.put_projects(Vec::new()).await;
        cache.put_entries_for(date(4), Vec::new()).await;
        cache.put_range(date(1), date(7), Vec::new()).await;

        cache.clear();

        assert!(cache.projects().await.is_none());
        assert!(cache.entries_for(date(4)).await.is_none());
        assert!(cache.range(date(1), date(7)).await.is_none());
    }
}
