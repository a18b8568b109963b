//! Dashboard aggregation over an already-fetched list of time entries.
//!
//! Amounts in different currencies are summed without conversion in the
//! overall billable total; `billable_by_currency` keeps them apart.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{Project, TimeEntryWithProject};

/// Groups shown in the per-project chart.
pub const TOP_PROJECTS: usize = 10;

/// Currency assumed for entries whose project could not be embedded.
const FALLBACK_CURRENCY: &str = "USD";

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectTotal {
    pub name: String,
    pub hours: f64,
    pub earnings: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub hours: f64,
    pub earnings: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DashboardSummary {
    pub entry_count: usize,
    pub total_hours: f64,
    pub total_billable: f64,
    pub billable_by_currency: Vec<(String, f64)>,
    pub by_project: Vec<ProjectTotal>,
    pub by_day: Vec<DayTotal>,
    pub active_projects: usize,
}

impl DashboardSummary {
    pub fn build(entries: &[TimeEntryWithProject], projects: &[Project]) -> Self {
        Self {
            entry_count: entries.len(),
            total_hours: total_hours(entries),
            total_billable: total_billable(entries),
            billable_by_currency: billable_by_currency(entries),
            by_project: totals_by_project(entries),
            by_day: totals_by_day(entries),
            active_projects: active_project_count(projects),
        }
    }
}

pub fn total_hours(entries: &[TimeEntryWithProject]) -> f64 {
    entries.iter().map(|e| e.entry.hours).sum()
}

pub fn total_billable(entries: &[TimeEntryWithProject]) -> f64 {
    entries.iter().map(TimeEntryWithProject::earnings).sum()
}

/// Billable amount per currency code, ordered by code.
pub fn billable_by_currency(entries: &[TimeEntryWithProject]) -> Vec<(String, f64)> {
    let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
    for entry in entries {
        let currency = entry
            .project
            .as_ref()
            .map_or(FALLBACK_CURRENCY, |p| p.currency.as_str());
        *sums.entry(currency).or_default() += entry.earnings();
    }
    sums.into_iter()
        .map(|(currency, amount)| (currency.to_string(), amount))
        .collect()
}

/// Hours and earnings grouped by project name, highest earnings first,
/// capped at [`TOP_PROJECTS`] groups.
pub fn totals_by_project(entries: &[TimeEntryWithProject]) -> Vec<ProjectTotal> {
    let mut groups: BTreeMap<&str, ProjectTotal> = BTreeMap::new();
    for entry in entries {
        let name = entry.project_name();
        let group = groups.entry(name).or_insert_with(|| ProjectTotal {
            name: name.to_string(),
            hours: 0.0,
            earnings: 0.0,
        });
        group.hours += entry.entry.hours;
        group.earnings += entry.earnings();
    }

    let mut totals: Vec<ProjectTotal> = groups.into_values().collect();
    // Stable sort keeps equal earners in name order.
    totals.sort_by(|a, b| b.earnings.total_cmp(&a.earnings));
    totals.truncate(TOP_PROJECTS);
    totals
}

/// Hours and earnings per entry date, oldest first.
pub fn totals_by_day(entries: &[TimeEntryWithProject]) -> Vec<DayTotal> {
    let mut days: BTreeMap<NaiveDate, DayTotal> = BTreeMap::new();
    for entry in entries {
        let date = entry.entry.entry_date;
        let day = days.entry(date).or_insert(DayTotal {
            date,
            hours: 0.0,
            earnings: 0.0,
        });
        day.hours += entry.entry.hours;
        day.earnings += entry.earnings();
    }
    days.into_values().collect()
}

pub fn active_project_count(projects: &[Project]) -> usize {
    projects.iter().filter(|p| !p.archived).count()
}

/// Hours for each of the `days` consecutive dates starting at `start`,
/// zero-filled where nothing was logged.
pub fn daily_hours(entries: &[TimeEntryWithProject], start: NaiveDate, days: u32) -> Vec<(NaiveDate, f64)> {
    start
        .iter_days()
        .take(days as usize)
        .map(|date| {
            let hours = entries
                .iter()
                .filter(|e| e.entry.entry_date == date)
                .map(|e| e.entry.hours)
                .sum();
            (date, hours)
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{ProjectSummary, TimeEntry};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    pub(crate) fn summary(name: &str, rate: f64, currency: &str) -> ProjectSummary {
        ProjectSummary {
            id: Uuid::new_v4(),
            name: name.to_string(),
            currency: currency.to_string(),
            hourly_rate: rate,
        }
    }

    pub(crate) fn entry(project: Option<&ProjectSummary>, date: &str, hours: f64) -> TimeEntryWithProject {
        let stamp = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        TimeEntryWithProject {
            entry: TimeEntry {
                id: Uuid::new_v4(),
                user_id: Uuid::nil(),
                project_id: project.map_or(Uuid::nil(), |p| p.id),
                entry_date: date.parse().unwrap(),
                hours,
                notes: None,
                created_at: stamp,
                updated_at: stamp,
            },
            project: project.cloned(),
        }
    }

    pub(crate) fn project(name: &str, archived: bool) -> Project {
        Project {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            name: name.to_string(),
            description: None,
            hourly_rate: 50.0,
            currency: "USD".to_string(),
            archived,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn billable_is_hours_times_rate() {
        let acme = summary("Acme", 10.0, "USD");
        let entries = vec![
            entry(Some(&acme), "2024-03-04", 2.0),
            entry(Some(&acme), "2024-03-05", 3.0),
            entry(Some(&acme), "2024-03-06", 5.0),
        ];

        assert_eq!(total_hours(&entries), 10.0);
        assert_eq!(total_billable(&entries), 100.0);
    }

    #[test]
    fn projects_are_grouped_by_name_and_sorted_by_earnings() {
        let acme = summary("Acme", 10.0, "USD");
        let globex = summary("Globex", 100.0, "EUR");
        let entries = vec![
            entry(Some(&acme), "2024-03-04", 2.0),
            entry(Some(&globex), "2024-03-04", 1.0),
            entry(Some(&acme), "2024-03-05", 4.0),
        ];

        let totals = totals_by_project(&entries);

        assert_eq!(
            totals,
            vec![
                ProjectTotal { name: "Globex".to_string(), hours: 1.0, earnings: 100.0 },
                ProjectTotal { name: "Acme".to_string(), hours: 6.0, earnings: 60.0 },
            ]
        );
    }

    #[test]
    fn project_chart_is_capped() {
        let projects: Vec<ProjectSummary> = (0..12)
            .map(|i| summary(&format!("P{i:02}"), f64::from(i + 1), "USD"))
            .collect();
        let entries: Vec<_> = projects
            .iter()
            .map(|p| entry(Some(p), "2024-03-04", 1.0))
            .collect();

        let totals = totals_by_project(&entries);

        assert_eq!(totals.len(), TOP_PROJECTS);
        assert_eq!(totals[0].name, "P11");
        assert_eq!(totals[9].name, "P02");
    }

    #[test]
    fn days_are_summed_and_ascending() {
        let acme = summary("Acme", 10.0, "USD");
        let entries = vec![
            entry(Some(&acme), "2024-03-06", 1.0),
            entry(Some(&acme), "2024-03-04", 2.0),
            entry(Some(&acme), "2024-03-06", 3.0),
        ];

        let days = totals_by_day(&entries);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date.to_string(), "2024-03-04");
        assert_eq!(days[0].hours, 2.0);
        assert_eq!(days[0].earnings, 20.0);
        assert_eq!(days[1].hours, 4.0);
        assert_eq!(days[1].earnings, 40.0);
    }

    #[test]
    fn currencies_are_kept_apart() {
        let acme = summary("Acme", 10.0, "USD");
        let globex = summary("Globex", 20.0, "EUR");
        let entries = vec![
            entry(Some(&acme), "2024-03-04", 1.0),
            entry(Some(&globex), "2024-03-04", 1.0),
            entry(None, "2024-03-04", 3.0),
        ];

        assert_eq!(
            billable_by_currency(&entries),
            vec![("EUR".to_string(), 20.0), ("USD".to_string(), 10.0)]
        );
        assert_eq!(total_billable(&entries), 30.0);
    }

    #[test]
    fn missing_project_counts_hours_but_not_money() {
        let entries = vec![entry(None, "2024-03-04", 3.0)];

        let summary = DashboardSummary::build(&entries, &[]);

        assert_eq!(summary.total_hours, 3.0);
        assert_eq!(summary.total_billable, 0.0);
        assert_eq!(summary.by_project[0].name, "Unknown project");
    }

    #[test]
    fn archived_projects_are_not_active() {
        let projects = vec![project("Acme", false), project("Old", true), project("Globex", false)];

        assert_eq!(active_project_count(&projects), 2);
    }

    #[test]
    fn daily_hours_zero_fills_the_week() {
        let acme = summary("Acme", 10.0, "USD");
        let entries = vec![entry(Some(&acme), "2024-03-05", 2.5)];
        let start: NaiveDate = "2024-03-03".parse().unwrap();

        let week = daily_hours(&entries, start, 7);

        assert_eq!(week.len(), 7);
        assert_eq!(week[0].1, 0.0);
        assert_eq!(week[2].1, 2.5);
    }

    #[test]
    fn empty_input_gives_empty_summary() {
        assert_eq!(DashboardSummary::build(&[], &[]), DashboardSummary::default());
    }
}
