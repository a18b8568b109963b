//! Quick-select date ranges for the dashboard.

use chrono::{Datelike, Duration, Months, NaiveDate};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Period {
    Week,
    Month,
    ThreeMonths,
    SixMonths,
    Year,
    LastYear,
    Custom,
}

impl Period {
    /// Quick-select periods in display order. `Custom` is reached by editing
    /// the dates directly.
    pub const PRESETS: [Period; 6] = [
        Period::Week,
        Period::Month,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::Year,
        Period::LastYear,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Period::Week => "This week",
            Period::Month => "This month",
            Period::ThreeMonths => "Last 3 months",
            Period::SixMonths => "Last 6 months",
            Period::Year => "This year",
            Period::LastYear => "Last year",
            Period::Custom => "Custom",
        }
    }

    pub fn next(self) -> Period {
        let index = Self::PRESETS.iter().position(|p| *p == self);
        match index {
            Some(i) => Self::PRESETS[(i + 1) % Self::PRESETS.len()],
            None => Period::Week,
        }
    }

    pub fn previous(self) -> Period {
        let index = Self::PRESETS.iter().position(|p| *p == self);
        match index {
            Some(0) | None => Self::PRESETS[Self::PRESETS.len() - 1],
            Some(i) => Self::PRESETS[i - 1],
        }
    }

    /// Inclusive `(start, end)` for this period as seen on `today`.
    /// `Custom` has no range of its own.
    pub fn range(self, today: NaiveDate) -> Option<DateRange> {
        let range = match self {
            Period::Week => DateRange::new(start_of_week(today), today),
            Period::Month => DateRange::new(first_of_month(today, 0), today),
            Period::ThreeMonths => DateRange::new(first_of_month(today, 2), today),
            Period::SixMonths => DateRange::new(first_of_month(today, 5), today),
            Period::Year => DateRange::new(first_of_year(today.year())?, today),
            Period::LastYear => DateRange::new(
                first_of_year(today.year() - 1)?,
                NaiveDate::from_ymd_opt(today.year() - 1, 12, 31)?,
            ),
            Period::Custom => return None,
        };
        range.ok()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Both bounds are inclusive; a start after the end is rejected.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, String> {
        if start > end {
            return Err(format!("Start date {start} is after end date {end}"));
        }
        Ok(Self { start, end })
    }
}

/// The Sunday on or before `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Sunday through Saturday of the week containing `date`.
pub fn week_containing(date: NaiveDate) -> DateRange {
    let start = start_of_week(date);
    DateRange {
        start,
        end: start + Duration::days(6),
    }
}

fn first_of_month(today: NaiveDate, months_back: u32) -> NaiveDate {
    let first = today.with_day(1).unwrap_or(today);
    first.checked_sub_months(Months::new(months_back)).unwrap_or(first)
}

fn first_of_year(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
}
