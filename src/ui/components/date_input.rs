use chrono::{Datelike, Duration, NaiveDate};
use crossterm::event::KeyCode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatePart {
    Year,
    Month,
    Day,
}

impl DatePart {
    fn digits(self) -> usize {
        match self {
            DatePart::Year => 4,
            DatePart::Month | DatePart::Day => 2,
        }
    }
}

/// Keyboard date entry: type the digits of one part at a time, move between
/// parts with Left/Right, nudge the whole date with Up/Down.
#[derive(Clone, Debug)]
pub struct DateInputState {
    pub date: NaiveDate,
    pub editing: bool,
    pub date_part: DatePart,
    pub pending: String,
}

impl DateInputState {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            editing: false,
            date_part: DatePart::Year,
            pending: String::new(),
        }
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
        self.date_part = DatePart::Year;
        self.pending.clear();
    }

    pub fn next_date_part(&mut self) {
        self.date_part = match self.date_part {
            DatePart::Year => DatePart::Month,
            DatePart::Month => DatePart::Day,
            DatePart::Day => DatePart::Year,
        };
        self.pending.clear();
    }

    pub fn previous_date_part(&mut self) {
        self.date_part = match self.date_part {
            DatePart::Year => DatePart::Day,
            DatePart::Month => DatePart::Year,
            DatePart::Day => DatePart::Month,
        };
        self.pending.clear();
    }

    pub fn handle_input(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        match key {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                self.pending.push(c);
                if self.pending.len() == self.date_part.digits() {
                    self.apply_pending();
                    self.pending.clear();
                    if self.date_part != DatePart::Day {
                        self.next_date_part();
                    }
                }
            }
            KeyCode::Backspace => {
                self.pending.pop();
            }
            KeyCode::Up => self.shift_days(1),
            KeyCode::Down => self.shift_days(-1),
            KeyCode::Right => self.next_date_part(),
            KeyCode::Left => self.previous_date_part(),
            _ => {}
        }
    }

    /// Apply the typed digits to the current part. Out-of-range values are
    /// dropped; a day past the end of the month is clamped.
    fn apply_pending(&mut self) {
        let Ok(value) = self.pending.parse::<u32>() else {
            return;
        };
        let (year, month, day) = (self.date.year(), self.date.month(), self.date.day());

        let candidate = match self.date_part {
            DatePart::Year => i32::try_from(value)
                .ok()
                .filter(|y| (1900..=2100).contains(y))
                .and_then(|y| clamped_date(y, month, day)),
            DatePart::Month => Some(value)
                .filter(|m| (1..=12).contains(m))
                .and_then(|m| clamped_date(year, m, day)),
            DatePart::Day => NaiveDate::from_ymd_opt(year, month, value),
        };

        if let Some(date) = candidate {
            self.date = date;
        }
    }

    fn shift_days(&mut self, days: i64) {
        if let Some(date) = self.date.checked_add_signed(Duration::days(days)) {
            self.date = date;
        }
    }

    pub fn get_display_string(&self) -> String {
        let year = format!("{:04}", self.date.year());
        let month = format!("{:02}", self.date.month());
        let day = format!("{:02}", self.date.day());

        if !self.editing {
            return format!("{year}-{month}-{day}");
        }

        let marker = if self.pending.is_empty() {
            match self.date_part {
                DatePart::Year => "[YYYY]".to_string(),
                DatePart::Month => "[MM]".to_string(),
                DatePart::Day => "[DD]".to_string(),
            }
        } else {
            format!("[{}]", self.pending)
        };

        match self.date_part {
            DatePart::Year => format!("{marker}-{month}-{day}"),
            DatePart::Month => format!("{year}-{marker}-{day}"),
            DatePart::Day => format!("{year}-{month}-{marker}"),
        }
    }
}

/// `year-month-day`, pulling the day back to the last day of the month when
/// it does not exist there (e.g. March 31 -> February 29).
fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    (1..=day)
        .rev()
        .find_map(|d| NaiveDate::from_ymd_opt(year, month, d))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editing(date: &str) -> DateInputState {
        let mut state = DateInputState::new(date.parse().unwrap());
        state.toggle_editing();
        state
    }

    fn type_digits(state: &mut DateInputState, digits: &str) {
        for c in digits.chars() {
            state.handle_input(KeyCode::Char(c));
        }
    }

    #[test]
    fn typing_a_full_date_moves_through_parts() {
        let mut state = editing("2024-03-06");

        type_digits(&mut state, "20251231");

        assert_eq!(state.date.to_string(), "2025-12-31");
        assert_eq!(state.date_part, DatePart::Day);
    }

    #[test]
    fn invalid_parts_are_ignored() {
        let mut state = editing("2024-03-06");

        type_digits(&mut state, "1800");
        assert_eq!(state.date.to_string(), "2024-03-06");

        state.date_part = DatePart::Month;
        type_digits(&mut state, "13");
        assert_eq!(state.date.to_string(), "2024-03-06");

        state.date_part = DatePart::Day;
        type_digits(&mut state, "32");
        assert_eq!(state.date.to_string(), "2024-03-06");
    }

    #[test]
    fn month_change_clamps_the_day() {
        let mut state = editing("2024-03-31");
        state.date_part = DatePart::Month;

        type_digits(&mut state, "02");

        assert_eq!(state.date.to_string(), "2024-02-29");
    }

    #[test]
    fn arrows_nudge_by_a_day() {
        let mut state = editing("2024-02-29");

        state.handle_input(KeyCode::Up);
        assert_eq!(state.date.to_string(), "2024-03-01");
        state.handle_input(KeyCode::Down);
        state.handle_input(KeyCode::Down);
        assert_eq!(state.date.to_string(), "2024-02-28");
    }

    #[test]
    fn input_is_ignored_unless_editing() {
        let mut state = DateInputState::new("2024-03-06".parse().unwrap());

        type_digits(&mut state, "2030");

        assert_eq!(state.date.to_string(), "2024-03-06");
        assert_eq!(state.get_display_string(), "2024-03-06");
    }

    #[test]
    fn display_marks_the_active_part() {
        let mut state = editing("2024-03-06");
        assert_eq!(state.get_display_string(), "[YYYY]-03-06");

        state.next_date_part();
        type_digits(&mut state, "1");
        assert_eq!(state.get_display_string(), "2024-[1]-06");
    }
}
