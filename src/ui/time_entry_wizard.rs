use chrono::NaiveDate;
use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};
use uuid::Uuid;

use crate::models::{Project, ProjectSummary, TimeEntryInput, TimeEntryWithProject};
use crate::ui::components::date_input::DateInputState;
use crate::ui::components::drawer::render_drawer;

const DEFAULT_HOURS: &str = "8.0";

pub enum TimeEntryWizardAction {
    Cancel,
    Save {
        id: Option<Uuid>,
        /// Date the entry was stored under before this edit.
        previous_date: Option<NaiveDate>,
        input: TimeEntryInput,
    },
}

#[derive(Clone, PartialEq, Copy, Debug)]
pub enum EntryField {
    Date,
    Project,
    Hours,
    Notes,
}

pub struct TimeEntryWizardState {
    pub entry_id: Option<Uuid>,
    pub previous_date: Option<NaiveDate>,
    pub date_state: DateInputState,
    /// Projects offered by the picker.
    pub options: Vec<ProjectSummary>,
    pub project_index: Option<usize>,
    pub hours: String,
    pub notes: String,
    pub current_field: EntryField,
    pub editing: bool,
}

impl TimeEntryWizardState {
    pub fn new(date: NaiveDate, projects: &[Project]) -> Self {
        Self {
            entry_id: None,
            previous_date: None,
            date_state: DateInputState::new(date),
            options: active_options(projects),
            project_index: None,
            hours: DEFAULT_HOURS.to_string(),
            notes: String::new(),
            current_field: EntryField::Project,
            editing: false,
        }
    }

    /// Prefill from an existing entry. Its project stays selectable even
    /// when it has since been archived.
    pub fn from_existing(existing: &TimeEntryWithProject, projects: &[Project]) -> Self {
        let mut options = active_options(projects);
        let project_id = existing.entry.project_id;
        if !options.iter().any(|p| p.id == project_id) {
            let current = projects
                .iter()
                .find(|p| p.id == project_id)
                .map(ProjectSummary::from)
                .or_else(|| existing.project.clone());
            if let Some(current) = current {
                options.push(current);
            }
        }
        let project_index = options.iter().position(|p| p.id == project_id);

        Self {
            entry_id: Some(existing.entry.id),
            previous_date: Some(existing.entry.entry_date),
            date_state: DateInputState::new(existing.entry.entry_date),
            options,
            project_index,
            hours: existing.entry.hours.to_string(),
            notes: existing.entry.notes.clone().unwrap_or_default(),
            current_field: EntryField::Hours,
            editing: false,
        }
    }

    pub fn selected_project(&self) -> Option<&ProjectSummary> {
        self.project_index.and_then(|i| self.options.get(i))
    }

    /// Hours as typed; anything unparsable counts as zero.
    pub fn hours_value(&self) -> f64 {
        self.hours
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|h| h.is_finite())
            .map_or(0.0, |h| h.max(0.0))
    }

    pub fn estimated_earnings(&self) -> f64 {
        self.hours_value() * self.selected_project().map_or(0.0, |p| p.hourly_rate)
    }

    /// Clear the per-entry fields after a create so the next entry can be
    /// logged for the same day and project.
    pub fn reset_after_create(&mut self) {
        self.hours = DEFAULT_HOURS.to_string();
        self.notes.clear();
        self.editing = false;
        self.date_state.editing = false;
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
        if self.current_field == EntryField::Date {
            if self.editing {
                self.date_state.toggle_editing();
            } else {
                self.date_state.editing = false;
            }
        }
    }

    pub fn next_field(&mut self) {
        self.current_field = match self.current_field {
            EntryField::Date => EntryField::Project,
            EntryField::Project => EntryField::Hours,
            EntryField::Hours => EntryField::Notes,
            EntryField::Notes => EntryField::Date,
        };
    }

    pub fn previous_field(&mut self) {
        self.current_field = match self.current_field {
            EntryField::Date => EntryField::Notes,
            EntryField::Project => EntryField::Date,
            EntryField::Hours => EntryField::Project,
            EntryField::Notes => EntryField::Hours,
        };
    }

    fn cycle_project(&mut self, forward: bool) {
        if self.options.is_empty() {
            return;
        }
        let last = self.options.len() - 1;
        self.project_index = Some(match (self.project_index, forward) {
            (None, true) => 0,
            (None, false) => last,
            (Some(i), true) if i >= last => 0,
            (Some(i), true) => i + 1,
            (Some(0), false) => last,
            (Some(i), false) => i - 1,
        });
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        match self.current_field {
            EntryField::Date => self.date_state.handle_input(key),
            EntryField::Project => match key {
                KeyCode::Down | KeyCode::Right => self.cycle_project(true),
                KeyCode::Up | KeyCode::Left => self.cycle_project(false),
                _ => {}
            },
            EntryField::Hours => match key {
                KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => self.hours.push(c),
                KeyCode::Backspace => {
                    self.hours.pop();
                }
                _ => {}
            },
            EntryField::Notes => match key {
                KeyCode::Char(c) => self.notes.push(c),
                KeyCode::Backspace => {
                    self.notes.pop();
                }
                _ => {}
            },
        }
    }

    /// The row to write, or `None` while no project is picked.
    pub fn submit(&self) -> Option<TimeEntryInput> {
        let project = self.selected_project()?;
        let notes = self.notes.trim();
        Some(TimeEntryInput {
            project_id: project.id,
            entry_date: self.date_state.date,
            hours: self.hours_value(),
            notes: (!notes.is_empty()).then(|| notes.to_string()),
        })
    }
}

fn active_options(projects: &[Project]) -> Vec<ProjectSummary> {
    projects
        .iter()
        .filter(|p| !p.archived)
        .map(ProjectSummary::from)
        .collect()
}

pub fn render_time_entry_wizard<B: Backend>(f: &mut Frame<B>, area: Rect, state: &TimeEntryWizardState) {
    let title = if state.entry_id.is_some() {
        "Edit time entry"
    } else {
        "Log time"
    };
    let inner = render_drawer(f, area, title);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(6), Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(inner);

    let project_label = match state.selected_project() {
        Some(project) => project.name.clone(),
        None if state.options.is_empty() => "No active projects".to_string(),
        None => "Select a project".to_string(),
    };
    let fields = [
        (EntryField::Date, "Date", state.date_state.get_display_string()),
        (EntryField::Project, "Project", project_label),
        (EntryField::Hours, "Hours", state.hours.clone()),
        (EntryField::Notes, "Notes", state.notes.clone()),
    ];

    let items: Vec<ListItem> = fields
        .into_iter()
        .map(|(field, name, value)| {
            let selected = field == state.current_field;
            let value = if selected && state.editing {
                match field {
                    EntryField::Project => format!("< {value} >"),
                    EntryField::Date => value,
                    _ => format!("{value}|"),
                }
            } else {
                value
            };
            let label_style = if selected {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            let value_style = if selected && state.editing {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Spans::from(vec![
                Span::styled(format!("{name}: "), label_style),
                Span::styled(value, value_style),
            ]))
        })
        .collect();
    f.render_widget(
        List::new(items).block(Block::default().borders(Borders::ALL).title("Entry details")),
        chunks[0],
    );

    let (rate, currency) = state
        .selected_project()
        .map_or((0.0, "USD"), |p| (p.hourly_rate, p.currency.as_str()));
    let estimate = Paragraph::new(vec![
        Spans::from(format!("Rate: {rate:.2} {currency}/h")),
        Spans::from(Span::styled(
            format!("Estimated: {:.2} {currency}", state.estimated_earnings()),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
    ])
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(estimate, chunks[1]);

    let help_text = if !state.editing {
        "Enter - Edit field | Up/Down - Navigate fields | S - Save entry | Esc - Close"
    } else {
        match state.current_field {
            EntryField::Date => "Enter - Done | Left/Right - Switch date part | Up/Down - Shift a day",
            EntryField::Project => "Enter - Done | Up/Down - Choose project",
            _ => "Enter - Done | Esc - Stop editing",
        }
    };
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::TOP));
    f.render_widget(help, chunks[3]);
}

pub fn handle_input(state: &mut TimeEntryWizardState, key: KeyCode) -> Option<TimeEntryWizardAction> {
    match key {
        KeyCode::Esc => {
            if state.editing {
                state.toggle_editing();
            } else {
                return Some(TimeEntryWizardAction::Cancel);
            }
        }
        KeyCode::Enter => state.toggle_editing(),
        KeyCode::Up if !state.editing => state.previous_field(),
        KeyCode::Down | KeyCode::Tab if !state.editing => state.next_field(),
        KeyCode::Char('s') if !state.editing => {
            return state.submit().map(|input| TimeEntryWizardAction::Save {
                id: state.entry_id,
                previous_date: state.previous_date,
                input,
            });
        }
        _ if state.editing => state.edit_current_field(key),
        _ => {}
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::tests::{entry, project};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn pick_first_project(state: &mut TimeEntryWizardState) {
        state.current_field = EntryField::Project;
        handle_input(state, KeyCode::Enter);
        handle_input(state, KeyCode::Down);
        handle_input(state, KeyCode::Enter);
    }

    #[test]
    fn no_project_means_no_save() {
        let mut state = TimeEntryWizardState::new(date("2024-03-06"), &[project("Acme", false)]);

        assert!(state.selected_project().is_none());
        assert!(handle_input(&mut state, KeyCode::Char('s')).is_none());
    }

    #[test]
    fn picker_offers_only_active_projects() {
        let projects = [project("Acme", false), project("Old", true), project("Globex", false)];
        let state = TimeEntryWizardState::new(date("2024-03-06"), &projects);

        let names: Vec<&str> = state.options.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Acme", "Globex"]);
    }

    #[test]
    fn create_uses_default_hours() {
        let projects = [project("Acme", false)];
        let mut state = TimeEntryWizardState::new(date("2024-03-06"), &projects);
        pick_first_project(&mut state);

        match handle_input(&mut state, KeyCode::Char('s')) {
            Some(TimeEntryWizardAction::Save { id, previous_date, input }) => {
                assert!(id.is_none());
                assert!(previous_date.is_none());
                assert_eq!(input.project_id, projects[0].id);
                assert_eq!(input.entry_date, date("2024-03-06"));
                assert_eq!(input.hours, 8.0);
                assert!(input.notes.is_none());
            }
            _ => panic!("expected a save"),
        }
        assert_eq!(state.estimated_earnings(), 400.0);
    }

    #[test]
    fn unparsable_hours_count_as_zero() {
        let mut state = TimeEntryWizardState::new(date("2024-03-06"), &[project("Acme", false)]);

        state.hours = "1.5.2".to_string();
        assert_eq!(state.hours_value(), 0.0);
        state.hours = String::new();
        assert_eq!(state.hours_value(), 0.0);
        state.hours = "2.5".to_string();
        assert_eq!(state.hours_value(), 2.5);
    }

    #[test]
    fn reset_after_create_keeps_date_and_project() {
        let mut state = TimeEntryWizardState::new(date("2024-03-06"), &[project("Acme", false)]);
        pick_first_project(&mut state);
        state.hours = "3".to_string();
        state.notes = "Standup".to_string();

        state.reset_after_create();

        assert_eq!(state.hours, "8.0");
        assert!(state.notes.is_empty());
        assert!(state.selected_project().is_some());
        assert_eq!(state.date_state.date, date("2024-03-06"));
    }

    #[test]
    fn editing_keeps_an_archived_project_selectable() {
        let old = project("Old", true);
        let mut existing = entry(Some(&ProjectSummary::from(&old)), "2024-03-04", 2.0);
        existing.entry.project_id = old.id;
        existing.entry.notes = Some("Migration".to_string());

        let mut state = TimeEntryWizardState::from_existing(&existing, &[project("Acme", false), old.clone()]);

        assert_eq!(state.selected_project().unwrap().id, old.id);
        assert_eq!(state.options.len(), 2);

        state.current_field = EntryField::Date;
        handle_input(&mut state, KeyCode::Enter);
        handle_input(&mut state, KeyCode::Up);
        handle_input(&mut state, KeyCode::Enter);

        match handle_input(&mut state, KeyCode::Char('s')) {
            Some(TimeEntryWizardAction::Save { id, previous_date, input }) => {
                assert_eq!(id, Some(existing.entry.id));
                assert_eq!(previous_date, Some(date("2024-03-04")));
                assert_eq!(input.entry_date, date("2024-03-05"));
                assert_eq!(input.hours, 2.0);
                assert_eq!(input.notes.as_deref(), Some("Migration"));
            }
            _ => panic!("expected a save"),
        }
    }
}
