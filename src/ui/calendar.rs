use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{BarChart, Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};
use uuid::Uuid;

use crate::cache::Entries;
use crate::dashboard::{self, total_billable, total_hours};
use crate::models::{Project, TimeEntryInput, TimeEntryWithProject};
use crate::period::week_containing;
use crate::ui::components::confirm::{centered_rect, render_confirmation};
use crate::ui::components::date_input::DateInputState;
use crate::ui::time_entry_wizard::{self, TimeEntryWizardAction, TimeEntryWizardState};

pub struct CalendarState {
    selected_date: NaiveDate,
    today: NaiveDate,
    entries: Entries,
    week_entries: Entries,
    projects: Arc<Vec<Project>>,
    table_state: TableState,
    show_delete_confirmation: bool,
    pub wizard: Option<TimeEntryWizardState>,
    pub jump: Option<DateInputState>,
}

pub enum CalendarAction {
    /// The selected day changed; its entries and week need loading.
    Load(NaiveDate),
    Create(TimeEntryInput),
    Update {
        id: Uuid,
        previous_date: NaiveDate,
        input: TimeEntryInput,
    },
    Delete {
        id: Uuid,
        entry_date: NaiveDate,
    },
}

impl CalendarState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            selected_date: today,
            today,
            entries: Arc::default(),
            week_entries: Arc::default(),
            projects: Arc::default(),
            table_state: TableState::default(),
            show_delete_confirmation: false,
            wizard: None,
            jump: None,
        }
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    pub fn set_data(&mut self, entries: Entries, week_entries: Entries, projects: Arc<Vec<Project>>) {
        let selected_id = self.selected_entry().map(|e| e.entry.id);
        self.entries = entries;
        self.week_entries = week_entries;
        self.projects = projects;

        let index = selected_id
            .and_then(|id| self.entries.iter().position(|e| e.entry.id == id))
            .or(if self.entries.is_empty() { None } else { Some(0) });
        self.table_state.select(index);
    }

    pub fn selected_entry(&self) -> Option<&TimeEntryWithProject> {
        self.table_state.selected().and_then(|i| self.entries.get(i))
    }

    /// Hours per day, Sunday first, for the week holding the selected day.
    pub fn week_hours(&self) -> Vec<(NaiveDate, f64)> {
        let week = week_containing(self.selected_date);
        dashboard::daily_hours(&self.week_entries, week.start, 7)
    }

    pub fn captures_text(&self) -> bool {
        self.wizard.is_some() || self.jump.is_some() || self.show_delete_confirmation
    }

    fn select_date(&mut self, date: NaiveDate) -> Option<CalendarAction> {
        if date == self.selected_date {
            return None;
        }
        self.selected_date = date;
        self.table_state.select(None);
        Some(CalendarAction::Load(date))
    }

    fn next(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) if i + 1 < self.entries.len() => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    fn previous(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(0) | None => self.entries.len() - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }
}

pub fn render_calendar<B: Backend>(frame: &mut Frame<B>, area: Rect, state: &mut CalendarState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(9),
                Constraint::Min(5),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);

    let mut title = vec![Span::styled(
        state.selected_date.format("%A, %B %-d, %Y").to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if state.selected_date == state.today {
        title.push(Span::styled("  (today)", Style::default().fg(Color::Cyan)));
    }
    title.push(Span::styled(
        format!(
            "    {:.2}h logged, {:.2} billable",
            total_hours(&state.entries),
            total_billable(&state.entries)
        ),
        Style::default().fg(Color::Gray),
    ));
    let header = Paragraph::new(Spans::from(title)).block(Block::default().title("Calendar").borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    render_week_strip(frame, chunks[1], state);
    render_entries(frame, chunks[2], state);

    let help = if state.selected_entry().is_some() {
        "<Left/Right> Day | <T> Today | <G> Go to date | <N> Log time | <E> Edit | <D> Delete"
    } else {
        "<Left/Right> Day | <T> Today | <G> Go to date | <N> Log time"
    };
    frame.render_widget(
        Paragraph::new(help)
            .block(Block::default().borders(Borders::TOP))
            .style(Style::default().fg(Color::White)),
        chunks[3],
    );

    if let Some(jump) = &state.jump {
        let popup = centered_rect(40, 20, area);
        let text = Paragraph::new(vec![
            Spans::from(""),
            Spans::from(Span::styled(
                jump.get_display_string(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )),
            Spans::from(""),
            Spans::from("Enter - Go | Esc - Cancel"),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().title("Go to date").borders(Borders::ALL));
        frame.render_widget(Clear, popup);
        frame.render_widget(text, popup);
    }

    if let Some(wizard) = &state.wizard {
        time_entry_wizard::render_time_entry_wizard(frame, area, wizard);
    }

    if state.show_delete_confirmation {
        let message = state.selected_entry().map_or_else(String::new, |e| {
            format!("Delete {:.2}h on {}?", e.entry.hours, e.project_name())
        });
        render_confirmation(frame, area, "Delete time entry", &message);
    }
}

fn render_week_strip<B: Backend>(frame: &mut Frame<B>, area: Rect, state: &CalendarState) {
    let week = state.week_hours();
    let labels: Vec<String> = week
        .iter()
        .map(|(date, _)| {
            let marker = if *date == state.selected_date { "*" } else { "" };
            format!("{}{}", date.format("%a %-d"), marker)
        })
        .collect();
    // Bars are drawn in tenths of an hour.
    let data: Vec<(&str, u64)> = labels
        .iter()
        .zip(week.iter())
        .map(|(label, (_, hours))| (label.as_str(), (hours * 10.0).round() as u64))
        .collect();

    let bar_width = (area.width.saturating_sub(2) / 7).saturating_sub(1).max(3);
    let chart = BarChart::default()
        .block(Block::default().title("This week (tenths of an hour)").borders(Borders::ALL))
        .data(&data)
        .bar_width(bar_width)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
    frame.render_widget(chart, area);
}

fn render_entries<B: Backend>(frame: &mut Frame<B>, area: Rect, state: &mut CalendarState) {
    if state.entries.is_empty() {
        let empty = Paragraph::new("Nothing logged for this day. Press <N> to log time.")
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().title("Entries").borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    }

    let rows: Vec<Row> = state
        .entries
        .iter()
        .map(|e| {
            let currency = e.project.as_ref().map_or("USD", |p| p.currency.as_str());
            Row::new(vec![
                Cell::from(e.project_name().to_string()),
                Cell::from(format!("{:.2}", e.entry.hours)),
                Cell::from(format!("{:.2} {currency}", e.earnings())),
                Cell::from(e.entry.notes.clone().unwrap_or_default()),
            ])
        })
        .collect();

    let table = Table::new(rows)
        .header(
            Row::new(vec!["Project", "Hours", "Earnings", "Notes"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().title("Entries").borders(Borders::ALL))
        .widths(&[
            Constraint::Percentage(30),
            Constraint::Percentage(12),
            Constraint::Percentage(20),
            Constraint::Percentage(38),
        ])
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_stateful_widget(table, area, &mut state.table_state);
}

pub fn handle_input(state: &mut CalendarState, key: KeyCode) -> Option<CalendarAction> {
    if let Some(wizard) = state.wizard.as_mut() {
        return match time_entry_wizard::handle_input(wizard, key)? {
            TimeEntryWizardAction::Cancel => {
                state.wizard = None;
                None
            }
            TimeEntryWizardAction::Save {
                id: Some(id),
                previous_date,
                input,
            } => Some(CalendarAction::Update {
                id,
                previous_date: previous_date.unwrap_or(input.entry_date),
                input,
            }),
            TimeEntryWizardAction::Save { id: None, input, .. } => Some(CalendarAction::Create(input)),
        };
    }

    if let Some(jump) = state.jump.as_mut() {
        match key {
            KeyCode::Enter => {
                let date = jump.date;
                state.jump = None;
                return state.select_date(date);
            }
            KeyCode::Esc => state.jump = None,
            other => jump.handle_input(other),
        }
        return None;
    }

    if state.show_delete_confirmation {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                state.show_delete_confirmation = false;
                return state.selected_entry().map(|e| CalendarAction::Delete {
                    id: e.entry.id,
                    entry_date: e.entry.entry_date,
                });
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => state.show_delete_confirmation = false,
            _ => {}
        }
        return None;
    }

    match key {
        KeyCode::Left => return state.select_date(state.selected_date - Duration::days(1)),
        KeyCode::Right => return state.select_date(state.selected_date + Duration::days(1)),
        KeyCode::Char('t') => return state.select_date(state.today),
        KeyCode::Char('g') => {
            let mut jump = DateInputState::new(state.selected_date);
            jump.toggle_editing();
            state.jump = Some(jump);
        }
        KeyCode::Char('n') => {
            state.wizard = Some(TimeEntryWizardState::new(state.selected_date, &state.projects));
        }
        KeyCode::Char('e') | KeyCode::Enter => {
            if let Some(entry) = state.selected_entry() {
                state.wizard = Some(TimeEntryWizardState::from_existing(entry, &state.projects));
            }
        }
        KeyCode::Char('d') => {
            if state.selected_entry().is_some() {
                state.show_delete_confirmation = true;
            }
        }
        KeyCode::Down => state.next(),
        KeyCode::Up => state.previous(),
        _ => {}
    }
    None
}
