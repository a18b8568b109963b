use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};
use uuid::Uuid;

use crate::models::{Project, ProjectInput};
use crate::ui::components::confirm::render_confirmation;
use crate::ui::project_wizard::{self, ProjectWizardAction, ProjectWizardState};

// Represents the state of the projects screen
pub struct ProjectsState {
    projects: Vec<Project>,
    table_state: TableState,
    show_delete_confirmation: bool,
    pub wizard: Option<ProjectWizardState>,
}

pub enum ProjectAction {
    Create(ProjectInput),
    Update { id: Uuid, input: ProjectInput },
    SetArchived { id: Uuid, archived: bool },
    Delete(Uuid),
}

impl ProjectsState {
    pub fn new(projects: Vec<Project>) -> Self {
        let mut state = Self {
            projects: Vec::new(),
            table_state: TableState::default(),
            show_delete_confirmation: false,
            wizard: None,
        };
        state.set_projects(projects);
        state
    }

    /// Replace the list, keeping the selection on the same project if it is
    /// still there.
    pub fn set_projects(&mut self, projects: Vec<Project>) {
        let selected_id = self.selected_project().map(|p| p.id);
        self.projects = projects;

        let index = selected_id
            .and_then(|id| self.projects.iter().position(|p| p.id == id))
            .or(if self.projects.is_empty() { None } else { Some(0) });
        self.table_state.select(index);
    }

    pub fn next(&mut self) {
        if self.projects.is_empty() {
            return;
        }

        let i = match self.table_state.selected() {
            Some(i) if i + 1 < self.projects.len() => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.projects.is_empty() {
            return;
        }

        let i = match self.table_state.selected() {
            Some(0) | None => self.projects.len() - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }

    pub fn toggle_delete_confirmation(&mut self) {
        self.show_delete_confirmation = !self.show_delete_confirmation;
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.table_state.selected().and_then(|i| self.projects.get(i))
    }

    /// True while a form or modal owns the keyboard.
    pub fn captures_text(&self) -> bool {
        self.wizard.is_some() || self.show_delete_confirmation
    }
}

pub fn render_projects<B: Backend>(frame: &mut Frame<B>, area: Rect, state: &mut ProjectsState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(3)].as_ref())
        .split(area);

    let active = state.projects.iter().filter(|p| !p.archived).count();
    let header = Paragraph::new(format!(
        "{} projects, {} active. Set rates and currencies for each client.",
        state.projects.len(),
        active
    ))
    .style(Style::default().fg(Color::Gray))
    .block(Block::default().title("Projects").borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    if state.projects.is_empty() {
        let empty = Paragraph::new("No projects yet. Press <N> to create your first one.")
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(empty, chunks[1]);
    } else {
        let rows: Vec<Row> = state
            .projects
            .iter()
            .map(|project| {
                let status = if project.archived {
                    Span::styled("Archived", Style::default().fg(Color::DarkGray))
                } else {
                    Span::styled("Active", Style::default().fg(Color::Green))
                };
                Row::new(vec![
                    Cell::from(project.name.clone()),
                    Cell::from(project.description.clone().unwrap_or_default()),
                    Cell::from(format!("{:.2}", project.hourly_rate)),
                    Cell::from(project.currency.clone()),
                    Cell::from(status),
                ])
            })
            .collect();

        let table = Table::new(rows)
            .header(
                Row::new(vec!["Name", "Description", "Rate", "Currency", "Status"])
                    .style(Style::default().add_modifier(Modifier::BOLD)),
            )
            .block(Block::default().borders(Borders::ALL))
            .widths(&[
                Constraint::Percentage(25),
                Constraint::Percentage(35),
                Constraint::Percentage(12),
                Constraint::Percentage(12),
                Constraint::Percentage(16),
            ])
            .highlight_style(
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_stateful_widget(table, chunks[1], &mut state.table_state);
    }

    let buttons_text = match state.selected_project() {
        Some(project) if project.archived => {
            "<N> New Project | <E> Edit Project | <A> Unarchive | <D> Delete Project"
        }
        Some(_) => "<N> New Project | <E> Edit Project | <A> Archive | <D> Delete Project",
        None => "<N> New Project",
    };
    let buttons = Paragraph::new(buttons_text)
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));
    frame.render_widget(buttons, chunks[2]);

    if let Some(wizard) = &state.wizard {
        project_wizard::render_project_wizard(frame, area, wizard);
    }

    if state.show_delete_confirmation {
        let name = state.selected_project().map_or("", |p| p.name.as_str());
        render_confirmation(
            frame,
            area,
            "Delete project",
            &format!("Delete \"{name}\"? Time entries logged against it are deleted too."),
        );
    }
}

pub fn handle_input(state: &mut ProjectsState, key: KeyCode) -> Option<ProjectAction> {
    if let Some(wizard) = state.wizard.as_mut() {
        return match project_wizard::handle_input(wizard, key)? {
            ProjectWizardAction::Cancel => {
                state.wizard = None;
                None
            }
            // The form stays open until the save succeeds.
            ProjectWizardAction::Save { id: Some(id), input } => Some(ProjectAction::Update { id, input }),
            ProjectWizardAction::Save { id: None, input } => Some(ProjectAction::Create(input)),
        };
    }

    if state.show_delete_confirmation {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                state.toggle_delete_confirmation();
                return state.selected_project().map(|p| ProjectAction::Delete(p.id));
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => state.toggle_delete_confirmation(),
            _ => {}
        }
        return None;
    }

    match key {
        KeyCode::Char('n') => state.wizard = Some(ProjectWizardState::new()),
        KeyCode::Char('e') | KeyCode::Enter => {
            if let Some(project) = state.selected_project() {
                state.wizard = Some(ProjectWizardState::from_existing(project));
            }
        }
        KeyCode::Char('a') => {
            if let Some(project) = state.selected_project() {
                return Some(ProjectAction::SetArchived {
                    id: project.id,
                    archived: !project.archived,
                });
            }
        }
        KeyCode::Char('d') => {
            if state.selected_project().is_some() {
                state.toggle_delete_confirmation();
            }
        }
        KeyCode::Down => state.next(),
        KeyCode::Up => state.previous(),
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::tests::project;

    fn state() -> ProjectsState {
        ProjectsState::new(vec![project("Acme", false), project("Globex", true)])
    }

    #[test]
    fn navigation_wraps_around() {
        let mut state = state();
        assert_eq!(state.selected_project().unwrap().name, "Acme");

        handle_input(&mut state, KeyCode::Up);
        assert_eq!(state.selected_project().unwrap().name, "Globex");
        handle_input(&mut state, KeyCode::Down);
        assert_eq!(state.selected_project().unwrap().name, "Acme");
    }

    #[test]
    fn delete_needs_confirmation() {
        let mut state = state();
        let id = state.selected_project().unwrap().id;

        assert!(handle_input(&mut state, KeyCode::Char('d')).is_none());
        assert!(state.captures_text());
        assert!(handle_input(&mut state, KeyCode::Char('n')).is_none());
        assert!(!state.captures_text());

        handle_input(&mut state, KeyCode::Char('d'));
        match handle_input(&mut state, KeyCode::Char('y')) {
            Some(ProjectAction::Delete(deleted)) => assert_eq!(deleted, id),
            _ => panic!("expected a delete"),
        }
        assert!(!state.captures_text());
    }

    #[test]
    fn archive_toggles_the_flag() {
        let mut state = state();

        match handle_input(&mut state, KeyCode::Char('a')) {
            Some(ProjectAction::SetArchived { archived, .. }) => assert!(archived),
            _ => panic!("expected archive"),
        }

        state.next();
        match handle_input(&mut state, KeyCode::Char('a')) {
            Some(ProjectAction::SetArchived { archived, .. }) => assert!(!archived),
            _ => panic!("expected unarchive"),
        }
    }

    #[test]
    fn edit_opens_a_prefilled_form() {
        let mut state = state();
        handle_input(&mut state, KeyCode::Char('e'));

        let wizard = state.wizard.as_ref().unwrap();
        assert_eq!(wizard.name, "Acme");
        assert_eq!(wizard.project_id, Some(state.projects[0].id));

        match handle_input(&mut state, KeyCode::Char('s')) {
            Some(ProjectAction::Update { input, .. }) => assert_eq!(input.name, "Acme"),
            _ => panic!("expected an update"),
        }
        assert!(state.wizard.is_some());

        handle_input(&mut state, KeyCode::Esc);
        assert!(state.wizard.is_none());
    }

    #[test]
    fn reload_keeps_the_selection() {
        let mut state = state();
        state.next();
        let projects = state.projects.iter().rev().cloned().collect();

        state.set_projects(projects);

        assert_eq!(state.selected_project().unwrap().name, "Globex");

        state.set_projects(Vec::new());
        assert!(state.selected_project().is_none());
    }

    #[test]
    fn empty_list_only_offers_new() {
        let mut state = ProjectsState::new(Vec::new());

        assert!(handle_input(&mut state, KeyCode::Char('d')).is_none());
        assert!(handle_input(&mut state, KeyCode::Char('a')).is_none());
        assert!(!state.captures_text());

        handle_input(&mut state, KeyCode::Char('n'));
        assert!(state.wizard.as_ref().unwrap().project_id.is_none());
    }
}
