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

use crate::models::{Project, ProjectInput};
use crate::ui::components::drawer::render_drawer;

pub enum ProjectWizardAction {
    Cancel,
    Save {
        id: Option<Uuid>,
        input: ProjectInput,
    },
}

#[derive(Clone, PartialEq, Copy, Debug)]
pub enum ProjectField {
    Name,
    Description,
    HourlyRate,
    Currency,
}

pub struct ProjectWizardState {
    /// Set when editing an existing project.
    pub project_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub hourly_rate: String,
    pub currency: String,
    pub current_field: ProjectField,
    pub editing: bool,
    pub error: Option<String>,
}

impl ProjectWizardState {
    pub fn new() -> Self {
        Self {
            project_id: None,
            name: String::new(),
            description: String::new(),
            hourly_rate: "0".to_string(),
            currency: "USD".to_string(),
            current_field: ProjectField::Name,
            editing: false,
            error: None,
        }
    }

    pub fn from_existing(project: &Project) -> Self {
        Self {
            project_id: Some(project.id),
            name: project.name.clone(),
            description: project.description.clone().unwrap_or_default(),
            hourly_rate: project.hourly_rate.to_string(),
            currency: project.currency.clone(),
            current_field: ProjectField::Name,
            editing: false,
            error: None,
        }
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
    }

    pub fn next_field(&mut self) {
        self.current_field = match self.current_field {
            ProjectField::Name => ProjectField::Description,
            ProjectField::Description => ProjectField::HourlyRate,
            ProjectField::HourlyRate => ProjectField::Currency,
            ProjectField::Currency => ProjectField::Name,
        };
    }

    pub fn previous_field(&mut self) {
        self.current_field = match self.current_field {
            ProjectField::Name => ProjectField::Currency,
            ProjectField::Description => ProjectField::Name,
            ProjectField::HourlyRate => ProjectField::Description,
            ProjectField::Currency => ProjectField::HourlyRate,
        };
    }

    fn field_mut(&mut self) -> &mut String {
        match self.current_field {
            ProjectField::Name => &mut self.name,
            ProjectField::Description => &mut self.description,
            ProjectField::HourlyRate => &mut self.hourly_rate,
            ProjectField::Currency => &mut self.currency,
        }
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        let field = self.current_field;
        match key {
            KeyCode::Char(c) => match field {
                ProjectField::HourlyRate if !(c.is_ascii_digit() || c == '.') => {}
                ProjectField::Currency if !c.is_ascii_alphabetic() || self.currency.len() >= 3 => {}
                ProjectField::Currency => self.currency.push(c.to_ascii_uppercase()),
                _ => self.field_mut().push(c),
            },
            KeyCode::Backspace => {
                self.field_mut().pop();
            }
            _ => {}
        }
    }

    pub fn validate(&self) -> Result<ProjectInput, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Name is required".to_string());
        }

        let hourly_rate = self
            .hourly_rate
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|rate| rate.is_finite() && *rate >= 0.0)
            .ok_or_else(|| "Hourly rate must be a number of zero or more".to_string())?;

        let currency = self.currency.trim().to_ascii_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err("Currency must be a three-letter code such as USD".to_string());
        }

        let description = self.description.trim();
        Ok(ProjectInput {
            name: name.to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            hourly_rate,
            currency,
        })
    }
}

pub fn render_project_wizard<B: Backend>(f: &mut Frame<B>, area: Rect, state: &ProjectWizardState) {
    let title = if state.project_id.is_some() {
        "Edit project"
    } else {
        "New project"
    };
    let inner = render_drawer(f, area, title);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(6), Constraint::Length(2), Constraint::Length(3)].as_ref())
        .split(inner);

    render_form(f, state, chunks[0]);

    if let Some(error) = &state.error {
        let error = Paragraph::new(error.as_str())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });
        f.render_widget(error, chunks[1]);
    }

    let help_text = if state.editing {
        "Enter - Save field | Esc - Stop editing"
    } else {
        "Enter - Edit field | Up/Down - Navigate fields | S - Save project | Esc - Cancel"
    };
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::TOP));
    f.render_widget(help, chunks[2]);
}

fn render_form<B: Backend>(f: &mut Frame<B>, state: &ProjectWizardState, area: Rect) {
    let fields = [
        (ProjectField::Name, "Name", state.name.as_str()),
        (ProjectField::Description, "Description", state.description.as_str()),
        (ProjectField::HourlyRate, "Hourly rate", state.hourly_rate.as_str()),
        (ProjectField::Currency, "Currency", state.currency.as_str()),
    ];

    let items: Vec<ListItem> = fields
        .iter()
        .map(|(field, name, value)| {
            let selected = *field == state.current_field;
            let content = if selected && state.editing {
                Spans::from(vec![
                    Span::styled(format!("{name}: "), Style::default().fg(Color::Yellow)),
                    Span::styled(
                        format!("{value}|"),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ])
            } else {
                let style = if selected {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                Spans::from(vec![
                    Span::styled(format!("{name}: "), style),
                    Span::raw(value.to_string()),
                ])
            };
            ListItem::new(content)
        })
        .collect();

    let form = List::new(items).block(Block::default().borders(Borders::ALL).title("Project details"));
    f.render_widget(form, area);
}

pub fn handle_input(state: &mut ProjectWizardState, key: KeyCode) -> Option<ProjectWizardAction> {
    match key {
        KeyCode::Esc => {
            if state.editing {
                state.toggle_editing();
            } else {
                return Some(ProjectWizardAction::Cancel);
            }
        }
        KeyCode::Enter => state.toggle_editing(),
        KeyCode::Up if !state.editing => state.previous_field(),
        KeyCode::Down | KeyCode::Tab if !state.editing => state.next_field(),
        KeyCode::Char('s') if !state.editing => match state.validate() {
            Ok(input) => {
                state.error = None;
                return Some(ProjectWizardAction::Save {
                    id: state.project_id,
                    input,
                });
            }
            Err(message) => state.error = Some(message),
        },
        _ if state.editing => state.edit_current_field(key),
        _ => {}
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::tests::project;

    fn type_into(state: &mut ProjectWizardState, field: ProjectField, text: &str) {
        state.current_field = field;
        state.editing = true;
        for c in text.chars() {
            handle_input(state, KeyCode::Char(c));
        }
        handle_input(state, KeyCode::Enter);
    }

    #[test]
    fn saving_requires_a_name() {
        let mut state = ProjectWizardState::new();

        assert!(handle_input(&mut state, KeyCode::Char('s')).is_none());
        assert_eq!(state.error.as_deref(), Some("Name is required"));

        type_into(&mut state, ProjectField::Name, "Acme");
        match handle_input(&mut state, KeyCode::Char('s')) {
            Some(ProjectWizardAction::Save { id, input }) => {
                assert!(id.is_none());
                assert_eq!(input.name, "Acme");
                assert_eq!(input.currency, "USD");
                assert_eq!(input.hourly_rate, 0.0);
                assert!(input.description.is_none());
            }
            _ => panic!("expected a save"),
        }
        assert!(state.error.is_none());
    }

    #[test]
    fn currency_is_upper_cased_and_capped() {
        let mut state = ProjectWizardState::new();
        state.currency.clear();

        type_into(&mut state, ProjectField::Currency, "eu1rx");

        assert_eq!(state.currency, "EUR");
    }

    #[test]
    fn short_currency_is_rejected() {
        let mut state = ProjectWizardState::new();
        state.name = "Acme".to_string();
        state.currency = "EU".to_string();

        assert_eq!(
            state.validate().unwrap_err(),
            "Currency must be a three-letter code such as USD"
        );
    }

    #[test]
    fn rate_accepts_only_numbers() {
        let mut state = ProjectWizardState::new();
        state.name = "Acme".to_string();
        state.hourly_rate.clear();

        type_into(&mut state, ProjectField::HourlyRate, "-12a5.5");
        assert_eq!(state.hourly_rate, "125.5");
        assert_eq!(state.validate().unwrap().hourly_rate, 125.5);

        state.hourly_rate = "1.2.3".to_string();
        assert!(state.validate().is_err());
    }

    #[test]
    fn editing_keeps_the_project_id() {
        let existing = project("Acme", false);
        let mut state = ProjectWizardState::from_existing(&existing);
        type_into(&mut state, ProjectField::Description, "Retainer");

        match handle_input(&mut state, KeyCode::Char('s')) {
            Some(ProjectWizardAction::Save { id, input }) => {
                assert_eq!(id, Some(existing.id));
                assert_eq!(input.name, "Acme");
                assert!(input.description.unwrap().ends_with("Retainer"));
            }
            _ => panic!("expected a save"),
        }
    }

    #[test]
    fn escape_leaves_editing_before_cancelling() {
        let mut state = ProjectWizardState::new();
        handle_input(&mut state, KeyCode::Enter);
        assert!(state.editing);

        assert!(handle_input(&mut state, KeyCode::Esc).is_none());
        assert!(matches!(
            handle_input(&mut state, KeyCode::Esc),
            Some(ProjectWizardAction::Cancel)
        ));
    }
}
