use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::ui::components::confirm::centered_rect;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignInStage {
    Email,
    Code,
}

pub struct SignInState {
    pub email: String,
    pub code: String,
    pub stage: SignInStage,
}

pub enum SignInAction {
    Quit,
    SendMagicLink(String),
    CompleteSignIn { email: String, input: String },
}

impl SignInState {
    pub fn new() -> Self {
        Self {
            email: String::new(),
            code: String::new(),
            stage: SignInStage::Email,
        }
    }

    /// Called once the link went out; the code field takes over.
    pub fn link_sent(&mut self) {
        self.stage = SignInStage::Code;
        self.code.clear();
    }

    fn active_field(&mut self) -> &mut String {
        match self.stage {
            SignInStage::Email => &mut self.email,
            SignInStage::Code => &mut self.code,
        }
    }
}

pub fn render_sign_in<B: Backend>(frame: &mut Frame<B>, area: Rect, state: &SignInState) {
    let card = centered_rect(60, 70, area);
    let block = Block::default()
        .title("Sign in")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(card);
    frame.render_widget(block, card);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(2),
        ])
        .split(inner);

    let heading = Paragraph::new(vec![
        Spans::from(Span::styled("HOURBASE", Style::default().fg(Color::Gray))),
        Spans::from(Span::styled(
            "Welcome back",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(heading, chunks[0]);

    let email_active = state.stage == SignInStage::Email;
    frame.render_widget(
        input_box("Email address", &state.email, "you@example.com", email_active),
        chunks[1],
    );

    if state.stage == SignInStage::Code {
        frame.render_widget(
            input_box(
                "Code or magic link from the email",
                &state.code,
                "123456",
                true,
            ),
            chunks[2],
        );
    }

    let note = match state.stage {
        SignInStage::Email => "No password needed. We'll email you a secure link to sign in instantly.",
        SignInStage::Code => {
            "Check your inbox. Type the one-time code, or paste the whole link from the email."
        }
    };
    frame.render_widget(
        Paragraph::new(note)
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        chunks[3],
    );

    let help = match state.stage {
        SignInStage::Email => "Enter - Email me a magic link | Esc - Quit",
        SignInStage::Code => "Enter - Sign in | Esc - Change email",
    };
    frame.render_widget(
        Paragraph::new(help)
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center),
        chunks[4],
    );
}

fn input_box<'a>(label: &'a str, value: &'a str, placeholder: &'a str, active: bool) -> Paragraph<'a> {
    let text = if value.is_empty() {
        Span::styled(placeholder, Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(value)
    };
    let mut spans = vec![text];
    if active {
        spans.push(Span::raw("|"));
    }
    let border = if active { Color::Yellow } else { Color::Gray };

    Paragraph::new(Spans::from(spans)).block(
        Block::default()
            .title(label)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    )
}

pub fn handle_input(state: &mut SignInState, key: KeyCode) -> Option<SignInAction> {
    match key {
        KeyCode::Esc => match state.stage {
            SignInStage::Email => return Some(SignInAction::Quit),
            SignInStage::Code => state.stage = SignInStage::Email,
        },
        KeyCode::Enter => {
            return Some(match state.stage {
                SignInStage::Email => SignInAction::SendMagicLink(state.email.trim().to_string()),
                SignInStage::Code => SignInAction::CompleteSignIn {
                    email: state.email.trim().to_string(),
                    input: state.code.trim().to_string(),
                },
            });
        }
        KeyCode::Char(c) => state.active_field().push(c),
        KeyCode::Backspace => {
            state.active_field().pop();
        }
        _ => {}
    }
    None
}
