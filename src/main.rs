mod api;
mod cache;
mod cli;
mod config;
mod dashboard;
mod logging;
mod models;
mod period;
mod router;
mod store;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame, Terminal,
};

use crate::api::{describe_sign_in_error, ApiError, AuthClient, RestClient, SessionStore};
use crate::cache::QueryCache;
use crate::cli::Cli;
use crate::config::Config;
use crate::dashboard::DashboardSummary;
use crate::models::Session;
use crate::period::{week_containing, DateRange};
use crate::router::Route;
use crate::store::DataStore;
use crate::ui::{
    calendar::{self, render_calendar, CalendarAction, CalendarState},
    components::{
        sidebar::{render_sidebar, SIDEBAR_WIDTH},
        toast::{render_toasts, Toasts},
    },
    dashboard::{self as dashboard_screen, render_dashboard, DashboardAction, DashboardState},
    projects::{self, render_projects, ProjectAction, ProjectsState},
    sign_in::{self, render_sign_in, SignInAction, SignInState},
};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Everything the event loop may have to wait on.
enum Command {
    Quit,
    Navigate(Route),
    SignOut,
    SendMagicLink(String),
    CompleteSignIn { email: String, input: String },
    Dashboard(DashboardAction),
    Projects(ProjectAction),
    Calendar(CalendarAction),
}

impl Command {
    fn busy_label(&self) -> &'static str {
        match self {
            Command::Quit => "",
            Command::Navigate(_) => "Loading...",
            Command::SignOut => "Signing out...",
            Command::SendMagicLink(_) => "Sending magic link...",
            Command::CompleteSignIn { .. } => "Signing in...",
            Command::Dashboard(_) | Command::Calendar(CalendarAction::Load(_)) => "Loading...",
            Command::Projects(_) | Command::Calendar(_) => "Saving...",
        }
    }
}

// Main application state
struct AppState {
    auth: Arc<AuthClient>,
    store: DataStore,
    session_rx: watch::Receiver<Option<Session>>,
    screen: Route,
    toasts: Toasts,
    busy: Option<&'static str>,
    sign_in_state: Option<SignInState>,
    dashboard_state: Option<DashboardState>,
    projects_state: Option<ProjectsState>,
    calendar_state: Option<CalendarState>,
}

impl AppState {
    fn new(auth: Arc<AuthClient>, store: DataStore, screen: Route) -> Self {
        Self {
            session_rx: auth.subscribe(),
            auth,
            store,
            screen,
            toasts: Toasts::default(),
            busy: None,
            sign_in_state: None,
            dashboard_state: None,
            projects_state: None,
            calendar_state: None,
        }
    }

    /// True while the current screen has a form or modal open, so the
    /// global shortcuts stay out of the way.
    fn captures_text(&self) -> bool {
        match self.screen {
            Route::Auth => true,
            Route::Dashboard => self.dashboard_state.as_ref().is_some_and(DashboardState::captures_text),
            Route::Projects => self.projects_state.as_ref().is_some_and(ProjectsState::captures_text),
            Route::Calendar => self.calendar_state.as_ref().is_some_and(CalendarState::captures_text),
        }
    }

    fn reset_screens(&mut self) {
        self.sign_in_state = None;
        self.dashboard_state = None;
        self.projects_state = None;
        self.calendar_state = None;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.env_file.as_deref())?;
    let _log_guard = logging::init(&config.log_dir, cli.verbose)?;
    info!(url = %config.supabase_url, "starting hourbase");

    let http = api::http_client(&config)?;
    let auth = Arc::new(AuthClient::new(&config, http.clone(), SessionStore::new(&config.session_path)));
    let rest = RestClient::new(&config, http, Arc::clone(&auth));
    let store = DataStore::new(rest, QueryCache::new(config.cache_ttl));

    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start(&mut terminal, auth, store, &cli.open).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        error!(error = %err, "exiting with error");
        println!("Error: {err}");
    }
    result
}

async fn start<B: Backend>(
    terminal: &mut Terminal<B>,
    auth: Arc<AuthClient>,
    store: DataStore,
    open: &str,
) -> Result<()> {
    terminal.draw(|f| render_splash(f, "Checking session..."))?;
    let user = auth.resolve_session().await;
    let screen = router::resolve(open, user.is_some());
    info!(signed_in = user.is_some(), route = screen.path(), "session resolved");

    let mut app_state = AppState::new(auth, store, screen);
    load_screen(&mut app_state).await;
    run_app(terminal, &mut app_state).await
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app_state: &mut AppState) -> Result<()> {
    loop {
        app_state.toasts.expire(Instant::now());

        if app_state.session_rx.has_changed().unwrap_or(false) {
            let signed_in = app_state.session_rx.borrow_and_update().is_some();
            on_session_change(app_state, signed_in).await;
        }

        terminal.draw(|f| draw(f, app_state))?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind == KeyEventKind::Release {
            continue;
        }

        let Some(command) = handle_key(app_state, key) else {
            continue;
        };
        if matches!(command, Command::Quit) {
            break;
        }

        app_state.busy = Some(command.busy_label());
        terminal.draw(|f| draw(f, app_state))?;
        run_command(app_state, command).await;
        app_state.busy = None;
    }

    info!("quitting");
    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn handle_key(app_state: &mut AppState, key: KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }

    if !app_state.captures_text() {
        match key.code {
            KeyCode::Char(c @ '1'..='3') => {
                let index = c as usize - '1' as usize;
                return Some(Command::Navigate(Route::NAV[index]));
            }
            KeyCode::Char('l') | KeyCode::Char('L') => return Some(Command::SignOut),
            KeyCode::Char('q') | KeyCode::Char('Q') => return Some(Command::Quit),
            KeyCode::Esc if !app_state.toasts.is_empty() => {
                app_state.toasts.dismiss_latest();
                return None;
            }
            _ => {}
        }
    }

    match app_state.screen {
        Route::Auth => {
            let state = app_state.sign_in_state.get_or_insert_with(SignInState::new);
            sign_in::handle_input(state, key.code).map(|action| match action {
                SignInAction::Quit => Command::Quit,
                SignInAction::SendMagicLink(email) => Command::SendMagicLink(email),
                SignInAction::CompleteSignIn { email, input } => Command::CompleteSignIn { email, input },
            })
        }
        Route::Dashboard => app_state
            .dashboard_state
            .as_mut()
            .and_then(|state| dashboard_screen::handle_input(state, key.code))
            .map(Command::Dashboard),
        Route::Projects => app_state
            .projects_state
            .as_mut()
            .and_then(|state| projects::handle_input(state, key.code))
            .map(Command::Projects),
        Route::Calendar => app_state
            .calendar_state
            .as_mut()
            .and_then(|state| calendar::handle_input(state, key.code))
            .map(Command::Calendar),
    }
}

async fn run_command(app_state: &mut AppState, command: Command) {
    let result = match command {
        Command::Quit => Ok(()),
        Command::Navigate(route) => {
            app_state.screen = router::guard(route, app_state.auth.is_signed_in());
            load_screen(app_state).await;
            Ok(())
        }
        Command::SignOut => sign_out(app_state).await,
        Command::SendMagicLink(email) => match app_state.auth.send_magic_link(&email).await {
            Ok(()) => {
                if let Some(state) = &mut app_state.sign_in_state {
                    state.link_sent();
                }
                app_state.toasts.success("Magic link sent! Check your inbox.");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "magic link request failed");
                app_state.toasts.error(describe_sign_in_error(&err));
                Ok(())
            }
        },
        Command::CompleteSignIn { email, input } => match app_state.auth.complete_sign_in(&email, &input).await {
            Ok(session) => {
                let who = session.user.email.unwrap_or(email);
                app_state.toasts.success(format!("Signed in as {who}"));
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "sign-in failed");
                app_state.toasts.error(describe_sign_in_error(&err));
                Ok(())
            }
        },
        Command::Dashboard(action) => handle_dashboard_action(app_state, action).await,
        Command::Projects(action) => handle_projects_action(app_state, action).await,
        Command::Calendar(action) => handle_calendar_action(app_state, action).await,
    };

    if let Err(err) = result {
        report_error(app_state, err).await;
    }
}

/// Show a failed call to the user. A rejected token ends the session.
async fn report_error(app_state: &mut AppState, err: ApiError) {
    error!(error = %err, "request failed");
    if app_state.auth.end_session_if_rejected(&err).await {
        app_state.toasts.error("Your session has expired. Please sign in again.");
        return;
    }
    app_state.toasts.error(err.to_string());
}

async fn sign_out(app_state: &mut AppState) -> Result<(), ApiError> {
    app_state.auth.sign_out().await?;
    app_state.toasts.success("Signed out");
    Ok(())
}

/// Re-route after sign-in or sign-out, wherever it came from.
async fn on_session_change(app_state: &mut AppState, signed_in: bool) {
    let route = router::guard(app_state.screen, signed_in);
    if !signed_in {
        app_state.store.clear();
        app_state.reset_screens();
    } else if route == app_state.screen {
        // A token refresh; nothing to re-route.
        return;
    }
    app_state.screen = route;
    load_screen(app_state).await;
}

/// Make sure the current screen has state and fresh data.
async fn load_screen(app_state: &mut AppState) {
    let result = match app_state.screen {
        Route::Auth => {
            app_state.sign_in_state.get_or_insert_with(SignInState::new);
            Ok(())
        }
        Route::Dashboard => {
            let range = app_state
                .dashboard_state
                .get_or_insert_with(|| DashboardState::new(today()))
                .range;
            load_dashboard(app_state, range).await
        }
        Route::Projects => load_projects(app_state).await,
        Route::Calendar => {
            let date = app_state
                .calendar_state
                .get_or_insert_with(|| CalendarState::new(today()))
                .selected_date();
            load_calendar(app_state, date).await
        }
    };

    if let Err(err) = result {
        report_error(app_state, err).await;
    }
}

// Dashboard

async fn load_dashboard(app_state: &mut AppState, range: DateRange) -> Result<(), ApiError> {
    let entries = app_state.store.entries_in_range(range.start, range.end).await?;
    if entries.len() >= api::rest::RANGE_LIMIT {
        warn!(start = %range.start, end = %range.end, "range hit the row limit; totals are partial");
    }
    let projects = app_state.store.projects().await?;
    let summary = DashboardSummary::build(&entries, &projects);

    if let Some(state) = &mut app_state.dashboard_state {
        state.summary = Some(summary);
    }
    Ok(())
}

async fn handle_dashboard_action(app_state: &mut AppState, action: DashboardAction) -> Result<(), ApiError> {
    match action {
        DashboardAction::Load(range) => load_dashboard(app_state, range).await,
        DashboardAction::Refresh(range) => {
            app_state.store.clear();
            load_dashboard(app_state, range).await
        }
    }
}

// Projects

async fn load_projects(app_state: &mut AppState) -> Result<(), ApiError> {
    let projects = app_state.store.projects().await?.as_ref().clone();
    match &mut app_state.projects_state {
        Some(state) => state.set_projects(projects),
        None => app_state.projects_state = Some(ProjectsState::new(projects)),
    }
    Ok(())
}

async fn handle_projects_action(app_state: &mut AppState, action: ProjectAction) -> Result<(), ApiError> {
    let message = match action {
        ProjectAction::Create(input) => {
            let project = app_state.store.create_project(&input).await?;
            info!(project_id = %project.id, "project created");
            close_project_form(app_state);
            "Project created"
        }
        ProjectAction::Update { id, input } => {
            app_state.store.update_project(id, &input).await?;
            close_project_form(app_state);
            "Project updated"
        }
        ProjectAction::SetArchived { id, archived } => {
            app_state.store.set_project_archived(id, archived).await?;
            if archived {
                "Project archived"
            } else {
                "Project restored"
            }
        }
        ProjectAction::Delete(id) => {
            app_state.store.delete_project(id).await?;
            info!(project_id = %id, "project deleted");
            "Project deleted"
        }
    };

    app_state.toasts.success(message);
    load_projects(app_state).await
}

fn close_project_form(app_state: &mut AppState) {
    if let Some(state) = &mut app_state.projects_state {
        state.wizard = None;
    }
}

// Calendar

async fn load_calendar(app_state: &mut AppState, date: NaiveDate) -> Result<(), ApiError> {
    let entries = app_state.store.entries_for(date).await?;
    let week = week_containing(date);
    let week_entries = app_state.store.entries_in_range(week.start, week.end).await?;
    let projects = app_state.store.projects().await?;

    if let Some(state) = &mut app_state.calendar_state {
        // The user may have moved on while this was loading.
        if state.selected_date() == date {
            state.set_data(entries, week_entries, projects);
        }
    }
    Ok(())
}

async fn handle_calendar_action(app_state: &mut AppState, action: CalendarAction) -> Result<(), ApiError> {
    let message = match action {
        CalendarAction::Load(date) => return load_calendar(app_state, date).await,
        CalendarAction::Create(input) => {
            app_state.store.create_entry(&input).await?;
            // The form stays open for the next entry.
            if let Some(wizard) = app_state.calendar_state.as_mut().and_then(|s| s.wizard.as_mut()) {
                wizard.reset_after_create();
            }
            "Time entry saved"
        }
        CalendarAction::Update { id, previous_date, input } => {
            app_state.store.update_entry(id, previous_date, &input).await?;
            if let Some(state) = &mut app_state.calendar_state {
                state.wizard = None;
            }
            "Time entry updated"
        }
        CalendarAction::Delete { id, entry_date } => {
            app_state.store.delete_entry(id, entry_date).await?;
            "Time entry deleted"
        }
    };

    app_state.toasts.success(message);
    let date = app_state
        .calendar_state
        .as_ref()
        .map_or_else(today, CalendarState::selected_date);
    load_calendar(app_state, date).await
}

// Rendering

fn draw<B: Backend>(f: &mut Frame<B>, app_state: &mut AppState) {
    let size = f.size();

    match app_state.screen {
        Route::Auth => {
            if let Some(state) = &app_state.sign_in_state {
                render_sign_in(f, size, state);
            }
        }
        screen => {
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)].as_ref())
                .split(size);

            let email = app_state.auth.user().and_then(|u| u.email);
            render_sidebar(f, chunks[0], screen, email.as_deref());

            match screen {
                Route::Dashboard => {
                    if let Some(state) = &app_state.dashboard_state {
                        render_dashboard(f, chunks[1], state);
                    }
                }
                Route::Projects => {
                    if let Some(state) = &mut app_state.projects_state {
                        render_projects(f, chunks[1], state);
                    }
                }
                Route::Calendar => {
                    if let Some(state) = &mut app_state.calendar_state {
                        render_calendar(f, chunks[1], state);
                    }
                }
                Route::Auth => {}
            }
        }
    }

    if let Some(label) = app_state.busy {
        let line = Rect::new(size.x, size.bottom().saturating_sub(1), size.width, 1);
        let busy = Paragraph::new(label)
            .alignment(Alignment::Right)
            .style(Style::default().fg(Color::Black).bg(Color::Yellow));
        f.render_widget(busy, line);
    }

    render_toasts(f, size, &app_state.toasts);
}

fn render_splash<B: Backend>(f: &mut Frame<B>, message: &str) {
    let size = f.size();
    let area = Rect::new(size.x, size.y + size.height / 2, size.width, 1);
    let text = Paragraph::new(message.to_string())
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    f.render_widget(text, area);
}
