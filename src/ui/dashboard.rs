use chrono::NaiveDate;
use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{BarChart, Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::dashboard::{DashboardSummary, DayTotal};
use crate::period::{DateRange, Period};
use crate::ui::components::confirm::centered_rect;
use crate::ui::components::date_input::DateInputState;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CustomField {
    Start,
    End,
}

pub struct CustomRangeState {
    pub start: DateInputState,
    pub end: DateInputState,
    pub focus: CustomField,
    pub error: Option<String>,
}

impl CustomRangeState {
    fn new(range: DateRange) -> Self {
        let mut start = DateInputState::new(range.start);
        start.toggle_editing();
        Self {
            start,
            end: DateInputState::new(range.end),
            focus: CustomField::Start,
            error: None,
        }
    }

    fn switch_focus(&mut self) {
        self.focus = match self.focus {
            CustomField::Start => CustomField::End,
            CustomField::End => CustomField::Start,
        };
        self.start.editing = false;
        self.end.editing = false;
        match self.focus {
            CustomField::Start => self.start.toggle_editing(),
            CustomField::End => self.end.toggle_editing(),
        }
    }

    fn active(&mut self) -> &mut DateInputState {
        match self.focus {
            CustomField::Start => &mut self.start,
            CustomField::End => &mut self.end,
        }
    }
}

pub struct DashboardState {
    pub period: Period,
    pub range: DateRange,
    pub summary: Option<DashboardSummary>,
    pub custom: Option<CustomRangeState>,
    today: NaiveDate,
}

pub enum DashboardAction {
    /// Show the summary for this range, from cache when possible.
    Load(DateRange),
    /// Drop cached data and reload the range.
    Refresh(DateRange),
}

impl DashboardState {
    pub fn new(today: NaiveDate) -> Self {
        let period = Period::Week;
        let range = period
            .range(today)
            .unwrap_or(DateRange { start: today, end: today });
        Self {
            period,
            range,
            summary: None,
            custom: None,
            today,
        }
    }

    pub fn captures_text(&self) -> bool {
        self.custom.is_some()
    }

    fn select_period(&mut self, period: Period) -> Option<DashboardAction> {
        let range = period.range(self.today)?;
        self.period = period;
        self.range = range;
        Some(DashboardAction::Load(range))
    }
}

pub fn render_dashboard<B: Backend>(frame: &mut Frame<B>, area: Rect, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(5),
                Constraint::Min(8),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);

    render_period_tabs(frame, chunks[0], state);

    match &state.summary {
        Some(summary) => {
            render_stats(frame, chunks[1], summary);
            render_charts(frame, chunks[2], summary);
        }
        None => {
            let loading = Paragraph::new("Loading...")
                .style(Style::default().fg(Color::Gray))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(loading, chunks[1]);
        }
    }

    let help = Paragraph::new("<Left/Right> Period | <C> Custom range | <R> Refresh")
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));
    frame.render_widget(help, chunks[3]);

    if let Some(custom) = &state.custom {
        render_custom_range(frame, area, custom);
    }
}

fn render_period_tabs<B: Backend>(frame: &mut Frame<B>, area: Rect, state: &DashboardState) {
    let mut titles: Vec<Spans> = Period::PRESETS.iter().map(|p| Spans::from(p.label())).collect();
    titles.push(Spans::from(Period::Custom.label()));

    let selected = Period::PRESETS
        .iter()
        .position(|p| *p == state.period)
        .unwrap_or(Period::PRESETS.len());

    let tabs = Tabs::new(titles)
        .select(selected)
        .block(Block::default().borders(Borders::ALL).title(format!(
            "Dashboard: {} to {}",
            state.range.start.format("%b %-d, %Y"),
            state.range.end.format("%b %-d, %Y")
        )))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, area);
}

fn render_stats<B: Backend>(frame: &mut Frame<B>, area: Rect, summary: &DashboardSummary) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4].as_ref())
        .split(area);

    let by_currency: Vec<Spans> = if summary.billable_by_currency.is_empty() {
        vec![Spans::from("-")]
    } else {
        summary
            .billable_by_currency
            .iter()
            .map(|(currency, amount)| Spans::from(format!("{amount:.2} {currency}")))
            .collect()
    };

    let stats = [
        (
            "Hours",
            vec![
                big(format!("{:.2}", summary.total_hours)),
                Spans::from(format!("{} entries", summary.entry_count)),
            ],
        ),
        ("Billable", vec![big(format!("{:.2}", summary.total_billable))]),
        ("By currency", by_currency),
        ("Active projects", vec![big(summary.active_projects.to_string())]),
    ];

    for ((title, lines), card) in stats.into_iter().zip(cards.iter()) {
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(paragraph, *card);
    }
}

fn big(text: String) -> Spans<'static> {
    Spans::from(Span::styled(
        text,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
}

fn render_charts<B: Backend>(frame: &mut Frame<B>, area: Rect, summary: &DashboardSummary) {
    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(area);

    let project_data: Vec<(&str, u64)> = summary
        .by_project
        .iter()
        .map(|p| (p.name.as_str(), whole_units(p.earnings)))
        .collect();
    render_bars(frame, halves[0], "Earnings by project", &project_data);

    let per_day = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(halves[1]);

    let bars = day_bars(&summary.by_day);
    let hours_data: Vec<(&str, u64)> = bars.iter().map(|b| (b.label.as_str(), b.hours_tenths)).collect();
    render_bars(frame, per_day[0], "Hours per day (tenths)", &hours_data);
    let earnings_data: Vec<(&str, u64)> = bars.iter().map(|b| (b.label.as_str(), b.earnings)).collect();
    render_bars(frame, per_day[1], "Earnings per day", &earnings_data);
}

/// One column of the per-day charts.
#[derive(Debug, PartialEq)]
struct DayBar {
    label: String,
    hours_tenths: u64,
    earnings: u64,
}

fn day_bars(by_day: &[DayTotal]) -> Vec<DayBar> {
    by_day
        .iter()
        .map(|d| DayBar {
            label: d.date.format("%m/%d").to_string(),
            hours_tenths: whole_units(d.hours * 10.0),
            earnings: whole_units(d.earnings),
        })
        .collect()
}

/// Bar charts take integers; amounts are rounded and negatives drawn as 0.
fn whole_units(value: f64) -> u64 {
    value.round().max(0.0) as u64
}

fn render_bars<B: Backend>(frame: &mut Frame<B>, area: Rect, title: &str, data: &[(&str, u64)]) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    if data.is_empty() {
        let empty = Paragraph::new("No time logged in this period")
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let count = u16::try_from(data.len()).unwrap_or(u16::MAX);
    let bar_width = (area.width.saturating_sub(2) / count).saturating_sub(1).clamp(3, 12);
    let chart = BarChart::default()
        .block(block)
        .data(data)
        .bar_width(bar_width)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
    frame.render_widget(chart, area);
}

fn render_custom_range<B: Backend>(frame: &mut Frame<B>, area: Rect, custom: &CustomRangeState) {
    let popup = centered_rect(50, 35, area);
    let field = |label: &str, input: &DateInputState, focused: bool| {
        let style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Spans::from(vec![
            Span::styled(format!("{label:<6}"), style),
            Span::raw(input.get_display_string()),
        ])
    };

    let mut lines = vec![
        Spans::from(""),
        field("From", &custom.start, custom.focus == CustomField::Start),
        field("To", &custom.end, custom.focus == CustomField::End),
        Spans::from(""),
    ];
    if let Some(error) = &custom.error {
        lines.push(Spans::from(Span::styled(error.clone(), Style::default().fg(Color::Red))));
    }
    lines.push(Spans::from("Tab - Switch | Enter - Apply | Esc - Cancel"));

    let text = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().title("Custom range").borders(Borders::ALL));
    frame.render_widget(Clear, popup);
    frame.render_widget(text, popup);
}

pub fn handle_input(state: &mut DashboardState, key: KeyCode) -> Option<DashboardAction> {
    if let Some(custom) = state.custom.as_mut() {
        match key {
            KeyCode::Esc => state.custom = None,
            KeyCode::Tab | KeyCode::BackTab => custom.switch_focus(),
            KeyCode::Enter => match DateRange::new(custom.start.date, custom.end.date) {
                Ok(range) => {
                    state.custom = None;
                    state.period = Period::Custom;
                    state.range = range;
                    return Some(DashboardAction::Load(range));
                }
                Err(message) => custom.error = Some(message),
            },
            other => custom.active().handle_input(other),
        }
        return None;
    }

    match key {
        KeyCode::Right => state.select_period(state.period.next()),
        KeyCode::Left => state.select_period(state.period.previous()),
        KeyCode::Char('c') => {
            state.custom = Some(CustomRangeState::new(state.range));
            None
        }
        KeyCode::Char('r') => Some(DashboardAction::Refresh(state.range)),
        _ => None,
    }
}
