use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::router::Route;

pub const SIDEBAR_WIDTH: u16 = 24;

pub fn render_sidebar<B: Backend>(
    frame: &mut Frame<B>,
    area: Rect,
    active: Route,
    email: Option<&str>,
) {
    let block = Block::default().borders(Borders::RIGHT);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(5),
        ])
        .split(inner);

    let brand = Paragraph::new(vec![
        Spans::from(Span::styled("HOURBASE", Style::default().fg(Color::Gray))),
        Spans::from(Span::styled(
            "Control Center",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ]);
    frame.render_widget(brand, chunks[0]);

    let items: Vec<ListItem> = Route::NAV
        .iter()
        .enumerate()
        .map(|(i, route)| {
            let style = if *route == active {
                Style::default()
                    .bg(Color::White)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Spans::from(vec![
                Span::styled(format!(" {} ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(format!("{:<14}", route.label()), style),
            ]))
        })
        .collect();
    frame.render_widget(List::new(items), chunks[1]);

    let footer = Paragraph::new(vec![
        Spans::from(Span::styled(
            email.unwrap_or("Signed in").to_string(),
            Style::default().fg(Color::Gray),
        )),
        Spans::from(""),
        Spans::from("<L> Sign out"),
        Spans::from("<Q> Quit"),
    ])
    .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[2]);
}
