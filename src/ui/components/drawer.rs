//! Side drawer that slides forms over the right part of a screen.

use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Clear},
    Frame,
};

/// Drawers never get narrower than this many columns.
const MIN_WIDTH: u16 = 44;

/// Right-hand area covered by the drawer.
pub fn drawer_area(area: Rect) -> Rect {
    if area.width <= MIN_WIDTH {
        return area;
    }
    let width = (area.width * 55 / 100).max(MIN_WIDTH);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(area.width - width), Constraint::Length(width)])
        .split(area)[1]
}

/// Clear the drawer area, draw its frame and return the inner area.
pub fn render_drawer<B: Backend>(frame: &mut Frame<B>, area: Rect, title: &str) -> Rect {
    let area = drawer_area(area);
    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);

    frame.render_widget(Clear, area);
    frame.render_widget(block, area);
    inner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawer_hugs_the_right_edge() {
        let area = Rect::new(0, 0, 100, 30);
        let drawer = drawer_area(area);

        assert_eq!(drawer.x + drawer.width, 100);
        assert_eq!(drawer.width, 55);
        assert_eq!(drawer.height, 30);
    }

    #[test]
    fn narrow_screens_get_a_full_width_drawer() {
        let area = Rect::new(0, 0, 40, 20);
        assert_eq!(drawer_area(area), area);
    }
}
