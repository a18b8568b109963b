//! Transient notifications stacked in the top-right corner.

use std::time::{Duration, Instant};

use tui::{
    backend::Backend,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// How long a toast stays up unless dismissed.
pub const TOAST_TTL: Duration = Duration::from_secs(5);

const TOAST_WIDTH: u16 = 44;
const MAX_VISIBLE: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Clone, Debug)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    shown_at: Instant,
}

#[derive(Default)]
pub struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    pub fn show(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.show_at(message, kind, Instant::now());
    }

    fn show_at(&mut self, message: impl Into<String>, kind: ToastKind, now: Instant) {
        self.items.push(Toast {
            message: message.into(),
            kind,
            shown_at: now,
        });
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.show(message, ToastKind::Success);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.show(message, ToastKind::Error);
    }

    /// Close the most recent toast.
    pub fn dismiss_latest(&mut self) -> bool {
        self.items.pop().is_some()
    }

    /// Drop toasts older than [`TOAST_TTL`].
    pub fn expire(&mut self, now: Instant) {
        self.items
            .retain(|t| now.saturating_duration_since(t.shown_at) < TOAST_TTL);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Toast] {
        &self.items
    }
}

pub fn render_toasts<B: Backend>(frame: &mut Frame<B>, area: Rect, toasts: &Toasts) {
    let width = TOAST_WIDTH.min(area.width);
    let x = area.x + area.width - width;
    let mut y = area.y + 1;

    for toast in toasts.items().iter().rev().take(MAX_VISIBLE) {
        let (color, title) = match toast.kind {
            ToastKind::Success => (Color::Green, "Done"),
            ToastKind::Error => (Color::Red, "Error"),
        };
        // Message lines plus borders; long messages wrap.
        let inner_width = usize::from(width.saturating_sub(2)).max(1);
        let lines = toast.message.chars().count().div_ceil(inner_width).max(1);
        let height = u16::try_from(lines).unwrap_or(u16::MAX).saturating_add(2);
        if y + height > area.y + area.height {
            break;
        }

        let toast_area = Rect::new(x, y, width, height);
        let body = Paragraph::new(Spans::from(Span::raw(toast.message.clone())))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(Span::styled(title, Style::default().add_modifier(Modifier::BOLD)))
                    .border_style(Style::default().fg(color)),
            )
            .style(Style::default().fg(color));

        frame.render_widget(Clear, toast_area);
        frame.render_widget(body, toast_area);
        y += height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toasts_expire_after_ttl() {
        let mut toasts = Toasts::default();
        let start = Instant::now();
        toasts.show_at("Saved", ToastKind::Success, start);
        toasts.show_at("Later", ToastKind::Error, start + Duration::from_secs(3));

        toasts.expire(start + TOAST_TTL);

        assert_eq!(toasts.items().len(), 1);
        assert_eq!(toasts.items()[0].message, "Later");
    }

    #[test]
    fn dismiss_latest_closes_the_newest() {
        let mut toasts = Toasts::default();
        toasts.success("one");
        toasts.error("two");

        assert!(toasts.dismiss_latest());

        assert_eq!(toasts.items().len(), 1);
        assert_eq!(toasts.items()[0].kind, ToastKind::Success);
        assert!(toasts.dismiss_latest());
        assert!(toasts.is_empty());
        assert!(!toasts.dismiss_latest());
    }
}
