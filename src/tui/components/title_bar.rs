//! # TitleBar Component
//!
//! Top status line: the active chat's title, a transient status message,
//! and the key hints. Purely presentational — all fields are props, so it
//! renders exactly what it is given.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::tui::component::Component;
use crate::tui::theme::Theme;

const KEY_HINTS: &str = "^O chats  ^U attach  ^T theme  ^C quit";

pub struct TitleBar {
    /// Active chat title, or a placeholder when no chat is open
    pub chat_title: String,
    /// Transient status (e.g. "Theme: light")
    pub status_message: String,
    pub theme: Theme,
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(
            self.chat_title.clone(),
            Style::default()
                .fg(self.theme.text)
                .add_modifier(Modifier::BOLD),
        )];
        if !self.status_message.is_empty() {
            spans.push(Span::styled(
                format!("  {}", self.status_message),
                Style::default().fg(self.theme.text_muted),
            ));
        }

        // Right-align the hints if there's room
        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let pad = (area.width as usize).saturating_sub(used + KEY_HINTS.len());
        if pad > 1 {
            spans.push(Span::raw(" ".repeat(pad)));
            spans.push(Span::styled(
                KEY_HINTS,
                Style::default()
                    .fg(self.theme.text_muted)
                    .add_modifier(Modifier::DIM),
            ));
        }

        frame.render_widget(Line::from(spans), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn render_to_string(bar: &mut TitleBar, width: u16) -> String {
        let backend = TestBackend::new(width, 1);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| bar.render(f, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn shows_title_and_status() {
        let mut bar = TitleBar {
            chat_title: "General questions".to_string(),
            status_message: "Theme: light".to_string(),
            theme: Theme::dark(),
        };
        let text = render_to_string(&mut bar, 100);
        assert!(text.contains("General questions"));
        assert!(text.contains("Theme: light"));
        assert!(text.contains("^O chats"));
    }

    #[test]
    fn hints_dropped_on_narrow_terminals() {
        let mut bar = TitleBar {
            chat_title: "A fairly long conversation title".to_string(),
            status_message: String::new(),
            theme: Theme::dark(),
        };
        let text = render_to_string(&mut bar, 40);
        assert!(text.contains("conversation title"));
        assert!(!text.contains("^O chats"));
    }
}
