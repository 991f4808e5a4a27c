use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Padding, Paragraph, Widget, Wrap};

use crate::core::timeline::time_label;
use crate::service::{Message, Role};
use crate::tui::component::Component;
use crate::tui::markdown;
use crate::tui::theme::Theme;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

/// One message bubble: a rounded bordered block with the role label on the
/// top edge, the clock time on the bottom edge, and the markdown-rendered
/// content inside. Attached documents get a trailing reference line.
///
/// `Bubble` is a **transient component**: created fresh each frame with the
/// data it needs to render. Height prediction and rendering build the same
/// `Paragraph`, so the parent's layout cache stays exact.
#[derive(Clone, Copy)]
pub struct Bubble<'a> {
    pub message: &'a Message,
    pub theme: Theme,
}

impl<'a> Bubble<'a> {
    pub fn new(message: &'a Message, theme: Theme) -> Self {
        Self { message, theme }
    }

    /// The styled body: markdown content plus the document-reference line.
    fn body(message: &Message, theme: Theme) -> Text<'static> {
        let mut text = markdown::render(&message.content, theme.text);

        if !message.docs.is_empty() {
            let names: Vec<&str> = message.docs.iter().map(|d| d.name.as_str()).collect();
            text.lines.push(Line::from(Span::styled(
                format!("📎 {}", names.join(", ")),
                Style::default()
                    .fg(theme.text_muted)
                    .add_modifier(Modifier::ITALIC),
            )));
        }
        if !message.tags.is_empty() {
            let names: Vec<String> =
                message.tags.iter().map(|t| format!("#{}", t.name)).collect();
            text.lines.push(Line::from(Span::styled(
                names.join(" "),
                Style::default().fg(theme.accent),
            )));
        }
        text
    }

    /// Calculate the height required for this message given a width.
    ///
    /// Builds the same wrapped `Paragraph` the render path does and asks
    /// ratatui how many rows it occupies, so markdown (tables, code fences)
    /// is measured exactly rather than approximated.
    pub fn calculate_height(message: &Message, width: u16, theme: Theme) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            // Terminal too narrow for borders + padding; still occupy a row.
            return 1;
        }

        let body = Self::body(message, theme);
        let paragraph = Paragraph::new(body).wrap(Wrap { trim: false });
        let lines = paragraph.line_count(content_width) as u16;
        lines.max(1) + VERTICAL_OVERHEAD
    }
}

impl<'a> Widget for Bubble<'a> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let (label, border_color, label_alignment) = match self.message.role {
            Role::User => ("you", self.theme.user_border, Alignment::Right),
            Role::Assistant => ("assistant", self.theme.assistant_border, Alignment::Left),
        };
        let border_style = Style::default().fg(border_color);

        let block = Block::bordered()
            .title(Line::styled(format!(" {label} "), border_style).alignment(label_alignment))
            .title_bottom(
                Line::styled(
                    format!(" {} ", time_label(self.message.created_at)),
                    Style::default()
                        .fg(self.theme.text_muted)
                        .add_modifier(Modifier::DIM),
                )
                .alignment(Alignment::Right),
            )
            .border_type(ratatui::widgets::BorderType::Rounded)
            .border_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let inner_area = block.inner(area);
        block.render(area, buf);

        let paragraph =
            Paragraph::new(Self::body(self.message, self.theme)).wrap(Wrap { trim: false });
        paragraph.render(inner_area, buf);
    }
}

/// `Bubble` is stateless; the `&mut self` required by the trait is a no-op
/// and rendering is delegated to the [`Widget`] implementation.
impl<'a> Component for Bubble<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(*self, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::DocumentRef;

    #[test]
    fn height_includes_borders() {
        let msg = Message::user("hello");
        assert_eq!(
            Bubble::calculate_height(&msg, 80, Theme::dark()),
            1 + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn height_grows_when_content_wraps() {
        let msg = Message::user("a line that is definitely going to wrap at narrow widths");
        let wide = Bubble::calculate_height(&msg, 80, Theme::dark());
        let narrow = Bubble::calculate_height(&msg, 20, Theme::dark());
        assert!(narrow > wide);
    }

    #[test]
    fn zero_width_returns_minimum() {
        let msg = Message::user("hello");
        assert_eq!(Bubble::calculate_height(&msg, 0, Theme::dark()), 1);
        assert_eq!(
            Bubble::calculate_height(&msg, HORIZONTAL_OVERHEAD, Theme::dark()),
            1
        );
    }

    #[test]
    fn docs_add_a_reference_line() {
        let bare = Message::user("report attached");
        let with_doc = Message::user("report attached").with_docs(vec![DocumentRef {
            name: "q3.pdf".to_string(),
            url: None,
        }]);
        let h_bare = Bubble::calculate_height(&bare, 80, Theme::dark());
        let h_doc = Bubble::calculate_height(&with_doc, 80, Theme::dark());
        assert_eq!(h_doc, h_bare + 1);
    }

    #[test]
    fn table_markdown_measured_exactly() {
        let msg = Message::assistant(
            "| A | B |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |",
        );
        // header + rule + 2 rows = 4 lines
        assert_eq!(
            Bubble::calculate_height(&msg, 80, Theme::dark()),
            4 + VERTICAL_OVERHEAD
        );
    }
}
