//! # InputBox Component
//!
//! Text entry for the active chat. The text itself is NOT owned here: it
//! is the session's draft, passed in by the caller for both editing and
//! rendering. That split is what keeps the draft alive across chat
//! switches and failed sends — Enter emits `Submit` without touching the
//! buffer, and only the reducer clears it (on a successful input-origin
//! send).
//!
//! ## Responsibilities
//!
//! - Edit the draft (insert, backspace, delete, cursor movement, paste)
//! - Emit `Submit` on Enter
//! - Internal scrolling once the draft exceeds the visible line limit

mod cursor;
mod text_wrap;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Paragraph};

use crate::tui::event::TuiEvent;
use crate::tui::theme::Theme;

use cursor::CursorState;
use text_wrap::{
    MAX_VISIBLE_LINES, VERTICAL_OVERHEAD, inner_width, next_char_boundary, prev_char_boundary,
    wrap_line_count, wrap_options,
};

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Enter pressed. The draft is left in place; the reducer decides
    /// whether (and when) it gets cleared.
    Submit,
    /// Text content changed
    ContentChanged,
}

/// Text input over an external draft buffer.
pub struct InputBox {
    /// Cursor position and scroll offset (see `CursorState`)
    cursor: CursorState,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            cursor: CursorState::new(),
        }
    }

    /// Reset cursor tracking, for when the caller swaps in a different
    /// draft (chat switch).
    pub fn reset_cursor(&mut self) {
        self.cursor = CursorState::new();
    }

    /// Required height for the draft, clamped to the visible line limit.
    pub fn calculate_height(&self, buffer: &str, content_width: u16) -> u16 {
        let width = inner_width(content_width);
        let content_lines = wrap_line_count(buffer, width);
        content_lines.min(MAX_VISIBLE_LINES) + VERTICAL_OVERHEAD
    }

    /// The slice of the draft visible at the current scroll offset.
    fn visible_text(&self, buffer: &str, content_width: u16) -> String {
        if self.cursor.scroll_offset == 0 {
            return buffer.to_string();
        }

        let width = inner_width(content_width);
        if width == 0 {
            return String::new();
        }

        let lines = textwrap::wrap(buffer, wrap_options(width));
        let start = self.cursor.scroll_offset as usize;
        let end = (start + MAX_VISIBLE_LINES as usize).min(lines.len());
        lines[start..end].join("\n")
    }

    fn render_scrollbar(&self, frame: &mut Frame, area: Rect, buffer: &str) {
        use ratatui::widgets::{Scrollbar, ScrollbarOrientation, ScrollbarState};

        let width = inner_width(area.width);
        let total_lines = wrap_line_count(buffer, width);
        if total_lines <= MAX_VISIBLE_LINES {
            return;
        }

        // ScrollbarState content_length is max scrollable position, not total items
        let max_scroll = total_lines.saturating_sub(MAX_VISIBLE_LINES);
        let mut scrollbar_state = ScrollbarState::default()
            .content_length(max_scroll as usize)
            .position(self.cursor.scroll_offset as usize);

        let scrollbar_area = Rect {
            x: area.x + area.width.saturating_sub(1),
            y: area.y + 1,
            width: 1,
            height: area.height.saturating_sub(2),
        };

        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            scrollbar_area,
            &mut scrollbar_state,
        );
    }

    /// Draw the input box. `sending` dims the border and suppresses the
    /// cursor, signalling that submission is disabled while a reply is in
    /// flight.
    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        buffer: &str,
        theme: Theme,
        sending: bool,
    ) {
        self.cursor.clamp(buffer);
        self.cursor.update_scroll_offset(buffer, area.width);

        let border_style = if sending {
            Style::default()
                .fg(theme.text_muted)
                .add_modifier(Modifier::DIM)
        } else {
            Style::default().fg(theme.panel_border)
        };
        let title = if sending { " waiting… " } else { " message " };

        let block = Block::bordered()
            .border_type(ratatui::widgets::BorderType::Rounded)
            .border_style(border_style)
            .title(title);

        let input = Paragraph::new(self.visible_text(buffer, area.width))
            .block(block)
            .style(Style::default().fg(theme.text));

        frame.render_widget(input, area);
        self.render_scrollbar(frame, area, buffer);

        if !sending {
            let (cursor_x, cursor_y) = self.cursor.screen_pos(buffer, area);
            frame.set_cursor_position((cursor_x, cursor_y));
        }
    }

    /// Apply one terminal event to the draft.
    pub fn handle_event(&mut self, event: &TuiEvent, buffer: &mut String) -> Option<InputEvent> {
        self.cursor.clamp(buffer);
        match event {
            TuiEvent::InputChar(c) => {
                buffer.insert(self.cursor.pos, *c);
                self.cursor.pos += c.len_utf8();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                buffer.insert_str(self.cursor.pos, text);
                self.cursor.pos += text.len();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Backspace => {
                if self.cursor.pos > 0 {
                    let prev = prev_char_boundary(buffer, self.cursor.pos);
                    buffer.drain(prev..self.cursor.pos);
                    self.cursor.pos = prev;
                    Some(InputEvent::ContentChanged)
                } else {
                    None
                }
            }
            TuiEvent::Delete => {
                if self.cursor.pos < buffer.len() {
                    let next = next_char_boundary(buffer, self.cursor.pos);
                    buffer.drain(self.cursor.pos..next);
                    Some(InputEvent::ContentChanged)
                } else {
                    None
                }
            }
            TuiEvent::CursorLeft => {
                if self.cursor.pos > 0 {
                    self.cursor.pos = prev_char_boundary(buffer, self.cursor.pos);
                    Some(InputEvent::ContentChanged)
                } else {
                    None
                }
            }
            TuiEvent::CursorRight => {
                if self.cursor.pos < buffer.len() {
                    self.cursor.pos = next_char_boundary(buffer, self.cursor.pos);
                    Some(InputEvent::ContentChanged)
                } else {
                    None
                }
            }
            TuiEvent::CursorHome => {
                let line_start = buffer[..self.cursor.pos]
                    .rfind('\n')
                    .map(|i| i + 1)
                    .unwrap_or(0);
                (self.cursor.pos != line_start).then(|| {
                    self.cursor.pos = line_start;
                    InputEvent::ContentChanged
                })
            }
            TuiEvent::CursorEnd => {
                let line_end = buffer[self.cursor.pos..]
                    .find('\n')
                    .map(|i| self.cursor.pos + i)
                    .unwrap_or(buffer.len());
                (self.cursor.pos != line_end).then(|| {
                    self.cursor.pos = line_end;
                    InputEvent::ContentChanged
                })
            }
            TuiEvent::Submit => Some(InputEvent::Submit),
            _ => None,
        }
    }
}
