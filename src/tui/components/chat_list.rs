//! # Chat List Component
//!
//! Full-screen overlay for browsing conversations and starting new ones.
//! Opened with Ctrl+O, dismissed with Esc.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `ChatListState` lives in `TuiState`
//! - `ChatList` is created each frame with borrowed state

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph};

use crate::service::{Chat, ChatKind};
use crate::tui::event::TuiEvent;
use crate::tui::theme::Theme;

/// Persistent state for the chat list overlay.
pub struct ChatListState {
    pub chats: Vec<Chat>,
    pub selected: usize,
    /// Title buffer while naming a new chat ('n' toggles this mode).
    pub naming: Option<String>,
    pub list_state: ListState,
}

impl ChatListState {
    pub fn new(chats: Vec<Chat>, active_chat: Option<&str>) -> Self {
        let selected = active_chat
            .and_then(|id| chats.iter().position(|c| c.id == id))
            .unwrap_or(0);
        let mut list_state = ListState::default();
        if !chats.is_empty() {
            list_state.select(Some(selected));
        }
        Self {
            chats,
            selected,
            naming: None,
            list_state,
        }
    }

    /// Handle a key event, returning a ChatListEvent if the overlay should act.
    pub fn handle_event(&mut self, event: &TuiEvent) -> Option<ChatListEvent> {
        // Naming mode captures all text input until Enter or Esc
        if let Some(title) = self.naming.as_mut() {
            return match event {
                TuiEvent::InputChar(c) => {
                    title.push(*c);
                    None
                }
                TuiEvent::Backspace => {
                    title.pop();
                    None
                }
                TuiEvent::Submit => {
                    let title = self.naming.take().unwrap_or_default();
                    (!title.trim().is_empty()).then(|| ChatListEvent::Create(title))
                }
                TuiEvent::Escape => {
                    self.naming = None;
                    None
                }
                _ => None,
            };
        }

        match event {
            TuiEvent::Escape => Some(ChatListEvent::Dismiss),
            TuiEvent::ScrollUp => {
                if !self.chats.is_empty() {
                    self.selected = self.selected.saturating_sub(1);
                    self.list_state.select(Some(self.selected));
                }
                None
            }
            TuiEvent::ScrollDown => {
                if !self.chats.is_empty() {
                    self.selected = (self.selected + 1).min(self.chats.len() - 1);
                    self.list_state.select(Some(self.selected));
                }
                None
            }
            TuiEvent::Submit => self
                .chats
                .get(self.selected)
                .map(|chat| ChatListEvent::Open(chat.id.clone())),
            TuiEvent::InputChar('n') => {
                self.naming = Some(String::new());
                None
            }
            _ => None,
        }
    }
}

/// Events emitted by the chat list.
pub enum ChatListEvent {
    Open(String),
    Create(String),
    Dismiss,
}

/// Transient render wrapper for the chat list overlay.
pub struct ChatList<'a> {
    state: &'a mut ChatListState,
    theme: Theme,
}

impl<'a> ChatList<'a> {
    pub fn new(state: &'a mut ChatListState, theme: Theme) -> Self {
        Self { state, theme }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(80, 70, area);
        frame.render_widget(Clear, overlay);

        let help_text = if self.state.naming.is_some() {
            " Type a title | Enter Create  Esc Cancel "
        } else {
            " n New  Enter Open  Esc Back "
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.panel_border))
            .title(" Conversations ")
            .title_alignment(Alignment::Left)
            .title_bottom(Line::from(help_text).centered())
            .padding(Padding::horizontal(1));

        if let Some(title) = &self.state.naming {
            let prompt = Paragraph::new(Line::from(vec![
                Span::styled("New chat: ", Style::default().fg(self.theme.text_muted)),
                Span::styled(title.clone(), Style::default().fg(self.theme.text)),
                Span::styled("▏", Style::default().fg(self.theme.accent)),
            ]))
            .block(block);
            frame.render_widget(prompt, overlay);
            return;
        }

        if self.state.chats.is_empty() {
            let empty = Paragraph::new("No conversations yet. Press n to start one.")
                .style(Style::default().fg(self.theme.text_muted))
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(empty, overlay);
            return;
        }

        let items: Vec<ListItem> = self
            .state
            .chats
            .iter()
            .enumerate()
            .map(|(i, chat)| {
                let marker = match chat.kind {
                    ChatKind::Insight => "◆ ",
                    ChatKind::Regular => "  ",
                };

                let inner_width = overlay.width.saturating_sub(4) as usize; // borders + padding
                let title = truncate_str(&chat.title, inner_width.saturating_sub(marker.len()));

                let style = if i == self.state.selected {
                    Style::default()
                        .fg(self.theme.text)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else {
                    Style::default().fg(self.theme.text_muted)
                };

                ListItem::new(Line::from(vec![
                    Span::styled(marker, Style::default().fg(self.theme.accent)),
                    Span::styled(title, style),
                ]))
            })
            .collect();

        let list = List::new(items).block(block);
        frame.render_stateful_widget(list, overlay, &mut self.state.list_state);
    }
}

/// Truncate a string to fit within `max_width` chars, adding "..." if needed.
fn truncate_str(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        ".".repeat(max_width)
    } else {
        let cut: String = s.chars().take(max_width - 3).collect();
        format!("{cut}...")
    }
}

/// Compute a centered rect using percentage of the outer rect.
pub fn centered_rect(percent_x: u16, percent_y: u16, outer: Rect) -> Rect {
    let [_, center_v, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(outer);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(center_v);
    center
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ChatListState {
        ChatListState::new(
            vec![
                Chat::regular("a", "First"),
                Chat::regular("b", "Second"),
                Chat::insight("c", "Dip", "why?"),
            ],
            Some("b"),
        )
    }

    #[test]
    fn starts_on_the_active_chat() {
        let state = state();
        assert_eq!(state.selected, 1);
    }

    #[test]
    fn arrows_move_selection_and_enter_opens() {
        let mut state = state();
        state.handle_event(&TuiEvent::ScrollDown);
        assert_eq!(state.selected, 2);
        state.handle_event(&TuiEvent::ScrollDown); // clamped at end
        assert_eq!(state.selected, 2);

        match state.handle_event(&TuiEvent::Submit) {
            Some(ChatListEvent::Open(id)) => assert_eq!(id, "c"),
            _ => panic!("expected Open"),
        }
    }

    #[test]
    fn naming_mode_collects_a_title() {
        let mut state = state();
        state.handle_event(&TuiEvent::InputChar('n'));
        assert!(state.naming.is_some());

        for c in "Q3 numbers".chars() {
            state.handle_event(&TuiEvent::InputChar(c));
        }
        state.handle_event(&TuiEvent::Backspace);
        match state.handle_event(&TuiEvent::Submit) {
            Some(ChatListEvent::Create(title)) => assert_eq!(title, "Q3 number"),
            _ => panic!("expected Create"),
        }
        assert!(state.naming.is_none());
    }

    #[test]
    fn escape_cancels_naming_before_dismissing() {
        let mut state = state();
        state.handle_event(&TuiEvent::InputChar('n'));
        assert!(state.handle_event(&TuiEvent::Escape).is_none());
        assert!(state.naming.is_none());
        assert!(matches!(
            state.handle_event(&TuiEvent::Escape),
            Some(ChatListEvent::Dismiss)
        ));
    }

    #[test]
    fn empty_title_is_not_created() {
        let mut state = state();
        state.handle_event(&TuiEvent::InputChar('n'));
        state.handle_event(&TuiEvent::InputChar(' '));
        assert!(state.handle_event(&TuiEvent::Submit).is_none());
    }
}
