//! # MessageList Component
//!
//! Scrollable view of one chat's timeline: day headers, message bubbles,
//! and the thinking indicator while a send is in flight.
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) and the frame's data.
//! Since `Component::render` takes `&mut self`, the layout cache and
//! scroll state can be updated during the render pass, aligning with
//! Ratatui's `StatefulWidget` pattern.

use chrono::NaiveDate;
use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::timeline::group_by_day;
use crate::service::Message;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::bubble::Bubble;
use crate::tui::event::TuiEvent;
use crate::tui::theme::Theme;

/// Spinner frames for the thinking indicator.
const THINKING_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// One visual row of the timeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Row {
    /// Day header ("Today", "Yesterday", ...).
    Header(String),
    /// Bubble for the message at this index.
    Bubble(usize),
    /// Thinking indicator, always last while a send is in flight.
    Thinking,
}

/// Scroll and layout state for the message list.
/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    pub scroll_state: ScrollViewState,
    pub layout: LayoutCache,
    /// When true, auto-scroll to bottom on new content
    pub stick_to_bottom: bool,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            stick_to_bottom: true, // Start attached to bottom
            viewport_height: 0,
        }
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let total: u16 = self.layout.heights.iter().sum();
        let max_y = total.saturating_sub(self.viewport_height);
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Re-engage auto-scroll if the user has scrolled back to the bottom.
    pub fn repin_if_at_bottom(&mut self) {
        let total: u16 = self.layout.heights.iter().sum();
        let max_y = total.saturating_sub(self.viewport_height);
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }
}

/// Scrollable timeline view. Created fresh each frame.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub messages: &'a [Message],
    /// Service version + label epoch, combined by the caller; any change
    /// invalidates the layout cache.
    pub data_version: u64,
    pub today: NaiveDate,
    pub thinking: bool,
    pub theme: Theme,
    pub spinner_frame: usize,
}

impl<'a> Component for MessageList<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // -1 for scrollbar safe area

        // 1. Rebuild rows + heights when the cache key changed
        let rebuilt = self.state.layout.rebuild_if_stale(
            self.messages,
            self.data_version,
            content_width,
            self.today,
            self.thinking,
            self.theme,
        );
        if rebuilt {
            // New content while pinned: follow it. (An explicit user scroll
            // away from the bottom already cleared the flag.)
            if self.state.stick_to_bottom {
                self.state.scroll_state.scroll_to_bottom();
            }
        }

        let total_height: u16 = self.state.layout.heights.iter().sum();

        // 2. Clamp scroll offset to prevent overscrolling past content
        self.state.viewport_height = area.height;
        if !self.state.stick_to_bottom {
            self.state.clamp_scroll();
        }

        let scroll_offset = self.state.scroll_state.offset().y;
        let visible_range = self.state.layout.visible_range(scroll_offset, area.height);

        // 3. Render visible rows into a ScrollView
        let mut scroll_view = ScrollView::new(Size::new(content_width, total_height.max(1)))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y_offset: u16 = if visible_range.start > 0 {
            self.state.layout.prefix_heights[visible_range.start - 1]
        } else {
            0
        };

        for i in visible_range {
            let height = self.state.layout.heights[i];
            let row_rect = Rect::new(0, y_offset, content_width, height);

            match &self.state.layout.rows[i] {
                Row::Header(label) => {
                    let header = Paragraph::new(Line::from(Span::styled(
                        format!("── {label} ──"),
                        Style::default()
                            .fg(self.theme.text_muted)
                            .add_modifier(Modifier::BOLD),
                    )))
                    .centered();
                    scroll_view.render_widget(header, row_rect);
                }
                Row::Bubble(msg_idx) => {
                    let bubble = Bubble::new(&self.messages[*msg_idx], self.theme);
                    scroll_view.render_widget(bubble, row_rect);
                }
                Row::Thinking => {
                    let frame_glyph =
                        THINKING_FRAMES[self.spinner_frame % THINKING_FRAMES.len()];
                    let indicator = Paragraph::new(Line::from(Span::styled(
                        format!("{frame_glyph} thinking…"),
                        Style::default()
                            .fg(self.theme.text_muted)
                            .add_modifier(Modifier::ITALIC),
                    )));
                    scroll_view.render_widget(indicator, row_rect);
                }
            }

            y_offset += height;
        }

        // Auto-scroll while pinned
        if self.state.stick_to_bottom {
            self.state.scroll_state.scroll_to_bottom();
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

/// EventHandler lives on `MessageListState` because event handling needs
/// persistent state (scroll position, stick_to_bottom) and `MessageList`
/// is recreated every frame.
impl EventHandler for MessageListState {
    type Event = (); // scrolling is handled internally

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
                None
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
                None
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
                None
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
                None
            }
            TuiEvent::ScrollToBottom => {
                self.scroll_state.scroll_to_bottom();
                self.stick_to_bottom = true;
                None
            }
            _ => None,
        }
    }
}

/// Row list and per-row heights, rebuilt only when the cache key changes.
///
/// The key is (data version, width, reference day, thinking flag): the
/// version covers message mutations, the day covers label rollover at
/// midnight, and the thinking flag adds/removes the indicator row.
pub struct LayoutCache {
    pub rows: Vec<Row>,
    pub heights: Vec<u16>,
    pub prefix_heights: Vec<u16>,
    key: Option<CacheKey>,
}

#[derive(PartialEq, Eq)]
struct CacheKey {
    data_version: u64,
    content_width: u16,
    today: NaiveDate,
    thinking: bool,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            heights: Vec::new(),
            prefix_heights: Vec::new(),
            key: None,
        }
    }

    /// Rebuild rows and heights if the key changed. Returns true on rebuild.
    pub fn rebuild_if_stale(
        &mut self,
        messages: &[Message],
        data_version: u64,
        content_width: u16,
        today: NaiveDate,
        thinking: bool,
        theme: Theme,
    ) -> bool {
        let key = CacheKey {
            data_version,
            content_width,
            today,
            thinking,
        };
        if self.key.as_ref() == Some(&key) {
            return false;
        }

        self.rows.clear();
        self.heights.clear();
        for section in group_by_day(messages, today) {
            self.rows.push(Row::Header(section.label.clone()));
            self.heights.push(1);
            for i in section.range {
                self.rows.push(Row::Bubble(i));
                self.heights
                    .push(Bubble::calculate_height(&messages[i], content_width, theme));
            }
        }
        if thinking {
            self.rows.push(Row::Thinking);
            self.heights.push(1);
        }
        self.rebuild_prefix_heights();
        self.key = Some(key);
        true
    }

    fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc += h;
                Some(*acc)
            })
            .collect();
    }

    /// Rows overlapping the viewport, with half a screen of buffer on each
    /// side so fast scrolls don't pop in blank rows.
    pub fn visible_range(
        &self,
        scroll_offset: u16,
        viewport_height: u16,
    ) -> std::ops::Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone, Utc};

    fn msg(y: i32, mo: u32, d: u32, h: u32) -> Message {
        let local = Local.with_ymd_and_hms(y, mo, d, h, 0, 0).single().unwrap();
        Message::user("hello").with_created_at(local.with_timezone(&Utc))
    }

    fn date(y: i32, mo: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap()
    }

    #[test]
    fn rows_interleave_headers_and_bubbles() {
        let messages = vec![msg(2024, 1, 1, 10), msg(2024, 1, 1, 15), msg(2024, 1, 2, 9)];
        let mut cache = LayoutCache::new();
        cache.rebuild_if_stale(&messages, 1, 80, date(2024, 1, 2), false, Theme::dark());
        assert_eq!(
            cache.rows,
            vec![
                Row::Header("Yesterday".to_string()),
                Row::Bubble(0),
                Row::Bubble(1),
                Row::Header("Today".to_string()),
                Row::Bubble(2),
            ]
        );
    }

    #[test]
    fn thinking_row_appended_last() {
        let messages = vec![msg(2024, 1, 2, 9)];
        let mut cache = LayoutCache::new();
        cache.rebuild_if_stale(&messages, 1, 80, date(2024, 1, 2), true, Theme::dark());
        assert_eq!(cache.rows.last(), Some(&Row::Thinking));

        // Thinking flag flip invalidates the cache
        let rebuilt =
            cache.rebuild_if_stale(&messages, 1, 80, date(2024, 1, 2), false, Theme::dark());
        assert!(rebuilt);
        assert_eq!(cache.rows.last(), Some(&Row::Bubble(0)));
    }

    #[test]
    fn cache_reused_until_key_changes() {
        let messages = vec![msg(2024, 1, 2, 9)];
        let mut cache = LayoutCache::new();
        assert!(cache.rebuild_if_stale(&messages, 1, 80, date(2024, 1, 2), false, Theme::dark()));
        // Same key: no rebuild
        assert!(!cache.rebuild_if_stale(&messages, 1, 80, date(2024, 1, 2), false, Theme::dark()));
        // Version bump: rebuild
        assert!(cache.rebuild_if_stale(&messages, 2, 80, date(2024, 1, 2), false, Theme::dark()));
        // Width change: rebuild
        assert!(cache.rebuild_if_stale(&messages, 2, 60, date(2024, 1, 2), false, Theme::dark()));
        // Day rollover: rebuild (headers re-derive)
        assert!(cache.rebuild_if_stale(&messages, 2, 60, date(2024, 1, 3), false, Theme::dark()));
        assert_eq!(cache.rows[0], Row::Header("Yesterday".to_string()));
    }

    #[test]
    fn visible_range_windows_rows() {
        let messages: Vec<Message> = (8..20).map(|h| msg(2024, 1, 2, h)).collect();
        let mut cache = LayoutCache::new();
        cache.rebuild_if_stale(&messages, 1, 80, date(2024, 1, 2), false, Theme::dark());

        let all = cache.visible_range(0, u16::MAX);
        assert_eq!(all, 0..cache.rows.len());

        let top = cache.visible_range(0, 6);
        assert!(top.start == 0);
        assert!(top.end < cache.rows.len());
    }
}
