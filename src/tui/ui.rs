//! Screen assembly: computes the vertical layout and draws every region.
//!
//! The layout is recomputed from scratch each frame (and by the event
//! handlers that need hit testing), so there is exactly one place that
//! decides where things are.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph};

use crate::core::session::{HistoryState, SessionView};
use crate::core::state::App;
use crate::core::timeline::today;
use crate::service::{Message, Role};
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::chat_list::centered_rect;
use crate::tui::components::{ChatList, ChipList, MessageList, TitleBar, UploadPanel};
use crate::tui::theme::Theme;

/// Resolved rects for every vertical region. Regions that are absent this
/// frame have height 0.
pub struct ScreenLayout {
    pub title: Rect,
    /// Global service error banner
    pub banner: Rect,
    pub timeline: Rect,
    /// Follow-up suggestion chips
    pub chips: Rect,
    pub uploads: Rect,
    /// Inline session error strip
    pub session_error: Rect,
    pub input: Rect,
}

/// Follow-up labels to offer: the latest assistant message's suggestions,
/// hidden while a reply is being generated.
pub fn chip_labels(app: &App, session: &SessionView) -> Vec<String> {
    if session.sending || session.history != HistoryState::Loaded {
        return Vec::new();
    }
    let messages = app.service.messages(&session.chat.id);
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant)
        .map(|m| m.follow_ups.clone())
        .unwrap_or_default()
}

pub fn compute_layout(frame_area: Rect, app: &App, tui: &TuiState) -> ScreenLayout {
    use Constraint::{Length, Min};

    let session = app.active_session();
    let banner_height = u16::from(app.service.last_error().is_some());

    let (chips_height, uploads_height, error_height, input_height) = match session {
        Some(session) => {
            let labels = chip_labels(app, session);
            (
                super::components::chip_list::chip_strip_height(&labels, frame_area.width),
                UploadPanel::height(&session.uploads),
                u16::from(session.error.is_some()),
                tui.input
                    .calculate_height(&session.draft, frame_area.width),
            )
        }
        None => (0, 0, 0, 3),
    };

    let layout = Layout::vertical([
        Length(1),
        Length(banner_height),
        Min(0),
        Length(chips_height),
        Length(uploads_height),
        Length(error_height),
        Length(input_height),
    ]);
    let [title, banner, timeline, chips, uploads, session_error, input] =
        layout.areas(frame_area);

    ScreenLayout {
        title,
        banner,
        timeline,
        chips,
        uploads,
        session_error,
        input,
    }
}

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, spinner_frame: usize) {
    let theme = Theme::of(app.theme);
    let layout = compute_layout(frame.area(), app, tui);

    // Title bar
    let chat_title = app
        .active_session()
        .map(|s| s.chat.title.clone())
        .unwrap_or_else(|| "lumen".to_string());
    let status_message = if app.service.is_booting() {
        "starting…".to_string()
    } else {
        app.status_message.clone()
    };
    let mut title_bar = TitleBar {
        chat_title,
        status_message,
        theme,
    };
    title_bar.render(frame, layout.title);

    // Global error banner
    if let Some(error) = app.service.last_error() {
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("⚠ ", Style::default().fg(theme.error)),
                Span::styled(error, Style::default().fg(theme.error)),
                Span::styled(
                    "  (^X dismiss)",
                    Style::default().fg(theme.text_muted).add_modifier(Modifier::DIM),
                ),
            ])),
            layout.banner,
        );
    }

    // Timeline
    tui.chip_rects.clear();
    match app.active_session() {
        Some(session) => {
            draw_timeline(frame, layout.timeline, app, tui, session, spinner_frame, theme);

            // Follow-up chips
            let labels = chip_labels(app, session);
            if !labels.is_empty() {
                let chip_list = ChipList {
                    labels: &labels,
                    theme,
                };
                tui.chip_rects = chip_list.render(frame, layout.chips);
            }

            // Upload progress rows
            if !session.uploads.is_empty() {
                let mut panel = UploadPanel {
                    uploads: &session.uploads,
                    theme,
                };
                panel.render(frame, layout.uploads);
            }

            // Inline session error
            if let Some(error) = &session.error {
                frame.render_widget(
                    Paragraph::new(Line::from(vec![
                        Span::styled(
                            format!("⚠ {error}"),
                            Style::default().fg(theme.error),
                        ),
                        Span::styled(
                            "  (esc dismiss)",
                            Style::default()
                                .fg(theme.text_muted)
                                .add_modifier(Modifier::DIM),
                        ),
                    ])),
                    layout.session_error,
                );
            }

            // Input box over the session draft
            tui.input
                .render(frame, layout.input, &session.draft, theme, session.sending);

            // Drop-target overlay while a file drag or the path prompt is up
            if session.drop_hover {
                draw_drop_overlay(frame, layout.timeline, theme);
            }
        }
        None => {
            let empty = Paragraph::new("No conversation selected. Press ^O to pick one.")
                .style(Style::default().fg(theme.text_muted))
                .alignment(Alignment::Center);
            frame.render_widget(empty, layout.timeline);
            tui.input.render(frame, layout.input, "", theme, true);
        }
    }

    // Overlays last, on top of everything
    if let Some(prompt) = &tui.path_prompt {
        draw_path_prompt(frame, frame.area(), prompt, theme);
    }
    if let Some(chat_list_state) = tui.chat_list.as_mut() {
        let mut chat_list = ChatList::new(chat_list_state, theme);
        chat_list.render(frame, frame.area());
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_timeline(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    tui: &mut TuiState,
    session: &SessionView,
    spinner_frame: usize,
    theme: Theme,
) {
    match session.history {
        HistoryState::NotFetched | HistoryState::Fetching => {
            let spinner = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]
                [spinner_frame % 10];
            let loading = Paragraph::new(format!("{spinner} loading conversation…"))
                .style(Style::default().fg(theme.text_muted))
                .alignment(Alignment::Center);
            frame.render_widget(loading, area);
        }
        HistoryState::Failed => {
            let failed = Paragraph::new("Could not load this conversation. Press ^O and reopen it to retry.")
                .style(Style::default().fg(theme.error))
                .alignment(Alignment::Center);
            frame.render_widget(failed, area);
        }
        HistoryState::Loaded => {
            let messages: Vec<Message> = app.service.messages(&session.chat.id);
            // Label epoch folded into the version so the periodic tick
            // re-derives day headers even when no message changed.
            let data_version = app
                .service
                .version()
                .wrapping_mul(31)
                .wrapping_add(app.label_epoch);
            let mut list = MessageList {
                state: &mut tui.message_list,
                messages: &messages,
                data_version,
                today: today(),
                thinking: session.sending,
                theme,
                spinner_frame,
            };
            list.render(frame, area);
        }
    }
}

fn draw_drop_overlay(frame: &mut Frame, area: Rect, theme: Theme) {
    let overlay = centered_rect(60, 40, area);
    frame.render_widget(Clear, overlay);
    let block = Block::bordered()
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(theme.accent));
    let hint = Paragraph::new("Drop files to attach")
        .style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(hint, overlay);
}

fn draw_path_prompt(frame: &mut Frame, area: Rect, prompt: &str, theme: Theme) {
    let overlay = centered_rect(70, 20, area);
    let overlay = Rect {
        height: 3.min(overlay.height),
        ..overlay
    };
    frame.render_widget(Clear, overlay);
    let block = Block::bordered()
        .border_style(Style::default().fg(theme.panel_border))
        .title(" attach files (paths separated by ;) ");
    let input = Paragraph::new(Line::from(vec![
        Span::styled(prompt.to_string(), Style::default().fg(theme.text)),
        Span::styled("▏", Style::default().fg(theme.accent)),
    ]))
    .block(block);
    frame.render_widget(input, overlay);
}
