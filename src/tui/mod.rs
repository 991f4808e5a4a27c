//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard and mouse events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm; the
//! reducer and the service layer never touch the terminal.
//!
//! ## Redraw Strategy
//!
//! The event loop uses conditional redraw to avoid unnecessary work:
//!
//! - **Animating** (history fetch, reply pending, uploads moving): draws
//!   every ~80ms for smooth spinner and gauge motion.
//! - **Idle**: sleeps up to 500ms, only redraws on events or resize.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call, making blinking cursors appear erratic during continuous redraws.

mod component;
mod components;
mod event;
pub mod markdown;
mod theme;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;

use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::session::HistoryState;
use crate::core::state::App;
use crate::service::memory::MemoryService;
use crate::service::InsightService;
use crate::tui::component::EventHandler;
use crate::tui::components::chip_list;
use crate::tui::components::{
    ChatListEvent, ChatListState, ChipRect, InputBox, InputEvent, MessageListState,
};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    // Persistent component states
    pub message_list: MessageListState,
    pub input: InputBox,
    // Chat list overlay (None = hidden)
    pub chat_list: Option<ChatListState>,
    // Attach prompt buffer (None = hidden); paths separated by ';'
    pub path_prompt: Option<String>,
    // Screen rects of the follow-up chips from the last draw, for click
    // hit testing
    pub chip_rects: Vec<ChipRect>,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            message_list: MessageListState::new(),
            input: InputBox::new(),
            chat_list: None,
            path_prompt: None,
            chip_rects: Vec::new(),
        }
    }

    /// Reset per-chat presentation state when the route changes.
    fn reset_for_chat_switch(&mut self) {
        self.message_list = MessageListState::new();
        self.input.reset_cursor();
        self.chip_rects.clear();
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Enable Kitty keyboard protocol unconditionally (allows Shift+End
        // detection). Detection via supports_keyboard_enhancement() fails in
        // WSL, but the protocol is harmlessly ignored by terminals that
        // don't support it
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,                        // Show cursor for input editing
            SetCursorStyle::SteadyBlock, // Non-blinking: avoids blink timer reset from continuous redraws
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!(
            "Terminal modes enabled (mouse, bracketed paste, steady block cursor, keyboard enhancement)"
        );
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide // Hide cursor on exit
        );
    }
}

/// Apply one action and spawn whatever async work it asked for.
fn dispatch(
    app: &mut App,
    action: Action,
    tx: &mpsc::Sender<Action>,
    config: &ResolvedConfig,
) {
    let effects = update(app, action);
    run_effects(effects, app.service.clone(), tx, config);
}

/// Spawn each effect as a background task that reports back over the
/// action channel.
fn run_effects(
    effects: Vec<Effect>,
    service: Arc<dyn InsightService>,
    tx: &mpsc::Sender<Action>,
    config: &ResolvedConfig,
) {
    for effect in effects {
        match effect {
            Effect::LoadHistory { chat_id, kind } => {
                debug!("Spawning history fetch for {chat_id}");
                let service = service.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = service.load_messages(&chat_id, kind).await;
                    if tx.send(Action::HistoryFinished { chat_id, result }).is_err() {
                        warn!("History result dropped: receiver gone");
                    }
                });
            }
            Effect::Send {
                chat_id,
                text,
                origin,
                kind,
            } => {
                debug!("Spawning send for {chat_id}");
                let service = service.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = service.send_message(&chat_id, &text, kind).await;
                    if tx
                        .send(Action::SendFinished {
                            chat_id,
                            origin,
                            result,
                        })
                        .is_err()
                    {
                        warn!("Send result dropped: receiver gone");
                    }
                });
            }
            Effect::StartUpload {
                chat_id,
                task_id,
                path,
            } => {
                info!("Spawning upload of {}", path.display());
                let service = service.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let progress_tx = tx.clone();
                    let progress_chat = chat_id.clone();
                    let progress_task = task_id.clone();
                    let on_progress: crate::service::ProgressFn = Box::new(move |percent| {
                        let _ = progress_tx.send(Action::UploadProgressed {
                            chat_id: progress_chat.clone(),
                            task_id: progress_task.clone(),
                            percent,
                        });
                    });
                    let result = service.upload_document(&chat_id, &path, on_progress).await;
                    if tx
                        .send(Action::UploadFinished {
                            chat_id,
                            task_id,
                            result,
                        })
                        .is_err()
                    {
                        warn!("Upload result dropped: receiver gone");
                    }
                });
            }
            Effect::ScheduleRemoval { chat_id, task_id } => {
                let delay = Duration::from_secs(config.upload_removal_delay_secs);
                let tx = tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(Action::UploadExpired { chat_id, task_id });
                });
            }
            Effect::CreateChat { title } => {
                let service = service.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = service.create_chat(&title).await;
                    if tx.send(Action::ChatCreated(result)).is_err() {
                        warn!("Create result dropped: receiver gone");
                    }
                });
            }
            // The reducer already set should_quit; the loop notices.
            Effect::Quit => {}
        }
    }
}

/// The chat to open on startup: the configured route, then the latest
/// insight, then the first chat in the list.
fn initial_chat(config: &ResolvedConfig, service: &Arc<dyn InsightService>) -> Option<String> {
    config
        .chat
        .clone()
        .or_else(|| service.latest_insight().map(|chat| chat.id))
        .or_else(|| service.chats().first().map(|chat| chat.id.clone()))
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let service: Arc<dyn InsightService> = Arc::new(MemoryService::with_demo_data());
    let mut app = App::new(service.clone(), config.theme);
    let mut tui = TuiState::new();

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();

    if let Some(chat_id) = initial_chat(&config, &service) {
        dispatch(&mut app, Action::OpenChat(chat_id), &tx, &config);
    }

    // Animation and label clocks
    let start_time = Instant::now();
    let tick_interval = Duration::from_secs(config.label_refresh_secs.max(1));
    let mut last_tick = Instant::now();
    let mut needs_redraw = true; // Force first frame

    loop {
        // Relative day labels ("Today", "Yesterday") go stale on their own
        if last_tick.elapsed() >= tick_interval {
            dispatch(&mut app, Action::Tick, &tx, &config);
            last_tick = Instant::now();
            needs_redraw = true;
        }

        // Determine if animations are running (spinner, gauges)
        let animating = app.active_session().is_some_and(|session| {
            session.sending
                || session.history == HistoryState::Fetching
                || session.uploads.has_active()
        });
        if animating {
            needs_redraw = true;
        }

        // Only draw when something changed
        if needs_redraw {
            let spinner_frame = (start_time.elapsed().as_secs_f32() * 12.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui, spinner_frame))?;
            needs_redraw = false;
        }

        // Dynamic poll timeout: short when animating (~12fps), long when idle
        let timeout = if animating {
            Duration::from_millis(80)
        } else {
            Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);

        // Process first event + drain ALL pending events before next draw
        if first_event.is_some() {
            needs_redraw = true;
        }
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            handle_event(event, &mut app, &mut tui, &tx, &config);
        }

        if app.should_quit {
            break;
        }

        // Handle background task completions
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {action:?}");
            dispatch(&mut app, action, &tx, &config);
        }
        if app.should_quit {
            break;
        }
    }

    ratatui::restore();
    Ok(())
}

fn handle_event(
    event: TuiEvent,
    app: &mut App,
    tui: &mut TuiState,
    tx: &mpsc::Sender<Action>,
    config: &ResolvedConfig,
) {
    // Resize just needs the redraw that's already flagged
    if matches!(event, TuiEvent::Resize) {
        return;
    }

    // Ctrl+C always quits
    if matches!(event, TuiEvent::ForceQuit) {
        dispatch(app, Action::Quit, tx, config);
        return;
    }

    // Ctrl+O opens the chat list
    if matches!(event, TuiEvent::OpenChatList) {
        tui.chat_list = Some(ChatListState::new(
            app.service.chats(),
            app.active_chat_id(),
        ));
        return;
    }

    // When the chat list is open, it owns all events
    if let Some(chat_list) = tui.chat_list.as_mut() {
        if let Some(list_event) = chat_list.handle_event(&event) {
            match list_event {
                ChatListEvent::Open(id) => {
                    tui.chat_list = None;
                    if app.active_chat_id() != Some(id.as_str()) {
                        tui.reset_for_chat_switch();
                    }
                    dispatch(app, Action::OpenChat(id), tx, config);
                }
                ChatListEvent::Create(title) => {
                    tui.chat_list = None;
                    tui.reset_for_chat_switch();
                    dispatch(app, Action::CreateChat(title), tx, config);
                }
                ChatListEvent::Dismiss => {
                    tui.chat_list = None;
                }
            }
        }
        return;
    }

    // Ctrl+U opens the attach prompt (the nearest a terminal gets to a
    // file drop). Insight chats take no attachments, so the prompt never
    // opens there.
    if matches!(event, TuiEvent::AttachFiles) {
        match app.active_session() {
            Some(session) if session.uploads_enabled() => {
                tui.path_prompt = Some(String::new());
                dispatch(app, Action::SetDropHover(true), tx, config);
            }
            Some(_) => {
                app.status_message = "Uploads are not available in insight chats".to_string();
            }
            None => {}
        }
        return;
    }

    // When the attach prompt is open, it owns text input
    if let Some(buffer) = tui.path_prompt.as_mut() {
        match event {
            TuiEvent::InputChar(c) => buffer.push(c),
            TuiEvent::Paste(text) => buffer.push_str(&text),
            TuiEvent::Backspace => {
                buffer.pop();
            }
            TuiEvent::Submit => {
                let raw = tui.path_prompt.take().unwrap_or_default();
                let paths: Vec<PathBuf> = raw
                    .split(';')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from)
                    .collect();
                dispatch(app, Action::SetDropHover(false), tx, config);
                if !paths.is_empty() {
                    dispatch(app, Action::QueueUploads(paths), tx, config);
                }
            }
            TuiEvent::Escape => {
                tui.path_prompt = None;
                dispatch(app, Action::SetDropHover(false), tx, config);
            }
            _ => {}
        }
        return;
    }

    match event {
        TuiEvent::ToggleTheme => dispatch(app, Action::ToggleTheme, tx, config),
        TuiEvent::DismissBanner => dispatch(app, Action::DismissBanner, tx, config),

        // Clicks are only meaningful on follow-up chips
        TuiEvent::MouseClick(x, y) => {
            if let Some(label) = chip_list::hit_test(&tui.chip_rects, x, y) {
                let label = label.to_string();
                dispatch(app, Action::SubmitSuggestion(label), tx, config);
            }
        }
        TuiEvent::MouseMove(_, _) => {}

        // Scrolling always goes to the timeline
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown
        | TuiEvent::ScrollToBottom => {
            tui.message_list.handle_event(&event);
        }

        // Esc dismisses the session error first, then quits
        TuiEvent::Escape => {
            if app.active_session().is_some_and(|s| s.error.is_some()) {
                dispatch(app, Action::DismissSessionError, tx, config);
            } else {
                dispatch(app, Action::Quit, tx, config);
            }
        }

        // Everything else edits the active session's draft. Editing stays
        // live while a reply is pending; only the submit is rejected (the
        // reducer refuses overlapping sends).
        other => {
            let Some(session) = app.active_session_mut() else {
                return;
            };
            let submitted = matches!(
                tui.input.handle_event(&other, &mut session.draft),
                Some(InputEvent::Submit)
            );
            if submitted {
                dispatch(app, Action::SubmitInput, tx, config);
            }
        }
    }
}
