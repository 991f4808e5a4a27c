//! # Application State
//!
//! The single `App` struct at the heart of the Elm-style loop. It owns
//! the injected service handle, one `SessionView` per visited chat id,
//! and the small pile of global view state (theme, status line, label
//! clock). All mutation happens in the reducer; the TUI layer only reads.

use std::collections::HashMap;
use std::sync::Arc;

use log::warn;

use crate::core::config::ThemeKind;
use crate::core::session::SessionView;
use crate::service::{Chat, InsightService};

pub struct App {
    /// The one seam to the outside world. Injected at construction so the
    /// reducer can be driven by a scripted service in tests.
    pub service: Arc<dyn InsightService>,
    /// Per-chat view state, kept alive across navigation so reopening a
    /// chat reuses its draft, history state, and seed guard.
    sessions: HashMap<String, SessionView>,
    /// The chat currently on screen, if any.
    active_chat: Option<String>,
    /// The most recent successfully opened chat, used as the fallback
    /// route when an unknown id is requested.
    last_selected: Option<String>,
    pub theme: ThemeKind,
    /// Bumped by the periodic tick; layout caches key on it so relative
    /// day headers re-derive without a message change.
    pub label_epoch: u64,
    pub should_quit: bool,
    /// Transient one-line notice shown in the title bar.
    pub status_message: String,
}

impl App {
    pub fn new(service: Arc<dyn InsightService>, theme: ThemeKind) -> Self {
        Self {
            service,
            sessions: HashMap::new(),
            active_chat: None,
            last_selected: None,
            theme,
            label_epoch: 0,
            should_quit: false,
            status_message: String::new(),
        }
    }

    /// Make `chat_id` the active session, creating its view state on first
    /// visit. Unknown ids fall back to the last selected chat (and failing
    /// that, leave the screen empty) rather than rendering a dead route.
    /// Returns the resolved chat if a session is now active.
    pub fn open_chat(&mut self, chat_id: &str) -> Option<Chat> {
        let resolved = match self.service.chat(chat_id) {
            Some(chat) => chat,
            None => {
                warn!("Unknown chat id '{chat_id}', falling back to last selection");
                self.status_message = format!("Unknown chat: {chat_id}");
                let fallback = self.last_selected.clone()?;
                self.service.chat(&fallback)?
            }
        };

        self.sessions
            .entry(resolved.id.clone())
            .or_insert_with(|| SessionView::new(resolved.clone()));
        self.active_chat = Some(resolved.id.clone());
        self.last_selected = Some(resolved.id.clone());
        Some(resolved)
    }

    pub fn active_chat_id(&self) -> Option<&str> {
        self.active_chat.as_deref()
    }

    /// The session currently on screen.
    pub fn active_session(&self) -> Option<&SessionView> {
        self.sessions.get(self.active_chat.as_deref()?)
    }

    pub fn active_session_mut(&mut self) -> Option<&mut SessionView> {
        let id = self.active_chat.clone()?;
        self.sessions.get_mut(&id)
    }

    /// Any session by chat id, active or not. Background completions
    /// (history, sends, uploads) land on the session they belong to even
    /// after the user has navigated away.
    pub fn session(&self, chat_id: &str) -> Option<&SessionView> {
        self.sessions.get(chat_id)
    }

    pub fn session_mut(&mut self, chat_id: &str) -> Option<&mut SessionView> {
        self.sessions.get_mut(chat_id)
    }
}
