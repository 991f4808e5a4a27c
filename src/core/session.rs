//! # Session View State
//!
//! Per-chat interactive state: the input draft, the history-load state
//! machine, the thinking flag, the insight seed guard, uploads, and the
//! inline error. One `SessionView` exists per chat id and lives in the
//! `App` for as long as the app runs, so navigating away and back
//! ("remounting") reuses the same state instead of re-triggering loads.

use std::fmt;

use crate::core::uploads::UploadQueue;
use crate::service::{Chat, ChatKind};

/// Explicit history-fetch state machine. `Failed` permits a retry;
/// `Fetching` and `Loaded` reject duplicate fetches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryState {
    NotFetched,
    Fetching,
    Loaded,
    Failed,
}

/// Where a send's text came from. Only input-origin sends clear the draft
/// on success; suggestion-origin sends leave the draft alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOrigin {
    Input,
    Suggestion,
}

/// Inline, dismissible session errors. None of these halt the app.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionError {
    History(String),
    Send(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::History(e) => write!(f, "{e}"),
            SessionError::Send(e) => write!(f, "{e}"),
        }
    }
}

pub struct SessionView {
    pub chat: Chat,
    /// Pending input text. Cleared only by a successful input-origin send.
    pub draft: String,
    pub history: HistoryState,
    /// True while a send is in flight (thinking indicator, send disabled).
    pub sending: bool,
    /// Insight seed guard: the originating question is submitted at most
    /// once per chat id, surviving remounts.
    seeded: bool,
    pub error: Option<SessionError>,
    /// Visual overlay flag while a file drop/prompt is active. Never set
    /// for insight chats.
    pub drop_hover: bool,
    pub uploads: UploadQueue,
}

impl SessionView {
    pub fn new(chat: Chat) -> Self {
        Self {
            chat,
            draft: String::new(),
            history: HistoryState::NotFetched,
            sending: false,
            seeded: false,
            error: None,
            drop_hover: false,
            uploads: UploadQueue::default(),
        }
    }

    /// Uploads (and the drop overlay) are disabled entirely for insight
    /// chats.
    pub fn uploads_enabled(&self) -> bool {
        self.chat.kind == ChatKind::Regular
    }

    // ── History ─────────────────────────────────────────────────────────

    /// Transition into `Fetching` if a fetch is permitted. Returns false
    /// for duplicate requests (already fetching or loaded).
    pub fn begin_history_load(&mut self) -> bool {
        match self.history {
            HistoryState::NotFetched | HistoryState::Failed => {
                self.history = HistoryState::Fetching;
                true
            }
            HistoryState::Fetching | HistoryState::Loaded => false,
        }
    }

    pub fn history_loaded(&mut self) {
        self.history = HistoryState::Loaded;
    }

    /// Failure releases the guard (state `Failed`) so the chat id can be
    /// fetched again later.
    pub fn history_failed(&mut self, reason: String) {
        self.history = HistoryState::Failed;
        self.error = Some(SessionError::History(reason));
    }

    /// The insight question to auto-submit, if this is an insight chat
    /// whose loaded history is empty and the seed has not fired yet.
    /// Consuming the question sets the guard.
    pub fn seed_question(&mut self, history_is_empty: bool) -> Option<String> {
        if self.seeded || !history_is_empty || self.history != HistoryState::Loaded {
            return None;
        }
        let question = self.chat.seed_question()?.to_string();
        self.seeded = true;
        Some(question)
    }

    // ── Sending ─────────────────────────────────────────────────────────

    /// Start a send from the input draft. Whitespace-only drafts are a
    /// no-op, as is submitting while a send is already in flight.
    pub fn begin_send_from_input(&mut self) -> Option<String> {
        let text = self.draft.clone();
        self.begin_send(&text)
    }

    /// Start a send with programmatically supplied text (suggestion chip
    /// or insight seed). Does not touch the draft.
    pub fn begin_send_suggestion(&mut self, text: &str) -> Option<String> {
        self.begin_send(text)
    }

    fn begin_send(&mut self, text: &str) -> Option<String> {
        if self.sending {
            // Overlapping sends from one session are rejected; the send
            // control is disabled while thinking.
            return None;
        }
        let normalized = text.trim();
        if normalized.is_empty() {
            return None;
        }
        self.sending = true;
        Some(normalized.to_string())
    }

    pub fn send_succeeded(&mut self, origin: SendOrigin) {
        self.sending = false;
        if origin == SendOrigin::Input {
            self.draft.clear();
        }
    }

    /// Failure keeps the typed draft recoverable and surfaces one
    /// dismissible error.
    pub fn send_failed(&mut self, reason: String) {
        self.sending = false;
        self.error = Some(SessionError::Send(reason));
    }

    // ── Misc ────────────────────────────────────────────────────────────

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn set_drop_hover(&mut self, on: bool) {
        if self.uploads_enabled() {
            self.drop_hover = on;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::Chat;

    fn regular() -> SessionView {
        SessionView::new(Chat::regular("c1", "General"))
    }

    fn insight() -> SessionView {
        SessionView::new(Chat::insight("i1", "Dip", "Why the dip?"))
    }

    #[test]
    fn history_fsm_permits_one_fetch() {
        let mut session = regular();
        assert!(session.begin_history_load());
        // Re-entrant mount while fetching: rejected
        assert!(!session.begin_history_load());
        session.history_loaded();
        assert!(!session.begin_history_load());
    }

    #[test]
    fn history_failure_permits_retry() {
        let mut session = regular();
        assert!(session.begin_history_load());
        session.history_failed("offline".into());
        assert_eq!(session.history, HistoryState::Failed);
        assert!(matches!(session.error, Some(SessionError::History(_))));
        assert!(session.begin_history_load());
    }

    #[test]
    fn seed_fires_once_for_empty_insight_history() {
        let mut session = insight();
        session.begin_history_load();
        session.history_loaded();
        assert_eq!(session.seed_question(true), Some("Why the dip?".to_string()));
        // Second mount of the same chat id: guard holds
        assert_eq!(session.seed_question(true), None);
    }

    #[test]
    fn seed_suppressed_for_nonempty_history() {
        let mut session = insight();
        session.begin_history_load();
        session.history_loaded();
        assert_eq!(session.seed_question(false), None);
        assert_eq!(session.seed_question(false), None);
    }

    #[test]
    fn seed_requires_loaded_history() {
        let mut session = insight();
        assert_eq!(session.seed_question(true), None);
        session.begin_history_load();
        assert_eq!(session.seed_question(true), None);
    }

    #[test]
    fn regular_chats_never_seed() {
        let mut session = regular();
        session.begin_history_load();
        session.history_loaded();
        assert_eq!(session.seed_question(true), None);
    }

    #[test]
    fn whitespace_draft_is_a_noop() {
        let mut session = regular();
        session.draft = "   \n\t ".to_string();
        assert_eq!(session.begin_send_from_input(), None);
        assert!(!session.sending);
    }

    #[test]
    fn send_normalizes_whitespace() {
        let mut session = regular();
        session.draft = "  hello there  ".to_string();
        assert_eq!(
            session.begin_send_from_input(),
            Some("hello there".to_string())
        );
        assert!(session.sending);
    }

    #[test]
    fn overlapping_send_rejected() {
        let mut session = regular();
        session.draft = "first".to_string();
        assert!(session.begin_send_from_input().is_some());
        assert_eq!(session.begin_send_suggestion("second"), None);
    }

    #[test]
    fn failure_preserves_draft_and_sets_one_error() {
        let mut session = regular();
        session.draft = "important words".to_string();
        session.begin_send_from_input().unwrap();
        session.send_failed("gateway timeout".into());

        assert_eq!(session.draft, "important words");
        assert!(!session.sending);
        assert_eq!(
            session.error,
            Some(SessionError::Send("gateway timeout".into()))
        );
        session.dismiss_error();
        assert!(session.error.is_none());
    }

    #[test]
    fn success_clears_draft_only_for_input_origin() {
        let mut session = regular();
        session.draft = "typed text".to_string();
        session.begin_send_suggestion("a suggestion").unwrap();
        session.send_succeeded(SendOrigin::Suggestion);
        assert_eq!(session.draft, "typed text");

        session.begin_send_from_input().unwrap();
        session.send_succeeded(SendOrigin::Input);
        assert!(session.draft.is_empty());
    }

    #[test]
    fn drop_hover_suppressed_for_insight_chats() {
        let mut session = insight();
        session.set_drop_hover(true);
        assert!(!session.drop_hover);
        assert!(!session.uploads_enabled());

        let mut session = regular();
        session.set_drop_hover(true);
        assert!(session.drop_hover);
    }
}
