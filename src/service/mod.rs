//! # Insight Service Boundary
//!
//! Everything the client knows about the outside world goes through the
//! [`InsightService`] trait: message storage, chat creation, document upload.
//! The trait is injected into the core state (`App::new` takes an
//! `Arc<dyn InsightService>`), so the whole UI can run against a test double.
//!
//! The service owns the message and chat collections (single source of
//! truth). The client never mutates them directly — only through the
//! operations below — and re-reads snapshots whenever [`version`] changes.
//!
//! [`version`]: InsightService::version

pub mod memory;

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use memory::MemoryService;

/// Whether a conversation is free-form or seeded from a precomputed insight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Regular,
    Insight,
}

/// Extra payload carried by insight-kind chats.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InsightData {
    /// The originating question, auto-submitted once into an empty history.
    pub question: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub title: String,
    pub kind: ChatKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insight: Option<InsightData>,
}

impl Chat {
    pub fn regular(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: ChatKind::Regular,
            insight: None,
        }
    }

    pub fn insight(
        id: impl Into<String>,
        title: impl Into<String>,
        question: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: ChatKind::Insight,
            insight: Some(InsightData {
                question: question.into(),
            }),
        }
    }

    /// The seed question for insight chats, trimmed. `None` for regular
    /// chats or when the question is empty.
    pub fn seed_question(&self) -> Option<&str> {
        self.insight
            .as_ref()
            .map(|i| i.question.trim())
            .filter(|q| !q.is_empty())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A document attached to a message, rendered as a secondary chip.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

/// One message in a chat. Ordering is insertion order as returned by the
/// service; the view groups by day but never reorders.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    /// Markdown content.
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub docs: Vec<DocumentRef>,
    #[serde(default)]
    pub follow_ups: Vec<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            created_at: Utc::now(),
            docs: Vec::new(),
            follow_ups: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    pub fn with_follow_ups(mut self, follow_ups: Vec<String>) -> Self {
        self.follow_ups = follow_ups;
        self
    }

    pub fn with_docs(mut self, docs: Vec<DocumentRef>) -> Self {
        self.docs = docs;
        self
    }
}

/// Service-level failures. All are user-facing, dismissible, and non-fatal:
/// the worst outcome is a visible error message with no state corruption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceError {
    LoadFailed(String),
    SendFailed(String),
    UploadFailed(String),
    CreateFailed(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::LoadFailed(e) => write!(f, "failed to load conversation: {e}"),
            ServiceError::SendFailed(e) => write!(f, "failed to send message: {e}"),
            ServiceError::UploadFailed(e) => write!(f, "failed to upload document: {e}"),
            ServiceError::CreateFailed(e) => write!(f, "failed to create chat: {e}"),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Callback invoked with fractional progress (0..=100) during an upload.
/// `Send` only — the upload pump runs tasks one at a time, so the callback
/// is never shared across threads.
pub type ProgressFn = Box<dyn Fn(u8) + Send>;

/// The external data context. Treated as a black box: no wire protocol or
/// persistence format is defined on this side of the boundary.
#[async_trait]
pub trait InsightService: Send + Sync {
    /// Snapshot of all known chats, in service order.
    fn chats(&self) -> Vec<Chat>;

    /// Resolve a chat id to its record.
    fn chat(&self, id: &str) -> Option<Chat>;

    /// Ordered snapshot of a chat's messages. Synchronous; callers re-read
    /// when [`version`](Self::version) changes.
    fn messages(&self, chat_id: &str) -> Vec<Message>;

    /// Monotonic counter bumped on every store mutation.
    fn version(&self) -> u64;

    /// Populate the message store for a chat. Fails with a generic load
    /// error; the caller may retry.
    async fn load_messages(&self, chat_id: &str, kind: ChatKind) -> Result<(), ServiceError>;

    /// Deliver a message to the backend. The optimistic local copy is
    /// appended separately via [`append_local`](Self::append_local) before
    /// this round-trip completes.
    async fn send_message(
        &self,
        chat_id: &str,
        content: &str,
        kind: ChatKind,
    ) -> Result<(), ServiceError>;

    /// Synchronous optimistic append of a user message to the local view.
    fn append_local(&self, chat_id: &str, content: &str);

    /// Transfer one file, reporting progress through `on_progress`.
    async fn upload_document(
        &self,
        chat_id: &str,
        path: &Path,
        on_progress: ProgressFn,
    ) -> Result<(), ServiceError>;

    /// Create a new chat and return its record.
    async fn create_chat(&self, title: &str) -> Result<Chat, ServiceError>;

    /// The most recent insight record, if any.
    fn latest_insight(&self) -> Option<Chat>;

    /// True while the service is still warming up its collections.
    fn is_booting(&self) -> bool;

    /// Global error banner text, if an operation left one behind.
    fn last_error(&self) -> Option<String>;

    /// Dismiss the global error banner.
    fn clear_error(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_question_present_for_insight_chats() {
        let chat = Chat::insight("i1", "Revenue dip", "Why did revenue dip in March?");
        assert_eq!(chat.seed_question(), Some("Why did revenue dip in March?"));
    }

    #[test]
    fn seed_question_absent_for_regular_chats() {
        let chat = Chat::regular("c1", "General");
        assert_eq!(chat.seed_question(), None);
    }

    #[test]
    fn seed_question_empty_is_none() {
        let chat = Chat::insight("i2", "Blank", "   ");
        assert_eq!(chat.seed_question(), None);
    }

    #[test]
    fn service_error_display() {
        let err = ServiceError::SendFailed("timeout".into());
        assert_eq!(err.to_string(), "failed to send message: timeout");
    }
}
