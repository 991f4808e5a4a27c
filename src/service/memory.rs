//! # In-Memory Service
//!
//! Reference implementation of [`InsightService`] backed by a mutex-guarded
//! store. Used by the binary (seeded with demo conversations) and by tests
//! that want a real store instead of a scripted double.
//!
//! History for each chat starts in a separate `pending` map and is moved
//! into the visible store by `load_messages`, mimicking a remote fetch.
//! Every mutation bumps the version counter so views know to re-read.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use log::{debug, info};

use super::{
    Chat, ChatKind, DocumentRef, InsightService, Message, ProgressFn, ServiceError,
};

/// Number of progress steps reported per simulated upload.
const UPLOAD_STEPS: u8 = 10;

#[derive(Default)]
struct Store {
    chats: Vec<Chat>,
    messages: HashMap<String, Vec<Message>>,
    /// Per-chat history not yet "fetched" — moved into `messages` by
    /// `load_messages`.
    pending: HashMap<String, Vec<Message>>,
    last_error: Option<String>,
    booting: bool,
}

pub struct MemoryService {
    store: Mutex<Store>,
    version: AtomicU64,
}

impl Default for MemoryService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryService {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store::default()),
            version: AtomicU64::new(0),
        }
    }

    /// A service pre-populated with a regular chat (with history) and a
    /// fresh insight chat, for running the client without a backend.
    pub fn with_demo_data() -> Self {
        let service = Self::new();
        {
            let mut store = service.store.lock().unwrap();

            let general = Chat::regular("general", "General questions");
            let yesterday = Utc::now() - ChronoDuration::days(1);
            store.pending.insert(
                general.id.clone(),
                vec![
                    Message::user("What does the weekly retention chart track?")
                        .with_created_at(yesterday),
                    Message::assistant(
                        "It tracks the share of users returning within **7 days** of \
                         their first session.\n\n\
                         | Cohort | Retained |\n\
                         |--------|----------|\n\
                         | Week 1 | 42% |\n\
                         | Week 2 | 35% |",
                    )
                    .with_created_at(yesterday + ChronoDuration::minutes(1))
                    .with_follow_ups(vec![
                        "Break this down by platform".to_string(),
                        "Compare with last quarter".to_string(),
                    ]),
                ],
            );
            store.chats.push(general);

            store.chats.push(Chat::insight(
                "insight-retention",
                "Retention dip",
                "Why did 7-day retention drop in the latest cohort?",
            ));
        }
        service.bump();
        service
    }

    fn bump(&self) {
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    fn set_error(&self, message: impl Into<String>) {
        self.store.lock().unwrap().last_error = Some(message.into());
        self.bump();
    }

    /// Append a message directly (test/demo seam).
    pub fn push_message(&self, chat_id: &str, message: Message) {
        let mut store = self.store.lock().unwrap();
        store
            .messages
            .entry(chat_id.to_string())
            .or_default()
            .push(message);
        drop(store);
        self.bump();
    }

    pub fn push_chat(&self, chat: Chat) {
        self.store.lock().unwrap().chats.push(chat);
        self.bump();
    }
}

#[async_trait]
impl InsightService for MemoryService {
    fn chats(&self) -> Vec<Chat> {
        self.store.lock().unwrap().chats.clone()
    }

    fn chat(&self, id: &str) -> Option<Chat> {
        self.store
            .lock()
            .unwrap()
            .chats
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    fn messages(&self, chat_id: &str) -> Vec<Message> {
        self.store
            .lock()
            .unwrap()
            .messages
            .get(chat_id)
            .cloned()
            .unwrap_or_default()
    }

    fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    async fn load_messages(&self, chat_id: &str, kind: ChatKind) -> Result<(), ServiceError> {
        debug!("Loading history for {chat_id} ({kind:?})");
        let mut store = self.store.lock().unwrap();
        if !store.chats.iter().any(|c| c.id == chat_id) {
            drop(store);
            self.set_error(format!("unknown chat: {chat_id}"));
            return Err(ServiceError::LoadFailed(format!("unknown chat: {chat_id}")));
        }
        let history = store.pending.remove(chat_id).unwrap_or_default();
        store
            .messages
            .entry(chat_id.to_string())
            .or_default()
            .splice(0..0, history);
        drop(store);
        self.bump();
        Ok(())
    }

    async fn send_message(
        &self,
        chat_id: &str,
        content: &str,
        _kind: ChatKind,
    ) -> Result<(), ServiceError> {
        info!("Sending {} bytes to {chat_id}", content.len());
        // No backend here: reply with a canned acknowledgement so the
        // timeline round-trip is observable.
        let reply = Message::assistant(format!(
            "Looking into *{}*. This demo service has no model attached.",
            content.lines().next().unwrap_or(content)
        ));
        self.push_message(chat_id, reply);
        Ok(())
    }

    fn append_local(&self, chat_id: &str, content: &str) {
        self.push_message(chat_id, Message::user(content));
    }

    async fn upload_document(
        &self,
        chat_id: &str,
        path: &Path,
        on_progress: ProgressFn,
    ) -> Result<(), ServiceError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        if !path.exists() {
            return Err(ServiceError::UploadFailed(format!("no such file: {name}")));
        }

        for step in 1..=UPLOAD_STEPS {
            tokio::time::sleep(Duration::from_millis(40)).await;
            on_progress(step * (100 / UPLOAD_STEPS));
        }

        self.push_message(
            chat_id,
            Message::user(format!("Uploaded `{name}`")).with_docs(vec![DocumentRef {
                name,
                url: None,
            }]),
        );
        Ok(())
    }

    async fn create_chat(&self, title: &str) -> Result<Chat, ServiceError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ServiceError::CreateFailed("empty title".into()));
        }
        let chat = Chat::regular(uuid::Uuid::new_v4().to_string(), title);
        self.push_chat(chat.clone());
        info!("Created chat '{}' ({})", chat.title, chat.id);
        Ok(chat)
    }

    fn latest_insight(&self) -> Option<Chat> {
        self.store
            .lock()
            .unwrap()
            .chats
            .iter()
            .rev()
            .find(|c| c.kind == ChatKind::Insight)
            .cloned()
    }

    fn is_booting(&self) -> bool {
        self.store.lock().unwrap().booting
    }

    fn last_error(&self) -> Option<String> {
        self.store.lock().unwrap().last_error.clone()
    }

    fn clear_error(&self) {
        self.store.lock().unwrap().last_error = None;
        self.bump();
    }
}
