//! # Actions, Effects, and the Reducer
//!
//! Every state change in the app flows through [`update`]: the TUI layer
//! and background tasks emit [`Action`]s, the reducer mutates [`App`],
//! and returns [`Effect`]s describing the async work the runtime should
//! start. The reducer itself never blocks and never touches the terminal,
//! which is what makes the whole flow unit-testable with a scripted
//! service.

use std::path::PathBuf;

use log::{debug, error, info};

use crate::core::session::SendOrigin;
use crate::core::state::App;
use crate::service::{Chat, ChatKind, ServiceError};

/// Inputs to the reducer. UI events and background-task completions both
/// arrive as actions over the same channel.
#[derive(Debug)]
pub enum Action {
    /// Navigate to a chat (route change, list selection, startup).
    OpenChat(String),
    /// Submit whatever is in the input draft.
    SubmitInput,
    /// Submit programmatic text (a suggestion chip).
    SubmitSuggestion(String),
    /// A history fetch finished.
    HistoryFinished {
        chat_id: String,
        result: Result<(), ServiceError>,
    },
    /// A send finished.
    SendFinished {
        chat_id: String,
        origin: SendOrigin,
        result: Result<(), ServiceError>,
    },
    /// Files were dropped or picked for upload.
    QueueUploads(Vec<PathBuf>),
    /// Fractional progress for an in-flight upload.
    UploadProgressed {
        chat_id: String,
        task_id: String,
        percent: u8,
    },
    /// An upload finished.
    UploadFinished {
        chat_id: String,
        task_id: String,
        result: Result<(), ServiceError>,
    },
    /// The delayed-removal timer for a finished upload fired.
    UploadExpired { chat_id: String, task_id: String },
    /// A file drag (or the path prompt) entered/left the window.
    SetDropHover(bool),
    /// Dismiss the active session's inline error.
    DismissSessionError,
    /// Dismiss the global service error banner.
    DismissBanner,
    ToggleTheme,
    /// Create a new chat with the given title.
    CreateChat(String),
    /// Chat creation finished.
    ChatCreated(Result<Chat, ServiceError>),
    /// Periodic label tick (relative day headers).
    Tick,
    Quit,
}

/// Async work the reducer wants started. The runtime spawns each effect
/// and feeds the completion back in as an action.
#[derive(Debug)]
pub enum Effect {
    LoadHistory { chat_id: String, kind: ChatKind },
    Send {
        chat_id: String,
        text: String,
        origin: SendOrigin,
        kind: ChatKind,
    },
    StartUpload {
        chat_id: String,
        task_id: String,
        path: PathBuf,
    },
    /// Start the delayed-removal timer for a terminal upload row.
    ScheduleRemoval { chat_id: String, task_id: String },
    CreateChat { title: String },
    Quit,
}

/// Apply one action to the app, returning the effects to run.
pub fn update(app: &mut App, action: Action) -> Vec<Effect> {
    match action {
        Action::OpenChat(chat_id) => open_chat(app, &chat_id),

        Action::SubmitInput => {
            let Some(session) = app.active_session_mut() else {
                return vec![];
            };
            let kind = session.chat.kind;
            let chat_id = session.chat.id.clone();
            match session.begin_send_from_input() {
                Some(text) => start_send(app, chat_id, text, SendOrigin::Input, kind),
                None => vec![],
            }
        }

        Action::SubmitSuggestion(text) => {
            let Some(session) = app.active_session_mut() else {
                return vec![];
            };
            let kind = session.chat.kind;
            let chat_id = session.chat.id.clone();
            match session.begin_send_suggestion(&text) {
                Some(text) => start_send(app, chat_id, text, SendOrigin::Suggestion, kind),
                None => vec![],
            }
        }

        Action::HistoryFinished { chat_id, result } => {
            history_finished(app, &chat_id, result)
        }

        Action::SendFinished {
            chat_id,
            origin,
            result,
        } => {
            let Some(session) = app.session_mut(&chat_id) else {
                return vec![];
            };
            match result {
                Ok(()) => {
                    debug!("Send completed for {chat_id}");
                    session.send_succeeded(origin);
                }
                Err(e) => {
                    error!("Send failed for {chat_id}: {e}");
                    session.send_failed(e.to_string());
                }
            }
            vec![]
        }

        Action::QueueUploads(paths) => {
            let Some(session) = app.active_session_mut() else {
                return vec![];
            };
            if !session.uploads_enabled() {
                app.status_message = "Uploads are not available in insight chats".to_string();
                return vec![];
            }
            let chat_id = session.chat.id.clone();
            info!("Queueing {} upload(s) for {chat_id}", paths.len());
            match session.uploads.enqueue(paths) {
                Some(task) => vec![Effect::StartUpload {
                    chat_id,
                    task_id: task.id,
                    path: task.path,
                }],
                None => vec![],
            }
        }

        Action::UploadProgressed {
            chat_id,
            task_id,
            percent,
        } => {
            if let Some(session) = app.session_mut(&chat_id) {
                session.uploads.progress(&task_id, percent);
            }
            vec![]
        }

        Action::UploadFinished {
            chat_id,
            task_id,
            result,
        } => upload_finished(app, chat_id, task_id, result),

        Action::UploadExpired { chat_id, task_id } => {
            if let Some(session) = app.session_mut(&chat_id) {
                session.uploads.remove(&task_id);
            }
            vec![]
        }

        Action::SetDropHover(on) => {
            if let Some(session) = app.active_session_mut() {
                session.set_drop_hover(on);
            }
            vec![]
        }

        Action::DismissSessionError => {
            if let Some(session) = app.active_session_mut() {
                session.dismiss_error();
            }
            vec![]
        }

        Action::DismissBanner => {
            app.service.clear_error();
            vec![]
        }

        Action::ToggleTheme => {
            app.theme = app.theme.toggled();
            app.status_message = format!("Theme: {}", app.theme.label());
            vec![]
        }

        Action::CreateChat(title) => vec![Effect::CreateChat { title }],

        Action::ChatCreated(result) => match result {
            Ok(chat) => {
                info!("Created chat '{}'", chat.title);
                open_chat(app, &chat.id)
            }
            Err(e) => {
                error!("Chat creation failed: {e}");
                app.status_message = e.to_string();
                vec![]
            }
        },

        Action::Tick => {
            app.label_epoch = app.label_epoch.wrapping_add(1);
            vec![]
        }

        Action::Quit => {
            app.should_quit = true;
            vec![Effect::Quit]
        }
    }
}

/// Route to a chat and kick off its history fetch if this is the first
/// time (or the previous fetch failed).
fn open_chat(app: &mut App, chat_id: &str) -> Vec<Effect> {
    let Some(chat) = app.open_chat(chat_id) else {
        return vec![];
    };
    let session = match app.session_mut(&chat.id) {
        Some(s) => s,
        None => return vec![],
    };
    if session.begin_history_load() {
        debug!("Fetching history for {}", chat.id);
        vec![Effect::LoadHistory {
            chat_id: chat.id,
            kind: chat.kind,
        }]
    } else {
        vec![]
    }
}

/// Record the optimistic user message and produce the send effect.
fn start_send(
    app: &mut App,
    chat_id: String,
    text: String,
    origin: SendOrigin,
    kind: ChatKind,
) -> Vec<Effect> {
    app.service.append_local(&chat_id, &text);
    vec![Effect::Send {
        chat_id,
        text,
        origin,
        kind,
    }]
}

/// On successful load of an empty insight chat, auto-submit the
/// originating question (once per chat id, guarded by the session).
fn history_finished(
    app: &mut App,
    chat_id: &str,
    result: Result<(), ServiceError>,
) -> Vec<Effect> {
    let history_is_empty = app.service.messages(chat_id).is_empty();
    let Some(session) = app.session_mut(chat_id) else {
        return vec![];
    };
    match result {
        Ok(()) => {
            session.history_loaded();
            let kind = session.chat.kind;
            if let Some(question) = session.seed_question(history_is_empty)
                && let Some(text) = session.begin_send_suggestion(&question)
            {
                info!("Seeding insight chat {chat_id} with its question");
                return start_send(
                    app,
                    chat_id.to_string(),
                    text,
                    SendOrigin::Suggestion,
                    kind,
                );
            }
            vec![]
        }
        Err(e) => {
            error!("History fetch failed for {chat_id}: {e}");
            session.history_failed(e.to_string());
            vec![]
        }
    }
}

/// Settle a finished upload: mark it terminal, schedule its delayed
/// removal (at most once), and pump the next queued task.
fn upload_finished(
    app: &mut App,
    chat_id: String,
    task_id: String,
    result: Result<(), ServiceError>,
) -> Vec<Effect> {
    let Some(session) = app.session_mut(&chat_id) else {
        return vec![];
    };
    let outcome = session
        .uploads
        .finish(&task_id, result.map_err(|e| e.to_string()));

    let mut effects = Vec::new();
    if outcome.schedule_removal {
        effects.push(Effect::ScheduleRemoval {
            chat_id: chat_id.clone(),
            task_id,
        });
    }
    if let Some(next) = outcome.next {
        effects.push(Effect::StartUpload {
            chat_id,
            task_id: next.id,
            path: next.path,
        });
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ThemeKind;
    use crate::core::session::HistoryState;
    use crate::core::uploads::UploadState;
    use crate::service::memory::MemoryService;
    use std::sync::Arc;

    fn app() -> App {
        App::new(
            Arc::new(MemoryService::with_demo_data()),
            ThemeKind::default(),
        )
    }

    fn open(app: &mut App, chat_id: &str) -> Vec<Effect> {
        update(app, Action::OpenChat(chat_id.to_string()))
    }

    #[test]
    fn open_chat_fetches_history_exactly_once() {
        let mut app = app();
        let effects = open(&mut app, "general");
        assert!(matches!(effects[..], [Effect::LoadHistory { .. }]));

        // Remount while fetching, and again after load: no second fetch
        assert!(open(&mut app, "general").is_empty());
        update(
            &mut app,
            Action::HistoryFinished {
                chat_id: "general".into(),
                result: Ok(()),
            },
        );
        assert!(open(&mut app, "general").is_empty());
    }

    #[test]
    fn failed_history_can_be_retried() {
        let mut app = app();
        open(&mut app, "general");
        update(
            &mut app,
            Action::HistoryFinished {
                chat_id: "general".into(),
                result: Err(ServiceError::LoadFailed("offline".into())),
            },
        );
        assert_eq!(
            app.session("general").unwrap().history,
            HistoryState::Failed
        );
        let effects = open(&mut app, "general");
        assert!(matches!(effects[..], [Effect::LoadHistory { .. }]));
    }

    #[test]
    fn empty_insight_history_seeds_the_question() {
        let mut app = app();
        open(&mut app, "insight-retention");
        let effects = update(
            &mut app,
            Action::HistoryFinished {
                chat_id: "insight-retention".into(),
                result: Ok(()),
            },
        );
        match &effects[..] {
            [Effect::Send { text, origin, .. }] => {
                assert!(text.contains("retention"));
                assert_eq!(*origin, SendOrigin::Suggestion);
            }
            other => panic!("expected one Send effect, got {other:?}"),
        }
        // The optimistic user message was appended
        assert_eq!(app.service.messages("insight-retention").len(), 1);

        // Settle the send, then pretend the history loads again after a
        // failure somewhere: the seed must not fire twice.
        update(
            &mut app,
            Action::SendFinished {
                chat_id: "insight-retention".into(),
                origin: SendOrigin::Suggestion,
                result: Ok(()),
            },
        );
        let session = app.session_mut("insight-retention").unwrap();
        session.history_failed("flake".into());
        open(&mut app, "insight-retention");
        let effects = update(
            &mut app,
            Action::HistoryFinished {
                chat_id: "insight-retention".into(),
                result: Ok(()),
            },
        );
        assert!(effects.is_empty());
    }

    #[test]
    fn submit_input_appends_and_sends() {
        let mut app = app();
        open(&mut app, "general");
        app.active_session_mut().unwrap().draft = "  hello  ".to_string();

        let effects = update(&mut app, Action::SubmitInput);
        match &effects[..] {
            [Effect::Send { text, origin, .. }] => {
                assert_eq!(text, "hello");
                assert_eq!(*origin, SendOrigin::Input);
            }
            other => panic!("expected one Send effect, got {other:?}"),
        }
        let messages = app.service.messages("general");
        assert_eq!(messages.last().unwrap().content, "hello");

        // Draft survives until the send succeeds
        assert_eq!(app.active_session().unwrap().draft, "  hello  ");
        update(
            &mut app,
            Action::SendFinished {
                chat_id: "general".into(),
                origin: SendOrigin::Input,
                result: Ok(()),
            },
        );
        assert!(app.active_session().unwrap().draft.is_empty());
    }

    #[test]
    fn whitespace_submit_is_a_noop() {
        let mut app = app();
        open(&mut app, "general");
        app.active_session_mut().unwrap().draft = "   ".to_string();
        assert!(update(&mut app, Action::SubmitInput).is_empty());
        assert!(app.service.messages("general").is_empty());
    }

    #[test]
    fn send_failure_keeps_draft_and_surfaces_error() {
        let mut app = app();
        open(&mut app, "general");
        app.active_session_mut().unwrap().draft = "precious".to_string();
        update(&mut app, Action::SubmitInput);
        update(
            &mut app,
            Action::SendFinished {
                chat_id: "general".into(),
                origin: SendOrigin::Input,
                result: Err(ServiceError::SendFailed("gateway".into())),
            },
        );
        let session = app.active_session().unwrap();
        assert_eq!(session.draft, "precious");
        assert!(session.error.is_some());

        assert!(update(&mut app, Action::DismissSessionError).is_empty());
        assert!(app.active_session().unwrap().error.is_none());
    }

    #[test]
    fn uploads_rejected_in_insight_chats() {
        let mut app = app();
        open(&mut app, "insight-retention");
        let effects = update(&mut app, Action::QueueUploads(vec!["a.pdf".into()]));
        assert!(effects.is_empty());
        assert!(!app.status_message.is_empty());
    }

    #[test]
    fn upload_pipeline_runs_sequentially() {
        let mut app = app();
        open(&mut app, "general");

        let effects = update(
            &mut app,
            Action::QueueUploads(vec!["a.pdf".into(), "b.pdf".into()]),
        );
        let first_id = match &effects[..] {
            [Effect::StartUpload { task_id, path, .. }] => {
                assert_eq!(path, &PathBuf::from("a.pdf"));
                task_id.clone()
            }
            other => panic!("expected one StartUpload, got {other:?}"),
        };

        update(
            &mut app,
            Action::UploadProgressed {
                chat_id: "general".into(),
                task_id: first_id.clone(),
                percent: 50,
            },
        );
        assert_eq!(
            app.active_session().unwrap().uploads.tasks()[0].progress,
            50
        );

        let effects = update(
            &mut app,
            Action::UploadFinished {
                chat_id: "general".into(),
                task_id: first_id.clone(),
                result: Ok(()),
            },
        );
        // One removal timer plus the next task starting
        assert!(matches!(
            effects[..],
            [Effect::ScheduleRemoval { .. }, Effect::StartUpload { .. }]
        ));

        // Duplicate completion: nothing new is scheduled
        let effects = update(
            &mut app,
            Action::UploadFinished {
                chat_id: "general".into(),
                task_id: first_id.clone(),
                result: Ok(()),
            },
        );
        assert!(effects.is_empty());

        // Timer fires, row disappears; firing again is harmless
        update(
            &mut app,
            Action::UploadExpired {
                chat_id: "general".into(),
                task_id: first_id.clone(),
            },
        );
        update(
            &mut app,
            Action::UploadExpired {
                chat_id: "general".into(),
                task_id: first_id,
            },
        );
        let tasks = app.active_session().unwrap().uploads.tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].state, UploadState::Active);
        assert_eq!(tasks[0].name, "b.pdf");
    }

    #[test]
    fn tick_advances_label_epoch() {
        let mut app = app();
        let before = app.label_epoch;
        update(&mut app, Action::Tick);
        assert_eq!(app.label_epoch, before + 1);
    }

    #[test]
    fn theme_toggles() {
        let mut app = app();
        assert_eq!(app.theme, ThemeKind::Dark);
        update(&mut app, Action::ToggleTheme);
        assert_eq!(app.theme, ThemeKind::Light);
    }

    #[test]
    fn quit_sets_flag() {
        let mut app = app();
        let effects = update(&mut app, Action::Quit);
        assert!(app.should_quit);
        assert!(matches!(effects[..], [Effect::Quit]));
    }

    #[test]
    fn created_chat_is_opened_and_fetched() {
        let mut app = app();
        let effects = update(
            &mut app,
            Action::CreateChat("Quarterly review".to_string()),
        );
        assert!(matches!(effects[..], [Effect::CreateChat { .. }]));

        let chat = tokio_test::block_on(app.service.create_chat("Quarterly review")).unwrap();
        let effects = update(&mut app, Action::ChatCreated(Ok(chat.clone())));
        assert!(matches!(effects[..], [Effect::LoadHistory { .. }]));
        assert_eq!(app.active_chat_id(), Some(chat.id.as_str()));
    }
}
