//! End-to-end flows through the reducer against the in-memory service.
//!
//! These tests play the runtime's role by hand: they dispatch actions,
//! "run" the returned effects by calling the service directly, and feed
//! the completions back in as actions.

use std::sync::Arc;

use lumen::core::action::{Action, Effect, update};
use lumen::core::config::ThemeKind;
use lumen::core::session::HistoryState;
use lumen::core::state::App;
use lumen::core::timeline::group_by_day;
use lumen::core::uploads::UploadState;
use lumen::service::memory::MemoryService;
use lumen::service::{ChatKind, InsightService, Role, ServiceError};

fn demo_app() -> (App, Arc<MemoryService>) {
    let service = Arc::new(MemoryService::with_demo_data());
    (App::new(service.clone(), ThemeKind::Dark), service)
}

/// Run one layer of effects against the real service, returning the
/// completion actions the runtime would feed back.
fn settle(service: &Arc<MemoryService>, effects: Vec<Effect>) -> Vec<Action> {
    let mut completions = Vec::new();
    for effect in effects {
        match effect {
            Effect::LoadHistory { chat_id, kind } => {
                let result = tokio_test::block_on(service.load_messages(&chat_id, kind));
                completions.push(Action::HistoryFinished { chat_id, result });
            }
            Effect::Send {
                chat_id,
                text,
                origin,
                kind,
            } => {
                let result =
                    tokio_test::block_on(service.send_message(&chat_id, &text, kind));
                completions.push(Action::SendFinished {
                    chat_id,
                    origin,
                    result,
                });
            }
            Effect::StartUpload {
                chat_id,
                task_id,
                path,
            } => {
                let result = tokio_test::block_on(service.upload_document(
                    &chat_id,
                    &path,
                    Box::new(|_| {}),
                ));
                completions.push(Action::UploadFinished {
                    chat_id,
                    task_id,
                    result,
                });
            }
            Effect::ScheduleRemoval { chat_id, task_id } => {
                completions.push(Action::UploadExpired { chat_id, task_id });
            }
            Effect::CreateChat { title } => {
                let result = tokio_test::block_on(service.create_chat(&title));
                completions.push(Action::ChatCreated(result));
            }
            Effect::Quit => {}
        }
    }
    completions
}

/// Dispatch an action and settle every resulting effect to quiescence.
fn drive(app: &mut App, service: &Arc<MemoryService>, action: Action) {
    let mut pending = settle(service, update(app, action));
    while let Some(action) = pending.pop() {
        let more = settle(service, update(app, action));
        pending.extend(more);
    }
}

#[test]
fn opening_a_chat_loads_history_once_across_remounts() {
    let (mut app, service) = demo_app();

    drive(&mut app, &service, Action::OpenChat("general".into()));
    assert_eq!(app.session("general").unwrap().history, HistoryState::Loaded);
    assert_eq!(service.messages("general").len(), 2);

    // Navigate away and back; the pending history was already drained,
    // and no new fetch is issued
    drive(&mut app, &service, Action::OpenChat("insight-retention".into()));
    drive(&mut app, &service, Action::OpenChat("general".into()));
    assert_eq!(service.messages("general").len(), 2);
    assert!(update(&mut app, Action::OpenChat("general".into())).is_empty());
}

#[test]
fn failed_history_is_retried_on_next_open() {
    let service = Arc::new(MemoryService::new());
    let mut app = App::new(service.clone(), ThemeKind::Dark);
    service.push_chat(lumen::service::Chat::regular("late", "Late arrival"));

    // Simulate the fetch failing in flight
    let effects = update(&mut app, Action::OpenChat("late".into()));
    assert_eq!(effects.len(), 1);
    update(
        &mut app,
        Action::HistoryFinished {
            chat_id: "late".into(),
            result: Err(ServiceError::LoadFailed("offline".into())),
        },
    );
    let session = app.session("late").unwrap();
    assert_eq!(session.history, HistoryState::Failed);
    assert!(session.error.is_some());

    // Reopening retries, and this time it succeeds
    drive(&mut app, &service, Action::OpenChat("late".into()));
    assert_eq!(app.session("late").unwrap().history, HistoryState::Loaded);
}

#[test]
fn insight_chat_seeds_its_question_exactly_once() {
    let (mut app, service) = demo_app();

    drive(&mut app, &service, Action::OpenChat("insight-retention".into()));

    let messages = service.messages("insight-retention");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert!(messages[0].content.contains("7-day retention"));
    assert_eq!(messages[1].role, Role::Assistant);

    // Leaving and coming back must not re-ask the question
    drive(&mut app, &service, Action::OpenChat("general".into()));
    drive(&mut app, &service, Action::OpenChat("insight-retention".into()));
    assert_eq!(service.messages("insight-retention").len(), 2);
}

#[test]
fn submitting_the_draft_round_trips_and_clears_it() {
    let (mut app, service) = demo_app();
    drive(&mut app, &service, Action::OpenChat("general".into()));

    app.active_session_mut().unwrap().draft = "Break it down by region".into();
    drive(&mut app, &service, Action::SubmitInput);

    let session = app.active_session().unwrap();
    assert!(session.draft.is_empty());
    assert!(!session.sending);

    let messages = service.messages("general");
    let last_two: Vec<Role> = messages[messages.len() - 2..]
        .iter()
        .map(|m| m.role)
        .collect();
    assert_eq!(last_two, vec![Role::User, Role::Assistant]);
}

#[test]
fn suggestion_chip_sends_without_touching_the_draft() {
    let (mut app, service) = demo_app();
    drive(&mut app, &service, Action::OpenChat("general".into()));

    app.active_session_mut().unwrap().draft = "half-typed thought".into();
    drive(
        &mut app,
        &service,
        Action::SubmitSuggestion("Compare with last quarter".into()),
    );

    let session = app.active_session().unwrap();
    assert_eq!(session.draft, "half-typed thought");
    let messages = service.messages("general");
    assert!(messages
        .iter()
        .any(|m| m.role == Role::User && m.content == "Compare with last quarter"));
}

#[test]
fn overlapping_submits_are_rejected_while_sending() {
    let (mut app, service) = demo_app();
    drive(&mut app, &service, Action::OpenChat("general".into()));

    app.active_session_mut().unwrap().draft = "first".into();
    let effects = update(&mut app, Action::SubmitInput);
    assert_eq!(effects.len(), 1);
    assert!(app.active_session().unwrap().sending);

    // A second submit while the first is in flight does nothing
    app.active_session_mut().unwrap().draft = "second".into();
    assert!(update(&mut app, Action::SubmitInput).is_empty());
    let messages = service.messages("general");
    let sent: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .collect();
    assert!(sent.contains(&"first"));
    assert!(!sent.contains(&"second"));
}

#[test]
fn uploads_run_in_order_and_rows_expire() {
    let (mut app, service) = demo_app();
    drive(&mut app, &service, Action::OpenChat("general".into()));

    // Two real temp files so the simulated transfer succeeds
    let dir = std::env::temp_dir();
    let a = dir.join("lumen-test-a.pdf");
    let b = dir.join("lumen-test-b.pdf");
    std::fs::write(&a, b"a").unwrap();
    std::fs::write(&b, b"b").unwrap();

    let effects = update(&mut app, Action::QueueUploads(vec![a.clone(), b.clone()]));
    {
        let tasks = app.active_session().unwrap().uploads.tasks();
        assert_eq!(tasks[0].state, UploadState::Active);
        assert_eq!(tasks[1].state, UploadState::Queued);
    }

    // Settling runs the first transfer, schedules its removal, starts the
    // second, and so on until the queue drains
    let mut pending = settle(&service, effects);
    while let Some(action) = pending.pop() {
        pending.extend(settle(&service, update(&mut app, action)));
    }
    assert!(app.active_session().unwrap().uploads.is_empty());

    // Each completed upload appended a document message
    let doc_messages = service
        .messages("general")
        .iter()
        .filter(|m| !m.docs.is_empty())
        .count();
    assert_eq!(doc_messages, 2);

    let _ = std::fs::remove_file(a);
    let _ = std::fs::remove_file(b);
}

#[test]
fn failed_upload_reports_and_queue_continues() {
    let (mut app, service) = demo_app();
    drive(&mut app, &service, Action::OpenChat("general".into()));

    let good = std::env::temp_dir().join("lumen-test-good.pdf");
    std::fs::write(&good, b"ok").unwrap();
    let missing = std::path::PathBuf::from("/definitely/not/here.pdf");

    let effects = update(&mut app, Action::QueueUploads(vec![missing, good.clone()]));
    let mut pending = settle(&service, effects);
    // Stop settling once both tasks are terminal, leaving removal timers
    // unfired so the rows are still visible
    while let Some(action) = pending.pop() {
        if matches!(action, Action::UploadExpired { .. }) {
            continue;
        }
        pending.extend(settle(&service, update(&mut app, action)));
    }

    let tasks = app.active_session().unwrap().uploads.tasks();
    assert!(matches!(tasks[0].state, UploadState::Failed(_)));
    assert_eq!(tasks[1].state, UploadState::Done);

    let _ = std::fs::remove_file(good);
}

#[test]
fn day_groups_follow_message_order() {
    let (mut app, service) = demo_app();
    drive(&mut app, &service, Action::OpenChat("general".into()));

    // Demo history is from yesterday; a send adds two messages today
    app.active_session_mut().unwrap().draft = "And this week?".into();
    drive(&mut app, &service, Action::SubmitInput);

    let messages = service.messages("general");
    let sections = group_by_day(&messages, lumen::core::timeline::today());
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0].label, "Yesterday");
    assert_eq!(sections[1].label, "Today");
    assert_eq!(sections[0].range, 0..2);
    assert_eq!(sections[1].range, 2..4);
}

#[test]
fn creating_a_chat_opens_it() {
    let (mut app, service) = demo_app();
    drive(&mut app, &service, Action::CreateChat("Ad-hoc numbers".into()));

    let active = app.active_chat_id().expect("new chat should be active");
    let chat = service.chat(active).unwrap();
    assert_eq!(chat.title, "Ad-hoc numbers");
    assert_eq!(chat.kind, ChatKind::Regular);
    assert_eq!(app.session(active).unwrap().history, HistoryState::Loaded);
}
