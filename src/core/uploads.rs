//! # Upload Queue
//!
//! Tracks file-upload tasks for one session and enforces the transfer
//! policy: strictly sequential, one task in flight at a time, progress
//! reported per task. Terminal tasks (done or failed) are scheduled for
//! removal from the visible list exactly once; removal itself is
//! idempotent.
//!
//! The queue is pure state — the adapter runs the actual transfer and
//! feeds progress/completion back through the reducer.

use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadState {
    Queued,
    Active,
    Done,
    Failed(String),
}

#[derive(Clone, Debug)]
pub struct UploadTask {
    pub id: String,
    /// File name shown in the panel.
    pub name: String,
    pub path: PathBuf,
    /// 0..=100.
    pub progress: u8,
    pub state: UploadState,
    /// Set the first time a terminal state schedules removal.
    pub removal_scheduled: bool,
}

impl UploadTask {
    fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            path,
            progress: 0,
            state: UploadState::Queued,
            removal_scheduled: false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, UploadState::Done | UploadState::Failed(_))
    }
}

/// Outcome of completing a task: whether the caller should schedule its
/// delayed removal, and the next task to start (the pump stays sequential).
#[derive(Debug, Default)]
pub struct FinishOutcome {
    pub schedule_removal: bool,
    pub next: Option<UploadTask>,
}

#[derive(Debug, Default)]
pub struct UploadQueue {
    tasks: Vec<UploadTask>,
}

impl UploadQueue {
    /// Enqueue a batch of files in submission order. If the pump is idle
    /// the first queued task is activated and returned for the adapter to
    /// start; otherwise it will be started when the current task finishes.
    pub fn enqueue(&mut self, paths: Vec<PathBuf>) -> Option<UploadTask> {
        let was_idle = !self.has_active();
        for path in paths {
            self.tasks.push(UploadTask::new(path));
        }
        if was_idle { self.start_next() } else { None }
    }

    pub fn has_active(&self) -> bool {
        self.tasks.iter().any(|t| t.state == UploadState::Active)
    }

    fn start_next(&mut self) -> Option<UploadTask> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.state == UploadState::Queued)?;
        task.state = UploadState::Active;
        Some(task.clone())
    }

    /// Record fractional progress for the active task. Stale reports for
    /// tasks that already terminated (or were removed) are dropped.
    pub fn progress(&mut self, task_id: &str, percent: u8) {
        if let Some(task) = self
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id && t.state == UploadState::Active)
        {
            task.progress = percent.min(100);
        }
    }

    /// Mark a task terminal. Duplicate completions and completions for
    /// removed tasks never schedule a second removal.
    pub fn finish(&mut self, task_id: &str, result: Result<(), String>) -> FinishOutcome {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) else {
            return FinishOutcome::default();
        };
        if task.is_terminal() {
            return FinishOutcome::default();
        }

        match result {
            Ok(()) => {
                task.state = UploadState::Done;
                task.progress = 100;
            }
            Err(reason) => task.state = UploadState::Failed(reason),
        }
        let schedule_removal = !task.removal_scheduled;
        task.removal_scheduled = true;

        FinishOutcome {
            schedule_removal,
            next: self.start_next(),
        }
    }

    /// Drop a task from the visible list. Idempotent.
    pub fn remove(&mut self, task_id: &str) {
        self.tasks.retain(|t| t.id != task_id);
    }

    pub fn tasks(&self) -> &[UploadTask] {
        &self.tasks
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
