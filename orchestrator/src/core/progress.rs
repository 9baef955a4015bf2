//! Run progress state and the reporter that publishes it
//!
//! The coordinator is the single writer. Observers subscribe to a watch
//! channel (or poll `snapshot`) and may request cancellation at any time;
//! cancellation is only honored at the next loop boundary.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Maximum characters of a label kept in an error entry
pub const ERROR_LABEL_MAX_CHARS: usize = 40;

/// A successfully generated article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResultEntry {
    pub site: String,
    pub title: String,
}

/// Observable state of the current run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub is_running: bool,
    pub total: u32,
    pub completed: u32,
    pub current_label: Option<String>,
    /// Full history; displays may show only the tail
    pub errors: Vec<String>,
    pub results: Vec<RunResultEntry>,
    pub cancel_requested: bool,
}

impl RunState {
    pub fn succeeded(&self) -> usize {
        self.results.len()
    }

    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    /// "N succeeded, M failed"
    pub fn summary_line(&self) -> String {
        format!("{} succeeded, {} failed", self.succeeded(), self.failed())
    }

    /// Last `n` results, oldest first
    pub fn recent_results(&self, n: usize) -> &[RunResultEntry] {
        let start = self.results.len().saturating_sub(n);
        &self.results[start..]
    }

    /// Last `n` errors, oldest first
    pub fn recent_errors(&self, n: usize) -> &[String] {
        let start = self.errors.len().saturating_sub(n);
        &self.errors[start..]
    }
}

/// Partial update merged into [`RunState`]
///
/// `completed` and `current_label` replace; `error` and `result` append.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunUpdate {
    pub completed: Option<u32>,
    pub current_label: Option<String>,
    pub error: Option<String>,
    pub result: Option<RunResultEntry>,
}

impl RunUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed(mut self, completed: u32) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.current_label = Some(label.into());
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn result(mut self, site: impl Into<String>, title: impl Into<String>) -> Self {
        self.result = Some(RunResultEntry {
            site: site.into(),
            title: title.into(),
        });
        self
    }
}

/// Cloneable handle that can request cancellation of the current run
#[derive(Debug, Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
    state: Arc<watch::Sender<RunState>>,
}

impl CancelHandle {
    /// Idempotent; observed at the next iteration boundary
    pub fn request_cancel(&self) {
        if !self.flag.swap(true, Ordering::SeqCst) {
            self.state.send_modify(|state| state.cancel_requested = true);
        }
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Publishes [`RunState`] to observers
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    state: Arc<watch::Sender<RunState>>,
    cancel: Arc<AtomicBool>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(RunState::default());
        Self {
            state: Arc::new(tx),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replace any previous state with a fresh running state
    pub fn start(&self, total: u32) {
        self.cancel.store(false, Ordering::SeqCst);
        self.state.send_replace(RunState {
            is_running: true,
            total,
            ..RunState::default()
        });
    }

    /// Merge a partial update
    ///
    /// `completed` never decreases and never exceeds `total`.
    pub fn update(&self, update: RunUpdate) {
        self.state.send_modify(|state| {
            if let Some(completed) = update.completed {
                state.completed = completed.clamp(state.completed, state.total.max(state.completed));
            }
            if let Some(label) = update.current_label {
                state.current_label = Some(label);
            }
            if let Some(error) = update.error {
                state.errors.push(error);
            }
            if let Some(result) = update.result {
                state.results.push(result);
            }
        });
    }

    /// Mark the run finished and return the final state
    pub fn finish(&self) -> RunState {
        self.state.send_modify(|state| {
            state.is_running = false;
            state.current_label = None;
        });
        self.snapshot()
    }

    pub fn request_cancel(&self) {
        self.cancel_handle().request_cancel();
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: Arc::clone(&self.cancel),
            state: Arc::clone(&self.state),
        }
    }

    /// Request cancellation when `signal` resolves
    ///
    /// `start` clears any earlier cancel, so a signal that fires before the
    /// run has started is held until the state reports `is_running`.
    pub fn cancel_on<F>(&self, signal: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel = self.cancel_handle();
        let mut state = self.subscribe();
        tokio::spawn(async move {
            signal.await;
            if state.wait_for(|s| s.is_running).await.is_ok() {
                cancel.request_cancel();
            }
        })
    }

    pub fn snapshot(&self) -> RunState {
        self.state.borrow().clone()
    }

    /// Receive every state change
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Shorten a label for display, appending "..." when cut
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let mut truncated: String = label.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

/// Format an error entry as "<label>: <message>"
pub fn format_error_entry(label: &str, message: &str) -> String {
    format!("{}: {}", truncate_label(label, ERROR_LABEL_MAX_CHARS), message)
}
