//! Session tracking
//!
//! Every submitted command becomes a [`Session`] owned by the
//! [`SessionManager`]. The manager is the single piece of shared mutable
//! state in the crate: an explicitly constructed, injected registry (one
//! `RwLock`-guarded map) rather than a process-global. Callers only ever
//! receive cloned [`Session`] snapshots.
//!
//! Session lifecycle: `Running` → `Completed` | `Failed` | `Cancelled`.
//! All three right-hand states are terminal; updates arriving after a
//! terminal transition are ignored. Sessions are never garbage-collected;
//! they are removed only by [`SessionManager::clear_finished`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::runner::RunHandle;

/// Unique, monotonically increasing session identifier
pub type SessionId = u64;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Command is executing
    #[default]
    Running,
    /// Command finished with exit code 0
    Completed,
    /// Command finished with a non-zero exit code or never launched
    Failed,
    /// Command was cancelled by caller request
    Cancelled,
}

impl SessionState {
    /// Whether this state admits no further transitions
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionState::Running)
    }
}

/// Read-only snapshot of one tracked execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier for the process lifetime
    pub id: SessionId,
    /// Caller-supplied description
    pub description: String,
    /// The original command string
    pub command: String,
    /// When the command was submitted
    pub start_time: DateTime<Utc>,
    /// When the session reached a terminal state (None while running)
    pub end_time: Option<DateTime<Utc>>,
    /// Current lifecycle state
    pub state: SessionState,
    /// Last progress fraction in [0, 1]
    pub progress: f32,
    /// Last output line observed
    pub last_output: String,
}

impl Session {
    fn new(id: SessionId, command: &str, description: &str) -> Self {
        Self {
            id,
            description: description.to_string(),
            command: command.to_string(),
            start_time: Utc::now(),
            end_time: None,
            state: SessionState::Running,
            progress: 0.0,
            last_output: String::new(),
        }
    }

    /// Whether the session is still running
    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Wall-clock duration; still growing while running
    pub fn duration(&self) -> chrono::Duration {
        self.end_time.unwrap_or_else(Utc::now) - self.start_time
    }

    /// Progress as a whole percentage
    pub fn progress_percentage(&self) -> u32 {
        (self.progress * 100.0).round() as u32
    }
}

struct SessionEntry {
    session: Session,
    handle: Option<RunHandle>,
    cancel_flag: Arc<AtomicBool>,
}

/// Registry of all in-flight and finished sessions
pub struct SessionManager {
    next_id: AtomicU64,
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
}

impl SessionManager {
    /// Create an empty session manager
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new running session and return its identifier.
    ///
    /// Identifiers are allocated from an atomic counter, so concurrent
    /// registrations always get distinct, never-reused ids.
    pub async fn register(&self, command: &str, description: &str) -> SessionId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let entry = SessionEntry {
            session: Session::new(id, command, description),
            handle: None,
            cancel_flag: Arc::new(AtomicBool::new(false)),
        };
        self.sessions.write().await.insert(id, entry);
        debug!("registered session {} for command: {}", id, command);
        id
    }

    /// Associate the launched process handle with a session
    pub async fn attach_handle(&self, id: SessionId, handle: RunHandle) {
        if let Some(entry) = self.sessions.write().await.get_mut(&id) {
            entry.handle = Some(handle);
        }
    }

    /// The cancellation flag for a session, used to suppress late output
    pub async fn cancel_flag(&self, id: SessionId) -> Option<Arc<AtomicBool>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .map(|e| e.cancel_flag.clone())
    }

    /// Transition a session's state. Terminal states absorb: once a session
    /// is completed, failed, or cancelled, further transitions are ignored.
    /// Missing sessions are a no-op.
    pub async fn update_state(&self, id: SessionId, state: SessionState) {
        if let Some(entry) = self.sessions.write().await.get_mut(&id) {
            if entry.session.state.is_terminal() {
                return;
            }
            entry.session.state = state;
            if state.is_terminal() {
                entry.session.end_time = Some(Utc::now());
            }
        }
    }

    /// Record the latest progress fraction (clamped to [0, 1])
    pub async fn update_progress(&self, id: SessionId, fraction: f32) {
        if let Some(entry) = self.sessions.write().await.get_mut(&id) {
            entry.session.progress = fraction.clamp(0.0, 1.0);
        }
    }

    /// Record the most recent output line
    pub async fn update_last_output(&self, id: SessionId, line: &str) {
        if let Some(entry) = self.sessions.write().await.get_mut(&id) {
            entry.session.last_output = line.to_string();
        }
    }

    /// Request termination of a running session's process.
    ///
    /// Returns `true` when a running process was associated and has been
    /// signalled; the session transitions to `Cancelled`. Returns `false`
    /// for unknown sessions, sessions without a process, or sessions that
    /// already reached a terminal state.
    pub async fn cancel(&self, id: SessionId) -> bool {
        let mut sessions = self.sessions.write().await;
        let Some(entry) = sessions.get_mut(&id) else {
            return false;
        };
        if entry.session.state.is_terminal() {
            return false;
        }
        let Some(handle) = &entry.handle else {
            return false;
        };

        entry.cancel_flag.store(true, Ordering::SeqCst);
        handle.terminate();
        entry.session.state = SessionState::Cancelled;
        entry.session.end_time = Some(Utc::now());
        info!("cancelled session {}", id);
        true
    }

    /// Cancel every session currently running; returns how many were hit
    pub async fn cancel_all(&self) -> usize {
        let ids: Vec<SessionId> = {
            let sessions = self.sessions.read().await;
            sessions
                .values()
                .filter(|e| e.session.is_running())
                .map(|e| e.session.id)
                .collect()
        };

        let mut cancelled = 0;
        for id in ids {
            if self.cancel(id).await {
                cancelled += 1;
            }
        }
        cancelled
    }

    /// Snapshot of one session
    pub async fn get(&self, id: SessionId) -> Option<Session> {
        self.sessions
            .read()
            .await
            .get(&id)
            .map(|e| e.session.clone())
    }

    /// Snapshots of all sessions, running or finished
    pub async fn all_sessions(&self) -> Vec<Session> {
        self.sessions
            .read()
            .await
            .values()
            .map(|e| e.session.clone())
            .collect()
    }

    /// Snapshots of sessions still running
    pub async fn running_sessions(&self) -> Vec<Session> {
        self.sessions
            .read()
            .await
            .values()
            .filter(|e| e.session.is_running())
            .map(|e| e.session.clone())
            .collect()
    }

    /// How many sessions are currently running
    pub async fn running_count(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|e| e.session.is_running())
            .count()
    }

    /// Remove every session not in the running state; returns removed count
    pub async fn clear_finished(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, e| e.session.is_running());
        before - sessions.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
