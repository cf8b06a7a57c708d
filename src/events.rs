//! Execution event system
//!
//! Hosts that want to observe sessions without polling the session manager
//! can subscribe to an [`ExecEventBus`]. The facade publishes an event for
//! every significant session transition: launch, output line, progress
//! sample, completion, and termination.

use tokio::sync::broadcast;

use crate::progress::ProgressUpdate;
use crate::session::SessionId;

/// Events published during command execution
#[derive(Debug, Clone)]
pub enum ExecEvent {
    /// A session's process was launched
    Started {
        /// Session identifier
        session_id: SessionId,
        /// OS process id, if known
        pid: Option<u32>,
    },
    /// One line of process output
    Output {
        /// Session identifier
        session_id: SessionId,
        /// The output line
        line: String,
    },
    /// A decoded progress sample
    Progress {
        /// Session identifier
        session_id: SessionId,
        /// The sample
        update: ProgressUpdate,
    },
    /// The session reached a terminal state
    Completed {
        /// Session identifier
        session_id: SessionId,
        /// Process exit code (sentinel 127 when nothing launched)
        exit_code: i32,
    },
    /// The session's process was killed on caller request
    Terminated {
        /// Session identifier
        session_id: SessionId,
    },
}

/// Subscription handle for receiving execution events
pub struct ExecEventSubscription {
    receiver: broadcast::Receiver<ExecEvent>,
}

impl ExecEventSubscription {
    /// Receive the next event, waiting if necessary
    pub async fn recv(&mut self) -> Option<ExecEvent> {
        match self.receiver.recv().await {
            Ok(event) => Some(event),
            Err(broadcast::error::RecvError::Closed) => None,
            Err(broadcast::error::RecvError::Lagged(count)) => {
                warn!("execution event subscriber lagged by {} events", count);
                self.receiver.recv().await.ok()
            }
        }
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Option<ExecEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(broadcast::error::TryRecvError::Empty) => None,
            Err(broadcast::error::TryRecvError::Closed) => None,
            Err(broadcast::error::TryRecvError::Lagged(count)) => {
                warn!("execution event subscriber lagged by {} events", count);
                self.try_recv()
            }
        }
    }
}

/// Broadcast bus for execution events
#[derive(Clone)]
pub struct ExecEventBus {
    sender: broadcast::Sender<ExecEvent>,
}

impl ExecEventBus {
    /// Create a new event bus with the specified buffer capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to execution events
    pub fn subscribe(&self) -> ExecEventSubscription {
        ExecEventSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Publish an event to all subscribers. A bus with no subscribers
    /// silently drops events.
    pub fn publish(&self, event: ExecEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for ExecEventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
