//! Execution facade
//!
//! [`FFmpeg`] ties the crate together: it resolves the binary, tokenizes the
//! command, registers a session, dispatches across execution strategies, and
//! drives the caller's [`FFmpegCallback`] from the process event stream.
//!
//! The callback ordering contract holds for every execution, including ones
//! where nothing was ever spawned:
//!
//! 1. `on_start`: exactly once, before anything else
//! 2. `on_output` / `on_progress`: zero or more, interleaved
//! 3. exactly one of `on_success` / `on_failure`
//! 4. `on_finish`: exactly once, always last
//!
//! A completion latch guards step 3, so no code path can report both
//! outcomes or report one twice. One caveat is inherent to the design:
//! because output readers and the exit waiter run independently, the
//! terminal callback can fire while a few buffered output lines are still
//! in flight. Consumers needing every line should collect from `on_output`
//! until `on_finish`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::unbounded_channel;
use tokio::sync::oneshot;

use crate::command::split_command;
use crate::config::RunnerConfig;
use crate::dispatch::{probe_strategies, StrategyDispatcher};
use crate::error::Error;
use crate::events::{ExecEvent, ExecEventBus, ExecEventSubscription};
use crate::media::{self, MediaInformation};
use crate::progress::{ProgressParser, ProgressUpdate};
use crate::resolve::{BinaryResolver, FixedPathResolver, PathSearchResolver};
use crate::runner::{LaunchSpec, RunEvent, SPAWN_FAILURE_CODE};
use crate::session::{SessionId, SessionManager, SessionState};

/// Observer of one command execution.
///
/// All methods default to no-ops; implement only what you need. Methods are
/// invoked from the execution driver task, so keep them quick. Blocking here
/// stalls event delivery for this session.
pub trait FFmpegCallback: Send + Sync {
    /// The session was created and execution is about to begin
    fn on_start(&self, _session_id: SessionId) {}

    /// One line of process output (stdout or stderr)
    fn on_output(&self, _session_id: SessionId, _line: &str) {}

    /// A progress sample was decoded from the output
    fn on_progress(&self, _session_id: SessionId, _update: &ProgressUpdate) {}

    /// The process exited with code 0. The result carries the collected
    /// stdout and stderr, which matters for fire-and-forget executions
    /// where no [`ExecutionResult`] is returned to the caller.
    fn on_success(&self, _session_id: SessionId, _result: &ExecutionResult) {}

    /// The execution failed, never launched, or was cancelled
    fn on_failure(&self, _session_id: SessionId, _error: &Error) {}

    /// Execution is over; always the final call, whatever the outcome
    fn on_finish(&self, _session_id: SessionId) {}
}

/// No-op callback for fire-and-forget executions
pub struct NullCallback;

impl FFmpegCallback for NullCallback {}

/// Why an execution did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No binary could be resolved; nothing was spawned
    Installation,
    /// Every launch strategy failed, or the command was empty
    Spawn,
    /// The process ran and exited with a non-zero code
    Runtime,
    /// The process was killed on caller request
    Cancelled,
}

/// Outcome of one execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// The session this execution ran under
    pub session_id: SessionId,
    /// Process exit code (sentinel 127 when nothing launched)
    pub exit_code: i32,
    /// Collected stdout lines
    pub stdout: Vec<String>,
    /// Collected stderr lines
    pub stderr: Vec<String>,
    /// `None` on success
    pub failure: Option<FailureKind>,
}

impl ExecutionResult {
    /// Whether the command completed with exit code 0
    pub fn success(&self) -> bool {
        self.failure.is_none()
    }

    /// All stderr output as one string
    pub fn stderr_text(&self) -> String {
        self.stderr.join("\n")
    }
}

/// High-level interface for executing FFmpeg commands.
///
/// Cheap to clone; clones share the session manager and event bus. The
/// session manager is plain injected state, so you can construct as many
/// independent facades as you like, or share one manager across several.
#[derive(Clone)]
pub struct FFmpeg {
    sessions: Arc<SessionManager>,
    resolver: Arc<dyn BinaryResolver>,
    config: RunnerConfig,
    events: ExecEventBus,
}

impl FFmpeg {
    /// Facade with default configuration and a `$PATH` search for `ffmpeg`
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Facade from explicit configuration
    pub fn with_config(config: RunnerConfig) -> Self {
        let resolver: Arc<dyn BinaryResolver> = match &config.binary_path {
            Some(path) => Arc::new(FixedPathResolver::new(path.clone())),
            None => Arc::new(PathSearchResolver::default()),
        };
        Self {
            sessions: Arc::new(SessionManager::new()),
            resolver,
            events: ExecEventBus::new(config.event_capacity),
            config,
        }
    }

    /// Replace the binary resolver
    pub fn with_resolver(mut self, resolver: Arc<dyn BinaryResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Share an existing session manager
    pub fn with_session_manager(mut self, sessions: Arc<SessionManager>) -> Self {
        self.sessions = sessions;
        self
    }

    /// The session manager tracking this facade's executions
    pub fn session_manager(&self) -> Arc<SessionManager> {
        self.sessions.clone()
    }

    /// Subscribe to execution events from all sessions
    pub fn subscribe(&self) -> ExecEventSubscription {
        self.events.subscribe()
    }

    /// Request termination of a running session
    pub async fn cancel(&self, session_id: SessionId) -> bool {
        let cancelled = self.sessions.cancel(session_id).await;
        if cancelled {
            self.events.publish(ExecEvent::Terminated { session_id });
        }
        cancelled
    }

    /// Execute a command and wait for its result.
    ///
    /// The execution is driven on a spawned task, so it runs to completion
    /// and is recorded in the session manager even if the caller gives up
    /// waiting.
    pub async fn execute(&self, command: &str, callback: Arc<dyn FFmpegCallback>) -> ExecutionResult {
        let (result_tx, result_rx) = oneshot::channel();
        let session_id = self.spawn_driver(command, "", callback, Some(result_tx)).await;
        match result_rx.await {
            Ok(result) => result,
            Err(_) => ExecutionResult {
                session_id,
                exit_code: -1,
                stdout: Vec::new(),
                stderr: Vec::new(),
                failure: Some(FailureKind::Runtime),
            },
        }
    }

    /// Execute a command without waiting; the callback observes the outcome.
    ///
    /// Returns the session id immediately, so the caller can cancel or
    /// query the execution while it runs.
    pub async fn execute_async(
        &self,
        command: &str,
        description: &str,
        callback: Arc<dyn FFmpegCallback>,
    ) -> SessionId {
        self.spawn_driver(command, description, callback, None).await
    }

    /// Probe a media file and parse its stream description.
    ///
    /// Runs `-i <path> -f null -` and parses the banner FFmpeg prints on
    /// stderr. The probe exits non-zero for unreadable files, which is fine:
    /// only the banner matters here.
    pub async fn media_information(&self, path: &std::path::Path) -> crate::Result<MediaInformation> {
        let command = media::probe_command(path);
        let result = self.execute(&command, Arc::new(NullCallback)).await;

        if result.failure == Some(FailureKind::Installation) {
            return Err(Error::BinaryNotInstalled);
        }
        if result.failure == Some(FailureKind::Spawn) {
            return Err(Error::SpawnFailed { command });
        }

        media::parse_media_information(&result.stderr_text()).ok_or_else(|| {
            Error::NoMediaStreams {
                path: path.to_path_buf(),
            }
        })
    }

    async fn spawn_driver(
        &self,
        command: &str,
        description: &str,
        callback: Arc<dyn FFmpegCallback>,
        result_tx: Option<oneshot::Sender<ExecutionResult>>,
    ) -> SessionId {
        let session_id = self.sessions.register(command, description).await;
        let facade = self.clone();
        let command = command.to_string();

        tokio::spawn(async move {
            let result = facade.drive(session_id, &command, callback.as_ref()).await;
            if let Some(tx) = result_tx {
                let _ = tx.send(result);
            }
        });

        session_id
    }

    /// Run one execution end to end, honoring the callback ordering
    /// contract on every exit path.
    async fn drive(
        &self,
        session_id: SessionId,
        command: &str,
        callback: &dyn FFmpegCallback,
    ) -> ExecutionResult {
        // Exactly one of on_success/on_failure, guarded by this latch
        let finished = AtomicBool::new(false);
        let mut result = ExecutionResult {
            session_id,
            exit_code: SPAWN_FAILURE_CODE,
            stdout: Vec::new(),
            stderr: Vec::new(),
            failure: None,
        };

        callback.on_start(session_id);

        let Some(binary) = self.resolver.resolve() else {
            warn!("session {}: no FFmpeg binary available", session_id);
            result.failure = Some(FailureKind::Installation);
            self.finish(
                session_id,
                callback,
                &finished,
                &result,
                &Error::BinaryNotInstalled,
            )
            .await;
            return result;
        };

        let args = split_command(command);
        if args.is_empty() {
            result.failure = Some(FailureKind::Spawn);
            self.finish(session_id, callback, &finished, &result, &Error::EmptyCommand)
                .await;
            return result;
        }

        let spec = LaunchSpec {
            binary: binary.clone(),
            args,
        };
        let dispatcher = self.dispatcher(&binary);
        info!(
            "session {}: executing {} {} (strategies: {:?})",
            session_id,
            binary.display(),
            command,
            dispatcher.strategies()
        );

        let (tx, mut rx) = unbounded_channel();
        let handle = dispatcher.dispatch(&spec, tx).await;
        let pid = handle.pid();
        self.sessions.attach_handle(session_id, handle).await;
        let cancel_flag = self
            .sessions
            .cancel_flag(session_id)
            .await
            .unwrap_or_else(|| Arc::new(AtomicBool::new(false)));

        self.events.publish(ExecEvent::Started { session_id, pid });

        let mut parser = ProgressParser::new();
        let mut saw_output = false;
        let mut exit_code = SPAWN_FAILURE_CODE;

        while let Some(event) = rx.recv().await {
            let line = match event {
                RunEvent::Stdout(line) => {
                    result.stdout.push(line.clone());
                    line
                }
                RunEvent::Stderr(line) => {
                    result.stderr.push(line.clone());
                    line
                }
                RunEvent::Exited(code) => {
                    exit_code = code;
                    break;
                }
            };
            saw_output = true;

            // Output arriving after cancellation is recorded but no longer
            // surfaced to the caller
            if cancel_flag.load(Ordering::SeqCst) {
                continue;
            }

            self.sessions.update_last_output(session_id, &line).await;
            callback.on_output(session_id, &line);
            self.events.publish(ExecEvent::Output {
                session_id,
                line: line.clone(),
            });

            if let Some(update) = parser.parse_line(&line) {
                self.sessions
                    .update_progress(session_id, update.fraction())
                    .await;
                callback.on_progress(session_id, &update);
                self.events.publish(ExecEvent::Progress { session_id, update });
            }
        }

        result.exit_code = exit_code;
        let cancelled = cancel_flag.load(Ordering::SeqCst);

        let (state, failure, error) = if cancelled {
            (
                SessionState::Cancelled,
                Some(FailureKind::Cancelled),
                Error::Cancelled,
            )
        } else if exit_code == 0 {
            (SessionState::Completed, None, Error::Other(String::new()))
        } else if exit_code == SPAWN_FAILURE_CODE && !saw_output {
            (
                SessionState::Failed,
                Some(FailureKind::Spawn),
                Error::SpawnFailed {
                    command: command.to_string(),
                },
            )
        } else {
            let tail: Vec<&str> = result
                .stderr
                .iter()
                .rev()
                .take(5)
                .map(String::as_str)
                .collect();
            (
                SessionState::Failed,
                Some(FailureKind::Runtime),
                Error::ExecutionFailed {
                    exit_code,
                    stderr: tail.into_iter().rev().collect::<Vec<_>>().join("\n"),
                },
            )
        };

        result.failure = failure;
        self.sessions.update_state(session_id, state).await;
        if state == SessionState::Completed {
            self.sessions.update_progress(session_id, 1.0).await;
        }
        self.events.publish(ExecEvent::Completed {
            session_id,
            exit_code,
        });

        self.finish(session_id, callback, &finished, &result, &error).await;
        result
    }

    /// Deliver the terminal callback pair: one of on_success/on_failure,
    /// then on_finish. The latch makes the pair fire at most once.
    async fn finish(
        &self,
        session_id: SessionId,
        callback: &dyn FFmpegCallback,
        finished: &AtomicBool,
        result: &ExecutionResult,
        error: &Error,
    ) {
        if finished.swap(true, Ordering::SeqCst) {
            return;
        }
        if result.failure.is_none() {
            debug!("session {} completed successfully", session_id);
            callback.on_success(session_id, result);
        } else {
            debug!("session {} failed: {}", session_id, error);
            if self.sessions.get(session_id).await.map(|s| s.is_running()) == Some(true) {
                self.sessions
                    .update_state(session_id, SessionState::Failed)
                    .await;
            }
            callback.on_failure(session_id, error);
        }
        callback.on_finish(session_id);
    }

    fn dispatcher(&self, binary: &std::path::Path) -> StrategyDispatcher {
        let order = match &self.config.strategy_order {
            Some(order) => order.clone(),
            None => probe_strategies(Some(binary)),
        };
        StrategyDispatcher::with_order(&order, self.config.shell.as_deref())
    }
}

impl Default for FFmpeg {
    fn default() -> Self {
        Self::new()
    }
}
