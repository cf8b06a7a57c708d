//! Process execution
//!
//! A [`ProcessRunner`] spawns the FFmpeg binary and streams its output.
//! All variants satisfy one contract: stdout and stderr are drained
//! line-by-line by independent readers (so a full pipe on one stream can
//! never deadlock the other), and a single `Exited` event is delivered when
//! the process terminates. A runner never fails to return: when the process
//! cannot be spawned at all it reports [`SPAWN_FAILURE_CODE`] through the
//! same `Exited` event, so callers treat launch failure uniformly with a
//! non-zero exit.
//!
//! Variants differ only in how the process comes to life:
//!
//! - [`DirectRunner`](direct::DirectRunner): plain argv exec
//! - [`ShellRunner`](shell::ShellRunner): wrapped through `sh -c`
//! - [`LoaderRunner`](loader::LoaderRunner): launched via the platform
//!   dynamic loader, for filesystems mounted `noexec`

pub mod direct;
pub mod loader;
pub mod shell;

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::dispatch::Strategy;

/// Reserved exit code meaning "the process could not be launched"
pub const SPAWN_FAILURE_CODE: i32 = 127;

/// Exit code reported when the process was killed by a signal
pub const KILLED_EXIT_CODE: i32 = 255;

/// What to launch: resolved binary plus tokenized arguments
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    /// Absolute path to the FFmpeg executable
    pub binary: PathBuf,
    /// Argument vector (does not include the binary itself)
    pub args: Vec<String>,
}

/// Events streamed from a running process
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// One line of stdout
    Stdout(String),
    /// One line of stderr
    Stderr(String),
    /// Process terminated with the given exit code; delivered exactly once
    Exited(i32),
}

/// Handle to a launched process
///
/// Termination is idempotent: terminating a handle whose process already
/// exited (or that was already terminated) is a no-op.
#[derive(Debug, Clone)]
pub struct RunHandle {
    id: String,
    pid: Option<u32>,
    terminated: Arc<AtomicBool>,
    exited: Arc<AtomicBool>,
}

impl RunHandle {
    fn new(pid: Option<u32>, exited: Arc<AtomicBool>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            pid,
            terminated: Arc::new(AtomicBool::new(false)),
            exited,
        }
    }

    /// Handle for a process that never launched
    pub fn failed() -> Self {
        Self::new(None, Arc::new(AtomicBool::new(true)))
    }

    /// Handle not backed by a killable OS process.
    ///
    /// For [`ProcessRunner`] implementations that manage the child
    /// themselves and report its lifetime purely through events.
    pub fn detached() -> Self {
        Self::new(None, Arc::new(AtomicBool::new(false)))
    }

    /// Unique identifier for this launch
    pub fn id(&self) -> &str {
        &self.id
    }

    /// OS process id, if the process was spawned
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Whether the process has exited
    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::SeqCst)
    }

    /// Forcibly kill the underlying process.
    ///
    /// Cancellation is cooperative only in the sense that the OS stops the
    /// child; there is no flush period. Safe to call repeatedly.
    pub fn terminate(&self) {
        if self.exited.load(Ordering::SeqCst) || self.terminated.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(pid) = self.pid {
            #[cfg(unix)]
            {
                use nix::sys::signal::{kill, Signal};
                use nix::unistd::Pid;
                match kill(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                    Ok(()) => info!("terminated process {}", pid),
                    Err(e) => warn!("failed to kill process {}: {}", pid, e),
                }
            }
        }
    }
}

/// A platform-specific way of launching the FFmpeg binary
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// The strategy this runner implements
    fn strategy(&self) -> Strategy;

    /// Spawn the process and stream [`RunEvent`]s to `events`.
    ///
    /// Never returns an error: spawn failure is reported as an immediate
    /// `Exited(SPAWN_FAILURE_CODE)` event.
    async fn run(&self, spec: &LaunchSpec, events: UnboundedSender<RunEvent>) -> RunHandle;
}

/// Spawn `command` and wire its pipes to the event channel.
///
/// Shared scaffolding for all runner variants: two reader tasks drain stdout
/// and stderr independently, a third task awaits process exit and sends the
/// single `Exited` event.
pub(crate) fn launch(
    mut command: Command,
    events: UnboundedSender<RunEvent>,
    strategy: Strategy,
) -> RunHandle {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!("{:?} spawn failed: {}", strategy, e);
            let _ = events.send(RunEvent::Exited(SPAWN_FAILURE_CODE));
            return RunHandle::failed();
        }
    };

    let pid = child.id();
    debug!("{:?} spawned process pid={:?}", strategy, pid);

    spawn_readers(&mut child, &events);

    let exited = Arc::new(AtomicBool::new(false));
    let exited_flag = exited.clone();
    tokio::spawn(async move {
        let code = match child.wait().await {
            Ok(status) => status.code().unwrap_or(KILLED_EXIT_CODE),
            Err(e) => {
                error!("error waiting for process: {}", e);
                -1
            }
        };
        exited_flag.store(true, Ordering::SeqCst);
        info!("process pid={:?} exited with code {}", pid, code);
        let _ = events.send(RunEvent::Exited(code));
    });

    RunHandle::new(pid, exited)
}

fn spawn_readers(child: &mut Child, events: &UnboundedSender<RunEvent>) {
    if let Some(stdout) = child.stdout.take() {
        let tx = events.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        trace!("stdout: {}", line);
                        if tx.send(RunEvent::Stdout(line)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!("error reading stdout: {}", e);
                        break;
                    }
                }
            }
        });
    }

    if let Some(stderr) = child.stderr.take() {
        let tx = events.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        trace!("stderr: {}", line);
                        if tx.send(RunEvent::Stderr(line)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!("error reading stderr: {}", e);
                        break;
                    }
                }
            }
        });
    }
}
