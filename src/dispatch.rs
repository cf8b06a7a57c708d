//! Execution strategy selection and fallback
//!
//! Platforms differ in how (and whether) they allow executing a binary that
//! the application itself installed. The dispatcher holds an ordered list of
//! [`ProcessRunner`] variants, chosen by a capability probe, and walks that
//! list when a strategy fails to launch: a sentinel exit
//! ([`SPAWN_FAILURE_CODE`]) observed before any real output advances to the
//! next strategy. Once a strategy has produced output or a non-sentinel
//! exit it is pinned, since re-running a command that may have partially
//! executed is never safe.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::time::timeout;

use crate::runner::direct::DirectRunner;
use crate::runner::loader::{find_loader, LoaderRunner};
use crate::runner::shell::ShellRunner;
use crate::runner::{LaunchSpec, ProcessRunner, RunEvent, RunHandle, SPAWN_FAILURE_CODE};

/// How long to watch a freshly launched process for an exec failure before
/// considering the strategy taken
const PROBATION_WINDOW: Duration = Duration::from_millis(200);

/// A platform-compatible method of launching the binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Plain argv exec of the binary
    Direct,
    /// Wrapped through the command interpreter (`sh -c`)
    ShellWrapped,
    /// Launched via the platform dynamic loader
    LoaderResident,
}

/// Determine the strategy order for a given binary.
///
/// A binary with the exec bit set gets the direct strategy first; otherwise
/// direct goes last as a final resort. The loader strategy is only listed
/// when a dynamic loader exists on this platform.
pub fn probe_strategies(binary: Option<&Path>) -> Vec<Strategy> {
    let directly_executable = binary.map(is_executable).unwrap_or(true);

    let mut order = Vec::with_capacity(3);
    if directly_executable {
        order.push(Strategy::Direct);
    }
    order.push(Strategy::ShellWrapped);
    if find_loader().is_some() {
        order.push(Strategy::LoaderResident);
    }
    if !directly_executable {
        order.push(Strategy::Direct);
    }
    order
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.exists()
}

/// Ordered strategy chain with pre-launch fallback
pub struct StrategyDispatcher {
    runners: Vec<Box<dyn ProcessRunner>>,
}

impl StrategyDispatcher {
    /// Dispatcher with the probed default order
    pub fn new() -> Self {
        Self::with_order(&probe_strategies(None), None)
    }

    /// Dispatcher probed for a specific binary
    pub fn for_binary(binary: &Path) -> Self {
        Self::with_order(&probe_strategies(Some(binary)), None)
    }

    /// Dispatcher with an explicit strategy order and optional shell override
    pub fn with_order(order: &[Strategy], shell: Option<&Path>) -> Self {
        let mut runners: Vec<Box<dyn ProcessRunner>> = Vec::with_capacity(order.len());
        for strategy in order {
            match strategy {
                Strategy::Direct => runners.push(Box::new(DirectRunner::new())),
                Strategy::ShellWrapped => runners.push(Box::new(match shell {
                    Some(shell) => ShellRunner::with_shell(shell),
                    None => ShellRunner::new(),
                })),
                Strategy::LoaderResident => runners.push(Box::new(LoaderRunner::new())),
            }
        }
        Self::from_runners(runners)
    }

    /// Dispatcher over arbitrary runners (primarily a test seam)
    pub fn from_runners(runners: Vec<Box<dyn ProcessRunner>>) -> Self {
        let runners = if runners.is_empty() {
            vec![Box::new(DirectRunner::new()) as Box<dyn ProcessRunner>]
        } else {
            runners
        };
        Self { runners }
    }

    /// Strategies in the order they will be tried
    pub fn strategies(&self) -> Vec<Strategy> {
        self.runners.iter().map(|r| r.strategy()).collect()
    }

    /// Launch `spec`, falling back across strategies on pre-launch failure.
    ///
    /// Resolves once a strategy has taken (first output line, exit, or a
    /// short probation window passing), forwarding all further events to
    /// `events`. When every strategy reports a sentinel spawn failure, a
    /// single `Exited(SPAWN_FAILURE_CODE)` is forwarded to the caller.
    pub async fn dispatch(
        &self,
        spec: &LaunchSpec,
        events: UnboundedSender<RunEvent>,
    ) -> RunHandle {
        let count = self.runners.len();

        for (idx, runner) in self.runners.iter().enumerate() {
            let is_last = idx + 1 == count;
            let (inner_tx, mut inner_rx) = unbounded_channel();
            let handle = runner.run(spec, inner_tx).await;

            // Nothing was spawned at all
            if handle.pid().is_none() && handle.has_exited() {
                if !is_last {
                    debug!(
                        "{:?} failed to launch, falling back to next strategy",
                        runner.strategy()
                    );
                    continue;
                }
                warn!("all execution strategies exhausted");
                let _ = events.send(RunEvent::Exited(SPAWN_FAILURE_CODE));
                return handle;
            }

            // The process exists; watch briefly for an exec failure that
            // surfaces as a sentinel exit before any output
            match timeout(PROBATION_WINDOW, inner_rx.recv()).await {
                Ok(Some(RunEvent::Exited(code))) if code == SPAWN_FAILURE_CODE && !is_last => {
                    debug!(
                        "{:?} exited with sentinel before output, falling back",
                        runner.strategy()
                    );
                    continue;
                }
                Ok(Some(event)) => {
                    let _ = events.send(event);
                }
                Ok(None) => {
                    // Event channel closed without a single event
                    if !is_last {
                        continue;
                    }
                    let _ = events.send(RunEvent::Exited(SPAWN_FAILURE_CODE));
                    return handle;
                }
                Err(_) => {
                    // Quiet so far; the strategy has taken
                }
            }

            info!("command launched via {:?}", runner.strategy());
            let tx = events.clone();
            tokio::spawn(async move {
                while let Some(event) = inner_rx.recv().await {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
            });
            return handle;
        }

        unreachable!("dispatcher always holds at least one runner")
    }
}

impl Default for StrategyDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
