//! Shell-wrapped process spawning
//!
//! Launches the FFmpeg binary through `sh -c`. Some platforms refuse a
//! direct exec of binaries in application-writable directories but still
//! allow the system shell to start them; this wrapper works around that.
//! `exec` replaces the shell so the reported pid is FFmpeg's own, which
//! keeps termination working.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;

use super::{launch, LaunchSpec, ProcessRunner, RunEvent, RunHandle};
use crate::command::join_command;
use crate::dispatch::Strategy;

/// Default shell used for wrapped execution
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// `sh -c` wrapped runner
#[derive(Debug)]
pub struct ShellRunner {
    shell: PathBuf,
}

impl ShellRunner {
    /// Create a runner using the default shell
    pub fn new() -> Self {
        Self {
            shell: PathBuf::from(DEFAULT_SHELL),
        }
    }

    /// Create a runner using a specific shell program
    pub fn with_shell(shell: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessRunner for ShellRunner {
    fn strategy(&self) -> Strategy {
        Strategy::ShellWrapped
    }

    async fn run(&self, spec: &LaunchSpec, events: UnboundedSender<RunEvent>) -> RunHandle {
        let script = format!(
            "exec {} {}",
            spec.binary.display(),
            join_command(&spec.args)
        );
        debug!("shell exec via {}: {}", self.shell.display(), script);

        let mut command = Command::new(&self.shell);
        command.arg("-c").arg(script);
        launch(command, events, Strategy::ShellWrapped)
    }
}
