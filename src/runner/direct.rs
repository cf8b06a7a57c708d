//! Direct process spawning
//!
//! Launches the FFmpeg binary with a plain argv exec. This is the preferred
//! strategy wherever the platform allows executing the resolved binary.

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;

use super::{launch, LaunchSpec, ProcessRunner, RunEvent, RunHandle};
use crate::dispatch::Strategy;

/// Argv-exec runner
#[derive(Debug, Default)]
pub struct DirectRunner;

impl DirectRunner {
    /// Create a new direct runner
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for DirectRunner {
    fn strategy(&self) -> Strategy {
        Strategy::Direct
    }

    async fn run(&self, spec: &LaunchSpec, events: UnboundedSender<RunEvent>) -> RunHandle {
        debug!(
            "direct exec: {} {}",
            spec.binary.display(),
            spec.args.join(" ")
        );
        let mut command = Command::new(&spec.binary);
        command.args(&spec.args);
        launch(command, events, Strategy::Direct)
    }
}
