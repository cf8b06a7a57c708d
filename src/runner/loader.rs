//! Loader-resident process spawning
//!
//! Launches the FFmpeg binary through the platform dynamic loader
//! (`ld-linux` on glibc systems, `linker64` on Android). The loader maps the
//! binary as if it were a shared object and runs its entry point, which
//! sidesteps `noexec` mounts on the directory holding the binary. The
//! process-level contract is identical to the other runners.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;

use super::{launch, LaunchSpec, ProcessRunner, RunEvent, RunHandle, SPAWN_FAILURE_CODE};
use crate::dispatch::Strategy;

/// Well-known dynamic loader locations, most specific first
const LOADER_CANDIDATES: &[&str] = &[
    "/system/bin/linker64",
    "/system/bin/linker",
    "/lib64/ld-linux-x86-64.so.2",
    "/lib/ld-linux-aarch64.so.1",
    "/lib/ld-linux-armhf.so.3",
    "/lib/ld-musl-x86_64.so.1",
    "/lib/ld-musl-aarch64.so.1",
];

/// Locate the platform dynamic loader, if one exists
pub fn find_loader() -> Option<PathBuf> {
    LOADER_CANDIDATES
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
}

/// Dynamic-loader runner
#[derive(Debug)]
pub struct LoaderRunner {
    loader: Option<PathBuf>,
}

impl LoaderRunner {
    /// Create a runner using the auto-detected platform loader
    pub fn new() -> Self {
        Self {
            loader: find_loader(),
        }
    }

    /// Create a runner with an explicit loader path
    pub fn with_loader(loader: impl Into<PathBuf>) -> Self {
        Self {
            loader: Some(loader.into()),
        }
    }

    /// Whether a loader is available on this platform
    pub fn is_available(&self) -> bool {
        self.loader.is_some()
    }
}

impl Default for LoaderRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessRunner for LoaderRunner {
    fn strategy(&self) -> Strategy {
        Strategy::LoaderResident
    }

    async fn run(&self, spec: &LaunchSpec, events: UnboundedSender<RunEvent>) -> RunHandle {
        let loader = match &self.loader {
            Some(loader) => loader,
            None => {
                warn!("no dynamic loader found on this platform");
                let _ = events.send(RunEvent::Exited(SPAWN_FAILURE_CODE));
                return RunHandle::failed();
            }
        };

        debug!(
            "loader exec via {}: {}",
            loader.display(),
            spec.binary.display()
        );
        let mut command = Command::new(loader);
        command.arg(&spec.binary).args(&spec.args);
        launch(command, events, Strategy::LoaderResident)
    }
}
