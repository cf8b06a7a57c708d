//! FFmpeg binary resolution
//!
//! Installation and extraction of the binary are someone else's job; this
//! crate only needs a resolved executable path. [`BinaryResolver`] is the
//! seam to that installer: implement it to point the facade at wherever the
//! binary lives. Two stock implementations cover the common cases: a fixed
//! path and a `$PATH` search.

use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::error::{Error, Result};

/// Source of the FFmpeg executable path
pub trait BinaryResolver: Send + Sync {
    /// Resolve the executable path, or `None` when the binary is not
    /// installed. Resolution failure fails an execution before any process
    /// is spawned.
    fn resolve(&self) -> Option<PathBuf>;
}

/// Resolver returning a fixed path when it exists
#[derive(Debug, Clone)]
pub struct FixedPathResolver {
    path: PathBuf,
}

impl FixedPathResolver {
    /// Create a resolver for an explicit binary location
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BinaryResolver for FixedPathResolver {
    fn resolve(&self) -> Option<PathBuf> {
        if self.path.is_file() {
            Some(self.path.clone())
        } else {
            debug!("binary not present at {}", self.path.display());
            None
        }
    }
}

/// Resolver walking the `PATH` environment variable
#[derive(Debug, Clone)]
pub struct PathSearchResolver {
    program: String,
}

impl PathSearchResolver {
    /// Search for `program` (typically `"ffmpeg"`) on the PATH
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for PathSearchResolver {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl BinaryResolver for PathSearchResolver {
    fn resolve(&self) -> Option<PathBuf> {
        let path_var = std::env::var_os("PATH")?;
        for dir in std::env::split_paths(&path_var) {
            let candidate = dir.join(&self.program);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }
}

/// Run `<binary> -version` and return the reported version line.
///
/// Useful after installation to confirm the binary actually executes on
/// this platform.
pub async fn verify_binary(path: &Path) -> Result<String> {
    let output = Command::new(path)
        .arg("-version")
        .output()
        .await
        .map_err(|e| Error::BinaryVerificationFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::BinaryVerificationFailed {
            path: path.to_path_buf(),
            reason: format!("exit code {:?}", output.status.code()),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .next()
        .map(|line| line.to_string())
        .ok_or_else(|| Error::BinaryVerificationFailed {
            path: path.to_path_buf(),
            reason: "empty version output".to_string(),
        })
}
