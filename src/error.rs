//! Error types and Result aliases for ffrunner

use std::fmt;
use std::path::PathBuf;

/// Result type alias for ffrunner operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ffrunner
#[derive(Debug)]
pub enum Error {
    // === Binary resolution errors ===
    /// FFmpeg binary could not be resolved
    BinaryNotInstalled,

    /// Resolved binary path does not exist
    BinaryMissing {
        path: PathBuf,
    },

    /// Binary exists but failed the version probe
    BinaryVerificationFailed {
        path: PathBuf,
        reason: String,
    },

    // === Execution errors ===
    /// Process could not be spawned by any strategy
    SpawnFailed {
        command: String,
    },

    /// Process exited with a non-zero code
    ExecutionFailed {
        exit_code: i32,
        stderr: String,
    },

    /// Execution was cancelled by caller request
    Cancelled,

    /// Session id is unknown to the session manager
    SessionNotFound {
        session_id: u64,
    },

    /// Command string was empty after tokenization
    EmptyCommand,

    // === Media probe errors ===
    /// FFmpeg output contained no recognizable media streams
    NoMediaStreams {
        path: PathBuf,
    },

    // === Configuration errors ===
    /// Failed to load configuration file
    ConfigLoadFailed {
        path: PathBuf,
        reason: String,
    },

    // === I/O and parsing errors ===
    /// I/O errors
    Io(std::io::Error),

    /// TOML parsing errors
    Toml(toml::de::Error),

    /// Regex compilation errors
    Regex(regex::Error),

    // === Generic fallback (use sparingly) ===
    /// Generic errors (for cases not yet categorized)
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BinaryNotInstalled => {
                write!(f, "FFmpeg binary is not installed or could not be resolved")
            }
            Error::BinaryMissing { path } => {
                write!(f, "FFmpeg binary not found at '{}'", path.display())
            }
            Error::BinaryVerificationFailed { path, reason } => {
                write!(
                    f,
                    "FFmpeg binary at '{}' failed verification: {}",
                    path.display(),
                    reason
                )
            }
            Error::SpawnFailed { command } => {
                write!(f, "Failed to spawn FFmpeg for command '{}'", command)
            }
            Error::ExecutionFailed { exit_code, stderr } => {
                write!(f, "FFmpeg exited with code {}: {}", exit_code, stderr)
            }
            Error::Cancelled => {
                write!(f, "Execution was cancelled")
            }
            Error::SessionNotFound { session_id } => {
                write!(f, "Session {} not found", session_id)
            }
            Error::EmptyCommand => {
                write!(f, "Command cannot be empty")
            }
            Error::NoMediaStreams { path } => {
                write!(f, "No media streams found in '{}'", path.display())
            }
            Error::ConfigLoadFailed { path, reason } => {
                write!(
                    f,
                    "Failed to load config from '{}': {}",
                    path.display(),
                    reason
                )
            }
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Toml(err) => write!(f, "TOML parsing error: {}", err),
            Error::Regex(err) => write!(f, "Regex compilation error: {}", err),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Toml(err)
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Regex(err)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
