//! ffrunner - Asynchronous FFmpeg command execution for Rust
//!
//! This library runs FFmpeg commands as external processes and gives the
//! host application structured visibility into each run: live output,
//! decoded transcoding progress, session lifecycle tracking, and
//! cancellation.
//!
//! ## Features
//!
//! - **Callback-driven execution:** One trait observes start, output,
//!   progress, success/failure, and finish in a guaranteed order
//! - **Progress decoding:** `time=` / `Duration:` lines become percentages,
//!   ETAs, fps, speed, and size figures
//! - **Strategy fallback:** Direct exec, shell-wrapped exec, and
//!   dynamic-loader launch, tried in capability order for platforms that
//!   restrict executing app-installed binaries
//! - **Session registry:** Every run is tracked with a unique id and can be
//!   queried, listed, or cancelled from anywhere
//! - **Event bus:** Broadcast channel for observing all sessions without
//!   registering callbacks
//! - **Media probing:** Parse stream metadata out of FFmpeg's input banner
//! - **Configuration:** Optional TOML config for binary path, strategy
//!   order, and shell override
//!
//! ## Module Organization
//!
//! - [`ffmpeg`] - The execution facade and callback trait
//! - [`session`] - Session registry and lifecycle states
//! - [`progress`] - Progress line parsing
//! - [`command`] - Command string tokenization
//! - [`runner`] - Process launch variants and the event protocol
//! - [`dispatch`] - Strategy probing and fallback
//! - [`resolve`] - Binary resolution and verification
//! - [`media`] - Media information parsing
//! - [`events`] - Execution event broadcast bus
//! - [`config`] - TOML configuration
//! - [`mod@error`] - Error types and Result alias
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use ffrunner::{FFmpeg, FFmpegCallback, ProgressUpdate, SessionId};
//!
//! struct Printer;
//!
//! impl FFmpegCallback for Printer {
//!     fn on_progress(&self, _id: SessionId, update: &ProgressUpdate) {
//!         println!("{:.1}%", update.percentage);
//!     }
//! }
//!
//! # async fn run() {
//! let ffmpeg = FFmpeg::new();
//! let result = ffmpeg
//!     .execute("-i input.mp4 -c:v libx264 output.mp4", Arc::new(Printer))
//!     .await;
//! println!("exit code {}", result.exit_code);
//! # }
//! ```
//!
//! ## Architecture
//!
//! Each execution runs on its own driver task. Under it, every spawned
//! process gets two reader tasks (one per output stream, so a full pipe on
//! one can never stall the other) and an exit waiter, all feeding one
//! unbounded channel the driver consumes. Because the readers and the exit
//! waiter are independent, the terminal callback can overtake the last few
//! buffered output lines; collect output until `on_finish` if you need
//! every line.

#[macro_use]
extern crate tracing;

pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod ffmpeg;
pub mod media;
pub mod progress;
pub mod resolve;
pub mod runner;
pub mod session;

// Re-exports for core functionality
pub use error::{Error, Result};
pub use ffmpeg::{ExecutionResult, FFmpeg, FFmpegCallback, FailureKind, NullCallback};
pub use session::{Session, SessionId, SessionManager, SessionState};

// Convenience re-exports for common types
pub use config::RunnerConfig;
pub use dispatch::Strategy;
pub use events::{ExecEvent, ExecEventBus, ExecEventSubscription};
pub use media::MediaInformation;
pub use progress::{ProgressParser, ProgressUpdate};
pub use resolve::{BinaryResolver, FixedPathResolver, PathSearchResolver};

// Version information
/// The current version of ffrunner from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The crate name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// The crate description from Cargo.toml
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Initialize tracing output from the `RUST_LOG` environment variable.
///
/// Purely a convenience for binaries and examples; library users embedding
/// this crate should install their own subscriber instead.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Build a facade from the default configuration file location.
///
/// Loads `<config dir>/ffrunner/config.toml` when present, falling back to
/// defaults otherwise.
pub fn init() -> FFmpeg {
    info!("initializing {} v{}", NAME, VERSION);
    let config = RunnerConfig::load_or_default();
    FFmpeg::with_config(config)
}
