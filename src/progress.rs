//! FFmpeg progress parsing
//!
//! FFmpeg reports encoding progress as text lines (usually on stderr):
//!
//! ```text
//! frame= 1234 fps=25.0 q=28.0 size= 1234kB time=00:01:30.50 bitrate= 123.4kbits/s speed=1.23x
//! ```
//!
//! [`ProgressParser`] is a small stateful parser that remembers the total
//! duration (from the first `Duration: HH:MM:SS.CC` header line) and the last
//! observed elapsed time, and turns progress lines into [`ProgressUpdate`]
//! samples. A sample is only emitted when the elapsed time strictly advances,
//! which suppresses duplicate reports when the same line shows up on both
//! stdout and stderr.
//!
//! Parsers are per-execution; call [`ProgressParser::reset`] before reuse.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Duration:\s*(\d{2}):(\d{2}):(\d{2})\.(\d{2})").expect("valid duration regex")
});
static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"time=(\d{2}):(\d{2}):(\d{2})\.(\d{2})").expect("valid time regex"));
static FPS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"fps=\s*([\d.]+)").expect("valid fps regex"));
static SPEED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"speed=\s*([\d.]+)x").expect("valid speed regex"));
static BITRATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"bitrate=\s*([\d.]+)kbits/s").expect("valid bitrate regex"));
static SIZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"size=\s*(\d+)kB").expect("valid size regex"));
static FRAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"frame=\s*(\d+)").expect("valid frame regex"));

/// A point-in-time progress sample decoded from one output line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Elapsed processing time in milliseconds
    pub time_ms: u64,
    /// Total input duration in milliseconds (0 until the header line is seen)
    pub total_duration_ms: u64,
    /// Percentage complete, clamped to [0, 100]; 0 when total is unknown
    pub percentage: f32,
    /// Instantaneous frames per second
    pub fps: f32,
    /// Processing speed multiplier (1.0 = realtime)
    pub speed: f32,
    /// Output bitrate in kbit/s
    pub bitrate_kbps: f64,
    /// Cumulative output size in bytes
    pub size_bytes: u64,
    /// Current frame number
    pub frame: u64,
}

impl ProgressUpdate {
    /// Progress as a fraction in [0, 1]
    pub fn fraction(&self) -> f32 {
        self.percentage / 100.0
    }

    /// Remaining input time in milliseconds
    pub fn remaining_ms(&self) -> u64 {
        self.total_duration_ms.saturating_sub(self.time_ms)
    }

    /// Estimated wall-clock time remaining, scaled by the speed multiplier
    pub fn eta_ms(&self) -> u64 {
        if self.speed > 0.0 {
            (self.remaining_ms() as f64 / self.speed as f64) as u64
        } else {
            self.remaining_ms()
        }
    }

    /// Elapsed time formatted as `HH:MM:SS`
    pub fn formatted_time(&self) -> String {
        format_hms(self.time_ms)
    }

    /// Total duration formatted as `HH:MM:SS`
    pub fn formatted_total(&self) -> String {
        format_hms(self.total_duration_ms)
    }
}

/// Format a millisecond count as `HH:MM:SS`
pub fn format_hms(milliseconds: u64) -> String {
    let seconds = milliseconds / 1000;
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Stateful parser for FFmpeg progress output
#[derive(Debug, Default)]
pub struct ProgressParser {
    total_duration_ms: u64,
    last_time_ms: u64,
}

impl ProgressParser {
    /// Create a parser with no known duration
    pub fn new() -> Self {
        Self::default()
    }

    /// Total input duration parsed so far (0 if not yet seen)
    pub fn total_duration_ms(&self) -> u64 {
        self.total_duration_ms
    }

    /// Parse one output line, returning a sample when progress advanced.
    ///
    /// The same line may carry both a duration header and a progress marker;
    /// both are honored.
    pub fn parse_line(&mut self, line: &str) -> Option<ProgressUpdate> {
        if self.total_duration_ms == 0 {
            if let Some(duration) = parse_timestamp(&DURATION_RE, line) {
                self.total_duration_ms = duration;
            }
        }

        let time_ms = parse_timestamp(&TIME_RE, line)?;

        // Suppress duplicate or out-of-order reports from interleaved streams
        if time_ms <= self.last_time_ms {
            return None;
        }
        self.last_time_ms = time_ms;

        let fps = capture_f32(&FPS_RE, line);
        let speed = capture_f32(&SPEED_RE, line);
        let bitrate_kbps = capture_f64(&BITRATE_RE, line);
        let size_bytes = capture_u64(&SIZE_RE, line) * 1024;
        let frame = capture_u64(&FRAME_RE, line);

        let percentage = if self.total_duration_ms > 0 {
            ((time_ms as f32 / self.total_duration_ms as f32) * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        Some(ProgressUpdate {
            time_ms,
            total_duration_ms: self.total_duration_ms,
            percentage,
            fps,
            speed,
            bitrate_kbps,
            size_bytes,
            frame,
        })
    }

    /// Clear parser state for reuse with a new command
    pub fn reset(&mut self) {
        self.total_duration_ms = 0;
        self.last_time_ms = 0;
    }
}

/// Extract an `HH:MM:SS.CC` timestamp as milliseconds using the given pattern
fn parse_timestamp(re: &Regex, line: &str) -> Option<u64> {
    let caps = re.captures(line)?;
    let hours: u64 = caps[1].parse().ok()?;
    let minutes: u64 = caps[2].parse().ok()?;
    let seconds: u64 = caps[3].parse().ok()?;
    let centiseconds: u64 = caps[4].parse().ok()?;
    Some((hours * 3600 + minutes * 60 + seconds) * 1000 + centiseconds * 10)
}

fn capture_f32(re: &Regex, line: &str) -> f32 {
    re.captures(line)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0.0)
}

fn capture_f64(re: &Regex, line: &str) -> f64 {
    re.captures(line)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0.0)
}

fn capture_u64(re: &Regex, line: &str) -> u64 {
    re.captures(line)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0)
}
