//! Media information parsing
//!
//! FFmpeg prints a description of its inputs before transcoding (and when
//! probed with `-i <file> -f null -`). This module parses that banner into
//! structured stream metadata. Parsing is line oriented and tolerant: lines
//! that match nothing are skipped.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Duration: (\d{2}):(\d{2}):(\d{2})\.(\d{2})").expect("valid duration regex")
});
static BITRATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"bitrate: (\d+) kb/s").expect("valid bitrate regex"));
static VIDEO_CODEC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Video: ([^\s(,]+)").expect("valid video codec regex"));
// Two digits minimum per side, or codec fourcc tags like `0x31637661`
// would match first
static RESOLUTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{2,5})x(\d{2,5})").expect("valid resolution regex"));
static FPS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+\.?\d*) fps").expect("valid fps regex"));
static AUDIO_CODEC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Audio: ([^\s(,]+)").expect("valid audio codec regex"));
static SAMPLE_RATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+) Hz").expect("valid sample rate regex"));
static CHANNELS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(mono|stereo|\d+\.\d+)").expect("valid channels regex"));

/// A video stream described in the FFmpeg banner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoStream {
    /// Codec name (e.g. `h264`)
    pub codec: String,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Frame rate in frames per second
    pub frame_rate: f64,
}

/// An audio stream described in the FFmpeg banner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioStream {
    /// Codec name (e.g. `aac`)
    pub codec: String,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count (mono = 1, stereo = 2)
    pub channels: u32,
}

/// Parsed description of a media file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInformation {
    /// Container duration in milliseconds
    pub duration_ms: u64,
    /// Overall bitrate in bits per second
    pub bitrate_bps: u64,
    /// Video streams, in banner order
    pub video_streams: Vec<VideoStream>,
    /// Audio streams, in banner order
    pub audio_streams: Vec<AudioStream>,
}

impl MediaInformation {
    /// Whether the file has at least one video stream
    pub fn is_video(&self) -> bool {
        !self.video_streams.is_empty()
    }

    /// Whether the file is audio-only
    pub fn is_audio_only(&self) -> bool {
        !self.audio_streams.is_empty() && self.video_streams.is_empty()
    }

    /// Resolution of the first video stream
    pub fn resolution(&self) -> Option<(u32, u32)> {
        self.video_streams.first().map(|s| (s.width, s.height))
    }
}

/// Build the probe command for a media file
pub fn probe_command(path: &Path) -> String {
    format!("-i \"{}\" -f null -", path.display())
}

/// Parse FFmpeg banner output into media information.
///
/// Returns `None` when the output contains no recognizable streams.
pub fn parse_media_information(output: &str) -> Option<MediaInformation> {
    if output.is_empty() {
        return None;
    }

    let mut info = MediaInformation::default();

    for line in output.lines() {
        if line.contains("Duration:") {
            if let Some(caps) = DURATION_RE.captures(line) {
                let hours: u64 = caps[1].parse().unwrap_or(0);
                let minutes: u64 = caps[2].parse().unwrap_or(0);
                let seconds: u64 = caps[3].parse().unwrap_or(0);
                let centis: u64 = caps[4].parse().unwrap_or(0);
                info.duration_ms =
                    (hours * 3600 + minutes * 60 + seconds) * 1000 + centis * 10;
            }
            if let Some(caps) = BITRATE_RE.captures(line) {
                info.bitrate_bps = caps[1].parse::<u64>().unwrap_or(0) * 1000;
            }
        } else if line.contains("Stream") && line.contains("Video:") {
            let mut stream = VideoStream::default();
            if let Some(caps) = VIDEO_CODEC_RE.captures(line) {
                stream.codec = caps[1].to_string();
            }
            if let Some(caps) = RESOLUTION_RE.captures(line) {
                stream.width = caps[1].parse().unwrap_or(0);
                stream.height = caps[2].parse().unwrap_or(0);
            }
            if let Some(caps) = FPS_RE.captures(line) {
                stream.frame_rate = caps[1].parse().unwrap_or(0.0);
            }
            info.video_streams.push(stream);
        } else if line.contains("Stream") && line.contains("Audio:") {
            let mut stream = AudioStream::default();
            if let Some(caps) = AUDIO_CODEC_RE.captures(line) {
                stream.codec = caps[1].to_string();
            }
            if let Some(caps) = SAMPLE_RATE_RE.captures(line) {
                stream.sample_rate = caps[1].parse().unwrap_or(0);
            }
            if let Some(caps) = CHANNELS_RE.captures(line) {
                stream.channels = match &caps[1] {
                    "mono" => 1,
                    "stereo" => 2,
                    other => other.replace('.', "").parse().unwrap_or(2),
                };
            }
            info.audio_streams.push(stream);
        }
    }

    if info.video_streams.is_empty() && info.audio_streams.is_empty() {
        None
    } else {
        Some(info)
    }
}
