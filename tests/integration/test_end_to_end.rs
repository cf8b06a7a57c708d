//! End-to-end executions against a fake FFmpeg binary
//!
//! A shell script standing in for FFmpeg prints a realistic banner and
//! progress lines on stderr, so the whole pipeline is exercised: binary
//! resolution, strategy dispatch, output streaming, progress decoding,
//! session bookkeeping, and the event bus.

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use ffrunner::{
    ExecEvent, FFmpeg, FFmpegCallback, ProgressUpdate, RunnerConfig, SessionId, SessionState,
};
use tempfile::TempDir;

/// Write an executable script that plays the role of the FFmpeg binary
fn fake_ffmpeg(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("ffmpeg");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn facade_for(binary: PathBuf) -> FFmpeg {
    FFmpeg::with_config(RunnerConfig {
        binary_path: Some(binary),
        ..RunnerConfig::default()
    })
}

const TRANSCODE_SCRIPT: &str = r#"
echo "Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'in.mp4':" >&2
echo "  Duration: 00:00:10.00, start: 0.000000, bitrate: 1000 kb/s" >&2
echo "  Stream #0:0: Video: h264, yuv420p, 1280x720, 25 fps" >&2
echo "frame=   62 fps=25.0 size=     256kB time=00:00:02.50 bitrate= 838.9kbits/s speed=1.0x" >&2
echo "frame=  125 fps=25.0 size=     512kB time=00:00:05.00 bitrate= 838.9kbits/s speed=1.0x" >&2
echo "frame=  250 fps=25.0 size=    1024kB time=00:00:10.00 bitrate= 838.9kbits/s speed=1.0x" >&2
sleep 1
exit 0
"#;

#[derive(Default)]
struct Collector {
    updates: Mutex<Vec<ProgressUpdate>>,
    outcome: Mutex<Vec<String>>,
}

impl FFmpegCallback for Collector {
    fn on_progress(&self, _id: SessionId, update: &ProgressUpdate) {
        self.updates.lock().unwrap().push(update.clone());
    }
    fn on_success(&self, _id: SessionId, _result: &ffrunner::ExecutionResult) {
        self.outcome.lock().unwrap().push("success".into());
    }
    fn on_failure(&self, _id: SessionId, _error: &ffrunner::Error) {
        self.outcome.lock().unwrap().push("failure".into());
    }
}

#[tokio::test]
async fn test_transcode_with_progress() {
    let dir = tempfile::tempdir().unwrap();
    let ffmpeg = facade_for(fake_ffmpeg(&dir, TRANSCODE_SCRIPT));
    let collector = Arc::new(Collector::default());

    let result = ffmpeg
        .execute("-i in.mp4 -c:v libx264 out.mp4", collector.clone())
        .await;

    assert!(result.success(), "failure: {:?}", result.failure);
    assert_eq!(result.exit_code, 0);
    assert_eq!(*collector.outcome.lock().unwrap(), vec!["success"]);

    let updates = collector.updates.lock().unwrap();
    assert_eq!(updates.len(), 3);
    assert!((updates[0].percentage - 25.0).abs() < 0.01);
    assert!((updates[1].percentage - 50.0).abs() < 0.01);
    assert!((updates[2].percentage - 100.0).abs() < 0.01);
    assert_eq!(updates[2].total_duration_ms, 10_000);
    assert_eq!(updates[2].frame, 250);

    let session = ffmpeg
        .session_manager()
        .get(result.session_id)
        .await
        .expect("session recorded");
    assert_eq!(session.state, SessionState::Completed);
    assert_eq!(session.progress_percentage(), 100);
}

#[tokio::test]
async fn test_failed_transcode_collects_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let script = r#"
echo "  Duration: 00:00:10.00, bitrate: 1000 kb/s" >&2
echo "in.mp4: Invalid data found when processing input" >&2
sleep 1
exit 1
"#;
    let ffmpeg = facade_for(fake_ffmpeg(&dir, script));

    let result = ffmpeg
        .execute("-i in.mp4 out.mp4", Arc::new(ffrunner::NullCallback))
        .await;

    assert!(!result.success());
    assert_eq!(result.exit_code, 1);
    assert!(result.stderr_text().contains("Invalid data"));

    let session = ffmpeg
        .session_manager()
        .get(result.session_id)
        .await
        .unwrap();
    assert_eq!(session.state, SessionState::Failed);
}

#[tokio::test]
async fn test_event_bus_mirrors_execution() {
    let dir = tempfile::tempdir().unwrap();
    let ffmpeg = facade_for(fake_ffmpeg(&dir, TRANSCODE_SCRIPT));
    let mut subscription = ffmpeg.subscribe();

    let result = ffmpeg
        .execute("-i in.mp4 out.mp4", Arc::new(ffrunner::NullCallback))
        .await;
    assert!(result.success());

    let mut saw_started = false;
    let mut saw_progress = false;
    let mut saw_completed = false;
    while let Some(event) = subscription.try_recv() {
        match event {
            ExecEvent::Started { session_id, pid } => {
                assert_eq!(session_id, result.session_id);
                assert!(pid.is_some());
                saw_started = true;
            }
            ExecEvent::Progress { update, .. } => {
                assert!(update.percentage > 0.0);
                saw_progress = true;
            }
            ExecEvent::Completed { exit_code, .. } => {
                assert_eq!(exit_code, 0);
                saw_completed = true;
            }
            _ => {}
        }
    }
    assert!(saw_started && saw_progress && saw_completed);
}

#[tokio::test]
async fn test_media_probe_parses_banner() {
    let dir = tempfile::tempdir().unwrap();
    let script = r#"
echo "Input #0, matroska,webm, from 'clip.mkv':" >&2
echo "  Duration: 00:01:30.00, start: 0.000000, bitrate: 3500 kb/s" >&2
echo "  Stream #0:0: Video: vp9, yuv420p, 1920x1080, 30 fps" >&2
echo "  Stream #0:1: Audio: opus, 48000 Hz, stereo, fltp" >&2
echo "At least one output file must be specified" >&2
sleep 1
exit 1
"#;
    let ffmpeg = facade_for(fake_ffmpeg(&dir, script));

    let info = ffmpeg
        .media_information(std::path::Path::new("clip.mkv"))
        .await
        .expect("probe parsed");

    assert_eq!(info.duration_ms, 90_000);
    assert_eq!(info.bitrate_bps, 3_500_000);
    assert_eq!(info.video_streams[0].codec, "vp9");
    assert_eq!(info.resolution(), Some((1920, 1080)));
    assert_eq!(info.audio_streams[0].codec, "opus");
}

#[tokio::test]
async fn test_media_probe_rejects_unreadable_file() {
    let dir = tempfile::tempdir().unwrap();
    let script = r#"
echo "missing.mp4: No such file or directory" >&2
sleep 1
exit 1
"#;
    let ffmpeg = facade_for(fake_ffmpeg(&dir, script));

    let result = ffmpeg
        .media_information(std::path::Path::new("missing.mp4"))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_concurrent_executions_tracked_independently() {
    let dir = tempfile::tempdir().unwrap();
    let ffmpeg = facade_for(fake_ffmpeg(&dir, TRANSCODE_SCRIPT));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let ffmpeg = ffmpeg.clone();
        handles.push(tokio::spawn(async move {
            ffmpeg
                .execute("-i in.mp4 out.mp4", Arc::new(ffrunner::NullCallback))
                .await
        }));
    }

    let mut session_ids = Vec::new();
    for handle in handles {
        let result = handle.await.unwrap();
        assert!(result.success());
        session_ids.push(result.session_id);
    }
    session_ids.sort_unstable();
    session_ids.dedup();
    assert_eq!(session_ids.len(), 4);

    let manager = ffmpeg.session_manager();
    assert_eq!(manager.all_sessions().await.len(), 4);
    assert_eq!(manager.running_count().await, 0);
    assert_eq!(manager.clear_finished().await, 4);
}
