//! Unit tests for media banner parsing

use ffrunner::media::{parse_media_information, probe_command};
use std::path::Path;

#[cfg(test)]
mod media_info_tests {
    use super::*;

    const VIDEO_BANNER: &str = "\
ffmpeg version 6.1 Copyright (c) 2000-2023 the FFmpeg developers
Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'movie.mp4':
  Metadata:
    major_brand     : isom
  Duration: 00:02:15.25, start: 0.000000, bitrate: 2500 kb/s
  Stream #0:0(und): Video: h264 (High) (avc1 / 0x31637661), yuv420p, 1280x720 [SAR 1:1 DAR 16:9], 2300 kb/s, 23.98 fps, 23.98 tbr
  Stream #0:1(und): Audio: aac (LC) (mp4a / 0x6134706D), 48000 Hz, stereo, fltp, 192 kb/s";

    #[test]
    fn test_video_file() {
        let info = parse_media_information(VIDEO_BANNER).expect("parsed");

        assert_eq!(info.duration_ms, 135_250);
        assert_eq!(info.bitrate_bps, 2_500_000);

        let video = &info.video_streams[0];
        assert_eq!(video.codec, "h264");
        assert_eq!((video.width, video.height), (1280, 720));
        assert!((video.frame_rate - 23.98).abs() < 0.001);

        let audio = &info.audio_streams[0];
        assert_eq!(audio.codec, "aac");
        assert_eq!(audio.sample_rate, 48_000);
        assert_eq!(audio.channels, 2);

        assert!(info.is_video());
        assert_eq!(info.resolution(), Some((1280, 720)));
    }

    #[test]
    fn test_audio_only_file() {
        let banner = "\
Input #0, mp3, from 'song.mp3':
  Duration: 00:04:33.10, start: 0.025057, bitrate: 320 kb/s
  Stream #0:0: Audio: mp3, 44100 Hz, stereo, fltp, 320 kb/s";
        let info = parse_media_information(banner).expect("parsed");

        assert!(info.is_audio_only());
        assert!(!info.is_video());
        assert_eq!(info.duration_ms, 273_100);
        assert_eq!(info.audio_streams[0].codec, "mp3");
    }

    #[test]
    fn test_mono_and_surround_channels() {
        let mono = parse_media_information("Stream #0:0: Audio: opus, 48000 Hz, mono").unwrap();
        assert_eq!(mono.audio_streams[0].channels, 1);

        let surround =
            parse_media_information("Stream #0:1: Audio: ac3, 48000 Hz, 5.1, fltp").unwrap();
        assert_eq!(surround.audio_streams[0].channels, 51);
    }

    #[test]
    fn test_multiple_streams_preserved_in_order() {
        let banner = "\
  Duration: 00:00:30.00, bitrate: 5000 kb/s
  Stream #0:0: Video: h264, yuv420p, 1920x1080, 30 fps
  Stream #0:1: Video: mjpeg, yuvj420p, 320x240, 1 fps
  Stream #0:2: Audio: aac, 44100 Hz, stereo";
        let info = parse_media_information(banner).expect("parsed");

        assert_eq!(info.video_streams.len(), 2);
        assert_eq!(info.video_streams[0].codec, "h264");
        assert_eq!(info.video_streams[1].codec, "mjpeg");
        assert_eq!(info.audio_streams.len(), 1);
    }

    #[test]
    fn test_unrecognized_output_is_none() {
        assert!(parse_media_information("").is_none());
        assert!(parse_media_information("No such file or directory").is_none());
    }

    #[test]
    fn test_probe_command_shape() {
        assert_eq!(
            probe_command(Path::new("/media/in put.mkv")),
            "-i \"/media/in put.mkv\" -f null -"
        );
    }
}
