//! Video metadata extraction via ffprobe.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use thiserror::Error;

/// Errors from probing and decoding video files.
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("ffmpeg binary not found on PATH")]
    FfmpegNotFound,
    #[error("ffprobe binary not found on PATH")]
    FfprobeNotFound,
    #[error("failed to spawn {tool}: {source}")]
    SpawnFailed {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("ffprobe failed: {0}")]
    ProbeFailed(String),
    #[error("no video stream in {0}")]
    NoVideoStream(PathBuf),
    #[error("failed to parse ffprobe output: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Metadata for a loaded movie file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    pub duration_seconds: f64,
    pub total_frames: u64,
}

impl VideoInfo {
    /// Presentation time of a frame index in seconds.
    pub fn frame_to_seconds(&self, frame: u64) -> f64 {
        if self.frame_rate > 0.0 {
            frame as f64 / self.frame_rate
        } else {
            0.0
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Probe a movie file with ffprobe and extract the first video stream's
/// metadata.
pub fn probe(path: &Path) -> Result<VideoInfo, VideoError> {
    let ffprobe = which::which("ffprobe").map_err(|_| VideoError::FfprobeNotFound)?;

    let output = Command::new(ffprobe)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .map_err(|source| VideoError::SpawnFailed {
            tool: "ffprobe",
            source,
        })?;

    if !output.status.success() {
        return Err(VideoError::ProbeFailed(
            String::from_utf8_lossy(&output.stderr).to_string(),
        ));
    }

    let probed: ProbeOutput = serde_json::from_slice(&output.stdout)?;
    extract_info(probed).ok_or_else(|| VideoError::NoVideoStream(path.to_path_buf()))
}

fn extract_info(probed: ProbeOutput) -> Option<VideoInfo> {
    let stream = probed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))?;

    let width = stream.width?;
    let height = stream.height?;
    let frame_rate = stream
        .r_frame_rate
        .as_deref()
        .and_then(parse_rational)
        .unwrap_or(30.0);

    let duration_seconds = stream
        .duration
        .as_deref()
        .or(probed
            .format
            .as_ref()
            .and_then(|f| f.duration.as_deref()))
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    let total_frames = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<u64>().ok())
        .unwrap_or_else(|| (duration_seconds * frame_rate).round() as u64);

    Some(VideoInfo {
        width,
        height,
        frame_rate,
        duration_seconds,
        total_frames,
    })
}

/// Parse an ffprobe rational like "30000/1001" or a plain number.
fn parse_rational(value: &str) -> Option<f64> {
    if let Some((num, den)) = value.split_once('/') {
        let num = num.trim().parse::<f64>().ok()?;
        let den = den.trim().parse::<f64>().ok()?;
        if den > 0.0 {
            Some(num / den)
        } else {
            None
        }
    } else {
        value.trim().parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rational() {
        assert_eq!(parse_rational("30/1"), Some(30.0));
        assert_eq!(parse_rational("0/0"), None);
        assert_eq!(parse_rational("25"), Some(25.0));
        let ntsc = parse_rational("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.01);
    }

    #[test]
    fn test_extract_info_from_probe_json() {
        let json = r#"{
            "streams": [
                { "codec_type": "audio", "r_frame_rate": "0/0" },
                {
                    "codec_type": "video",
                    "width": 1920,
                    "height": 1080,
                    "r_frame_rate": "30000/1001",
                    "nb_frames": "3600",
                    "duration": "120.120000"
                }
            ],
            "format": { "duration": "120.150000" }
        }"#;
        let probed: ProbeOutput = serde_json::from_str(json).unwrap();
        let info = extract_info(probed).unwrap();
        assert_eq!(info.width, 1920);
        assert_eq!(info.height, 1080);
        assert_eq!(info.total_frames, 3600);
        assert!((info.duration_seconds - 120.12).abs() < 1e-9);
    }

    #[test]
    fn test_total_frames_falls_back_to_duration() {
        let json = r#"{
            "streams": [
                { "codec_type": "video", "width": 640, "height": 480, "r_frame_rate": "25/1" }
            ],
            "format": { "duration": "10.0" }
        }"#;
        let probed: ProbeOutput = serde_json::from_str(json).unwrap();
        let info = extract_info(probed).unwrap();
        assert_eq!(info.total_frames, 250);
    }

    #[test]
    fn test_no_video_stream() {
        let json = r#"{ "streams": [ { "codec_type": "audio" } ] }"#;
        let probed: ProbeOutput = serde_json::from_str(json).unwrap();
        assert!(extract_info(probed).is_none());
    }

    #[test]
    fn test_frame_to_seconds() {
        let info = VideoInfo {
            width: 1280,
            height: 720,
            frame_rate: 25.0,
            duration_seconds: 10.0,
            total_frames: 250,
        };
        assert_eq!(info.frame_to_seconds(50), 2.0);
    }
}
