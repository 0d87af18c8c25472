//! Movie recording over an ffmpeg stdin pipe, plus PNG snapshots.

use std::io::Write;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};

use log::info;
use thiserror::Error;

/// Errors from recording and snapshot export.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("ffmpeg binary not found on PATH")]
    FfmpegNotFound,
    #[error("encoder I/O failed: {0}")]
    SpawnFailed(#[from] std::io::Error),
    #[error("ffmpeg encoder exited with code {0:?}")]
    EncoderFailed(Option<i32>),
    #[error("frame byte length does not match recorder dimensions")]
    BadFrameSize,
    #[error("snapshot encoding failed: {0}")]
    Snapshot(#[from] image::ImageError),
}

/// Encodes raw RGBA frames to an H.264 movie through an ffmpeg child process.
///
/// Frames are written to ffmpeg's stdin as they arrive; `finish` closes the
/// pipe and waits for the encoder to flush the file.
pub struct VideoRecorder {
    child: Child,
    stdin: Option<ChildStdin>,
    frame_bytes: usize,
    frames: u64,
}

impl VideoRecorder {
    /// Spawn an encoder writing to `path` at the given dimensions and rate.
    pub fn start(path: &Path, width: u32, height: u32, fps: f64) -> Result<Self, RecordError> {
        let ffmpeg = which::which("ffmpeg").map_err(|_| RecordError::FfmpegNotFound)?;

        let mut child = Command::new(ffmpeg)
            .args(["-y", "-v", "error"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgba"])
            .args(["-s", &format!("{width}x{height}")])
            .args(["-r", &format!("{fps:.3}")])
            .args(["-i", "pipe:0"])
            .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let stdin = child.stdin.take();
        info!("recording {width}x{height}@{fps:.1} to {}", path.display());

        Ok(Self {
            child,
            stdin,
            frame_bytes: width as usize * height as usize * 4,
            frames: 0,
        })
    }

    /// Append one tightly packed RGBA frame.
    pub fn add_frame(&mut self, rgba: &[u8]) -> Result<(), RecordError> {
        if rgba.len() != self.frame_bytes {
            return Err(RecordError::BadFrameSize);
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(RecordError::EncoderFailed(None));
        };
        stdin.write_all(rgba)?;
        self.frames += 1;
        Ok(())
    }

    /// Frames written so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Close the pipe and wait for the encoder to finalize the file.
    pub fn finish(mut self) -> Result<u64, RecordError> {
        drop(self.stdin.take());
        let status = self.child.wait()?;
        if !status.success() {
            return Err(RecordError::EncoderFailed(status.code()));
        }
        info!("recording finished, {} frames", self.frames);
        Ok(self.frames)
    }
}

impl Drop for VideoRecorder {
    fn drop(&mut self) {
        drop(self.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Write a tightly packed RGBA buffer to `path` as a PNG.
pub fn save_snapshot(path: &Path, rgba: &[u8], width: u32, height: u32) -> Result<(), RecordError> {
    let image = image::RgbaImage::from_raw(width, height, rgba.to_vec())
        .ok_or(RecordError::BadFrameSize)?;
    image.save(path)?;
    info!("snapshot saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_roundtrip() {
        let (width, height) = (4, 2);
        let rgba: Vec<u8> = (0..width * height * 4).map(|i| i as u8).collect();
        let path = std::env::temp_dir().join("videopan_snapshot_test.png");

        save_snapshot(&path, &rgba, width as u32, height as u32).unwrap();
        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.width(), width as u32);
        assert_eq!(loaded.height(), height as u32);
        assert_eq!(loaded.into_raw(), rgba);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_snapshot_rejects_short_buffer() {
        let path = std::env::temp_dir().join("videopan_snapshot_bad.png");
        let result = save_snapshot(&path, &[0u8; 10], 16, 16);
        assert!(matches!(result, Err(RecordError::BadFrameSize)));
    }
}
