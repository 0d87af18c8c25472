//! Background frame extraction over an ffmpeg rawvideo pipe.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, warn};

use super::probe::{probe, VideoError, VideoInfo};

/// Channel capacity; decoding stalls once this many frames are unconsumed.
const FRAME_QUEUE_DEPTH: usize = 8;

/// One decoded frame of tightly packed RGBA pixels.
#[derive(Clone)]
pub struct DecodedFrame {
    pub index: u64,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for DecodedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedFrame")
            .field("index", &self.index)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

/// Streams decoded frames from a movie file on a worker thread.
///
/// ffmpeg writes raw RGBA frames to a pipe; the worker slices the stream into
/// frames and pushes them through a bounded channel, so decoding keeps pace
/// with consumption instead of racing ahead. Seeking restarts the pipeline at
/// a new timestamp since the rawvideo stream is forward-only.
pub struct MovieDecoder {
    path: PathBuf,
    ffmpeg: PathBuf,
    info: VideoInfo,
    rx: Receiver<DecodedFrame>,
    stop: Arc<AtomicBool>,
    last_received: u64,
}

impl MovieDecoder {
    /// Probe `path` and start decoding from the first frame.
    pub fn open(path: &Path) -> Result<Self, VideoError> {
        let info = probe(path)?;
        let ffmpeg = which::which("ffmpeg").map_err(|_| VideoError::FfmpegNotFound)?;

        let mut decoder = Self {
            path: path.to_path_buf(),
            ffmpeg,
            info,
            rx: bounded(0).1,
            stop: Arc::new(AtomicBool::new(true)),
            last_received: 0,
        };
        decoder.restart(0)?;
        Ok(decoder)
    }

    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    /// Drain up to `limit` decoded frames without blocking.
    pub fn poll(&mut self, limit: usize) -> Vec<DecodedFrame> {
        let mut frames = Vec::new();
        while frames.len() < limit {
            match self.rx.try_recv() {
                Ok(frame) => {
                    self.last_received = frame.index;
                    frames.push(frame);
                }
                Err(_) => break,
            }
        }
        frames
    }

    /// Whether some frame of the window `[start, start + max_frames)` that
    /// the caller does not already hold can no longer be delivered by the
    /// current pipeline, requiring a seek. `cached` reports frames already in
    /// the caller's hands, which stops a fully-served window from triggering
    /// restarts while the pipeline decodes ahead.
    pub fn needs_restart<F>(&self, start: u64, max_frames: usize, cached: F) -> bool
    where
        F: Fn(u64) -> bool,
    {
        window_unreachable(self.last_received, start, max_frames, cached)
    }

    /// Tear down the current pipeline and restart decoding at `frame`.
    pub fn seek(&mut self, frame: u64) -> Result<(), VideoError> {
        debug!("seeking decoder to frame {frame}");
        self.restart(frame)
    }

    fn restart(&mut self, frame: u64) -> Result<(), VideoError> {
        self.stop.store(true, Ordering::Relaxed);

        let stop = Arc::new(AtomicBool::new(false));
        let (tx, rx) = bounded(FRAME_QUEUE_DEPTH);
        let child = self.spawn_ffmpeg(frame)?;

        let info = self.info;
        let worker_stop = Arc::clone(&stop);
        std::thread::Builder::new()
            .name("movie-decode".into())
            .spawn(move || decode_worker(child, info, frame, tx, worker_stop))
            .map_err(|source| VideoError::SpawnFailed {
                tool: "decode thread",
                source,
            })?;

        self.rx = rx;
        self.stop = stop;
        self.last_received = frame;
        Ok(())
    }

    fn spawn_ffmpeg(&self, frame: u64) -> Result<Child, VideoError> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-v", "error"]);
        if frame > 0 {
            cmd.args(["-ss", &format!("{:.6}", self.info.frame_to_seconds(frame))]);
        }
        cmd.arg("-i")
            .arg(&self.path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgba", "-an", "pipe:1"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .stdin(Stdio::null());

        cmd.spawn().map_err(|source| VideoError::SpawnFailed {
            tool: "ffmpeg",
            source,
        })
    }
}

impl Drop for MovieDecoder {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

fn decode_worker(
    mut child: Child,
    info: VideoInfo,
    first_frame: u64,
    tx: Sender<DecodedFrame>,
    stop: Arc<AtomicBool>,
) {
    let frame_bytes = info.width as usize * info.height as usize * 4;
    let Some(mut stdout) = child.stdout.take() else {
        warn!("decode pipeline has no stdout");
        return;
    };

    let mut index = first_frame;
    'decode: loop {
        if stop.load(Ordering::Relaxed) {
            break;
        }

        let mut rgba = vec![0u8; frame_bytes];
        if stdout.read_exact(&mut rgba).is_err() {
            // End of stream or broken pipe.
            break;
        }

        let frame = DecodedFrame {
            index,
            width: info.width,
            height: info.height,
            rgba,
        };
        index += 1;

        // Bounded send with a stop check so teardown never deadlocks on a
        // full queue.
        let mut pending = frame;
        loop {
            if stop.load(Ordering::Relaxed) {
                break 'decode;
            }
            match tx.send_timeout(pending, Duration::from_millis(50)) {
                Ok(()) => break,
                Err(crossbeam_channel::SendTimeoutError::Timeout(frame)) => pending = frame,
                Err(crossbeam_channel::SendTimeoutError::Disconnected(_)) => break 'decode,
            }
        }
    }

    let _ = child.kill();
    let _ = child.wait();
    debug!("decode worker exited at frame {index}");
}

/// Window-reachability test for a forward-only pipeline whose read head sits
/// at `last_received`. Only the first frame of the window the caller does not
/// already hold matters: it is unreachable when it lies behind the read head
/// (already consumed and discarded, the rawvideo pipe cannot rewind) or so
/// far ahead that everything in between would be decoded into the void.
fn window_unreachable<F>(last_received: u64, start: u64, max_frames: usize, cached: F) -> bool
where
    F: Fn(u64) -> bool,
{
    let end = start + max_frames as u64;
    let Some(missing) = (start..end).find(|&n| !cached(n)) else {
        return false;
    };
    if missing < last_received {
        return true;
    }
    let slack = max_frames as u64 * 2;
    missing > last_received + slack
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backward_jump_into_consumed_range_restarts() {
        // Pipeline decoded up to frame 500; jumping the window back to 100
        // must restart, those frames went by unconsumed.
        assert!(window_unreachable(500, 100, 20, |_| false));
        assert!(window_unreachable(150, 90, 5, |_| false));
    }

    #[test]
    fn test_fully_cached_window_keeps_pipeline() {
        // Steady state: window frames all held while the read head runs
        // ahead. No restart, and no restart loop.
        assert!(!window_unreachable(500, 100, 20, |_| true));
    }

    #[test]
    fn test_partially_served_window_is_reachable() {
        // Frames up to the read head are held; the rest are still coming.
        assert!(!window_unreachable(110, 100, 20, |n| n <= 110));
        // A frame behind the read head that was never delivered to the
        // caller forces a restart.
        assert!(window_unreachable(150, 100, 20, |n| n != 105));
    }

    #[test]
    fn test_just_restarted_window_is_reachable() {
        assert!(!window_unreachable(100, 100, 20, |_| false));
        assert!(!window_unreachable(150, 150, 20, |_| false));
    }

    #[test]
    fn test_far_forward_jump_needs_restart() {
        assert!(window_unreachable(100, 5000, 20, |_| false));
        // Within slack, keep the pipeline.
        assert!(!window_unreachable(100, 120, 20, |_| false));
    }
}
