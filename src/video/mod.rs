//! Video decoding: ffprobe metadata, ffmpeg frame extraction, frame cache.

mod decoder;
mod frame_cache;
mod probe;

pub use decoder::{DecodedFrame, MovieDecoder};
pub use frame_cache::FrameCache;
pub use probe::{probe, VideoError, VideoInfo};
