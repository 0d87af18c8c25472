//! Rendered-output export: movie recording and still snapshots.

mod recorder;

pub use recorder::{save_snapshot, RecordError, VideoRecorder};
