pub mod config;
pub mod error;
pub mod http;
pub mod playback;
pub mod recording;
pub mod stats;
pub mod store;
pub mod upload;

pub use config::Config;
pub use error::{Error, Result};
pub use http::{create_router, AppState};
pub use playback::{PlaybackController, PlaybackState, PlayerBackend, WavClockPlayer};
pub use recording::{AudioFrame, CaptureBackend, CapturedRecording, RecordingSession};
pub use store::{LocalRecordingStore, RecordingPatch, RecordingRecord, NO_SNORING_DB};
pub use upload::{AnalysisResult, BackendClient, RecordingStats};
