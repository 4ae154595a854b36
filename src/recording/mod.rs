//! Recording session management
//!
//! This module owns the record → stop lifecycle:
//! - Microphone permission and capture via a pluggable backend
//! - A 1-second elapsed-duration ticker for UI display
//! - Finalization into a stable file with a measured duration

mod capture;
mod session;

pub use capture::{AudioFrame, CaptureBackend, CaptureOutput, WavCaptureBackend};
pub use session::{CapturedRecording, RecordingSession};
