//! Analysis backend client
//!
//! Uploads captured assets as base64 JSON and normalizes the backend's
//! analysis responses into local record fields. Upload failure never rolls
//! back or deletes the local asset.

mod client;

pub use client::{
    parse_timestamp, AdminUserStats, AnalysisResult, BackendClient, RecordingStats,
    ServerRecording, UserProfile,
};
