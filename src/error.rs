use thiserror::Error;

/// Failure taxonomy for the recording/upload/playback core.
///
/// Every user-initiated operation surfaces one of these; none of them is
/// allowed to take the session out of a known idle/stopped state.
#[derive(Debug, Error)]
pub enum Error {
    /// Microphone access was refused by the platform.
    #[error("microphone permission denied")]
    PermissionDenied,

    /// `stop()` was called with no recording in progress. Callers treat this
    /// as benign and reset UI state rather than propagate.
    #[error("no active recording session")]
    NoActiveSession,

    /// The backend requires per-user attribution and no user id is available.
    #[error("not signed in: the backend requires a user id")]
    Unauthenticated,

    /// Upload did not complete. The local record stays unconfirmed
    /// (`server_file_url = None`) and the asset is never deleted.
    #[error("upload failed (status {status_code:?}): {message}")]
    UploadFailed {
        /// HTTP status, `None` for transport-level failures.
        status_code: Option<u16>,
        message: String,
    },

    /// A non-upload backend request failed.
    #[error("backend request failed (status {status_code:?}): {message}")]
    RequestFailed {
        status_code: Option<u16>,
        message: String,
    },

    /// Local persistence I/O failed. The mutation was aborted, no partial
    /// write was left behind.
    #[error("local storage unavailable: {0}")]
    StorageUnavailable(String),

    /// An operation referenced a record id that is not present.
    #[error("no record with id {0}")]
    NotFound(String),

    /// Audio capture failed. Terminal for the current operation only.
    #[error("audio capture failed: {0}")]
    Capture(String),

    /// Playback failed (e.g. corrupt file). Aborts this playback attempt
    /// only; other list items stay playable.
    #[error("playback failed: {0}")]
    Playback(String),
}

pub type Result<T> = std::result::Result<T, Error>;
