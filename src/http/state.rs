use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::store::LocalRecordingStore;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Recording index; the mutex serializes read-modify-write cycles so
    /// concurrent handlers never interleave partial mutations.
    pub store: Arc<Mutex<LocalRecordingStore>>,

    /// Directory that uploaded audio files are written to.
    pub uploads_dir: PathBuf,
}

impl AppState {
    pub fn new(store: LocalRecordingStore, uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            uploads_dir: uploads_dir.into(),
        }
    }
}
