use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::capture::{CaptureBackend, CaptureOutput};
use crate::error::{Error, Result};
use crate::store::RecordingRecord;

/// The finalized output of one start-to-stop capture.
#[derive(Debug, Clone)]
pub struct CapturedRecording {
    pub uri: String,
    pub duration_millis: u64,
    pub started_at: DateTime<Utc>,
}

impl CapturedRecording {
    /// Turn the capture into an unconfirmed [`RecordingRecord`] with a
    /// time-based id, ready to append to the store.
    pub fn into_record(self, name: impl Into<String>) -> RecordingRecord {
        let id = self.started_at.timestamp_millis().to_string();
        RecordingRecord::new_local(id, self.uri, name, self.started_at, self.duration_millis)
    }
}

/// Owns the microphone capture lifecycle: `Idle → Recording → Idle`.
///
/// Exactly one capture handle is active at a time; `start()` while recording
/// is a state-guarded no-op, `stop()` while idle is `NoActiveSession`.
/// A 1-second ticker tracks elapsed time as a coarse UI approximation; the
/// backend's own duration measurement is the source of truth for the final
/// record, with the ticked value as fallback.
pub struct RecordingSession {
    backend: Box<dyn CaptureBackend>,
    is_recording: Arc<AtomicBool>,
    elapsed_millis: Arc<AtomicU64>,
    ticker: Option<JoinHandle<()>>,
    started_at: Option<DateTime<Utc>>,
}

impl RecordingSession {
    pub fn new(backend: Box<dyn CaptureBackend>) -> Self {
        Self {
            backend,
            is_recording: Arc::new(AtomicBool::new(false)),
            elapsed_millis: Arc::new(AtomicU64::new(0)),
            ticker: None,
            started_at: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording.load(Ordering::SeqCst)
    }

    /// Ticked elapsed duration, for UI display while recording.
    pub fn elapsed_millis(&self) -> u64 {
        self.elapsed_millis.load(Ordering::SeqCst)
    }

    /// Request permission, configure input, begin capture and start the
    /// duration ticker. No-op when already recording.
    pub async fn start(&mut self) -> Result<()> {
        // State check happens synchronously, before any await, so two rapid
        // start() calls cannot both reach the backend.
        if self.is_recording.load(Ordering::SeqCst) {
            warn!("Recording already started");
            return Ok(());
        }
        self.is_recording.store(true, Ordering::SeqCst);

        let granted = match self.backend.request_permission().await {
            Ok(granted) => granted,
            Err(e) => {
                self.is_recording.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };
        if !granted {
            self.is_recording.store(false, Ordering::SeqCst);
            return Err(Error::PermissionDenied);
        }

        if let Err(e) = self.backend.begin().await {
            self.is_recording.store(false, Ordering::SeqCst);
            return Err(e);
        }

        self.started_at = Some(Utc::now());
        self.elapsed_millis.store(0, Ordering::SeqCst);

        let is_recording = Arc::clone(&self.is_recording);
        let elapsed = Arc::clone(&self.elapsed_millis);
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first tick fires immediately; skip it so elapsed stays 0
            // for the first second.
            interval.tick().await;
            loop {
                interval.tick().await;
                if !is_recording.load(Ordering::SeqCst) {
                    break;
                }
                elapsed.fetch_add(1000, Ordering::SeqCst);
            }
        }));

        info!("Recording started ({})", self.backend.name());
        Ok(())
    }

    /// Stop the ticker and finalize the capture into a stable file.
    ///
    /// The backend's reported duration wins; the ticked counter is only used
    /// when the backend has no measurement.
    pub async fn stop(&mut self) -> Result<CapturedRecording> {
        if !self.is_recording.load(Ordering::SeqCst) {
            return Err(Error::NoActiveSession);
        }
        self.is_recording.store(false, Ordering::SeqCst);
        self.stop_ticker();

        let CaptureOutput {
            uri,
            duration_millis,
        } = self.backend.finish().await?;

        let ticked = self.elapsed_millis.load(Ordering::SeqCst);
        let duration_millis = match duration_millis {
            Some(d) if d > 0 => d,
            _ => ticked,
        };

        let started_at = self.started_at.take().unwrap_or_else(Utc::now);

        info!("Recording stopped: {} ({} ms)", uri, duration_millis);
        Ok(CapturedRecording {
            uri,
            duration_millis,
            started_at,
        })
    }

    /// Best-effort cleanup for app backgrounding / disposal: cancel the
    /// ticker and release any open capture handle without committing a file.
    pub async fn teardown(&mut self) {
        if self.is_recording.swap(false, Ordering::SeqCst) {
            info!("Tearing down active recording session");
            self.stop_ticker();
            self.backend.discard().await;
            self.started_at = None;
        }
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}
