use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Interval between emitted position updates.
const STATUS_INTERVAL_MS: u64 = 200;

/// One asynchronous status update from the player backend.
///
/// Tagged with the load id so the controller can discard updates that arrive
/// after the sound they belong to was stopped or replaced.
#[derive(Debug, Clone)]
pub struct PlayerStatus {
    pub load_id: Uuid,
    pub position_millis: u64,
    pub duration_millis: u64,
    pub is_playing: bool,
    pub did_just_finish: bool,
}

/// Handle information returned by [`PlayerBackend::load`].
#[derive(Debug, Clone)]
pub struct LoadedSound {
    pub load_id: Uuid,
    pub duration_millis: u64,
}

/// Playback backend for a single sound.
///
/// At most one sound is loaded at a time; the controller enforces
/// unload-before-load when switching. Status updates flow through the
/// channel handed to `load`, in non-deterministic timing.
#[async_trait::async_trait]
pub trait PlayerBackend: Send + Sync {
    /// Load the asset at `uri` and begin emitting status updates.
    async fn load(
        &mut self,
        uri: &str,
        status_tx: mpsc::Sender<PlayerStatus>,
    ) -> Result<LoadedSound>;

    async fn play(&mut self) -> Result<()>;

    async fn pause(&mut self) -> Result<()>;

    /// Move the playhead. The controller clamps before calling.
    async fn seek(&mut self, position_millis: u64) -> Result<()>;

    /// Stop and release the loaded sound. Safe to call when nothing is
    /// loaded.
    async fn unload(&mut self) -> Result<()>;
}

struct ClockState {
    load_id: Uuid,
    position_millis: u64,
    duration_millis: u64,
    is_playing: bool,
}

/// Headless player that probes WAV duration and drives the playhead from a
/// timer, emitting the same status stream a platform audio engine would.
pub struct WavClockPlayer {
    state: Option<Arc<Mutex<ClockState>>>,
    ticker: Option<JoinHandle<()>>,
}

impl WavClockPlayer {
    pub fn new() -> Self {
        Self {
            state: None,
            ticker: None,
        }
    }

    fn loaded_state(&self) -> Result<&Arc<Mutex<ClockState>>> {
        self.state
            .as_ref()
            .ok_or_else(|| Error::Playback("no sound loaded".to_string()))
    }

    fn probe_duration(uri: &str) -> Result<u64> {
        let path = Path::new(uri);
        let reader = hound::WavReader::open(path)
            .map_err(|e| Error::Playback(format!("failed to open {}: {}", uri, e)))?;
        let spec = reader.spec();
        let frames = reader.duration() as u64;
        Ok(frames * 1000 / spec.sample_rate.max(1) as u64)
    }
}

impl Default for WavClockPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PlayerBackend for WavClockPlayer {
    async fn load(
        &mut self,
        uri: &str,
        status_tx: mpsc::Sender<PlayerStatus>,
    ) -> Result<LoadedSound> {
        self.unload().await?;

        let duration_millis = Self::probe_duration(uri)?;
        let load_id = Uuid::new_v4();
        info!("Loaded sound {} ({} ms)", uri, duration_millis);

        let state = Arc::new(Mutex::new(ClockState {
            load_id,
            position_millis: 0,
            duration_millis,
            is_playing: false,
        }));
        self.state = Some(Arc::clone(&state));

        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(STATUS_INTERVAL_MS));
            interval.tick().await;
            loop {
                interval.tick().await;
                let status = {
                    let mut s = state.lock().await;
                    let mut finished = false;
                    if s.is_playing {
                        s.position_millis =
                            (s.position_millis + STATUS_INTERVAL_MS).min(s.duration_millis);
                        if s.position_millis >= s.duration_millis {
                            // Natural completion mirrors explicit stop.
                            finished = true;
                            s.is_playing = false;
                            s.position_millis = 0;
                        }
                    }
                    PlayerStatus {
                        load_id: s.load_id,
                        position_millis: s.position_millis,
                        duration_millis: s.duration_millis,
                        is_playing: s.is_playing,
                        did_just_finish: finished,
                    }
                };
                let finished = status.did_just_finish;
                if status_tx.send(status).await.is_err() {
                    break;
                }
                if finished {
                    break;
                }
            }
        }));

        Ok(LoadedSound {
            load_id,
            duration_millis,
        })
    }

    async fn play(&mut self) -> Result<()> {
        let state = self.loaded_state()?;
        state.lock().await.is_playing = true;
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        let state = self.loaded_state()?;
        state.lock().await.is_playing = false;
        Ok(())
    }

    async fn seek(&mut self, position_millis: u64) -> Result<()> {
        let state = self.loaded_state()?;
        let mut s = state.lock().await;
        s.position_millis = position_millis.min(s.duration_millis);
        Ok(())
    }

    async fn unload(&mut self) -> Result<()> {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        self.state = None;
        Ok(())
    }
}
