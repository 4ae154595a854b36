use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use super::player::{PlayerBackend, PlayerStatus};
use crate::error::{Error, Result};
use crate::store::RecordingRecord;

/// Snapshot of the process-wide playback state.
///
/// At most one sound is loaded (`active_uri`) and at most one record's
/// detail panel is open (`expanded_id`) at any time.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlaybackState {
    pub active_id: Option<String>,
    pub active_uri: Option<String>,
    pub is_playing: bool,
    pub position_millis: u64,
    pub duration_millis: u64,
    pub expanded_id: Option<String>,
}

struct Shared {
    state: PlaybackState,
    /// Load generation of the currently active sound. Status updates whose
    /// tag no longer matches are stale and get dropped.
    current_load: Option<Uuid>,
}

/// Single-active-sound player over a list of records.
///
/// Expanding a row starts its playback and collapsing stops it; switching
/// rows unloads the previous sound before the new load begins, so two sounds
/// never overlap even under rapid toggling.
pub struct PlaybackController {
    player: Box<dyn PlayerBackend>,
    shared: Arc<Mutex<Shared>>,
    forward_task: Option<JoinHandle<()>>,
}

impl PlaybackController {
    pub fn new(player: Box<dyn PlayerBackend>) -> Self {
        Self {
            player,
            shared: Arc::new(Mutex::new(Shared {
                state: PlaybackState::default(),
                current_load: None,
            })),
            forward_task: None,
        }
    }

    /// Current playback snapshot.
    pub async fn state(&self) -> PlaybackState {
        self.shared.lock().await.state.clone()
    }

    /// Load and start playback for `record`, stopping and unloading any
    /// previously active sound first.
    pub async fn play(&mut self, record: &RecordingRecord) -> Result<()> {
        // Previous sound must be fully unloaded before the new load begins.
        self.unload_current().await;

        let source = playable_source(record)?;
        info!("Playing {} ({})", record.id, source);

        let (status_tx, mut status_rx) = mpsc::channel::<PlayerStatus>(16);
        let loaded = self.player.load(&source, status_tx).await?;

        {
            let mut shared = self.shared.lock().await;
            shared.state.active_id = Some(record.id.clone());
            shared.state.active_uri = Some(source);
            shared.state.is_playing = true;
            shared.state.position_millis = 0;
            shared.state.duration_millis = loaded.duration_millis;
            shared.current_load = Some(loaded.load_id);
        }

        let shared = Arc::clone(&self.shared);
        self.forward_task = Some(tokio::spawn(async move {
            while let Some(status) = status_rx.recv().await {
                let mut shared = shared.lock().await;
                if shared.current_load != Some(status.load_id) {
                    // Stale update from a sound that was already stopped.
                    continue;
                }
                shared.state.position_millis = status.position_millis;
                shared.state.duration_millis = status.duration_millis;
                shared.state.is_playing = status.is_playing;
                if status.did_just_finish {
                    // Natural completion mirrors explicit stop: reset the
                    // playhead and collapse the expanded panel.
                    shared.state.is_playing = false;
                    shared.state.position_millis = 0;
                    shared.state.active_id = None;
                    shared.state.active_uri = None;
                    shared.state.expanded_id = None;
                    shared.current_load = None;
                    break;
                }
            }
        }));

        self.player.play().await
    }

    /// Pause the currently loaded sound. No-op for any other id.
    pub async fn pause(&mut self, id: &str) -> Result<()> {
        if !self.is_active(id).await {
            return Ok(());
        }
        self.player.pause().await?;
        self.shared.lock().await.state.is_playing = false;
        Ok(())
    }

    /// Resume the currently loaded sound. No-op for any other id.
    pub async fn resume(&mut self, id: &str) -> Result<()> {
        if !self.is_active(id).await {
            return Ok(());
        }
        self.player.play().await?;
        self.shared.lock().await.state.is_playing = true;
        Ok(())
    }

    /// Move the playhead of the currently loaded sound, clamped to
    /// `[0, duration]`. No-op for any other id.
    pub async fn seek(&mut self, id: &str, position_millis: u64) -> Result<()> {
        let clamped = {
            let shared = self.shared.lock().await;
            if shared.state.active_id.as_deref() != Some(id) {
                return Ok(());
            }
            position_millis.min(shared.state.duration_millis)
        };
        self.player.seek(clamped).await?;
        self.shared.lock().await.state.position_millis = clamped;
        Ok(())
    }

    /// Unload the sound for `id`, resetting position to 0 and clearing the
    /// active uri. No-op for any other id.
    pub async fn stop(&mut self, id: &str) -> Result<()> {
        if self.is_active(id).await {
            self.unload_current().await;
        }
        Ok(())
    }

    /// Expand or collapse `record`'s detail panel.
    ///
    /// Collapsing stops that record's playback; expanding collapses any
    /// other open panel (stopping its playback) and then auto-starts
    /// playback for `record`.
    pub async fn toggle_expand(&mut self, record: &RecordingRecord) -> Result<()> {
        let expanded = self.shared.lock().await.state.expanded_id.clone();

        if expanded.as_deref() == Some(record.id.as_str()) {
            self.unload_current().await;
            self.shared.lock().await.state.expanded_id = None;
            return Ok(());
        }

        if expanded.is_some() {
            // Collapsing the other panel stops its playback too.
            self.unload_current().await;
        }
        self.shared.lock().await.state.expanded_id = Some(record.id.clone());
        self.play(record).await
    }

    /// Release playback resources unconditionally (component disposal).
    pub async fn teardown(&mut self) {
        self.unload_current().await;
        self.shared.lock().await.state.expanded_id = None;
    }

    async fn is_active(&self, id: &str) -> bool {
        self.shared.lock().await.state.active_id.as_deref() == Some(id)
    }

    async fn unload_current(&mut self) {
        if let Some(task) = self.forward_task.take() {
            task.abort();
        }
        if let Err(e) = self.player.unload().await {
            warn!("Failed to unload sound: {}", e);
        }
        let mut shared = self.shared.lock().await;
        shared.state.active_id = None;
        shared.state.active_uri = None;
        shared.state.is_playing = false;
        shared.state.position_millis = 0;
        shared.state.duration_millis = 0;
        shared.current_load = None;
    }
}

/// Pick the playable source for a record: the on-device asset when present,
/// the server copy otherwise.
fn playable_source(record: &RecordingRecord) -> Result<String> {
    if !record.uri.is_empty() {
        return Ok(record.uri.clone());
    }
    if let Some(url) = &record.server_file_url {
        return Ok(url.clone());
    }
    Err(Error::Playback(format!(
        "no playable source for record {}",
        record.id
    )))
}
