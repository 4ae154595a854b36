use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Audio sample data delivered by a capture device (16-bit PCM, interleaved).
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
}

/// Result of finalizing a capture: a stable file plus the backend's own
/// duration measurement.
#[derive(Debug, Clone)]
pub struct CaptureOutput {
    /// Filesystem path of the finalized asset.
    pub uri: String,
    /// Duration derived from the captured samples. `None` when the backend
    /// could not measure (e.g. no frames arrived); the session then falls
    /// back to its ticked counter.
    pub duration_millis: Option<u64>,
}

/// Microphone capture backend.
///
/// The session drives exactly one of these through
/// permission → begin → (finish | discard).
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Ask the platform for microphone access.
    async fn request_permission(&mut self) -> Result<bool>;

    /// Configure the audio input mode and start capturing.
    async fn begin(&mut self) -> Result<()>;

    /// Finalize the capture into a stable file and report its duration.
    async fn finish(&mut self) -> Result<CaptureOutput>;

    /// Release the capture handle without committing a file. Best-effort
    /// cleanup for teardown; never produces a record.
    async fn discard(&mut self);

    /// Backend name for logging
    fn name(&self) -> &str;
}

struct WriterReport {
    sample_count: u64,
    sample_rate: u32,
    channels: u16,
}

/// Capture backend that drains [`AudioFrame`]s from a device channel and
/// writes them to a single WAV file.
///
/// The frame source is whatever feeds the channel (a cpal stream, a test
/// script); this backend only owns the file lifecycle and the duration
/// measurement derived from the sample count.
pub struct WavCaptureBackend {
    output_dir: PathBuf,
    frames: Option<mpsc::Receiver<AudioFrame>>,
    writer_task: Option<JoinHandle<Result<WriterReport>>>,
    stop_tx: Option<oneshot::Sender<()>>,
    path: Option<PathBuf>,
}

impl WavCaptureBackend {
    pub fn new(output_dir: impl Into<PathBuf>, frames: mpsc::Receiver<AudioFrame>) -> Self {
        Self {
            output_dir: output_dir.into(),
            frames: Some(frames),
            writer_task: None,
            stop_tx: None,
            path: None,
        }
    }

    async fn join_writer(&mut self) -> Result<WriterReport> {
        let task = self
            .writer_task
            .take()
            .ok_or_else(|| Error::Capture("capture was never started".to_string()))?;
        task.await
            .map_err(|e| Error::Capture(format!("writer task panicked: {}", e)))?
    }
}

#[async_trait::async_trait]
impl CaptureBackend for WavCaptureBackend {
    async fn request_permission(&mut self) -> Result<bool> {
        // File-backed capture has no platform permission gate.
        Ok(true)
    }

    async fn begin(&mut self) -> Result<()> {
        let mut frames = self
            .frames
            .take()
            .ok_or_else(|| Error::Capture("capture already consumed".to_string()))?;

        std::fs::create_dir_all(&self.output_dir).map_err(|e| {
            Error::Capture(format!(
                "failed to create {}: {}",
                self.output_dir.display(),
                e
            ))
        })?;

        let path = self
            .output_dir
            .join(format!("capture-{}.wav", uuid::Uuid::new_v4()));
        info!("Capturing to {}", path.display());

        let (stop_tx, mut stop_rx) = oneshot::channel();
        let writer_path = path.clone();

        let task = tokio::spawn(async move {
            let mut writer: Option<hound::WavWriter<BufWriter<File>>> = None;
            let mut sample_count: u64 = 0;
            let mut sample_rate: u32 = 16000;
            let mut channels: u16 = 1;

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    frame = frames.recv() => {
                        let Some(frame) = frame else { break };
                        if writer.is_none() {
                            sample_rate = frame.sample_rate;
                            channels = frame.channels;
                            let spec = hound::WavSpec {
                                channels,
                                sample_rate,
                                bits_per_sample: 16,
                                sample_format: hound::SampleFormat::Int,
                            };
                            let w = hound::WavWriter::create(&writer_path, spec)
                                .map_err(|e| Error::Capture(format!(
                                    "failed to create {}: {}", writer_path.display(), e
                                )))?;
                            writer = Some(w);
                        }
                        if let Some(w) = writer.as_mut() {
                            for sample in &frame.samples {
                                w.write_sample(*sample).map_err(|e| {
                                    Error::Capture(format!("failed to write samples: {}", e))
                                })?;
                            }
                            sample_count += frame.samples.len() as u64;
                        }
                    }
                }
            }

            match writer {
                Some(w) => {
                    w.finalize()
                        .map_err(|e| Error::Capture(format!("failed to finalize WAV: {}", e)))?;
                }
                None => {
                    // No frames arrived. Still produce a stable (empty) file
                    // so the returned uri always exists.
                    let spec = hound::WavSpec {
                        channels,
                        sample_rate,
                        bits_per_sample: 16,
                        sample_format: hound::SampleFormat::Int,
                    };
                    hound::WavWriter::create(&writer_path, spec)
                        .and_then(|w| w.finalize())
                        .map_err(|e| {
                            Error::Capture(format!(
                                "failed to create {}: {}",
                                writer_path.display(),
                                e
                            ))
                        })?;
                }
            }

            Ok(WriterReport {
                sample_count,
                sample_rate,
                channels,
            })
        });

        self.path = Some(path);
        self.stop_tx = Some(stop_tx);
        self.writer_task = Some(task);
        Ok(())
    }

    async fn finish(&mut self) -> Result<CaptureOutput> {
        if let Some(stop) = self.stop_tx.take() {
            let _ = stop.send(());
        }
        let report = self.join_writer().await?;
        let path = self
            .path
            .take()
            .ok_or_else(|| Error::Capture("no capture path".to_string()))?;

        let duration_millis = if report.sample_count > 0 {
            let frames = report.sample_count / report.channels.max(1) as u64;
            Some(frames * 1000 / report.sample_rate.max(1) as u64)
        } else {
            None
        };

        info!(
            "Capture finalized: {} ({:?} ms)",
            path.display(),
            duration_millis
        );

        Ok(CaptureOutput {
            uri: path.display().to_string(),
            duration_millis,
        })
    }

    async fn discard(&mut self) {
        if let Some(stop) = self.stop_tx.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.writer_task.take() {
            let _ = task.await;
        }
        if let Some(path) = self.path.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("Failed to remove discarded capture {}: {}", path.display(), e);
            }
        }
    }

    fn name(&self) -> &str {
        "wav-file"
    }
}
