use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::state::AppState;
use crate::store::RecordingRecord;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UploadRecordingRequest {
    /// Display label (default: "Unnamed Recording")
    pub name: Option<String>,

    /// Captured length in milliseconds (default: 0)
    pub duration_millis: Option<u64>,

    /// Base64-encoded audio bytes
    pub audio_data: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadRecordingResponse {
    pub message: String,
    pub data: RecordingRecord,
}

#[derive(Debug, Serialize)]
pub struct DeleteRecordingResponse {
    pub message: String,
    pub deleted_id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /upload-recording
/// Decode the base64 payload, write it to the uploads directory and append
/// one record to the store.
pub async fn upload_recording(
    State(state): State<AppState>,
    Json(req): Json<UploadRecordingRequest>,
) -> impl IntoResponse {
    let Some(audio_data) = req.audio_data.filter(|data| !data.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No audio file data received".to_string(),
            }),
        )
            .into_response();
    };

    let bytes = match base64::engine::general_purpose::STANDARD.decode(audio_data) {
        Ok(bytes) => bytes,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Invalid base64 audio data: {}", e),
                }),
            )
                .into_response();
        }
    };

    if let Err(e) = tokio::fs::create_dir_all(&state.uploads_dir).await {
        error!("Failed to create uploads directory: {}", e);
        return storage_error(e.to_string());
    }

    let timestamp = Utc::now();
    let file_name = format!(
        "audio-{}-{}.m4a",
        timestamp.timestamp_millis(),
        uuid::Uuid::new_v4()
    );
    let file_path = state.uploads_dir.join(&file_name);

    if let Err(e) = tokio::fs::write(&file_path, &bytes).await {
        error!("Failed to write {}: {}", file_path.display(), e);
        return storage_error(e.to_string());
    }
    info!("File saved successfully: {}", file_path.display());

    let mut record = RecordingRecord::new_local(
        uuid::Uuid::new_v4().to_string(),
        file_path.display().to_string(),
        req.name.unwrap_or_else(|| "Unnamed Recording".to_string()),
        timestamp,
        req.duration_millis.unwrap_or(0),
    );
    record.server_file_url = Some(format!("/uploads/{}", file_name));

    {
        let store = state.store.lock().await;
        if let Err(e) = store.append(record.clone()) {
            error!("Failed to persist recording: {}", e);
            return storage_error(e.to_string());
        }
    }

    (
        StatusCode::CREATED,
        Json(UploadRecordingResponse {
            message: "Recording uploaded and saved successfully".to_string(),
            data: record,
        }),
    )
        .into_response()
}

/// GET /recordings
/// List all recordings, insertion order preserved.
pub async fn list_recordings(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store.lock().await;
    match store.list() {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => {
            error!("Failed to list recordings: {}", e);
            storage_error(e.to_string())
        }
    }
}

/// DELETE /recordings/:id
/// Delete the disk file best-effort, then the record. 404 for unknown ids.
pub async fn delete_recording(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.lock().await;

    let record = match store.get(&id) {
        Ok(Some(record)) => record,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Recording {} not found", id),
                }),
            )
                .into_response();
        }
        Err(e) => {
            error!("Failed to look up recording {}: {}", id, e);
            return storage_error(e.to_string());
        }
    };

    // The file may already be gone; that only warrants a warning.
    if !record.uri.is_empty() {
        match tokio::fs::remove_file(&record.uri).await {
            Ok(()) => info!("Deleted local file {}", record.uri),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("File not found at {}, skipping local deletion", record.uri)
            }
            Err(e) => error!("Error deleting local file {}: {}", record.uri, e),
        }
    }

    if let Err(e) = store.remove(&id) {
        error!("Failed to remove recording {}: {}", id, e);
        return storage_error(e.to_string());
    }

    (
        StatusCode::OK,
        Json(DeleteRecordingResponse {
            message: "Recording deleted successfully".to_string(),
            deleted_id: id,
        }),
    )
        .into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

fn storage_error(message: String) -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { error: message }),
    )
        .into_response()
}
