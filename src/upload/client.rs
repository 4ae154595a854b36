use base64::Engine;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::store::{RecordingPatch, RecordingRecord};

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    audio_data: String,
    name: &'a str,
    user_uid: &'a str,
    duration_millis: u64,
}

/// Analysis backend response for one uploaded recording.
///
/// Every analysis field is optional on the wire: a missing numeric defaults
/// to 0 and a missing array to empty, so an upload never fails because the
/// backend omitted an optional field.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "de_flexible_id")]
    pub id: String,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub snoring_count: u32,
    #[serde(default)]
    pub apnea_events_count: u32,
    #[serde(default)]
    pub loudest_snore_db: f64,
    #[serde(default)]
    pub snoring_absolute_timestamps: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl AnalysisResult {
    /// Snore event instants that parsed cleanly; unparseable entries are
    /// dropped with a warning.
    pub fn event_timestamps(&self) -> Vec<DateTime<Utc>> {
        self.snoring_absolute_timestamps
            .iter()
            .filter_map(|raw| {
                let parsed = parse_timestamp(raw);
                if parsed.is_none() {
                    warn!("Dropping unparseable snore timestamp: {}", raw);
                }
                parsed
            })
            .collect()
    }
}

impl From<&AnalysisResult> for RecordingPatch {
    fn from(result: &AnalysisResult) -> Self {
        RecordingPatch {
            server_file_url: result.file_url.clone(),
            snoring_count: Some(result.snoring_count),
            apnea_events_count: Some(result.apnea_events_count),
            loudest_snore_db: Some(result.loudest_snore_db),
            snoring_absolute_timestamps: Some(result.event_timestamps()),
        }
    }
}

/// One recording as the backend lists it.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerRecording {
    #[serde(default, deserialize_with = "de_flexible_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub snoring_count: Option<u32>,
    #[serde(default)]
    pub apnea_events_count: Option<u32>,
    #[serde(default)]
    pub loudest_snore_db: Option<f64>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub duration_millis: Option<u64>,
    /// Seconds; legacy fallback when `duration_millis` is absent.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub snoring_absolute_timestamps: Vec<String>,
}

impl ServerRecording {
    /// Map the wire shape into a [`RecordingRecord`]. Server-side records
    /// have no local asset, so `uri` is empty and the server url is the only
    /// source.
    pub fn into_record(self) -> RecordingRecord {
        let duration_millis = self
            .duration_millis
            .or_else(|| self.duration.map(|secs| (secs * 1000.0) as u64))
            .unwrap_or(0);
        let timestamp = self
            .created_at
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now);
        let snoring_absolute_timestamps = self
            .snoring_absolute_timestamps
            .iter()
            .filter_map(|raw| parse_timestamp(raw))
            .collect();

        RecordingRecord {
            id: self.id,
            uri: String::new(),
            name: self.name,
            timestamp,
            duration_millis,
            server_file_url: self.file_url,
            snoring_count: self.snoring_count,
            apnea_events_count: self.apnea_events_count,
            loudest_snore_db: self.loudest_snore_db,
            snoring_absolute_timestamps,
        }
    }
}

/// Aggregate stats for one user's profile view.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RecordingStats {
    #[serde(default)]
    pub total_days: u32,
    /// Average minutes recorded per day used.
    #[serde(default)]
    pub avg_duration: f64,
    #[serde(default)]
    pub avg_apnea_count: f64,
    #[serde(default)]
    pub max_snore_db: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub sex: String,
}

/// Per-account aggregate row for the admin dashboard.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminUserStats {
    #[serde(default)]
    pub user_uid: String,
    #[serde(default, rename = "firstName")]
    pub first_name: String,
    #[serde(default, rename = "lastName")]
    pub last_name: String,
    #[serde(default, rename = "fullName")]
    pub full_name: String,
    #[serde(default, rename = "isDeleted")]
    pub is_deleted: bool,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, rename = "lastUsed")]
    pub last_used: Option<String>,
    #[serde(default, rename = "daysUsed")]
    pub days_used: u32,
    #[serde(default, rename = "totalDurationMillis")]
    pub total_duration_millis: u64,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
struct SetDeletedRequest {
    is_deleted: bool,
}

// ============================================================================
// Client
// ============================================================================

/// HTTP client for the analysis backend.
///
/// The backend is an opaque service consumed purely through its JSON
/// contract; this client normalizes its responses into local record fields
/// and never deletes local data on failure.
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Read the captured asset, base64-encode it and submit it for analysis.
    ///
    /// A failure here leaves the caller's local record unconfirmed; retry is
    /// strictly manual.
    pub async fn upload(
        &self,
        uri: &str,
        name: &str,
        duration_millis: u64,
        user_uid: Option<&str>,
    ) -> Result<AnalysisResult> {
        let user_uid = user_uid
            .filter(|uid| !uid.is_empty())
            .ok_or(Error::Unauthenticated)?;

        let bytes = tokio::fs::read(uri)
            .await
            .map_err(|e| Error::StorageUnavailable(format!("failed to read {}: {}", uri, e)))?;
        let audio_data = base64::engine::general_purpose::STANDARD.encode(&bytes);

        info!(
            "Uploading {} ({} bytes, {} ms) for analysis",
            uri,
            bytes.len(),
            duration_millis
        );

        let request = AnalyzeRequest {
            audio_data,
            name,
            user_uid,
            duration_millis,
        };

        let response = self
            .http
            .post(self.url("/analyze-audio"))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::UploadFailed {
                status_code: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::UploadFailed {
                status_code: Some(status.as_u16()),
                message,
            });
        }

        response
            .json::<AnalysisResult>()
            .await
            .map_err(|e| Error::UploadFailed {
                status_code: Some(status.as_u16()),
                message: format!("unreadable analysis response: {}", e),
            })
    }

    /// All recordings the backend holds for `uid`, mapped into records.
    pub async fn fetch_recordings(&self, uid: &str) -> Result<Vec<RecordingRecord>> {
        let response = self
            .get(&format!("/get-recordings/{}", uid))
            .await?
            .json::<Vec<ServerRecording>>()
            .await
            .map_err(unreadable)?;
        Ok(response.into_iter().map(ServerRecording::into_record).collect())
    }

    /// Aggregate stats for `uid`. Missing fields read as 0.
    pub async fn fetch_stats(&self, uid: &str) -> Result<RecordingStats> {
        self.get(&format!("/get-recording-stats/{}", uid))
            .await?
            .json::<RecordingStats>()
            .await
            .map_err(unreadable)
    }

    /// `Ok(None)` when the profile has not been created yet (backend 404).
    pub async fn fetch_user_profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        let response = self
            .http
            .get(self.url(&format!("/get-user-profile/{}", uid)))
            .send()
            .await
            .map_err(transport)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check(response).await?;
        let profile = response.json::<UserProfile>().await.map_err(unreadable)?;
        Ok(Some(profile))
    }

    /// Toggle the soft-delete flag on a user account. Returns the backend's
    /// confirmation message.
    pub async fn set_user_deleted(&self, uid: &str, is_deleted: bool) -> Result<String> {
        let response = self
            .http
            .put(self.url(&format!("/admin/user-profile/{}", uid)))
            .json(&SetDeletedRequest { is_deleted })
            .send()
            .await
            .map_err(transport)?;
        let response = check(response).await?;
        let body = response.json::<MessageResponse>().await.map_err(unreadable)?;
        Ok(body.message)
    }

    /// Per-user aggregate rows for the admin dashboard.
    pub async fn fetch_all_user_stats(&self) -> Result<Vec<AdminUserStats>> {
        self.get("/admin/get-all-user-stats")
            .await?
            .json::<Vec<AdminUserStats>>()
            .await
            .map_err(unreadable)
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(transport)?;
        check(response).await
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(Error::RequestFailed {
        status_code: Some(status.as_u16()),
        message,
    })
}

fn transport(e: reqwest::Error) -> Error {
    Error::RequestFailed {
        status_code: None,
        message: e.to_string(),
    }
}

fn unreadable(e: reqwest::Error) -> Error {
    Error::RequestFailed {
        status_code: None,
        message: format!("unreadable response: {}", e),
    }
}

/// The backend emits both integer and string ids; normalize to a string.
fn de_flexible_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Parse a backend timestamp: RFC 3339 first, then the naive
/// `datetime.isoformat()` shape (assumed UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
