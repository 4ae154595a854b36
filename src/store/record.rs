use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel decibel value meaning "no snoring detected".
///
/// Distinct from `0.0` dB, which is a real (quiet) measurement.
pub const NO_SNORING_DB: f64 = -100.0;

/// One captured/uploaded audio session.
///
/// A record becomes visible the instant recording stops, with
/// `server_file_url = None` ("unconfirmed"). Analysis fields stay `None`
/// until the backend's response is merged in. Upload failure never removes
/// a record; it is left unconfirmed for manual retry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordingRecord {
    /// Unique id, assigned by the caller (time-based) at stop time.
    pub id: String,

    /// Local filesystem path of the captured asset. Empty for records that
    /// only exist server-side (fetched lists).
    pub uri: String,

    /// Display label.
    pub name: String,

    /// Creation instant.
    pub timestamp: DateTime<Utc>,

    /// Wall-clock recording length in milliseconds.
    pub duration_millis: u64,

    /// Set once upload succeeds; `None` means local-only, not yet confirmed.
    #[serde(default)]
    pub server_file_url: Option<String>,

    #[serde(default)]
    pub snoring_count: Option<u32>,

    #[serde(default)]
    pub apnea_events_count: Option<u32>,

    /// Loudest snore level; [`NO_SNORING_DB`] means "no data".
    #[serde(default)]
    pub loudest_snore_db: Option<f64>,

    /// Snore event instants, ordered, each within
    /// `[timestamp, timestamp + duration_millis]`.
    #[serde(default)]
    pub snoring_absolute_timestamps: Vec<DateTime<Utc>>,
}

impl RecordingRecord {
    /// A freshly captured, not-yet-uploaded record.
    pub fn new_local(
        id: impl Into<String>,
        uri: impl Into<String>,
        name: impl Into<String>,
        timestamp: DateTime<Utc>,
        duration_millis: u64,
    ) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
            name: name.into(),
            timestamp,
            duration_millis,
            server_file_url: None,
            snoring_count: None,
            apnea_events_count: None,
            loudest_snore_db: None,
            snoring_absolute_timestamps: Vec::new(),
        }
    }

    /// Whether the upload has not yet been confirmed by the backend.
    pub fn is_unconfirmed(&self) -> bool {
        self.server_file_url.is_none()
    }
}

/// Field-wise merge applied to an existing record, typically the analysis
/// result arriving after upload. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingPatch {
    pub server_file_url: Option<String>,
    pub snoring_count: Option<u32>,
    pub apnea_events_count: Option<u32>,
    pub loudest_snore_db: Option<f64>,
    pub snoring_absolute_timestamps: Option<Vec<DateTime<Utc>>>,
}

impl RecordingPatch {
    pub fn apply(&self, record: &mut RecordingRecord) {
        if let Some(url) = &self.server_file_url {
            record.server_file_url = Some(url.clone());
        }
        if let Some(count) = self.snoring_count {
            record.snoring_count = Some(count);
        }
        if let Some(count) = self.apnea_events_count {
            record.apnea_events_count = Some(count);
        }
        if let Some(db) = self.loudest_snore_db {
            record.loudest_snore_db = Some(db);
        }
        if let Some(stamps) = &self.snoring_absolute_timestamps {
            record.snoring_absolute_timestamps = stamps.clone();
        }
    }
}
