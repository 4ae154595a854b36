// Integration tests for the analysis backend client
//
// Each test spins an in-process axum stub on a random port and points the
// client at it; no network beyond loopback.

use anyhow::Result;
use axum::{http::StatusCode, response::IntoResponse, routing::get, routing::post, Json, Router};
use serde_json::json;
use somnolog::{BackendClient, Error, LocalRecordingStore, RecordingPatch, RecordingRecord};
use tempfile::TempDir;

async fn spawn_stub(router: Router) -> Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    Ok(format!("http://{}", addr))
}

fn asset(dir: &TempDir) -> Result<String> {
    let path = dir.path().join("night.wav");
    std::fs::write(&path, b"fake audio bytes")?;
    Ok(path.display().to_string())
}

#[tokio::test]
async fn upload_merges_analysis_into_the_record() -> Result<()> {
    let dir = TempDir::new()?;
    let uri = asset(&dir)?;

    let router = Router::new().route(
        "/analyze-audio",
        post(|| async {
            Json(json!({
                "id": "42",
                "file_url": "/uploads/a.m4a",
                "snoring_count": 3,
                "loudest_snore_db": -100,
                "snoring_absolute_timestamps": [],
                "created_at": "2025-10-25T01:30:00.123456"
            }))
        }),
    );
    let client = BackendClient::new(spawn_stub(router).await?);

    let result = client.upload(&uri, "Night recording", 65_000, Some("uid-1")).await?;
    assert_eq!(result.id, "42");

    let mut record = RecordingRecord::new_local(
        "1",
        &uri,
        "Night recording",
        chrono::Utc::now(),
        65_000,
    );
    RecordingPatch::from(&result).apply(&mut record);

    assert_eq!(record.server_file_url.as_deref(), Some("/uploads/a.m4a"));
    assert_eq!(record.snoring_count, Some(3));
    // -100 means "no snoring detected", not silence and not 0 dB.
    assert_eq!(record.loudest_snore_db, Some(-100.0));
    assert!(record.snoring_absolute_timestamps.is_empty());
    assert!(!record.is_unconfirmed());
    Ok(())
}

#[tokio::test]
async fn missing_optional_analysis_fields_default() -> Result<()> {
    let dir = TempDir::new()?;
    let uri = asset(&dir)?;

    // Numeric ids and absent optionals must not fail the upload.
    let router = Router::new().route(
        "/analyze-audio",
        post(|| async { Json(json!({ "id": 7 })) }),
    );
    let client = BackendClient::new(spawn_stub(router).await?);

    let result = client.upload(&uri, "n", 1000, Some("uid-1")).await?;
    assert_eq!(result.id, "7");
    assert_eq!(result.snoring_count, 0);
    assert_eq!(result.apnea_events_count, 0);
    assert_eq!(result.loudest_snore_db, 0.0);
    assert!(result.file_url.is_none());
    assert!(result.event_timestamps().is_empty());
    Ok(())
}

#[tokio::test]
async fn server_error_leaves_the_record_unconfirmed() -> Result<()> {
    let dir = TempDir::new()?;
    let uri = asset(&dir)?;
    let store = LocalRecordingStore::new(dir.path().join("recordings.json"));

    let record =
        RecordingRecord::new_local("1", &uri, "Night recording", chrono::Utc::now(), 65_000);
    store.append(record)?;

    let router = Router::new().route(
        "/analyze-audio",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "analysis failed").into_response() }),
    );
    let client = BackendClient::new(spawn_stub(router).await?);

    let result = client.upload(&uri, "Night recording", 65_000, Some("uid-1")).await;
    match result {
        Err(Error::UploadFailed {
            status_code,
            message,
        }) => {
            assert_eq!(status_code, Some(500));
            assert_eq!(message, "analysis failed");
        }
        other => panic!("expected UploadFailed, got {:?}", other.map(|_| ())),
    }

    // The local record and asset stay put for manual retry.
    let records = store.list()?;
    assert_eq!(records.len(), 1);
    assert!(records[0].server_file_url.is_none());
    assert!(std::path::Path::new(&uri).exists());
    Ok(())
}

#[tokio::test]
async fn upload_without_identity_is_unauthenticated() -> Result<()> {
    let dir = TempDir::new()?;
    let uri = asset(&dir)?;
    let client = BackendClient::new("http://127.0.0.1:9");

    assert!(matches!(
        client.upload(&uri, "n", 1000, None).await,
        Err(Error::Unauthenticated)
    ));
    assert!(matches!(
        client.upload(&uri, "n", 1000, Some("")).await,
        Err(Error::Unauthenticated)
    ));
    Ok(())
}

#[tokio::test]
async fn fetched_recordings_fall_back_to_seconds_duration() -> Result<()> {
    let router = Router::new().route(
        "/get-recordings/:uid",
        get(|| async {
            Json(json!([
                {
                    "id": 1,
                    "name": "With millis",
                    "duration_millis": 65_000,
                    "file_url": "/uploads/a.m4a",
                    "created_at": "2025-10-25T01:30:00"
                },
                {
                    "id": 2,
                    "name": "Legacy seconds",
                    "duration": 65.0,
                    "file_url": "/uploads/b.m4a"
                }
            ]))
        }),
    );
    let client = BackendClient::new(spawn_stub(router).await?);

    let records = client.fetch_recordings("uid-1").await?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].duration_millis, 65_000);
    assert_eq!(records[1].duration_millis, 65_000);
    // Server-side records have no local asset.
    assert!(records[0].uri.is_empty());
    assert_eq!(records[0].server_file_url.as_deref(), Some("/uploads/a.m4a"));
    Ok(())
}

#[tokio::test]
async fn missing_profile_is_none_not_an_error() -> Result<()> {
    let router = Router::new().route(
        "/get-user-profile/:uid",
        get(|| async { (StatusCode::NOT_FOUND, "User profile not found").into_response() }),
    );
    let client = BackendClient::new(spawn_stub(router).await?);

    assert!(client.fetch_user_profile("uid-1").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn stats_missing_fields_read_as_zero() -> Result<()> {
    let router = Router::new().route(
        "/get-recording-stats/:uid",
        get(|| async { Json(json!({ "total_days": 4 })) }),
    );
    let client = BackendClient::new(spawn_stub(router).await?);

    let stats = client.fetch_stats("uid-1").await?;
    assert_eq!(stats.total_days, 4);
    assert_eq!(stats.avg_duration, 0.0);
    assert_eq!(stats.avg_apnea_count, 0.0);
    assert_eq!(stats.max_snore_db, 0.0);
    Ok(())
}

#[tokio::test]
async fn soft_delete_toggle_returns_confirmation() -> Result<()> {
    let router = Router::new().route(
        "/admin/user-profile/:uid",
        axum::routing::put(|| async { Json(json!({ "message": "User uid-1 updated" })) }),
    );
    let client = BackendClient::new(spawn_stub(router).await?);

    let message = client.set_user_deleted("uid-1", true).await?;
    assert_eq!(message, "User uid-1 updated");
    Ok(())
}

#[tokio::test]
async fn admin_stats_map_camel_case_fields() -> Result<()> {
    let router = Router::new().route(
        "/admin/get-all-user-stats",
        get(|| async {
            Json(json!([{
                "user_uid": "uid-1",
                "firstName": "Ada",
                "lastName": "L",
                "fullName": "Ada L",
                "isDeleted": false,
                "daysUsed": 3,
                "totalDurationMillis": 7_200_000
            }]))
        }),
    );
    let client = BackendClient::new(spawn_stub(router).await?);

    let stats = client.fetch_all_user_stats().await?;
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].full_name, "Ada L");
    assert_eq!(stats[0].days_used, 3);
    assert_eq!(stats[0].total_duration_millis, 7_200_000);
    assert!(!stats[0].is_deleted);
    Ok(())
}
