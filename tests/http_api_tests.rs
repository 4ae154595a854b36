// Integration tests for the local upload API
//
// The router runs on a loopback port with a temp-dir store; requests go
// through a real HTTP client.

use anyhow::Result;
use base64::Engine;
use serde_json::{json, Value};
use somnolog::{create_router, AppState, LocalRecordingStore};
use tempfile::TempDir;

async fn spawn_api(dir: &TempDir) -> Result<String> {
    let store = LocalRecordingStore::new(dir.path().join("recordings.json"));
    let state = AppState::new(store, dir.path().join("uploads"));
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    Ok(format!("http://{}", addr))
}

fn upload_body(name: &str) -> Value {
    let audio_data = base64::engine::general_purpose::STANDARD.encode(b"fake m4a bytes");
    json!({
        "name": name,
        "duration_millis": 65_000,
        "audio_data": audio_data
    })
}

#[tokio::test]
async fn health_check_responds_ok() -> Result<()> {
    let dir = TempDir::new()?;
    let base = spawn_api(&dir).await?;

    let response = reqwest::get(format!("{}/health", base)).await?;
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await?, "OK");
    Ok(())
}

#[tokio::test]
async fn upload_writes_file_and_indexes_record() -> Result<()> {
    let dir = TempDir::new()?;
    let base = spawn_api(&dir).await?;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/upload-recording", base))
        .json(&upload_body("Night recording"))
        .send()
        .await?;
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await?;
    let record = &body["data"];
    assert_eq!(record["name"], "Night recording");
    assert_eq!(record["durationMillis"], 65_000);
    let server_url = record["serverFileUrl"].as_str().unwrap();
    assert!(server_url.starts_with("/uploads/audio-"));

    // The decoded bytes landed on disk.
    let uri = record["uri"].as_str().unwrap();
    assert_eq!(std::fs::read(uri)?, b"fake m4a bytes");

    // And the record is listed.
    let listed: Vec<Value> = client
        .get(format!("{}/recordings", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], record["id"]);
    Ok(())
}

#[tokio::test]
async fn upload_without_audio_data_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let base = spawn_api(&dir).await?;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/upload-recording", base))
        .json(&json!({ "name": "empty" }))
        .send()
        .await?;
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await?;
    assert_eq!(body["error"], "No audio file data received");
    Ok(())
}

#[tokio::test]
async fn delete_removes_file_then_record() -> Result<()> {
    let dir = TempDir::new()?;
    let base = spawn_api(&dir).await?;
    let client = reqwest::Client::new();

    let created: Value = client
        .post(format!("{}/upload-recording", base))
        .json(&upload_body("To delete"))
        .send()
        .await?
        .json()
        .await?;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    let uri = created["data"]["uri"].as_str().unwrap().to_string();
    assert!(std::path::Path::new(&uri).exists());

    let response = client
        .delete(format!("{}/recordings/{}", base, id))
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["deleted_id"], id.as_str());

    assert!(!std::path::Path::new(&uri).exists());
    let listed: Vec<Value> = client
        .get(format!("{}/recordings", base))
        .send()
        .await?
        .json()
        .await?;
    assert!(listed.is_empty());
    Ok(())
}

#[tokio::test]
async fn delete_unknown_id_is_not_found() -> Result<()> {
    let dir = TempDir::new()?;
    let base = spawn_api(&dir).await?;
    let client = reqwest::Client::new();

    let response = client
        .delete(format!("{}/recordings/does-not-exist", base))
        .send()
        .await?;
    assert_eq!(response.status(), 404);
    Ok(())
}

#[tokio::test]
async fn delete_survives_an_already_missing_file() -> Result<()> {
    let dir = TempDir::new()?;
    let base = spawn_api(&dir).await?;
    let client = reqwest::Client::new();

    let created: Value = client
        .post(format!("{}/upload-recording", base))
        .json(&upload_body("Ghost file"))
        .send()
        .await?
        .json()
        .await?;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    let uri = created["data"]["uri"].as_str().unwrap().to_string();

    // Someone removed the file out from under the index.
    std::fs::remove_file(&uri)?;

    let response = client
        .delete(format!("{}/recordings/{}", base, id))
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    Ok(())
}
