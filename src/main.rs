use anyhow::{Context, Result};
use clap::Parser;
use somnolog::{create_router, AppState, Config, LocalRecordingStore};
use tracing::info;

#[derive(Parser)]
#[command(name = "somnolog", about = "Sleep-recording upload API")]
struct Args {
    /// Config file (without extension)
    #[arg(long, default_value = "config/somnolog")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v0.1.0", cfg.service.name);
    info!("Recording index: {}", cfg.storage.index_path);
    info!("Uploads directory: {}", cfg.storage.uploads_dir);
    info!("Analysis backend: {}", cfg.backend.base_url);

    let store = LocalRecordingStore::new(&cfg.storage.index_path);
    let state = AppState::new(store, &cfg.storage.uploads_dir);
    let router = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
