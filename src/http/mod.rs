//! Local upload API
//!
//! Thin CRUD surface over the recording store:
//! - POST /upload-recording - Save a base64 audio payload to disk + index
//! - GET /recordings - List all recordings
//! - DELETE /recordings/:id - Delete file (best-effort) and record
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
