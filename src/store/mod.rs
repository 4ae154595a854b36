//! Local persistence for recording metadata
//!
//! A single durable JSON index holds the full list of records;
//! every mutation is read-modify-write with an atomic replace.

mod file_store;
mod record;

pub use file_store::LocalRecordingStore;
pub use record::{RecordingPatch, RecordingRecord, NO_SNORING_DB};
