//! Playback over the recording list
//!
//! A single controller owns at most one loaded sound and at most one
//! expanded detail panel, and consumes asynchronous position updates from a
//! pluggable player backend with a stale-update guard.

mod controller;
mod player;

pub use controller::{PlaybackController, PlaybackState};
pub use player::{LoadedSound, PlayerBackend, PlayerStatus, WavClockPlayer};
