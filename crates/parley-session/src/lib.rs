//! Session transcript storage for Parley.
//!
//! A transcript is an append-only sequence of [`TranscriptRecord`]s, one per
//! chat turn side, keyed by [`parley_core::SessionId`].
//!
//! - [`TranscriptStore`]: Storage abstraction (session id → append channel).
//! - [`FileTranscriptStore`]: One JSON Lines file per session on disk.

/// Transcript records and stores.
pub mod transcript;

pub use transcript::{FileTranscriptStore, TranscriptRecord, TranscriptStore};
