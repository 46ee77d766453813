//! Replay and Verification
//!
//! Makes match outcomes reproducible:
//! - Snapshots of a running match
//! - Transcript recording at a fixed tick length
//! - Verification by deterministic replay
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    REPLAY SYSTEM                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  snapshot.rs     - Serializable match capture / restore     │
//! │  transcript.rs   - Inputs, checkpoints, result              │
//! │  recorder.rs     - Drives a match while recording it        │
//! │  verify.rs       - Verification by replay                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod snapshot;
pub mod transcript;
pub mod recorder;
pub mod verify;

// Re-export key types
pub use snapshot::{MatchSnapshot, SnapshotError, SNAPSHOT_VERSION};
pub use transcript::{
    hash_config, FighterStanding, MatchMetadata, MatchResult, MatchTranscript,
    StateCheckpoint, TranscriptError, TranscriptEvent, TRANSCRIPT_VERSION,
};
pub use recorder::{MatchRecorder, RecordError};
pub use verify::{
    verify_bytes, verify_transcript, CheckpointResult, VerificationError, VerificationResult,
};
