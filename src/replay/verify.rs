//! Verification API
//!
//! Verify matches by deterministic replay: rebuild the starting state from
//! the transcript's metadata, feed back the recorded inputs at the recorded
//! tick length and compare hashes at every checkpoint and at the end.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::hash::StateHash;
use crate::game::fighter::FighterId;
use crate::game::input::InputFrame;
use crate::game::state::{MatchError, MatchPhase, MatchState};
use crate::game::tick::tick;
use crate::replay::transcript::{
    hash_config, MatchTranscript, TranscriptError, TRANSCRIPT_VERSION,
};

/// Verification result.
#[derive(Debug)]
pub struct VerificationResult {
    /// Did verification pass?
    pub valid: bool,

    /// Final state hash (from replay).
    pub computed_final_hash: StateHash,

    /// Expected final hash (from transcript).
    pub expected_final_hash: StateHash,

    /// Checkpoint verification results.
    pub checkpoint_results: Vec<CheckpointResult>,

    /// Detailed error if verification failed.
    pub error: Option<VerificationError>,
}

/// Result of verifying a single checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointResult {
    /// Tick number.
    pub tick: u32,
    /// Expected hash from transcript.
    pub expected: StateHash,
    /// Computed hash from replay.
    pub computed: StateHash,
    /// Did this checkpoint match?
    pub valid: bool,
}

/// Errors that can occur during verification.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// Transcript version mismatch.
    #[error("version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Expected version.
        expected: u8,
        /// Actual version.
        got: u8,
    },

    /// Transcript has no result.
    #[error("transcript is incomplete")]
    IncompleteTranscript,

    /// Stored config does not hash to the stored config hash.
    #[error("config hash mismatch")]
    ConfigHashMismatch,

    /// Config could not be hashed.
    #[error(transparent)]
    Transcript(#[from] TranscriptError),

    /// Starting state could not be rebuilt.
    #[error("cannot rebuild match: {0}")]
    Setup(#[from] MatchError),

    /// A roster fighter has no input recording.
    #[error("no inputs recorded for {fighter}")]
    MissingInputs {
        /// Fighter without a recording.
        fighter: FighterId,
    },

    /// Initial state hash mismatch.
    #[error("initial state mismatch: expected {}, computed {}", hex::encode(.expected), hex::encode(.computed))]
    InitialStateMismatch {
        /// Expected hash.
        expected: StateHash,
        /// Computed hash.
        computed: StateHash,
    },

    /// Checkpoint hash mismatch.
    #[error("checkpoint mismatch at tick {tick}: expected {}, computed {}", hex::encode(.expected), hex::encode(.computed))]
    CheckpointMismatch {
        /// Tick where mismatch occurred.
        tick: u32,
        /// Expected hash.
        expected: StateHash,
        /// Computed hash.
        computed: StateHash,
    },

    /// Final state hash mismatch.
    #[error("final state mismatch: expected {}, computed {}", hex::encode(.expected), hex::encode(.computed))]
    FinalStateMismatch {
        /// Expected hash.
        expected: StateHash,
        /// Computed hash.
        computed: StateHash,
    },

    /// Replayed winner differs from the recorded one.
    #[error("result mismatch: recorded winner {expected:?}, replayed {computed:?}")]
    ResultMismatch {
        /// Recorded winner.
        expected: Option<FighterId>,
        /// Winner after replay.
        computed: Option<FighterId>,
    },
}

impl VerificationResult {
    fn failed(error: VerificationError) -> Self {
        Self {
            valid: false,
            computed_final_hash: [0; 32],
            expected_final_hash: [0; 32],
            checkpoint_results: Vec::new(),
            error: Some(error),
        }
    }
}

/// Decode and verify a bincode transcript.
pub fn verify_bytes(data: &[u8]) -> Result<VerificationResult, TranscriptError> {
    let transcript = MatchTranscript::from_bytes(data)?;
    Ok(verify_transcript(&transcript))
}

/// Verify a match transcript by full replay.
pub fn verify_transcript(transcript: &MatchTranscript) -> VerificationResult {
    if transcript.version != TRANSCRIPT_VERSION {
        return VerificationResult::failed(VerificationError::VersionMismatch {
            expected: TRANSCRIPT_VERSION,
            got: transcript.version,
        });
    }

    // Check transcript is complete
    let Some(result) = &transcript.result else {
        return VerificationResult::failed(VerificationError::IncompleteTranscript);
    };

    // 1. Reconstruct initial state
    let mut state = match reconstruct_initial_state(transcript) {
        Ok(state) => state,
        Err(error) => return VerificationResult::failed(error),
    };

    // 2. Build input lookup from transcript
    let lookup = match build_input_lookup(transcript) {
        Ok(lookup) => lookup,
        Err(error) => return VerificationResult::failed(error),
    };

    // 3. Replay tick by tick with checkpoint verification
    let metadata = &transcript.metadata;
    let mut checkpoint_results = Vec::new();
    let mut checkpoints = transcript.checkpoints.iter().peekable();

    state.phase = MatchPhase::Playing;

    for tick_num in 1..=result.end_tick {
        let tick_inputs = get_inputs_at_tick(&lookup, tick_num);
        tick(&mut state, &tick_inputs, metadata.dt, &metadata.config);

        while let Some(checkpoint) = checkpoints.next_if(|c| c.tick <= state.tick) {
            let computed = state.compute_hash();
            let valid = checkpoint.tick == state.tick && computed == checkpoint.state_hash;
            checkpoint_results.push(CheckpointResult {
                tick: checkpoint.tick,
                expected: checkpoint.state_hash,
                computed,
                valid,
            });

            if !valid {
                warn!(tick = checkpoint.tick, "checkpoint mismatch");
                return VerificationResult {
                    valid: false,
                    computed_final_hash: computed,
                    expected_final_hash: checkpoint.state_hash,
                    checkpoint_results,
                    error: Some(VerificationError::CheckpointMismatch {
                        tick: checkpoint.tick,
                        expected: checkpoint.state_hash,
                        computed,
                    }),
                };
            }
            debug!(tick = checkpoint.tick, "checkpoint ok");
        }
    }

    // 4. Verify final state
    let final_hash = state.compute_hash();
    let error = if final_hash != result.final_state_hash {
        Some(VerificationError::FinalStateMismatch {
            expected: result.final_state_hash,
            computed: final_hash,
        })
    } else if state.winner() != result.winner {
        Some(VerificationError::ResultMismatch {
            expected: result.winner,
            computed: state.winner(),
        })
    } else {
        None
    };

    VerificationResult {
        valid: error.is_none(),
        computed_final_hash: final_hash,
        expected_final_hash: result.final_state_hash,
        checkpoint_results,
        error,
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Rebuild the pre-play match from transcript metadata and check its hash.
fn reconstruct_initial_state(transcript: &MatchTranscript) -> Result<MatchState, VerificationError> {
    let metadata = &transcript.metadata;
    if hash_config(&metadata.config)? != metadata.config_hash {
        return Err(VerificationError::ConfigHashMismatch);
    }

    let stage = metadata.stage.build().map_err(MatchError::from)?;
    let state = MatchState::new(stage, &metadata.roster, &metadata.config)?;

    let computed = state.compute_hash();
    if computed != metadata.initial_state_hash {
        return Err(VerificationError::InitialStateMismatch {
            expected: metadata.initial_state_hash,
            computed,
        });
    }
    Ok(state)
}

/// Input recordings keyed by fighter; every roster fighter must have one.
fn build_input_lookup(
    transcript: &MatchTranscript,
) -> Result<BTreeMap<FighterId, &crate::game::input::InputRecorder>, VerificationError> {
    transcript
        .metadata
        .roster
        .iter()
        .map(|(fighter, _)| {
            transcript
                .inputs_for(*fighter)
                .map(|recorder| (*fighter, recorder))
                .ok_or(VerificationError::MissingInputs { fighter: *fighter })
        })
        .collect()
}

/// Get inputs for all fighters at a specific tick.
fn get_inputs_at_tick(
    lookup: &BTreeMap<FighterId, &crate::game::input::InputRecorder>,
    tick: u32,
) -> BTreeMap<FighterId, InputFrame> {
    lookup
        .iter()
        .map(|(fighter, recorder)| (*fighter, recorder.get_input_at(tick)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::MatchConfig;
    use crate::game::input::Button;
    use crate::replay::recorder::MatchRecorder;

    const DT: f64 = 1.0 / 60.0;

    /// Record a short scripted brawl on `stage`.
    fn recorded(stage: &str, ticks: u32) -> MatchTranscript {
        let config = MatchConfig {
            stage: stage.to_string(),
            characters: vec!["speedster".to_string(), "heavy".to_string()],
            countdown_ticks: 3,
            checkpoint_interval: 60,
            ..MatchConfig::default()
        };
        let mut recorder = MatchRecorder::new(config, DT).unwrap();
        recorder.start();

        for t in 0..ticks {
            let mut inputs = BTreeMap::new();
            let p1: &[Button] = match t % 50 {
                0..=19 => &[Button::Right],
                20 => &[Button::Attack],
                30 => &[Button::Up],
                40 => &[Button::Grab],
                _ => &[],
            };
            let p2: &[Button] = match t % 70 {
                0..=29 => &[Button::Left],
                35 => &[Button::Attack, Button::Down],
                _ => &[],
            };
            inputs.insert(FighterId(0), InputFrame::with(p1));
            inputs.insert(FighterId(1), InputFrame::with(p2));
            if recorder.step(&inputs).match_ended {
                break;
            }
        }
        recorder.finish().1
    }

    #[test]
    fn test_recorded_match_verifies() {
        let transcript = recorded("battlefield", 400);
        assert!(!transcript.checkpoints.is_empty());

        let result = verify_transcript(&transcript);
        assert!(result.valid, "{:?}", result.error);
        assert_eq!(result.computed_final_hash, result.expected_final_hash);
        assert_eq!(result.checkpoint_results.len(), transcript.checkpoints.len());
        assert!(result.checkpoint_results.iter().all(|c| c.valid));
    }

    #[test]
    fn test_volcano_match_verifies_from_bytes() {
        let transcript = recorded("volcano", 300);
        let bytes = transcript.to_bytes().unwrap();
        let result = verify_bytes(&bytes).unwrap();
        assert!(result.valid, "{:?}", result.error);
    }

    #[test]
    fn test_incomplete_transcript_fails() {
        let mut transcript = recorded("battlefield", 30);
        transcript.result = None;

        let result = verify_transcript(&transcript);
        assert!(!result.valid);
        assert!(matches!(result.error, Some(VerificationError::IncompleteTranscript)));
    }

    #[test]
    fn test_tampered_input_detected() {
        let mut transcript = recorded("battlefield", 200);
        let p2 = transcript.metadata.roster[1].0;
        let end = transcript.inputs_for(p2).unwrap().end_tick;
        let forged = crate::game::input::InputRecorder::from_deltas(
            p2,
            vec![crate::game::input::InputDelta::new(1, InputFrame::with(&[Button::Right]))],
            end,
        );
        *transcript.inputs_for_mut(p2).unwrap() = forged;

        let result = verify_transcript(&transcript);
        assert!(!result.valid);
        assert!(matches!(
            result.error,
            Some(VerificationError::CheckpointMismatch { .. }) | Some(VerificationError::FinalStateMismatch { .. })
        ));
    }

    #[test]
    fn test_tampered_config_detected() {
        let mut transcript = recorded("battlefield", 30);
        transcript.metadata.config.physics.gravity = 0.5;

        let result = verify_transcript(&transcript);
        assert!(matches!(result.error, Some(VerificationError::ConfigHashMismatch)));
    }

    #[test]
    fn test_tampered_roster_detected() {
        let mut transcript = recorded("battlefield", 30);
        transcript.metadata.roster.swap(0, 1);

        let result = verify_transcript(&transcript);
        assert!(matches!(result.error, Some(VerificationError::InitialStateMismatch { .. })));
    }

    #[test]
    fn test_missing_inputs_detected() {
        let mut transcript = recorded("battlefield", 30);
        transcript.inputs.pop();

        let result = verify_transcript(&transcript);
        assert!(matches!(result.error, Some(VerificationError::MissingInputs { .. })));
    }
}
