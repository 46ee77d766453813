//! Match Transcript Recording
//!
//! Records all data needed to deterministically verify a match outcome:
//! the config, the roster, the fixed tick length, delta-compressed inputs,
//! periodic state-hash checkpoints and the final result.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::hash::{hash_with_domain, StateHash};
use crate::game::config::MatchConfig;
use crate::game::events::{EndReason, GameEvent, GameEventData};
use crate::game::fighter::FighterId;
use crate::game::input::InputRecorder;
use crate::game::roster::CharacterId;
use crate::game::stage::StageId;

/// Current transcript version.
pub const TRANSCRIPT_VERSION: u8 = 1;

/// Domain separator for config hashing.
const CONFIG_DOMAIN: &[u8] = b"BRAWL_CONFIG_V1";

/// Errors that can occur with transcripts.
#[derive(Debug, Error)]
pub enum TranscriptError {
    /// bincode encode/decode failure
    #[error("transcript encoding failed: {0}")]
    Encoding(#[from] bincode::Error),

    /// Version mismatch
    #[error("transcript version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Supported version
        expected: u8,
        /// Version found
        got: u8,
    },

    /// No result recorded
    #[error("transcript is incomplete")]
    Incomplete,
}

/// Complete match transcript.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchTranscript {
    /// Version for forward compatibility.
    pub version: u8,

    /// Everything needed to rebuild the starting state.
    pub metadata: MatchMetadata,

    /// Per-fighter input recordings (delta-compressed).
    pub inputs: Vec<InputRecorder>,

    /// State hash checkpoints.
    pub checkpoints: Vec<StateCheckpoint>,

    /// Final match result.
    pub result: Option<MatchResult>,

    /// Significant events (knockouts, throws, platform breaks).
    pub events: Vec<TranscriptEvent>,
}

/// Match setup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchMetadata {
    /// Catalog stage
    pub stage: StageId,

    /// Fighters in spawn-slot order.
    pub roster: Vec<(FighterId, CharacterId)>,

    /// Seconds per tick; replay only reproduces a fixed step.
    pub dt: f64,

    /// Full match configuration.
    pub config: MatchConfig,

    /// Hash of the encoded config.
    pub config_hash: StateHash,

    /// Hash of the freshly built match before play.
    pub initial_state_hash: StateHash,
}

/// State checkpoint for partial verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCheckpoint {
    /// Tick number.
    pub tick: u32,

    /// State hash at this tick.
    pub state_hash: StateHash,
}

/// Final standing of one fighter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FighterStanding {
    /// Fighter
    pub fighter: FighterId,
    /// Lives left
    pub stocks: Option<u32>,
    /// Times knocked out
    pub falls: u32,
    /// Percent at the end
    pub damage_percent: f64,
}

/// Final match outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Final tick when match ended.
    pub end_tick: u32,

    /// Winner (None for a draw or an unfinished match).
    pub winner: Option<FighterId>,

    /// Why it ended, if it did.
    pub reason: Option<EndReason>,

    /// Per-fighter standings in id order.
    pub standings: Vec<FighterStanding>,

    /// Final state hash.
    pub final_state_hash: StateHash,
}

/// Transcript event (subset of GameEvent for compact storage).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TranscriptEvent {
    /// Fighter crossed the blast zone.
    Knockout {
        /// Tick of the KO.
        tick: u32,
        /// Fighter knocked out.
        fighter: FighterId,
        /// Last fighter to hit them.
        last_attacker: Option<FighterId>,
    },

    /// Throw landed.
    Thrown {
        /// Tick of the throw.
        tick: u32,
        /// Thrower.
        grabber: FighterId,
        /// Thrown fighter.
        target: FighterId,
    },

    /// Breakable platform gave way.
    PlatformBroken {
        /// Tick of the break.
        tick: u32,
        /// Platform index.
        index: usize,
    },
}

impl MatchTranscript {
    /// Create a new transcript from match metadata.
    pub fn new(metadata: MatchMetadata) -> Self {
        let inputs = metadata
            .roster
            .iter()
            .map(|(id, _)| InputRecorder::new(*id))
            .collect();
        Self {
            version: TRANSCRIPT_VERSION,
            metadata,
            inputs,
            checkpoints: Vec::new(),
            result: None,
            events: Vec::new(),
        }
    }

    /// Record a state checkpoint.
    pub fn add_checkpoint(&mut self, tick: u32, state_hash: StateHash) {
        self.checkpoints.push(StateCheckpoint { tick, state_hash });
    }

    /// Record a game event.
    ///
    /// Only significant events are kept.
    pub fn record_event(&mut self, event: &GameEvent) {
        if let Some(transcript_event) = TranscriptEvent::from_game_event(event) {
            self.events.push(transcript_event);
        }
    }

    /// Recording for one fighter.
    pub fn inputs_for(&self, fighter: FighterId) -> Option<&InputRecorder> {
        self.inputs.iter().find(|r| r.fighter_id == fighter)
    }

    /// Recording for one fighter, mutably.
    pub fn inputs_for_mut(&mut self, fighter: FighterId) -> Option<&mut InputRecorder> {
        self.inputs.iter_mut().find(|r| r.fighter_id == fighter)
    }

    /// Finalize the transcript with match result.
    pub fn finalize(&mut self, result: MatchResult) {
        self.result = Some(result);
    }

    /// Check if transcript is complete.
    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    /// Serialize to bytes using bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TranscriptError> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from bytes, rejecting other versions.
    pub fn from_bytes(data: &[u8]) -> Result<Self, TranscriptError> {
        let transcript: MatchTranscript = bincode::deserialize(data)?;
        if transcript.version != TRANSCRIPT_VERSION {
            return Err(TranscriptError::VersionMismatch {
                expected: TRANSCRIPT_VERSION,
                got: transcript.version,
            });
        }
        Ok(transcript)
    }
}

/// Hash a config's canonical bincode encoding.
pub fn hash_config(config: &MatchConfig) -> Result<StateHash, TranscriptError> {
    let bytes = bincode::serialize(config)?;
    Ok(hash_with_domain(CONFIG_DOMAIN, &bytes))
}

impl TranscriptEvent {
    /// Convert a GameEvent to TranscriptEvent (if relevant).
    pub fn from_game_event(event: &GameEvent) -> Option<Self> {
        match &event.data {
            GameEventData::Knockout { fighter, last_attacker, .. } => Some(TranscriptEvent::Knockout {
                tick: event.tick,
                fighter: *fighter,
                last_attacker: *last_attacker,
            }),
            GameEventData::Thrown { grabber, target, .. } => Some(TranscriptEvent::Thrown {
                tick: event.tick,
                grabber: *grabber,
                target: *target,
            }),
            GameEventData::PlatformBroken { index } => Some(TranscriptEvent::PlatformBroken {
                tick: event.tick,
                index: *index,
            }),
            // Other events are not recorded in transcript
            _ => None,
        }
    }
}
