//! Match Snapshots
//!
//! A serializable capture of a running match. The stage's physics hook is
//! code, not data, so a snapshot stores the stage id plus the mutable
//! platform state and rebuilds the rest from the catalog on restore.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::fighter::{Fighter, FighterId};
use crate::game::hitbox::Hitbox;
use crate::game::stage::{Platform, StageError, StageId};
use crate::game::state::{MatchOutcome, MatchPhase, MatchState};

/// Current snapshot version.
pub const SNAPSHOT_VERSION: u8 = 1;

/// Snapshot errors.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// bincode encode/decode failure
    #[error("snapshot encoding failed: {0}")]
    Binary(#[from] bincode::Error),

    /// JSON encode/decode failure
    #[error("snapshot JSON failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Stage could not be rebuilt
    #[error(transparent)]
    Stage(#[from] StageError),

    /// Version mismatch
    #[error("snapshot version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Supported version
        expected: u8,
        /// Version found
        got: u8,
    },

    /// Stored platforms don't fit the rebuilt stage
    #[error("stage {stage} has {expected} platforms, snapshot has {found}")]
    PlatformMismatch {
        /// Stage rebuilt from the catalog
        stage: StageId,
        /// Platforms on that stage
        expected: usize,
        /// Platforms in the snapshot
        found: usize,
    },
}

/// Point-in-time capture of a match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchSnapshot {
    /// Format version
    pub version: u8,
    /// Tick the snapshot was taken at
    pub tick: u32,
    /// Match phase
    pub phase: MatchPhase,
    /// Round clock
    pub time_remaining: Option<f64>,
    /// Catalog stage
    pub stage_id: StageId,
    /// Platform state (positions, wear, broken timers)
    pub platforms: Vec<Platform>,
    /// Fighters in id order
    pub fighters: Vec<Fighter>,
    /// Detached projectiles
    pub projectiles: Vec<Hitbox>,
    /// Pending respawns
    pub respawn_timers: Vec<(FighterId, f64)>,
    /// Outcome, once decided
    pub outcome: Option<MatchOutcome>,
}

impl MatchSnapshot {
    /// Capture a match.
    pub fn capture(state: &MatchState) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            tick: state.tick,
            phase: state.phase,
            time_remaining: state.time_remaining,
            stage_id: state.stage.id,
            platforms: state.stage.platforms.clone(),
            fighters: state.fighters.values().cloned().collect(),
            projectiles: state.projectiles.clone(),
            respawn_timers: state.respawn_timers.iter().map(|(id, t)| (*id, *t)).collect(),
            outcome: state.outcome,
        }
    }

    /// Rebuild the match. Only catalog stages can be restored.
    pub fn restore(&self) -> Result<MatchState, SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                got: self.version,
            });
        }

        let mut stage = self.stage_id.build()?;
        if stage.platforms.len() != self.platforms.len() {
            return Err(SnapshotError::PlatformMismatch {
                stage: self.stage_id,
                expected: stage.platforms.len(),
                found: self.platforms.len(),
            });
        }
        stage.platforms = self.platforms.clone();

        Ok(MatchState {
            tick: self.tick,
            phase: self.phase,
            time_remaining: self.time_remaining,
            stage,
            fighters: self.fighters.iter().map(|f| (f.id, f.clone())).collect(),
            projectiles: self.projectiles.clone(),
            respawn_timers: self.respawn_timers.iter().copied().collect::<BTreeMap<_, _>>(),
            outcome: self.outcome,
            pending_events: Vec::new(),
        })
    }

    /// Serialize to bytes using bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from bincode bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, SnapshotError> {
        Ok(bincode::deserialize(data)?)
    }

    /// Pretty JSON, for debugging.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse JSON produced by [`MatchSnapshot::to_json`].
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}
