//! Match State
//!
//! Everything a running match owns: the stage, both fighters, detached
//! projectiles, respawn countdowns, the round clock and the outcome.
//! Uses BTreeMap for deterministic iteration order.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::hash::{compute_state_hash, StateHash};
use crate::game::config::{ConfigError, MatchConfig};
use crate::game::events::{EndReason, GameEvent};
use crate::game::fighter::{Fighter, FighterId};
use crate::game::hitbox::Hitbox;
use crate::game::roster::CharacterId;
use crate::game::stage::{Stage, StageError};

/// Fighters per match.
pub const FIGHTERS_PER_MATCH: usize = 2;

// =============================================================================
// ERRORS
// =============================================================================

/// Errors building a match.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Stage failed validation
    #[error(transparent)]
    Stage(#[from] StageError),

    /// Config failed validation
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Wrong number of fighters
    #[error("a match needs exactly {FIGHTERS_PER_MATCH} fighters, got {found}")]
    RosterSize {
        /// Fighters supplied
        found: usize,
    },

    /// Same id twice
    #[error("duplicate fighter id {0}")]
    DuplicateFighter(FighterId),
}

// =============================================================================
// MATCH PHASE
// =============================================================================

/// Current phase of the match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Default)]
pub enum MatchPhase {
    /// Built, not started
    #[default]
    Waiting,
    /// Countdown before play
    Countdown {
        /// Ticks left before play begins
        ticks_remaining: u32,
    },
    /// Active gameplay
    Playing,
    /// Outcome decided
    Ended,
}

impl MatchPhase {
    fn tag(self) -> (u8, u32) {
        match self {
            MatchPhase::Waiting => (0, 0),
            MatchPhase::Countdown { ticks_remaining } => (1, ticks_remaining),
            MatchPhase::Playing => (2, 0),
            MatchPhase::Ended => (3, 0),
        }
    }
}

/// How a finished match turned out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Winner, `None` for a draw
    pub winner: Option<FighterId>,
    /// Why it ended
    pub reason: EndReason,
    /// Ticks played
    pub ticks: u32,
}

// =============================================================================
// MATCH STATE
// =============================================================================

/// Complete state of a match.
#[derive(Clone, Debug)]
pub struct MatchState {
    /// Current tick (counts Playing ticks only)
    pub tick: u32,

    /// Current match phase
    pub phase: MatchPhase,

    /// Seconds left on the round clock, if timed
    pub time_remaining: Option<f64>,

    /// Arena, including moving and breakable platform state
    pub stage: Stage,

    /// Both fighters (BTreeMap for deterministic iteration)
    pub fighters: BTreeMap<FighterId, Fighter>,

    /// Projectiles detached from their owners
    pub projectiles: Vec<Hitbox>,

    /// Seconds until each knocked-out fighter returns
    pub respawn_timers: BTreeMap<FighterId, f64>,

    /// Set once the match ends
    pub outcome: Option<MatchOutcome>,

    /// Events generated this tick (cleared each tick)
    pub pending_events: Vec<GameEvent>,
}

impl MatchState {
    /// Create a match on `stage` with fighters placed at their spawn slots.
    ///
    /// Slot order follows `roster` order.
    pub fn new(
        stage: Stage,
        roster: &[(FighterId, CharacterId)],
        config: &MatchConfig,
    ) -> Result<Self, MatchError> {
        if roster.len() != FIGHTERS_PER_MATCH {
            return Err(MatchError::RosterSize { found: roster.len() });
        }
        if stage.spawn_points.len() < roster.len() {
            return Err(StageError::TooFewSpawnPoints {
                found: stage.spawn_points.len(),
                required: roster.len(),
            }
            .into());
        }

        let mut fighters = BTreeMap::new();
        for (slot, &(id, character)) in roster.iter().enumerate() {
            let mut fighter = Fighter::new(id, character, slot, stage.spawn_point(slot));
            fighter.stocks = config.stocks;
            if stage.spawn_point(slot).x > stage.width / 2.0 {
                fighter.facing = fighter.facing.opposite();
            }
            if fighters.insert(id, fighter).is_some() {
                return Err(MatchError::DuplicateFighter(id));
            }
        }

        Ok(Self {
            tick: 0,
            phase: MatchPhase::Waiting,
            time_remaining: config.round_time,
            stage,
            fighters,
            projectiles: Vec::new(),
            respawn_timers: BTreeMap::new(),
            outcome: None,
            pending_events: Vec::new(),
        })
    }

    /// Build the stage and roster a config names, fighters `P1` and `P2`.
    pub fn from_config(config: &MatchConfig) -> Result<Self, MatchError> {
        config.validate()?;
        let stage = config.stage_id()?.build()?;
        let roster: Vec<(FighterId, CharacterId)> = config
            .character_ids()?
            .into_iter()
            .enumerate()
            .map(|(slot, character)| (FighterId(slot as u8), character))
            .collect();
        Self::new(stage, &roster, config)
    }

    /// Leave `Waiting`: count down, or play at once when there is no countdown.
    pub fn start(&mut self, countdown_ticks: u32) {
        if self.phase != MatchPhase::Waiting {
            return;
        }
        self.phase = if countdown_ticks == 0 {
            MatchPhase::Playing
        } else {
            MatchPhase::Countdown {
                ticks_remaining: countdown_ticks,
            }
        };
        self.push_event(GameEvent::phase_changed(self.tick, self.phase));
    }

    /// Get a fighter by ID.
    pub fn fighter(&self, id: FighterId) -> Option<&Fighter> {
        self.fighters.get(&id)
    }

    /// Get a fighter mutably by ID.
    pub fn fighter_mut(&mut self, id: FighterId) -> Option<&mut Fighter> {
        self.fighters.get_mut(&id)
    }

    /// Check if match has ended.
    pub fn is_ended(&self) -> bool {
        matches!(self.phase, MatchPhase::Ended)
    }

    /// Winner, once decided.
    pub fn winner(&self) -> Option<FighterId> {
        self.outcome.and_then(|o| o.winner)
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, |hasher| {
            let (phase, countdown) = self.phase.tag();
            hasher.update_u8(phase);
            hasher.update_u32(countdown);
            hasher.update_opt_f64(self.time_remaining);

            // Fighters in id order (BTreeMap guarantees this)
            for fighter in self.fighters.values() {
                fighter.hash_into(hasher);
            }

            hasher.update_u32(self.projectiles.len() as u32);
            for projectile in &self.projectiles {
                projectile.hash_into(hasher);
            }

            for (id, remaining) in &self.respawn_timers {
                hasher.update_u8(id.0);
                hasher.update_f64(*remaining);
            }

            for platform in &self.stage.platforms {
                hasher.update_rect(&platform.rect);
                hasher.update_f64(platform.wear);
                hasher.update_f64(platform.broken_for);
            }
        })
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::Vec2;
    use crate::game::fighter::Facing;
    use crate::game::stage::StageId;

    const ROSTER: [(FighterId, CharacterId); 2] = [
        (FighterId(0), CharacterId::Brawler),
        (FighterId(1), CharacterId::Heavy),
    ];

    fn battlefield_match() -> MatchState {
        let stage = StageId::Battlefield.build().unwrap();
        MatchState::new(stage, &ROSTER, &MatchConfig::default()).unwrap()
    }

    #[test]
    fn test_fighters_at_spawn_slots() {
        let state = battlefield_match();
        let p1 = state.fighter(FighterId(0)).unwrap();
        let p2 = state.fighter(FighterId(1)).unwrap();

        assert_eq!(p1.position, state.stage.spawn_point(0));
        assert_eq!(p2.position, state.stage.spawn_point(1));
        assert_eq!(p1.spawn_slot, 0);
        assert_eq!(p2.spawn_slot, 1);
        assert_eq!(p1.facing, Facing::Right);
        assert_eq!(p2.facing, Facing::Left);
        assert_eq!(p1.stocks, Some(3));
        assert_eq!(state.time_remaining, Some(180.0));
    }

    #[test]
    fn test_roster_must_have_two() {
        let stage = StageId::Battlefield.build().unwrap();
        let err = MatchState::new(stage, &ROSTER[..1], &MatchConfig::default()).unwrap_err();
        assert!(matches!(err, MatchError::RosterSize { found: 1 }));
    }

    #[test]
    fn test_duplicate_fighter_rejected() {
        let stage = StageId::Battlefield.build().unwrap();
        let roster = [
            (FighterId(0), CharacterId::Brawler),
            (FighterId(0), CharacterId::Heavy),
        ];
        let err = MatchState::new(stage, &roster, &MatchConfig::default()).unwrap_err();
        assert!(matches!(err, MatchError::DuplicateFighter(FighterId(0))));
    }

    #[test]
    fn test_from_config() {
        let config = MatchConfig {
            stage: "volcano".to_string(),
            characters: vec!["speedster".to_string(), "warrior".to_string()],
            stocks: None,
            ..MatchConfig::default()
        };
        let state = MatchState::from_config(&config).unwrap();
        assert_eq!(state.stage.id, StageId::Volcano);
        assert_eq!(state.fighter(FighterId(0)).unwrap().character, CharacterId::Speedster);
        assert_eq!(state.fighter(FighterId(1)).unwrap().character, CharacterId::Warrior);
        assert_eq!(state.fighter(FighterId(1)).unwrap().stocks, None);
    }

    #[test]
    fn test_start_phases() {
        let mut state = battlefield_match();
        state.start(3);
        assert_eq!(state.phase, MatchPhase::Countdown { ticks_remaining: 3 });
        assert_eq!(state.take_events().len(), 1);

        // Starting twice is a no-op
        state.start(0);
        assert_eq!(state.phase, MatchPhase::Countdown { ticks_remaining: 3 });

        let mut instant = battlefield_match();
        instant.start(0);
        assert_eq!(instant.phase, MatchPhase::Playing);
    }

    #[test]
    fn test_match_state_determinism() {
        let state1 = battlefield_match();
        let state2 = battlefield_match();
        assert_eq!(state1.compute_hash(), state2.compute_hash());
    }

    #[test]
    fn test_hash_tracks_fighters() {
        let base = battlefield_match();
        let mut moved = base.clone();
        moved.fighter_mut(FighterId(1)).unwrap().position += Vec2::new(1.0, 0.0);
        assert_ne!(base.compute_hash(), moved.compute_hash());

        let mut hurt = base.clone();
        hurt.fighter_mut(FighterId(0)).unwrap().damage_percent = 12.0;
        assert_ne!(base.compute_hash(), hurt.compute_hash());
    }

    #[test]
    fn test_btreemap_iteration_order() {
        let stage = StageId::Battlefield.build().unwrap();
        let roster = [
            (FighterId(5), CharacterId::Brawler),
            (FighterId(2), CharacterId::Heavy),
        ];
        let state = MatchState::new(stage, &roster, &MatchConfig::default()).unwrap();

        let ids: Vec<_> = state.fighters.keys().copied().collect();
        assert_eq!(ids, vec![FighterId(2), FighterId(5)]);
        // Slots still follow roster order
        assert_eq!(state.fighter(FighterId(5)).unwrap().spawn_slot, 0);
    }
}
