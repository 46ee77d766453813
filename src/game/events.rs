//! Game Events
//!
//! Events generated during simulation for presentation, replay and
//! verification. The core never acts on them; they are a record.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::fighter::FighterId;
use crate::game::input::AttackDirection;
use crate::game::moves::BuffKind;
use crate::game::state::MatchPhase;

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Knockouts first
    Knockout = 0,
    /// Then hits
    Hit = 1,
    /// Then grabs and throws
    Grab = 2,
    /// Then attack starts and projectiles
    Attack = 3,
    /// Then buffs
    Buff = 4,
    /// Then stage changes
    Stage = 5,
    /// Then respawns
    Respawn = 6,
    /// Lowest priority
    Other = 255,
}

/// Why a match ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// A fighter ran out of stocks
    StockOut,
    /// Round timer reached zero
    TimeUp,
}

/// Game event data.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Attack began
    AttackStarted {
        fighter: FighterId,
        direction: AttackDirection,
    },

    /// Hit launched a defender
    Hit {
        attacker: FighterId,
        defender: FighterId,
        damage: f64,
        knockback: Vec2,
        new_percent: f64,
    },

    /// Hit absorbed by armor
    Armored {
        attacker: FighterId,
        defender: FighterId,
        damage: f64,
    },

    /// Hit blocked
    Blocked {
        attacker: FighterId,
        defender: FighterId,
        damage: f64,
    },

    /// Grab connected
    Grabbed {
        grabber: FighterId,
        target: FighterId,
    },

    /// Held fighter thrown
    Thrown {
        grabber: FighterId,
        target: FighterId,
        damage: f64,
    },

    /// Held fighter slipped free
    Released {
        target: FighterId,
    },

    /// Self-buff took effect
    BuffApplied {
        fighter: FighterId,
        kind: BuffKind,
    },

    /// Projectile left its owner
    ProjectileLaunched {
        owner: FighterId,
        position: Vec2,
    },

    /// Hazard damage over one tick
    HazardDamage {
        fighter: FighterId,
        damage: f64,
    },

    /// Fighter crossed the blast zone
    Knockout {
        fighter: FighterId,
        stocks_remaining: Option<u32>,
        last_attacker: Option<FighterId>,
    },

    /// Fighter came back
    Respawned {
        fighter: FighterId,
        position: Vec2,
    },

    /// Breakable platform gave way
    PlatformBroken {
        index: usize,
    },

    /// Breakable platform came back
    PlatformRestored {
        index: usize,
    },

    /// Match phase changed
    PhaseChanged {
        phase: MatchPhase,
    },

    /// Match ended
    MatchEnded {
        winner: Option<FighterId>,
        reason: EndReason,
        duration_ticks: u32,
    },
}

/// A game event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Fighter involved (for tie-breaking)
    pub fighter: Option<FighterId>,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u32, priority: EventPriority, data: GameEventData) -> Self {
        let fighter = match &data {
            GameEventData::AttackStarted { fighter, .. }
            | GameEventData::BuffApplied { fighter, .. }
            | GameEventData::HazardDamage { fighter, .. }
            | GameEventData::Knockout { fighter, .. }
            | GameEventData::Respawned { fighter, .. } => Some(*fighter),
            GameEventData::Hit { defender, .. }
            | GameEventData::Armored { defender, .. }
            | GameEventData::Blocked { defender, .. } => Some(*defender),
            GameEventData::Grabbed { target, .. }
            | GameEventData::Thrown { target, .. }
            | GameEventData::Released { target } => Some(*target),
            GameEventData::ProjectileLaunched { owner, .. } => Some(*owner),
            GameEventData::MatchEnded { winner, .. } => *winner,
            _ => None,
        };

        Self {
            tick,
            priority,
            fighter,
            data,
        }
    }

    /// Create knockout event.
    pub fn knockout(
        tick: u32,
        fighter: FighterId,
        stocks_remaining: Option<u32>,
        last_attacker: Option<FighterId>,
    ) -> Self {
        Self::new(
            tick,
            EventPriority::Knockout,
            GameEventData::Knockout {
                fighter,
                stocks_remaining,
                last_attacker,
            },
        )
    }

    /// Create respawn event.
    pub fn respawned(tick: u32, fighter: FighterId, position: Vec2) -> Self {
        Self::new(tick, EventPriority::Respawn, GameEventData::Respawned { fighter, position })
    }

    /// Create attack started event.
    pub fn attack_started(tick: u32, fighter: FighterId, direction: AttackDirection) -> Self {
        Self::new(
            tick,
            EventPriority::Attack,
            GameEventData::AttackStarted { fighter, direction },
        )
    }

    /// Create buff applied event.
    pub fn buff_applied(tick: u32, fighter: FighterId, kind: BuffKind) -> Self {
        Self::new(tick, EventPriority::Buff, GameEventData::BuffApplied { fighter, kind })
    }

    /// Create projectile launched event.
    pub fn projectile_launched(tick: u32, owner: FighterId, position: Vec2) -> Self {
        Self::new(
            tick,
            EventPriority::Attack,
            GameEventData::ProjectileLaunched { owner, position },
        )
    }

    /// Create phase change event.
    pub fn phase_changed(tick: u32, phase: MatchPhase) -> Self {
        Self::new(tick, EventPriority::Other, GameEventData::PhaseChanged { phase })
    }

    /// Create match ended event.
    pub fn match_ended(tick: u32, winner: Option<FighterId>, reason: EndReason) -> Self {
        Self::new(
            tick,
            EventPriority::Other,
            GameEventData::MatchEnded {
                winner,
                reason,
                duration_ticks: tick,
            },
        )
    }

    /// Create a stage event.
    pub fn stage(tick: u32, data: GameEventData) -> Self {
        Self::new(tick, EventPriority::Stage, data)
    }
}

impl PartialEq for GameEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick
            && self.priority == other.priority
            && self.fighter == other.fighter
    }
}

impl Eq for GameEvent {}

impl PartialOrd for GameEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: tick, then priority, then fighter
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
            .then(self.fighter.cmp(&other.fighter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ordering() {
        let p1 = FighterId(0);
        let p2 = FighterId(1);

        let ko = GameEvent::knockout(10, p1, Some(2), Some(p2));
        let attack = GameEvent::attack_started(10, p1, AttackDirection::Side);
        let ko2 = GameEvent::knockout(10, p2, Some(1), None);
        let earlier = GameEvent::respawned(9, p2, Vec2::ZERO);

        // Same tick, but knockout < attack
        assert!(ko < attack);

        // Same tick and priority, but P1 < P2
        assert!(ko < ko2);

        // Tick dominates priority
        assert!(earlier < ko);
    }

    #[test]
    fn test_fighter_tag_follows_data() {
        let hit = GameEvent::new(
            3,
            EventPriority::Hit,
            GameEventData::Hit {
                attacker: FighterId(0),
                defender: FighterId(1),
                damage: 8.0,
                knockback: Vec2::new(8.0, 0.0),
                new_percent: 8.0,
            },
        );
        assert_eq!(hit.fighter, Some(FighterId(1)));

        let broken = GameEvent::stage(3, GameEventData::PlatformBroken { index: 4 });
        assert_eq!(broken.fighter, None);
    }
}
