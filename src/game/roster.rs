//! Character Roster
//!
//! One [`Fighter`](crate::game::fighter::Fighter) type serves every
//! character. What differs per archetype lives here as data: weight,
//! movement tuning, the four-direction move set and a small table of
//! behavior hooks.

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};

use crate::game::input::AttackDirection;
use crate::game::moves::{ArmorWindow, AttackSpec, BuffKind, HitboxShape, MoveSet};

/// Playable characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CharacterId {
    /// Baseline all-rounder
    Brawler = 0,
    /// Balanced sword fighter with a projectile
    Warrior = 1,
    /// Light, fast, multi-hit pressure
    Speedster = 2,
    /// Slow, armored, hits hard
    Heavy = 3,
}

impl CharacterId {
    /// Every character.
    pub const ALL: [CharacterId; 4] = [
        CharacterId::Brawler,
        CharacterId::Warrior,
        CharacterId::Speedster,
        CharacterId::Heavy,
    ];

    /// Static profile for this character.
    pub fn profile(self) -> &'static CharacterProfile {
        match self {
            CharacterId::Brawler => &BRAWLER,
            CharacterId::Warrior => &WARRIOR,
            CharacterId::Speedster => &SPEEDSTER,
            CharacterId::Heavy => &HEAVY,
        }
    }

    /// Lowercase name used in config files.
    pub fn as_str(self) -> &'static str {
        match self {
            CharacterId::Brawler => "brawler",
            CharacterId::Warrior => "warrior",
            CharacterId::Speedster => "speedster",
            CharacterId::Heavy => "heavy",
        }
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized character name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown character: {0}")]
pub struct UnknownCharacter(pub String);

impl FromStr for CharacterId {
    type Err = UnknownCharacter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CharacterId::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownCharacter(s.to_string()))
    }
}

// =============================================================================
// TUNING
// =============================================================================

/// Movement constants. Speeds are pixels per 60 Hz frame; accelerations are
/// per frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovementTuning {
    /// Grounded walk target
    pub walk_speed: f64,
    /// Grounded run target
    pub run_speed: f64,
    /// Grounded speed-up rate
    pub ground_acceleration: f64,
    /// Grounded slow-down rate and idle decay factor
    pub ground_deceleration: f64,
    /// Airborne speed-up rate
    pub air_acceleration: f64,
    /// Airborne slow-down rate and idle decay factor
    pub air_deceleration: f64,
    /// Full jump launch speed
    pub jump_strength: f64,
    /// Short-hop launch speed
    pub short_hop_strength: f64,
    /// Body width
    pub width: f64,
    /// Body height
    pub height: f64,
}

impl Default for MovementTuning {
    fn default() -> Self {
        BRAWLER.tuning
    }
}

/// Per-character behavior hooks that replace per-class overrides.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Hook {
    /// Every attack is armored through its startup
    ArmoredStartup {
        /// Damage multiplier for absorbed hits
        damage_scale: f64,
    },
    /// Grab reaches further than normal
    ExtendedGrab {
        /// Multiplier on the grab box length
        range_scale: f64,
    },
}

/// Everything that distinguishes one character from another.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CharacterProfile {
    /// Which character
    pub id: CharacterId,
    /// Display name
    pub name: &'static str,
    /// Knockback divisor and gravity multiplier (> 0)
    pub weight: f64,
    /// Movement constants
    pub tuning: MovementTuning,
    /// Four-direction move set
    pub moves: MoveSet,
    /// Behavior hooks
    pub hooks: &'static [Hook],
}

impl CharacterProfile {
    /// Attack bound to `direction`.
    #[inline]
    pub fn attack(&self, direction: AttackDirection) -> &AttackSpec {
        self.moves.get(direction)
    }

    /// Armor scale if this character armors every startup.
    pub fn armored_startup(&self) -> Option<f64> {
        self.hooks.iter().find_map(|hook| match hook {
            Hook::ArmoredStartup { damage_scale } => Some(*damage_scale),
            _ => None,
        })
    }

    /// Grab reach multiplier (1.0 unless extended).
    pub fn grab_range_scale(&self) -> f64 {
        self.hooks
            .iter()
            .find_map(|hook| match hook {
                Hook::ExtendedGrab { range_scale } => Some(*range_scale),
                _ => None,
            })
            .unwrap_or(1.0)
    }
}

// =============================================================================
// PROFILES
// =============================================================================

const STANDARD_BOX: HitboxShape = HitboxShape::new(50.0, 50.0, 60.0, -40.0);

/// Baseline fighter; the reference move table.
pub static BRAWLER: CharacterProfile = CharacterProfile {
    id: CharacterId::Brawler,
    name: "Brawler",
    weight: 1.0,
    tuning: MovementTuning {
        walk_speed: 3.0,
        run_speed: 6.0,
        ground_acceleration: 0.4,
        ground_deceleration: 0.6,
        air_acceleration: 0.2,
        air_deceleration: 0.1,
        jump_strength: 15.0,
        short_hop_strength: 8.0,
        width: 60.0,
        height: 80.0,
    },
    moves: MoveSet {
        neutral: AttackSpec::new(
            "Jab", AttackDirection::Neutral, 6, 4, 8, 8.0, 5.0, 0.0, STANDARD_BOX,
        ),
        side: AttackSpec::new(
            "Side Strike", AttackDirection::Side, 8, 5, 12, 12.0, 8.0, 0.0, STANDARD_BOX,
        ),
        up: AttackSpec::new(
            "Uppercut", AttackDirection::Up, 10, 6, 15, 10.0, 12.0, -75.0,
            HitboxShape::new(50.0, 50.0, 0.0, -80.0),
        ),
        down: AttackSpec::new(
            "Low Sweep", AttackDirection::Down, 12, 3, 20, 15.0, 10.0, 45.0,
            HitboxShape::new(50.0, 50.0, 0.0, -10.0),
        ),
    },
    hooks: &[],
};

/// Balanced sword fighter; neutral fires an energy projectile.
pub static WARRIOR: CharacterProfile = CharacterProfile {
    id: CharacterId::Warrior,
    name: "Warrior",
    weight: 1.0,
    tuning: MovementTuning {
        walk_speed: 3.5,
        run_speed: 6.5,
        ground_acceleration: 0.4,
        ground_deceleration: 0.6,
        air_acceleration: 0.2,
        air_deceleration: 0.1,
        jump_strength: 14.0,
        short_hop_strength: 7.5,
        width: 60.0,
        height: 80.0,
    },
    moves: MoveSet {
        neutral: AttackSpec::new(
            "Energy Projectile", AttackDirection::Neutral, 10, 1, 14, 8.0, 4.0, -10.0,
            HitboxShape::new(30.0, 20.0, 45.0, -45.0),
        )
        .with_projectile(8.0, 90),
        side: AttackSpec::new(
            "Sword Dash", AttackDirection::Side, 9, 6, 14, 12.0, 8.0, -5.0,
            HitboxShape::new(70.0, 40.0, 55.0, -40.0),
        )
        .with_lunge(5.0),
        up: AttackSpec::new(
            "Rising Slash", AttackDirection::Up, 8, 8, 18, 15.0, 11.0, -80.0,
            HitboxShape::new(60.0, 70.0, 10.0, -90.0),
        ),
        down: AttackSpec::new(
            "Ground Slam", AttackDirection::Down, 16, 4, 22, 18.0, 10.0, -40.0,
            HitboxShape::new(160.0, 40.0, 0.0, -15.0),
        )
        .with_area(80.0, 0.5),
    },
    hooks: &[],
};

/// Light and fast; multi-hit tornado and a speed boost.
pub static SPEEDSTER: CharacterProfile = CharacterProfile {
    id: CharacterId::Speedster,
    name: "Speedster",
    weight: 0.7,
    tuning: MovementTuning {
        walk_speed: 5.0,
        run_speed: 9.0,
        ground_acceleration: 0.5,
        ground_deceleration: 0.6,
        air_acceleration: 0.3,
        air_deceleration: 0.1,
        jump_strength: 16.0,
        short_hop_strength: 8.5,
        width: 55.0,
        height: 75.0,
    },
    moves: MoveSet {
        neutral: AttackSpec::new(
            "Quick Jab", AttackDirection::Neutral, 3, 2, 4, 5.0, 3.0, 0.0,
            HitboxShape::new(50.0, 45.0, 50.0, -35.0),
        ),
        side: AttackSpec::new(
            "Dash Strike", AttackDirection::Side, 6, 8, 10, 9.0, 6.0, -5.0,
            HitboxShape::new(50.0, 45.0, 65.0, -35.0),
        )
        .with_lunge(4.0),
        up: AttackSpec::new(
            "Tornado", AttackDirection::Up, 5, 12, 8, 4.0, 8.0, -45.0,
            HitboxShape::new(110.0, 45.0, 0.0, -50.0),
        )
        .with_multi_hit(4),
        down: AttackSpec::new(
            "Speed Boost", AttackDirection::Down, 8, 6, 6, 0.0, 0.0, 0.0,
            HitboxShape::new(0.0, 0.0, 0.0, 0.0),
        )
        .with_buff(BuffKind::SpeedBoost, 3.0),
    },
    hooks: &[],
};

/// Slow and heavy; armored charge, area slam and a power stance.
pub static HEAVY: CharacterProfile = CharacterProfile {
    id: CharacterId::Heavy,
    name: "Heavy",
    weight: 1.8,
    tuning: MovementTuning {
        walk_speed: 2.0,
        run_speed: 4.0,
        ground_acceleration: 0.3,
        ground_deceleration: 0.6,
        air_acceleration: 0.15,
        air_deceleration: 0.1,
        jump_strength: 10.0,
        short_hop_strength: 6.0,
        width: 75.0,
        height: 95.0,
    },
    moves: MoveSet {
        neutral: AttackSpec::new(
            "Power Stance", AttackDirection::Neutral, 10, 4, 12, 0.0, 0.0, 0.0,
            HitboxShape::new(0.0, 0.0, 0.0, 0.0),
        )
        .with_buff(BuffKind::PowerStance, 5.0),
        side: AttackSpec::new(
            "Charging Ram", AttackDirection::Side, 14, 10, 20, 20.0, 11.0, -10.0,
            HitboxShape::new(70.0, 70.0, 55.0, -45.0),
        )
        .with_armor(ArmorWindow::Frames(30), 1.0)
        .with_lunge(8.0),
        up: AttackSpec::new(
            "Ground Pound", AttackDirection::Up, 12, 6, 22, 18.0, 12.0, -80.0,
            HitboxShape::new(150.0, 60.0, 0.0, -40.0),
        )
        .with_area(150.0, 0.4),
        down: AttackSpec::new(
            "Seismic Slam", AttackDirection::Down, 18, 4, 24, 22.0, 10.0, -45.0,
            HitboxShape::new(200.0, 40.0, 0.0, -10.0),
        )
        .with_area(200.0, 0.5),
    },
    hooks: &[
        Hook::ArmoredStartup { damage_scale: 1.0 },
        Hook::ExtendedGrab { range_scale: 1.5 },
    ],
};
