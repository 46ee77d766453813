//! Attack Definition Table
//!
//! Immutable attack templates. A fighter selects one by direction at attack
//! start and tracks its own elapsed frames in [`AttackProgress`]; the
//! template itself is never mutated.
//!
//! Frame counts are in 60 Hz frames regardless of the simulation rate.
//!
//! [`AttackProgress`]: crate::game::fighter::AttackProgress

use serde::{Serialize, Deserialize};

use crate::game::input::AttackDirection;
use crate::FRAME_EPSILON;

// =============================================================================
// FLAGS
// =============================================================================

/// When an attack's armor is up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ArmorWindow {
    /// Throughout the startup frames
    Startup,
    /// For a fixed number of frames from attack start
    Frames(u32),
}

/// Super armor: hits still deal (scaled) damage but cause no knockback or hitstun.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArmorSpec {
    /// How long the armor lasts
    pub window: ArmorWindow,
    /// Damage multiplier applied to absorbed hits
    pub damage_scale: f64,
}

/// Area-of-effect hitbox centered on the offset point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AreaSpec {
    /// Reach from the center
    pub radius: f64,
    /// Fraction of damage lost at the edge (0 = none, 1 = all)
    pub falloff: f64,
}

/// Detached hitbox that travels on its own.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSpec {
    /// Speed in pixels per 60 Hz frame
    pub speed: f64,
    /// Lifetime in frames
    pub lifetime: u32,
}

/// Kind of self-buff an attack can grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BuffKind {
    /// Faster walk/run and ground acceleration
    SpeedBoost = 0,
    /// Harder hits and armored startups
    PowerStance = 1,
}

impl BuffKind {
    /// Walk/run speed multiplier while active.
    pub fn speed_scale(self) -> f64 {
        match self {
            BuffKind::SpeedBoost => 1.5,
            BuffKind::PowerStance => 1.0,
        }
    }

    /// Ground acceleration multiplier while active.
    pub fn acceleration_scale(self) -> f64 {
        match self {
            BuffKind::SpeedBoost => 1.3,
            BuffKind::PowerStance => 1.0,
        }
    }

    /// Outgoing damage multiplier while active.
    pub fn damage_scale(self) -> f64 {
        match self {
            BuffKind::SpeedBoost => 1.0,
            BuffKind::PowerStance => 1.3,
        }
    }

    /// Every attack startup is armored while active.
    pub fn armors_startup(self) -> bool {
        matches!(self, BuffKind::PowerStance)
    }
}

/// Self-buff granted when the attack reaches its active window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuffSpec {
    /// Which buff
    pub kind: BuffKind,
    /// Duration in seconds
    pub duration: f64,
}

/// Optional behaviors layered on a basic strike.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AttackFlags {
    /// Super armor window
    pub armor: Option<ArmorSpec>,
    /// Re-arm interval (frames) for multi-hit moves
    pub multi_hit: Option<u32>,
    /// Area-of-effect falloff
    pub area: Option<AreaSpec>,
    /// Fires a projectile instead of a melee hitbox
    pub projectile: Option<ProjectileSpec>,
    /// Grants a buff instead of spawning a hitbox
    pub buff: Option<BuffSpec>,
    /// Forward velocity impulse applied when the active window opens
    pub lunge: Option<f64>,
}

impl AttackFlags {
    /// No flags.
    pub const NONE: Self = Self {
        armor: None,
        multi_hit: None,
        area: None,
        projectile: None,
        buff: None,
        lunge: None,
    };
}

// =============================================================================
// ATTACK SPEC
// =============================================================================

/// Size and placement of an attack's hitbox relative to the fighter's feet.
///
/// `offset_x` points forward (mirrored by facing); `offset_y` is screen y.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitboxShape {
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
    /// Forward offset of the hitbox center
    pub offset_x: f64,
    /// Vertical offset of the hitbox center from the feet
    pub offset_y: f64,
}

impl HitboxShape {
    /// Create a shape.
    pub const fn new(width: f64, height: f64, offset_x: f64, offset_y: f64) -> Self {
        Self { width, height, offset_x, offset_y }
    }
}

/// Where an attack is in its frame timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttackPhase {
    /// Before the hitbox appears
    Startup,
    /// Hitbox window
    Active,
    /// After the hitbox window, still locked
    Recovery,
    /// Attack is over
    Finished,
}

/// Immutable attack template.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackSpec {
    /// Display name
    pub name: &'static str,
    /// Direction this attack is bound to
    pub direction: AttackDirection,
    /// Frames before the hitbox appears
    pub startup: u32,
    /// Frames the hitbox stays live
    pub active: u32,
    /// Frames of lockout after the active window
    pub recovery: u32,
    /// Percent dealt on hit
    pub damage: f64,
    /// Base knockback magnitude
    pub knockback: f64,
    /// Launch angle in degrees (0 = horizontal, negative = upward)
    pub angle_deg: f64,
    /// Hitbox geometry
    pub hitbox: HitboxShape,
    /// Optional behaviors
    pub flags: AttackFlags,
}

impl AttackSpec {
    /// Plain single-hit melee attack.
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        name: &'static str,
        direction: AttackDirection,
        startup: u32,
        active: u32,
        recovery: u32,
        damage: f64,
        knockback: f64,
        angle_deg: f64,
        hitbox: HitboxShape,
    ) -> Self {
        Self {
            name,
            direction,
            startup,
            active,
            recovery,
            damage,
            knockback,
            angle_deg,
            hitbox,
            flags: AttackFlags::NONE,
        }
    }

    /// Add super armor.
    pub const fn with_armor(mut self, window: ArmorWindow, damage_scale: f64) -> Self {
        self.flags.armor = Some(ArmorSpec { window, damage_scale });
        self
    }

    /// Make the hitbox re-arm every `interval` frames.
    pub const fn with_multi_hit(mut self, interval: u32) -> Self {
        self.flags.multi_hit = Some(interval);
        self
    }

    /// Turn the hitbox into an area blast.
    pub const fn with_area(mut self, radius: f64, falloff: f64) -> Self {
        self.flags.area = Some(AreaSpec { radius, falloff });
        self
    }

    /// Fire a projectile when the active window opens.
    pub const fn with_projectile(mut self, speed: f64, lifetime: u32) -> Self {
        self.flags.projectile = Some(ProjectileSpec { speed, lifetime });
        self
    }

    /// Grant a buff instead of striking.
    pub const fn with_buff(mut self, kind: BuffKind, duration: f64) -> Self {
        self.flags.buff = Some(BuffSpec { kind, duration });
        self
    }

    /// Push the attacker forward when the active window opens.
    pub const fn with_lunge(mut self, speed: f64) -> Self {
        self.flags.lunge = Some(speed);
        self
    }

    /// Total frames from start to unlock.
    #[inline]
    pub fn total_frames(&self) -> u32 {
        self.startup + self.active + self.recovery
    }

    /// Phase at `elapsed` frames since the attack started.
    pub fn phase_at(&self, elapsed: f64) -> AttackPhase {
        let e = elapsed + FRAME_EPSILON;
        if e < self.startup as f64 {
            AttackPhase::Startup
        } else if e < (self.startup + self.active) as f64 {
            AttackPhase::Active
        } else if e < self.total_frames() as f64 {
            AttackPhase::Recovery
        } else {
            AttackPhase::Finished
        }
    }

    /// Frames of armor granted at attack start, if any.
    pub fn armor_frames(&self) -> Option<(u32, f64)> {
        self.flags.armor.map(|armor| {
            let frames = match armor.window {
                ArmorWindow::Startup => self.startup,
                ArmorWindow::Frames(n) => n,
            };
            (frames, armor.damage_scale)
        })
    }

    /// Attack strikes with a hitbox (buff moves do not).
    #[inline]
    pub fn spawns_hitbox(&self) -> bool {
        self.flags.buff.is_none()
    }
}

// =============================================================================
// MOVE SET
// =============================================================================

/// One attack per direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveSet {
    /// No direction held
    pub neutral: AttackSpec,
    /// Left/right held
    pub side: AttackSpec,
    /// Up held
    pub up: AttackSpec,
    /// Down held
    pub down: AttackSpec,
}

impl MoveSet {
    /// Attack bound to `direction`.
    pub fn get(&self, direction: AttackDirection) -> &AttackSpec {
        match direction {
            AttackDirection::Neutral => &self.neutral,
            AttackDirection::Side => &self.side,
            AttackDirection::Up => &self.up,
            AttackDirection::Down => &self.down,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAB: AttackSpec = AttackSpec::new(
        "Jab",
        AttackDirection::Neutral,
        6,
        4,
        8,
        8.0,
        5.0,
        0.0,
        HitboxShape::new(50.0, 50.0, 60.0, -40.0),
    );

    #[test]
    fn test_phase_boundaries() {
        assert_eq!(JAB.phase_at(0.0), AttackPhase::Startup);
        assert_eq!(JAB.phase_at(5.0), AttackPhase::Startup);
        assert_eq!(JAB.phase_at(6.0), AttackPhase::Active);
        assert_eq!(JAB.phase_at(9.0), AttackPhase::Active);
        assert_eq!(JAB.phase_at(10.0), AttackPhase::Recovery);
        assert_eq!(JAB.phase_at(17.0), AttackPhase::Recovery);
        assert_eq!(JAB.phase_at(18.0), AttackPhase::Finished);
    }

    #[test]
    fn test_phase_tolerates_float_drift() {
        // Six ticks of 1/60 s may sum to just under six frames
        let drifted = 6.0 - 1e-12;
        assert_eq!(JAB.phase_at(drifted), AttackPhase::Active);
    }

    #[test]
    fn test_zero_startup_is_active_immediately() {
        let instant = AttackSpec { startup: 0, ..JAB };
        assert_eq!(instant.phase_at(0.0), AttackPhase::Active);
    }

    #[test]
    fn test_armor_window() {
        let armored = JAB.with_armor(ArmorWindow::Startup, 1.0);
        assert_eq!(armored.armor_frames(), Some((6, 1.0)));

        let fixed = JAB.with_armor(ArmorWindow::Frames(30), 0.5);
        assert_eq!(fixed.armor_frames(), Some((30, 0.5)));

        assert_eq!(JAB.armor_frames(), None);
    }

    #[test]
    fn test_buff_moves_do_not_strike() {
        let boost = JAB.with_buff(BuffKind::SpeedBoost, 3.0);
        assert!(!boost.spawns_hitbox());
        assert!(JAB.spawns_hitbox());
    }
}
