//! Stage Interface
//!
//! A stage is fixed geometry plus a little state: platforms (some of which
//! move or break), damaging hazard zones, a blast zone, spawn points and an
//! optional physics hook that replaces the engine's default forces.
//!
//! Stages are validated once at construction; the simulation never has to
//! handle a stage without platforms or with a blast zone that cuts through
//! the arena.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::rect::Aabb;
use crate::core::vec2::Vec2;
use crate::game::physics::{damp, PhysicsConfig};
use crate::{FRAME_RATE, TIMER_EPSILON};

/// Spawn points every stage must provide (one per player).
pub const MIN_SPAWN_POINTS: usize = 2;

// =============================================================================
// ERRORS
// =============================================================================

/// Stage construction errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StageError {
    /// Stage has no platforms
    #[error("stage has no platforms")]
    NoPlatforms,

    /// No blast zone given
    #[error("stage has no blast zone")]
    MissingBlastZone,

    /// Blast zone has no interior
    #[error("blast zone is degenerate")]
    DegenerateBlastZone,

    /// Platform with non-positive or non-finite size
    #[error("platform {index} has invalid geometry")]
    InvalidPlatform {
        /// Platform index
        index: usize,
    },

    /// Platform (or its travel) reaches the blast zone
    #[error("platform {index} is not strictly inside the blast zone")]
    PlatformOutsideBlastZone {
        /// Platform index
        index: usize,
    },

    /// Not enough spawn points
    #[error("stage has {found} spawn points, needs {required}")]
    TooFewSpawnPoints {
        /// Spawn points defined
        found: usize,
        /// Spawn points needed
        required: usize,
    },

    /// Spawn point would KO on arrival
    #[error("spawn point {index} is outside the blast zone")]
    SpawnOutsideBlastZone {
        /// Spawn index
        index: usize,
    },

    /// Name not in the catalog
    #[error("unknown stage: {0}")]
    UnknownStage(String),
}

// =============================================================================
// STAGE IDS
// =============================================================================

/// Stage identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum StageId {
    /// Flat main platform with three pass-through ledges
    Battlefield = 0,
    /// Wide grassland with heavier gravity
    Plains = 1,
    /// Split arena over lava with moving and breakable platforms
    Volcano = 2,
    /// Sandbox stage with distant blast zones
    Toybox = 3,
    /// Built by hand
    Custom = 255,
}

impl StageId {
    /// Every catalog stage.
    pub const CATALOG: [StageId; 4] = [
        StageId::Battlefield,
        StageId::Plains,
        StageId::Volcano,
        StageId::Toybox,
    ];

    /// Lowercase name used in config files.
    pub fn as_str(self) -> &'static str {
        match self {
            StageId::Battlefield => "battlefield",
            StageId::Plains => "plains",
            StageId::Volcano => "volcano",
            StageId::Toybox => "toybox",
            StageId::Custom => "custom",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageId {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StageId::CATALOG
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| StageError::UnknownStage(s.to_string()))
    }
}

// =============================================================================
// PHYSICS HOOK
// =============================================================================

/// What a physics hook may look at for one fighter.
#[derive(Clone, Copy, Debug)]
pub struct HookContext<'a> {
    /// Engine defaults (gravity, friction, terminal velocity)
    pub defaults: &'a PhysicsConfig,
    /// Fighter feet position
    pub position: Vec2,
    /// Fighter weight
    pub weight: f64,
    /// Standing on a platform
    pub on_ground: bool,
    /// Landed during the previous collision pass
    pub just_landed: bool,
    /// Fighter steered its own horizontal speed this tick
    pub controlled: bool,
    /// Tick length in 60 Hz frames
    pub frames: f64,
}

/// Per-stage replacement for the engine's gravity and friction.
///
/// Implementations must scale by `ctx.frames` so behavior stays frame-rate
/// invariant.
pub trait PhysicsHook: fmt::Debug + Send + Sync {
    /// Apply forces to `velocity` for one tick.
    fn apply(&self, ctx: &HookContext<'_>, velocity: &mut Vec2);
}

/// Horizontal band with a multiplier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Zone {
    /// Left edge (inclusive)
    pub min_x: f64,
    /// Right edge (exclusive)
    pub max_x: f64,
    /// Multiplier inside the band
    pub scale: f64,
}

impl Zone {
    fn scale_at(zones: &[Zone], x: f64) -> f64 {
        zones
            .iter()
            .find(|z| x >= z.min_x && x < z.max_x)
            .map_or(1.0, |z| z.scale)
    }
}

/// Data-driven physics hook.
#[derive(Clone, Debug, PartialEq)]
pub struct StageTuning {
    /// Multiplier on default gravity
    pub gravity_scale: f64,
    /// Air friction factor per frame
    pub air_friction: f64,
    /// Ground friction factor per frame
    pub ground_friction: f64,
    /// Constant horizontal push on airborne fighters, per frame
    pub horizontal_bias: f64,
    /// Fraction of horizontal speed shed on the landing tick
    pub landing_magnetism: f64,
    /// Fall speed cap
    pub terminal_velocity: f64,
    /// Gravity multipliers by x band
    pub gravity_zones: Vec<Zone>,
    /// Ground friction multipliers by x band
    pub friction_zones: Vec<Zone>,
}

impl PhysicsHook for StageTuning {
    fn apply(&self, ctx: &HookContext<'_>, velocity: &mut Vec2) {
        let x = ctx.position.x;
        if ctx.on_ground {
            if !ctx.controlled {
                let friction = self.ground_friction * Zone::scale_at(&self.friction_zones, x);
                velocity.x = damp(velocity.x, friction, ctx.frames);
            }
            if ctx.just_landed {
                velocity.x *= (1.0 - self.landing_magnetism).max(0.0);
            }
            return;
        }

        let gravity = ctx.defaults.gravity
            * self.gravity_scale
            * Zone::scale_at(&self.gravity_zones, x)
            * ctx.weight
            * ctx.frames;
        velocity.y = (velocity.y + gravity).min(self.terminal_velocity);
        velocity.x += self.horizontal_bias * ctx.frames;
        if !ctx.controlled {
            velocity.x = damp(velocity.x, self.air_friction, ctx.frames);
        }
    }
}

// =============================================================================
// PLATFORMS
// =============================================================================

/// Platform behavior.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum PlatformKind {
    /// Blocks from every side
    Solid,
    /// Only stops fighters falling onto its top
    PassThrough,
    /// One-way platform that travels back and forth
    Moving {
        /// Travel velocity in pixels per frame
        velocity: Vec2,
        /// Distance covered before turning around
        range: f64,
    },
    /// Solid until stood on for `durability` seconds, then gone for `respawn_time`
    Breakable {
        /// Seconds of standing it survives
        durability: f64,
        /// Seconds until it comes back
        respawn_time: f64,
    },
}

/// What happened to a platform during [`Stage::advance`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlatformChange {
    /// Platform index
    pub index: usize,
    /// How far it moved this tick
    pub displacement: Vec2,
    /// Broke this tick
    pub broke: bool,
    /// Came back this tick
    pub restored: bool,
}

/// A platform and its runtime state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    /// Current region
    pub rect: Aabb,
    /// Behavior
    pub kind: PlatformKind,
    /// Top-left at construction
    pub origin: Vec2,
    /// Distance travelled from origin (moving platforms)
    pub travel: f64,
    /// +1 heading out, -1 heading back
    pub heading: f64,
    /// Seconds stood on since last restore (breakable platforms)
    pub wear: f64,
    /// Seconds until restored (0 while intact)
    pub broken_for: f64,
}

impl Platform {
    /// Create a platform in its initial state.
    pub fn new(rect: Aabb, kind: PlatformKind) -> Self {
        Self {
            rect,
            kind,
            origin: Vec2::new(rect.x, rect.y),
            travel: 0.0,
            heading: 1.0,
            wear: 0.0,
            broken_for: 0.0,
        }
    }

    /// Top surface y.
    #[inline]
    pub fn top(&self) -> f64 {
        self.rect.top()
    }

    /// Collidable right now.
    #[inline]
    pub fn is_present(&self) -> bool {
        self.broken_for <= TIMER_EPSILON
    }

    /// Only the top surface collides.
    #[inline]
    pub fn is_one_way(&self) -> bool {
        matches!(self.kind, PlatformKind::PassThrough | PlatformKind::Moving { .. })
    }

    /// Every region this platform can occupy.
    pub fn sweep_bounds(&self) -> Aabb {
        match self.kind {
            PlatformKind::Moving { velocity, range } => {
                let end = self.origin + velocity.normalize() * range;
                let left = self.origin.x.min(end.x);
                let top = self.origin.y.min(end.y);
                Aabb::new(
                    left,
                    top,
                    (self.origin.x - end.x).abs() + self.rect.width,
                    (self.origin.y - end.y).abs() + self.rect.height,
                )
            }
            _ => self.rect,
        }
    }

    /// Advance by one tick. `occupied` is true if a fighter stands on it.
    pub fn advance(&mut self, index: usize, dt: f64, occupied: bool) -> PlatformChange {
        let mut change = PlatformChange {
            index,
            displacement: Vec2::ZERO,
            broke: false,
            restored: false,
        };

        match self.kind {
            PlatformKind::Moving { velocity, range } => {
                let step = velocity.length() * dt * FRAME_RATE;
                let mut travel = self.travel + self.heading * step;
                if travel > range {
                    travel = (2.0 * range - travel).max(0.0);
                    self.heading = -1.0;
                } else if travel < 0.0 {
                    travel = (-travel).min(range);
                    self.heading = 1.0;
                }
                self.travel = travel;

                let next = self.origin + velocity.normalize() * travel;
                let before = Vec2::new(self.rect.x, self.rect.y);
                self.rect.x = next.x;
                self.rect.y = next.y;
                change.displacement = next - before;
            }
            PlatformKind::Breakable { durability, respawn_time } => {
                if !self.is_present() {
                    self.broken_for -= dt;
                    if self.broken_for <= TIMER_EPSILON {
                        self.broken_for = 0.0;
                        self.wear = 0.0;
                        change.restored = true;
                    }
                } else if occupied {
                    self.wear += dt;
                    if self.wear + TIMER_EPSILON >= durability {
                        self.broken_for = respawn_time;
                        change.broke = true;
                    }
                }
            }
            PlatformKind::Solid | PlatformKind::PassThrough => {}
        }
        change
    }
}

// =============================================================================
// HAZARDS AND BLAST ZONE
// =============================================================================

/// Region that deals damage over time to fighters touching it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    /// Damaging region
    pub region: Aabb,
    /// Percent per second of contact
    pub damage_per_second: f64,
}

/// Outer bounds; leaving them is a KO.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlastZone {
    /// Left bound
    pub left: f64,
    /// Right bound
    pub right: f64,
    /// Top bound
    pub top: f64,
    /// Bottom bound
    pub bottom: f64,
}

impl BlastZone {
    /// Create a blast zone.
    pub const fn new(left: f64, right: f64, top: f64, bottom: f64) -> Self {
        Self { left, right, top, bottom }
    }

    /// Has a finite, non-empty interior.
    pub fn is_valid(&self) -> bool {
        [self.left, self.right, self.top, self.bottom]
            .iter()
            .all(|v| v.is_finite())
            && self.left < self.right
            && self.top < self.bottom
    }

    /// Point is strictly inside.
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x > self.left && p.x < self.right && p.y > self.top && p.y < self.bottom
    }

    /// Rectangle is strictly inside.
    pub fn encloses(&self, rect: &Aabb) -> bool {
        rect.left() > self.left
            && rect.right() < self.right
            && rect.top() > self.top
            && rect.bottom() < self.bottom
    }
}

// =============================================================================
// STAGE
// =============================================================================

/// Arena geometry, hazards and physics.
#[derive(Clone, Debug)]
pub struct Stage {
    /// Identifier
    pub id: StageId,
    /// Display name
    pub name: String,
    /// Nominal width
    pub width: f64,
    /// Nominal height
    pub height: f64,
    /// Platforms; indices are stable for the stage's lifetime
    pub platforms: Vec<Platform>,
    /// Damage zones
    pub hazards: Vec<Hazard>,
    /// KO bounds
    pub blast_zone: BlastZone,
    /// Spawn points, indexed by fighter spawn slot
    pub spawn_points: Vec<Vec2>,
    /// Optional replacement for default forces
    pub physics: Option<Arc<dyn PhysicsHook>>,
}

impl Stage {
    /// Start building a stage.
    pub fn builder(id: StageId, name: impl Into<String>, width: f64, height: f64) -> StageBuilder {
        StageBuilder {
            id,
            name: name.into(),
            width,
            height,
            platforms: Vec::new(),
            hazards: Vec::new(),
            blast_zone: None,
            spawn_points: Vec::new(),
            physics: None,
        }
    }

    /// Spawn point for a slot. Slots wrap around the available points.
    pub fn spawn_point(&self, slot: usize) -> Vec2 {
        if self.spawn_points.is_empty() {
            return Vec2::ZERO;
        }
        self.spawn_points[slot % self.spawn_points.len()]
    }

    /// Advance moving and breakable platforms by one tick.
    ///
    /// `occupied` holds the indices of platforms a fighter stands on.
    pub fn advance(&mut self, dt: f64, occupied: &BTreeSet<usize>) -> Vec<PlatformChange> {
        self.platforms
            .iter_mut()
            .enumerate()
            .map(|(index, platform)| platform.advance(index, dt, occupied.contains(&index)))
            .filter(|c| c.broke || c.restored || !c.displacement.is_zero())
            .collect()
    }

    /// Total hazard damage per second for a hurtbox.
    pub fn hazard_damage_rate(&self, hurtbox: &Aabb) -> f64 {
        self.hazards
            .iter()
            .filter(|h| h.region.overlaps(hurtbox))
            .map(|h| h.damage_per_second)
            .sum()
    }
}

/// Builder for [`Stage`]; validation happens in [`StageBuilder::build`].
#[derive(Debug)]
pub struct StageBuilder {
    id: StageId,
    name: String,
    width: f64,
    height: f64,
    platforms: Vec<Platform>,
    hazards: Vec<Hazard>,
    blast_zone: Option<BlastZone>,
    spawn_points: Vec<Vec2>,
    physics: Option<Arc<dyn PhysicsHook>>,
}

impl StageBuilder {
    /// Add a platform.
    pub fn platform(mut self, x: f64, y: f64, width: f64, height: f64, kind: PlatformKind) -> Self {
        self.platforms.push(Platform::new(Aabb::new(x, y, width, height), kind));
        self
    }

    /// Add a damage zone.
    pub fn hazard(mut self, x: f64, y: f64, width: f64, height: f64, damage_per_second: f64) -> Self {
        self.hazards.push(Hazard {
            region: Aabb::new(x, y, width, height),
            damage_per_second,
        });
        self
    }

    /// Set the blast zone.
    pub fn blast_zone(mut self, left: f64, right: f64, top: f64, bottom: f64) -> Self {
        self.blast_zone = Some(BlastZone::new(left, right, top, bottom));
        self
    }

    /// Add a spawn point (feet position).
    pub fn spawn(mut self, x: f64, y: f64) -> Self {
        self.spawn_points.push(Vec2::new(x, y));
        self
    }

    /// Install a physics hook.
    pub fn physics(mut self, hook: impl PhysicsHook + 'static) -> Self {
        self.physics = Some(Arc::new(hook));
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<Stage, StageError> {
        if self.platforms.is_empty() {
            return Err(StageError::NoPlatforms);
        }
        let blast_zone = self.blast_zone.ok_or(StageError::MissingBlastZone)?;
        if !blast_zone.is_valid() {
            return Err(StageError::DegenerateBlastZone);
        }

        for (index, platform) in self.platforms.iter().enumerate() {
            if !platform.rect.is_valid() {
                return Err(StageError::InvalidPlatform { index });
            }
            if !blast_zone.encloses(&platform.sweep_bounds()) {
                return Err(StageError::PlatformOutsideBlastZone { index });
            }
        }

        if self.spawn_points.len() < MIN_SPAWN_POINTS {
            return Err(StageError::TooFewSpawnPoints {
                found: self.spawn_points.len(),
                required: MIN_SPAWN_POINTS,
            });
        }
        if let Some(index) = self.spawn_points.iter().position(|p| !blast_zone.contains(*p)) {
            return Err(StageError::SpawnOutsideBlastZone { index });
        }

        Ok(Stage {
            id: self.id,
            name: self.name,
            width: self.width,
            height: self.height,
            platforms: self.platforms,
            hazards: self.hazards,
            blast_zone,
            spawn_points: self.spawn_points,
            physics: self.physics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> StageBuilder {
        Stage::builder(StageId::Custom, "Test", 1000.0, 800.0)
            .platform(100.0, 700.0, 800.0, 40.0, PlatformKind::Solid)
            .blast_zone(-200.0, 1200.0, -200.0, 1000.0)
            .spawn(300.0, 660.0)
            .spawn(700.0, 660.0)
    }

    #[test]
    fn test_valid_stage_builds() {
        let stage = base().build().unwrap();
        assert_eq!(stage.platforms.len(), 1);
        assert_eq!(stage.spawn_point(1), Vec2::new(700.0, 660.0));
        assert!(stage.physics.is_none());
    }

    #[test]
    fn test_no_platforms_rejected() {
        let err = Stage::builder(StageId::Custom, "Empty", 100.0, 100.0)
            .blast_zone(-10.0, 110.0, -10.0, 110.0)
            .spawn(10.0, 10.0)
            .spawn(20.0, 10.0)
            .build()
            .unwrap_err();
        assert_eq!(err, StageError::NoPlatforms);
    }

    #[test]
    fn test_blast_zone_must_enclose_platforms() {
        let err = base()
            .platform(1150.0, 500.0, 100.0, 20.0, PlatformKind::PassThrough)
            .build()
            .unwrap_err();
        assert_eq!(err, StageError::PlatformOutsideBlastZone { index: 1 });
    }

    #[test]
    fn test_moving_platform_travel_is_checked() {
        let err = base()
            .platform(
                900.0,
                500.0,
                100.0,
                20.0,
                PlatformKind::Moving { velocity: Vec2::new(2.0, 0.0), range: 300.0 },
            )
            .build()
            .unwrap_err();
        assert_eq!(err, StageError::PlatformOutsideBlastZone { index: 1 });
    }

    #[test]
    fn test_degenerate_blast_zone() {
        let err = base().blast_zone(0.0, 0.0, -10.0, 10.0).build().unwrap_err();
        assert_eq!(err, StageError::DegenerateBlastZone);
    }

    #[test]
    fn test_spawn_checks() {
        let err = Stage::builder(StageId::Custom, "One", 1000.0, 800.0)
            .platform(100.0, 700.0, 800.0, 40.0, PlatformKind::Solid)
            .blast_zone(-200.0, 1200.0, -200.0, 1000.0)
            .spawn(300.0, 660.0)
            .build()
            .unwrap_err();
        assert_eq!(err, StageError::TooFewSpawnPoints { found: 1, required: 2 });

        let err = base().spawn(5000.0, 0.0).build().unwrap_err();
        assert_eq!(err, StageError::SpawnOutsideBlastZone { index: 2 });
    }

    #[test]
    fn test_moving_platform_ping_pong() {
        let mut p = Platform::new(
            Aabb::new(0.0, 0.0, 100.0, 20.0),
            PlatformKind::Moving { velocity: Vec2::new(2.0, 0.0), range: 5.0 },
        );
        let dt = 1.0 / 60.0;

        let c = p.advance(0, dt, false);
        assert!((c.displacement.x - 2.0).abs() < 1e-9);
        p.advance(0, dt, false);
        // 4 -> 6 overshoots the range and reflects back to 4
        let c = p.advance(0, dt, false);
        assert!((p.rect.x - 4.0).abs() < 1e-9);
        assert!(c.displacement.x.abs() < 1e-9);
        assert_eq!(p.heading, -1.0);
        p.advance(0, dt, false);
        assert!((p.rect.x - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_breakable_cycle() {
        let mut p = Platform::new(
            Aabb::new(0.0, 0.0, 100.0, 20.0),
            PlatformKind::Breakable { durability: 0.5, respawn_time: 1.0 },
        );
        let dt = 0.25;

        assert!(!p.advance(0, dt, false).broke);
        assert!(!p.advance(0, dt, true).broke);
        assert!(p.advance(0, dt, true).broke);
        assert!(!p.is_present());

        for _ in 0..3 {
            assert!(!p.advance(0, dt, false).restored);
        }
        assert!(p.advance(0, dt, false).restored);
        assert!(p.is_present());
        assert_eq!(p.wear, 0.0);
    }

    #[test]
    fn test_hazard_rate() {
        let stage = base().hazard(0.0, 900.0, 200.0, 50.0, 15.0).build().unwrap();
        let touching = Aabb::new(50.0, 880.0, 60.0, 80.0);
        let clear = Aabb::new(500.0, 500.0, 60.0, 80.0);
        assert_eq!(stage.hazard_damage_rate(&touching), 15.0);
        assert_eq!(stage.hazard_damage_rate(&clear), 0.0);
    }

    #[test]
    fn test_tuning_hook_gravity_and_magnetism() {
        let defaults = PhysicsConfig::default();
        let tuning = StageTuning {
            gravity_scale: 1.5,
            air_friction: 0.0,
            ground_friction: 0.0,
            horizontal_bias: 0.0,
            landing_magnetism: 0.5,
            terminal_velocity: 10.0,
            gravity_zones: vec![Zone { min_x: 0.0, max_x: 100.0, scale: 2.0 }],
            friction_zones: Vec::new(),
        };
        let mut ctx = HookContext {
            defaults: &defaults,
            position: Vec2::new(500.0, 0.0),
            weight: 1.0,
            on_ground: false,
            just_landed: false,
            controlled: true,
            frames: 1.0,
        };

        let mut v = Vec2::ZERO;
        tuning.apply(&ctx, &mut v);
        assert!((v.y - 1.2).abs() < 1e-9);

        ctx.position.x = 50.0;
        let mut v = Vec2::ZERO;
        tuning.apply(&ctx, &mut v);
        assert!((v.y - 2.4).abs() < 1e-9);

        let mut v = Vec2::new(0.0, 9.9);
        tuning.apply(&ctx, &mut v);
        assert_eq!(v.y, 10.0);

        ctx.on_ground = true;
        ctx.just_landed = true;
        let mut v = Vec2::new(4.0, 0.0);
        tuning.apply(&ctx, &mut v);
        assert_eq!(v.x, 2.0);
    }

    #[test]
    fn test_stage_id_names() {
        assert_eq!("Volcano".parse::<StageId>().unwrap(), StageId::Volcano);
        assert!(matches!("moon".parse::<StageId>(), Err(StageError::UnknownStage(_))));
    }
}
