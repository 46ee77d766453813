//! Physics Engine
//!
//! Per-fighter force application, position integration, blast-zone check and
//! platform resolution. Everything is expressed per 60 Hz frame and scaled by
//! `frames = dt * 60`, so one 1/30 s tick moves a fighter the same distance
//! as two 1/60 s ticks.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::collision::{resolve_platforms, ContactChange};
use crate::game::fighter::{Fighter, FighterConfig};
use crate::game::stage::{HookContext, Stage};
use crate::FRAME_RATE;

/// Engine defaults used when a stage has no physics hook.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration per frame, scaled by weight
    pub gravity: f64,
    /// Fall speed cap
    pub terminal_velocity: f64,
    /// Horizontal damping per frame while airborne
    pub air_friction: f64,
    /// Horizontal damping per frame while grounded
    pub ground_friction: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.8,
            terminal_velocity: 20.0,
            air_friction: 0.02,
            ground_friction: 0.15,
        }
    }
}

/// What happened to a fighter during its physics step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhysicsOutcome {
    /// Crossed the blast zone
    pub knocked_out: bool,
    /// Ground contact changes
    pub contact: ContactChange,
}

/// Geometric damping of `v` by factor `friction` per frame.
#[inline]
pub fn damp(v: f64, friction: f64, frames: f64) -> f64 {
    v * (1.0 - friction).max(0.0).powf(frames)
}

/// Default gravity and friction.
///
/// Friction only touches fighters that are not steering themselves; a
/// controlled fighter's own deceleration already handles slowing down.
pub fn default_forces(ctx: &HookContext<'_>, velocity: &mut Vec2) {
    let config = ctx.defaults;
    if ctx.on_ground {
        if !ctx.controlled {
            velocity.x = damp(velocity.x, config.ground_friction, ctx.frames);
        }
        return;
    }

    let gravity = config.gravity * ctx.weight * ctx.frames;
    velocity.y = (velocity.y + gravity).min(config.terminal_velocity);
    if !ctx.controlled {
        velocity.x = damp(velocity.x, config.air_friction, ctx.frames);
    }
}

/// Apply forces for one tick, via the stage hook when there is one.
pub fn apply_forces(fighter: &mut Fighter, stage: &Stage, config: &PhysicsConfig, frames: f64) {
    let ctx = HookContext {
        defaults: config,
        position: fighter.position,
        weight: fighter.weight,
        on_ground: fighter.on_ground,
        just_landed: fighter.just_landed,
        controlled: fighter.is_under_control(),
        frames,
    };
    let mut velocity = fighter.velocity;
    match &stage.physics {
        Some(hook) => hook.apply(&ctx, &mut velocity),
        None => default_forces(&ctx, &mut velocity),
    }
    fighter.velocity = velocity;
}

/// Trapezoidal position update over the tick's velocity change.
#[inline]
pub fn integrate(position: Vec2, start_velocity: Vec2, end_velocity: Vec2, frames: f64) -> Vec2 {
    position + (start_velocity + end_velocity) * (0.5 * frames)
}

/// Run one fighter through forces, integration, blast zone and platforms.
///
/// Fighters out of play or held by a grabber are skipped. A blast-zone KO
/// preempts any landing in the same tick.
pub fn step_fighter(
    fighter: &mut Fighter,
    stage: &Stage,
    dt: f64,
    config: &PhysicsConfig,
    fighter_config: &FighterConfig,
) -> PhysicsOutcome {
    let mut outcome = PhysicsOutcome::default();
    if !fighter.in_play || fighter.held_by.is_some() {
        return outcome;
    }

    let frames = dt * FRAME_RATE;
    apply_forces(fighter, stage, config, frames);
    fighter.just_landed = false;

    let prev_position = fighter.position;
    fighter.position = integrate(prev_position, fighter.integration_origin, fighter.velocity, frames);
    fighter.settle_air_state();

    if !stage.blast_zone.contains(fighter.position) {
        fighter.knock_out();
        outcome.knocked_out = true;
        return outcome;
    }

    outcome.contact = resolve_platforms(fighter, prev_position, &stage.platforms, fighter_config);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::fighter::{FighterId, FighterState};
    use crate::game::input::{Button, InputFrame, PlayerInput};
    use crate::game::roster::CharacterId;
    use crate::game::stage::{PlatformKind, StageId};

    fn flat_stage() -> Stage {
        Stage::builder(StageId::Custom, "Flat", 1000.0, 800.0)
            .platform(0.0, 700.0, 1000.0, 40.0, PlatformKind::Solid)
            .blast_zone(-300.0, 1300.0, -300.0, 1100.0)
            .spawn(200.0, 600.0)
            .spawn(800.0, 600.0)
            .build()
            .unwrap()
    }

    fn airborne(x: f64, y: f64) -> Fighter {
        let mut f = Fighter::new(FighterId(0), CharacterId::Brawler, 0, Vec2::new(x, y));
        f.state = FighterState::Falling;
        f
    }

    fn physics_tick(f: &mut Fighter, stage: &Stage, dt: f64) -> PhysicsOutcome {
        f.integration_origin = f.velocity;
        step_fighter(f, stage, dt, &PhysicsConfig::default(), &FighterConfig::default())
    }

    #[test]
    fn test_gravity_scales_with_weight() {
        let stage = flat_stage();
        let mut light = airborne(200.0, 100.0);
        let mut heavy = airborne(200.0, 100.0);
        heavy.weight = 2.0;

        physics_tick(&mut light, &stage, 1.0 / 60.0);
        physics_tick(&mut heavy, &stage, 1.0 / 60.0);
        assert!((light.velocity.y - 0.8).abs() < 1e-9);
        assert!((heavy.velocity.y - 1.6).abs() < 1e-9);
    }

    #[test]
    fn test_terminal_velocity() {
        let stage = flat_stage();
        let mut f = airborne(200.0, 100.0);
        f.velocity.y = 19.9;
        physics_tick(&mut f, &stage, 1.0 / 60.0);
        assert_eq!(f.velocity.y, 20.0);
    }

    #[test]
    fn test_free_fall_frame_rate_invariant() {
        let stage = flat_stage();
        let mut coarse = airborne(200.0, 100.0);
        let mut fine = airborne(200.0, 100.0);

        physics_tick(&mut coarse, &stage, 1.0 / 30.0);
        physics_tick(&mut fine, &stage, 1.0 / 60.0);
        physics_tick(&mut fine, &stage, 1.0 / 60.0);

        assert!((coarse.position.y - fine.position.y).abs() < 1e-6);
        assert!((coarse.velocity.y - fine.velocity.y).abs() < 1e-6);
    }

    #[test]
    fn test_walk_frame_rate_invariant() {
        let stage = flat_stage();
        let config = FighterConfig::default();
        let mut coarse = airborne(200.0, 700.0);
        let mut fine = airborne(200.0, 700.0);
        for f in [&mut coarse, &mut fine] {
            f.on_ground = true;
            f.state = FighterState::Idle;
        }

        let right = InputFrame::with(&[Button::Right]);
        let run = |f: &mut Fighter, dt: f64| {
            let input = PlayerInput::new(right, f.last_input);
            f.last_input = right;
            f.update(&input, dt, &config);
            step_fighter(f, &stage, dt, &PhysicsConfig::default(), &config);
        };

        run(&mut coarse, 1.0 / 30.0);
        run(&mut fine, 1.0 / 60.0);
        run(&mut fine, 1.0 / 60.0);

        assert!((coarse.velocity.x - fine.velocity.x).abs() < 1e-6);
        assert!((coarse.position.x - fine.position.x).abs() < 1e-6);
    }

    #[test]
    fn test_friction_only_when_not_controlled() {
        let stage = flat_stage();
        let mut f = airborne(200.0, 700.0);
        f.on_ground = true;
        f.state = FighterState::HitStun;
        f.hitstun_timer = 1.0;
        f.velocity.x = 10.0;

        physics_tick(&mut f, &stage, 1.0 / 60.0);
        assert!((f.velocity.x - 8.5).abs() < 1e-9);

        f.state = FighterState::Walking;
        f.hitstun_timer = 0.0;
        f.velocity.x = 3.0;
        physics_tick(&mut f, &stage, 1.0 / 60.0);
        assert_eq!(f.velocity.x, 3.0);
    }

    #[test]
    fn test_bottom_blast_zone_ko() {
        let stage = flat_stage();
        let mut f = airborne(-200.0, 1095.0);
        f.velocity.y = 10.0;

        let outcome = physics_tick(&mut f, &stage, 1.0 / 60.0);
        assert!(outcome.knocked_out);
        assert!(!f.in_play);
        assert_eq!(f.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_ko_preempts_landing() {
        let stage = Stage::builder(StageId::Custom, "Low", 1000.0, 800.0)
            .platform(0.0, 700.0, 1000.0, 5.0, PlatformKind::Solid)
            .blast_zone(-300.0, 1300.0, -300.0, 710.0)
            .spawn(200.0, 600.0)
            .spawn(800.0, 600.0)
            .build()
            .unwrap();
        // Crosses the platform top and the blast line in the same tick
        let mut f = airborne(200.0, 695.0);
        f.velocity.y = 20.0;

        let outcome = physics_tick(&mut f, &stage, 1.0 / 60.0);
        assert!(outcome.knocked_out);
        assert!(!outcome.contact.landed);
        assert!(!f.on_ground);
    }

    #[test]
    fn test_out_of_play_is_skipped() {
        let stage = flat_stage();
        let mut f = airborne(200.0, 100.0);
        f.in_play = false;
        physics_tick(&mut f, &stage, 1.0 / 60.0);
        assert_eq!(f.position, Vec2::new(200.0, 100.0));
    }

    #[test]
    fn test_plains_hook_replaces_defaults() {
        let stage = StageId::Plains.build().unwrap();
        let mut f = airborne(700.0, 100.0);
        physics_tick(&mut f, &stage, 1.0 / 60.0);
        assert!((f.velocity.y - 0.8 * 1.15).abs() < 1e-9);
    }
}
