//! Fighter State Machine
//!
//! One `Fighter` per player. Each tick the match controller calls
//! [`Fighter::update`] with the paired input frames; the fighter ticks its
//! timers, resolves locked states, and when free to act turns input into
//! attacks, grabs, blocks, jumps and horizontal movement.
//!
//! Positions are the **feet** of the fighter (bottom-center of its body),
//! y grows downward, speeds are pixels per 60 Hz frame.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::rect::Aabb;
use crate::core::vec2::Vec2;
use crate::game::hitbox::Hitbox;
use crate::game::input::{AttackDirection, Button, InputFrame, PlayerInput};
use crate::game::moves::{AttackPhase, AttackSpec, BuffKind};
use crate::game::roster::{CharacterId, CharacterProfile, MovementTuning};
use crate::{FRAME_EPSILON, FRAME_RATE, TIMER_EPSILON};

/// Grounded target upgrades to run speed past this fraction of walk speed.
pub const RUN_UPGRADE_FRACTION: f64 = 0.8;

/// Airborne target is this fraction of walk speed.
pub const AIR_SPEED_FRACTION: f64 = 0.8;

/// Running state above this multiple of walk speed.
pub const RUN_STATE_FRACTION: f64 = 1.2;

/// Walking state above this speed.
pub const WALK_STATE_SPEED: f64 = 0.5;

/// Horizontal speeds at or below this snap to zero while decaying.
pub const STOP_SPEED: f64 = 0.1;

// =============================================================================
// IDS AND SMALL TYPES
// =============================================================================

/// Fighter identifier. Ord gives the deterministic processing order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FighterId(pub u8);

impl fmt::Display for FighterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0 as u32 + 1)
    }
}

/// Horizontal facing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Facing -X
    Left,
    /// Facing +X
    #[default]
    Right,
}

impl Facing {
    /// -1.0 for left, +1.0 for right.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    /// Facing implied by a horizontal axis value, if any.
    #[inline]
    pub fn from_axis(axis: f64) -> Option<Facing> {
        if axis > 0.0 {
            Some(Facing::Right)
        } else if axis < 0.0 {
            Some(Facing::Left)
        } else {
            None
        }
    }

    /// The other way.
    #[inline]
    pub fn opposite(self) -> Facing {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }
}

/// Exactly one of these is active per fighter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FighterState {
    /// Standing still
    #[default]
    Idle = 0,
    /// Grounded, moving slowly
    Walking = 1,
    /// Grounded, moving fast
    Running = 2,
    /// Airborne, rising from a jump
    Jumping = 3,
    /// Airborne, descending
    Falling = 4,
    /// Landing lag
    Landing = 5,
    /// Holding down on the ground
    Crouching = 6,
    /// Neutral attack in progress
    NeutralAttack = 7,
    /// Side attack in progress
    SideAttack = 8,
    /// Up attack in progress
    UpAttack = 9,
    /// Down attack in progress
    DownAttack = 10,
    /// Shielding
    Blocking = 11,
    /// Reeling from a hit
    HitStun = 12,
    /// Floored after a hard launch
    Knockdown = 13,
    /// Attempting or holding a grab
    Grabbing = 14,
    /// Held by an opponent
    Grabbed = 15,
}

impl FighterState {
    /// Attack state for a direction.
    pub fn attack(direction: AttackDirection) -> Self {
        match direction {
            AttackDirection::Neutral => FighterState::NeutralAttack,
            AttackDirection::Side => FighterState::SideAttack,
            AttackDirection::Up => FighterState::UpAttack,
            AttackDirection::Down => FighterState::DownAttack,
        }
    }

    /// One of the four attack states.
    #[inline]
    pub fn is_attacking(self) -> bool {
        matches!(
            self,
            FighterState::NeutralAttack
                | FighterState::SideAttack
                | FighterState::UpAttack
                | FighterState::DownAttack
        )
    }

    /// States whose horizontal speed the fighter steers directly.
    #[inline]
    pub fn is_movement(self) -> bool {
        matches!(
            self,
            FighterState::Idle
                | FighterState::Walking
                | FighterState::Running
                | FighterState::Jumping
                | FighterState::Falling
                | FighterState::Crouching
        )
    }

    /// States that only make sense with ground underfoot.
    #[inline]
    pub fn is_grounded_only(self) -> bool {
        matches!(
            self,
            FighterState::Idle
                | FighterState::Walking
                | FighterState::Running
                | FighterState::Landing
                | FighterState::Crouching
                | FighterState::Blocking
                | FighterState::Knockdown
        )
    }
}

/// Mutable per-activation copy of an attack's timeline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackProgress {
    /// Which move-set slot
    pub direction: AttackDirection,
    /// Frames since the attack started
    pub elapsed: f64,
    /// Active-window effect (hitbox, projectile or buff) already produced
    pub struck: bool,
}

/// Timed self-buff.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveBuff {
    /// Which buff
    pub kind: BuffKind,
    /// Seconds left
    pub remaining: f64,
}

/// Grab attempt or hold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GrabState {
    /// Frames in the current grab phase (attempt, then hold)
    pub elapsed: f64,
    /// Held opponent, once connected
    pub target: Option<FighterId>,
}

/// Something a fighter did this tick that the match controller must act on.
#[derive(Clone, Debug, PartialEq)]
pub enum FighterAction {
    /// Attack began
    AttackStarted(AttackDirection),
    /// Left the ground
    Jumped {
        /// Launched with short-hop strength
        short_hop: bool,
    },
    /// Buff took effect
    BuffApplied(BuffKind),
    /// Projectile detached; the controller owns it from now on
    ProjectileFired(Hitbox),
    /// Grab attempt began
    GrabStarted,
}

// =============================================================================
// CONFIG
// =============================================================================

/// State-machine timing shared by all fighters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FighterConfig {
    /// Landing lag in seconds
    pub landing_lag: f64,
    /// Grace window after leaving ground in which a jump is honored (seconds)
    pub coyote_time: f64,
    /// Jump presses stay buffered for this many frames
    pub input_buffer_frames: f64,
    /// Vertical velocity multiplier on jump release while rising
    pub jump_cut_factor: f64,
    /// Launch magnitude at which a grounded hitstun becomes a knockdown
    pub knockdown_threshold: f64,
    /// Knockdown duration in seconds
    pub knockdown_time: f64,
    /// Invincibility after respawn in seconds
    pub respawn_invincibility: f64,
    /// Grab box length in pixels
    pub grab_range: f64,
    /// Frames the grab box is live
    pub grab_active_frames: f64,
    /// Lockout frames after a missed grab
    pub grab_whiff_frames: f64,
    /// Frames an opponent is held before the throw
    pub grab_hold_frames: f64,
    /// Throw damage
    pub throw_damage: f64,
    /// Throw knockback
    pub throw_knockback: f64,
    /// Throw launch angle in degrees
    pub throw_angle_deg: f64,
}

impl Default for FighterConfig {
    fn default() -> Self {
        Self {
            landing_lag: 0.2,
            coyote_time: 0.1,
            input_buffer_frames: 6.0,
            jump_cut_factor: 0.5,
            knockdown_threshold: 10.0,
            knockdown_time: 0.5,
            respawn_invincibility: 1.5,
            grab_range: 40.0,
            grab_active_frames: 8.0,
            grab_whiff_frames: 16.0,
            grab_hold_frames: 30.0,
            throw_damage: 9.0,
            throw_knockback: 9.0,
            throw_angle_deg: -30.0,
        }
    }
}

// =============================================================================
// FIGHTER
// =============================================================================

/// A fighter in the match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fighter {
    /// Unique id
    pub id: FighterId,
    /// Character archetype
    pub character: CharacterId,
    /// Index into the stage's spawn points
    pub spawn_slot: usize,

    /// Feet position
    pub position: Vec2,
    /// Velocity in pixels per frame
    pub velocity: Vec2,
    /// Facing
    pub facing: Facing,

    /// Accumulated damage (>= 0, unbounded)
    pub damage_percent: f64,
    /// Knockback divisor and gravity multiplier (> 0)
    pub weight: f64,
    /// Movement constants
    pub tuning: MovementTuning,

    /// Current state
    pub state: FighterState,
    /// Seconds left in a timed state (Landing, Knockdown)
    pub state_timer: f64,
    /// Seconds of hitstun left
    pub hitstun_timer: f64,
    /// Seconds of invincibility left
    pub invincibility_timer: f64,
    /// Seconds of super armor left
    pub armor_timer: f64,
    /// Damage multiplier while armored
    pub armor_scale: f64,
    /// Seconds of coyote time left
    pub coyote_timer: f64,
    /// Seconds a jump press stays buffered
    pub jump_buffer: f64,

    /// Standing on a platform
    pub on_ground: bool,
    /// Index of the platform underfoot
    pub ground_platform: Option<usize>,
    /// Landed during the last collision pass
    pub just_landed: bool,

    /// Attack in progress
    pub attack: Option<AttackProgress>,
    /// Attached hitboxes (empty unless attacking)
    pub hitboxes: Vec<Hitbox>,
    /// Active buff
    pub buff: Option<ActiveBuff>,
    /// Grab in progress
    pub grab: Option<GrabState>,
    /// Grabber holding this fighter
    pub held_by: Option<FighterId>,

    /// Magnitude of the most recent launch
    pub last_launch: f64,
    /// Most recent fighter to land a hit
    pub last_attacker: Option<FighterId>,

    /// False while waiting to respawn
    pub in_play: bool,
    /// Lives left (None = unlimited)
    pub stocks: Option<u32>,
    /// Times knocked out
    pub falls: u32,

    /// Buttons held last tick
    pub last_input: InputFrame,
    /// Velocity at tick start, overwritten by instantaneous impulses
    pub integration_origin: Vec2,
}

impl Fighter {
    /// Create a fighter at a spawn point.
    pub fn new(id: FighterId, character: CharacterId, spawn_slot: usize, spawn: Vec2) -> Self {
        let profile = character.profile();
        Self {
            id,
            character,
            spawn_slot,
            position: spawn,
            velocity: Vec2::ZERO,
            facing: Facing::Right,
            damage_percent: 0.0,
            weight: profile.weight,
            tuning: profile.tuning,
            state: FighterState::Idle,
            state_timer: 0.0,
            hitstun_timer: 0.0,
            invincibility_timer: 0.0,
            armor_timer: 0.0,
            armor_scale: 1.0,
            coyote_timer: 0.0,
            jump_buffer: 0.0,
            on_ground: false,
            ground_platform: None,
            just_landed: false,
            attack: None,
            hitboxes: Vec::new(),
            buff: None,
            grab: None,
            held_by: None,
            last_launch: 0.0,
            last_attacker: None,
            in_play: true,
            stocks: None,
            falls: 0,
            last_input: InputFrame::new(),
            integration_origin: Vec2::ZERO,
        }
    }

    /// Static character profile.
    #[inline]
    pub fn profile(&self) -> &'static CharacterProfile {
        self.character.profile()
    }

    /// Vulnerable body box.
    pub fn hurtbox(&self) -> Aabb {
        Aabb::new(
            self.position.x - self.tuning.width / 2.0,
            self.position.y - self.tuning.height,
            self.tuning.width,
            self.tuning.height,
        )
    }

    /// Body center.
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.position.x, self.position.y - self.tuning.height / 2.0)
    }

    /// Hitboxes attached to this fighter.
    #[inline]
    pub fn hitboxes(&self) -> &[Hitbox] {
        &self.hitboxes
    }

    /// Cannot be hit right now.
    #[inline]
    pub fn is_invincible(&self) -> bool {
        self.invincibility_timer > TIMER_EPSILON
    }

    /// Super armor is up.
    #[inline]
    pub fn is_armored(&self) -> bool {
        self.armor_timer > TIMER_EPSILON
    }

    /// Still reeling.
    #[inline]
    pub fn in_hitstun(&self) -> bool {
        self.hitstun_timer > TIMER_EPSILON
    }

    /// Free to start an attack, jump, grab or block.
    pub fn can_act(&self) -> bool {
        self.in_play && !self.in_hitstun() && self.attack.is_none() && self.state.is_movement()
    }

    /// Steering its own horizontal speed (engine friction does not apply).
    #[inline]
    pub fn is_under_control(&self) -> bool {
        self.state.is_movement() && !self.in_hitstun()
    }

    /// Movement tuning with the active buff applied.
    pub fn effective_tuning(&self) -> MovementTuning {
        let mut tuning = self.tuning;
        if let Some(buff) = self.buff {
            let speed = buff.kind.speed_scale();
            tuning.walk_speed *= speed;
            tuning.run_speed *= speed;
            tuning.ground_acceleration *= buff.kind.acceleration_scale();
        }
        tuning
    }

    /// Multiplier on outgoing damage.
    pub fn outgoing_damage_scale(&self) -> f64 {
        self.buff.map_or(1.0, |buff| buff.kind.damage_scale())
    }

    fn set_state(&mut self, state: FighterState) {
        self.state = state;
    }

    fn rest_state(&self) -> FighterState {
        if self.on_ground {
            FighterState::Idle
        } else {
            FighterState::Falling
        }
    }

    // =========================================================================
    // PER-TICK UPDATE
    // =========================================================================

    /// Count every timer down by `dt` seconds.
    pub fn tick_timers(&mut self, dt: f64) {
        self.state_timer = (self.state_timer - dt).max(0.0);
        self.hitstun_timer = (self.hitstun_timer - dt).max(0.0);
        self.invincibility_timer = (self.invincibility_timer - dt).max(0.0);
        self.armor_timer = (self.armor_timer - dt).max(0.0);
        self.coyote_timer = (self.coyote_timer - dt).max(0.0);
        self.jump_buffer = (self.jump_buffer - dt).max(0.0);

        if let Some(buff) = self.buff.as_mut() {
            buff.remaining -= dt;
            if buff.remaining <= TIMER_EPSILON {
                self.buff = None;
            }
        }
    }

    /// Advance the state machine by one tick.
    ///
    /// Locked states (hitstun, landing lag, knockdown, attacks, grabs) ignore
    /// input. Only a jump press made while locked stays buffered for a few
    /// frames; an attack press while locked is dropped.
    pub fn update(
        &mut self,
        input: &PlayerInput,
        dt: f64,
        config: &FighterConfig,
    ) -> Vec<FighterAction> {
        let mut actions = Vec::new();
        self.integration_origin = self.velocity;
        if !self.in_play {
            return actions;
        }

        let frames = dt * FRAME_RATE;
        self.tick_timers(dt);

        let buffer_window = config.input_buffer_frames / FRAME_RATE;
        if input.just_pressed(Button::Up) {
            self.jump_buffer = buffer_window;
        }

        match self.state {
            FighterState::Grabbed => return actions,
            FighterState::HitStun => {
                if self.in_hitstun() {
                    return actions;
                }
                self.hitstun_timer = 0.0;
                self.set_state(self.rest_state());
            }
            FighterState::Landing | FighterState::Knockdown => {
                if self.state_timer > TIMER_EPSILON {
                    return actions;
                }
                self.set_state(self.rest_state());
            }
            FighterState::Grabbing => {
                self.advance_grab(frames, config);
                return actions;
            }
            state if state.is_attacking() => {
                self.advance_attack(frames, &mut actions);
                if self.attack.is_some() {
                    return actions;
                }
            }
            _ => {}
        }

        self.free_control(input, frames, config, &mut actions);
        actions
    }

    fn free_control(
        &mut self,
        input: &PlayerInput,
        frames: f64,
        config: &FighterConfig,
        actions: &mut Vec<FighterAction>,
    ) {
        if input.just_pressed(Button::Attack) && self.can_act() {
            if let Some(facing) = Facing::from_axis(input.horizontal_axis()) {
                self.facing = facing;
            }
            actions.push(self.start_attack(input.attack_direction()));
            // Zero-startup attacks strike on the press tick
            self.advance_attack(0.0, actions);
            return;
        }

        if self.on_ground {
            if input.held(Button::Grab) && input.held(Button::Down) {
                self.set_state(FighterState::Blocking);
                return;
            }
            if input.just_pressed(Button::Grab) {
                self.grab = Some(GrabState::default());
                self.set_state(FighterState::Grabbing);
                actions.push(FighterAction::GrabStarted);
                return;
            }
        }
        if self.state == FighterState::Blocking {
            self.set_state(self.rest_state());
        }

        if self.jump_buffer > TIMER_EPSILON && (self.on_ground || self.coyote_timer > TIMER_EPSILON) {
            let full = input.held(Button::Up);
            self.jump(full);
            actions.push(FighterAction::Jumped { short_hop: !full });
        } else if self.state == FighterState::Jumping
            && input.just_released(Button::Up)
            && self.velocity.y < 0.0
        {
            self.velocity.y *= config.jump_cut_factor;
            self.integration_origin.y = self.velocity.y;
        }

        let axis = input.horizontal_axis();
        if let Some(facing) = Facing::from_axis(axis) {
            self.facing = facing;
        }

        let crouching = self.on_ground && input.held(Button::Down);
        self.apply_movement(if crouching { 0.0 } else { axis }, frames);
        self.select_movement_state(crouching);
    }

    /// Launch into a jump.
    pub fn jump(&mut self, full: bool) {
        let tuning = self.effective_tuning();
        let strength = if full {
            tuning.jump_strength
        } else {
            tuning.short_hop_strength
        };
        self.velocity.y = -strength;
        self.integration_origin.y = self.velocity.y;
        self.on_ground = false;
        self.ground_platform = None;
        self.coyote_timer = 0.0;
        self.jump_buffer = 0.0;
        self.set_state(FighterState::Jumping);
    }

    /// Steer horizontal velocity toward the input target.
    pub fn apply_movement(&mut self, axis: f64, frames: f64) {
        let tuning = self.effective_tuning();
        let vx = self.velocity.x;

        self.velocity.x = if self.on_ground {
            if axis != 0.0 {
                let mut target = axis * tuning.walk_speed;
                if vx.abs() > tuning.walk_speed * RUN_UPGRADE_FRACTION && axis * vx > 0.0 {
                    target = axis * tuning.run_speed;
                }
                step_toward(vx, target, tuning.ground_acceleration, tuning.ground_deceleration, frames)
            } else {
                decay(vx, tuning.ground_deceleration, frames)
            }
        } else if axis != 0.0 {
            let target = axis * tuning.walk_speed * AIR_SPEED_FRACTION;
            step_toward(vx, target, tuning.air_acceleration, tuning.air_deceleration, frames)
        } else {
            decay(vx, tuning.air_deceleration, frames)
        };
    }

    fn select_movement_state(&mut self, crouching: bool) {
        if !self.on_ground {
            if self.state != FighterState::Jumping || self.velocity.y >= 0.0 {
                self.set_state(FighterState::Falling);
            }
            return;
        }
        if crouching {
            self.set_state(FighterState::Crouching);
            return;
        }

        let speed = self.velocity.x.abs();
        let walk = self.effective_tuning().walk_speed;
        let next = if speed > walk * RUN_STATE_FRACTION {
            FighterState::Running
        } else if speed > WALK_STATE_SPEED {
            FighterState::Walking
        } else if speed > 0.0 && matches!(self.state, FighterState::Walking | FighterState::Running) {
            FighterState::Walking
        } else {
            FighterState::Idle
        };
        self.set_state(next);
    }

    // =========================================================================
    // ATTACKS
    // =========================================================================

    /// Begin the attack bound to `direction`.
    pub fn start_attack(&mut self, direction: AttackDirection) -> FighterAction {
        let profile = self.profile();
        let spec = profile.attack(direction);

        self.attack = Some(AttackProgress {
            direction,
            elapsed: 0.0,
            struck: false,
        });
        self.set_state(FighterState::attack(direction));

        let stance_armor = self
            .buff
            .filter(|buff| buff.kind.armors_startup())
            .map(|_| 1.0);
        let armor = spec.armor_frames().or_else(|| {
            profile
                .armored_startup()
                .or(stance_armor)
                .map(|scale| (spec.startup, scale))
        });
        if let Some((frames, scale)) = armor {
            self.armor_timer = frames as f64 / FRAME_RATE;
            self.armor_scale = scale;
        }

        FighterAction::AttackStarted(direction)
    }

    /// Advance the current attack by `frames`.
    pub fn advance_attack(&mut self, frames: f64, actions: &mut Vec<FighterAction>) {
        let Some(mut progress) = self.attack else {
            return;
        };
        progress.elapsed += frames;

        let spec = *self.profile().attack(progress.direction);
        let phase = spec.phase_at(progress.elapsed);

        if !progress.struck && matches!(phase, AttackPhase::Active | AttackPhase::Recovery) {
            progress.struck = true;
            self.strike(&spec, actions);
        }

        if phase == AttackPhase::Finished {
            self.finish_attack();
        } else {
            self.attack = Some(progress);
        }
    }

    fn strike(&mut self, spec: &AttackSpec, actions: &mut Vec<FighterAction>) {
        if let Some(lunge) = spec.flags.lunge {
            self.velocity.x += lunge * self.facing.sign();
            self.integration_origin.x = self.velocity.x;
        }

        if let Some(buff) = spec.flags.buff {
            self.buff = Some(ActiveBuff {
                kind: buff.kind,
                remaining: buff.duration,
            });
            actions.push(FighterAction::BuffApplied(buff.kind));
        }
        if !spec.spawns_hitbox() {
            return;
        }

        let hitbox = Hitbox::from_attack(
            self.id,
            spec,
            self.position,
            self.facing,
            self.outgoing_damage_scale(),
        );
        if hitbox.is_projectile() {
            actions.push(FighterAction::ProjectileFired(hitbox));
        } else {
            self.hitboxes.push(hitbox);
        }
    }

    /// End the attack normally.
    pub fn finish_attack(&mut self) {
        self.attack = None;
        self.hitboxes.clear();
        self.armor_timer = 0.0;
        self.set_state(self.rest_state());
    }

    /// Drop any attack or grab in progress (interrupted by a hit or KO).
    pub fn cancel_actions(&mut self) {
        self.attack = None;
        self.hitboxes.clear();
        self.armor_timer = 0.0;
        self.grab = None;
    }

    // =========================================================================
    // GRABS
    // =========================================================================

    fn advance_grab(&mut self, frames: f64, config: &FighterConfig) {
        let Some(grab) = self.grab.as_mut() else {
            self.set_state(self.rest_state());
            return;
        };
        grab.elapsed += frames;
        let whiff_end = config.grab_active_frames + config.grab_whiff_frames;
        if grab.target.is_none() && grab.elapsed + FRAME_EPSILON >= whiff_end {
            self.grab = None;
            self.set_state(self.rest_state());
        }
    }

    /// Grab box is live (attempt phase, nothing held yet).
    pub fn grab_is_live(&self, config: &FighterConfig) -> bool {
        self.state == FighterState::Grabbing
            && self
                .grab
                .is_some_and(|g| g.target.is_none() && g.elapsed < config.grab_active_frames + FRAME_EPSILON)
    }

    /// Region in front of the fighter that a grab can reach.
    pub fn grab_box(&self, config: &FighterConfig) -> Aabb {
        let reach = config.grab_range * self.profile().grab_range_scale();
        let center = Vec2::new(
            self.position.x + self.facing.sign() * (self.tuning.width / 2.0 + reach / 2.0),
            self.position.y - self.tuning.height / 2.0,
        );
        Aabb::from_center(center, reach, self.tuning.height * 0.6)
    }

    /// Become held by `grabber`.
    pub fn seize(&mut self, grabber: FighterId) {
        self.cancel_actions();
        self.held_by = Some(grabber);
        self.velocity = Vec2::ZERO;
        self.hitstun_timer = 0.0;
        self.set_state(FighterState::Grabbed);
    }

    /// Let go of a held fighter's state (grabber gone or interrupted).
    pub fn release(&mut self) {
        self.held_by = None;
        if self.state == FighterState::Grabbed {
            self.set_state(self.rest_state());
        }
    }

    // =========================================================================
    // GROUND CONTACT
    // =========================================================================

    /// Called by the collision pass on the tick ground contact begins.
    pub fn on_landed(&mut self, config: &FighterConfig) {
        self.coyote_timer = 0.0;
        match self.state {
            FighterState::Jumping | FighterState::Falling => {
                self.set_state(FighterState::Landing);
                self.state_timer = config.landing_lag;
            }
            FighterState::HitStun if self.last_launch >= config.knockdown_threshold => {
                self.hitstun_timer = 0.0;
                self.set_state(FighterState::Knockdown);
                self.state_timer = config.knockdown_time;
            }
            _ => {}
        }
    }

    /// Called by the collision pass on the tick ground contact ends.
    pub fn on_left_ground(&mut self, config: &FighterConfig) {
        if self.velocity.y >= 0.0 {
            self.coyote_timer = config.coyote_time;
        }
        if self.state.is_grounded_only() {
            self.state_timer = 0.0;
            self.set_state(FighterState::Falling);
        }
    }

    /// Jumping turns into Falling once the apex is passed.
    pub fn settle_air_state(&mut self) {
        if self.state == FighterState::Jumping && self.velocity.y >= 0.0 {
            self.set_state(FighterState::Falling);
        }
    }

    // =========================================================================
    // KO / RESPAWN
    // =========================================================================

    /// Remove from play after crossing the blast zone.
    pub fn knock_out(&mut self) {
        self.cancel_actions();
        self.in_play = false;
        self.velocity = Vec2::ZERO;
        self.integration_origin = Vec2::ZERO;
        self.held_by = None;
        self.on_ground = false;
        self.ground_platform = None;
        self.just_landed = false;
        self.hitstun_timer = 0.0;
        self.falls += 1;
        if let Some(stocks) = self.stocks.as_mut() {
            *stocks = stocks.saturating_sub(1);
        }
    }

    /// Has lives left (or lives are unlimited).
    pub fn has_stocks(&self) -> bool {
        self.stocks.map_or(true, |s| s > 0)
    }

    /// Return to play at `spawn`, airborne with zero velocity.
    pub fn respawn(&mut self, spawn: Vec2, reset_damage: bool, config: &FighterConfig) {
        self.cancel_actions();
        self.in_play = true;
        self.position = spawn;
        self.velocity = Vec2::ZERO;
        self.integration_origin = Vec2::ZERO;
        self.state = FighterState::Falling;
        self.state_timer = 0.0;
        self.hitstun_timer = 0.0;
        self.armor_timer = 0.0;
        self.coyote_timer = 0.0;
        self.jump_buffer = 0.0;
        self.invincibility_timer = config.respawn_invincibility;
        self.on_ground = false;
        self.ground_platform = None;
        self.just_landed = false;
        self.buff = None;
        self.held_by = None;
        self.last_launch = 0.0;
        self.last_attacker = None;
        if reset_damage {
            self.damage_percent = 0.0;
        }
    }

    /// Hash this fighter's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.id.0);
        hasher.update_u8(self.character as u8);
        hasher.update_vec2(self.position);
        hasher.update_vec2(self.velocity);
        hasher.update_bool(self.facing == Facing::Right);
        hasher.update_f64(self.damage_percent);
        hasher.update_u8(self.state as u8);
        hasher.update_f64(self.state_timer);
        hasher.update_f64(self.hitstun_timer);
        hasher.update_f64(self.invincibility_timer);
        hasher.update_f64(self.armor_timer);
        hasher.update_f64(self.armor_scale);
        hasher.update_f64(self.coyote_timer);
        hasher.update_f64(self.jump_buffer);
        hasher.update_u8(self.last_input.buttons);
        hasher.update_vec2(self.integration_origin);
        hasher.update_bool(self.on_ground);
        hasher.update_bool(self.in_play);
        hasher.update_u32(self.falls);
        hasher.update_u32(self.stocks.unwrap_or(u32::MAX));
        hasher.update_opt_f64(self.attack.map(|a| a.elapsed));
        hasher.update_u8(self.attack.map_or(u8::MAX, |a| a.direction as u8));
        hasher.update_bool(self.attack.is_some_and(|a| a.struck));
        hasher.update_u32(self.hitboxes.len() as u32);
        for hitbox in &self.hitboxes {
            hitbox.hash_into(hasher);
        }
        hasher.update_opt_f64(self.buff.map(|b| b.remaining));
        hasher.update_opt_f64(self.grab.map(|g| g.elapsed));
        hasher.update_u8(self.grab.and_then(|g| g.target).map_or(u8::MAX, |t| t.0));
        hasher.update_u8(self.held_by.map_or(u8::MAX, |t| t.0));
    }
}

/// Move `v` toward `target` by at most `rate * frames`.
///
/// Speeding up toward the target uses `accel`; slowing down or reversing
/// uses `decel`.
pub fn step_toward(v: f64, target: f64, accel: f64, decel: f64, frames: f64) -> f64 {
    let delta = target - v;
    if delta == 0.0 {
        return v;
    }
    let speeding_up = target * v >= 0.0 && target.abs() > v.abs();
    let rate = if speeding_up { accel } else { decel };
    v + delta.signum() * delta.abs().min(rate * frames)
}

/// Geometric decay of `v` by `rate` per frame, snapping small speeds to zero.
pub fn decay(v: f64, rate: f64, frames: f64) -> f64 {
    if v.abs() <= STOP_SPEED {
        return 0.0;
    }
    let next = v * (1.0 - rate).max(0.0).powf(frames);
    if next.abs() <= STOP_SPEED {
        0.0
    } else {
        next
    }
}

// =============================================================================
// TESTS
// =============================================================================
