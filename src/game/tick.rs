//! Authoritative Simulation Tick
//!
//! The match loop. Each tick runs in a fixed order:
//!
//! 1. inputs drive fighter state transitions
//! 2. physics: forces, integration, blast zone, platforms
//! 3. attached hitboxes re-center on their owners
//! 4. grabs, then hits, then orphaned holds are released
//! 5. bookkeeping: hitbox lifetimes, stage motion, hazards, respawns, clock
//! 6. end conditions
//!
//! Given the same state, inputs and `dt`, the result is bit-identical.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};
#[cfg(feature = "debug-tracing")]
use tracing::trace;

use crate::game::combat::{release_orphans, resolve_grabs, resolve_hits, GrabEvent, HitOutcome};
use crate::game::config::{KoDamagePolicy, MatchConfig};
use crate::game::events::{EndReason, EventPriority, GameEvent, GameEventData};
use crate::game::fighter::{FighterAction, FighterId};
use crate::game::input::{InputFrame, PlayerInput};
use crate::game::physics::step_fighter;
use crate::game::state::{MatchOutcome, MatchPhase, MatchState};
use crate::{FRAME_RATE, TIMER_EPSILON};

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// Whether the match has ended
    pub match_ended: bool,
    /// Winner (if the match ended with one)
    pub winner: Option<FighterId>,
}

/// Run one simulation tick of `dt` seconds.
///
/// Non-finite or non-positive `dt` is ignored; anything above
/// `config.max_delta_time` is clamped. Fighters without an entry in
/// `inputs` hold nothing this tick.
pub fn tick(
    state: &mut MatchState,
    inputs: &BTreeMap<FighterId, InputFrame>,
    dt: f64,
    config: &MatchConfig,
) -> TickResult {
    let mut result = TickResult::default();

    match state.phase {
        MatchPhase::Waiting => return result,
        MatchPhase::Ended => {
            result.match_ended = true;
            result.winner = state.winner();
            return result;
        }
        MatchPhase::Countdown { .. } | MatchPhase::Playing => {}
    }

    if !dt.is_finite() || dt <= 0.0 {
        return result;
    }
    let dt = dt.min(config.max_delta_time);

    if let MatchPhase::Countdown { ticks_remaining } = state.phase {
        if ticks_remaining == 0 {
            state.phase = MatchPhase::Playing;
            state.push_event(GameEvent::phase_changed(state.tick, state.phase));
            info!(stage = %state.stage.id, "match started");
        } else {
            state.phase = MatchPhase::Countdown {
                ticks_remaining: ticks_remaining - 1,
            };
        }
        result.events = state.take_events();
        return result;
    }

    state.tick += 1;

    #[cfg(feature = "debug-tracing")]
    trace!(tick = state.tick, dt, "tick");

    // 1. Fighter state machines
    apply_inputs(state, inputs, dt, config);

    // 2. Physics and platforms
    update_physics(state, dt, config);

    // 3. Attached hitboxes follow their owners
    for fighter in state.fighters.values_mut() {
        let feet = fighter.position;
        for hitbox in fighter.hitboxes.iter_mut() {
            hitbox.follow(feet);
        }
    }

    // 4. Grabs, hits, broken holds
    process_grabs(state, config);
    process_hits(state, config);
    let released = release_orphans(&mut state.fighters);
    push_grab_events(state, released);

    // 5. Bookkeeping
    advance_hitboxes(state, dt);
    advance_stage(state, dt, config);
    process_hazards(state, dt);
    process_respawns(state, dt, config);
    if let Some(remaining) = state.time_remaining.as_mut() {
        *remaining = (*remaining - dt).max(0.0);
    }

    // 6. End conditions
    check_end_conditions(state, &mut result);

    result.events = state.take_events();
    result
}

/// Feed each fighter its input and collect what it did.
fn apply_inputs(
    state: &mut MatchState,
    inputs: &BTreeMap<FighterId, InputFrame>,
    dt: f64,
    config: &MatchConfig,
) {
    let tick = state.tick;
    let mut events = Vec::new();

    // BTreeMap iterates in sorted key order
    for (id, fighter) in state.fighters.iter_mut() {
        let frame = inputs.get(id).copied().unwrap_or_default();
        let input = PlayerInput::new(frame, fighter.last_input);
        fighter.last_input = frame;

        for action in fighter.update(&input, dt, &config.fighter) {
            match action {
                FighterAction::AttackStarted(direction) => {
                    events.push(GameEvent::attack_started(tick, *id, direction));
                }
                FighterAction::BuffApplied(kind) => {
                    debug!(fighter = %id, ?kind, "buff applied");
                    events.push(GameEvent::buff_applied(tick, *id, kind));
                }
                FighterAction::ProjectileFired(hitbox) => {
                    events.push(GameEvent::projectile_launched(tick, *id, hitbox.region.center()));
                    state.projectiles.push(hitbox);
                }
                FighterAction::Jumped { .. } | FighterAction::GrabStarted => {}
            }
        }
    }

    state.pending_events.extend(events);
}

/// Step every fighter through physics and handle knockouts.
fn update_physics(state: &mut MatchState, dt: f64, config: &MatchConfig) {
    let mut knocked_out = Vec::new();

    for fighter in state.fighters.values_mut() {
        let outcome = step_fighter(fighter, &state.stage, dt, &config.physics, &config.fighter);
        if outcome.knocked_out {
            knocked_out.push(fighter.id);
        }
    }

    for id in knocked_out {
        handle_knockout(state, id, config);
    }
}

fn handle_knockout(state: &mut MatchState, id: FighterId, config: &MatchConfig) {
    let Some(fighter) = state.fighters.get(&id) else {
        return;
    };
    let (stocks, last_attacker, has_stocks) =
        (fighter.stocks, fighter.last_attacker, fighter.has_stocks());

    debug!(fighter = %id, ?stocks, ?last_attacker, "knockout");
    state.push_event(GameEvent::knockout(state.tick, id, stocks, last_attacker));

    if has_stocks {
        state.respawn_timers.insert(id, config.respawn_delay);
    }
}

fn process_grabs(state: &mut MatchState, config: &MatchConfig) {
    let grab_events = resolve_grabs(&mut state.fighters, &config.fighter, &config.combat);
    push_grab_events(state, grab_events);
}

fn push_grab_events(state: &mut MatchState, grab_events: Vec<GrabEvent>) {
    let tick = state.tick;
    for event in grab_events {
        let data = match event {
            GrabEvent::Seized { grabber, target } => {
                debug!(%grabber, %target, "grab");
                GameEventData::Grabbed { grabber, target }
            }
            GrabEvent::Thrown { grabber, target, outcome } => {
                debug!(%grabber, %target, damage = outcome.damage(), "throw");
                GameEventData::Thrown {
                    grabber,
                    target,
                    damage: outcome.damage(),
                }
            }
            GrabEvent::Released { target } => GameEventData::Released { target },
        };
        state.push_event(GameEvent::new(tick, EventPriority::Grab, data));
    }
}

fn process_hits(state: &mut MatchState, config: &MatchConfig) {
    let hits = resolve_hits(&mut state.fighters, &mut state.projectiles, &config.combat);
    let tick = state.tick;

    for hit in hits {
        let attacker = hit.contact.attacker;
        let defender = hit.contact.defender;
        let data = match hit.outcome {
            HitOutcome::Launched { damage, knockback, hitstun } => {
                let new_percent = state
                    .fighters
                    .get(&defender)
                    .map_or(0.0, |f| f.damage_percent);
                debug!(
                    %attacker, %defender, damage, kx = knockback.x, ky = knockback.y,
                    hitstun, projectile = hit.projectile, "hit"
                );
                GameEventData::Hit {
                    attacker,
                    defender,
                    damage,
                    knockback,
                    new_percent,
                }
            }
            HitOutcome::Armored { damage } => {
                debug!(%attacker, %defender, damage, "armored");
                GameEventData::Armored { attacker, defender, damage }
            }
            HitOutcome::Blocked { damage } => {
                debug!(%attacker, %defender, damage, "blocked");
                GameEventData::Blocked { attacker, defender, damage }
            }
        };
        state.push_event(GameEvent::new(tick, EventPriority::Hit, data));
    }
}

/// Age hitboxes and drop spent ones; projectiles travel and leave at the
/// blast zone.
fn advance_hitboxes(state: &mut MatchState, dt: f64) {
    let frames = dt * FRAME_RATE;

    for fighter in state.fighters.values_mut() {
        for hitbox in fighter.hitboxes.iter_mut() {
            hitbox.advance(frames);
        }
        fighter.hitboxes.retain(|h| !h.is_spent());
    }

    let blast_zone = state.stage.blast_zone;
    for projectile in state.projectiles.iter_mut() {
        projectile.advance(frames);
    }
    state
        .projectiles
        .retain(|p| !p.is_spent() && blast_zone.contains(p.region.center()));
}

/// Move platforms, carry fighters standing on them, drop fighters off
/// platforms that broke.
fn advance_stage(state: &mut MatchState, dt: f64, config: &MatchConfig) {
    let occupied: BTreeSet<usize> = state
        .fighters
        .values()
        .filter(|f| f.in_play && f.on_ground)
        .filter_map(|f| f.ground_platform)
        .collect();

    let changes = state.stage.advance(dt, &occupied);
    let tick = state.tick;

    for change in changes {
        for fighter in state.fighters.values_mut() {
            if !fighter.in_play || !fighter.on_ground || fighter.ground_platform != Some(change.index) {
                continue;
            }
            if change.broke {
                fighter.on_ground = false;
                fighter.ground_platform = None;
                fighter.on_left_ground(&config.fighter);
            } else {
                fighter.position += change.displacement;
                let feet = fighter.position;
                for hitbox in fighter.hitboxes.iter_mut() {
                    hitbox.follow(feet);
                }
            }
        }

        if change.broke {
            debug!(index = change.index, "platform broke");
            state.push_event(GameEvent::stage(tick, GameEventData::PlatformBroken { index: change.index }));
        }
        if change.restored {
            debug!(index = change.index, "platform restored");
            state.push_event(GameEvent::stage(tick, GameEventData::PlatformRestored { index: change.index }));
        }
    }
}

/// Hazards burn any vulnerable fighter whose hurtbox touches them.
fn process_hazards(state: &mut MatchState, dt: f64) {
    if state.stage.hazards.is_empty() {
        return;
    }
    let tick = state.tick;
    let mut events = Vec::new();

    for fighter in state.fighters.values_mut() {
        if !fighter.in_play || fighter.is_invincible() {
            continue;
        }
        let rate = state.stage.hazard_damage_rate(&fighter.hurtbox());
        if rate > 0.0 {
            let damage = rate * dt;
            fighter.damage_percent += damage;
            events.push(GameEvent::stage(
                tick,
                GameEventData::HazardDamage { fighter: fighter.id, damage },
            ));
        }
    }

    state.pending_events.extend(events);
}

/// Count down respawn timers and bring fighters back at their spawn slot.
fn process_respawns(state: &mut MatchState, dt: f64, config: &MatchConfig) {
    let mut ready = Vec::new();
    for (id, remaining) in state.respawn_timers.iter_mut() {
        *remaining -= dt;
        if *remaining <= TIMER_EPSILON {
            ready.push(*id);
        }
    }

    let reset_damage = config.ko_damage == KoDamagePolicy::Reset;
    for id in ready {
        state.respawn_timers.remove(&id);
        let Some(fighter) = state.fighters.get_mut(&id) else {
            continue;
        };
        let spawn = state.stage.spawn_point(fighter.spawn_slot);
        fighter.respawn(spawn, reset_damage, &config.fighter);
        debug!(fighter = %id, x = spawn.x, y = spawn.y, "respawned");
        state.push_event(GameEvent::respawned(state.tick, id, spawn));
    }
}

/// Check if match should end.
fn check_end_conditions(state: &mut MatchState, result: &mut TickResult) {
    let survivors: Vec<FighterId> = state
        .fighters
        .values()
        .filter(|f| f.has_stocks())
        .map(|f| f.id)
        .collect();

    if survivors.len() < state.fighters.len() {
        let winner = match survivors.as_slice() {
            [only] => Some(*only),
            _ => None,
        };
        end_match(state, result, winner, EndReason::StockOut);
        return;
    }

    if state.time_remaining.is_some_and(|t| t <= TIMER_EPSILON) {
        let winner = time_up_winner(state);
        end_match(state, result, winner, EndReason::TimeUp);
    }
}

/// Fewest falls wins, then lowest percent; anything else is a draw.
fn time_up_winner(state: &MatchState) -> Option<FighterId> {
    let mut ranked: Vec<_> = state.fighters.values().collect();
    ranked.sort_by(|a, b| {
        a.falls
            .cmp(&b.falls)
            .then(a.damage_percent.total_cmp(&b.damage_percent))
    });
    match ranked.as_slice() {
        [first, second, ..] => {
            let tied = first.falls == second.falls && first.damage_percent == second.damage_percent;
            (!tied).then_some(first.id)
        }
        [only] => Some(only.id),
        [] => None,
    }
}

/// End the match and record the outcome.
fn end_match(
    state: &mut MatchState,
    result: &mut TickResult,
    winner: Option<FighterId>,
    reason: EndReason,
) {
    state.phase = MatchPhase::Ended;
    state.outcome = Some(MatchOutcome {
        winner,
        reason,
        ticks: state.tick,
    });
    result.match_ended = true;
    result.winner = winner;

    match winner {
        Some(id) => info!(winner = %id, ?reason, ticks = state.tick, "match ended"),
        None => info!(?reason, ticks = state.tick, "match ended in a draw"),
    }
    state.push_event(GameEvent::match_ended(state.tick, winner, reason));
}

/// Replay a match from recorded inputs at a fixed `dt`.
///
/// The match is put straight into play; input lists are indexed by
/// replay step and run out to idle.
pub fn replay_match(
    initial_state: MatchState,
    fighter_inputs: &BTreeMap<FighterId, Vec<InputFrame>>,
    tick_count: u32,
    dt: f64,
    config: &MatchConfig,
) -> (MatchState, Vec<GameEvent>) {
    let mut state = initial_state;
    let mut all_events = Vec::new();

    // Start match
    state.phase = MatchPhase::Playing;

    for t in 0..tick_count {
        // Get inputs for this tick
        let tick_inputs: BTreeMap<FighterId, InputFrame> = fighter_inputs
            .iter()
            .map(|(id, frames)| (*id, frames.get(t as usize).copied().unwrap_or_default()))
            .collect();

        let result = tick(&mut state, &tick_inputs, dt, config);
        all_events.extend(result.events);

        if result.match_ended {
            break;
        }
    }

    (state, all_events)
}
