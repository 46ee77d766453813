//! Damage & Knockback Model
//!
//! Percentage-based damage: every hit adds percent, and the percent the
//! defender had *before* the hit scales how far it flies. Knockback is
//! divided by weight, so heavier fighters travel less.
//!
//! Also resolves the per-tick hit and grab passes in fighter-id order.
//! Processing attackers in id order means the lower id wins a trade: once a
//! fighter is launched its own hitboxes are gone before its turn comes.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::collision::{check_grab, check_hit, HitContact};
use crate::game::fighter::{Facing, Fighter, FighterConfig, FighterId, FighterState};
use crate::game::hitbox::Hitbox;
use crate::{FRAME_EPSILON, FRAME_RATE};

/// Knockback multiplier gained per point of pre-hit percent.
pub const KNOCKBACK_PERCENT_SCALE: f64 = 0.01;

/// Hitstun seconds per point of (damage + scaled percent).
pub const HITSTUN_SCALE: f64 = 0.01;

/// Weight of post-hit percent in the hitstun formula.
pub const HITSTUN_PERCENT_SCALE: f64 = 0.02;

/// Combat tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Invincibility granted after a launching hit (seconds)
    pub post_hit_invincibility: f64,
    /// Fraction of damage that gets through a block
    pub block_chip: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            post_hit_invincibility: 0.3,
            block_chip: 0.25,
        }
    }
}

/// How a hit landed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum HitOutcome {
    /// Damage, knockback and hitstun
    Launched {
        /// Percent dealt
        damage: f64,
        /// Velocity added
        knockback: Vec2,
        /// Hitstun seconds
        hitstun: f64,
    },
    /// Absorbed by super armor
    Armored {
        /// Percent dealt
        damage: f64,
    },
    /// Shielded
    Blocked {
        /// Chip percent dealt
        damage: f64,
    },
}

impl HitOutcome {
    /// Percent actually dealt.
    pub fn damage(&self) -> f64 {
        match *self {
            HitOutcome::Launched { damage, .. }
            | HitOutcome::Armored { damage }
            | HitOutcome::Blocked { damage } => damage,
        }
    }
}

// =============================================================================
// FORMULAS
// =============================================================================

/// Knockback multiplier for a defender at `percent` before the hit.
#[inline]
pub fn knockback_multiplier(percent: f64) -> f64 {
    1.0 + percent * KNOCKBACK_PERCENT_SCALE
}

/// Horizontal launch direction: away from the source, or along the
/// attacker's facing when both share an x.
#[inline]
pub fn launch_direction(defender_x: f64, source_x: f64, facing: Facing) -> f64 {
    if defender_x > source_x {
        1.0
    } else if defender_x < source_x {
        -1.0
    } else {
        facing.sign()
    }
}

/// Launch velocity. Negative angles launch upward (y grows downward).
pub fn knockback_vector(knockback: f64, angle_deg: f64, multiplier: f64, weight: f64, direction: f64) -> Vec2 {
    let theta = angle_deg.to_radians();
    let magnitude = knockback * multiplier / weight;
    Vec2::new(direction * magnitude * theta.cos().abs(), magnitude * theta.sin())
}

/// Hitstun seconds for a hit of `damage` leaving the defender at `percent`.
#[inline]
pub fn hitstun_seconds(damage: f64, percent_after: f64) -> f64 {
    (damage + percent_after * HITSTUN_PERCENT_SCALE) * HITSTUN_SCALE
}

/// Apply one hit to `defender`.
///
/// Armor and blocks only add (scaled) percent. Any other hit cancels what
/// the defender was doing, adds knockback to its velocity and puts it in
/// hitstun behind a short invincibility window.
pub fn apply_hit(defender: &mut Fighter, hit: &HitContact, config: &CombatConfig) -> HitOutcome {
    let damage = hit.damage.max(0.0);
    defender.last_attacker = Some(hit.attacker);

    if defender.is_armored() {
        let damage = damage * defender.armor_scale;
        defender.damage_percent += damage;
        return HitOutcome::Armored { damage };
    }

    if defender.state == FighterState::Blocking {
        let damage = damage * config.block_chip;
        defender.damage_percent += damage;
        return HitOutcome::Blocked { damage };
    }

    let multiplier = knockback_multiplier(defender.damage_percent);
    defender.damage_percent += damage;

    let direction = launch_direction(defender.position.x, hit.source_x, hit.facing);
    let knockback = knockback_vector(hit.knockback, hit.angle_deg, multiplier, defender.weight, direction);
    let hitstun = hitstun_seconds(damage, defender.damage_percent);

    defender.cancel_actions();
    defender.held_by = None;
    defender.velocity += knockback;
    defender.state = FighterState::HitStun;
    defender.state_timer = 0.0;
    defender.hitstun_timer = hitstun;
    defender.last_launch = knockback.length();

    let cap = hit.invincibility_cap.map_or(f64::INFINITY, |frames| frames / FRAME_RATE);
    defender.invincibility_timer = config.post_hit_invincibility.min(cap);

    if knockback.y < 0.0 {
        defender.on_ground = false;
        defender.ground_platform = None;
    }

    HitOutcome::Launched { damage, knockback, hitstun }
}

// =============================================================================
// HIT PASS
// =============================================================================

/// A resolved hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedHit {
    /// Contact details
    pub contact: HitContact,
    /// What happened
    pub outcome: HitOutcome,
    /// Came from a projectile
    pub projectile: bool,
}

/// Test every live hitbox against every other fighter, then every projectile.
pub fn resolve_hits(
    fighters: &mut BTreeMap<FighterId, Fighter>,
    projectiles: &mut [Hitbox],
    config: &CombatConfig,
) -> Vec<ResolvedHit> {
    let ids: Vec<FighterId> = fighters.keys().copied().collect();
    let mut resolved = Vec::new();

    for attacker_id in &ids {
        let (mut hitboxes, source_x) = match fighters.get_mut(attacker_id) {
            Some(f) if f.in_play && !f.hitboxes.is_empty() => (std::mem::take(&mut f.hitboxes), f.position.x),
            _ => continue,
        };

        for hitbox in hitboxes.iter_mut() {
            for defender_id in ids.iter().filter(|id| *id != attacker_id) {
                let Some(defender) = fighters.get_mut(defender_id) else {
                    continue;
                };
                if let Some(contact) = check_hit(hitbox, defender, source_x) {
                    hitbox.record_hit(*defender_id);
                    let outcome = apply_hit(defender, &contact, config);
                    resolved.push(ResolvedHit { contact, outcome, projectile: false });
                }
            }
        }

        if let Some(attacker) = fighters.get_mut(attacker_id) {
            if attacker.attack.is_some() {
                attacker.hitboxes = hitboxes;
            }
        }
    }

    for projectile in projectiles.iter_mut() {
        let source_x = projectile.region.center().x;
        for defender_id in &ids {
            let Some(defender) = fighters.get_mut(defender_id) else {
                continue;
            };
            if let Some(contact) = check_hit(projectile, defender, source_x) {
                projectile.record_hit(*defender_id);
                let outcome = apply_hit(defender, &contact, config);
                resolved.push(ResolvedHit { contact, outcome, projectile: true });
            }
        }
    }

    resolved
}

// =============================================================================
// GRAB PASS
// =============================================================================

/// Something that happened during the grab pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GrabEvent {
    /// Grab connected
    Seized {
        /// Grabbing fighter
        grabber: FighterId,
        /// Held fighter
        target: FighterId,
    },
    /// Hold ended in a throw
    Thrown {
        /// Throwing fighter
        grabber: FighterId,
        /// Thrown fighter
        target: FighterId,
        /// Throw result
        outcome: HitOutcome,
    },
    /// Hold broke without a throw
    Released {
        /// Fighter let go
        target: FighterId,
    },
}

/// Break holds whose grabber is gone, knocked out of the grab, or holding
/// someone else. Also clears grabbers whose target slipped away.
pub fn release_orphans(fighters: &mut BTreeMap<FighterId, Fighter>) -> Vec<GrabEvent> {
    let holds: BTreeMap<FighterId, FighterId> = fighters
        .values()
        .filter(|f| f.in_play && f.state == FighterState::Grabbing)
        .filter_map(|f| f.grab.and_then(|g| g.target).map(|t| (f.id, t)))
        .collect();

    let mut events = Vec::new();
    for fighter in fighters.values_mut() {
        if let Some(grabber) = fighter.held_by {
            if holds.get(&grabber) != Some(&fighter.id) {
                fighter.release();
                events.push(GrabEvent::Released { target: fighter.id });
            }
        }
    }

    let held: BTreeMap<FighterId, FighterId> = fighters
        .values()
        .filter_map(|f| f.held_by.map(|g| (g, f.id)))
        .collect();
    for (grabber_id, target_id) in holds {
        if held.get(&grabber_id) != Some(&target_id) {
            if let Some(grabber) = fighters.get_mut(&grabber_id) {
                grabber.grab = None;
                grabber.state = if grabber.on_ground {
                    FighterState::Idle
                } else {
                    FighterState::Falling
                };
            }
        }
    }
    events
}

/// Where a held fighter's feet go: beside the grabber, on its facing side.
fn hold_position(grabber: &Fighter, target: &Fighter) -> Vec2 {
    let gap = grabber.tuning.width / 2.0 + target.tuning.width / 2.0;
    Vec2::new(grabber.position.x + grabber.facing.sign() * gap, grabber.position.y)
}

/// Connect live grab boxes, keep held fighters in place and throw once the
/// hold runs out.
pub fn resolve_grabs(
    fighters: &mut BTreeMap<FighterId, Fighter>,
    fighter_config: &FighterConfig,
    combat_config: &CombatConfig,
) -> Vec<GrabEvent> {
    let mut events = release_orphans(fighters);
    let ids: Vec<FighterId> = fighters.keys().copied().collect();

    for grabber_id in &ids {
        let Some(grabber) = fighters.get(grabber_id).cloned() else {
            continue;
        };
        if !grabber.in_play || grabber.state != FighterState::Grabbing {
            continue;
        }
        let Some(grab) = grabber.grab else {
            continue;
        };

        match grab.target {
            Some(target_id) => {
                let Some(target) = fighters.get_mut(&target_id) else {
                    continue;
                };
                if grab.elapsed + FRAME_EPSILON >= fighter_config.grab_hold_frames {
                    target.release();
                    let throw = HitContact {
                        attacker: grabber.id,
                        defender: target_id,
                        damage: fighter_config.throw_damage,
                        knockback: fighter_config.throw_knockback,
                        angle_deg: fighter_config.throw_angle_deg,
                        source_x: grabber.position.x,
                        facing: grabber.facing,
                        invincibility_cap: None,
                    };
                    let outcome = apply_hit(target, &throw, combat_config);
                    if let Some(g) = fighters.get_mut(grabber_id) {
                        g.grab = None;
                        g.state = if g.on_ground { FighterState::Idle } else { FighterState::Falling };
                    }
                    events.push(GrabEvent::Thrown { grabber: *grabber_id, target: target_id, outcome });
                } else {
                    target.position = hold_position(&grabber, target);
                    target.velocity = Vec2::ZERO;
                }
            }
            None => {
                let target_id = ids.iter().copied().find(|id| {
                    fighters
                        .get(id)
                        .is_some_and(|t| check_grab(&grabber, t, fighter_config))
                });
                let Some(target_id) = target_id else {
                    continue;
                };
                if let Some(target) = fighters.get_mut(&target_id) {
                    target.seize(grabber.id);
                    target.position = hold_position(&grabber, target);
                    target.on_ground = grabber.on_ground;
                }
                if let Some(g) = fighters.get_mut(grabber_id) {
                    g.grab = g.grab.map(|mut state| {
                        state.target = Some(target_id);
                        state.elapsed = 0.0;
                        state
                    });
                }
                events.push(GrabEvent::Seized { grabber: *grabber_id, target: target_id });
            }
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::fighter::GrabState;
    use crate::game::input::AttackDirection;
    use crate::game::moves::{AttackSpec, HitboxShape};
    use crate::game::roster::CharacterId;
    use proptest::prelude::*;

    fn fighter(id: u8, x: f64) -> Fighter {
        let mut f = Fighter::new(FighterId(id), CharacterId::Brawler, id as usize, Vec2::new(x, 700.0));
        f.on_ground = true;
        f
    }

    fn contact(damage: f64, knockback: f64, angle_deg: f64, source_x: f64) -> HitContact {
        HitContact {
            attacker: FighterId(0),
            defender: FighterId(1),
            damage,
            knockback,
            angle_deg,
            source_x,
            facing: Facing::Right,
            invincibility_cap: None,
        }
    }

    fn pair() -> BTreeMap<FighterId, Fighter> {
        let mut fighters = BTreeMap::new();
        fighters.insert(FighterId(0), fighter(0, 100.0));
        fighters.insert(FighterId(1), fighter(1, 150.0));
        fighters
    }

    #[test]
    fn test_horizontal_launch_scenario() {
        let mut defender = fighter(1, 100.0);
        let outcome = apply_hit(&mut defender, &contact(10.0, 8.0, 0.0, 50.0), &CombatConfig::default());

        assert!((defender.velocity.x - 8.0).abs() < 1e-9);
        assert!(defender.velocity.y.abs() < 1e-9);
        assert_eq!(defender.damage_percent, 10.0);
        assert_eq!(defender.state, FighterState::HitStun);
        assert!((defender.hitstun_timer - (10.0 + 10.0 * 0.02) * 0.01).abs() < 1e-12);
        assert!(defender.is_invincible());
        assert!(matches!(outcome, HitOutcome::Launched { .. }));
    }

    #[test]
    fn test_unit_multiplier_at_zero_percent() {
        assert_eq!(knockback_multiplier(0.0), 1.0);
        assert_eq!(knockback_multiplier(50.0), 1.5);
    }

    #[test]
    fn test_pre_hit_percent_scales_knockback() {
        let mut defender = fighter(1, 100.0);
        defender.damage_percent = 100.0;
        apply_hit(&mut defender, &contact(10.0, 8.0, 0.0, 50.0), &CombatConfig::default());
        assert!((defender.velocity.x - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_direction_tie_uses_facing() {
        assert_eq!(launch_direction(10.0, 10.0, Facing::Left), -1.0);
        assert_eq!(launch_direction(10.0, 10.0, Facing::Right), 1.0);
        assert_eq!(launch_direction(5.0, 10.0, Facing::Right), -1.0);
    }

    #[test]
    fn test_upward_angle_leaves_ground() {
        let mut defender = fighter(1, 100.0);
        apply_hit(&mut defender, &contact(10.0, 12.0, -75.0, 50.0), &CombatConfig::default());
        assert!(defender.velocity.y < 0.0);
        assert!(!defender.on_ground);
    }

    #[test]
    fn test_armor_absorbs() {
        let mut defender = fighter(1, 100.0);
        defender.state = FighterState::SideAttack;
        defender.armor_timer = 0.5;
        defender.armor_scale = 0.5;

        let outcome = apply_hit(&mut defender, &contact(10.0, 8.0, 0.0, 50.0), &CombatConfig::default());
        assert_eq!(outcome, HitOutcome::Armored { damage: 5.0 });
        assert_eq!(defender.damage_percent, 5.0);
        assert_eq!(defender.velocity, Vec2::ZERO);
        assert_eq!(defender.hitstun_timer, 0.0);
        assert_eq!(defender.state, FighterState::SideAttack);
    }

    #[test]
    fn test_block_chips() {
        let mut defender = fighter(1, 100.0);
        defender.state = FighterState::Blocking;

        let outcome = apply_hit(&mut defender, &contact(12.0, 8.0, 0.0, 50.0), &CombatConfig::default());
        assert_eq!(outcome, HitOutcome::Blocked { damage: 3.0 });
        assert_eq!(defender.velocity, Vec2::ZERO);
        assert_eq!(defender.state, FighterState::Blocking);
    }

    #[test]
    fn test_single_hit_lands_once() {
        let mut fighters = pair();
        let spec = *CharacterId::Brawler.profile().attack(AttackDirection::Neutral);
        {
            let attacker = fighters.get_mut(&FighterId(0)).unwrap();
            attacker.start_attack(AttackDirection::Neutral);
            let hb = Hitbox::from_attack(FighterId(0), &spec, attacker.position, Facing::Right, 1.0);
            attacker.hitboxes.push(hb);
        }
        let config = CombatConfig::default();

        let first = resolve_hits(&mut fighters, &mut [], &config);
        assert_eq!(first.len(), 1);

        // Even with invincibility gone the spent hitbox cannot connect again
        for _ in 0..4 {
            let defender = fighters.get_mut(&FighterId(1)).unwrap();
            defender.invincibility_timer = 0.0;
            defender.position.x = 150.0;
            let attacker = fighters.get_mut(&FighterId(0)).unwrap();
            for hb in attacker.hitboxes.iter_mut() {
                hb.advance(1.0);
            }
            assert!(resolve_hits(&mut fighters, &mut [], &config).is_empty());
        }
    }

    #[test]
    fn test_multi_hit_count() {
        // Tornado-style box: 12 active frames, re-arms every 4
        let spec = AttackSpec::new(
            "Spin", AttackDirection::Up, 0, 12, 0, 4.0, 1.0, 0.0,
            HitboxShape::new(200.0, 200.0, 0.0, -40.0),
        )
        .with_multi_hit(4);
        let mut fighters = pair();
        {
            let attacker = fighters.get_mut(&FighterId(0)).unwrap();
            attacker.start_attack(AttackDirection::Up);
            let hb = Hitbox::from_attack(FighterId(0), &spec, attacker.position, Facing::Right, 1.0);
            attacker.hitboxes.push(hb);
        }
        let config = CombatConfig::default();
        let dt = 1.0 / 60.0;

        let mut hits = 0;
        loop {
            hits += resolve_hits(&mut fighters, &mut [], &config).len();

            let defender = fighters.get_mut(&FighterId(1)).unwrap();
            defender.position = Vec2::new(150.0, 700.0);
            defender.velocity = Vec2::ZERO;
            defender.tick_timers(dt);

            let attacker = fighters.get_mut(&FighterId(0)).unwrap();
            attacker.hitboxes.iter_mut().for_each(|hb| hb.advance(1.0));
            attacker.hitboxes.retain(|hb| !hb.is_spent());
            if attacker.hitboxes.is_empty() {
                break;
            }
        }
        assert_eq!(hits, 12 / 4 + 1);
    }

    #[test]
    fn test_lower_id_wins_trade() {
        let mut fighters = pair();
        let spec = *CharacterId::Brawler.profile().attack(AttackDirection::Neutral);
        for (id, facing) in [(0u8, Facing::Right), (1u8, Facing::Left)] {
            let f = fighters.get_mut(&FighterId(id)).unwrap();
            f.facing = facing;
            f.start_attack(AttackDirection::Neutral);
            let hb = Hitbox::from_attack(f.id, &spec, f.position, facing, 1.0);
            f.hitboxes.push(hb);
        }

        let hits = resolve_hits(&mut fighters, &mut [], &CombatConfig::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].contact.attacker, FighterId(0));
        assert_eq!(fighters[&FighterId(0)].damage_percent, 0.0);
    }

    #[test]
    fn test_projectile_spent_on_hit() {
        let mut fighters = pair();
        let spec = *CharacterId::Warrior.profile().attack(AttackDirection::Neutral);
        let mut projectiles = vec![Hitbox::from_attack(
            FighterId(0),
            &spec,
            Vec2::new(110.0, 700.0),
            Facing::Right,
            1.0,
        )];

        let hits = resolve_hits(&mut fighters, &mut projectiles, &CombatConfig::default());
        assert_eq!(hits.len(), 1);
        assert!(hits[0].projectile);
        assert!(projectiles[0].is_spent());
    }

    #[test]
    fn test_grab_hold_and_throw() {
        let fighter_config = FighterConfig::default();
        let combat_config = CombatConfig::default();
        let mut fighters = pair();
        {
            let g = fighters.get_mut(&FighterId(0)).unwrap();
            g.state = FighterState::Grabbing;
            g.grab = Some(GrabState::default());
        }

        let events = resolve_grabs(&mut fighters, &fighter_config, &combat_config);
        assert_eq!(events, vec![GrabEvent::Seized { grabber: FighterId(0), target: FighterId(1) }]);
        assert_eq!(fighters[&FighterId(1)].state, FighterState::Grabbed);
        assert_eq!(fighters[&FighterId(1)].position.x, 160.0);

        fighters.get_mut(&FighterId(0)).unwrap().grab.as_mut().unwrap().elapsed = fighter_config.grab_hold_frames;
        let events = resolve_grabs(&mut fighters, &fighter_config, &combat_config);
        assert!(matches!(events.as_slice(), [GrabEvent::Thrown { .. }]));

        let target = &fighters[&FighterId(1)];
        assert_eq!(target.state, FighterState::HitStun);
        assert_eq!(target.damage_percent, fighter_config.throw_damage);
        assert!(target.held_by.is_none());
        assert_eq!(fighters[&FighterId(0)].state, FighterState::Idle);
    }

    #[test]
    fn test_hit_grabber_releases_target() {
        let fighter_config = FighterConfig::default();
        let combat_config = CombatConfig::default();
        let mut fighters = pair();
        {
            let g = fighters.get_mut(&FighterId(0)).unwrap();
            g.state = FighterState::Grabbing;
            g.grab = Some(GrabState::default());
        }
        resolve_grabs(&mut fighters, &fighter_config, &combat_config);

        let grabber = fighters.get_mut(&FighterId(0)).unwrap();
        let hit = HitContact { defender: FighterId(0), ..contact(5.0, 5.0, 0.0, 300.0) };
        apply_hit(grabber, &hit, &combat_config);

        let events = release_orphans(&mut fighters);
        assert_eq!(events, vec![GrabEvent::Released { target: FighterId(1) }]);
        assert_ne!(fighters[&FighterId(1)].state, FighterState::Grabbed);
    }

    proptest! {
        #[test]
        fn prop_damage_is_monotonic(pre in 0.0f64..500.0, damage in 0.0f64..50.0, kb in 0.0f64..20.0, angle in -90.0f64..90.0) {
            let mut defender = fighter(1, 100.0);
            defender.damage_percent = pre;
            apply_hit(&mut defender, &contact(damage, kb, angle, 50.0), &CombatConfig::default());
            prop_assert!(defender.damage_percent >= pre);
        }

        #[test]
        fn prop_double_weight_halves_knockback(pre in 0.0f64..300.0, kb in 0.1f64..20.0, angle in -90.0f64..90.0, weight in 0.5f64..3.0) {
            let light = knockback_vector(kb, angle, knockback_multiplier(pre), weight, 1.0);
            let heavy = knockback_vector(kb, angle, knockback_multiplier(pre), weight * 2.0, 1.0);
            prop_assert!((light.x - 2.0 * heavy.x).abs() < 1e-9);
            prop_assert!((light.y - 2.0 * heavy.y).abs() < 1e-9);
        }

        #[test]
        fn prop_double_weight_halves_applied_launch(pre in 0.0f64..300.0, kb in 0.1f64..20.0, angle in -90.0f64..90.0, source_x in 0.0f64..200.0) {
            let mut light = fighter(1, 100.0);
            let mut heavy = fighter(1, 100.0);
            light.damage_percent = pre;
            heavy.damage_percent = pre;
            heavy.weight = light.weight * 2.0;

            let hit = contact(10.0, kb, angle, source_x);
            apply_hit(&mut light, &hit, &CombatConfig::default());
            apply_hit(&mut heavy, &hit, &CombatConfig::default());
            prop_assert!((light.velocity.x - 2.0 * heavy.velocity.x).abs() < 1e-9);
            prop_assert!((light.velocity.y - 2.0 * heavy.velocity.y).abs() < 1e-9);
        }

        #[test]
        fn prop_armor_absorbs_any_hit(damage in 0.1f64..50.0, kb in 0.0f64..20.0, angle in -90.0f64..90.0, scale in 0.1f64..1.0, pre in 0.0f64..300.0) {
            let mut defender = fighter(1, 100.0);
            defender.state = FighterState::SideAttack;
            defender.damage_percent = pre;
            defender.velocity = Vec2::new(1.5, -2.0);
            defender.armor_timer = 0.5;
            defender.armor_scale = scale;

            let outcome = apply_hit(&mut defender, &contact(damage, kb, angle, 50.0), &CombatConfig::default());
            let HitOutcome::Armored { damage: taken } = outcome else {
                return Err(TestCaseError::fail(format!("expected armored, got {outcome:?}")));
            };
            prop_assert!(taken > 0.0);
            prop_assert!((defender.damage_percent - (pre + taken)).abs() < 1e-9);
            prop_assert_eq!(defender.velocity, Vec2::new(1.5, -2.0));
            prop_assert_eq!(defender.hitstun_timer, 0.0);
            prop_assert_eq!(defender.state, FighterState::SideAttack);
        }

        #[test]
        fn prop_knockback_grows_with_percent(low in 0.0f64..200.0, extra in 0.0f64..200.0, kb in 0.1f64..20.0) {
            let a = knockback_vector(kb, -30.0, knockback_multiplier(low), 1.0, 1.0);
            let b = knockback_vector(kb, -30.0, knockback_multiplier(low + extra), 1.0, 1.0);
            prop_assert!(b.length() + 1e-12 >= a.length());
        }
    }
}
