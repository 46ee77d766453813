//! Collision Detection
//!
//! Deterministic collision checks: fighter feet against platform tops,
//! fighter bodies against solid platforms, hitboxes against hurtboxes, and
//! grab boxes against bodies. Checks return plain results; the match
//! controller decides what to do with them.

use crate::core::rect::Aabb;
use crate::core::vec2::Vec2;
use crate::game::fighter::{Facing, Fighter, FighterConfig, FighterId, FighterState};
use crate::game::hitbox::Hitbox;
use crate::game::stage::Platform;

/// Slack when deciding whether feet are on (or were above) a surface.
pub const SURFACE_TOLERANCE: f64 = 1.0;

// =============================================================================
// PLATFORMS
// =============================================================================

/// Ground contact changes from one collision pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContactChange {
    /// Fighter touched down
    pub landed: bool,
    /// Fighter lost ground contact without jumping
    pub left_ground: bool,
}

/// Platform still holding up a grounded fighter, if any.
///
/// Prefers the platform the fighter was already standing on.
pub fn find_support(hurtbox: &Aabb, feet_y: f64, current: Option<usize>, platforms: &[Platform]) -> Option<usize> {
    let supports = |p: &Platform| {
        p.is_present()
            && (feet_y - p.top()).abs() <= SURFACE_TOLERANCE
            && hurtbox.overlaps_horizontally(&p.rect)
    };

    if let Some(index) = current {
        if platforms.get(index).is_some_and(supports) {
            return Some(index);
        }
    }
    platforms
        .iter()
        .enumerate()
        .filter(|(_, p)| supports(p))
        .min_by(|(_, a), (_, b)| a.top().total_cmp(&b.top()))
        .map(|(i, _)| i)
}

/// Highest platform top the feet crossed while moving from `prev_feet_y`
/// down to `feet_y`.
///
/// Pass-through platforms only catch a fighter that started at or above
/// their surface, so jumping up through them never lands.
pub fn find_landing(hurtbox: &Aabb, prev_feet_y: f64, feet_y: f64, platforms: &[Platform]) -> Option<usize> {
    platforms
        .iter()
        .enumerate()
        .filter(|(_, p)| {
            p.is_present()
                && prev_feet_y <= p.top() + SURFACE_TOLERANCE
                && feet_y >= p.top()
                && hurtbox.overlaps_horizontally(&p.rect)
        })
        .min_by(|(_, a), (_, b)| a.top().total_cmp(&b.top()))
        .map(|(i, _)| i)
}

/// Push a fighter out of solid platform bodies it moved into from below or
/// from the side. Fighters that started inside a body are left alone.
pub fn push_out_of_solids(fighter: &mut Fighter, prev_position: Vec2, platforms: &[Platform]) {
    let half_width = fighter.tuning.width / 2.0;
    let height = fighter.tuning.height;

    for platform in platforms.iter().filter(|p| p.is_present() && !p.is_one_way()) {
        let body = fighter.hurtbox();
        let rect = platform.rect;
        if !body.overlaps(&rect) {
            continue;
        }

        let prev = Aabb::new(prev_position.x - half_width, prev_position.y - height, fighter.tuning.width, height);
        if prev.bottom() <= rect.top() + SURFACE_TOLERANCE {
            // Coming down onto the top; landing handles it
            continue;
        }
        if prev.top() >= rect.bottom() - SURFACE_TOLERANCE {
            fighter.position.y = rect.bottom() + height;
            fighter.velocity.y = fighter.velocity.y.max(0.0);
        } else if prev.right() <= rect.left() + SURFACE_TOLERANCE {
            fighter.position.x = rect.left() - half_width;
            fighter.velocity.x = fighter.velocity.x.min(0.0);
        } else if prev.left() >= rect.right() - SURFACE_TOLERANCE {
            fighter.position.x = rect.right() + half_width;
            fighter.velocity.x = fighter.velocity.x.max(0.0);
        }
    }
}

/// Resolve a fighter against every platform after integration.
pub fn resolve_platforms(
    fighter: &mut Fighter,
    prev_position: Vec2,
    platforms: &[Platform],
    config: &FighterConfig,
) -> ContactChange {
    let mut change = ContactChange::default();

    if fighter.on_ground {
        let support = if fighter.velocity.y >= 0.0 {
            find_support(&fighter.hurtbox(), fighter.position.y, fighter.ground_platform, platforms)
        } else {
            None
        };
        if let Some(index) = support {
            fighter.position.y = platforms[index].top();
            fighter.velocity.y = 0.0;
            fighter.ground_platform = Some(index);
            push_out_of_solids(fighter, prev_position, platforms);
            return change;
        }

        fighter.on_ground = false;
        fighter.ground_platform = None;
        fighter.on_left_ground(config);
        change.left_ground = true;
    }

    push_out_of_solids(fighter, prev_position, platforms);

    if fighter.velocity.y >= 0.0 {
        let landing = find_landing(&fighter.hurtbox(), prev_position.y, fighter.position.y, platforms);
        if let Some(index) = landing {
            fighter.position.y = platforms[index].top();
            fighter.velocity.y = 0.0;
            fighter.on_ground = true;
            fighter.ground_platform = Some(index);
            fighter.just_landed = true;
            fighter.on_landed(config);
            change.landed = true;
        }
    }
    change
}

// =============================================================================
// HITS AND GRABS
// =============================================================================

/// A hitbox touching a vulnerable defender.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitContact {
    /// Owner of the hitbox
    pub attacker: FighterId,
    /// Fighter hit
    pub defender: FighterId,
    /// Damage after area falloff
    pub damage: f64,
    /// Base knockback
    pub knockback: f64,
    /// Launch angle in degrees
    pub angle_deg: f64,
    /// X the launch direction is measured from
    pub source_x: f64,
    /// Hitbox facing, used when source and defender share an x
    pub facing: Facing,
    /// Upper bound on post-hit invincibility, in frames
    pub invincibility_cap: Option<f64>,
}

/// Check one hitbox against one defender.
///
/// `source_x` is the attacker's x for attached hitboxes and the hitbox's
/// own center for projectiles.
pub fn check_hit(hitbox: &Hitbox, defender: &Fighter, source_x: f64) -> Option<HitContact> {
    if !defender.in_play || defender.is_invincible() || !hitbox.can_hit(defender.id) {
        return None;
    }
    if !hitbox.touches(&defender.hurtbox()) {
        return None;
    }

    Some(HitContact {
        attacker: hitbox.owner,
        defender: defender.id,
        damage: hitbox.damage_against(defender.center()),
        knockback: hitbox.knockback,
        angle_deg: hitbox.angle_deg,
        source_x,
        facing: hitbox.facing,
        invincibility_cap: hitbox.invincibility_cap(),
    })
}

/// Can `grabber`'s live grab box seize `target` this tick?
pub fn check_grab(grabber: &Fighter, target: &Fighter, config: &FighterConfig) -> bool {
    grabber.id != target.id
        && grabber.grab_is_live(config)
        && target.in_play
        && !target.is_invincible()
        && target.held_by.is_none()
        && target.state != FighterState::Grabbed
        && grabber.grab_box(config).overlaps(&target.hurtbox())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::roster::CharacterId;
    use crate::game::stage::PlatformKind;

    fn fighter_at(x: f64, y: f64) -> Fighter {
        let mut f = Fighter::new(FighterId(0), CharacterId::Brawler, 0, Vec2::new(x, y));
        f.state = FighterState::Falling;
        f
    }

    fn platform(x: f64, y: f64, w: f64, h: f64, kind: PlatformKind) -> Platform {
        Platform::new(Aabb::new(x, y, w, h), kind)
    }

    #[test]
    fn test_lands_on_pass_through_from_above() {
        let config = FighterConfig::default();
        let platforms = [platform(0.0, 500.0, 200.0, 20.0, PlatformKind::PassThrough)];
        let mut f = fighter_at(100.0, 505.0);
        f.velocity.y = 8.0;

        let change = resolve_platforms(&mut f, Vec2::new(100.0, 497.0), &platforms, &config);
        assert!(change.landed);
        assert!(f.on_ground);
        assert_eq!(f.position.y, 500.0);
        assert_eq!(f.velocity.y, 0.0);
        assert_eq!(f.state, FighterState::Landing);
    }

    #[test]
    fn test_rises_through_pass_through() {
        let config = FighterConfig::default();
        let platforms = [platform(0.0, 500.0, 200.0, 20.0, PlatformKind::PassThrough)];
        let mut f = fighter_at(100.0, 495.0);
        f.velocity.y = -10.0;

        let change = resolve_platforms(&mut f, Vec2::new(100.0, 505.0), &platforms, &config);
        assert!(!change.landed);
        assert!(!f.on_ground);
        assert_eq!(f.position.y, 495.0);
    }

    #[test]
    fn test_falling_from_below_does_not_land() {
        let config = FighterConfig::default();
        let platforms = [platform(0.0, 500.0, 200.0, 20.0, PlatformKind::PassThrough)];
        // Feet started under the surface (body overlapping the ledge)
        let mut f = fighter_at(100.0, 512.0);
        f.velocity.y = 2.0;

        let change = resolve_platforms(&mut f, Vec2::new(100.0, 510.0), &platforms, &config);
        assert!(!change.landed);
    }

    #[test]
    fn test_highest_crossed_surface_wins() {
        let config = FighterConfig::default();
        let platforms = [
            platform(0.0, 520.0, 200.0, 20.0, PlatformKind::PassThrough),
            platform(0.0, 505.0, 200.0, 10.0, PlatformKind::PassThrough),
        ];
        let mut f = fighter_at(100.0, 530.0);
        f.velocity.y = 20.0;

        resolve_platforms(&mut f, Vec2::new(100.0, 500.0), &platforms, &config);
        assert_eq!(f.ground_platform, Some(1));
        assert_eq!(f.position.y, 505.0);
    }

    #[test]
    fn test_solid_head_bump() {
        let config = FighterConfig::default();
        let platforms = [platform(0.0, 400.0, 200.0, 40.0, PlatformKind::Solid)];
        // Head moves from 450 up to 430, into the slab's underside at 440
        let mut f = fighter_at(100.0, 510.0);
        f.velocity.y = -20.0;

        resolve_platforms(&mut f, Vec2::new(100.0, 530.0), &platforms, &config);
        assert_eq!(f.position.y, 440.0 + 80.0);
        assert_eq!(f.velocity.y, 0.0);
    }

    #[test]
    fn test_solid_side_push() {
        let config = FighterConfig::default();
        let platforms = [platform(200.0, 300.0, 100.0, 400.0, PlatformKind::Solid)];
        let mut f = fighter_at(175.0, 500.0);
        f.velocity.x = 6.0;

        resolve_platforms(&mut f, Vec2::new(169.0, 500.0), &platforms, &config);
        assert_eq!(f.position.x, 170.0);
        assert_eq!(f.velocity.x, 0.0);
    }

    #[test]
    fn test_walk_off_edge_starts_coyote() {
        let config = FighterConfig::default();
        let platforms = [platform(0.0, 500.0, 200.0, 20.0, PlatformKind::Solid)];
        let mut f = fighter_at(240.0, 500.0);
        f.on_ground = true;
        f.ground_platform = Some(0);
        f.state = FighterState::Walking;

        let change = resolve_platforms(&mut f, Vec2::new(228.0, 500.0), &platforms, &config);
        assert!(change.left_ground);
        assert!(!f.on_ground);
        assert_eq!(f.state, FighterState::Falling);
        assert!(f.coyote_timer > 0.0);
    }

    #[test]
    fn test_standing_stays_supported() {
        let config = FighterConfig::default();
        let platforms = [platform(0.0, 500.0, 200.0, 20.0, PlatformKind::Solid)];
        let mut f = fighter_at(100.0, 500.0);
        f.on_ground = true;
        f.state = FighterState::Idle;

        let change = resolve_platforms(&mut f, Vec2::new(100.0, 500.0), &platforms, &config);
        assert_eq!(change, ContactChange::default());
        assert!(f.on_ground);
        assert_eq!(f.ground_platform, Some(0));
    }

    #[test]
    fn test_broken_platform_gives_no_support() {
        let config = FighterConfig::default();
        let mut p = platform(0.0, 500.0, 200.0, 20.0, PlatformKind::Breakable { durability: 1.0, respawn_time: 2.0 });
        p.broken_for = 2.0;
        let mut f = fighter_at(100.0, 500.0);
        f.on_ground = true;
        f.state = FighterState::Idle;

        let change = resolve_platforms(&mut f, Vec2::new(100.0, 500.0), &[p], &config);
        assert!(change.left_ground);
    }

    #[test]
    fn test_grab_respects_invincibility() {
        let config = FighterConfig::default();
        let mut grabber = fighter_at(100.0, 500.0);
        grabber.state = FighterState::Grabbing;
        grabber.grab = Some(Default::default());
        let mut target = Fighter::new(FighterId(1), CharacterId::Brawler, 1, Vec2::new(160.0, 500.0));

        assert!(check_grab(&grabber, &target, &config));
        target.invincibility_timer = 1.0;
        assert!(!check_grab(&grabber, &target, &config));
    }
}
