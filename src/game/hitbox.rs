//! Hitboxes
//!
//! A live hitbox is a tagged union over the behaviors an attack can have:
//! plain melee, multi-hit, area-of-effect, or a detached projectile. Each
//! hitbox remembers which defenders it has already connected with so a
//! single-hit box can never land twice on the same fighter.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::rect::Aabb;
use crate::core::vec2::Vec2;
use crate::game::fighter::{Facing, FighterId};
use crate::game::moves::AttackSpec;
use crate::FRAME_EPSILON;

/// Behavior variant of a hitbox.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum HitboxKind {
    /// Hits each defender at most once, then deactivates
    Melee,
    /// Re-arms for a defender every `interval` frames
    MultiHit {
        /// Frames between connections on the same defender
        interval: f64,
    },
    /// Circular blast; damage falls off with distance
    Area {
        /// Reach from the center
        radius: f64,
        /// Fraction of damage lost at the edge
        falloff: f64,
    },
    /// Travels on its own at `velocity` (pixels per frame)
    Projectile {
        /// Travel velocity
        velocity: Vec2,
    },
}

/// Live hitbox.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hitbox {
    /// Fighter that created it (never hit by it)
    pub owner: FighterId,
    /// Behavior variant
    pub kind: HitboxKind,
    /// Current world region
    pub region: Aabb,
    /// Center offset from the owner's feet (facing resolved); unused by projectiles
    pub offset: Vec2,
    /// Percent dealt on hit
    pub damage: f64,
    /// Base knockback magnitude
    pub knockback: f64,
    /// Launch angle in degrees
    pub angle_deg: f64,
    /// Owner's facing when the hitbox was created
    pub facing: Facing,
    /// Frames since creation
    pub age: f64,
    /// Last age at which the hitbox is live
    pub active_frames: f64,
    /// False once spent
    pub alive: bool,
    /// Defender -> age of the most recent connection
    pub hits: BTreeMap<FighterId, f64>,
}

impl Hitbox {
    /// Build the hitbox for `spec`, attached to a fighter standing at `feet`.
    pub fn from_attack(
        owner: FighterId,
        spec: &AttackSpec,
        feet: Vec2,
        facing: Facing,
        damage_scale: f64,
    ) -> Self {
        let shape = spec.hitbox;
        let offset = Vec2::new(shape.offset_x * facing.sign(), shape.offset_y);
        let kind = if let Some(projectile) = spec.flags.projectile {
            HitboxKind::Projectile {
                velocity: Vec2::new(projectile.speed * facing.sign(), 0.0),
            }
        } else if let Some(area) = spec.flags.area {
            HitboxKind::Area {
                radius: area.radius,
                falloff: area.falloff,
            }
        } else if let Some(interval) = spec.flags.multi_hit {
            HitboxKind::MultiHit {
                interval: interval.max(1) as f64,
            }
        } else {
            HitboxKind::Melee
        };
        let active_frames = match spec.flags.projectile {
            Some(projectile) => projectile.lifetime as f64,
            None => spec.active as f64,
        };

        Self {
            owner,
            kind,
            region: Aabb::from_center(feet + offset, shape.width, shape.height),
            offset,
            damage: spec.damage * damage_scale,
            knockback: spec.knockback,
            angle_deg: spec.angle_deg,
            facing,
            age: 0.0,
            active_frames,
            alive: true,
            hits: BTreeMap::new(),
        }
    }

    /// Is this a detached projectile?
    #[inline]
    pub fn is_projectile(&self) -> bool {
        matches!(self.kind, HitboxKind::Projectile { .. })
    }

    /// Re-center on the owner after it moved. Projectiles ignore this.
    pub fn follow(&mut self, feet: Vec2) {
        if !self.is_projectile() {
            self.region = Aabb::from_center(feet + self.offset, self.region.width, self.region.height);
        }
    }

    /// May this hitbox connect with `target` right now?
    pub fn can_hit(&self, target: FighterId) -> bool {
        if !self.alive || target == self.owner || self.is_expired() {
            return false;
        }
        match (self.kind, self.hits.get(&target)) {
            (_, None) => true,
            (HitboxKind::MultiHit { interval }, Some(last)) => {
                self.age - last + FRAME_EPSILON >= interval
            }
            (_, Some(_)) => false,
        }
    }

    /// Does the hitbox geometrically touch `hurtbox`?
    pub fn touches(&self, hurtbox: &Aabb) -> bool {
        match self.kind {
            HitboxKind::Area { radius, .. } => {
                circle_touches_rect(self.region.center(), radius, hurtbox)
            }
            _ => self.region.overlaps(hurtbox),
        }
    }

    /// Damage dealt to a defender whose hurtbox center is `target_center`.
    pub fn damage_against(&self, target_center: Vec2) -> f64 {
        match self.kind {
            HitboxKind::Area { radius, falloff } if radius > 0.0 => {
                let distance = self.region.center().distance(target_center).min(radius);
                self.damage * (1.0 - falloff * distance / radius).max(0.0)
            }
            _ => self.damage,
        }
    }

    /// Invincibility cap for a connection (multi-hit must allow its own re-arm).
    pub fn invincibility_cap(&self) -> Option<f64> {
        match self.kind {
            HitboxKind::MultiHit { interval } => Some(interval),
            _ => None,
        }
    }

    /// Record a connection with `target`.
    pub fn record_hit(&mut self, target: FighterId) {
        self.hits.insert(target, self.age);
        if !matches!(self.kind, HitboxKind::MultiHit { .. }) {
            self.alive = false;
        }
    }

    /// Advance by `frames`; projectiles also travel.
    pub fn advance(&mut self, frames: f64) {
        self.age += frames;
        if let HitboxKind::Projectile { velocity } = self.kind {
            self.region = self.region.translated(velocity * frames);
        }
    }

    /// Past its live window.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.age > self.active_frames + FRAME_EPSILON
    }

    /// Should be dropped at bookkeeping.
    #[inline]
    pub fn is_spent(&self) -> bool {
        !self.alive || self.is_expired()
    }

    /// Hash the mutable part of this hitbox, including who it has hit.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.owner.0);
        hasher.update_rect(&self.region);
        hasher.update_f64(self.age);
        hasher.update_bool(self.alive);
        hasher.update_u32(self.hits.len() as u32);
        for (target, age) in &self.hits {
            hasher.update_u8(target.0);
            hasher.update_f64(*age);
        }
    }
}

/// Circle vs rectangle overlap (closest-point test).
pub fn circle_touches_rect(center: Vec2, radius: f64, rect: &Aabb) -> bool {
    let closest = Vec2::new(
        center.x.clamp(rect.left(), rect.right()),
        center.y.clamp(rect.top(), rect.bottom()),
    );
    center.distance_squared(closest) <= radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::input::AttackDirection;
    use crate::game::moves::HitboxShape;

    fn spec() -> AttackSpec {
        AttackSpec::new(
            "Test",
            AttackDirection::Neutral,
            0,
            12,
            10,
            4.0,
            0.0,
            0.0,
            HitboxShape::new(50.0, 50.0, 60.0, -40.0),
        )
    }

    #[test]
    fn test_offset_mirrors_with_facing() {
        let feet = Vec2::new(100.0, 200.0);
        let right = Hitbox::from_attack(FighterId(0), &spec(), feet, Facing::Right, 1.0);
        let left = Hitbox::from_attack(FighterId(0), &spec(), feet, Facing::Left, 1.0);

        assert_eq!(right.region.center(), Vec2::new(160.0, 160.0));
        assert_eq!(left.region.center(), Vec2::new(40.0, 160.0));
    }

    #[test]
    fn test_hash_covers_hit_record() {
        let hash = |hb: &Hitbox| {
            let mut hasher = StateHasher::for_match_state();
            hb.hash_into(&mut hasher);
            hasher.finalize()
        };
        let fresh = Hitbox::from_attack(FighterId(0), &spec(), Vec2::ZERO, Facing::Right, 1.0);
        let mut used = fresh.clone();
        used.hits.insert(FighterId(1), 0.0);

        assert_ne!(hash(&fresh), hash(&used));
    }

    #[test]
    fn test_melee_hits_once() {
        let mut hb = Hitbox::from_attack(FighterId(0), &spec(), Vec2::ZERO, Facing::Right, 1.0);
        let target = FighterId(1);

        assert!(hb.can_hit(target));
        hb.record_hit(target);
        assert!(!hb.can_hit(target));
        hb.advance(5.0);
        assert!(!hb.can_hit(target));
    }

    #[test]
    fn test_never_hits_owner() {
        let hb = Hitbox::from_attack(FighterId(3), &spec(), Vec2::ZERO, Facing::Right, 1.0);
        assert!(!hb.can_hit(FighterId(3)));
    }

    #[test]
    fn test_multi_hit_rearms_on_interval() {
        let mut hb = Hitbox::from_attack(
            FighterId(0),
            &spec().with_multi_hit(4),
            Vec2::ZERO,
            Facing::Right,
            1.0,
        );
        let target = FighterId(1);

        hb.record_hit(target);
        for _ in 0..3 {
            hb.advance(1.0);
            assert!(!hb.can_hit(target));
        }
        hb.advance(1.0);
        assert!(hb.can_hit(target));
    }

    #[test]
    fn test_live_window_is_inclusive() {
        let mut hb = Hitbox::from_attack(FighterId(0), &spec(), Vec2::ZERO, Facing::Right, 1.0);
        hb.advance(12.0);
        assert!(!hb.is_expired());
        hb.advance(1.0);
        assert!(hb.is_expired());
        assert!(!hb.can_hit(FighterId(1)));
    }

    #[test]
    fn test_area_falloff() {
        let hb = Hitbox::from_attack(
            FighterId(0),
            &spec().with_area(100.0, 0.5),
            Vec2::ZERO,
            Facing::Right,
            1.0,
        );
        let center = hb.region.center();

        assert_eq!(hb.damage_against(center), 4.0);
        assert!((hb.damage_against(center + Vec2::new(100.0, 0.0)) - 2.0).abs() < 1e-9);
        // Beyond the radius clamps to the edge value
        assert!((hb.damage_against(center + Vec2::new(500.0, 0.0)) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_projectile_travels() {
        let mut hb = Hitbox::from_attack(
            FighterId(0),
            &spec().with_projectile(8.0, 90),
            Vec2::ZERO,
            Facing::Left,
            1.0,
        );
        let start = hb.region.center();
        hb.advance(2.0);
        assert_eq!(hb.region.center(), start + Vec2::new(-16.0, 0.0));
        assert_eq!(hb.active_frames, 90.0);
    }

    #[test]
    fn test_circle_rect() {
        let rect = Aabb::new(0.0, 0.0, 10.0, 10.0);
        assert!(circle_touches_rect(Vec2::new(15.0, 5.0), 5.0, &rect));
        assert!(!circle_touches_rect(Vec2::new(16.0, 16.0), 5.0, &rect));
    }
}
