//! Combat engine - ability behavior vocabulary, targeting, projectiles

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::ws::protocol::ProjectileKind;

use super::entity::{EffectKind, Entity};
use super::physics::{self, Aabb};

/// Global cap on live projectiles; spawn requests beyond it are dropped
pub const MAX_LIVE_PROJECTILES: usize = 256;

/// Half-angle of beam abilities, radians
pub const BEAM_HALF_ANGLE: f32 = 0.25;

/// Distance from an actor's edge at which its projectiles appear
pub const PROJECTILE_MUZZLE_GAP: f32 = 4.0;

/// The behavior an ability resolves to, interpreted by the generic
/// resolver in the game loop. Damage values are base amounts; the actor's
/// level and status modifiers scale them at activation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AbilityEffect {
    /// Damage every other entity within `radius` whose bearing lies within
    /// `half_angle` of the actor's facing
    MeleeArc { radius: f32, half_angle: f32, damage: f32 },
    /// Damage every other entity within `radius`, facing-independent
    Nova { radius: f32, damage: f32 },
    /// Narrow long-range arc
    Beam { range: f32, damage: f32 },
    /// Spawn `count` projectiles fanned symmetrically around the facing angle
    Shot {
        kind: ProjectileKind,
        count: u32,
        spread: f32,
        speed: f32,
        damage: f32,
        life: f32,
    },
    /// Spawn one projectile aimed at the nearest other entity, or along
    /// facing when alone
    Seeker {
        kind: ProjectileKind,
        speed: f32,
        damage: f32,
        life: f32,
    },
    /// Restore hp to the actor, or to every entity within `radius`
    Heal { amount: f32, radius: Option<f32> },
    /// Apply a timed status effect to the actor
    Buff { kind: EffectKind, duration_ms: u64 },
    /// Teleport along facing, optionally followed by a damage pulse at the
    /// destination
    Dash { distance: f32, pulse: Option<DashPulse> },
}

/// Radius-damage burst at the end of a dash
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashPulse {
    pub radius: f32,
    pub damage: f32,
}

/// Damage queued during a tick, applied in deterministic order afterwards
#[derive(Debug, Clone, Copy)]
pub struct DamageEvent {
    pub target: Uuid,
    pub source: Uuid,
    pub amount: f32,
}

/// Active projectile in the arena
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: Uuid,
    pub owner: Uuid,
    pub kind: ProjectileKind,
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub damage: f32,
    /// Remaining lifetime in seconds
    pub life: f32,
}

impl Projectile {
    pub fn new(
        owner: Uuid,
        kind: ProjectileKind,
        x: f32,
        y: f32,
        angle: f32,
        speed: f32,
        damage: f32,
        life: f32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            kind,
            x,
            y,
            vel_x: angle.cos() * speed,
            vel_y: angle.sin() * speed,
            damage,
            life,
        }
    }

    /// Hit radius for overlap tests, per kind
    pub fn hit_radius(&self) -> f32 {
        match self.kind {
            ProjectileKind::Bolt => 4.0,
            ProjectileKind::Arrow => 3.0,
            ProjectileKind::Skull => 5.0,
            ProjectileKind::Spark => 3.0,
            ProjectileKind::Thorn => 4.0,
        }
    }

    /// Overlap test against an entity box, expanded by the hit radius
    pub fn hits(&self, target: &Aabb) -> bool {
        target.expanded(self.hit_radius()).contains(self.x, self.y)
    }
}

/// Live entities other than the actor within `radius` of the origin whose
/// bearing lies within `half_angle` of `facing_angle`. Bearing comparison
/// uses the shortest signed angular difference.
pub fn arc_targets(
    entities: &BTreeMap<Uuid, Entity>,
    actor: Uuid,
    ox: f32,
    oy: f32,
    facing_angle: f32,
    radius: f32,
    half_angle: f32,
) -> Vec<Uuid> {
    entities
        .iter()
        .filter(|(id, e)| **id != actor && e.alive)
        .filter(|(_, e)| {
            let dx = e.x - ox;
            let dy = e.y - oy;
            if dx * dx + dy * dy > radius * radius {
                return false;
            }
            let bearing = dy.atan2(dx);
            physics::angle_diff(bearing, facing_angle).abs() <= half_angle
        })
        .map(|(id, _)| *id)
        .collect()
}

/// Live entities other than the actor within `radius`, facing-independent
pub fn nova_targets(
    entities: &BTreeMap<Uuid, Entity>,
    actor: Uuid,
    ox: f32,
    oy: f32,
    radius: f32,
) -> Vec<Uuid> {
    entities
        .iter()
        .filter(|(id, e)| **id != actor && e.alive)
        .filter(|(_, e)| {
            let dx = e.x - ox;
            let dy = e.y - oy;
            dx * dx + dy * dy <= radius * radius
        })
        .map(|(id, _)| *id)
        .collect()
}

/// All live entities within `radius` of the origin, the actor included
pub fn heal_targets(entities: &BTreeMap<Uuid, Entity>, ox: f32, oy: f32, radius: f32) -> Vec<Uuid> {
    entities
        .iter()
        .filter(|(_, e)| e.alive)
        .filter(|(_, e)| {
            let dx = e.x - ox;
            let dy = e.y - oy;
            dx * dx + dy * dy <= radius * radius
        })
        .map(|(id, _)| *id)
        .collect()
}

/// Position of the nearest live entity other than the actor
pub fn nearest_target(
    entities: &BTreeMap<Uuid, Entity>,
    actor: Uuid,
    ox: f32,
    oy: f32,
) -> Option<(f32, f32)> {
    entities
        .iter()
        .filter(|(id, e)| **id != actor && e.alive)
        .map(|(_, e)| {
            let dx = e.x - ox;
            let dy = e.y - oy;
            (dx * dx + dy * dy, e.x, e.y)
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, x, y)| (x, y))
}

/// Fan-out angle offsets for a multi-projectile shot, symmetric around zero
pub fn fan_angles(count: u32, spread: f32) -> Vec<f32> {
    (0..count)
        .map(|i| (i as f32 - (count.saturating_sub(1)) as f32 * 0.5) * spread)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::protocol::ClassKind;

    fn entity_at(x: f32, y: f32) -> Entity {
        Entity::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "t".to_string(),
            ClassKind::Warrior,
            x,
            y,
            0,
        )
    }

    fn arena(entities: Vec<Entity>) -> BTreeMap<Uuid, Entity> {
        entities.into_iter().map(|e| (e.id, e)).collect()
    }

    #[test]
    fn arc_hits_in_front_only() {
        let actor = entity_at(100.0, 100.0);
        let ahead = entity_at(130.0, 100.0);
        let behind = entity_at(70.0, 100.0);
        let actor_id = actor.id;
        let ahead_id = ahead.id;
        let entities = arena(vec![actor, ahead, behind]);

        // Facing right: half a radian either side of 0
        let hit = arc_targets(&entities, actor_id, 100.0, 100.0, 0.0, 50.0, 0.5);
        assert_eq!(hit, vec![ahead_id]);
    }

    #[test]
    fn arc_never_targets_the_actor() {
        let actor = entity_at(100.0, 100.0);
        let actor_id = actor.id;
        let entities = arena(vec![actor]);
        assert!(arc_targets(&entities, actor_id, 100.0, 100.0, 0.0, 50.0, 3.0).is_empty());
        assert!(nova_targets(&entities, actor_id, 100.0, 100.0, 50.0).is_empty());
    }

    #[test]
    fn arc_respects_radius() {
        let actor = entity_at(100.0, 100.0);
        let far = entity_at(400.0, 100.0);
        let actor_id = actor.id;
        let entities = arena(vec![actor, far]);
        assert!(arc_targets(&entities, actor_id, 100.0, 100.0, 0.0, 50.0, 0.5).is_empty());
    }

    #[test]
    fn nova_ignores_facing() {
        let actor = entity_at(100.0, 100.0);
        let behind = entity_at(70.0, 100.0);
        let actor_id = actor.id;
        let behind_id = behind.id;
        let entities = arena(vec![actor, behind]);
        let hit = nova_targets(&entities, actor_id, 100.0, 100.0, 50.0);
        assert_eq!(hit, vec![behind_id]);
    }

    #[test]
    fn dead_entities_are_not_targeted() {
        let actor = entity_at(100.0, 100.0);
        let mut corpse = entity_at(120.0, 100.0);
        corpse.alive = false;
        let actor_id = actor.id;
        let entities = arena(vec![actor, corpse]);
        assert!(nova_targets(&entities, actor_id, 100.0, 100.0, 100.0).is_empty());
    }

    #[test]
    fn nearest_picks_the_closest() {
        let actor = entity_at(0.0, 0.0);
        let near = entity_at(50.0, 0.0);
        let far = entity_at(200.0, 0.0);
        let actor_id = actor.id;
        let entities = arena(vec![actor, near, far]);
        assert_eq!(nearest_target(&entities, actor_id, 0.0, 0.0), Some((50.0, 0.0)));
    }

    #[test]
    fn nearest_is_none_when_alone() {
        let actor = entity_at(0.0, 0.0);
        let actor_id = actor.id;
        let entities = arena(vec![actor]);
        assert_eq!(nearest_target(&entities, actor_id, 0.0, 0.0), None);
    }

    #[test]
    fn fan_is_symmetric_around_facing() {
        let angles = fan_angles(3, 0.2);
        assert_eq!(angles.len(), 3);
        assert!((angles[0] + 0.2).abs() < 1e-6);
        assert!(angles[1].abs() < 1e-6);
        assert!((angles[2] - 0.2).abs() < 1e-6);

        let single = fan_angles(1, 0.0);
        assert_eq!(single, vec![0.0]);
    }

    #[test]
    fn projectile_hit_uses_expanded_box() {
        let p = Projectile::new(
            Uuid::new_v4(),
            ProjectileKind::Arrow,
            111.0,
            100.0,
            0.0,
            100.0,
            3.0,
            1.0,
        );
        // Entity box is 20 wide around x=100: edge at 110, arrow radius 3
        let target = Aabb::from_center(100.0, 100.0, 20.0, 20.0);
        assert!(p.hits(&target));

        let miss = Projectile::new(
            Uuid::new_v4(),
            ProjectileKind::Arrow,
            120.0,
            100.0,
            0.0,
            100.0,
            3.0,
            1.0,
        );
        assert!(!miss.hits(&target));
    }
}
