//! Snapshot building - the minimal per-tick state projection

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::ws::protocol::{EntitySnapshot, ProjectileSnapshot, ServerMsg};

use super::combat::Projectile;
use super::entity::Entity;

/// Build the per-tick snapshot broadcast to every session.
///
/// Positions are rounded to integer units; velocity, cooldowns and status
/// detail are deliberately omitted to keep the wire payload small. Entities
/// awaiting respawn are skipped; clients track them through the
/// died/respawned notifications.
pub fn build_snapshot(
    t: u64,
    entities: &BTreeMap<Uuid, Entity>,
    projectiles: &[Projectile],
) -> ServerMsg {
    let entities = entities
        .values()
        .filter(|e| e.alive)
        .map(|e| EntitySnapshot {
            id: e.id,
            x: e.x.round() as i32,
            y: e.y.round() as i32,
            hp: e.hp,
            max_hp: e.max_hp,
            class: e.class,
            xp: e.xp,
            level: e.level,
            facing: e.facing,
        })
        .collect();

    let projectiles = projectiles
        .iter()
        .map(|p| ProjectileSnapshot {
            id: p.id,
            x: p.x.round() as i32,
            y: p.y.round() as i32,
            kind: p.kind,
        })
        .collect();

    ServerMsg::Snapshot {
        t,
        entities,
        projectiles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::protocol::ClassKind;

    #[test]
    fn snapshot_rounds_positions_and_skips_the_dead() {
        let mut entities = BTreeMap::new();
        let alive = Entity::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "alive".to_string(),
            ClassKind::Mage,
            100.6,
            99.4,
            0,
        );
        let mut dead = Entity::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "dead".to_string(),
            ClassKind::Rogue,
            10.0,
            10.0,
            0,
        );
        dead.alive = false;
        let alive_id = alive.id;
        entities.insert(alive.id, alive);
        entities.insert(dead.id, dead);

        match build_snapshot(42, &entities, &[]) {
            ServerMsg::Snapshot { t, entities, projectiles } => {
                assert_eq!(t, 42);
                assert!(projectiles.is_empty());
                assert_eq!(entities.len(), 1);
                assert_eq!(entities[0].id, alive_id);
                assert_eq!(entities[0].x, 101);
                assert_eq!(entities[0].y, 99);
            }
            other => panic!("expected snapshot, got {:?}", other),
        }
    }
}
