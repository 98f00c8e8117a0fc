//! Per-class stats and the (class x slot) ability table

use crate::ws::protocol::{ClassKind, ProjectileKind};

use super::combat::{AbilityEffect, DashPulse};
use super::entity::{ActionSlot, EffectKind};

/// Base stats fixed by class at creation time
#[derive(Debug, Clone, Copy)]
pub struct ClassStats {
    /// Maximum health at level 1
    pub max_hp: f32,
    /// Movement speed, world units per second
    pub speed: f32,
    /// Collision box width
    pub box_w: f32,
    /// Collision box height
    pub box_h: f32,
}

impl ClassStats {
    pub fn for_class(class: ClassKind) -> Self {
        match class {
            ClassKind::Warrior => Self {
                max_hp: 26.0,
                speed: 150.0,
                box_w: 26.0,
                box_h: 26.0,
            },
            ClassKind::Berserker => Self {
                max_hp: 24.0,
                speed: 165.0,
                box_w: 26.0,
                box_h: 26.0,
            },
            ClassKind::Paladin => Self {
                max_hp: 30.0,
                speed: 140.0,
                box_w: 28.0,
                box_h: 28.0,
            },
            ClassKind::Rogue => Self {
                max_hp: 18.0,
                speed: 185.0,
                box_w: 22.0,
                box_h: 22.0,
            },
            ClassKind::Archer => Self {
                max_hp: 18.0,
                speed: 170.0,
                box_w: 22.0,
                box_h: 22.0,
            },
            ClassKind::Mage => Self {
                max_hp: 16.0,
                speed: 155.0,
                box_w: 22.0,
                box_h: 22.0,
            },
            ClassKind::Necromancer => Self {
                max_hp: 17.0,
                speed: 150.0,
                box_w: 24.0,
                box_h: 24.0,
            },
            ClassKind::Cleric => Self {
                max_hp: 20.0,
                speed: 150.0,
                box_w: 24.0,
                box_h: 24.0,
            },
            ClassKind::Druid => Self {
                max_hp: 22.0,
                speed: 160.0,
                box_w: 24.0,
                box_h: 24.0,
            },
        }
    }
}

/// One ability binding: recharge duration plus the behavior descriptor
#[derive(Debug, Clone, Copy)]
pub struct AbilitySpec {
    /// Recharge duration in seconds, armed on successful activation
    pub cooldown: f32,
    pub effect: AbilityEffect,
}

/// The ability bound to a (class, slot) pair.
///
/// Every class binds all four slots; the behaviors are drawn from the
/// fixed vocabulary in [`AbilityEffect`] and interpreted by one generic
/// resolver in the game loop.
pub fn ability(class: ClassKind, slot: ActionSlot) -> AbilitySpec {
    use AbilityEffect::*;
    use ActionSlot::*;

    match (class, slot) {
        // Warrior: frontline melee with a shield wall
        (ClassKind::Warrior, Basic) => spec(0.6, MeleeArc { radius: 44.0, half_angle: 1.05, damage: 4.0 }),
        (ClassKind::Warrior, Q) => spec(4.0, Dash { distance: 140.0, pulse: Some(DashPulse { radius: 40.0, damage: 3.0 }) }),
        (ClassKind::Warrior, E) => spec(8.0, Buff { kind: EffectKind::Shield, duration_ms: 4_000 }),
        (ClassKind::Warrior, X) => spec(12.0, Nova { radius: 90.0, damage: 6.0 }),

        // Berserker: rage-fueled bruiser
        (ClassKind::Berserker, Basic) => spec(0.7, MeleeArc { radius: 40.0, half_angle: 1.2, damage: 5.0 }),
        (ClassKind::Berserker, Q) => spec(6.0, Buff { kind: EffectKind::Rage, duration_ms: 5_000 }),
        (ClassKind::Berserker, E) => spec(5.0, Dash { distance: 120.0, pulse: Some(DashPulse { radius: 36.0, damage: 3.0 }) }),
        (ClassKind::Berserker, X) => spec(12.0, Nova { radius: 100.0, damage: 7.0 }),

        // Paladin: durable melee with self-sustain
        (ClassKind::Paladin, Basic) => spec(0.7, MeleeArc { radius: 42.0, half_angle: 0.9, damage: 4.0 }),
        (ClassKind::Paladin, Q) => spec(5.0, Heal { amount: 6.0, radius: None }),
        (ClassKind::Paladin, E) => spec(8.0, Buff { kind: EffectKind::Shield, duration_ms: 5_000 }),
        (ClassKind::Paladin, X) => spec(10.0, Nova { radius: 80.0, damage: 5.0 }),

        // Rogue: burst melee, vanishes, finishes with a piercing lunge
        (ClassKind::Rogue, Basic) => spec(0.5, MeleeArc { radius: 36.0, half_angle: 0.8, damage: 6.0 }),
        (ClassKind::Rogue, Q) => spec(7.0, Buff { kind: EffectKind::Invisibility, duration_ms: 3_000 }),
        (ClassKind::Rogue, E) => spec(4.0, Dash { distance: 160.0, pulse: None }),
        (ClassKind::Rogue, X) => spec(12.0, Beam { range: 220.0, damage: 8.0 }),

        // Archer: fan shots and a homing arrow
        (ClassKind::Archer, Basic) => spec(0.6, Shot { kind: ProjectileKind::Arrow, count: 1, spread: 0.0, speed: 420.0, damage: 3.0, life: 1.2 }),
        (ClassKind::Archer, Q) => spec(4.0, Shot { kind: ProjectileKind::Arrow, count: 3, spread: 0.26, speed: 380.0, damage: 2.0, life: 1.0 }),
        (ClassKind::Archer, E) => spec(6.0, Buff { kind: EffectKind::Haste, duration_ms: 3_000 }),
        (ClassKind::Archer, X) => spec(10.0, Seeker { kind: ProjectileKind::Arrow, speed: 300.0, damage: 6.0, life: 2.5 }),

        // Mage: ranged caster with a blink and a long ray
        (ClassKind::Mage, Basic) => spec(0.7, Shot { kind: ProjectileKind::Bolt, count: 1, spread: 0.0, speed: 360.0, damage: 3.0, life: 1.4 }),
        (ClassKind::Mage, Q) => spec(5.0, Nova { radius: 85.0, damage: 5.0 }),
        (ClassKind::Mage, E) => spec(6.0, Dash { distance: 180.0, pulse: None }),
        (ClassKind::Mage, X) => spec(12.0, Beam { range: 260.0, damage: 9.0 }),

        // Necromancer: homing skulls and a monstrous form
        (ClassKind::Necromancer, Basic) => spec(0.8, Shot { kind: ProjectileKind::Skull, count: 1, spread: 0.0, speed: 320.0, damage: 3.0, life: 1.6 }),
        (ClassKind::Necromancer, Q) => spec(5.0, Seeker { kind: ProjectileKind::Skull, speed: 280.0, damage: 5.0, life: 2.5 }),
        (ClassKind::Necromancer, E) => spec(7.0, Nova { radius: 70.0, damage: 4.0 }),
        (ClassKind::Necromancer, X) => spec(14.0, Buff { kind: EffectKind::Transformed, duration_ms: 6_000 }),

        // Cleric: support caster, single and area heals
        (ClassKind::Cleric, Basic) => spec(0.6, Shot { kind: ProjectileKind::Spark, count: 1, spread: 0.0, speed: 340.0, damage: 2.0, life: 1.2 }),
        (ClassKind::Cleric, Q) => spec(4.0, Heal { amount: 8.0, radius: None }),
        (ClassKind::Cleric, E) => spec(8.0, Heal { amount: 5.0, radius: Some(110.0) }),
        (ClassKind::Cleric, X) => spec(12.0, Beam { range: 240.0, damage: 7.0 }),

        // Druid: shapeshifter with thorns
        (ClassKind::Druid, Basic) => spec(0.65, Shot { kind: ProjectileKind::Thorn, count: 1, spread: 0.0, speed: 350.0, damage: 3.0, life: 1.3 }),
        (ClassKind::Druid, Q) => spec(6.0, Buff { kind: EffectKind::Transformed, duration_ms: 5_000 }),
        (ClassKind::Druid, E) => spec(7.0, Heal { amount: 4.0, radius: Some(90.0) }),
        (ClassKind::Druid, X) => spec(11.0, Seeker { kind: ProjectileKind::Thorn, speed: 320.0, damage: 6.0, life: 2.2 }),
    }
}

fn spec(cooldown: f32, effect: AbilityEffect) -> AbilitySpec {
    AbilitySpec { cooldown, effect }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_CLASSES: [ClassKind; 9] = [
        ClassKind::Warrior,
        ClassKind::Berserker,
        ClassKind::Paladin,
        ClassKind::Rogue,
        ClassKind::Archer,
        ClassKind::Mage,
        ClassKind::Necromancer,
        ClassKind::Cleric,
        ClassKind::Druid,
    ];

    #[test]
    fn every_slot_has_a_positive_cooldown() {
        for class in ALL_CLASSES {
            for slot in ActionSlot::ALL {
                let spec = ability(class, slot);
                assert!(
                    spec.cooldown > 0.0,
                    "{:?} {:?} has no cooldown",
                    class,
                    slot
                );
            }
        }
    }

    #[test]
    fn ultimates_recharge_slowest() {
        for class in ALL_CLASSES {
            let basic = ability(class, ActionSlot::Basic).cooldown;
            let ult = ability(class, ActionSlot::X).cooldown;
            assert!(ult > basic, "{:?} ultimate should outlast basic", class);
        }
    }

    #[test]
    fn table_exercises_every_status_kind() {
        let buffed: Vec<EffectKind> = ALL_CLASSES
            .iter()
            .flat_map(|c| ActionSlot::ALL.iter().map(|s| ability(*c, *s)))
            .filter_map(|spec| match spec.effect {
                AbilityEffect::Buff { kind, .. } => Some(kind),
                _ => None,
            })
            .collect();

        for kind in [
            EffectKind::Shield,
            EffectKind::Haste,
            EffectKind::Invisibility,
            EffectKind::Rage,
            EffectKind::Transformed,
        ] {
            assert!(buffed.contains(&kind), "{:?} is never applied", kind);
        }
    }

    #[test]
    fn class_stats_are_sane() {
        for class in ALL_CLASSES {
            let stats = ClassStats::for_class(class);
            assert!(stats.max_hp > 0.0);
            assert!(stats.speed > 0.0);
            assert!(stats.box_w > 0.0 && stats.box_h > 0.0);
        }
    }
}
