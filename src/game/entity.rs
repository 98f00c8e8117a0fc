//! Entity state: health, cooldowns, experience, timed status effects

use uuid::Uuid;

use crate::ws::protocol::{ClassKind, Facing};

use super::classes::ClassStats;
use super::physics::Aabb;

/// Experience required per level
pub const XP_PER_LEVEL: u32 = 100;
/// Max-hp gained per level
pub const LEVEL_HP_BONUS: f32 = 2.0;
/// Flat damage gained per level
pub const LEVEL_DAMAGE_BONUS: f32 = 1.0;
/// Health restored on level-up (clamped to the new max)
pub const LEVEL_HEAL: f32 = 4.0;

/// Fraction of incoming damage let through by an active shield
pub const SHIELD_ABSORB: f32 = 0.5;
/// Movement speed multiplier while hasted
pub const HASTE_SPEED_MULT: f32 = 1.5;
/// Damage multiplier while enraged
pub const RAGE_DAMAGE_MULT: f32 = 1.5;
/// Movement speed multiplier while transformed
pub const TRANSFORM_SPEED_MULT: f32 = 1.2;
/// Flat damage bonus while transformed
pub const TRANSFORM_DAMAGE_BONUS: f32 = 1.0;

/// Timed status modifier kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    /// Incoming damage halved
    Shield,
    /// Movement speed increased
    Haste,
    /// Hidden from other players (presentation concern)
    Invisibility,
    /// Outgoing damage increased
    Rage,
    /// Shapeshifted: faster and slightly harder-hitting
    Transformed,
}

/// A status effect with an absolute expiry timestamp (unix millis)
#[derive(Debug, Clone, Copy)]
pub struct StatusEffect {
    pub kind: EffectKind,
    pub expires_at: u64,
}

/// The four action slots every class binds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionSlot {
    Basic,
    Q,
    E,
    X,
}

impl ActionSlot {
    pub const ALL: [ActionSlot; 4] = [ActionSlot::Basic, ActionSlot::Q, ActionSlot::E, ActionSlot::X];

    pub fn index(self) -> usize {
        match self {
            ActionSlot::Basic => 0,
            ActionSlot::Q => 1,
            ActionSlot::E => 2,
            ActionSlot::X => 3,
        }
    }
}

/// A player-controlled entity (authoritative state)
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: Uuid,
    /// Owning session
    pub session_id: Uuid,
    pub name: String,
    pub class: ClassKind,

    // Position and movement
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub facing: Facing,
    base_speed: f32,

    // Combat
    pub hp: f32,
    pub max_hp: f32,
    /// Cooldown remaining per action slot (basic, Q, E, X), seconds
    pub cooldowns: [f32; 4],
    pub effects: Vec<StatusEffect>,

    // Progression
    pub xp: u32,
    pub level: u32,
    pub bonus_damage: f32,

    // Lifecycle
    pub alive: bool,
    /// When a dead entity comes back (unix millis, meaningful while dead)
    pub respawn_at: u64,
    /// Last intent received, for idle eviction
    pub last_input_at: u64,
}

impl Entity {
    pub fn new(
        id: Uuid,
        session_id: Uuid,
        name: String,
        class: ClassKind,
        x: f32,
        y: f32,
        now: u64,
    ) -> Self {
        let stats = ClassStats::for_class(class);
        Self {
            id,
            session_id,
            name,
            class,
            x,
            y,
            w: stats.box_w,
            h: stats.box_h,
            vel_x: 0.0,
            vel_y: 0.0,
            facing: Facing::default(),
            base_speed: stats.speed,
            hp: stats.max_hp,
            max_hp: stats.max_hp,
            cooldowns: [0.0; 4],
            effects: Vec::new(),
            xp: 0,
            level: 1,
            bonus_damage: 0.0,
            alive: true,
            respawn_at: 0,
            last_input_at: now,
        }
    }

    /// Collision box at the current position
    pub fn collider(&self) -> Aabb {
        Aabb::from_center(self.x, self.y, self.w, self.h)
    }

    pub fn has_effect(&self, kind: EffectKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    /// Add a status effect, refreshing the expiry if already active
    pub fn apply_effect(&mut self, kind: EffectKind, expires_at: u64) {
        if let Some(existing) = self.effects.iter_mut().find(|e| e.kind == kind) {
            existing.expires_at = existing.expires_at.max(expires_at);
        } else {
            self.effects.push(StatusEffect { kind, expires_at });
        }
    }

    /// Drop effects whose expiry has passed
    pub fn expire_effects(&mut self, now: u64) {
        self.effects.retain(|e| e.expires_at > now);
    }

    /// Movement speed after active status modifiers
    pub fn effective_speed(&self) -> f32 {
        let mut speed = self.base_speed;
        if self.has_effect(EffectKind::Haste) {
            speed *= HASTE_SPEED_MULT;
        }
        if self.has_effect(EffectKind::Transformed) {
            speed *= TRANSFORM_SPEED_MULT;
        }
        speed
    }

    /// Flat bonus and multiplier applied to outgoing base damage
    pub fn damage_mods(&self) -> (f32, f32) {
        let mut add = self.bonus_damage;
        let mut mult = 1.0;
        if self.has_effect(EffectKind::Transformed) {
            add += TRANSFORM_DAMAGE_BONUS;
        }
        if self.has_effect(EffectKind::Rage) {
            mult *= RAGE_DAMAGE_MULT;
        }
        (add, mult)
    }

    /// Outgoing damage for a base amount, after modifiers
    pub fn attack_damage(&self, base: f32) -> f32 {
        let (add, mult) = self.damage_mods();
        (base + add) * mult
    }

    /// Raise hp, clamped to the maximum
    pub fn heal(&mut self, amount: f32) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    /// Award experience and recompute the level (monotonic in xp).
    /// Each level gained raises max hp and damage and tops up health.
    pub fn grant_xp(&mut self, amount: u32) {
        self.xp += amount;
        let target = self.xp / XP_PER_LEVEL + 1;
        while self.level < target {
            self.level += 1;
            self.max_hp += LEVEL_HP_BONUS;
            self.bonus_damage += LEVEL_DAMAGE_BONUS;
            self.heal(LEVEL_HEAL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_entity() -> Entity {
        Entity::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "tester".to_string(),
            ClassKind::Warrior,
            100.0,
            100.0,
            0,
        )
    }

    #[test]
    fn xp_levels_are_monotonic() {
        let mut e = test_entity();
        let base_max = e.max_hp;
        assert_eq!(e.level, 1);

        e.grant_xp(XP_PER_LEVEL);
        assert_eq!(e.level, 2);
        assert_eq!(e.max_hp, base_max + LEVEL_HP_BONUS);
        assert_eq!(e.bonus_damage, LEVEL_DAMAGE_BONUS);

        // Four kills' worth at once jumps straight to the computed level
        e.grant_xp(XP_PER_LEVEL * 3);
        assert_eq!(e.level, 5);
        assert_eq!(e.max_hp, base_max + 4.0 * LEVEL_HP_BONUS);
    }

    #[test]
    fn level_heal_never_exceeds_max() {
        let mut e = test_entity();
        e.hp = e.max_hp;
        e.grant_xp(XP_PER_LEVEL);
        assert!(e.hp <= e.max_hp);
    }

    #[test]
    fn effect_refresh_extends_expiry() {
        let mut e = test_entity();
        e.apply_effect(EffectKind::Haste, 1_000);
        e.apply_effect(EffectKind::Haste, 2_000);
        assert_eq!(e.effects.len(), 1);
        assert_eq!(e.effects[0].expires_at, 2_000);

        e.expire_effects(1_500);
        assert!(e.has_effect(EffectKind::Haste));
        e.expire_effects(2_000);
        assert!(!e.has_effect(EffectKind::Haste));
    }

    #[test]
    fn status_modifiers_revert_on_expiry() {
        let mut e = test_entity();
        let base = e.effective_speed();
        e.apply_effect(EffectKind::Haste, 1_000);
        assert!(e.effective_speed() > base);
        e.expire_effects(1_001);
        assert_eq!(e.effective_speed(), base);
    }

    #[test]
    fn rage_scales_attack_damage() {
        let mut e = test_entity();
        assert_eq!(e.attack_damage(4.0), 4.0);
        e.apply_effect(EffectKind::Rage, 1_000);
        assert_eq!(e.attack_damage(4.0), 4.0 * RAGE_DAMAGE_MULT);
    }
}
