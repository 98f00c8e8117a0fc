//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Character classes available in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    /// Sword-and-board melee, shield ability
    Warrior,
    /// Melee bruiser that trades defense for rage
    Berserker,
    /// Durable melee with self-sustain
    Paladin,
    /// High burst melee, vanishes into stealth
    Rogue,
    /// Ranged fan shots and a homing arrow
    Archer,
    /// Ranged caster with blink and a piercing ray
    Mage,
    /// Ranged caster with homing skulls
    Necromancer,
    /// Ranged support, single and area heals
    Cleric,
    /// Shapeshifter with area heals and thorns
    Druid,
}

impl Default for ClassKind {
    fn default() -> Self {
        Self::Warrior
    }
}

/// Cardinal facing direction of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    Up,
    Down,
    Left,
    Right,
}

impl Default for Facing {
    fn default() -> Self {
        Self::Down
    }
}

/// Projectile flavors (rendering plus minor hit-radius differences)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    Bolt,
    Arrow,
    Skull,
    Spark,
    Thorn,
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Request to spawn an entity (idempotent per session)
    Spawn {
        /// Class selection
        class: ClassKind,
        /// Display name shown to other players
        name: String,
    },

    /// Movement/action intent; supersedes any unconsumed prior intent
    Input {
        /// Horizontal movement axis (-1.0 = left, 1.0 = right)
        move_x: f32,
        /// Vertical movement axis (-1.0 = up, 1.0 = down)
        move_y: f32,
        /// Client facing hint (authoritative facing derives from movement)
        facing: Option<Facing>,
        /// Basic attack this tick
        attack: bool,
        /// Ability slot Q
        q: bool,
        /// Ability slot E
        e: bool,
        /// Ability slot X
        x: bool,
    },

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// World layout, sent once per connection
    WorldInfo {
        /// Map width in tiles
        width: i32,
        /// Map height in tiles
        height: i32,
        /// Tile edge length in world units
        tile_size: f32,
        /// Blocking obstacle rectangles (tile coordinates)
        obstacles: Vec<TileRect>,
        /// Non-colliding decorations
        decorations: Vec<Decoration>,
    },

    /// Confirmation of spawn, sent once to the spawning session
    Init {
        /// The session's own entity id
        entity_id: Uuid,
        /// All live entities at spawn time (including the new one)
        entities: Vec<EntityInfo>,
    },

    /// An entity joined the arena
    EntityJoined {
        entity: EntityInfo,
    },

    /// An entity left the arena (disconnect or idle eviction)
    EntityLeft {
        entity_id: Uuid,
    },

    /// Authoritative state snapshot, sent every tick
    Snapshot {
        /// Server timestamp (unix millis)
        t: u64,
        /// All live entities
        entities: Vec<EntitySnapshot>,
        /// All live projectiles
        projectiles: Vec<ProjectileSnapshot>,
    },

    /// Damage landed on this session's entity
    Hit {
        /// Damage amount after modifiers
        amount: f32,
        /// Entity that dealt the damage
        source: Uuid,
    },

    /// This session's entity died
    Died {
        /// Entity that landed the killing blow
        source: Uuid,
    },

    /// An entity respawned
    Respawned {
        entity_id: Uuid,
        x: f32,
        y: f32,
        hp: f32,
    },

    /// The arena is at capacity; the connection will be closed
    ServerFull,

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

/// Entity info for join/init messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityInfo {
    pub id: Uuid,
    pub name: String,
    pub class: ClassKind,
    pub x: f32,
    pub y: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub level: u32,
}

/// Entity state in a snapshot (deliberately minimal: no velocity,
/// cooldowns, or status detail)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: Uuid,
    /// Position X, rounded to integer units
    pub x: i32,
    /// Position Y, rounded to integer units
    pub y: i32,
    pub hp: f32,
    pub max_hp: f32,
    pub class: ClassKind,
    pub xp: u32,
    pub level: u32,
    pub facing: Facing,
}

/// Projectile state in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub id: Uuid,
    pub x: i32,
    pub y: i32,
    pub kind: ProjectileKind,
}

/// Axis-aligned rectangle in tile coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRect {
    /// Top-left tile X
    pub x: i32,
    /// Top-left tile Y
    pub y: i32,
    /// Span in tiles, horizontal
    pub w: i32,
    /// Span in tiles, vertical
    pub h: i32,
}

/// Purely cosmetic world feature
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Decoration {
    pub kind: DecorationKind,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecorationKind {
    Grass,
    Flower,
    Pebble,
}
