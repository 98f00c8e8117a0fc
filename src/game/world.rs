//! World layout - generated once at startup, read-only afterwards

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::ws::protocol::{Decoration, DecorationKind, TileRect};

use super::physics::Aabb;

/// Map dimensions in tiles
pub const MAP_TILES_W: i32 = 48;
pub const MAP_TILES_H: i32 = 48;
/// Tile edge length in world units
pub const TILE_SIZE: f32 = 32.0;

/// Number of obstacle rectangles placed during generation
const OBSTACLE_COUNT: usize = 28;
/// Number of cosmetic decorations
const DECORATION_COUNT: usize = 70;

/// Spawn point search parameters
const SPAWN_RETRY_BUDGET: u32 = 32;
const SPAWN_BORDER_MARGIN: f32 = 64.0;
const SPAWN_OBSTACLE_PAD: f32 = 8.0;

/// Immutable world layout: obstacle rectangles and decorations
pub struct World {
    /// Map width in tiles
    pub width: i32,
    /// Map height in tiles
    pub height: i32,
    /// Tile edge length in world units
    pub tile_size: f32,
    /// Blocking rectangles in tile coordinates (wire representation)
    pub obstacles: Vec<TileRect>,
    /// Non-colliding decorations
    pub decorations: Vec<Decoration>,
    /// Obstacles pre-expanded to pixel boxes for collision queries
    colliders: Vec<Aabb>,
}

impl World {
    /// Generate the world layout from a seed
    pub fn generate(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut obstacles = Vec::with_capacity(OBSTACLE_COUNT);
        while obstacles.len() < OBSTACLE_COUNT {
            let w = rng.gen_range(1..=3);
            let h = rng.gen_range(1..=3);
            let rect = TileRect {
                x: rng.gen_range(1..MAP_TILES_W - 1 - w),
                y: rng.gen_range(1..MAP_TILES_H - 1 - h),
                w,
                h,
            };
            obstacles.push(rect);
        }

        let mut decorations = Vec::with_capacity(DECORATION_COUNT);
        for _ in 0..DECORATION_COUNT {
            let kind = match rng.gen_range(0..3) {
                0 => DecorationKind::Grass,
                1 => DecorationKind::Flower,
                _ => DecorationKind::Pebble,
            };
            decorations.push(Decoration {
                kind,
                x: rng.gen_range(0..MAP_TILES_W),
                y: rng.gen_range(0..MAP_TILES_H),
            });
        }

        Self::from_parts(obstacles, decorations)
    }

    pub(crate) fn from_parts(obstacles: Vec<TileRect>, decorations: Vec<Decoration>) -> Self {
        let colliders = obstacles
            .iter()
            .map(|r| Aabb {
                x: r.x as f32 * TILE_SIZE,
                y: r.y as f32 * TILE_SIZE,
                w: r.w as f32 * TILE_SIZE,
                h: r.h as f32 * TILE_SIZE,
            })
            .collect();

        Self {
            width: MAP_TILES_W,
            height: MAP_TILES_H,
            tile_size: TILE_SIZE,
            obstacles,
            decorations,
            colliders,
        }
    }

    /// Map width in world units
    pub fn px_width(&self) -> f32 {
        self.width as f32 * self.tile_size
    }

    /// Map height in world units
    pub fn px_height(&self) -> f32 {
        self.height as f32 * self.tile_size
    }

    /// Whether a box overlaps any obstacle
    pub fn blocked(&self, candidate: &Aabb) -> bool {
        self.colliders.iter().any(|c| c.intersects(candidate))
    }

    /// Find a spawn point for an entity box.
    ///
    /// Samples uniformly inside the bordered play area; accepts the first
    /// candidate whose padded box clears all obstacles. Falls back to the
    /// map center when the retry budget is exhausted, ignoring collision,
    /// so a spawn always succeeds.
    pub fn find_spawn(&self, rng: &mut impl Rng, box_w: f32, box_h: f32) -> (f32, f32) {
        let min_x = SPAWN_BORDER_MARGIN;
        let max_x = self.px_width() - SPAWN_BORDER_MARGIN;
        let min_y = SPAWN_BORDER_MARGIN;
        let max_y = self.px_height() - SPAWN_BORDER_MARGIN;

        for _ in 0..SPAWN_RETRY_BUDGET {
            let x = rng.gen_range(min_x..max_x);
            let y = rng.gen_range(min_y..max_y);
            let candidate = Aabb::from_center(x, y, box_w, box_h).expanded(SPAWN_OBSTACLE_PAD);
            if !self.blocked(&candidate) {
                return (x, y);
            }
        }

        (self.px_width() * 0.5, self.px_height() * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn generation_is_deterministic_for_seed() {
        let a = World::generate(7);
        let b = World::generate(7);
        assert_eq!(a.obstacles, b.obstacles);
    }

    #[test]
    fn blocked_detects_obstacle_overlap() {
        let world = World::from_parts(
            vec![TileRect { x: 4, y: 4, w: 2, h: 2 }],
            Vec::new(),
        );
        let inside = Aabb::from_center(5.0 * TILE_SIZE, 5.0 * TILE_SIZE, 24.0, 24.0);
        let outside = Aabb::from_center(20.0 * TILE_SIZE, 20.0 * TILE_SIZE, 24.0, 24.0);
        assert!(world.blocked(&inside));
        assert!(!world.blocked(&outside));
    }

    #[test]
    fn spawn_avoids_obstacles_on_open_map() {
        let world = World::from_parts(Vec::new(), Vec::new());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (x, y) = world.find_spawn(&mut rng, 24.0, 24.0);
        assert!(x >= SPAWN_BORDER_MARGIN && x <= world.px_width() - SPAWN_BORDER_MARGIN);
        assert!(y >= SPAWN_BORDER_MARGIN && y <= world.px_height() - SPAWN_BORDER_MARGIN);
        assert!(!world.blocked(&Aabb::from_center(x, y, 24.0, 24.0)));
    }

    #[test]
    fn spawn_falls_back_to_map_center_when_everything_is_blocked() {
        // One obstacle covering the whole map exhausts the retry budget
        let world = World::from_parts(
            vec![TileRect {
                x: 0,
                y: 0,
                w: MAP_TILES_W,
                h: MAP_TILES_H,
            }],
            Vec::new(),
        );
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (x, y) = world.find_spawn(&mut rng, 24.0, 24.0);
        assert_eq!(x, world.px_width() * 0.5);
        assert_eq!(y, world.px_height() * 0.5);
    }
}
