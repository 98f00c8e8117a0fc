//! Movement integration and axis-aligned collision primitives

use crate::ws::protocol::Facing;

/// Axis-aligned bounding box (min corner + extents, world units)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    /// Build a box from its center point
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x: cx - w * 0.5,
            y: cy - h * 0.5,
            w,
            h,
        }
    }

    /// Grow the box by `pad` on every side
    pub fn expanded(&self, pad: f32) -> Self {
        Self {
            x: self.x - pad,
            y: self.y - pad,
            w: self.w + pad * 2.0,
            h: self.h + pad * 2.0,
        }
    }

    /// Overlap test against another box
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }

    /// Point containment test
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.w && py >= self.y && py <= self.y + self.h
    }
}

/// Convert raw movement axes into a velocity vector.
///
/// Axes are clamped to [-1, 1] (malformed input is clamped, never rejected)
/// and the vector is normalized when its magnitude exceeds 1 so diagonal
/// movement is no faster than cardinal movement.
pub fn velocity_from_axes(move_x: f32, move_y: f32, speed: f32) -> (f32, f32) {
    let mx = move_x.clamp(-1.0, 1.0);
    let my = move_y.clamp(-1.0, 1.0);
    let mag = (mx * mx + my * my).sqrt();
    if mag <= f32::EPSILON {
        return (0.0, 0.0);
    }
    let scale = if mag > 1.0 { speed / mag } else { speed };
    (mx * scale, my * scale)
}

/// Derive a facing from movement axes.
///
/// Returns `None` when there is no movement (facing is unchanged). The axis
/// with the larger magnitude wins; horizontal wins an exact tie.
pub fn facing_from_axes(move_x: f32, move_y: f32) -> Option<Facing> {
    let mx = move_x.clamp(-1.0, 1.0);
    let my = move_y.clamp(-1.0, 1.0);
    if mx == 0.0 && my == 0.0 {
        return None;
    }
    if mx.abs() >= my.abs() && mx != 0.0 {
        Some(if mx < 0.0 { Facing::Left } else { Facing::Right })
    } else {
        Some(if my < 0.0 { Facing::Up } else { Facing::Down })
    }
}

/// Facing direction as an angle in radians (y axis points down)
pub fn facing_angle(facing: Facing) -> f32 {
    match facing {
        Facing::Right => 0.0,
        Facing::Down => std::f32::consts::FRAC_PI_2,
        Facing::Left => std::f32::consts::PI,
        Facing::Up => -std::f32::consts::FRAC_PI_2,
    }
}

/// Shortest signed angular difference `a - b`, in (-π, π]
pub fn angle_diff(a: f32, b: f32) -> f32 {
    let mut d = (a - b).rem_euclid(std::f32::consts::TAU);
    if d > std::f32::consts::PI {
        d -= std::f32::consts::TAU;
    }
    d
}

/// Clamp a center position so the entity box stays within map bounds
pub fn clamp_to_bounds(
    x: f32,
    y: f32,
    half_w: f32,
    half_h: f32,
    map_w: f32,
    map_h: f32,
) -> (f32, f32) {
    (
        x.clamp(half_w, map_w - half_w),
        y.clamp(half_h, map_h - half_h),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_movement_is_normalized() {
        let (vx, vy) = velocity_from_axes(1.0, 1.0, 100.0);
        let mag = (vx * vx + vy * vy).sqrt();
        assert!((mag - 100.0).abs() < 0.01);
    }

    #[test]
    fn out_of_range_axes_are_clamped() {
        let (vx, vy) = velocity_from_axes(5.0, 0.0, 100.0);
        assert!((vx - 100.0).abs() < 0.01);
        assert_eq!(vy, 0.0);
    }

    #[test]
    fn zero_movement_keeps_facing() {
        assert_eq!(facing_from_axes(0.0, 0.0), None);
    }

    #[test]
    fn larger_axis_wins_facing() {
        assert_eq!(facing_from_axes(0.3, -1.0), Some(Facing::Up));
        assert_eq!(facing_from_axes(-1.0, 0.3), Some(Facing::Left));
    }

    #[test]
    fn horizontal_wins_exact_tie() {
        assert_eq!(facing_from_axes(1.0, 1.0), Some(Facing::Right));
        assert_eq!(facing_from_axes(-1.0, -1.0), Some(Facing::Left));
    }

    #[test]
    fn angle_diff_wraps_shortest_way() {
        let d = angle_diff(3.0, -3.0);
        assert!(d < 0.0, "wrap should go the short way, got {}", d);
        assert!(d.abs() < 0.5);
        assert!((angle_diff(0.5, 0.25) - 0.25).abs() < 1e-5);
    }

    #[test]
    fn aabb_overlap() {
        let a = Aabb::from_center(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::from_center(8.0, 0.0, 10.0, 10.0);
        let c = Aabb::from_center(20.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn bounds_clamp_keeps_box_inside() {
        let (x, y) = clamp_to_bounds(-50.0, 2000.0, 12.0, 12.0, 1536.0, 1536.0);
        assert_eq!(x, 12.0);
        assert_eq!(y, 1536.0 - 12.0);
    }
}
