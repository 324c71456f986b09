//! Collision detection and response
//!
//! Two flavours: in-lane contacts (1D, ordered, no passing) and free-roam
//! box contacts (2D, least-penetration axis, impulse with restitution).

use glam::Vec2;

use super::free::FreeEntity;
use super::lane::LaneEntity;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Separation axis, pointing from the first body toward the second
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Gap between a leading and a trailing entity in the same lane
///
/// Negative when they overlap.
#[inline]
pub fn lane_gap(front: &LaneEntity, back: &LaneEntity) -> f32 {
    if front.dir > 0.0 {
        front.pos.x - (back.pos.x + back.size)
    } else {
        back.pos.x - (front.pos.x + front.size)
    }
}

/// Enforce the minimum gap between two lane neighbours
///
/// The trailing entity is moved flush behind the leader plus `min_gap`. If it was
/// closing in, `share` of the closing speed is split evenly between both; in
/// every case the trailer ends up no faster than the leader along the lane.
/// Returns true when a correction was applied.
pub fn resolve_lane_pair(front: &mut LaneEntity, back: &mut LaneEntity, min_gap: f32, share: f32) -> bool {
    if lane_gap(front, back) >= min_gap {
        return false;
    }

    let dir = front.dir;
    back.pos.x = if dir > 0.0 {
        front.pos.x - min_gap - back.size
    } else {
        front.pos.x + front.size + min_gap
    };

    // Speeds measured along the direction of travel
    let lead = front.vx * dir;
    let trail = back.vx * dir;
    if trail > lead {
        let transfer = (trail - lead) * share * 0.5;
        let lead = lead + transfer;
        let trail = (trail - transfer).min(lead);
        front.vx = lead * dir;
        back.vx = trail * dir;
    } else {
        back.vx = front.vx;
    }
    true
}

/// Overlap test between two axis-aligned squares given by center and half extent
///
/// `buffer` inflates the combined extent on both axes.
pub fn box_overlap(center_a: Vec2, half_a: f32, center_b: Vec2, half_b: f32, buffer: f32) -> CollisionResult {
    let delta = center_b - center_a;
    let reach = half_a + half_b + buffer;
    let overlap_x = reach - delta.x.abs();
    let overlap_y = reach - delta.y.abs();

    if overlap_x <= 0.0 || overlap_y <= 0.0 {
        return CollisionResult::miss();
    }

    let (normal, penetration) = if overlap_x < overlap_y {
        (Vec2::new(axis_sign(delta.x), 0.0), overlap_x)
    } else {
        (Vec2::new(0.0, axis_sign(delta.y)), overlap_y)
    };

    CollisionResult {
        hit: true,
        normal,
        penetration,
    }
}

#[inline]
fn axis_sign(v: f32) -> f32 {
    if v < 0.0 { -1.0 } else { 1.0 }
}

/// Separate two free-roam entities and exchange an impulse if they approach
///
/// Position correction is split by inverse mass (heavier moves less). The
/// impulse uses `restitution` in [0, 1], so the separation speed afterwards
/// never exceeds the approach speed.
pub fn resolve_free_pair(a: &mut FreeEntity, b: &mut FreeEntity, buffer: f32, restitution: f32) -> CollisionResult {
    let result = box_overlap(a.center(), a.size * 0.5, b.center(), b.size * 0.5, buffer);
    if !result.hit {
        return result;
    }

    let total_inv_mass = a.inv_mass + b.inv_mass;
    if total_inv_mass <= 0.0 {
        return result;
    }

    a.pos -= result.normal * result.penetration * (a.inv_mass / total_inv_mass);
    b.pos += result.normal * result.penetration * (b.inv_mass / total_inv_mass);

    let closing = (b.vel - a.vel).dot(result.normal);
    if closing < 0.0 {
        let j = -(1.0 + restitution) * closing / total_inv_mass;
        a.vel -= result.normal * j * a.inv_mass;
        b.vel += result.normal * j * b.inv_mass;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::content::ContentItem;
    use crate::sim::free::inverse_mass_for;

    fn lane_entity(id: u32, x: f32, size: f32, vx: f32, dir: f32) -> LaneEntity {
        LaneEntity {
            id,
            lane: if dir > 0.0 { 0 } else { 1 },
            dir,
            pos: Vec2::new(x, 24.0),
            size,
            base_vx: vx,
            vx,
            content: ContentItem::new(format!("c{id}"), "img"),
        }
    }

    fn free_entity(id: u32, pos: Vec2, size: f32, vel: Vec2) -> FreeEntity {
        FreeEntity {
            id,
            pos,
            vel,
            size,
            rotation: 0.0,
            spin: 0.0,
            inv_mass: inverse_mass_for(size),
            content: ContentItem::new(format!("f{id}"), "img"),
        }
    }

    #[test]
    fn test_lane_pair_tailgater_is_pushed_back_and_slowed() {
        // Trailer 5 px behind, twice as fast
        let mut front = lane_entity(1, 200.0, 100.0, 1.0, 1.0);
        let mut back = lane_entity(2, 95.0, 100.0, 2.0, 1.0);
        assert!((lane_gap(&front, &back) - 5.0).abs() < 1e-4);

        assert!(resolve_lane_pair(&mut front, &mut back, 24.0, 1.0));
        assert!(lane_gap(&front, &back) >= 24.0 - 1e-3);
        assert!(back.vx <= front.vx + 1e-6);
    }

    #[test]
    fn test_lane_pair_leftward_lane() {
        // Moving left: the leader has the smaller x
        let mut front = lane_entity(1, 100.0, 80.0, -1.0, -1.0);
        let mut back = lane_entity(2, 170.0, 80.0, -1.5, -1.0);
        assert!(resolve_lane_pair(&mut front, &mut back, 24.0, 0.5));
        assert!((back.pos.x - 204.0).abs() < 1e-3);
        // Trailer no faster along the lane than the leader
        assert!(back.vx * -1.0 <= front.vx * -1.0 + 1e-6);
    }

    #[test]
    fn test_lane_pair_slow_trailer_matches_leader() {
        let mut front = lane_entity(1, 200.0, 100.0, 1.5, 1.0);
        let mut back = lane_entity(2, 90.0, 100.0, 0.7, 1.0);
        assert!(resolve_lane_pair(&mut front, &mut back, 24.0, 1.0));
        assert_eq!(back.vx, front.vx);
        assert_eq!(front.vx, 1.5);
    }

    #[test]
    fn test_lane_pair_with_room_is_untouched() {
        let mut front = lane_entity(1, 300.0, 100.0, 1.0, 1.0);
        let mut back = lane_entity(2, 100.0, 100.0, 2.0, 1.0);
        assert!(!resolve_lane_pair(&mut front, &mut back, 24.0, 1.0));
        assert_eq!(back.pos.x, 100.0);
        assert_eq!(back.vx, 2.0);
    }

    #[test]
    fn test_box_overlap_picks_least_penetration_axis() {
        let result = box_overlap(Vec2::ZERO, 10.0, Vec2::new(18.0, 2.0), 10.0, 0.0);
        assert!(result.hit);
        assert_eq!(result.normal, Vec2::new(1.0, 0.0));
        assert!((result.penetration - 2.0).abs() < 1e-5);

        let result = box_overlap(Vec2::ZERO, 10.0, Vec2::new(1.0, -19.0), 10.0, 0.0);
        assert_eq!(result.normal, Vec2::new(0.0, -1.0));
    }

    #[test]
    fn test_box_overlap_buffer_inflates() {
        assert!(!box_overlap(Vec2::ZERO, 10.0, Vec2::new(22.0, 0.0), 10.0, 0.0).hit);
        assert!(box_overlap(Vec2::ZERO, 10.0, Vec2::new(22.0, 0.0), 10.0, 4.0).hit);
    }

    #[test]
    fn test_free_pair_heavier_moves_less() {
        let mut small = free_entity(1, Vec2::new(0.0, 0.0), 20.0, Vec2::ZERO);
        let mut big = free_entity(2, Vec2::new(15.0, 0.0), 60.0, Vec2::ZERO);
        let small_before = small.pos;
        let big_before = big.pos;

        let result = resolve_free_pair(&mut small, &mut big, 0.0, 1.0);
        assert!(result.hit);
        let small_moved = (small.pos - small_before).length();
        let big_moved = (big.pos - big_before).length();
        assert!(small_moved > big_moved);
        assert!(big.center().x - small.center().x >= 40.0 - 1e-3);
    }

    #[test]
    fn test_free_pair_head_on_bounce() {
        let mut a = free_entity(1, Vec2::new(0.0, 0.0), 40.0, Vec2::new(1.0, 0.0));
        let mut b = free_entity(2, Vec2::new(38.0, 0.0), 40.0, Vec2::new(-1.0, 0.0));

        resolve_free_pair(&mut a, &mut b, 0.0, 1.0);
        // Equal masses, perfectly elastic: velocities swap
        assert!((a.vel.x + 1.0).abs() < 1e-5);
        assert!((b.vel.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_free_pair_separating_keeps_velocity() {
        let mut a = free_entity(1, Vec2::new(0.0, 0.0), 40.0, Vec2::new(-1.0, 0.0));
        let mut b = free_entity(2, Vec2::new(38.0, 0.0), 40.0, Vec2::new(1.0, 0.0));
        resolve_free_pair(&mut a, &mut b, 0.0, 1.0);
        assert_eq!(a.vel, Vec2::new(-1.0, 0.0));
        assert_eq!(b.vel, Vec2::new(1.0, 0.0));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn impulse_never_increases_approach_speed(
                ax in -50.0f32..50.0, ay in -50.0f32..50.0,
                bx in -50.0f32..50.0, by in -50.0f32..50.0,
                sa in 10.0f32..90.0, sb in 10.0f32..90.0,
                vax in -3.0f32..3.0, vay in -3.0f32..3.0,
                vbx in -3.0f32..3.0, vby in -3.0f32..3.0,
                restitution in 0.0f32..=1.0,
            ) {
                let mut a = free_entity(1, Vec2::new(ax, ay), sa, Vec2::new(vax, vay));
                let mut b = free_entity(2, Vec2::new(bx, by), sb, Vec2::new(vbx, vby));
                let before_a = a.vel;
                let before_b = b.vel;
                let result = resolve_free_pair(&mut a, &mut b, 4.0, restitution);
                if result.hit {
                    let n = result.normal;
                    let before = (before_b - before_a).dot(n);
                    let after = (b.vel - a.vel).dot(n);
                    // Separation speed after is bounded by approach speed before
                    prop_assert!(after.abs() <= before.abs() + 1e-3);
                    // Never left approaching
                    prop_assert!(after >= -1e-3 || before >= 0.0);
                }
            }

            #[test]
            fn lane_pair_leaves_min_gap(
                front_x in 0.0f32..600.0,
                back_offset in -200.0f32..200.0,
                size_f in 80.0f32..140.0, size_b in 80.0f32..140.0,
                vf in 0.1f32..2.0, vb in 0.1f32..3.0,
                rightward in any::<bool>(),
                share in 0.0f32..=1.0,
            ) {
                let dir = if rightward { 1.0 } else { -1.0 };
                let mut front = lane_entity(1, front_x, size_f, vf * dir, dir);
                let mut back = lane_entity(2, front_x - back_offset * dir, size_b, vb * dir, dir);
                resolve_lane_pair(&mut front, &mut back, 24.0, share);
                prop_assert!(lane_gap(&front, &back) >= 24.0 - 1e-3);
            }
        }
    }
}
