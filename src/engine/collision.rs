// Admission test for a proposed avatar move.
//
// Discrete end-position check against the static occluder boxes. The swept
// path is not tested; the per-tick step is bounded by MAX_FORCE * STEP_SCALE.

use glam::Vec3;

use super::bounds::{Aabb, BoundingVolumeIndex};

#[derive(Debug, Clone, Copy)]
pub struct CollisionGate {
    /// Added to the query box's `min.y` only, so the test covers the lower
    /// body rather than the full height.
    pub pad: f32,
}

impl CollisionGate {
    pub fn new(pad: f32) -> Self {
        Self { pad }
    }

    /// Query box for a move of `delta` from an avatar currently occupying
    /// `avatar_box`.
    pub fn query_box(&self, avatar_box: &Aabb, delta: Vec3) -> Aabb {
        let mut query = avatar_box.translated(Vec3::new(delta.x, 0.0, delta.z));
        query.min.y += delta.y + self.pad;
        query.max.y += delta.y;
        query
    }

    /// True if the move is allowed. An empty index admits everything.
    pub fn test(&self, avatar_box: &Aabb, delta: Vec3, index: &BoundingVolumeIndex) -> bool {
        !index.intersects_any(&self.query_box(avatar_box, delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::COLLISION_PAD;

    fn avatar_box() -> Aabb {
        Aabb::new(Vec3::new(-0.3, 0.5, -0.2), Vec3::new(0.3, 2.3, 0.2))
    }

    fn tower(center_x: f32) -> (&'static str, Aabb) {
        ("Tower", Aabb::new(Vec3::new(center_x - 1.0, 0.0, -1.0), Vec3::new(center_x + 1.0, 30.0, 1.0)))
    }

    #[test]
    fn query_box_shifts_and_pads() {
        let gate = CollisionGate::new(COLLISION_PAD);
        let q = gate.query_box(&avatar_box(), Vec3::new(1.0, 0.25, -2.0));
        assert!(q.min.abs_diff_eq(Vec3::new(0.7, 16.75, -2.2), 1e-5), "{:?}", q.min);
        assert!(q.max.abs_diff_eq(Vec3::new(1.3, 2.55, -1.8), 1e-5), "{:?}", q.max);
    }

    #[test]
    fn overlapping_candidate_is_rejected() {
        let gate = CollisionGate::new(COLLISION_PAD);
        let index = BoundingVolumeIndex::build([tower(0.0)], "Floor");
        assert!(!gate.test(&avatar_box(), Vec3::new(0.02, 0.0, 0.0), &index));
    }

    #[test]
    fn clear_candidate_is_admitted() {
        let gate = CollisionGate::new(COLLISION_PAD);
        let index = BoundingVolumeIndex::build([tower(10.0), tower(-10.0)], "Floor");
        assert!(gate.test(&avatar_box(), Vec3::new(0.062, 0.0, 0.0), &index));
    }

    #[test]
    fn candidate_position_decides_not_current() {
        let gate = CollisionGate::new(0.0);
        // Tower face sits 0.05 to the right of the avatar.
        let index = BoundingVolumeIndex::build(
            [("Wall", Aabb::new(Vec3::new(0.35, 0.0, -1.0), Vec3::new(2.0, 3.0, 1.0)))],
            "Floor",
        );
        assert!(gate.test(&avatar_box(), Vec3::new(0.02, 0.0, 0.0), &index));
        assert!(!gate.test(&avatar_box(), Vec3::new(0.06, 0.0, 0.0), &index));
        assert!(gate.test(&avatar_box(), Vec3::new(-0.06, 0.0, 0.0), &index));
    }

    #[test]
    fn pad_ignores_short_obstacles() {
        // A kerb 1 unit tall never reaches the padded bottom of the query box.
        let gate = CollisionGate::new(COLLISION_PAD);
        let index = BoundingVolumeIndex::build(
            [("Kerb", Aabb::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 1.0, 1.0)))],
            "Floor",
        );
        assert!(gate.test(&avatar_box(), Vec3::ZERO, &index));
        assert!(!CollisionGate::new(0.0).test(&avatar_box(), Vec3::ZERO, &index));
    }

    #[test]
    fn empty_index_always_admits() {
        let gate = CollisionGate::new(COLLISION_PAD);
        let index = BoundingVolumeIndex::default();
        for dx in [-1.0, 0.0, 0.5, 100.0] {
            assert!(gate.test(&avatar_box(), Vec3::new(dx, 0.0, dx), &index));
        }
    }
}
