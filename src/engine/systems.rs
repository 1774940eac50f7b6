// ECS systems run once per frame by the simulation clock, in this order:
//   locomotion_system → walk_cycle_system
// Both are gated on the avatar having loaded.

use bevy_ecs::prelude::*;
use glam::Vec3;

use super::animation::WalkAnimator;
use super::bounds::BoundingVolumeIndex;
use super::collision::CollisionGate;
use super::components::*;
use super::config::{MovementFrame, SimConfig};
use super::movement::MovementInput;

/// Run condition: the avatar finished loading.
pub fn avatar_ready(status: Res<AssetStatus>) -> bool {
    status.avatar == LoadState::Ready
}

/// Move the avatar (or scroll the world) by the latest input if the
/// candidate position is clear, then apply the input facing regardless.
///
/// The collision test always happens in the environment's own frame,
/// `position - offset`, so both movement frames block at the same walls.
pub fn locomotion_system(
    input: Res<MovementInput>,
    index: Res<BoundingVolumeIndex>,
    config: Res<SimConfig>,
    mut offset: ResMut<EnvironmentOffset>,
    mut stats: ResMut<LocomotionStats>,
    mut avatars: Query<(&mut Transform, &mut Facing, &AvatarBounds), With<Avatar>>,
) {
    let gate = CollisionGate::new(config.collision_pad);
    let vector = input.vector();
    // Screen-relative convention: right on the stick is -x, up is +z.
    let delta = Vec3::new(-vector.x, 0.0, vector.z);

    stats.ticks += 1;

    for (mut transform, mut facing, bounds) in &mut avatars {
        let local_position = transform.position - offset.0;
        let current = bounds.world_box(local_position, facing.0);

        if gate.test(&current, delta, &index) {
            stats.admitted += 1;
            match config.movement_frame {
                MovementFrame::AvatarMoves => transform.position += delta,
                MovementFrame::WorldScrolls => offset.0 -= delta,
            }
        } else {
            stats.blocked += 1;
            log::trace!("move {:?} blocked at {:?}", delta, local_position);
        }

        facing.0 = input.facing();
    }
}

/// Rebuild the limb angles from the current movement state. Avatars with
/// unresolved joints are skipped.
pub fn walk_cycle_system(
    input: Res<MovementInput>,
    mut animator: ResMut<WalkAnimator>,
    mut avatars: Query<(&SkeletonJoints, &mut JointAngles), With<Avatar>>,
) {
    for (joints, mut angles) in &mut avatars {
        if !joints.is_complete() {
            continue;
        }
        *angles = animator.step(input.vector(), input.force());
    }
}
