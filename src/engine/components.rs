// ECS components and resources that make up the avatar's pose and the
// loaded scene. Each field has exactly one writing system.

use bevy_ecs::prelude::*;
use glam::{Mat4, Vec3};

use super::bounds::Aabb;
use super::scene::{NodeId, SceneGraph};

/// Marks the controllable avatar entity.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Avatar;

/// Position of an entity in 3D space
#[derive(Component, Debug, Clone, Copy)]
pub struct Transform {
    pub position: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self { position }
    }
}

/// Rotation about +Y in radians. Written by the locomotion system every tick.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Facing(pub f32);

/// Avatar mesh bounds at rest pose, relative to the avatar root.
#[derive(Component, Debug, Clone, Copy)]
pub struct AvatarBounds {
    pub local: Aabb,
}

impl AvatarBounds {
    /// Scene-space box with the avatar root at `position` turned by `facing`.
    pub fn world_box(&self, position: Vec3, facing: f32) -> Aabb {
        self.local
            .transformed(&(Mat4::from_translation(position) * Mat4::from_rotation_y(facing)))
    }
}

/// Limb rotations produced by the walk cycle, in radians.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct JointAngles {
    pub left_arm_z: f32,
    pub right_arm_z: f32,
    pub left_up_leg_x: f32,
    pub right_up_leg_x: f32,
    pub left_leg_x: f32,
    pub right_leg_x: f32,
}

pub const LEFT_ARM: &str = "LeftArm";
pub const RIGHT_ARM: &str = "RightArm";
pub const LEFT_UP_LEG: &str = "LeftUpLeg";
pub const RIGHT_UP_LEG: &str = "RightUpLeg";
pub const LEFT_LEG: &str = "LeftLeg";
pub const RIGHT_LEG: &str = "RightLeg";

/// Handles to the six animated joints, looked up once when the avatar loads.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct SkeletonJoints {
    pub left_arm: Option<NodeId>,
    pub right_arm: Option<NodeId>,
    pub left_up_leg: Option<NodeId>,
    pub right_up_leg: Option<NodeId>,
    pub left_leg: Option<NodeId>,
    pub right_leg: Option<NodeId>,
}

impl SkeletonJoints {
    pub fn resolve(graph: &SceneGraph) -> Self {
        Self {
            left_arm: graph.node_by_name(LEFT_ARM),
            right_arm: graph.node_by_name(RIGHT_ARM),
            left_up_leg: graph.node_by_name(LEFT_UP_LEG),
            right_up_leg: graph.node_by_name(RIGHT_UP_LEG),
            left_leg: graph.node_by_name(LEFT_LEG),
            right_leg: graph.node_by_name(RIGHT_LEG),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    pub fn missing(&self) -> Vec<&'static str> {
        [
            (LEFT_ARM, self.left_arm),
            (RIGHT_ARM, self.right_arm),
            (LEFT_UP_LEG, self.left_up_leg),
            (RIGHT_UP_LEG, self.right_up_leg),
            (LEFT_LEG, self.left_leg),
            (RIGHT_LEG, self.right_leg),
        ]
        .into_iter()
        .filter(|(_, handle)| handle.is_none())
        .map(|(name, _)| name)
        .collect()
    }

    /// Euler override `(x, z)` for a node, if it is one of the animated joints.
    pub fn pose_for(&self, id: NodeId, angles: &JointAngles) -> Option<(Option<f32>, Option<f32>)> {
        let x = |a: f32| Some((Some(a), None));
        let z = |a: f32| Some((None, Some(a)));
        match Some(id) {
            i if i == self.left_arm => z(angles.left_arm_z),
            i if i == self.right_arm => z(angles.right_arm_z),
            i if i == self.left_up_leg => x(angles.left_up_leg_x),
            i if i == self.right_up_leg => x(angles.right_up_leg_x),
            i if i == self.left_leg => x(angles.left_leg_x),
            i if i == self.right_leg => x(angles.right_leg_x),
            _ => None,
        }
    }
}

/// Translation applied to the whole environment. Only moves when the
/// world scrolls under a stationary avatar.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct EnvironmentOffset(pub Vec3);

/// Loaded avatar model, kept for rendering.
#[derive(Resource, Debug, Clone)]
pub struct AvatarModel(pub SceneGraph);

/// Loaded environment model, kept for rendering.
#[derive(Resource, Debug, Clone)]
pub struct EnvironmentModel(pub SceneGraph);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Pending,
    Ready,
    /// Terminal. The feature stays disabled for the rest of the run.
    Failed,
}

#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct AssetStatus {
    pub avatar: LoadState,
    pub environment: LoadState,
}

/// Per-run tallies shown in the debug overlay.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct LocomotionStats {
    pub ticks: u64,
    pub admitted: u64,
    pub blocked: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_joints_are_reported_by_name() {
        let mut g = SceneGraph::new();
        g.add_node(LEFT_ARM, None, Vec3::ZERO);
        g.add_node(RIGHT_ARM, None, Vec3::ZERO);
        let joints = SkeletonJoints::resolve(&g);
        assert!(!joints.is_complete());
        assert_eq!(joints.missing(), vec![LEFT_UP_LEG, RIGHT_UP_LEG, LEFT_LEG, RIGHT_LEG]);
    }

    #[test]
    fn pose_for_maps_joint_to_axis() {
        let joints = SkeletonJoints {
            left_arm: Some(1),
            right_arm: Some(2),
            left_up_leg: Some(3),
            right_up_leg: Some(4),
            left_leg: Some(5),
            right_leg: Some(6),
        };
        let angles = JointAngles { left_arm_z: 0.3, left_leg_x: -0.2, ..Default::default() };
        assert_eq!(joints.pose_for(1, &angles), Some((None, Some(0.3))));
        assert_eq!(joints.pose_for(5, &angles), Some((Some(-0.2), None)));
        assert_eq!(joints.pose_for(0, &angles), None);
    }

    #[test]
    fn world_box_turns_with_facing() {
        let bounds = AvatarBounds {
            local: Aabb::new(Vec3::new(-0.5, 0.0, -0.1), Vec3::new(0.5, 2.0, 0.1)),
        };
        let b = bounds.world_box(Vec3::new(3.0, 0.5, 0.0), std::f32::consts::FRAC_PI_2);
        assert!(b.min.abs_diff_eq(Vec3::new(2.9, 0.5, -0.5), 1e-5), "{:?}", b);
        assert!(b.max.abs_diff_eq(Vec3::new(3.1, 2.5, 0.5), 1e-5), "{:?}", b);
    }
}
