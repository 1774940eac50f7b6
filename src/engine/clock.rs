// Per-frame simulation driver.
//
// Owns the ECS world and a fixed schedule: locomotion, then walk cycle.
// Between ticks it accepts input samples and asset completion events; the
// renderer reads a pose snapshot after each tick. One tick per rendered frame,
// no delta-time scaling.

use bevy_ecs::prelude::*;
use glam::Vec3;

use super::animation::{WalkAnimator, WalkState};
use super::assets::{AssetKind, LoadEvent};
use super::bounds::{Aabb, BoundingVolumeIndex};
use super::components::*;
use super::config::SimConfig;
use super::movement::{DirectionalSample, MovementInput, MovementVector};
use super::scene::SceneGraph;
use super::systems::{avatar_ready, locomotion_system, walk_cycle_system};

/// Read-only view of the avatar handed to the render step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvatarPose {
    pub position: Vec3,
    pub facing: f32,
    pub joints: JointAngles,
}

pub struct SimulationClock {
    world: World,
    schedule: Schedule,
}

impl SimulationClock {
    pub fn new(config: SimConfig) -> Self {
        let mut world = World::new();
        world.insert_resource(MovementInput::new(config.max_force, config.step_scale));
        world.insert_resource(WalkAnimator::new(config.phase_rate));
        world.insert_resource(config);
        world.insert_resource(BoundingVolumeIndex::default());
        world.insert_resource(EnvironmentOffset::default());
        world.insert_resource(AssetStatus::default());
        world.insert_resource(LocomotionStats::default());

        let mut schedule = Schedule::default();
        schedule.add_systems((locomotion_system, walk_cycle_system).chain().run_if(avatar_ready));

        Self { world, schedule }
    }

    // ------------------------------------------------------------------------
    // Events between ticks
    // ------------------------------------------------------------------------

    pub fn on_move(&mut self, sample: DirectionalSample) {
        self.world.resource_mut::<MovementInput>().on_move(sample);
    }

    pub fn on_release(&mut self) {
        self.world.resource_mut::<MovementInput>().on_release();
    }

    /// Apply a finished load. Each asset transitions out of `Pending` once;
    /// later events for the same asset are ignored.
    pub fn apply_load(&mut self, event: LoadEvent) {
        let status = *self.world.resource::<AssetStatus>();
        let current = match event.kind {
            AssetKind::Avatar => status.avatar,
            AssetKind::Environment => status.environment,
        };
        if current != LoadState::Pending {
            log::warn!("ignoring repeated {:?} load event", event.kind);
            return;
        }

        let next = match (event.kind, event.result) {
            (AssetKind::Avatar, Ok(graph)) => {
                self.spawn_avatar(graph);
                LoadState::Ready
            }
            (AssetKind::Environment, Ok(graph)) => {
                self.install_environment(graph);
                LoadState::Ready
            }
            (kind, Err(e)) => {
                log::error!("{:?} failed to load, disabled for this run: {}", kind, e);
                LoadState::Failed
            }
        };

        let mut status = self.world.resource_mut::<AssetStatus>();
        match event.kind {
            AssetKind::Avatar => status.avatar = next,
            AssetKind::Environment => status.environment = next,
        }
    }

    fn spawn_avatar(&mut self, graph: SceneGraph) {
        let joints = SkeletonJoints::resolve(&graph);
        if !joints.is_complete() {
            log::warn!("avatar is missing joints {:?}; walk cycle disabled", joints.missing());
        }

        let local = graph.bounds().unwrap_or_else(|| {
            log::warn!("avatar has no meshes; colliding as a point");
            Aabb::new(Vec3::ZERO, Vec3::ZERO)
        });

        let spawn_height = self.world.resource::<SimConfig>().spawn_height;
        let facing = self.world.resource::<MovementInput>().facing();
        self.world.spawn((
            Avatar,
            Transform::from_position(Vec3::new(0.0, spawn_height, 0.0)),
            Facing(facing),
            AvatarBounds { local },
            joints,
            JointAngles::default(),
        ));
        self.world.insert_resource(AvatarModel(graph));
        log::info!("avatar ready");
    }

    fn install_environment(&mut self, graph: SceneGraph) {
        let floor = self.world.resource::<SimConfig>().floor_mesh_name.clone();
        let index = BoundingVolumeIndex::build(
            graph.meshes().iter().map(|m| (m.name, m.world_bounds)),
            &floor,
        );
        log::info!("environment ready: {} occluders", index.len());
        self.world.insert_resource(index);
        self.world.insert_resource(EnvironmentModel(graph));
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    pub fn tick(&mut self) {
        self.schedule.run(&mut self.world);
    }

    // ------------------------------------------------------------------------
    // Read-only views
    // ------------------------------------------------------------------------

    /// `None` until the avatar has loaded.
    pub fn pose(&mut self) -> Option<AvatarPose> {
        let mut query = self
            .world
            .query_filtered::<(&Transform, &Facing, &JointAngles), With<Avatar>>();
        query.iter(&self.world).next().map(|(t, f, j)| AvatarPose {
            position: t.position,
            facing: f.0,
            joints: *j,
        })
    }

    /// Joint handles of the loaded avatar.
    pub fn skeleton(&mut self) -> Option<SkeletonJoints> {
        let mut query = self.world.query_filtered::<&SkeletonJoints, With<Avatar>>();
        query.iter(&self.world).next().copied()
    }

    pub fn environment_offset(&self) -> Vec3 {
        self.world.resource::<EnvironmentOffset>().0
    }

    pub fn avatar_model(&self) -> Option<&SceneGraph> {
        self.world.get_resource::<AvatarModel>().map(|m| &m.0)
    }

    pub fn environment_model(&self) -> Option<&SceneGraph> {
        self.world.get_resource::<EnvironmentModel>().map(|m| &m.0)
    }

    pub fn index(&self) -> &BoundingVolumeIndex {
        self.world.resource::<BoundingVolumeIndex>()
    }

    pub fn status(&self) -> AssetStatus {
        *self.world.resource::<AssetStatus>()
    }

    pub fn stats(&self) -> LocomotionStats {
        *self.world.resource::<LocomotionStats>()
    }

    pub fn movement(&self) -> (MovementVector, f32) {
        let input = self.world.resource::<MovementInput>();
        (input.vector(), input.force())
    }

    pub fn walk(&self) -> (WalkState, f32) {
        let animator = self.world.resource::<WalkAnimator>();
        (animator.state(), animator.phase())
    }

    pub fn config(&self) -> &SimConfig {
        self.world.resource::<SimConfig>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::{AssetError, procedural_humanoid};
    use crate::engine::config::MovementFrame;
    use std::f32::consts::FRAC_PI_2;
    use std::path::PathBuf;

    fn ready_event(kind: AssetKind, graph: SceneGraph) -> LoadEvent {
        LoadEvent { kind, result: Ok(graph) }
    }

    fn failed_event(kind: AssetKind) -> LoadEvent {
        LoadEvent { kind, result: Err(AssetError::EmptyScene(PathBuf::from("broken.glb"))) }
    }

    /// Floor plus a tower that swallows the spawn point, and nothing else.
    fn walled_in() -> SceneGraph {
        let mut g = SceneGraph::new();
        g.add_mesh("Floor", None, Vec3::ZERO, Aabb::new(Vec3::splat(-50.0), Vec3::new(50.0, 0.0, 50.0)), [0.3; 3]);
        g.add_mesh("Tower", None, Vec3::ZERO, Aabb::new(Vec3::splat(-5.0), Vec3::new(5.0, 40.0, 5.0)), [0.5; 3]);
        g
    }

    /// Floor plus a tower whose near face sits 0.5 units to the avatar's -x.
    fn wall_to_the_left() -> SceneGraph {
        let mut g = SceneGraph::new();
        g.add_mesh("Floor", None, Vec3::ZERO, Aabb::new(Vec3::splat(-50.0), Vec3::new(50.0, 0.0, 50.0)), [0.3; 3]);
        g.add_mesh(
            "Tower",
            None,
            Vec3::ZERO,
            Aabb::new(Vec3::new(-10.0, 0.0, -5.0), Vec3::new(-0.8, 40.0, 5.0)),
            [0.5; 3],
        );
        g
    }

    fn clock(frame: MovementFrame) -> SimulationClock {
        SimulationClock::new(SimConfig {
            movement_frame: frame,
            floor_mesh_name: "Floor".to_string(),
            ..SimConfig::default()
        })
    }

    #[test]
    fn no_pose_before_avatar_loads() {
        let mut clock = clock(MovementFrame::AvatarMoves);
        clock.on_move(DirectionalSample::new(0.0, 1.0));
        clock.tick();
        assert!(clock.pose().is_none());
        assert_eq!(clock.stats().ticks, 0);
    }

    #[test]
    fn first_tick_after_load_defines_pose() {
        let mut clock = clock(MovementFrame::AvatarMoves);
        clock.apply_load(ready_event(AssetKind::Avatar, procedural_humanoid()));
        assert_eq!(clock.status().avatar, LoadState::Ready);
        clock.tick();
        let pose = clock.pose().unwrap();
        assert_eq!(pose.position, Vec3::new(0.0, 0.5, 0.0));
    }

    #[test]
    fn idle_from_start() {
        let mut clock = clock(MovementFrame::AvatarMoves);
        clock.apply_load(ready_event(AssetKind::Avatar, procedural_humanoid()));
        for _ in 0..10 {
            clock.tick();
        }
        let (state, phase) = clock.walk();
        assert_eq!(state, WalkState::Idle);
        assert_eq!(phase, 0.0);
        let pose = clock.pose().unwrap();
        assert_eq!(pose.joints.left_leg_x, -0.2);
        assert_eq!(pose.joints.right_leg_x, -0.2);
    }

    #[test]
    fn walking_right_moves_avatar_along_minus_x() {
        let mut clock = clock(MovementFrame::AvatarMoves);
        clock.apply_load(ready_event(AssetKind::Avatar, procedural_humanoid()));
        clock.on_move(DirectionalSample::new(0.0, 1.0));
        for _ in 0..50 {
            clock.tick();
        }
        let pose = clock.pose().unwrap();
        assert!((pose.position.x + 1.0).abs() < 1e-4, "{:?}", pose.position);
        assert_eq!(pose.position.z, 0.0);
        assert!((pose.facing - FRAC_PI_2).abs() < 1e-6);
        assert_eq!(clock.walk().0, WalkState::Walking);
        assert_eq!(clock.environment_offset(), Vec3::ZERO);
    }

    #[test]
    fn blocked_move_keeps_position_but_turns() {
        let mut clock = clock(MovementFrame::AvatarMoves);
        clock.apply_load(ready_event(AssetKind::Environment, walled_in()));
        clock.apply_load(ready_event(AssetKind::Avatar, procedural_humanoid()));

        clock.on_move(DirectionalSample::new(1.0, 2.0));
        clock.tick();

        let pose = clock.pose().unwrap();
        assert_eq!(pose.position, Vec3::new(0.0, 0.5, 0.0));
        assert!((pose.facing - (1.0 + FRAC_PI_2)).abs() < 1e-6);
        assert_eq!(clock.stats().blocked, 1);
        assert_eq!(clock.stats().admitted, 0);
        // Walk cycle still runs on input, independent of the gate.
        assert_eq!(clock.walk().0, WalkState::Walking);
    }

    #[test]
    fn wall_stops_avatar_at_its_face() {
        let mut clock = clock(MovementFrame::AvatarMoves);
        clock.apply_load(ready_event(AssetKind::Environment, wall_to_the_left()));
        clock.apply_load(ready_event(AssetKind::Avatar, procedural_humanoid()));

        // Stick to the right walks the avatar toward -x, into the wall.
        clock.on_move(DirectionalSample::new(0.0, 3.1));
        for _ in 0..200 {
            clock.tick();
        }
        let pose = clock.pose().unwrap();
        // The box (turned to face PI/2) never crosses into the wall.
        assert!(pose.position.x > -0.8, "{:?}", pose.position);
        assert!(clock.stats().blocked > 0);

        // Turning around frees it immediately.
        clock.on_move(DirectionalSample::new(std::f32::consts::PI, 3.1));
        let before = clock.pose().unwrap().position;
        clock.tick();
        assert!(clock.pose().unwrap().position.x > before.x);
    }

    #[test]
    fn world_scrolls_inverse_and_blocks_at_same_place() {
        let mut moving = clock(MovementFrame::AvatarMoves);
        let mut scrolling = clock(MovementFrame::WorldScrolls);
        for c in [&mut moving, &mut scrolling] {
            c.apply_load(ready_event(AssetKind::Environment, wall_to_the_left()));
            c.apply_load(ready_event(AssetKind::Avatar, procedural_humanoid()));
            c.on_move(DirectionalSample::new(0.0, 3.1));
            for _ in 0..200 {
                c.tick();
            }
        }

        let walked = moving.pose().unwrap().position;
        let fixed = scrolling.pose().unwrap().position;
        assert_eq!(fixed, Vec3::new(0.0, 0.5, 0.0));
        assert!(scrolling.environment_offset().abs_diff_eq(-(walked - fixed), 1e-4));
        assert_eq!(moving.stats().blocked, scrolling.stats().blocked);
    }

    #[test]
    fn failed_environment_never_blocks() {
        let mut clock = clock(MovementFrame::AvatarMoves);
        clock.apply_load(failed_event(AssetKind::Environment));
        clock.apply_load(ready_event(AssetKind::Avatar, procedural_humanoid()));
        assert_eq!(clock.status().environment, LoadState::Failed);

        clock.on_move(DirectionalSample::new(0.3, 3.1));
        for _ in 0..500 {
            clock.tick();
        }
        assert_eq!(clock.stats().blocked, 0);
        assert_eq!(clock.stats().admitted, 500);
        assert!(clock.index().is_empty());

        // A late success for the failed asset stays ignored.
        clock.apply_load(ready_event(AssetKind::Environment, walled_in()));
        assert_eq!(clock.status().environment, LoadState::Failed);
        assert!(clock.index().is_empty());
    }

    #[test]
    fn failed_avatar_keeps_simulation_running() {
        let mut clock = clock(MovementFrame::AvatarMoves);
        clock.apply_load(failed_event(AssetKind::Avatar));
        clock.on_move(DirectionalSample::new(0.0, 1.0));
        for _ in 0..5 {
            clock.tick();
        }
        assert!(clock.pose().is_none());
        assert_eq!(clock.walk().1, 0.0);
    }

    #[test]
    fn avatar_without_joints_still_walks_but_does_not_animate() {
        let mut graph = SceneGraph::new();
        graph.add_mesh("Body", None, Vec3::ZERO, Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5)), [1.0; 3]);

        let mut clock = clock(MovementFrame::AvatarMoves);
        clock.apply_load(ready_event(AssetKind::Avatar, graph));
        clock.on_move(DirectionalSample::new(FRAC_PI_2, 1.0));
        clock.tick();

        let pose = clock.pose().unwrap();
        assert!((pose.position.z - 0.02).abs() < 1e-6);
        assert_eq!(pose.joints, JointAngles::default());
        assert_eq!(clock.walk().1, 0.0);
    }

    #[test]
    fn release_returns_to_rest_pose_with_last_facing() {
        let mut clock = clock(MovementFrame::AvatarMoves);
        clock.apply_load(ready_event(AssetKind::Avatar, procedural_humanoid()));
        clock.on_move(DirectionalSample::new(2.0, 1.5));
        for _ in 0..7 {
            clock.tick();
        }
        clock.on_release();
        clock.tick();

        let pose = clock.pose().unwrap();
        assert!((pose.facing - (2.0 + FRAC_PI_2)).abs() < 1e-6);
        assert_eq!(pose.joints.left_arm_z, 0.0);
        assert_eq!(pose.joints.left_up_leg_x, 0.0);
        assert_eq!(pose.joints.left_leg_x, -0.2);
        assert!((clock.walk().1 - 7.0 * 0.05 * 1.5).abs() < 1e-5);
    }
}
