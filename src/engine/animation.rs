// Procedural four-limb walk cycle.
//
// Two states, re-evaluated every tick with no hysteresis:
//   Walking — phase advances by phase_rate * force, limbs swing on sin(phase)
//   Idle    — phase frozen, limbs snap to the rest pose
//
// Joint angles are rebuilt from scratch each tick; only the phase carries over.

use bevy_ecs::prelude::*;

use super::components::JointAngles;
use super::config::PHASE_RATE;
use super::movement::MovementVector;

/// Peak swing of arms and legs in radians.
const SWING: f32 = 0.2;
/// Forward bias shared by both upper legs while walking.
const UP_LEG_BIAS: f32 = 0.1;
/// Knee flexion held while standing.
const REST_KNEE: f32 = -0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkState {
    #[default]
    Idle,
    Walking,
}

#[derive(Resource, Debug, Clone, Copy)]
pub struct WalkAnimator {
    phase: f32,
    state: WalkState,
    phase_rate: f32,
}

impl Default for WalkAnimator {
    fn default() -> Self {
        Self::new(PHASE_RATE)
    }
}

impl WalkAnimator {
    pub fn new(phase_rate: f32) -> Self {
        Self { phase: 0.0, state: WalkState::Idle, phase_rate }
    }

    /// Advance one tick and return the full set of joint angles.
    pub fn step(&mut self, vector: MovementVector, force: f32) -> JointAngles {
        self.state = if vector.is_moving() { WalkState::Walking } else { WalkState::Idle };

        match self.state {
            WalkState::Walking => {
                self.phase += self.phase_rate * force;
                walking_pose(self.phase)
            }
            WalkState::Idle => idle_pose(),
        }
    }

    pub fn phase(&self) -> f32 { self.phase }
    pub fn state(&self) -> WalkState { self.state }
}

pub fn walking_pose(phase: f32) -> JointAngles {
    let arm_swing = -phase.sin() * SWING;
    let leg_swing = phase.sin() * SWING;

    JointAngles {
        left_arm_z: arm_swing,
        right_arm_z: arm_swing,
        left_up_leg_x: -leg_swing + UP_LEG_BIAS,
        right_up_leg_x: leg_swing + UP_LEG_BIAS,
        left_leg_x: leg_swing,
        right_leg_x: -leg_swing,
    }
}

pub fn idle_pose() -> JointAngles {
    JointAngles {
        left_arm_z: 0.0,
        right_arm_z: 0.0,
        left_up_leg_x: 0.0,
        right_up_leg_x: 0.0,
        left_leg_x: REST_KNEE,
        right_leg_x: REST_KNEE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moving() -> MovementVector {
        MovementVector { x: 0.02, z: 0.0 }
    }

    #[test]
    fn starts_idle_at_phase_zero() {
        let mut anim = WalkAnimator::default();
        let pose = anim.step(MovementVector::ZERO, 3.0);
        assert_eq!(anim.state(), WalkState::Idle);
        assert_eq!(anim.phase(), 0.0);
        assert_eq!(pose.left_leg_x, -0.2);
        assert_eq!(pose.right_leg_x, -0.2);
    }

    #[test]
    fn phase_advances_with_force() {
        let mut anim = WalkAnimator::default();
        anim.step(moving(), 2.0);
        anim.step(moving(), 2.0);
        assert_eq!(anim.state(), WalkState::Walking);
        assert!((anim.phase() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn walking_pose_is_mirror_symmetric() {
        for i in 0..64 {
            let p = i as f32 * 0.37;
            let pose = walking_pose(p);
            assert_eq!(pose.left_arm_z, pose.right_arm_z);
            assert!((pose.left_up_leg_x + pose.right_up_leg_x - 0.2).abs() < 1e-6);
            assert_eq!(pose.left_leg_x, -pose.right_leg_x);
        }
    }

    #[test]
    fn stopping_resets_limbs_and_freezes_phase() {
        let mut anim = WalkAnimator::default();
        for _ in 0..17 {
            anim.step(moving(), 3.1);
        }
        let phase = anim.phase();

        let pose = anim.step(MovementVector::ZERO, 3.1);
        assert_eq!(pose, idle_pose());
        assert_eq!(anim.phase(), phase);
        assert_eq!(anim.state(), WalkState::Idle);

        // Resuming continues from the frozen phase.
        anim.step(moving(), 1.0);
        assert!((anim.phase() - (phase + 0.05)).abs() < 1e-6);
    }

    #[test]
    fn matches_reference_formula() {
        let pose = walking_pose(1.0);
        let s = 1.0f32.sin();
        assert!((pose.left_arm_z - (-s * 0.2)).abs() < 1e-6);
        assert!((pose.left_up_leg_x - (-s * 0.2 + 0.1)).abs() < 1e-6);
        assert!((pose.right_up_leg_x - (s * 0.2 + 0.1)).abs() < 1e-6);
        assert!((pose.left_leg_x - s * 0.2).abs() < 1e-6);
    }
}
