// Directional input → planar movement vector + facing angle.
//
// The input device reports an angle (radians, 0 = right, PI/2 = up) and a
// force (distance from centre). Each sample overwrites the previous vector
// outright; there is no smoothing and no queue of missed samples.

use std::f32::consts::FRAC_PI_2;

use bevy_ecs::prelude::*;

use super::config::{MAX_FORCE, STEP_SCALE};

/// One joystick reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalSample {
    pub angle: f32,
    pub force: f32,
}

impl DirectionalSample {
    pub fn new(angle: f32, force: f32) -> Self {
        Self { angle, force }
    }
}

/// Planar displacement per tick on X/Z.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MovementVector {
    pub x: f32,
    pub z: f32,
}

impl MovementVector {
    pub const ZERO: Self = Self { x: 0.0, z: 0.0 };

    pub fn is_moving(&self) -> bool {
        self.x != 0.0 || self.z != 0.0
    }
}

/// Latest mapped input. Written only by input events, read by every tick.
#[derive(Resource, Debug, Clone, Copy)]
pub struct MovementInput {
    vector: MovementVector,
    facing: f32,
    force: f32,
    max_force: f32,
    step_scale: f32,
}

impl Default for MovementInput {
    fn default() -> Self {
        Self::new(MAX_FORCE, STEP_SCALE)
    }
}

impl MovementInput {
    pub fn new(max_force: f32, step_scale: f32) -> Self {
        Self {
            vector: MovementVector::ZERO,
            facing: 0.0,
            force: 0.0,
            max_force,
            step_scale,
        }
    }

    /// Map a sample. Samples with a non-finite angle or NaN force are ignored
    /// and the previous vector stays in effect.
    pub fn on_move(&mut self, sample: DirectionalSample) {
        if !sample.angle.is_finite() || sample.force.is_nan() {
            log::debug!("ignoring invalid input sample {:?}", sample);
            return;
        }

        let force = sample.force.clamp(0.0, self.max_force);
        let step = force * self.step_scale;

        self.force = force;
        self.vector = MovementVector {
            x: sample.angle.cos() * step,
            z: sample.angle.sin() * step,
        };
        self.facing = sample.angle + FRAC_PI_2;
    }

    /// Stop moving. Facing is kept so the avatar rests where it last looked.
    pub fn on_release(&mut self) {
        self.vector = MovementVector::ZERO;
    }

    pub fn vector(&self) -> MovementVector { self.vector }
    pub fn facing(&self) -> f32 { self.facing }

    /// Last clamped force. Survives release; only read while moving.
    pub fn force(&self) -> f32 { self.force }
}
