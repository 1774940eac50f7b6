// Third-person follow camera
//
// Camera model:
//   - Looks at a target point that tracks the avatar every frame
//   - Sits behind the avatar on -Z at a fixed pitch, so stick-right reads as
//     screen-right under the locomotion sign convention (-x) and stick-up as
//     away from the camera (+z)
//   - Mouse wheel zooms by adjusting distance along the look vector

use glam::{Mat4, Vec3};
use super::input::InputState;

pub struct FollowCamera {
    /// Point the camera looks at.
    /// Private: set from the avatar in update(). Use target() to read.
    target: Vec3,

    /// Distance from target along the look direction.
    /// Private: always clamped to [min_distance, max_distance] in update(). Use distance() to read.
    distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,

    /// Elevation angle in radians (0 = horizontal, PI/2 = straight down)
    pub pitch: f32,

    /// Horizontal rotation in radians (PI = behind the avatar on -Z)
    pub yaw: f32,

    /// Vertical field of view in radians
    pub fov: f32,
    pub near: f32,
    pub far: f32,

    /// Zoom change (in distance units) per scroll line
    pub zoom_speed: f32,

    /// Height above the avatar root the camera aims at.
    pub look_height: f32,
}

impl Default for FollowCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl FollowCamera {
    pub fn new() -> Self {
        // Eye 5 up and 10 back from the target.
        Self {
            target: Vec3::ZERO,
            distance: 125.0_f32.sqrt(),
            min_distance: 4.0,
            max_distance: 40.0,
            pitch: 0.5_f32.atan(),
            yaw: std::f32::consts::PI,
            fov: 75.0_f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            zoom_speed: 1.0,
            look_height: 0.0,
        }
    }

    /// Follow `focus` and apply zoom input. Call once per frame before rendering.
    pub fn update(&mut self, input: &InputState, focus: Vec3) {
        self.target = focus + Vec3::Y * self.look_height;

        // Zoom: scroll up (positive delta) zooms in (decreases distance)
        self.distance -= input.scroll_delta * self.zoom_speed;
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);
    }

    /// World-space position of the camera eye.
    pub fn camera_position(&self) -> Vec3 {
        self.target + self.eye_offset()
    }

    /// View matrix: looks from the camera eye toward the target.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.camera_position(), self.target, Vec3::Y)
    }

    /// Perspective projection matrix.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect, self.near, self.far)
    }

    /// Combined view-projection matrix ready to upload to the GPU.
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    pub fn target(&self) -> Vec3 { self.target }
    pub fn distance(&self) -> f32 { self.distance }

    // Offset from target to camera eye based on pitch, yaw, and distance.
    fn eye_offset(&self) -> Vec3 {
        Vec3::new(
            self.yaw.sin() * self.pitch.cos() * self.distance,
            self.pitch.sin() * self.distance,
            self.yaw.cos() * self.pitch.cos() * self.distance,
        )
    }
}
