// Input state tracking for keyboard and mouse
// Abstracts winit events into a per-frame joystick reading:
//   - WASD / arrow keys: 8-way direction, force 1.0 (Shift: max force)
//   - Left mouse drag: virtual stick centred where the button went down

use std::collections::HashSet;
use std::f32::consts::PI;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::config::MAX_FORCE;
use super::movement::DirectionalSample;

/// Drag distance in pixels that counts as force 1.0.
pub const STICK_RADIUS_PX: f32 = 75.0;

/// What the stick did this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JoystickEvent {
    Move(DirectionalSample),
    End,
}

pub struct InputState {
    // Keyboard
    keys_held: HashSet<KeyCode>,

    // Mouse
    pub mouse_position: (f32, f32),
    /// Where the left button went down, while it is held.
    drag_origin: Option<(f32, f32)>,

    // Scroll: accumulated vertical scroll this frame, reset in end_frame()
    pub scroll_delta: f32,

    /// Whether the last poll reported an active stick.
    stick_active: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    pub fn new() -> Self {
        Self {
            keys_held: HashSet::new(),
            mouse_position: (0.0, 0.0),
            drag_origin: None,
            scroll_delta: 0.0,
            stick_active: false,
        }
    }

    /// Feed a winit WindowEvent into the input state.
    /// Call this once per event before the game's own event handling.
    pub fn process_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.set_key(key, event.state == ElementState::Pressed);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_position = (position.x as f32, position.y as f32);
            }
            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => {
                self.set_drag(*state == ElementState::Pressed);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
                self.scroll_delta += y;
            }
            WindowEvent::Focused(false) => {
                self.keys_held.clear();
                self.drag_origin = None;
            }
            _ => {}
        }
    }

    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.keys_held.insert(key);
        } else {
            self.keys_held.remove(&key);
        }
    }

    pub fn set_drag(&mut self, pressed: bool) {
        self.drag_origin = pressed.then_some(self.mouse_position);
    }

    /// Call once per frame after update() and render() have consumed input.
    /// Resets per-frame accumulators.
    pub fn end_frame(&mut self) {
        self.scroll_delta = 0.0;
    }

    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    fn any_held(&self, keys: &[KeyCode]) -> bool {
        keys.iter().any(|k| self.is_key_held(*k))
    }

    /// Current stick reading, mouse drag taking priority over keys.
    /// `None` when nothing is pushed.
    pub fn sample(&self) -> Option<DirectionalSample> {
        if let Some((ox, oy)) = self.drag_origin {
            // Screen y grows downward; stick angles grow counter-clockwise.
            let dx = self.mouse_position.0 - ox;
            let dy = oy - self.mouse_position.1;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance > 0.0 {
                return Some(DirectionalSample::new(dy.atan2(dx), distance / STICK_RADIUS_PX));
            }
            return None;
        }

        let axis = |pos: &[KeyCode], neg: &[KeyCode]| {
            self.any_held(pos) as i32 as f32 - self.any_held(neg) as i32 as f32
        };
        let x = axis(&[KeyCode::KeyD, KeyCode::ArrowRight], &[KeyCode::KeyA, KeyCode::ArrowLeft]);
        let y = axis(&[KeyCode::KeyW, KeyCode::ArrowUp], &[KeyCode::KeyS, KeyCode::ArrowDown]);
        if x == 0.0 && y == 0.0 {
            return None;
        }

        let force = if self.any_held(&[KeyCode::ShiftLeft, KeyCode::ShiftRight]) { MAX_FORCE } else { 1.0 };
        Some(DirectionalSample::new(y.atan2(x).rem_euclid(2.0 * PI), force))
    }

    /// Turn the current reading into stick events: `Move` every frame while
    /// pushed, one `End` when let go.
    pub fn poll_joystick(&mut self) -> Option<JoystickEvent> {
        match self.sample() {
            Some(sample) => {
                self.stick_active = true;
                Some(JoystickEvent::Move(sample))
            }
            None if self.stick_active => {
                self.stick_active = false;
                Some(JoystickEvent::End)
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn moved(event: Option<JoystickEvent>) -> DirectionalSample {
        match event {
            Some(JoystickEvent::Move(s)) => s,
            other => panic!("expected move, got {other:?}"),
        }
    }

    #[test]
    fn nothing_held_is_silent() {
        let mut input = InputState::new();
        assert_eq!(input.poll_joystick(), None);
    }

    #[test]
    fn keys_map_to_stick_angles() {
        let mut input = InputState::new();
        input.set_key(KeyCode::KeyD, true);
        let s = moved(input.poll_joystick());
        assert_eq!(s.angle, 0.0);
        assert_eq!(s.force, 1.0);

        input.set_key(KeyCode::KeyD, false);
        input.set_key(KeyCode::ArrowUp, true);
        assert!((moved(input.poll_joystick()).angle - FRAC_PI_2).abs() < 1e-6);

        input.set_key(KeyCode::KeyA, true);
        assert!((moved(input.poll_joystick()).angle - 3.0 * PI / 4.0).abs() < 1e-6);

        input.set_key(KeyCode::ArrowUp, false);
        input.set_key(KeyCode::KeyA, false);
        input.set_key(KeyCode::KeyS, true);
        assert!((moved(input.poll_joystick()).angle - 3.0 * FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn shift_runs_at_max_force() {
        let mut input = InputState::new();
        input.set_key(KeyCode::KeyW, true);
        input.set_key(KeyCode::ShiftLeft, true);
        assert_eq!(moved(input.poll_joystick()).force, MAX_FORCE);
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut input = InputState::new();
        input.set_key(KeyCode::KeyA, true);
        input.set_key(KeyCode::KeyD, true);
        assert_eq!(input.poll_joystick(), None);
    }

    #[test]
    fn release_emits_a_single_end() {
        let mut input = InputState::new();
        input.set_key(KeyCode::KeyW, true);
        moved(input.poll_joystick());
        moved(input.poll_joystick());
        input.set_key(KeyCode::KeyW, false);
        assert_eq!(input.poll_joystick(), Some(JoystickEvent::End));
        assert_eq!(input.poll_joystick(), None);
    }

    #[test]
    fn mouse_drag_acts_as_stick() {
        let mut input = InputState::new();
        input.mouse_position = (400.0, 300.0);
        input.set_drag(true);
        // Dragging up 150 px is twice the stick radius.
        input.mouse_position = (400.0, 150.0);
        let s = moved(input.poll_joystick());
        assert!((s.angle - FRAC_PI_2).abs() < 1e-6);
        assert!((s.force - 2.0).abs() < 1e-6);

        input.set_drag(false);
        assert_eq!(input.poll_joystick(), Some(JoystickEvent::End));
    }

    #[test]
    fn drag_overrides_keys() {
        let mut input = InputState::new();
        input.set_key(KeyCode::KeyW, true);
        input.set_drag(true);
        input.mouse_position = (-75.0, 0.0);
        let s = moved(input.poll_joystick());
        assert!((s.angle - PI).abs() < 1e-6);
        assert!((s.force - 1.0).abs() < 1e-6);
    }
}
