// Simulation tuning and the command line that overrides it.
// Defaults reproduce the reference feel: 0.02 step scale, 3.10 max force.

use std::path::PathBuf;

use bevy_ecs::prelude::*;
use clap::{Parser, ValueEnum};

/// Upper bound on input force. Samples above this are clamped.
pub const MAX_FORCE: f32 = 3.10;
/// World units moved per tick per unit of force.
pub const STEP_SCALE: f32 = 0.02;
/// Walk phase advance per tick per unit of force.
pub const PHASE_RATE: f32 = 0.05;
/// Vertical inflation applied to the bottom of the collision query box.
pub const COLLISION_PAD: f32 = 16.0;
/// Name of the environment mesh that never blocks movement.
pub const FLOOR_MESH_NAME: &str = "Pavimento_Colore_0";

/// Which part of the scene receives an accepted displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MovementFrame {
    /// The avatar walks through a fixed environment.
    #[default]
    AvatarMoves,
    /// The avatar stays put and the environment scrolls the other way.
    WorldScrolls,
}

#[derive(Resource, Debug, Clone)]
pub struct SimConfig {
    pub movement_frame: MovementFrame,
    pub max_force: f32,
    pub step_scale: f32,
    pub phase_rate: f32,
    pub collision_pad: f32,
    pub floor_mesh_name: String,
    /// Height the avatar root is placed at when it loads.
    pub spawn_height: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            movement_frame: MovementFrame::AvatarMoves,
            max_force: MAX_FORCE,
            step_scale: STEP_SCALE,
            phase_rate: PHASE_RATE,
            collision_pad: COLLISION_PAD,
            floor_mesh_name: FLOOR_MESH_NAME.to_string(),
            spawn_height: 0.5,
        }
    }
}

/// Walk an avatar through a city with keyboard or mouse-drag joystick input.
#[derive(Parser, Debug, Clone)]
#[command(name = "city_stroll", version, about)]
pub struct Cli {
    /// Avatar glTF/GLB file. A procedural humanoid is used when omitted.
    #[arg(long)]
    pub avatar: Option<PathBuf>,

    /// Environment glTF/GLB file. A procedural city is used when omitted.
    #[arg(long)]
    pub environment: Option<PathBuf>,

    /// Apply accepted movement to the avatar or scroll the world instead.
    #[arg(long, value_enum, default_value_t = MovementFrame::AvatarMoves)]
    pub movement_frame: MovementFrame,

    /// Vertical pad added to the bottom of the collision query box.
    #[arg(long, default_value_t = COLLISION_PAD)]
    pub collision_pad: f32,

    /// Environment mesh excluded from collision.
    #[arg(long, default_value = FLOOR_MESH_NAME)]
    pub floor_mesh: String,

    /// Seed for the procedural city layout.
    #[arg(long, default_value_t = 7)]
    pub city_seed: u64,
}

impl Cli {
    pub fn sim_config(&self) -> SimConfig {
        SimConfig {
            movement_frame: self.movement_frame,
            collision_pad: self.collision_pad,
            floor_mesh_name: self.floor_mesh.clone(),
            ..SimConfig::default()
        }
    }
}
