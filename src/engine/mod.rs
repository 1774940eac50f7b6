// Engine module - avatar locomotion, collision and walk-cycle simulation,
// plus the input/camera/overlay plumbing the window loop needs.

pub mod animation;
pub mod assets;
pub mod bounds;
pub mod camera;
pub mod clock;
pub mod collision;
pub mod components;
pub mod config;
pub mod debug_overlay;
pub mod input;
pub mod movement;
pub mod scene;
pub mod systems;

// Re-export commonly used items
pub use assets::{AssetKind, AssetLoader, AssetSource};
pub use clock::SimulationClock;
pub use config::Cli;
