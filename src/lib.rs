//! Mouse Chase - an evasive mouse that runs from pointer and touch captures
//!
//! Core modules:
//! - `sim`: Frame-clocked simulation (behavior state machine, motion, capture)
//! - `tuning`: Data-driven behavior balance
//! - `settings`: Player preferences (speed factor, feedback toggles)
//! - `feedback`: Trail and ripple buffers for the presentation layer
//! - `publish`: Throttled read-only snapshots of the simulation
//! - `platform`: Fixed-step frame clock and browser bindings

pub mod error;
pub mod feedback;
pub mod platform;
pub mod publish;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::{ConfigError, ConfigResult};
pub use publish::{Publisher, Snapshot};
pub use settings::Settings;
pub use tuning::{Band, Tuning};

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Display refresh rate that per-frame velocities are calibrated against
    pub const FRAME_RATE: f32 = 60.0;
    /// Fixed simulation timestep (one display frame)
    pub const SIM_DT: f32 = 1.0 / FRAME_RATE;
    /// Maximum substeps per animation frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;
    /// Largest dt a single tick will accept (seconds)
    pub const MAX_TICK_DT: f32 = 0.25;

    /// Default arena dimensions
    pub const DEFAULT_ARENA_WIDTH: f32 = 800.0;
    pub const DEFAULT_ARENA_HEIGHT: f32 = 600.0;

    /// Spawn point (clamped into the arena)
    pub const SPAWN_X: f32 = 100.0;
    pub const SPAWN_Y: f32 = 100.0;
    /// Logical half-size of the mouse
    pub const TARGET_RADIUS: f32 = 12.5;

    /// Speed slider domain
    pub const MIN_SPEED_FACTOR: f32 = 1.0;
    pub const MAX_SPEED_FACTOR: f32 = 10.0;
    /// Slider default; speed bands are quoted at this factor
    pub const DEFAULT_SPEED_FACTOR: f32 = 5.0;
}

/// Clamp a caller-supplied speed factor into the slider domain
///
/// Non-finite input falls back to the default so the mouse never freezes.
#[inline]
pub fn sanitize_speed_factor(factor: f32) -> f32 {
    use consts::*;
    if factor.is_finite() {
        factor.clamp(MIN_SPEED_FACTOR, MAX_SPEED_FACTOR)
    } else {
        DEFAULT_SPEED_FACTOR
    }
}

/// Convert a speed quoted in arena widths per second to units per frame
#[inline]
pub fn widths_per_sec_to_frame(fraction: f32, arena_width: f32, speed_factor: f32) -> f32 {
    use consts::*;
    fraction * arena_width.max(0.0) / FRAME_RATE * (speed_factor / DEFAULT_SPEED_FACTOR)
}

/// Heading angle of a vector (radians, [-π, π])
#[inline]
pub fn heading_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}
