//! Capture detection
//!
//! A pointer or touch lands somewhere in the arena; if it is close enough to
//! the mouse it counts as a catch attempt and the mouse bolts.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::Arena;

/// Pointer/touch input, already translated into arena-local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub point: Vec2,
    /// Arena size at the time of the event; `None` means the input layer
    /// could not resolve it and the event is dropped
    pub arena: Option<Arena>,
}

impl PointerEvent {
    pub fn new(x: f32, y: f32, arena: Arena) -> Self {
        Self {
            point: Vec2::new(x, y),
            arena: Some(arena),
        }
    }
}

/// Outcome of a catch attempt (consumed once; presentation may buffer it)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureEvent {
    pub point: Vec2,
    pub hit: bool,
    /// Distance from the pointer to the mouse at the time of the event
    pub distance: f32,
    /// Simulation time (seconds)
    pub timestamp: f64,
}

/// Hit test a pointer against the mouse position
///
/// Returns `(hit, distance)`; a hit is strictly closer than `hit_radius`.
#[inline]
pub fn capture_test(point: Vec2, target: Vec2, hit_radius: f32) -> (bool, f32) {
    let distance = point.distance(target);
    (distance < hit_radius, distance)
}
