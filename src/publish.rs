//! Read-only projection of the simulation for the presentation layer
//!
//! The simulation ticks at display rate; renderers and UI bindings only need
//! a copy every so often. [`Publisher`] throttles [`Snapshot`]s on the
//! simulation clock so the cadence does not depend on how often it is polled.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::feedback::Ripple;
use crate::heading_of;
use crate::sim::{BehaviorState, ChaseState, MovementPhase};

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub frame: u64,
    /// Simulation time (seconds)
    pub time: f64,
    pub position: Vec2,
    /// Units per frame
    pub velocity: Vec2,
    /// Facing angle in radians, for sprite rotation
    pub heading: f32,
    pub behavior: BehaviorState,
    pub phase: MovementPhase,
    pub is_escaping: bool,
    pub speed_factor: f32,
    /// Newest first
    pub trail: Vec<Vec2>,
    pub ripples: Vec<Ripple>,
}

impl Snapshot {
    pub fn capture(state: &ChaseState) -> Self {
        Self {
            frame: state.frame,
            time: state.time,
            position: state.position(),
            velocity: state.velocity(),
            heading: heading_of(state.behavior.heading()),
            behavior: state.behavior_state(),
            phase: state.movement_phase(),
            is_escaping: state.is_escaping(),
            speed_factor: state.speed_factor(),
            trail: state.feedback.trail().map(|p| p.pos).collect(),
            ripples: state.feedback.ripples().to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Emits snapshots at most once per `interval` of simulation time
#[derive(Debug, Clone)]
pub struct Publisher {
    interval: f64,
    next_due: f64,
}

impl Publisher {
    pub fn new(interval: f32) -> Self {
        let interval = if interval.is_finite() {
            interval.max(0.0) as f64
        } else {
            0.0
        };
        Self {
            interval,
            next_due: 0.0,
        }
    }

    /// Snapshot of `state` if one is due
    pub fn poll(&mut self, state: &ChaseState) -> Option<Snapshot> {
        // Absorb f32 step rounding in the clock
        if state.time + 1e-6 < self.next_due {
            return None;
        }
        self.next_due = state.time + self.interval;
        Some(Snapshot::capture(state))
    }

    /// Publish on the next poll regardless of the interval
    pub fn force(&mut self) {
        self.next_due = f64::NEG_INFINITY;
    }
}
