//! Per-frame simulation tick
//!
//! Core loop that advances the chase by one display frame.

use super::capture::PointerEvent;
use super::state::{Arena, ChaseState, Frame};
use crate::consts::MAX_TICK_DT;

/// Input collected since the previous tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer/touch events, in arrival order
    pub pointers: Vec<PointerEvent>,
    /// New speed factor from the control UI
    pub speed_factor: Option<f32>,
    /// New arena size (window resize)
    pub arena: Option<Arena>,
}

/// Advance the chase by one frame of `dt` seconds
///
/// Never fails: bad `dt` is clamped and bad input is dropped.
pub fn tick(state: &mut ChaseState, input: &TickInput, dt: f32) {
    let dt = if dt.is_finite() {
        dt.clamp(0.0, MAX_TICK_DT)
    } else {
        0.0
    };

    state.time += dt as f64;
    state.frame += 1;

    if let Some(factor) = input.speed_factor {
        state.set_speed_factor(factor);
    }
    if let Some(arena) = input.arena {
        state.resize(arena);
    }

    for event in &input.pointers {
        state.pointer_event(*event);
    }

    let frame = Frame {
        now: state.time,
        arena: state.arena,
        speed_factor: state.speed_factor(),
        tuning: &state.tuning,
    };

    // Controller first so containment always sees the state being published
    let target = &mut state.motion.target;
    state.behavior.tick(
        &frame,
        target.pos,
        &mut target.vel,
        &mut state.rng,
        &mut state.events,
    );
    state
        .motion
        .step(&mut state.behavior, &frame, dt, &mut state.rng, &mut state.events);

    state
        .feedback
        .record_frame(state.motion.target.pos, state.behavior.is_escaping(), dt, &state.tuning);
}
