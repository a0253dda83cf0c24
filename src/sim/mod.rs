//! Deterministic simulation module
//!
//! All chase logic lives here. This module must be pure and deterministic:
//! - Frame-clocked timers only (no wall clock)
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod behavior;
pub mod capture;
pub mod motion;
pub mod state;
pub mod tick;

pub use behavior::{BehaviorController, Cruise, FakeBeat, Mode, random_heading};
pub use capture::{CaptureEvent, PointerEvent, capture_test};
pub use motion::{MotionIntegrator, Target, reconcile_speed};
pub use state::{
    Arena, BehaviorState, Bounds, ChaseState, EscapeCause, EscapeEnd, EventQueue, Frame,
    MAX_EVENTS, MovementPhase, SimEvent,
};
pub use tick::{TickInput, tick};
