//! Simulation state and core types
//!
//! `ChaseState` owns everything the frame loop mutates. Presentation reads it
//! through the accessor methods or a [`crate::publish::Snapshot`].

use std::collections::VecDeque;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::behavior::BehaviorController;
use super::capture::{CaptureEvent, PointerEvent};
use super::motion::{MotionIntegrator, Target};
use crate::consts::*;
use crate::feedback::Feedback;
use crate::sanitize_speed_factor;
use crate::tuning::Tuning;

/// Coarse behavior mode, drives speed and intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorState {
    /// Cruising at a moderate, sampled speed
    Stalking,
    /// Fast stretch between turns
    Dashing,
    /// Standing still between stretches
    Observing,
    /// Fleeing (capture hit or spontaneous bolt)
    Escaping,
}

/// Fine-grained trajectory shape inside the stalk/dash cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementPhase {
    Direct,
    Turning,
    Pausing,
    FakeMove,
}

/// Why an escape started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscapeCause {
    Capture,
    Spontaneous,
}

/// Why an escape ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscapeEnd {
    Cooldown,
    Wrap,
}

/// Things that happened during a tick, for sound/effects hooks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    Capture(CaptureEvent),
    BoundaryHit { x: bool, y: bool },
    EscapeStarted { cause: EscapeCause },
    EscapeEnded { reason: EscapeEnd },
    FakeMove,
}

/// Maximum queued events before the oldest are dropped
pub const MAX_EVENTS: usize = 64;

/// Bounded event queue (nobody is obliged to drain it)
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: VecDeque<SimEvent>,
}

impl EventQueue {
    pub fn push(&mut self, event: SimEvent) {
        if self.events.len() >= MAX_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn to_vec(&self) -> Vec<SimEvent> {
        self.events.iter().copied().collect()
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        self.events.drain(..).collect()
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    #[inline]
    pub fn contains(&self, p: Vec2, eps: f32) -> bool {
        p.x >= self.min.x - eps
            && p.x <= self.max.x + eps
            && p.y >= self.min.y - eps
            && p.y <= self.max.y + eps
    }

    #[inline]
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }
}

/// The playfield, in arena-local units with the origin at the top-left
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: DEFAULT_ARENA_WIDTH,
            height: DEFAULT_ARENA_HEIGHT,
        }
    }
}

impl Arena {
    /// Degenerate extents (negative, NaN) collapse to zero
    pub fn new(width: f32, height: f32) -> Self {
        let fix = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        Self {
            width: fix(width),
            height: fix(height),
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width, self.height) * 0.5
    }

    /// Range the mouse is kept inside while not escaping
    ///
    /// An axis too small for the margin pins to its center instead of
    /// inverting.
    pub fn containment(&self, margin: f32) -> Bounds {
        let axis = |extent: f32| {
            let lo = margin.max(0.0).min(extent * 0.5);
            (lo, (extent - lo).max(lo))
        };
        let (min_x, max_x) = axis(self.width);
        let (min_y, max_y) = axis(self.height);
        Bounds {
            min: Vec2::new(min_x, min_y),
            max: Vec2::new(max_x, max_y),
        }
    }

    /// Outer limit an escaping mouse may reach before it wraps
    pub fn escape_bounds(&self, margin: f32, overshoot: f32) -> Bounds {
        let inner = self.containment(margin);
        let overshoot = overshoot.max(0.0);
        Bounds {
            min: Vec2::new(-overshoot, -overshoot).min(inner.min),
            max: Vec2::new(self.width + overshoot, self.height + overshoot).max(inner.max),
        }
    }
}

/// Per-tick context shared by the controller and the integrator
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Simulation clock (seconds)
    pub now: f64,
    pub arena: Arena,
    pub speed_factor: f32,
    pub tuning: &'a Tuning,
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct ChaseState {
    /// Session seed for reproducibility
    pub seed: u64,
    pub arena: Arena,
    pub tuning: Tuning,
    speed_factor: f32,
    /// Monotonic simulation clock (seconds)
    pub time: f64,
    /// Frame counter
    pub frame: u64,
    pub motion: MotionIntegrator,
    pub behavior: BehaviorController,
    /// Trail and ripple buffers for the presentation layer
    pub feedback: Feedback,
    pub(crate) events: EventQueue,
    pub(crate) rng: Pcg32,
}

impl ChaseState {
    /// Create a new session with default tuning
    pub fn new(seed: u64, arena: Arena) -> Self {
        Self::with_tuning(seed, arena, Tuning::default())
    }

    pub fn with_tuning(seed: u64, arena: Arena, tuning: Tuning) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let arena = Arena::new(arena.width, arena.height);
        let speed_factor = DEFAULT_SPEED_FACTOR;

        let behavior = BehaviorController::new(0.0, &tuning, &mut rng);
        let frame = Frame {
            now: 0.0,
            arena,
            speed_factor,
            tuning: &tuning,
        };
        let spawn = arena
            .containment(tuning.margin)
            .clamp(Vec2::new(SPAWN_X, SPAWN_Y));
        let vel = behavior.heading() * behavior.desired_speed(&frame);
        let motion = MotionIntegrator::new(Target {
            pos: spawn,
            vel,
            radius: TARGET_RADIUS,
        });

        log::debug!("New chase session seed={seed} arena={}x{}", arena.width, arena.height);

        Self {
            seed,
            arena,
            tuning,
            speed_factor,
            time: 0.0,
            frame: 0,
            motion,
            behavior,
            feedback: Feedback::default(),
            events: EventQueue::default(),
            rng,
        }
    }

    pub fn speed_factor(&self) -> f32 {
        self.speed_factor
    }

    /// Set the speed multiplier (clamped to the slider domain)
    pub fn set_speed_factor(&mut self, factor: f32) {
        self.speed_factor = sanitize_speed_factor(factor);
    }

    /// Adopt a new arena size (e.g. after a window resize)
    ///
    /// A mouse that is not escaping is pulled into the new bounds at once.
    pub fn resize(&mut self, arena: Arena) {
        let arena = Arena::new(arena.width, arena.height);
        if arena == self.arena {
            return;
        }
        self.arena = arena;
        if !self.is_escaping() {
            let bounds = arena.containment(self.tuning.margin);
            let target = &mut self.motion.target;
            target.pos = bounds.clamp(target.pos);
        }
        log::trace!("Arena resized to {}x{}", arena.width, arena.height);
    }

    pub fn position(&self) -> Vec2 {
        self.motion.target.pos
    }

    pub fn velocity(&self) -> Vec2 {
        self.motion.target.vel
    }

    pub fn behavior_state(&self) -> BehaviorState {
        self.behavior.behavior_state()
    }

    pub fn movement_phase(&self) -> MovementPhase {
        self.behavior.movement_phase()
    }

    pub fn is_escaping(&self) -> bool {
        self.behavior.is_escaping()
    }

    /// Events recorded since the last drain, oldest first
    pub fn events(&self) -> impl Iterator<Item = &SimEvent> {
        self.events.iter()
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }

    /// Handle a pointer/touch event in arena-local coordinates
    ///
    /// Events without arena bounds or with non-finite coordinates are
    /// ignored. Returns the capture outcome otherwise. The effect is visible
    /// to the very next tick.
    pub fn pointer_event(&mut self, event: PointerEvent) -> Option<CaptureEvent> {
        let Some(arena) = event.arena else {
            log::trace!("Ignoring pointer event without arena bounds");
            return None;
        };
        if !event.point.is_finite() {
            log::trace!("Ignoring non-finite pointer event {:?}", event.point);
            return None;
        }
        self.resize(arena);

        let frame = Frame {
            now: self.time,
            arena: self.arena,
            speed_factor: self.speed_factor,
            tuning: &self.tuning,
        };
        let capture = self.motion.capture(
            &mut self.behavior,
            event.point,
            &frame,
            &mut self.rng,
            &mut self.events,
        );
        self.feedback.push_ripple(&capture, &self.tuning);
        Some(capture)
    }
}
