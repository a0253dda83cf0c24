//! Motion integration
//!
//! Owns the mouse's authoritative position and velocity. Each frame it eases
//! the speed toward what the behavior controller wants, adds a little noise,
//! integrates, and then keeps the mouse in the arena (bouncing) or, while
//! escaping, lets it run off-screen and wraps it back in from the far side.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::behavior::{BehaviorController, random_heading};
use super::capture::{CaptureEvent, capture_test};
use super::state::{
    Bounds, EscapeCause, EscapeEnd, EventQueue, Frame, MovementPhase, SimEvent,
};
use crate::consts::SIM_DT;
use crate::tuning::{Band, chance};

/// The mouse
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub pos: Vec2,
    /// Units per frame
    pub vel: Vec2,
    pub radius: f32,
}

/// Which axes were touched by a boundary rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisHits {
    pub x: bool,
    pub y: bool,
}

impl AxisHits {
    #[inline]
    pub fn any(self) -> bool {
        self.x || self.y
    }
}

/// Ease the speed toward `desired`, preserving heading
///
/// Within `tolerance` (relative to `desired`) the velocity is left alone.
/// Otherwise `rate` of the error is closed, so repeated calls never move
/// further from the target. A zero velocity accelerates along `heading`.
pub fn reconcile_speed(vel: Vec2, desired: f32, heading: Vec2, tolerance: f32, rate: f32) -> Vec2 {
    let vel = if vel.is_finite() { vel } else { Vec2::ZERO };
    let desired = desired.max(0.0);
    let speed = vel.length();
    let error = desired - speed;
    if error.abs() <= desired * tolerance {
        return vel;
    }

    let mut new_speed = speed + error * rate.clamp(0.0, 1.0);
    if desired == 0.0 && new_speed < 1e-3 {
        new_speed = 0.0;
    }
    let dir = vel
        .try_normalize()
        .or_else(|| heading.try_normalize())
        .unwrap_or(Vec2::X);
    dir * new_speed
}

/// Nudge each velocity component by up to `strength` of the current speed
pub fn perturb<R: Rng + ?Sized>(vel: Vec2, strength: f32, rng: &mut R) -> Vec2 {
    let amplitude = 2.0 * strength * vel.length();
    let nudge = Vec2::new(rng.random::<f32>() - 0.5, rng.random::<f32>() - 0.5) * amplitude;
    vel + nudge
}

/// Clamp into `bounds` and bounce the crossing velocity components inward
pub fn reflect_inside<R: Rng + ?Sized>(
    pos: &mut Vec2,
    vel: &mut Vec2,
    bounds: &Bounds,
    factor: &Band,
    rng: &mut R,
) -> AxisHits {
    let mut hits = AxisHits::default();

    if pos.x < bounds.min.x {
        pos.x = bounds.min.x;
        vel.x = vel.x.abs() * factor.sample(rng);
        hits.x = true;
    } else if pos.x > bounds.max.x {
        pos.x = bounds.max.x;
        vel.x = -vel.x.abs() * factor.sample(rng);
        hits.x = true;
    }

    if pos.y < bounds.min.y {
        pos.y = bounds.min.y;
        vel.y = vel.y.abs() * factor.sample(rng);
        hits.y = true;
    } else if pos.y > bounds.max.y {
        pos.y = bounds.max.y;
        vel.y = -vel.y.abs() * factor.sample(rng);
        hits.y = true;
    }

    hits
}

/// Wrap an escaping mouse that ran past `outer` to the opposite edge of `inner`
///
/// Returns the inward direction sign per wrapped axis (0 for untouched axes).
pub fn wrap_escape(pos: &mut Vec2, outer: &Bounds, inner: &Bounds) -> Option<Vec2> {
    let mut inward = Vec2::ZERO;

    if pos.x < outer.min.x {
        pos.x = inner.max.x;
        inward.x = -1.0;
    } else if pos.x > outer.max.x {
        pos.x = inner.min.x;
        inward.x = 1.0;
    }

    if pos.y < outer.min.y {
        pos.y = inner.max.y;
        inward.y = -1.0;
    } else if pos.y > outer.max.y {
        pos.y = inner.min.y;
        inward.y = 1.0;
    }

    if inward == Vec2::ZERO {
        return None;
    }
    *pos = inner.clamp(*pos);
    Some(inward)
}

/// Random heading whose wrapped components point into the arena
fn inward_heading<R: Rng + ?Sized>(inward: Vec2, rng: &mut R) -> Vec2 {
    let mut dir = random_heading(rng);
    if inward.x != 0.0 {
        dir.x = dir.x.abs().max(0.5) * inward.x;
    }
    if inward.y != 0.0 {
        dir.y = dir.y.abs().max(0.5) * inward.y;
    }
    dir.normalize_or(inward)
}

/// Integrates the mouse and resolves boundaries and captures
#[derive(Debug, Clone)]
pub struct MotionIntegrator {
    pub target: Target,
}

impl MotionIntegrator {
    pub fn new(target: Target) -> Self {
        Self { target }
    }

    /// Advance one frame
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        controller: &mut BehaviorController,
        frame: &Frame,
        dt: f32,
        rng: &mut R,
        events: &mut EventQueue,
    ) {
        let tuning = frame.tuning;
        let target = &mut self.target;
        let phase = controller.movement_phase();
        let escaping = controller.is_escaping();

        // Feints are scripted; leave their velocity alone
        if phase != MovementPhase::FakeMove {
            target.vel = reconcile_speed(
                target.vel,
                controller.desired_speed(frame),
                controller.heading(),
                tuning.reconcile_tolerance,
                tuning.reconcile_rate,
            );
            if !escaping && rng.random_bool(chance(tuning.jitter_chance)) {
                target.vel = perturb(target.vel, tuning.jitter_strength, rng);
            }
        }

        target.pos += target.vel * (dt / SIM_DT);

        let inner = frame.arena.containment(tuning.margin);
        if escaping {
            let outer = frame.arena.escape_bounds(tuning.margin, tuning.escape_overshoot);
            if let Some(inward) = wrap_escape(&mut target.pos, &outer, &inner) {
                let heading = inward_heading(inward, rng);
                controller.settle(frame.now, heading, tuning, rng);
                target.vel = heading * controller.desired_speed(frame);
                events.push(SimEvent::EscapeEnded {
                    reason: EscapeEnd::Wrap,
                });
                log::debug!("Wrapped back in at ({:.1}, {:.1})", target.pos.x, target.pos.y);
            }
            return;
        }

        let hits = reflect_inside(
            &mut target.pos,
            &mut target.vel,
            &inner,
            &tuning.bounce_factor,
            rng,
        );
        if hits.any() {
            let heading = target.vel.try_normalize().unwrap_or(controller.heading());
            controller.settle(frame.now, heading, tuning, rng);
            events.push(SimEvent::BoundaryHit {
                x: hits.x,
                y: hits.y,
            });
        }
    }

    /// Test a pointer against the mouse; on a hit the mouse flees from it
    ///
    /// A miss leaves the simulation untouched.
    pub fn capture<R: Rng + ?Sized>(
        &mut self,
        controller: &mut BehaviorController,
        point: Vec2,
        frame: &Frame,
        rng: &mut R,
        events: &mut EventQueue,
    ) -> CaptureEvent {
        let (hit, distance) = capture_test(point, self.target.pos, frame.tuning.hit_radius);
        let event = CaptureEvent {
            point,
            hit,
            distance,
            timestamp: frame.now,
        };

        if hit {
            let away = (self.target.pos - point)
                .try_normalize()
                .unwrap_or(controller.heading());
            controller.begin_capture_escape(frame.now, away, frame.tuning, rng);
            self.target.vel = controller.heading() * controller.desired_speed(frame);
            events.push(SimEvent::EscapeStarted {
                cause: EscapeCause::Capture,
            });
        }
        events.push(SimEvent::Capture(event));
        event
    }
}
