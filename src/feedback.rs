//! Trail and ripple buffers
//!
//! Plain data the presentation layer turns into a rainbow trail and touch
//! ripples. Nothing here feeds back into the simulation.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::CaptureEvent;
use crate::tuning::Tuning;

/// A recent mouse position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub pos: Vec2,
    /// Seconds since the point was recorded
    pub age: f32,
}

/// Where a pointer landed, and whether it was a hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ripple {
    pub point: Vec2,
    pub hit: bool,
    pub age: f32,
    pub lifetime: f32,
}

impl Ripple {
    /// 0 when fresh, 1 when about to vanish
    pub fn progress(&self) -> f32 {
        if self.lifetime > 0.0 {
            (self.age / self.lifetime).min(1.0)
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone)]
pub struct Feedback {
    pub trails_enabled: bool,
    pub ripples_enabled: bool,
    /// Newest first
    trail: VecDeque<TrailPoint>,
    ripples: Vec<Ripple>,
}

impl Default for Feedback {
    fn default() -> Self {
        Self {
            trails_enabled: true,
            ripples_enabled: true,
            trail: VecDeque::new(),
            ripples: Vec::new(),
        }
    }
}

impl Feedback {
    pub fn trail(&self) -> impl Iterator<Item = &TrailPoint> {
        self.trail.iter()
    }

    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }

    pub fn ripples(&self) -> &[Ripple] {
        &self.ripples
    }

    /// Age everything, drop what expired, then record the current position
    pub fn record_frame(&mut self, pos: Vec2, escaping: bool, dt: f32, tuning: &Tuning) {
        for point in &mut self.trail {
            point.age += dt;
        }
        self.trail.retain(|p| p.age < tuning.trail_max_age);

        for ripple in &mut self.ripples {
            ripple.age += dt;
        }
        self.ripples.retain(|r| r.age < r.lifetime);

        if !self.trails_enabled {
            self.trail.clear();
            return;
        }

        // Escaping mice leave a longer tail
        let max_len = if escaping {
            tuning.escaping_trail_length
        } else {
            tuning.trail_length
        };
        self.trail.push_front(TrailPoint { pos, age: 0.0 });
        self.trail.truncate(max_len);
    }

    pub fn push_ripple(&mut self, capture: &CaptureEvent, tuning: &Tuning) {
        if !self.ripples_enabled || tuning.max_ripples == 0 {
            return;
        }
        if self.ripples.len() >= tuning.max_ripples {
            self.ripples.remove(0);
        }
        let lifetime = if capture.hit {
            tuning.hit_ripple_lifetime
        } else {
            tuning.miss_ripple_lifetime
        };
        self.ripples.push(Ripple {
            point: capture.point,
            hit: capture.hit,
            age: 0.0,
            lifetime,
        });
    }

    pub fn clear(&mut self) {
        self.trail.clear();
        self.ripples.clear();
    }
}
