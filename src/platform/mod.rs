//! Platform abstraction layer
//!
//! Browser bindings live in `web`; the native headless runner is `main.rs`.

#[cfg(target_arch = "wasm32")]
pub mod web;

use crate::consts::{MAX_SUBSTEPS, SIM_DT};

/// Fixed-timestep accumulator turning display timestamps into `SIM_DT` steps
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    accumulator: f32,
    last_time_ms: Option<f64>,
}

impl FrameClock {
    /// Largest wall-clock gap fed into the accumulator (seconds)
    const MAX_FRAME_GAP: f32 = 0.1;

    /// Feed an animation-frame timestamp; returns how many `SIM_DT` steps to run
    pub fn advance(&mut self, time_ms: f64) -> u32 {
        let dt = match self.last_time_ms {
            Some(last) if time_ms.is_finite() && time_ms >= last => {
                ((time_ms - last) / 1000.0) as f32
            }
            _ => 0.0,
        };
        if time_ms.is_finite() {
            self.last_time_ms = Some(time_ms);
        }
        self.accumulator += dt.min(Self::MAX_FRAME_GAP);

        let mut steps = 0;
        while self.accumulator >= SIM_DT && steps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            steps += 1;
        }
        // Drop the backlog rather than spiral
        if steps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        steps
    }

    /// Forget the last timestamp (e.g. after the tab was hidden)
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.last_time_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_runs_nothing() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.advance(1000.0), 0);
    }

    #[test]
    fn test_steps_follow_wall_clock() {
        let mut clock = FrameClock::default();
        clock.advance(0.0);
        let mut total = 0;
        let mut t = 0.0;
        for _ in 0..60 {
            t += 1000.0 / 60.0;
            total += clock.advance(t);
        }
        assert!((59..=60).contains(&total), "ran {total} steps");
    }

    #[test]
    fn test_long_stall_is_capped() {
        let mut clock = FrameClock::default();
        clock.advance(0.0);
        assert_eq!(clock.advance(5000.0), MAX_SUBSTEPS);
        // Backlog was dropped
        assert!(clock.advance(5000.0) <= 1);
    }

    #[test]
    fn test_time_going_backwards_is_ignored() {
        let mut clock = FrameClock::default();
        clock.advance(1000.0);
        assert_eq!(clock.advance(500.0), 0);
        assert_eq!(clock.advance(f64::NAN), 0);
    }
}
