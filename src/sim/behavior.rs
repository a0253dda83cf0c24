//! Behavior state machine
//!
//! Decides what the mouse *wants* to do: how fast to go, when to turn, pause,
//! feint or bolt. Every timer is a deadline on the simulation clock stored
//! inside the current [`Mode`], so replacing the mode cancels whatever was
//! pending.

use glam::Vec2;
use rand::Rng;

use super::state::{
    BehaviorState, EscapeCause, EscapeEnd, EventQueue, Frame, MovementPhase, SimEvent,
};
use crate::tuning::{Band, Tuning, chance};
use crate::widths_per_sec_to_frame;

/// The mode a direct stretch runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cruise {
    Stalking,
    Dashing,
}

impl Cruise {
    fn state(self) -> BehaviorState {
        match self {
            Cruise::Stalking => BehaviorState::Stalking,
            Cruise::Dashing => BehaviorState::Dashing,
        }
    }

    fn band(self, tuning: &Tuning) -> Band {
        match self {
            Cruise::Stalking => tuning.stalking_speed,
            Cruise::Dashing => tuning.dashing_speed,
        }
    }
}

/// Beats of the scripted feint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeBeat {
    /// Fast lunge along the heading
    Lunge,
    /// Back off the way it came
    Reverse,
}

/// Controller mode; `until` is the deadline of the current step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    Direct {
        cruise: Cruise,
        until: f64,
    },
    Turning {
        cruise: Cruise,
        until: f64,
    },
    Pausing {
        cruise: Cruise,
        until: f64,
    },
    /// Feint inside a direct stretch; `resume_until` is that stretch's deadline
    FakeMove {
        cruise: Cruise,
        beat: FakeBeat,
        until: f64,
        resume_until: f64,
    },
    Escaping {
        cause: EscapeCause,
        until: f64,
    },
}

impl Mode {
    pub fn behavior_state(&self) -> BehaviorState {
        match *self {
            Mode::Direct { cruise, .. }
            | Mode::Turning { cruise, .. }
            | Mode::FakeMove { cruise, .. } => cruise.state(),
            Mode::Pausing { .. } => BehaviorState::Observing,
            Mode::Escaping { .. } => BehaviorState::Escaping,
        }
    }

    pub fn movement_phase(&self) -> MovementPhase {
        match self {
            Mode::Direct { .. } | Mode::Escaping { .. } => MovementPhase::Direct,
            Mode::Turning { .. } => MovementPhase::Turning,
            Mode::Pausing { .. } => MovementPhase::Pausing,
            Mode::FakeMove { .. } => MovementPhase::FakeMove,
        }
    }

    pub fn deadline(&self) -> f64 {
        match *self {
            Mode::Direct { until, .. }
            | Mode::Turning { until, .. }
            | Mode::Pausing { until, .. }
            | Mode::FakeMove { until, .. }
            | Mode::Escaping { until, .. } => until,
        }
    }
}

/// Random unit heading
pub fn random_heading<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    Vec2::from_angle(rng.random::<f32>() * std::f32::consts::TAU)
}

/// Picks speeds and headings for the mouse
#[derive(Debug, Clone)]
pub struct BehaviorController {
    mode: Mode,
    /// Sampled speed for the current stretch (arena widths per second)
    speed: f32,
    /// Unit heading, kept in sync with the velocity whenever it is non-zero
    heading: Vec2,
    next_spontaneous_escape: f64,
}

impl BehaviorController {
    pub fn new<R: Rng + ?Sized>(now: f64, tuning: &Tuning, rng: &mut R) -> Self {
        let mut controller = Self {
            mode: Mode::Direct {
                cruise: Cruise::Stalking,
                until: now,
            },
            speed: 0.0,
            heading: Vec2::X,
            next_spontaneous_escape: now + tuning.spontaneous_escape_first.sample(rng) as f64,
        };
        let heading = random_heading(rng);
        controller.settle(now, heading, tuning, rng);
        controller
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[cfg(test)]
    pub(crate) fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn behavior_state(&self) -> BehaviorState {
        self.mode.behavior_state()
    }

    pub fn movement_phase(&self) -> MovementPhase {
        self.mode.movement_phase()
    }

    pub fn is_escaping(&self) -> bool {
        matches!(self.mode, Mode::Escaping { .. })
    }

    pub fn heading(&self) -> Vec2 {
        self.heading
    }

    /// Pending escape reversion, if escaping
    pub fn escape_deadline(&self) -> Option<f64> {
        match self.mode {
            Mode::Escaping { until, .. } => Some(until),
            _ => None,
        }
    }

    pub fn next_spontaneous_escape(&self) -> f64 {
        self.next_spontaneous_escape
    }

    /// Target speed magnitude (units/frame) for the current mode
    pub fn desired_speed(&self, frame: &Frame) -> f32 {
        let widths = match self.mode {
            Mode::Pausing { .. } => 0.0,
            Mode::FakeMove {
                beat: FakeBeat::Lunge,
                ..
            } => self.speed * frame.tuning.fake_lunge_multiplier,
            _ => self.speed,
        };
        widths_per_sec_to_frame(widths, frame.arena.width, frame.speed_factor)
    }

    /// Re-seed to stalking/direct with a fresh speed and phase deadline
    ///
    /// Returns true if this ended an escape.
    pub fn settle<R: Rng + ?Sized>(
        &mut self,
        now: f64,
        heading: Vec2,
        tuning: &Tuning,
        rng: &mut R,
    ) -> bool {
        let was_escaping = self.is_escaping();
        self.mode = Mode::Direct {
            cruise: Cruise::Stalking,
            until: now + tuning.direct_duration.sample(rng) as f64,
        };
        self.speed = tuning.stalking_speed.sample(rng);
        if let Some(h) = heading.try_normalize() {
            self.heading = h;
        }
        was_escaping
    }

    /// Flee from a capture attempt along `away`
    ///
    /// Overwrites any pending reversion, so repeated hits never stack.
    pub fn begin_capture_escape<R: Rng + ?Sized>(
        &mut self,
        now: f64,
        away: Vec2,
        tuning: &Tuning,
        rng: &mut R,
    ) {
        let until = now + tuning.capture_cooldown as f64;
        self.speed = tuning.stalking_speed.min * tuning.capture_escape_multiplier.sample(rng);
        self.enter_escape(EscapeCause::Capture, away, until);
        self.next_spontaneous_escape = self
            .next_spontaneous_escape
            .max(until + tuning.spontaneous_escape_rearm.min as f64);
        log::debug!("Capture escape until t={until:.3}");
    }

    fn enter_escape(&mut self, cause: EscapeCause, heading: Vec2, until: f64) {
        if let Some(h) = heading.try_normalize() {
            self.heading = h;
        }
        self.mode = Mode::Escaping { cause, until };
    }

    /// Advance timers and apply any transition that is due
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        frame: &Frame,
        pos: Vec2,
        vel: &mut Vec2,
        rng: &mut R,
        events: &mut EventQueue,
    ) {
        let now = frame.now;
        let tuning = frame.tuning;

        if let Some(h) = vel.try_normalize() {
            self.heading = h;
        }

        if !self.is_escaping() && now >= self.next_spontaneous_escape {
            self.next_spontaneous_escape = now + tuning.spontaneous_escape_rearm.sample(rng) as f64;
            let heading = (pos - frame.arena.center())
                .try_normalize()
                .unwrap_or_else(|| random_heading(rng));
            self.speed = tuning.escaping_speed.sample(rng);
            self.enter_escape(
                EscapeCause::Spontaneous,
                heading,
                now + tuning.spontaneous_escape_max as f64,
            );
            *vel = self.heading * self.desired_speed(frame);
            events.push(SimEvent::EscapeStarted {
                cause: EscapeCause::Spontaneous,
            });
            log::debug!("Spontaneous escape at t={now:.3}");
            return;
        }

        match self.mode {
            Mode::Escaping { until, .. } => {
                if now >= until {
                    let heading = random_heading(rng);
                    self.settle(now, heading, tuning, rng);
                    *vel = self.heading * self.desired_speed(frame);
                    events.push(SimEvent::EscapeEnded {
                        reason: EscapeEnd::Cooldown,
                    });
                    log::debug!("Escape cooled down at t={now:.3}");
                }
            }
            Mode::Direct { cruise, until } => {
                if now >= until {
                    self.turn(now, vel, tuning, rng);
                } else if rng.random_bool(chance(tuning.fake_move_chance)) {
                    // The feint spends the stretch's own time
                    self.mode = Mode::FakeMove {
                        cruise,
                        beat: FakeBeat::Lunge,
                        until: now + tuning.fake_lunge_duration.sample(rng) as f64,
                        resume_until: until,
                    };
                    *vel = self.heading * self.desired_speed(frame);
                    events.push(SimEvent::FakeMove);
                }
            }
            Mode::Turning { cruise, until } => {
                if now >= until {
                    self.mode = Mode::Pausing {
                        cruise,
                        until: now + tuning.pause_duration.sample(rng) as f64,
                    };
                    *vel = Vec2::ZERO;
                }
            }
            Mode::Pausing { cruise, until } => {
                // Speed was picked at the turn; the integrator ramps back up
                if now >= until {
                    self.mode = Mode::Direct {
                        cruise,
                        until: now + tuning.direct_duration.sample(rng) as f64,
                    };
                }
            }
            Mode::FakeMove {
                cruise,
                beat: FakeBeat::Lunge,
                until,
                resume_until,
            } => {
                if now >= until {
                    self.heading = -self.heading;
                    self.mode = Mode::FakeMove {
                        cruise,
                        beat: FakeBeat::Reverse,
                        until: now + tuning.fake_recover_duration as f64,
                        resume_until,
                    };
                    *vel = self.heading * self.desired_speed(frame);
                }
            }
            Mode::FakeMove {
                cruise,
                beat: FakeBeat::Reverse,
                until,
                resume_until,
            } => {
                if now >= until {
                    self.mode = Mode::Direct {
                        cruise,
                        until: resume_until,
                    };
                }
            }
        }
    }

    /// Direct stretch is over: swing the heading and pick the next cruise mode
    fn turn<R: Rng + ?Sized>(&mut self, now: f64, vel: &mut Vec2, tuning: &Tuning, rng: &mut R) {
        let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let angle = tuning.turn_degrees.sample(rng).to_radians() * sign;
        let rotation = Vec2::from_angle(angle);
        self.heading = rotation.rotate(self.heading).normalize_or(Vec2::X);
        *vel = rotation.rotate(*vel);

        let cruise = if rng.random_bool(chance(tuning.dash_chance)) {
            Cruise::Dashing
        } else {
            Cruise::Stalking
        };
        self.speed = cruise.band(tuning).sample(rng);
        self.mode = Mode::Turning {
            cruise,
            until: now + tuning.turning_duration as f64,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Arena;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn quiet_tuning() -> Tuning {
        Tuning {
            fake_move_chance: 0.0,
            jitter_chance: 0.0,
            ..Tuning::default()
        }
    }

    fn frame(now: f64, tuning: &Tuning) -> Frame<'_> {
        Frame {
            now,
            arena: Arena::new(800.0, 600.0),
            speed_factor: crate::consts::DEFAULT_SPEED_FACTOR,
            tuning,
        }
    }

    #[test]
    fn test_starts_stalking_direct() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let c = BehaviorController::new(0.0, &tuning, &mut rng);
        assert_eq!(c.behavior_state(), BehaviorState::Stalking);
        assert_eq!(c.movement_phase(), MovementPhase::Direct);
        assert!(tuning.spontaneous_escape_first.contains(c.next_spontaneous_escape() as f32));
        assert!((c.heading().length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_phase_cycle_order() {
        let tuning = quiet_tuning();
        let mut rng = Pcg32::seed_from_u64(2);
        let mut events = EventQueue::default();
        let mut c = BehaviorController::new(0.0, &tuning, &mut rng);
        let mut vel = Vec2::new(5.0, 0.0);
        let pos = Vec2::new(400.0, 300.0);

        // Direct → Turning once the deadline passes
        let t = c.mode().deadline();
        c.tick(&frame(t, &tuning), pos, &mut vel, &mut rng, &mut events);
        assert_eq!(c.movement_phase(), MovementPhase::Turning);
        assert!(matches!(
            c.behavior_state(),
            BehaviorState::Stalking | BehaviorState::Dashing
        ));

        // Turning → Pausing zeroes velocity and observes
        let t = c.mode().deadline();
        c.tick(&frame(t, &tuning), pos, &mut vel, &mut rng, &mut events);
        assert_eq!(c.movement_phase(), MovementPhase::Pausing);
        assert_eq!(c.behavior_state(), BehaviorState::Observing);
        assert_eq!(vel, Vec2::ZERO);
        assert_eq!(c.desired_speed(&frame(t, &tuning)), 0.0);

        // Pausing → Direct
        let t = c.mode().deadline();
        c.tick(&frame(t, &tuning), pos, &mut vel, &mut rng, &mut events);
        assert_eq!(c.movement_phase(), MovementPhase::Direct);
        assert!(c.desired_speed(&frame(t, &tuning)) > 0.0);
    }

    #[test]
    fn test_phase_does_not_change_before_deadline() {
        let tuning = quiet_tuning();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut events = EventQueue::default();
        let mut c = BehaviorController::new(0.0, &tuning, &mut rng);
        let mut vel = Vec2::new(5.0, 0.0);
        let before = c.mode();
        c.tick(
            &frame(before.deadline() - 0.01, &tuning),
            Vec2::new(400.0, 300.0),
            &mut vel,
            &mut rng,
            &mut events,
        );
        assert_eq!(c.mode(), before);
        assert_eq!(vel, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_turn_angle_within_band() {
        let tuning = quiet_tuning();
        let mut events = EventQueue::default();
        for seed in 0..50 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut c = BehaviorController::new(0.0, &tuning, &mut rng);
            let mut vel = Vec2::new(6.0, 0.0);
            let t = c.mode().deadline();
            c.tick(&frame(t, &tuning), Vec2::new(400.0, 300.0), &mut vel, &mut rng, &mut events);

            let turned = vel.y.atan2(vel.x).abs().to_degrees();
            assert!(
                (29.9..=90.1).contains(&turned),
                "seed {seed}: turned {turned} degrees"
            );
            assert!((vel.length() - 6.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_fake_move_sequence() {
        let tuning = Tuning {
            fake_move_chance: 1.0,
            ..quiet_tuning()
        };
        let mut rng = Pcg32::seed_from_u64(4);
        let mut events = EventQueue::default();
        let mut c = BehaviorController::new(0.0, &tuning, &mut rng);
        let pos = Vec2::new(400.0, 300.0);
        let mut vel = Vec2::new(3.0, 0.0);
        let stretch_end = c.mode().deadline();

        // Lunge fires immediately and speeds up along the heading
        c.tick(&frame(0.0, &tuning), pos, &mut vel, &mut rng, &mut events);
        assert_eq!(c.movement_phase(), MovementPhase::FakeMove);
        assert_eq!(events.to_vec(), &[SimEvent::FakeMove]);
        let cruise = widths_per_sec_to_frame(c.speed, 800.0, crate::consts::DEFAULT_SPEED_FACTOR);
        assert!((vel.length() - cruise * tuning.fake_lunge_multiplier).abs() < 1e-3);
        assert!(vel.x > 0.0);

        // Reversal after the lunge beat
        let lunge_end = c.mode().deadline();
        assert!(tuning.fake_lunge_duration.contains(lunge_end as f32));
        c.tick(&frame(lunge_end, &tuning), pos, &mut vel, &mut rng, &mut events);
        assert!(matches!(
            c.mode(),
            Mode::FakeMove {
                beat: FakeBeat::Reverse,
                ..
            }
        ));
        assert!(vel.x < 0.0);
        assert!((vel.length() - cruise).abs() < 1e-3);

        // Back to normal direct travel 200 ms later
        let reverse_end = c.mode().deadline();
        assert!((reverse_end - lunge_end - tuning.fake_recover_duration as f64).abs() < 1e-9);
        c.tick(&frame(reverse_end, &tuning), pos, &mut vel, &mut rng, &mut events);
        assert_eq!(c.movement_phase(), MovementPhase::Direct);
        // The interrupted stretch keeps its deadline
        assert_eq!(c.mode().deadline(), stretch_end);
    }

    #[test]
    fn test_feints_do_not_starve_the_phase_cycle() {
        let tuning = Tuning {
            fake_move_chance: 1.0,
            ..quiet_tuning()
        };
        let dt = crate::consts::SIM_DT as f64;
        let pos = Vec2::new(400.0, 300.0);
        for seed in 0..20 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut events = EventQueue::default();
            let mut c = BehaviorController::new(0.0, &tuning, &mut rng);
            let mut vel = Vec2::new(3.0, 0.0);
            let stretch_end = c.mode().deadline();
            let limit = stretch_end
                + tuning.fake_lunge_duration.max as f64
                + tuning.fake_recover_duration as f64
                + 4.0 * dt;

            let mut now = 0.0;
            while c.movement_phase() != MovementPhase::Turning && now <= limit {
                now += dt;
                c.tick(&frame(now, &tuning), pos, &mut vel, &mut rng, &mut events);
            }
            assert_eq!(
                c.movement_phase(),
                MovementPhase::Turning,
                "seed {seed}: no turn by t={now:.3} (stretch ended at {stretch_end:.3})"
            );
            assert!(events.iter().any(|e| *e == SimEvent::FakeMove));
        }
    }

    #[test]
    fn test_spontaneous_escape_points_away_from_center() {
        let tuning = quiet_tuning();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut events = EventQueue::default();
        let mut c = BehaviorController::new(0.0, &tuning, &mut rng);
        let mut vel = Vec2::new(1.0, 0.0);
        let t = c.next_spontaneous_escape();

        // Mouse sits left of center, so it bolts further left
        let pos = Vec2::new(100.0, 300.0);
        c.tick(&frame(t, &tuning), pos, &mut vel, &mut rng, &mut events);
        assert!(c.is_escaping());
        assert!(vel.x < 0.0);
        assert!(vel.y.abs() < 1e-4);
        assert!(tuning.spontaneous_escape_rearm.contains((c.next_spontaneous_escape() - t) as f32));
        assert_eq!(
            events.to_vec(),
            &[SimEvent::EscapeStarted {
                cause: EscapeCause::Spontaneous
            }]
        );
    }

    #[test]
    fn test_capture_escape_replaces_deadline() {
        let tuning = quiet_tuning();
        let mut rng = Pcg32::seed_from_u64(6);
        let mut c = BehaviorController::new(0.0, &tuning, &mut rng);

        c.begin_capture_escape(1.0, Vec2::new(-1.0, 0.0), &tuning, &mut rng);
        assert_eq!(c.escape_deadline(), Some(1.0 + tuning.capture_cooldown as f64));

        c.begin_capture_escape(1.5, Vec2::new(0.0, 1.0), &tuning, &mut rng);
        assert_eq!(c.escape_deadline(), Some(1.5 + tuning.capture_cooldown as f64));
        assert_eq!(c.heading(), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_cooldown_expiry_reverts_to_stalking() {
        let tuning = quiet_tuning();
        let mut rng = Pcg32::seed_from_u64(7);
        let mut events = EventQueue::default();
        let mut c = BehaviorController::new(0.0, &tuning, &mut rng);
        let pos = Vec2::new(400.0, 300.0);
        let mut vel = Vec2::new(-20.0, 0.0);

        c.begin_capture_escape(1.0, Vec2::new(-1.0, 0.0), &tuning, &mut rng);
        c.tick(&frame(1.5, &tuning), pos, &mut vel, &mut rng, &mut events);
        assert!(c.is_escaping());

        let deadline = c.escape_deadline().unwrap();
        c.tick(&frame(deadline, &tuning), pos, &mut vel, &mut rng, &mut events);
        assert_eq!(c.behavior_state(), BehaviorState::Stalking);
        assert_eq!(c.movement_phase(), MovementPhase::Direct);
        assert!(vel.length() > 0.0);
        assert_eq!(
            events.to_vec(),
            &[SimEvent::EscapeEnded {
                reason: EscapeEnd::Cooldown
            }]
        );
    }

    #[test]
    fn test_capture_escape_defers_spontaneous_timer() {
        let tuning = quiet_tuning();
        let mut rng = Pcg32::seed_from_u64(8);
        let mut c = BehaviorController::new(0.0, &tuning, &mut rng);
        let due = c.next_spontaneous_escape();

        c.begin_capture_escape(due - 0.1, Vec2::X, &tuning, &mut rng);
        assert!(c.next_spontaneous_escape() > c.escape_deadline().unwrap());
    }

    #[test]
    fn test_settle_resets_from_any_mode() {
        let tuning = quiet_tuning();
        let mut rng = Pcg32::seed_from_u64(9);
        let mut c = BehaviorController::new(0.0, &tuning, &mut rng);

        c.mode = Mode::FakeMove {
            cruise: Cruise::Dashing,
            beat: FakeBeat::Lunge,
            until: 5.0,
            resume_until: 6.0,
        };
        assert!(!c.settle(1.0, Vec2::new(0.0, -3.0), &tuning, &mut rng));
        assert_eq!(c.behavior_state(), BehaviorState::Stalking);
        assert_eq!(c.movement_phase(), MovementPhase::Direct);
        assert_eq!(c.heading(), Vec2::new(0.0, -1.0));
        assert!(tuning.stalking_speed.contains(c.speed));

        c.begin_capture_escape(2.0, Vec2::X, &tuning, &mut rng);
        assert!(c.settle(2.1, Vec2::X, &tuning, &mut rng));
    }
}
