//! Mouse Chase entry point
//!
//! On the web the library's `wasm_bindgen(start)` hook does the setup and JS
//! drives `WebChase`. Natively this is a headless runner: a scripted chaser
//! pokes at the mouse and the outcome is logged.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use clap::Parser;
    use glam::Vec2;

    use mouse_chase::consts::*;
    use mouse_chase::platform::FrameClock;
    use mouse_chase::sim::{
        Arena, BehaviorState, ChaseState, EscapeCause, EscapeEnd, PointerEvent, SimEvent,
        TickInput, tick,
    };
    use mouse_chase::{Publisher, Settings, Snapshot};

    /// Headless evasive-mouse simulation
    #[derive(Parser, Debug)]
    #[command(author, version, about, long_about = None)]
    struct Args {
        /// RNG seed
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Display frames to run
        #[arg(short, long, default_value_t = 3600)]
        frames: u32,

        /// Display refresh rate the runner pretends to have
        #[arg(long, default_value_t = 60.0)]
        display_hz: f64,

        /// Speed factor (1-10), overrides the settings file
        #[arg(short, long)]
        speed: Option<f32>,

        /// Arena width
        #[arg(long, default_value_t = DEFAULT_ARENA_WIDTH)]
        width: f32,

        /// Arena height
        #[arg(long, default_value_t = DEFAULT_ARENA_HEIGHT)]
        height: f32,

        /// Settings JSON file
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Simulation frames between chaser taps (0 disables the chaser)
        #[arg(long, default_value_t = 20)]
        chase_interval: u64,

        /// Print the final snapshot as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    }

    /// A pointer that drifts toward the mouse and taps now and then
    struct Chaser {
        pos: Vec2,
        /// Units per simulation frame
        speed: f32,
    }

    impl Chaser {
        fn follow(&mut self, target: Vec2) {
            let to = target - self.pos;
            let step = to.length().min(self.speed);
            self.pos += to.normalize_or_zero() * step;
        }
    }

    #[derive(Debug, Default)]
    struct Tally {
        hits: u32,
        misses: u32,
        capture_escapes: u32,
        spontaneous_escapes: u32,
        cooldowns: u32,
        wraps: u32,
        bounces: u32,
        fake_moves: u32,
        /// Frames spent in Stalking, Dashing, Observing, Escaping
        frames_in: [u64; 4],
    }

    impl Tally {
        fn record(&mut self, event: &SimEvent) {
            match event {
                SimEvent::Capture(c) if c.hit => self.hits += 1,
                SimEvent::Capture(_) => self.misses += 1,
                SimEvent::BoundaryHit { .. } => self.bounces += 1,
                SimEvent::EscapeStarted {
                    cause: EscapeCause::Capture,
                } => self.capture_escapes += 1,
                SimEvent::EscapeStarted {
                    cause: EscapeCause::Spontaneous,
                } => self.spontaneous_escapes += 1,
                SimEvent::EscapeEnded {
                    reason: EscapeEnd::Cooldown,
                } => self.cooldowns += 1,
                SimEvent::EscapeEnded {
                    reason: EscapeEnd::Wrap,
                } => self.wraps += 1,
                SimEvent::FakeMove => self.fake_moves += 1,
            }
        }

        fn observe(&mut self, state: BehaviorState) {
            let slot = match state {
                BehaviorState::Stalking => 0,
                BehaviorState::Dashing => 1,
                BehaviorState::Observing => 2,
                BehaviorState::Escaping => 3,
            };
            self.frames_in[slot] += 1;
        }
    }

    fn init_logging(verbose: bool) {
        let level = if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_level(level)
            .parse_default_env()
            .init();
    }

    pub fn run() {
        let args = Args::parse();
        init_logging(args.verbose);
        log::info!("Mouse Chase (native) starting...");

        let mut settings = match &args.settings {
            Some(path) => Settings::load_or_default(path),
            None => Settings::default(),
        };
        if let Some(speed) = args.speed {
            settings.speed = speed;
        }

        let arena = Arena::new(args.width, args.height);
        let mut state = ChaseState::with_tuning(args.seed, arena, settings.tuning.clone());
        settings.apply(&mut state);
        log::info!(
            "Seed {} arena {}x{} speed {}",
            args.seed,
            state.arena.width,
            state.arena.height,
            state.speed_factor()
        );

        let mut publisher = Publisher::new(state.tuning.publish_interval);
        let mut clock = FrameClock::default();
        let mut chaser = Chaser {
            pos: arena.center(),
            speed: arena.width.max(arena.height) / 40.0,
        };
        let mut tally = Tally::default();
        let mut snapshots = 0u64;

        let display_hz = if args.display_hz.is_finite() && args.display_hz > 0.0 {
            args.display_hz
        } else {
            log::warn!("Ignoring display rate {}, using 60 Hz", args.display_hz);
            FRAME_RATE as f64
        };
        let frame_ms = 1000.0 / display_hz;

        for display_frame in 0..=args.frames {
            let steps = clock.advance(display_frame as f64 * frame_ms);
            for _ in 0..steps {
                chaser.follow(state.position());
                let mut input = TickInput::default();
                if args.chase_interval > 0 && state.frame % args.chase_interval == 0 {
                    input
                        .pointers
                        .push(PointerEvent::new(chaser.pos.x, chaser.pos.y, state.arena));
                }
                tick(&mut state, &input, SIM_DT);

                for event in state.drain_events() {
                    tally.record(&event);
                }
                tally.observe(state.behavior_state());
            }

            if let Some(snapshot) = publisher.poll(&state) {
                snapshots += 1;
                log::trace!(
                    "t={:.3} pos=({:.1}, {:.1}) {:?}/{:?}",
                    snapshot.time,
                    snapshot.position.x,
                    snapshot.position.y,
                    snapshot.behavior,
                    snapshot.phase
                );
            }
        }

        log::info!(
            "Ran {} sim frames ({:.1}s), {} snapshots",
            state.frame,
            state.time,
            snapshots
        );
        log::info!(
            "Taps: {} hits, {} misses | escapes: {} capture, {} spontaneous | ended: {} cooldown, {} wrap",
            tally.hits,
            tally.misses,
            tally.capture_escapes,
            tally.spontaneous_escapes,
            tally.cooldowns,
            tally.wraps
        );
        log::info!(
            "Bounces: {} | fake moves: {} | frames stalking/dashing/observing/escaping: {:?}",
            tally.bounces,
            tally.fake_moves,
            tally.frames_in
        );

        if args.json {
            match Snapshot::capture(&state).to_json() {
                Ok(json) => println!("{json}"),
                Err(e) => log::error!("Failed to serialize snapshot: {e}"),
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    native::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is the library's start hook, this is just to satisfy the compiler
}
