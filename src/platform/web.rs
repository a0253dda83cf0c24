//! Browser bindings
//!
//! JS owns the DOM and drawing; it calls `frame` from `requestAnimationFrame`
//! and forwards pointer/touch events in canvas-local CSS pixels.

use wasm_bindgen::prelude::*;

use super::FrameClock;
use crate::consts::SIM_DT;
use crate::publish::Publisher;
use crate::settings::Settings;
use crate::sim::{Arena, ChaseState, PointerEvent, TickInput, tick};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        // Logger already installed by a previous instance
        log::debug!("console_log already initialized");
    }
    log::info!("Mouse Chase starting...");
}

/// One chase session bound to a canvas
#[wasm_bindgen]
pub struct WebChase {
    state: ChaseState,
    settings: Settings,
    publisher: Publisher,
    clock: FrameClock,
}

#[wasm_bindgen]
impl WebChase {
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32) -> WebChase {
        let seed = js_sys::Date::now() as u64;
        let settings = Settings::load();
        let mut state = ChaseState::with_tuning(seed, Arena::new(width, height), settings.tuning.clone());
        settings.apply(&mut state);
        let mut publisher = Publisher::new(settings.tuning.publish_interval);
        publisher.force();

        log::info!("Chase initialized with seed: {}", seed);

        WebChase {
            state,
            settings,
            publisher,
            clock: FrameClock::default(),
        }
    }

    /// Run the simulation up to `time_ms`; returns snapshot JSON when one is due
    pub fn frame(&mut self, time_ms: f64) -> Option<String> {
        let steps = self.clock.advance(time_ms);
        let input = TickInput::default();
        for _ in 0..steps {
            tick(&mut self.state, &input, SIM_DT);
        }

        // Nothing consumes sim events on the web yet
        self.state.drain_events();

        let snapshot = self.publisher.poll(&self.state)?;
        match snapshot.to_json() {
            Ok(json) => Some(json),
            Err(e) => {
                log::warn!("Failed to serialize snapshot: {e}");
                None
            }
        }
    }

    /// Pointer/touch at canvas-local `(x, y)` on a `width` x `height` canvas
    ///
    /// Returns true on a hit.
    pub fn pointer(&mut self, x: f32, y: f32, width: f32, height: f32) -> bool {
        let event = PointerEvent::new(x, y, Arena::new(width, height));
        let hit = self
            .state
            .pointer_event(event)
            .is_some_and(|capture| capture.hit);
        if hit {
            self.publisher.force();
        }
        hit
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.state.resize(Arena::new(width, height));
        self.publisher.force();
    }

    /// Speed slider moved (persisted)
    pub fn set_speed(&mut self, speed: f32) {
        self.settings.speed = speed;
        self.state.set_speed_factor(self.settings.effective_speed_factor());
        self.settings.save();
    }

    pub fn speed(&self) -> f32 {
        self.state.speed_factor()
    }

    /// Tab hidden: stop the accumulator from catching up on return
    pub fn pause_clock(&mut self) {
        self.clock.reset();
    }

    pub fn x(&self) -> f32 {
        self.state.position().x
    }

    pub fn y(&self) -> f32 {
        self.state.position().y
    }

    pub fn is_escaping(&self) -> bool {
        self.state.is_escaping()
    }

    pub fn behavior(&self) -> String {
        format!("{:?}", self.state.behavior_state())
    }

    pub fn phase(&self) -> String {
        format!("{:?}", self.state.movement_phase())
    }
}
