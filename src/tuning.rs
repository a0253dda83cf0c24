//! Data-driven behavior balance
//!
//! Every number that shapes how the mouse moves lives here so it can be
//! tweaked from JSON without recompiling. Speeds are quoted in arena widths
//! per second at the default speed factor; durations are in seconds.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Closed interval sampled uniformly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f32,
    pub max: f32,
}

impl Band {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// A band that always samples to `value`
    pub const fn fixed(value: f32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Uniform sample in [min, max]
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        self.min + (self.max - self.min) * rng.random::<f32>()
    }

    #[inline]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    fn validate(&self, field: &'static str) -> ConfigResult<()> {
        non_negative(field, self.min)?;
        non_negative(field, self.max)?;
        if self.min > self.max {
            return Err(ConfigError::InvertedBand {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Probability for `Rng::random_bool`; out-of-range values clamp and NaN never fires
#[inline]
pub fn chance(p: f32) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0) as f64
    }
}

fn non_negative(field: &'static str, value: f32) -> ConfigResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn probability(field: &'static str, value: f32) -> ConfigResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Probability { field, value })
    }
}

/// Behavior and motion tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Arena ===
    /// Distance from each arena edge the mouse is kept inside
    pub margin: f32,
    /// How far past the arena an escaping mouse may run before wrapping
    pub escape_overshoot: f32,

    // === Capture ===
    /// Pointer distance that counts as a catch attempt hit
    pub hit_radius: f32,
    /// Escape speed after a hit, as a multiple of the base (slowest stalking) speed
    pub capture_escape_multiplier: Band,
    /// How long a capture-triggered escape lasts
    pub capture_cooldown: f32,

    // === Speeds (arena widths per second) ===
    pub stalking_speed: Band,
    pub dashing_speed: Band,
    pub escaping_speed: Band,

    // === Phase cycle ===
    pub direct_duration: Band,
    pub turning_duration: f32,
    /// Heading change at each turn, degrees (sign chosen at random)
    pub turn_degrees: Band,
    pub pause_duration: Band,
    /// Chance a turn switches the next stretch to dashing
    pub dash_chance: f32,

    // === Fake move ===
    /// Per-tick chance of a fake move while travelling directly
    pub fake_move_chance: f32,
    pub fake_lunge_multiplier: f32,
    pub fake_lunge_duration: Band,
    pub fake_recover_duration: f32,

    // === Spontaneous escape ===
    pub spontaneous_escape_first: Band,
    pub spontaneous_escape_rearm: Band,
    pub spontaneous_escape_max: f32,

    // === Motion ===
    /// Wall bounce speed factor
    pub bounce_factor: Band,
    /// Relative speed error tolerated before reconciling
    pub reconcile_tolerance: f32,
    /// Fraction of the speed error closed per frame
    pub reconcile_rate: f32,
    pub jitter_chance: f32,
    /// Jitter amplitude relative to current speed
    pub jitter_strength: f32,

    // === Feedback ===
    pub trail_length: usize,
    pub escaping_trail_length: usize,
    pub trail_max_age: f32,
    pub miss_ripple_lifetime: f32,
    pub hit_ripple_lifetime: f32,
    pub max_ripples: usize,

    /// Minimum simulation time between published snapshots
    pub publish_interval: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            margin: 25.0,
            escape_overshoot: 100.0,

            hit_radius: 80.0,
            capture_escape_multiplier: Band::new(2.5, 4.0),
            capture_cooldown: 0.8,

            stalking_speed: Band::new(0.8, 1.5),
            dashing_speed: Band::new(2.0, 3.0),
            escaping_speed: Band::new(2.5, 3.0),

            direct_duration: Band::new(0.3, 0.8),
            turning_duration: 0.1,
            turn_degrees: Band::new(30.0, 90.0),
            pause_duration: Band::new(0.15, 0.3),
            dash_chance: 0.3,

            fake_move_chance: 0.05,
            fake_lunge_multiplier: 2.0,
            fake_lunge_duration: Band::new(0.08, 0.12),
            fake_recover_duration: 0.2,

            spontaneous_escape_first: Band::new(10.0, 30.0),
            spontaneous_escape_rearm: Band::new(20.0, 40.0),
            spontaneous_escape_max: 2.0,

            bounce_factor: Band::new(0.8, 1.2),
            reconcile_tolerance: 0.1,
            reconcile_rate: 0.15,
            jitter_chance: 0.02,
            jitter_strength: 0.1,

            trail_length: 10,
            escaping_trail_length: 15,
            trail_max_age: 1.0,
            miss_ripple_lifetime: 0.6,
            hit_ripple_lifetime: 0.8,
            max_ripples: 16,

            publish_interval: 1.0 / 30.0,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON (missing fields take defaults) and validate it
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        non_negative("margin", self.margin)?;
        non_negative("escape_overshoot", self.escape_overshoot)?;
        non_negative("hit_radius", self.hit_radius)?;
        self.capture_escape_multiplier
            .validate("capture_escape_multiplier")?;
        non_negative("capture_cooldown", self.capture_cooldown)?;

        self.stalking_speed.validate("stalking_speed")?;
        self.dashing_speed.validate("dashing_speed")?;
        self.escaping_speed.validate("escaping_speed")?;

        self.direct_duration.validate("direct_duration")?;
        non_negative("turning_duration", self.turning_duration)?;
        self.turn_degrees.validate("turn_degrees")?;
        self.pause_duration.validate("pause_duration")?;
        probability("dash_chance", self.dash_chance)?;

        probability("fake_move_chance", self.fake_move_chance)?;
        non_negative("fake_lunge_multiplier", self.fake_lunge_multiplier)?;
        self.fake_lunge_duration.validate("fake_lunge_duration")?;
        non_negative("fake_recover_duration", self.fake_recover_duration)?;

        self.spontaneous_escape_first
            .validate("spontaneous_escape_first")?;
        self.spontaneous_escape_rearm
            .validate("spontaneous_escape_rearm")?;
        non_negative("spontaneous_escape_max", self.spontaneous_escape_max)?;

        self.bounce_factor.validate("bounce_factor")?;
        non_negative("reconcile_tolerance", self.reconcile_tolerance)?;
        probability("reconcile_rate", self.reconcile_rate)?;
        probability("jitter_chance", self.jitter_chance)?;
        non_negative("jitter_strength", self.jitter_strength)?;

        non_negative("trail_max_age", self.trail_max_age)?;
        non_negative("miss_ripple_lifetime", self.miss_ripple_lifetime)?;
        non_negative("hit_ripple_lifetime", self.hit_ripple_lifetime)?;
        non_negative("publish_interval", self.publish_interval)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_defaults_validate() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_band_sample_stays_inside() {
        let mut rng = Pcg32::seed_from_u64(7);
        let band = Band::new(0.3, 0.8);
        for _ in 0..1000 {
            let v = band.sample(&mut rng);
            assert!(band.contains(v), "{v} outside band");
        }
        assert_eq!(Band::fixed(2.0).sample(&mut rng), 2.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "hit_radius": 90.0, "margin": 40.0 }"#).unwrap();
        assert_eq!(tuning.hit_radius, 90.0);
        assert_eq!(tuning.margin, 40.0);
        assert_eq!(tuning.stalking_speed, Tuning::default().stalking_speed);
    }

    #[test]
    fn test_inverted_band_rejected() {
        let json = r#"{ "dashing_speed": { "min": 3.0, "max": 2.0 } }"#;
        match Tuning::from_json(json) {
            Err(ConfigError::InvertedBand { field, .. }) => assert_eq!(field, "dashing_speed"),
            other => panic!("expected inverted band error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_probability_rejected() {
        let json = r#"{ "fake_move_chance": 1.5 }"#;
        assert!(matches!(
            Tuning::from_json(json),
            Err(ConfigError::Probability { .. })
        ));
    }

    #[test]
    fn test_chance_is_always_a_valid_probability() {
        assert_eq!(chance(0.3), 0.3f32 as f64);
        assert_eq!(chance(-2.0), 0.0);
        assert_eq!(chance(7.0), 1.0);
        assert_eq!(chance(f32::NAN), 0.0);
        assert_eq!(chance(f32::INFINITY), 1.0);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            Tuning::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
