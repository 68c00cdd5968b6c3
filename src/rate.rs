//! Health percentage to heart timing
//!
//! Every value here is a linear interpolation between a pair of configured
//! bounds, driven by the health percentage. Two directions are in use:
//! - `t = 1 - health / 100` for the spike interval, the update interval and
//!   the nominal heart rate (the `at100` / first bound is reached at full health)
//! - `t = health / 100` for beat speed and pause length (the `min` bound is
//!   reached at 0% health, the `max` bound at full health), so a healthier
//!   player gets longer frame times on the heart icon

use crate::settings::Settings;
use std::time::Duration;

/// Update interval, in seconds, at full health
pub const UPDATE_INTERVAL_AT_FULL_HEALTH: f32 = 0.010;
/// Update interval, in seconds, approached at 0% health
pub const UPDATE_INTERVAL_AT_NO_HEALTH: f32 = 0.0001;

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn health_fraction(health_percent: f32) -> f32 {
    health_percent / 100.0
}

/// Samples per spike pattern, truncated and never below 1
pub fn spike_interval(health_percent: f32, settings: &Settings) -> u32 {
    let interval = lerp(
        settings.spike_interval_at_100_percent,
        settings.spike_interval_at_1_percent,
        1.0 - health_fraction(health_percent),
    );
    // `as` saturates, so NaN and negatives land on 0 before the clamp
    (interval as u32).max(1)
}

/// Milliseconds each heartbeat frame stays on screen
pub fn animation_speed_ms(health_percent: f32, settings: &Settings) -> f32 {
    lerp(
        settings.min_beating_speed,
        settings.max_beating_speed,
        health_fraction(health_percent),
    )
}

/// Milliseconds of rest after a full heartbeat cycle
pub fn pause_length_ms(health_percent: f32, settings: &Settings) -> f32 {
    lerp(
        settings.min_pause_between_beats,
        settings.max_pause_between_beats,
        health_fraction(health_percent),
    )
}

/// Seconds between waveform advances, before the `min_update_interval` floor
pub fn max_update_interval(health_percent: f32) -> f32 {
    lerp(
        UPDATE_INTERVAL_AT_FULL_HEALTH,
        UPDATE_INTERVAL_AT_NO_HEALTH,
        1.0 - health_fraction(health_percent),
    )
}

/// Nominal heart rate for the given health; diagnostic only
pub fn target_heart_rate(health_percent: f32, settings: &Settings) -> f32 {
    lerp(
        settings.min_heart_rate,
        settings.max_heart_rate,
        1.0 - health_fraction(health_percent),
    )
}

/// Whole milliseconds from a fractional setting; negative and non-finite become 0
pub fn whole_millis(ms: f32) -> u64 {
    if ms.is_finite() { ms as u64 } else { 0 }
}

/// Everything derived from one health sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateParams {
    pub health_percent: f32,
    pub spike_interval: u32,
    pub animation_speed_ms: f32,
    pub pause_length_ms: f32,
    pub max_update_interval: f32,
    pub target_heart_rate: f32,
}

impl RateParams {
    pub fn derive(health_percent: f32, settings: &Settings) -> Self {
        RateParams {
            health_percent,
            spike_interval: spike_interval(health_percent, settings),
            animation_speed_ms: animation_speed_ms(health_percent, settings),
            pause_length_ms: pause_length_ms(health_percent, settings),
            max_update_interval: max_update_interval(health_percent),
            target_heart_rate: target_heart_rate(health_percent, settings),
        }
    }

    /// Seconds of accumulated beat time needed before the waveform advances
    pub fn update_interval(&self, settings: &Settings) -> f32 {
        settings.min_update_interval.max(self.max_update_interval)
    }

    pub fn beat_ms(&self) -> u64 {
        whole_millis(self.animation_speed_ms)
    }

    pub fn pause_ms(&self) -> u64 {
        whole_millis(self.pause_length_ms)
    }

    pub fn beat_duration(&self) -> Duration {
        Duration::from_millis(self.beat_ms())
    }

    pub fn pause_duration(&self) -> Duration {
        Duration::from_millis(self.pause_ms())
    }

    /// Writes the derived values back into the settings record
    pub fn apply_to(&self, settings: &mut Settings) {
        settings.spike_interval = self.spike_interval;
        settings.animation_speed_ms = self.animation_speed_ms;
        settings.pause_length_ms = self.pause_length_ms;
        settings.max_update_interval = self.max_update_interval;
    }
}

impl Default for RateParams {
    fn default() -> Self {
        RateParams::derive(100.0, &Settings::default())
    }
}
