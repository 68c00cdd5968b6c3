//! Settings data types
//!
//! The settings record is a flat bag of numbers and toggles serialized to JSON
//! with Serde. Every field defaults individually, so a file written by an older
//! build (missing fields) or a newer one (extra fields) still loads.

use super::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Current settings file version
pub const CURRENT_SETTINGS_VERSION: u32 = 1;

/// Where the monitor takes its health percentage from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SimulationMode {
    /// Live reading from the health source
    #[default]
    None,
    Simulate100Hp,
    Simulate10Hp,
    /// Uses `simulated_health_percentage`
    SimulateCustomHp,
}

/// The full tunable parameter set
///
/// Fields marked "derived" are recomputed from the current health every beat
/// by the waveform loop and written back here so hosts can display them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub version: u32,

    pub config_window_movable: bool,
    pub show_health_percentage: bool,

    /// When set, `max_heart_rate` accepts any value instead of the 60-220 slider range
    pub max_heart_rate_limit_enabled: bool,
    /// When set, `min_heart_rate` accepts any value instead of the 40-100 slider range
    pub min_heart_rate_limit_enabled: bool,

    /// Upper clamp for the measured BPM
    pub max_heart_rate: f32,
    /// Lower clamp for the measured BPM
    pub min_heart_rate: f32,

    /// Number of samples in the visible waveform
    pub heart_rate_data_size: usize,

    pub spike_height: f32,
    pub small_spike_height: f32,
    /// Derived: samples per repeating spike pattern
    pub spike_interval: u32,

    pub spike_interval_at_100_percent: f32,
    pub spike_interval_at_1_percent: f32,
    /// Kept for file compatibility; the interval mapping never reads it
    pub spike_interval_at_0_percent: f32,

    /// Derived: seconds
    pub max_update_interval: f32,
    /// Seconds
    pub min_update_interval: f32,

    /// Milliseconds per frame at 0% health
    pub min_beating_speed: f32,
    /// Milliseconds per frame at 100% health
    pub max_beating_speed: f32,
    pub min_pause_between_beats: f32,
    pub max_pause_between_beats: f32,

    /// Derived: milliseconds
    pub animation_speed_ms: f32,
    /// Derived: milliseconds
    pub pause_length_ms: f32,

    pub simulation_mode: SimulationMode,
    pub simulated_health_percentage: f32,

    pub image_transparency_enabled: bool,
    pub image_transparency: f32,
    pub image_size: f32,
    pub ecg_width: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            version: CURRENT_SETTINGS_VERSION,
            config_window_movable: true,
            show_health_percentage: true,
            max_heart_rate_limit_enabled: false,
            min_heart_rate_limit_enabled: false,
            max_heart_rate: 180.0,
            min_heart_rate: 60.0,
            heart_rate_data_size: 135,
            spike_height: 1.4,
            small_spike_height: -0.3,
            spike_interval: 50,
            spike_interval_at_100_percent: 19.3,
            spike_interval_at_1_percent: 7.0,
            spike_interval_at_0_percent: 1.0,
            max_update_interval: 0.010,
            min_update_interval: 0.010,
            min_beating_speed: 6.0,
            max_beating_speed: 42.0,
            min_pause_between_beats: 0.0,
            max_pause_between_beats: 140.0,
            animation_speed_ms: 41.0,
            pause_length_ms: 140.0,
            simulation_mode: SimulationMode::None,
            simulated_health_percentage: 100.0,
            image_transparency_enabled: false,
            image_transparency: 1.0,
            image_size: 3.5,
            ecg_width: 375.0,
        }
    }
}

impl Settings {
    /// Reads a numeric parameter by name
    pub fn get(&self, key: SettingKey) -> f32 {
        match key {
            SettingKey::MaxHeartRate => self.max_heart_rate,
            SettingKey::MinHeartRate => self.min_heart_rate,
            SettingKey::HeartRateDataSize => self.heart_rate_data_size as f32,
            SettingKey::SpikeHeight => self.spike_height,
            SettingKey::SmallSpikeHeight => self.small_spike_height,
            SettingKey::SpikeInterval => self.spike_interval as f32,
            SettingKey::SpikeIntervalAt100Percent => self.spike_interval_at_100_percent,
            SettingKey::SpikeIntervalAt1Percent => self.spike_interval_at_1_percent,
            SettingKey::SpikeIntervalAt0Percent => self.spike_interval_at_0_percent,
            SettingKey::MaxUpdateInterval => self.max_update_interval,
            SettingKey::MinUpdateInterval => self.min_update_interval,
            SettingKey::MinBeatingSpeed => self.min_beating_speed,
            SettingKey::MaxBeatingSpeed => self.max_beating_speed,
            SettingKey::MinPauseBetweenBeats => self.min_pause_between_beats,
            SettingKey::MaxPauseBetweenBeats => self.max_pause_between_beats,
            SettingKey::AnimationSpeedMs => self.animation_speed_ms,
            SettingKey::PauseLengthMs => self.pause_length_ms,
            SettingKey::SimulatedHealthPercentage => self.simulated_health_percentage,
            SettingKey::ImageTransparency => self.image_transparency,
            SettingKey::ImageSize => self.image_size,
            SettingKey::EcgWidth => self.ecg_width,
        }
    }

    /// Overwrites a numeric parameter by name
    ///
    /// No validation happens here; use [`Settings::clamp_input`] first when the
    /// value comes from user input. Integer fields truncate (negative and NaN
    /// values become 0).
    pub fn set(&mut self, key: SettingKey, value: f32) {
        match key {
            SettingKey::MaxHeartRate => self.max_heart_rate = value,
            SettingKey::MinHeartRate => self.min_heart_rate = value,
            SettingKey::HeartRateDataSize => self.heart_rate_data_size = value as usize,
            SettingKey::SpikeHeight => self.spike_height = value,
            SettingKey::SmallSpikeHeight => self.small_spike_height = value,
            SettingKey::SpikeInterval => self.spike_interval = value as u32,
            SettingKey::SpikeIntervalAt100Percent => self.spike_interval_at_100_percent = value,
            SettingKey::SpikeIntervalAt1Percent => self.spike_interval_at_1_percent = value,
            SettingKey::SpikeIntervalAt0Percent => self.spike_interval_at_0_percent = value,
            SettingKey::MaxUpdateInterval => self.max_update_interval = value,
            SettingKey::MinUpdateInterval => self.min_update_interval = value,
            SettingKey::MinBeatingSpeed => self.min_beating_speed = value,
            SettingKey::MaxBeatingSpeed => self.max_beating_speed = value,
            SettingKey::MinPauseBetweenBeats => self.min_pause_between_beats = value,
            SettingKey::MaxPauseBetweenBeats => self.max_pause_between_beats = value,
            SettingKey::AnimationSpeedMs => self.animation_speed_ms = value,
            SettingKey::PauseLengthMs => self.pause_length_ms = value,
            SettingKey::SimulatedHealthPercentage => self.simulated_health_percentage = value,
            SettingKey::ImageTransparency => self.image_transparency = value,
            SettingKey::ImageSize => self.image_size = value,
            SettingKey::EcgWidth => self.ecg_width = value,
        }
    }

    /// Restores one parameter to its shipped default
    pub fn reset(&mut self, key: SettingKey) {
        self.set(key, key.default_value());
    }

    /// Applies the input rules of the configuration panel to a user-entered value
    ///
    /// Spike interval endpoints never go below 1, beat speeds and pauses never
    /// go below 0, and slider-backed fields stay inside their slider range. The
    /// heart rate bounds use their slider range only while the matching
    /// "no limit" toggle is off.
    pub fn clamp_input(&self, key: SettingKey, value: f32) -> f32 {
        let unlimited = match key {
            SettingKey::MaxHeartRate => self.max_heart_rate_limit_enabled,
            SettingKey::MinHeartRate => self.min_heart_rate_limit_enabled,
            _ => false,
        };
        if unlimited {
            return value;
        }

        let value = match key.input_range() {
            Some(range) => value.clamp(*range.start(), *range.end()),
            None => value,
        };

        // The simulated health slider works in whole percent
        if key == SettingKey::SimulatedHealthPercentage {
            value.trunc()
        } else {
            value
        }
    }
}

/// Names every numeric parameter of [`Settings`]
///
/// Keys display and parse as their snake_case field name, so a host can
/// address parameters from a command line or a generic editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    MaxHeartRate,
    MinHeartRate,
    HeartRateDataSize,
    SpikeHeight,
    SmallSpikeHeight,
    SpikeInterval,
    SpikeIntervalAt100Percent,
    SpikeIntervalAt1Percent,
    SpikeIntervalAt0Percent,
    MaxUpdateInterval,
    MinUpdateInterval,
    MinBeatingSpeed,
    MaxBeatingSpeed,
    MinPauseBetweenBeats,
    MaxPauseBetweenBeats,
    AnimationSpeedMs,
    PauseLengthMs,
    SimulatedHealthPercentage,
    ImageTransparency,
    ImageSize,
    EcgWidth,
}

impl SettingKey {
    pub const ALL: [SettingKey; 21] = [
        SettingKey::MaxHeartRate,
        SettingKey::MinHeartRate,
        SettingKey::HeartRateDataSize,
        SettingKey::SpikeHeight,
        SettingKey::SmallSpikeHeight,
        SettingKey::SpikeInterval,
        SettingKey::SpikeIntervalAt100Percent,
        SettingKey::SpikeIntervalAt1Percent,
        SettingKey::SpikeIntervalAt0Percent,
        SettingKey::MaxUpdateInterval,
        SettingKey::MinUpdateInterval,
        SettingKey::MinBeatingSpeed,
        SettingKey::MaxBeatingSpeed,
        SettingKey::MinPauseBetweenBeats,
        SettingKey::MaxPauseBetweenBeats,
        SettingKey::AnimationSpeedMs,
        SettingKey::PauseLengthMs,
        SettingKey::SimulatedHealthPercentage,
        SettingKey::ImageTransparency,
        SettingKey::ImageSize,
        SettingKey::EcgWidth,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SettingKey::MaxHeartRate => "max_heart_rate",
            SettingKey::MinHeartRate => "min_heart_rate",
            SettingKey::HeartRateDataSize => "heart_rate_data_size",
            SettingKey::SpikeHeight => "spike_height",
            SettingKey::SmallSpikeHeight => "small_spike_height",
            SettingKey::SpikeInterval => "spike_interval",
            SettingKey::SpikeIntervalAt100Percent => "spike_interval_at_100_percent",
            SettingKey::SpikeIntervalAt1Percent => "spike_interval_at_1_percent",
            SettingKey::SpikeIntervalAt0Percent => "spike_interval_at_0_percent",
            SettingKey::MaxUpdateInterval => "max_update_interval",
            SettingKey::MinUpdateInterval => "min_update_interval",
            SettingKey::MinBeatingSpeed => "min_beating_speed",
            SettingKey::MaxBeatingSpeed => "max_beating_speed",
            SettingKey::MinPauseBetweenBeats => "min_pause_between_beats",
            SettingKey::MaxPauseBetweenBeats => "max_pause_between_beats",
            SettingKey::AnimationSpeedMs => "animation_speed_ms",
            SettingKey::PauseLengthMs => "pause_length_ms",
            SettingKey::SimulatedHealthPercentage => "simulated_health_percentage",
            SettingKey::ImageTransparency => "image_transparency",
            SettingKey::ImageSize => "image_size",
            SettingKey::EcgWidth => "ecg_width",
        }
    }

    /// The shipped default, used by the per-field reset buttons
    pub fn default_value(self) -> f32 {
        Settings::default().get(self)
    }

    /// Whether the waveform loop overwrites this value every beat
    pub fn is_derived(self) -> bool {
        matches!(
            self,
            SettingKey::SpikeInterval
                | SettingKey::MaxUpdateInterval
                | SettingKey::AnimationSpeedMs
                | SettingKey::PauseLengthMs
        )
    }

    /// Range accepted from the configuration panel, if the field has one
    pub fn input_range(self) -> Option<RangeInclusive<f32>> {
        match self {
            SettingKey::MaxHeartRate => Some(60.0..=220.0),
            SettingKey::MinHeartRate => Some(40.0..=100.0),
            SettingKey::SpikeIntervalAt100Percent | SettingKey::SpikeIntervalAt1Percent => {
                Some(1.0..=f32::MAX)
            }
            SettingKey::MinBeatingSpeed
            | SettingKey::MaxBeatingSpeed
            | SettingKey::MinPauseBetweenBeats
            | SettingKey::MaxPauseBetweenBeats => Some(0.0..=f32::MAX),
            SettingKey::SimulatedHealthPercentage => Some(0.0..=100.0),
            SettingKey::ImageTransparency => Some(0.0..=1.0),
            SettingKey::ImageSize => Some(0.1..=6.0),
            SettingKey::EcgWidth => Some(0.1..=640.0),
            _ => None,
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SettingKey {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .into_iter()
            .find(|key| key.name() == s)
            .ok_or_else(|| SettingsError::UnknownKey(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, CURRENT_SETTINGS_VERSION);
        assert_eq!(settings.heart_rate_data_size, 135);
        assert_eq!(settings.spike_height, 1.4);
        assert_eq!(settings.small_spike_height, -0.3);
        assert_eq!(settings.max_heart_rate, 180.0);
        assert_eq!(settings.min_heart_rate, 60.0);
        assert_eq!(settings.simulation_mode, SimulationMode::None);
    }

    #[test]
    fn test_get_set_every_key() {
        let mut settings = Settings::default();
        for (i, key) in SettingKey::ALL.into_iter().enumerate() {
            let value = 10.0 + i as f32;
            settings.set(key, value);
            assert_eq!(settings.get(key), value, "{key}");
        }
    }

    #[test]
    fn test_set_integer_fields_truncate() {
        let mut settings = Settings::default();
        settings.set(SettingKey::SpikeInterval, 19.9);
        assert_eq!(settings.spike_interval, 19);

        settings.set(SettingKey::HeartRateDataSize, -4.0);
        assert_eq!(settings.heart_rate_data_size, 0);
    }

    #[test]
    fn test_key_names_round_trip() {
        for key in SettingKey::ALL {
            assert_eq!(key.to_string().parse::<SettingKey>().unwrap(), key);
        }
        assert!(matches!(
            "heart_beat".parse::<SettingKey>(),
            Err(SettingsError::UnknownKey(name)) if name == "heart_beat"
        ));
    }

    #[test]
    fn test_reset_restores_default() {
        let mut settings = Settings::default();
        settings.set(SettingKey::SpikeHeight, 9.0);
        settings.set(SettingKey::EcgWidth, 10.0);

        settings.reset(SettingKey::SpikeHeight);
        assert_eq!(settings.spike_height, 1.4);
        assert_eq!(settings.ecg_width, 10.0); // Untouched
    }

    #[test]
    fn test_clamp_input_rules() {
        let settings = Settings::default();
        assert_eq!(settings.clamp_input(SettingKey::SpikeIntervalAt1Percent, 0.2), 1.0);
        assert_eq!(settings.clamp_input(SettingKey::MinBeatingSpeed, -3.0), 0.0);
        assert_eq!(settings.clamp_input(SettingKey::MaxPauseBetweenBeats, 500.0), 500.0);
        assert_eq!(settings.clamp_input(SettingKey::MaxHeartRate, 300.0), 220.0);
        assert_eq!(settings.clamp_input(SettingKey::SimulatedHealthPercentage, 42.7), 42.0);
        assert_eq!(settings.clamp_input(SettingKey::SpikeHeight, -8.0), -8.0);
    }

    #[test]
    fn test_clamp_input_heart_rate_without_limit() {
        let settings = Settings {
            max_heart_rate_limit_enabled: true,
            ..Default::default()
        };
        assert_eq!(settings.clamp_input(SettingKey::MaxHeartRate, 300.0), 300.0);
        assert_eq!(settings.clamp_input(SettingKey::MinHeartRate, 10.0), 40.0);
    }

    #[test]
    fn test_derived_keys() {
        let derived: Vec<_> = SettingKey::ALL.into_iter().filter(|k| k.is_derived()).collect();
        assert_eq!(derived.len(), 4);
        assert!(!SettingKey::MinUpdateInterval.is_derived());
    }
}
