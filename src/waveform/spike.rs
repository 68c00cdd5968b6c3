//! Spike pattern generator
//!
//! The waveform repeats every `spike_interval` samples. Within one repetition
//! a fixed table of phases carries the amplitude; every other phase is flat.

use crate::settings::Settings;

/// Multiplier applied to every sample before it enters the waveform buffer
pub const DISPLAY_SCALE: f32 = 20.0;

/// Amplitudes of the tall and the small spike
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeHeights {
    pub spike: f32,
    pub small: f32,
}

impl SpikeHeights {
    pub const FLAT: SpikeHeights = SpikeHeights {
        spike: 0.0,
        small: 0.0,
    };

    pub fn from_settings(settings: &Settings) -> Self {
        SpikeHeights {
            spike: settings.spike_height,
            small: settings.small_spike_height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeShape {
    /// Samples per repetition; 0 is read as 1
    pub interval: u32,
    pub heights: SpikeHeights,
}

/// Amplitude of sample `index` of the repeating pattern
pub fn spike(index: u64, shape: &SpikeShape) -> f32 {
    let interval = u64::from(shape.interval.max(1));
    let SpikeHeights { spike, small } = shape.heights;

    match index % interval {
        0 => small,
        2 => spike,
        4 => spike * 2.0,
        6 => -spike * 1.4,
        8 => small * 0.3,
        10 => -small * 0.3,
        _ => 0.0,
    }
}

/// One generated waveform sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Pattern amplitude before display scaling
    pub raw: f32,
    /// Whether this is the tallest point of a beat
    pub is_peak: bool,
}

impl Sample {
    /// Generates sample `index`; a flatlined heart produces 0 at every phase
    pub fn generate(index: u64, health_percent: f32, shape: &SpikeShape) -> Self {
        if health_percent == 0.0 {
            return Sample {
                raw: 0.0,
                is_peak: false,
            };
        }

        let raw = spike(index, shape);
        Sample {
            raw,
            is_peak: raw != 0.0 && raw == shape.heights.spike * 2.0,
        }
    }

    pub fn scaled(&self) -> f32 {
        self.raw * DISPLAY_SCALE
    }
}

/// Whether the spikes are drawn or held flat while health is at zero
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AmplitudeState {
    Active(SpikeHeights),
    /// Health hit zero; the heights stay flat until it is positive again
    Suspended,
}

impl AmplitudeState {
    pub fn new(heights: SpikeHeights) -> Self {
        AmplitudeState::Active(heights)
    }

    /// Updates the state for the current health and returns the heights to draw
    ///
    /// At 0% health the state suspends and the heights go flat. As soon as
    /// health is positive again the configured heights, including any edits
    /// made while flat, are back in effect.
    pub fn observe(&mut self, health_percent: f32, configured: SpikeHeights) -> SpikeHeights {
        if health_percent == 0.0 {
            *self = AmplitudeState::Suspended;
            SpikeHeights::FLAT
        } else {
            *self = AmplitudeState::Active(configured);
            configured
        }
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self, AmplitudeState::Suspended)
    }
}
