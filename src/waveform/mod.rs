//! Waveform generation and the scrolling sample window

pub mod buffer;
pub mod spike;

pub use buffer::WaveformBuffer;
pub use spike::{spike, AmplitudeState, Sample, SpikeHeights, SpikeShape, DISPLAY_SCALE};
