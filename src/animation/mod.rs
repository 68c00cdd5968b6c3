//! Animation timing for the waveform and the heartbeat icon
//!
//! # Architecture
//!
//! - `scheduler`: [`AnimationScheduler`], which runs the two worker loops
//! - `cycle`: [`CycleTimingRecord`] and the BPM arithmetic

pub mod cycle;
pub mod scheduler;

pub use cycle::{clamp_bpm, cycles_per_minute, CycleTimingRecord};
pub use scheduler::{AnimationScheduler, SchedulerError, WaveformStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationState {
    Stopped,
    Running,
}

impl Default for AnimationState {
    fn default() -> Self {
        AnimationState::Stopped
    }
}
