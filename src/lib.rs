//! Heart-rate monitor overlay core
//!
//! Turns the health of a game character into a scrolling ECG trace, an
//! animated heart icon and a measured heart rate. The lower the health, the
//! denser the spikes and the shorter the beats.
//!
//! # Architecture
//!
//! - `settings`: user parameters, their defaults and the JSON settings file
//! - `rate`: health percentage to timing interpolation
//! - `waveform`: spike pattern and the fixed-length sample buffer
//! - `animation`: the two worker loops and BPM measurement
//! - `health`: the health input and simulation overrides
//! - `frames`: heartbeat icon frames and their on-screen layout
//! - `monitor`: [`Monitor`], the facade a host polls once per frame
//!
//! Rendering is the host's job; the crate only produces values to draw.

pub mod animation;
pub mod frames;
pub mod health;
pub mod monitor;
pub mod rate;
pub mod settings;
pub mod waveform;

pub use animation::{AnimationScheduler, AnimationState};
pub use frames::{FrameImage, ImageLayout, ImageProvider, HEARTBEAT_FRAME_COUNT};
pub use health::{HealthReading, HealthSource, SharedHealth};
pub use monitor::{Diagnostics, Monitor, MonitorError, MonitorView};
pub use settings::{Settings, SettingKey, SettingsError, SettingsStore, SimulationMode};
