//! Settings for the heart monitor
//!
//! This module provides the tunable parameter set and its persistence:
//! - JSON-based settings file (human-readable, hand-editable)
//! - Named numeric access through [`SettingKey`]
//! - Immediate persistence for user edits, coalesced persistence for values
//!   the waveform loop derives every beat
//!
//! # Architecture
//!
//! - `types`: the [`Settings`] record, [`SettingKey`] and [`SimulationMode`]
//! - `store`: [`SettingsStore`] for loading and writing the file
//! - `error`: [`SettingsError`]
//!
//! # Example Usage
//!
//! ```no_run
//! use ecg_monitor::settings::{SettingKey, SettingsStore};
//!
//! let store = SettingsStore::open(SettingsStore::default_path()?);
//! store.set(SettingKey::MaxHeartRate, 200.0)?; // written to disk right away
//! assert_eq!(store.get(SettingKey::MaxHeartRate), 200.0);
//! # Ok::<(), ecg_monitor::settings::SettingsError>(())
//! ```

pub mod error;
pub mod store;
pub mod types;

pub use error::SettingsError;
pub use store::SettingsStore;
pub use types::*;
