//! Settings store for loading and writing the settings file
//!
//! The store owns the single [`Settings`] instance of a monitor. It is shared
//! between the host's UI thread and the waveform loop behind an `Arc`:
//! - User edits go through [`SettingsStore::set`] / [`SettingsStore::update`]
//!   and are written to disk immediately
//! - Values the waveform loop derives every beat go through
//!   [`SettingsStore::update_derived`] and are written at most once per
//!   persist interval by [`SettingsStore::persist_if_due`]

use super::error::SettingsError;
use super::types::*;
use parking_lot::{Mutex, RwLock};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const APP_DIR: &str = "ecg-monitor";
const SETTINGS_FILE: &str = "settings.json";

/// Default minimum time between two coalesced writes
pub const DEFAULT_PERSIST_INTERVAL: Duration = Duration::from_secs(1);

pub struct SettingsStore {
    path: PathBuf,
    settings: RwLock<Settings>,
    dirty: AtomicBool,
    persist_interval: Duration,
    // Serializes writers and remembers the last successful write
    last_persist: Mutex<Option<Instant>>,
}

impl SettingsStore {
    /// Opens the settings file at `path`, falling back to defaults
    ///
    /// A missing file is normal on first launch. A file that cannot be read as
    /// settings is renamed aside with a timestamp so it is not overwritten by
    /// the next write, and defaults are used for the session.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();

        let settings = match Self::load(&path) {
            Ok(settings) => {
                info!("Loaded settings from {}", path.display());
                settings
            }
            Err(SettingsError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                info!("No settings at {}, using defaults", path.display());
                Settings::default()
            }
            Err(e) => {
                warn!("Could not load settings from {}: {}", path.display(), e);
                match Self::back_up(&path) {
                    Ok(backup) => warn!("Moved unreadable settings to {}", backup.display()),
                    Err(e) => warn!("Could not back up unreadable settings: {}", e),
                }
                Settings::default()
            }
        };

        Self::with_settings(path, settings)
    }

    /// Creates a store holding `settings` without touching the disk
    pub fn with_settings(path: impl AsRef<Path>, settings: Settings) -> Self {
        SettingsStore {
            path: path.as_ref().to_path_buf(),
            settings: RwLock::new(settings),
            dirty: AtomicBool::new(false),
            persist_interval: DEFAULT_PERSIST_INTERVAL,
            last_persist: Mutex::new(None),
        }
    }

    /// Sets the minimum time between coalesced writes
    pub fn with_persist_interval(mut self, interval: Duration) -> Self {
        self.persist_interval = interval;
        self
    }

    /// `<config dir>/ecg-monitor/settings.json`
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
            .ok_or(SettingsError::NoConfigDir)
    }

    /// Reads and parses a settings file
    pub fn load(path: impl AsRef<Path>) -> Result<Settings, SettingsError> {
        let json = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&json)?;

        if settings.version > CURRENT_SETTINGS_VERSION {
            return Err(SettingsError::InvalidVersion(settings.version));
        }

        Ok(settings)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A copy of the current settings
    pub fn snapshot(&self) -> Settings {
        self.settings.read().clone()
    }

    /// Runs `f` against the current settings without copying them
    pub fn read<R>(&self, f: impl FnOnce(&Settings) -> R) -> R {
        f(&self.settings.read())
    }

    pub fn get(&self, key: SettingKey) -> f32 {
        self.settings.read().get(key)
    }

    /// Overwrites one parameter and writes the file
    pub fn set(&self, key: SettingKey, value: f32) -> Result<(), SettingsError> {
        self.update(|settings| settings.set(key, value))
    }

    /// Restores one parameter to its default and writes the file
    pub fn reset(&self, key: SettingKey) -> Result<(), SettingsError> {
        self.update(|settings| settings.reset(key))
    }

    /// Applies a user edit and writes the file
    ///
    /// The edit stays in memory even when the write fails.
    pub fn update<R>(&self, f: impl FnOnce(&mut Settings) -> R) -> Result<R, SettingsError> {
        let result = f(&mut self.settings.write());
        self.dirty.store(true, Ordering::Release);
        self.persist()?;
        Ok(result)
    }

    /// Applies a derived-value write without touching the disk
    pub fn update_derived<R>(&self, f: impl FnOnce(&mut Settings) -> R) -> R {
        let result = f(&mut self.settings.write());
        self.dirty.store(true, Ordering::Release);
        result
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Writes the current settings to disk
    ///
    /// The file is written to a sibling temp file first and renamed over the
    /// old one, so a failed write leaves the previous file intact.
    pub fn persist(&self) -> Result<(), SettingsError> {
        let mut last_persist = self.last_persist.lock();
        self.write_file()?;
        *last_persist = Some(Instant::now());
        Ok(())
    }

    /// Writes pending changes if the persist interval has passed since the
    /// last attempt. Returns whether a write happened.
    ///
    /// A failed attempt also restarts the interval, so a broken disk is
    /// retried (and reported) at most once per interval.
    pub fn persist_if_due(&self) -> Result<bool, SettingsError> {
        if !self.is_dirty() {
            return Ok(false);
        }

        let mut last_persist = self.last_persist.lock();
        if let Some(last) = *last_persist {
            if last.elapsed() < self.persist_interval {
                return Ok(false);
            }
        }

        *last_persist = Some(Instant::now());
        self.write_file()?;
        Ok(true)
    }

    /// Writes pending changes regardless of the persist interval
    pub fn flush(&self) -> Result<(), SettingsError> {
        if self.is_dirty() {
            self.persist()?;
        }
        Ok(())
    }

    fn write_file(&self) -> Result<(), SettingsError> {
        // Cleared before the snapshot so a concurrent edit re-marks it
        self.dirty.store(false, Ordering::Release);
        let settings = self.snapshot();

        let result = Self::write_json(&self.path, &settings);
        if result.is_err() {
            self.dirty.store(true, Ordering::Release);
        } else {
            debug!("Settings written to {}", self.path.display());
        }
        result
    }

    fn write_json(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let json = serde_json::to_string_pretty(settings)?;
        let tmp = path.with_extension("json.tmp");
        if let Err(e) = fs::write(&tmp, json).and_then(|_| fs::rename(&tmp, path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn back_up(path: &Path) -> Result<PathBuf, SettingsError> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("settings");
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let backup = path.with_file_name(format!("{}.corrupt-{}.json", stem, timestamp));
        fs::rename(path, &backup)?;
        Ok(backup)
    }
}
