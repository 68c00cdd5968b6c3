//! Host-facing heart monitor
//!
//! The host creates one [`Monitor`] when the add-on loads, calls
//! [`Monitor::tick`] once per rendered frame and draws the returned
//! [`MonitorView`]: a status line, the waveform plot and the heartbeat icon.
//! The monitor itself never draws.
//!
//! # Example
//!
//! ```no_run
//! use ecg_monitor::health::SharedHealth;
//! use ecg_monitor::monitor::Monitor;
//! use ecg_monitor::settings::SettingsStore;
//! use ecg_monitor::HEARTBEAT_FRAME_COUNT;
//! use std::sync::Arc;
//!
//! let settings = Arc::new(SettingsStore::open(SettingsStore::default_path()?));
//! let health = Arc::new(SharedHealth::new());
//! let mut monitor = Monitor::new(settings, health.clone(), HEARTBEAT_FRAME_COUNT)?;
//!
//! monitor.toggle_visible(); // bound to the host's chat command
//! health.set(31_000.0, 42_000.0);
//! if let Some(view) = monitor.tick() {
//!     println!("{}", view.status_line("Warrior of Light"));
//! }
//! monitor.shutdown()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::animation::{AnimationScheduler, SchedulerError};
use crate::frames::{self, FrameImage, ImageLayout, ImageProvider};
use crate::health::{resolve_percentage, HealthSource};
use crate::settings::{Settings, SettingsError, SettingsStore};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Vertical range of the waveform plot
pub const PLOT_RANGE: (f32, f32) = (-40.0, 40.0);

/// Height of the waveform plot in pixels
pub const PLOT_HEIGHT: f32 = 80.0;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Values for the host's developer panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diagnostics {
    pub spike_interval: u32,
    pub animation_speed_ms: f32,
    pub pause_length_ms: f32,
    pub heart_rate_data_size: usize,
    pub min_update_interval: f32,
    pub max_update_interval: f32,
    pub target_heart_rate: f32,
    pub samples: u64,
    pub spike_count: u64,
    pub flatlined: bool,
}

/// Everything the host draws for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorView {
    /// `None` while there is nothing to monitor
    pub health_percent: Option<f32>,
    /// Measured heart rate, 0 while health is 0
    pub bpm: u32,
    /// Plot samples, oldest first
    pub waveform: Vec<f32>,
    pub frame_index: usize,
    pub ecg_width: f32,
    pub show_health_percentage: bool,
    pub diagnostics: Diagnostics,
}

impl MonitorView {
    pub fn status_line(&self, name: &str) -> String {
        match self.health_percent {
            Some(health) if self.show_health_percentage => {
                format!("Heart rate of {} is {} BPM ({:.0}% HP)", name, self.bpm, health)
            }
            Some(_) => format!("Heart rate of {} is {} BPM", name, self.bpm),
            None => "Player not found.".to_string(),
        }
    }
}

pub struct Monitor {
    settings: Arc<SettingsStore>,
    health: Arc<dyn HealthSource>,
    scheduler: AnimationScheduler,
    visible: bool,
}

impl Monitor {
    /// Creates the monitor and starts its animation loops
    ///
    /// The monitor starts hidden; the host's command toggles it.
    pub fn new(
        settings: Arc<SettingsStore>,
        health: Arc<dyn HealthSource>,
        frame_count: usize,
    ) -> Result<Self, MonitorError> {
        let mut scheduler = AnimationScheduler::new(settings.clone(), health.clone(), frame_count);
        scheduler.start()?;

        Ok(Monitor {
            settings,
            health,
            scheduler,
            visible: false,
        })
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn toggle_visible(&mut self) {
        self.visible = !self.visible;
    }

    /// Stops the animation loops until health is next seen above zero
    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    /// Polls health once and returns what to draw, or `None` while hidden
    ///
    /// A stopped scheduler is restarted here as soon as health is positive.
    pub fn tick(&mut self) -> Option<MonitorView> {
        let settings = self.settings.snapshot();
        let health = resolve_percentage(self.health.reading(), &settings);

        if health.is_some_and(|h| h > 0.0) && !self.scheduler.is_running() {
            if let Err(e) = self.scheduler.start() {
                warn!("Could not restart animations: {}", e);
            }
        }

        if !self.visible {
            return None;
        }
        Some(self.view(health, &settings))
    }

    fn view(&self, health: Option<f32>, settings: &Settings) -> MonitorView {
        let params = self.scheduler.params();
        let stats = self.scheduler.stats();

        let bpm = match health {
            Some(h) if h > 0.0 => self.scheduler.bpm(),
            _ => 0,
        };

        MonitorView {
            health_percent: health,
            bpm,
            waveform: self.scheduler.waveform(),
            frame_index: self.scheduler.frame_index(),
            ecg_width: settings.ecg_width,
            show_health_percentage: settings.show_health_percentage,
            diagnostics: Diagnostics {
                spike_interval: params.spike_interval,
                animation_speed_ms: params.animation_speed_ms,
                pause_length_ms: params.pause_length_ms,
                heart_rate_data_size: settings.heart_rate_data_size,
                min_update_interval: settings.min_update_interval,
                max_update_interval: params.max_update_interval,
                target_heart_rate: params.target_heart_rate,
                samples: stats.samples,
                spike_count: stats.spike_count,
                flatlined: stats.flatlined,
            },
        }
    }

    /// Resolves the current heartbeat frame and where to draw it
    ///
    /// `None` when the provider has no image for the frame; skip the icon
    /// for this tick.
    pub fn heartbeat_image<P: ImageProvider>(
        &self,
        provider: &P,
        window_width: f32,
    ) -> Option<(FrameImage<P::Handle>, ImageLayout)> {
        let count = provider.frame_count();
        if count == 0 {
            return None;
        }
        let index = self.scheduler.frame_index() % count;
        // The provider runs host code; keep the store unlocked meanwhile
        let settings = self.settings.snapshot();
        frames::heartbeat_image(provider, index, window_width, &settings)
    }

    /// Stops the loops and writes any pending settings
    pub fn shutdown(mut self) -> Result<(), MonitorError> {
        self.scheduler.stop();
        self.settings.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationState;
    use crate::health::SharedHealth;
    use crate::settings::SimulationMode;
    use tempfile::{tempdir, TempDir};

    struct Frames;

    impl ImageProvider for Frames {
        type Handle = usize;

        fn frame_count(&self) -> usize {
            4
        }

        fn frame(&self, index: usize) -> Option<FrameImage<usize>> {
            Some(FrameImage {
                handle: index,
                width: 32,
                height: 32,
            })
        }
    }

    fn monitor(settings: Settings) -> (Monitor, Arc<SharedHealth>, TempDir) {
        let dir = tempdir().unwrap();
        let store = Arc::new(SettingsStore::with_settings(
            dir.path().join("settings.json"),
            settings,
        ));
        let health = Arc::new(SharedHealth::new());
        let monitor = Monitor::new(store, health.clone(), 4).unwrap();
        (monitor, health, dir)
    }

    #[test]
    fn test_hidden_monitor_draws_nothing() {
        let (mut monitor, health, _dir) = monitor(Settings::default());
        health.set(100.0, 100.0);
        assert!(!monitor.is_visible());
        assert!(monitor.tick().is_none());

        monitor.toggle_visible();
        assert!(monitor.tick().is_some());
    }

    #[test]
    fn test_missing_player() {
        let (mut monitor, _health, _dir) = monitor(Settings::default());
        monitor.set_visible(true);

        let view = monitor.tick().unwrap();
        assert_eq!(view.health_percent, None);
        assert_eq!(view.bpm, 0);
        assert_eq!(view.status_line("Alphinaud"), "Player not found.");
    }

    #[test]
    fn test_view_contents() {
        let (mut monitor, health, _dir) = monitor(Settings {
            show_health_percentage: false,
            ..Default::default()
        });
        monitor.set_visible(true);
        health.set(50.0, 100.0);

        let view = monitor.tick().unwrap();
        assert_eq!(view.health_percent, Some(50.0));
        assert_eq!(view.waveform.len(), 135);
        assert_eq!(view.ecg_width, 375.0);
        assert_eq!(view.diagnostics.heart_rate_data_size, 135);
        assert!(view.status_line("Alisaie").starts_with("Heart rate of Alisaie is "));
    }

    #[test]
    fn test_zero_health_reports_zero_bpm() {
        let (mut monitor, health, _dir) = monitor(Settings {
            simulation_mode: SimulationMode::SimulateCustomHp,
            simulated_health_percentage: 0.0,
            ..Default::default()
        });
        monitor.set_visible(true);
        health.set(100.0, 100.0);

        let view = monitor.tick().unwrap();
        assert_eq!(view.health_percent, Some(0.0));
        assert_eq!(view.bpm, 0);
    }

    #[test]
    fn test_tick_restarts_stopped_scheduler() {
        let (mut monitor, health, _dir) = monitor(Settings::default());
        monitor.stop();
        assert_eq!(monitor.scheduler().state(), AnimationState::Stopped);

        // Nothing to monitor: stays stopped
        monitor.tick();
        assert_eq!(monitor.scheduler().state(), AnimationState::Stopped);

        health.set(0.0, 100.0);
        monitor.tick();
        assert_eq!(monitor.scheduler().state(), AnimationState::Stopped);

        health.set(1.0, 100.0);
        monitor.tick();
        assert_eq!(monitor.scheduler().state(), AnimationState::Running);
    }

    #[test]
    fn test_heartbeat_image() {
        let (monitor, _health, _dir) = monitor(Settings {
            image_size: 1.0,
            ..Default::default()
        });
        let (image, layout) = monitor.heartbeat_image(&Frames, 455.0).unwrap();
        assert!(image.handle < 4);
        assert_eq!(layout.height, 80.0);
    }

    /// Writes to the store while resolving a frame, like a host that
    /// records texture load times in its settings
    struct WritingFrames {
        store: Arc<SettingsStore>,
    }

    impl ImageProvider for WritingFrames {
        type Handle = usize;

        fn frame_count(&self) -> usize {
            4
        }

        fn frame(&self, index: usize) -> Option<FrameImage<usize>> {
            self.store.update_derived(|s| s.pause_length_ms = 3.0);
            Some(FrameImage {
                handle: index,
                width: 32,
                height: 32,
            })
        }
    }

    #[test]
    fn test_heartbeat_image_leaves_store_unlocked() {
        let (monitor, _health, _dir) = monitor(Settings::default());
        let frames = WritingFrames {
            store: monitor.settings().clone(),
        };

        assert!(monitor.heartbeat_image(&frames, 455.0).is_some());
        assert!(monitor.settings().is_dirty());
    }

    #[test]
    fn test_shutdown_flushes_settings() {
        let (monitor, _health, dir) = monitor(Settings::default());
        monitor.settings().update_derived(|s| s.pause_length_ms = 7.0);
        monitor.shutdown().unwrap();

        let saved = SettingsStore::load(dir.path().join("settings.json")).unwrap();
        assert_eq!(saved.pause_length_ms, 7.0);
    }
}
