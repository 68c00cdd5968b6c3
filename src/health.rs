//! Health input for the monitor
//!
//! The host game owns the real health data. It hands the monitor a
//! [`HealthSource`], which both worker threads and the per-frame tick poll.
//! A source returns `None` while there is nothing to monitor (no character
//! logged in, loading screen), and the monitor simply skips that update.
//!
//! # Example
//!
//! ```rust
//! use ecg_monitor::health::{HealthSource, SharedHealth};
//!
//! let health = SharedHealth::new();
//! assert!(health.reading().is_none());
//!
//! health.set(7500.0, 10000.0);
//! assert_eq!(health.reading().unwrap().percentage(), 75.0);
//! ```

use crate::settings::{Settings, SimulationMode};
use parking_lot::RwLock;

/// Current and maximum hit points of the monitored character
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthReading {
    pub current: f32,
    pub max: f32,
}

impl HealthReading {
    pub fn new(current: f32, max: f32) -> Self {
        HealthReading { current, max }
    }

    /// Returns health as a percentage (0.0 to 100.0)
    pub fn percentage(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            (self.current / self.max * 100.0).clamp(0.0, 100.0)
        }
    }

    pub fn is_alive(&self) -> bool {
        self.percentage() > 0.0
    }
}

/// Anything that can report the monitored character's health
pub trait HealthSource: Send + Sync {
    fn reading(&self) -> Option<HealthReading>;
}

impl<F> HealthSource for F
where
    F: Fn() -> Option<HealthReading> + Send + Sync,
{
    fn reading(&self) -> Option<HealthReading> {
        self()
    }
}

/// Health cell the host's game thread writes and the monitor reads
#[derive(Debug, Default)]
pub struct SharedHealth {
    reading: RwLock<Option<HealthReading>>,
}

impl SharedHealth {
    /// Creates an empty cell (nothing to monitor yet)
    pub fn new() -> Self {
        SharedHealth::default()
    }

    pub fn set(&self, current: f32, max: f32) {
        *self.reading.write() = Some(HealthReading::new(current, max));
    }

    /// Marks the character as gone
    pub fn clear(&self) {
        *self.reading.write() = None;
    }
}

impl HealthSource for SharedHealth {
    fn reading(&self) -> Option<HealthReading> {
        *self.reading.read()
    }
}

/// Resolves the health percentage the monitor runs on
///
/// Simulation only overrides a live reading; with nothing to monitor the
/// result is `None` in every mode.
pub fn resolve_percentage(reading: Option<HealthReading>, settings: &Settings) -> Option<f32> {
    let reading = reading?;
    let percent = match settings.simulation_mode {
        SimulationMode::None => reading.percentage(),
        SimulationMode::Simulate100Hp => 100.0,
        SimulationMode::Simulate10Hp => 10.0,
        SimulationMode::SimulateCustomHp => settings.simulated_health_percentage.clamp(0.0, 100.0),
    };
    Some(percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_percentage() {
        assert_eq!(HealthReading::new(75.0, 100.0).percentage(), 75.0);
        assert_eq!(HealthReading::new(0.0, 100.0).percentage(), 0.0);
        assert!(!HealthReading::new(0.0, 100.0).is_alive());
    }

    #[test]
    fn test_health_percentage_zero_max() {
        assert_eq!(HealthReading::new(50.0, 0.0).percentage(), 0.0);
    }

    #[test]
    fn test_health_percentage_overheal_caps() {
        assert_eq!(HealthReading::new(150.0, 100.0).percentage(), 100.0);
    }

    #[test]
    fn test_shared_health() {
        let health = SharedHealth::new();
        assert_eq!(health.reading(), None);

        health.set(30.0, 60.0);
        assert_eq!(health.reading(), Some(HealthReading::new(30.0, 60.0)));

        health.clear();
        assert_eq!(health.reading(), None);
    }

    #[test]
    fn test_closure_source() {
        let source = || Some(HealthReading::new(1.0, 4.0));
        assert_eq!(source.reading().map(|r| r.percentage()), Some(25.0));
    }

    #[test]
    fn test_resolve_live() {
        let settings = Settings::default();
        let reading = Some(HealthReading::new(40.0, 80.0));
        assert_eq!(resolve_percentage(reading, &settings), Some(50.0));
        assert_eq!(resolve_percentage(None, &settings), None);
    }

    #[test]
    fn test_resolve_simulation_modes() {
        let reading = Some(HealthReading::new(40.0, 80.0));
        let mut settings = Settings {
            simulated_health_percentage: 33.0,
            ..Default::default()
        };

        settings.simulation_mode = SimulationMode::Simulate100Hp;
        assert_eq!(resolve_percentage(reading, &settings), Some(100.0));

        settings.simulation_mode = SimulationMode::Simulate10Hp;
        assert_eq!(resolve_percentage(reading, &settings), Some(10.0));

        settings.simulation_mode = SimulationMode::SimulateCustomHp;
        assert_eq!(resolve_percentage(reading, &settings), Some(33.0));

        // Simulation needs something to monitor
        assert_eq!(resolve_percentage(None, &settings), None);
    }
}
