//! Worker threads driving the waveform and the heartbeat icon
//!
//! While the scheduler is running, two loops run on their own named threads:
//! - Waveform loop: samples health, derives the timing for this beat, sleeps
//!   one beat and advances the waveform buffer once enough beat time has
//!   accumulated
//! - Heartbeat loop: steps the icon through its frames, rests for the pause
//!   between beats and measures the resulting heart rate
//!
//! Every shared value has exactly one writer. The waveform loop owns the
//! buffer, the derived timing and the waveform stats; the heartbeat loop owns
//! the frame index and the BPM. The presentation side only ever gets copies.
//!
//! Waits are `recv_timeout` calls on a stop channel nobody sends on. Dropping
//! the sender in [`AnimationScheduler::stop`] wakes both loops at once.

use super::cycle::{clamp_bpm, CycleTimingRecord};
use super::AnimationState;
use crate::health::{resolve_percentage, HealthSource};
use crate::rate::RateParams;
use crate::settings::SettingsStore;
use crate::waveform::{AmplitudeState, Sample, SpikeHeights, SpikeShape, WaveformBuffer};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Shortest wait of any loop iteration
const MIN_WAIT: Duration = Duration::from_millis(1);

/// Poll interval while the health source has nothing to report
const IDLE_WAIT: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Counters kept by the waveform loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaveformStats {
    /// Samples generated since the scheduler was created
    pub samples: u64,
    /// Beat peaks among those samples
    pub spike_count: u64,
    /// Whether the spikes are currently held flat at 0% health
    pub flatlined: bool,
}

struct Shared {
    waveform: RwLock<WaveformBuffer>,
    params: RwLock<RateParams>,
    stats: RwLock<WaveformStats>,
    frame_index: AtomicUsize,
    bpm: AtomicU32,
}

pub struct AnimationScheduler {
    settings: Arc<SettingsStore>,
    health: Arc<dyn HealthSource>,
    frame_count: usize,
    shared: Arc<Shared>,
    state: AnimationState,
    // Dropped to stop the loops
    stop_tx: Option<Sender<()>>,
    threads: Vec<JoinHandle<()>>,
}

impl AnimationScheduler {
    /// Creates a stopped scheduler for an icon with `frame_count` frames
    pub fn new(
        settings: Arc<SettingsStore>,
        health: Arc<dyn HealthSource>,
        frame_count: usize,
    ) -> Self {
        let (capacity, params) =
            settings.read(|s| (s.heart_rate_data_size, RateParams::derive(100.0, s)));

        AnimationScheduler {
            settings,
            health,
            frame_count,
            shared: Arc::new(Shared {
                waveform: RwLock::new(WaveformBuffer::new(capacity)),
                params: RwLock::new(params),
                stats: RwLock::new(WaveformStats::default()),
                frame_index: AtomicUsize::new(0),
                bpm: AtomicU32::new(0),
            }),
            state: AnimationState::Stopped,
            stop_tx: None,
            threads: Vec::new(),
        }
    }

    /// Starts both loops; does nothing if they are already running
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.state == AnimationState::Running {
            debug!("Animation scheduler already running");
            return Ok(());
        }

        let (stop_tx, stop_rx) = bounded::<()>(0);
        self.shared.bpm.store(0, Ordering::Release);

        let waveform = WaveformLoop {
            settings: self.settings.clone(),
            health: self.health.clone(),
            shared: self.shared.clone(),
            stop: stop_rx.clone(),
            amplitude: AmplitudeState::new(self.settings.read(SpikeHeights::from_settings)),
            elapsed: 0.0,
            // A restart continues the pattern where it left off
            index: self.stats().samples,
        };
        let heartbeat = HeartbeatLoop {
            settings: self.settings.clone(),
            shared: self.shared.clone(),
            stop: stop_rx,
            frame_count: self.frame_count,
            clock: Instant::now(),
            record: CycleTimingRecord::new(),
        };

        self.threads.push(spawn("ecg-waveform", move || waveform.run())?);
        match spawn("ecg-heartbeat", move || heartbeat.run()) {
            Ok(handle) => self.threads.push(handle),
            Err(e) => {
                drop(stop_tx);
                self.join_threads();
                return Err(e);
            }
        }

        self.stop_tx = Some(stop_tx);
        self.state = AnimationState::Running;
        info!("Animation scheduler started ({} frames)", self.frame_count);
        Ok(())
    }

    /// Stops both loops and waits for them to exit
    ///
    /// After this returns neither the waveform nor the frame index changes.
    /// Calling it on a stopped scheduler does nothing.
    pub fn stop(&mut self) {
        if self.state == AnimationState::Stopped {
            return;
        }

        info!("Stopping animation scheduler");
        self.stop_tx.take();
        self.join_threads();
        self.state = AnimationState::Stopped;

        if let Err(e) = self.settings.flush() {
            warn!("Failed to persist settings on stop: {}", e);
        }
    }

    fn join_threads(&mut self) {
        for handle in self.threads.drain(..) {
            let name = handle.thread().name().unwrap_or("animation").to_string();
            if handle.join().is_err() {
                warn!("{} thread panicked", name);
            }
        }
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == AnimationState::Running
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Copy of the visible trace, oldest sample first
    pub fn waveform(&self) -> Vec<f32> {
        self.shared.waveform.read().snapshot()
    }

    pub fn frame_index(&self) -> usize {
        self.shared.frame_index.load(Ordering::Acquire)
    }

    /// Measured heart rate; 0 until two heartbeat cycles have completed
    pub fn bpm(&self) -> u32 {
        self.shared.bpm.load(Ordering::Acquire)
    }

    /// Timing derived from the most recent health sample
    pub fn params(&self) -> RateParams {
        *self.shared.params.read()
    }

    pub fn stats(&self) -> WaveformStats {
        *self.shared.stats.read()
    }
}

impl Drop for AnimationScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn(
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> Result<JoinHandle<()>, SchedulerError> {
    thread::Builder::new()
        .name(name.to_string())
        .spawn(f)
        .map_err(|source| SchedulerError::Spawn { name, source })
}

/// Sleeps for `duration`; returns false if the scheduler stopped meanwhile
fn wait(stop: &Receiver<()>, duration: Duration) -> bool {
    matches!(stop.recv_timeout(duration), Err(RecvTimeoutError::Timeout))
}

struct WaveformLoop {
    settings: Arc<SettingsStore>,
    health: Arc<dyn HealthSource>,
    shared: Arc<Shared>,
    stop: Receiver<()>,
    amplitude: AmplitudeState,
    // Seconds of beat time since the last advance
    elapsed: f32,
    index: u64,
}

impl WaveformLoop {
    fn run(mut self) {
        info!("Waveform loop started");
        while self.beat() {}
        info!("Waveform loop stopped");
    }

    /// Runs one beat; returns false once the scheduler is stopped
    fn beat(&mut self) -> bool {
        let settings = self.settings.snapshot();
        let Some(health) = resolve_percentage(self.health.reading(), &settings) else {
            return wait(&self.stop, IDLE_WAIT);
        };

        let heights = self
            .amplitude
            .observe(health, SpikeHeights::from_settings(&settings));
        let params = RateParams::derive(health, &settings);
        *self.shared.params.write() = params;

        self.settings.update_derived(|s| params.apply_to(s));
        if let Err(e) = self.settings.persist_if_due() {
            warn!("Failed to persist derived settings: {}", e);
        }

        let beat_ms = params.beat_ms();
        if !wait(&self.stop, Duration::from_millis(beat_ms).max(MIN_WAIT)) {
            return false;
        }

        self.elapsed += beat_ms as f32 / 1000.0;
        if self.elapsed >= params.update_interval(&settings) {
            self.elapsed = 0.0;
            self.advance(health, params.spike_interval, heights, settings.heart_rate_data_size);
        }

        self.shared.stats.write().flatlined = self.amplitude.is_suspended();
        true
    }

    fn advance(&mut self, health: f32, interval: u32, heights: SpikeHeights, capacity: usize) {
        let sample = Sample::generate(self.index, health, &SpikeShape { interval, heights });
        self.index += 1;

        {
            let mut buffer = self.shared.waveform.write();
            if buffer.capacity() != capacity {
                buffer.resize(capacity);
            }
            buffer.advance(sample.scaled());
        }

        let mut stats = self.shared.stats.write();
        stats.samples = self.index;
        if sample.is_peak {
            stats.spike_count += 1;
        }
    }
}

struct HeartbeatLoop {
    settings: Arc<SettingsStore>,
    shared: Arc<Shared>,
    stop: Receiver<()>,
    frame_count: usize,
    clock: Instant,
    record: CycleTimingRecord,
}

impl HeartbeatLoop {
    fn run(mut self) {
        info!("Heartbeat loop started");
        while self.cycle() {}
        info!("Heartbeat loop stopped");
    }

    /// Runs one full heartbeat; returns false once the scheduler is stopped
    fn cycle(&mut self) -> bool {
        let params = *self.shared.params.read();
        let (beating, min_bpm, max_bpm) = self.settings.read(|s| {
            (
                s.simulated_health_percentage > 0.0,
                s.min_heart_rate,
                s.max_heart_rate,
            )
        });

        let beat = params.beat_duration();
        let mut pause = params.pause_duration();

        if beating && self.frame_count > 0 {
            for frame in 0..self.frame_count {
                self.shared.frame_index.store(frame, Ordering::Release);
                if !wait(&self.stop, beat) {
                    return false;
                }
            }
            if beat.is_zero() {
                pause = pause.max(MIN_WAIT);
            }
        } else {
            // Frames are skipped, but the cycle still takes time
            pause = pause.max(MIN_WAIT);
        }

        if !wait(&self.stop, pause) {
            return false;
        }

        let now_ms = self.clock.elapsed().as_millis() as u64;
        let bpm = self
            .record
            .record(now_ms)
            .map_or(0, |raw| clamp_bpm(raw, min_bpm, max_bpm));
        self.shared.bpm.store(bpm, Ordering::Release);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::SharedHealth;
    use crate::settings::Settings;

    fn scheduler() -> AnimationScheduler {
        let settings = Arc::new(SettingsStore::with_settings(
            std::env::temp_dir().join("ecg-monitor-unit-unused.json"),
            Settings::default(),
        ));
        AnimationScheduler::new(settings, Arc::new(SharedHealth::new()), 20)
    }

    #[test]
    fn test_new_scheduler_is_stopped() {
        let scheduler = scheduler();
        assert_eq!(scheduler.state(), AnimationState::Stopped);
        assert_eq!(scheduler.bpm(), 0);
        assert_eq!(scheduler.frame_index(), 0);
        assert_eq!(scheduler.waveform(), vec![0.0; 135]);
        assert_eq!(scheduler.stats(), WaveformStats::default());
    }

    #[test]
    fn test_initial_params_are_full_health() {
        let scheduler = scheduler();
        let params = scheduler.params();
        assert_eq!(params.health_percent, 100.0);
        assert_eq!(params.animation_speed_ms, 42.0);
        assert_eq!(params.pause_length_ms, 140.0);
    }

    #[test]
    fn test_stop_when_stopped_is_noop() {
        let mut scheduler = scheduler();
        scheduler.stop();
        scheduler.stop();
        assert_eq!(scheduler.state(), AnimationState::Stopped);
    }

    #[test]
    fn test_wait_returns_false_once_sender_dropped() {
        let (tx, rx) = bounded::<()>(0);
        assert!(wait(&rx, Duration::from_millis(1)));
        drop(tx);
        assert!(!wait(&rx, Duration::from_secs(60)));
    }
}
