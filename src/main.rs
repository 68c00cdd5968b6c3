//! Headless demo host
//!
//! Drives a [`Monitor`] the way a game overlay would: a scripted character
//! loses health, collapses and is raised again while the monitor is polled
//! at roughly 60 frames per second. Each half second the status line and a
//! text rendering of the trace are printed.
//!
//! Usage: `ecg-monitor [settings.json]`. Log verbosity follows `RUST_LOG`.

use ecg_monitor::frames::{frame_paths, FrameImage, ImageProvider};
use ecg_monitor::monitor::{Monitor, MonitorView, PLOT_RANGE};
use ecg_monitor::{SettingsStore, SharedHealth, HEARTBEAT_FRAME_COUNT};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

const TICK: Duration = Duration::from_millis(16);
const PRINT_EVERY: Duration = Duration::from_millis(500);
const WINDOW_WIDTH: f32 = 455.0;
const CHARACTER: &str = "Demo Character";
const MAX_HP: f32 = 42_000.0;

/// (health percent, how long to hold it)
const SCRIPT: [(f32, Duration); 4] = [
    (100.0, Duration::from_secs(3)),
    (10.0, Duration::from_secs(3)),
    (0.0, Duration::from_secs(2)),
    (60.0, Duration::from_secs(3)),
];

const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Frame files on disk; the demo never decodes them
struct AssetFrames {
    paths: Vec<PathBuf>,
}

impl ImageProvider for AssetFrames {
    type Handle = PathBuf;

    fn frame_count(&self) -> usize {
        self.paths.len()
    }

    fn frame(&self, index: usize) -> Option<FrameImage<PathBuf>> {
        let path = self.paths.get(index)?;
        path.exists().then(|| FrameImage {
            handle: path.clone(),
            width: 128,
            height: 128,
        })
    }
}

fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let settings_path = match std::env::args_os().nth(1) {
        Some(path) => PathBuf::from(path),
        None => SettingsStore::default_path().map_err(|e| e.to_string())?,
    };
    info!("Using settings file {}", settings_path.display());

    let settings = Arc::new(SettingsStore::open(&settings_path));
    let health = Arc::new(SharedHealth::new());
    let frames = AssetFrames {
        paths: frame_paths("assets/heartbeat", HEARTBEAT_FRAME_COUNT),
    };

    let mut monitor = Monitor::new(settings, health.clone(), HEARTBEAT_FRAME_COUNT)
        .map_err(|e| format!("Failed to start monitor: {}", e))?;
    monitor.toggle_visible();

    for (percent, hold) in SCRIPT {
        info!("Health set to {}%", percent);
        health.set(MAX_HP * percent / 100.0, MAX_HP);

        let phase_start = Instant::now();
        let mut last_print: Option<Instant> = None;
        while phase_start.elapsed() < hold {
            if let Some(view) = monitor.tick() {
                if last_print.is_none_or(|t| t.elapsed() >= PRINT_EVERY) {
                    print_view(&view);
                    if let Some((image, layout)) = monitor.heartbeat_image(&frames, WINDOW_WIDTH) {
                        println!(
                            "  icon {} at {:.0}x{:.0}",
                            image.handle.display(),
                            layout.width,
                            layout.height
                        );
                    }
                    last_print = Some(Instant::now());
                }
            }
            thread::sleep(TICK);
        }
    }

    monitor
        .shutdown()
        .map_err(|e| format!("Failed to shut down monitor: {}", e))?;
    Ok(())
}

fn print_view(view: &MonitorView) {
    println!("{}", view.status_line(CHARACTER));
    println!("  {}", sparkline(&view.waveform));
    let d = &view.diagnostics;
    println!(
        "  frame {:>2} | interval {} | beat {:.1}ms | pause {:.1}ms | spikes {}{}",
        view.frame_index,
        d.spike_interval,
        d.animation_speed_ms,
        d.pause_length_ms,
        d.spike_count,
        if d.flatlined { " | flatline" } else { "" }
    );
}

fn sparkline(samples: &[f32]) -> String {
    let (low, high) = PLOT_RANGE;
    samples
        .iter()
        .map(|&sample| {
            let t = ((sample - low) / (high - low)).clamp(0.0, 1.0);
            LEVELS[(t * (LEVELS.len() - 1) as f32).round() as usize]
        })
        .collect()
}
