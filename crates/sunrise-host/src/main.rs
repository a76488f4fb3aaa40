//! Desktop host for the sunrise-touch dashboard.
//!
//! Runs the sunrise-core loop against an off-screen simulator display that
//! saves every refresh as a PNG, with touch input replayed from a script file.
//! Settings persist to a postcard file between runs.
//!
//! ```text
//! RUST_LOG=debug sunrise-host --script demo.touch --snapshot-dir out/ --simulated --max-cycles 200
//! ```

mod panel;
mod script;
mod store;

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::Parser;
use log::info;
use thiserror_no_std::Error;

use sunrise_core::Orchestrator;
use sunrise_core::config::{Capabilities, DashboardConfig, PersistedSettings};
use sunrise_core::drivers::DriverError;
use sunrise_core::time::{Clock, Timestamp, UtcOffset};

use crate::panel::SnapshotPanel;
use crate::script::{ScriptError, ScriptedTouch};
use crate::store::FileConfigStore;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(version, about = "Sunrise e-paper dashboard host")]
struct Args {
    /// Latitude in degrees, north positive
    #[arg(long, default_value_t = 37.7749, allow_negative_numbers = true)]
    lat: f64,

    /// Longitude in degrees, east positive
    #[arg(long, default_value_t = -122.4194, allow_negative_numbers = true)]
    lon: f64,

    /// Periodic redraw interval in minutes
    #[arg(long, default_value_t = 15)]
    interval: u64,

    /// Touch poll interval in milliseconds
    #[arg(long, default_value_t = 250)]
    poll_ms: u64,

    /// Use partial refreshes between full ones
    #[arg(long)]
    partial: bool,

    /// Settings file
    #[arg(long, default_value = "sunrise-config.bin")]
    config: PathBuf,

    /// Local time offset from UTC in minutes
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    utc_offset_minutes: i32,

    /// Sunrise page only: no PAGE, SET or calibration
    #[arg(long)]
    minimal: bool,

    /// Touch script to replay
    #[arg(long)]
    script: Option<PathBuf>,

    /// Write each panel refresh here as a PNG image
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Pixel scale factor for snapshots
    #[arg(long, default_value_t = 2)]
    snapshot_scale: u32,

    /// Stop after this many loop cycles
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Advance a virtual clock instead of sleeping
    #[arg(long)]
    simulated: bool,
}

#[derive(Error, Debug)]
enum HostError {
    #[error("{path}: {reason}")]
    Io { path: String, reason: String },
    #[error("touch script: {0}")]
    Script(#[from] ScriptError),
    #[error("panel: {0}")]
    Panel(#[from] DriverError),
}

// ---------------------------------------------------------------------------
// Clocks
// ---------------------------------------------------------------------------

struct SystemClock;

impl Clock for SystemClock {
    fn now(&mut self) -> Timestamp {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp::from_millis(since_epoch.as_millis() as i64)
    }

    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Starts at the wall clock and only moves when the loop sleeps.
struct SimulatedClock {
    now: Timestamp,
}

impl Clock for SimulatedClock {
    fn now(&mut self) -> Timestamp {
        self.now
    }

    fn sleep(&mut self, duration: Duration) {
        self.now = self.now.saturating_add(duration);
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<(), HostError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    info!("Starting sunrise host: {:?}", args);

    let touch = match &args.script {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|err| HostError::Io {
                path: path.display().to_string(),
                reason: err.to_string(),
            })?;
            let touch = ScriptedTouch::parse(&text)?;
            info!("{} touch polls scripted", touch.remaining());
            touch
        }
        None => ScriptedTouch::default(),
    };

    if let Some(dir) = &args.snapshot_dir {
        fs::create_dir_all(dir).map_err(|err| HostError::Io {
            path: dir.display().to_string(),
            reason: err.to_string(),
        })?;
    }

    let config = DashboardConfig {
        poll_interval: Duration::from_millis(args.poll_ms),
        partial_refresh: args.partial,
        utc_offset: UtcOffset::from_minutes(args.utc_offset_minutes),
        capabilities: if args.minimal {
            Capabilities::minimal()
        } else {
            Capabilities::full()
        },
    };
    let seed = PersistedSettings::seeded(
        args.lat,
        args.lon,
        Duration::from_secs(args.interval * 60),
    );

    let mut wall = SystemClock;
    let started = wall.now();
    let mut orchestrator = Orchestrator::new(
        touch,
        SnapshotPanel::new(args.snapshot_dir.clone(), args.snapshot_scale),
        FileConfigStore::new(args.config.clone()),
        seed,
        config,
        started,
    );

    if args.simulated {
        orchestrator.run(&mut SimulatedClock { now: started }, args.max_cycles)?;
    } else {
        orchestrator.run(&mut wall, args.max_cycles)?;
    }

    info!(
        "done: {} draws, {} panel refreshes, {} touches",
        orchestrator.draw_count(),
        orchestrator.panel().refreshes(),
        orchestrator.ui().state().touch_count
    );
    Ok(())
}
