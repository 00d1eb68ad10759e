// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand, ValueEnum};
use photobooth::Config;
use photobooth::backends::camera::LensFacing;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

mod cli;

/// Log file name under the cache directory (terminal mode)
const LOG_FILE_NAME: &str = "photobooth.log";

#[derive(Parser)]
#[command(name = "photobooth")]
#[command(about = "Live camera preview with a tap-to-start countdown capture")]
#[command(version = photobooth::constants::app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (default: ~/.config/photobooth/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Preferred lens facing
    #[arg(long, global = true, value_enum)]
    facing: Option<FacingArg>,

    /// Exact camera device path (overrides --facing)
    #[arg(long, global = true)]
    device: Option<String>,

    /// Total countdown length in milliseconds
    #[arg(long, global = true)]
    countdown_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the booth in the terminal (default)
    Run,

    /// List available cameras
    List,

    /// Capture a single image without the booth screen
    Snap,
}

#[derive(Clone, Copy, ValueEnum)]
enum FacingArg {
    Back,
    Front,
    External,
}

impl From<FacingArg> for LensFacing {
    fn from(facing: FacingArg) -> Self {
        match facing {
            FacingArg::Back => LensFacing::Back,
            FacingArg::Front => LensFacing::Front,
            FacingArg::External => LensFacing::External,
        }
    }
}

impl Cli {
    /// Loaded configuration with command-line overrides applied
    fn resolve_config(&self) -> Result<Config, Box<dyn std::error::Error>> {
        let mut config = Config::load_or_default(self.config.as_deref());
        if let Some(facing) = self.facing {
            config.camera.facing = facing.into();
        }
        if let Some(device) = &self.device {
            config.camera.device_path = Some(device.clone());
        }
        if let Some(total_ms) = self.countdown_ms {
            config.countdown.total_ms = total_ms;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let terminal_mode = matches!(cli.command, None | Some(Commands::Run));

    init_logging(terminal_mode);
    tracing::info!(
        version = photobooth::constants::app_info::version(),
        environment = photobooth::constants::app_info::runtime_environment(),
        "Starting photobooth"
    );

    let config = cli.resolve_config()?;

    match cli.command {
        None | Some(Commands::Run) => photobooth::terminal::run(config),
        Some(Commands::List) => cli::list_cameras(&config),
        Some(Commands::Snap) => cli::snap(&config),
    }
}

/// Initialize logging
///
/// Set RUST_LOG environment variable to control log level.
/// Examples: RUST_LOG=debug, RUST_LOG=photobooth=debug, RUST_LOG=info
///
/// The terminal booth owns the screen, so its logs go to a file in the
/// cache directory. If that file cannot be opened, logging is disabled for
/// the session.
fn init_logging(terminal_mode: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    if !terminal_mode {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .init();
        return;
    }

    let Some(file) = open_log_file() else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
}

fn open_log_file() -> Option<std::fs::File> {
    let dir = dirs::cache_dir()?.join("photobooth");
    std::fs::create_dir_all(&dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE_NAME))
        .ok()
}
