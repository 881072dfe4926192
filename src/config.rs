use crate::animation::PARTICLE_COUNT;
use crate::theme::Theme;
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const MIN_FPS: u32 = 1;
const MAX_FPS: u32 = 120;

#[derive(Debug, Parser)]
#[command(name = "dream-tracker")]
#[command(version)]
#[command(about = "Record, tag and browse your dreams in the terminal")]
pub struct Config {
    /// Starting color theme
    #[arg(long, value_enum, default_value_t = Theme::Dark)]
    pub theme: Theme,

    /// Number of drifting background particles
    #[arg(long, default_value_t = PARTICLE_COUNT)]
    pub particles: usize,

    /// Animation frames per second
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// JSON array of entries to start with instead of the sample dreams
    #[arg(long)]
    pub seed: Option<PathBuf>,

    /// Where to write logs (the terminal belongs to the UI)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn frame_interval(&self) -> Duration {
        let fps = self.fps.clamp(MIN_FPS, MAX_FPS);
        Duration::from_millis(1000 / u64::from(fps))
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("dream_tracker.log"))
    }
}

pub fn init_tracing(path: &Path) -> Result<()> {
    let file = File::create(path)
        .wrap_err_with(|| format!("Failed to create log file {}", path.display()))?;
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "dream_tracker=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}
