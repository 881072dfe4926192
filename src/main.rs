mod animation;
mod app;
mod composer;
mod config;
mod dream_entry;
mod dream_state;
mod theme;
mod ui;

use app::AppState;
use clap::Parser;
use color_eyre::eyre::Result;
use config::Config;
use dream_state::DreamState;
use rand::{rngs::StdRng, SeedableRng};
use ui::{Scene, UI};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let config = Config::parse();
    config::init_tracing(&config.log_path())?;
    tracing::info!("Dream Tracker v{}", env!("CARGO_PKG_VERSION"));

    let dreams = match &config.seed {
        Some(path) => DreamState::load_seed_file(path)?,
        None => DreamState::seeded(),
    };
    let mut app = AppState::new(dreams, config.theme);

    let scene = Scene::new(config.particles, StdRng::from_entropy());
    let mut ui = UI::new(scene)?;
    let result = ui.run(&mut app, config.frame_interval()).await;
    drop(ui);

    match &result {
        Ok(()) => tracing::info!(entries = app.dreams.len(), "session ended"),
        Err(e) => tracing::error!(error = %e, "session aborted"),
    }
    result
}
