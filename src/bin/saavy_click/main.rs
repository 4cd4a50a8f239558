//! saavy-click - terminal metronome
//!
//! Run with: cargo run -- [bpm] [beats per measure]

mod app;
mod ui;

use app::ClickApp;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use saavy_click::MetronomeConfig;

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    // Logs go to stderr; keep them off unless asked so the TUI stays clean.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let mut args = std::env::args().skip(1);
    let bpm = args
        .next()
        .map(|arg| arg.parse::<f64>())
        .transpose()
        .wrap_err("bpm must be a number")?
        .unwrap_or(120.0);
    let beats = args
        .next()
        .map(|arg| arg.parse::<u32>())
        .transpose()
        .wrap_err("beats per measure must be a whole number")?
        .unwrap_or(4);

    let config = MetronomeConfig::default()
        .with_bpm(bpm)
        .with_beats_per_measure(beats);
    let mut app = ClickApp::new(config)?;

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();
    result
}
