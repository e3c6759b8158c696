//! Application entry point for the particle viewer.
//!
//! This binary parses the command line, installs the logger, loads the
//! configuration and hands everything to [`Viewer`] from the `viewer`
//! module.

mod canvas;
mod viewer;

use clap::Parser;
use log::{error, info};
use particulate_core::config::Config;
use std::path::PathBuf;
use viewer::Viewer;

#[derive(Parser, Debug)]
#[command(name = "particulate", about = "Interactive 2-D particle simulation")]
struct Args {
    /// JSON configuration file; omitted fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for a reproducible particle layout
    #[arg(short, long)]
    seed: Option<u64>,
}

/// Starts the native eframe application.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if the configuration is unusable or eframe fails to create the
///   native window or event loop.
fn main() -> eframe::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let cfg = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(cfg) => {
                info!("loaded configuration from {}", path.display());
                cfg
            }
            Err(err) => {
                error!("{}: {err}", path.display());
                return Err(eframe::Error::AppCreation(Box::new(err)));
            }
        },
        None => Config::default(),
    };

    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "Particulate",
        options,
        Box::new(move |_cc| {
            let viewer = Viewer::new(cfg, args.seed)?;
            Ok(Box::new(viewer))
        }),
    )
}
