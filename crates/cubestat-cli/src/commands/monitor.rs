use std::sync::{Arc, mpsc};
use std::thread;

use log::{error, info};

use cubestat_core::{Config, Dashboard, ingest, sources};

use crate::tui::app::{App, Exit};
use crate::tui::palette::Palettes;

pub fn run(config: &Config) {
    let (platform, mut stream) = super::start_source(config);
    let dashboard = Dashboard::new(config, platform.groups(), sources::cpu_count()).shared();

    let (fatal_tx, fatal_rx) = mpsc::channel();
    let mut sink = Arc::clone(&dashboard);
    let spawned = thread::Builder::new()
        .name("ingest".into())
        .spawn(move || match ingest::run(stream.as_mut(), &mut sink) {
            Ok(n) => info!("ingestion finished after {n} snapshots"),
            Err(e) => {
                error!("ingestion stopped: {e}");
                let _ = fatal_tx.send(e);
            }
        });
    if let Err(e) = spawned {
        eprintln!("Error: cannot start ingestion thread: {e}");
        std::process::exit(super::EXIT_STARTUP);
    }

    let palettes = Palettes::new(crossterm::style::available_color_count());
    let mut app = App::new(dashboard, fatal_rx, palettes);
    match app.run() {
        Ok(Exit::Quit) => info!("quit"),
        Ok(Exit::Fatal(e)) => {
            eprintln!("Error: {e}");
            std::process::exit(super::EXIT_FATAL);
        }
        Err(e) => {
            eprintln!("TUI error: {e}");
            std::process::exit(super::EXIT_STARTUP);
        }
    }
}
