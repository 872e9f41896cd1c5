pub mod export;
pub mod monitor;

use log::error;

use cubestat_core::{Config, Platform, SnapshotStream};

/// Unsupported platform, or the metric source could not be started.
pub const EXIT_STARTUP: i32 = 1;
/// The metric source failed after starting.
pub const EXIT_FATAL: i32 = 2;

/// Detect the platform and start its metric source, exiting with
/// [`EXIT_STARTUP`] if either step fails.
pub fn start_source(config: &Config) -> (Platform, Box<dyn SnapshotStream>) {
    let platform = match Platform::detect() {
        Ok(p) => p,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            std::process::exit(EXIT_STARTUP);
        }
    };
    match platform.start(config) {
        Ok(stream) => (platform, stream),
        Err(e) => {
            error!("cannot start metric source: {e}");
            eprintln!("Error: {e}");
            std::process::exit(EXIT_STARTUP);
        }
    }
}
