//! cubestat: live horizon charts of CPU, GPU, memory, disk, network and power
//! in the terminal.

mod commands;
mod tui;

use std::fs::OpenOptions;
use std::path::Path;

use clap::Parser;

use cubestat_core::{Config, ExportFormat, GroupModes};

#[derive(Parser)]
#[command(name = "cubestat")]
#[command(about = "cubestat: horizon charts of your machine's load, in the terminal")]
#[command(version = cubestat_core::VERSION)]
struct Cli {
    /// Sampling period in milliseconds
    #[arg(short = 'i', long, default_value_t = cubestat_core::config::DEFAULT_REFRESH_MS)]
    refresh_ms: u64,

    /// Samples kept per metric
    #[arg(long, default_value_t = cubestat_core::config::DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Color theme. Hotkey: "t"
    #[arg(long, default_value = "col", value_parser = ["mono", "inv", "col"])]
    color: String,

    /// Legend and ruler: none, newest value only, or a ruler every 20 columns. Hotkey: "v"
    #[arg(long, default_value = "one", value_parser = ["off", "one", "all"])]
    view: String,

    /// CPU rows; defaults to "all" below 20 cores, "by_cluster" otherwise. Hotkey: "c"
    #[arg(long, value_parser = ["all", "by_cluster", "by_core"])]
    cpu: Option<String>,

    /// GPU rows: total only (none with a single GPU), load, or load and VRAM usage. Hotkey: "g"
    #[arg(long, default_value = "load_only", value_parser = ["collapsed", "load_only", "load_and_vram"])]
    gpu: String,

    /// Memory rows: percent only, or byte counts too. Hotkey: "m"
    #[arg(long, default_value = "all", value_parser = ["percent", "all"])]
    memory: String,

    /// Swap show/hide. Hotkey: "s"
    #[arg(long, default_value = "show", value_parser = ["show", "hide"])]
    swap: String,

    /// Disk read/write show/hide. Hotkey: "d"
    #[arg(long, default_value = "show", value_parser = ["show", "hide"])]
    disk: String,

    /// Network rx/tx show/hide. Hotkey: "n"
    #[arg(long, default_value = "show", value_parser = ["show", "hide"])]
    network: String,

    /// Power rows: total only, total and components, or hidden. Hotkey: "p"
    #[arg(long, default_value = "combined", value_parser = ["combined", "all", "off"])]
    power: String,

    /// Consecutive unreadable samples tolerated before giving up
    #[arg(long, default_value_t = cubestat_core::config::DEFAULT_MAX_DECODE_FAILURES)]
    max_decode_failures: usize,

    /// Log file (default: cubestat.log in the temp directory). Level via RUST_LOG.
    #[arg(long)]
    log_file: Option<String>,

    /// Write samples to stdout instead of starting the dashboard
    #[arg(long, value_parser = ["csv", "jsonl"])]
    export: Option<String>,
}

impl Cli {
    fn config(&self) -> cubestat_core::Result<Config> {
        let config = Config {
            refresh_ms: self.refresh_ms,
            buffer_size: self.buffer_size,
            max_decode_failures: self.max_decode_failures,
            view: self.view.parse()?,
            theme: self.color.parse()?,
            modes: GroupModes {
                cpu: self.cpu.as_deref().map(str::parse).transpose()?,
                gpu: self.gpu.parse()?,
                memory: self.memory.parse()?,
                swap: self.swap.parse()?,
                disk: self.disk.parse()?,
                network: self.network.parse()?,
                power: self.power.parse()?,
            },
            log_file: self.log_file.as_ref().map(Into::into),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Route `log` output to a file; the terminal belongs to the dashboard.
fn init_logging(path: &Path) {
    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: cannot open log file {}: {e}", path.display());
            return;
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

fn main() {
    let cli = Cli::parse();

    let config = match cli.config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(commands::EXIT_STARTUP);
        }
    };
    init_logging(&config.log_path());
    log::info!("cubestat {} starting: {config:?}", cubestat_core::VERSION);

    let export = match cli.export.as_deref().map(str::parse::<ExportFormat>).transpose() {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(commands::EXIT_STARTUP);
        }
    };

    match export {
        Some(format) => commands::export::run(&config, format),
        None => commands::monitor::run(&config),
    }
}
