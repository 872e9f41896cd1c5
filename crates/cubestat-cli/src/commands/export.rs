use std::io::{self, ErrorKind};

use log::info;

use cubestat_core::{Config, CubestatError, ExportFormat, ingest};

pub fn run(config: &Config, format: ExportFormat) {
    let (_, mut stream) = super::start_source(config);
    let mut sink = format.sink(io::stdout().lock());
    match ingest::run(stream.as_mut(), sink.as_mut()) {
        Ok(n) => info!("export finished after {n} snapshots"),
        // Reader went away (e.g. `| head`).
        Err(CubestatError::Io { source }) if source.kind() == ErrorKind::BrokenPipe => {
            info!("stdout closed; stopping export");
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(super::EXIT_FATAL);
        }
    }
}
