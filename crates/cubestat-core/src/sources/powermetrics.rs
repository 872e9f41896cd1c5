//! macOS push source: a long-running `powermetrics -f plist` child writing one
//! plist document per sampling interval.
//!
//! Each document is framed by [`PLIST_SENTINEL`] and decoded into CPU cluster
//! and core load, GPU and ANE load, component power, disk and network
//! throughput. RAM and swap are not in the plist and are read through
//! `sysinfo` (wired pages through `vm_stat`) while decoding.

use std::io::{self, Read};
use std::process::{Child, ChildStdout, Command, Stdio};

use log::{debug, info, warn};
use serde::Deserialize;
use sysinfo::System;

use crate::error::{CubestatError, Result};
use crate::framing::{PLIST_SENTINEL, StreamFramer};
use crate::ingest::StreamIngest;
use crate::source::{RecordDecoder, Snapshot};
use crate::store::Group;

use super::helpers::{is_root, run_command};

const POWERMETRICS: &str = "powermetrics";
const SAMPLERS: &str = "cpu_power,gpu_power,ane_power,network,disk";

/// ANE power draw (mW) that reads as 100% load, by chip generation.
const ANE_SCALERS: &[(&str, f64)] = &[("M1", 13_000.0), ("M2", 15_500.0), ("M3", 15_500.0)];
const DEFAULT_ANE_SCALER: f64 = 15_500.0;

pub type PowermetricsStream = StreamIngest<ChildReader, PowermetricsDecoder>;

/// Spawn powermetrics (through sudo unless already root) and wrap it in a
/// framed stream.
pub fn spawn(interval_ms: u64, max_failures: usize) -> Result<PowermetricsStream> {
    let interval = interval_ms.to_string();
    let args = ["-f", "plist", "-i", interval.as_str(), "-s", SAMPLERS];
    let mut cmd = if is_root() {
        Command::new(POWERMETRICS)
    } else {
        let mut sudo = Command::new("sudo");
        sudo.arg(POWERMETRICS);
        sudo
    };
    cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::null());
    info!("starting {POWERMETRICS} every {interval_ms}ms");
    let reader = ChildReader::spawn(&mut cmd, POWERMETRICS)?;

    let brand = run_command("sysctl", &["-n", "machdep.cpu.brand_string"]).unwrap_or_default();
    let decoder = PowermetricsDecoder::new(ane_scaler(brand.trim()));
    let framer = StreamFramer::new(PLIST_SENTINEL).keep_sentinel(true);
    Ok(StreamIngest::new(reader, decoder, framer, max_failures))
}

/// Power draw that maps to full ANE utilization for the chip in `brand`
/// (e.g. "Apple M2 Ultra"). Ultra parts have two ANEs.
pub fn ane_scaler(brand: &str) -> f64 {
    for (chip, scaler) in ANE_SCALERS {
        if brand.contains(chip) {
            return if brand.to_ascii_lowercase().contains("ultra") {
                scaler * 2.0
            } else {
                *scaler
            };
        }
    }
    DEFAULT_ANE_SCALER
}

// ---------------------------------------------------------------------------
// Child process
// ---------------------------------------------------------------------------

/// Stdout of a child process. The child is killed when this is dropped.
pub struct ChildReader {
    child: Child,
    stdout: ChildStdout,
}

impl ChildReader {
    pub fn spawn(cmd: &mut Command, program: &str) -> Result<Self> {
        let mut child = cmd.spawn().map_err(|source| CubestatError::Spawn {
            program: program.to_string(),
            source,
        })?;
        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(CubestatError::Spawn {
                program: program.to_string(),
                source: io::Error::other("stdout was not captured"),
            });
        };
        Ok(Self { child, stdout })
    }
}

impl Read for ChildReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stdout.read(buf)
    }
}

impl Drop for ChildReader {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            debug!("stopping child process {}", self.child.id());
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

// ---------------------------------------------------------------------------
// Plist decoding
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Record {
    processor: Option<Processor>,
    gpu: Option<Gpu>,
    network: Option<Network>,
    disk: Option<Disk>,
}

#[derive(Debug, Deserialize)]
struct Processor {
    #[serde(default)]
    clusters: Vec<Cluster>,
    combined_power: Option<f64>,
    cpu_power: Option<f64>,
    gpu_power: Option<f64>,
    ane_power: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Cluster {
    name: String,
    #[serde(default)]
    cpus: Vec<Cpu>,
}

#[derive(Debug, Deserialize)]
struct Cpu {
    cpu: u32,
    idle_ratio: f64,
}

#[derive(Debug, Deserialize)]
struct Gpu {
    idle_ratio: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Network {
    ibyte_rate: Option<f64>,
    obyte_rate: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Disk {
    rbytes_per_s: Option<f64>,
    wbytes_per_s: Option<f64>,
}

fn load(idle_ratio: f64) -> f64 {
    100.0 - 100.0 * idle_ratio
}

pub struct PowermetricsDecoder {
    ane_scaler: f64,
    sys: Option<System>,
}

impl PowermetricsDecoder {
    pub fn new(ane_scaler: f64) -> Self {
        Self {
            ane_scaler,
            sys: Some(System::new()),
        }
    }

    /// Decoder that reports only what is in the plist.
    pub fn without_memory(ane_scaler: f64) -> Self {
        Self {
            ane_scaler,
            sys: None,
        }
    }

    fn push_processor(&self, p: &Processor, snap: &mut Snapshot) {
        for cluster in &p.clusters {
            if cluster.cpus.is_empty() {
                continue;
            }
            let idle = cluster.cpus.iter().map(|c| c.idle_ratio).sum::<f64>();
            let n = cluster.cpus.len();
            snap.push(
                Group::Cpu,
                format!("[{n}] {} total CPU util %", cluster.name),
                load(idle / n as f64),
            );
            for cpu in &cluster.cpus {
                snap.push(
                    Group::Cpu,
                    format!("{} CPU {} util %", cluster.name, cpu.cpu),
                    load(cpu.idle_ratio),
                );
            }
        }
        if let Some(ane) = p.ane_power {
            snap.push(Group::Accel, "ANE util %", 100.0 * ane / self.ane_scaler);
        }
        let power = [
            ("total power", p.combined_power),
            ("CPU power", p.cpu_power),
            ("GPU power", p.gpu_power),
            ("ANE power", p.ane_power),
        ];
        for (key, value) in power {
            if let Some(v) = value {
                snap.push(Group::Power, key, v);
            }
        }
    }
}

impl RecordDecoder for PowermetricsDecoder {
    fn decode(&mut self, record: &[u8]) -> Result<Snapshot> {
        let rec: Record = plist::from_bytes(record)?;
        let Some(processor) = rec.processor else {
            return Err(CubestatError::Decode(
                "powermetrics record has no processor section".into(),
            ));
        };

        let mut snap = Snapshot::new();
        self.push_processor(&processor, &mut snap);
        match rec.gpu.and_then(|g| g.idle_ratio) {
            Some(idle) => snap.push(Group::Gpu, "GPU util %", load(idle)),
            None => warn!("powermetrics record has no GPU idle ratio"),
        }
        if let Some(sys) = &mut self.sys {
            super::push_memory(sys, &mut snap);
            match super::vmstat::wired_bytes() {
                Some(wired) => snap.push(Group::Memory, "RAM wired", wired as f64),
                None => debug!("vm_stat gave no wired page count"),
            }
        }
        if let Some(d) = rec.disk {
            snap.push(Group::Disk, "disk read", d.rbytes_per_s.unwrap_or(0.0));
            snap.push(Group::Disk, "disk write", d.wbytes_per_s.unwrap_or(0.0));
        }
        if let Some(n) = rec.network {
            snap.push(Group::Network, "network rx", n.ibyte_rate.unwrap_or(0.0));
            snap.push(Group::Network, "network tx", n.obyte_rate.unwrap_or(0.0));
        }
        Ok(snap)
    }
}
