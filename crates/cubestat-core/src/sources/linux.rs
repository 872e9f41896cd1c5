//! Linux pull source: CPU, memory and network through `sysinfo`, mapped
//! memory from `/proc/meminfo`, disk throughput from `/proc/diskstats`,
//! NVIDIA GPUs through `nvidia-smi`.

use std::path::PathBuf;

use log::{debug, info};
use sysinfo::{Networks, System};

use crate::error::Result;
use crate::source::{PollSource, Snapshot};
use crate::store::Group;

use super::diskstats::{self, DISKSTATS_PATH};
use super::meminfo::{self, MEMINFO_PATH};
use super::nvidia::NvidiaSmi;
use super::rate::RateReader;

pub struct LinuxSource {
    sys: System,
    networks: Networks,
    rates: RateReader,
    diskstats: PathBuf,
    meminfo: PathBuf,
    nvidia: Option<NvidiaSmi>,
}

impl LinuxSource {
    pub fn new(interval_secs: f64) -> Self {
        let mut sys = System::new();
        // cpu_usage() is relative to the previous refresh; prime it so the
        // first snapshot is meaningful.
        sys.refresh_cpu_usage();
        let nvidia = NvidiaSmi::detect();
        if nvidia.is_some() {
            info!("nvidia-smi found; reporting GPU load and VRAM");
        }
        Self {
            sys,
            networks: Networks::new_with_refreshed_list(),
            rates: RateReader::new(interval_secs),
            diskstats: PathBuf::from(DISKSTATS_PATH),
            meminfo: PathBuf::from(MEMINFO_PATH),
            nvidia,
        }
    }

    fn read_cpu(&mut self, snap: &mut Snapshot) {
        self.sys.refresh_cpu_usage();
        let cores: Vec<f64> = self
            .sys
            .cpus()
            .iter()
            .map(|c| f64::from(c.cpu_usage()))
            .collect();
        if cores.is_empty() {
            return;
        }
        let mean = cores.iter().sum::<f64>() / cores.len() as f64;
        snap.push(Group::Cpu, format!("[{}] Total CPU util %", cores.len()), mean);
        for (i, load) in cores.into_iter().enumerate() {
            snap.push(Group::Cpu, format!("CPU {i} util %"), load);
        }
    }

    fn read_network(&mut self, snap: &mut Snapshot) {
        self.networks.refresh(true);
        let (rx, tx) = self
            .networks
            .iter()
            .filter(|(name, _)| name.as_str() != "lo")
            .fold((0u64, 0u64), |(rx, tx), (_, data)| {
                (rx + data.total_received(), tx + data.total_transmitted())
            });
        snap.push(Group::Network, "network rx", self.rates.next("network rx", rx as f64));
        snap.push(Group::Network, "network tx", self.rates.next("network tx", tx as f64));
    }

    fn read_mapped(&self, snap: &mut Snapshot) {
        match meminfo::read_field(&self.meminfo, "Mapped") {
            Ok(bytes) => snap.push(Group::Memory, "RAM mapped", bytes as f64),
            Err(e) => debug!("skipping mapped memory: {e}"),
        }
    }

    fn read_disk(&mut self, snap: &mut Snapshot) {
        match diskstats::read_totals(&self.diskstats) {
            Ok(t) => {
                let read = self.rates.next("disk read", t.read_bytes as f64);
                let write = self.rates.next("disk write", t.written_bytes as f64);
                snap.push(Group::Disk, "disk read", read);
                snap.push(Group::Disk, "disk write", write);
            }
            Err(e) => debug!("skipping disk metrics: {e}"),
        }
    }

    fn read_gpu(&mut self, snap: &mut Snapshot) {
        let Some(nvidia) = &self.nvidia else {
            return;
        };
        match nvidia.query() {
            Ok(gpus) => snap.extend(gpus),
            Err(e) => debug!("skipping GPU metrics: {e}"),
        }
    }
}

impl PollSource for LinuxSource {
    fn name(&self) -> &'static str {
        "linux"
    }

    fn collect(&mut self) -> Result<Snapshot> {
        let mut snap = Snapshot::new();
        self.read_cpu(&mut snap);
        self.read_gpu(&mut snap);
        super::push_memory(&mut self.sys, &mut snap);
        self.read_mapped(&mut snap);
        self.read_disk(&mut snap);
        self.read_network(&mut snap);
        Ok(snap)
    }
}
