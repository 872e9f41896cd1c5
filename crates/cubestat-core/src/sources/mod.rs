//! Platform metric sources.
//!
//! | Platform | Mode | Source |
//! |----------|------|--------|
//! | Linux | pull | `sysinfo`, `/proc/meminfo`, `/proc/diskstats`, `nvidia-smi` |
//! | macOS | push | `powermetrics -f plist` (+ `sysinfo` and `vm_stat` for RAM and swap) |

pub mod diskstats;
pub mod helpers;
pub mod linux;
pub mod meminfo;
pub mod nvidia;
pub mod powermetrics;
pub mod rate;
pub mod vmstat;

use log::info;
use sysinfo::{CpuRefreshKind, RefreshKind, System};

use crate::config::Config;
use crate::error::{CubestatError, Result};
use crate::ingest::{PollIngest, SnapshotStream};
use crate::presenters::memory::RAM_USED_PERCENT;
use crate::source::Snapshot;
use crate::store::Group;

pub use linux::LinuxSource;
pub use powermetrics::{ChildReader, PowermetricsDecoder};
pub use rate::RateReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
}

impl Platform {
    pub fn detect() -> Result<Self> {
        match std::env::consts::OS {
            "linux" => Ok(Self::Linux),
            "macos" => Ok(Self::MacOs),
            other => Err(CubestatError::UnsupportedPlatform(other.to_string())),
        }
    }

    /// Groups this platform can report, in display order.
    pub fn groups(self) -> &'static [Group] {
        match self {
            Self::Linux => &[
                Group::Cpu,
                Group::Gpu,
                Group::Memory,
                Group::Swap,
                Group::Disk,
                Group::Network,
            ],
            Self::MacOs => Group::ALL,
        }
    }

    /// Start the platform's metric stream.
    ///
    /// On macOS this spawns powermetrics and blocks until its first output so
    /// that a sudo password prompt happens before the terminal UI starts.
    pub fn start(self, config: &Config) -> Result<Box<dyn SnapshotStream>> {
        info!("starting {self:?} metric source");
        match self {
            Self::Linux => {
                let source = LinuxSource::new(config.refresh_secs());
                Ok(Box::new(PollIngest::new(
                    source,
                    config.refresh(),
                    config.max_decode_failures,
                )))
            }
            Self::MacOs => {
                let mut stream = powermetrics::spawn(config.refresh_ms, config.max_decode_failures)?;
                stream.prime()?;
                Ok(Box::new(stream))
            }
        }
    }
}

/// Number of logical CPUs.
pub fn cpu_count() -> usize {
    let sys =
        System::new_with_specifics(RefreshKind::nothing().with_cpu(CpuRefreshKind::nothing()));
    sys.cpus().len().max(1)
}

/// RAM and swap readings, shared by both platforms.
fn push_memory(sys: &mut System, snap: &mut Snapshot) {
    sys.refresh_memory();
    let total = sys.total_memory() as f64;
    let used = sys.used_memory() as f64;
    let percent = if total > 0.0 { 100.0 * used / total } else { 0.0 };
    snap.push(Group::Memory, RAM_USED_PERCENT, percent);
    snap.push(Group::Memory, "RAM used", used);
    snap.push(Group::Swap, "swap used", sys.used_swap() as f64);
}
