//! NVIDIA GPU load and VRAM via `nvidia-smi`.

use crate::error::{CubestatError, Result};
use crate::source::Snapshot;
use crate::store::Group;

use super::helpers::{command_exists, run_command};

const NVIDIA_SMI: &str = "nvidia-smi";
const QUERY_ARGS: &[&str] = &[
    "--query-gpu=utilization.gpu,memory.used,memory.total",
    "--format=csv,noheader,nounits",
];

pub struct NvidiaSmi;

impl NvidiaSmi {
    /// `Some` if `nvidia-smi` is on the PATH.
    pub fn detect() -> Option<Self> {
        command_exists(NVIDIA_SMI).then_some(Self)
    }

    pub fn query(&self) -> Result<Snapshot> {
        let out = run_command(NVIDIA_SMI, QUERY_ARGS)
            .ok_or_else(|| CubestatError::Decode(format!("{NVIDIA_SMI} query failed")))?;
        parse_query(&out)
    }
}

/// Parse `utilization, used MiB, total MiB` lines, one per GPU.
///
/// With more than one GPU a `[N] Total GPU util %` row (mean load) comes
/// first.
pub fn parse_query(text: &str) -> Result<Snapshot> {
    let mut gpus = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let fields: Vec<f64> = line
            .split(',')
            .map(|f| f.trim().parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| CubestatError::Decode(format!("{NVIDIA_SMI} line {line:?}: {e}")))?;
        let [util, used, total] = fields[..] else {
            return Err(CubestatError::Decode(format!(
                "{NVIDIA_SMI} line {line:?}: expected 3 fields"
            )));
        };
        let vram = if total > 0.0 { 100.0 * used / total } else { 0.0 };
        gpus.push((util, vram));
    }

    let mut snap = Snapshot::new();
    if gpus.len() > 1 {
        let mean = gpus.iter().map(|(u, _)| u).sum::<f64>() / gpus.len() as f64;
        snap.push(Group::Gpu, format!("[{}] Total GPU util %", gpus.len()), mean);
    }
    for (i, (util, vram)) in gpus.into_iter().enumerate() {
        snap.push(Group::Gpu, format!("NVIDIA GPU {i} util %"), util);
        snap.push(Group::Gpu, format!("NVIDIA GPU {i} vram used %"), vram);
    }
    Ok(snap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_gpu() {
        let s = parse_query("37, 2048, 8192\n").unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.get(Group::Gpu, "NVIDIA GPU 0 util %"), Some(37.0));
        assert_eq!(s.get(Group::Gpu, "NVIDIA GPU 0 vram used %"), Some(25.0));
    }

    #[test]
    fn multiple_gpus_get_a_total_first() {
        let s = parse_query("10, 0, 100\n30, 50, 100\n").unwrap();
        assert_eq!(s.readings()[0].key, "[2] Total GPU util %");
        assert_eq!(s.readings()[0].value, 20.0);
        assert_eq!(s.get(Group::Gpu, "NVIDIA GPU 1 vram used %"), Some(50.0));
    }

    #[test]
    fn zero_total_memory() {
        let s = parse_query("5, 0, 0").unwrap();
        assert_eq!(s.get(Group::Gpu, "NVIDIA GPU 0 vram used %"), Some(0.0));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(parse_query("[N/A], 1, 2").unwrap_err().is_transient());
        assert!(parse_query("1, 2").unwrap_err().is_transient());
    }

    #[test]
    fn empty_output_means_no_gpus() {
        assert!(parse_query("\n").unwrap().is_empty());
    }

    #[test]
    #[ignore] // Requires an NVIDIA GPU: cargo test -- --ignored
    fn live_query() {
        let smi = NvidiaSmi::detect().expect("nvidia-smi not found");
        assert!(!smi.query().unwrap().is_empty());
    }
}
