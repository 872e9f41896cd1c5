//! Linux `/proc/diskstats` parsing.
//!
//! Lines look like:
//! ```text
//!  259       0 nvme0n1 81745 20963 6301162 19383 130541 84420 9532770 ...
//!  259       1 nvme0n1p1 262 1014 17578 57 2 0 2 ...
//! ```
//! Field 6 is sectors read and field 10 sectors written, always in 512-byte
//! units. Only whole disks are counted so partitions are not added twice.

use std::path::Path;

use crate::error::{CubestatError, Result};

pub const DISKSTATS_PATH: &str = "/proc/diskstats";

const SECTOR_BYTES: u64 = 512;

/// Cumulative bytes moved by all whole disks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiskTotals {
    pub read_bytes: u64,
    pub written_bytes: u64,
}

pub fn read_totals(path: &Path) -> Result<DiskTotals> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CubestatError::Decode(format!("{}: {e}", path.display())))?;
    Ok(parse(&text))
}

pub fn parse(text: &str) -> DiskTotals {
    let mut totals = DiskTotals::default();
    for line in text.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 10 || !is_whole_disk(fields[2]) {
            continue;
        }
        let (Ok(read), Ok(written)) = (fields[5].parse::<u64>(), fields[9].parse::<u64>()) else {
            continue;
        };
        totals.read_bytes += read * SECTOR_BYTES;
        totals.written_bytes += written * SECTOR_BYTES;
    }
    totals
}

/// Physical disks only: no partitions, loop/ram devices, or device-mapper
/// and md volumes stacked on top of other disks.
pub fn is_whole_disk(name: &str) -> bool {
    const VIRTUAL: &[&str] = &["loop", "ram", "zram", "dm-", "md", "sr", "fd"];
    if VIRTUAL.iter().any(|p| name.starts_with(p)) {
        return false;
    }
    if name.starts_with("nvme") || name.starts_with("mmcblk") {
        return !has_partition_suffix(name);
    }
    !name.ends_with(|c: char| c.is_ascii_digit())
}

/// `nvme0n1p2`, `mmcblk0p1`: a `p<digits>` tail after a digit.
fn has_partition_suffix(name: &str) -> bool {
    let Some(i) = name.rfind('p') else {
        return false;
    };
    let tail = &name[i + 1..];
    !tail.is_empty()
        && tail.chars().all(|c| c.is_ascii_digit())
        && name[..i].ends_with(|c: char| c.is_ascii_digit())
}
