//! Linux `/proc/meminfo` parsing.
//!
//! ```text
//! MemTotal:       32594148 kB
//! MemAvailable:   24087576 kB
//! Mapped:          1460348 kB
//! ```
//! Values are in KiB regardless of the `kB` suffix.

use std::path::Path;

use crate::error::{CubestatError, Result};

pub const MEMINFO_PATH: &str = "/proc/meminfo";

/// Bytes of `field` (e.g. `Mapped`) in the meminfo file at `path`.
pub fn read_field(path: &Path, field: &str) -> Result<u64> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CubestatError::Decode(format!("{}: {e}", path.display())))?;
    parse_field(&text, field)
        .ok_or_else(|| CubestatError::Decode(format!("{}: no {field} entry", path.display())))
}

pub fn parse_field(text: &str, field: &str) -> Option<u64> {
    text.lines().find_map(|line| {
        let (name, rest) = line.split_once(':')?;
        if name.trim() != field {
            return None;
        }
        let kib: u64 = rest.split_whitespace().next()?.parse().ok()?;
        Some(kib * 1024)
    })
}
