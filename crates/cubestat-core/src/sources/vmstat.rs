//! macOS wired memory from `vm_stat`.
//!
//! ```text
//! Mach Virtual Memory Statistics: (page size of 16384 bytes)
//! Pages free:                               12345.
//! Pages wired down:                        183042.
//! ```

use super::helpers::run_command;

/// Page size used when the header is missing.
const DEFAULT_PAGE_SIZE: u64 = 4096;

/// Run `vm_stat` and return wired memory in bytes.
pub fn wired_bytes() -> Option<u64> {
    parse_wired(&run_command("vm_stat", &[])?)
}

pub fn parse_wired(text: &str) -> Option<u64> {
    let page_size = text
        .lines()
        .next()
        .and_then(|header| header.split("page size of ").nth(1))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|n| n.parse::<u64>().ok())
        .unwrap_or(DEFAULT_PAGE_SIZE);
    let pages = text.lines().find_map(|line| {
        let value = line.strip_prefix("Pages wired down:")?;
        value.trim().trim_end_matches('.').parse::<u64>().ok()
    })?;
    Some(pages * page_size)
}
