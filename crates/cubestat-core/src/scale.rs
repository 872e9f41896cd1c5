//! Domain ceilings, glyph-cell mapping and unit formatting.

/// Glyphs from empty to full, in intensity order.
pub const GLYPHS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

const KB: f64 = 1024.0;
const MB: f64 = KB * 1024.0;
const GB: f64 = MB * 1024.0;
const TB: f64 = GB * 1024.0;

const BYTE_UNITS: &[(f64, &str)] = &[(TB, "TB"), (GB, "GB"), (MB, "MB"), (KB, "KB"), (1.0, "B")];
/// Power readings arrive in milliwatts.
const POWER_UNITS: &[(f64, &str)] = &[(1_000_000.0, "kW"), (1_000.0, "W"), (1.0, "mW")];

// ---------------------------------------------------------------------------
// Ceilings
// ---------------------------------------------------------------------------

/// Smallest power of two `>= v`; `1` for non-positive or non-finite input.
pub fn ceil_pow2(v: f64) -> f64 {
    ceil_pow(v, 2.0)
}

/// Smallest power of ten `>= v`; `1` for non-positive or non-finite input.
pub fn ceil_pow10(v: f64) -> f64 {
    ceil_pow(v, 10.0)
}

fn ceil_pow(v: f64, base: f64) -> f64 {
    if !v.is_finite() || v <= 0.0 {
        return 1.0;
    }
    let mut c = base.powi((v.ln() / base.ln()).ceil() as i32);
    // Correct for log rounding at exact powers.
    if c < v {
        c *= base;
    }
    if c / base >= v {
        c /= base;
    }
    c
}

/// Map `value` onto one of `cells` palette entries.
///
/// `round(value * cells / ceiling)` clamped to `[0, cells - 1]`. Index 0 is
/// the blank cell; NaN, negative values and a non-positive ceiling map there.
pub fn cell_index(value: f64, ceiling: f64, cells: usize) -> usize {
    if cells == 0 || value.is_nan() || value <= 0.0 || ceiling.is_nan() || ceiling <= 0.0 {
        return 0;
    }
    let idx = (value * cells as f64 / ceiling).round();
    // `as` saturates, so +inf lands on usize::MAX and is clamped below.
    (idx as usize).min(cells - 1)
}

// ---------------------------------------------------------------------------
// Scale
// ---------------------------------------------------------------------------

/// How one metric family maps values to a domain and to text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    /// Fixed `[0, 100]`.
    Percent,
    /// Auto-ranged to a power of two, binary units.
    Bytes,
    /// Like [`Scale::Bytes`] with a `/s` suffix.
    BytesPerSec,
    /// Auto-ranged to a power of ten, milliwatt input.
    Power,
}

impl Scale {
    /// Domain ceiling for a window, never zero.
    pub fn ceiling(self, window: &[f64]) -> f64 {
        let max = window
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max);
        match self {
            Self::Percent => 100.0,
            Self::Bytes | Self::BytesPerSec => ceil_pow2(max),
            Self::Power => ceil_pow10(max),
        }
    }

    /// Format one value. The unit depends only on `ceiling`, so every label
    /// of a window uses the same one.
    pub fn format(self, value: f64, ceiling: f64) -> String {
        match self {
            Self::Percent => format!("{value:3.0}%"),
            Self::Bytes => {
                let (factor, unit) = pick_unit(BYTE_UNITS, ceiling);
                format!("{:.1} {unit}", value / factor)
            }
            Self::BytesPerSec => {
                let (factor, unit) = pick_unit(BYTE_UNITS, ceiling);
                format!("{:.1} {unit}/s", value / factor)
            }
            Self::Power => {
                let (factor, unit) = pick_unit(POWER_UNITS, ceiling);
                format!("{:.1} {unit}", value / factor)
            }
        }
    }

    /// Ceiling of `window` plus one label per entry of `ticks`, where a tick
    /// counts samples back from the newest. Ticks outside the window get an
    /// empty label.
    pub fn label(self, window: &[f64], ticks: &[usize]) -> (f64, Vec<String>) {
        let ceiling = self.ceiling(window);
        let labels = ticks
            .iter()
            .map(|&ago| match window.len().checked_sub(ago + 1) {
                Some(i) => self.format(window[i], ceiling),
                None => String::new(),
            })
            .collect();
        (ceiling, labels)
    }
}

/// Largest unit whose factor is `<= ceiling`, falling back to the smallest.
fn pick_unit(units: &'static [(f64, &'static str)], ceiling: f64) -> (f64, &'static str) {
    units
        .iter()
        .copied()
        .find(|(factor, _)| *factor <= ceiling)
        .or_else(|| units.last().copied())
        .unwrap_or((1.0, ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pow2_ceiling() {
        assert_eq!(ceil_pow2(0.0), 1.0);
        assert_eq!(ceil_pow2(-3.0), 1.0);
        assert_eq!(ceil_pow2(f64::NAN), 1.0);
        assert_eq!(ceil_pow2(1.0), 1.0);
        assert_eq!(ceil_pow2(3.0), 4.0);
        assert_eq!(ceil_pow2(4.0), 4.0);
        assert_eq!(ceil_pow2(1000.0), 1024.0);
        assert_eq!(ceil_pow2(1025.0), 2048.0);
        assert_eq!(ceil_pow2(0.3), 0.5);
    }

    #[test]
    fn pow2_ceiling_is_smallest_and_deterministic() {
        for i in 1..5000 {
            let v = i as f64 * 7.3;
            let c = ceil_pow2(v);
            assert!(c >= v);
            assert!(c / 2.0 < v);
            assert_eq!(c, ceil_pow2(v));
        }
    }

    #[test]
    fn pow10_ceiling() {
        assert_eq!(ceil_pow10(0.0), 1.0);
        assert_eq!(ceil_pow10(7.0), 10.0);
        assert_eq!(ceil_pow10(10.0), 10.0);
        assert_eq!(ceil_pow10(1000.0), 1000.0);
        assert_eq!(ceil_pow10(1500.0), 10_000.0);
    }

    #[test]
    fn cell_index_is_bounded() {
        let values = [
            -1e9,
            -1.0,
            0.0,
            0.4,
            1.0,
            50.0,
            99.9,
            100.0,
            1e9,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NAN,
        ];
        for cells in [1, 9, 25] {
            for ceiling in [1e-6, 1.0, 100.0, 1e12] {
                for v in values {
                    assert!(cell_index(v, ceiling, cells) < cells);
                }
            }
        }
    }

    #[test]
    fn cell_index_rounds_and_clamps() {
        assert_eq!(cell_index(0.0, 100.0, 9), 0);
        assert_eq!(cell_index(f64::NAN, 100.0, 9), 0);
        assert_eq!(cell_index(50.0, 100.0, 9), 5); // 4.5 rounds up
        assert_eq!(cell_index(100.0, 100.0, 9), 8);
        assert_eq!(cell_index(5.0, 0.0, 9), 0);
        assert_eq!(cell_index(1.0, 1.0, 0), 0);
    }

    #[test]
    fn percent_format() {
        assert_eq!(Scale::Percent.format(4.0, 100.0), "  4%");
        assert_eq!(Scale::Percent.format(100.0, 100.0), "100%");
        assert_eq!(Scale::Percent.ceiling(&[1.0, 3.0]), 100.0);
    }

    #[test]
    fn byte_unit_follows_ceiling() {
        let (ceiling, labels) = Scale::Bytes.label(&[15.0, 25.0], &[1]);
        assert_eq!(ceiling, 32.0);
        assert_eq!(labels, vec!["15.0 B"]);

        let (ceiling, labels) = Scale::Bytes.label(&[1500.0, 2050.0], &[1, 0]);
        assert_eq!(ceiling, 4096.0);
        assert_eq!(labels, vec!["1.5 KB", "2.0 KB"]);
    }

    #[test]
    fn rate_unit_has_suffix() {
        assert_eq!(Scale::BytesPerSec.format(3.0 * MB, 4.0 * MB), "3.0 MB/s");
    }

    #[test]
    fn power_units_are_decimal() {
        let (ceiling, labels) = Scale::Power.label(&[800.0, 1500.0], &[0, 1]);
        assert_eq!(ceiling, 10_000.0);
        assert_eq!(labels, vec!["1.5 W", "0.8 W"]);
        assert_eq!(Scale::Power.format(40.0, 100.0), "40.0 mW");
    }

    #[test]
    fn empty_window_has_unit_ceiling() {
        let (ceiling, labels) = Scale::BytesPerSec.label(&[], &[0, 20]);
        assert_eq!(ceiling, 1.0);
        assert_eq!(labels, vec![String::new(), String::new()]);
    }
}
