//! Cyclable display modes.
//!
//! Every mode enum lists its variants once in [`DisplayMode::ALL`]; `next` and
//! `prev` walk that list with wrap-around. Hotkeys call `next` for lower-case
//! and `prev` for upper-case keys.

use crate::error::{CubestatError, Result};

pub trait DisplayMode: Copy + PartialEq + Sized + 'static {
    /// All variants in cycling order.
    const ALL: &'static [Self];

    /// Name used on the command line and in the status line.
    fn label(self) -> &'static str;

    fn position(self) -> usize {
        Self::ALL.iter().position(|m| *m == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        let n = Self::ALL.len();
        Self::ALL[(self.position() + n - 1) % n]
    }

    fn cycle(self, forward: bool) -> Self {
        if forward { self.next() } else { self.prev() }
    }

    /// All labels, for CLI help and validation.
    fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|m| m.label()).collect()
    }
}

macro_rules! display_mode {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl DisplayMode for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn label(self) -> &'static str {
                match self {
                    $( Self::$variant => $label ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }

        impl std::str::FromStr for $name {
            type Err = CubestatError;

            fn from_str(s: &str) -> Result<Self> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|m| m.label() == s)
                    .ok_or_else(|| {
                        CubestatError::Config(format!(
                            "unknown {} `{s}` (expected one of: {})",
                            stringify!($name),
                            Self::labels().join(", ")
                        ))
                    })
            }
        }
    };
}

display_mode! {
    /// Legend and ruler overlay.
    ViewMode {
        Off => "off",
        /// Only the newest value is labelled.
        One => "one",
        /// A label every ruler interval across the full width.
        All => "all",
    }
}

display_mode! {
    ColorTheme {
        Mono => "mono",
        Inv => "inv",
        Col => "col",
    }
}

display_mode! {
    CpuMode {
        All => "all",
        ByCluster => "by_cluster",
        ByCore => "by_core",
    }
}

display_mode! {
    GpuMode {
        /// Only the combined load row, which exists with more than one GPU.
        Collapsed => "collapsed",
        LoadOnly => "load_only",
        LoadAndVram => "load_and_vram",
    }
}

display_mode! {
    RamMode {
        Percent => "percent",
        All => "all",
    }
}

display_mode! {
    /// Show/hide toggle for groups without finer modes.
    SimpleMode {
        Show => "show",
        Hide => "hide",
    }
}

display_mode! {
    PowerMode {
        Combined => "combined",
        All => "all",
        Off => "off",
    }
}

impl Default for ViewMode {
    fn default() -> Self {
        Self::One
    }
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self::Col
    }
}

/// Machines with many cores default to one row per cluster.
const MANY_CORES: usize = 20;

impl CpuMode {
    pub fn default_for(cpu_count: usize) -> Self {
        if cpu_count < MANY_CORES {
            Self::All
        } else {
            Self::ByCluster
        }
    }
}

impl Default for GpuMode {
    fn default() -> Self {
        Self::LoadOnly
    }
}

impl Default for RamMode {
    fn default() -> Self {
        Self::All
    }
}

impl Default for SimpleMode {
    fn default() -> Self {
        Self::Show
    }
}

impl Default for PowerMode {
    fn default() -> Self {
        Self::Combined
    }
}
