//! Runtime configuration assembled by the CLI.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{CubestatError, Result};
use crate::mode::{ColorTheme, CpuMode, GpuMode, PowerMode, RamMode, SimpleMode, ViewMode};

/// Default sampling period.
pub const DEFAULT_REFRESH_MS: u64 = 1000;
/// Default number of samples kept per series.
pub const DEFAULT_BUFFER_SIZE: usize = 500;
/// Consecutive source failures tolerated before ingestion stops.
pub const DEFAULT_MAX_DECODE_FAILURES: usize = 10;

const MIN_REFRESH_MS: u64 = 10;

/// Initial display mode of every group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupModes {
    /// `None` picks [`CpuMode::default_for`] the detected core count.
    pub cpu: Option<CpuMode>,
    pub gpu: GpuMode,
    pub memory: RamMode,
    pub swap: SimpleMode,
    pub disk: SimpleMode,
    pub network: SimpleMode,
    pub power: PowerMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub refresh_ms: u64,
    pub buffer_size: usize,
    pub max_decode_failures: usize,
    pub view: ViewMode,
    pub theme: ColorTheme,
    pub modes: GroupModes,
    /// Where `env_logger` writes; `None` means `$TMPDIR/cubestat.log`.
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_ms: DEFAULT_REFRESH_MS,
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_decode_failures: DEFAULT_MAX_DECODE_FAILURES,
            view: ViewMode::default(),
            theme: ColorTheme::default(),
            modes: GroupModes::default(),
            log_file: None,
        }
    }
}

impl Config {
    pub fn refresh(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    pub fn refresh_secs(&self) -> f64 {
        self.refresh_ms as f64 / 1000.0
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("cubestat.log"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh_ms < MIN_REFRESH_MS {
            return Err(CubestatError::Config(format!(
                "refresh interval must be at least {MIN_REFRESH_MS} ms, got {}",
                self.refresh_ms
            )));
        }
        if self.buffer_size == 0 {
            return Err(CubestatError::Config("buffer size must be positive".into()));
        }
        if self.max_decode_failures == 0 {
            return Err(CubestatError::Config(
                "max decode failures must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.refresh(), Duration::from_secs(1));
        assert_eq!(c.buffer_size, 500);
        assert_eq!(c.max_decode_failures, 10);
        assert_eq!(c.view, ViewMode::One);
        assert_eq!(c.modes.power, PowerMode::Combined);
        assert!(c.modes.cpu.is_none());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn default_log_path_is_in_temp_dir() {
        let c = Config::default();
        assert_eq!(c.log_path(), std::env::temp_dir().join("cubestat.log"));
    }

    #[test]
    fn rejects_bad_values() {
        let c = Config {
            refresh_ms: 1,
            ..Config::default()
        };
        assert!(c.validate().is_err());
        let c = Config {
            buffer_size: 0,
            ..Config::default()
        };
        assert!(c.validate().is_err());
        let c = Config {
            max_decode_failures: 0,
            ..Config::default()
        };
        assert!(c.validate().is_err());
    }
}
