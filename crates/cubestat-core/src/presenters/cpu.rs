//! CPU utilization: one total row per cluster plus one row per core.
//!
//! Cluster totals are keyed `[N] <name> total CPU util %`; on machines without
//! clusters the single total is `[N] Total CPU util %`.

use super::{Presenter, Visibility};
use crate::mode::{CpuMode, DisplayMode};
use crate::scale::Scale;
use crate::store::Group;

pub struct CpuPresenter {
    mode: CpuMode,
}

impl CpuPresenter {
    pub fn new(mode: CpuMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> CpuMode {
        self.mode
    }
}

pub fn is_cluster_total(key: &str) -> bool {
    key.starts_with('[') && key.to_ascii_lowercase().contains("total cpu util")
}

impl Presenter for CpuPresenter {
    fn group(&self) -> Group {
        Group::Cpu
    }

    fn visible(&self, key: &str) -> Visibility {
        let cluster = is_cluster_total(key);
        match (self.mode, cluster) {
            (CpuMode::All, true) => Visibility::TOP,
            (CpuMode::All, false) => Visibility::DETAIL,
            (CpuMode::ByCluster, true) | (CpuMode::ByCore, false) => Visibility::TOP,
            (CpuMode::ByCluster, false) | (CpuMode::ByCore, true) => Visibility::Hidden,
        }
    }

    fn format(&self, _key: &str, window: &[f64], ticks: &[usize]) -> (f64, Vec<String>) {
        Scale::Percent.label(window, ticks)
    }

    fn hotkey(&self) -> Option<char> {
        Some('c')
    }

    fn cycle(&mut self, forward: bool) {
        self.mode = self.mode.cycle(forward);
    }

    fn mode_label(&self) -> &'static str {
        self.mode.label()
    }
}
