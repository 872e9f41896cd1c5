//! GPU load and VRAM usage.
//!
//! Keys: `[N] Total GPU util %` (only with more than one GPU),
//! `<VENDOR> GPU <i> util %`, `<VENDOR> GPU <i> vram used %`, and the Apple
//! integrated `GPU util %`. Collapsed mode keeps only the total row, so a
//! machine with a single GPU shows no GPU rows at all.

use super::{Presenter, Visibility};
use crate::mode::{DisplayMode, GpuMode};
use crate::scale::Scale;
use crate::source::Snapshot;
use crate::store::Group;

pub struct GpuPresenter {
    mode: GpuMode,
    gpus: usize,
}

impl GpuPresenter {
    pub fn new(mode: GpuMode) -> Self {
        Self { mode, gpus: 0 }
    }

    pub fn mode(&self) -> GpuMode {
        self.mode
    }

    pub fn gpu_count(&self) -> usize {
        self.gpus
    }
}

fn is_total(key: &str) -> bool {
    key.contains("Total GPU")
}

fn is_vram(key: &str) -> bool {
    key.contains("vram")
}

impl Presenter for GpuPresenter {
    fn group(&self) -> Group {
        Group::Gpu
    }

    fn visible(&self, key: &str) -> Visibility {
        let total = is_total(key);
        let multi = self.gpus > 1;
        if self.mode == GpuMode::Collapsed && self.gpus > 0 && !total {
            return Visibility::Hidden;
        }
        if is_vram(key) && self.mode != GpuMode::LoadAndVram {
            return Visibility::Hidden;
        }
        if multi && !total {
            Visibility::DETAIL
        } else {
            Visibility::TOP
        }
    }

    fn format(&self, _key: &str, window: &[f64], ticks: &[usize]) -> (f64, Vec<String>) {
        Scale::Percent.label(window, ticks)
    }

    fn hotkey(&self) -> Option<char> {
        Some('g')
    }

    fn cycle(&mut self, forward: bool) {
        self.mode = self.mode.cycle(forward);
    }

    fn mode_label(&self) -> &'static str {
        self.mode.label()
    }

    fn observe(&mut self, snapshot: &Snapshot) {
        let n = snapshot.count_matching(Group::Gpu, |k| k.ends_with("util %") && !is_total(k));
        if n > 0 {
            self.gpus = n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_gpus() -> Snapshot {
        let mut s = Snapshot::new();
        s.push(Group::Gpu, "[2] Total GPU util %", 30.0);
        s.push(Group::Gpu, "NVIDIA GPU 0 util %", 20.0);
        s.push(Group::Gpu, "NVIDIA GPU 0 vram used %", 50.0);
        s.push(Group::Gpu, "NVIDIA GPU 1 util %", 40.0);
        s.push(Group::Gpu, "NVIDIA GPU 1 vram used %", 10.0);
        s
    }

    #[test]
    fn counts_gpus_from_snapshot() {
        let mut p = GpuPresenter::new(GpuMode::LoadOnly);
        p.observe(&two_gpus());
        assert_eq!(p.gpu_count(), 2);
    }

    #[test]
    fn collapsed_shows_only_total_with_many_gpus() {
        let mut p = GpuPresenter::new(GpuMode::Collapsed);
        p.observe(&two_gpus());
        assert_eq!(p.visible("[2] Total GPU util %"), Visibility::TOP);
        assert_eq!(p.visible("NVIDIA GPU 0 util %"), Visibility::Hidden);
    }

    #[test]
    fn load_only_hides_vram() {
        let mut p = GpuPresenter::new(GpuMode::LoadOnly);
        p.observe(&two_gpus());
        assert_eq!(p.visible("NVIDIA GPU 1 util %"), Visibility::DETAIL);
        assert_eq!(p.visible("NVIDIA GPU 1 vram used %"), Visibility::Hidden);
    }

    #[test]
    fn load_and_vram_shows_everything() {
        let mut p = GpuPresenter::new(GpuMode::LoadAndVram);
        p.observe(&two_gpus());
        assert_eq!(p.visible("NVIDIA GPU 1 vram used %"), Visibility::DETAIL);
        assert_eq!(p.visible("[2] Total GPU util %"), Visibility::TOP);
    }

    #[test]
    fn single_gpu_is_not_indented() {
        let mut p = GpuPresenter::new(GpuMode::LoadOnly);
        let mut s = Snapshot::new();
        s.push(Group::Gpu, "GPU util %", 12.0);
        p.observe(&s);
        assert_eq!(p.gpu_count(), 1);
        assert_eq!(p.visible("GPU util %"), Visibility::TOP);
    }

    #[test]
    fn collapsed_hides_a_single_gpu() {
        let mut p = GpuPresenter::new(GpuMode::Collapsed);
        let mut s = Snapshot::new();
        s.push(Group::Gpu, "GPU util %", 12.0);
        p.observe(&s);
        assert_eq!(p.visible("GPU util %"), Visibility::Hidden);
        p.cycle(true);
        assert_eq!(p.visible("GPU util %"), Visibility::TOP);
    }

    #[test]
    fn snapshot_without_gpus_keeps_previous_count() {
        let mut p = GpuPresenter::new(GpuMode::LoadOnly);
        p.observe(&two_gpus());
        p.observe(&Snapshot::new());
        assert_eq!(p.gpu_count(), 2);
    }
}
