//! Groups with a plain show/hide toggle (swap, disk, network) and the
//! always-visible accelerator group.

use super::{Presenter, Visibility};
use crate::mode::{DisplayMode, SimpleMode};
use crate::scale::Scale;
use crate::store::Group;

pub struct SimplePresenter {
    group: Group,
    mode: SimpleMode,
    scale: Scale,
    hotkey: char,
}

impl SimplePresenter {
    /// `swap used`, in bytes.
    pub fn swap(mode: SimpleMode) -> Self {
        Self {
            group: Group::Swap,
            mode,
            scale: Scale::Bytes,
            hotkey: 's',
        }
    }

    /// `disk read` / `disk write`, in bytes per second.
    pub fn disk(mode: SimpleMode) -> Self {
        Self {
            group: Group::Disk,
            mode,
            scale: Scale::BytesPerSec,
            hotkey: 'd',
        }
    }

    /// `network rx` / `network tx`, in bytes per second.
    pub fn network(mode: SimpleMode) -> Self {
        Self {
            group: Group::Network,
            mode,
            scale: Scale::BytesPerSec,
            hotkey: 'n',
        }
    }
}

impl Presenter for SimplePresenter {
    fn group(&self) -> Group {
        self.group
    }

    fn visible(&self, _key: &str) -> Visibility {
        match self.mode {
            SimpleMode::Show => Visibility::TOP,
            SimpleMode::Hide => Visibility::Hidden,
        }
    }

    fn format(&self, _key: &str, window: &[f64], ticks: &[usize]) -> (f64, Vec<String>) {
        self.scale.label(window, ticks)
    }

    fn hotkey(&self) -> Option<char> {
        Some(self.hotkey)
    }

    fn cycle(&mut self, forward: bool) {
        self.mode = self.mode.cycle(forward);
    }

    fn mode_label(&self) -> &'static str {
        self.mode.label()
    }
}

/// Neural engine / accelerator utilization (`ANE util %`).
pub struct AccelPresenter;

impl Presenter for AccelPresenter {
    fn group(&self) -> Group {
        Group::Accel
    }

    fn visible(&self, _key: &str) -> Visibility {
        Visibility::TOP
    }

    fn format(&self, _key: &str, window: &[f64], ticks: &[usize]) -> (f64, Vec<String>) {
        Scale::Percent.label(window, ticks)
    }
}
