//! RAM usage: the `RAM used %` row is always drawn; byte-valued detail rows
//! (`RAM used`, plus `RAM mapped` on Linux or `RAM wired` on macOS) only in
//! [`RamMode::All`].

use super::{Presenter, Visibility};
use crate::mode::{DisplayMode, RamMode};
use crate::scale::Scale;
use crate::store::Group;

pub const RAM_USED_PERCENT: &str = "RAM used %";

pub struct MemoryPresenter {
    mode: RamMode,
}

impl MemoryPresenter {
    pub fn new(mode: RamMode) -> Self {
        Self { mode }
    }
}

impl Presenter for MemoryPresenter {
    fn group(&self) -> Group {
        Group::Memory
    }

    fn visible(&self, key: &str) -> Visibility {
        if key == RAM_USED_PERCENT {
            Visibility::TOP
        } else if self.mode == RamMode::All {
            Visibility::DETAIL
        } else {
            Visibility::Hidden
        }
    }

    fn format(&self, key: &str, window: &[f64], ticks: &[usize]) -> (f64, Vec<String>) {
        if key.ends_with('%') {
            Scale::Percent.label(window, ticks)
        } else {
            Scale::Bytes.label(window, ticks)
        }
    }

    fn hotkey(&self) -> Option<char> {
        Some('m')
    }

    fn cycle(&mut self, forward: bool) {
        self.mode = self.mode.cycle(forward);
    }

    fn mode_label(&self) -> &'static str {
        self.mode.label()
    }
}
