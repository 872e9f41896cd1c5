//! Presentation policy per metric group.
//!
//! A presenter decides which keys of its group are visible under the current
//! mode (and how far they are indented), how values are scaled and labelled,
//! and which hotkey cycles its mode. One implementation exists per group and
//! is chosen once at startup by [`for_group`].

pub mod cpu;
pub mod gpu;
pub mod memory;
pub mod power;
pub mod simple;

use crate::config::GroupModes;
use crate::mode::CpuMode;
use crate::source::Snapshot;
use crate::store::Group;

pub use cpu::CpuPresenter;
pub use gpu::GpuPresenter;
pub use memory::MemoryPresenter;
pub use power::PowerPresenter;
pub use simple::{AccelPresenter, SimplePresenter};

/// Indent of detail rows under a total row.
pub const DETAIL_INDENT: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Shown { indent: &'static str },
}

impl Visibility {
    pub const TOP: Visibility = Visibility::Shown { indent: "" };
    pub const DETAIL: Visibility = Visibility::Shown {
        indent: DETAIL_INDENT,
    };
}

pub trait Presenter: Send {
    fn group(&self) -> Group;

    /// Whether `key` is drawn under the current mode, and its indent.
    fn visible(&self, key: &str) -> Visibility;

    /// Domain ceiling of `window` and one label per tick (samples back from
    /// the newest).
    fn format(&self, key: &str, window: &[f64], ticks: &[usize]) -> (f64, Vec<String>);

    /// Key that cycles this group's mode; its upper-case form cycles back.
    fn hotkey(&self) -> Option<char> {
        None
    }

    fn cycle(&mut self, _forward: bool) {}

    fn mode_label(&self) -> &'static str {
        "show"
    }

    /// Learn topology (e.g. GPU count) from a freshly published snapshot.
    fn observe(&mut self, _snapshot: &Snapshot) {}
}

/// Build the presenter of `group` with its initial mode from `modes`.
pub fn for_group(group: Group, modes: &GroupModes, cpu_count: usize) -> Box<dyn Presenter> {
    match group {
        Group::Cpu => Box::new(CpuPresenter::new(
            modes.cpu.unwrap_or_else(|| CpuMode::default_for(cpu_count)),
        )),
        Group::Gpu => Box::new(GpuPresenter::new(modes.gpu)),
        Group::Accel => Box::new(AccelPresenter),
        Group::Memory => Box::new(MemoryPresenter::new(modes.memory)),
        Group::Swap => Box::new(SimplePresenter::swap(modes.swap)),
        Group::Disk => Box::new(SimplePresenter::disk(modes.disk)),
        Group::Network => Box::new(SimplePresenter::network(modes.network)),
        Group::Power => Box::new(PowerPresenter::new(modes.power)),
    }
}
