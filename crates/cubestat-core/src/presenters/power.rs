//! Power draw in milliwatts: `total power` plus per-component rows.

use super::{Presenter, Visibility};
use crate::mode::{DisplayMode, PowerMode};
use crate::scale::Scale;
use crate::store::Group;

pub struct PowerPresenter {
    mode: PowerMode,
}

impl PowerPresenter {
    pub fn new(mode: PowerMode) -> Self {
        Self { mode }
    }
}

impl Presenter for PowerPresenter {
    fn group(&self) -> Group {
        Group::Power
    }

    fn visible(&self, key: &str) -> Visibility {
        let total = key.contains("total");
        match self.mode {
            PowerMode::Off => Visibility::Hidden,
            PowerMode::Combined if !total => Visibility::Hidden,
            _ if !total => Visibility::DETAIL,
            _ => Visibility::TOP,
        }
    }

    fn format(&self, _key: &str, window: &[f64], ticks: &[usize]) -> (f64, Vec<String>) {
        Scale::Power.label(window, ticks)
    }

    fn hotkey(&self) -> Option<char> {
        Some('p')
    }

    fn cycle(&mut self, forward: bool) {
        self.mode = self.mode.cycle(forward);
    }

    fn mode_label(&self) -> &'static str {
        self.mode.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_shows_total_only() {
        let p = PowerPresenter::new(PowerMode::Combined);
        assert_eq!(p.visible("total power"), Visibility::TOP);
        assert_eq!(p.visible("CPU power"), Visibility::Hidden);
    }

    #[test]
    fn all_indents_components() {
        let p = PowerPresenter::new(PowerMode::All);
        assert_eq!(p.visible("total power"), Visibility::TOP);
        assert_eq!(p.visible("ANE power"), Visibility::DETAIL);
    }

    #[test]
    fn off_hides_everything() {
        let p = PowerPresenter::new(PowerMode::Off);
        assert_eq!(p.visible("total power"), Visibility::Hidden);
        assert_eq!(p.visible("GPU power"), Visibility::Hidden);
    }

    #[test]
    fn watts_label() {
        let p = PowerPresenter::new(PowerMode::All);
        let (_, labels) = p.format("total power", &[2300.0], &[0]);
        assert_eq!(labels, vec!["2.3 W"]);
    }
}
