//! Shared state between the ingestion thread and the render thread.
//!
//! The series store, the viewport and every presenter live in one
//! [`Dashboard`] behind one mutex. The ingestion thread holds the lock only
//! while publishing a decoded snapshot; the render thread holds it while
//! building one frame, so a frame never mixes two publishes.

use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;

use crate::config::Config;
use crate::error::Result;
use crate::ingest::SnapshotSink;
use crate::layout::{self, ChartRow, FrameLayout};
use crate::mode::{ColorTheme, DisplayMode, ViewMode};
use crate::presenters::{self, Presenter, Visibility};
use crate::source::Snapshot;
use crate::store::{Group, SeriesStore};

pub type SharedDashboard = Arc<Mutex<Dashboard>>;

/// Lock the dashboard, recovering the guard if a previous holder panicked.
pub fn lock(shared: &Mutex<Dashboard>) -> MutexGuard<'_, Dashboard> {
    match shared.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// Visible metrics skipped from the top.
    pub v_shift: usize,
    /// Newest samples hidden; 0 follows the live edge.
    pub h_shift: usize,
    pub view: ViewMode,
    pub theme: ColorTheme,
}

pub struct Dashboard {
    store: SeriesStore,
    viewport: Viewport,
    presenters: Vec<Box<dyn Presenter>>,
    refresh_secs: f64,
    observed: u64,
    rendered: u64,
    settings_changed: bool,
}

impl Dashboard {
    /// Build the dashboard for the groups a platform provides, in display
    /// order. `cpu_count` picks the default CPU mode when none is configured.
    pub fn new(config: &Config, groups: &[Group], cpu_count: usize) -> Self {
        Self {
            store: SeriesStore::new(config.buffer_size, groups),
            viewport: Viewport {
                view: config.view,
                theme: config.theme,
                ..Viewport::default()
            },
            presenters: groups
                .iter()
                .map(|&g| presenters::for_group(g, &config.modes, cpu_count))
                .collect(),
            refresh_secs: config.refresh_secs(),
            observed: 0,
            rendered: 0,
            settings_changed: false,
        }
    }

    pub fn shared(self) -> SharedDashboard {
        Arc::new(Mutex::new(self))
    }

    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn snapshots_observed(&self) -> u64 {
        self.observed
    }

    pub fn presenter(&self, group: Group) -> Option<&dyn Presenter> {
        self.presenters
            .iter()
            .find(|p| p.group() == group)
            .map(|p| p.as_ref())
    }

    // -----------------------------------------------------------------------
    // Ingestion side
    // -----------------------------------------------------------------------

    /// Fold one snapshot into the store. A paused view (nonzero horizontal
    /// shift) is shifted along so the same samples stay on screen.
    pub fn publish(&mut self, snapshot: &Snapshot) {
        self.store.update(snapshot.iter());
        for p in &mut self.presenters {
            p.observe(snapshot);
        }
        self.observed += 1;
        if self.viewport.h_shift > 0 {
            self.viewport.h_shift += 1;
        }
    }

    // -----------------------------------------------------------------------
    // Input side
    // -----------------------------------------------------------------------

    pub fn scroll_up(&mut self) {
        if self.viewport.v_shift > 0 {
            self.viewport.v_shift -= 1;
            self.settings_changed = true;
        }
    }

    pub fn scroll_down(&mut self) {
        self.viewport.v_shift += 1;
        self.settings_changed = true;
    }

    /// Move one sample back in time, at most to the oldest observed one.
    pub fn scroll_back(&mut self) {
        if (self.viewport.h_shift as u64) + 1 < self.observed {
            self.viewport.h_shift += 1;
            self.settings_changed = true;
        }
    }

    pub fn scroll_forward(&mut self) {
        if self.viewport.h_shift > 0 {
            self.viewport.h_shift -= 1;
            self.settings_changed = true;
        }
    }

    pub fn reset_shifts(&mut self) {
        if self.viewport.v_shift > 0 || self.viewport.h_shift > 0 {
            self.viewport.v_shift = 0;
            self.viewport.h_shift = 0;
            self.settings_changed = true;
        }
    }

    pub fn cycle_view(&mut self, forward: bool) {
        self.viewport.view = self.viewport.view.cycle(forward);
        self.settings_changed = true;
    }

    pub fn cycle_theme(&mut self, forward: bool) {
        self.viewport.theme = self.viewport.theme.cycle(forward);
        self.settings_changed = true;
    }

    /// Cycle the group whose hotkey is `key`: forward for the hotkey itself,
    /// backward for its upper-case form. Returns false if no group owns it.
    pub fn cycle_group(&mut self, key: char) -> bool {
        for p in &mut self.presenters {
            let Some(hotkey) = p.hotkey() else {
                continue;
            };
            let forward = if key == hotkey {
                true
            } else if key == hotkey.to_ascii_uppercase() {
                false
            } else {
                continue;
            };
            p.cycle(forward);
            debug!("{} mode is now {}", p.group(), p.mode_label());
            self.settings_changed = true;
            return true;
        }
        false
    }

    /// Terminal size changed; the next frame must be drawn.
    pub fn force_redraw(&mut self) {
        self.settings_changed = true;
    }

    // -----------------------------------------------------------------------
    // Render side
    // -----------------------------------------------------------------------

    /// False when nothing was published and nothing changed since the last
    /// [`Dashboard::mark_rendered`].
    pub fn needs_redraw(&self) -> bool {
        self.observed != self.rendered || self.settings_changed
    }

    pub fn mark_rendered(&mut self) {
        self.rendered = self.observed;
        self.settings_changed = false;
    }

    /// Compose a frame of `cols` x `height` cells from the current state.
    pub fn layout(&self, cols: usize, height: usize) -> FrameLayout {
        let view = self.viewport.view;
        let h_shift = self.viewport.h_shift;
        let ticks = layout::ruler_ticks(cols, view);
        let max_rows = height / 2;

        let mut rows = Vec::new();
        let mut skip = self.viewport.v_shift;
        for (group, key, series) in self.store.iter() {
            if rows.len() >= max_rows {
                break;
            }
            let Some(presenter) = self.presenter(group) else {
                continue;
            };
            let Visibility::Shown { indent } = presenter.visible(key) else {
                continue;
            };
            if skip > 0 {
                skip -= 1;
                continue;
            }

            let window = series.window(h_shift, layout::chart_width(cols, indent));
            let in_window: Vec<usize> = ticks
                .iter()
                .copied()
                .filter(|&ago| ago < window.len())
                .collect();
            let (ceiling, formatted) = presenter.format(key, &window, &in_window);
            let labels: Vec<(usize, String)> = in_window.into_iter().zip(formatted).collect();

            rows.push(ChartRow {
                group,
                key: key.to_string(),
                indent,
                header: layout::header(cols, indent, key, &labels),
                window,
                ceiling,
            });
        }

        let time_ruler = (view != ViewMode::Off)
            .then(|| layout::time_ruler(cols, self.refresh_secs, h_shift));

        FrameLayout {
            cols,
            theme: self.viewport.theme,
            rows,
            time_ruler,
        }
    }
}

impl SnapshotSink for SharedDashboard {
    fn publish(&mut self, snapshot: Snapshot) -> Result<()> {
        lock(self).publish(&snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::{CpuMode, PowerMode};

    fn dashboard(buffer: usize) -> Dashboard {
        let config = Config {
            buffer_size: buffer,
            ..Config::default()
        };
        Dashboard::new(&config, &[Group::Cpu, Group::Memory, Group::Power], 4)
    }

    fn snap(values: &[(Group, &str, f64)]) -> Snapshot {
        let mut s = Snapshot::new();
        for (g, k, v) in values {
            s.push(*g, *k, *v);
        }
        s
    }

    #[test]
    fn publish_counts_and_stores() {
        let mut d = dashboard(5);
        d.publish(&snap(&[(Group::Cpu, "CPU 0 util %", 10.0)]));
        d.publish(&snap(&[(Group::Cpu, "CPU 0 util %", 20.0)]));
        assert_eq!(d.snapshots_observed(), 2);
        assert_eq!(
            d.store().slice(Group::Cpu, "CPU 0 util %", 0, 10),
            vec![10.0, 20.0]
        );
    }

    #[test]
    fn paused_window_stays_anchored() {
        let mut d = dashboard(100);
        for i in 0..10 {
            d.publish(&snap(&[(Group::Cpu, "x", i as f64)]));
        }
        for _ in 0..3 {
            d.scroll_back();
        }
        assert_eq!(d.viewport().h_shift, 3);
        let before = d.store().slice(Group::Cpu, "x", d.viewport().h_shift, 4);

        for i in 10..15 {
            d.publish(&snap(&[(Group::Cpu, "x", i as f64)]));
        }
        assert_eq!(d.viewport().h_shift, 8);
        let after = d.store().slice(Group::Cpu, "x", d.viewport().h_shift, 4);
        assert_eq!(before, after);
    }

    #[test]
    fn live_view_follows_new_samples() {
        let mut d = dashboard(100);
        d.publish(&snap(&[(Group::Cpu, "x", 1.0)]));
        d.publish(&snap(&[(Group::Cpu, "x", 2.0)]));
        assert_eq!(d.viewport().h_shift, 0);
        assert_eq!(d.store().slice(Group::Cpu, "x", 0, 1), vec![2.0]);
    }

    #[test]
    fn horizontal_shift_is_bounded_by_history() {
        let mut d = dashboard(100);
        d.scroll_back();
        assert_eq!(d.viewport().h_shift, 0);
        for _ in 0..3 {
            d.publish(&snap(&[(Group::Cpu, "x", 1.0)]));
        }
        for _ in 0..10 {
            d.scroll_back();
        }
        assert_eq!(d.viewport().h_shift, 2);
        d.scroll_forward();
        assert_eq!(d.viewport().h_shift, 1);
    }

    #[test]
    fn vertical_shift_never_negative() {
        let mut d = dashboard(5);
        d.scroll_up();
        assert_eq!(d.viewport().v_shift, 0);
        d.scroll_down();
        d.scroll_down();
        d.scroll_up();
        assert_eq!(d.viewport().v_shift, 1);
        d.reset_shifts();
        assert_eq!(d.viewport(), Viewport {
            view: ViewMode::One,
            theme: ColorTheme::Col,
            ..Viewport::default()
        });
    }

    #[test]
    fn redraw_gate() {
        let mut d = dashboard(5);
        assert!(!d.needs_redraw());
        d.publish(&snap(&[(Group::Cpu, "x", 1.0)]));
        assert!(d.needs_redraw());
        d.mark_rendered();
        assert!(!d.needs_redraw());
        d.cycle_theme(true);
        assert!(d.needs_redraw());
        d.mark_rendered();
        d.force_redraw();
        assert!(d.needs_redraw());
    }

    #[test]
    fn unchanged_shift_does_not_request_redraw() {
        let mut d = dashboard(5);
        d.scroll_up();
        d.scroll_forward();
        d.reset_shifts();
        assert!(!d.needs_redraw());
    }

    #[test]
    fn hotkeys_cycle_groups() {
        let mut d = dashboard(5);
        assert!(d.cycle_group('c'));
        assert_eq!(d.presenter(Group::Cpu).unwrap().mode_label(), CpuMode::ByCluster.label());
        assert!(d.cycle_group('C'));
        assert_eq!(d.presenter(Group::Cpu).unwrap().mode_label(), "all");
        assert!(d.cycle_group('P'));
        assert_eq!(d.presenter(Group::Power).unwrap().mode_label(), PowerMode::Off.label());
        assert!(!d.cycle_group('z'));
        // Swap is not registered on this dashboard.
        assert!(!d.cycle_group('s'));
    }

    #[test]
    fn layout_filters_hidden_and_skips_v_shift() {
        let mut d = dashboard(50);
        d.publish(&snap(&[
            (Group::Cpu, "[4] Total CPU util %", 50.0),
            (Group::Cpu, "CPU 0 util %", 40.0),
            (Group::Memory, "RAM used %", 60.0),
            (Group::Power, "total power", 2000.0),
            (Group::Power, "CPU power", 900.0),
        ]));
        let frame = d.layout(60, 100);
        let keys: Vec<&str> = frame.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["[4] Total CPU util %", "CPU 0 util %", "RAM used %", "total power"]
        );
        assert_eq!(frame.rows[1].indent, "  ");

        d.scroll_down();
        let frame = d.layout(60, 100);
        assert_eq!(frame.rows[0].key, "CPU 0 util %");
    }

    #[test]
    fn layout_stops_at_screen_height() {
        let mut d = dashboard(50);
        d.publish(&snap(&[
            (Group::Cpu, "a", 1.0),
            (Group::Cpu, "b", 1.0),
            (Group::Cpu, "c", 1.0),
        ]));
        assert_eq!(d.layout(40, 4).rows.len(), 2);
        assert_eq!(d.layout(40, 5).rows.len(), 2);
        assert_eq!(d.layout(40, 1).rows.len(), 0);
    }

    #[test]
    fn layout_rows_carry_window_and_legend() {
        let mut d = dashboard(50);
        for v in [10.0, 20.0, 42.0] {
            d.publish(&snap(&[(Group::Memory, "RAM used %", v)]));
        }
        let frame = d.layout(40, 10);
        let row = &frame.rows[0];
        assert_eq!(row.window, vec![10.0, 20.0, 42.0]);
        assert_eq!(row.ceiling, 100.0);
        assert_eq!(row.header.chars().count(), 40);
        assert!(row.header.contains(" 42%|"));
        assert!(frame.time_ruler.is_some());

        d.cycle_view(false);
        let frame = d.layout(40, 10);
        assert!(!frame.rows[0].header.contains('|'));
        assert!(frame.time_ruler.is_none());
    }

    #[test]
    fn shared_sink_publishes_under_lock() {
        let mut shared = dashboard(5).shared();
        shared
            .publish(snap(&[(Group::Cpu, "x", 3.0)]))
            .unwrap();
        assert_eq!(lock(&shared).snapshots_observed(), 1);
    }
}
