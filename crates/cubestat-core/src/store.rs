//! Bounded, dynamically keyed time-series store.
//!
//! Groups are registered eagerly at startup in display order. Series inside a
//! group are created the first time their key shows up in a snapshot, because
//! core and GPU counts are only known once the first sample arrives. Keys are
//! never removed during a run.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;

use crate::source::Reading;

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

/// A family of related series sharing one presentation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    Cpu,
    Gpu,
    Accel,
    Memory,
    Swap,
    Disk,
    Network,
    Power,
}

impl Group {
    pub const ALL: &'static [Group] = &[
        Self::Cpu,
        Self::Gpu,
        Self::Accel,
        Self::Memory,
        Self::Swap,
        Self::Disk,
        Self::Network,
        Self::Power,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
            Self::Accel => "accel",
            Self::Memory => "memory",
            Self::Swap => "swap",
            Self::Disk => "disk",
            Self::Network => "network",
            Self::Power => "power",
        }
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Series
// ---------------------------------------------------------------------------

/// Fixed-capacity FIFO of samples for one metric key.
///
/// Storage is reserved once in [`Series::with_capacity`]; once full, every
/// push evicts the oldest sample, so the buffer never grows.
#[derive(Debug, Clone)]
pub struct Series {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl Series {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    /// The `width` most recent samples as of `h_shift` samples ago, oldest first.
    ///
    /// With `n = len`, the window is `[max(0, end - width), end)` where
    /// `end = n - h_shift` clamped to `[0, n]`. A shift past the history gives
    /// an empty window and a width past the history gives a short one.
    pub fn window(&self, h_shift: usize, width: usize) -> Vec<f64> {
        let end = self.samples.len().saturating_sub(h_shift);
        let start = end.saturating_sub(width);
        self.samples.range(start..end).copied().collect()
    }
}

// ---------------------------------------------------------------------------
// SeriesStore
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct GroupSeries {
    group: Group,
    series: Vec<(String, Series)>,
    index: HashMap<String, usize>,
}

impl GroupSeries {
    fn new(group: Group) -> Self {
        Self {
            group,
            series: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn series_mut(&mut self, key: &str, capacity: usize) -> &mut Series {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                let idx = self.series.len();
                self.series
                    .push((key.to_string(), Series::with_capacity(capacity)));
                self.index.insert(key.to_string(), idx);
                idx
            }
        };
        &mut self.series[idx].1
    }
}

/// Group → key → [`Series`], iterated in first-seen order.
#[derive(Debug)]
pub struct SeriesStore {
    capacity: usize,
    groups: Vec<GroupSeries>,
}

impl SeriesStore {
    /// Create a store whose series hold `capacity` samples each, with
    /// `groups` registered up front in display order.
    pub fn new(capacity: usize, groups: &[Group]) -> Self {
        let mut store = Self {
            capacity: capacity.max(1),
            groups: Vec::with_capacity(groups.len()),
        };
        for &group in groups {
            store.group_index(group);
        }
        store
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn groups(&self) -> impl Iterator<Item = Group> + '_ {
        self.groups.iter().map(|g| g.group)
    }

    /// Total number of series across all groups.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.series.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn group_index(&mut self, group: Group) -> usize {
        match self.groups.iter().position(|g| g.group == group) {
            Some(idx) => idx,
            None => {
                self.groups.push(GroupSeries::new(group));
                self.groups.len() - 1
            }
        }
    }

    /// Append one sample, creating the series (and the group) on first sight.
    pub fn push(&mut self, group: Group, key: &str, value: f64) {
        let capacity = self.capacity;
        let idx = self.group_index(group);
        self.groups[idx].series_mut(key, capacity).push(value);
    }

    /// Bulk append of one snapshot's readings.
    pub fn update<'a>(&mut self, readings: impl IntoIterator<Item = &'a Reading>) {
        for r in readings {
            self.push(r.group, &r.key, r.value);
        }
    }

    pub fn get(&self, group: Group, key: &str) -> Option<&Series> {
        let g = self.groups.iter().find(|g| g.group == group)?;
        g.index.get(key).map(|&idx| &g.series[idx].1)
    }

    /// Window of one series; empty if the series does not exist.
    pub fn slice(&self, group: Group, key: &str, h_shift: usize, width: usize) -> Vec<f64> {
        self.get(group, key)
            .map(|s| s.window(h_shift, width))
            .unwrap_or_default()
    }

    /// Every series in stable order: groups in registration order, keys in
    /// first-seen order. Each call reflects the current contents.
    pub fn iter(&self) -> impl Iterator<Item = (Group, &str, &Series)> + '_ {
        self.groups.iter().flat_map(|g| {
            g.series
                .iter()
                .map(move |(key, series)| (g.group, key.as_str(), series))
        })
    }
}
