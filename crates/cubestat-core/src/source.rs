//! Metric source traits and the [`Snapshot`] they produce.
//!
//! A pull source is polled on a fixed schedule and returns one snapshot per
//! call. A push source is a subprocess writing framed records; its
//! [`RecordDecoder`] turns one complete record into one snapshot.

use serde::Serialize;

use crate::error::Result;
use crate::store::Group;

/// One metric value inside a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub group: Group,
    pub key: String,
    pub value: f64,
}

/// All readings of one instant, in the order the source produced them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    readings: Vec<Reading>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, group: Group, key: impl Into<String>, value: f64) {
        self.readings.push(Reading {
            group,
            key: key.into(),
            value,
        });
    }

    pub fn extend(&mut self, other: Snapshot) {
        self.readings.extend(other.readings);
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// First value recorded under `key`, if any.
    pub fn get(&self, group: Group, key: &str) -> Option<f64> {
        self.readings
            .iter()
            .find(|r| r.group == group && r.key == key)
            .map(|r| r.value)
    }

    pub fn count_matching(&self, group: Group, pred: impl Fn(&str) -> bool) -> usize {
        self.readings
            .iter()
            .filter(|r| r.group == group && pred(&r.key))
            .count()
    }
}

impl FromIterator<(Group, String, f64)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (Group, String, f64)>>(iter: I) -> Self {
        let mut snap = Snapshot::new();
        for (group, key, value) in iter {
            snap.push(group, key, value);
        }
        snap
    }
}

/// Pull-mode source: one blocking call yields one complete snapshot.
pub trait PollSource: Send {
    fn name(&self) -> &'static str;

    fn collect(&mut self) -> Result<Snapshot>;
}

/// Push-mode decoder: turns one framed record into one snapshot.
pub trait RecordDecoder: Send {
    fn decode(&mut self, record: &[u8]) -> Result<Snapshot>;
}
