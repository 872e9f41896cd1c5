//! Per-second rates from monotonically increasing counters.

use std::collections::HashMap;

/// Turns cumulative counters (bytes read, bytes received) into rates over the
/// sampling interval. The first observation of a key yields 0.
#[derive(Debug, Clone)]
pub struct RateReader {
    interval_secs: f64,
    last: HashMap<String, f64>,
}

impl RateReader {
    pub fn new(interval_secs: f64) -> Self {
        Self {
            interval_secs: if interval_secs > 0.0 { interval_secs } else { 1.0 },
            last: HashMap::new(),
        }
    }

    /// Rate of `key` since the previous call. A counter that went backwards
    /// (reset, device removed) reads as 0.
    pub fn next(&mut self, key: &str, value: f64) -> f64 {
        let prev = self.last.insert(key.to_string(), value).unwrap_or(value);
        ((value - prev) / self.interval_secs).max(0.0)
    }
}
