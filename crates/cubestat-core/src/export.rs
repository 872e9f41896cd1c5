//! Headless export sinks: every published snapshot is written to a stream
//! instead of the terminal UI.
//!
//! - CSV: `timestamp,group,metric,value`, header once, one row per reading.
//! - JSONL: one `{"timestamp":..,"readings":[..]}` object per snapshot.
//!
//! Both flush after each snapshot so a downstream pipe sees samples live.

use std::io::Write;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::error::{CubestatError, Result};
use crate::ingest::SnapshotSink;
use crate::source::{Reading, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Jsonl,
}

impl FromStr for ExportFormat {
    type Err = CubestatError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "csv" => Ok(Self::Csv),
            "jsonl" => Ok(Self::Jsonl),
            other => Err(CubestatError::Config(format!(
                "unknown export format {other:?} (expected csv or jsonl)"
            ))),
        }
    }
}

impl ExportFormat {
    /// Boxed sink of this format over `out`.
    pub fn sink<W: Write + 'static>(self, out: W) -> Box<dyn SnapshotSink> {
        match self {
            Self::Csv => Box::new(CsvSink::new(out)),
            Self::Jsonl => Box::new(JsonlSink::new(out)),
        }
    }
}

fn unix_secs_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

pub struct CsvSink<W> {
    out: W,
    header_written: bool,
    clock: fn() -> f64,
}

impl<W: Write> CsvSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            header_written: false,
            clock: unix_secs_now,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Quote a field if it contains a delimiter, quote or newline.
fn csv_field(s: &str) -> std::borrow::Cow<'_, str> {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\"")).into()
    } else {
        s.into()
    }
}

impl<W: Write> SnapshotSink for CsvSink<W> {
    fn publish(&mut self, snapshot: Snapshot) -> Result<()> {
        if !self.header_written {
            writeln!(self.out, "timestamp,group,metric,value")?;
            self.header_written = true;
        }
        let ts = (self.clock)();
        for r in snapshot.iter() {
            writeln!(
                self.out,
                "{ts:.3},{},{},{}",
                r.group,
                csv_field(&r.key),
                r.value
            )?;
        }
        self.out.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON lines
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct JsonRecord<'a> {
    timestamp: f64,
    readings: &'a [Reading],
}

pub struct JsonlSink<W> {
    out: W,
    clock: fn() -> f64,
}

impl<W: Write> JsonlSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            clock: unix_secs_now,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SnapshotSink for JsonlSink<W> {
    fn publish(&mut self, snapshot: Snapshot) -> Result<()> {
        let record = JsonRecord {
            timestamp: (self.clock)(),
            readings: snapshot.readings(),
        };
        serde_json::to_writer(&mut self.out, &record).map_err(std::io::Error::from)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}
