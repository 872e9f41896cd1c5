//! Ingestion loop: turns a metric source into a sequence of snapshots and
//! hands each one to a sink.
//!
//! Pull sources are polled on a drift-free schedule ([`TickSchedule`]); push
//! sources are read chunk by chunk and framed with a [`StreamFramer`]. Both
//! drop undecodable records and give up only after a run of consecutive
//! failures ([`FailureTracker`]).

use std::collections::VecDeque;
use std::io::{ErrorKind, Read};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::error::{CubestatError, Result};
use crate::framing::StreamFramer;
use crate::source::{PollSource, RecordDecoder, Snapshot};

const READ_CHUNK: usize = 64 * 1024;

/// Blocking producer of complete snapshots.
pub trait SnapshotStream: Send {
    /// Block until one fully decoded snapshot is available. `Ok(None)` means
    /// the source ended; `Err` means ingestion cannot continue.
    fn next_snapshot(&mut self) -> Result<Option<Snapshot>>;
}

/// Consumer of published snapshots.
pub trait SnapshotSink {
    fn publish(&mut self, snapshot: Snapshot) -> Result<()>;
}

/// Feed every snapshot of `stream` into `sink` until the stream ends or fails.
/// Returns the number of snapshots published.
pub fn run<S, K>(stream: &mut S, sink: &mut K) -> Result<u64>
where
    S: SnapshotStream + ?Sized,
    K: SnapshotSink + ?Sized,
{
    let mut published = 0u64;
    while let Some(snapshot) = stream.next_snapshot()? {
        sink.publish(snapshot)?;
        published += 1;
    }
    warn!("metric source ended after {published} snapshots; ingestion stopped");
    Ok(published)
}

// ---------------------------------------------------------------------------
// Failure accounting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FailureTracker {
    threshold: usize,
    consecutive: usize,
    total: u64,
}

impl FailureTracker {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            consecutive: 0,
            total: 0,
        }
    }

    pub fn record_success(&mut self) {
        self.consecutive = 0;
    }

    /// Count a failure. Transient errors are swallowed until `threshold` of
    /// them arrive in a row; anything else is returned as is.
    pub fn record_failure(&mut self, err: CubestatError) -> Result<()> {
        if !err.is_transient() {
            return Err(err);
        }
        self.consecutive += 1;
        self.total += 1;
        warn!(
            "dropping record ({}/{} consecutive failures): {err}",
            self.consecutive, self.threshold
        );
        if self.consecutive >= self.threshold {
            return Err(CubestatError::TooManyFailures {
                count: self.consecutive,
                last: err.to_string(),
            });
        }
        Ok(())
    }

    pub fn consecutive(&self) -> usize {
        self.consecutive
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

// ---------------------------------------------------------------------------
// Pull mode
// ---------------------------------------------------------------------------

/// Fixed-period schedule anchored at its start time: tick `n` is due at
/// `start + n * interval`, so a slow poll does not push later ticks back.
#[derive(Debug, Clone)]
pub struct TickSchedule {
    start: Instant,
    interval: Duration,
    ticks: u32,
}

impl TickSchedule {
    pub fn new(start: Instant, interval: Duration) -> Self {
        Self {
            start,
            interval,
            ticks: 0,
        }
    }

    /// Advance to the next tick and return how long to sleep from `now`;
    /// zero if the tick is already due.
    pub fn next_delay(&mut self, now: Instant) -> Duration {
        self.ticks = self.ticks.saturating_add(1);
        self.interval
            .checked_mul(self.ticks)
            .and_then(|offset| self.start.checked_add(offset))
            .map(|due| due.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }
}

pub struct PollIngest<S> {
    source: S,
    schedule: TickSchedule,
    failures: FailureTracker,
    started: bool,
}

impl<S: PollSource> PollIngest<S> {
    pub fn new(source: S, interval: Duration, max_failures: usize) -> Self {
        Self {
            source,
            schedule: TickSchedule::new(Instant::now(), interval),
            failures: FailureTracker::new(max_failures),
            started: false,
        }
    }

    pub fn failures(&self) -> &FailureTracker {
        &self.failures
    }
}

impl<S: PollSource> SnapshotStream for PollIngest<S> {
    fn next_snapshot(&mut self) -> Result<Option<Snapshot>> {
        loop {
            if self.started {
                thread::sleep(self.schedule.next_delay(Instant::now()));
            } else {
                info!("polling {} every {:?}", self.source.name(), self.schedule.interval);
                self.started = true;
            }
            match self.source.collect() {
                Ok(snapshot) => {
                    self.failures.record_success();
                    return Ok(Some(snapshot));
                }
                Err(e) => self.failures.record_failure(e)?,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Push mode
// ---------------------------------------------------------------------------

pub struct StreamIngest<R, D> {
    reader: R,
    decoder: D,
    framer: StreamFramer,
    ready: VecDeque<Result<Vec<u8>>>,
    failures: FailureTracker,
    chunk: Vec<u8>,
}

impl<R: Read + Send, D: RecordDecoder> StreamIngest<R, D> {
    pub fn new(reader: R, decoder: D, framer: StreamFramer, max_failures: usize) -> Self {
        Self {
            reader,
            decoder,
            framer,
            ready: VecDeque::new(),
            failures: FailureTracker::new(max_failures),
            chunk: vec![0; READ_CHUNK],
        }
    }

    /// Block until the source has written something. Used before the
    /// terminal UI starts so an interactive prompt on the way (e.g. sudo)
    /// still owns the terminal.
    pub fn prime(&mut self) -> Result<()> {
        if self.framer.pending() == 0 && self.ready.is_empty() {
            self.fill()?;
        }
        Ok(())
    }

    pub fn failures(&self) -> &FailureTracker {
        &self.failures
    }

    /// Read one chunk into the framer. Returns false at end of stream.
    fn fill(&mut self) -> Result<bool> {
        let n = loop {
            match self.reader.read(&mut self.chunk) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };
        if n == 0 {
            if self.framer.pending() > 0 {
                debug!("discarding {} bytes of an unterminated record", self.framer.pending());
            }
            return Ok(false);
        }
        self.ready.extend(self.framer.feed(&self.chunk[..n]));
        Ok(true)
    }
}

impl<R: Read + Send, D: RecordDecoder> SnapshotStream for StreamIngest<R, D> {
    fn next_snapshot(&mut self) -> Result<Option<Snapshot>> {
        loop {
            while let Some(frame) = self.ready.pop_front() {
                match frame.and_then(|record| self.decoder.decode(&record)) {
                    Ok(snapshot) => {
                        self.failures.record_success();
                        return Ok(Some(snapshot));
                    }
                    Err(e) => self.failures.record_failure(e)?,
                }
            }
            if !self.fill()? {
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Group;
    use std::io::Cursor;

    // -- helpers ------------------------------------------------------------

    /// Decodes `value=<f64>` records into a single `cpu/x` reading.
    struct KeyValueDecoder;

    impl RecordDecoder for KeyValueDecoder {
        fn decode(&mut self, record: &[u8]) -> Result<Snapshot> {
            let text = std::str::from_utf8(record)
                .map_err(|e| CubestatError::Decode(e.to_string()))?;
            let value = text
                .trim()
                .strip_prefix("value=")
                .and_then(|v| v.parse::<f64>().ok())
                .ok_or_else(|| CubestatError::Decode(format!("bad record {text:?}")))?;
            let mut s = Snapshot::new();
            s.push(Group::Cpu, "x", value);
            Ok(s)
        }
    }

    /// Reader that returns at most `step` bytes per call.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct Script {
        results: VecDeque<Result<Snapshot>>,
    }

    impl PollSource for Script {
        fn name(&self) -> &'static str {
            "script"
        }

        fn collect(&mut self) -> Result<Snapshot> {
            self.results
                .pop_front()
                .unwrap_or_else(|| Err(CubestatError::Decode("exhausted".into())))
        }
    }

    #[derive(Default)]
    struct Collect(Vec<Snapshot>);

    impl SnapshotSink for Collect {
        fn publish(&mut self, snapshot: Snapshot) -> Result<()> {
            self.0.push(snapshot);
            Ok(())
        }
    }

    fn values(snaps: &[Snapshot]) -> Vec<f64> {
        snaps.iter().filter_map(|s| s.get(Group::Cpu, "x")).collect()
    }

    fn one(value: f64) -> Result<Snapshot> {
        let mut s = Snapshot::new();
        s.push(Group::Cpu, "x", value);
        Ok(s)
    }

    fn bad() -> Result<Snapshot> {
        Err(CubestatError::Decode("garbled".into()))
    }

    // -- schedule -----------------------------------------------------------

    #[test]
    fn schedule_sleeps_remaining_time() {
        let start = Instant::now();
        let mut s = TickSchedule::new(start, Duration::from_millis(100));
        let delay = s.next_delay(start + Duration::from_millis(30));
        assert_eq!(delay, Duration::from_millis(70));
    }

    #[test]
    fn schedule_does_not_drift() {
        let start = Instant::now();
        let mut s = TickSchedule::new(start, Duration::from_millis(100));
        // Tick 1 ran late; tick 2 is still due at start + 200ms.
        assert_eq!(s.next_delay(start + Duration::from_millis(150)), Duration::ZERO);
        assert_eq!(
            s.next_delay(start + Duration::from_millis(160)),
            Duration::from_millis(40)
        );
    }

    // -- failures -----------------------------------------------------------

    #[test]
    fn tracker_resets_on_success() {
        let mut t = FailureTracker::new(3);
        t.record_failure(CubestatError::Decode("a".into())).unwrap();
        t.record_failure(CubestatError::Decode("b".into())).unwrap();
        t.record_success();
        t.record_failure(CubestatError::Decode("c".into())).unwrap();
        assert_eq!(t.consecutive(), 1);
        assert_eq!(t.total(), 3);
    }

    #[test]
    fn tracker_fails_at_threshold() {
        let mut t = FailureTracker::new(2);
        t.record_failure(CubestatError::Decode("a".into())).unwrap();
        let err = t.record_failure(CubestatError::Decode("b".into())).unwrap_err();
        assert!(matches!(err, CubestatError::TooManyFailures { count: 2, .. }));
    }

    #[test]
    fn tracker_passes_through_non_transient_errors() {
        let mut t = FailureTracker::new(5);
        let err = t
            .record_failure(CubestatError::UnsupportedPlatform("x".into()))
            .unwrap_err();
        assert!(matches!(err, CubestatError::UnsupportedPlatform(_)));
        assert_eq!(t.total(), 0);
    }

    // -- pull ---------------------------------------------------------------

    #[test]
    fn poll_skips_transient_failures() {
        let script = Script {
            results: VecDeque::from(vec![one(1.0), bad(), one(2.0)]),
        };
        let mut ingest = PollIngest::new(script, Duration::from_millis(1), 3);
        assert_eq!(values(&[ingest.next_snapshot().unwrap().unwrap()]), vec![1.0]);
        assert_eq!(values(&[ingest.next_snapshot().unwrap().unwrap()]), vec![2.0]);
        assert_eq!(ingest.failures().total(), 1);
    }

    #[test]
    fn poll_gives_up_after_consecutive_failures() {
        let script = Script {
            results: VecDeque::from(vec![one(1.0), bad(), bad(), bad()]),
        };
        let mut ingest = PollIngest::new(script, Duration::from_millis(1), 3);
        let mut sink = Collect::default();
        let err = run(&mut ingest, &mut sink).unwrap_err();
        assert!(matches!(err, CubestatError::TooManyFailures { count: 3, .. }));
        assert_eq!(values(&sink.0), vec![1.0]);
    }

    // -- push ---------------------------------------------------------------

    fn stream_bytes(records: &[&str]) -> Vec<u8> {
        records
            .iter()
            .flat_map(|r| format!("{r}\n--\n").into_bytes())
            .collect()
    }

    #[test]
    fn stream_decodes_records_regardless_of_chunking() {
        let data = stream_bytes(&["value=1", "value=2", "value=3"]);
        for step in [1, 2, 5, 7, 1000] {
            let reader = Trickle {
                data: data.clone(),
                pos: 0,
                step,
            };
            let mut ingest =
                StreamIngest::new(reader, KeyValueDecoder, StreamFramer::new(&b"--\n"[..]), 3);
            let mut sink = Collect::default();
            assert_eq!(run(&mut ingest, &mut sink).unwrap(), 3);
            assert_eq!(values(&sink.0), vec![1.0, 2.0, 3.0], "step {step}");
        }
    }

    #[test]
    fn stream_drops_malformed_record_and_continues() {
        let data = stream_bytes(&["value=1", "garbage", "value=3"]);
        let mut ingest = StreamIngest::new(
            Cursor::new(data),
            KeyValueDecoder,
            StreamFramer::new(&b"--\n"[..]),
            3,
        );
        let mut sink = Collect::default();
        run(&mut ingest, &mut sink).unwrap();
        assert_eq!(values(&sink.0), vec![1.0, 3.0]);
        assert_eq!(ingest.failures().total(), 1);
    }

    #[test]
    fn stream_fails_after_threshold() {
        let data = stream_bytes(&["nope", "nope", "value=1"]);
        let mut ingest = StreamIngest::new(
            Cursor::new(data),
            KeyValueDecoder,
            StreamFramer::new(&b"--\n"[..]),
            2,
        );
        let mut sink = Collect::default();
        assert!(matches!(
            run(&mut ingest, &mut sink),
            Err(CubestatError::TooManyFailures { .. })
        ));
        assert!(sink.0.is_empty());
    }

    #[test]
    fn stream_end_is_not_an_error() {
        let mut data = stream_bytes(&["value=1"]);
        data.extend_from_slice(b"value=2 without terminator");
        let mut ingest = StreamIngest::new(
            Cursor::new(data),
            KeyValueDecoder,
            StreamFramer::new(&b"--\n"[..]),
            3,
        );
        assert!(ingest.next_snapshot().unwrap().is_some());
        assert!(ingest.next_snapshot().unwrap().is_none());
    }

    #[test]
    fn prime_reads_ahead_without_losing_records() {
        let data = stream_bytes(&["value=7"]);
        let reader = Trickle {
            data,
            pos: 0,
            step: 3,
        };
        let mut ingest =
            StreamIngest::new(reader, KeyValueDecoder, StreamFramer::new(&b"--\n"[..]), 3);
        ingest.prime().unwrap();
        assert_eq!(values(&[ingest.next_snapshot().unwrap().unwrap()]), vec![7.0]);
    }

    #[test]
    fn output_without_terminator_hits_the_failure_threshold() {
        let reader = Trickle {
            data: vec![b'x'; 64 * 1024],
            pos: 0,
            step: 4096,
        };
        let framer = StreamFramer::new(&b"--\n"[..]).max_record(1024);
        let mut ingest = StreamIngest::new(reader, KeyValueDecoder, framer, 3);
        let mut sink = Collect::default();
        let err = run(&mut ingest, &mut sink).unwrap_err();
        assert!(matches!(err, CubestatError::TooManyFailures { count: 3, .. }));
        assert!(sink.0.is_empty());
        assert!(ingest.framer.pending() <= 1024);
    }
}
