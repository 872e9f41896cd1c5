//! Record framing for push-mode sources.
//!
//! A push source writes records back to back, each ending with a sentinel
//! (`</plist>\n` for powermetrics). Read boundaries are unrelated to record
//! boundaries, so bytes are accumulated until a sentinel shows up. Records
//! may also be separated by NUL padding: the candidate record is split on NUL,
//! the last non-empty fragment is the record, and earlier non-empty fragments
//! are truncated leftovers that get dropped. Bytes after the last sentinel are
//! kept as the beginning of the next record.
//!
//! A record that grows past [`MAX_RECORD_BYTES`] without a sentinel is
//! discarded and reported as a decode error, so a source that never writes
//! the sentinel runs into the failure threshold instead of growing the buffer.

use log::{debug, warn};

use crate::error::{CubestatError, Result};

/// Terminator of one powermetrics plist document.
pub const PLIST_SENTINEL: &[u8] = b"</plist>\n";

/// Largest unterminated record kept before it is discarded.
pub const MAX_RECORD_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug)]
pub struct StreamFramer {
    sentinel: Vec<u8>,
    keep_sentinel: bool,
    max_record: usize,
    buf: Vec<u8>,
    dropped: usize,
}

impl StreamFramer {
    pub fn new(sentinel: impl Into<Vec<u8>>) -> Self {
        Self {
            sentinel: sentinel.into(),
            keep_sentinel: false,
            max_record: MAX_RECORD_BYTES,
            buf: Vec::new(),
            dropped: 0,
        }
    }

    /// Keep the sentinel at the end of emitted records (needed when the
    /// sentinel is part of the document, as with plist).
    pub fn keep_sentinel(mut self, keep: bool) -> Self {
        self.keep_sentinel = keep;
        self
    }

    pub fn max_record(mut self, bytes: usize) -> Self {
        self.max_record = bytes.max(1);
        self
    }

    /// Append one chunk and return every record it completed, in order. An
    /// unterminated record past the size limit comes back as an error.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<Vec<u8>>> {
        // The buffer held no sentinel before this chunk; only its tail can
        // start one.
        let mut from = self
            .buf
            .len()
            .saturating_sub(self.sentinel.len().saturating_sub(1));
        self.buf.extend_from_slice(chunk);
        let mut records = Vec::new();
        while let Some(pos) = find(&self.buf[from..], &self.sentinel) {
            let end = from + pos + self.sentinel.len();
            let candidate: Vec<u8> = self.buf.drain(..end).collect();
            if let Some(record) = self.extract(&candidate) {
                records.push(Ok(record));
            }
            from = 0;
        }
        if self.buf.len() > self.max_record {
            let len = self.buf.len();
            self.buf.clear();
            warn!("discarding {len} bytes without a record terminator");
            records.push(Err(CubestatError::Decode(format!(
                "no record terminator within {len} bytes"
            ))));
        }
        records
    }

    /// Bytes waiting for their sentinel.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Truncated fragments discarded so far.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    fn extract(&mut self, candidate: &[u8]) -> Option<Vec<u8>> {
        let body = if self.keep_sentinel {
            candidate
        } else {
            &candidate[..candidate.len() - self.sentinel.len()]
        };

        let fragments: Vec<&[u8]> = body
            .split(|b| *b == 0)
            .filter(|f| !is_blank(f))
            .collect();
        let (record, leftovers) = fragments.split_last()?;
        for fragment in leftovers {
            self.dropped += 1;
            debug!("dropping truncated fragment of {} bytes", fragment.len());
        }
        Some(record.to_vec())
    }
}

fn is_blank(fragment: &[u8]) -> bool {
    fragment.iter().all(|b| b.is_ascii_whitespace())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
