//! Bounded per-category accounting for sync runs.
//!
//! Certificates processed during a run are recorded by category (updated,
//! partially processed, unmatched, ...). Entries are written to the trace log
//! in batches so memory stays bounded on large inventories.

use tracing::{debug, trace};

/// Number of pending entries that triggers a flush.
pub const FLUSH_THRESHOLD: usize = 1000;

#[derive(Debug)]
pub struct FlushBuffer {
    category: &'static str,
    pending: Vec<String>,
    flushed: usize,
    threshold: usize,
}

impl FlushBuffer {
    #[must_use]
    pub fn new(category: &'static str) -> Self {
        Self::with_threshold(category, FLUSH_THRESHOLD)
    }

    #[must_use]
    pub fn with_threshold(category: &'static str, threshold: usize) -> Self {
        Self {
            category,
            pending: Vec::new(),
            flushed: 0,
            threshold: threshold.max(1),
        }
    }

    /// Record one entry, flushing when the buffer is full.
    pub fn push(&mut self, entry: impl Into<String>) {
        self.pending.push(entry.into());
        if self.pending.len() >= self.threshold {
            self.flush();
        }
    }

    /// Write every pending entry to the log and clear the buffer.
    pub fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let batch = self.pending.len();
        for entry in self.pending.drain(..) {
            trace!(category = self.category, entry = %entry);
        }
        self.flushed += batch;
        debug!(category = self.category, batch, total = self.flushed, "Flushed sync log entries");
    }

    /// Entries recorded so far, flushed or not.
    #[must_use]
    pub fn total(&self) -> usize {
        self.flushed + self.pending.len()
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn category(&self) -> &'static str {
        self.category
    }
}
