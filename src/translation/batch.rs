use std::ops::Range;

use crate::errors::ConfigError;
use crate::subtitle::SubtitleEntry;

// @module: Splitting a cue sequence into bounded, ordered batches

/// Splits a cue sequence into ordered position ranges of at most
/// `max_batch_size` cues each.
///
/// Pure and stateless: batches are index ranges into the caller's cue
/// sequence, never copies, and a fresh call to [`Batcher::split`] always
/// restarts from the first cue. Batches never split or reorder cues.
#[derive(Debug, Clone, Copy)]
pub struct Batcher {
    max_batch_size: usize,
}

impl Batcher {
    /// Create a batcher; the size must be at least one cue
    pub fn new(max_batch_size: usize) -> Result<Self, ConfigError> {
        if max_batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(max_batch_size));
        }
        Ok(Batcher { max_batch_size })
    }

    /// The configured maximum cues per batch
    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Lazily walk the cue sequence in index order, yielding one range per
    /// batch. Concatenating the yielded ranges reproduces `0..entries.len()`
    /// exactly; no batch is empty.
    pub fn split(&self, entries: &[SubtitleEntry]) -> BatchIter {
        BatchIter {
            next_start: 0,
            total: entries.len(),
            max_batch_size: self.max_batch_size,
        }
    }

    /// Number of batches `split` will yield for a sequence of this length
    pub fn batch_count(&self, total_cues: usize) -> usize {
        total_cues.div_ceil(self.max_batch_size)
    }
}

/// Iterator over batch position ranges
#[derive(Debug)]
pub struct BatchIter {
    next_start: usize,
    total: usize,
    max_batch_size: usize,
}

impl Iterator for BatchIter {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Range<usize>> {
        if self.next_start >= self.total {
            return None;
        }
        let end = (self.next_start + self.max_batch_size).min(self.total);
        let batch = self.next_start..end;
        self.next_start = end;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total - self.next_start).div_ceil(self.max_batch_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BatchIter {}
