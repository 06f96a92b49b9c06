use std::num::NonZeroUsize;

use crate::Record;
use crate::report::Reporter;

/// Collects records in bounded batches and moves each full batch into the
/// result, so the working set stays proportional to the batch size.
///
/// Batch size never changes the result: records come out in the order they
/// were pushed, each exactly once.
pub struct BatchAccumulator<'r> {
    capacity: Option<NonZeroUsize>,
    batch: Vec<Record>,
    records: Vec<Record>,
    reporter: &'r dyn Reporter,
}

impl<'r> BatchAccumulator<'r> {
    /// `capacity` of `None` keeps a single unbounded batch.
    pub fn new(capacity: Option<NonZeroUsize>, reporter: &'r dyn Reporter) -> Self {
        BatchAccumulator {
            capacity,
            batch: Vec::with_capacity(capacity.map_or(0, NonZeroUsize::get)),
            records: Vec::new(),
            reporter,
        }
    }

    pub fn push(&mut self, record: Record) {
        self.batch.push(record);
        if self
            .capacity
            .is_some_and(|capacity| self.batch.len() >= capacity.get())
        {
            self.flush();
        }
    }

    /// Records accepted so far, flushed or not.
    pub fn len(&self) -> usize {
        self.records.len() + self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flush the partial batch and hand over the full result.
    pub fn finish(mut self) -> Vec<Record> {
        self.flush();
        self.records
    }

    fn flush(&mut self) {
        if self.batch.is_empty() {
            return;
        }
        let flushed = self.batch.len();
        // Moves the records; the batch keeps its allocation for the next round
        self.records.append(&mut self.batch);
        self.reporter.batch_flushed(flushed, self.records.len());
    }
}
