//! Interval-window batching: groups the driver's per-locus contexts into one
//! window per requested interval for consumers that reduce over regions
//! rather than single loci.

use crate::error::PileupError;
use crate::pileup::AlignmentContext;
use crate::read::Locus;

/// A closed reference interval on one contig, 1-based inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub contig: u32,
    pub start: u64,
    pub end: u64,
}

impl Interval {
    pub fn new(contig: u32, start: u64, end: u64) -> Self {
        Interval { contig, start, end }
    }

    pub fn start_locus(&self) -> Locus {
        Locus::new(self.contig, self.start)
    }

    pub fn end_locus(&self) -> Locus {
        Locus::new(self.contig, self.end)
    }

    pub fn contains(&self, locus: Locus) -> bool {
        locus.contig == self.contig && locus.pos >= self.start && locus.pos <= self.end
    }
}

/// One batched unit: an interval and every emitted context falling inside it.
#[derive(Debug, Clone)]
pub struct LocusWindow {
    pub interval: Interval,
    pub contexts: Vec<AlignmentContext>,
}

/// Single-pass batcher over an increasing context stream. Feed each emitted
/// context with `push`; completed windows come back as soon as the stream
/// moves past their interval. Intervals must be sorted and non-overlapping.
#[derive(Debug)]
pub struct WindowBatcher {
    intervals: Vec<Interval>,
    next: usize,
    pending: Vec<AlignmentContext>,
}

impl WindowBatcher {
    pub fn new(intervals: Vec<Interval>) -> Result<Self, PileupError> {
        for interval in &intervals {
            if interval.start > interval.end {
                return Err(PileupError::Config(format!(
                    "interval {}:{}-{} is inverted",
                    interval.contig, interval.start, interval.end
                )));
            }
        }
        for pair in intervals.windows(2) {
            let ordered = pair[0].end_locus() < pair[1].start_locus();
            if !ordered {
                return Err(PileupError::Config(format!(
                    "intervals {}:{}-{} and {}:{}-{} are unsorted or overlap",
                    pair[0].contig,
                    pair[0].start,
                    pair[0].end,
                    pair[1].contig,
                    pair[1].start,
                    pair[1].end
                )));
            }
        }
        Ok(WindowBatcher {
            intervals,
            next: 0,
            pending: Vec::new(),
        })
    }

    /// Accept the next context. Returns every window completed by the
    /// stream's advance past its interval; contexts outside all intervals
    /// are dropped.
    pub fn push(&mut self, context: AlignmentContext) -> Vec<LocusWindow> {
        let mut completed = Vec::new();
        while self.next < self.intervals.len()
            && self.intervals[self.next].end_locus() < context.locus
        {
            completed.push(self.take_current());
        }
        if self.next < self.intervals.len() && self.intervals[self.next].contains(context.locus) {
            self.pending.push(context);
        }
        completed
    }

    /// Flush every remaining interval (the stream is exhausted).
    pub fn finish(&mut self) -> Vec<LocusWindow> {
        let mut completed = Vec::new();
        while self.next < self.intervals.len() {
            completed.push(self.take_current());
        }
        completed
    }

    fn take_current(&mut self) -> LocusWindow {
        let interval = self.intervals[self.next];
        self.next += 1;
        LocusWindow {
            interval,
            contexts: std::mem::take(&mut self.pending),
        }
    }
}
