//! K-way merge of several position-sorted read sources into the single
//! sorted stream the driver requires. A collaborator, not part of the
//! engine's correctness boundary: the driver still checks ordering on
//! admission.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::read::{Locus, Read};

struct HeapEntry {
    locus: Locus,
    source: usize,
    rank: u64,
    read: Read,
}

impl HeapEntry {
    fn key(&self) -> (Locus, usize, u64) {
        (self.locus, self.source, self.rank)
    }
}

// Min-heap discipline: reverse the natural (locus, source, rank) order. Ties
// on locus resolve by source index, so interleaving is deterministic.
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for HeapEntry {}

/// Lazily merges k sorted read iterators by (contig, start).
pub struct MergedReadStream<I: Iterator<Item = Read>> {
    sources: Vec<I>,
    heap: BinaryHeap<HeapEntry>,
    next_rank: u64,
}

impl<I: Iterator<Item = Read>> MergedReadStream<I> {
    pub fn new(sources: impl IntoIterator<Item = I>) -> Self {
        let mut merged = MergedReadStream {
            sources: sources.into_iter().collect(),
            heap: BinaryHeap::new(),
            next_rank: 0,
        };
        for i in 0..merged.sources.len() {
            merged.refill(i);
        }
        merged
    }

    fn refill(&mut self, source: usize) {
        if let Some(read) = self.sources[source].next() {
            let rank = self.next_rank;
            self.next_rank += 1;
            self.heap.push(HeapEntry {
                locus: read.start_locus(),
                source,
                rank,
                read,
            });
        }
    }
}

impl<I: Iterator<Item = Read>> Iterator for MergedReadStream<I> {
    type Item = Read;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.heap.pop()?;
        self.refill(entry.source);
        Some(entry.read)
    }
}
