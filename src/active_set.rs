//! The working set of reads whose spans cover the position under examination.

use std::sync::Arc;

use crate::cursor::ReadCursor;
use crate::error::PileupError;
use crate::read::{Locus, Read};

/// One active read: the shared record plus its cursor.
#[derive(Debug)]
pub struct ActiveEntry {
    pub read: Arc<Read>,
    pub cursor: ReadCursor,
}

impl ActiveEntry {
    pub fn end_locus(&self) -> Locus {
        self.read.end_locus()
    }
}

/// Reads admitted but not yet retired, in admission order. Admission order is
/// the input's sorted order, which makes pileup element order deterministic;
/// retirement drains by (alignment end, read name), min-first.
#[derive(Debug, Default)]
pub struct ActiveReadSet {
    entries: Vec<ActiveEntry>,
    last_admitted: Option<Locus>,
}

impl ActiveReadSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a read becoming active. Rejects input that is not sorted by
    /// (contig, start): the engine cannot guarantee correctness past that
    /// point and must not silently proceed.
    pub fn admit(&mut self, read: Arc<Read>) -> Result<(), PileupError> {
        let start = read.start_locus();
        if let Some(prev) = self.last_admitted {
            if start < prev {
                return Err(PileupError::OutOfOrderInput {
                    read: read.name.clone(),
                    prev,
                    at: start,
                });
            }
        }
        let cursor = ReadCursor::new(Arc::clone(&read))?;
        self.last_admitted = Some(start);
        self.entries.push(ActiveEntry { read, cursor });
        Ok(())
    }

    /// All currently active reads, in admission order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ActiveEntry> {
        self.entries.iter_mut()
    }

    /// Remove and return every read whose span ends strictly before `next`,
    /// ordered by (alignment end, read name).
    pub fn retire(&mut self, next: Locus) -> Vec<Arc<Read>> {
        let mut retired: Vec<(Locus, Arc<Read>)> = Vec::new();
        self.entries.retain(|entry| {
            let end = entry.end_locus();
            if end < next {
                retired.push((end, Arc::clone(&entry.read)));
                false
            } else {
                true
            }
        });
        retired.sort_by(|a, b| (a.0, &a.1.name).cmp(&(b.0, &b.1.name)));
        retired.into_iter().map(|(_, read)| read).collect()
    }
}
