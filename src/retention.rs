//! Buffer of fully-consumed reads, exposed to the caller on demand.
//!
//! Every read the traversal admits is handed to this buffer exactly once, at
//! the moment the active set retires it. The caller can `drain` (take and
//! clear) or `peek` between advances. When retention is disabled, retirement
//! discards instead and the buffer stays empty.

use std::sync::Arc;

use crate::read::Read;

#[derive(Debug)]
pub struct ReadRetentionBuffer {
    enabled: bool,
    reads: Vec<Arc<Read>>,
}

impl ReadRetentionBuffer {
    pub fn new(enabled: bool) -> Self {
        ReadRetentionBuffer {
            enabled,
            reads: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Accept a batch of retired reads, already in retirement order.
    pub fn push_retired(&mut self, batch: Vec<Arc<Read>>) {
        if self.enabled {
            self.reads.extend(batch);
        }
    }

    /// Return and clear everything retired since the last drain.
    pub fn drain(&mut self) -> Vec<Arc<Read>> {
        std::mem::take(&mut self.reads)
    }

    /// Current contents, without clearing.
    pub fn peek(&self) -> &[Arc<Read>] {
        &self.reads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::Cigar;

    fn make_read(name: &str) -> Arc<Read> {
        let cigar: Cigar = "4M".parse().unwrap();
        Arc::new(Read {
            name: name.to_string(),
            sample: "s".to_string(),
            contig: 0,
            start: 1,
            cigar,
            bases: vec![b'A'; 4],
            quals: vec![30; 4],
        })
    }

    #[test]
    fn test_drain_clears_peek_does_not() {
        let mut buf = ReadRetentionBuffer::new(true);
        buf.push_retired(vec![make_read("a"), make_read("b")]);
        assert_eq!(buf.peek().len(), 2);
        assert_eq!(buf.peek().len(), 2);

        let drained = buf.drain();
        assert_eq!(drained.len(), 2);
        assert!(buf.peek().is_empty());
        assert!(buf.drain().is_empty());

        buf.push_retired(vec![make_read("c")]);
        assert_eq!(buf.drain().len(), 1);
    }

    #[test]
    fn test_disabled_buffer_discards() {
        let mut buf = ReadRetentionBuffer::new(false);
        buf.push_retired(vec![make_read("a")]);
        assert!(buf.peek().is_empty());
        assert!(buf.drain().is_empty());
    }
}
