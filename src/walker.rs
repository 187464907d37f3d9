//! Walker callbacks over a traversal: the embedding declares what it wants
//! per locus (or per interval window), and `run` drives the engine for it.
//! Dispatch is a closed tagged variant, not runtime type inspection.

use rand::Rng;

use crate::driver::{LocusTraversal, TraversalStats};
use crate::error::PileupError;
use crate::pileup::AlignmentContext;
use crate::read::Read;
use crate::windows::{Interval, LocusWindow, WindowBatcher};

/// Per-locus callback.
pub trait LocusWalker {
    fn map(&mut self, context: &AlignmentContext);

    /// Called once after the last locus, with the traversal's counters.
    fn on_done(&mut self, _stats: &TraversalStats) {}
}

/// Per-interval-window callback.
pub trait WindowWalker {
    fn map(&mut self, window: &LocusWindow);

    fn on_done(&mut self, _stats: &TraversalStats) {}
}

/// Which callback shape drives the traversal.
pub enum Traversal<'a> {
    ByLocus(&'a mut dyn LocusWalker),
    ByWindows {
        intervals: Vec<Interval>,
        walker: &'a mut dyn WindowWalker,
    },
}

/// Drive `traversal` to completion through the chosen walker. The first
/// engine error aborts the run and is returned; the walker sees nothing for
/// the failed advance.
pub fn run<I, R>(
    mut traversal: LocusTraversal<I, R>,
    dispatch: Traversal<'_>,
) -> Result<TraversalStats, PileupError>
where
    I: Iterator<Item = Read>,
    R: Rng,
{
    match dispatch {
        Traversal::ByLocus(walker) => {
            for context in &mut traversal {
                walker.map(&context?);
            }
            let stats = *traversal.stats();
            walker.on_done(&stats);
            Ok(stats)
        }
        Traversal::ByWindows { intervals, walker } => {
            let mut batcher = WindowBatcher::new(intervals)?;
            for context in &mut traversal {
                for window in batcher.push(context?) {
                    walker.map(&window);
                }
            }
            for window in batcher.finish() {
                walker.map(&window);
            }
            let stats = *traversal.stats();
            walker.on_done(&stats);
            Ok(stats)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::TraversalConfig;
    use crate::read::Cigar;

    fn make_read(name: &str, start: u64, cigar: &str) -> Read {
        let cigar: Cigar = cigar.parse().unwrap();
        let n = cigar.read_len();
        Read {
            name: name.to_string(),
            sample: "s".to_string(),
            contig: 0,
            start,
            cigar,
            bases: vec![b'A'; n],
            quals: vec![30; n],
        }
    }

    #[derive(Default)]
    struct DepthSum {
        loci: usize,
        depth: usize,
        done: bool,
    }

    impl LocusWalker for DepthSum {
        fn map(&mut self, context: &AlignmentContext) {
            self.loci += 1;
            self.depth += context.depth();
        }

        fn on_done(&mut self, stats: &TraversalStats) {
            assert_eq!(stats.contexts_emitted as usize, self.loci);
            self.done = true;
        }
    }

    #[test]
    fn test_by_locus_walker() {
        let reads = vec![make_read("a", 1, "4M"), make_read("b", 3, "4M")];
        let traversal =
            LocusTraversal::with_seed(reads.into_iter(), TraversalConfig::default(), 0).unwrap();
        let mut walker = DepthSum::default();
        let stats = run(traversal, Traversal::ByLocus(&mut walker)).unwrap();
        assert_eq!(walker.loci, 6);
        assert_eq!(walker.depth, 8);
        assert!(walker.done);
        assert_eq!(stats.reads_retired, 2);
    }

    #[derive(Default)]
    struct WindowCount {
        windows: Vec<(u64, u64, usize)>,
    }

    impl WindowWalker for WindowCount {
        fn map(&mut self, window: &LocusWindow) {
            self.windows.push((
                window.interval.start,
                window.interval.end,
                window.contexts.len(),
            ));
        }
    }

    #[test]
    fn test_by_windows_walker() {
        let reads = vec![make_read("a", 1, "10M")];
        let traversal =
            LocusTraversal::with_seed(reads.into_iter(), TraversalConfig::default(), 0).unwrap();
        let mut walker = WindowCount::default();
        run(
            traversal,
            Traversal::ByWindows {
                intervals: vec![Interval::new(0, 2, 4), Interval::new(0, 8, 20)],
                walker: &mut walker,
            },
        )
        .unwrap();
        assert_eq!(walker.windows, vec![(2, 4, 3), (8, 20, 3)]);
    }

    #[test]
    fn test_walker_run_propagates_errors() {
        let reads = vec![make_read("a", 10, "4M"), make_read("b", 2, "4M")];
        let traversal =
            LocusTraversal::with_seed(reads.into_iter(), TraversalConfig::default(), 0).unwrap();
        let mut walker = DepthSum::default();
        let err = run(traversal, Traversal::ByLocus(&mut walker)).unwrap_err();
        assert!(matches!(err, PileupError::OutOfOrderInput { .. }));
    }
}
