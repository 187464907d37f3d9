// Library exports for locuspile
pub mod active_set;
pub mod cursor;
pub mod downsample;
pub mod driver;
pub mod error;
pub mod merge;
pub mod pileup;
pub mod read;
pub mod retention;
pub mod walker;
pub mod windows;

pub use crate::cursor::{ReadCursor, SiteInfo};
pub use crate::downsample::DownsamplingMethod;
pub use crate::driver::{LocusTraversal, TraversalConfig, TraversalStats, UnknownSamplePolicy};
pub use crate::error::PileupError;
pub use crate::merge::MergedReadStream;
pub use crate::pileup::{AlignmentContext, PileupElement};
pub use crate::read::{Cigar, CigarElement, CigarOp, Locus, Read};
pub use crate::walker::{LocusWalker, Traversal, WindowWalker};
pub use crate::windows::{Interval, LocusWindow};
