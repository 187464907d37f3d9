//! Per-locus pileups: one element per contributing read, grouped by sample.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::cursor::SiteInfo;
use crate::read::{Locus, Read};

/// One read's observation at one locus: the shared read plus the cursor's
/// site report. Adjacency flags and indel metadata come from the site.
#[derive(Debug, Clone)]
pub struct PileupElement {
    pub read: Arc<Read>,
    pub site: SiteInfo,
}

impl PileupElement {
    pub fn new(read: Arc<Read>, site: SiteInfo) -> Self {
        PileupElement { read, site }
    }

    /// The observed base, if an aligned read base sits on this locus.
    /// Deletion loci and folded insertion-only reads observe no base.
    pub fn base(&self) -> Option<u8> {
        if self.site.is_deletion || self.site.insertion_only {
            None
        } else {
            self.read.bases.get(self.site.read_offset).copied()
        }
    }

    pub fn qual(&self) -> Option<u8> {
        if self.site.is_deletion || self.site.insertion_only {
            None
        } else {
            self.read.quals.get(self.site.read_offset).copied()
        }
    }

    pub fn is_deletion(&self) -> bool {
        self.site.is_deletion
    }

    /// Length of the indel run immediately following this locus, 0 if none.
    pub fn length_of_following_indel(&self) -> u32 {
        self.site.following_indel_len
    }

    /// Bases of the insertion immediately following this locus.
    pub fn bases_of_following_insertion(&self) -> Option<&[u8]> {
        self.site
            .following_insertion
            .map(|(off, len)| &self.read.bases[off..off + len])
    }

    /// Bases of the insertion immediately preceding this locus (set for
    /// after-insertion sites, including folded insertion-only reads).
    pub fn bases_of_preceding_insertion(&self) -> Option<&[u8]> {
        self.site
            .preceding_insertion
            .map(|(off, len)| &self.read.bases[off..off + len])
    }
}

/// One emitted unit: a locus and its per-sample pileups. Every element's read
/// span covers the locus; sample order is deterministic (declaration order,
/// then first-seen).
#[derive(Debug, Clone)]
pub struct AlignmentContext {
    pub locus: Locus,
    samples: IndexMap<String, Vec<PileupElement>>,
}

impl AlignmentContext {
    pub fn new(locus: Locus) -> Self {
        AlignmentContext {
            locus,
            samples: IndexMap::new(),
        }
    }

    /// Total number of elements across all samples.
    pub fn depth(&self) -> usize {
        self.samples.values().map(|v| v.len()).sum()
    }

    pub fn deletion_count(&self) -> usize {
        self.elements().filter(|e| e.is_deletion()).count()
    }

    pub fn sample(&self, sample: &str) -> Option<&[PileupElement]> {
        self.samples.get(sample).map(|v| v.as_slice())
    }

    pub fn samples(&self) -> impl Iterator<Item = (&str, &[PileupElement])> {
        self.samples.iter().map(|(s, v)| (s.as_str(), v.as_slice()))
    }

    pub fn elements(&self) -> impl Iterator<Item = &PileupElement> {
        self.samples.values().flatten()
    }

    pub(crate) fn samples_mut(&mut self) -> &mut IndexMap<String, Vec<PileupElement>> {
        &mut self.samples
    }
}

/// Assembles one context per locus from cursor reports, grouping by sample.
#[derive(Debug)]
pub struct PileupBuilder {
    context: AlignmentContext,
}

impl PileupBuilder {
    pub fn new(locus: Locus) -> Self {
        PileupBuilder {
            context: AlignmentContext::new(locus),
        }
    }

    /// Pre-register a sample so it appears (possibly empty) in declared order.
    pub fn declare_sample(&mut self, sample: &str) {
        self.context
            .samples
            .entry(sample.to_string())
            .or_default();
    }

    pub fn push(&mut self, sample: &str, element: PileupElement) {
        self.context
            .samples
            .entry(sample.to_string())
            .or_default()
            .push(element);
    }

    /// Finish the context. Unless `keep_empty_samples` is set, samples with
    /// no contributing reads are omitted.
    pub fn finish(mut self, keep_empty_samples: bool) -> AlignmentContext {
        if !keep_empty_samples {
            self.context.samples.retain(|_, v| !v.is_empty());
        }
        self.context
    }
}
