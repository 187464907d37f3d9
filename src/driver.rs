//! The locus driver: pulls sorted reads, advances one reference position per
//! call, and emits one `AlignmentContext` per covered locus.
//!
//! Single-threaded and pull-based: all work for a position (admission, cursor
//! stepping, building, downsampling, retirement) runs synchronously inside
//! one advance, and suspension happens only between emitted contexts.

use std::iter::Peekable;
use std::sync::Arc;

use indexmap::IndexSet;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::active_set::ActiveReadSet;
use crate::downsample::DownsamplingMethod;
use crate::error::PileupError;
use crate::pileup::{AlignmentContext, PileupBuilder, PileupElement};
use crate::read::{Locus, Read};
use crate::retention::ReadRetentionBuffer;

/// What to do with a read whose sample is outside the declared set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownSamplePolicy {
    /// Fail the traversal, naming the read.
    Reject,
    /// Fold the read into the configured default sample.
    GroupUnderDefault,
}

/// Traversal configuration. Validated once at construction; invalid settings
/// never surface mid-iteration.
#[derive(Debug, Clone)]
pub struct TraversalConfig {
    pub downsampling: DownsamplingMethod,
    /// Buffer consumed reads for `drain_retired`/`peek_retired`.
    pub keep_reads: bool,
    /// Recognized sample identifiers. Empty means "accept every sample as
    /// first seen" for embeddings that do not pre-declare their samples.
    pub samples: Vec<String>,
    pub unknown_sample_policy: UnknownSamplePolicy,
    pub default_sample: String,
    /// Represent declared-but-uncovered samples as empty pileups instead of
    /// omitting them.
    pub emit_empty_samples: bool,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        TraversalConfig {
            downsampling: DownsamplingMethod::None,
            keep_reads: false,
            samples: Vec::new(),
            unknown_sample_policy: UnknownSamplePolicy::Reject,
            default_sample: "unknown".to_string(),
            emit_empty_samples: false,
        }
    }
}

impl TraversalConfig {
    pub fn with_downsampling(mut self, method: DownsamplingMethod) -> Self {
        self.downsampling = method;
        self
    }

    pub fn with_keep_reads(mut self, keep: bool) -> Self {
        self.keep_reads = keep;
        self
    }

    pub fn with_samples<S: Into<String>>(mut self, samples: impl IntoIterator<Item = S>) -> Self {
        self.samples = samples.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_unknown_sample_policy(mut self, policy: UnknownSamplePolicy) -> Self {
        self.unknown_sample_policy = policy;
        self
    }

    pub fn with_emit_empty_samples(mut self, emit: bool) -> Self {
        self.emit_empty_samples = emit;
        self
    }

    fn validate(&self) -> Result<(), PileupError> {
        self.downsampling.validate()?;
        if self.unknown_sample_policy == UnknownSamplePolicy::GroupUnderDefault
            && self.default_sample.is_empty()
        {
            return Err(PileupError::Config(
                "default sample name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Explicit per-traversal counters, returned to the caller rather than kept
/// as process-wide state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    pub reads_admitted: u64,
    pub reads_retired: u64,
    pub contexts_emitted: u64,
    pub elements_emitted: u64,
    pub elements_downsampled: u64,
}

/// Iterator over `Result<AlignmentContext>` driven by a position-sorted read
/// stream. Fused after the first error: a malformed or out-of-order read
/// terminates the whole traversal.
pub struct LocusTraversal<I: Iterator<Item = Read>, R: Rng = StdRng> {
    input: Peekable<I>,
    config: TraversalConfig,
    declared: IndexSet<String>,
    active: ActiveReadSet,
    retention: ReadRetentionBuffer,
    rng: R,
    current: Option<Locus>,
    stats: TraversalStats,
    finished: bool,
}

impl<I: Iterator<Item = Read>> LocusTraversal<I, StdRng> {
    pub fn new(input: I, config: TraversalConfig) -> Result<Self, PileupError> {
        let rng = StdRng::from_entropy();
        Self::with_rng(input, config, rng)
    }

    /// Deterministic traversal: same seed and input produce identical output.
    pub fn with_seed(input: I, config: TraversalConfig, seed: u64) -> Result<Self, PileupError> {
        Self::with_rng(input, config, StdRng::seed_from_u64(seed))
    }
}

impl<I: Iterator<Item = Read>, R: Rng> LocusTraversal<I, R> {
    pub fn with_rng(input: I, config: TraversalConfig, rng: R) -> Result<Self, PileupError> {
        config.validate()?;
        let declared: IndexSet<String> = config.samples.iter().cloned().collect();
        let retention = ReadRetentionBuffer::new(config.keep_reads);
        Ok(LocusTraversal {
            input: input.peekable(),
            config,
            declared,
            active: ActiveReadSet::new(),
            retention,
            rng,
            current: None,
            stats: TraversalStats::default(),
            finished: false,
        })
    }

    pub fn stats(&self) -> &TraversalStats {
        &self.stats
    }

    /// Reads retired since the last drain, in retirement order; clears the
    /// buffer. Empty unless `keep_reads` is configured.
    pub fn drain_retired(&mut self) -> Vec<Arc<Read>> {
        self.retention.drain()
    }

    pub fn peek_retired(&self) -> &[Arc<Read>] {
        self.retention.peek()
    }

    /// The next locus to visit: one past the last while reads remain active,
    /// otherwise the start of the next read (gaps in coverage are skipped).
    fn next_locus(&mut self) -> Option<Locus> {
        if !self.active.is_empty() {
            return self.current.map(Locus::next);
        }
        self.input.peek().map(Read::start_locus)
    }

    fn advance(&mut self) -> Result<Option<AlignmentContext>, PileupError> {
        let locus = match self.next_locus() {
            Some(l) => l,
            None => return Ok(None),
        };

        // Admit every read whose span begins at or before this locus. A read
        // sorting backwards is detected here, before anything past the
        // violation is emitted.
        while let Some(read) = self.input.next_if(|r| r.start_locus() <= locus) {
            debug!("admitting read '{}' at {}", read.name, read.start_locus());
            self.active.admit(Arc::new(read))?;
            self.stats.reads_admitted += 1;
        }

        let mut builder = PileupBuilder::new(locus);
        if self.config.emit_empty_samples {
            for sample in &self.declared {
                builder.declare_sample(sample);
            }
        }
        for entry in self.active.iter_mut() {
            if let Some(site) = entry.cursor.step() {
                let sample = resolve_sample(&self.config, &self.declared, &entry.read)?;
                builder.push(sample, PileupElement::new(Arc::clone(&entry.read), site));
            }
        }
        let mut context = builder.finish(self.config.emit_empty_samples);

        let removed = self
            .config
            .downsampling
            .apply(&mut context, &mut self.rng);
        self.stats.elements_downsampled += removed as u64;
        self.stats.elements_emitted += context.depth() as u64;
        self.stats.contexts_emitted += 1;

        let retired = self.active.retire(locus.next());
        if !retired.is_empty() {
            debug!("retiring {} read(s) after {}", retired.len(), locus);
            self.stats.reads_retired += retired.len() as u64;
            self.retention.push_retired(retired);
        }

        self.current = Some(locus);
        Ok(Some(context))
    }
}

fn resolve_sample<'a>(
    config: &'a TraversalConfig,
    declared: &IndexSet<String>,
    read: &'a Read,
) -> Result<&'a str, PileupError> {
    if declared.is_empty() || declared.contains(&read.sample) {
        return Ok(&read.sample);
    }
    match config.unknown_sample_policy {
        UnknownSamplePolicy::GroupUnderDefault => Ok(&config.default_sample),
        UnknownSamplePolicy::Reject => Err(PileupError::UnknownSample {
            read: read.name.clone(),
            sample: read.sample.clone(),
        }),
    }
}

impl<I: Iterator<Item = Read>, R: Rng> Iterator for LocusTraversal<I, R> {
    type Item = Result<AlignmentContext, PileupError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.advance() {
            Ok(Some(context)) => Some(Ok(context)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
