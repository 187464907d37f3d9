use thiserror::Error;

use crate::read::Locus;

/// Errors raised by the pileup engine. All of these are terminal: once the
/// traversal yields one of them, no further contexts are produced.
#[derive(Error, Debug)]
pub enum PileupError {
    /// An alignment step that cannot be placed: unknown operation, zero-length
    /// element, or a cigar that disagrees with the read's sequence length.
    #[error("malformed alignment for '{read}': {detail}")]
    MalformedAlignment { read: String, detail: String },

    /// The input stream violated the sorted-by-start invariant.
    #[error("out-of-order input: read '{read}' starts at {at} but a read was already admitted at {prev}")]
    OutOfOrderInput { read: String, prev: Locus, at: Locus },

    /// Invalid configuration, detected at construction time.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A read carries a sample identifier outside the declared sample set and
    /// the unknown-sample policy is `Reject`.
    #[error("read '{read}' has unrecognized sample '{sample}'")]
    UnknownSample { read: String, sample: String },
}

pub type Result<T> = std::result::Result<T, PileupError>;
