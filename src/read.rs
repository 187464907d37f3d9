//! Aligned read records and their cigar (alignment step) encoding.

use std::fmt;
use std::str::FromStr;

use crate::error::PileupError;

/// A single reference position: contig index plus 1-based coordinate.
/// Ordering is (contig, pos), matching the sort order of the input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Locus {
    pub contig: u32,
    pub pos: u64,
}

impl Locus {
    pub fn new(contig: u32, pos: u64) -> Self {
        Locus { contig, pos }
    }

    /// The next position on the same contig.
    pub fn next(self) -> Self {
        Locus {
            contig: self.contig,
            pos: self.pos + 1,
        }
    }
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.contig, self.pos)
    }
}

/// One kind of alignment step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CigarOp {
    /// M: match or mismatch, consumes reference and read.
    Match,
    /// =: sequence match, consumes reference and read.
    SeqMatch,
    /// X: sequence mismatch, consumes reference and read.
    SeqMismatch,
    /// I: consumes read only.
    Insertion,
    /// D: consumes reference only.
    Deletion,
    /// N: reference skip, consumes reference only.
    Skip,
    /// S: clipped read bases, consumes read only.
    SoftClip,
    /// H: clipped bases absent from the record, consumes neither.
    HardClip,
    /// P: silent padding, consumes neither.
    Padding,
}

impl CigarOp {
    pub fn consumes_reference(self) -> bool {
        matches!(
            self,
            CigarOp::Match
                | CigarOp::SeqMatch
                | CigarOp::SeqMismatch
                | CigarOp::Deletion
                | CigarOp::Skip
        )
    }

    pub fn consumes_read(self) -> bool {
        matches!(
            self,
            CigarOp::Match
                | CigarOp::SeqMatch
                | CigarOp::SeqMismatch
                | CigarOp::Insertion
                | CigarOp::SoftClip
        )
    }

    /// Match-family steps: an aligned read base sits on a reference base.
    pub fn is_aligned(self) -> bool {
        matches!(self, CigarOp::Match | CigarOp::SeqMatch | CigarOp::SeqMismatch)
    }

    /// H and P are invisible when checking which steps neighbor a position.
    pub fn is_padding_like(self) -> bool {
        matches!(self, CigarOp::HardClip | CigarOp::Padding)
    }

    pub fn to_char(self) -> char {
        match self {
            CigarOp::Match => 'M',
            CigarOp::SeqMatch => '=',
            CigarOp::SeqMismatch => 'X',
            CigarOp::Insertion => 'I',
            CigarOp::Deletion => 'D',
            CigarOp::Skip => 'N',
            CigarOp::SoftClip => 'S',
            CigarOp::HardClip => 'H',
            CigarOp::Padding => 'P',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'M' => Some(CigarOp::Match),
            '=' => Some(CigarOp::SeqMatch),
            'X' => Some(CigarOp::SeqMismatch),
            'I' => Some(CigarOp::Insertion),
            'D' => Some(CigarOp::Deletion),
            'N' => Some(CigarOp::Skip),
            'S' => Some(CigarOp::SoftClip),
            'H' => Some(CigarOp::HardClip),
            'P' => Some(CigarOp::Padding),
            _ => None,
        }
    }
}

/// One alignment step: operation plus run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CigarElement {
    pub op: CigarOp,
    pub len: u32,
}

impl CigarElement {
    pub fn new(op: CigarOp, len: u32) -> Self {
        CigarElement { op, len }
    }
}

/// An ordered list of alignment steps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cigar(Vec<CigarElement>);

impl Cigar {
    pub fn new(elements: Vec<CigarElement>) -> Self {
        Cigar(elements)
    }

    pub fn elements(&self) -> &[CigarElement] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of reference positions this cigar spans.
    pub fn reference_span(&self) -> u64 {
        self.0
            .iter()
            .filter(|e| e.op.consumes_reference())
            .map(|e| e.len as u64)
            .sum()
    }

    /// Number of read bases this cigar consumes.
    pub fn read_len(&self) -> usize {
        self.0
            .iter()
            .filter(|e| e.op.consumes_read())
            .map(|e| e.len as usize)
            .sum()
    }
}

impl FromStr for Cigar {
    type Err = PileupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |detail: String| PileupError::MalformedAlignment {
            read: s.to_string(),
            detail,
        };

        if s.is_empty() {
            return Err(malformed("empty cigar".to_string()));
        }

        let mut elements = Vec::new();
        let mut num_str = String::new();
        for ch in s.chars() {
            if ch.is_ascii_digit() {
                num_str.push(ch);
                continue;
            }
            let op = CigarOp::from_char(ch)
                .ok_or_else(|| malformed(format!("unknown cigar operation '{ch}'")))?;
            let len: u32 = num_str
                .parse()
                .map_err(|_| malformed(format!("bad length '{num_str}' before '{ch}'")))?;
            num_str.clear();
            if len == 0 {
                return Err(malformed(format!("zero-length {ch} element")));
            }
            elements.push(CigarElement::new(op, len));
        }
        if !num_str.is_empty() {
            return Err(malformed(format!("trailing length '{num_str}'")));
        }

        Ok(Cigar(elements))
    }
}

impl fmt::Display for Cigar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in &self.0 {
            write!(f, "{}{}", e.len, e.op.to_char())?;
        }
        Ok(())
    }
}

/// An immutable aligned read. The engine never mutates one; while active it is
/// shared behind `Arc` between the active set and any pileups it appears in.
#[derive(Debug, Clone)]
pub struct Read {
    pub name: String,
    pub sample: String,
    pub contig: u32,
    /// 1-based position of the first reference-consuming step.
    pub start: u64,
    pub cigar: Cigar,
    pub bases: Vec<u8>,
    pub quals: Vec<u8>,
}

impl Read {
    pub fn start_locus(&self) -> Locus {
        Locus::new(self.contig, self.start)
    }

    /// Last reference position covered by the alignment. A read with no
    /// reference-consuming step occupies only the locus it is folded into,
    /// so its end equals its start.
    pub fn alignment_end(&self) -> u64 {
        let span = self.cigar.reference_span();
        if span == 0 {
            self.start
        } else {
            self.start + span - 1
        }
    }

    pub fn end_locus(&self) -> Locus {
        Locus::new(self.contig, self.alignment_end())
    }

    /// Check that the cigar can be placed against this read's sequence.
    pub fn validate(&self) -> Result<(), PileupError> {
        let malformed = |detail: String| PileupError::MalformedAlignment {
            read: self.name.clone(),
            detail,
        };

        if self.cigar.is_empty() {
            return Err(malformed("empty cigar".to_string()));
        }
        for e in self.cigar.elements() {
            if e.len == 0 {
                return Err(malformed(format!(
                    "zero-length {} element",
                    e.op.to_char()
                )));
            }
        }
        let expected = self.cigar.read_len();
        if expected != self.bases.len() {
            return Err(malformed(format!(
                "cigar consumes {} bases but read has {}",
                expected,
                self.bases.len()
            )));
        }
        if self.bases.len() != self.quals.len() {
            return Err(malformed(format!(
                "{} bases but {} quality scores",
                self.bases.len(),
                self.quals.len()
            )));
        }
        Ok(())
    }
}
