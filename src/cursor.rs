//! Per-read cigar cursor: translates "the traversal is now at reference
//! position X" into that read's contribution at X.
//!
//! The driver steps each active read's cursor exactly once per visited locus;
//! the cursor walks the cigar, consuming reference-spanning steps one unit at
//! a time and passing over read-only steps (insertions, clips) in between.
//! Insertions never occupy a reference position of their own, so they surface
//! as adjacency metadata on the aligned positions either side of the run.

use std::sync::Arc;

use crate::error::PileupError;
use crate::read::{CigarElement, CigarOp, Read};

/// One read's contribution at one reference position. Value type, recomputed
/// per position, never persisted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SiteInfo {
    /// Offset of the read base observed here; at a deletion locus, the offset
    /// of the last read base consumed before the deletion.
    pub read_offset: usize,
    /// Index of the cigar element the cursor is inside.
    pub element_index: usize,
    /// 0-based offset within that element.
    pub offset_in_element: u32,
    /// The reference position falls inside a deletion or skip run: there is
    /// no read base here.
    pub is_deletion: bool,
    /// The whole alignment is an insertion; this is the single folded site.
    pub insertion_only: bool,
    /// This is the aligned position immediately preceding an insertion run.
    pub before_insertion: bool,
    /// This is the aligned position immediately following an insertion run.
    pub after_insertion: bool,
    /// This is the position immediately preceding a deletion/skip run.
    pub before_deletion: bool,
    /// This is the position immediately following a deletion/skip run.
    pub after_deletion: bool,
    /// First or last aligned position, adjacent to a soft clip.
    pub next_to_soft_clip: bool,
    /// Length of the indel run starting immediately after this position
    /// (0 when none).
    pub following_indel_len: u32,
    /// (read offset, length) of the inserted bases following this position.
    pub following_insertion: Option<(usize, usize)>,
    /// (read offset, length) of the inserted bases preceding this position.
    pub preceding_insertion: Option<(usize, usize)>,
}

/// Mutable walk state over one read's cigar. Owned by the read's entry in the
/// active set and destroyed when the read's span ends.
#[derive(Debug)]
pub struct ReadCursor {
    read: Arc<Read>,
    element: usize,
    /// Reference units already consumed in the current element.
    consumed: u32,
    /// Offset of the last read base consumed, -1 before any.
    read_offset: isize,
    insertion_only: bool,
    exhausted: bool,
}

impl ReadCursor {
    pub fn new(read: Arc<Read>) -> Result<Self, PileupError> {
        read.validate()?;
        let insertion_only = read.cigar.reference_span() == 0;
        if insertion_only
            && !read
                .cigar
                .elements()
                .iter()
                .any(|e| e.op == CigarOp::Insertion)
        {
            return Err(PileupError::MalformedAlignment {
                read: read.name.clone(),
                detail: "cigar consumes no reference bases and contains no insertion".to_string(),
            });
        }
        Ok(ReadCursor {
            read,
            element: 0,
            consumed: 0,
            read_offset: -1,
            insertion_only,
            exhausted: false,
        })
    }

    pub fn read(&self) -> &Arc<Read> {
        &self.read
    }

    /// Advance one reference position; `None` once the span is exhausted.
    pub fn step(&mut self) -> Option<SiteInfo> {
        if self.exhausted {
            return None;
        }
        if self.insertion_only {
            self.exhausted = true;
            return Some(self.insertion_only_site());
        }

        let elements = self.read.cigar.elements();
        loop {
            let el = match elements.get(self.element) {
                Some(e) => *e,
                None => {
                    self.exhausted = true;
                    return None;
                }
            };
            if self.consumed >= el.len {
                self.element += 1;
                self.consumed = 0;
                continue;
            }
            if el.op.consumes_reference() {
                if el.op.consumes_read() {
                    self.read_offset += 1;
                }
                let site = self.site_at(el);
                self.consumed += 1;
                return Some(site);
            }
            // Insertion, soft clip, hard clip, padding: pass over the whole
            // element between two reference-consuming steps.
            if el.op.consumes_read() {
                self.read_offset += el.len as isize;
            }
            self.element += 1;
            self.consumed = 0;
        }
    }

    fn site_at(&self, el: CigarElement) -> SiteInfo {
        let elements = self.read.cigar.elements();
        let is_deletion = matches!(el.op, CigarOp::Deletion | CigarOp::Skip);
        let mut site = SiteInfo {
            read_offset: self.read_offset.max(0) as usize,
            element_index: self.element,
            offset_in_element: self.consumed,
            is_deletion,
            ..Default::default()
        };

        // First unit of the element: look back at what we just passed over.
        if self.consumed == 0 {
            if let Some(prev) = effective_neighbor(elements, self.element, false) {
                match elements[prev].op {
                    CigarOp::Insertion => {
                        site.after_insertion = true;
                        let len = elements[prev].len as usize;
                        // The inserted run ends right before the base consumed
                        // here; at a deletion site nothing was consumed, so it
                        // ends at the current read offset itself.
                        let end = if el.op.consumes_read() {
                            self.read_offset as usize
                        } else {
                            (self.read_offset + 1) as usize
                        };
                        site.preceding_insertion = Some((end - len, len));
                    }
                    CigarOp::Deletion | CigarOp::Skip => site.after_deletion = true,
                    CigarOp::SoftClip => site.next_to_soft_clip = true,
                    _ => {}
                }
            }
        }

        // Last unit of the element: look ahead at what comes next.
        if self.consumed + 1 == el.len {
            if let Some(next) = effective_neighbor(elements, self.element, true) {
                match elements[next].op {
                    CigarOp::Insertion => {
                        site.before_insertion = true;
                        let len = elements[next].len as usize;
                        site.following_indel_len = elements[next].len;
                        site.following_insertion =
                            Some(((self.read_offset + 1) as usize, len));
                    }
                    CigarOp::Deletion | CigarOp::Skip => {
                        site.before_deletion = true;
                        site.following_indel_len = elements[next].len;
                    }
                    CigarOp::SoftClip => site.next_to_soft_clip = true,
                    _ => {}
                }
            }
        }

        site
    }

    /// A read whose entire alignment is insertion has no reference position of
    /// its own: it contributes exactly one element, at the locus the driver
    /// folds it into, carrying the insertion as preceding-event metadata.
    fn insertion_only_site(&self) -> SiteInfo {
        let elements = self.read.cigar.elements();
        let mut read_off = 0usize;
        let mut first_ins = (0usize, 0usize, 0usize);
        for (i, el) in elements.iter().enumerate() {
            if el.op == CigarOp::Insertion {
                first_ins = (i, read_off, el.len as usize);
                break;
            }
            if el.op.consumes_read() {
                read_off += el.len as usize;
            }
        }
        let (idx, off, len) = first_ins;
        SiteInfo {
            read_offset: off + len - 1,
            element_index: idx,
            offset_in_element: 0,
            insertion_only: true,
            after_insertion: true,
            preceding_insertion: Some((off, len)),
            ..Default::default()
        }
    }
}

/// Nearest cigar element before/after `from`, looking through hard clips and
/// padding (which occupy neither read nor reference).
fn effective_neighbor(elements: &[CigarElement], from: usize, forward: bool) -> Option<usize> {
    if forward {
        elements
            .iter()
            .enumerate()
            .skip(from + 1)
            .find(|(_, e)| !e.op.is_padding_like())
            .map(|(i, _)| i)
    } else {
        elements[..from]
            .iter()
            .enumerate()
            .rev()
            .find(|(_, e)| !e.op.is_padding_like())
            .map(|(i, _)| i)
    }
}
