//! Segment walker
//!
//! Drives a byte range through the DFA oracle and carves it into segments.
//! A segment is the span consumed to reach a control-transfer acceptance,
//! or a run of ordinary instructions extending to the end of the range.
//!
//! A `Boundary` acceptance does not end the walk: the completed instruction
//! becomes the head of a run and decoding continues from the state just
//! reached, with the position after the accepted byte recorded as the next
//! instruction start. Every outcome inside the run is checked, so a
//! rejection or truncation anywhere in the continuation fails the walk
//! rather than being deferred to a later re-scan.

use dfa::{AcceptClass, InstructionDfa, State, SINK_STATE};

use crate::{bitmap::OffsetBitmap, error::ValidationError};

/// How a segment walk terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentTerminal {
    /// A sanctioned control-transfer pattern ended the segment. Acceptance
    /// priority guarantees this is reported even when the terminal state
    /// also completes an ordinary instruction. `start` is the chunk offset
    /// of the transfer instruction itself, which the segment's instruction
    /// run may precede.
    Transfer {
        kind: dfa::ControlTransfer,
        start: usize,
    },
    /// A run of ordinary instructions, the last of which ends exactly at
    /// the end of the byte range.
    BoundaryRun,
}

/// One validated segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Bytes consumed from the walk's starting offset.
    pub len: usize,
    pub terminal: SegmentTerminal,
}

/// Walks chunk bytes against a DFA oracle.
pub struct SegmentWalker<'a, D> {
    dfa: &'a D,
}

impl<'a, D: InstructionDfa> SegmentWalker<'a, D> {
    pub fn new(dfa: &'a D) -> Self {
        SegmentWalker { dfa }
    }

    /// Walk `chunk` from `base` (which must be a prospective instruction
    /// start inside the chunk) until an accepting state ends the segment.
    ///
    /// Every validated instruction start, `base` included, gets its bit set
    /// in `valid_targets`. Offsets in errors are absolute chunk offsets.
    pub fn walk(
        &self,
        chunk: &[u8],
        base: usize,
        start_state: State,
        valid_targets: &mut OffsetBitmap,
    ) -> Result<Segment, ValidationError> {
        debug_assert!(base < chunk.len());

        let mut state = start_state;
        let mut instr_start = base;
        valid_targets.set(base);

        let mut pos = base;
        while pos < chunk.len() {
            let byte = chunk[pos];
            state = self.dfa.transition(state, byte);
            if state == SINK_STATE {
                return Err(ValidationError::RejectedByte { offset: pos, byte });
            }
            pos += 1;

            match self.dfa.classify(state) {
                Some(AcceptClass::Transfer(kind)) => {
                    return Ok(Segment {
                        len: pos - base,
                        terminal: SegmentTerminal::Transfer {
                            kind,
                            start: instr_start,
                        },
                    });
                }
                Some(AcceptClass::Boundary) => {
                    if pos == chunk.len() {
                        return Ok(Segment {
                            len: pos - base,
                            terminal: SegmentTerminal::BoundaryRun,
                        });
                    }
                    // The next instruction starts here; keep extending the
                    // run from the state just reached.
                    valid_targets.set(pos);
                    instr_start = pos;
                }
                None => {}
            }
        }

        Err(ValidationError::TruncatedInstruction { start: instr_start })
    }
}
