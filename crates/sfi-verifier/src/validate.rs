//! Chunk validation
//!
//! [`ChunkValidator`] decomposes a chunk into accepted segments, records
//! instruction starts and control-transfer destinations, and hands the two
//! bitmaps to [`check_jump_targets`] for the final consistency verdict.

use dfa::InstructionDfa;
use log::debug;

use crate::{
    bitmap::{OffsetBitmap, OFFSETS_PER_WORD},
    error::ValidationError,
    walker::{SegmentTerminal, SegmentWalker},
};

/// Validates code chunks against a DFA oracle.
///
/// The oracle is borrowed read-only, so one table can serve any number of
/// validations, concurrent ones included; all mutable state lives in the
/// individual [`validate`](ChunkValidator::validate) call.
pub struct ChunkValidator<'a, D> {
    dfa: &'a D,
}

impl<'a, D: InstructionDfa> ChunkValidator<'a, D> {
    pub fn new(dfa: &'a D) -> Self {
        ChunkValidator { dfa }
    }

    /// Validate one chunk loaded (or to be loaded) at `load_addr`.
    ///
    /// `load_addr` is carried for diagnostics only: offsets in errors are
    /// relative to the chunk start, and no validation decision depends on
    /// the address. An empty chunk is trivially valid.
    pub fn validate(&self, chunk: &[u8], load_addr: u64) -> Result<(), ValidationError> {
        let walker = SegmentWalker::new(self.dfa);
        let mut valid_targets = OffsetBitmap::new(chunk.len());
        let mut jump_dests = OffsetBitmap::new(chunk.len());

        let mut cursor = 0;
        let mut segments = 0usize;
        while cursor < chunk.len() {
            let segment = walker.walk(chunk, cursor, self.dfa.initial_state(), &mut valid_targets)?;
            let end = cursor + segment.len;
            if let SegmentTerminal::Transfer { kind, start } = segment.terminal {
                record_destination(chunk, start, end, kind, &mut jump_dests)?;
            }
            segments += 1;
            cursor = end;
        }
        debug_assert_eq!(cursor, chunk.len(), "segments must cover the chunk exactly");

        debug!(
            "chunk at {load_addr:#x}: {} bytes in {segments} segments",
            chunk.len()
        );
        check_jump_targets(&valid_targets, &jump_dests)
    }
}

/// Resolve the destination of the transfer instruction spanning
/// `branch_start..seg_end` and record it, if the kind carries a static
/// displacement.
///
/// The displacement is the little-endian two's-complement tail of the
/// encoding, relative to the segment end (the address of the next
/// instruction, as the processor computes relative branches). A target of
/// exactly the chunk length is the region end and is permitted without
/// being recorded; anything else outside the chunk is rejected.
fn record_destination(
    chunk: &[u8],
    branch_start: usize,
    seg_end: usize,
    kind: dfa::ControlTransfer,
    jump_dests: &mut OffsetBitmap,
) -> Result<(), ValidationError> {
    let Some(width) = kind.displacement_size() else {
        return Ok(());
    };
    // Oracle contract: the displacement bytes are part of the accepted
    // encoding, so the instruction is at least `width` bytes long.
    debug_assert!(seg_end - branch_start >= width);

    let displacement = match width {
        1 => chunk[seg_end - 1] as i8 as i64,
        _ => {
            let tail = seg_end - 4;
            i32::from_le_bytes([chunk[tail], chunk[tail + 1], chunk[tail + 2], chunk[tail + 3]])
                as i64
        }
    };

    let target = seg_end as i64 + displacement;
    if target < 0 || target > chunk.len() as i64 {
        return Err(ValidationError::JumpOutOfRange {
            branch_offset: branch_start,
            target,
        });
    }
    if (target as usize) < chunk.len() {
        jump_dests.set(target as usize);
    }
    Ok(())
}

/// Verify that every recorded control-transfer destination coincides with a
/// validated instruction start.
///
/// Pure function of the two bitmaps: compares them [`OFFSETS_PER_WORD`]
/// offsets at a time, including the partial trailing group, and reports the
/// first offset set in `jump_dests` but clear in `valid_targets`.
pub fn check_jump_targets(
    valid_targets: &OffsetBitmap,
    jump_dests: &OffsetBitmap,
) -> Result<(), ValidationError> {
    debug_assert_eq!(valid_targets.len(), jump_dests.len());

    for (group, (&dests, &valid)) in jump_dests
        .words()
        .iter()
        .zip(valid_targets.words())
        .enumerate()
    {
        let stray = dests & !valid;
        if stray != 0 {
            let offset = group * OFFSETS_PER_WORD + stray.trailing_zeros() as usize;
            return Err(ValidationError::InconsistentJumpTarget { offset });
        }
    }
    Ok(())
}
