//! Validator for untrusted native code entering an SFI sandbox
//!
//! Decides, once and statically, whether a contiguous code chunk is safe to
//! map executable. The chunk is safe when it decomposes entirely into
//! instructions of a restricted grammar (supplied as a DFA oracle; see the
//! `dfa` crate) and every statically resolvable control transfer lands on a
//! validated instruction start. The second half is the point of the whole
//! exercise: a jump into the interior of a multi-byte encoding would
//! desynchronize the disassembled view of the bytes from what the processor
//! actually executes.
//!
//! # Validation Pipeline
//!
//! | Stage | Description |
//! |-------|-------------|
//! | **Segment walk** | Drive the bytes through the DFA from each segment start; ordinary instruction boundaries extend the run, control-transfer acceptances end the segment |
//! | **Boundary tracking** | One bit per byte offset records every validated instruction start |
//! | **Destination tracking** | Relative jumps and direct calls resolve their displacement; the target offset gets a bit in a second bitmap |
//! | **Jump target check** | Every destination bit must also be a boundary bit, compared 32 offsets at a time |
//!
//! The first fault aborts the chunk's validation: there is no partial
//! verdict and no skip-and-continue mode. Every rejection carries the
//! offset (and where available the byte or target) needed to reproduce it.
//!
//! # Example
//!
//! ```no_run
//! use dfa::DfaTable;
//! use sfi_verifier::ChunkValidator;
//!
//! # fn run(table_blob: &[u8], chunk: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let table = DfaTable::from_bytes(table_blob)?;
//! let validator = ChunkValidator::new(&table);
//! validator.validate(chunk, 0x8000_0000)?;
//! # Ok(())
//! # }
//! ```

mod bitmap;
mod error;
mod validate;
mod walker;

pub use bitmap::{OffsetBitmap, OFFSETS_PER_WORD};
pub use error::ValidationError;
pub use validate::{check_jump_targets, ChunkValidator};
pub use walker::{Segment, SegmentTerminal, SegmentWalker};
