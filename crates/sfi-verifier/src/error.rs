//! Error types for chunk validation

use thiserror::Error;

/// Errors discovered while validating a code chunk.
///
/// Every variant is fatal to the chunk being validated: the first fault
/// aborts the remaining scan and no partial verdict is produced. Offsets
/// are relative to the chunk start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Decoding reached the DFA's sink state: the byte sequence is not in
    /// the allowed instruction grammar at this position.
    #[error("disallowed byte {byte:#04x} at offset {offset:#x}")]
    RejectedByte { offset: usize, byte: u8 },

    /// The chunk ended in the middle of an instruction encoding.
    #[error("instruction starting at offset {start:#x} runs past the end of the chunk")]
    TruncatedInstruction { start: usize },

    /// A recorded control-transfer destination does not coincide with a
    /// validated instruction start.
    #[error("jump destination at offset {offset:#x} is not an instruction boundary")]
    InconsistentJumpTarget { offset: usize },

    /// A resolvable relative transfer targets an address outside the chunk,
    /// which cannot be proven to be an instruction boundary.
    #[error("relative transfer at offset {branch_offset:#x} targets {target:#x}, outside the chunk")]
    JumpOutOfRange { branch_offset: usize, target: i64 },
}
