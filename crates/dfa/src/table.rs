//! Table-backed DFA
//!
//! [`DfaTable`] stores the transition function as one 256-entry row per
//! state plus one acceptance-flag byte per state. Tables are produced by an
//! out-of-tree generator and shipped as a binary blob, or built
//! programmatically through [`DfaTableBuilder`] (mainly for tests and
//! tooling). Both paths run the same well-formedness checks, so a
//! constructed `DfaTable` always upholds the [`InstructionDfa`] contract:
//! state 0 is the absorbing sink, the sink accepts nothing, and every
//! transition target is in range.
//!
//! # Serialized format
//!
//! All multi-byte fields little-endian:
//!
//! | field        | size                |
//! |--------------|---------------------|
//! | magic        | 4 bytes, `"DFA\0"`  |
//! | version      | 1 byte              |
//! | state count  | `u16`               |
//! | start state  | `u16`               |
//! | accept flags | 1 byte per state    |
//! | transitions  | 256 `u16`s per state|

use thiserror::Error;

use crate::traits::{AcceptClass, InstructionDfa, State, SINK_STATE};

/// Magic prefix of a serialized table.
pub const TABLE_MAGIC: [u8; 4] = *b"DFA\0";

/// Current serialized table format version.
pub const TABLE_VERSION: u8 = 1;

const HEADER_LEN: usize = TABLE_MAGIC.len() + 1 + 2 + 2;

/// Errors raised while building or deserializing a table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("state {state} out of range (table has {count} states)")]
    StateOutOfRange { state: State, count: usize },

    #[error("every transition out of the sink state must return to the sink state")]
    SinkNotAbsorbing,

    #[error("the sink state must not be accepting")]
    AcceptingSink,

    #[error("the start state must not be the sink state")]
    SinkStart,

    #[error("a table needs at least the sink state and one other state")]
    Empty,

    #[error("{count} states exceed the u16 identifier space")]
    TooManyStates { count: usize },

    #[error("table blob too short: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("bad table magic (not a serialized DFA table)")]
    BadMagic,

    #[error("unsupported table format version {0}")]
    UnsupportedVersion(u8),
}

/// Immutable transition table implementing [`InstructionDfa`].
#[derive(Debug, Clone)]
pub struct DfaTable {
    transitions: Vec<[State; 256]>,
    accept_flags: Vec<u8>,
    start: State,
}

impl DfaTable {
    /// Start building a table with `state_count` states.
    ///
    /// State 0 is the sink; all transitions default to it.
    pub fn builder(state_count: usize) -> DfaTableBuilder {
        DfaTableBuilder {
            state_count,
            start: SINK_STATE,
            transitions: Vec::new(),
            accepts: Vec::new(),
        }
    }

    /// Number of states, sink included.
    pub fn state_count(&self) -> usize {
        self.transitions.len()
    }

    /// Deserialize a table blob, applying the same well-formedness checks
    /// as [`DfaTableBuilder::build`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TableError> {
        if bytes.len() < HEADER_LEN {
            return Err(TableError::Truncated {
                expected: HEADER_LEN,
                actual: bytes.len(),
            });
        }
        if bytes[..TABLE_MAGIC.len()] != TABLE_MAGIC {
            return Err(TableError::BadMagic);
        }
        let version = bytes[4];
        if version != TABLE_VERSION {
            return Err(TableError::UnsupportedVersion(version));
        }
        let state_count = u16::from_le_bytes([bytes[5], bytes[6]]) as usize;
        let start = u16::from_le_bytes([bytes[7], bytes[8]]);

        let expected = HEADER_LEN + state_count + state_count * 256 * 2;
        if bytes.len() < expected {
            return Err(TableError::Truncated {
                expected,
                actual: bytes.len(),
            });
        }

        let accept_flags = bytes[HEADER_LEN..HEADER_LEN + state_count].to_vec();
        let mut transitions = Vec::with_capacity(state_count);
        let mut at = HEADER_LEN + state_count;
        for _ in 0..state_count {
            let mut row = [SINK_STATE; 256];
            for entry in row.iter_mut() {
                *entry = u16::from_le_bytes([bytes[at], bytes[at + 1]]);
                at += 2;
            }
            transitions.push(row);
        }

        let table = DfaTable {
            transitions,
            accept_flags,
            start,
        };
        table.check_well_formed()?;
        Ok(table)
    }

    /// Serialize this table into the blob format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let state_count = self.state_count();
        let mut out = Vec::with_capacity(HEADER_LEN + state_count + state_count * 256 * 2);
        out.extend_from_slice(&TABLE_MAGIC);
        out.push(TABLE_VERSION);
        out.extend_from_slice(&(state_count as u16).to_le_bytes());
        out.extend_from_slice(&self.start.to_le_bytes());
        out.extend_from_slice(&self.accept_flags);
        for row in &self.transitions {
            for &target in row.iter() {
                out.extend_from_slice(&target.to_le_bytes());
            }
        }
        out
    }

    fn check_well_formed(&self) -> Result<(), TableError> {
        let count = self.state_count();
        if count < 2 {
            return Err(TableError::Empty);
        }
        if count > State::MAX as usize + 1 {
            return Err(TableError::TooManyStates { count });
        }
        if self.start == SINK_STATE {
            return Err(TableError::SinkStart);
        }
        if self.start as usize >= count {
            return Err(TableError::StateOutOfRange {
                state: self.start,
                count,
            });
        }
        if self.transitions[SINK_STATE as usize]
            .iter()
            .any(|&target| target != SINK_STATE)
        {
            return Err(TableError::SinkNotAbsorbing);
        }
        if self.accept_flags[SINK_STATE as usize] != 0 {
            return Err(TableError::AcceptingSink);
        }
        for row in &self.transitions {
            for &target in row.iter() {
                if target as usize >= count {
                    return Err(TableError::StateOutOfRange {
                        state: target,
                        count,
                    });
                }
            }
        }
        Ok(())
    }
}

impl InstructionDfa for DfaTable {
    fn initial_state(&self) -> State {
        self.start
    }

    fn transition(&self, state: State, byte: u8) -> State {
        // States never produced by this table fold into the sink.
        self.transitions
            .get(state as usize)
            .map_or(SINK_STATE, |row| row[byte as usize])
    }

    fn accepts(&self, state: State, class: AcceptClass) -> bool {
        self.accept_flags
            .get(state as usize)
            .is_some_and(|flags| flags & (1 << class.bit()) != 0)
    }
}

/// Accumulates transitions and acceptance markings, validated by
/// [`build`](DfaTableBuilder::build).
pub struct DfaTableBuilder {
    state_count: usize,
    start: State,
    transitions: Vec<(State, Option<u8>, State)>,
    accepts: Vec<(State, AcceptClass)>,
}

impl DfaTableBuilder {
    /// Set the start state.
    pub fn start(&mut self, state: State) -> &mut Self {
        self.start = state;
        self
    }

    /// Add a transition on one byte.
    pub fn transition(&mut self, from: State, byte: u8, to: State) -> &mut Self {
        self.transitions.push((from, Some(byte), to));
        self
    }

    /// Add a transition on every byte value (the generator's `XX` wildcard,
    /// used for immediate operands).
    pub fn transition_any(&mut self, from: State, to: State) -> &mut Self {
        self.transitions.push((from, None, to));
        self
    }

    /// Mark a state as accepting the given class. A state may accept
    /// several classes.
    pub fn accept(&mut self, state: State, class: AcceptClass) -> &mut Self {
        self.accepts.push((state, class));
        self
    }

    /// Assemble and validate the table.
    pub fn build(&self) -> Result<DfaTable, TableError> {
        let count = self.state_count;
        let in_range = |state: State| {
            if (state as usize) < count {
                Ok(())
            } else {
                Err(TableError::StateOutOfRange { state, count })
            }
        };

        let mut transitions = vec![[SINK_STATE; 256]; count];
        for &(from, byte, to) in &self.transitions {
            in_range(from)?;
            in_range(to)?;
            match byte {
                Some(byte) => transitions[from as usize][byte as usize] = to,
                None => transitions[from as usize] = [to; 256],
            }
        }

        let mut accept_flags = vec![0u8; count];
        for &(state, class) in &self.accepts {
            in_range(state)?;
            accept_flags[state as usize] |= 1 << class.bit();
        }

        let table = DfaTable {
            transitions,
            accept_flags,
            start: self.start,
        };
        table.check_well_formed()?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::{DfaTable, TableError, TABLE_MAGIC};
    use crate::traits::{AcceptClass, ControlTransfer, InstructionDfa, SINK_STATE};

    /// One-byte `Boundary` instruction on 0x90, short jump on 0xEB + disp8.
    fn small_table() -> DfaTable {
        let mut builder = DfaTable::builder(5);
        builder
            .start(1)
            .transition(1, 0x90, 2)
            .transition(1, 0xeb, 3)
            .transition_any(3, 4)
            .transition(2, 0x90, 2)
            .accept(2, AcceptClass::Boundary)
            .accept(4, AcceptClass::Transfer(ControlTransfer::ShortRelativeJump));
        builder.build().expect("small table is well-formed")
    }

    #[test]
    fn test_transitions_and_acceptance() {
        let table = small_table();
        let state = table.transition(table.initial_state(), 0x90);
        assert_eq!(state, 2);
        assert!(table.accepts(state, AcceptClass::Boundary));
        assert_eq!(table.classify(state), Some(AcceptClass::Boundary));

        let jump = table.transition(table.transition(1, 0xeb), 0x7f);
        assert_eq!(
            table.classify(jump),
            Some(AcceptClass::Transfer(ControlTransfer::ShortRelativeJump))
        );
    }

    #[test]
    fn test_undefined_byte_goes_to_sink() {
        let table = small_table();
        assert_eq!(table.transition(table.initial_state(), 0xcc), SINK_STATE);
    }

    #[test]
    fn test_sink_absorbs_every_byte() {
        let table = small_table();
        for byte in 0..=u8::MAX {
            assert_eq!(table.transition(SINK_STATE, byte), SINK_STATE);
        }
    }

    #[test]
    fn test_out_of_range_state_folds_to_sink() {
        let table = small_table();
        assert_eq!(table.transition(999, 0x90), SINK_STATE);
        assert!(!table.accepts(999, AcceptClass::Boundary));
    }

    #[test]
    fn test_build_rejects_missing_start() {
        let mut builder = DfaTable::builder(3);
        builder.transition(1, 0x90, 2);
        assert!(matches!(builder.build(), Err(TableError::SinkStart)));
    }

    #[test]
    fn test_build_rejects_out_of_range_target() {
        let mut builder = DfaTable::builder(3);
        builder.start(1).transition(1, 0x90, 7);
        assert!(matches!(
            builder.build(),
            Err(TableError::StateOutOfRange { state: 7, .. })
        ));
    }

    #[test]
    fn test_build_rejects_transition_out_of_sink() {
        let mut builder = DfaTable::builder(3);
        builder.start(1).transition(SINK_STATE, 0x90, 1);
        assert!(matches!(builder.build(), Err(TableError::SinkNotAbsorbing)));
    }

    #[test]
    fn test_build_rejects_accepting_sink() {
        let mut builder = DfaTable::builder(3);
        builder.start(1).accept(SINK_STATE, AcceptClass::Boundary);
        assert!(matches!(builder.build(), Err(TableError::AcceptingSink)));
    }

    #[test]
    fn test_blob_round_trip() {
        let table = small_table();
        let restored = DfaTable::from_bytes(&table.to_bytes()).expect("round trip");

        assert_eq!(restored.state_count(), table.state_count());
        assert_eq!(restored.initial_state(), table.initial_state());
        assert_eq!(restored.transition(1, 0x90), 2);
        assert!(restored.accepts(2, AcceptClass::Boundary));
    }

    #[test]
    fn test_from_bytes_rejects_bad_magic() {
        let mut bytes = small_table().to_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            DfaTable::from_bytes(&bytes),
            Err(TableError::BadMagic)
        ));
    }

    #[test]
    fn test_from_bytes_rejects_truncated_blob() {
        let bytes = small_table().to_bytes();
        assert!(matches!(
            DfaTable::from_bytes(&bytes[..bytes.len() - 1]),
            Err(TableError::Truncated { .. })
        ));
    }

    #[test]
    fn test_from_bytes_rejects_unknown_version() {
        let mut bytes = small_table().to_bytes();
        bytes[TABLE_MAGIC.len()] = 0xff;
        assert!(matches!(
            DfaTable::from_bytes(&bytes),
            Err(TableError::UnsupportedVersion(0xff))
        ));
    }
}
