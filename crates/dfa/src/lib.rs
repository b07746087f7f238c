//! Instruction DFA oracle
//!
//! The chunk validator walks untrusted bytes through a deterministic finite
//! automaton whose language is the set of allowed instruction encodings.
//! This crate defines the interface that walk consumes, [`InstructionDfa`],
//! together with a table-backed implementation, [`DfaTable`], loaded from a
//! precomputed transition table.
//!
//! How the table is generated from the instruction grammar is out of scope
//! here: any generator that produces the serialized format described in
//! [`table`], or that drives [`DfaTableBuilder`] directly, can supply the
//! oracle.
//!
//! # States
//!
//! State identifiers are opaque `u16`s. Two are distinguished:
//!
//! - [`SINK_STATE`] (value 0): no valid continuation exists; reaching it
//!   means the byte stream is not in the allowed grammar.
//! - the start state ([`InstructionDfa::initial_state`]): where decoding of
//!   a new instruction begins.
//!
//! A state may satisfy several acceptance classes at once. Classification
//! tests the control-transfer kinds before `Boundary`; see
//! [`InstructionDfa::classify`].

pub mod table;
pub mod traits;

pub use table::{DfaTable, DfaTableBuilder, TableError, TABLE_MAGIC, TABLE_VERSION};
pub use traits::{AcceptClass, ControlTransfer, InstructionDfa, State, SINK_STATE};
