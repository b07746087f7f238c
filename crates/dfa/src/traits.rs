//! Oracle interface consumed by the segment walker
//!
//! The [`InstructionDfa`] trait abstracts over how the transition table is
//! stored and generated. The walker only needs three things: the initial
//! state, a total transition function, and acceptance predicates for each
//! class in [`AcceptClass`].

/// Opaque DFA state identifier.
pub type State = u16;

/// The distinguished rejecting state: no valid continuation exists.
///
/// A well-formed oracle absorbs at the sink: `transition(SINK_STATE, b)`
/// is `SINK_STATE` for every byte `b`, and the sink accepts nothing.
pub const SINK_STATE: State = 0;

/// Control-transfer acceptance kinds.
///
/// A state accepting one of these ends the current segment unconditionally:
/// the walk does not extend an instruction run past a control transfer, even
/// if the state also accepts `Boundary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlTransfer {
    /// Instrumented indirect-call check sequence.
    IndirectCallCheck,
    /// Instrumented return check sequence.
    IndirectReturnCheck,
    /// Instrumented control-flow check sequence.
    ControlFlowCheck,
    /// Indirect call through a register or memory operand.
    IndirectCall,
    /// Direct call ending in a 32-bit relative displacement.
    DirectCall,
    /// Relative jump ending in an 8-bit displacement.
    ShortRelativeJump,
    /// Relative jump ending in a 32-bit displacement.
    LongRelativeJump,
}

impl ControlTransfer {
    /// All kinds, in the order acceptance is tested.
    pub const ALL: [ControlTransfer; 7] = [
        ControlTransfer::IndirectCallCheck,
        ControlTransfer::IndirectReturnCheck,
        ControlTransfer::ControlFlowCheck,
        ControlTransfer::IndirectCall,
        ControlTransfer::DirectCall,
        ControlTransfer::ShortRelativeJump,
        ControlTransfer::LongRelativeJump,
    ];

    /// Width in bytes of the relative displacement that ends the encoding,
    /// for kinds whose target is resolvable at validation time.
    ///
    /// A state accepting a kind with a displacement is only reachable after
    /// at least that many bytes: the displacement is part of the encoding
    /// the grammar matched.
    pub fn displacement_size(self) -> Option<usize> {
        match self {
            ControlTransfer::ShortRelativeJump => Some(1),
            ControlTransfer::DirectCall | ControlTransfer::LongRelativeJump => Some(4),
            ControlTransfer::IndirectCallCheck
            | ControlTransfer::IndirectReturnCheck
            | ControlTransfer::ControlFlowCheck
            | ControlTransfer::IndirectCall => None,
        }
    }
}

/// An acceptance class a state may satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptClass {
    /// Sanctioned control-transfer pattern; ends the segment.
    Transfer(ControlTransfer),
    /// Complete ordinary instruction with no control-transfer meaning.
    Boundary,
}

impl AcceptClass {
    /// Bit index used by table-backed acceptance sets.
    pub(crate) fn bit(self) -> u8 {
        match self {
            AcceptClass::Transfer(kind) => kind as u8,
            AcceptClass::Boundary => 7,
        }
    }
}

/// The DFA oracle the segment walker consumes.
///
/// Implementations are read-only after construction and can be shared across
/// any number of concurrent validations.
///
/// # Contract
///
/// - `transition` is total: a byte with no valid continuation maps to
///   [`SINK_STATE`].
/// - The sink absorbs: `transition(SINK_STATE, b) == SINK_STATE` for all `b`.
/// - The sink accepts nothing.
pub trait InstructionDfa {
    /// State from which decoding of a new instruction begins.
    fn initial_state(&self) -> State;

    /// Advance `state` by one input byte.
    fn transition(&self, state: State, byte: u8) -> State;

    /// Whether `state` satisfies the given acceptance class.
    fn accepts(&self, state: State, class: AcceptClass) -> bool;

    /// Classify `state` in acceptance-priority order: control-transfer
    /// kinds first, then `Boundary`.
    ///
    /// A state satisfying both is a control transfer; the `Boundary`
    /// interpretation never shadows it. This ordering is what makes a
    /// sanctioned transfer a hard segment boundary instead of the head of
    /// an extendable instruction run.
    fn classify(&self, state: State) -> Option<AcceptClass> {
        for kind in ControlTransfer::ALL {
            if self.accepts(state, AcceptClass::Transfer(kind)) {
                return Some(AcceptClass::Transfer(kind));
            }
        }
        if self.accepts(state, AcceptClass::Boundary) {
            return Some(AcceptClass::Boundary);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{AcceptClass, ControlTransfer, InstructionDfa, State};

    /// Hand-rolled oracle with a single state that accepts both a direct
    /// call and `Boundary`.
    struct DualAccept;

    impl InstructionDfa for DualAccept {
        fn initial_state(&self) -> State {
            1
        }

        fn transition(&self, _state: State, _byte: u8) -> State {
            2
        }

        fn accepts(&self, state: State, class: AcceptClass) -> bool {
            state == 2
                && matches!(
                    class,
                    AcceptClass::Boundary | AcceptClass::Transfer(ControlTransfer::DirectCall)
                )
        }
    }

    #[test]
    fn test_classify_prefers_control_transfer_over_boundary() {
        let classified = DualAccept.classify(2);
        assert_eq!(
            classified,
            Some(AcceptClass::Transfer(ControlTransfer::DirectCall)),
            "a state accepting both must classify as a control transfer"
        );
    }

    #[test]
    fn test_classify_non_accepting_state() {
        assert_eq!(DualAccept.classify(1), None);
    }

    #[test]
    fn test_displacement_sizes() {
        assert_eq!(ControlTransfer::ShortRelativeJump.displacement_size(), Some(1));
        assert_eq!(ControlTransfer::LongRelativeJump.displacement_size(), Some(4));
        assert_eq!(ControlTransfer::DirectCall.displacement_size(), Some(4));
        assert_eq!(ControlTransfer::IndirectCall.displacement_size(), None);
        assert_eq!(ControlTransfer::IndirectReturnCheck.displacement_size(), None);
    }
}
