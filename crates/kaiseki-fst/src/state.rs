// Frozen FST states and the arena that owns them.
//
// States are hash-consed while building: two states with the same finality,
// final output and arc list are the same state. The arena order doubles as a
// topological order (a state is frozen only after all of its targets), which
// the compiler relies on.

use crate::FstError;

/// Index of a frozen state inside a [`StateGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub u32);

impl StateId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An outgoing transition: one UTF-16 code unit plus an output delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Arc {
    pub label: u16,
    pub output: u32,
    pub target: StateId,
}

/// A frozen state.
///
/// Arcs are kept in strictly ascending label order so that both the builder
/// and the compiled form can binary-search them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct State {
    /// `Some(output)` when the string ending here is accepted.
    pub final_output: Option<u32>,
    pub arcs: Vec<Arc>,
}

impl State {
    #[inline]
    pub fn is_final(&self) -> bool {
        self.final_output.is_some()
    }

    /// Binary search for the arc carrying `label`.
    pub fn find_arc(&self, label: u16) -> Option<&Arc> {
        self.arcs
            .binary_search_by_key(&label, |arc| arc.label)
            .ok()
            .map(|i| &self.arcs[i])
    }
}

/// The minimized state graph produced by [`crate::builder::Builder`].
#[derive(Debug, Clone)]
pub struct StateGraph {
    pub(crate) states: Vec<State>,
    pub(crate) root: StateId,
}

impl StateGraph {
    pub fn root(&self) -> StateId {
        self.root
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }

    /// All frozen states in arena (topological) order.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn arc_count(&self) -> usize {
        self.states.iter().map(|s| s.arcs.len()).sum()
    }

    /// Replay `input` label by label and return the accumulated output.
    ///
    /// Fails with [`FstError::NotFound`] when an arc is missing or the last
    /// state is not accepting, and with [`FstError::Malformed`] when the
    /// outputs along the way overflow.
    pub fn transduce(&self, input: &str) -> Result<u32, FstError> {
        let overflow = || FstError::Malformed(format!("output of {input} overflows u32"));
        let mut state = self.state(self.root);
        let mut output = 0u32;
        for unit in input.encode_utf16() {
            let arc = state
                .find_arc(unit)
                .ok_or_else(|| FstError::NotFound(input.to_string()))?;
            output = output.checked_add(arc.output).ok_or_else(overflow)?;
            state = self.state(arc.target);
        }
        match state.final_output {
            Some(final_output) => output.checked_add(final_output).ok_or_else(overflow),
            None => Err(FstError::NotFound(input.to_string())),
        }
    }
}
