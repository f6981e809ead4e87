// Incremental construction of a minimal acyclic transducer.
//
// Inputs arrive in strictly increasing order. Only the path of the most
// recent input is kept mutable (the "unfinished" stack); everything that
// falls off that path is frozen into the hash-consed arena immediately.

use hashbrown::HashMap;

use crate::FstError;
use crate::state::{Arc, State, StateGraph, StateId};

/// The arc from an unfinished state to the next unfinished state on the stack.
#[derive(Debug, Clone, Copy)]
struct PendingArc {
    label: u16,
    output: u32,
}

#[derive(Debug, Default)]
struct UnfinishedState {
    final_output: Option<u32>,
    arcs: Vec<Arc>,
    pending: Option<PendingArc>,
}

impl UnfinishedState {
    fn with_pending(label: u16) -> Self {
        Self {
            pending: Some(PendingArc { label, output: 0 }),
            ..Self::default()
        }
    }

    /// Push `residual` into everything leaving this state.
    fn add_output_prefix(&mut self, residual: u32) {
        for arc in &mut self.arcs {
            arc.output += residual;
        }
        if let Some(pending) = &mut self.pending {
            pending.output += residual;
        }
        if let Some(final_output) = &mut self.final_output {
            *final_output += residual;
        }
    }
}

/// Builds a [`StateGraph`] from sorted `(input, output)` pairs.
///
/// ```
/// use kaiseki_fst::builder::Builder;
///
/// let mut builder = Builder::new();
/// builder.insert("cat", 3).unwrap();
/// builder.insert("cats", 4).unwrap();
/// let graph = builder.finish();
/// assert_eq!(graph.transduce("cats").unwrap(), 4);
/// ```
#[derive(Debug)]
pub struct Builder {
    states: Vec<State>,
    registry: HashMap<State, StateId>,
    stack: Vec<UnfinishedState>,
    previous: Option<Vec<u16>>,
    len: usize,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            registry: HashMap::new(),
            stack: vec![UnfinishedState::default()],
            previous: None,
            len: 0,
        }
    }

    /// Build a graph in one go from an already sorted iterator of pairs.
    pub fn build<I, S>(pairs: I) -> Result<StateGraph, FstError>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        let mut builder = Self::new();
        for (input, output) in pairs {
            builder.insert(input.as_ref(), output)?;
        }
        Ok(builder.finish())
    }

    /// Number of inputs accepted so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Add one pair. Inputs must be strictly increasing in UTF-16 order.
    ///
    /// On error nothing is modified and the builder stays usable.
    pub fn insert(&mut self, input: &str, output: u32) -> Result<(), FstError> {
        let units: Vec<u16> = input.encode_utf16().collect();

        let prefix_len = match &self.previous {
            Some(previous) => {
                match units.as_slice().cmp(previous.as_slice()) {
                    std::cmp::Ordering::Equal => {
                        return Err(FstError::DuplicateEntry(input.to_string()));
                    }
                    std::cmp::Ordering::Less => {
                        return Err(FstError::InvalidOrder {
                            previous: String::from_utf16_lossy(previous),
                            current: input.to_string(),
                        });
                    }
                    std::cmp::Ordering::Greater => {}
                }
                units
                    .iter()
                    .zip(previous.iter())
                    .take_while(|(a, b)| a == b)
                    .count()
            }
            None => 0,
        };

        self.freeze_to(prefix_len + 1);

        // Output pushing along the shared prefix.
        let mut remaining = output;
        for depth in 0..prefix_len {
            let residual = match &mut self.stack[depth].pending {
                Some(pending) => {
                    let common = pending.output.min(remaining);
                    let residual = pending.output - common;
                    pending.output = common;
                    remaining -= common;
                    residual
                }
                None => 0,
            };
            if residual > 0 {
                self.stack[depth + 1].add_output_prefix(residual);
            }
        }

        if prefix_len == units.len() {
            // Only reachable for the empty string inserted first.
            self.stack[prefix_len].final_output = Some(remaining);
        } else {
            self.stack[prefix_len].pending = Some(PendingArc {
                label: units[prefix_len],
                output: remaining,
            });
            for &label in &units[prefix_len + 1..] {
                self.stack.push(UnfinishedState::with_pending(label));
            }
            self.stack.push(UnfinishedState {
                final_output: Some(0),
                ..UnfinishedState::default()
            });
        }

        self.previous = Some(units);
        self.len += 1;
        Ok(())
    }

    /// Freeze the remaining path and return the minimized graph.
    pub fn finish(mut self) -> StateGraph {
        self.freeze_to(1);
        let root = match self.stack.pop() {
            Some(node) => self.freeze(node),
            None => self.freeze(UnfinishedState::default()),
        };
        StateGraph {
            states: self.states,
            root,
        }
    }

    /// Pop and freeze unfinished states until `depth` remain.
    fn freeze_to(&mut self, depth: usize) {
        while self.stack.len() > depth {
            let Some(node) = self.stack.pop() else {
                break;
            };
            let target = self.freeze(node);
            if let Some(parent) = self.stack.last_mut() {
                if let Some(pending) = parent.pending.take() {
                    parent.arcs.push(Arc {
                        label: pending.label,
                        output: pending.output,
                        target,
                    });
                }
            }
        }
    }

    fn freeze(&mut self, node: UnfinishedState) -> StateId {
        debug_assert!(node.pending.is_none());
        let state = State {
            final_output: node.final_output,
            arcs: node.arcs,
        };
        if let Some(&id) = self.registry.get(&state) {
            return id;
        }
        let id = StateId(self.states.len() as u32);
        self.states.push(state.clone());
        self.registry.insert(state, id);
        id
    }
}
