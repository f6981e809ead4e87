// Read-only runtime view of a compiled transducer.

use hashbrown::HashMap;

use crate::format::{self, ARC_RECORD_SIZE, ArcRecord, FOOTER_SIZE, HEADER_SIZE, MARKER_ACCEPT, MARKER_PLAIN};
use crate::FstError;
use crate::compiler::Compiler;
use crate::state::StateGraph;

/// Result of a full-string [`Fst::lookup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The whole input is accepted with this output.
    Matched(u32),
    /// The input is a strict prefix of some accepted string.
    Prefix,
    /// Traversal dead-ended.
    NoMatch,
}

impl Lookup {
    /// Integer convention: output + 1 on a match, 0 for prefix-only, -1 for
    /// no match.
    pub fn as_sentinel(self) -> i64 {
        match self {
            Lookup::Matched(output) => i64::from(output) + 1,
            Lookup::Prefix => 0,
            Lookup::NoMatch => -1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct StateView {
    final_output: Option<u32>,
    arcs_start: usize,
    arc_count: usize,
}

impl StateView {
    fn end(&self) -> usize {
        self.arcs_start + self.arc_count * ARC_RECORD_SIZE
    }
}

/// A compiled, immutable transducer.
///
/// The buffer is validated once in [`Fst::from_bytes`]; lookups afterwards
/// index it directly.
#[derive(Clone)]
pub struct Fst {
    data: Vec<u8>,
    root: usize,
}

impl std::fmt::Debug for Fst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fst")
            .field("byte_len", &self.data.len())
            .field("root", &self.root)
            .finish()
    }
}

impl Fst {
    /// Load and structurally validate a compiled buffer.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, FstError> {
        let root = format::parse_frame(&data)?;
        validate(&data, root)?;
        Ok(Self { data, root })
    }

    /// Compile a state graph and load the result.
    pub fn from_graph(graph: &StateGraph) -> Result<Self, FstError> {
        Self::from_bytes(Compiler::compile(graph))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// A fresh cursor positioned at the root state.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor {
            fst: self,
            addr: self.root,
            output: 0,
        }
    }

    /// Full-string lookup distinguishing a prefix-only walk from a dead end.
    pub fn lookup(&self, input: &str) -> Lookup {
        let mut cursor = self.cursor();
        for unit in input.encode_utf16() {
            if !cursor.step(unit) {
                return Lookup::NoMatch;
            }
        }
        match cursor.accepted() {
            Some(output) => Lookup::Matched(output),
            None if cursor.has_arcs() => Lookup::Prefix,
            None => Lookup::NoMatch,
        }
    }

    /// Output of the longest accepted prefix of `input`, with its length in
    /// UTF-16 code units.
    pub fn longest_match(&self, input: &str) -> Option<(usize, u32)> {
        let mut cursor = self.cursor();
        let mut best = cursor.accepted().map(|output| (0, output));
        for (i, unit) in input.encode_utf16().enumerate() {
            if !cursor.step(unit) {
                break;
            }
            if let Some(output) = cursor.accepted() {
                best = Some((i + 1, output));
            }
        }
        best
    }

    /// Every accepted prefix of `input` as `(length in code units, output)`,
    /// shortest first.
    pub fn prefix_matches(&self, input: &str) -> Vec<(usize, u32)> {
        let mut matches = Vec::new();
        let mut cursor = self.cursor();
        if let Some(output) = cursor.accepted() {
            matches.push((0, output));
        }
        for (i, unit) in input.encode_utf16().enumerate() {
            if !cursor.step(unit) {
                break;
            }
            if let Some(output) = cursor.accepted() {
                matches.push((i + 1, output));
            }
        }
        matches
    }

    fn state(&self, addr: usize) -> StateView {
        read_state(&self.data, addr)
    }
}

/// Step-wise walker over an [`Fst`].
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    fst: &'a Fst,
    addr: usize,
    output: u32,
}

impl Cursor<'_> {
    /// Follow the arc labelled `label`. Returns `false` (and leaves the
    /// cursor unchanged) when there is none.
    pub fn step(&mut self, label: u16) -> bool {
        let view = self.fst.state(self.addr);
        let data = &self.fst.data;
        let (mut lo, mut hi) = (0usize, view.arc_count);
        while lo < hi {
            let mid = (lo + hi) / 2;
            let record = ArcRecord::read(&data[view.arcs_start + mid * ARC_RECORD_SIZE..]);
            match record.label.cmp(&label) {
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
                std::cmp::Ordering::Equal => {
                    // `validate` bounds every walk's output by u32::MAX
                    self.output += record.output;
                    self.addr -= record.delta as usize;
                    return true;
                }
            }
        }
        false
    }

    /// Accumulated output if the current state accepts.
    pub fn accepted(&self) -> Option<u32> {
        self.fst
            .state(self.addr)
            .final_output
            .map(|final_output| self.output + final_output)
    }

    pub fn has_arcs(&self) -> bool {
        self.fst.state(self.addr).arc_count > 0
    }
}

/// Parse a state record. Callers guarantee `addr` was validated.
fn read_state(data: &[u8], addr: usize) -> StateView {
    let (final_output, count_at) = if data[addr] == MARKER_ACCEPT {
        (Some(format::read_u32(data, addr + 1)), addr + 5)
    } else {
        (None, addr + 1)
    };
    StateView {
        final_output,
        arcs_start: count_at + 4,
        arc_count: format::read_u32(data, count_at) as usize,
    }
}

/// Bounds-checked variant of `read_state` used during validation.
fn checked_state(data: &[u8], addr: usize, limit: usize) -> Result<StateView, FstError> {
    let malformed = |what: &str| FstError::Malformed(format!("state at {addr}: {what}"));
    if addr < HEADER_SIZE || addr >= limit {
        return Err(malformed("address out of range"));
    }
    let count_at = match data[addr] {
        MARKER_ACCEPT => addr + 5,
        MARKER_PLAIN => addr + 1,
        other => return Err(malformed(&format!("unknown marker {other:#04x}"))),
    };
    if count_at + 4 > limit {
        return Err(malformed("truncated header"));
    }
    let view = read_state(data, addr);
    let arcs_len = view
        .arc_count
        .checked_mul(ARC_RECORD_SIZE)
        .ok_or_else(|| malformed("arc count overflow"))?;
    if view.arcs_start + arcs_len > limit {
        return Err(malformed("arc list past end of buffer"));
    }
    Ok(view)
}

/// Walk every state reachable from the root, checking record bounds, arc
/// order and that each target record ends before the state that points at it.
fn validate(data: &[u8], root: usize) -> Result<(), FstError> {
    let limit = data.len() - FOOTER_SIZE;
    let mut ends: HashMap<usize, usize> = HashMap::new();
    let mut edges: Vec<(usize, usize)> = Vec::new();
    let mut stack = vec![root];

    while let Some(addr) = stack.pop() {
        if ends.contains_key(&addr) {
            continue;
        }
        let view = checked_state(data, addr, limit)?;
        ends.insert(addr, view.end());

        let mut previous_label: Option<u16> = None;
        for i in 0..view.arc_count {
            let record = ArcRecord::read(&data[view.arcs_start + i * ARC_RECORD_SIZE..]);
            if previous_label.is_some_and(|p| p >= record.label) {
                return Err(FstError::Malformed(format!(
                    "state at {addr}: arc labels not strictly ascending"
                )));
            }
            previous_label = Some(record.label);
            let delta = record.delta as usize;
            if delta == 0 || delta > addr - HEADER_SIZE {
                return Err(FstError::Malformed(format!(
                    "state at {addr}: invalid arc delta {delta}"
                )));
            }
            let target = addr - delta;
            edges.push((addr, target));
            stack.push(target);
        }
    }

    for (from, target) in edges {
        if ends[&target] > from {
            return Err(FstError::Malformed(format!(
                "state at {target} overlaps state at {from}"
            )));
        }
    }
    check_output_bound(data, &ends)
}

/// Reject buffers where some walk accumulates more output than a u32 holds.
///
/// Targets sit at lower addresses than their sources, so ascending address
/// order visits every target first.
fn check_output_bound(data: &[u8], states: &HashMap<usize, usize>) -> Result<(), FstError> {
    let mut order: Vec<usize> = states.keys().copied().collect();
    order.sort_unstable();
    let mut largest: HashMap<usize, u64> = HashMap::with_capacity(order.len());
    for addr in order {
        let view = read_state(data, addr);
        let mut best = u64::from(view.final_output.unwrap_or(0));
        for i in 0..view.arc_count {
            let record = ArcRecord::read(&data[view.arcs_start + i * ARC_RECORD_SIZE..]);
            let below = largest.get(&(addr - record.delta as usize)).copied().unwrap_or(0);
            best = best.max(u64::from(record.output) + below);
        }
        if best > u64::from(u32::MAX) {
            return Err(FstError::Malformed(format!(
                "state at {addr}: accumulated output overflows u32"
            )));
        }
        largest.insert(addr, best);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;

    fn fst_of(pairs: &[(&str, u32)]) -> Fst {
        Fst::from_graph(&Builder::build(pairs.iter().copied()).unwrap()).unwrap()
    }

    #[test]
    fn lookup_full_prefix_and_miss() {
        let fst = fst_of(&[("brats", 1)]);
        assert_eq!(fst.lookup("brats"), Lookup::Matched(1));
        assert_eq!(fst.lookup("brat"), Lookup::Prefix);
        assert_eq!(fst.lookup("bratz"), Lookup::NoMatch);
        assert_eq!(fst.lookup("bratsy"), Lookup::NoMatch);
        assert_eq!(fst.lookup("brat").as_sentinel(), 0);
        assert_eq!(fst.lookup("x").as_sentinel(), -1);
    }

    #[test]
    fn longest_match_returns_longest_accepted_prefix() {
        let fst = fst_of(&[("東", 1), ("東京", 2), ("東京都庁", 3)]);
        assert_eq!(fst.longest_match("東京都"), Some((2, 2)));
        assert_eq!(fst.longest_match("東京都庁前"), Some((4, 3)));
        assert_eq!(fst.longest_match("西"), None);
    }

    #[test]
    fn prefix_matches_lists_every_accepting_prefix() {
        let fst = fst_of(&[("す", 10), ("すも", 20), ("すもも", 30)]);
        assert_eq!(
            fst.prefix_matches("すもももももも"),
            vec![(1, 10), (2, 20), (3, 30)]
        );
        assert!(fst.prefix_matches("もも").is_empty());
    }

    #[test]
    fn cursor_steps_over_surrogate_pairs() {
        let fst = fst_of(&[("\u{20B9F}る", 5)]);
        let mut cursor = fst.cursor();
        let mut units = [0u16; 2];
        for &unit in '\u{20B9F}'.encode_utf16(&mut units).iter() {
            assert!(cursor.step(unit));
            assert_eq!(cursor.accepted(), None);
        }
        assert!(cursor.step('る' as u16));
        assert_eq!(cursor.accepted(), Some(5));
    }

    #[test]
    fn failed_step_leaves_cursor_in_place() {
        let fst = fst_of(&[("ab", 3)]);
        let mut cursor = fst.cursor();
        assert!(cursor.step('a' as u16));
        assert!(!cursor.step('x' as u16));
        assert!(cursor.step('b' as u16));
        assert_eq!(cursor.accepted(), Some(3));
    }

    #[test]
    fn empty_fst_matches_nothing() {
        let fst = Fst::from_graph(&Builder::new().finish()).unwrap();
        assert_eq!(fst.lookup(""), Lookup::NoMatch);
        assert_eq!(fst.lookup("a"), Lookup::NoMatch);
    }

    #[test]
    fn rejects_corrupted_delta() {
        let graph = Builder::build([("ab", 1)]).unwrap();
        let mut bytes = Compiler::compile(&graph);
        // Root record: marker(1) + count(4) + arc(label 2, reserved 2, output 4, delta 4)
        let root = format::read_u32(&bytes, bytes.len() - FOOTER_SIZE) as usize;
        let delta_at = root + 1 + 4 + 8;
        bytes[delta_at..delta_at + 4].copy_from_slice(&0u32.to_le_bytes());
        assert!(matches!(Fst::from_bytes(bytes), Err(FstError::Malformed(_))));
    }

    #[test]
    fn rejects_outputs_that_overflow() {
        let graph = Builder::build([("ab", 1), ("ac", 5)]).unwrap();
        let bytes = Compiler::compile(&graph);
        // Root record: marker(1) + count(4) + arc(label 2, reserved 2, output 4, delta 4)
        let root = format::read_u32(&bytes, bytes.len() - FOOTER_SIZE) as usize;
        let output_at = root + 1 + 4 + 4;
        let first = format::read_u32(&bytes, output_at);
        let with_first_output = |output: u32| {
            let mut patched = bytes.clone();
            patched[output_at..output_at + 4].copy_from_slice(&output.to_le_bytes());
            patched
        };

        let fst = Fst::from_bytes(with_first_output(first + (u32::MAX - 5))).unwrap();
        assert_eq!(fst.lookup("ac"), Lookup::Matched(u32::MAX));
        assert!(matches!(
            Fst::from_bytes(with_first_output(first + (u32::MAX - 4))),
            Err(FstError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_unknown_marker() {
        let graph = Builder::build([("a", 1)]).unwrap();
        let mut bytes = Compiler::compile(&graph);
        bytes[HEADER_SIZE] = 7;
        assert!(matches!(Fst::from_bytes(bytes), Err(FstError::Malformed(_))));
    }

    #[test]
    fn rejects_truncated_buffer() {
        let graph = Builder::build([("abc", 1), ("abd", 2)]).unwrap();
        let bytes = Compiler::compile(&graph);
        let mut truncated = bytes[..bytes.len() - 9].to_vec();
        truncated.extend_from_slice(&bytes[bytes.len() - FOOTER_SIZE..]);
        assert!(Fst::from_bytes(truncated).is_err());
    }
}
