// Serialization of a frozen state graph into the compiled byte format.

use crate::format::{self, ArcRecord, MARKER_ACCEPT, MARKER_PLAIN};
use crate::state::StateGraph;

/// Serializes a [`StateGraph`] into bytes loadable by [`crate::fst::Fst`].
pub struct Compiler;

impl Compiler {
    /// Write every state back to front: the arena order already places each
    /// target before the states pointing at it, so all deltas are positive.
    pub fn compile(graph: &StateGraph) -> Vec<u8> {
        let approx = format::HEADER_SIZE
            + graph.state_count() * 9
            + graph.arc_count() * format::ARC_RECORD_SIZE
            + format::FOOTER_SIZE;
        let mut buf = Vec::with_capacity(approx);
        format::write_header(&mut buf);

        let mut addresses: Vec<u32> = Vec::with_capacity(graph.state_count());
        for state in graph.states() {
            let start = buf.len() as u32;
            addresses.push(start);

            match state.final_output {
                Some(final_output) => {
                    buf.push(MARKER_ACCEPT);
                    buf.extend_from_slice(&final_output.to_le_bytes());
                }
                None => buf.push(MARKER_PLAIN),
            }
            buf.extend_from_slice(&(state.arcs.len() as u32).to_le_bytes());
            for arc in &state.arcs {
                let target = addresses[arc.target.index()];
                let record = ArcRecord::new(arc.label, arc.output, start - target);
                buf.extend_from_slice(bytemuck::bytes_of(&record));
            }
        }

        let root = addresses[graph.root().index()];
        buf.extend_from_slice(&root.to_le_bytes());
        buf
    }
}
