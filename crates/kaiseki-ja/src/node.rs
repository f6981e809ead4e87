// Lattice nodes.

use serde::{Deserialize, Serialize};

/// Where a lattice node came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeType {
    Known,
    Unknown,
    User,
    /// One character of an unknown word split up in extended mode.
    Inserted,
    Bos,
    Eos,
}

/// A word candidate spanning `start..start + length` (in characters).
///
/// `word_id` indexes the table matching `node_type`: the known token info
/// buffer, the unknown one (also for inserted nodes), or the user
/// dictionary's segment list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViterbiNode {
    pub word_id: u32,
    pub start: usize,
    pub length: usize,
    pub left_id: u16,
    pub right_id: u16,
    pub word_cost: i32,
    pub node_type: NodeType,
}

impl ViterbiNode {
    pub fn new(
        node_type: NodeType,
        word_id: u32,
        start: usize,
        length: usize,
        (left_id, right_id, word_cost): (u16, u16, i32),
    ) -> Self {
        Self {
            word_id,
            start,
            length,
            left_id,
            right_id,
            word_cost,
            node_type,
        }
    }

    /// Sentence boundary node. BOS and EOS both use connection id 0.
    pub fn boundary(node_type: NodeType, position: usize) -> Self {
        Self::new(node_type, u32::MAX, position, 0, (0, 0, 0))
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn is_boundary(&self) -> bool {
        matches!(self.node_type, NodeType::Bos | NodeType::Eos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_arithmetic() {
        let node = ViterbiNode::new(NodeType::Known, 3, 4, 2, (1, 2, -10));
        assert_eq!(node.end(), 6);
        assert!(!node.is_boundary());
        assert!(ViterbiNode::boundary(NodeType::Eos, 6).is_boundary());
    }

    #[test]
    fn node_type_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&NodeType::User).unwrap(), "\"USER\"");
        assert_eq!(
            serde_json::from_str::<NodeType>("\"INSERTED\"").unwrap(),
            NodeType::Inserted
        );
    }
}
