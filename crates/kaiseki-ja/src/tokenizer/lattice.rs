// Word lattice and the forward Viterbi pass.

use crate::config::TokenizerConfig;
use crate::connection::ConnectionCosts;
use crate::dictionary::Dictionary;
use crate::node::{NodeType, ViterbiNode};
use crate::user::UserDictionary;

pub(crate) const UNREACHABLE: i64 = i64::MAX;

pub(crate) const BOS: u32 = 0;

/// Candidate nodes of one input, indexed by start and end position.
///
/// Nodes live in one arena; `starts[p]` and `ends[p]` list their indices in
/// registration order. Node weights (word cost plus length penalty) and the
/// forward search state are kept in parallel arrays.
#[derive(Debug)]
pub(crate) struct Lattice {
    nodes: Vec<ViterbiNode>,
    weights: Vec<i64>,
    starts: Vec<Vec<u32>>,
    ends: Vec<Vec<u32>>,
    costs: Vec<i64>,
    back: Vec<u32>,
    eos: u32,
    len: usize,
}

impl Lattice {
    /// Register every candidate of `text`.
    ///
    /// Only positions some node ends at are expanded. A user entry matching
    /// at a position claims its whole span: its segment nodes are the only
    /// candidates starting inside it, whatever their cost. Elsewhere known
    /// words come first, then unknown words (only when no known word
    /// matched, unless the character category invokes them).
    pub(crate) fn build(
        dictionary: &Dictionary,
        user: Option<&UserDictionary>,
        config: &TokenizerConfig,
        text: &[char],
    ) -> Self {
        let len = text.len();
        let mut lattice = Self {
            nodes: Vec::new(),
            weights: Vec::new(),
            starts: vec![Vec::new(); len + 1],
            ends: vec![Vec::new(); len + 1],
            costs: Vec::new(),
            back: Vec::new(),
            eos: 0,
            len,
        };
        lattice.add(ViterbiNode::boundary(NodeType::Bos, 0), 0);

        let mut claimed = 0;
        for position in 0..len {
            if position < claimed || lattice.ends[position].is_empty() {
                continue;
            }
            if let Some(user) = user {
                let nodes = user.lookup(text, position);
                if let Some(end) = nodes.iter().map(ViterbiNode::end).max() {
                    claimed = end;
                    for node in nodes {
                        let weight = node_weight(config, text, &node);
                        lattice.add(node, weight);
                    }
                    continue;
                }
            }
            let mut found = false;
            for node in dictionary.lookup_known(text, position) {
                found = true;
                let weight = node_weight(config, text, &node);
                lattice.add(node, weight);
            }
            for node in dictionary.lookup_unknown(text, position, found) {
                let weight = node_weight(config, text, &node);
                lattice.add(node, weight);
            }
        }

        lattice.eos = lattice.add(ViterbiNode::boundary(NodeType::Eos, len), 0);
        lattice
    }

    fn add(&mut self, node: ViterbiNode, weight: i64) -> u32 {
        let id = self.nodes.len() as u32;
        // BOS is the only node ending where it starts; EOS is only a sink.
        match node.node_type {
            NodeType::Bos => self.ends[node.end()].push(id),
            NodeType::Eos => self.starts[node.start].push(id),
            _ => {
                self.starts[node.start].push(id);
                self.ends[node.end()].push(id);
            }
        }
        self.nodes.push(node);
        self.weights.push(weight);
        self.costs.push(UNREACHABLE);
        self.back.push(BOS);
        id
    }

    /// Fill in the cheapest cost from BOS to every node.
    ///
    /// Ties keep the left node registered first.
    pub(crate) fn forward(&mut self, costs: &ConnectionCosts) {
        self.costs[BOS as usize] = 0;
        for position in 0..=self.len {
            for k in 0..self.starts[position].len() {
                let id = self.starts[position][k];
                let (best, best_left) = self.best_left(costs, position, id);
                self.costs[id as usize] = best;
                self.back[id as usize] = best_left;
            }
        }
    }

    fn best_left(&self, costs: &ConnectionCosts, position: usize, id: u32) -> (i64, u32) {
        let left_id = self.nodes[id as usize].left_id;
        let mut best = UNREACHABLE;
        let mut best_left = BOS;
        for &left in &self.ends[position] {
            let left_cost = self.costs[left as usize];
            if left_cost == UNREACHABLE {
                continue;
            }
            let cost = left_cost
                + costs.cost(self.nodes[left as usize].right_id, left_id)
                + self.weights[id as usize];
            if cost < best {
                best = cost;
                best_left = left;
            }
        }
        (best, best_left)
    }

    /// Node ids of the cheapest path, BOS and EOS excluded.
    pub(crate) fn best_path(&self) -> Vec<u32> {
        let mut path = Vec::new();
        if self.costs[self.eos as usize] == UNREACHABLE {
            return path;
        }
        let mut id = self.back[self.eos as usize];
        while id != BOS {
            path.push(id);
            id = self.back[id as usize];
        }
        path.reverse();
        path
    }

    pub(crate) fn node(&self, id: u32) -> &ViterbiNode {
        &self.nodes[id as usize]
    }

    pub(crate) fn nodes(&self) -> &[ViterbiNode] {
        &self.nodes
    }

    pub(crate) fn weight(&self, id: u32) -> i64 {
        self.weights[id as usize]
    }

    pub(crate) fn cost(&self, id: u32) -> i64 {
        self.costs[id as usize]
    }

    pub(crate) fn ending_at(&self, position: usize) -> &[u32] {
        &self.ends[position]
    }

    pub(crate) fn eos(&self) -> u32 {
        self.eos
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Total cost of the cheapest path.
    pub(crate) fn best_cost(&self) -> Option<i64> {
        let cost = self.costs[self.eos as usize];
        (cost != UNREACHABLE).then_some(cost)
    }

    /// Cost of every BOS-to-EOS path, ascending. Exponential; tests only.
    #[cfg(test)]
    pub(crate) fn all_path_costs(&self, costs: &ConnectionCosts) -> Vec<i64> {
        fn walk(lattice: &Lattice, costs: &ConnectionCosts, id: u32, suffix: i64, out: &mut Vec<i64>) {
            let node = lattice.node(id);
            if node.node_type == NodeType::Bos {
                out.push(suffix);
                return;
            }
            let suffix = suffix + lattice.weight(id);
            for &left in lattice.ending_at(node.start) {
                let connection = costs.cost(lattice.node(left).right_id, node.left_id);
                walk(lattice, costs, left, suffix + connection, out);
            }
        }
        let mut out = Vec::new();
        walk(self, costs, self.eos, 0, &mut out);
        out.sort_unstable();
        out
    }
}

fn node_weight(config: &TokenizerConfig, text: &[char], node: &ViterbiNode) -> i64 {
    i64::from(node.word_cost) + config.length_penalty(&text[node.start..node.end()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use crate::test_util::{chars, fixture_dictionary};

    fn best_surfaces(dict: &Dictionary, config: &TokenizerConfig, input: &str) -> Vec<String> {
        best_surfaces_with(dict, None, config, input)
    }

    fn best_surfaces_with(
        dict: &Dictionary,
        user: Option<&UserDictionary>,
        config: &TokenizerConfig,
        input: &str,
    ) -> Vec<String> {
        let text = chars(input);
        let mut lattice = Lattice::build(dict, user, config, &text);
        lattice.forward(dict.connection_costs());
        lattice
            .best_path()
            .into_iter()
            .map(|id| {
                let n = lattice.node(id);
                text[n.start..n.end()].iter().collect()
            })
            .collect()
    }

    #[test]
    fn picks_cheapest_segmentation() {
        let dict = fixture_dictionary();
        let config = TokenizerConfig::default();
        assert_eq!(
            best_surfaces(&dict, &config, "すもももももももものうち"),
            ["すもも", "もも", "もも", "もも", "の", "うち"]
        );
    }

    #[test]
    fn search_mode_splits_long_kanji_words() {
        let dict = fixture_dictionary();
        let normal = TokenizerConfig::default();
        let search = TokenizerConfig::default().with_mode(Mode::Search);
        assert_eq!(best_surfaces(&dict, &normal, "関西国際空港"), ["関西国際空港"]);
        assert_eq!(best_surfaces(&dict, &search, "関西国際空港"), ["関西", "国際", "空港"]);
    }

    #[test]
    fn best_cost_matches_path() {
        let dict = fixture_dictionary();
        let text = chars("すもももももももものうち");
        let mut lattice = Lattice::build(&dict, None, &TokenizerConfig::default(), &text);
        lattice.forward(dict.connection_costs());
        assert_eq!(lattice.best_cost(), Some(520));
        let sum: i64 = lattice.best_path().iter().map(|&id| lattice.weight(id)).sum();
        assert_eq!(sum, 520);
    }

    #[test]
    fn empty_input_links_bos_to_eos() {
        let dict = fixture_dictionary();
        let mut lattice = Lattice::build(&dict, None, &TokenizerConfig::default(), &[]);
        lattice.forward(dict.connection_costs());
        assert!(lattice.best_path().is_empty());
        assert_eq!(lattice.best_cost(), Some(0));
    }

    #[test]
    fn unknown_characters_are_covered() {
        let dict = fixture_dictionary();
        let text = chars("東京でﾃｽﾄ☃");
        let mut lattice = Lattice::build(&dict, None, &TokenizerConfig::default(), &text);
        lattice.forward(dict.connection_costs());
        let path = lattice.best_path();
        let mut position = 0;
        for id in path {
            assert_eq!(lattice.node(id).start, position);
            position = lattice.node(id).end();
        }
        assert_eq!(position, text.len());
    }

    #[test]
    fn connection_cost_reads_left_right_then_right_left() {
        // お|茶 costs 1000 + cost(PREFIX, NOUN) + 1000 = 1000, under お茶 at
        // 1500. Looking the matrix up the other way round gives 3000.
        let dict = fixture_dictionary();
        let config = TokenizerConfig::default();
        assert_eq!(best_surfaces(&dict, &config, "お茶"), ["お", "茶"]);

        let text = chars("お茶");
        let mut lattice = Lattice::build(&dict, None, &config, &text);
        lattice.forward(dict.connection_costs());
        assert_eq!(lattice.best_cost(), Some(1000));
    }

    #[test]
    fn user_entry_claims_its_span_at_any_cost() {
        let dict = fixture_dictionary();
        let config = TokenizerConfig::default();
        let user = UserDictionary::parse("東京,東京,トーキョー,カスタム名詞")
            .unwrap()
            .with_connection_ids(1, 1)
            .with_word_cost(5000);

        let text = chars("東京都");
        let mut lattice = Lattice::build(&dict, Some(&user), &config, &text);
        lattice.forward(dict.connection_costs());
        let types: Vec<NodeType> = lattice
            .best_path()
            .iter()
            .map(|&id| lattice.node(id).node_type)
            .collect();
        assert_eq!(types, [NodeType::User, NodeType::Known]);
        assert_eq!(lattice.best_cost(), Some(5300));
        assert_eq!(best_surfaces_with(&dict, Some(&user), &config, "東京都"), ["東京", "都"]);
    }

    #[test]
    fn user_segments_are_forced() {
        let dict = fixture_dictionary();
        let config = TokenizerConfig::default();
        let user = UserDictionary::parse("関西国際空港,関西国 際空港,カンサイコク サイクウコウ,カスタム名詞")
            .unwrap()
            .with_connection_ids(1, 1)
            .with_word_cost(2000);
        assert_eq!(
            best_surfaces_with(&dict, Some(&user), &config, "関西国際空港に"),
            ["関西国", "際空港", "に"]
        );
    }
}
