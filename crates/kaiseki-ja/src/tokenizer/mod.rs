// Tokenizer entry points.

mod lattice;
mod nbest;

use std::sync::Arc;

use log::debug;

use crate::config::{Mode, TokenizerConfig};
use crate::dictionary::Dictionary;
use crate::node::{NodeType, ViterbiNode};
use crate::token::{Token, TokenSequence};
use crate::user::UserDictionary;
use crate::UserDictionaryError;

use lattice::Lattice;

/// Segments text into words.
///
/// A tokenizer holds no per-call state, so one instance serves any number of
/// threads. Several tokenizers with different options can share one
/// dictionary.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    dictionary: Arc<Dictionary>,
    user: Option<UserDictionary>,
    config: TokenizerConfig,
}

impl Tokenizer {
    pub fn new(dictionary: Arc<Dictionary>, config: TokenizerConfig) -> Self {
        Self {
            dictionary,
            user: None,
            config,
        }
    }

    /// Attach a user dictionary. Its connection ids must address the
    /// dictionary's cost matrix.
    pub fn with_user_dictionary(mut self, user: UserDictionary) -> Result<Self, UserDictionaryError> {
        let (left, right) = user.connection_ids();
        let costs = self.dictionary.connection_costs();
        if usize::from(right) >= costs.forward_size() || usize::from(left) >= costs.backward_size() {
            return Err(UserDictionaryError::ConnectionIdOutOfRange {
                left,
                right,
                forward: costs.forward_size(),
                backward: costs.backward_size(),
            });
        }
        debug!("attached user dictionary with {} entries", user.len());
        self.user = Some(user);
        Ok(self)
    }

    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dictionary
    }

    pub fn user_dictionary(&self) -> Option<&UserDictionary> {
        self.user.as_ref()
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// The cheapest segmentation of `text`.
    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        let input = Input::new(text);
        let lattice = self.lattice(&input.chars);
        let tokens = self.tokens(&lattice, &input, &lattice.best_path());
        debug!(
            "tokenized {} chars into {} tokens ({} lattice nodes, mode {}, cost {:?})",
            input.chars.len(),
            tokens.len(),
            lattice.nodes().len(),
            self.config.mode,
            lattice.best_cost()
        );
        tokens
    }

    /// Up to `max_count` segmentations costing at most the best one plus
    /// `cost_slack`, cheapest first. Equal costs keep a stable order.
    pub fn multi_tokenize(&self, text: &str, max_count: usize, cost_slack: i64) -> Vec<TokenSequence> {
        let input = Input::new(text);
        let lattice = self.lattice(&input.chars);
        let result = nbest::search(&lattice, self.dictionary.connection_costs(), max_count, cost_slack);
        debug!(
            "multi-tokenized {} chars into {} sequences (max {max_count}, slack {cost_slack})",
            input.chars.len(),
            result.len()
        );
        result
            .into_paths()
            .into_iter()
            .map(|path| TokenSequence {
                tokens: self.tokens(&lattice, &input, &path.tokens),
                cost: path.cost,
            })
            .collect()
    }

    /// The `n` cheapest segmentations.
    pub fn multi_tokenize_nbest(&self, text: &str, n: usize) -> Vec<TokenSequence> {
        self.multi_tokenize(text, n, i64::MAX)
    }

    /// Every segmentation costing at most the best one plus `cost_slack`.
    pub fn multi_tokenize_by_slack(&self, text: &str, cost_slack: i64) -> Vec<TokenSequence> {
        self.multi_tokenize(text, usize::MAX, cost_slack)
    }

    fn lattice(&self, text: &[char]) -> Lattice {
        let mut lattice = Lattice::build(&self.dictionary, self.user.as_ref(), &self.config, text);
        lattice.forward(self.dictionary.connection_costs());
        lattice
    }

    fn tokens(&self, lattice: &Lattice, input: &Input, path: &[u32]) -> Vec<Token> {
        let mut tokens = Vec::with_capacity(path.len());
        for &id in path {
            let node = lattice.node(id);
            if self.config.mode == Mode::Extended && node.node_type == NodeType::Unknown {
                for position in node.start..node.end() {
                    let inserted = ViterbiNode::new(
                        NodeType::Inserted,
                        node.word_id,
                        position,
                        1,
                        (node.left_id, node.right_id, 0),
                    );
                    tokens.push(self.token(input, &inserted));
                }
            } else {
                tokens.push(self.token(input, node));
            }
        }
        tokens
    }

    fn token(&self, input: &Input, node: &ViterbiNode) -> Token {
        let features = match (node.node_type, &self.user) {
            (NodeType::User, Some(user)) => user.features(node.word_id),
            _ => self.dictionary.features(node),
        };
        let bytes = input.offsets[node.start]..input.offsets[node.end()];
        Token::new(
            input.text[bytes.clone()].to_string(),
            node.start,
            bytes,
            node.node_type,
            node.word_id,
            node.word_cost,
            features,
        )
    }
}

/// Input text with its characters and their byte offsets.
struct Input<'a> {
    text: &'a str,
    chars: Vec<char>,
    /// `offsets[i]` is the byte offset of character `i`; one extra entry
    /// holds the text length.
    offsets: Vec<usize>,
}

impl<'a> Input<'a> {
    fn new(text: &'a str) -> Self {
        let mut chars = Vec::with_capacity(text.len());
        let mut offsets = Vec::with_capacity(text.len() + 1);
        for (offset, c) in text.char_indices() {
            chars.push(c);
            offsets.push(offset);
        }
        offsets.push(text.len());
        Self { text, chars, offsets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::fixture_arc;

    fn tokenizer(mode: Mode) -> Tokenizer {
        Tokenizer::new(fixture_arc(), TokenizerConfig::default().with_mode(mode))
    }

    fn surfaces(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(Token::surface).collect()
    }

    #[test]
    fn normal_mode_keeps_compounds() {
        let t = tokenizer(Mode::Normal);
        assert_eq!(surfaces(&t.tokenize("東京都")), ["東京都"]);
        assert_eq!(surfaces(&t.tokenize("関西国際空港")), ["関西国際空港"]);
    }

    #[test]
    fn search_mode_splits_compounds() {
        let t = tokenizer(Mode::Search);
        assert_eq!(surfaces(&t.tokenize("東京都")), ["東京", "都"]);
        assert_eq!(surfaces(&t.tokenize("関西国際空港")), ["関西", "国際", "空港"]);
    }

    #[test]
    fn extended_mode_splits_unknown_words() {
        let normal = tokenizer(Mode::Normal).tokenize("テスト");
        assert_eq!(surfaces(&normal), ["テスト"]);
        assert_eq!(normal[0].node_type(), NodeType::Unknown);

        let extended = tokenizer(Mode::Extended).tokenize("テスト");
        assert_eq!(surfaces(&extended), ["テ", "ス", "ト"]);
        assert!(extended.iter().all(|t| t.node_type() == NodeType::Inserted));
        assert_eq!(extended[1].position(), 1);
        assert_eq!(extended[1].part_of_speech(), "名詞,一般,*,*");
    }

    #[test]
    fn positions_and_byte_ranges() {
        let tokens = tokenizer(Mode::Normal).tokenize("すもももももももものうち");
        assert_eq!(surfaces(&tokens), ["すもも", "もも", "もも", "もも", "の", "うち"]);
        assert_eq!(tokens[1].position(), 3);
        assert_eq!(tokens[1].byte_range(), 9..15);
        assert_eq!(tokens[4].part_of_speech(), "助詞,連体化,*,*");
        assert_eq!(tokens[5].reading(), "ウチ");
    }

    #[test]
    fn empty_text() {
        assert!(tokenizer(Mode::Normal).tokenize("").is_empty());
    }

    #[test]
    fn user_words_win() {
        let user = UserDictionary::parse("東京都,東京 都,トウキョウ ト,カスタム名詞")
            .unwrap()
            .with_connection_ids(1, 1);
        let t = tokenizer(Mode::Normal).with_user_dictionary(user).unwrap();
        let tokens = t.tokenize("東京都に");
        assert_eq!(surfaces(&tokens), ["東京", "都", "に"]);
        assert!(tokens[0].is_user());
        assert_eq!(tokens[0].part_of_speech(), "カスタム名詞,*,*,*");
        assert_eq!(tokens[1].reading(), "ト");
        assert!(tokens[2].is_known());
    }

    #[test]
    fn rejects_user_connection_ids_outside_matrix() {
        let user = UserDictionary::parse("東京,東京,トウキョウ,名詞").unwrap();
        let err = tokenizer(Mode::Normal).with_user_dictionary(user).unwrap_err();
        assert!(matches!(
            err,
            UserDictionaryError::ConnectionIdOutOfRange { left: 5, right: 5, forward: 4, backward: 4 }
        ));
    }

    #[test]
    fn multi_tokenize_ranks_segmentations() {
        let sequences = tokenizer(Mode::Normal).multi_tokenize("東京都", 3, 1000);
        let costs: Vec<i64> = sequences.iter().map(|s| s.cost).collect();
        assert_eq!(costs, vec![250, 400, 600]);
        assert_eq!(sequences[1].surfaces(), ["東京", "都"]);
    }

    #[test]
    fn user_words_win_at_positive_cost() {
        let user = UserDictionary::parse("東京,東京,トーキョー,カスタム名詞")
            .unwrap()
            .with_connection_ids(1, 1)
            .with_word_cost(5000);
        let t = tokenizer(Mode::Normal).with_user_dictionary(user).unwrap();
        let tokens = t.tokenize("東京");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].node_type(), NodeType::User);
        assert_eq!(surfaces(&t.tokenize("東京都")), ["東京", "都"]);
        for sequence in t.multi_tokenize_nbest("東京都", 10) {
            assert!(sequence.tokens[0].is_user(), "{:?}", sequence.surfaces());
        }
    }

    #[test]
    fn slack_keeps_every_path_within_bound() {
        let t = tokenizer(Mode::Normal);
        let text = "東京都に京都に東京";
        let chars: Vec<char> = text.chars().collect();
        let mut expected = t.lattice(&chars).all_path_costs(t.dictionary.connection_costs());
        let best = expected[0];
        expected.retain(|&cost| cost <= best + 500);

        let sequences = t.multi_tokenize_by_slack(text, 500);
        let costs: Vec<i64> = sequences.iter().map(|s| s.cost).collect();
        assert_eq!(costs, expected);
        assert!(costs.windows(2).all(|w| w[0] <= w[1]));
        assert!(costs.iter().all(|&cost| cost <= best + 500));
        assert_eq!(sequences[0].tokens, t.tokenize(text));
    }

    #[test]
    fn nbest_and_slack_variants() {
        let t = tokenizer(Mode::Normal);
        assert_eq!(t.multi_tokenize_nbest("東京都", 2).len(), 2);
        assert_eq!(t.multi_tokenize_by_slack("東京都", 400).len(), 3);
        assert_eq!(t.multi_tokenize_by_slack("東京都", 0).len(), 1);
    }

    #[test]
    fn extended_mode_applies_to_multi_tokenize() {
        let sequences = tokenizer(Mode::Extended).multi_tokenize_nbest("テスト", 1);
        assert_eq!(sequences[0].surfaces(), ["テ", "ス", "ト"]);
    }

    #[test]
    fn tokenizer_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Tokenizer>();
    }
}
