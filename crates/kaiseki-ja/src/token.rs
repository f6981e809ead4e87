// Tokens handed to callers.

use std::ops::Range;

use serde::Serialize;

use crate::node::NodeType;

const MISSING: &str = "*";

/// Number of leading features holding part-of-speech levels.
pub const POS_LEVELS: usize = 4;

const CONJUGATION_TYPE: usize = 4;
const CONJUGATION_FORM: usize = 5;
const BASE_FORM: usize = 6;
const READING: usize = 7;
const PRONUNCIATION: usize = 8;

/// One word of a segmentation.
///
/// Features follow the IPADIC layout: four part-of-speech levels,
/// conjugation type, conjugation form, base form, reading, pronunciation.
/// Accessors for a feature the entry does not carry return `*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    surface: String,
    position: usize,
    byte_range: Range<usize>,
    node_type: NodeType,
    word_id: u32,
    word_cost: i32,
    features: Vec<String>,
}

impl Token {
    pub(crate) fn new(
        surface: String,
        position: usize,
        byte_range: Range<usize>,
        node_type: NodeType,
        word_id: u32,
        word_cost: i32,
        features: Vec<String>,
    ) -> Self {
        Self {
            surface,
            position,
            byte_range,
            node_type,
            word_id,
            word_cost,
            features,
        }
    }

    pub fn surface(&self) -> &str {
        &self.surface
    }

    /// Offset of the first character, counted in characters.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Span in the input, in bytes.
    pub fn byte_range(&self) -> Range<usize> {
        self.byte_range.clone()
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn is_known(&self) -> bool {
        self.node_type == NodeType::Known
    }

    pub fn is_user(&self) -> bool {
        self.node_type == NodeType::User
    }

    pub fn word_id(&self) -> u32 {
        self.word_id
    }

    pub fn word_cost(&self) -> i32 {
        self.word_cost
    }

    pub fn all_features(&self) -> &[String] {
        &self.features
    }

    fn feature(&self, index: usize) -> &str {
        self.features.get(index).map_or(MISSING, String::as_str)
    }

    /// Part-of-speech levels joined by `,`.
    pub fn part_of_speech(&self) -> String {
        self.part_of_speech_levels().join(",")
    }

    pub fn part_of_speech_levels(&self) -> [&str; POS_LEVELS] {
        [self.feature(0), self.feature(1), self.feature(2), self.feature(3)]
    }

    pub fn conjugation_type(&self) -> &str {
        self.feature(CONJUGATION_TYPE)
    }

    pub fn conjugation_form(&self) -> &str {
        self.feature(CONJUGATION_FORM)
    }

    pub fn base_form(&self) -> &str {
        self.feature(BASE_FORM)
    }

    pub fn reading(&self) -> &str {
        self.feature(READING)
    }

    pub fn pronunciation(&self) -> &str {
        self.feature(PRONUNCIATION)
    }
}

/// One ranked segmentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenSequence {
    pub tokens: Vec<Token>,
    pub cost: i64,
}

impl TokenSequence {
    pub fn surfaces(&self) -> Vec<&str> {
        self.tokens.iter().map(Token::surface).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(features: &[&str]) -> Token {
        Token::new(
            "東京".to_string(),
            2,
            6..12,
            NodeType::Known,
            7,
            100,
            features.iter().map(|f| f.to_string()).collect(),
        )
    }

    #[test]
    fn ipadic_accessors() {
        let t = token(&["名詞", "固有名詞", "地域", "一般", "*", "*", "東京", "トウキョウ", "トーキョー"]);
        assert_eq!(t.part_of_speech(), "名詞,固有名詞,地域,一般");
        assert_eq!(t.base_form(), "東京");
        assert_eq!(t.reading(), "トウキョウ");
        assert_eq!(t.pronunciation(), "トーキョー");
        assert_eq!(t.conjugation_type(), "*");
        assert!(t.is_known());
        assert!(!t.is_user());
        assert_eq!(t.byte_range(), 6..12);
    }

    #[test]
    fn short_feature_list_reads_missing() {
        let t = token(&["名詞", "一般"]);
        assert_eq!(t.part_of_speech_levels(), ["名詞", "一般", "*", "*"]);
        assert_eq!(t.reading(), "*");
        assert_eq!(t.pronunciation(), "*");
    }

    #[test]
    fn serializes_to_json() {
        let t = token(&["名詞"]);
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["surface"], "東京");
        assert_eq!(json["node_type"], "KNOWN");
        assert_eq!(json["byte_range"]["start"], 6);
    }
}
