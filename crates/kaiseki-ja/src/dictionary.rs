// Dictionary facade: the immutable data a tokenizer searches over.
//
// Files in a dictionary directory (all little endian):
//   fst.bin                 surface -> surface id
//   token_info.bin          known entries (left id, right id, cost; POS; features)
//   pos_values.bin          POS string table
//   features.bin            feature string table
//   word_ids.bin            surface id -> known entries (homographs)
//   connection_costs.bin    bigram cost matrix
//   char_def.bin            character categories
//   unknown_token_info.bin  unknown-word entries
//   unknown_word_ids.bin    category id -> unknown entries

use std::path::{Path, PathBuf};

use kaiseki_core::buffer::{StringValueMapBuffer, TokenInfoBuffer, WordIdMap};
use kaiseki_core::character::{CharacterDefinitions, CategoryId};
use kaiseki_fst::Fst;
use log::{debug, info};

use crate::connection::ConnectionCosts;
use crate::node::{NodeType, ViterbiNode};
use crate::unknown::{UnknownDictionary, WordParam, word_params};
use crate::DictionaryError;

pub const FST_FILE: &str = "fst.bin";
pub const TOKEN_INFO_FILE: &str = "token_info.bin";
pub const POS_VALUES_FILE: &str = "pos_values.bin";
pub const FEATURES_FILE: &str = "features.bin";
pub const WORD_IDS_FILE: &str = "word_ids.bin";
pub const CONNECTION_COSTS_FILE: &str = "connection_costs.bin";
pub const CHAR_DEF_FILE: &str = "char_def.bin";
pub const UNKNOWN_TOKEN_INFO_FILE: &str = "unknown_token_info.bin";
pub const UNKNOWN_WORD_IDS_FILE: &str = "unknown_word_ids.bin";

/// Raw contents of every dictionary file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionaryBytes {
    pub fst: Vec<u8>,
    pub token_info: Vec<u8>,
    pub pos_values: Vec<u8>,
    pub features: Vec<u8>,
    pub word_ids: Vec<u8>,
    pub connection_costs: Vec<u8>,
    pub char_def: Vec<u8>,
    pub unknown_token_info: Vec<u8>,
    pub unknown_word_ids: Vec<u8>,
}

impl DictionaryBytes {
    /// `(file name, contents)` for every file, in a fixed order.
    pub fn files(&self) -> [(&'static str, &[u8]); 9] {
        [
            (FST_FILE, &self.fst),
            (TOKEN_INFO_FILE, &self.token_info),
            (POS_VALUES_FILE, &self.pos_values),
            (FEATURES_FILE, &self.features),
            (WORD_IDS_FILE, &self.word_ids),
            (CONNECTION_COSTS_FILE, &self.connection_costs),
            (CHAR_DEF_FILE, &self.char_def),
            (UNKNOWN_TOKEN_INFO_FILE, &self.unknown_token_info),
            (UNKNOWN_WORD_IDS_FILE, &self.unknown_word_ids),
        ]
    }

    /// Read every file of `dir` into memory. File handles are closed on return.
    pub fn read_dir(dir: &Path) -> Result<Self, DictionaryError> {
        let read = |name: &str| -> Result<Vec<u8>, DictionaryError> {
            let path: PathBuf = dir.join(name);
            std::fs::read(&path).map_err(|source| DictionaryError::Io { path, source })
        };
        Ok(Self {
            fst: read(FST_FILE)?,
            token_info: read(TOKEN_INFO_FILE)?,
            pos_values: read(POS_VALUES_FILE)?,
            features: read(FEATURES_FILE)?,
            word_ids: read(WORD_IDS_FILE)?,
            connection_costs: read(CONNECTION_COSTS_FILE)?,
            char_def: read(CHAR_DEF_FILE)?,
            unknown_token_info: read(UNKNOWN_TOKEN_INFO_FILE)?,
            unknown_word_ids: read(UNKNOWN_WORD_IDS_FILE)?,
        })
    }
}

/// Known, unknown and connection data for one language model.
///
/// Immutable once loaded, so a single instance is shared between any number
/// of tokenizers and threads through `Arc<Dictionary>`.
#[derive(Debug)]
pub struct Dictionary {
    fst: Fst,
    token_info: TokenInfoBuffer,
    params: Vec<WordParam>,
    word_ids: WordIdMap,
    pos_values: StringValueMapBuffer,
    features: StringValueMapBuffer,
    connection_costs: ConnectionCosts,
    characters: CharacterDefinitions,
    unknown: UnknownDictionary,
}

impl Dictionary {
    /// Load a dictionary directory.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let dir = dir.as_ref();
        let dictionary = Self::from_bytes(DictionaryBytes::read_dir(dir)?)?;
        info!(
            "loaded dictionary from {}: {} entries, {} unknown entries, {}x{} connection matrix",
            dir.display(),
            dictionary.entry_count(),
            dictionary.unknown.params().len(),
            dictionary.connection_costs.forward_size(),
            dictionary.connection_costs.backward_size(),
        );
        Ok(dictionary)
    }

    /// Parse and cross-check every file.
    pub fn from_bytes(bytes: DictionaryBytes) -> Result<Self, DictionaryError> {
        let fst = Fst::from_bytes(bytes.fst)?;
        let token_info = TokenInfoBuffer::from_bytes(bytes.token_info)?;
        let params = word_params(&token_info)?;
        let word_ids = WordIdMap::from_bytes(&bytes.word_ids)?;
        let pos_values = StringValueMapBuffer::from_bytes(bytes.pos_values)?;
        let features = StringValueMapBuffer::from_bytes(bytes.features)?;
        let connection_costs = ConnectionCosts::from_bytes(&bytes.connection_costs)?;
        let characters = CharacterDefinitions::from_bytes(&bytes.char_def)?;
        let unknown = UnknownDictionary::new(
            TokenInfoBuffer::from_bytes(bytes.unknown_token_info)?,
            WordIdMap::from_bytes(&bytes.unknown_word_ids)?,
        )?;

        let dictionary = Self {
            fst,
            token_info,
            params,
            word_ids,
            pos_values,
            features,
            connection_costs,
            characters,
            unknown,
        };
        dictionary.validate()?;
        debug!(
            "dictionary validated: {} surfaces, {} POS values, {} feature values",
            dictionary.word_ids.source_count(),
            dictionary.pos_values.len(),
            dictionary.features.len()
        );
        Ok(dictionary)
    }

    fn validate(&self) -> Result<(), DictionaryError> {
        let costs = &self.connection_costs;
        if costs.forward_size() == 0 || costs.backward_size() == 0 {
            return Err(DictionaryError::Malformed(
                "connection matrix has no room for the sentence boundary id".to_string(),
            ));
        }

        for (kind, params) in [("known", self.params.as_slice()), ("unknown", self.unknown.params())] {
            for (i, p) in params.iter().enumerate() {
                if !costs.contains(p.right_id as i16, p.left_id as i16) {
                    return Err(DictionaryError::Malformed(format!(
                        "{kind} entry {i} connection ids ({}, {}) outside the {}x{} matrix",
                        p.left_id,
                        p.right_id,
                        costs.forward_size(),
                        costs.backward_size()
                    )));
                }
            }
        }

        for (kind, buffer) in [("known", &self.token_info), ("unknown", self.unknown.token_info())] {
            for i in 0..buffer.entry_count() {
                let entry = buffer.lookup_entry(i)?;
                if let Some(&id) = entry.pos_info.iter().find(|&&id| id as usize >= self.pos_values.len()) {
                    return Err(DictionaryError::Malformed(format!(
                        "{kind} entry {i} POS id {id} outside {} values",
                        self.pos_values.len()
                    )));
                }
                if let Some(&id) = entry.feature_info.iter().find(|&&id| id as usize >= self.features.len()) {
                    return Err(DictionaryError::Malformed(format!(
                        "{kind} entry {i} feature id {id} outside {} values",
                        self.features.len()
                    )));
                }
            }
        }

        if let Some(bad) = self
            .word_ids
            .all_word_ids()
            .find(|&id| id < 0 || id as usize >= self.params.len())
        {
            return Err(DictionaryError::Malformed(format!(
                "word id {bad} outside {} entries",
                self.params.len()
            )));
        }

        for (i, def) in self.characters.categories().iter().enumerate() {
            if self.unknown.entries(CategoryId(i as u8)).is_empty() {
                return Err(DictionaryError::Malformed(format!(
                    "category {} has no unknown-word entries",
                    def.name
                )));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn fst(&self) -> &Fst {
        &self.fst
    }

    pub fn connection_costs(&self) -> &ConnectionCosts {
        &self.connection_costs
    }

    pub fn character_definitions(&self) -> &CharacterDefinitions {
        &self.characters
    }

    pub fn unknown(&self) -> &UnknownDictionary {
        &self.unknown
    }

    /// Number of known entries.
    pub fn entry_count(&self) -> usize {
        self.params.len()
    }

    /// Number of leading features stored in the POS table.
    pub fn pos_count(&self) -> usize {
        self.token_info.pos_info_count()
    }

    /// Override the categories of `c` before the dictionary is shared.
    pub fn set_categories(&mut self, c: char, names: &[&str]) -> Result<(), DictionaryError> {
        self.characters.set_categories(c, names)?;
        Ok(())
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Known words starting at `position`, shortest first, every homograph
    /// in entry order.
    pub fn lookup_known(&self, text: &[char], position: usize) -> Vec<ViterbiNode> {
        let mut nodes = Vec::new();
        let mut cursor = self.fst.cursor();
        let mut units = [0u16; 2];

        'walk: for (offset, c) in text.iter().skip(position).enumerate() {
            for &unit in c.encode_utf16(&mut units).iter() {
                if !cursor.step(unit) {
                    break 'walk;
                }
            }
            let Some(surface_id) = cursor.accepted() else {
                continue;
            };
            for &word_id in self.word_ids.lookup(surface_id as usize) {
                let param = self.params[word_id as usize];
                nodes.push(ViterbiNode::new(
                    NodeType::Known,
                    word_id as u32,
                    position,
                    offset + 1,
                    param.triple(),
                ));
            }
        }
        nodes
    }

    /// Unknown-word candidates starting at `position`. `found` tells whether
    /// a known or user word starts there.
    pub fn lookup_unknown(&self, text: &[char], position: usize, found: bool) -> Vec<ViterbiNode> {
        let mut nodes = Vec::new();
        for span in self.characters.unknown_spans(text, position, found) {
            for &word_id in self.unknown.entries(span.category) {
                let Some(param) = self.unknown.param(word_id as u32) else {
                    continue;
                };
                nodes.push(ViterbiNode::new(
                    NodeType::Unknown,
                    word_id as u32,
                    position,
                    span.length,
                    param.triple(),
                ));
            }
        }
        nodes
    }

    /// POS values followed by the remaining features of a known, unknown or
    /// inserted node. Other node types have none here.
    pub fn features(&self, node: &ViterbiNode) -> Vec<String> {
        let buffer = match node.node_type {
            NodeType::Known => &self.token_info,
            NodeType::Unknown | NodeType::Inserted => self.unknown.token_info(),
            NodeType::User | NodeType::Bos | NodeType::Eos => return Vec::new(),
        };
        let Ok(entry) = buffer.lookup_entry(node.word_id as usize) else {
            return Vec::new();
        };
        entry
            .pos_info
            .iter()
            .map(|&id| self.pos_values.value(id as usize))
            .chain(entry.feature_info.iter().map(|&id| self.features.value(id as usize)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{chars, fixture_bytes, fixture_dictionary};

    fn surfaces(text: &[char], nodes: &[ViterbiNode]) -> Vec<String> {
        nodes
            .iter()
            .map(|n| text[n.start..n.end()].iter().collect())
            .collect()
    }

    #[test]
    fn known_prefixes_shortest_first() {
        let dict = fixture_dictionary();
        let text = chars("東京都に");
        let nodes = dict.lookup_known(&text, 0);
        assert_eq!(surfaces(&text, &nodes), ["東", "東京", "東京都"]);
        assert!(nodes.iter().all(|n| n.node_type == NodeType::Known));
    }

    #[test]
    fn known_lookup_from_offset() {
        let dict = fixture_dictionary();
        let text = chars("東京都");
        assert_eq!(surfaces(&text, &dict.lookup_known(&text, 1)), ["京", "京都"]);
        assert!(dict.lookup_known(&text, 3).is_empty());
    }

    #[test]
    fn homographs_expand() {
        let dict = fixture_dictionary();
        let text = chars("はし");
        let nodes = dict.lookup_known(&text, 0);
        assert_eq!(nodes.len(), 2);
        assert_ne!(nodes[0].word_id, nodes[1].word_id);
        assert_eq!(dict.features(&nodes[0])[7], "ハシ");
    }

    #[test]
    fn unknown_candidates_follow_categories() {
        let dict = fixture_dictionary();
        let text = chars("テスト");
        let nodes = dict.lookup_unknown(&text, 0, false);
        let lengths: Vec<usize> = nodes.iter().map(|n| n.length).collect();
        assert_eq!(lengths, vec![3, 2, 1]);
        assert!(nodes.iter().all(|n| n.node_type == NodeType::Unknown));
    }

    #[test]
    fn features_pad_to_layout() {
        let dict = fixture_dictionary();
        let text = chars("東京");
        let node = dict.lookup_known(&text, 0).pop().unwrap();
        let features = dict.features(&node);
        assert_eq!(features.len(), 9);
        assert_eq!(&features[..4], ["名詞", "固有名詞", "地域", "一般"]);
        assert_eq!(features[6], "東京");
        assert_eq!(features[7], "トウキョウ");
    }

    #[test]
    fn rejects_connection_id_outside_matrix() {
        let mut bytes = fixture_bytes();
        bytes.connection_costs = ConnectionCosts::new(1, 1).to_bytes();
        assert!(matches!(
            Dictionary::from_bytes(bytes),
            Err(DictionaryError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_category_without_unknown_entries() {
        let mut bytes = fixture_bytes();
        bytes.unknown_word_ids = kaiseki_core::buffer::WordIdMapWriter::new().into_bytes();
        assert!(matches!(
            Dictionary::from_bytes(bytes),
            Err(DictionaryError::Malformed(msg)) if msg.contains("unknown-word entries")
        ));
    }

    #[test]
    fn rejects_truncated_fst() {
        let mut bytes = fixture_bytes();
        bytes.fst.truncate(bytes.fst.len() - 1);
        assert!(matches!(
            Dictionary::from_bytes(bytes),
            Err(DictionaryError::Fst(_))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Dictionary::load(dir.path()),
            Err(DictionaryError::Io { .. })
        ));
    }

    #[test]
    fn dictionary_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Dictionary>();
    }
}
