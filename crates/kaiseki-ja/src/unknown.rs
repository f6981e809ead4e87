// Unknown-word entries, keyed by character category.

use kaiseki_core::buffer::{TokenInfoBuffer, WordIdMap};
use kaiseki_core::character::CategoryId;

use crate::DictionaryError;

/// Connection ids and cost of one token info entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordParam {
    pub left_id: u16,
    pub right_id: u16,
    pub word_cost: i32,
}

impl WordParam {
    pub fn triple(self) -> (u16, u16, i32) {
        (self.left_id, self.right_id, self.word_cost)
    }
}

/// Decode the first three token info fields of every entry.
pub(crate) fn word_params(buffer: &TokenInfoBuffer) -> Result<Vec<WordParam>, DictionaryError> {
    if buffer.token_info_count() < 3 {
        return Err(DictionaryError::Malformed(format!(
            "token info carries {} fields, need left id, right id and cost",
            buffer.token_info_count()
        )));
    }
    (0..buffer.entry_count())
        .map(|i| {
            let left = buffer.lookup_token_info(i, 0)?;
            let right = buffer.lookup_token_info(i, 1)?;
            let cost = buffer.lookup_token_info(i, 2)?;
            if left < 0 || right < 0 {
                return Err(DictionaryError::Malformed(format!(
                    "entry {i} has negative connection id ({left}, {right})"
                )));
            }
            Ok(WordParam {
                left_id: left as u16,
                right_id: right as u16,
                word_cost: i32::from(cost),
            })
        })
        .collect()
}

/// Entries used for unknown-word candidates of each character category.
#[derive(Debug, Clone)]
pub struct UnknownDictionary {
    token_info: TokenInfoBuffer,
    word_ids: WordIdMap,
    params: Vec<WordParam>,
}

impl UnknownDictionary {
    pub fn new(token_info: TokenInfoBuffer, word_ids: WordIdMap) -> Result<Self, DictionaryError> {
        let params = word_params(&token_info)?;
        if let Some(bad) = word_ids
            .all_word_ids()
            .find(|&id| id < 0 || id as usize >= params.len())
        {
            return Err(DictionaryError::Malformed(format!(
                "unknown word id {bad} outside {} entries",
                params.len()
            )));
        }
        Ok(Self {
            token_info,
            word_ids,
            params,
        })
    }

    pub fn token_info(&self) -> &TokenInfoBuffer {
        &self.token_info
    }

    pub fn word_id_map(&self) -> &WordIdMap {
        &self.word_ids
    }

    /// Entries for `category`, in registration order.
    pub fn entries(&self, category: CategoryId) -> &[i32] {
        self.word_ids.lookup(category.index())
    }

    pub fn param(&self, word_id: u32) -> Option<WordParam> {
        self.params.get(word_id as usize).copied()
    }

    pub fn params(&self) -> &[WordParam] {
        &self.params
    }
}
