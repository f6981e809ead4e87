// Source id -> set of word ids (homographs sharing one surface).
//
// Layout: two length-prefixed i32 arrays.
//   indices   one slot per source id, -1 when the id has no words
//   payload   concatenated [count, id...] runs

use super::{BufferError, read_i32_array, read_u32, write_i32_array};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordIdMap {
    indices: Vec<i32>,
    word_ids: Vec<i32>,
}

impl WordIdMap {
    pub fn from_bytes(data: &[u8]) -> Result<Self, BufferError> {
        super::ensure_len(data, 4)?;
        let index_count = read_u32(data, 0) as usize;
        let indices = read_i32_array(data, 4, index_count)?;
        let payload_at = 4 + index_count * 4;
        super::ensure_len(data, payload_at + 4)?;
        let payload_count = read_u32(data, payload_at) as usize;
        let word_ids = read_i32_array(data, payload_at + 4, payload_count)?;
        if payload_at + 4 + payload_count * 4 != data.len() {
            return Err(BufferError::Malformed("trailing bytes after word id payload".to_string()));
        }

        for (source, &index) in indices.iter().enumerate() {
            if index == -1 {
                continue;
            }
            let start = usize::try_from(index).map_err(|_| {
                BufferError::Malformed(format!("source {source} has negative index {index}"))
            })?;
            let count = word_ids
                .get(start)
                .and_then(|&c| usize::try_from(c).ok())
                .ok_or_else(|| BufferError::Malformed(format!("source {source} index out of bounds")))?;
            if start + 1 + count > word_ids.len() {
                return Err(BufferError::Malformed(format!("source {source} run truncated")));
            }
        }

        Ok(Self { indices, word_ids })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8 + 4 * (self.indices.len() + self.word_ids.len()));
        write_i32_array(&mut buf, &self.indices);
        write_i32_array(&mut buf, &self.word_ids);
        buf
    }

    /// Number of source ids with a slot (including empty ones).
    pub fn source_count(&self) -> usize {
        self.indices.len()
    }

    /// Word ids for `source_id`; empty when the id is unknown.
    pub fn lookup(&self, source_id: usize) -> &[i32] {
        match self.indices.get(source_id) {
            Some(&index) if index >= 0 => {
                let start = index as usize;
                let count = self.word_ids[start] as usize;
                &self.word_ids[start + 1..start + 1 + count]
            }
            _ => &[],
        }
    }

    /// Every word id referenced by the map.
    pub fn all_word_ids(&self) -> impl Iterator<Item = i32> + '_ {
        (0..self.indices.len()).flat_map(|source| self.lookup(source).iter().copied())
    }
}

/// Collects `(source id, word id)` pairs and lays them out.
#[derive(Debug, Default)]
pub struct WordIdMapWriter {
    ids: Vec<Vec<i32>>,
}

impl WordIdMapWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, source_id: usize, word_id: i32) {
        if self.ids.len() <= source_id {
            self.ids.resize_with(source_id + 1, Vec::new);
        }
        self.ids[source_id].push(word_id);
    }

    pub fn build(self) -> WordIdMap {
        let mut indices = Vec::with_capacity(self.ids.len());
        let mut word_ids = Vec::new();
        for ids in self.ids {
            if ids.is_empty() {
                indices.push(-1);
                continue;
            }
            indices.push(word_ids.len() as i32);
            word_ids.push(ids.len() as i32);
            word_ids.extend(ids);
        }
        WordIdMap { indices, word_ids }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.build().to_bytes()
    }
}
