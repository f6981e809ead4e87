// Write-side interning of feature strings into dense ids.

use hashbrown::HashMap;

use super::{BufferError, StringValueMapBuffer};

/// Assigns each distinct string a dense id in first-seen order.
#[derive(Debug, Default, Clone)]
pub struct FeatureInfoMap {
    ids: HashMap<String, u32>,
    values: Vec<String>,
}

impl FeatureInfoMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, value: &str) -> u32 {
        if let Some(&id) = self.ids.get(value) {
            return id;
        }
        let id = self.values.len() as u32;
        self.values.push(value.to_string());
        self.ids.insert(value.to_string(), id);
        id
    }

    pub fn map_features<S: AsRef<str>>(&mut self, features: &[S]) -> Vec<u32> {
        features.iter().map(|f| self.intern(f.as_ref())).collect()
    }

    pub fn get(&self, value: &str) -> Option<u32> {
        self.ids.get(value).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in id order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, BufferError> {
        StringValueMapBuffer::encode(&self.values)
    }
}
