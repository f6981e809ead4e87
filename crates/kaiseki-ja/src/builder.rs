// One-shot write path producing a dictionary directory.

use std::path::{Path, PathBuf};

use kaiseki_core::buffer::{FeatureInfoMap, TokenInfoBufferWriter, WordIdMapWriter};
use kaiseki_core::character::{CharacterDefinitions, CharacterDefinitionsBuilder};
use kaiseki_fst::{Builder, Compiler};
use log::{info, warn};
use tempfile::TempDir;

use crate::connection::ConnectionCosts;
use crate::dictionary::{Dictionary, DictionaryBytes};
use crate::DictionaryError;

/// Placeholder for a feature the entry does not carry.
pub const MISSING_FEATURE: &str = "*";

#[derive(Debug, Clone)]
struct PendingEntry {
    key: String,
    left_id: i16,
    right_id: i16,
    cost: i16,
    features: Vec<String>,
}

/// Collects entries and writes the binary dictionary files.
///
/// The first `pos_count` features of every entry go to the POS table, the
/// rest to the feature table. Entries with fewer features than the widest
/// one are padded with `*`.
#[derive(Debug, Clone)]
pub struct DictionaryBuilder {
    pos_count: usize,
    entries: Vec<PendingEntry>,
    unknown_entries: Vec<PendingEntry>,
    connection_costs: Option<ConnectionCosts>,
    characters: Option<CharacterDefinitions>,
}

impl DictionaryBuilder {
    pub fn new(pos_count: usize) -> Self {
        Self {
            pos_count,
            entries: Vec::new(),
            unknown_entries: Vec::new(),
            connection_costs: None,
            characters: None,
        }
    }

    /// Add a known word. Entries sharing a surface become homographs, kept
    /// in insertion order.
    pub fn add_entry<S: AsRef<str>>(
        &mut self,
        surface: &str,
        left_id: i16,
        right_id: i16,
        cost: i16,
        features: &[S],
    ) -> &mut Self {
        self.entries.push(pending(surface, left_id, right_id, cost, features));
        self
    }

    /// Add an unknown-word entry for the character category `category`.
    pub fn add_unknown_entry<S: AsRef<str>>(
        &mut self,
        category: &str,
        left_id: i16,
        right_id: i16,
        cost: i16,
        features: &[S],
    ) -> &mut Self {
        self.unknown_entries
            .push(pending(category, left_id, right_id, cost, features));
        self
    }

    pub fn connection_costs(&mut self, costs: ConnectionCosts) -> &mut Self {
        self.connection_costs = Some(costs);
        self
    }

    /// Character table to use instead of [`CharacterDefinitionsBuilder::japanese`].
    pub fn character_definitions(&mut self, characters: CharacterDefinitions) -> &mut Self {
        self.characters = Some(characters);
        self
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Serialize every file. Nothing touches the filesystem.
    pub fn build_bytes(&self) -> Result<DictionaryBytes, DictionaryError> {
        let connection_costs = self
            .connection_costs
            .as_ref()
            .ok_or_else(|| DictionaryError::Malformed("no connection costs given".to_string()))?;
        let characters = match &self.characters {
            Some(c) => c.clone(),
            None => CharacterDefinitionsBuilder::japanese().build(),
        };

        let mut pos_values = FeatureInfoMap::new();
        let mut features = FeatureInfoMap::new();

        // Known entries: word id = insertion index, surface id = rank of the
        // surface in FST order.
        let token_info = self.write_entries(&self.entries, &mut pos_values, &mut features)?;

        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        order.sort_by(|&a, &b| {
            self.entries[a]
                .key
                .encode_utf16()
                .cmp(self.entries[b].key.encode_utf16())
        });
        let mut fst_builder = Builder::new();
        let mut word_ids = WordIdMapWriter::new();
        let mut surface_id = 0usize;
        let mut previous: Option<&str> = None;
        for &word_id in &order {
            let surface = self.entries[word_id].key.as_str();
            if surface.is_empty() {
                return Err(DictionaryError::Malformed(format!(
                    "entry {word_id} has an empty surface"
                )));
            }
            if previous != Some(surface) {
                if previous.is_some() {
                    surface_id += 1;
                }
                fst_builder.insert(surface, surface_id as u32)?;
                previous = Some(surface);
            }
            word_ids.add(surface_id, word_id as i32);
        }
        let fst = Compiler::compile(&fst_builder.finish());

        // Unknown entries, grouped by category id.
        let unknown_token_info =
            self.write_entries(&self.unknown_entries, &mut pos_values, &mut features)?;
        let mut unknown_word_ids = WordIdMapWriter::new();
        for (i, entry) in self.unknown_entries.iter().enumerate() {
            let category = characters.category_id(&entry.key).ok_or_else(|| {
                kaiseki_core::character::CharacterError::UnknownCategory(entry.key.clone())
            })?;
            unknown_word_ids.add(category.index(), i as i32);
        }

        if pos_values.len() > usize::from(u8::MAX) + 1 {
            return Err(DictionaryError::Malformed(format!(
                "{} distinct POS values exceed the 256 a POS id can address",
                pos_values.len()
            )));
        }

        let bytes = DictionaryBytes {
            fst,
            token_info,
            pos_values: pos_values.to_bytes()?,
            features: features.to_bytes()?,
            word_ids: word_ids.into_bytes(),
            connection_costs: connection_costs.to_bytes(),
            char_def: characters.to_bytes(),
            unknown_token_info,
            unknown_word_ids: unknown_word_ids.into_bytes(),
        };
        info!(
            "built dictionary: {} entries, {} surfaces, {} unknown entries, {} POS values, {} feature values",
            self.entries.len(),
            if self.entries.is_empty() { 0 } else { surface_id + 1 },
            self.unknown_entries.len(),
            pos_values.len(),
            features.len()
        );
        Ok(bytes)
    }

    fn write_entries(
        &self,
        entries: &[PendingEntry],
        pos_values: &mut FeatureInfoMap,
        features: &mut FeatureInfoMap,
    ) -> Result<Vec<u8>, DictionaryError> {
        let width = entries
            .iter()
            .map(|e| e.features.len())
            .max()
            .unwrap_or(0)
            .max(self.pos_count);
        let mut writer = TokenInfoBufferWriter::new(3, self.pos_count, width - self.pos_count);
        for entry in entries {
            let padded: Vec<&str> = (0..width)
                .map(|i| entry.features.get(i).map_or(MISSING_FEATURE, String::as_str))
                .collect();
            let pos_ids: Vec<u8> = padded[..self.pos_count]
                .iter()
                .map(|p| pos_values.intern(p) as u8)
                .collect();
            let feature_ids = features.map_features(&padded[self.pos_count..]);
            writer.push(&[entry.left_id, entry.right_id, entry.cost], &pos_ids, &feature_ids)?;
        }
        Ok(writer.into_bytes())
    }

    /// Build and load in one step.
    pub fn build(&self) -> Result<Dictionary, DictionaryError> {
        Dictionary::from_bytes(self.build_bytes()?)
    }

    /// Write every file into `dir`, replacing what it held before.
    ///
    /// The files are written to a fresh sibling directory that is swapped in
    /// for `dir` once complete, so a failure at any point leaves `dir` as it
    /// was.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<(), DictionaryError> {
        let dir = dir.as_ref();
        let bytes = self.build_bytes()?;

        let parent = match dir.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(persist_error(parent.to_path_buf()))?;
        let staging = sibling_dir(parent)?;
        for (name, contents) in bytes.files() {
            let path = staging.path().join(name);
            std::fs::write(&path, contents).map_err(persist_error(path))?;
        }

        // a directory cannot be renamed onto a non-empty one
        let previous = sibling_dir(parent)?;
        let aside = previous.path().join("previous");
        let replacing = dir.exists();
        if replacing {
            std::fs::rename(dir, &aside).map_err(persist_error(dir.to_path_buf()))?;
        }
        if let Err(source) = std::fs::rename(staging.path(), dir) {
            if replacing {
                if let Err(e) = std::fs::rename(&aside, dir) {
                    let kept = previous.keep();
                    warn!(
                        "could not restore {} ({e}); the previous dictionary is in {}",
                        dir.display(),
                        kept.join("previous").display()
                    );
                }
            }
            return Err(DictionaryError::Persist {
                path: dir.to_path_buf(),
                source,
            });
        }
        info!("wrote dictionary to {}", dir.display());
        Ok(())
    }
}

fn sibling_dir(parent: &Path) -> Result<TempDir, DictionaryError> {
    tempfile::Builder::new()
        .prefix(".kaiseki-dict-")
        .tempdir_in(parent)
        .map_err(persist_error(parent.to_path_buf()))
}

fn persist_error(path: PathBuf) -> impl FnOnce(std::io::Error) -> DictionaryError {
    move |source| DictionaryError::Persist { path, source }
}

fn pending<S: AsRef<str>>(key: &str, left_id: i16, right_id: i16, cost: i16, features: &[S]) -> PendingEntry {
    PendingEntry {
        key: key.to_string(),
        left_id,
        right_id,
        cost,
        features: features.iter().map(|f| f.as_ref().to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{chars, fixture_builder};
    use crate::dictionary::FST_FILE;

    #[test]
    fn written_directory_loads() {
        let dir = tempfile::tempdir().unwrap();
        fixture_builder().write_to_dir(dir.path()).unwrap();
        for (name, _) in DictionaryBytes::default().files() {
            assert!(dir.path().join(name).is_file(), "{name}");
        }
        let dict = Dictionary::load(dir.path()).unwrap();
        let text = chars("京都");
        assert_eq!(dict.lookup_known(&text, 0).len(), 2);
    }

    #[test]
    fn failed_build_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = fixture_builder();
        builder.add_unknown_entry("NO_SUCH_CATEGORY", 1, 1, 0, &["名詞"]);
        assert!(builder.write_to_dir(dir.path()).is_err());
        assert!(!dir.path().join(FST_FILE).exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn rewrite_replaces_directory_without_leftovers() {
        let parent = tempfile::tempdir().unwrap();
        let dir = parent.path().join("dict");
        fixture_builder().write_to_dir(&dir).unwrap();
        std::fs::write(dir.join("stale.bin"), b"old").unwrap();

        let mut builder = fixture_builder();
        builder.add_entry("東京タワー", 1, 1, 100, &["名詞"]);
        builder.write_to_dir(&dir).unwrap();

        assert!(!dir.join("stale.bin").exists());
        let entries: Vec<_> = std::fs::read_dir(parent.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, ["dict"]);
        let dict = Dictionary::load(&dir).unwrap();
        assert_eq!(dict.lookup_known(&chars("東京タワー"), 0).len(), 3);
    }

    #[test]
    fn failed_rewrite_keeps_previous_dictionary() {
        let parent = tempfile::tempdir().unwrap();
        let dir = parent.path().join("dict");
        fixture_builder().write_to_dir(&dir).unwrap();
        let before = std::fs::read(dir.join(FST_FILE)).unwrap();

        let mut builder = fixture_builder();
        builder.add_unknown_entry("NO_SUCH_CATEGORY", 1, 1, 0, &["名詞"]);
        assert!(builder.write_to_dir(&dir).is_err());
        assert_eq!(std::fs::read(dir.join(FST_FILE)).unwrap(), before);
        assert_eq!(std::fs::read_dir(parent.path()).unwrap().count(), 1);
        assert!(Dictionary::load(&dir).is_ok());
    }

    #[test]
    fn missing_connection_costs() {
        let builder = DictionaryBuilder::new(4);
        assert!(matches!(
            builder.build_bytes(),
            Err(DictionaryError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_empty_surface() {
        let mut builder = fixture_builder();
        builder.add_entry("", 1, 1, 0, &["名詞"]);
        assert!(builder.build_bytes().is_err());
    }

    #[test]
    fn homographs_keep_insertion_order() {
        let dict = fixture_builder().build().unwrap();
        let text = chars("はし");
        let ids: Vec<u32> = dict.lookup_known(&text, 0).iter().map(|n| n.word_id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids[0] < ids[1]);
    }
}
