// User dictionary: custom words with a forced segmentation.
//
// One entry per line:
//   surface,segmented surface,readings,part of speech
// e.g.
//   関西国際空港,関西 国際 空港,カンサイ コクサイ クウコウ,カスタム名詞
//
// Fields may be CSV-quoted. Blank lines and lines starting with `#` are
// skipped. A surface defined twice keeps the last definition.

use std::io::Read;
use std::ops::Range;
use std::path::Path;

use csv_core::ReadFieldResult;
use hashbrown::HashMap;
use log::{debug, warn};

use crate::node::{NodeType, ViterbiNode};
use crate::UserDictionaryError;

/// Default cost of user words. Precedence over known words does not depend
/// on it: a matched entry is the only candidate inside its span.
pub const USER_WORD_COST: i32 = -100_000;

/// Default left and right connection id of user words.
pub const USER_CONNECTION_ID: u16 = 5;

/// One segment of a user entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSegment {
    pub surface: String,
    pub reading: String,
    pub part_of_speech: String,
    offset: usize,
    length: usize,
}

#[derive(Debug, Clone)]
pub struct UserDictionary {
    surfaces: HashMap<Vec<char>, usize>,
    entries: Vec<Range<usize>>,
    segments: Vec<UserSegment>,
    max_length: usize,
    left_id: u16,
    right_id: u16,
    word_cost: i32,
}

impl UserDictionary {
    pub fn new() -> Self {
        Self {
            surfaces: HashMap::new(),
            entries: Vec::new(),
            segments: Vec::new(),
            max_length: 0,
            left_id: USER_CONNECTION_ID,
            right_id: USER_CONNECTION_ID,
            word_cost: USER_WORD_COST,
        }
    }

    pub fn parse(source: &str) -> Result<Self, UserDictionaryError> {
        let mut dictionary = Self::new();
        for (i, line) in source.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            dictionary.add_line(i + 1, line)?;
        }
        debug!(
            "parsed user dictionary: {} entries, {} segments",
            dictionary.len(),
            dictionary.segments.len()
        );
        Ok(dictionary)
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, UserDictionaryError> {
        let mut source = String::new();
        reader.read_to_string(&mut source)?;
        Self::parse(&source)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, UserDictionaryError> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// Connection ids used for every user word.
    pub fn with_connection_ids(mut self, left_id: u16, right_id: u16) -> Self {
        self.left_id = left_id;
        self.right_id = right_id;
        self
    }

    pub fn with_word_cost(mut self, word_cost: i32) -> Self {
        self.word_cost = word_cost;
        self
    }

    pub fn connection_ids(&self) -> (u16, u16) {
        (self.left_id, self.right_id)
    }

    /// Number of distinct surfaces.
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    fn add_line(&mut self, line_number: usize, line: &str) -> Result<(), UserDictionaryError> {
        let parse_error = |message: String| UserDictionaryError::Parse {
            line: line_number,
            message,
        };
        let fields = parse_csv_row(line).map_err(parse_error)?;
        if fields.len() < 4 {
            return Err(parse_error(format!(
                "expected 4 fields (surface, segmentation, readings, part of speech), got {}",
                fields.len()
            )));
        }

        let surface = fields[0].trim();
        let segments: Vec<&str> = fields[1].split_whitespace().collect();
        let readings: Vec<&str> = fields[2].split_whitespace().collect();
        let part_of_speech = fields[3].trim();

        if surface.is_empty() || segments.is_empty() {
            return Err(parse_error("empty surface or segmentation".to_string()));
        }
        if segments.len() != readings.len() {
            return Err(parse_error(format!(
                "{} segments but {} readings",
                segments.len(),
                readings.len()
            )));
        }
        if segments.concat() != surface {
            return Err(parse_error(format!(
                "segments {segments:?} do not spell the surface {surface}"
            )));
        }

        let key: Vec<char> = surface.chars().collect();
        if self.surfaces.contains_key(&key) {
            warn!("user dictionary line {line_number}: {surface} redefined, keeping the later entry");
        }

        let start = self.segments.len();
        let mut offset = 0;
        for (segment, reading) in segments.iter().zip(&readings) {
            let length = segment.chars().count();
            self.segments.push(UserSegment {
                surface: segment.to_string(),
                reading: reading.to_string(),
                part_of_speech: part_of_speech.to_string(),
                offset,
                length,
            });
            offset += length;
        }
        self.max_length = self.max_length.max(key.len());
        self.surfaces.insert(key, self.entries.len());
        self.entries.push(start..self.segments.len());
        Ok(())
    }

    /// Segment nodes of the longest entry starting at `position`.
    pub fn lookup(&self, text: &[char], position: usize) -> Vec<ViterbiNode> {
        let remaining = text.len().saturating_sub(position);
        for length in (1..=self.max_length.min(remaining)).rev() {
            let Some(&entry) = self.surfaces.get(&text[position..position + length]) else {
                continue;
            };
            return self.entries[entry]
                .clone()
                .map(|i| {
                    let segment = &self.segments[i];
                    ViterbiNode::new(
                        NodeType::User,
                        i as u32,
                        position + segment.offset,
                        segment.length,
                        (self.left_id, self.right_id, self.word_cost),
                    )
                })
                .collect();
        }
        Vec::new()
    }

    pub fn segment(&self, word_id: u32) -> Option<&UserSegment> {
        self.segments.get(word_id as usize)
    }

    /// IPADIC-shaped features: the part of speech as the first POS level,
    /// the segment as base form and its reading.
    pub fn features(&self, word_id: u32) -> Vec<String> {
        let Some(segment) = self.segment(word_id) else {
            return Vec::new();
        };
        let star = || "*".to_string();
        vec![
            segment.part_of_speech.clone(),
            star(),
            star(),
            star(),
            star(),
            star(),
            segment.surface.clone(),
            segment.reading.clone(),
            star(),
        ]
    }
}

impl Default for UserDictionary {
    fn default() -> Self {
        Self::new()
    }
}

/// Split one CSV record into its fields.
fn parse_csv_row(row: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut reader = csv_core::Reader::new();
    let mut input = row.as_bytes();
    let mut output = vec![0u8; row.len() + 1];
    loop {
        let (result, nin, nout) = reader.read_field(input, &mut output);
        let end = match result {
            ReadFieldResult::InputEmpty | ReadFieldResult::End => true,
            ReadFieldResult::Field { .. } => false,
            ReadFieldResult::OutputFull => return Err("field too long".to_string()),
        };
        let field = std::str::from_utf8(&output[..nout]).map_err(|e| format!("invalid UTF-8: {e}"))?;
        fields.push(field.to_string());
        if end {
            return Ok(fields);
        }
        input = &input[nin..];
    }
}
