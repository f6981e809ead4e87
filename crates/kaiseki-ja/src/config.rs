// Tokenizer options.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Segmentation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Plain minimum-cost segmentation.
    #[default]
    Normal,
    /// Penalise long words so compounds split into their parts.
    Search,
    /// Search mode, and unknown words are further split into characters.
    Extended,
}

impl Mode {
    pub fn applies_penalties(self) -> bool {
        matches!(self, Mode::Search | Mode::Extended)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Normal => "normal",
            Mode::Search => "search",
            Mode::Extended => "extended",
        })
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(Mode::Normal),
            "search" => Ok(Mode::Search),
            "extended" => Ok(Mode::Extended),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// Options controlling lattice scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    pub mode: Mode,

    /// Kanji-only words longer than this many characters are penalised.
    pub kanji_penalty_length_threshold: usize,

    /// Cost added per character beyond the kanji threshold.
    pub kanji_penalty: i32,

    /// Other words longer than this many characters are penalised.
    pub other_penalty_length_threshold: usize,

    /// Cost added per character beyond the other threshold.
    pub other_penalty: i32,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Normal,
            kanji_penalty_length_threshold: 2,
            kanji_penalty: 3000,
            other_penalty_length_threshold: 7,
            other_penalty: 1700,
        }
    }
}

impl TokenizerConfig {
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_kanji_penalty(mut self, length_threshold: usize, penalty: i32) -> Self {
        self.kanji_penalty_length_threshold = length_threshold;
        self.kanji_penalty = penalty;
        self
    }

    pub fn with_other_penalty(mut self, length_threshold: usize, penalty: i32) -> Self {
        self.other_penalty_length_threshold = length_threshold;
        self.other_penalty = penalty;
        self
    }

    /// Parse a JSON object. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Extra cost for a candidate of `surface` (in characters).
    ///
    /// Normal mode always returns 0. In search and extended mode the cost
    /// grows with every character past the threshold: the kanji penalty for
    /// kanji-only surfaces, the other penalty for the rest.
    pub fn length_penalty(&self, surface: &[char]) -> i64 {
        if !self.mode.applies_penalties() {
            return 0;
        }
        let len = surface.len();
        if len <= self.kanji_penalty_length_threshold {
            return 0;
        }
        if surface.iter().all(|&c| is_kanji(c)) {
            return (len - self.kanji_penalty_length_threshold) as i64 * i64::from(self.kanji_penalty);
        }
        if len > self.other_penalty_length_threshold {
            return (len - self.other_penalty_length_threshold) as i64 * i64::from(self.other_penalty);
        }
        0
    }
}

/// CJK unified ideographs, including extensions and compatibility forms.
pub fn is_kanji(c: char) -> bool {
    matches!(
        c as u32,
        0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF | 0x20000..=0x3134F
    )
}
