//! Japanese morphological analysis.
//!
//! A [`Dictionary`] bundles the lexicon FST, token attributes, connection
//! costs and the unknown-word model. A [`Tokenizer`] searches the word
//! lattice built from it for the cheapest segmentation, or for the N best
//! ones within a cost budget.
//!
//! - [`dictionary`] -- Load and validate the binary dictionary files
//! - [`builder`] -- Write a dictionary directory from entries
//! - [`user`] -- Small CSV user dictionaries with forced segmentations
//! - [`tokenizer`] -- Lattice construction and search entry points
//! - [`merger`] -- Combine per-segment N-best results

use std::path::PathBuf;

use kaiseki_core::BufferError;
use kaiseki_core::character::CharacterError;
use kaiseki_fst::FstError;

pub mod builder;
pub mod config;
pub mod connection;
pub mod dictionary;
pub mod merger;
pub mod node;
pub mod token;
pub mod tokenizer;
pub mod unknown;
pub mod user;

#[cfg(test)]
mod test_util;

pub use builder::DictionaryBuilder;
pub use config::{Mode, TokenizerConfig};
pub use connection::ConnectionCosts;
pub use dictionary::{Dictionary, DictionaryBytes};
pub use merger::{MultiSearchMerger, MultiSearchResult, ScoredPath};
pub use node::{NodeType, ViterbiNode};
pub use token::{Token, TokenSequence};
pub use tokenizer::Tokenizer;
pub use user::UserDictionary;

/// Errors raised while loading, validating or writing a dictionary.
#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    #[error("malformed lexicon FST: {0}")]
    Fst(#[from] FstError),

    #[error("malformed record buffer: {0}")]
    Buffer(#[from] BufferError),

    #[error("malformed character definitions: {0}")]
    Character(#[from] CharacterError),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dictionary: {0}")]
    Malformed(String),

    #[error("failed to write {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while reading a user dictionary.
#[derive(Debug, thiserror::Error)]
pub enum UserDictionaryError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("failed to read user dictionary: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection ids ({left}, {right}) outside the {forward}x{backward} matrix")]
    ConnectionIdOutOfRange {
        left: u16,
        right: u16,
        forward: usize,
        backward: usize,
    },
}
