//! Minimal acyclic finite state transducer for lexicon lookup.
//!
//! Inputs are strings of UTF-16 code units (surrogate halves are independent
//! labels), outputs are non-negative integers accumulated along the arcs.
//!
//! # Architecture
//!
//! - [`state`] -- Frozen `State`/`Arc` arena and the `StateGraph` it forms
//! - [`builder`] -- Incremental minimal construction from sorted pairs
//! - [`format`] -- Compiled byte layout: header, state/arc records, footer
//! - [`compiler`] -- Serialization of a `StateGraph` into that layout
//! - [`fst`] -- Validated read-only runtime with `lookup`/`longest_match`

pub mod builder;
pub mod compiler;
pub mod format;
pub mod fst;
pub mod state;

pub use builder::Builder;
pub use compiler::Compiler;
pub use fst::{Cursor, Fst, Lookup};

/// Error type for FST construction and loading.
#[derive(Debug, thiserror::Error)]
pub enum FstError {
    #[error("inputs must be strictly increasing: {current:?} after {previous:?}")]
    InvalidOrder { previous: String, current: String },
    #[error("duplicate input {0:?}")]
    DuplicateEntry(String),
    #[error("no transduction for {0:?}")]
    NotFound(String),
    #[error("buffer too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("malformed FST: {0}")]
    Malformed(String),
}
