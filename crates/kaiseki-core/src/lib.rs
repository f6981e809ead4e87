//! Shared building blocks for the kaiseki tokenizer.
//!
//! - [`buffer`] -- Persisted binary record buffers addressed by integer ids
//! - [`character`] -- Code point to character category classification

pub mod buffer;
pub mod character;

pub use buffer::BufferError;
