// Binary record buffers shared by the dictionary files.
//
// Every buffer is a plain byte array with an explicit little-endian layout,
// so files written on one host read back identically on any other.

mod feature_map;
mod string_map;
mod token_info;
mod word_id_map;

pub use feature_map::FeatureInfoMap;
pub use string_map::{KATAKANA_BASE, KATAKANA_FLAG, KATAKANA_LENGTH_MASK, StringValueMapBuffer};
pub use token_info::{BufferEntry, TokenInfoBuffer, TokenInfoBufferWriter};
pub use word_id_map::{WordIdMap, WordIdMapWriter};

/// Error type for reading and writing record buffers.
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("buffer too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("malformed buffer: {0}")]
    Malformed(String),
    #[error("key {key} out of range (size {size})")]
    OutOfRange { key: usize, size: usize },
    #[error("string of {0} bytes exceeds the 0x7FFF length limit")]
    StringTooLong(usize),
    #[error("entry has {actual} {field} values, buffer expects {expected}")]
    InconsistentEntry {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

// ---------------------------------------------------------------------------
// Little-endian primitives
// ---------------------------------------------------------------------------

#[inline]
pub fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

#[inline]
pub fn read_i16(data: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([data[offset], data[offset + 1]])
}

#[inline]
pub fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

#[inline]
pub fn read_i32(data: &[u8], offset: usize) -> i32 {
    read_u32(data, offset) as i32
}

/// Fail with `TooShort` unless `data` holds at least `expected` bytes.
pub fn ensure_len(data: &[u8], expected: usize) -> Result<(), BufferError> {
    if data.len() < expected {
        return Err(BufferError::TooShort {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Copy `count` little-endian `i32` values starting at `offset` into an
/// aligned vector.
pub fn read_i32_array(data: &[u8], offset: usize, count: usize) -> Result<Vec<i32>, BufferError> {
    let byte_len = count
        .checked_mul(4)
        .ok_or_else(|| BufferError::Malformed(format!("array length {count} overflows")))?;
    ensure_len(data, offset + byte_len)?;
    let mut values = vec![0i32; count];
    bytemuck::cast_slice_mut::<i32, u8>(&mut values).copy_from_slice(&data[offset..offset + byte_len]);
    for v in &mut values {
        *v = i32::from_le(*v);
    }
    Ok(values)
}

/// Append a `u32` length prefix followed by the values.
pub fn write_i32_array(buf: &mut Vec<u8>, values: &[i32]) {
    buf.extend_from_slice(&(values.len() as u32).to_le_bytes());
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
}
