// Interned string table keyed by dense integer ids.
//
// Layout:
//   [size u32][entry offset u32 x size][entry]*
//
// Entry:
//   [length u16][payload]
//
// Katakana-only values are packed one byte per character (code point minus
// KATAKANA_BASE) with KATAKANA_FLAG set on the length, which then counts
// characters. Everything else is raw UTF-16LE and the length counts bytes.

use super::{BufferError, ensure_len, read_u16, read_u32};

pub const KATAKANA_FLAG: u16 = 0x8000;
pub const KATAKANA_LENGTH_MASK: u16 = 0x7FFF;
pub const KATAKANA_BASE: u32 = 0x30A0;

const KATAKANA_LAST: u32 = 0x30FF;

fn is_katakana(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| (KATAKANA_BASE..=KATAKANA_LAST).contains(&(c as u32)))
}

/// Read-only string table.
#[derive(Clone)]
pub struct StringValueMapBuffer {
    data: Vec<u8>,
    size: usize,
}

impl std::fmt::Debug for StringValueMapBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StringValueMapBuffer")
            .field("size", &self.size)
            .field("byte_len", &self.data.len())
            .finish()
    }
}

impl StringValueMapBuffer {
    /// Encode `values` so that `values[i]` is stored under key `i`.
    pub fn encode<S: AsRef<str>>(values: &[S]) -> Result<Vec<u8>, BufferError> {
        let table_end = 4 + 4 * values.len();
        let mut offsets = Vec::with_capacity(values.len());
        let mut entries: Vec<u8> = Vec::new();

        for value in values {
            let value = value.as_ref();
            offsets.push((table_end + entries.len()) as u32);
            if is_katakana(value) {
                let len = value.chars().count();
                if len > KATAKANA_LENGTH_MASK as usize {
                    return Err(BufferError::StringTooLong(len));
                }
                entries.extend_from_slice(&(len as u16 | KATAKANA_FLAG).to_le_bytes());
                entries.extend(value.chars().map(|c| (c as u32 - KATAKANA_BASE) as u8));
            } else {
                let len = value.encode_utf16().count() * 2;
                if len > KATAKANA_LENGTH_MASK as usize {
                    return Err(BufferError::StringTooLong(len));
                }
                entries.extend_from_slice(&(len as u16).to_le_bytes());
                for unit in value.encode_utf16() {
                    entries.extend_from_slice(&unit.to_le_bytes());
                }
            }
        }

        let mut buf = Vec::with_capacity(table_end + entries.len());
        buf.extend_from_slice(&(values.len() as u32).to_le_bytes());
        for offset in offsets {
            buf.extend_from_slice(&offset.to_le_bytes());
        }
        buf.extend_from_slice(&entries);
        Ok(buf)
    }

    /// Validate the offset table and every entry's extent.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, BufferError> {
        ensure_len(&data, 4)?;
        let size = read_u32(&data, 0) as usize;
        let table_end = size
            .checked_mul(4)
            .and_then(|t| t.checked_add(4))
            .ok_or_else(|| BufferError::Malformed("offset table overflows".to_string()))?;
        ensure_len(&data, table_end)?;

        for key in 0..size {
            let offset = read_u32(&data, 4 + key * 4) as usize;
            if offset < table_end || offset + 2 > data.len() {
                return Err(BufferError::Malformed(format!(
                    "entry {key} offset {offset} out of bounds"
                )));
            }
            let (katakana, len) = split_length(read_u16(&data, offset));
            if offset + 2 + len > data.len() {
                return Err(BufferError::Malformed(format!("entry {key} payload truncated")));
            }
            if !katakana && len % 2 != 0 {
                return Err(BufferError::Malformed(format!(
                    "entry {key} has odd UTF-16 byte length {len}"
                )));
            }
        }

        Ok(Self { data, size })
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Decode the value stored under `key`.
    pub fn get(&self, key: usize) -> Result<String, BufferError> {
        if key >= self.size {
            return Err(BufferError::OutOfRange {
                key,
                size: self.size,
            });
        }
        let offset = read_u32(&self.data, 4 + key * 4) as usize;
        let (katakana, len) = split_length(read_u16(&self.data, offset));
        let payload = &self.data[offset + 2..offset + 2 + len];

        if katakana {
            Ok(payload
                .iter()
                .filter_map(|&b| char::from_u32(KATAKANA_BASE + u32::from(b)))
                .collect())
        } else {
            let units = payload
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
            Ok(char::decode_utf16(units)
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect())
        }
    }

    /// Like [`get`](Self::get) for keys known to be valid.
    ///
    /// # Panics
    ///
    /// Panics if `key` is outside `0..len()`. Dictionaries validate every
    /// stored reference at load time, so this only fires on a broken invariant.
    pub fn value(&self, key: usize) -> String {
        match self.get(key) {
            Ok(value) => value,
            Err(e) => panic!("string table lookup failed: {e}"),
        }
    }
}

fn split_length(raw: u16) -> (bool, usize) {
    (
        raw & KATAKANA_FLAG != 0,
        (raw & KATAKANA_LENGTH_MASK) as usize,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(values: &[&str]) -> StringValueMapBuffer {
        StringValueMapBuffer::from_bytes(StringValueMapBuffer::encode(values).unwrap()).unwrap()
    }

    #[test]
    fn katakana_values_round_trip_packed() {
        let values = ["カタカナ", "ヴァイオリン", "ー", "ヽヾ"];
        let map = table(&values);
        for (i, v) in values.iter().enumerate() {
            assert_eq!(map.get(i).unwrap(), *v);
        }
        // one byte per char plus the 2-byte length
        let bytes = StringValueMapBuffer::encode(&["カタカナ"]).unwrap();
        assert_eq!(bytes.len(), 4 + 4 + 2 + 4);
        assert_eq!(read_u16(&bytes, 8), 4 | KATAKANA_FLAG);
    }

    #[test]
    fn other_values_round_trip_raw() {
        let values = ["名詞", "固有名詞", "*", "", "mixedカナ", "\u{20B9F}"];
        let map = table(&values);
        for (i, v) in values.iter().enumerate() {
            assert_eq!(map.get(i).unwrap(), *v);
        }
    }

    #[test]
    fn get_out_of_range() {
        let map = table(&["a", "b"]);
        assert_eq!(map.len(), 2);
        assert!(matches!(
            map.get(2),
            Err(BufferError::OutOfRange { key: 2, size: 2 })
        ));
    }

    #[test]
    #[should_panic(expected = "string table lookup failed")]
    fn value_panics_out_of_range() {
        table(&["a"]).value(5);
    }

    #[test]
    fn rejects_too_long_value() {
        let long = "x".repeat(0x4000);
        assert!(matches!(
            StringValueMapBuffer::encode(&[long]),
            Err(BufferError::StringTooLong(0x8000))
        ));
    }

    #[test]
    fn long_katakana_within_limit() {
        let long = "ア".repeat(0x7FFF);
        let map = table(&[long.as_str()]);
        assert_eq!(map.get(0).unwrap().chars().count(), 0x7FFF);
    }

    #[test]
    fn rejects_offset_past_end() {
        let mut bytes = StringValueMapBuffer::encode(&["abc"]).unwrap();
        bytes[4..8].copy_from_slice(&1000u32.to_le_bytes());
        assert!(matches!(
            StringValueMapBuffer::from_bytes(bytes),
            Err(BufferError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_truncated_table() {
        let bytes = 3u32.to_le_bytes().to_vec();
        assert!(matches!(
            StringValueMapBuffer::from_bytes(bytes),
            Err(BufferError::TooShort { .. })
        ));
    }
}
