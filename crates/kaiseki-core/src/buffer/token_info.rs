// Fixed-stride token attribute records.
//
// Header (5 x u32):
//   [buffer byte size][entry count][token info count][pos info count][feature count]
//
// Each entry then occupies exactly `entry_size` bytes:
//   token info  i16 x token_info_count   (left id, right id, word cost, ...)
//   pos info    u8  x pos_info_count     (ids into the POS string table)
//   features    u32 x feature_count      (ids into the feature string table)

use super::{BufferError, ensure_len, read_i16, read_u32};

pub const HEADER_SIZE: usize = 4 * 5;

/// One decoded record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BufferEntry {
    pub token_info: Vec<i16>,
    pub pos_info: Vec<u8>,
    pub feature_info: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Shape {
    token_info_count: usize,
    pos_info_count: usize,
    feature_count: usize,
}

impl Shape {
    fn entry_size(&self) -> usize {
        self.token_info_count * 2 + self.pos_info_count + self.feature_count * 4
    }
}

/// Read-only view over a token info buffer.
#[derive(Clone)]
pub struct TokenInfoBuffer {
    data: Vec<u8>,
    shape: Shape,
    entry_count: usize,
    entry_size: usize,
}

impl std::fmt::Debug for TokenInfoBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenInfoBuffer")
            .field("entry_count", &self.entry_count)
            .field("entry_size", &self.entry_size)
            .field("token_info_count", &self.shape.token_info_count)
            .field("pos_info_count", &self.shape.pos_info_count)
            .field("feature_count", &self.shape.feature_count)
            .finish()
    }
}

impl TokenInfoBuffer {
    /// Validate the header against the buffer length and take ownership.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, BufferError> {
        ensure_len(&data, HEADER_SIZE)?;
        let declared = read_u32(&data, 0) as usize;
        if declared != data.len() {
            return Err(BufferError::Malformed(format!(
                "header declares {declared} bytes, buffer has {}",
                data.len()
            )));
        }
        let entry_count = read_u32(&data, 4) as usize;
        let shape = Shape {
            token_info_count: read_u32(&data, 8) as usize,
            pos_info_count: read_u32(&data, 12) as usize,
            feature_count: read_u32(&data, 16) as usize,
        };
        let entry_size = shape.entry_size();
        let expected = entry_count
            .checked_mul(entry_size)
            .and_then(|body| body.checked_add(HEADER_SIZE))
            .ok_or_else(|| BufferError::Malformed("entry table size overflows".to_string()))?;
        if expected != data.len() {
            return Err(BufferError::Malformed(format!(
                "{entry_count} entries of {entry_size} bytes need {expected} bytes, buffer has {}",
                data.len()
            )));
        }
        Ok(Self {
            data,
            shape,
            entry_count,
            entry_size,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    pub fn entry_size(&self) -> usize {
        self.entry_size
    }

    pub fn token_info_count(&self) -> usize {
        self.shape.token_info_count
    }

    pub fn pos_info_count(&self) -> usize {
        self.shape.pos_info_count
    }

    pub fn feature_count(&self) -> usize {
        self.shape.feature_count
    }

    /// Byte position of entry `offset`.
    #[inline]
    fn position(&self, offset: usize) -> Result<usize, BufferError> {
        if offset >= self.entry_count {
            return Err(BufferError::OutOfRange {
                key: offset,
                size: self.entry_count,
            });
        }
        Ok(HEADER_SIZE + offset * self.entry_size)
    }

    fn check_field(index: usize, count: usize) -> Result<(), BufferError> {
        if index >= count {
            return Err(BufferError::OutOfRange {
                key: index,
                size: count,
            });
        }
        Ok(())
    }

    pub fn lookup_entry(&self, offset: usize) -> Result<BufferEntry, BufferError> {
        let mut pos = self.position(offset)?;
        let data = &self.data;

        let mut token_info = Vec::with_capacity(self.shape.token_info_count);
        for _ in 0..self.shape.token_info_count {
            token_info.push(read_i16(data, pos));
            pos += 2;
        }
        let pos_info = data[pos..pos + self.shape.pos_info_count].to_vec();
        pos += self.shape.pos_info_count;
        let mut feature_info = Vec::with_capacity(self.shape.feature_count);
        for _ in 0..self.shape.feature_count {
            feature_info.push(read_u32(data, pos));
            pos += 4;
        }

        Ok(BufferEntry {
            token_info,
            pos_info,
            feature_info,
        })
    }

    #[inline]
    pub fn lookup_token_info(&self, offset: usize, i: usize) -> Result<i16, BufferError> {
        Self::check_field(i, self.shape.token_info_count)?;
        let pos = self.position(offset)? + i * 2;
        Ok(read_i16(&self.data, pos))
    }

    #[inline]
    pub fn lookup_pos_info(&self, offset: usize, i: usize) -> Result<u8, BufferError> {
        Self::check_field(i, self.shape.pos_info_count)?;
        let pos = self.position(offset)? + self.shape.token_info_count * 2 + i;
        Ok(self.data[pos])
    }

    #[inline]
    pub fn lookup_feature(&self, offset: usize, i: usize) -> Result<u32, BufferError> {
        Self::check_field(i, self.shape.feature_count)?;
        let pos = self.position(offset)?
            + self.shape.token_info_count * 2
            + self.shape.pos_info_count
            + i * 4;
        Ok(read_u32(&self.data, pos))
    }
}

/// One-shot write path for [`TokenInfoBuffer`].
#[derive(Debug)]
pub struct TokenInfoBufferWriter {
    shape: Shape,
    body: Vec<u8>,
    entry_count: usize,
}

impl TokenInfoBufferWriter {
    pub fn new(token_info_count: usize, pos_info_count: usize, feature_count: usize) -> Self {
        Self {
            shape: Shape {
                token_info_count,
                pos_info_count,
                feature_count,
            },
            body: Vec::new(),
            entry_count: 0,
        }
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Append an entry and return its offset. Every entry must carry the
    /// counts given to [`TokenInfoBufferWriter::new`].
    pub fn push(
        &mut self,
        token_info: &[i16],
        pos_info: &[u8],
        feature_info: &[u32],
    ) -> Result<usize, BufferError> {
        let checks = [
            ("token info", self.shape.token_info_count, token_info.len()),
            ("pos info", self.shape.pos_info_count, pos_info.len()),
            ("feature", self.shape.feature_count, feature_info.len()),
        ];
        for (field, expected, actual) in checks {
            if expected != actual {
                return Err(BufferError::InconsistentEntry {
                    field,
                    expected,
                    actual,
                });
            }
        }

        for v in token_info {
            self.body.extend_from_slice(&v.to_le_bytes());
        }
        self.body.extend_from_slice(pos_info);
        for v in feature_info {
            self.body.extend_from_slice(&v.to_le_bytes());
        }
        self.entry_count += 1;
        Ok(self.entry_count - 1)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        let total = HEADER_SIZE + self.body.len();
        let mut buf = Vec::with_capacity(total);
        for v in [
            total,
            self.entry_count,
            self.shape.token_info_count,
            self.shape.pos_info_count,
            self.shape.feature_count,
        ] {
            buf.extend_from_slice(&(v as u32).to_le_bytes());
        }
        buf.extend_from_slice(&self.body);
        buf
    }
}
