// Compiled FST binary format: header, state records, arc records, footer.
//
// Layout (all integers little-endian):
//
//   [cookie u32][version u32]            header
//   state record*                         children before parents
//   [root address u32]                    footer, the entry point
//
// State record:
//
//   [marker u8]                           MARKER_PLAIN or MARKER_ACCEPT
//   [final output u32]                    only when MARKER_ACCEPT
//   [arc count u32]
//   [ArcRecord; arc count]                ascending label order
//
// An arc stores `delta = state_start - target_start`, which is always > 0.

use bytemuck::{Pod, Zeroable};

use crate::FstError;

const COOKIE: u32 = 0x5453_464B; // "KFST"
const VERSION: u32 = 1;

/// Size of the leading header in bytes.
pub const HEADER_SIZE: usize = 8;

/// Size of the trailing root-address footer in bytes.
pub const FOOTER_SIZE: usize = 4;

pub const MARKER_PLAIN: u8 = 0;
pub const MARKER_ACCEPT: u8 = 1;

/// One serialized arc (12 bytes).
///
/// Arcs are read with `bytemuck::pod_read_unaligned` because state records
/// start at arbitrary byte offsets.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct ArcRecord {
    pub label: u16,
    pub _reserved: u16,
    pub output: u32,
    pub delta: u32,
}

pub const ARC_RECORD_SIZE: usize = size_of::<ArcRecord>();

const _: () = assert!(size_of::<ArcRecord>() == 12);

impl ArcRecord {
    pub fn new(label: u16, output: u32, delta: u32) -> Self {
        Self {
            label: label.to_le(),
            _reserved: 0,
            output: output.to_le(),
            delta: delta.to_le(),
        }
    }

    /// Read a record from `bytes` (at least `ARC_RECORD_SIZE` long) and
    /// convert the fields to host byte order.
    #[inline]
    pub fn read(bytes: &[u8]) -> Self {
        let raw: ArcRecord = bytemuck::pod_read_unaligned(&bytes[..ARC_RECORD_SIZE]);
        Self {
            label: u16::from_le(raw.label),
            _reserved: 0,
            output: u32::from_le(raw.output),
            delta: u32::from_le(raw.delta),
        }
    }
}

pub fn write_header(buf: &mut Vec<u8>) {
    buf.extend_from_slice(&COOKIE.to_le_bytes());
    buf.extend_from_slice(&VERSION.to_le_bytes());
}

/// Validate the header and return the root state address from the footer.
pub fn parse_frame(data: &[u8]) -> Result<usize, FstError> {
    let min = HEADER_SIZE + FOOTER_SIZE;
    if data.len() < min {
        return Err(FstError::TooShort {
            expected: min,
            actual: data.len(),
        });
    }
    if read_u32(data, 0) != COOKIE {
        return Err(FstError::Malformed("invalid magic number".to_string()));
    }
    let version = read_u32(data, 4);
    if version != VERSION {
        return Err(FstError::Malformed(format!("unsupported version {version}")));
    }
    let root = read_u32(data, data.len() - FOOTER_SIZE) as usize;
    if root < HEADER_SIZE || root >= data.len() - FOOTER_SIZE {
        return Err(FstError::Malformed(format!("root address {root} out of range")));
    }
    Ok(root)
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
