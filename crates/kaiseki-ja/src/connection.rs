// Bigram connection cost matrix.
//
// File layout (little endian):
//   [forward size i32][backward size i32][cost i16 x forward * backward]
//
// The forward id is the right id of the left word, the backward id the left
// id of the right word. Rows are forward ids.

use kaiseki_core::buffer::{ensure_len, read_i16, read_i32};

use crate::DictionaryError;

const HEADER_SIZE: usize = 8;

#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionCosts {
    forward_size: usize,
    backward_size: usize,
    costs: Vec<i16>,
}

impl std::fmt::Debug for ConnectionCosts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionCosts")
            .field("forward_size", &self.forward_size)
            .field("backward_size", &self.backward_size)
            .finish()
    }
}

impl ConnectionCosts {
    /// All-zero matrix.
    pub fn new(forward_size: usize, backward_size: usize) -> Self {
        Self {
            forward_size,
            backward_size,
            costs: vec![0; forward_size * backward_size],
        }
    }

    /// Wrap a row-major cost grid.
    pub fn from_costs(
        forward_size: usize,
        backward_size: usize,
        costs: Vec<i16>,
    ) -> Result<Self, DictionaryError> {
        if costs.len() != forward_size * backward_size {
            return Err(DictionaryError::Malformed(format!(
                "{forward_size}x{backward_size} connection matrix given {} costs",
                costs.len()
            )));
        }
        Ok(Self {
            forward_size,
            backward_size,
            costs,
        })
    }

    pub fn forward_size(&self) -> usize {
        self.forward_size
    }

    pub fn backward_size(&self) -> usize {
        self.backward_size
    }

    pub fn set(&mut self, forward_id: u16, backward_id: u16, cost: i16) {
        let index = self.index(forward_id, backward_id);
        self.costs[index] = cost;
    }

    #[inline]
    fn index(&self, forward_id: u16, backward_id: u16) -> usize {
        usize::from(forward_id) * self.backward_size + usize::from(backward_id)
    }

    /// Cost of placing a word with left id `backward_id` after a word with
    /// right id `forward_id`. Ids are checked when the dictionary loads.
    #[inline]
    pub fn cost(&self, forward_id: u16, backward_id: u16) -> i64 {
        i64::from(self.costs[self.index(forward_id, backward_id)])
    }

    /// Whether `forward_id`/`backward_id` address a cell.
    pub fn contains(&self, forward_id: i16, backward_id: i16) -> bool {
        forward_id >= 0
            && backward_id >= 0
            && (forward_id as usize) < self.forward_size
            && (backward_id as usize) < self.backward_size
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_SIZE + self.costs.len() * 2);
        buf.extend_from_slice(&(self.forward_size as i32).to_le_bytes());
        buf.extend_from_slice(&(self.backward_size as i32).to_le_bytes());
        for cost in &self.costs {
            buf.extend_from_slice(&cost.to_le_bytes());
        }
        buf
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, DictionaryError> {
        ensure_len(data, HEADER_SIZE)?;
        let forward = read_i32(data, 0);
        let backward = read_i32(data, 4);
        if forward < 0 || backward < 0 || forward > i32::from(u16::MAX) || backward > i32::from(u16::MAX) {
            return Err(DictionaryError::Malformed(format!(
                "connection matrix dimensions {forward}x{backward} out of range"
            )));
        }
        let (forward_size, backward_size) = (forward as usize, backward as usize);
        let expected = HEADER_SIZE + forward_size * backward_size * 2;
        if data.len() != expected {
            return Err(DictionaryError::Malformed(format!(
                "{forward_size}x{backward_size} connection matrix needs {expected} bytes, file has {}",
                data.len()
            )));
        }
        let costs = (0..forward_size * backward_size)
            .map(|i| read_i16(data, HEADER_SIZE + i * 2))
            .collect();
        Ok(Self {
            forward_size,
            backward_size,
            costs,
        })
    }
}
