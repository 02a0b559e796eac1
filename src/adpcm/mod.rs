//! The DSPADPCM encoder core.
//!
//! Encoding is two sequential scans over a prepared sample sequence: [`train`]
//! derives a table of coefficient pairs from the whole signal, then [`encode`]
//! replays the signal block by block against that table. Both scans work on
//! [`SAMPLES_PER_BLOCK`]-sample blocks and neither performs any I/O.

mod decoder;
mod encoder;
pub mod samples;
#[cfg(test)]
mod testing;
mod trainer;

use serde::{Deserialize, Serialize};

pub use decoder::{decode, BlockDecoder, DecodeError};
pub use encoder::{encode, encode_with, BlockEncoder, Encoded, ScaleFallback};
pub use samples::{block_count, prepare, Padding};
pub use trainer::{train, train_blocks, train_with_report, TrainingReport};

/// The number of samples in one ADPCM block.
pub const SAMPLES_PER_BLOCK: usize = 14;

/// The size of one packed ADPCM block: a header byte plus 14 nibbles.
pub const BYTES_PER_BLOCK: usize = 1 + SAMPLES_PER_BLOCK / 2;

/// The most coefficient pairs a block header can address.
pub const MAX_COEFFICIENT_PAIRS: usize = 16;

/// The largest scale exponent a block header can hold.
pub const MAX_SCALE_EXPONENT: u8 = 15;

/// Predictions and residuals are Q11 fixed-point values.
pub(crate) const FIXED_POINT_SHIFT: u32 = 11;

/// Half of the Q11 scale, added before every shift back to sample range.
pub(crate) const ROUNDING_BIAS: i32 = 1 << (FIXED_POINT_SHIFT - 1);

#[rustfmt::skip]
const NIBBLE_TO_INT: [i32; 16] = [
    0, 1, 2, 3, 4, 5, 6, 7,
    -8, -7, -6, -5, -4, -3, -2, -1,
];

/// Sign-extends a 4-bit nibble code.
pub fn nibble_to_i32(code: u8) -> i32 {
    NIBBLE_TO_INT[(code & 0x0f) as usize]
}

/// Saturates a value to the signed 16-bit sample range.
pub(crate) fn clamp16(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// Reconstructs the sample a decoder produces for a nibble code.
///
/// All arithmetic is 32-bit two's complement and wraps the way the hardware
/// accumulator does. The result is saturated before it is ever used again.
pub(crate) fn reconstruct(prediction: i32, code: u8, exponent: u8) -> i16 {
    let delta = (nibble_to_i32(code) << exponent) << FIXED_POINT_SHIFT;
    let value = delta
        .wrapping_add(ROUNDING_BIAS)
        .wrapping_add(prediction);
    clamp16(value >> FIXED_POINT_SHIFT)
}

/// A pair of linear-prediction coefficients.
///
/// The decoder predicts the next sample as `a1 * hist1 + a2 * hist2` and
/// treats the result as a Q11 value.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct CoefficientPair {
    pub a1: i16,
    pub a2: i16,
}

impl CoefficientPair {
    pub const ZERO: CoefficientPair = CoefficientPair { a1: 0, a2: 0 };

    pub fn new(a1: i16, a2: i16) -> Self {
        Self { a1, a2 }
    }
}

impl From<(i16, i16)> for CoefficientPair {
    fn from((a1, a2): (i16, i16)) -> Self {
        Self { a1, a2 }
    }
}

/// The coefficient pairs shared by every block of a stream.
///
/// A block header addresses a pair by its position in the table.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CoefficientTable {
    pairs: Vec<CoefficientPair>,
}

impl CoefficientTable {
    /// Creates a table from the given pairs. Pairs beyond
    /// [`MAX_COEFFICIENT_PAIRS`] cannot be addressed and are dropped.
    pub fn new(mut pairs: Vec<CoefficientPair>) -> Self {
        pairs.truncate(MAX_COEFFICIENT_PAIRS);
        Self { pairs }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<CoefficientPair> {
        self.pairs.get(index).copied()
    }

    pub fn pairs(&self) -> &[CoefficientPair] {
        &self.pairs
    }

    /// Returns the table padded with zero pairs to `len` entries, as stored in
    /// a fixed-size container header.
    pub fn padded(&self, len: usize) -> Vec<CoefficientPair> {
        let mut pairs = self.pairs.clone();
        pairs.resize(len.max(pairs.len()), CoefficientPair::ZERO);
        pairs
    }
}

/// The decoder state: the two most recently reconstructed samples.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct History {
    pub hist1: i16,
    pub hist2: i16,
}

impl History {
    pub fn new(hist1: i16, hist2: i16) -> Self {
        Self { hist1, hist2 }
    }

    /// The Q11 prediction for the next sample.
    pub(crate) fn predict(self, pair: CoefficientPair) -> i32 {
        (self.hist1 as i32)
            .wrapping_mul(pair.a1 as i32)
            .wrapping_add((self.hist2 as i32).wrapping_mul(pair.a2 as i32))
    }

    /// Returns the prediction for `sample` and its biased Q11 residual.
    pub(crate) fn residual(self, pair: CoefficientPair, sample: i16) -> (i32, i32) {
        let prediction = self.predict(pair);
        let residual = ((sample as i32) << FIXED_POINT_SHIFT)
            .wrapping_sub(prediction)
            .wrapping_sub(ROUNDING_BIAS);
        (prediction, residual)
    }

    /// Shifts `sample` in as the most recent sample.
    #[must_use]
    pub(crate) fn push(self, sample: i16) -> Self {
        Self {
            hist1: sample,
            hist2: self.hist1,
        }
    }
}

impl From<History> for (i16, i16) {
    fn from(h: History) -> Self {
        (h.hist1, h.hist2)
    }
}

/// One packed 8-byte ADPCM block.
///
/// The first byte is `(coefficient_index << 4) | scale_exponent`. The
/// remaining 7 bytes hold 14 nibble codes in sample order, high nibble first.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct AdpcmBlock {
    pub data: [u8; BYTES_PER_BLOCK],
}

impl AdpcmBlock {
    pub fn new(data: [u8; BYTES_PER_BLOCK]) -> Self {
        Self { data }
    }

    /// Packs a header and the nibble codes of one block. Only the low 4 bits
    /// of each argument are kept.
    pub fn pack(
        coefficient_index: u8,
        scale_exponent: u8,
        codes: &[u8; SAMPLES_PER_BLOCK],
    ) -> Self {
        let mut data = [0u8; BYTES_PER_BLOCK];
        data[0] = ((coefficient_index & 0x0f) << 4) | (scale_exponent & 0x0f);
        for (byt, pair) in data[1..].iter_mut().zip(codes.chunks_exact(2)) {
            *byt = ((pair[0] & 0x0f) << 4) | (pair[1] & 0x0f);
        }
        Self { data }
    }

    pub fn header(&self) -> u8 {
        self.data[0]
    }

    pub fn coefficient_index(&self) -> u8 {
        self.data[0] >> 4
    }

    pub fn scale_exponent(&self) -> u8 {
        self.data[0] & 0x0f
    }

    /// Unpacks the 14 nibble codes in sample order.
    pub fn codes(&self) -> [u8; SAMPLES_PER_BLOCK] {
        let mut codes = [0u8; SAMPLES_PER_BLOCK];
        for (pair, byt) in codes.chunks_exact_mut(2).zip(&self.data[1..]) {
            pair[0] = byt >> 4;
            pair[1] = byt & 0x0f;
        }
        codes
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl From<[u8; BYTES_PER_BLOCK]> for AdpcmBlock {
    fn from(data: [u8; BYTES_PER_BLOCK]) -> Self {
        Self { data }
    }
}
