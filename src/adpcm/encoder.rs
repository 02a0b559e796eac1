use super::*;
use tracing::{debug, warn};

/// What to do with a block whose residuals no scale exponent can contain.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum ScaleFallback {
    /// Use the largest exponent, [`MAX_SCALE_EXPONENT`].
    #[default]
    Saturate,
    /// Use exponent 0, as the legacy encoder did.
    Zero,
}

impl ScaleFallback {
    fn exponent(self) -> u8 {
        match self {
            ScaleFallback::Saturate => MAX_SCALE_EXPONENT,
            ScaleFallback::Zero => 0,
        }
    }
}

/// The result of encoding a whole sample sequence.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Encoded {
    pub blocks: Vec<AdpcmBlock>,
    /// The decoder state after the last sample of the last block.
    pub final_history: History,
    /// The sum of `original - reconstructed` over every sample. Positive and
    /// negative errors cancel; this is a quality figure only.
    pub error: i64,
}

impl Encoded {
    pub fn sample_count(&self) -> usize {
        self.blocks.len() * SAMPLES_PER_BLOCK
    }

    /// The diagnostic error per sample, truncated.
    pub fn mean_error(&self) -> i64 {
        match self.sample_count() {
            0 => 0,
            n => self.error / n as i64,
        }
    }
}

/// Encodes `samples` against `table`, starting from the decoder state `seed`.
///
/// A trailing partial block is padded with zeros.
pub fn encode(samples: &[i16], table: &CoefficientTable, seed: History) -> Encoded {
    encode_with(samples, table, seed, ScaleFallback::default(), |_| {})
}

/// Like [`encode`], with an explicit scale fallback. `sink` receives the
/// reconstructed samples of every block, in order, exactly as a decoder would
/// produce them.
pub fn encode_with<F>(
    samples: &[i16],
    table: &CoefficientTable,
    seed: History,
    fallback: ScaleFallback,
    mut sink: F,
) -> Encoded
where
    F: FnMut(&[i16]),
{
    let mut encoder = BlockEncoder::new(table, seed, fallback);
    encoder.blocks.reserve(block_count(samples.len()));

    for chunk in samples.chunks(SAMPLES_PER_BLOCK) {
        let mut block = [0i16; SAMPLES_PER_BLOCK];
        block[..chunk.len()].copy_from_slice(chunk);

        let (_, reconstructed) = encoder.encode_block(&block);
        sink(&reconstructed);
    }

    debug!(
        blocks = encoder.block_count(),
        error = encoder.error(),
        "encoded sample sequence"
    );

    encoder.finish()
}

/// Encodes one block at a time, carrying the decoder state between blocks.
///
/// Blocks must be fed in order: each block is predicted from the samples
/// reconstructed for the previous one.
#[derive(Clone, Debug)]
pub struct BlockEncoder<'a> {
    table: &'a CoefficientTable,
    history: History,
    fallback: ScaleFallback,
    blocks: Vec<AdpcmBlock>,
    error: i64,
}

impl<'a> BlockEncoder<'a> {
    pub fn new(table: &'a CoefficientTable, seed: History, fallback: ScaleFallback) -> Self {
        Self {
            table,
            history: seed,
            fallback,
            blocks: Vec::new(),
            error: 0,
        }
    }

    /// The decoder state the next block will be predicted from.
    pub fn history(&self) -> History {
        self.history
    }

    /// The accumulated diagnostic error so far.
    pub fn error(&self) -> i64 {
        self.error
    }

    /// The number of blocks encoded so far.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Consumes the encoder, returning every block encoded so far.
    pub fn finish(self) -> Encoded {
        Encoded {
            blocks: self.blocks,
            final_history: self.history,
            error: self.error,
        }
    }

    /// Encodes one block, returning the packed block and the samples a decoder
    /// will reconstruct from it.
    pub fn encode_block(
        &mut self,
        samples: &[i16; SAMPLES_PER_BLOCK],
    ) -> (AdpcmBlock, [i16; SAMPLES_PER_BLOCK]) {
        let index = self.select_predictor(samples);
        let pair = self.table.get(index).unwrap_or_default();

        let (min, max) = self.residual_range(pair, samples);
        let exponent = match scale_exponent(min, max) {
            Some(exponent) => exponent,
            None => {
                let exponent = self.fallback.exponent();
                warn!(
                    block = self.blocks.len(),
                    min,
                    max,
                    exponent,
                    "no scale exponent contains the block residuals"
                );
                exponent
            }
        };

        let (codes, reconstructed) = self.quantize(pair, exponent, samples);
        let block = AdpcmBlock::pack(index as u8, exponent, &codes);
        self.blocks.push(block);

        (block, reconstructed)
    }

    /// Picks the coefficient pair whose signed prediction error over the block
    /// sums closest to zero. The first pair wins ties.
    ///
    /// Candidates are replayed with their raw predictions as history, not with
    /// quantized reconstructions. The sum is a wrapping 32-bit accumulator
    /// compared by magnitude, so `i32::MIN` ranks as `2^31`. Large pairs can
    /// wrap it, and the bitstream depends on that.
    fn select_predictor(&self, samples: &[i16; SAMPLES_PER_BLOCK]) -> usize {
        let mut best_index = 0;
        let mut best_error = u32::MAX;

        for (index, &pair) in self.table.pairs().iter().enumerate() {
            let mut history = self.history;
            let mut error = 0i32;

            for &sample in samples {
                let (prediction, residual) = history.residual(pair, sample);
                error = error.wrapping_add(residual);
                history = history.push(clamp16(prediction >> FIXED_POINT_SHIFT));
            }

            if error.unsigned_abs() < best_error {
                best_error = error.unsigned_abs();
                best_index = index;
            }
        }

        best_index
    }

    /// Returns the smallest and largest residual of the block in sample units.
    /// Both bounds include zero.
    fn residual_range(
        &self,
        pair: CoefficientPair,
        samples: &[i16; SAMPLES_PER_BLOCK],
    ) -> (i32, i32) {
        let mut history = self.history;
        let mut min = 0;
        let mut max = 0;

        for &sample in samples {
            let (prediction, residual) = history.residual(pair, sample);
            let residual = residual >> FIXED_POINT_SHIFT;
            max = max.max(residual);
            min = min.min(residual);
            history = history.push(clamp16(prediction >> FIXED_POINT_SHIFT));
        }

        (min, max)
    }

    /// Quantizes the block to nibble codes and advances the shared history with
    /// the decoder's reconstruction of each code.
    fn quantize(
        &mut self,
        pair: CoefficientPair,
        exponent: u8,
        samples: &[i16; SAMPLES_PER_BLOCK],
    ) -> ([u8; SAMPLES_PER_BLOCK], [i16; SAMPLES_PER_BLOCK]) {
        let mut codes = [0u8; SAMPLES_PER_BLOCK];
        let mut reconstructed = [0i16; SAMPLES_PER_BLOCK];

        for (i, &sample) in samples.iter().enumerate() {
            let (prediction, residual) = self.history.residual(pair, sample);
            let code = ((residual >> FIXED_POINT_SHIFT) >> exponent) & 0x0f;
            codes[i] = code as u8;

            let value = reconstruct(prediction, codes[i], exponent);
            self.history = self.history.push(value);
            self.error += sample as i64 - value as i64;
            reconstructed[i] = value;
        }

        (codes, reconstructed)
    }
}

/// Finds the smallest exponent `e` for which every residual in `min..=max`
/// fits a signed 4-bit code after a shift by `e`.
fn scale_exponent(min: i32, max: i32) -> Option<u8> {
    (0..=MAX_SCALE_EXPONENT).find(|&e| {
        let limit = 1i32 << (e + 3);
        limit > max && limit >= -min
    })
}
