use super::*;
use std::fmt;

#[derive(Debug, Eq, PartialEq)]
pub enum DecodeError {
    /// A block header addressed a coefficient pair the table does not have.
    CoefficientIndex { index: u8, table_len: usize },
}

impl std::error::Error for DecodeError {}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::CoefficientIndex { index, table_len } => write!(
                f,
                "coefficient index {index} out of range for a table of {table_len} pair(s)"
            ),
        }
    }
}

/// Decodes packed blocks back to samples, starting from the decoder state
/// `seed`.
///
/// This is the reconstruction the encoder performs in-line, so decoding the
/// output of [`encode`] reproduces the encoder's reconstructed samples
/// exactly.
pub fn decode(
    blocks: &[AdpcmBlock],
    table: &CoefficientTable,
    seed: History,
) -> Result<Vec<i16>, DecodeError> {
    let mut decoder = BlockDecoder::new(table, seed);
    let mut samples = Vec::with_capacity(blocks.len() * SAMPLES_PER_BLOCK);

    for block in blocks {
        samples.extend_from_slice(&decoder.decode_block(block)?);
    }

    Ok(samples)
}

/// Decodes one block at a time, carrying the decoder state between blocks.
#[derive(Clone, Debug)]
pub struct BlockDecoder<'a> {
    table: &'a CoefficientTable,
    history: History,
}

impl<'a> BlockDecoder<'a> {
    pub fn new(table: &'a CoefficientTable, seed: History) -> Self {
        Self {
            table,
            history: seed,
        }
    }

    pub fn history(&self) -> History {
        self.history
    }

    pub fn decode_block(
        &mut self,
        block: &AdpcmBlock,
    ) -> Result<[i16; SAMPLES_PER_BLOCK], DecodeError> {
        let index = block.coefficient_index();
        let pair = self
            .table
            .get(index as usize)
            .ok_or(DecodeError::CoefficientIndex {
                index,
                table_len: self.table.len(),
            })?;
        let exponent = block.scale_exponent();

        let mut samples = [0i16; SAMPLES_PER_BLOCK];
        for (sample, code) in samples.iter_mut().zip(block.codes()) {
            *sample = self.decode(pair, exponent, code);
        }

        Ok(samples)
    }

    /// Decodes a single nibble code and shifts the result into the history.
    fn decode(&mut self, pair: CoefficientPair, exponent: u8, code: u8) -> i16 {
        let sample = reconstruct(self.history.predict(pair), code, exponent);
        self.history = self.history.push(sample);
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adpcm::testing::{mixed_signal, ramp_signal};
    use pretty_assertions::assert_eq;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn encode_and_monitor(
        samples: &[i16],
        table: &CoefficientTable,
        seed: History,
    ) -> (Encoded, Vec<i16>) {
        let mut reconstructed = Vec::new();
        let encoded = encode_with(samples, table, seed, ScaleFallback::Saturate, |block| {
            reconstructed.extend_from_slice(block)
        });
        (encoded, reconstructed)
    }

    #[test]
    fn test_decode_single_code() {
        let table = CoefficientTable::new(vec![CoefficientPair::new(2048, 0)]);
        let mut decoder = BlockDecoder::new(&table, History::new(100, 0));

        // Prediction 100, code -1 at exponent 4 gives 100 - 16, rounded.
        assert_eq!(decoder.decode(CoefficientPair::new(2048, 0), 4, 0xf), 84);
        assert_eq!(decoder.history(), History::new(84, 100));
    }

    #[test]
    fn test_decode_ramp_matches_encoder() {
        let samples = ramp_signal();
        let seed = History::extrapolate(&samples);
        let table = train(&samples, 1);
        let (encoded, reconstructed) = encode_and_monitor(&samples, &table, seed);

        let decoded = decode(&encoded.blocks, &table, seed).unwrap();

        assert_eq!(
            decoded,
            vec![
                -1, -1, 0, 256, 254, 256, 512, 509, 768, 765, 768, 1024, 1021, 1280, 1021, 1026,
                1535, 1531, 1535, 1535, 1535, 2047, 2042, 2047, 2047, 2047, 2559, 2554,
            ]
        );
        assert_eq!(decoded, reconstructed);
    }

    #[test]
    fn test_decode_mixed_matches_encoder() {
        let samples = mixed_signal();
        let seed = History::extrapolate(&samples);

        for count in [1, 8, 16] {
            let table = train(&samples, count);
            let (encoded, reconstructed) = encode_and_monitor(&samples, &table, seed);

            let mut decoder = BlockDecoder::new(&table, seed);
            let mut decoded = Vec::new();
            for block in &encoded.blocks {
                decoded.extend_from_slice(&decoder.decode_block(block).unwrap());
            }

            assert_eq!(decoded, reconstructed);
            assert_eq!(decoder.history(), encoded.final_history);
        }
    }

    #[test]
    fn test_decode_random_matches_encoder() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let samples: Vec<i16> = (0..SAMPLES_PER_BLOCK * 128).map(|_| rng.gen()).collect();
        let seed = History::extrapolate(&samples);
        let table = train(&samples, 16);
        let (encoded, reconstructed) = encode_and_monitor(&samples, &table, seed);

        assert_eq!(decode(&encoded.blocks, &table, seed).unwrap(), reconstructed);
    }

    #[test]
    fn test_decode_rejects_unknown_coefficient_index() {
        let table = CoefficientTable::new(vec![CoefficientPair::ZERO; 2]);
        let block = AdpcmBlock::pack(5, 0, &[0; SAMPLES_PER_BLOCK]);

        let err = decode(&[block], &table, History::default()).unwrap_err();

        assert_eq!(
            err,
            DecodeError::CoefficientIndex {
                index: 5,
                table_len: 2
            }
        );
        assert_eq!(
            err.to_string(),
            "coefficient index 5 out of range for a table of 2 pair(s)"
        );
    }
}
