use super::{History, SAMPLES_PER_BLOCK};
use serde::{Deserialize, Serialize};

/// How a sample sequence whose length is not a multiple of
/// [`SAMPLES_PER_BLOCK`] is brought to whole blocks.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum Padding {
    /// Pad the final partial block with trailing zeros.
    #[default]
    Zero,
    /// Drop the final partial block.
    Truncate,
}

/// Returns the number of blocks needed to hold `sample_count` samples.
pub fn block_count(sample_count: usize) -> usize {
    sample_count.div_ceil(SAMPLES_PER_BLOCK)
}

/// Brings `samples` to a whole number of blocks.
pub fn prepare(samples: &[i16], padding: Padding) -> Vec<i16> {
    let remainder = samples.len() % SAMPLES_PER_BLOCK;
    if remainder == 0 {
        return samples.to_vec();
    }

    match padding {
        Padding::Zero => {
            let len = block_count(samples.len()) * SAMPLES_PER_BLOCK;
            let mut data = Vec::with_capacity(len);
            data.extend_from_slice(samples);
            data.resize(len, 0);
            data
        }
        Padding::Truncate => samples[..samples.len() - remainder].to_vec(),
    }
}

impl History {
    /// Extrapolates the decoder state before the first sample.
    ///
    /// The slope between the first two samples is continued backwards, so the
    /// first block is predicted from a plausible past rather than silence.
    /// Arithmetic wraps at 16 bits like the stored header fields.
    pub fn extrapolate(samples: &[i16]) -> Self {
        let s0 = samples.first().copied().unwrap_or(0);
        let s1 = samples.get(1).copied().unwrap_or(0);

        let slope = s1.wrapping_sub(s0);
        let hist1 = s0.wrapping_sub(slope);
        let hist2 = hist1.wrapping_sub(slope);

        Self { hist1, hist2 }
    }
}
