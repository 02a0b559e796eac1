//! The DSPADPCM container: a big-endian header followed by packed 8-byte
//! blocks.

mod decoder;
mod encoder;

use crate::{
    adpcm::{self, AdpcmBlock, CoefficientTable, History, TrainingReport, SAMPLES_PER_BLOCK},
    config::{EncoderConfig, InvalidConfig},
};
use hound::{SampleFormat as WavSampleFormat, WavSpec, WavWriter};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::io;
use tracing::info;

pub use decoder::{DecodeError, Decoder};
pub use encoder::{EncodeError, Encoder};

/// The number of nibbles one block occupies in the stream, header included.
pub const NIBBLES_PER_BLOCK: u32 = 16;

/// The arrangement of the container header.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum HeaderLayout {
    /// The 96-byte header with room for 8 coefficient pairs.
    #[default]
    Standard,
    /// The standard header with room for 16 coefficient pairs, 128 bytes.
    Extended,
}

impl HeaderLayout {
    pub fn coefficient_slots(self) -> usize {
        match self {
            HeaderLayout::Standard => 8,
            HeaderLayout::Extended => 16,
        }
    }

    /// The size of the header in bytes.
    pub fn size(self) -> usize {
        // 28 bytes of counts and addresses, 4 bytes per coefficient pair, 14
        // bytes of gain and predictor state, 22 bytes of padding.
        28 + 4 * self.coefficient_slots() + 14 + 22
    }
}

/// The sample encoding named in the header. Only ADPCM streams are produced
/// or decoded.
#[repr(u16)]
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, IntoPrimitive, PartialEq, Serialize, TryFromPrimitive,
)]
pub enum Format {
    #[default]
    Adpcm = 0x00,
    Pcm16 = 0x0a,
    Pcm8 = 0x19,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct DspHeader {
    /// The number of real samples. Padding samples in the last block are not
    /// counted.
    pub sample_count: u32,
    /// The number of nibbles in the stream, block headers included.
    pub nibble_count: u32,
    pub sample_rate: u32,
    pub loop_flag: u16,
    pub format: Format,
    pub loop_start: u32,
    pub loop_end: u32,
    pub current_address: u32,
    pub coefficients: CoefficientTable,
    pub gain: i16,
    /// The header byte of the first block.
    pub predictor_scale: u16,
    /// The decoder state before the first sample.
    pub history: History,
    pub loop_predictor_scale: u16,
    pub loop_history: History,
}

impl DspHeader {
    pub fn block_count(&self) -> usize {
        self.nibble_count.div_ceil(NIBBLES_PER_BLOCK) as usize
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DspAudio {
    pub layout: HeaderLayout,
    pub header: DspHeader,
    pub blocks: Vec<AdpcmBlock>,
}

/// What an encode produced besides the container itself.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct EncodeSummary {
    pub blocks: usize,
    pub distinct_pairs: usize,
    /// The decoder state after the last sample.
    pub final_history: History,
    /// The summed `original - reconstructed` error.
    pub error: i64,
    pub mean_error: i64,
}

impl DspAudio {
    /// Trains a coefficient table for `samples` and encodes them.
    ///
    /// `sink` receives the reconstructed samples block by block, padding
    /// included.
    pub fn from_pcm<F>(
        samples: &[i16],
        sample_rate: u32,
        config: &EncoderConfig,
        sink: F,
    ) -> Result<(DspAudio, EncodeSummary), InvalidConfig>
    where
        F: FnMut(&[i16]),
    {
        config.validate()?;

        let prepared = adpcm::prepare(samples, config.padding);
        let seed = History::extrapolate(&prepared);
        // Trained on the raw input so a dropped partial block still serves as
        // look-ahead for the last kept one.
        let (table, TrainingReport { distinct_pairs, .. }) = adpcm::train_blocks(
            samples,
            adpcm::block_count(prepared.len()),
            config.coefficient_count,
        );
        let encoded = adpcm::encode_with(&prepared, &table, seed, config.scale_fallback, sink);

        let summary = EncodeSummary {
            blocks: encoded.blocks.len(),
            distinct_pairs,
            final_history: encoded.final_history,
            error: encoded.error,
            mean_error: encoded.mean_error(),
        };
        info!(
            samples = samples.len(),
            blocks = summary.blocks,
            mean_error = summary.mean_error,
            "encoded dspadpcm stream"
        );

        let sample_count = samples.len().min(prepared.len()) as u32;
        let audio = DspAudio::new(
            config.layout,
            sample_count,
            sample_rate,
            table,
            seed,
            encoded.blocks,
        );

        Ok((audio, summary))
    }

    /// Assembles a container around already encoded blocks. The coefficient
    /// table is padded with zero pairs to fill the layout.
    pub fn new(
        layout: HeaderLayout,
        sample_count: u32,
        sample_rate: u32,
        coefficients: CoefficientTable,
        history: History,
        blocks: Vec<AdpcmBlock>,
    ) -> Self {
        let header = DspHeader {
            sample_count,
            nibble_count: blocks.len() as u32 * NIBBLES_PER_BLOCK,
            sample_rate,
            predictor_scale: blocks.first().map_or(0, |b| b.header() as u16),
            coefficients: CoefficientTable::new(coefficients.padded(layout.coefficient_slots())),
            history,
            ..Default::default()
        };

        Self {
            layout,
            header,
            blocks,
        }
    }

    pub fn channel_count(&self) -> usize {
        1
    }

    /// Decodes the stream to 16-bit samples, dropping block padding.
    pub fn samples(&self) -> Result<Vec<i16>, adpcm::DecodeError> {
        let mut samples = adpcm::decode(
            &self.blocks,
            &self.header.coefficients,
            self.header.history,
        )?;
        let sample_count = self.header.sample_count as usize;
        samples.truncate(sample_count.min(self.blocks.len() * SAMPLES_PER_BLOCK));
        Ok(samples)
    }

    pub fn to_wav(&self) -> Result<Vec<u8>, io::Error> {
        let samples = self
            .samples()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut buffer = io::Cursor::new(Vec::new());

        {
            let mut writer = WavWriter::new(
                &mut buffer,
                WavSpec {
                    channels: self.channel_count() as u16,
                    sample_rate: self.header.sample_rate,
                    bits_per_sample: 16,
                    sample_format: WavSampleFormat::Int,
                },
            )
            .map_err(io::Error::other)?;

            let mut sample_writer = writer.get_i16_writer(samples.len() as u32);

            for sample in samples {
                sample_writer.write_sample(sample);
            }

            sample_writer.flush().map_err(io::Error::other)?;
            writer.finalize().map_err(io::Error::other)?;
        }

        Ok(buffer.into_inner())
    }
}
