use super::*;
use crate::adpcm::{CoefficientPair, BYTES_PER_BLOCK};
use std::{
    fmt,
    io::{Error as IoError, Read, Seek},
};

#[derive(Debug)]
pub enum DecodeError {
    IoError(IoError),
    UnsupportedFormat(u16),
    /// The header claims more samples than its blocks hold.
    InvalidSampleCount { sample_count: u32, block_count: usize },
    /// The stream ended before every block announced by the header was read.
    MissingBlocks { expected: usize, found: usize },
}

impl std::error::Error for DecodeError {}

impl From<IoError> for DecodeError {
    fn from(error: IoError) -> Self {
        DecodeError::IoError(error)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::IoError(e) => write!(f, "IO error: {e}"),
            DecodeError::UnsupportedFormat(format) => {
                write!(f, "unsupported sample format 0x{format:04x}")
            }
            DecodeError::InvalidSampleCount {
                sample_count,
                block_count,
            } => write!(
                f,
                "sample count {sample_count} does not fit in {block_count} block(s)"
            ),
            DecodeError::MissingBlocks { expected, found } => write!(
                f,
                "could not read ADPCM blocks: read {found} block(s), expected {expected}"
            ),
        }
    }
}

/// Reads big-endian header fields in order.
struct FieldReader<'a> {
    buf: &'a [u8],
}

impl FieldReader<'_> {
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let (head, tail) = self.buf.split_at(N);
        self.buf = tail;
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(head);
        bytes
    }

    fn u32(&mut self) -> u32 {
        u32::from_be_bytes(self.take())
    }

    fn u16(&mut self) -> u16 {
        u16::from_be_bytes(self.take())
    }

    fn i16(&mut self) -> i16 {
        i16::from_be_bytes(self.take())
    }

    fn history(&mut self) -> History {
        let hist1 = self.i16();
        let hist2 = self.i16();
        History::new(hist1, hist2)
    }
}

pub struct Decoder<R>
where
    R: Read + Seek,
{
    reader: R,
    layout: HeaderLayout,
}

impl<R: Read + Seek> Decoder<R> {
    /// Creates a decoder for streams with the standard header layout.
    pub fn new(reader: R) -> Self {
        Self::with_layout(reader, HeaderLayout::Standard)
    }

    pub fn with_layout(reader: R, layout: HeaderLayout) -> Self {
        Decoder { reader, layout }
    }

    pub fn decode(&mut self) -> Result<DspAudio, DecodeError> {
        let header = self.read_header()?;
        let blocks = self.read_blocks(header.block_count())?;

        Ok(DspAudio {
            layout: self.layout,
            header,
            blocks,
        })
    }

    fn read_header(&mut self) -> Result<DspHeader, DecodeError> {
        let mut buf = vec![0; self.layout.size()];
        self.reader.read_exact(&mut buf)?;

        let mut r = FieldReader { buf: &buf };
        let sample_count = r.u32();
        let nibble_count = r.u32();
        let sample_rate = r.u32();
        let loop_flag = r.u16();
        let format = r.u16();
        let format = Format::try_from(format).map_err(|_| DecodeError::UnsupportedFormat(format))?;
        if format != Format::Adpcm {
            return Err(DecodeError::UnsupportedFormat(format.into()));
        }
        let loop_start = r.u32();
        let loop_end = r.u32();
        let current_address = r.u32();
        let coefficients = (0..self.layout.coefficient_slots())
            .map(|_| {
                let a1 = r.i16();
                let a2 = r.i16();
                CoefficientPair::new(a1, a2)
            })
            .collect();
        let gain = r.i16();
        let predictor_scale = r.u16();
        let history = r.history();
        let loop_predictor_scale = r.u16();
        let loop_history = r.history();
        // The rest is padding.

        let header = DspHeader {
            sample_count,
            nibble_count,
            sample_rate,
            loop_flag,
            format,
            loop_start,
            loop_end,
            current_address,
            coefficients: CoefficientTable::new(coefficients),
            gain,
            predictor_scale,
            history,
            loop_predictor_scale,
            loop_history,
        };

        let block_count = header.block_count();
        if header.sample_count as usize > block_count * SAMPLES_PER_BLOCK {
            return Err(DecodeError::InvalidSampleCount {
                sample_count: header.sample_count,
                block_count,
            });
        }

        Ok(header)
    }

    fn read_blocks(&mut self, count: usize) -> Result<Vec<AdpcmBlock>, DecodeError> {
        // `count` is untrusted header data.
        let mut blocks = Vec::new();
        let mut buf = [0u8; BYTES_PER_BLOCK];

        for found in 0..count {
            match self.reader.read_exact(&mut buf) {
                Ok(()) => blocks.push(AdpcmBlock::new(buf)),
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Err(DecodeError::MissingBlocks {
                        expected: count,
                        found,
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(blocks)
    }
}
