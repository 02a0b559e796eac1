use super::*;
use std::io::{BufWriter, Write};

#[derive(Debug)]
pub enum EncodeError {
    IoError(std::io::Error),
    /// The coefficient table has more pairs than the layout has room for.
    TooManyCoefficients { layout: HeaderLayout, count: usize },
}

impl std::error::Error for EncodeError {}

impl From<std::io::Error> for EncodeError {
    fn from(err: std::io::Error) -> Self {
        EncodeError::IoError(err)
    }
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeError::IoError(e) => write!(f, "IO error: {}", e),
            EncodeError::TooManyCoefficients { layout, count } => write!(
                f,
                "{} coefficient pairs do not fit the {:?} layout",
                count, layout
            ),
        }
    }
}

#[derive(Debug)]
pub struct Encoder<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> Encoder<W> {
    pub fn new(writer: W) -> Self {
        Encoder {
            writer: BufWriter::new(writer),
        }
    }

    pub fn encode(&mut self, a: &DspAudio) -> Result<(), EncodeError> {
        self.write_header(a.layout, &a.header)?;

        for block in &a.blocks {
            self.writer.write_all(block.as_bytes())?;
        }

        self.writer.flush()?;

        Ok(())
    }

    fn write_header(&mut self, layout: HeaderLayout, h: &DspHeader) -> Result<(), EncodeError> {
        let slots = layout.coefficient_slots();
        if h.coefficients.len() > slots {
            return Err(EncodeError::TooManyCoefficients {
                layout,
                count: h.coefficients.len(),
            });
        }

        let mut buf = Vec::with_capacity(layout.size());
        buf.extend_from_slice(&h.sample_count.to_be_bytes());
        buf.extend_from_slice(&h.nibble_count.to_be_bytes());
        buf.extend_from_slice(&h.sample_rate.to_be_bytes());
        buf.extend_from_slice(&h.loop_flag.to_be_bytes());
        buf.extend_from_slice(&u16::from(h.format).to_be_bytes());
        buf.extend_from_slice(&h.loop_start.to_be_bytes());
        buf.extend_from_slice(&h.loop_end.to_be_bytes());
        buf.extend_from_slice(&h.current_address.to_be_bytes());
        for pair in h.coefficients.padded(slots) {
            buf.extend_from_slice(&pair.a1.to_be_bytes());
            buf.extend_from_slice(&pair.a2.to_be_bytes());
        }
        buf.extend_from_slice(&h.gain.to_be_bytes());
        buf.extend_from_slice(&h.predictor_scale.to_be_bytes());
        buf.extend_from_slice(&h.history.hist1.to_be_bytes());
        buf.extend_from_slice(&h.history.hist2.to_be_bytes());
        buf.extend_from_slice(&h.loop_predictor_scale.to_be_bytes());
        buf.extend_from_slice(&h.loop_history.hist1.to_be_bytes());
        buf.extend_from_slice(&h.loop_history.hist2.to_be_bytes());
        buf.resize(layout.size(), 0); // padding

        self.writer.write_all(&buf)?;

        Ok(())
    }
}
