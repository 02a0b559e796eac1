//! Reading and writing 16-bit mono WAV files at the edges of an encode.

use derive_more::derive::{Display, Error, From};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::{
    fs::File,
    io::{BufWriter, Read, Seek, Write},
    path::Path,
};
use tracing::warn;

/// Possible errors that can be produced when reading or writing WAV audio.
#[non_exhaustive]
#[derive(Debug, Display, Error, From)]
pub enum WavError {
    #[display("could not process wav: {_0}")]
    Hound(hound::Error),
    /// The WAV file has a layout the encoder does not take.
    #[display("expected mono 16-bit integer PCM, found {channels} channel(s) of {bits_per_sample}-bit {format:?}")]
    #[from(ignore)]
    UnsupportedSpec {
        channels: u16,
        bits_per_sample: u16,
        format: SampleFormat,
    },
}

/// Decoded PCM input.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PcmAudio {
    pub sample_rate: u32,
    pub samples: Vec<i16>,
}

fn mono_pcm16(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Reads a mono 16-bit integer WAV stream.
pub fn read_mono_pcm16<R: Read>(reader: R) -> Result<PcmAudio, WavError> {
    let mut reader = WavReader::new(reader)?;
    let spec = reader.spec();

    if spec.channels != 1 || spec.bits_per_sample != 16 || spec.sample_format != SampleFormat::Int
    {
        return Err(WavError::UnsupportedSpec {
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
            format: spec.sample_format,
        });
    }

    let samples = reader.samples::<i16>().collect::<Result<_, _>>()?;

    Ok(PcmAudio {
        sample_rate: spec.sample_rate,
        samples,
    })
}

pub fn open_mono_pcm16(path: impl AsRef<Path>) -> Result<PcmAudio, WavError> {
    let file = File::open(path).map_err(hound::Error::from)?;
    read_mono_pcm16(std::io::BufReader::new(file))
}

/// Writes `samples` as a mono 16-bit WAV stream.
pub fn write_mono_pcm16<W: Write + Seek>(
    writer: W,
    sample_rate: u32,
    samples: &[i16],
) -> Result<(), WavError> {
    let mut writer = WavWriter::new(writer, mono_pcm16(sample_rate))?;

    let mut sample_writer = writer.get_i16_writer(samples.len() as u32);
    for &sample in samples {
        sample_writer.write_sample(sample);
    }
    sample_writer.flush()?;

    writer.finalize()?;

    Ok(())
}

/// Streams reconstructed samples to a WAV file while an encode runs.
///
/// The encoder hands out samples through an infallible callback, so the
/// first write error is kept and reported by [`MirrorWriter::finalize`].
/// Later samples are dropped once an error has occurred.
pub struct MirrorWriter<W: Write + Seek> {
    writer: WavWriter<W>,
    error: Option<hound::Error>,
}

impl MirrorWriter<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>, sample_rate: u32) -> Result<Self, WavError> {
        Ok(Self {
            writer: WavWriter::create(path, mono_pcm16(sample_rate))?,
            error: None,
        })
    }
}

impl<W: Write + Seek> MirrorWriter<W> {
    pub fn new(writer: W, sample_rate: u32) -> Result<Self, WavError> {
        Ok(Self {
            writer: WavWriter::new(writer, mono_pcm16(sample_rate))?,
            error: None,
        })
    }

    pub fn push(&mut self, samples: &[i16]) {
        if self.error.is_some() {
            return;
        }

        for &sample in samples {
            if let Err(e) = self.writer.write_sample(sample) {
                warn!(error = %e, "stopped writing mirror wav");
                self.error = Some(e);
                return;
            }
        }
    }

    pub fn finalize(self) -> Result<(), WavError> {
        if let Some(e) = self.error {
            return Err(e.into());
        }
        self.writer.finalize()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn test_write_then_read() {
        let samples = vec![0, 1, -1, i16::MAX, i16::MIN, 1234];
        let mut buffer = Cursor::new(Vec::new());

        write_mono_pcm16(&mut buffer, 32000, &samples).unwrap();
        buffer.set_position(0);
        let audio = read_mono_pcm16(buffer).unwrap();

        assert_eq!(
            audio,
            PcmAudio {
                sample_rate: 32000,
                samples,
            }
        );
    }

    #[test]
    fn test_read_rejects_stereo() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let spec = WavSpec {
                channels: 2,
                ..mono_pcm16(44100)
            };
            let mut writer = WavWriter::new(&mut buffer, spec).unwrap();
            writer.write_sample(0i16).unwrap();
            writer.write_sample(0i16).unwrap();
            writer.finalize().unwrap();
        }
        buffer.set_position(0);

        let err = read_mono_pcm16(buffer).unwrap_err();

        assert!(matches!(
            err,
            WavError::UnsupportedSpec {
                channels: 2,
                bits_per_sample: 16,
                ..
            }
        ));
    }

    #[test]
    fn test_read_rejects_float() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let spec = WavSpec {
                channels: 1,
                sample_rate: 8000,
                bits_per_sample: 32,
                sample_format: SampleFormat::Float,
            };
            let mut writer = WavWriter::new(&mut buffer, spec).unwrap();
            writer.write_sample(0.5f32).unwrap();
            writer.finalize().unwrap();
        }
        buffer.set_position(0);

        let err = read_mono_pcm16(buffer).unwrap_err();

        assert!(matches!(err, WavError::UnsupportedSpec { .. }));
    }

    #[test]
    fn test_read_rejects_garbage() {
        let err = read_mono_pcm16(Cursor::new(b"not a wav file".to_vec())).unwrap_err();

        assert!(matches!(err, WavError::Hound(_)));
    }

    #[test]
    fn test_mirror_writer() {
        let mut buffer = Cursor::new(Vec::new());

        let mut mirror = MirrorWriter::new(&mut buffer, 16000).unwrap();
        mirror.push(&[1, 2, 3]);
        mirror.push(&[4, 5]);
        mirror.finalize().unwrap();

        buffer.set_position(0);
        let audio = read_mono_pcm16(buffer).unwrap();
        assert_eq!(audio.sample_rate, 16000);
        assert_eq!(audio.samples, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_open_and_create_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mirror.wav");

        let mut mirror = MirrorWriter::create(&path, 22050).unwrap();
        mirror.push(&[-7, 7]);
        mirror.finalize().unwrap();

        let audio = open_mono_pcm16(&path).unwrap();
        assert_eq!(audio.samples, vec![-7, 7]);
    }
}
