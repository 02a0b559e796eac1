use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::PathBuf,
};

use clap::Args;
use dspadpcm::{
    dsp::{Decoder, HeaderLayout},
    wav,
};
use tracing::info;

#[derive(Args)]
pub struct DecodeArgs {
    /// The DSPADPCM file to decode.
    #[arg(index = 1)]
    pub input_file: PathBuf,

    /// The path to write the decoded WAV file to.
    #[arg(index = 2)]
    pub output_file: PathBuf,

    /// The header layout of the input file.
    #[arg(short, long, default_value_t = HeaderLayout::Standard)]
    #[clap(value_enum)]
    pub layout: HeaderLayout,
}

pub fn run(args: &DecodeArgs) -> anyhow::Result<()> {
    let file = File::open(&args.input_file)?;
    let audio = Decoder::with_layout(BufReader::new(file), args.layout).decode()?;
    let samples = audio.samples()?;

    super::write_atomically(&args.output_file, |file| {
        wav::write_mono_pcm16(BufWriter::new(file), audio.header.sample_rate, &samples)?;
        Ok(())
    })?;

    info!(
        input = %args.input_file.display(),
        output = %args.output_file.display(),
        blocks = audio.blocks.len(),
        samples = samples.len(),
        "decoded"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::encode::{self, EncodeArgs};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_then_decode() {
        let dir = tempfile::tempdir().unwrap();
        let samples: Vec<i16> = (0..70).map(|i| (i % 14 - 7) * 1000).collect();
        let file = File::create(dir.path().join("in.wav")).unwrap();
        wav::write_mono_pcm16(BufWriter::new(file), 44100, &samples).unwrap();

        encode::run(&EncodeArgs {
            input_file: dir.path().join("in.wav"),
            output_file: dir.path().join("out.dsp"),
            coefficients: Some(16),
            padding: None,
            fallback: None,
            layout: Some(HeaderLayout::Extended),
            config: None,
            mirror: Some(dir.path().join("mirror.wav")),
        })
        .unwrap();

        run(&DecodeArgs {
            input_file: dir.path().join("out.dsp"),
            output_file: dir.path().join("decoded.wav"),
            layout: HeaderLayout::Extended,
        })
        .unwrap();

        let decoded = wav::open_mono_pcm16(dir.path().join("decoded.wav")).unwrap();
        let mirror = wav::open_mono_pcm16(dir.path().join("mirror.wav")).unwrap();
        assert_eq!(decoded.sample_rate, 44100);
        assert_eq!(decoded.samples.len(), 70);
        assert_eq!(decoded, mirror);
    }

    #[test]
    fn test_decode_rejects_wrong_layout() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("short.dsp"), [0u8; 100]).unwrap();

        let err = run(&DecodeArgs {
            input_file: dir.path().join("short.dsp"),
            output_file: dir.path().join("decoded.wav"),
            layout: HeaderLayout::Extended,
        })
        .unwrap_err();

        assert!(err.downcast_ref::<dspadpcm::dsp::DecodeError>().is_some());
        assert!(!dir.path().join("decoded.wav").exists());
    }
}
