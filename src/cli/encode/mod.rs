use std::path::PathBuf;

use clap::Args;
use dspadpcm::{
    adpcm::{Padding, ScaleFallback, SAMPLES_PER_BLOCK},
    config::EncoderConfig,
    dsp::{DspAudio, Encoder, HeaderLayout},
    wav::{self, MirrorWriter},
};
use tracing::{info, trace};

#[derive(Args)]
pub struct EncodeArgs {
    /// The mono 16-bit WAV file to encode.
    #[arg(index = 1)]
    pub input_file: PathBuf,

    /// The path to write the DSPADPCM file to.
    #[arg(index = 2)]
    pub output_file: PathBuf,

    /// The number of coefficient pairs to train, 1 to 16.
    #[arg(short, long)]
    pub coefficients: Option<usize>,

    /// How to handle a trailing partial block.
    #[arg(short, long)]
    #[clap(value_enum)]
    pub padding: Option<Padding>,

    /// The scale exponent to use when no exponent covers a block's residuals.
    #[arg(short, long)]
    #[clap(value_enum)]
    pub fallback: Option<ScaleFallback>,

    /// The header layout to write.
    #[arg(short, long)]
    #[clap(value_enum)]
    pub layout: Option<HeaderLayout>,

    /// A RON or JSON encoder config file. Flags override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Also write the decoder's reconstruction to this WAV file.
    #[arg(short, long)]
    pub mirror: Option<PathBuf>,
}

impl EncodeArgs {
    fn config(&self) -> anyhow::Result<EncoderConfig> {
        let mut config = match &self.config {
            Some(path) => EncoderConfig::load(path)?,
            None => EncoderConfig::default(),
        };

        if let Some(count) = self.coefficients {
            config.coefficient_count = count;
        }
        if let Some(padding) = self.padding {
            config.padding = padding;
        }
        if let Some(fallback) = self.fallback {
            config.scale_fallback = fallback;
        }
        if let Some(layout) = self.layout {
            config.layout = layout;
        }

        // Flags can still push a count past what the layout holds.
        if self.layout.is_none() && config.coefficient_count > config.layout.coefficient_slots() {
            config.layout = HeaderLayout::Extended;
        }
        config.validate()?;

        Ok(config)
    }
}

pub fn run(args: &EncodeArgs) -> anyhow::Result<()> {
    let config = args.config()?;
    let pcm = wav::open_mono_pcm16(&args.input_file)?;

    info!(
        input = %args.input_file.display(),
        sample_rate = pcm.sample_rate,
        samples = pcm.samples.len(),
        coefficients = config.coefficient_count,
        "encoding"
    );

    let mut mirror = match &args.mirror {
        Some(path) => Some(MirrorWriter::create(path, pcm.sample_rate)?),
        None => None,
    };

    let mut block_index = 0;
    let mut remaining = pcm.samples.len();
    let (audio, summary) = DspAudio::from_pcm(&pcm.samples, pcm.sample_rate, &config, |block| {
        trace!(block = block_index, "encoded block");
        block_index += 1;

        // Padding samples are not part of the signal.
        let real = block.len().min(remaining);
        remaining -= real;
        if let Some(mirror) = mirror.as_mut() {
            mirror.push(&block[..real]);
        }
    })?;

    if let Some(mirror) = mirror {
        mirror.finalize()?;
    }

    write_dsp(args, &audio)?;

    info!(
        output = %args.output_file.display(),
        blocks = summary.blocks,
        distinct_pairs = summary.distinct_pairs,
        error = summary.error,
        mean_error = summary.mean_error,
        "encoded {} sample(s) in {} byte(s) per {}-sample block",
        audio.header.sample_count,
        dspadpcm::adpcm::BYTES_PER_BLOCK,
        SAMPLES_PER_BLOCK,
    );

    Ok(())
}

fn write_dsp(args: &EncodeArgs, audio: &DspAudio) -> anyhow::Result<()> {
    super::write_atomically(&args.output_file, |file| {
        Encoder::new(file).encode(audio)?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dspadpcm::dsp::Decoder;
    use pretty_assertions::assert_eq;
    use std::{fs::File, io::Write as _};

    fn args(dir: &std::path::Path) -> EncodeArgs {
        EncodeArgs {
            input_file: dir.join("in.wav"),
            output_file: dir.join("out.dsp"),
            coefficients: None,
            padding: None,
            fallback: None,
            layout: None,
            config: None,
            mirror: None,
        }
    }

    fn write_input(dir: &std::path::Path, samples: &[i16]) {
        let file = File::create(dir.join("in.wav")).unwrap();
        wav::write_mono_pcm16(std::io::BufWriter::new(file), 32000, samples).unwrap();
    }

    #[test]
    fn test_config_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("encoder.ron");
        File::create(&config_path)
            .unwrap()
            .write_all(b"(coefficient_count: 4, padding: truncate)")
            .unwrap();

        let args = EncodeArgs {
            config: Some(config_path),
            coefficients: Some(2),
            ..args(dir.path())
        };

        let config = args.config().unwrap();
        assert_eq!(config.coefficient_count, 2);
        assert_eq!(config.padding, Padding::Truncate);
    }

    #[test]
    fn test_config_widens_layout_for_large_tables() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path());
        args.coefficients = Some(16);

        assert_eq!(args.config().unwrap().layout, HeaderLayout::Extended);

        args.layout = Some(HeaderLayout::Standard);
        assert!(args.config().is_err());
    }

    #[test]
    fn test_run_writes_dsp_and_mirror() {
        let dir = tempfile::tempdir().unwrap();
        let samples: Vec<i16> = (0..100).map(|i| ((i * 37) % 200 - 100) * 50).collect();
        write_input(dir.path(), &samples);

        let args = EncodeArgs {
            mirror: Some(dir.path().join("mirror.wav")),
            ..args(dir.path())
        };
        run(&args).unwrap();

        let audio = Decoder::new(File::open(&args.output_file).unwrap())
            .decode()
            .unwrap();
        assert_eq!(audio.header.sample_count, 100);
        assert_eq!(audio.blocks.len(), 8);

        let mirror = wav::open_mono_pcm16(dir.path().join("mirror.wav")).unwrap();
        assert_eq!(mirror.samples, audio.samples().unwrap());
    }

    #[test]
    fn test_run_rejects_missing_input() {
        let dir = tempfile::tempdir().unwrap();

        assert!(run(&args(dir.path())).is_err());
        assert!(!dir.path().join("out.dsp").exists());
    }
}
