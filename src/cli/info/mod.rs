use std::{fs::File, io::BufReader, path::PathBuf};

use clap::{Args, ValueEnum};
use dspadpcm::{
    adpcm::SAMPLES_PER_BLOCK,
    dsp::{Decoder, DspAudio, DspHeader, HeaderLayout},
};
use serde::Serialize;

#[derive(Args)]
pub struct InfoArgs {
    /// The DSPADPCM file to describe.
    #[arg(index = 1)]
    pub input_file: PathBuf,

    /// The header layout of the input file.
    #[arg(short, long, default_value_t = HeaderLayout::Standard)]
    #[clap(value_enum)]
    pub layout: HeaderLayout,

    /// The format to print the description in.
    #[arg(short, long, default_value_t = Format::Json)]
    #[clap(value_enum)]
    pub format: Format,
}

#[derive(Clone, ValueEnum)]
pub enum Format {
    Json,
    Ron,
}

#[derive(Debug, Serialize)]
struct Info<'a> {
    layout: HeaderLayout,
    channels: usize,
    blocks: usize,
    padding_samples: usize,
    /// How often each coefficient index is used by a block.
    coefficient_usage: Vec<usize>,
    header: &'a DspHeader,
}

impl<'a> Info<'a> {
    fn new(audio: &'a DspAudio) -> Self {
        let mut coefficient_usage = vec![0; audio.header.coefficients.len()];
        for block in &audio.blocks {
            if let Some(count) = coefficient_usage.get_mut(block.coefficient_index() as usize) {
                *count += 1;
            }
        }

        Info {
            layout: audio.layout,
            channels: audio.channel_count(),
            blocks: audio.blocks.len(),
            padding_samples: (audio.blocks.len() * SAMPLES_PER_BLOCK)
                .saturating_sub(audio.header.sample_count as usize),
            coefficient_usage,
            header: &audio.header,
        }
    }
}

pub fn run(args: &InfoArgs) -> anyhow::Result<()> {
    let file = File::open(&args.input_file)?;
    let audio = Decoder::with_layout(BufReader::new(file), args.layout).decode()?;

    println!("{}", describe(&audio, &args.format)?);

    Ok(())
}

fn describe(audio: &DspAudio, format: &Format) -> anyhow::Result<String> {
    let info = Info::new(audio);

    Ok(match format {
        Format::Ron => ron::ser::to_string_pretty(&info, ron::ser::PrettyConfig::default())?,
        Format::Json => serde_json::to_string_pretty(&info)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dspadpcm::config::EncoderConfig;
    use pretty_assertions::assert_eq;

    fn ramp_audio() -> DspAudio {
        let samples: Vec<i16> = (0..20).map(|i| i * 100).collect();
        DspAudio::from_pcm(&samples, 32000, &EncoderConfig::default(), |_| {})
            .unwrap()
            .0
    }

    #[test]
    fn test_info_counts() {
        let audio = ramp_audio();

        let info = Info::new(&audio);

        assert_eq!(info.blocks, 2);
        assert_eq!(info.padding_samples, 8);
        assert_eq!(info.coefficient_usage.len(), 8);
        assert_eq!(info.coefficient_usage.iter().sum::<usize>(), 2);
    }

    #[test]
    fn test_describe_json() {
        let audio = ramp_audio();

        let json: serde_json::Value =
            serde_json::from_str(&describe(&audio, &Format::Json).unwrap()).unwrap();

        assert_eq!(json["layout"], "standard");
        assert_eq!(json["header"]["sample_count"], 20);
        assert_eq!(json["header"]["sample_rate"], 32000);
        assert_eq!(json["header"]["nibble_count"], 32);
    }

    #[test]
    fn test_describe_ron() {
        let audio = ramp_audio();

        let ron = describe(&audio, &Format::Ron).unwrap();

        assert!(ron.contains("layout: standard"));
        assert!(ron.contains("sample_count: 20"));
    }
}
