pub mod adpcm;
pub mod config;
pub mod dsp;
pub mod wav;

pub mod prelude {
    #[doc(hidden)]
    pub use crate::adpcm::{
        AdpcmBlock, CoefficientPair, CoefficientTable, History, Padding, ScaleFallback,
    };
    #[doc(hidden)]
    pub use crate::config::EncoderConfig;
    #[doc(hidden)]
    pub use crate::dsp::{DspAudio, DspHeader, EncodeSummary, HeaderLayout};
    #[doc(hidden)]
    pub use crate::wav::PcmAudio;
}
