pub mod decode;
pub mod resample;

use std::path::PathBuf;

use crate::error::Result;
use decode::{downmix, Decode, SymphoniaDecoder};
pub use resample::ResampleQuality;

/// Where the encoded audio comes from.
#[derive(Clone, Debug)]
pub enum AudioSource {
    Path(PathBuf),
    /// In-memory container bytes. `hint` is a file extension such as `"wav"`.
    Bytes { data: Vec<u8>, hint: Option<String> },
}

impl AudioSource {
    pub fn bytes(data: Vec<u8>, hint: Option<&str>) -> Self {
        AudioSource::Bytes {
            data,
            hint: hint.map(String::from),
        }
    }

    /// Name used in logs and error messages.
    pub fn label(&self) -> String {
        match self {
            AudioSource::Path(path) => path.display().to_string(),
            AudioSource::Bytes { .. } => "<memory>".to_string(),
        }
    }
}

impl From<PathBuf> for AudioSource {
    fn from(path: PathBuf) -> Self {
        AudioSource::Path(path)
    }
}

impl From<&std::path::Path> for AudioSource {
    fn from(path: &std::path::Path) -> Self {
        AudioSource::Path(path.to_path_buf())
    }
}

/// Mono PCM at a fixed sample rate.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSignal {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioSignal {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.samples.len() as f32 / self.sample_rate as f32
        }
    }
}

/// Decodes, downmixes and resamples audio to a fixed rate.
pub struct AudioLoader<D = SymphoniaDecoder> {
    decoder: D,
    target_rate: u32,
    quality: ResampleQuality,
}

impl AudioLoader<SymphoniaDecoder> {
    pub fn new(target_rate: u32, quality: ResampleQuality) -> Self {
        Self::with_decoder(SymphoniaDecoder, target_rate, quality)
    }
}

impl<D: Decode> AudioLoader<D> {
    pub fn with_decoder(decoder: D, target_rate: u32, quality: ResampleQuality) -> Self {
        Self {
            decoder,
            target_rate,
            quality,
        }
    }

    pub fn load(&self, source: &AudioSource) -> Result<AudioSignal> {
        let decoded = self.decoder.decode(source)?;
        let mono = downmix(&decoded.interleaved, decoded.channels);

        log::info!(
            "Decoded audio: {} samples, {} channel(s), {}Hz, {:.1}s",
            mono.len(),
            decoded.channels,
            decoded.sample_rate,
            mono.len() as f32 / decoded.sample_rate.max(1) as f32
        );

        let samples = resample::resample(&mono, decoded.sample_rate, self.target_rate, self.quality)?;
        Ok(AudioSignal::new(samples, self.target_rate))
    }
}
