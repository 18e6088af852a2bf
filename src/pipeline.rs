use std::time::Instant;

use crate::analysis::{band, magnitude, DecibelConverter, RealMatrix, ReferenceMode, RustFftTransform, StftPlan};
use crate::audio::{AudioLoader, AudioSignal, AudioSource};
use crate::config::SpectrogramConfig;
use crate::error::{Error, Result};
use crate::render::{ImageBuffer, Rasterizer};

/// Output of a full run: the banded dB matrix and its rendering.
#[derive(Clone, Debug)]
pub struct Spectrogram {
    pub matrix: RealMatrix,
    pub image: ImageBuffer,
}

/// Audio in, spectrogram out, for one fixed configuration.
///
/// Holds no state between runs; the FFT plan is built per configuration and
/// every call allocates its own workspace.
pub struct Pipeline {
    config: SpectrogramConfig,
    loader: AudioLoader,
    stft: StftPlan,
    decibels: DecibelConverter,
    rasterizer: Rasterizer,
}

impl Pipeline {
    pub fn new(config: SpectrogramConfig) -> Result<Self> {
        config.validate()?;

        let fft = if config.portable_fft {
            RustFftTransform::portable(config.frame_size)
        } else {
            RustFftTransform::new(config.frame_size)
        };
        let stft = StftPlan::with_transform(config.frame_size, config.hop_size, config.window, config.boundary, fft)?;
        let decibels = match config.reference {
            ReferenceMode::Fixed => DecibelConverter::fixed(config.reference_value, config.floor)?,
            mode => DecibelConverter::new(mode, config.floor)?,
        };
        let rasterizer = Rasterizer::new(config.render.color_map, config.render.scale)?;
        let loader = AudioLoader::new(config.sample_rate, config.quality);

        Ok(Self {
            config,
            loader,
            stft,
            decibels,
            rasterizer,
        })
    }

    pub fn config(&self) -> &SpectrogramConfig {
        &self.config
    }

    pub fn load(&self, source: &AudioSource) -> Result<AudioSignal> {
        self.loader.load(source)
    }

    /// STFT, magnitude, dB and band selection.
    ///
    /// `signal` must already be at the configured sample rate; bin
    /// frequencies are derived from it.
    pub fn analyse(&self, signal: AudioSignal) -> Result<RealMatrix> {
        if signal.sample_rate != self.config.sample_rate {
            return Err(Error::InvalidParameter(format!(
                "signal is at {} Hz but the pipeline analyses at {} Hz",
                signal.sample_rate, self.config.sample_rate
            )));
        }
        let start = Instant::now();

        let spectrum = if self.config.parallel {
            self.stft.transform_parallel(signal)?
        } else {
            self.stft.transform(signal)?
        };
        let magnitudes = magnitude::magnitude(&spectrum);
        drop(spectrum);
        let db = self.decibels.to_db(&magnitudes)?;
        let banded = band::slice(&db, self.config.effective_band())?;

        log::debug!(
            "Analysis: {} bins x {} frames in {:.3}s",
            banded.rows(),
            banded.cols(),
            start.elapsed().as_secs_f32()
        );
        Ok(banded)
    }

    pub fn render(&self, matrix: &RealMatrix) -> Result<ImageBuffer> {
        let floor = self.decibels.floor();
        let ceiling = self.decibels.ceiling(matrix);
        self.rasterizer.rasterize(matrix, floor, ceiling)
    }

    /// Analyse an already decoded signal and render it.
    pub fn process(&self, signal: AudioSignal) -> Result<Spectrogram> {
        let matrix = self.analyse(signal)?;
        let image = self.render(&matrix)?;
        Ok(Spectrogram { matrix, image })
    }

    pub fn run(&self, source: &AudioSource) -> Result<Spectrogram> {
        let signal = self.load(source)?;
        let spectrogram = self.process(signal)?;
        log::info!(
            "Spectrogram of {}: {} bins x {} frames",
            source.label(),
            spectrogram.matrix.rows(),
            spectrogram.matrix.cols()
        );
        Ok(spectrogram)
    }
}
