use clap::Parser;
use std::path::PathBuf;

use sonogram::analysis::{BandRange, Boundary, ReferenceMode, WindowType};
use sonogram::audio::ResampleQuality;
use sonogram::render::ColorMap;
use sonogram::{Preset, SpectrogramConfig};

#[derive(Parser, Debug)]
#[command(name = "sonogram", about = "Deterministic audio spectrogram renderer and benchmark")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG, AAC)
    pub input: PathBuf,

    /// Output PNG file
    #[arg(short, long, default_value = "spectrogram.png")]
    pub output: PathBuf,

    /// Config file (defaults to ./sonogram.toml or the user config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Base parameter set, overridden by the config file and the flags below
    #[arg(short, long, value_enum)]
    pub preset: Option<Preset>,

    /// Target sample rate in Hz
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// FFT frame length in samples
    #[arg(long)]
    pub frame_size: Option<usize>,

    /// Samples between consecutive frames
    #[arg(long)]
    pub hop_size: Option<usize>,

    #[arg(long, value_enum)]
    pub window: Option<WindowType>,

    /// Edge padding before framing
    #[arg(long, value_enum)]
    pub boundary: Option<Boundary>,

    /// Frequency bins to keep, as LOW:HIGH (half-open)
    #[arg(long)]
    pub band: Option<BandRange>,

    /// Resampling quality
    #[arg(short, long, value_enum)]
    pub quality: Option<ResampleQuality>,

    /// dB reference
    #[arg(long, value_enum)]
    pub reference: Option<ReferenceMode>,

    /// Reference amplitude for --reference fixed
    #[arg(long)]
    pub reference_value: Option<f32>,

    /// Lowest dB value; quieter cells are clamped to it
    #[arg(long, allow_hyphen_values = true)]
    pub floor: Option<f32>,

    #[arg(long, value_enum)]
    pub color_map: Option<ColorMap>,

    /// Pixels per matrix cell along each axis
    #[arg(long)]
    pub scale: Option<u32>,

    /// Spread frames over all cores
    #[arg(long)]
    pub parallel: bool,

    /// Use the scalar FFT so output matches across machines
    #[arg(long)]
    pub portable_fft: bool,

    /// Benchmark mode: run the full pipeline this many times
    #[arg(short = 'n', long)]
    pub iterations: Option<u32>,

    /// In benchmark mode, fail if any run differs from the first
    #[arg(long)]
    pub verify: bool,

    /// In benchmark mode, write timings as JSON to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl Cli {
    /// Apply explicit flags on top of `config`.
    pub fn apply(&self, mut config: SpectrogramConfig) -> SpectrogramConfig {
        if let Some(v) = self.sample_rate { config.sample_rate = v; }
        if let Some(v) = self.frame_size { config.frame_size = v; }
        if let Some(v) = self.hop_size { config.hop_size = v; }
        if let Some(v) = self.window { config.window = v; }
        if let Some(v) = self.boundary { config.boundary = v; }
        if let Some(v) = self.band { config.band = Some(v); }
        if let Some(v) = self.quality { config.quality = v; }
        if let Some(v) = self.reference { config.reference = v; }
        if let Some(v) = self.reference_value { config.reference_value = v; }
        if let Some(v) = self.floor { config.floor = v; }
        if let Some(v) = self.color_map { config.render.color_map = v; }
        if let Some(v) = self.scale { config.render.scale = v; }
        if self.parallel { config.parallel = true; }
        if self.portable_fft { config.portable_fft = true; }
        config
    }
}
