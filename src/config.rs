use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analysis::{BandRange, Boundary, ReferenceMode, WindowType};
use crate::audio::ResampleQuality;
use crate::error::{Error, Result};
use crate::render::ColorMap;

/// Every knob the pipeline reads. Two runs are comparable only when the
/// sample rate, frame size and hop size agree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpectrogramConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_frame_size")]
    pub frame_size: usize,
    #[serde(default = "default_hop_size")]
    pub hop_size: usize,
    #[serde(default)]
    pub window: WindowType,
    #[serde(default)]
    pub boundary: Boundary,
    /// `None` keeps every bin.
    #[serde(default)]
    pub band: Option<BandRange>,
    #[serde(default)]
    pub quality: ResampleQuality,
    #[serde(default)]
    pub reference: ReferenceMode,
    /// Amplitude used when `reference` is `fixed`.
    #[serde(default = "default_reference_value")]
    pub reference_value: f32,
    #[serde(default = "default_floor")]
    pub floor: f32,
    #[serde(default)]
    pub parallel: bool,
    /// Use the scalar FFT so results match across CPUs.
    #[serde(default)]
    pub portable_fft: bool,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub color_map: ColorMap,
    #[serde(default = "default_scale")]
    pub scale: u32,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            frame_size: default_frame_size(),
            hop_size: default_hop_size(),
            window: WindowType::default(),
            boundary: Boundary::default(),
            band: None,
            quality: ResampleQuality::default(),
            reference: ReferenceMode::default(),
            reference_value: default_reference_value(),
            floor: default_floor(),
            parallel: false,
            portable_fft: false,
            render: RenderConfig::default(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            color_map: ColorMap::default(),
            scale: default_scale(),
        }
    }
}

fn default_sample_rate() -> u32 { 44100 }
fn default_frame_size() -> usize { 2048 }
fn default_hop_size() -> usize { 512 }
fn default_reference_value() -> f32 { 1.0 }
fn default_floor() -> f32 { crate::analysis::decibel::DEFAULT_FLOOR_DB }
fn default_scale() -> u32 { 1 }

/// Named parameter sets for the two ways the pipeline is usually driven.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Full spectrum, best resampling. Output meant for visual comparison.
    Reference,
    /// Bins 64..320 with fast resampling, for timing runs.
    Benchmark,
}

impl Preset {
    pub fn config(self) -> SpectrogramConfig {
        match self {
            Preset::Reference => SpectrogramConfig::default(),
            Preset::Benchmark => SpectrogramConfig {
                band: Some(BandRange::new(64, 320)),
                quality: ResampleQuality::Fast,
                ..SpectrogramConfig::default()
            },
        }
    }
}

impl SpectrogramConfig {
    /// `frame_size / 2 + 1`.
    pub fn bins(&self) -> usize {
        self.frame_size / 2 + 1
    }

    /// The band actually sliced: the configured one or every bin.
    pub fn effective_band(&self) -> BandRange {
        self.band.unwrap_or(BandRange::new(0, self.bins()))
    }

    /// Reject anything that would fail later in the chain, before any audio is read.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Error::InvalidParameter("sample rate must be positive".into()));
        }
        if self.frame_size < 2 || self.frame_size % 2 != 0 {
            return Err(Error::InvalidParameter(format!(
                "frame size must be even and at least 2 (got {})",
                self.frame_size
            )));
        }
        if self.hop_size == 0 {
            return Err(Error::InvalidParameter("hop size must be positive".into()));
        }
        self.effective_band().validate(self.bins())?;
        if !(self.floor.is_finite() && self.floor < 0.0) {
            return Err(Error::NumericDomain(format!(
                "dB floor must be finite and negative (got {})",
                self.floor
            )));
        }
        if self.reference == ReferenceMode::Fixed
            && !(self.reference_value.is_finite() && self.reference_value > 0.0)
        {
            return Err(Error::NumericDomain(format!(
                "fixed reference must be positive (got {})",
                self.reference_value
            )));
        }
        if self.render.scale == 0 {
            return Err(Error::InvalidParameter("pixel scale must be at least 1".into()));
        }
        Ok(())
    }
}

/// Config file contents. `preset` picks the base values that the
/// `[spectrogram]` table then overrides field by field.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub preset: Option<Preset>,
    #[serde(default)]
    pub spectrogram: Option<toml::Table>,
}

impl Config {
    pub fn resolve(&self, preset: Option<Preset>) -> Result<SpectrogramConfig> {
        let base = preset.or(self.preset).unwrap_or(Preset::Reference).config();
        match &self.spectrogram {
            None => Ok(base),
            Some(overrides) => merge(base, overrides),
        }
    }
}

fn merge(base: SpectrogramConfig, overrides: &toml::Table) -> Result<SpectrogramConfig> {
    let mut table = match toml::Value::try_from(&base) {
        Ok(toml::Value::Table(table)) => table,
        Ok(other) => {
            return Err(Error::InvalidParameter(format!("config serialised to {}", other.type_str())))
        }
        Err(e) => return Err(Error::InvalidParameter(format!("cannot serialise config: {}", e))),
    };
    for (key, value) in overrides {
        match (table.get_mut(key), value) {
            (Some(toml::Value::Table(dst)), toml::Value::Table(src)) => {
                for (k, v) in src {
                    dst.insert(k.clone(), v.clone());
                }
            }
            _ => {
                table.insert(key.clone(), value.clone());
            }
        }
    }
    toml::Value::Table(table)
        .try_into()
        .map_err(|e| Error::InvalidParameter(format!("bad [spectrogram] table: {}", e)))
}

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(err) => {
            log::warn!("Ignoring malformed config {}: {}", path.display(), err);
            None
        }
    }
}

/// `./sonogram.toml`, then the per-user config directory.
pub fn find_config() -> Option<PathBuf> {
    let local = PathBuf::from("sonogram.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("sonogram").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("sonogram").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}
