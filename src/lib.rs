//! Deterministic audio-to-spectrogram pipeline.
//!
//! ```text
//! bytes -> AudioSignal -> ComplexMatrix -> |.| -> dB -> band -> ImageBuffer
//! ```
//!
//! Each stage is a pure function of its input and the [`SpectrogramConfig`],
//! so two runs with the same input and configuration agree bit for bit.

pub mod analysis;
pub mod audio;
pub mod bench;
pub mod config;
pub mod encode;
pub mod error;
pub mod pipeline;
pub mod render;

#[cfg(test)]
mod testutil;

pub use config::{Preset, SpectrogramConfig};
pub use error::{Error, Result};
pub use pipeline::{Pipeline, Spectrogram};
