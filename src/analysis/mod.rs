//! The numeric half of the pipeline: framing and FFT, magnitude, dB scaling
//! and band selection. Every stage takes its input by reference (or, for the
//! transform, by value) and returns a freshly allocated matrix.

pub mod band;
pub mod decibel;
pub mod magnitude;
pub mod matrix;
pub mod stft;
pub mod window;

pub use band::BandRange;
pub use decibel::{DecibelConverter, ReferenceMode};
pub use matrix::{ComplexMatrix, Matrix, RealMatrix};
pub use stft::{Boundary, FrameTransform, RustFftTransform, StftPlan};
pub use window::WindowType;
