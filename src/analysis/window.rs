use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Tapering applied to each frame before the FFT.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    #[default]
    #[value(alias = "hanning")]
    #[serde(alias = "hanning")]
    Hann,
    Hamming,
    Blackman,
    Nuttall,
    #[value(alias = "none")]
    #[serde(alias = "none")]
    Rectangular,
}

impl WindowType {
    /// Periodic (DFT-even) coefficients of length `size`.
    ///
    /// Evaluated in f64 and rounded once, so the table is identical on every
    /// platform.
    pub fn coefficients(self, size: usize) -> Vec<f32> {
        let cosine_sum = |a: &[f64]| -> Vec<f32> {
            (0..size)
                .map(|n| {
                    let x = 2.0 * PI * n as f64 / size as f64;
                    a.iter()
                        .enumerate()
                        .map(|(k, ak)| {
                            let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                            sign * ak * (k as f64 * x).cos()
                        })
                        .sum::<f64>() as f32
                })
                .collect()
        };

        match self {
            WindowType::Hann => cosine_sum(&[0.5, 0.5]),
            WindowType::Hamming => cosine_sum(&[0.54, 0.46]),
            WindowType::Blackman => cosine_sum(&[0.42, 0.5, 0.08]),
            WindowType::Nuttall => cosine_sum(&[0.355768, 0.487396, 0.144232, 0.012604]),
            WindowType::Rectangular => vec![1.0; size],
        }
    }
}
