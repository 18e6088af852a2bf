use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResampleQuality {
    Fast,
    #[default]
    Best,
}

impl ResampleQuality {
    fn params(self) -> SincInterpolationParameters {
        match self {
            ResampleQuality::Fast => SincInterpolationParameters {
                sinc_len: 64,
                f_cutoff: 0.915,
                interpolation: SincInterpolationType::Linear,
                oversampling_factor: 128,
                window: WindowFunction::Hann2,
            },
            ResampleQuality::Best => SincInterpolationParameters {
                sinc_len: 256,
                f_cutoff: 0.95,
                interpolation: SincInterpolationType::Cubic,
                oversampling_factor: 256,
                window: WindowFunction::BlackmanHarris2,
            },
        }
    }
}

/// Number of output samples for `input_len` samples converted between rates.
pub fn output_len(input_len: usize, from_rate: u32, to_rate: u32) -> usize {
    ((input_len as u64 * to_rate as u64).div_ceil(from_rate as u64)) as usize
}

/// Resample mono audio from `from_rate` to `to_rate`.
///
/// The whole signal is fed as a single chunk and the tail is flushed, so the
/// result depends only on the samples and the parameters. The filter delay is
/// trimmed so that output sample `i` lines up with input time `i / to_rate`.
pub fn resample(
    samples: &[f32],
    from_rate: u32,
    to_rate: u32,
    quality: ResampleQuality,
) -> Result<Vec<f32>> {
    if from_rate == 0 || to_rate == 0 {
        return Err(Error::InvalidParameter(format!(
            "sample rates must be positive (got {} -> {})",
            from_rate, to_rate
        )));
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let mut resampler = SincFixedIn::<f32>::new(
        ratio,
        1.0, // fixed ratio
        quality.params(),
        samples.len(),
        1, // mono
    )
    .map_err(|e| Error::Resample(e.to_string()))?;

    let delay = resampler.output_delay();
    let wanted = output_len(samples.len(), from_rate, to_rate);

    let input = vec![samples.to_vec()];
    let mut output = resampler
        .process(&input, None)
        .map_err(|e| Error::Resample(e.to_string()))?
        .into_iter()
        .next()
        .unwrap_or_default();

    while output.len() < delay + wanted {
        let tail = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|e| Error::Resample(e.to_string()))?
            .into_iter()
            .next()
            .unwrap_or_default();
        if tail.is_empty() {
            break;
        }
        output.extend_from_slice(&tail);
    }

    let mut aligned: Vec<f32> = output.into_iter().skip(delay).take(wanted).collect();
    aligned.resize(wanted, 0.0);

    log::debug!(
        "Resampled {} -> {} samples ({}Hz -> {}Hz, {:?})",
        samples.len(),
        aligned.len(),
        from_rate,
        to_rate,
        quality
    );

    Ok(aligned)
}
