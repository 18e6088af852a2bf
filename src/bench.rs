use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Instant;

use crate::audio::AudioSource;
use crate::error::{Error, Result};
use crate::pipeline::{Pipeline, Spectrogram};

#[derive(Clone, Debug, Serialize)]
pub struct BenchReport {
    pub input: String,
    pub iterations: u32,
    /// Seconds per iteration, decode through raster.
    pub timings: Vec<f64>,
    pub mean: f64,
    pub total: f64,
    pub bins: usize,
    pub frames: usize,
    /// Fingerprint of the first iteration's matrix, in hex.
    pub fingerprint: String,
    pub verified: bool,
}

/// Run the whole pipeline `iterations` times on the same input.
///
/// With `verify`, every run's matrix must hash identically to the first;
/// a mismatch aborts the benchmark.
pub fn run_benchmark(
    pipeline: &Pipeline,
    source: &AudioSource,
    iterations: u32,
    verify: bool,
) -> Result<(BenchReport, Spectrogram)> {
    if iterations == 0 {
        return Err(Error::InvalidParameter("benchmark needs at least one iteration".into()));
    }

    let pb = ProgressBar::new(iterations as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} runs ({eta} remaining)")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    let t0 = Instant::now();
    let mut timings = Vec::with_capacity(iterations as usize);
    let mut first: Option<(u64, Spectrogram)> = None;

    for i in 0..iterations {
        let start = Instant::now();
        let spectrogram = pipeline.run(source)?;
        let elapsed = start.elapsed().as_secs_f64();
        timings.push(elapsed);

        let fingerprint = spectrogram.matrix.fingerprint();
        match first.as_ref().map(|(fp, _)| *fp) {
            None => first = Some((fingerprint, spectrogram)),
            Some(expected) if verify && expected != fingerprint => {
                pb.abandon();
                return Err(Error::Nondeterministic {
                    iteration: i,
                    expected,
                    actual: fingerprint,
                });
            }
            Some(_) => {}
        }

        log::info!(
            "Iteration {}: {:.3}s (running mean {:.3}s)",
            i,
            elapsed,
            t0.elapsed().as_secs_f64() / (i as f64 + 1.0)
        );
        pb.set_position(i as u64 + 1);
    }
    pb.finish_with_message("Benchmark complete");

    let (fingerprint, spectrogram) =
        first.ok_or_else(|| Error::InvalidParameter("benchmark produced no output".into()))?;
    let total: f64 = timings.iter().sum();
    let report = BenchReport {
        input: source.label(),
        iterations,
        mean: total / iterations as f64,
        total,
        timings,
        bins: spectrogram.matrix.rows(),
        frames: spectrogram.matrix.cols(),
        fingerprint: format!("{:016x}", fingerprint),
        verified: verify,
    };
    Ok((report, spectrogram))
}
