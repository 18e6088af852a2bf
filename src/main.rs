mod cli;

use anyhow::{Context, Result};
use clap::Parser;

use cli::Cli;
use sonogram::audio::AudioSource;
use sonogram::bench::run_benchmark;
use sonogram::config::{self, Config};
use sonogram::encode::png::write_png;
use sonogram::Pipeline;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    // Explicit --config path, or auto-detect sonogram.toml / global config
    let file_config = match cli.config.clone().or_else(config::find_config) {
        Some(path) => match config::load_config(&path) {
            Some(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            None => {
                log::warn!("Failed to load config from {}", path.display());
                Config::default()
            }
        },
        None => Config::default(),
    };

    let spectrogram_config = cli.apply(file_config.resolve(cli.preset)?);

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }

    log::info!("sonogram - deterministic spectrogram renderer");
    log::info!("Input: {}", cli.input.display());
    log::info!("Output: {}", cli.output.display());
    log::info!(
        "Analysis: {}Hz, frame={}, hop={}, window={:?}, band={}, quality={:?}",
        spectrogram_config.sample_rate,
        spectrogram_config.frame_size,
        spectrogram_config.hop_size,
        spectrogram_config.window,
        spectrogram_config.effective_band(),
        spectrogram_config.quality
    );
    log::info!(
        "Decibels: reference={:?}, floor={} dB",
        spectrogram_config.reference,
        spectrogram_config.floor
    );

    let pipeline = Pipeline::new(spectrogram_config).context("Invalid spectrogram configuration")?;
    let source = AudioSource::from(cli.input.as_path());

    let spectrogram = match cli.iterations {
        Some(iterations) => {
            let (report, spectrogram) = run_benchmark(&pipeline, &source, iterations, cli.verify)
                .context("Benchmark failed")?;
            log::info!(
                "Benchmark: {} runs, mean {:.3}s, total {:.3}s, fingerprint {}",
                report.iterations,
                report.mean,
                report.total,
                report.fingerprint
            );
            if let Some(ref path) = cli.report {
                let json = serde_json::to_string_pretty(&report)?;
                std::fs::write(path, json)
                    .with_context(|| format!("Failed to write report: {}", path.display()))?;
                log::info!("Report written to {}", path.display());
            }
            spectrogram
        }
        None => pipeline
            .run(&source)
            .with_context(|| format!("Failed to process {}", cli.input.display()))?,
    };

    log::info!(
        "Matrix {}x{}, fingerprint {:016x}",
        spectrogram.matrix.rows(),
        spectrogram.matrix.cols(),
        spectrogram.matrix.fingerprint()
    );

    write_png(&cli.output, &spectrogram.image).context("Failed to write spectrogram")?;

    log::info!("Done! Output: {}", cli.output.display());
    Ok(())
}
