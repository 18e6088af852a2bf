//! Serial vs rayon STFT over ten seconds of audio at the reference framing.

use criterion::{criterion_group, criterion_main, Criterion};
use sonogram::analysis::{Boundary, RustFftTransform, StftPlan, WindowType};
use sonogram::audio::AudioSignal;
use std::hint::black_box;

const SAMPLE_RATE: u32 = 44100;

fn ten_seconds() -> AudioSignal {
    let samples = (0..SAMPLE_RATE as usize * 10)
        .map(|i| (i as f32 * 0.031).sin() * 0.5)
        .collect();
    AudioSignal::new(samples, SAMPLE_RATE)
}

fn serial_stft(c: &mut Criterion) {
    let signal = ten_seconds();
    let plan = StftPlan::new(2048, 512, WindowType::Hann, Boundary::None).unwrap();
    c.bench_function("stft serial", |b| {
        b.iter(|| black_box(plan.transform(signal.clone()).unwrap()))
    });
}

fn parallel_stft(c: &mut Criterion) {
    let signal = ten_seconds();
    let plan = StftPlan::new(2048, 512, WindowType::Hann, Boundary::None).unwrap();
    c.bench_function("stft parallel", |b| {
        b.iter(|| black_box(plan.transform_parallel(signal.clone()).unwrap()))
    });
}

fn portable_stft(c: &mut Criterion) {
    let signal = ten_seconds();
    let plan = StftPlan::with_transform(
        2048,
        512,
        WindowType::Hann,
        Boundary::None,
        RustFftTransform::portable(2048),
    )
    .unwrap();
    c.bench_function("stft portable fft", |b| {
        b.iter(|| black_box(plan.transform(signal.clone()).unwrap()))
    });
}

criterion_group!(benches, serial_stft, parallel_stft, portable_stft);
criterion_main!(benches);
