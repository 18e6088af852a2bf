use std::borrow::Cow;
use std::sync::Arc;

use rayon::prelude::*;
use rustfft::{num_complex::Complex, Fft, FftPlanner, FftPlannerScalar, Length};
use serde::{Deserialize, Serialize};

use super::matrix::ComplexMatrix;
use super::window::WindowType;
use crate::audio::AudioSignal;
use crate::error::{Error, Result};

/// How the signal edges are treated before framing.
///
/// `None` keeps the first frame at sample 0 and drops any trailing partial
/// frame. `Zero` and `Reflect` pad `frame_size / 2` samples on each side so
/// that frame `i` is centred on sample `i * hop_size`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    #[default]
    None,
    Zero,
    Reflect,
}

/// Forward complex FFT of a fixed length, applied in place.
pub trait FrameTransform: Send + Sync {
    fn len(&self) -> usize;

    fn scratch_len(&self) -> usize;

    fn process(&self, buffer: &mut [Complex<f32>], scratch: &mut [Complex<f32>]);
}

pub struct RustFftTransform {
    fft: Arc<dyn Fft<f32>>,
}

impl RustFftTransform {
    /// Fastest plan for this CPU.
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        Self {
            fft: planner.plan_fft_forward(size),
        }
    }

    /// Scalar-only plan; same bits on every target at some cost in speed.
    pub fn portable(size: usize) -> Self {
        let mut planner = FftPlannerScalar::<f32>::new();
        Self {
            fft: planner.plan_fft_forward(size),
        }
    }
}

impl FrameTransform for RustFftTransform {
    fn len(&self) -> usize {
        self.fft.len()
    }

    fn scratch_len(&self) -> usize {
        self.fft.get_inplace_scratch_len()
    }

    fn process(&self, buffer: &mut [Complex<f32>], scratch: &mut [Complex<f32>]) {
        self.fft.process_with_scratch(buffer, scratch);
    }
}

/// Frame buffer and FFT scratch, allocated once and reused for every frame.
struct Workspace {
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl Workspace {
    fn new<F: FrameTransform>(fft: &F) -> Self {
        Self {
            buffer: vec![Complex::new(0.0, 0.0); fft.len()],
            scratch: vec![Complex::new(0.0, 0.0); fft.scratch_len()],
        }
    }

    /// Window `frame`, transform it, return the non-redundant half spectrum.
    fn analyse<F: FrameTransform>(&mut self, plan: &StftPlan<F>, frame: &[f32]) -> &[Complex<f32>] {
        for ((dst, &s), &w) in self.buffer.iter_mut().zip(frame).zip(&plan.window) {
            *dst = Complex::new(s * w, 0.0);
        }
        plan.fft.process(&mut self.buffer, &mut self.scratch);
        &self.buffer[..plan.bins()]
    }
}

/// Short-time Fourier transform with fixed framing parameters.
pub struct StftPlan<F = RustFftTransform> {
    frame_size: usize,
    hop_size: usize,
    window: Vec<f32>,
    boundary: Boundary,
    fft: F,
}

impl StftPlan<RustFftTransform> {
    pub fn new(frame_size: usize, hop_size: usize, window: WindowType, boundary: Boundary) -> Result<Self> {
        Self::with_transform(frame_size, hop_size, window, boundary, RustFftTransform::new(frame_size))
    }
}

impl<F: FrameTransform> StftPlan<F> {
    pub fn with_transform(
        frame_size: usize,
        hop_size: usize,
        window: WindowType,
        boundary: Boundary,
        fft: F,
    ) -> Result<Self> {
        check_framing(frame_size, hop_size)?;
        if fft.len() != frame_size {
            return Err(Error::InvalidParameter(format!(
                "transform length {} does not match frame size {}",
                fft.len(),
                frame_size
            )));
        }
        Ok(Self {
            frame_size,
            hop_size,
            window: window.coefficients(frame_size),
            boundary,
            fft,
        })
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// `frame_size / 2 + 1`, DC through Nyquist.
    pub fn bins(&self) -> usize {
        self.frame_size / 2 + 1
    }

    fn pad(&self) -> usize {
        match self.boundary {
            Boundary::None => 0,
            Boundary::Zero | Boundary::Reflect => self.frame_size / 2,
        }
    }

    /// Frames produced for `samples` input samples, or `None` if the
    /// (padded) signal does not fill a single frame.
    pub fn frame_count(&self, samples: usize) -> Option<usize> {
        let padded = samples + 2 * self.pad();
        if samples == 0 || padded < self.frame_size {
            None
        } else {
            Some((padded - self.frame_size) / self.hop_size + 1)
        }
    }

    fn padded<'a>(&self, samples: &'a [f32]) -> Result<Cow<'a, [f32]>> {
        let pad = self.pad();
        match self.boundary {
            Boundary::None => Ok(Cow::Borrowed(samples)),
            Boundary::Zero => {
                let mut out = vec![0.0; samples.len() + 2 * pad];
                out[pad..pad + samples.len()].copy_from_slice(samples);
                Ok(Cow::Owned(out))
            }
            Boundary::Reflect => {
                let n = samples.len();
                if n <= pad {
                    return Err(Error::SignalTooShort {
                        samples: n,
                        frame_size: self.frame_size,
                    });
                }
                let mut out = Vec::with_capacity(n + 2 * pad);
                out.extend((1..=pad).rev().map(|i| samples[i]));
                out.extend_from_slice(samples);
                out.extend((n - 1 - pad..n - 1).rev().map(|i| samples[i]));
                Ok(Cow::Owned(out))
            }
        }
    }

    /// Validate the signal and lay out the frames. Runs before any FFT work.
    fn prepare<'a>(&self, signal: &'a AudioSignal) -> Result<(Cow<'a, [f32]>, usize)> {
        if let Some(i) = signal.samples.iter().position(|s| !s.is_finite()) {
            return Err(Error::NumericDomain(format!("non-finite sample at index {}", i)));
        }
        let frames = self.frame_count(signal.len()).ok_or(Error::SignalTooShort {
            samples: signal.len(),
            frame_size: self.frame_size,
        })?;
        let samples = self.padded(&signal.samples)?;
        Ok((samples, frames))
    }

    fn frame<'s>(&self, samples: &'s [f32], index: usize) -> &'s [f32] {
        let start = index * self.hop_size;
        &samples[start..start + self.frame_size]
    }

    pub fn transform(&self, signal: AudioSignal) -> Result<ComplexMatrix> {
        let (samples, frames) = self.prepare(&signal)?;
        let mut workspace = Workspace::new(&self.fft);
        let mut matrix = ComplexMatrix::filled(self.bins(), frames);

        for i in 0..frames {
            let bins = workspace.analyse(self, self.frame(&samples, i));
            matrix.set_column(i, bins);
        }

        log::debug!(
            "STFT: {} samples -> {} bins x {} frames (frame={}, hop={}, boundary={:?})",
            signal.len(),
            self.bins(),
            frames,
            self.frame_size,
            self.hop_size,
            self.boundary
        );
        Ok(matrix)
    }

    /// Same result as [`transform`](Self::transform), bit for bit, with
    /// frames spread over the rayon pool. Each worker owns its workspace.
    pub fn transform_parallel(&self, signal: AudioSignal) -> Result<ComplexMatrix> {
        let (samples, frames) = self.prepare(&signal)?;

        let columns: Vec<Vec<Complex<f32>>> = (0..frames)
            .into_par_iter()
            .map_init(
                || Workspace::new(&self.fft),
                |workspace, i| workspace.analyse(self, self.frame(&samples, i)).to_vec(),
            )
            .collect();

        let mut matrix = ComplexMatrix::filled(self.bins(), frames);
        for (i, column) in columns.iter().enumerate() {
            matrix.set_column(i, column);
        }
        Ok(matrix)
    }
}

fn check_framing(frame_size: usize, hop_size: usize) -> Result<()> {
    if frame_size < 2 || frame_size % 2 != 0 {
        return Err(Error::InvalidParameter(format!(
            "frame size must be even and at least 2 (got {})",
            frame_size
        )));
    }
    if hop_size == 0 {
        return Err(Error::InvalidParameter("hop size must be positive".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sine;

    fn plan(frame: usize, hop: usize) -> StftPlan {
        StftPlan::new(frame, hop, WindowType::Hann, Boundary::None).unwrap()
    }

    #[test]
    fn frame_count_matches_formula() {
        let p = plan(2048, 512);
        assert_eq!(p.frame_count(88200), Some(169));
        assert_eq!(p.frame_count(2048), Some(1));
        assert_eq!(p.frame_count(2047), None);
    }

    #[test]
    fn padded_boundaries_add_frames() {
        let zero = StftPlan::new(1024, 256, WindowType::Hann, Boundary::Zero).unwrap();
        // (10000 + 1024 - 1024) / 256 + 1
        assert_eq!(zero.frame_count(10000), Some(40));
        assert_eq!(plan(1024, 256).frame_count(10000), Some(36));
    }

    #[test]
    fn output_shape() {
        let signal = AudioSignal::new(sine(440.0, 8000, 1.0, 0.5), 8000);
        let m = plan(256, 128).transform(signal).unwrap();
        assert_eq!(m.shape(), (129, (8000 - 256) / 128 + 1));
    }

    #[test]
    fn tone_lands_in_expected_bin() {
        let sr = 16000;
        let frame = 1024;
        for freq in [250.0f32, 1000.0, 3333.0] {
            let signal = AudioSignal::new(sine(freq, sr, 0.5, 0.9), sr);
            let m = plan(frame, 256).transform(signal).unwrap();
            let mags = m.map(|c| c.norm());
            let expected = (freq * frame as f32 / sr as f32).round() as i64;
            for col in [0, m.cols() / 2, m.cols() - 1] {
                let peak = mags.argmax_in_column(col).unwrap() as i64;
                assert!((peak - expected).abs() <= 1, "{freq}Hz: bin {peak}, expected {expected}");
            }
        }
    }

    #[test]
    fn repeated_runs_are_bit_identical() {
        let samples = sine(523.25, 22050, 0.75, 0.7);
        let p = plan(512, 128);
        let a = p.transform(AudioSignal::new(samples.clone(), 22050)).unwrap();
        let b = p.transform(AudioSignal::new(samples, 22050)).unwrap();
        let bits = |m: &ComplexMatrix| -> Vec<(u32, u32)> {
            m.as_slice().iter().map(|c| (c.re.to_bits(), c.im.to_bits())).collect()
        };
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn parallel_matches_serial() {
        let samples = sine(97.0, 8000, 2.0, 0.3);
        let p = StftPlan::new(256, 64, WindowType::Blackman, Boundary::Reflect).unwrap();
        let serial = p.transform(AudioSignal::new(samples.clone(), 8000)).unwrap();
        let parallel = p.transform_parallel(AudioSignal::new(samples, 8000)).unwrap();
        assert_eq!(serial, parallel);
    }

    #[test]
    fn portable_engine_agrees_closely() {
        let samples = sine(700.0, 8000, 0.5, 0.5);
        let fast = plan(512, 256).transform(AudioSignal::new(samples.clone(), 8000)).unwrap();
        let portable = StftPlan::with_transform(
            512,
            256,
            WindowType::Hann,
            Boundary::None,
            RustFftTransform::portable(512),
        )
        .unwrap()
        .transform(AudioSignal::new(samples, 8000))
        .unwrap();
        for (a, b) in fast.as_slice().iter().zip(portable.as_slice()) {
            assert!((a - b).norm() < 1e-3);
        }
    }

    #[test]
    fn reflect_padding_mirrors_edges() {
        let p = StftPlan::new(4, 1, WindowType::Rectangular, Boundary::Reflect).unwrap();
        let padded = p.padded(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(&*padded, &[3.0, 2.0, 1.0, 2.0, 3.0, 4.0, 5.0, 4.0, 3.0]);
    }

    #[test]
    fn zero_padding_surrounds_signal() {
        let p = StftPlan::new(4, 1, WindowType::Rectangular, Boundary::Zero).unwrap();
        let padded = p.padded(&[1.0, 2.0]).unwrap();
        assert_eq!(&*padded, &[0.0, 0.0, 1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn short_signal_fails_before_transform() {
        let err = plan(1024, 256)
            .transform(AudioSignal::new(vec![0.0; 1000], 44100))
            .unwrap_err();
        assert!(matches!(err, Error::SignalTooShort { samples: 1000, frame_size: 1024 }));
    }

    #[test]
    fn rejects_bad_framing() {
        assert!(StftPlan::new(1023, 256, WindowType::Hann, Boundary::None).is_err());
        assert!(StftPlan::new(1024, 0, WindowType::Hann, Boundary::None).is_err());
    }

    #[test]
    fn rejects_non_finite_samples() {
        let mut samples = vec![0.0; 4096];
        samples[10] = f32::NAN;
        let err = plan(1024, 256).transform(AudioSignal::new(samples, 44100)).unwrap_err();
        assert!(matches!(err, Error::NumericDomain(_)));
    }

    #[test]
    fn dc_frame_has_energy_only_at_bin_zero() {
        let p = StftPlan::new(64, 64, WindowType::Rectangular, Boundary::None).unwrap();
        let m = p.transform(AudioSignal::new(vec![1.0; 64], 1000)).unwrap();
        assert!((m.get(0, 0).unwrap().re - 64.0).abs() < 1e-4);
        for bin in 1..m.rows() {
            assert!(m.get(bin, 0).unwrap().norm() < 1e-4);
        }
    }
}
