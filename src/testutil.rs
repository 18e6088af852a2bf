//! Signal and container fixtures shared by the unit tests.

use std::io::Cursor;

pub fn sine(freq: f32, sample_rate: u32, seconds: f32, amplitude: f32) -> Vec<f32> {
    let n = (sample_rate as f32 * seconds).round() as usize;
    (0..n)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            (amplitude as f64 * (2.0 * std::f64::consts::PI * freq as f64 * t).sin()) as f32
        })
        .collect()
}

/// 16-bit PCM WAV file, one inner vec per frame.
pub fn wav_bytes(channels: u16, sample_rate: u32, frames: &[Vec<i16>]) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for frame in frames {
            for &s in frame {
                writer.write_sample(s).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

pub fn mono_wav(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let frames: Vec<Vec<i16>> = samples
        .iter()
        .map(|s| vec![(s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16])
        .collect();
    wav_bytes(1, sample_rate, &frames)
}
