use std::io::Cursor;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Instantiate;

use super::AudioSource;
use crate::error::{Error, Result};

/// Interleaved PCM exactly as the container stores it, before downmixing.
#[derive(Clone, Debug)]
pub struct DecodedAudio {
    pub interleaved: Vec<f32>,
    pub channels: usize,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.interleaved.len() / self.channels
        }
    }
}

/// Anything that can turn an [`AudioSource`] into PCM samples.
pub trait Decode {
    fn decode(&self, source: &AudioSource) -> Result<DecodedAudio>;
}

/// Default decoder backed by symphonia's probe and codec registries.
#[derive(Clone, Copy, Debug, Default)]
pub struct SymphoniaDecoder;

impl Decode for SymphoniaDecoder {
    fn decode(&self, source: &AudioSource) -> Result<DecodedAudio> {
        let label = source.label();

        let media: Box<dyn MediaSource> = match source {
            AudioSource::Path(path) => Box::new(open_file(path)?),
            AudioSource::Bytes { data, hint } => {
                if let Some(ext) = hint {
                    log::debug!("{}: decoding {} bytes (hint: {})", label, data.len(), ext);
                }
                Box::new(Cursor::new(data.clone()))
            }
        };

        decode_stream(MediaSourceStream::new(media, Default::default()), &label)
    }
}

fn open_file(path: &Path) -> Result<std::fs::File> {
    std::fs::File::open(path).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })
}

fn map_err(label: &str, err: SymphoniaError) -> Error {
    match err {
        SymphoniaError::IoError(source) => Error::Io {
            path: label.to_string(),
            source,
        },
        SymphoniaError::Unsupported(reason) => Error::UnsupportedFormat {
            path: label.to_string(),
            reason: reason.to_string(),
        },
        other => Error::corrupt(label, other),
    }
}

/// Find a container marker and open its reader.
///
/// Running out of bytes while searching for a marker means the input is not
/// a known container. Once a marker is found, any read failure is corruption.
fn open_format(mut mss: MediaSourceStream, label: &str) -> Result<Box<dyn FormatReader>> {
    let probe = symphonia::default::get_probe();
    loop {
        let inst = probe.next(&mut mss).map_err(|e| match e {
            SymphoniaError::IoError(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                Error::UnsupportedFormat {
                    path: label.to_string(),
                    reason: "no recognised container".into(),
                }
            }
            other => map_err(label, other),
        })?;

        match inst {
            Instantiate::Format(open) => {
                return open(mss, &FormatOptions::default()).map_err(|e| map_err(label, e));
            }
            Instantiate::Metadata(meta) => {
                // Leading tags (e.g. ID3v2) are skipped; only the samples matter here.
                meta(&MetadataOptions::default())
                    .read_all(&mut mss)
                    .map_err(|e| map_err(label, e))?;
            }
        }
    }
}

fn decode_stream(mss: MediaSourceStream, label: &str) -> Result<DecodedAudio> {
    let mut format = open_format(mss, label)?;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::UnsupportedFormat {
            path: label.to_string(),
            reason: "no decodable audio track".into(),
        })?;

    let track_id = track.id;
    let mut channels = track.codec_params.channels.map_or(0, |c| c.count());
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| Error::corrupt(label, "unknown sample rate"))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| map_err(label, e))?;

    let mut interleaved: Vec<f32> = Vec::new();
    let mut skipped = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(map_err(label, e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(_)) => {
                skipped += 1;
                continue;
            }
            Err(e) => return Err(map_err(label, e)),
        };

        let spec = *decoded.spec();
        let packet_channels = spec.channels.count();
        if channels == 0 {
            channels = packet_channels;
        } else if channels != packet_channels {
            return Err(Error::corrupt(
                label,
                format!("channel count changed mid-stream ({} -> {})", channels, packet_channels),
            ));
        }

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(sample_buf.samples());
    }

    if skipped > 0 {
        log::warn!("{}: skipped {} undecodable packets", label, skipped);
    }

    Ok(DecodedAudio {
        interleaved,
        channels: channels.max(1),
        sample_rate,
    })
}

/// Unweighted average across channels.
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::wav_bytes;

    #[test]
    fn downmix_averages_channels() {
        let mono = downmix(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2);
        assert_eq!(mono, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn downmix_mono_is_identity() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(downmix(&samples, 1), samples);
    }

    #[test]
    fn decodes_stereo_wav_from_memory() {
        let frames: Vec<Vec<i16>> = (0..1000).map(|_| vec![16384, -16384]).collect();
        let source = AudioSource::bytes(wav_bytes(2, 22050, &frames), Some("wav"));
        let decoded = SymphoniaDecoder.decode(&source).unwrap();

        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.sample_rate, 22050);
        assert_eq!(decoded.frames(), 1000);
        assert!((decoded.interleaved[0] - 0.5).abs() < 1e-3);
        assert!((decoded.interleaved[1] + 0.5).abs() < 1e-3);
    }

    #[test]
    fn garbage_is_unsupported() {
        let source = AudioSource::bytes(vec![0x13; 4096], None);
        let err = SymphoniaDecoder.decode(&source).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }), "got {err:?}");
    }

    fn assert_corrupt(data: Vec<u8>) {
        let source = AudioSource::bytes(data, Some("wav"));
        match SymphoniaDecoder.decode(&source) {
            Err(Error::Io { path, .. }) => assert_eq!(path, "<memory>"),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn truncated_header_is_io_error() {
        // RIFF/WAVE header whose fmt chunk stops after four of its sixteen bytes.
        let mut data = Vec::new();
        data.extend_from_slice(b"RIFF");
        data.extend_from_slice(&36u32.to_le_bytes());
        data.extend_from_slice(b"WAVE");
        data.extend_from_slice(b"fmt ");
        data.extend_from_slice(&16u32.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        assert_corrupt(data);
    }

    #[test]
    fn garbled_fmt_chunk_is_io_error() {
        let frames: Vec<Vec<i16>> = (0..256).map(|i| vec![i as i16]).collect();
        let mut data = wav_bytes(1, 8000, &frames);
        // bits per sample lives at offset 34 of a plain PCM header
        assert_eq!(&data[34..36], &16u16.to_le_bytes());
        data[34..36].copy_from_slice(&12u16.to_le_bytes());
        assert_corrupt(data);
    }

    #[test]
    fn missing_file_reports_path() {
        let source = AudioSource::Path("/definitely/not/here.wav".into());
        match SymphoniaDecoder.decode(&source) {
            Err(Error::Io { path, .. }) => assert!(path.contains("not/here.wav")),
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
