// FILE: crates/media-engine/src/decoder.rs

use crate::error::{EngineError, EngineResult};
use std::path::Path;
use std::time::Duration;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// What a successful probe learned about a file
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub channels: usize,
    pub duration: Option<Duration>,
}

impl AudioInfo {
    /// Wall-clock length when played at `rate`
    pub fn playback_time(&self, rate: f32) -> Option<Duration> {
        self.duration
            .map(|duration| duration.div_f32(rate.max(f32::EPSILON)))
    }
}

/// Checks that `path` holds decodable audio
///
/// The container is probed, a decoder is built for the default track and
/// the first packet is decoded. Anything short of that is a decode error.
pub fn probe(path: &Path) -> EngineResult<AudioInfo> {
    let file = std::fs::File::open(path)
        .map_err(|e| EngineError::decode(path, format!("Failed to open file: {}", e)))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| EngineError::decode(path, format!("Failed to probe format: {}", e)))?;

    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| EngineError::decode(path, "No audio track found"))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| EngineError::decode(path, format!("Failed to create decoder: {}", e)))?;

    let sample_rate = codec_params.sample_rate.unwrap_or(44100);
    let duration = match (codec_params.n_frames, codec_params.time_base) {
        (Some(frames), Some(time_base)) => {
            let time = time_base.calc_time(frames);
            Some(Duration::from_secs(time.seconds) + Duration::from_secs_f64(time.frac))
        }
        (Some(frames), None) => Some(Duration::from_secs_f64(
            frames as f64 / f64::from(sample_rate),
        )),
        _ => None,
    };

    let channels = loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(EngineError::decode(path, "No audio frames"));
            }
            Err(e) => {
                return Err(EngineError::decode(
                    path,
                    format!("Failed to read packet: {}", e),
                ));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => break decoded.spec().channels.count(),
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("Decode error in {}, skipping packet: {}", path.display(), e);
                continue;
            }
            Err(e) => {
                return Err(EngineError::decode(
                    path,
                    format!("Failed to decode packet: {}", e),
                ));
            }
        }
    };

    Ok(AudioInfo {
        sample_rate,
        channels,
        duration,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Mono 16-bit PCM WAV of `frames` samples at 8 kHz
    pub(crate) fn wav_bytes(frames: u32) -> Vec<u8> {
        let sample_rate: u32 = 8000;
        let data_len = frames * 2;
        let mut bytes = Vec::with_capacity(44 + data_len as usize);
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
        bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        for i in 0..frames {
            let sample = ((i % 40) as i16 - 20) * 800;
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_probe_nonexistent_file() {
        let result = probe(Path::new("nonexistent.mp3"));
        assert!(matches!(result, Err(EngineError::DecodeError { .. })));
    }

    #[test]
    fn test_probe_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.mp3");
        std::fs::write(&path, b"<html>503 Service Unavailable</html>").unwrap();
        assert!(matches!(probe(&path), Err(EngineError::DecodeError { .. })));
    }

    #[test]
    fn test_probe_wav() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tone.wav");
        std::fs::write(&path, wav_bytes(8000)).unwrap();

        let info = probe(&path).unwrap();
        assert_eq!(info.sample_rate, 8000);
        assert_eq!(info.channels, 1);
        let duration = info.duration.unwrap();
        assert!((duration.as_secs_f64() - 1.0).abs() < 0.01);
        let fast = info.playback_time(2.0).unwrap();
        assert!((fast.as_secs_f64() - 0.5).abs() < 0.01);
    }
}
