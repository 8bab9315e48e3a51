//! PCM sources for offline scanning.
//!
//! Detectors consume raw 16-bit little-endian mono bytes. `PcmSource` loads
//! that from either a WAV container (rate taken from the header) or a
//! headerless `.raw` / `.pcm` dump (rate supplied by the caller).

use std::path::Path;

use hound::{SampleFormat, WavReader};
use tracing::info;

use crate::error::{MurmurError, Result};

/// A fully loaded mono PCM stream.
#[derive(Debug, Clone)]
pub struct PcmSource {
    /// 16-bit little-endian samples.
    pub bytes: Vec<u8>,
    pub sample_rate: u32,
}

impl PcmSource {
    /// Open `path`, choosing the decoder by extension. Anything other than
    /// `.wav` is read as raw PCM at `raw_sample_rate`.
    pub fn open(path: impl AsRef<Path>, raw_sample_rate: u32) -> Result<Self> {
        let path = path.as_ref();
        let is_wav = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("wav"));

        if is_wav {
            Self::from_wav(path)
        } else {
            Self::from_raw(path, raw_sample_rate)
        }
    }

    /// Decode a mono 16-bit integer WAV file.
    pub fn from_wav(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = WavReader::open(path).map_err(wav_error)?;
        let spec = reader.spec();

        if spec.channels != 1 || spec.bits_per_sample != 16 || spec.sample_format != SampleFormat::Int
        {
            return Err(MurmurError::UnsupportedFormat(format!(
                "expected mono 16-bit PCM, got {} channel(s) {}-bit {:?}",
                spec.channels, spec.bits_per_sample, spec.sample_format
            )));
        }
        if spec.sample_rate == 0 {
            return Err(MurmurError::InvalidSampleRate(0));
        }

        let mut bytes = Vec::with_capacity(reader.len() as usize * 2);
        for sample in reader.into_samples::<i16>() {
            bytes.extend_from_slice(&sample.map_err(wav_error)?.to_le_bytes());
        }

        info!(path = ?path, sample_rate = spec.sample_rate, bytes = bytes.len(), "loaded WAV");
        Ok(Self {
            bytes,
            sample_rate: spec.sample_rate,
        })
    }

    /// Read headerless little-endian PCM.
    pub fn from_raw(path: impl AsRef<Path>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(MurmurError::InvalidSampleRate(0));
        }
        let bytes = std::fs::read(path.as_ref())?;
        info!(path = ?path.as_ref(), sample_rate, bytes = bytes.len(), "loaded raw PCM");
        Ok(Self { bytes, sample_rate })
    }

    /// Stream duration in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        (self.bytes.len() / 2) as f64 * 1000.0 / self.sample_rate as f64
    }
}

fn wav_error(e: hound::Error) -> MurmurError {
    match e {
        hound::Error::IoError(io) => MurmurError::Io(io),
        other => MurmurError::UnsupportedFormat(other.to_string()),
    }
}
