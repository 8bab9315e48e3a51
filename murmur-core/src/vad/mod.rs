//! Voice Activity Detection (VAD).
//!
//! The `VoiceActivityDetector` trait is the seam between a capture loop and
//! a classifier: push raw PCM bytes through [`process`](VoiceActivityDetector::process),
//! subscribe to [`events`](VoiceActivityDetector::events), read the segment
//! timestamps back. `EnergyVad` is the default; `SpectralVad` trades CPU for
//! robustness against steady tonal noise.

pub mod energy;
pub mod events;
pub mod spectral;

pub use energy::{DetectorState, EnergyVad, EnergyVadConfig};
pub use events::{EventKind, ListenerId, Listeners, VadEvent};
pub use spectral::{SpectralVad, SpectralVadConfig};

use crate::buffering::frame::AudioFrame;
use crate::error::{MurmurError, Result};

/// Whether a given audio frame contains speech or silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VadDecision {
    /// The frame passed the detector's activity test.
    Speech,
    /// The frame is silent, below threshold, or part of noise calibration.
    Silence,
}

impl VadDecision {
    pub fn is_speech(self) -> bool {
        self == VadDecision::Speech
    }
}

/// Trait for all VAD implementations.
///
/// Detectors are single-owner and synchronous. Callers feeding audio from
/// several threads must serialize calls themselves.
pub trait VoiceActivityDetector: Send + 'static {
    /// Classify one complete frame, advance the virtual clock and fire any
    /// resulting events.
    fn classify(&mut self, frame: &AudioFrame) -> VadDecision;

    /// Feed the first `length` bytes of `buffer` (16-bit little-endian mono
    /// PCM). Bytes that do not fill a whole frame are kept for the next call.
    ///
    /// # Errors
    /// `MurmurError::InvalidLength` if `length > buffer.len()`.
    fn process(&mut self, buffer: &[u8], length: usize) -> Result<()>;

    /// Return all adaptive state to its construction-time values. The
    /// configuration and registered listeners are kept.
    fn reset(&mut self);

    /// Subscriber registry for this detector's events.
    fn events(&mut self) -> &mut Listeners;

    /// Whether speech-end / no-speech events are delivered.
    fn enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    /// Virtual time consumed so far, derived from sample counts.
    fn elapsed_ms(&self) -> f64;

    /// Virtual time of the most recent speech begin.
    fn speech_begin_time_ms(&self) -> f64;

    /// Virtual time of the most recent speech end.
    fn speech_end_time_ms(&self) -> f64;

    fn is_speech_active(&self) -> bool;
}

/// Bounds-check the `(buffer, length)` pair accepted by `process`.
pub(crate) fn checked_input(buffer: &[u8], length: usize) -> Result<&[u8]> {
    buffer
        .get(..length)
        .ok_or(MurmurError::InvalidLength {
            length,
            available: buffer.len(),
        })
}
