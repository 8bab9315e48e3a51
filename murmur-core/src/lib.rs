//! # murmur-core
//!
//! Streaming voice activity detection for 16-bit PCM capture loops.
//!
//! ## Architecture
//!
//! ```text
//! capture loop ─► process(bytes) ─► FrameReassembler ─► AudioFrame (10 ms)
//!                                                          │
//!                                              EnergyVad | SpectralVad
//!                                                          │
//!                                      Listeners ─► callbacks / channel taps
//! ```
//!
//! Detectors are synchronous and deterministic: every timing decision runs on
//! a virtual clock derived from sample counts, never on wall-clock time.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod audio;
pub mod buffering;
pub mod dsp;
pub mod error;
pub mod vad;

// Convenience re-exports for downstream crates
pub use audio::PcmSource;
pub use buffering::{frame::AudioFrame, FrameReassembler};
pub use dsp::FftContext;
pub use error::{MurmurError, Result};
pub use vad::{
    EnergyVad, EnergyVadConfig, EventKind, ListenerId, Listeners, SpectralVad, SpectralVadConfig,
    VadDecision, VadEvent, VoiceActivityDetector,
};
