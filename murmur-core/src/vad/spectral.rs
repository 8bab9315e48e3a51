//! Spectral VAD: energy, spectral flatness and dominant frequency compared
//! against minima learned from the opening frames.
//!
//! Follows Moattar & Homayounpour, "A simple but efficient real-time voice
//! activity detection algorithm" (EUSIPCO 2009):
//!
//! 1. Frames are 10 ms, Hamming-windowed and zero-padded to a power of two.
//! 2. Per frame: `E` = windowed energy on the raw 16-bit scale,
//!    `F` = frequency of the strongest bin, `SFM` = `-10·log10(Gm/Am)` of
//!    the power spectrum.
//! 3. The first `bootstrap_frames` frames only track the minimum of each
//!    feature.
//! 4. A frame is speech when at least two of `E - minE ≥ 40·log10(minE)`,
//!    `F - minF ≥ 185 Hz`, `SFM - minSFM ≥ 5` hold. Silence frames fold into
//!    a running average of `minE`. The energy vote also needs
//!    `E ≥ energy_rise_ratio · minE`, so steady background hiss never votes
//!    on energy alone.
//! 5. Runs shorter than `min_speech_run` speech frames or `min_silence_run`
//!    silence frames do not change the segment state.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use super::events::{Listeners, VadEvent};
use super::{checked_input, VadDecision, VoiceActivityDetector};
use crate::buffering::frame::AudioFrame;
use crate::buffering::FrameReassembler;
use crate::dsp::{audio_level, hamming_window, mean_energy, FftContext, LevelMeter};
use crate::error::{MurmurError, Result};

/// Tuning for [`SpectralVad`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpectralVadConfig {
    /// Input sample rate (Hz). Default: 16000.
    pub sample_rate: u32,
    /// Deliver `SpeechEnd`. `SpeechBegin` always fires.
    pub enabled: bool,
    /// Analysis frame length. Default: 10 ms.
    pub frame_duration_ms: u32,
    /// Frames assumed silent at stream start. Default: 30 (300 ms).
    pub bootstrap_frames: u32,
    /// Energy threshold multiplier on `log10(minE)`. Default: 40.
    pub energy_prim_thresh: f64,
    /// Dominant-frequency rise that counts as speech. Default: 185 Hz.
    pub dominant_freq_prim_thresh_hz: f64,
    /// Spectral flatness rise (dB) that counts as speech. Default: 5.
    pub flatness_prim_thresh: f64,
    /// Consecutive speech frames that open a segment. Default: 5.
    pub min_speech_run: u32,
    /// Consecutive silence frames that close a segment. Default: 10.
    pub min_silence_run: u32,
    /// Floor for `minE` inside the logarithm. Default: 1.0.
    pub min_energy_floor: f64,
    /// Energy must also reach this multiple of `minE` to vote. Default: 2.0 (+3 dB).
    pub energy_rise_ratio: f64,
    /// Spacing of audio-level notifications. Default: 100 ms.
    pub audio_level_interval_ms: f64,
}

impl Default for SpectralVadConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            enabled: true,
            frame_duration_ms: 10,
            bootstrap_frames: 30,
            energy_prim_thresh: 40.0,
            dominant_freq_prim_thresh_hz: 185.0,
            flatness_prim_thresh: 5.0,
            min_speech_run: 5,
            min_silence_run: 10,
            min_energy_floor: 1.0,
            energy_rise_ratio: 2.0,
            audio_level_interval_ms: 100.0,
        }
    }
}

impl SpectralVadConfig {
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    pub fn frame_samples(&self) -> usize {
        (self.sample_rate as u64 * self.frame_duration_ms as u64 / 1000) as usize
    }

    pub fn frame_bytes(&self) -> usize {
        self.frame_samples() * 2
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(MurmurError::InvalidSampleRate(self.sample_rate));
        }
        if self.frame_samples() < 2 {
            return Err(MurmurError::InvalidConfig(format!(
                "{} ms frames are too short at {} Hz",
                self.frame_duration_ms, self.sample_rate
            )));
        }
        if self.min_speech_run == 0 || self.min_silence_run == 0 {
            return Err(MurmurError::InvalidConfig(
                "speech and silence runs must be at least one frame".into(),
            ));
        }
        if !(self.min_energy_floor.is_finite() && self.min_energy_floor > 0.0) {
            return Err(MurmurError::InvalidConfig(format!(
                "min_energy_floor must be positive, got {}",
                self.min_energy_floor
            )));
        }
        if !(self.energy_rise_ratio.is_finite() && self.energy_rise_ratio >= 1.0) {
            return Err(MurmurError::InvalidConfig(format!(
                "energy_rise_ratio must be at least 1, got {}",
                self.energy_rise_ratio
            )));
        }
        if self.audio_level_interval_ms < 0.0 {
            return Err(MurmurError::InvalidConfig(
                "audio_level_interval_ms must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// Features of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralFeatures {
    /// Sum of squared Hamming-windowed samples (16-bit scale).
    pub energy: f64,
    /// Frequency (Hz) of the strongest non-DC bin; 0 for an empty spectrum.
    pub dominant_hz: f64,
    /// `-10·log10(geometric / arithmetic mean)` of the power spectrum.
    pub flatness_db: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct SpectralState {
    frame_number: u64,
    silence_frames: u64,
    min_energy: f64,
    min_dominant_hz: f64,
    min_flatness_db: f64,
    speech_run: u32,
    silence_run: u32,
    speech_active: bool,
    elapsed_ms: f64,
    speech_begin_ms: f64,
    speech_end_ms: f64,
}

impl Default for SpectralState {
    fn default() -> Self {
        Self {
            frame_number: 0,
            silence_frames: 0,
            min_energy: f64::INFINITY,
            min_dominant_hz: f64::INFINITY,
            min_flatness_db: f64::INFINITY,
            speech_run: 0,
            silence_run: 0,
            speech_active: false,
            elapsed_ms: 0.0,
            speech_begin_ms: 0.0,
            speech_end_ms: 0.0,
        }
    }
}

/// Streaming spectral voice activity detector.
#[derive(Debug)]
pub struct SpectralVad {
    config: SpectralVadConfig,
    state: SpectralState,
    fft: FftContext,
    window: Vec<f64>,
    re: Vec<f64>,
    im: Vec<f64>,
    reassembler: FrameReassembler,
    level: LevelMeter,
    listeners: Listeners,
}

impl SpectralVad {
    /// # Errors
    /// Config validation errors, or `InvalidFftOrder` for absurd frame sizes.
    pub fn new(config: SpectralVadConfig) -> Result<Self> {
        config.validate()?;

        let frame_samples = config.frame_samples();
        let fft = FftContext::covering(frame_samples)?;
        info!(
            sample_rate = config.sample_rate,
            frame_samples,
            fft_len = fft.len(),
            "spectral VAD ready"
        );

        Ok(Self {
            window: hamming_window(frame_samples),
            re: vec![0.0; fft.len()],
            im: vec![0.0; fft.len()],
            fft,
            state: SpectralState::default(),
            reassembler: FrameReassembler::new(config.frame_bytes(), config.sample_rate),
            level: LevelMeter::new(config.audio_level_interval_ms),
            listeners: Listeners::new(),
            config,
        })
    }

    pub fn with_sample_rate(sample_rate: u32) -> Result<Self> {
        Self::new(SpectralVadConfig::with_sample_rate(sample_rate))
    }

    pub fn config(&self) -> &SpectralVadConfig {
        &self.config
    }

    /// Whether upcoming frames still feed the minima instead of being classified.
    pub fn is_calibrating(&self) -> bool {
        self.state.frame_number < self.config.bootstrap_frames as u64
    }

    /// Compute energy, dominant frequency and flatness for `frame`.
    pub fn analyze(&mut self, frame: &AudioFrame) -> SpectralFeatures {
        self.re.fill(0.0);
        self.im.fill(0.0);

        let mut energy = 0.0;
        for ((slot, &s), w) in self.re.iter_mut().zip(frame.samples()).zip(&self.window) {
            let v = s as f64 * w;
            energy += v * v;
            *slot = v;
        }

        // Scratch buffers are allocated at `fft.len()`.
        self.fft.transform(&mut self.re, &mut self.im, false);

        let n = self.fft.len();
        let bins = n / 2;
        if bins == 0 {
            return SpectralFeatures {
                energy,
                dominant_hz: 0.0,
                flatness_db: 0.0,
            };
        }

        let mut sum = 0.0;
        let mut log_sum = 0.0;
        let mut peak = (0usize, 0.0f64);
        for k in 1..=bins {
            let power = self.re[k] * self.re[k] + self.im[k] * self.im[k];
            sum += power;
            log_sum += (power + 1e-12).ln();
            if power > peak.1 {
                peak = (k, power);
            }
        }

        let arithmetic = sum / bins as f64;
        if arithmetic <= 0.0 {
            return SpectralFeatures {
                energy,
                dominant_hz: 0.0,
                flatness_db: 0.0,
            };
        }
        let geometric = (log_sum / bins as f64).exp();
        let flatness = (geometric / arithmetic).min(1.0);

        SpectralFeatures {
            energy,
            dominant_hz: peak.0 as f64 * self.config.sample_rate as f64 / n as f64,
            flatness_db: -10.0 * flatness.log10(),
        }
    }

    fn decide(&mut self, features: &SpectralFeatures) -> VadDecision {
        let cfg = &self.config;
        let state = &mut self.state;

        if state.frame_number <= cfg.bootstrap_frames as u64 {
            state.min_energy = state.min_energy.min(features.energy);
            state.min_dominant_hz = state.min_dominant_hz.min(features.dominant_hz);
            state.min_flatness_db = state.min_flatness_db.min(features.flatness_db);
            if state.frame_number == cfg.bootstrap_frames as u64 {
                debug!(
                    min_energy = state.min_energy,
                    min_dominant_hz = state.min_dominant_hz,
                    min_flatness_db = state.min_flatness_db,
                    "spectral minima calibrated"
                );
            }
            return VadDecision::Silence;
        }

        let thresh_energy = cfg.energy_prim_thresh * state.min_energy.max(cfg.min_energy_floor).log10();
        let energy_vote = features.energy - state.min_energy >= thresh_energy
            && features.energy >= cfg.energy_rise_ratio * state.min_energy;

        let votes = [
            energy_vote,
            features.dominant_hz - state.min_dominant_hz >= cfg.dominant_freq_prim_thresh_hz,
            features.flatness_db - state.min_flatness_db >= cfg.flatness_prim_thresh,
        ]
        .iter()
        .filter(|v| **v)
        .count();

        if votes >= 2 {
            VadDecision::Speech
        } else {
            state.silence_frames += 1;
            let n = state.silence_frames as f64;
            state.min_energy = (n * state.min_energy + features.energy) / (n + 1.0);
            VadDecision::Silence
        }
    }

    fn track_segment(&mut self, decision: VadDecision, now: f64) {
        let state = &mut self.state;
        match decision {
            VadDecision::Speech => {
                state.speech_run += 1;
                state.silence_run = 0;
                if !state.speech_active && state.speech_run >= self.config.min_speech_run {
                    state.speech_active = true;
                    state.speech_begin_ms = now;
                    debug!(at_ms = now, "speech begin");
                    self.listeners.emit(VadEvent::SpeechBegin { at_ms: now });
                }
            }
            VadDecision::Silence => {
                state.silence_run += 1;
                state.speech_run = 0;
                if state.speech_active && state.silence_run >= self.config.min_silence_run {
                    state.speech_active = false;
                    state.speech_end_ms = now;
                    debug!(at_ms = now, "speech end");
                    if self.config.enabled {
                        self.listeners.emit(VadEvent::SpeechEnd { at_ms: now });
                    }
                }
            }
        }
    }
}

impl VoiceActivityDetector for SpectralVad {
    fn classify(&mut self, frame: &AudioFrame) -> VadDecision {
        self.state.frame_number += 1;
        self.state.elapsed_ms += frame.len() as f64 * 1000.0 / self.config.sample_rate as f64;
        let now = self.state.elapsed_ms;

        if self.level.due(now) {
            let level = audio_level(mean_energy(frame));
            self.listeners.emit(VadEvent::AudioLevel { at_ms: now, level });
        }

        let features = self.analyze(frame);

        let calibrating = self.state.frame_number <= self.config.bootstrap_frames as u64;
        let decision = self.decide(&features);
        trace!(
            at_ms = now,
            energy = features.energy,
            dominant_hz = features.dominant_hz,
            flatness_db = features.flatness_db,
            speech = decision.is_speech(),
            "frame"
        );

        if !calibrating {
            self.track_segment(decision, now);
        }
        decision
    }

    fn process(&mut self, buffer: &[u8], length: usize) -> Result<()> {
        let input = checked_input(buffer, length)?;
        let frames: Vec<AudioFrame> = self.reassembler.feed(input).collect();
        for frame in &frames {
            self.classify(frame);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.state = SpectralState::default();
        self.reassembler.clear();
        self.level.reset();
    }

    fn events(&mut self) -> &mut Listeners {
        &mut self.listeners
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    fn elapsed_ms(&self) -> f64 {
        self.state.elapsed_ms
    }

    fn speech_begin_time_ms(&self) -> f64 {
        self.state.speech_begin_ms
    }

    fn speech_end_time_ms(&self) -> f64 {
        self.state.speech_end_ms
    }

    fn is_speech_active(&self) -> bool {
        self.state.speech_active
    }
}
