//! Energy + zero-crossing VAD with an adaptive silence timeout.
//!
//! ## Algorithm
//!
//! 1. Reassemble input bytes into 10 ms frames (320 bytes at 16 kHz).
//! 2. Per frame, compute mean squared amplitude and the zero-crossing count,
//!    then advance the virtual clock by the frame duration.
//! 3. During the first `start_noise_interval_ms` the frame only feeds the
//!    noise floor, which halves towards each new frame energy.
//! 4. Afterwards a frame is *active* when its zero-crossing count lies in
//!    `[min_cz, max_cz]` and its energy is strictly above
//!    `max(noise_floor, min_noise_energy) * energy_factor`.
//! 5. `min_speech_sequence_count` active frames, each within
//!    `sequence_length_ms` of the previous one, confirm speech and fire
//!    `SpeechBegin`. Every confirmed frame shrinks the silence timeout by a
//!    quarter of the `[min, max]` gap, floored at the minimum.
//! 6. An inactive frame more than `silence_timeout_ms` after the last
//!    confirmed frame closes the segment (`SpeechEnd`) or, if speech never
//!    started, fires `SpeechNotDetected` on every such frame.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use super::events::{Listeners, VadEvent};
use super::{checked_input, VadDecision, VoiceActivityDetector};
use crate::buffering::frame::AudioFrame;
use crate::buffering::FrameReassembler;
use crate::dsp::{audio_level, FrameFeatures, LevelMeter};
use crate::error::{MurmurError, Result};

/// Tuning for [`EnergyVad`]. Defaults reproduce the reference detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnergyVadConfig {
    /// Input sample rate (Hz). Default: 16000.
    pub sample_rate: u32,
    /// Deliver `SpeechEnd` / `SpeechNotDetected`. `SpeechBegin` always fires.
    pub enabled: bool,
    /// Analysis frame length. Default: 10 ms.
    pub frame_duration_ms: u32,
    /// Virtual time spent calibrating the noise floor. Default: 150 ms.
    pub start_noise_interval_ms: f64,
    /// Energy must exceed the noise floor by this factor. Default: 3.1.
    pub energy_factor: f64,
    /// Lower bound applied to the tracked noise floor. Default: 0.001818.
    pub min_noise_energy: f64,
    /// Lower zero-crossing bound per 10 ms of frame. Default: 5.
    pub min_zero_crossings_per_10ms: u32,
    /// Upper zero-crossing bound as a multiple of the lower one. Default: 3.
    pub max_zero_crossings_factor: u32,
    /// Maximum gap between active frames of one sequence. Default: 30 ms.
    pub sequence_length_ms: f64,
    /// Active frames needed to confirm speech. Default: 3.
    pub min_speech_sequence_count: u32,
    /// Floor of the adaptive silence timeout. Default: 800 ms.
    pub min_silence_length_ms: f64,
    /// Initial (and ceiling) silence timeout. Default: 3500 ms.
    pub max_silence_length_ms: f64,
    /// Spacing of audio-level notifications. Default: 100 ms.
    pub audio_level_interval_ms: f64,
}

impl Default for EnergyVadConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            enabled: true,
            frame_duration_ms: 10,
            start_noise_interval_ms: 150.0,
            energy_factor: 3.1,
            min_noise_energy: 0.001818,
            min_zero_crossings_per_10ms: 5,
            max_zero_crossings_factor: 3,
            sequence_length_ms: 30.0,
            min_speech_sequence_count: 3,
            min_silence_length_ms: 800.0,
            max_silence_length_ms: 3500.0,
            audio_level_interval_ms: 100.0,
        }
    }
}

impl EnergyVadConfig {
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    /// Samples per analysis frame.
    pub fn frame_samples(&self) -> usize {
        (self.sample_rate as u64 * self.frame_duration_ms as u64 / 1000) as usize
    }

    /// Bytes per analysis frame (16-bit samples).
    pub fn frame_bytes(&self) -> usize {
        self.frame_samples() * 2
    }

    /// Inclusive zero-crossing band `(min_cz, max_cz)` for one frame.
    pub fn zero_crossing_band(&self) -> (usize, usize) {
        let min_cz = self.min_zero_crossings_per_10ms as u64 * self.frame_duration_ms as u64 / 10;
        let max_cz = min_cz.saturating_mul(self.max_zero_crossings_factor as u64);
        (
            usize::try_from(min_cz).unwrap_or(usize::MAX),
            usize::try_from(max_cz).unwrap_or(usize::MAX),
        )
    }

    /// Check every field; detectors refuse to start on a bad config.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(MurmurError::InvalidSampleRate(self.sample_rate));
        }
        if self.frame_samples() == 0 {
            return Err(MurmurError::InvalidConfig(format!(
                "{} ms frames hold no samples at {} Hz",
                self.frame_duration_ms, self.sample_rate
            )));
        }
        let (min_cz, _) = self.zero_crossing_band();
        if min_cz >= self.frame_samples() {
            return Err(MurmurError::InvalidConfig(format!(
                "{min_cz} zero crossings cannot occur in a {}-sample frame",
                self.frame_samples()
            )));
        }
        if !(self.energy_factor.is_finite() && self.energy_factor > 0.0) {
            return Err(MurmurError::InvalidConfig(format!(
                "energy_factor must be positive, got {}",
                self.energy_factor
            )));
        }
        if !(self.min_noise_energy.is_finite() && self.min_noise_energy >= 0.0) {
            return Err(MurmurError::InvalidConfig(format!(
                "min_noise_energy must be non-negative, got {}",
                self.min_noise_energy
            )));
        }
        if self.min_speech_sequence_count == 0 {
            return Err(MurmurError::InvalidConfig(
                "min_speech_sequence_count must be at least 1".into(),
            ));
        }
        if !(0.0..=self.max_silence_length_ms).contains(&self.min_silence_length_ms) {
            return Err(MurmurError::InvalidConfig(format!(
                "silence bounds must satisfy 0 <= min <= max, got [{}, {}]",
                self.min_silence_length_ms, self.max_silence_length_ms
            )));
        }
        if self.start_noise_interval_ms < 0.0
            || self.sequence_length_ms < 0.0
            || self.audio_level_interval_ms < 0.0
        {
            return Err(MurmurError::InvalidConfig(
                "time intervals must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// Mutable per-instance detector state. Readable for telemetry.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorState {
    /// Virtual clock; advanced by every processed frame.
    pub elapsed_ms: f64,
    /// Noise floor learned over the calibration window. Each frame moves it
    /// halfway towards that frame's energy, starting from zero.
    pub average_noise_energy: f64,
    /// Time of the latest active frame, `-1` before any.
    pub last_active_ms: f64,
    /// Time of the latest confirmed speech frame, `0` before any.
    pub last_sequence_ms: f64,
    pub sequence_counter: u32,
    /// Adaptive hysteresis, always within `[min, max]` silence length.
    pub silence_timeout_ms: f64,
    pub speech_active: bool,
    pub speech_begin_ms: f64,
    pub speech_end_ms: f64,
    /// `SpeechNotDetected` notifications raised since the last reset.
    pub no_speech_reports: u64,
}

impl DetectorState {
    fn initial(config: &EnergyVadConfig) -> Self {
        Self {
            elapsed_ms: 0.0,
            average_noise_energy: 0.0,
            last_active_ms: -1.0,
            last_sequence_ms: 0.0,
            sequence_counter: 0,
            silence_timeout_ms: config.max_silence_length_ms,
            speech_active: false,
            speech_begin_ms: 0.0,
            speech_end_ms: 0.0,
            no_speech_reports: 0,
        }
    }
}

/// Streaming energy / zero-crossing voice activity detector.
#[derive(Debug)]
pub struct EnergyVad {
    config: EnergyVadConfig,
    state: DetectorState,
    reassembler: FrameReassembler,
    level: LevelMeter,
    listeners: Listeners,
}

impl EnergyVad {
    /// Build a detector from `config`.
    ///
    /// # Errors
    /// `MurmurError::InvalidSampleRate` / `InvalidConfig` from
    /// [`EnergyVadConfig::validate`].
    pub fn new(config: EnergyVadConfig) -> Result<Self> {
        config.validate()?;

        let (min_cz, max_cz) = config.zero_crossing_band();
        info!(
            sample_rate = config.sample_rate,
            frame_bytes = config.frame_bytes(),
            min_cz,
            max_cz,
            "energy VAD ready"
        );

        Ok(Self {
            state: DetectorState::initial(&config),
            reassembler: FrameReassembler::new(config.frame_bytes(), config.sample_rate),
            level: LevelMeter::new(config.audio_level_interval_ms),
            listeners: Listeners::new(),
            config,
        })
    }

    /// Detector with default tuning at `sample_rate`.
    pub fn with_sample_rate(sample_rate: u32) -> Result<Self> {
        Self::new(EnergyVadConfig::with_sample_rate(sample_rate))
    }

    pub fn config(&self) -> &EnergyVadConfig {
        &self.config
    }

    pub fn state(&self) -> &DetectorState {
        &self.state
    }

    /// Bytes received but not yet part of a complete frame.
    pub fn pending_bytes(&self) -> usize {
        self.reassembler.pending()
    }

    fn energy_threshold(&self) -> f64 {
        self.state.average_noise_energy.max(self.config.min_noise_energy) * self.config.energy_factor
    }

    /// Noise calibration or activity test, depending on the virtual clock.
    fn frame_is_active(&mut self, features: &FrameFeatures) -> bool {
        let state = &mut self.state;
        if state.elapsed_ms < self.config.start_noise_interval_ms {
            state.average_noise_energy = (state.average_noise_energy + features.energy) / 2.0;
            return false;
        }

        let (min_cz, max_cz) = self.config.zero_crossing_band();
        (min_cz..=max_cz).contains(&features.zero_crossings)
            && features.energy > self.energy_threshold()
    }

    fn on_active(&mut self, now: f64) {
        let cfg = &self.config;
        let state = &mut self.state;

        if state.last_active_ms >= 0.0 && now - state.last_active_ms < cfg.sequence_length_ms {
            state.sequence_counter += 1;
        } else {
            state.sequence_counter = 1;
        }
        state.last_active_ms = now;

        if state.sequence_counter < cfg.min_speech_sequence_count {
            return;
        }

        state.last_sequence_ms = now;
        let step = (cfg.max_silence_length_ms - cfg.min_silence_length_ms) / 4.0;
        state.silence_timeout_ms = (state.silence_timeout_ms - step).max(cfg.min_silence_length_ms);

        if !state.speech_active {
            state.speech_active = true;
            state.speech_begin_ms = now;
            debug!(at_ms = now, "speech begin");
            self.listeners.emit(VadEvent::SpeechBegin { at_ms: now });
        }
    }

    fn on_inactive(&mut self, now: f64) {
        let state = &mut self.state;
        if now - state.last_sequence_ms <= state.silence_timeout_ms {
            return;
        }

        if state.last_sequence_ms > 0.0 {
            if state.speech_active {
                state.speech_active = false;
                state.speech_end_ms = now;
                debug!(
                    at_ms = now,
                    duration_ms = now - state.speech_begin_ms,
                    "speech end"
                );
                if self.config.enabled {
                    self.listeners.emit(VadEvent::SpeechEnd { at_ms: now });
                }
            }
        } else if self.config.enabled {
            if state.no_speech_reports == 0 {
                debug!(at_ms = now, "no speech within silence timeout");
            }
            state.no_speech_reports += 1;
            self.listeners.emit(VadEvent::SpeechNotDetected { at_ms: now });
        }
    }
}

impl VoiceActivityDetector for EnergyVad {
    fn classify(&mut self, frame: &AudioFrame) -> VadDecision {
        let features = FrameFeatures::analyze(frame);

        self.state.elapsed_ms += frame.len() as f64 * 1000.0 / self.config.sample_rate as f64;
        let now = self.state.elapsed_ms;

        if self.level.due(now) {
            let level = audio_level(features.energy);
            self.listeners.emit(VadEvent::AudioLevel { at_ms: now, level });
        }

        let active = self.frame_is_active(&features);
        trace!(
            at_ms = now,
            energy = features.energy,
            zero_crossings = features.zero_crossings,
            active,
            "frame"
        );

        if active {
            self.on_active(now);
            VadDecision::Speech
        } else {
            self.on_inactive(now);
            VadDecision::Silence
        }
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
        self.state = DetectorState::initial(&self.config);
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;
    use std::sync::{Arc, Mutex};

    const RATE: u32 = 16_000;

    fn silent_frame() -> AudioFrame {
        AudioFrame::new(vec![0; 160], RATE)
    }

    /// 500 Hz tone: ~10 zero crossings per 10 ms frame.
    fn tone_frame(amplitude: f64) -> AudioFrame {
        let samples = (0..160)
            .map(|i| (amplitude * (2.0 * PI * 500.0 * i as f64 / RATE as f64 + 0.1).sin()) as i16)
            .collect();
        AudioFrame::new(samples, RATE)
    }

    fn recorder(vad: &mut EnergyVad) -> Arc<Mutex<Vec<VadEvent>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        vad.events().on_event(move |ev| {
            if !matches!(ev, VadEvent::AudioLevel { .. }) {
                sink.lock().unwrap().push(*ev);
            }
        });
        log
    }

    #[test]
    fn default_frame_geometry() {
        let cfg = EnergyVadConfig::default();
        assert_eq!(cfg.frame_samples(), 160);
        assert_eq!(cfg.frame_bytes(), 320);
        assert_eq!(cfg.zero_crossing_band(), (5, 15));
    }

    #[test]
    fn zero_sample_rate_fails_fast() {
        assert!(matches!(
            EnergyVad::with_sample_rate(0),
            Err(MurmurError::InvalidSampleRate(0))
        ));
    }

    #[test]
    fn sub_frame_sample_rate_is_rejected() {
        assert!(matches!(
            EnergyVad::with_sample_rate(50),
            Err(MurmurError::InvalidConfig(_))
        ));
    }

    #[test]
    fn inverted_silence_bounds_are_rejected() {
        let cfg = EnergyVadConfig {
            min_silence_length_ms: 4000.0,
            ..EnergyVadConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(MurmurError::InvalidConfig(_))));
    }

    #[test]
    fn bootstrap_frames_are_never_active() {
        let mut vad = EnergyVad::with_sample_rate(RATE).unwrap();
        for _ in 0..14 {
            assert_eq!(vad.classify(&tone_frame(10_000.0)), VadDecision::Silence);
        }
        assert!(vad.state().average_noise_energy > 0.0);
    }

    #[test]
    fn noise_floor_halves_towards_each_frame() {
        let mut vad = EnergyVad::with_sample_rate(RATE).unwrap();
        let quiet = tone_frame(1000.0);
        let loud = tone_frame(2000.0);
        let e_quiet = FrameFeatures::analyze(&quiet).energy;
        let e_loud = FrameFeatures::analyze(&loud).energy;

        vad.classify(&quiet);
        assert_relative_eq!(vad.state().average_noise_energy, e_quiet / 2.0, max_relative = 1e-12);
        vad.classify(&loud);
        assert_relative_eq!(
            vad.state().average_noise_energy,
            (e_quiet / 2.0 + e_loud) / 2.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn late_quiet_frame_pulls_noise_floor_down() {
        let mut vad = EnergyVad::with_sample_rate(RATE).unwrap();
        let loud = tone_frame(3000.0);
        let quiet = tone_frame(300.0);
        let e_loud = FrameFeatures::analyze(&loud).energy;
        let e_quiet = FrameFeatures::analyze(&quiet).energy;

        for _ in 0..13 {
            vad.classify(&loud);
        }
        vad.classify(&quiet);

        // Thirteen halvings leave the loud frames at 1 - 2^-13 of the floor.
        let loud_share = e_loud * (1.0 - 0.5f64.powi(13));
        assert_relative_eq!(
            vad.state().average_noise_energy,
            (loud_share + e_quiet) / 2.0,
            max_relative = 1e-9
        );
        assert!(vad.state().average_noise_energy < 0.6 * e_loud);
    }

    #[test]
    fn oversized_zero_crossing_config_is_rejected() {
        let cfg = EnergyVadConfig {
            frame_duration_ms: u32::MAX,
            min_zero_crossings_per_10ms: u32::MAX,
            ..EnergyVadConfig::default()
        };
        let (min_cz, max_cz) = cfg.zero_crossing_band();
        assert!(min_cz > 0 && max_cz >= min_cz);

        let cfg = EnergyVadConfig {
            min_zero_crossings_per_10ms: 200,
            ..EnergyVadConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(MurmurError::InvalidConfig(_))));
    }

    #[test]
    fn energy_exactly_at_threshold_is_inactive() {
        let mut vad = EnergyVad::with_sample_rate(RATE).unwrap();
        vad.state.elapsed_ms = 200.0;
        vad.state.average_noise_energy = 0.01;

        let threshold = vad.energy_threshold();
        assert_relative_eq!(threshold, 0.031, max_relative = 1e-12);

        let at = FrameFeatures {
            energy: threshold,
            zero_crossings: 10,
        };
        let above = FrameFeatures {
            energy: f64::from_bits(threshold.to_bits() + 1),
            zero_crossings: 10,
        };
        assert!(!vad.frame_is_active(&at));
        assert!(vad.frame_is_active(&above));
    }

    #[test]
    fn tiny_noise_floor_is_clamped() {
        let mut vad = EnergyVad::with_sample_rate(RATE).unwrap();
        vad.state.elapsed_ms = 200.0;
        vad.state.average_noise_energy = 1e-9;

        let just_below = FrameFeatures {
            energy: 0.001818 * 3.1 * 0.99,
            zero_crossings: 10,
        };
        assert!(!vad.frame_is_active(&just_below));
    }

    #[test]
    fn zero_crossings_outside_band_are_inactive() {
        let mut vad = EnergyVad::with_sample_rate(RATE).unwrap();
        vad.state.elapsed_ms = 200.0;

        for zc in [0, 4, 16, 80] {
            let f = FrameFeatures {
                energy: 0.5,
                zero_crossings: zc,
            };
            assert!(!vad.frame_is_active(&f), "zc={zc}");
        }
        for zc in [5, 15] {
            let f = FrameFeatures {
                energy: 0.5,
                zero_crossings: zc,
            };
            assert!(vad.frame_is_active(&f), "zc={zc}");
        }
    }

    #[test]
    fn third_consecutive_active_frame_begins_speech() {
        let mut vad = EnergyVad::with_sample_rate(RATE).unwrap();
        let log = recorder(&mut vad);

        for _ in 0..20 {
            vad.classify(&silent_frame());
        }
        vad.classify(&tone_frame(8000.0));
        vad.classify(&tone_frame(8000.0));
        assert!(!vad.is_speech_active());
        vad.classify(&tone_frame(8000.0));

        assert!(vad.is_speech_active());
        assert_relative_eq!(vad.speech_begin_time_ms(), 230.0);
        assert_eq!(*log.lock().unwrap(), vec![VadEvent::SpeechBegin { at_ms: 230.0 }]);
    }

    #[test]
    fn silence_timeout_shrinks_to_minimum() {
        let mut vad = EnergyVad::with_sample_rate(RATE).unwrap();
        for _ in 0..20 {
            vad.classify(&silent_frame());
        }
        let mut timeouts = Vec::new();
        for _ in 0..8 {
            vad.classify(&tone_frame(8000.0));
            timeouts.push(vad.state().silence_timeout_ms);
        }
        assert_eq!(
            timeouts,
            vec![3500.0, 3500.0, 2825.0, 2150.0, 1475.0, 800.0, 800.0, 800.0]
        );
    }

    #[test]
    fn speech_end_after_min_timeout() {
        let mut vad = EnergyVad::with_sample_rate(RATE).unwrap();
        let log = recorder(&mut vad);

        for _ in 0..20 {
            vad.classify(&silent_frame());
        }
        for _ in 0..50 {
            vad.classify(&tone_frame(8000.0));
        }
        // Last confirmed frame at 700 ms; timeout has bottomed out at 800 ms.
        for _ in 0..100 {
            vad.classify(&silent_frame());
        }

        assert!(!vad.is_speech_active());
        assert_relative_eq!(vad.speech_end_time_ms(), 1510.0);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                VadEvent::SpeechBegin { at_ms: 230.0 },
                VadEvent::SpeechEnd { at_ms: 1510.0 },
            ]
        );
    }

    #[test]
    fn no_speech_fires_on_every_frame_past_timeout() {
        let mut vad = EnergyVad::with_sample_rate(RATE).unwrap();
        let log = recorder(&mut vad);

        // 3500 ms timeout: frames at 3510, 3520, 3530 qualify.
        for _ in 0..353 {
            vad.classify(&silent_frame());
        }

        let events = log.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert!(events
            .iter()
            .all(|e| matches!(e, VadEvent::SpeechNotDetected { .. })));
        assert_eq!(vad.state().no_speech_reports, 3);
    }

    #[test]
    fn disabled_detector_still_closes_segment_silently() {
        let mut vad = EnergyVad::with_sample_rate(RATE).unwrap();
        vad.set_enabled(false);
        let log = recorder(&mut vad);

        for _ in 0..20 {
            vad.classify(&silent_frame());
        }
        for _ in 0..10 {
            vad.classify(&tone_frame(8000.0));
        }
        for _ in 0..400 {
            vad.classify(&silent_frame());
        }

        assert!(!vad.is_speech_active());
        assert!(vad.speech_end_time_ms() > 0.0);
        assert_eq!(*log.lock().unwrap(), vec![VadEvent::SpeechBegin { at_ms: 230.0 }]);
    }

    #[test]
    fn audio_level_every_100ms() {
        let mut vad = EnergyVad::with_sample_rate(RATE).unwrap();
        let levels = Arc::new(Mutex::new(Vec::new()));
        {
            let levels = Arc::clone(&levels);
            vad.events().on_audio_level(move |l| levels.lock().unwrap().push(l));
        }

        let frame = tone_frame(3276.7);
        let expected = audio_level(FrameFeatures::analyze(&frame).energy);
        for _ in 0..100 {
            vad.classify(&frame);
        }

        let levels = levels.lock().unwrap();
        assert_eq!(levels.len(), 10);
        assert!(levels.iter().all(|l| *l == expected));
        assert!(expected > 0.0 && expected < 1.0);
    }

    #[test]
    fn reset_restores_initial_state_but_keeps_listeners() {
        let mut vad = EnergyVad::with_sample_rate(RATE).unwrap();
        let log = recorder(&mut vad);
        let pristine = vad.state().clone();

        for _ in 0..30 {
            vad.classify(&tone_frame(8000.0));
        }
        vad.process(&[1, 2, 3], 3).unwrap();
        assert_ne!(vad.state(), &pristine);
        assert_eq!(vad.pending_bytes(), 3);

        vad.reset();
        assert_eq!(vad.state(), &pristine);
        assert_eq!(vad.pending_bytes(), 0);
        assert_eq!(vad.events().len(), 1);
        drop(log);
    }

    #[test]
    fn process_rejects_length_past_buffer() {
        let mut vad = EnergyVad::with_sample_rate(RATE).unwrap();
        assert!(matches!(
            vad.process(&[0; 10], 11),
            Err(MurmurError::InvalidLength { .. })
        ));
        assert_eq!(vad.elapsed_ms(), 0.0);
    }

    #[test]
    fn process_honours_length_prefix() {
        let mut vad = EnergyVad::with_sample_rate(RATE).unwrap();
        vad.process(&[0; 700], 640).unwrap();
        assert_relative_eq!(vad.elapsed_ms(), 20.0);
        assert_eq!(vad.pending_bytes(), 0);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: EnergyVadConfig =
            serde_json::from_str(r#"{"sampleRate": 8000, "energyFactor": 2.5}"#)
                .expect("parse config");
        assert_eq!(cfg.sample_rate, 8000);
        assert_eq!(cfg.energy_factor, 2.5);
        assert_eq!(cfg.min_speech_sequence_count, 3);
        assert_eq!(cfg.frame_samples(), 80);
    }
}
