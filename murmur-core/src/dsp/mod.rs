//! Per-frame signal features shared by the detectors.

pub mod fft;

use std::f64::consts::PI;

use crate::buffering::frame::AudioFrame;

pub use fft::FftContext;

/// Energy and zero-crossing count of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameFeatures {
    /// Mean squared amplitude on the normalized [-1, 1] scale.
    pub energy: f64,
    pub zero_crossings: usize,
}

impl FrameFeatures {
    pub fn analyze(frame: &AudioFrame) -> Self {
        Self {
            energy: mean_energy(frame),
            zero_crossings: zero_crossings(frame.samples()),
        }
    }
}

/// Mean of squared normalized amplitudes. Empty frames have zero energy.
pub fn mean_energy(frame: &AudioFrame) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = frame.normalized().map(|s| s * s).sum();
    sum_sq / frame.len() as f64
}

/// Count sign changes between consecutive samples.
///
/// Positive samples have sign `+1`, everything else (zero included) `-1`.
/// The first sample never counts, and an all-zero signal has no crossings.
pub fn zero_crossings(samples: &[i16]) -> usize {
    let mut last_sign = 0i8;
    let mut count = 0;
    for &s in samples {
        let sign = if s > 0 { 1 } else { -1 };
        if last_sign != 0 && sign != last_sign {
            count += 1;
        }
        last_sign = sign;
    }
    count
}

/// Symmetric Hamming window of length `n`.
pub fn hamming_window(n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![1.0; n];
    }
    let denom = (n - 1) as f64;
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / denom).cos())
        .collect()
}

/// Map frame energy to a display level in [0, 1].
pub fn audio_level(energy: f64) -> f32 {
    (energy.max(0.0).sqrt() * 3.0).min(1.0) as f32
}

/// Rate limiter for audio-level notifications on the virtual clock.
#[derive(Debug, Clone)]
pub struct LevelMeter {
    interval_ms: f64,
    last_ms: f64,
}

impl LevelMeter {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            last_ms: 0.0,
        }
    }

    /// Returns true when at least one interval has passed since the last report.
    pub fn due(&mut self, now_ms: f64) -> bool {
        if now_ms - self.last_ms >= self.interval_ms {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.last_ms = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_signal_has_no_crossings() {
        assert_eq!(zero_crossings(&[0; 160]), 0);
    }

    #[test]
    fn alternating_signal_crosses_every_sample() {
        let samples: Vec<i16> = (0..10).map(|i| if i % 2 == 0 { 100 } else { -100 }).collect();
        assert_eq!(zero_crossings(&samples), 9);
    }

    #[test]
    fn zero_counts_as_negative() {
        // 0 -> 5 is a crossing, 5 -> 0 is another, 0 -> -5 is not.
        assert_eq!(zero_crossings(&[0, 5, 0, -5]), 2);
    }

    #[test]
    fn square_wave_energy() {
        let frame = AudioFrame::new(vec![i16::MAX, -i16::MAX, i16::MAX, -i16::MAX], 16_000);
        assert_relative_eq!(mean_energy(&frame), 1.0);
    }

    #[test]
    fn empty_frame_energy_is_zero() {
        assert_eq!(mean_energy(&AudioFrame::new(vec![], 16_000)), 0.0);
    }

    #[test]
    fn hamming_endpoints_and_peak() {
        let w = hamming_window(161);
        assert_relative_eq!(w[0], 0.08, epsilon = 1e-12);
        assert_relative_eq!(w[80], 1.0, epsilon = 1e-12);
        assert_relative_eq!(w[160], 0.08, epsilon = 1e-12);
    }

    #[test]
    fn level_is_clamped() {
        assert_eq!(audio_level(0.5), 1.0);
        assert_relative_eq!(audio_level(0.0025), 0.15, epsilon = 1e-6);
        assert_eq!(audio_level(0.0), 0.0);
    }

    #[test]
    fn level_meter_fires_once_per_interval() {
        let mut meter = LevelMeter::new(100.0);
        let fired: Vec<bool> = (1..=25).map(|i| meter.due(i as f64 * 10.0)).collect();
        assert_eq!(fired.iter().filter(|f| **f).count(), 2);
        assert!(fired[9] && fired[19]);
    }
}
