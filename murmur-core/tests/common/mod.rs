#![allow(dead_code)]

use std::f64::consts::PI;
use std::sync::{Arc, Mutex};

use murmur_core::{VadEvent, VoiceActivityDetector};

pub const SAMPLE_RATE: u32 = 16_000;

/// Layout of the synthetic utterance used across the scenario tests.
pub const LEAD_MS: usize = 1_000;
pub const VOICE_MS: usize = 1_500;
pub const TAIL_MS: usize = 3_000;

fn samples_for(ms: usize) -> usize {
    ms * SAMPLE_RATE as usize / 1000
}

/// Deterministic low-level hiss; high zero-crossing rate, negligible energy.
fn hiss(len: usize, amplitude: f64, seed: u32) -> Vec<i16> {
    let mut x = seed;
    (0..len)
        .map(|_| {
            x = x.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let u = (x >> 8) as f64 / (1u32 << 24) as f64 * 2.0 - 1.0;
            (u * amplitude) as i16
        })
        .collect()
}

/// A 440 Hz voiced tone with a slow tremolo.
fn voice(len: usize) -> Vec<i16> {
    (0..len)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE as f64;
            let envelope = 0.8 + 0.2 * (2.0 * PI * 3.0 * t).sin();
            (9000.0 * envelope * (2.0 * PI * 440.0 * t).sin()) as i16
        })
        .collect()
}

fn to_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Silence (hiss or digital zero), a voiced burst, then silence again.
pub fn utterance(hiss_amplitude: f64) -> Vec<u8> {
    let mut samples = hiss(samples_for(LEAD_MS), hiss_amplitude, 7);
    samples.extend(voice(samples_for(VOICE_MS)));
    samples.extend(hiss(samples_for(TAIL_MS), hiss_amplitude, 11));
    to_bytes(&samples)
}

/// Only low-level hiss.
pub fn silence(ms: usize, hiss_amplitude: f64) -> Vec<u8> {
    to_bytes(&hiss(samples_for(ms), hiss_amplitude, 3))
}

pub fn duration_ms(bytes: &[u8]) -> f64 {
    (bytes.len() / 2) as f64 * 1000.0 / SAMPLE_RATE as f64
}

/// Chunk sizes in `[3000, 3200)`, pseudo-random but repeatable.
pub fn capture_chunks(bytes: &[u8], seed: u32) -> Vec<&[u8]> {
    let mut x = seed;
    let mut out = Vec::new();
    let mut rest = bytes;
    while !rest.is_empty() {
        x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let size = (3000 + (x >> 16) % 200) as usize;
        let (head, tail) = rest.split_at(size.min(rest.len()));
        out.push(head);
        rest = tail;
    }
    out
}

/// Record every event the detector raises.
pub fn record(vad: &mut dyn VoiceActivityDetector) -> Arc<Mutex<Vec<VadEvent>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    vad.events().on_event(move |ev| sink.lock().unwrap().push(*ev));
    log
}

pub fn feed<'a>(vad: &mut dyn VoiceActivityDetector, chunks: impl IntoIterator<Item = &'a [u8]>) {
    for chunk in chunks {
        vad.process(chunk, chunk.len()).expect("process chunk");
    }
}

pub fn count(events: &[VadEvent], pred: fn(&VadEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

pub fn is_begin(e: &VadEvent) -> bool {
    matches!(e, VadEvent::SpeechBegin { .. })
}

pub fn is_end(e: &VadEvent) -> bool {
    matches!(e, VadEvent::SpeechEnd { .. })
}

pub fn is_no_speech(e: &VadEvent) -> bool {
    matches!(e, VadEvent::SpeechNotDetected { .. })
}
