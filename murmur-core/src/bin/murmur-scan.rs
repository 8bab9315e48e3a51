//! Offline scanner: run a detector over a WAV or raw PCM file and print a
//! JSON report of the events it raised.
//!
//! ```text
//! murmur-scan speech.raw --sample-rate 16000 --chunk 3200
//! murmur-scan take.wav --detector spectral --output report.json
//! ```
//!
//! Logs go to stderr (`RUST_LOG` controls verbosity); the report goes to
//! stdout unless `--output` is given.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use murmur_core::{
    EnergyVad, EnergyVadConfig, PcmSource, SpectralVad, SpectralVadConfig, VadEvent,
    VoiceActivityDetector,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetectorKind {
    Energy,
    Spectral,
}

#[derive(Debug)]
struct Args {
    input: PathBuf,
    sample_rate: u32,
    detector: DetectorKind,
    chunk: usize,
    disabled: bool,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    input: String,
    detector: &'static str,
    sample_rate: u32,
    duration_ms: f64,
    processed_ms: f64,
    speech_begin_ms: Option<f64>,
    speech_end_ms: Option<f64>,
    no_speech_reports: usize,
    events: Vec<VadEvent>,
}

const USAGE: &str = "usage: murmur-scan <input.wav|input.raw> [--sample-rate HZ] \
[--detector energy|spectral] [--chunk BYTES] [--disabled] [--config FILE] [--output FILE]";

fn parse_args() -> Result<Args> {
    let mut input: Option<PathBuf> = None;
    let mut sample_rate = 16_000;
    let mut detector = DetectorKind::Energy;
    let mut chunk = 3200;
    let mut disabled = false;
    let mut config = None;
    let mut output = None;

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--sample-rate" => {
                let v = it.next().context("--sample-rate needs a value")?;
                sample_rate = v.parse().with_context(|| format!("bad sample rate {v:?}"))?;
            }
            "--detector" => {
                detector = match it.next().as_deref() {
                    Some("energy") => DetectorKind::Energy,
                    Some("spectral") => DetectorKind::Spectral,
                    other => bail!("unknown detector {other:?}"),
                };
            }
            "--chunk" => {
                let v = it.next().context("--chunk needs a value")?;
                chunk = v.parse().with_context(|| format!("bad chunk size {v:?}"))?;
                if chunk == 0 {
                    bail!("--chunk must be positive");
                }
            }
            "--disabled" => disabled = true,
            "--config" => config = Some(PathBuf::from(it.next().context("--config needs a path")?)),
            "--output" => output = Some(PathBuf::from(it.next().context("--output needs a path")?)),
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other if input.is_none() && !other.starts_with("--") => {
                input = Some(PathBuf::from(other));
            }
            other => bail!("unexpected argument {other:?}\n{USAGE}"),
        }
    }

    Ok(Args {
        input: input.context(USAGE)?,
        sample_rate,
        detector,
        chunk,
        disabled,
        config,
        output,
    })
}

fn build_detector(args: &Args, sample_rate: u32) -> Result<Box<dyn VoiceActivityDetector>> {
    let config_text = match &args.config {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?,
        ),
        None => None,
    };

    let mut vad: Box<dyn VoiceActivityDetector> = match args.detector {
        DetectorKind::Energy => {
            let mut cfg: EnergyVadConfig = match &config_text {
                Some(text) => serde_json::from_str(text).context("parsing energy config")?,
                None => EnergyVadConfig::default(),
            };
            cfg.sample_rate = sample_rate;
            Box::new(EnergyVad::new(cfg)?)
        }
        DetectorKind::Spectral => {
            let mut cfg: SpectralVadConfig = match &config_text {
                Some(text) => serde_json::from_str(text).context("parsing spectral config")?,
                None => SpectralVadConfig::default(),
            };
            cfg.sample_rate = sample_rate;
            Box::new(SpectralVad::new(cfg)?)
        }
    };

    if args.disabled {
        vad.set_enabled(false);
    }
    Ok(vad)
}

fn run() -> Result<()> {
    let args = parse_args()?;

    let source = PcmSource::open(&args.input, args.sample_rate)
        .with_context(|| format!("loading {}", args.input.display()))?;
    let mut vad = build_detector(&args, source.sample_rate)?;

    // A chunk yields at most two events per frame, so draining after every
    // chunk keeps the tap from ever filling up.
    let rx = vad.events().channel(args.chunk + 16);

    let mut events: Vec<VadEvent> = Vec::new();
    for chunk in source.bytes.chunks(args.chunk) {
        vad.process(chunk, chunk.len())?;
        events.extend(rx.try_iter());
    }
    let begun = events
        .iter()
        .any(|e| matches!(e, VadEvent::SpeechBegin { .. }));
    let ended = events.iter().any(|e| matches!(e, VadEvent::SpeechEnd { .. }));

    let report = Report {
        input: args.input.display().to_string(),
        detector: match args.detector {
            DetectorKind::Energy => "energy",
            DetectorKind::Spectral => "spectral",
        },
        sample_rate: source.sample_rate,
        duration_ms: source.duration_ms(),
        processed_ms: vad.elapsed_ms(),
        speech_begin_ms: begun.then(|| vad.speech_begin_time_ms()),
        speech_end_ms: ended.then(|| vad.speech_end_time_ms()),
        no_speech_reports: events
            .iter()
            .filter(|e| matches!(e, VadEvent::SpeechNotDetected { .. }))
            .count(),
        events,
    };

    let json = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("writing report {}", path.display()))?,
        None => println!("{json}"),
    }

    tracing::info!(
        begin = ?report.speech_begin_ms,
        end = ?report.speech_end_ms,
        "scan complete"
    );
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("murmur-scan failed: {e:#}");
        std::process::exit(1);
    }
}
