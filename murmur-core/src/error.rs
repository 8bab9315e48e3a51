use thiserror::Error;

/// All errors produced by murmur-core.
#[derive(Debug, Error)]
pub enum MurmurError {
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    #[error("invalid detector configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid FFT order: 2^{0} is not a supported transform size")]
    InvalidFftOrder(u32),

    #[error("FFT length mismatch: expected {expected}, got re={re} im={im}")]
    FftLengthMismatch { expected: usize, re: usize, im: usize },

    #[error("length {length} exceeds buffer of {available} bytes")]
    InvalidLength { length: usize, available: usize },

    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MurmurError>;
