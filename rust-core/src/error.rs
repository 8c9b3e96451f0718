//! Error types shared by the spectral transform and the denoiser

use crate::backend::Backend;
use thiserror::Error;

/// Boxed error returned by an external generative model
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum DenoiserError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Mode {0} is not supported (expected \"zeros\" or \"normal\")")]
    UnsupportedMode(String),

    #[error("Shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Input waveform is empty")]
    EmptyInput,

    #[error("Denoising strength must be finite and non-negative, got {0}")]
    InvalidStrength(f64),

    #[error("Backend mismatch: denoiser runs on {expected:?}, model runs on {actual:?}")]
    BackendMismatch { expected: Backend, actual: Backend },

    #[error("Generative model failed: {0}")]
    Model(#[source] BoxError),

    #[error("FFT processing failed: {0}")]
    Fft(#[from] realfft::FftError),
}

pub type Result<T> = std::result::Result<T, DenoiserError>;
