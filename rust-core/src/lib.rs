//! Vocoder Denoise - bias removal for neural vocoder output
//!
//! Measures a vocoder's background noise signature once and subtracts it from
//! the magnitude spectrogram of generated audio.

// Suppress PyO3 non-local impl warnings (harmless macro-generated code)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

pub mod backend;
pub mod denoiser;
pub mod error;
pub mod spectrum;
#[cfg(feature = "python")]
pub mod python_bindings;

pub use backend::Backend;
pub use denoiser::{BiasMode, Denoiser, DenoiserConfig, Vocoder};
pub use error::{DenoiserError, Result};
pub use spectrum::{SpectralTransform, Spectrogram, StftConfig, WindowType};
