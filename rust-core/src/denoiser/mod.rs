//! Vocoder bias estimation and removal

pub mod bias;
pub mod calibration;
pub mod vocoder;

pub use bias::{Denoiser, DenoiserConfig, DEFAULT_STRENGTH};
pub use calibration::{calibration_input, BiasMode};
pub use vocoder::Vocoder;
