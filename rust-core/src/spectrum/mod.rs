//! Short-time spectral analysis and synthesis

pub mod fft;
pub mod stft;
pub mod windowing;

pub use fft::FftEngine;
pub use stft::{SpectralTransform, Spectrogram, StftConfig};
pub use windowing::WindowType;
