//! Short-time spectral transform
//!
//! Forward analysis reflect-pads the waveform by `filter_length/2` on each side,
//! slices it into windowed frames every `hop_length` samples and keeps the
//! magnitude and phase of each frame's half-spectrum. Synthesis rebuilds each
//! frame from magnitude and phase, windows it again, overlap-adds the frames
//! and divides by the summed squared window before cropping the padding.

use log::{debug, trace};
use ndarray::{Array2, Array3, ArrayView2, Axis};
use num_complex::Complex;
use std::f64::consts::PI;

use super::fft::FftEngine;
use super::windowing::{
    analysis_window, generate_window, min_overlap, pad_center, window_sumsquare, WindowType,
};
use crate::backend::Backend;
use crate::error::{DenoiserError, Result};

/// Spectral transform configuration
#[derive(Debug, Clone, PartialEq)]
pub struct StftConfig {
    /// Samples per analysis frame (FFT size)
    pub filter_length: usize,

    /// Stride between consecutive frames
    pub hop_length: usize,

    /// Length of the tapering window, zero-padded to `filter_length`
    pub win_length: usize,

    /// Tapering function
    pub window_type: WindowType,

    /// Placement of the buffers owned by the transform
    pub backend: Backend,
}

impl Default for StftConfig {
    fn default() -> Self {
        Self {
            filter_length: 1024,
            hop_length: 256,
            win_length: 1024,
            window_type: WindowType::Hann,
            backend: Backend::Cpu,
        }
    }
}

impl StftConfig {
    pub fn new(filter_length: usize, hop_length: usize, win_length: usize) -> Self {
        Self {
            filter_length,
            hop_length,
            win_length,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.filter_length == 0 {
            return Err(DenoiserError::Configuration(
                "filter_length must be positive".into(),
            ));
        }
        if self.hop_length == 0 {
            return Err(DenoiserError::Configuration(
                "hop_length must be positive".into(),
            ));
        }
        if self.win_length == 0 || self.win_length > self.filter_length {
            return Err(DenoiserError::Configuration(format!(
                "win_length must be in 1..={} (filter_length), got {}",
                self.filter_length, self.win_length
            )));
        }

        // Every sample position must be covered by a nonzero window tap
        let window = pad_center(
            &generate_window(self.window_type, self.win_length),
            self.filter_length,
        );
        if min_overlap(&window, self.hop_length) <= f64::MIN_POSITIVE {
            return Err(DenoiserError::Configuration(format!(
                "{:?} window of {} samples leaves gaps at hop_length {}",
                self.window_type, self.win_length, self.hop_length
            )));
        }
        Ok(())
    }
}

/// Magnitude/phase spectrogram of a batch of waveforms
///
/// Both arrays are laid out as `[batch, bins, frames]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    magnitude: Array3<f64>,
    phase: Array3<f64>,
    signal_len: usize,
}

impl Spectrogram {
    /// Assemble a spectrogram from its parts
    ///
    /// `signal_len` is the pre-padding length the inverse transform will
    /// return.
    pub fn from_parts(
        magnitude: Array3<f64>,
        phase: Array3<f64>,
        signal_len: usize,
    ) -> Result<Self> {
        if magnitude.shape() != phase.shape() {
            return Err(DenoiserError::ShapeMismatch {
                what: "magnitude/phase",
                expected: magnitude.shape().to_vec(),
                actual: phase.shape().to_vec(),
            });
        }
        if magnitude.is_empty() {
            return Err(DenoiserError::EmptyInput);
        }

        Ok(Self {
            magnitude,
            phase,
            signal_len,
        })
    }

    pub fn magnitude(&self) -> &Array3<f64> {
        &self.magnitude
    }

    /// Mutable magnitudes for spectral-domain editing
    pub fn magnitude_mut(&mut self) -> &mut Array3<f64> {
        &mut self.magnitude
    }

    pub fn phase(&self) -> &Array3<f64> {
        &self.phase
    }

    pub fn batch_size(&self) -> usize {
        self.magnitude.len_of(Axis(0))
    }

    pub fn num_bins(&self) -> usize {
        self.magnitude.len_of(Axis(1))
    }

    pub fn num_frames(&self) -> usize {
        self.magnitude.len_of(Axis(2))
    }

    pub fn signal_len(&self) -> usize {
        self.signal_len
    }

    pub fn into_parts(self) -> (Array3<f64>, Array3<f64>) {
        (self.magnitude, self.phase)
    }
}

/// Windowed analysis/synthesis pair with near-perfect reconstruction
pub struct SpectralTransform {
    config: StftConfig,
    fft: FftEngine,
    window: Vec<f64>,
}

impl SpectralTransform {
    /// Create a transform, precomputing the FFT plans and analysis window
    pub fn new(config: StftConfig) -> Result<Self> {
        config.validate()?;

        let fft = FftEngine::new(config.filter_length);
        let window = analysis_window(
            config.window_type,
            config.win_length,
            config.filter_length,
            config.hop_length,
        );

        debug!(
            "stft: filter_length={} hop_length={} win_length={} window={:?} backend={:?}",
            config.filter_length,
            config.hop_length,
            config.win_length,
            config.window_type,
            config.backend
        );

        Ok(Self {
            config,
            fft,
            window,
        })
    }

    /// Analyse a batch of waveforms laid out as `[batch, samples]`
    pub fn transform(&self, waveform: ArrayView2<'_, f64>) -> Result<Spectrogram> {
        let (batch, signal_len) = waveform.dim();
        if batch == 0 || signal_len == 0 {
            return Err(DenoiserError::EmptyInput);
        }

        let n_fft = self.config.filter_length;
        let hop = self.config.hop_length;
        let n_frames = self.num_frames(signal_len);
        let n_bins = self.num_bins();
        trace!(
            "stft transform: batch={} samples={} frames={}",
            batch,
            signal_len,
            n_frames
        );

        let mut magnitude = Array3::<f64>::zeros((batch, n_bins, n_frames));
        let mut phase = Array3::<f64>::zeros((batch, n_bins, n_frames));
        let mut frame = vec![0.0; n_fft];

        for (b, signal) in waveform.outer_iter().enumerate() {
            let padded = reflect_pad(&signal.to_vec(), n_fft / 2);

            for t in 0..n_frames {
                let start = t * hop;
                for ((f, &s), &w) in frame
                    .iter_mut()
                    .zip(&padded[start..start + n_fft])
                    .zip(&self.window)
                {
                    *f = s * w;
                }

                let spectrum = self.fft.forward(&frame)?;
                for (k, bin) in spectrum.iter().enumerate() {
                    magnitude[[b, k, t]] = bin.norm().max(0.0);
                    phase[[b, k, t]] = wrap_phase(bin.im.atan2(bin.re));
                }
            }
        }

        Spectrogram::from_parts(magnitude, phase, signal_len)
    }

    /// Resynthesise waveforms `[batch, signal_len]` from a spectrogram
    pub fn inverse(&self, spectrogram: &Spectrogram) -> Result<Array2<f64>> {
        let n_bins = self.num_bins();
        if spectrogram.num_bins() != n_bins {
            return Err(DenoiserError::ShapeMismatch {
                what: "spectrogram frequency bins",
                expected: vec![n_bins],
                actual: vec![spectrogram.num_bins()],
            });
        }
        if spectrogram.signal_len() == 0 {
            return Err(DenoiserError::EmptyInput);
        }

        let n_fft = self.config.filter_length;
        let hop = self.config.hop_length;
        let n_frames = spectrogram.num_frames();
        let pad = n_fft / 2;
        let signal_len = spectrogram.signal_len();
        trace!(
            "stft inverse: batch={} frames={} samples={}",
            spectrogram.batch_size(),
            n_frames,
            signal_len
        );

        let envelope = window_sumsquare(&self.window, n_frames, hop);
        let mut output = Array2::<f64>::zeros((spectrogram.batch_size(), signal_len));
        let mut bins = vec![Complex::new(0.0, 0.0); n_bins];

        for (b, mut out) in output.outer_iter_mut().enumerate() {
            let mut buffer = vec![0.0; envelope.len()];

            for t in 0..n_frames {
                for (k, bin) in bins.iter_mut().enumerate() {
                    *bin = Complex::from_polar(
                        spectrogram.magnitude[[b, k, t]],
                        spectrogram.phase[[b, k, t]],
                    );
                }

                let frame = self.fft.inverse(&bins)?;
                let start = t * hop;
                for ((acc, &s), &w) in buffer[start..start + n_fft]
                    .iter_mut()
                    .zip(&frame)
                    .zip(&self.window)
                {
                    *acc += s * w;
                }
            }

            for (acc, &e) in buffer.iter_mut().zip(&envelope) {
                if e > f64::MIN_POSITIVE {
                    *acc /= e;
                }
            }

            // Drop the leading pad; anything past the buffer stays zero
            let available = buffer.len().saturating_sub(pad).min(signal_len);
            for (o, &s) in out.iter_mut().zip(&buffer[pad..pad + available]) {
                *o = s;
            }
        }

        Ok(output)
    }

    /// Number of frames produced for a waveform of `signal_len` samples
    pub fn num_frames(&self, signal_len: usize) -> usize {
        let padded_len = signal_len + 2 * (self.config.filter_length / 2);
        if padded_len < self.config.filter_length {
            return 0;
        }
        (padded_len - self.config.filter_length) / self.config.hop_length + 1
    }

    /// Number of frequency bins (filter_length/2 + 1)
    pub fn num_bins(&self) -> usize {
        self.fft.num_bins()
    }

    /// Waveform length spanned by `n_frames` frames once the padding is removed
    pub fn default_signal_len(&self, n_frames: usize) -> usize {
        n_frames.saturating_sub(1) * self.config.hop_length
    }

    /// Normalised analysis window (length = filter_length)
    pub fn window(&self) -> &[f64] {
        &self.window
    }

    pub fn config(&self) -> &StftConfig {
        &self.config
    }
}

/// Map an angle from [-π, π] onto (-π, π]
fn wrap_phase(angle: f64) -> f64 {
    if angle <= -PI {
        angle + 2.0 * PI
    } else {
        angle
    }
}

/// Reflect-pad `signal` by `pad` samples on both sides (edge sample not repeated)
///
/// Signals shorter than the pad are folded back and forth; a single sample
/// is replicated.
fn reflect_pad(signal: &[f64], pad: usize) -> Vec<f64> {
    let len = signal.len() as isize;
    let pad = pad as isize;

    (-pad..len + pad)
        .map(|i| signal[reflect_index(i, len)])
        .collect()
}

fn reflect_index(i: isize, len: isize) -> usize {
    if len <= 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let folded = i.rem_euclid(period);
    if folded >= len {
        (period - folded) as usize
    } else {
        folded as usize
    }
}
