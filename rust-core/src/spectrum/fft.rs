//! FFT engine using realfft for real-valued frames
//!
//! Plans are built once and shared; scratch buffers are allocated per call so
//! one engine can serve concurrent callers through `&self`.

use num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;

use crate::error::{DenoiserError, Result};

/// Forward/inverse real FFT pair of a fixed size
pub struct FftEngine {
    /// FFT size (number of samples)
    fft_size: usize,

    /// Real-to-complex processor
    r2c: Arc<dyn RealToComplex<f64>>,

    /// Complex-to-real processor
    c2r: Arc<dyn ComplexToReal<f64>>,
}

impl FftEngine {
    /// Create new FFT engine
    ///
    /// # Arguments
    /// * `fft_size` - FFT size (number of samples)
    pub fn new(fft_size: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(fft_size);
        let c2r = planner.plan_fft_inverse(fft_size);

        Self { fft_size, r2c, c2r }
    }

    /// Forward transform of one frame
    ///
    /// # Arguments
    /// * `frame` - Time-domain frame of exactly `fft_size` samples
    ///
    /// # Returns
    /// Complex spectrum X[k] for k = 0..fft_size/2
    pub fn forward(&self, frame: &[f64]) -> Result<Vec<Complex<f64>>> {
        self.check_len("fft input frame", self.fft_size, frame.len())?;

        let mut input = frame.to_vec();
        let mut output = self.r2c.make_output_vec();
        let mut scratch = self.r2c.make_scratch_vec();
        self.r2c
            .process_with_scratch(&mut input, &mut output, &mut scratch)?;

        Ok(output)
    }

    /// Inverse transform of one half-spectrum, scaled by 1/N
    ///
    /// The imaginary parts of the DC and Nyquist bins carry no information
    /// for a real signal and are discarded.
    pub fn inverse(&self, spectrum: &[Complex<f64>]) -> Result<Vec<f64>> {
        self.check_len("ifft input spectrum", self.num_bins(), spectrum.len())?;

        let mut input = spectrum.to_vec();
        input[0].im = 0.0;
        if self.fft_size % 2 == 0 {
            if let Some(nyquist) = input.last_mut() {
                nyquist.im = 0.0;
            }
        }

        let mut output = self.c2r.make_output_vec();
        let mut scratch = self.c2r.make_scratch_vec();
        self.c2r
            .process_with_scratch(&mut input, &mut output, &mut scratch)?;

        let scale = 1.0 / self.fft_size as f64;
        for s in output.iter_mut() {
            *s *= scale;
        }

        Ok(output)
    }

    /// Get FFT size
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Get number of frequency bins (fft_size/2 + 1 for real FFT)
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    fn check_len(&self, what: &'static str, expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(DenoiserError::ShapeMismatch {
                what,
                expected: vec![expected],
                actual: vec![actual],
            })
        }
    }
}
