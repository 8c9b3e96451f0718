//! Python bindings for the spectral transform

use ndarray::Axis;
use numpy::{PyArray2, PyArray3, PyReadonlyArray2, PyReadonlyArray3};
use pyo3::prelude::*;

use crate::backend::Backend;
use crate::spectrum::{SpectralTransform, Spectrogram, StftConfig, WindowType};

/// Window type enum exposed to Python
#[pyclass(name = "WindowType")]
#[derive(Clone)]
pub enum PyWindowType {
    Hann,
    Hamming,
    Blackman,
    Rectangular,
}

impl From<PyWindowType> for WindowType {
    fn from(py_win: PyWindowType) -> Self {
        match py_win {
            PyWindowType::Hann => WindowType::Hann,
            PyWindowType::Hamming => WindowType::Hamming,
            PyWindowType::Blackman => WindowType::Blackman,
            PyWindowType::Rectangular => WindowType::Rectangular,
        }
    }
}

/// Spectral transform exposed to Python
#[pyclass(name = "SpectralTransform")]
pub struct PySpectralTransform {
    stft: SpectralTransform,
}

#[pymethods]
impl PySpectralTransform {
    /// Create a new spectral transform
    ///
    /// Args:
    ///     filter_length: Samples per frame (FFT size)
    ///     hop_length: Stride between frames
    ///     win_length: Window length, zero-padded to filter_length
    ///     window_type: Tapering window
    #[new]
    #[pyo3(signature = (filter_length=1024, hop_length=256, win_length=1024, window_type=PyWindowType::Hann))]
    fn new(
        filter_length: usize,
        hop_length: usize,
        win_length: usize,
        window_type: PyWindowType,
    ) -> PyResult<Self> {
        let config = StftConfig {
            filter_length,
            hop_length,
            win_length,
            window_type: window_type.into(),
            backend: Backend::Cpu,
        };

        Ok(Self {
            stft: SpectralTransform::new(config)?,
        })
    }

    /// Analyse waveforms
    ///
    /// Args:
    ///     waveform: float64 array of shape (batch, samples)
    ///
    /// Returns:
    ///     (magnitude, phase), each of shape (batch, bins, frames)
    fn transform<'py>(
        &self,
        py: Python<'py>,
        waveform: PyReadonlyArray2<f64>,
    ) -> PyResult<(&'py PyArray3<f64>, &'py PyArray3<f64>)> {
        let spec = self.stft.transform(waveform.as_array())?;
        let (magnitude, phase) = spec.into_parts();

        Ok((
            PyArray3::from_owned_array(py, magnitude),
            PyArray3::from_owned_array(py, phase),
        ))
    }

    /// Resynthesise waveforms
    ///
    /// Args:
    ///     magnitude: float64 array of shape (batch, bins, frames)
    ///     phase: float64 array of the same shape
    ///     length: Output length in samples (default: (frames - 1) * hop_length)
    ///
    /// Returns:
    ///     Waveforms of shape (batch, length)
    #[pyo3(signature = (magnitude, phase, length=None))]
    fn inverse<'py>(
        &self,
        py: Python<'py>,
        magnitude: PyReadonlyArray3<f64>,
        phase: PyReadonlyArray3<f64>,
        length: Option<usize>,
    ) -> PyResult<&'py PyArray2<f64>> {
        let magnitude = magnitude.as_array().to_owned();
        let phase = phase.as_array().to_owned();
        let length =
            length.unwrap_or_else(|| self.stft.default_signal_len(magnitude.len_of(Axis(2))));

        let spec = Spectrogram::from_parts(magnitude, phase, length)?;
        let waveform = self.stft.inverse(&spec)?;

        Ok(PyArray2::from_owned_array(py, waveform))
    }

    /// Get number of frequency bins
    fn num_bins(&self) -> usize {
        self.stft.num_bins()
    }

    /// Get hop length
    fn get_hop_length(&self) -> usize {
        self.stft.config().hop_length
    }
}
