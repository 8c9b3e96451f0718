//! Python bindings for the bias denoiser

use ndarray::{ArrayD, ArrayView3};
use numpy::{PyArray1, PyArray2, PyArray3, PyReadonlyArray2, PyReadonlyArrayDyn};
use pyo3::exceptions::PyTypeError;
use pyo3::prelude::*;

use crate::backend::Backend;
use crate::denoiser::{Denoiser, DenoiserConfig, Vocoder};

/// Any Python callable mapping a (1, 80, frames) array to a waveform array
struct PyVocoder<'py> {
    callable: &'py PyAny,
}

impl Vocoder for PyVocoder<'_> {
    type Error = PyErr;

    fn synthesize(&self, features: ArrayView3<'_, f64>) -> Result<ArrayD<f64>, PyErr> {
        let py = self.callable.py();
        let mel = PyArray3::from_array(py, &features);

        let output = self.callable.call1((mel,))?;
        let waveform: PyReadonlyArrayDyn<f64> = output.extract()?;

        Ok(waveform.as_array().to_owned())
    }
}

/// Vocoder bias denoiser exposed to Python
#[pyclass(name = "Denoiser")]
pub struct PyDenoiser {
    denoiser: Denoiser,
}

#[pymethods]
impl PyDenoiser {
    /// Calibrate a denoiser against a vocoder
    ///
    /// Args:
    ///     vocoder: Callable taking a float64 array of shape (1, 80, 88)
    ///     filter_length: Samples per analysis frame
    ///     n_overlap: Frames overlapping each sample (hop = filter_length / n_overlap)
    ///     win_length: Window length
    ///     mode: Calibration input, "zeros" or "normal"
    ///     seed: Random seed for "normal" calibration
    #[new]
    #[pyo3(signature = (vocoder, filter_length=1024, n_overlap=4, win_length=1024, mode="zeros", seed=None))]
    fn new(
        vocoder: &PyAny,
        filter_length: usize,
        n_overlap: usize,
        win_length: usize,
        mode: &str,
        seed: Option<u64>,
    ) -> PyResult<Self> {
        if !vocoder.is_callable() {
            return Err(PyTypeError::new_err("vocoder must be callable"));
        }

        let config = DenoiserConfig {
            filter_length,
            n_overlap,
            win_length,
            mode: mode.parse()?,
            backend: Backend::Cpu,
            seed,
        };
        let denoiser = Denoiser::new(&PyVocoder { callable: vocoder }, config)?;

        Ok(Self { denoiser })
    }

    /// Remove the vocoder bias from audio
    ///
    /// Args:
    ///     audio: float64 array of shape (batch, samples)
    ///     strength: Subtraction strength (default: 0.1)
    ///
    /// Returns:
    ///     Denoised audio with the same shape
    #[pyo3(signature = (audio, strength=0.1))]
    fn forward<'py>(
        &self,
        py: Python<'py>,
        audio: PyReadonlyArray2<f64>,
        strength: f64,
    ) -> PyResult<&'py PyArray2<f64>> {
        let denoised = self.denoiser.forward(audio.as_array(), strength)?;
        Ok(PyArray2::from_owned_array(py, denoised))
    }

    #[pyo3(signature = (audio, strength=0.1))]
    fn __call__<'py>(
        &self,
        py: Python<'py>,
        audio: PyReadonlyArray2<f64>,
        strength: f64,
    ) -> PyResult<&'py PyArray2<f64>> {
        self.forward(py, audio, strength)
    }

    /// Get the noise signature (one magnitude per frequency bin)
    fn bias_spec<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        PyArray1::from_array(py, &self.denoiser.signature())
    }
}
