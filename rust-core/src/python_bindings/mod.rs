//! PyO3 bindings for Python integration

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::error::DenoiserError;

mod denoiser_bindings;
mod stft_bindings;

impl From<DenoiserError> for PyErr {
    fn from(err: DenoiserError) -> PyErr {
        match err {
            // Re-raise whatever the Python vocoder raised
            DenoiserError::Model(source) => match source.downcast::<PyErr>() {
                Ok(py_err) => *py_err,
                Err(other) => PyRuntimeError::new_err(other.to_string()),
            },
            other => PyValueError::new_err(other.to_string()),
        }
    }
}

/// Python module definition
#[pymodule]
fn vocoder_denoise(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<denoiser_bindings::PyDenoiser>()?;
    m.add_class::<stft_bindings::PySpectralTransform>()?;

    // Add WindowType enum
    m.add_class::<stft_bindings::PyWindowType>()?;

    Ok(())
}
