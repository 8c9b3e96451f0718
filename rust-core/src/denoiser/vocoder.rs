//! Generative model seam

use ndarray::{ArrayD, ArrayView3};

use crate::backend::Backend;

/// A neural vocoder mapping acoustic features to audio
///
/// `features` is laid out as `[batch=1, channels, frames]`. The returned
/// waveform may have any shape; it is flattened into a single channel.
pub trait Vocoder {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run the model once without mutating its state
    fn synthesize(&self, features: ArrayView3<'_, f64>) -> Result<ArrayD<f64>, Self::Error>;

    /// Backend the model's weights live on
    fn backend(&self) -> Backend {
        Backend::Cpu
    }
}
