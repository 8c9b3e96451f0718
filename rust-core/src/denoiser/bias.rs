//! Vocoder bias removal
//!
//! At construction the vocoder is run once on a silent calibration input; the
//! magnitude of the first frame of its output becomes the noise signature.
//! Each call then subtracts `strength × signature` from every frame of the
//! input's magnitude spectrogram, floors at zero and resynthesises with the
//! original phase.

use log::{debug, info, warn};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};

use super::calibration::{calibration_input, BiasMode};
use super::vocoder::Vocoder;
use crate::backend::Backend;
use crate::error::{DenoiserError, Result};
use crate::spectrum::stft::{SpectralTransform, Spectrogram, StftConfig};
use crate::spectrum::windowing::WindowType;

/// Default subtraction strength
pub const DEFAULT_STRENGTH: f64 = 0.1;

/// Denoiser configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DenoiserConfig {
    /// Samples per analysis frame
    pub filter_length: usize,

    /// Frames overlapping each sample; hop = filter_length / n_overlap
    pub n_overlap: usize,

    /// Tapering window length
    pub win_length: usize,

    /// Calibration input fill
    pub mode: BiasMode,

    /// Placement shared by the denoiser and the vocoder
    pub backend: Backend,

    /// Seed for `BiasMode::Normal` calibration
    pub seed: Option<u64>,
}

impl Default for DenoiserConfig {
    fn default() -> Self {
        Self {
            filter_length: 1024,
            n_overlap: 4,
            win_length: 1024,
            mode: BiasMode::Zeros,
            backend: Backend::Cpu,
            seed: None,
        }
    }
}

impl DenoiserConfig {
    /// Spectral transform settings derived from this configuration
    pub fn stft_config(&self) -> Result<StftConfig> {
        if self.n_overlap == 0 {
            return Err(DenoiserError::Configuration(
                "n_overlap must be positive".into(),
            ));
        }

        let config = StftConfig {
            filter_length: self.filter_length,
            hop_length: self.filter_length / self.n_overlap,
            win_length: self.win_length,
            window_type: WindowType::Hann,
            backend: self.backend,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Removes a vocoder's characteristic background noise from its output
pub struct Denoiser {
    stft: SpectralTransform,
    bias_spec: Array1<f64>,
}

impl Denoiser {
    /// Calibrate against `vocoder`
    ///
    /// Configuration and placement are checked before the vocoder runs.
    pub fn new<V: Vocoder>(vocoder: &V, config: DenoiserConfig) -> Result<Self> {
        let stft_config = config.stft_config()?;
        config.backend.ensure_matches(vocoder.backend())?;

        let stft = SpectralTransform::new(stft_config)?;
        let features = calibration_input(config.mode, config.seed);
        debug!(
            "calibrating bias: mode={} features={:?} hop_length={}",
            config.mode,
            features.dim(),
            stft.config().hop_length
        );

        let output = vocoder
            .synthesize(features.view())
            .map_err(|e| DenoiserError::Model(Box::new(e)))?;

        // Flatten to a single channel
        let bias_audio = output
            .iter()
            .copied()
            .collect::<Array1<f64>>()
            .insert_axis(Axis(0));
        if bias_audio.len() < stft.config().filter_length {
            warn!(
                "bias waveform ({} samples) is shorter than one analysis frame ({})",
                bias_audio.len(),
                stft.config().filter_length
            );
        }

        let spec = stft.transform(bias_audio.view())?;
        let bias_spec = spec.magnitude().index_axis(Axis(0), 0).column(0).to_owned();

        info!(
            "bias signature ready: bins={} peak={:.6}",
            bias_spec.len(),
            bias_spec.iter().copied().fold(0.0, f64::max)
        );

        Ok(Self { stft, bias_spec })
    }

    /// Calibrate with the mode given by name (`"zeros"` or `"normal"`)
    ///
    /// An unknown mode fails before the vocoder is invoked.
    pub fn from_mode_name<V: Vocoder>(
        vocoder: &V,
        filter_length: usize,
        n_overlap: usize,
        win_length: usize,
        mode: &str,
    ) -> Result<Self> {
        let config = DenoiserConfig {
            filter_length,
            n_overlap,
            win_length,
            mode: mode.parse()?,
            ..DenoiserConfig::default()
        };
        Self::new(vocoder, config)
    }

    /// Denoise a batch of waveforms laid out as `[batch, samples]`
    pub fn forward(&self, audio: ArrayView2<'_, f64>, strength: f64) -> Result<Array2<f64>> {
        validate_strength(strength)?;

        let mut spec = self.stft.transform(audio)?;
        self.denoise_spectrogram(&mut spec, strength)?;
        self.stft.inverse(&spec)
    }

    /// Subtract the scaled signature from every frame, flooring at zero
    pub fn denoise_spectrogram(&self, spec: &mut Spectrogram, strength: f64) -> Result<()> {
        validate_strength(strength)?;

        let (_, bins, frames) = spec.magnitude().dim();
        if bins != self.bias_spec.len() {
            return Err(DenoiserError::ShapeMismatch {
                what: "noise signature",
                expected: vec![bins],
                actual: vec![self.bias_spec.len()],
            });
        }

        // (bins, 1) replicated across every frame
        let scaled = self.bias_spec.mapv(|b| b * strength).insert_axis(Axis(1));
        let profile = scaled
            .broadcast((bins, frames))
            .ok_or_else(|| DenoiserError::ShapeMismatch {
                what: "noise signature broadcast",
                expected: vec![bins, frames],
                actual: vec![bins, 1],
            })?;

        for mut channel in spec.magnitude_mut().outer_iter_mut() {
            Zip::from(&mut channel)
                .and(&profile)
                .for_each(|m, &b| *m = (*m - b).max(0.0));
        }

        Ok(())
    }

    /// Noise signature, one magnitude per frequency bin
    pub fn signature(&self) -> ArrayView1<'_, f64> {
        self.bias_spec.view()
    }

    pub fn stft(&self) -> &SpectralTransform {
        &self.stft
    }

    pub fn backend(&self) -> Backend {
        self.stft.config().backend
    }
}

fn validate_strength(strength: f64) -> Result<()> {
    if strength.is_finite() && strength >= 0.0 {
        Ok(())
    } else {
        Err(DenoiserError::InvalidStrength(strength))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, ArrayD, ArrayView3, IxDyn};
    use std::cell::Cell;
    use std::convert::Infallible;
    use std::f64::consts::PI;

    const SAMPLE_RATE: f64 = 22050.0;
    const HOP: usize = 256;

    /// Emits a steady hum and whine, whatever the input
    struct HumVocoder {
        calls: Cell<usize>,
        backend: Backend,
    }

    impl HumVocoder {
        fn new() -> Self {
            Self {
                calls: Cell::new(0),
                backend: Backend::Cpu,
            }
        }
    }

    impl Vocoder for HumVocoder {
        type Error = Infallible;

        fn synthesize(
            &self,
            features: ArrayView3<'_, f64>,
        ) -> std::result::Result<ArrayD<f64>, Infallible> {
            self.calls.set(self.calls.get() + 1);

            let (_, _, frames) = features.dim();
            let offset = features.mean().unwrap_or(0.0);
            let samples = frames * HOP;
            let audio = Array1::from_shape_fn(samples, |n| hum(n) + 1e-3 * offset);
            Ok(audio.into_shape(IxDyn(&[1, 1, samples])).unwrap())
        }

        fn backend(&self) -> Backend {
            self.backend
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl std::fmt::Display for Broken {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("weights not loaded")
        }
    }

    impl std::error::Error for Broken {}

    struct BrokenVocoder;

    impl Vocoder for BrokenVocoder {
        type Error = Broken;

        fn synthesize(
            &self,
            _features: ArrayView3<'_, f64>,
        ) -> std::result::Result<ArrayD<f64>, Broken> {
            Err(Broken)
        }
    }

    fn hum(n: usize) -> f64 {
        let t = n as f64 / SAMPLE_RATE;
        0.01 * (2.0 * PI * 60.0 * t).cos() + 0.005 * (2.0 * PI * 4000.0 * t).cos()
    }

    fn speech_like(len: usize) -> Array2<f64> {
        Array1::from_shape_fn(len, |n| {
            let t = n as f64 / SAMPLE_RATE;
            let envelope = 0.5 + 0.5 * (2.0 * PI * 3.0 * t).sin();
            envelope * (0.4 * (2.0 * PI * 180.0 * t).sin() + 0.2 * (2.0 * PI * 720.0 * t).sin())
                + hum(n)
        })
        .insert_axis(Axis(0))
    }

    fn max_abs_diff(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_signature_shape() {
        let vocoder = HumVocoder::new();
        let denoiser = Denoiser::new(&vocoder, DenoiserConfig::default()).unwrap();

        assert_eq!(vocoder.calls.get(), 1);
        assert_eq!(denoiser.signature().len(), 513);
        assert_eq!(denoiser.signature().len(), denoiser.stft().num_bins());
        assert!(denoiser.signature().iter().all(|&m| m >= 0.0));
        assert_eq!(denoiser.stft().config().hop_length, 256);
    }

    #[test]
    fn test_bogus_mode_skips_vocoder() {
        let vocoder = HumVocoder::new();

        let result = Denoiser::from_mode_name(&vocoder, 1024, 4, 1024, "bogus");

        assert!(matches!(result, Err(DenoiserError::UnsupportedMode(_))));
        assert_eq!(vocoder.calls.get(), 0);
    }

    #[test]
    fn test_invalid_config_skips_vocoder() {
        let vocoder = HumVocoder::new();

        let zero_overlap = DenoiserConfig {
            n_overlap: 0,
            ..DenoiserConfig::default()
        };
        assert!(matches!(
            Denoiser::new(&vocoder, zero_overlap),
            Err(DenoiserError::Configuration(_))
        ));

        let long_window = DenoiserConfig {
            win_length: 2048,
            ..DenoiserConfig::default()
        };
        assert!(matches!(
            Denoiser::new(&vocoder, long_window),
            Err(DenoiserError::Configuration(_))
        ));

        assert_eq!(vocoder.calls.get(), 0);
    }

    #[test]
    fn test_backend_mismatch_skips_vocoder() {
        let mut vocoder = HumVocoder::new();
        vocoder.backend = Backend::Accelerated;

        let result = Denoiser::new(&vocoder, DenoiserConfig::default());
        assert!(matches!(result, Err(DenoiserError::BackendMismatch { .. })));
        assert_eq!(vocoder.calls.get(), 0);

        let config = DenoiserConfig {
            backend: Backend::Accelerated,
            ..DenoiserConfig::default()
        };
        let denoiser = Denoiser::new(&vocoder, config).unwrap();
        assert_eq!(denoiser.backend(), Backend::Accelerated);
    }

    #[test]
    fn test_vocoder_failure_is_reported() {
        let result = Denoiser::new(&BrokenVocoder, DenoiserConfig::default());

        match result {
            Err(DenoiserError::Model(e)) => assert_eq!(e.to_string(), "weights not loaded"),
            _ => panic!("expected model error"),
        }
    }

    #[test]
    fn test_zero_strength_identity() {
        let denoiser = Denoiser::new(&HumVocoder::new(), DenoiserConfig::default()).unwrap();

        let audio = speech_like(11025);
        let output = denoiser.forward(audio.view(), 0.0).unwrap();

        assert_eq!(output.dim(), audio.dim());
        assert!(max_abs_diff(&audio, &output) < 1e-9);
    }

    #[test]
    fn test_monotonic_suppression() {
        let denoiser = Denoiser::new(&HumVocoder::new(), DenoiserConfig::default()).unwrap();
        let audio = speech_like(8000);
        let original = denoiser.stft().transform(audio.view()).unwrap();

        let mut previous = original.magnitude().clone();
        for strength in [0.05, 0.1, 0.5, 1.0, 5.0] {
            let mut spec = original.clone();
            denoiser.denoise_spectrogram(&mut spec, strength).unwrap();

            assert!(spec.magnitude().iter().all(|&m| m >= 0.0));
            Zip::from(spec.magnitude())
                .and(&previous)
                .for_each(|&now, &before| assert!(now <= before));
            previous = spec.magnitude().clone();
        }
    }

    #[test]
    fn test_removes_bias_energy() {
        let denoiser = Denoiser::new(&HumVocoder::new(), DenoiserConfig::default()).unwrap();

        // A stationary bias is mostly removed once the signature is fully subtracted
        let bias = Array1::from_shape_fn(8192, hum).insert_axis(Axis(0));
        let output = denoiser.forward(bias.view(), 1.5).unwrap();

        let energy = |a: &Array2<f64>| a.iter().map(|s| s * s).sum::<f64>();
        assert!(energy(&output) < 0.1 * energy(&bias));
    }

    #[test]
    fn test_forward_preserves_length() {
        let denoiser = Denoiser::new(&HumVocoder::new(), DenoiserConfig::default()).unwrap();

        for len in [1, 100, 1023, 5000] {
            let audio = speech_like(len);
            let output = denoiser.forward(audio.view(), DEFAULT_STRENGTH).unwrap();
            assert_eq!(output.dim(), (1, len));
        }
    }

    #[test]
    fn test_invalid_strength() {
        let denoiser = Denoiser::new(&HumVocoder::new(), DenoiserConfig::default()).unwrap();
        let audio = speech_like(2048);

        for strength in [-0.1, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                denoiser.forward(audio.view(), strength),
                Err(DenoiserError::InvalidStrength(_))
            ));
        }
    }

    #[test]
    fn test_empty_audio() {
        let denoiser = Denoiser::new(&HumVocoder::new(), DenoiserConfig::default()).unwrap();

        let empty = Array2::<f64>::zeros((1, 0));
        assert!(matches!(
            denoiser.forward(empty.view(), DEFAULT_STRENGTH),
            Err(DenoiserError::EmptyInput)
        ));
    }

    #[test]
    fn test_signature_mismatch() {
        let denoiser = Denoiser::new(&HumVocoder::new(), DenoiserConfig::default()).unwrap();

        let other = SpectralTransform::new(StftConfig::new(512, 128, 512)).unwrap();
        let mut spec = other.transform(speech_like(2048).view()).unwrap();

        assert!(matches!(
            denoiser.denoise_spectrogram(&mut spec, DEFAULT_STRENGTH),
            Err(DenoiserError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_normal_mode_is_reproducible() {
        let config = DenoiserConfig {
            mode: BiasMode::Normal,
            seed: Some(42),
            ..DenoiserConfig::default()
        };

        let a = Denoiser::new(&HumVocoder::new(), config.clone()).unwrap();
        let b = Denoiser::new(&HumVocoder::new(), config).unwrap();
        assert_eq!(a.signature(), b.signature());
    }

    #[test]
    fn test_shared_across_threads() {
        let denoiser = Denoiser::new(&HumVocoder::new(), DenoiserConfig::default()).unwrap();
        let audio = speech_like(4096);
        let expected = denoiser.forward(audio.view(), DEFAULT_STRENGTH).unwrap();

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| denoiser.forward(audio.view(), DEFAULT_STRENGTH).unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }
}
