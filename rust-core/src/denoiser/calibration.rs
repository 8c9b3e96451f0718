//! Canonical "silent" model input used to measure the vocoder bias

use ndarray::Array3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::fmt;
use std::str::FromStr;

use crate::error::DenoiserError;

/// Feature channels of the calibration input (mel bins)
pub const MEL_CHANNELS: usize = 80;

/// Frames of the calibration input
pub const CALIBRATION_FRAMES: usize = 88;

/// How the calibration input is filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BiasMode {
    /// All-zero features
    #[default]
    Zeros,

    /// Standard normal features
    Normal,
}

impl FromStr for BiasMode {
    type Err = DenoiserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zeros" => Ok(BiasMode::Zeros),
            "normal" => Ok(BiasMode::Normal),
            other => Err(DenoiserError::UnsupportedMode(other.to_string())),
        }
    }
}

impl fmt::Display for BiasMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BiasMode::Zeros => f.write_str("zeros"),
            BiasMode::Normal => f.write_str("normal"),
        }
    }
}

/// Build the `[1, MEL_CHANNELS, CALIBRATION_FRAMES]` calibration input
///
/// `seed` only affects `BiasMode::Normal`; without one the generator is
/// seeded from system entropy.
pub fn calibration_input(mode: BiasMode, seed: Option<u64>) -> Array3<f64> {
    let shape = (1, MEL_CHANNELS, CALIBRATION_FRAMES);

    match mode {
        BiasMode::Zeros => Array3::zeros(shape),
        BiasMode::Normal => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            Array3::from_shape_simple_fn(shape, || rng.sample::<f64, _>(StandardNormal))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("zeros".parse::<BiasMode>().unwrap(), BiasMode::Zeros);
        assert_eq!("normal".parse::<BiasMode>().unwrap(), BiasMode::Normal);

        match "bogus".parse::<BiasMode>() {
            Err(DenoiserError::UnsupportedMode(mode)) => assert_eq!(mode, "bogus"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_mode_display_round_trip() {
        for mode in [BiasMode::Zeros, BiasMode::Normal] {
            assert_eq!(mode.to_string().parse::<BiasMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_zeros_input() {
        let input = calibration_input(BiasMode::Zeros, None);
        assert_eq!(input.dim(), (1, 80, 88));
        assert!(input.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_normal_input_is_seeded() {
        let a = calibration_input(BiasMode::Normal, Some(7));
        let b = calibration_input(BiasMode::Normal, Some(7));
        let c = calibration_input(BiasMode::Normal, Some(8));

        assert_eq!(a.dim(), (1, 80, 88));
        assert_eq!(a, b);
        assert_ne!(a, c);

        // Roughly zero mean, unit variance over 7040 draws
        let n = a.len() as f64;
        let mean = a.sum() / n;
        let var = a.mapv(|x| (x - mean).powi(2)).sum() / n;
        assert!(mean.abs() < 0.1, "mean = {}", mean);
        assert!((var - 1.0).abs() < 0.1, "var = {}", var);
    }
}
