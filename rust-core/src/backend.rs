//! Compute backend placement
//!
//! The backend is chosen once, when a transform or denoiser is built, and
//! every buffer the instance owns is tied to it. All spectral kernels in this
//! crate run on the CPU; `Accelerated` exists so that a denoiser can be paired
//! only with a generative model placed on the same device.

use crate::error::{DenoiserError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Fallback numeric backend
    #[default]
    Cpu,

    /// Accelerator-resident model
    Accelerated,
}

impl Backend {
    /// Pick a backend from a one-off availability query
    pub fn select(accelerated_available: bool) -> Self {
        if accelerated_available {
            Backend::Accelerated
        } else {
            Backend::Cpu
        }
    }

    /// Fail unless `other` is placed on this backend
    pub fn ensure_matches(self, other: Backend) -> Result<()> {
        if self == other {
            Ok(())
        } else {
            Err(DenoiserError::BackendMismatch {
                expected: self,
                actual: other,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select() {
        assert_eq!(Backend::select(true), Backend::Accelerated);
        assert_eq!(Backend::select(false), Backend::Cpu);
        assert_eq!(Backend::default(), Backend::Cpu);
    }

    #[test]
    fn test_mismatch_is_rejected() {
        assert!(Backend::Cpu.ensure_matches(Backend::Cpu).is_ok());

        let err = Backend::Cpu.ensure_matches(Backend::Accelerated).unwrap_err();
        assert!(matches!(
            err,
            DenoiserError::BackendMismatch {
                expected: Backend::Cpu,
                actual: Backend::Accelerated
            }
        ));
    }
}
