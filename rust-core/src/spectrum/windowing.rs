//! Analysis windows for short-time spectral analysis
//!
//! Windows are generated in their periodic (DFT-even) form, centred inside a
//! frame of `filter_length` samples and scaled so that overlapping squared
//! copies spaced `hop_length` apart sum to one in the steady state.

use std::f64::consts::PI;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowType {
    /// Hann window: w[n] = 0.5 - 0.5*cos(2πn/M)
    #[default]
    Hann,

    /// Hamming window: w[n] = 0.54 - 0.46*cos(2πn/M)
    Hamming,

    /// Blackman window: w[n] = 0.42 - 0.5*cos(2πn/M) + 0.08*cos(4πn/M)
    Blackman,

    /// Rectangular window (no tapering)
    Rectangular,
}

/// Generate periodic window coefficients
///
/// # Arguments
/// * `window_type` - Type of window function
/// * `length` - Number of samples (M)
///
/// # Returns
/// Vector of window coefficients w[n] for n = 0..M-1
pub fn generate_window(window_type: WindowType, length: usize) -> Vec<f64> {
    let m = length as f64;

    (0..length)
        .map(|n| {
            let angle = 2.0 * PI * n as f64 / m;
            match window_type {
                WindowType::Hann => 0.5 - 0.5 * angle.cos(),
                WindowType::Hamming => 0.54 - 0.46 * angle.cos(),
                WindowType::Blackman => 0.42 - 0.5 * angle.cos() + 0.08 * (2.0 * angle).cos(),
                WindowType::Rectangular => 1.0,
            }
        })
        .collect()
}

/// Centre `window` inside a zero-filled buffer of `size` samples
///
/// Windows longer than `size` are returned unchanged.
pub fn pad_center(window: &[f64], size: usize) -> Vec<f64> {
    if window.len() >= size {
        return window.to_vec();
    }

    let lpad = (size - window.len()) / 2;
    let mut padded = vec![0.0; size];
    padded[lpad..lpad + window.len()].copy_from_slice(window);
    padded
}

/// Steady-state sum of squared window copies at the given hop
///
/// Averages Σ_k w[i + k*hop]² over one hop period. For a window that
/// satisfies the overlap-add condition every term of the average is equal.
pub fn overlap_gain(window: &[f64], hop_length: usize) -> f64 {
    if hop_length == 0 || window.is_empty() {
        return 0.0;
    }

    let period = hop_length.min(window.len());
    let total: f64 = (0..period)
        .map(|offset| {
            window
                .iter()
                .skip(offset)
                .step_by(hop_length)
                .map(|&w| w * w)
                .sum::<f64>()
        })
        .sum();

    total / period as f64
}

/// Smallest steady-state sum of squared window copies over one hop period
///
/// Zero means some sample positions are never covered by the window and
/// cannot be reconstructed by overlap-add.
pub fn min_overlap(window: &[f64], hop_length: usize) -> f64 {
    if hop_length == 0 || window.is_empty() {
        return 0.0;
    }

    (0..hop_length)
        .map(|offset| {
            window
                .iter()
                .skip(offset)
                .step_by(hop_length)
                .map(|&w| w * w)
                .sum::<f64>()
        })
        .fold(f64::INFINITY, f64::min)
}

/// Build the analysis window used by the spectral transform
///
/// The tapering function of length `win_length` is centred in
/// `filter_length` samples and scaled by 1/sqrt(overlap gain).
pub fn analysis_window(
    window_type: WindowType,
    win_length: usize,
    filter_length: usize,
    hop_length: usize,
) -> Vec<f64> {
    let mut window = pad_center(&generate_window(window_type, win_length), filter_length);

    let gain = overlap_gain(&window, hop_length);
    if gain > 0.0 {
        let scale = gain.sqrt().recip();
        for w in window.iter_mut() {
            *w *= scale;
        }
    }

    window
}

/// Sum of squared windows placed at every frame position
///
/// # Arguments
/// * `window` - Analysis window (length = frame size)
/// * `n_frames` - Number of frames
/// * `hop_length` - Stride between frames
///
/// # Returns
/// Envelope of length (n_frames - 1) * hop_length + window.len()
pub fn window_sumsquare(window: &[f64], n_frames: usize, hop_length: usize) -> Vec<f64> {
    if n_frames == 0 {
        return Vec::new();
    }

    let frame_len = window.len();
    let mut envelope = vec![0.0; (n_frames - 1) * hop_length + frame_len];

    for frame in 0..n_frames {
        let start = frame * hop_length;
        for (e, &w) in envelope[start..start + frame_len].iter_mut().zip(window) {
            *e += w * w;
        }
    }

    envelope
}
