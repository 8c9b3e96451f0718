use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::{Array1, ArrayD, ArrayView3, Axis, IxDyn};
use std::convert::Infallible;
use std::f64::consts::PI;
use vocoder_denoise::{Denoiser, DenoiserConfig, SpectralTransform, StftConfig, Vocoder};

struct HissVocoder;

impl Vocoder for HissVocoder {
    type Error = Infallible;

    fn synthesize(&self, features: ArrayView3<'_, f64>) -> Result<ArrayD<f64>, Infallible> {
        let samples = features.len_of(Axis(2)) * 256;
        let audio = Array1::from_shape_fn(samples, |n| {
            1e-3 * ((n * 7919 % 104729) as f64 / 104729.0 - 0.5)
        });
        Ok(audio.into_dyn().into_shape(IxDyn(&[1, samples])).unwrap())
    }
}

fn one_second() -> ndarray::Array2<f64> {
    Array1::from_shape_fn(22050, |n| (2.0 * PI * 440.0 * n as f64 / 22050.0).sin())
        .insert_axis(Axis(0))
}

fn bench_stft(c: &mut Criterion) {
    let stft = SpectralTransform::new(StftConfig::default()).unwrap();
    let audio = one_second();

    c.bench_function("stft_transform_1s", |b| {
        b.iter(|| stft.transform(black_box(audio.view())).unwrap())
    });

    let spec = stft.transform(audio.view()).unwrap();
    c.bench_function("stft_inverse_1s", |b| b.iter(|| stft.inverse(black_box(&spec)).unwrap()));
}

fn bench_denoise(c: &mut Criterion) {
    let denoiser = Denoiser::new(&HissVocoder, DenoiserConfig::default()).unwrap();
    let audio = one_second();

    c.bench_function("denoise_forward_1s", |b| {
        b.iter(|| denoiser.forward(black_box(audio.view()), 0.1).unwrap())
    });
}

criterion_group!(benches, bench_stft, bench_denoise);
criterion_main!(benches);
