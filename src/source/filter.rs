//! Pulse-shaping taps and a streaming FIR used by the generators.

use std::collections::VecDeque;
use std::f64::consts::PI;
use std::ops::{Add, Mul};

/// Streaming FIR filter with real taps, keeping history across calls.
#[derive(Debug, Clone)]
pub struct Fir<T> {
    taps: Vec<f32>,
    history: VecDeque<T>,
}

impl<T> Fir<T>
where
    T: Copy + Default + Add<Output = T> + Mul<f32, Output = T>,
{
    pub fn new(taps: Vec<f32>) -> Self {
        let history = std::iter::repeat_n(T::default(), taps.len()).collect();
        Self { taps, history }
    }

    pub fn taps(&self) -> &[f32] {
        &self.taps
    }

    /// Delay through the filter in samples, for symmetric taps.
    pub fn group_delay(&self) -> usize {
        (self.taps.len() - 1) / 2
    }

    pub fn push(&mut self, sample: T) -> T {
        self.history.pop_back();
        self.history.push_front(sample);
        self.history
            .iter()
            .zip(self.taps.iter())
            .fold(T::default(), |acc, (&x, &h)| acc + x * h)
    }
}

/// Root-raised-cosine impulse response spanning `span` symbols each side,
/// normalized to unit energy.
pub fn rrc_taps(samples_per_symbol: usize, alpha: f64, span: usize) -> Vec<f32> {
    let len = 2 * span * samples_per_symbol + 1;
    let mut taps = Vec::with_capacity(len);

    for i in 0..len {
        let t = (i as f64 - (len - 1) as f64 / 2.0) / samples_per_symbol as f64;
        let h = if t.abs() < 1e-10 {
            1.0 + alpha * (4.0 / PI - 1.0)
        } else if (t.abs() - 1.0 / (4.0 * alpha)).abs() < 1e-10 {
            let a = (1.0 + 2.0 / PI) * (PI / (4.0 * alpha)).sin();
            let b = (1.0 - 2.0 / PI) * (PI / (4.0 * alpha)).cos();
            alpha / 2.0_f64.sqrt() * (a + b)
        } else {
            let num = (PI * t * (1.0 - alpha)).sin()
                + 4.0 * alpha * t * (PI * t * (1.0 + alpha)).cos();
            let den = PI * t * (1.0 - (4.0 * alpha * t).powi(2));
            num / den
        };
        taps.push(h);
    }

    let norm = taps.iter().map(|h| h * h).sum::<f64>().sqrt();
    taps.iter().map(|h| (h / norm) as f32).collect()
}

/// Gaussian taps with bandwidth-time product `bt`, summing to `gain`.
pub fn gaussian_taps(
    gain: f64,
    samples_per_symbol: usize,
    bt: f64,
    ntaps: usize,
) -> Vec<f32> {
    let dt = 1.0 / samples_per_symbol as f64;
    let s = 1.0 / ((2.0_f64.ln()).sqrt() / (2.0 * PI * bt));
    let mut t0 = -0.5 * ntaps as f64;
    let mut taps = Vec::with_capacity(ntaps);
    for _ in 0..ntaps {
        t0 += 1.0;
        let ts = s * dt * t0;
        taps.push((-0.5 * ts * ts).exp());
    }
    let scale: f64 = taps.iter().sum();
    taps.iter().map(|t| (t / scale * gain) as f32).collect()
}

/// Hamming-windowed Hilbert transformer with `ntaps` (odd) taps.
pub fn hilbert_taps(ntaps: usize) -> Vec<f32> {
    let mid = (ntaps - 1) as isize / 2;
    (0..ntaps)
        .map(|i| {
            let n = i as isize - mid;
            let window = 0.54 - 0.46 * (2.0 * PI * i as f64 / (ntaps - 1) as f64).cos();
            if n % 2 == 0 {
                0.0
            } else {
                (2.0 / (PI * n as f64) * window) as f32
            }
        })
        .collect()
}

/// Full linear convolution of two tap sets.
pub fn convolve(a: &[f32], b: &[f32]) -> Vec<f32> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0f32; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}
