//! Sum-of-sinusoids Rayleigh fading.
//!
//! Each tap follows the Zheng-Xiao model: `N` sinusoids with random angles
//! of arrival and phases, giving unit average power and a Jakes Doppler
//! spectrum. Time is counted in samples, so Doppler is in cycles/sample.

use std::f64::consts::PI;

use num_complex::{Complex32, Complex64};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::ChannelModel;

/// One Rayleigh fading coefficient evolving sample by sample.
pub struct SosFader {
    doppler: f64,
    cos_alpha: Vec<f64>,
    sin_alpha: Vec<f64>,
    psi: Vec<f64>,
    phi: Vec<f64>,
    scale: f64,
    time: f64,
}

impl SosFader {
    pub fn new(sinusoids: usize, doppler: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let theta: f64 = rng.random_range(-PI..PI);
        let mut cos_alpha = Vec::with_capacity(sinusoids);
        let mut sin_alpha = Vec::with_capacity(sinusoids);
        let mut psi = Vec::with_capacity(sinusoids);
        let mut phi = Vec::with_capacity(sinusoids);

        for n in 1..=sinusoids {
            let alpha = (2.0 * PI * n as f64 - PI + theta) / (4.0 * sinusoids as f64);
            cos_alpha.push(alpha.cos());
            sin_alpha.push(alpha.sin());
            psi.push(rng.random_range(-PI..PI));
            phi.push(rng.random_range(-PI..PI));
        }

        Self {
            doppler,
            cos_alpha,
            sin_alpha,
            psi,
            phi,
            scale: (2.0 / sinusoids as f64).sqrt(),
            time: 0.0,
        }
    }

    pub fn next_sample(&mut self) -> Complex64 {
        let w = 2.0 * PI * self.doppler * self.time;
        let mut re = 0.0;
        let mut im = 0.0;
        for n in 0..self.psi.len() {
            re += self.psi[n].cos() * (w * self.cos_alpha[n] + self.phi[n]).cos();
            im += self.psi[n].sin() * (w * self.sin_alpha[n] + self.phi[n]).cos();
        }
        self.time += 1.0;
        Complex64::new(re, im) * self.scale
    }
}

/// Frequency-flat fading: every sample scaled by one evolving coefficient.
pub struct FlatFading {
    fader: SosFader,
}

impl FlatFading {
    pub fn new(sinusoids: usize, doppler: f64, seed: u64) -> Self {
        Self {
            fader: SosFader::new(sinusoids, doppler, seed),
        }
    }
}

impl ChannelModel for FlatFading {
    fn process(&mut self, input: &[Complex32], out: &mut Vec<Complex32>) {
        out.reserve(input.len());
        for &x in input {
            let h = self.fader.next_sample();
            out.push(x * Complex32::new(h.re as f32, h.im as f32));
        }
    }
}

fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

/// Frequency-selective fading: one fader per delay-profile path,
/// sinc-interpolated onto an `ntaps` impulse response.
pub struct SelectiveFading {
    faders: Vec<SosFader>,
    /// `weights[path][tap]`, magnitude times sinc interpolation weight.
    weights: Vec<Vec<f64>>,
    history: Vec<Complex32>,
    taps: Vec<Complex64>,
}

impl SelectiveFading {
    pub fn new(
        sinusoids: usize,
        doppler: f64,
        delays: &[f64],
        magnitudes: &[f64],
        ntaps: usize,
        seed: u64,
    ) -> Self {
        let mut seeds = StdRng::seed_from_u64(seed);
        let center = ((ntaps - 1) / 2) as f64;
        let faders = delays
            .iter()
            .map(|_| SosFader::new(sinusoids, doppler, seeds.random()))
            .collect();
        let weights = delays
            .iter()
            .zip(magnitudes)
            .map(|(&delay, &mag)| {
                (0..ntaps)
                    .map(|k| mag * sinc(k as f64 - center - delay))
                    .collect()
            })
            .collect();
        Self {
            faders,
            weights,
            history: vec![Complex32::new(0.0, 0.0); ntaps],
            taps: vec![Complex64::new(0.0, 0.0); ntaps],
        }
    }

    pub fn ntaps(&self) -> usize {
        self.taps.len()
    }

    fn update_taps(&mut self) {
        self.taps.iter_mut().for_each(|t| *t = Complex64::new(0.0, 0.0));
        for (fader, weights) in self.faders.iter_mut().zip(&self.weights) {
            let h = fader.next_sample();
            for (tap, &w) in self.taps.iter_mut().zip(weights) {
                *tap += h * w;
            }
        }
    }
}

impl ChannelModel for SelectiveFading {
    fn process(&mut self, input: &[Complex32], out: &mut Vec<Complex32>) {
        out.reserve(input.len());
        for &x in input {
            self.update_taps();
            self.history.rotate_right(1);
            self.history[0] = x;
            let y = self
                .history
                .iter()
                .zip(&self.taps)
                .fold(Complex64::new(0.0, 0.0), |acc, (s, t)| {
                    acc + Complex64::new(s.re as f64, s.im as f64) * t
                });
            out.push(Complex32::new(y.re as f32, y.im as f32));
        }
    }
}
