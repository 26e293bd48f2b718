//! Hardware-style impairments: sample-rate and carrier-frequency offsets
//! that wander as bounded random walks.

use std::f64::consts::PI;

use num_complex::Complex32;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use super::ChannelModel;

/// Gaussian random walk reflected back inside `[-max_dev, max_dev]`.
pub struct RandomWalk {
    rng: StdRng,
    std_dev: f64,
    max_dev: f64,
    value: f64,
}

impl RandomWalk {
    pub fn new(std_dev: f64, max_dev: f64, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            std_dev,
            max_dev,
            value: 0.0,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn advance(&mut self) -> f64 {
        let step: f64 = self.rng.sample(StandardNormal);
        self.value += step * self.std_dev;
        if self.value > self.max_dev {
            self.value = 2.0 * self.max_dev - self.value;
        } else if self.value < -self.max_dev {
            self.value = -2.0 * self.max_dev - self.value;
        }
        self.value
    }
}

/// Resamples by `1 + offset / sample_rate` with linear interpolation,
/// the offset in Hz drifting per input sample.
pub struct SampleRateOffset {
    walk: RandomWalk,
    sample_rate: f64,
    prev: Complex32,
    mu: f64,
}

impl SampleRateOffset {
    pub fn new(std_dev_hz: f64, max_dev_hz: f64, sample_rate: f64, seed: u64) -> Self {
        Self {
            walk: RandomWalk::new(std_dev_hz, max_dev_hz, seed),
            sample_rate,
            prev: Complex32::new(0.0, 0.0),
            mu: 0.0,
        }
    }
}

impl ChannelModel for SampleRateOffset {
    fn process(&mut self, input: &[Complex32], out: &mut Vec<Complex32>) {
        out.reserve(input.len() + 1);
        for &x in input {
            let step = 1.0 + self.walk.advance() / self.sample_rate;
            while self.mu < 1.0 {
                out.push(self.prev + (x - self.prev) * self.mu as f32);
                self.mu += step;
            }
            self.mu -= 1.0;
            self.prev = x;
        }
    }
}

/// Rotates the signal by a drifting carrier offset in Hz.
pub struct CarrierOffset {
    walk: RandomWalk,
    sample_rate: f64,
    phase: f64,
}

impl CarrierOffset {
    pub fn new(std_dev_hz: f64, max_dev_hz: f64, sample_rate: f64, seed: u64) -> Self {
        Self {
            walk: RandomWalk::new(std_dev_hz, max_dev_hz, seed),
            sample_rate,
            phase: 0.0,
        }
    }
}

impl ChannelModel for CarrierOffset {
    fn process(&mut self, input: &[Complex32], out: &mut Vec<Complex32>) {
        out.reserve(input.len());
        for &x in input {
            let offset = self.walk.advance();
            let step = 2.0 * PI * offset / self.sample_rate;
            self.phase = (self.phase + step).rem_euclid(2.0 * PI);
            out.push(x * Complex32::from_polar(1.0, self.phase as f32));
        }
    }
}
