//! Linear-FM radar chirps.

use std::f32::consts::PI;

use num_complex::Complex32;

use super::BlockGenerator;

/// Instantaneous-frequency profile over one chirp period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChirpShape {
    /// Single up-ramp from -0.5 to 0.5, then wrap.
    Sawtooth,
    /// Up-ramp over the first half, down-ramp over the second.
    Triangle,
    /// Frequency held at -0.5 then +0.5 for half a period each.
    Squarewave,
}

impl ChirpShape {
    /// Frequency-control values for one period of `len` samples.
    pub fn profile(&self, len: usize) -> Vec<f32> {
        let ramp = |n: usize, from: f32, to: f32| -> Vec<f32> {
            if n < 2 {
                return vec![from; n];
            }
            (0..n)
                .map(|i| from + (to - from) * i as f32 / (n - 1) as f32)
                .collect()
        };
        match self {
            ChirpShape::Sawtooth => ramp(len, -0.5, 0.5),
            ChirpShape::Triangle => {
                let mut v = ramp(len / 2, -0.5, 0.5);
                v.extend(ramp(len - len / 2, 0.5, -0.5));
                v
            }
            ChirpShape::Squarewave => {
                let mut v = vec![-0.5; len / 2];
                v.extend(std::iter::repeat_n(0.5, len - len / 2));
                v
            }
        }
    }
}

/// Repeating frequency-modulated chirp with sensitivity π.
pub struct LfmGenerator {
    label: String,
    profile: Vec<f32>,
    phase: f32,
}

impl LfmGenerator {
    pub fn new(label: &str, shape: ChirpShape, chirp_len: usize) -> Self {
        Self {
            label: label.to_string(),
            profile: shape.profile(chirp_len),
            phase: 0.0,
        }
    }
}

impl BlockGenerator for LfmGenerator {
    fn label(&self) -> &str {
        &self.label
    }

    fn next_block(&mut self, out: &mut Vec<Complex32>) {
        out.reserve(self.profile.len());
        for &f in &self.profile {
            self.phase = (self.phase + PI * f).rem_euclid(2.0 * PI);
            out.push(Complex32::from_polar(1.0, self.phase));
        }
    }
}
