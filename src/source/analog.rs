//! Analog data-bearing transmitters driven by Gaussian "audio".

use std::collections::VecDeque;
use std::f32::consts::PI;

use num_complex::Complex32;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use super::BlockGenerator;
use super::filter::{Fir, hilbert_taps};
use crate::utils::consts::{AUDIO_RATE, SAMPLE_RATE, WBFM_DEVIATION_HZ, WBFM_QUAD_RATE};

const BLOCK_LEN: usize = 64;
const HILBERT_TAPS: usize = 401;

/// Gaussian noise at the audio rate, linearly interpolated to an output rate.
struct AudioNoise {
    rng: StdRng,
    prev: f32,
    next: f32,
    position: f32,
    step: f32,
}

impl AudioNoise {
    fn new(audio_rate: f32, output_rate: f32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let prev = rng.sample(StandardNormal);
        let next = rng.sample(StandardNormal);
        Self {
            rng,
            prev,
            next,
            position: 0.0,
            step: audio_rate / output_rate,
        }
    }

    fn next_sample(&mut self) -> f32 {
        while self.position >= 1.0 {
            self.prev = self.next;
            self.next = self.rng.sample(StandardNormal);
            self.position -= 1.0;
        }
        let value = self.prev + (self.next - self.prev) * self.position;
        self.position += self.step;
        value
    }
}

/// Double-sideband AM with carrier: `1 + a(t)`.
pub struct AmDsbGenerator {
    label: String,
    audio: AudioNoise,
}

impl AmDsbGenerator {
    pub fn new(label: &str, seed: u64) -> Self {
        Self {
            label: label.to_string(),
            audio: AudioNoise::new(AUDIO_RATE, SAMPLE_RATE, seed),
        }
    }
}

impl BlockGenerator for AmDsbGenerator {
    fn label(&self) -> &str {
        &self.label
    }

    fn next_block(&mut self, out: &mut Vec<Complex32>) {
        for _ in 0..BLOCK_LEN {
            out.push(Complex32::new(1.0 + self.audio.next_sample(), 0.0));
        }
    }
}

/// Single-sideband AM: the analytic signal of `1 + a(t)`.
pub struct AmSsbGenerator {
    label: String,
    audio: AudioNoise,
    hilbert: Fir<f32>,
    delay: VecDeque<f32>,
}

impl AmSsbGenerator {
    pub fn new(label: &str, seed: u64) -> Self {
        let hilbert = Fir::new(hilbert_taps(HILBERT_TAPS));
        let delay = std::iter::repeat_n(0.0, hilbert.group_delay()).collect();
        Self {
            label: label.to_string(),
            audio: AudioNoise::new(AUDIO_RATE, SAMPLE_RATE, seed),
            hilbert,
            delay,
        }
    }
}

impl BlockGenerator for AmSsbGenerator {
    fn label(&self) -> &str {
        &self.label
    }

    fn next_block(&mut self, out: &mut Vec<Complex32>) {
        for _ in 0..BLOCK_LEN {
            let x = 1.0 + self.audio.next_sample();
            let quadrature = self.hilbert.push(x);
            self.delay.push_back(x);
            let in_phase = self.delay.pop_front().unwrap_or(x);
            out.push(Complex32::new(in_phase, quadrature));
        }
    }
}

/// Wideband FM at the broadcast quadrature rate.
pub struct WbfmGenerator {
    label: String,
    audio: AudioNoise,
    sensitivity: f32,
    phase: f32,
}

impl WbfmGenerator {
    pub fn new(label: &str, seed: u64) -> Self {
        Self {
            label: label.to_string(),
            audio: AudioNoise::new(AUDIO_RATE, WBFM_QUAD_RATE, seed),
            sensitivity: 2.0 * PI * WBFM_DEVIATION_HZ / WBFM_QUAD_RATE,
            phase: 0.0,
        }
    }
}

impl BlockGenerator for WbfmGenerator {
    fn label(&self) -> &str {
        &self.label
    }

    fn next_block(&mut self, out: &mut Vec<Complex32>) {
        for _ in 0..BLOCK_LEN {
            let step = self.sensitivity * self.audio.next_sample();
            self.phase = (self.phase + step).rem_euclid(2.0 * PI);
            out.push(Complex32::from_polar(1.0, self.phase));
        }
    }
}
