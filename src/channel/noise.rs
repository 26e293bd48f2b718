//! Additive white Gaussian noise.

use num_complex::Complex32;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use super::ChannelModel;

/// Complex AWGN at a fixed amplitude, split evenly between I and Q.
pub struct AdditiveNoise {
    rng: StdRng,
    /// Per-component standard deviation.
    std_dev: f32,
}

impl AdditiveNoise {
    /// Noise amplitude `sqrt(10^(-snr_db/10))` relative to a unit-power signal.
    pub fn from_snr_db(snr_db: f32, seed: u64) -> Self {
        Self::with_amplitude(noise_amplitude(snr_db), seed)
    }

    pub fn with_amplitude(amplitude: f32, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            std_dev: amplitude / std::f32::consts::SQRT_2,
        }
    }

    /// Total noise power `E|n|^2`.
    pub fn power(&self) -> f32 {
        2.0 * self.std_dev * self.std_dev
    }

    pub fn next_sample(&mut self) -> Complex32 {
        let re: f32 = self.rng.sample(StandardNormal);
        let im: f32 = self.rng.sample(StandardNormal);
        Complex32::new(re * self.std_dev, im * self.std_dev)
    }
}

impl ChannelModel for AdditiveNoise {
    fn process(&mut self, input: &[Complex32], out: &mut Vec<Complex32>) {
        out.reserve(input.len());
        for &x in input {
            let n = self.next_sample();
            out.push(x + n);
        }
    }
}

pub fn noise_amplitude(snr_db: f32) -> f32 {
    10f32.powf(-snr_db / 10.0).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amplitude_from_snr() {
        assert!((noise_amplitude(0.0) - 1.0).abs() < 1e-6);
        assert!((noise_amplitude(20.0) - 0.1).abs() < 1e-6);
        assert!((noise_amplitude(-20.0) - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_noise_power_matches_snr() {
        let mut noise = AdditiveNoise::from_snr_db(10.0, 42);
        let n = 50_000;
        let power: f32 = (0..n)
            .map(|_| noise.next_sample().norm_sqr())
            .sum::<f32>()
            / n as f32;
        assert!((power - 0.1).abs() / 0.1 < 0.05, "measured power {}", power);
        assert!((noise.power() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_noise_deterministic() {
        let mut a = AdditiveNoise::from_snr_db(0.0, 7);
        let mut b = AdditiveNoise::from_snr_db(0.0, 7);
        for _ in 0..100 {
            assert_eq!(a.next_sample(), b.next_sample());
        }
    }
}
