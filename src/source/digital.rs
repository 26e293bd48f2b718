//! Symbol-mapped, FSK and CPFSK generators.

use std::f32::consts::PI;

use num_complex::Complex32;

use super::BlockGenerator;
use super::bits::BitGroups;
use super::filter::{Fir, convolve, gaussian_taps, rrc_taps};
use crate::constellation::ConstellationSpec;

const RRC_SPAN_SYMBOLS: usize = 5;

/// Maps random bit groups through a constellation and pulse-shapes them
/// with a root-raised-cosine interpolator.
pub struct ConstellationGenerator {
    label: String,
    constellation: ConstellationSpec,
    bits: BitGroups,
    filter: Fir<Complex32>,
    samples_per_symbol: usize,
}

impl ConstellationGenerator {
    pub fn new(
        label: &str,
        constellation: ConstellationSpec,
        samples_per_symbol: usize,
        excess_bw: f64,
        seed: u64,
    ) -> Self {
        let bits = BitGroups::new(constellation.bits_per_symbol(), seed);
        let taps = rrc_taps(samples_per_symbol, excess_bw, RRC_SPAN_SYMBOLS)
            .iter()
            .map(|h| h * samples_per_symbol as f32)
            .collect();
        Self {
            label: label.to_string(),
            constellation,
            bits,
            filter: Fir::new(taps),
            samples_per_symbol,
        }
    }

    pub fn constellation(&self) -> &ConstellationSpec {
        &self.constellation
    }
}

impl BlockGenerator for ConstellationGenerator {
    fn label(&self) -> &str {
        &self.label
    }

    fn next_block(&mut self, out: &mut Vec<Complex32>) {
        let point = self.constellation.modulate(self.bits.next_group());
        let symbol = Complex32::new(point.re as f32, point.im as f32);
        out.push(self.filter.push(symbol));
        for _ in 1..self.samples_per_symbol {
            out.push(self.filter.push(Complex32::new(0.0, 0.0)));
        }
    }
}

/// Continuous-phase frequency modulator: phase advances by `sensitivity * x`.
#[derive(Debug, Clone, Default)]
struct FrequencyModulator {
    sensitivity: f32,
    phase: f32,
}

impl FrequencyModulator {
    fn new(sensitivity: f32) -> Self {
        Self {
            sensitivity,
            phase: 0.0,
        }
    }

    fn modulate(&mut self, x: f32) -> Complex32 {
        self.phase = (self.phase + self.sensitivity * x).rem_euclid(2.0 * PI);
        Complex32::from_polar(1.0, self.phase)
    }
}

/// Gaussian-filtered M-ary FSK.
pub struct GfskGenerator {
    label: String,
    bits: BitGroups,
    levels: Vec<f32>,
    filter: Fir<f32>,
    modulator: FrequencyModulator,
    samples_per_symbol: usize,
}

impl GfskGenerator {
    pub fn new(
        label: &str,
        bits_per_symbol: usize,
        samples_per_symbol: usize,
        seed: u64,
    ) -> Self {
        let order = 1usize << bits_per_symbol;
        let levels = (0..order)
            .map(|k| -2.0 + 4.0 * k as f32 / (order - 1) as f32)
            .collect();
        let gaussian =
            gaussian_taps(1.0, samples_per_symbol, 0.35, 4 * samples_per_symbol);
        let taps = convolve(&gaussian, &vec![1.0; samples_per_symbol]);
        Self {
            label: label.to_string(),
            bits: BitGroups::new(bits_per_symbol, seed),
            levels,
            filter: Fir::new(taps),
            modulator: FrequencyModulator::new(1.0),
            samples_per_symbol,
        }
    }

    pub fn levels(&self) -> &[f32] {
        &self.levels
    }
}

impl BlockGenerator for GfskGenerator {
    fn label(&self) -> &str {
        &self.label
    }

    fn next_block(&mut self, out: &mut Vec<Complex32>) {
        let level = self.levels[self.bits.next_group()];
        for i in 0..self.samples_per_symbol {
            let x = if i == 0 { level } else { 0.0 };
            let shaped = self.filter.push(x);
            out.push(self.modulator.modulate(shaped));
        }
    }
}

/// Continuous-phase FSK with a symmetric frequency ladder around the mid level.
pub struct CpfskGenerator {
    label: String,
    bits: BitGroups,
    freq: f32,
    amplitude: f32,
    phase: f32,
    mid: usize,
    samples_per_symbol: usize,
}

impl CpfskGenerator {
    pub fn new(
        label: &str,
        k: f32,
        amplitude: f32,
        samples_per_symbol: usize,
        bits_per_symbol: usize,
        seed: u64,
    ) -> Self {
        Self {
            label: label.to_string(),
            bits: BitGroups::new(bits_per_symbol, seed),
            freq: k * PI / (samples_per_symbol * bits_per_symbol) as f32,
            amplitude,
            phase: 0.0,
            mid: 1 << (bits_per_symbol - 1),
            samples_per_symbol,
        }
    }

    /// Per-sample phase step for a symbol value.
    fn phase_step(&self, symbol: usize) -> f32 {
        if symbol >= self.mid {
            (symbol - self.mid + 1) as f32 * self.freq
        } else {
            -((self.mid - symbol) as f32) * self.freq
        }
    }
}

impl BlockGenerator for CpfskGenerator {
    fn label(&self) -> &str {
        &self.label
    }

    fn next_block(&mut self, out: &mut Vec<Complex32>) {
        let symbol = self.bits.next_group();
        let step = self.phase_step(symbol);
        for _ in 0..self.samples_per_symbol {
            self.phase = (self.phase + step).rem_euclid(2.0 * PI);
            out.push(Complex32::from_polar(self.amplitude, self.phase));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constellation::schemes;
    use crate::source::{BlockSource, take};

    #[test]
    fn test_constellation_generator_block_length() {
        let mut generator =
            ConstellationGenerator::new("bpsk", schemes::bpsk().unwrap(), 2, 0.35, 1);
        let mut block = Vec::new();
        generator.next_block(&mut block);
        assert_eq!(block.len(), 2);
    }

    #[test]
    fn test_constellation_generator_has_energy() {
        let generator =
            ConstellationGenerator::new("qpsk", schemes::qpsk().unwrap(), 2, 0.35, 5);
        let mut source = BlockSource::new(generator);
        let samples = take(&mut source, 512);
        let power: f32 = samples
            .iter()
            .map(|s| s.norm_sqr())
            .sum::<f32>()
            / 512.0;
        assert!(power > 0.1, "power {}", power);
    }

    #[test]
    fn test_gfsk_levels() {
        let generator = GfskGenerator::new("4gfsk", 2, 8, 1);
        let expected = [-2.0, -2.0 / 3.0, 2.0 / 3.0, 2.0];
        for (level, want) in generator.levels().iter().zip(expected) {
            assert!((level - want).abs() < 1e-6);
        }
    }

    #[test]
    fn test_gfsk_constant_envelope() {
        let mut source = BlockSource::new(GfskGenerator::new("2gfsk", 1, 8, 3));
        for s in take(&mut source, 256) {
            assert!((s.norm() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_cpfsk_phase_steps() {
        let generator = CpfskGenerator::new("4cpfsk", 0.5, 1.0, 8, 2, 1);
        let freq = 0.5 * PI / 16.0;
        assert!((generator.phase_step(0) + 2.0 * freq).abs() < 1e-6);
        assert!((generator.phase_step(1) + freq).abs() < 1e-6);
        assert!((generator.phase_step(2) - freq).abs() < 1e-6);
        assert!((generator.phase_step(3) - 2.0 * freq).abs() < 1e-6);
    }

    #[test]
    fn test_cpfsk_amplitude() {
        let generator = CpfskGenerator::new("2cpfsk", 0.5, 1.0, 8, 1, 2);
        let mut source = BlockSource::new(generator);
        for s in take(&mut source, 64) {
            assert!((s.norm() - 1.0).abs() < 1e-5);
        }
    }
}
