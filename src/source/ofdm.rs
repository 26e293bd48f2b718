use std::sync::Arc;

use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};

use super::BlockGenerator;
use super::bits::BitGroups;
use crate::constellation::ConstellationSpec;

/// OFDM with `fft_len / 2` active carriers centred between two guard bands
/// of `fft_len / 4` null carriers, followed by a cyclic prefix of
/// `fft_len / 4` samples.
pub struct OfdmGenerator {
    label: String,
    constellation: ConstellationSpec,
    bits: BitGroups,
    fft_len: usize,
    ifft: Arc<dyn Fft<f32>>,
    scale: f32,
}

impl OfdmGenerator {
    pub fn new(
        label: &str,
        constellation: ConstellationSpec,
        fft_len: usize,
        seed: u64,
    ) -> Self {
        assert!(fft_len >= 4 && fft_len % 4 == 0, "fft length must be a multiple of 4");
        let bits = BitGroups::new(constellation.bits_per_symbol(), seed);
        let ifft = FftPlanner::<f32>::new().plan_fft_inverse(fft_len);
        Self {
            label: label.to_string(),
            constellation,
            bits,
            fft_len,
            ifft,
            scale: 1.0 / (fft_len as f32 / 2.0).sqrt(),
        }
    }

    pub fn active_carriers(&self) -> usize {
        self.fft_len / 2
    }

    pub fn cyclic_prefix_len(&self) -> usize {
        self.fft_len / 4
    }

    pub fn symbol_len(&self) -> usize {
        self.fft_len + self.cyclic_prefix_len()
    }
}

impl BlockGenerator for OfdmGenerator {
    fn label(&self) -> &str {
        &self.label
    }

    fn next_block(&mut self, out: &mut Vec<Complex32>) {
        let n = self.fft_len;
        let guard = n / 4;

        // carriers laid out low-to-high, then shifted so DC sits at bin 0
        let mut carriers = vec![Complex32::new(0.0, 0.0); n];
        for slot in carriers.iter_mut().skip(guard).take(n / 2) {
            let point = self.constellation.modulate(self.bits.next_group());
            *slot = Complex32::new(point.re as f32, point.im as f32);
        }
        carriers.rotate_left(n / 2);

        self.ifft.process(&mut carriers);

        let cp = self.cyclic_prefix_len();
        out.reserve(n + cp);
        out.extend(carriers[n - cp..].iter().map(|s| *s * self.scale));
        out.extend(carriers.iter().map(|s| *s * self.scale));
    }
}
