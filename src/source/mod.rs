//! Waveform generators.
//!
//! Every modulation is exposed as an infinite, pull-based stream of
//! unit-rate complex samples. The sweep sampler only sees the
//! [`WaveformSource`] trait.

pub mod analog;
pub mod bits;
pub mod digital;
pub mod filter;
pub mod ofdm;
pub mod radar;

use num_complex::Complex32;

pub use analog::{AmDsbGenerator, AmSsbGenerator, WbfmGenerator};
pub use digital::{ConstellationGenerator, CpfskGenerator, GfskGenerator};
pub use ofdm::OfdmGenerator;
pub use radar::{ChirpShape, LfmGenerator};

/// Pull-based complex sample stream.
pub trait WaveformSource: Send {
    fn label(&self) -> &str;

    /// Write up to `out.len()` samples and return how many were produced.
    /// Returning 0 means no samples are available right now.
    fn work(&mut self, out: &mut [Complex32]) -> usize;
}

/// Generator that naturally produces whole blocks (a symbol, an OFDM frame).
pub trait BlockGenerator: Send {
    fn label(&self) -> &str;

    /// Append the next block of samples to `out`.
    fn next_block(&mut self, out: &mut Vec<Complex32>);
}

/// Adapts a [`BlockGenerator`] to the sample-granular [`WaveformSource`].
pub struct BlockSource<G> {
    generator: G,
    pending: Vec<Complex32>,
    cursor: usize,
}

impl<G: BlockGenerator> BlockSource<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            pending: Vec::new(),
            cursor: 0,
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }
}

impl<G: BlockGenerator> WaveformSource for BlockSource<G> {
    fn label(&self) -> &str {
        self.generator.label()
    }

    fn work(&mut self, out: &mut [Complex32]) -> usize {
        let mut written = 0;
        while written < out.len() {
            if self.cursor == self.pending.len() {
                self.pending.clear();
                self.cursor = 0;
                self.generator.next_block(&mut self.pending);
                if self.pending.is_empty() {
                    break;
                }
            }
            let n = (out.len() - written).min(self.pending.len() - self.cursor);
            out[written..written + n]
                .copy_from_slice(&self.pending[self.cursor..self.cursor + n]);
            self.cursor += n;
            written += n;
        }
        written
    }
}

/// Pull exactly `n` samples from a source, mainly for inspection and tests.
pub fn take(source: &mut dyn WaveformSource, n: usize) -> Vec<Complex32> {
    let mut out = vec![Complex32::new(0.0, 0.0); n];
    let mut filled = 0;
    while filled < n {
        let produced = source.work(&mut out[filled..]);
        if produced == 0 {
            break;
        }
        filled += produced;
    }
    out.truncate(filled);
    out
}
