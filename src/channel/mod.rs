//! Channel impairments applied between a waveform source and the capture.
//!
//! Every channel is a chain of [`ChannelModel`] stages. All non-trivial
//! chains end with [`AdditiveNoise`] at the requested SNR; the radio
//! variants prepend sample-rate and carrier offsets to the fading stage.

pub mod fading;
pub mod noise;
pub mod radio;

use std::fmt;
use std::str::FromStr;

use num_complex::Complex32;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub use fading::{FlatFading, SelectiveFading, SosFader};
pub use noise::{AdditiveNoise, noise_amplitude};
pub use radio::{CarrierOffset, RandomWalk, SampleRateOffset};

use crate::error::ConfigError;
use crate::utils::consts::{
    CFO_MAXDEV, CFO_STDEV, FADING_MAX_DOPPLER, FADING_SINUSOIDS, PDP_DELAYS,
    PDP_MAGNITUDES, PDP_TAPS, RADIO_MAX_DOPPLER_HZ, SAMPLE_RATE, SRO_MAXDEV,
    SRO_STDEV,
};

/// A stateful stream transform. Output length may differ from input
/// length when a stage resamples.
pub trait ChannelModel: Send {
    fn process(&mut self, input: &[Complex32], out: &mut Vec<Complex32>);
}

/// Stages run in order, ping-ponging between two scratch buffers.
pub struct ChannelChain {
    stages: Vec<Box<dyn ChannelModel>>,
    scratch: Vec<Complex32>,
}

impl ChannelChain {
    pub fn new(stages: Vec<Box<dyn ChannelModel>>) -> Self {
        Self {
            stages,
            scratch: Vec::new(),
        }
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl ChannelModel for ChannelChain {
    fn process(&mut self, input: &[Complex32], out: &mut Vec<Complex32>) {
        let Some((last, head)) = self.stages.split_last_mut() else {
            out.extend_from_slice(input);
            return;
        };

        let mut current = input.to_vec();
        for stage in head {
            self.scratch.clear();
            stage.process(&current, &mut self.scratch);
            std::mem::swap(&mut current, &mut self.scratch);
        }
        last.process(&current, out);
    }
}

/// The named channel configurations a sweep can run under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Pass-through, no noise.
    #[default]
    None,
    Awgn,
    FlatFading,
    SelectiveFading,
    RadioAwgn,
    RadioFlatFading,
    RadioSelectiveFading,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 7] = [
        ChannelKind::None,
        ChannelKind::Awgn,
        ChannelKind::FlatFading,
        ChannelKind::SelectiveFading,
        ChannelKind::RadioAwgn,
        ChannelKind::RadioFlatFading,
        ChannelKind::RadioSelectiveFading,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ChannelKind::None => "none",
            ChannelKind::Awgn => "awgn",
            ChannelKind::FlatFading => "flat_fading",
            ChannelKind::SelectiveFading => "selective_fading",
            ChannelKind::RadioAwgn => "radio_awgn",
            ChannelKind::RadioFlatFading => "radio_flat_fading",
            ChannelKind::RadioSelectiveFading => "radio_selective_fading",
        }
    }

    /// Build the stage chain for one job. Each stage gets its own seed
    /// drawn from `seed`.
    pub fn build(&self, snr_db: f32, seed: u64) -> ChannelChain {
        let mut seeds = StdRng::seed_from_u64(seed);
        let fs = SAMPLE_RATE as f64;
        let mut stages: Vec<Box<dyn ChannelModel>> = Vec::new();

        match self {
            ChannelKind::None => return ChannelChain::new(stages),
            ChannelKind::Awgn => {}
            ChannelKind::FlatFading => stages.push(Box::new(FlatFading::new(
                FADING_SINUSOIDS,
                FADING_MAX_DOPPLER,
                seeds.random(),
            ))),
            ChannelKind::SelectiveFading => stages.push(Box::new(SelectiveFading::new(
                FADING_SINUSOIDS,
                FADING_MAX_DOPPLER,
                &PDP_DELAYS,
                &PDP_MAGNITUDES,
                PDP_TAPS,
                seeds.random(),
            ))),
            ChannelKind::RadioAwgn
            | ChannelKind::RadioFlatFading
            | ChannelKind::RadioSelectiveFading => {
                stages.push(Box::new(SampleRateOffset::new(
                    SRO_STDEV,
                    SRO_MAXDEV,
                    fs,
                    seeds.random(),
                )));
                stages.push(Box::new(CarrierOffset::new(
                    CFO_STDEV,
                    CFO_MAXDEV,
                    fs,
                    seeds.random(),
                )));
                // a one-tap response cannot carry a delay, so the single
                // path sits at zero delay
                let fading: Box<dyn ChannelModel> = match self {
                    ChannelKind::RadioAwgn => {
                        Box::new(FlatFading::new(FADING_SINUSOIDS, 0.0, seeds.random()))
                    }
                    ChannelKind::RadioFlatFading => Box::new(FlatFading::new(
                        FADING_SINUSOIDS,
                        RADIO_MAX_DOPPLER_HZ / fs,
                        seeds.random(),
                    )),
                    _ => Box::new(SelectiveFading::new(
                        FADING_SINUSOIDS,
                        RADIO_MAX_DOPPLER_HZ / fs,
                        &PDP_DELAYS,
                        &PDP_MAGNITUDES,
                        PDP_TAPS,
                        seeds.random(),
                    )),
                };
                stages.push(fading);
            }
        }

        stages.push(Box::new(AdditiveNoise::from_snr_db(snr_db, seeds.random())));
        ChannelChain::new(stages)
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChannelKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(ChannelKind::None);
        }
        ChannelKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ConfigError::UnknownChannel(s.to_string()))
    }
}
