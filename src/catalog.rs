//! Modulation registry: every transmitter the sweep can sample, the named
//! dataset groups, and the two-level family hierarchy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constellation::Scheme;
use crate::error::{ConfigError, ConstellationError};
use crate::source::{
    AmDsbGenerator, AmSsbGenerator, BlockSource, ChirpShape,
    ConstellationGenerator, CpfskGenerator, GfskGenerator, LfmGenerator,
    OfdmGenerator, WaveformSource, WbfmGenerator,
};
use crate::utils::consts::{
    CHIRP_LEN, CONSTELLATION_SPS, CPFSK_INDEX, FSK_SPS, RRC_EXCESS_BW,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Modulation {
    Ook,
    Bpsk,
    Ask4,
    Pam4,
    Pam8,
    Ask8,
    Psk8,
    Qam8Circular,
    Qam8Rect,
    Qam8Cross,
    Qam16,
    Psk16,
    Qam32Cross,
    Qam32Rect,
    Qam64,
    Gfsk2,
    Gfsk4,
    Gfsk8,
    Cpfsk2,
    Cpfsk4,
    Cpfsk8,
    Ofdm16Bpsk,
    Ofdm32Bpsk,
    Ofdm64Bpsk,
    Ofdm16Qpsk,
    Ofdm32Qpsk,
    Ofdm64Qpsk,
    AmDsb,
    AmSsb,
    Wbfm,
    LfmSawtooth,
    LfmTriangle,
    LfmSquarewave,
}

use Modulation::*;

impl Modulation {
    pub const ALL: [Modulation; 33] = [
        Ook, Bpsk, Ask4, Pam4, Pam8, Ask8, Psk8, Qam8Circular, Qam8Rect,
        Qam8Cross, Qam16, Psk16, Qam32Cross, Qam32Rect, Qam64, Gfsk2, Gfsk4,
        Gfsk8, Cpfsk2, Cpfsk4, Cpfsk8, Ofdm16Bpsk, Ofdm32Bpsk, Ofdm64Bpsk,
        Ofdm16Qpsk, Ofdm32Qpsk, Ofdm64Qpsk, AmDsb, AmSsb, Wbfm, LfmSawtooth,
        LfmTriangle, LfmSquarewave,
    ];

    /// The label written into the dataset's `mod_name` column.
    pub fn label(&self) -> &'static str {
        match self {
            Ook => "ook",
            Bpsk => "bpsk",
            Ask4 => "4ask",
            Pam4 => "4pam",
            Pam8 => "8pam",
            Ask8 => "8ask",
            Psk8 => "8psk",
            Qam8Circular => "8qam_circular",
            Qam8Rect => "8qam_rect",
            Qam8Cross => "8qam_cross",
            Qam16 => "16qam",
            Psk16 => "16psk",
            Qam32Cross => "32qam_cross",
            Qam32Rect => "32qam_rect",
            Qam64 => "64qam",
            Gfsk2 => "2gfsk",
            Gfsk4 => "4gfsk",
            Gfsk8 => "8gfsk",
            Cpfsk2 => "2cpfsk",
            Cpfsk4 => "4cpfsk",
            Cpfsk8 => "8cpfsk",
            Ofdm16Bpsk => "ofdm-16-bpsk",
            Ofdm32Bpsk => "ofdm-32-bpsk",
            Ofdm64Bpsk => "ofdm-64-bpsk",
            Ofdm16Qpsk => "ofdm-16-qpsk",
            Ofdm32Qpsk => "ofdm-32-qpsk",
            Ofdm64Qpsk => "ofdm-64-qpsk",
            AmDsb => "am-dsb",
            AmSsb => "am-ssb",
            Wbfm => "wbfm",
            LfmSawtooth => "lfm_sawtooth",
            LfmTriangle => "lfm_triangle",
            LfmSquarewave => "lfm_squarewave",
        }
    }

    pub fn family(&self) -> Family {
        match self {
            LfmSawtooth | LfmTriangle | LfmSquarewave => Family::Radar,
            AmDsb | AmSsb | Wbfm => Family::DataBearing,
            Gfsk2 | Gfsk4 | Gfsk8 | Cpfsk2 | Cpfsk4 | Cpfsk8 => Family::Fsk,
            Ofdm16Bpsk | Ofdm32Bpsk | Ofdm64Bpsk | Ofdm16Qpsk | Ofdm32Qpsk
            | Ofdm64Qpsk => Family::Ofdm,
            _ => Family::Constellation,
        }
    }

    /// Constellation behind a symbol-mapped modulation.
    pub fn scheme(&self) -> Option<Scheme> {
        let scheme = match self {
            Ook => Scheme::Ook,
            Bpsk => Scheme::Bpsk,
            Ask4 => Scheme::Ask4,
            Pam4 => Scheme::Pam4,
            Pam8 => Scheme::Pam8,
            Ask8 => Scheme::Ask8,
            Psk8 => Scheme::Psk8,
            Qam8Circular => Scheme::Qam8Circular,
            Qam8Rect => Scheme::Qam8Rect,
            Qam8Cross => Scheme::Qam8Cross,
            Qam16 => Scheme::Qam16,
            Psk16 => Scheme::Psk16,
            Qam32Cross => Scheme::Qam32Cross,
            Qam32Rect => Scheme::Qam32Rect,
            Qam64 => Scheme::Qam64,
            _ => return None,
        };
        Some(scheme)
    }

    /// FFT length and carrier constellation of the OFDM variants. The
    /// label counts active carriers, which is half the FFT length.
    fn ofdm(&self) -> Option<(usize, Scheme)> {
        match self {
            Ofdm16Bpsk => Some((32, Scheme::Bpsk)),
            Ofdm32Bpsk => Some((64, Scheme::Bpsk)),
            Ofdm64Bpsk => Some((128, Scheme::Bpsk)),
            Ofdm16Qpsk => Some((32, Scheme::Qpsk)),
            Ofdm32Qpsk => Some((64, Scheme::Qpsk)),
            Ofdm64Qpsk => Some((128, Scheme::Qpsk)),
            _ => None,
        }
    }

    /// Bits per symbol of the FSK variants.
    fn fsk_bits(&self) -> Option<usize> {
        match self {
            Gfsk2 | Cpfsk2 => Some(1),
            Gfsk4 | Cpfsk4 => Some(2),
            Gfsk8 | Cpfsk8 => Some(3),
            _ => None,
        }
    }

    /// A fresh, independently seeded transmitter for this modulation.
    pub fn build_source(
        &self,
        seed: u64,
    ) -> Result<Box<dyn WaveformSource>, ConstellationError> {
        let label = self.label();

        if let Some(scheme) = self.scheme() {
            return Ok(Box::new(BlockSource::new(ConstellationGenerator::new(
                label,
                scheme.build()?,
                CONSTELLATION_SPS,
                RRC_EXCESS_BW,
                seed,
            ))));
        }
        if let Some((fft_len, scheme)) = self.ofdm() {
            return Ok(Box::new(BlockSource::new(OfdmGenerator::new(
                label,
                scheme.build()?,
                fft_len,
                seed,
            ))));
        }

        let source: Box<dyn WaveformSource> = match self {
            Gfsk2 | Gfsk4 | Gfsk8 => Box::new(BlockSource::new(GfskGenerator::new(
                label,
                self.fsk_bits().unwrap_or(1),
                FSK_SPS,
                seed,
            ))),
            Cpfsk2 | Cpfsk4 | Cpfsk8 => Box::new(BlockSource::new(CpfskGenerator::new(
                label,
                CPFSK_INDEX,
                1.0,
                FSK_SPS,
                self.fsk_bits().unwrap_or(1),
                seed,
            ))),
            AmDsb => Box::new(BlockSource::new(AmDsbGenerator::new(label, seed))),
            AmSsb => Box::new(BlockSource::new(AmSsbGenerator::new(label, seed))),
            Wbfm => Box::new(BlockSource::new(WbfmGenerator::new(label, seed))),
            LfmTriangle => Box::new(BlockSource::new(LfmGenerator::new(
                label,
                ChirpShape::Triangle,
                CHIRP_LEN,
            ))),
            LfmSquarewave => Box::new(BlockSource::new(LfmGenerator::new(
                label,
                ChirpShape::Squarewave,
                CHIRP_LEN,
            ))),
            _ => Box::new(BlockSource::new(LfmGenerator::new(
                label,
                ChirpShape::Sawtooth,
                CHIRP_LEN,
            ))),
        };
        Ok(source)
    }
}

impl fmt::Display for Modulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Modulation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Modulation::ALL
            .iter()
            .copied()
            .find(|m| m.label() == s)
            .ok_or_else(|| ConfigError::UnknownModulation(s.to_string()))
    }
}

impl TryFrom<String> for Modulation {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Modulation> for String {
    fn from(value: Modulation) -> Self {
        value.label().to_string()
    }
}

/// Second level of the modulation hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Radar,
    DataBearing,
    Constellation,
    Fsk,
    Ofdm,
}

impl Family {
    pub const ALL: [Family; 5] = [
        Family::Radar,
        Family::DataBearing,
        Family::Constellation,
        Family::Fsk,
        Family::Ofdm,
    ];

    /// Top level: `analog` or `digital`.
    pub fn domain(&self) -> &'static str {
        match self {
            Family::Radar | Family::DataBearing => "analog",
            _ => "digital",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Family::Radar => "radar",
            Family::DataBearing => "data-bearing",
            Family::Constellation => "constellation",
            Family::Fsk => "fsk",
            Family::Ofdm => "ofdm",
        }
    }

    pub fn members(&self) -> Vec<Modulation> {
        Modulation::ALL
            .iter()
            .copied()
            .filter(|m| m.family() == *self)
            .collect()
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.domain(), self.name())
    }
}

/// `domain -> family -> modulations`, in presentation order.
pub fn hierarchy() -> Vec<(&'static str, Vec<(Family, Vec<Modulation>)>)> {
    let mut tree: Vec<(&'static str, Vec<(Family, Vec<Modulation>)>)> = Vec::new();
    for family in Family::ALL {
        let entry = (family, family.members());
        match tree.iter_mut().find(|(domain, _)| *domain == family.domain()) {
            Some((_, families)) => families.push(entry),
            None => tree.push((family.domain(), vec![entry])),
        }
    }
    tree
}

/// Named sets of modulations a sweep can run over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetGroup {
    #[default]
    AllTx,
    Small,
    Ofdm,
    Constellation,
    Fsk,
    Analog,
}

impl DatasetGroup {
    pub const ALL: [DatasetGroup; 6] = [
        DatasetGroup::AllTx,
        DatasetGroup::Small,
        DatasetGroup::Ofdm,
        DatasetGroup::Constellation,
        DatasetGroup::Fsk,
        DatasetGroup::Analog,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DatasetGroup::AllTx => "all_tx",
            DatasetGroup::Small => "small",
            DatasetGroup::Ofdm => "ofdm",
            DatasetGroup::Constellation => "constellation",
            DatasetGroup::Fsk => "fsk",
            DatasetGroup::Analog => "analog",
        }
    }

    /// Members in sweep order.
    pub fn modulations(&self) -> &'static [Modulation] {
        match self {
            DatasetGroup::AllTx => &[
                Ook, Bpsk, Ask4, Pam4, Pam8, Qam8Circular, Qam8Cross, Qam16,
                Psk16, Qam32Cross, Qam32Rect, Qam64, Gfsk2, Gfsk4, Gfsk8,
                Cpfsk2, Cpfsk4, Cpfsk8, Ofdm16Bpsk, Ofdm32Bpsk, Ofdm64Bpsk,
                Ofdm16Qpsk, Ofdm32Qpsk, Ofdm64Qpsk, AmDsb, AmSsb, Wbfm,
                LfmSawtooth, LfmSquarewave,
            ],
            DatasetGroup::Small => &[
                Ook, Bpsk, Pam4, Qam8Circular, Qam16, Ofdm32Bpsk, Gfsk2,
                Cpfsk2, AmDsb, Wbfm,
            ],
            DatasetGroup::Ofdm => &[
                Ofdm16Bpsk, Ofdm32Bpsk, Ofdm64Bpsk, Ofdm16Qpsk, Ofdm32Qpsk, Ofdm64Qpsk,
            ],
            DatasetGroup::Constellation => &[
                Ook, Bpsk, Ask4, Pam4, Pam8, Qam8Circular, Qam8Cross, Qam16,
                Psk16, Qam32Cross, Qam32Rect, Qam64,
            ],
            DatasetGroup::Fsk => &[Gfsk2, Gfsk4, Gfsk8, Cpfsk2, Cpfsk4, Cpfsk8],
            DatasetGroup::Analog => &[AmDsb, AmSsb, Wbfm, LfmSawtooth, LfmSquarewave],
        }
    }
}

impl fmt::Display for DatasetGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DatasetGroup {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatasetGroup::ALL
            .iter()
            .copied()
            .find(|g| g.name() == s)
            .ok_or_else(|| ConfigError::UnknownDataset(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::take;

    #[test]
    fn test_labels_round_trip_and_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for m in Modulation::ALL {
            assert!(seen.insert(m.label()), "duplicate label {}", m);
            assert_eq!(m.label().parse::<Modulation>().unwrap(), m);
        }
        assert_eq!(
            "256qam".parse::<Modulation>(),
            Err(ConfigError::UnknownModulation("256qam".to_string()))
        );
    }

    #[test]
    fn test_every_modulation_produces_samples() {
        for m in Modulation::ALL {
            let mut source = m.build_source(1).unwrap();
            assert_eq!(source.label(), m.label());
            let samples = take(source.as_mut(), 512);
            assert_eq!(samples.len(), 512, "{}", m);
            assert!(samples.iter().any(|s| s.norm_sqr() > 0.0), "{} is silent", m);
        }
    }

    #[test]
    fn test_ofdm_symbols_carry_labelled_carrier_count() {
        for (m, carriers) in [
            (Ofdm16Bpsk, 16),
            (Ofdm32Bpsk, 32),
            (Ofdm64Bpsk, 64),
            (Ofdm16Qpsk, 16),
            (Ofdm32Qpsk, 32),
            (Ofdm64Qpsk, 64),
        ] {
            let fft_len = 2 * carriers;
            let cp = fft_len / 4;
            let symbol_len = fft_len + cp;
            let mut source = m.build_source(3).unwrap();
            let samples = take(source.as_mut(), 4 * symbol_len);

            for symbol in samples.chunks_exact(symbol_len) {
                for i in 0..cp {
                    assert!(
                        (symbol[i] - symbol[i + fft_len]).norm() < 1e-5,
                        "{}: prefix sample {} does not repeat at fft {}",
                        m,
                        i,
                        fft_len
                    );
                }
            }
        }
    }

    #[test]
    fn test_dataset_group_sizes() {
        assert_eq!(DatasetGroup::AllTx.modulations().len(), 29);
        assert_eq!(DatasetGroup::Small.modulations().len(), 10);
        assert_eq!(DatasetGroup::Ofdm.modulations().len(), 6);
        assert_eq!(DatasetGroup::Constellation.modulations().len(), 12);
        assert_eq!(DatasetGroup::Fsk.modulations().len(), 6);
        assert_eq!(DatasetGroup::Analog.modulations().len(), 5);
        assert_eq!(
            "everything".parse::<DatasetGroup>(),
            Err(ConfigError::UnknownDataset("everything".to_string()))
        );
    }

    #[test]
    fn test_group_members_match_family() {
        for m in DatasetGroup::Ofdm.modulations() {
            assert_eq!(m.family(), Family::Ofdm);
        }
        for m in DatasetGroup::Constellation.modulations() {
            assert_eq!(m.family(), Family::Constellation);
            assert!(m.scheme().is_some());
        }
    }

    #[test]
    fn test_hierarchy_covers_every_modulation_once() {
        let tree = hierarchy();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].0, "analog");
        assert_eq!(tree[1].0, "digital");
        let total: usize = tree
            .iter()
            .flat_map(|(_, families)| families.iter())
            .map(|(_, members)| members.len())
            .sum();
        assert_eq!(total, Modulation::ALL.len());
    }

    #[test]
    fn test_modulation_serde_uses_label() {
        let json = serde_json::to_string(&Modulation::Qam8Circular).unwrap();
        assert_eq!(json, "\"8qam_circular\"");
        let m: Modulation = serde_json::from_str("\"ofdm-64-qpsk\"").unwrap();
        assert_eq!(m, Modulation::Ofdm64Qpsk);
        assert!(serde_json::from_str::<Modulation>("\"nope\"").is_err());
    }
}
