//! Constellation geometry: point tables, Gray mappings and decision regions.
//!
//! A [`ConstellationSpec`] is built once from static tables and then shared by
//! every generator that maps bit groups to transmit symbols.

pub mod schemes;
pub mod sector;

use num_complex::Complex64;

use crate::error::ConstellationError;

pub use schemes::Scheme;
pub use sector::{SectorLayout, SectorMap};

/// One constellation point and the symbol index it represents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstellationPoint {
    pub coord: Complex64,
    pub symbol: usize,
}

/// Bijection between symbol indices and bit patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayMapping {
    bits: Vec<usize>,
    inverse: Vec<usize>,
}

impl GrayMapping {
    /// Validates that `code` is a permutation of `0..code.len()`.
    pub fn new(code: &[usize]) -> Result<Self, ConstellationError> {
        let n = code.len();
        let mut inverse = vec![usize::MAX; n];
        for (symbol, &bits) in code.iter().enumerate() {
            if bits >= n {
                return Err(ConstellationError::InvalidConstellation(format!(
                    "gray code value {} at symbol {} is out of range 0..{}",
                    bits, symbol, n
                )));
            }
            if inverse[bits] != usize::MAX {
                return Err(ConstellationError::InvalidConstellation(format!(
                    "gray code value {} is used by symbols {} and {}",
                    bits, inverse[bits], symbol
                )));
            }
            inverse[bits] = symbol;
        }
        Ok(Self {
            bits: code.to_vec(),
            inverse,
        })
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn bits_for(&self, symbol: usize) -> usize {
        self.bits[symbol]
    }

    pub fn symbol_for(&self, bits: usize) -> usize {
        self.inverse[bits]
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.bits
    }
}

/// How received samples are turned back into symbol decisions.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionRegions {
    /// Minimum Euclidean distance over every point.
    NearestPoint,
    /// Rectangular sector grid, see [`SectorMap`].
    Sectors(SectorMap),
}

/// A validated, immutable constellation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstellationSpec {
    points: Vec<ConstellationPoint>,
    gray: GrayMapping,
    rotational_symmetry: usize,
    dimensionality: usize,
    regions: DecisionRegions,
}

impl ConstellationSpec {
    /// Build a constellation decided by nearest point.
    ///
    /// `dimensionality` is 1 for amplitude/phase constellations and 2 for
    /// rectangular-decision ones; use [`ConstellationSpec::build_rect`] to
    /// attach the sector grid a 2-dimensional constellation decides with.
    pub fn build(
        points: &[Complex64],
        gray_code: &[usize],
        rotational_symmetry: usize,
        dimensionality: usize,
    ) -> Result<Self, ConstellationError> {
        if points.len() != gray_code.len() {
            return Err(ConstellationError::InvalidConstellation(format!(
                "{} points but {} gray code entries",
                points.len(),
                gray_code.len()
            )));
        }
        if points.len() < 2 || !points.len().is_power_of_two() {
            return Err(ConstellationError::InvalidConstellation(format!(
                "point count {} is not a power of two >= 2",
                points.len()
            )));
        }
        if rotational_symmetry == 0 {
            return Err(ConstellationError::InvalidConstellation(
                "rotational symmetry must be at least 1".to_string(),
            ));
        }
        if !(1..=2).contains(&dimensionality) {
            return Err(ConstellationError::InvalidConstellation(format!(
                "dimensionality must be 1 or 2, got {}",
                dimensionality
            )));
        }

        let gray = GrayMapping::new(gray_code)?;
        let points = points
            .iter()
            .enumerate()
            .map(|(symbol, &coord)| ConstellationPoint { coord, symbol })
            .collect();

        Ok(Self {
            points,
            gray,
            rotational_symmetry,
            dimensionality,
            regions: DecisionRegions::NearestPoint,
        })
    }

    /// Build a rectangular-decision constellation with an explicit sector grid.
    pub fn build_rect(
        points: &[Complex64],
        gray_code: &[usize],
        rotational_symmetry: usize,
        layout: SectorLayout,
    ) -> Result<Self, ConstellationError> {
        let mut spec = Self::build(points, gray_code, rotational_symmetry, 2)?;
        // sectors are shared between rotated copies of the point set
        if points.len() % rotational_symmetry != 0 {
            return Err(ConstellationError::InvalidConstellation(format!(
                "rotational symmetry {} does not divide {} points",
                rotational_symmetry,
                points.len()
            )));
        }
        let map = SectorMap::new(layout, points)?;
        spec.regions = DecisionRegions::Sectors(map);
        Ok(spec)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bits_per_symbol(&self) -> usize {
        self.points.len().trailing_zeros() as usize
    }

    pub fn rotational_symmetry(&self) -> usize {
        self.rotational_symmetry
    }

    pub fn dimensionality(&self) -> usize {
        self.dimensionality
    }

    pub fn points(&self) -> &[ConstellationPoint] {
        &self.points
    }

    pub fn point(&self, symbol: usize) -> Complex64 {
        self.points[symbol].coord
    }

    pub fn gray(&self) -> &GrayMapping {
        &self.gray
    }

    pub fn regions(&self) -> &DecisionRegions {
        &self.regions
    }

    pub fn bits_for_symbol(&self, symbol: usize) -> usize {
        self.gray.bits_for(symbol)
    }

    pub fn symbol_for_bits(&self, bits: usize) -> usize {
        self.gray.symbol_for(bits)
    }

    /// Transmit point for a bit group. Bits above `bits_per_symbol` are ignored.
    pub fn modulate(&self, bits: usize) -> Complex64 {
        let bits = bits & (self.points.len() - 1);
        self.point(self.gray.symbol_for(bits))
    }

    /// Hard decision: the symbol index whose region contains `sample`.
    pub fn decide(&self, sample: Complex64) -> usize {
        match &self.regions {
            DecisionRegions::NearestPoint => self.nearest(sample, 0..self.points.len()),
            DecisionRegions::Sectors(map) => {
                self.nearest(sample, map.candidates(sample).iter().copied())
            }
        }
    }

    /// Bit group carried by the symbol decided for `sample`.
    pub fn demodulate(&self, sample: Complex64) -> usize {
        self.gray.bits_for(self.decide(sample))
    }

    /// Points scaled to unit average power.
    pub fn normalized_points(&self) -> Vec<Complex64> {
        let power = self
            .points
            .iter()
            .map(|p| p.coord.norm_sqr())
            .sum::<f64>()
            / self.points.len() as f64;
        if power == 0.0 {
            return self.points.iter().map(|p| p.coord).collect();
        }
        let scale = power.sqrt().recip();
        self.points.iter().map(|p| p.coord * scale).collect()
    }

    fn nearest(
        &self,
        sample: Complex64,
        candidates: impl Iterator<Item = usize>,
    ) -> usize {
        let mut best = 0;
        let mut min_dist = f64::INFINITY;
        for symbol in candidates {
            let dist = (sample - self.points[symbol].coord).norm_sqr();
            if dist < min_dist {
                min_dist = dist;
                best = symbol;
            }
        }
        best
    }
}
