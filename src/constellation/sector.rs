//! Rectangular sector decomposition for grid-decided constellations.

use num_complex::Complex64;

use crate::error::ConstellationError;

/// Sector grid centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectorLayout {
    pub real_sectors: usize,
    pub imag_sectors: usize,
    pub real_width: f64,
    pub imag_width: f64,
}

impl SectorLayout {
    pub const fn new(
        real_sectors: usize,
        imag_sectors: usize,
        real_width: f64,
        imag_width: f64,
    ) -> Self {
        Self {
            real_sectors,
            imag_sectors,
            real_width,
            imag_width,
        }
    }

    pub fn sector_count(&self) -> usize {
        self.real_sectors * self.imag_sectors
    }

    fn axis_index(value: f64, width: f64, sectors: usize) -> isize {
        (value / width + sectors as f64 / 2.0).floor() as isize
    }

    /// Sector containing `sample`, or `None` if it lies outside the grid.
    pub fn sector_of(&self, sample: Complex64) -> Option<usize> {
        let re = Self::axis_index(sample.re, self.real_width, self.real_sectors);
        let im = Self::axis_index(sample.im, self.imag_width, self.imag_sectors);
        if re < 0
            || im < 0
            || re >= self.real_sectors as isize
            || im >= self.imag_sectors as isize
        {
            return None;
        }
        Some(re as usize * self.imag_sectors + im as usize)
    }

    /// Sector for a received sample; samples outside the grid clamp to the edge.
    pub fn clamped_sector(&self, sample: Complex64) -> usize {
        let re = Self::axis_index(sample.re, self.real_width, self.real_sectors)
            .clamp(0, self.real_sectors as isize - 1);
        let im = Self::axis_index(sample.im, self.imag_width, self.imag_sectors)
            .clamp(0, self.imag_sectors as isize - 1);
        re as usize * self.imag_sectors + im as usize
    }

    pub fn sector_center(&self, sector: usize) -> Complex64 {
        let re = (sector / self.imag_sectors) as f64;
        let im = (sector % self.imag_sectors) as f64;
        Complex64::new(
            (re + 0.5 - self.real_sectors as f64 / 2.0) * self.real_width,
            (im + 0.5 - self.imag_sectors as f64 / 2.0) * self.imag_width,
        )
    }
}

/// Per-sector candidate symbols derived from a [`SectorLayout`].
#[derive(Debug, Clone, PartialEq)]
pub struct SectorMap {
    layout: SectorLayout,
    candidates: Vec<Vec<usize>>,
    multiplicity: usize,
}

impl SectorMap {
    /// Assign every point to its sector.
    ///
    /// Every point must fall inside the grid and every occupied sector must
    /// hold the same number of points. Empty sectors decide to the point
    /// nearest their centre.
    pub fn new(
        layout: SectorLayout,
        points: &[Complex64],
    ) -> Result<Self, ConstellationError> {
        if layout.real_sectors == 0 || layout.imag_sectors == 0 {
            return Err(ConstellationError::InvalidSectorLayout(format!(
                "sector counts must be positive, got {}x{}",
                layout.real_sectors, layout.imag_sectors
            )));
        }
        if !(layout.real_width > 0.0 && layout.imag_width > 0.0) {
            return Err(ConstellationError::InvalidSectorLayout(format!(
                "sector widths must be positive, got {}x{}",
                layout.real_width, layout.imag_width
            )));
        }

        let mut candidates = vec![Vec::new(); layout.sector_count()];
        for (symbol, &point) in points.iter().enumerate() {
            let sector = layout.sector_of(point).ok_or_else(|| {
                ConstellationError::InvalidSectorLayout(format!(
                    "point {} ({}) lies outside the {}x{} grid",
                    symbol, point, layout.real_sectors, layout.imag_sectors
                ))
            })?;
            candidates[sector].push(symbol);
        }

        let occupied: Vec<usize> = candidates
            .iter()
            .map(Vec::len)
            .filter(|&n| n > 0)
            .collect();
        let multiplicity = occupied.first().copied().unwrap_or(0);
        if occupied.iter().any(|&n| n != multiplicity)
            || occupied.len() * multiplicity != points.len()
        {
            return Err(ConstellationError::InvalidSectorLayout(format!(
                "{} occupied sectors do not tile {} points evenly",
                occupied.len(),
                points.len()
            )));
        }

        for (sector, slot) in candidates.iter_mut().enumerate() {
            if slot.is_empty() {
                let center = layout.sector_center(sector);
                let nearest = points
                    .iter()
                    .enumerate()
                    .min_by(|(_, a), (_, b)| {
                        (center - **a)
                            .norm_sqr()
                            .total_cmp(&(center - **b).norm_sqr())
                    })
                    .map(|(symbol, _)| symbol)
                    .unwrap_or(0);
                slot.push(nearest);
            }
        }

        Ok(Self {
            layout,
            candidates,
            multiplicity,
        })
    }

    pub fn layout(&self) -> &SectorLayout {
        &self.layout
    }

    pub fn multiplicity(&self) -> usize {
        self.multiplicity
    }

    pub fn candidates(&self, sample: Complex64) -> &[usize] {
        &self.candidates[self.layout.clamped_sector(sample)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask4() -> Vec<Complex64> {
        [-3.0, -1.0, 1.0, 3.0]
            .iter()
            .map(|&re| Complex64::new(re, 0.0))
            .collect()
    }

    #[test]
    fn test_sector_of_ask4() {
        let layout = SectorLayout::new(4, 1, 2.0, 2.0);
        let sectors: Vec<_> = ask4()
            .iter()
            .map(|&p| layout.sector_of(p))
            .collect();
        assert_eq!(sectors, vec![Some(0), Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_point_outside_grid_rejected() {
        let layout = SectorLayout::new(2, 1, 2.0, 2.0);
        let err = SectorMap::new(layout, &ask4()).unwrap_err();
        assert!(matches!(err, ConstellationError::InvalidSectorLayout(_)));
    }

    #[test]
    fn test_uneven_multiplicity_rejected() {
        // one sector gets two points, the others one
        let layout = SectorLayout::new(2, 1, 4.0, 2.0);
        let points = [
            Complex64::new(-3.0, 0.0),
            Complex64::new(-1.0, 0.0),
            Complex64::new(1.0, 0.0),
            Complex64::new(-2.0, 0.0),
        ];
        assert!(SectorMap::new(layout, &points).is_err());
    }

    #[test]
    fn test_zero_sectors_rejected() {
        let layout = SectorLayout::new(0, 1, 2.0, 2.0);
        assert!(SectorMap::new(layout, &ask4()).is_err());
    }

    #[test]
    fn test_empty_sector_resolves_to_nearest_point() {
        // cross-shaped 8 points on a 3x4 grid leaves corner sectors empty
        let points = [
            Complex64::new(0.0, 3.0),
            Complex64::new(-2.0, 1.0),
            Complex64::new(0.0, 1.0),
            Complex64::new(2.0, 1.0),
            Complex64::new(-2.0, -1.0),
            Complex64::new(0.0, -1.0),
            Complex64::new(2.0, -1.0),
            Complex64::new(0.0, -3.0),
        ];
        let map = SectorMap::new(SectorLayout::new(3, 4, 2.0, 2.0), &points).unwrap();
        assert_eq!(map.multiplicity(), 1);
        // the top-left corner is equidistant from symbols 0 and 1
        assert!(matches!(map.candidates(Complex64::new(-2.5, 3.5)), [0] | [1]));
        assert_eq!(map.candidates(Complex64::new(10.0, 0.5)), &[3]);
    }
}
