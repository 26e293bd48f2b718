//! Window placement and normalization over a completed capture.

use clap::ValueEnum;
use num_complex::Complex32;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, SweepError, SweepResult};
use crate::utils::consts::{GAP_MAX_WINDOWS, GAP_MIN_WINDOWS};

/// What to do with a window whose samples are all zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ZeroEnergyPolicy {
    /// Fail the whole job.
    #[default]
    Fail,
    /// Keep walking the gap sequence for a replacement offset. Fails once
    /// the walk runs past the capture.
    Redraw,
}

/// How a window is scaled by its energy `E = sum |x|^2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum WindowNorm {
    /// Divide by `sqrt(E)`; the window's energy becomes exactly 1.
    #[default]
    UnitEnergy,
    /// Divide by `E` itself, reproducing datasets made that way.
    InverseEnergy,
}

/// Samples the capture must hold for `num_exemplars` windows, or `None`
/// when that overflows `usize`.
pub fn capture_capacity(
    window_len: usize,
    num_exemplars: usize,
    capture_factor: usize,
    margin: usize,
) -> Option<usize> {
    capture_factor
        .checked_mul(window_len)?
        .checked_mul(num_exemplars)?
        .checked_add(margin)
}

/// End of the last window when every gap is drawn at its maximum, or
/// `None` on overflow.
pub fn worst_case_extent(
    window_len: usize,
    num_exemplars: usize,
    margin: usize,
) -> Option<usize> {
    let max_gap = GAP_MAX_WINDOWS.checked_mul(window_len)?.checked_sub(1)?;
    num_exemplars
        .checked_mul(max_gap)?
        .checked_add(margin)?
        .checked_add(window_len)
}

/// Start offsets `margin + cumsum(gaps)`, gaps uniform in `[2w, 4w)`.
pub struct OffsetWalk<'a, R: Rng> {
    rng: &'a mut R,
    window_len: usize,
    position: usize,
}

impl<'a, R: Rng> OffsetWalk<'a, R> {
    pub fn new(rng: &'a mut R, window_len: usize, margin: usize) -> Self {
        Self {
            rng,
            window_len,
            position: margin,
        }
    }
}

impl<R: Rng> Iterator for OffsetWalk<'_, R> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let low = GAP_MIN_WINDOWS * self.window_len;
        let high = GAP_MAX_WINDOWS * self.window_len;
        let gap = self.rng.random_range(low..high);
        self.position += gap;
        Some(self.position)
    }
}

pub fn draw_offsets<R: Rng>(
    rng: &mut R,
    window_len: usize,
    num_exemplars: usize,
    margin: usize,
) -> Vec<usize> {
    OffsetWalk::new(rng, window_len, margin)
        .take(num_exemplars)
        .collect()
}

/// Scale `window` by its energy. An all-zero window is an error, never NaN.
pub fn normalize_window(
    window: &[Complex32],
    offset: usize,
    norm: WindowNorm,
) -> SweepResult<Vec<Complex32>> {
    let energy: f64 = window.iter().map(|s| s.norm_sqr() as f64).sum();
    if energy == 0.0 {
        return Err(SweepError::ZeroEnergyWindow { offset });
    }
    let divisor = match norm {
        WindowNorm::UnitEnergy => energy.sqrt() as f32,
        WindowNorm::InverseEnergy => energy as f32,
    };
    Ok(window.iter().map(|s| *s / divisor).collect())
}

/// Parameters shared by every job of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlan {
    pub window_len: usize,
    pub num_exemplars: usize,
    pub margin: usize,
    pub zero_energy: ZeroEnergyPolicy,
    pub norm: WindowNorm,
}

impl WindowPlan {
    /// Cut `num_exemplars` normalized windows out of `capture`, returning
    /// each with its start offset.
    pub fn extract<R: Rng>(
        &self,
        capture: &[Complex32],
        rng: &mut R,
    ) -> SweepResult<Vec<(usize, Vec<Complex32>)>> {
        let w = self.window_len;
        let mut windows = Vec::with_capacity(self.num_exemplars);
        let mut rejected: Option<SweepError> = None;

        for offset in OffsetWalk::new(rng, w, self.margin) {
            if windows.len() == self.num_exemplars {
                break;
            }
            if offset + w > capture.len() {
                return Err(rejected.unwrap_or(SweepError::Config(
                    ConfigError::WindowsExceedCapture {
                        window_len: w,
                        num_exemplars: self.num_exemplars,
                        required: offset + w,
                        capacity: capture.len(),
                    },
                )));
            }

            match normalize_window(&capture[offset..offset + w], offset, self.norm) {
                Ok(window) => windows.push((offset, window)),
                Err(err) if self.zero_energy == ZeroEnergyPolicy::Redraw => {
                    debug!("Redrawing window at offset {}: {}", offset, err);
                    rejected = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(windows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ramp(n: usize) -> Vec<Complex32> {
        (0..n).map(|i| Complex32::new(i as f32, -(i as f32))).collect()
    }

    fn plan(
        window_len: usize,
        num_exemplars: usize,
        zero_energy: ZeroEnergyPolicy,
    ) -> WindowPlan {
        WindowPlan {
            window_len,
            num_exemplars,
            margin: 500,
            zero_energy,
            norm: WindowNorm::UnitEnergy,
        }
    }

    #[test]
    fn test_capacity_formula() {
        assert_eq!(capture_capacity(128, 1000, 5, 500), Some(640_500));
        assert_eq!(capture_capacity(8, 10, 5, 500), Some(900));
    }

    #[test]
    fn test_overflowing_sizes_are_none() {
        assert_eq!(capture_capacity(1 << 40, 1 << 30, 5, 500), None);
        assert_eq!(capture_capacity(8, 10, 5, usize::MAX), None);
        assert_eq!(worst_case_extent(1 << 40, 1 << 30, 500), None);
        assert_eq!(worst_case_extent(usize::MAX / 2, 1, 500), None);
    }

    #[test]
    fn test_default_factor_always_fits() {
        for w in [1, 8, 128, 1024] {
            for n in [1, 10, 1000] {
                let extent = worst_case_extent(w, n, 500).unwrap();
                assert!(extent <= capture_capacity(w, n, 5, 500).unwrap());
            }
        }
    }

    #[test]
    fn test_offsets_increasing_and_in_bounds() {
        let (w, n) = (16, 50);
        let capacity = capture_capacity(w, n, 5, 500).unwrap();
        let mut rng = StdRng::seed_from_u64(1234);
        let offsets = draw_offsets(&mut rng, w, n, 500);
        assert_eq!(offsets.len(), n);
        assert!(offsets[0] >= 500 + 2 * w);
        for pair in offsets.windows(2) {
            let gap = pair[1] - pair[0];
            assert!((2 * w..4 * w).contains(&gap), "gap {}", gap);
        }
        assert!(offsets.iter().all(|&o| o + w <= capacity));
    }

    #[test]
    fn test_offsets_reproducible_from_seed() {
        let a = draw_offsets(&mut StdRng::seed_from_u64(9), 32, 20, 500);
        let b = draw_offsets(&mut StdRng::seed_from_u64(9), 32, 20, 500);
        assert_eq!(a, b);
    }

    #[test]
    fn test_unit_energy_normalization() {
        let window = ramp(40)[3..19].to_vec();
        let normalized = normalize_window(&window, 3, WindowNorm::UnitEnergy).unwrap();
        let energy: f32 = normalized.iter().map(|s| s.norm_sqr()).sum();
        assert!((energy - 1.0).abs() < 1e-5, "energy {}", energy);
    }

    #[test]
    fn test_inverse_energy_normalization() {
        let window = vec![Complex32::new(2.0, 0.0); 4];
        let normalized =
            normalize_window(&window, 0, WindowNorm::InverseEnergy).unwrap();
        // E = 16, each sample 2/16
        assert!(normalized.iter().all(|s| (s.re - 0.125).abs() < 1e-7 && s.im == 0.0));
    }

    #[test]
    fn test_zero_window_is_an_error() {
        let window = vec![Complex32::new(0.0, 0.0); 8];
        assert_eq!(
            normalize_window(&window, 77, WindowNorm::UnitEnergy),
            Err(SweepError::ZeroEnergyWindow { offset: 77 })
        );
    }

    #[test]
    fn test_extract_from_ramp() {
        let p = plan(8, 10, ZeroEnergyPolicy::Fail);
        let capture = ramp(capture_capacity(8, 10, 5, 500).unwrap());
        let windows = p.extract(&capture, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(windows.len(), 10);
        for (offset, window) in &windows {
            assert_eq!(window.len(), 8);
            // a ramp window starts at its offset, so ratios pin it down
            let ratio = window[1].re / window[0].re;
            assert!((ratio - (*offset as f32 + 1.0) / *offset as f32).abs() < 1e-4);
            let energy: f32 = window.iter().map(|s| s.norm_sqr()).sum();
            assert!((energy - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_zero_capture_fails_job_by_default() {
        let p = plan(8, 10, ZeroEnergyPolicy::Fail);
        let capacity = capture_capacity(8, 10, 5, 500).unwrap();
        let capture = vec![Complex32::new(0.0, 0.0); capacity];
        let err = p.extract(&capture, &mut StdRng::seed_from_u64(5)).unwrap_err();
        assert!(matches!(err, SweepError::ZeroEnergyWindow { offset } if offset > 500));
    }

    #[test]
    fn test_redraw_skips_silent_stretch() {
        let p = plan(8, 5, ZeroEnergyPolicy::Redraw);
        let mut capture = ramp(capture_capacity(8, 5, 20, 500).unwrap());
        // silence the region where the first windows would land
        for s in &mut capture[500..700] {
            *s = Complex32::new(0.0, 0.0);
        }
        let windows = p.extract(&capture, &mut StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(windows.len(), 5);
        for (offset, window) in &windows {
            // windows starting at or before 692 lie wholly in the silence
            assert!(*offset > 692, "offset {}", offset);
            assert!(window.iter().all(|s| s.re.is_finite()));
        }
    }

    #[test]
    fn test_redraw_gives_up_at_end_of_capture() {
        let p = plan(8, 10, ZeroEnergyPolicy::Redraw);
        let capacity = capture_capacity(8, 10, 5, 500).unwrap();
        let capture = vec![Complex32::new(0.0, 0.0); capacity];
        let err = p.extract(&capture, &mut StdRng::seed_from_u64(5)).unwrap_err();
        assert!(matches!(err, SweepError::ZeroEnergyWindow { .. }));
    }

    #[test]
    fn test_short_capture_is_rejected() {
        let p = plan(8, 10, ZeroEnergyPolicy::Fail);
        let capture = ramp(600);
        let err = p.extract(&capture, &mut StdRng::seed_from_u64(5)).unwrap_err();
        assert!(matches!(
            err,
            SweepError::Config(ConfigError::WindowsExceedCapture { capacity: 600, .. })
        ));
    }
}
