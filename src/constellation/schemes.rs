//! Named constellation tables.
//!
//! Point lists and Gray permutations follow the published bit-to-symbol
//! layouts. Grids are laid out row by row from the most negative imaginary
//! row upward.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use num_complex::Complex64;

use super::{ConstellationSpec, SectorLayout};
use crate::error::{ConfigError, ConstellationError};

const SQRT_3: f64 = 1.732_050_807_568_877_2;

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

fn real_points(values: &[f64]) -> Vec<Complex64> {
    values.iter().map(|&re| c(re, 0.0)).collect()
}

/// `count` points spaced `2π/count` apart starting at angle 0.
pub fn psk_points(count: usize) -> Vec<Complex64> {
    (0..count)
        .map(|k| Complex64::from_polar(1.0, 2.0 * PI * k as f64 / count as f64))
        .collect()
}

/// Odd-integer grid `cols x rows`, indexed `row * cols + col`.
fn grid_points(cols: usize, rows: usize) -> Vec<Complex64> {
    let re0 = -(cols as f64 - 1.0);
    let im0 = -(rows as f64 - 1.0);
    (0..rows)
        .flat_map(|r| {
            (0..cols).map(move |col| c(re0 + 2.0 * col as f64, im0 + 2.0 * r as f64))
        })
        .collect()
}

pub fn ook() -> Result<ConstellationSpec, ConstellationError> {
    // 0 1
    ConstellationSpec::build(&real_points(&[0.0, 1.0]), &[0, 1], 1, 1)
}

pub fn bpsk() -> Result<ConstellationSpec, ConstellationError> {
    ConstellationSpec::build(&real_points(&[-1.0, 1.0]), &[0, 1], 2, 1)
}

pub fn qpsk() -> Result<ConstellationSpec, ConstellationError> {
    let s = std::f64::consts::FRAC_1_SQRT_2;
    let points = [c(-s, -s), c(s, -s), c(-s, s), c(s, s)];
    ConstellationSpec::build(&points, &[0, 1, 2, 3], 4, 1)
}

pub fn pam4() -> Result<ConstellationSpec, ConstellationError> {
    // 0 1 3 2
    ConstellationSpec::build(&real_points(&[0.0, 1.0, 2.0, 3.0]), &[0, 1, 3, 2], 1, 1)
}

pub fn ask4() -> Result<ConstellationSpec, ConstellationError> {
    // 0   1   3   2
    ConstellationSpec::build_rect(
        &real_points(&[-3.0, -1.0, 1.0, 3.0]),
        &[0, 1, 3, 2],
        2,
        SectorLayout::new(4, 1, 2.0, 2.0),
    )
}

pub fn pam8() -> Result<ConstellationSpec, ConstellationError> {
    // 6   2   3   1   0   4   5   7
    ConstellationSpec::build(
        &real_points(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]),
        &[6, 2, 3, 1, 0, 4, 5, 7],
        1,
        1,
    )
}

pub fn ask8() -> Result<ConstellationSpec, ConstellationError> {
    ConstellationSpec::build_rect(
        &real_points(&[-7.0, -5.0, -3.0, -1.0, 1.0, 3.0, 5.0, 7.0]),
        &[6, 2, 3, 1, 0, 4, 5, 7],
        2,
        SectorLayout::new(8, 1, 2.0, 2.0),
    )
}

pub fn psk8() -> Result<ConstellationSpec, ConstellationError> {
    ConstellationSpec::build(&psk_points(8), &[0, 1, 3, 2, 6, 7, 5, 4], 8, 1)
}

pub fn qam8_circular() -> Result<ConstellationSpec, ConstellationError> {
    //         1
    //       5   4
    //     2       0
    //       6   7
    //         3
    let points = [
        c(0.0, 1.0 + SQRT_3),
        c(-1.0, 1.0),
        c(1.0, 1.0),
        c(-1.0 - SQRT_3, 0.0),
        c(1.0 + SQRT_3, 0.0),
        c(-1.0, -1.0),
        c(1.0, -1.0),
        c(0.0, -1.0 - SQRT_3),
    ];
    ConstellationSpec::build(&points, &[1, 5, 4, 2, 0, 6, 7, 3], 4, 1)
}

pub fn qam8_rect() -> Result<ConstellationSpec, ConstellationError> {
    //     2   3   1   0
    //     6   7   5   4
    let points = [
        c(-3.0, 1.0),
        c(-1.0, 1.0),
        c(1.0, 1.0),
        c(3.0, 1.0),
        c(-3.0, -1.0),
        c(-1.0, -1.0),
        c(1.0, -1.0),
        c(3.0, -1.0),
    ];
    ConstellationSpec::build(&points, &[2, 3, 1, 0, 6, 7, 5, 4], 2, 1)
}

pub fn qam8_cross() -> Result<ConstellationSpec, ConstellationError> {
    //         0
    //     4   6   2
    //     5   7   3
    //         1
    let points = [
        c(0.0, 3.0),
        c(-2.0, 1.0),
        c(0.0, 1.0),
        c(2.0, 1.0),
        c(-2.0, -1.0),
        c(0.0, -1.0),
        c(2.0, -1.0),
        c(0.0, -3.0),
    ];
    ConstellationSpec::build_rect(
        &points,
        &[0, 4, 6, 2, 5, 7, 3, 1],
        2,
        SectorLayout::new(3, 4, 2.0, 2.0),
    )
}

pub fn qam16() -> Result<ConstellationSpec, ConstellationError> {
    const GRAY2: [usize; 4] = [0, 1, 3, 2];
    let gray: Vec<usize> = (0..4)
        .flat_map(|row| (0..4).map(move |col| (GRAY2[col] << 2) | GRAY2[row]))
        .collect();
    ConstellationSpec::build_rect(
        &grid_points(4, 4),
        &gray,
        4,
        SectorLayout::new(4, 4, 2.0, 2.0),
    )
}

pub fn psk16() -> Result<ConstellationSpec, ConstellationError> {
    //                 6
    //             7       2
    //         5               3
    //     4                       1
    // 12                              0
    //     13                      8
    //         15              9
    //             14      11
    //                 10
    ConstellationSpec::build(
        &psk_points(16),
        &[6, 7, 5, 4, 12, 13, 15, 14, 10, 11, 9, 8, 0, 1, 3, 2],
        16,
        1,
    )
}

pub fn qam32_cross() -> Result<ConstellationSpec, ConstellationError> {
    //         0   1   29  28
    //     4   8   12  16  20  24
    //     5   9   13  17  21  25
    //     6   10  14  18  22  26
    //     7   11  15  19  23  27
    //         3   2   30  31
    let mut points = Vec::with_capacity(32);
    points.extend([-3.0, -1.0, 1.0, 3.0].iter().map(|&re| c(re, 5.0)));
    for im in [3.0, 1.0, -1.0, -3.0] {
        points.extend([-5.0, -3.0, -1.0, 1.0, 3.0, 5.0].iter().map(|&re| c(re, im)));
    }
    points.extend([-3.0, -1.0, 1.0, 3.0].iter().map(|&re| c(re, -5.0)));

    let gray = [
        0, 1, 29, 28, //
        4, 8, 12, 16, 20, 24, //
        5, 9, 13, 17, 21, 25, //
        6, 10, 14, 18, 22, 26, //
        7, 11, 15, 19, 23, 27, //
        3, 2, 30, 31,
    ];
    ConstellationSpec::build_rect(&points, &gray, 4, SectorLayout::new(6, 6, 2.0, 2.0))
}

pub fn qam32_rect() -> Result<ConstellationSpec, ConstellationError> {
    // 8 columns on -7..7, 4 rows on -3..3. The sixth column carries codes
    // 28..31 so every row and column steps by a single bit.
    let gray = [
        2, 6, 14, 10, 26, 30, 22, 18, //
        3, 7, 15, 11, 27, 31, 23, 19, //
        1, 5, 13, 9, 25, 29, 21, 17, //
        0, 4, 12, 8, 24, 28, 20, 16,
    ];
    ConstellationSpec::build_rect(
        &grid_points(8, 4),
        &gray,
        2,
        SectorLayout::new(8, 4, 2.0, 2.0),
    )
}

pub fn qam64() -> Result<ConstellationSpec, ConstellationError> {
    let gray = [
        4, 12, 28, 20, 52, 60, 44, 36, //
        5, 13, 29, 21, 53, 61, 45, 37, //
        7, 15, 31, 23, 55, 63, 47, 39, //
        6, 14, 30, 22, 54, 62, 46, 38, //
        2, 10, 26, 18, 50, 58, 42, 34, //
        3, 11, 27, 19, 51, 59, 43, 35, //
        1, 9, 25, 17, 49, 57, 41, 33, //
        0, 8, 24, 16, 48, 56, 40, 32,
    ];
    ConstellationSpec::build_rect(
        &grid_points(8, 8),
        &gray,
        4,
        SectorLayout::new(8, 8, 2.0, 2.0),
    )
}

/// Every named constellation the generators know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Ook,
    Bpsk,
    Qpsk,
    Pam4,
    Ask4,
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
}

impl Scheme {
    pub const ALL: [Scheme; 16] = [
        Scheme::Ook,
        Scheme::Bpsk,
        Scheme::Qpsk,
        Scheme::Pam4,
        Scheme::Ask4,
        Scheme::Pam8,
        Scheme::Ask8,
        Scheme::Psk8,
        Scheme::Qam8Circular,
        Scheme::Qam8Rect,
        Scheme::Qam8Cross,
        Scheme::Qam16,
        Scheme::Psk16,
        Scheme::Qam32Cross,
        Scheme::Qam32Rect,
        Scheme::Qam64,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scheme::Ook => "ook",
            Scheme::Bpsk => "bpsk",
            Scheme::Qpsk => "qpsk",
            Scheme::Pam4 => "4pam",
            Scheme::Ask4 => "4ask",
            Scheme::Pam8 => "8pam",
            Scheme::Ask8 => "8ask",
            Scheme::Psk8 => "8psk",
            Scheme::Qam8Circular => "8qam_circular",
            Scheme::Qam8Rect => "8qam_rect",
            Scheme::Qam8Cross => "8qam_cross",
            Scheme::Qam16 => "16qam",
            Scheme::Psk16 => "16psk",
            Scheme::Qam32Cross => "32qam_cross",
            Scheme::Qam32Rect => "32qam_rect",
            Scheme::Qam64 => "64qam",
        }
    }

    pub fn build(&self) -> Result<ConstellationSpec, ConstellationError> {
        match self {
            Scheme::Ook => ook(),
            Scheme::Bpsk => bpsk(),
            Scheme::Qpsk => qpsk(),
            Scheme::Pam4 => pam4(),
            Scheme::Ask4 => ask4(),
            Scheme::Pam8 => pam8(),
            Scheme::Ask8 => ask8(),
            Scheme::Psk8 => psk8(),
            Scheme::Qam8Circular => qam8_circular(),
            Scheme::Qam8Rect => qam8_rect(),
            Scheme::Qam8Cross => qam8_cross(),
            Scheme::Qam16 => qam16(),
            Scheme::Psk16 => psk16(),
            Scheme::Qam32Cross => qam32_cross(),
            Scheme::Qam32Rect => qam32_rect(),
            Scheme::Qam64 => qam64(),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scheme::ALL
            .iter()
            .copied()
            .find(|scheme| scheme.name() == s)
            .ok_or_else(|| ConfigError::UnknownModulation(s.to_string()))
    }
}
