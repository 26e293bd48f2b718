use std::f64::consts::PI;

use num_complex::Complex64;
use waveset_rs::constellation::{ConstellationSpec, DecisionRegions, Scheme, schemes};
use waveset_rs::error::ConstellationError;

fn coords(spec: &ConstellationSpec) -> Vec<Complex64> {
    spec.points().iter().map(|p| p.coord).collect()
}

#[test]
fn every_scheme_has_a_permutation_gray_code() {
    for scheme in Scheme::ALL {
        let spec = scheme.build().unwrap();
        let n = spec.len();
        assert_eq!(spec.gray().len(), n, "{}", scheme);

        let mut seen = vec![false; n];
        for &code in spec.gray().as_slice() {
            assert!(code < n, "{}: code {} out of range", scheme, code);
            assert!(!seen[code], "{}: code {} repeated", scheme, code);
            seen[code] = true;
        }
    }
}

#[test]
fn every_symbol_round_trips_through_its_bits() {
    for scheme in Scheme::ALL {
        let spec = scheme.build().unwrap();
        for symbol in 0..spec.len() {
            let bits = spec.bits_for_symbol(symbol);
            let point = spec.modulate(bits);
            assert_eq!(point, spec.point(symbol), "{} symbol {}", scheme, symbol);
            assert_eq!(spec.decide(point), symbol, "{} symbol {}", scheme, symbol);
            assert_eq!(spec.demodulate(point), bits, "{} symbol {}", scheme, symbol);
        }
    }
}

#[test]
fn noisy_points_still_decide_correctly_for_rect_schemes() {
    for scheme in [
        Scheme::Qam16,
        Scheme::Qam32Rect,
        Scheme::Qam64,
        Scheme::Qam32Cross,
    ] {
        let spec = scheme.build().unwrap();
        assert!(matches!(spec.regions(), DecisionRegions::Sectors(_)), "{}", scheme);
        for symbol in 0..spec.len() {
            let nudged = spec.point(symbol) + Complex64::new(0.3, -0.3);
            assert_eq!(spec.decide(nudged), symbol, "{} symbol {}", scheme, symbol);
        }
    }
}

#[test]
fn ook_is_the_identity_mapping() {
    let spec = schemes::ook().unwrap();
    assert_eq!(spec.len(), 2);
    assert_eq!(coords(&spec), vec![Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)]);
    assert_eq!(spec.gray().as_slice(), &[0, 1]);
    assert_eq!(spec.bits_per_symbol(), 1);
}

#[test]
fn pam4_gray_neighbours_differ_in_one_bit() {
    let spec = schemes::pam4().unwrap();
    let expected: Vec<Complex64> = (0..4)
        .map(|i| Complex64::new(i as f64, 0.0))
        .collect();
    assert_eq!(coords(&spec), expected);
    let gray = spec.gray().as_slice();
    assert_eq!(gray, &[0, 1, 3, 2]);
    for pair in gray.windows(2) {
        assert_eq!(
            (pair[0] ^ pair[1]).count_ones(),
            1,
            "{:02b} -> {:02b}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn psk16_points_are_evenly_spaced_on_the_unit_circle() {
    let spec = schemes::psk16().unwrap();
    assert_eq!(spec.len(), 16);
    for (k, point) in coords(&spec).iter().enumerate() {
        assert!((point.norm() - 1.0).abs() < 1e-12);
        let expected = Complex64::from_polar(1.0, 2.0 * PI * k as f64 / 16.0);
        assert!((point - expected).norm() < 1e-12, "point {} at {}", k, point);
    }
    assert_eq!(spec.rotational_symmetry(), 16);
}

#[test]
fn builder_rejects_bad_tables() {
    let points: Vec<Complex64> = (0..4)
        .map(|i| Complex64::new(i as f64, 0.0))
        .collect();
    assert!(matches!(
        ConstellationSpec::build(&points, &[0, 1, 2], 1, 1),
        Err(ConstellationError::InvalidConstellation(_))
    ));
    assert!(matches!(
        ConstellationSpec::build(&points, &[0, 1, 1, 2], 1, 1),
        Err(ConstellationError::InvalidConstellation(_))
    ));
    assert!(ConstellationSpec::build(&points, &[3, 1, 0, 2], 1, 1).is_ok());
}
