//! Bit-plane primitive tests: every strategy against the scalar reference.

use j2k_compute::bitplane;
use j2k_compute::{BitPlaneOps, Capabilities, ScalarBitPlane, SimdBitPlane, SimdFamily, strategy_for};

const SIZES: &[usize] = &[0, 1, 2, 3, 4, 5, 7, 8, 9, 15, 16, 17, 31, 32, 33, 63, 64, 100, 256, 1024];
const BIT_PLANES: &[u32] = &[0, 1, 5, 12, 30, 31, 32, 40];

/// Deterministic coefficients covering both signs, zeros and the extremes.
fn coeffs(n: usize) -> Vec<i32> {
    (0..n)
        .map(|i| match i % 11 {
            0 => 0,
            3 => i32::MIN,
            7 => i32::MAX,
            _ => ((i as i64 * 7919 % 65_521) - 32_760) as i32,
        })
        .collect()
}

fn flags(n: usize) -> Vec<u8> {
    (0..n).map(|i| [0, 1, 2, 0, 1][i % 5]).collect()
}

#[test]
fn test_scenarios() {
    let strategies: [&dyn BitPlaneOps; 2] = [&ScalarBitPlane, &SimdBitPlane];
    for ops in strategies {
        assert_eq!(ops.significance(&[8, 7, 16, -9, 0, 4, -24, 15], 3), vec![1, 0, 0, 1, 0, 0, 1, 1]);
        assert_eq!(
            ops.magnitude_sign_separate(&[10, -20, 0, 30, -5]),
            (vec![10, 20, 0, 30, 5], vec![0, 1, 0, 0, 1]),
            "{}",
            ops.name()
        );
    }
}

#[test]
fn test_simd_matches_scalar() {
    let (scalar, simd) = (ScalarBitPlane, SimdBitPlane);
    for &n in SIZES {
        let c = coeffs(n);
        for &bp in BIT_PLANES {
            assert_eq!(simd.significance(&c, bp), scalar.significance(&c, bp), "significance n={n} bp={bp}");
            assert_eq!(simd.significance_count(&c, bp), scalar.significance_count(&c, bp), "count n={n} bp={bp}");
            assert_eq!(
                simd.refinement_bits(&c, &flags(n), bp),
                scalar.refinement_bits(&c, &flags(n), bp),
                "refinement n={n} bp={bp}"
            );
            let pairs = n / 2;
            assert_eq!(simd.vlc_pattern(&c, bp, pairs), scalar.vlc_pattern(&c, bp, pairs), "vlc n={n} bp={bp}");
        }

        let (mag, sign) = scalar.magnitude_sign_separate(&c);
        assert_eq!(simd.magnitude_sign_separate(&c), (mag.clone(), sign.clone()), "split n={n}");
        assert_eq!(simd.reconstruct(&mag, &sign), scalar.reconstruct(&mag, &sign), "reconstruct n={n}");
        assert_eq!(simd.max_abs_value(&c), scalar.max_abs_value(&c), "max n={n}");
    }
}

#[test]
fn test_split_then_reconstruct() {
    let c: Vec<i32> = (-300..300).step_by(7).collect();
    let (mag, sign) = bitplane::magnitude_sign_separate(&c);
    assert!(mag.iter().all(|&m| m >= 0));
    assert_eq!(bitplane::reconstruct(&mag, &sign), c);
}

#[test]
fn test_max_abs_is_unsigned() {
    assert_eq!(bitplane::max_abs_value(&[]), 0);
    assert_eq!(bitplane::max_abs_value(&[3, i32::MIN, 5]), 1u32 << 31);
    assert_eq!(SimdBitPlane.max_abs_value(&coeffs(64)), 1u32 << 31);
}

#[test]
fn test_mismatched_lengths_yield_empty() {
    for ops in [&ScalarBitPlane as &dyn BitPlaneOps, &SimdBitPlane] {
        assert!(ops.reconstruct(&[1, 2, 3], &[0, 1]).is_empty());
        assert!(ops.refinement_bits(&[1, 2, 3], &[1], 0).is_empty());
        assert!(ops.vlc_pattern(&[1, 2, 3], 0, 2).is_empty());
    }
}

#[test]
fn test_vlc_pattern_pairs() {
    // pairs (1,0) (0,1) (1,1) (0,0) at bit plane 0
    let c = [1, 2, 2, 3, 5, -7, 4, 6, 9];
    assert_eq!(bitplane::vlc_pattern(&c, 0, 4), vec![1, 2, 3, 0]);
    assert_eq!(bitplane::vlc_pattern(&c, 0, 0), Vec::<u8>::new());
}

#[test]
fn test_strategy_follows_capabilities() {
    assert_eq!(strategy_for(&Capabilities::scalar_only()).name(), ScalarBitPlane.name());
    assert_eq!(strategy_for(&Capabilities::new(SimdFamily::Sse, false, 2)).name(), SimdBitPlane.name());
}
