//! Wavelet transform tests for j2k-compute.

use j2k_compute::dwt;
use j2k_compute::{FilterKernel, SubbandSet};
use j2k_core::{LiftingRole, LiftingStep, high_len, low_len};

fn ramp_i32(w: usize, h: usize) -> Vec<i32> {
    (0..w * h).map(|i| ((i % w) * 3 + (i / w) * 5) as i32).collect()
}

fn noise_i32(n: usize) -> Vec<i32> {
    (0..n).map(|i| ((i * 2_654_435_761usize) >> 7) as i32 % 511 - 255).collect()
}

#[test]
fn test_53_scenario() {
    let x = [1, 2, 3, 4, 5, 6, 7, 8];
    let filter = FilterKernel::reversible53();
    let (low, high) = dwt::forward_1d(&x, &filter).unwrap();
    assert_eq!((low.len(), high.len()), (4, 4));
    assert_eq!(dwt::inverse_1d(&low, &high, &filter).unwrap(), x);
}

#[test]
fn test_53_exact_on_awkward_lengths() {
    let filter = FilterKernel::reversible53();
    for n in [1, 2, 3, 4, 5, 7, 9, 16, 31, 33, 100] {
        let x = noise_i32(n);
        let (low, high) = dwt::forward_1d(&x, &filter).unwrap();
        assert_eq!(low.len(), low_len(n));
        assert_eq!(high.len(), high_len(n));
        assert_eq!(dwt::inverse_1d(&low, &high, &filter).unwrap(), x, "length {n}");
    }
}

#[test]
fn test_53_extreme_samples_roundtrip() {
    let filter = FilterKernel::reversible53();
    let x = [i32::MAX, i32::MIN, i32::MAX, 0, i32::MIN, -1, 1, i32::MAX, i32::MIN];
    let (low, high) = dwt::forward_1d(&x, &filter).unwrap();
    assert_eq!(dwt::inverse_1d(&low, &high, &filter).unwrap(), x);
}

#[test]
fn test_97_roundtrip_tolerance() {
    let filter = FilterKernel::irreversible97();
    let x: Vec<f32> = (0..64).map(|i| ((i * 37) % 255) as f32).collect();
    let (low, high) = dwt::forward_1d(&x, &filter).unwrap();
    let back = dwt::inverse_1d(&low, &high, &filter).unwrap();
    for (a, b) in x.iter().zip(&back) {
        approx::assert_abs_diff_eq!(a, b, epsilon = 1e-2);
    }
}

#[test]
fn test_lifting_cdf97_matches_fixed_97() {
    let x: Vec<f32> = (0..40).map(|i| (i as f32 * 0.7).sin() * 100.0).collect();
    let (l1, h1) = dwt::forward_1d(&x, &FilterKernel::irreversible97()).unwrap();
    let (l2, h2) = dwt::forward_1d(&x, &FilterKernel::lifting_cdf97()).unwrap();
    for (a, b) in l1.iter().chain(&h1).zip(l2.iter().chain(&h2)) {
        approx::assert_abs_diff_eq!(a, b, epsilon = 1e-2);
    }
}

#[test]
fn test_custom_lifting_roundtrip() {
    let filter = FilterKernel::lifting(
        "two_step",
        vec![
            LiftingStep::new(-1.0, LiftingRole::PredictOdd),
            LiftingStep::new(0.25, LiftingRole::UpdateEven),
        ],
        1.0,
        1.0,
    )
    .unwrap();
    let x: Vec<f32> = (0..21).map(|i| (i * i % 13) as f32).collect();
    let (low, high) = dwt::forward_1d(&x, &filter).unwrap();
    let back = dwt::inverse_1d(&low, &high, &filter).unwrap();
    for (a, b) in x.iter().zip(&back) {
        approx::assert_abs_diff_eq!(a, b, epsilon = 1e-3);
    }
}

#[test]
fn test_2d_energy_concentrates_in_approximation() {
    let (w, h) = (32, 32);
    let data = ramp_i32(w, h);
    let set: SubbandSet<i32> = dwt::forward_2d(&data, w, h, &FilterKernel::reversible53()).unwrap();
    let approx_e = set.approximation_energy();
    let detail_e = set.detail_energy();
    assert!(approx_e > 10.0 * detail_e, "approx {approx_e} detail {detail_e}");
    assert_eq!(set.approx_dims(), (16, 16));
}

#[test]
fn test_constant_tile_energy_in_approximation() {
    for n in [8, 16, 17] {
        let flat = vec![100.0f32; n * n];
        for filter in [
            FilterKernel::irreversible97(),
            FilterKernel::lifting_cdf97(),
            FilterKernel::reversible53(),
        ] {
            let set = dwt::forward_2d(&flat, n, n, &filter).unwrap();
            let (a, d) = (set.approximation_energy(), set.detail_energy());
            assert!(d < a, "{} on {n}x{n}: detail {d} approx {a}", filter.name());
        }

        let flat_i32 = vec![100i32; n * n];
        let set = dwt::forward_2d(&flat_i32, n, n, &FilterKernel::reversible53()).unwrap();
        assert_eq!(set.detail_energy(), 0.0);
        assert!(set.approximation_energy() > 0.0);
    }
}

#[test]
fn test_2d_quadrant_layout_matches_subbands() {
    let (w, h) = (9, 6);
    let data = noise_i32(w * h);
    let filter = FilterKernel::reversible53();

    let set = dwt::forward_2d(&data, w, h, &filter).unwrap();
    let mut buf = data.clone();
    dwt::quadrant_forward(&mut buf, w, h, &filter).unwrap();
    assert_eq!(SubbandSet::from_quadrants(&buf, w, h).unwrap(), set);

    dwt::quadrant_inverse(&mut buf, w, h, &filter).unwrap();
    assert_eq!(buf, data);
}

#[test]
fn test_multi_level_clamps_to_max() {
    let filter = FilterKernel::reversible53();
    let data = noise_i32(8 * 8);
    let dec = dwt::forward_multi_level(&data, 8, 8, Some(100), &filter, 5).unwrap();
    assert_eq!(dec.level_count(), 3);
    assert_eq!(dec.approx_dims(), (1, 1));
    assert_eq!(dec.coefficient_count(), 64);
    assert_eq!(dwt::inverse_multi_level(&dec, &filter).unwrap(), data);
}

#[test]
fn test_multi_level_default_depth() {
    let filter = FilterKernel::irreversible97();
    let (w, h) = (64, 48);
    let data: Vec<f32> = (0..w * h).map(|i| ((i * 13) % 200) as f32).collect();
    let dec = dwt::forward_multi_level(&data, w, h, None, &filter, 4).unwrap();
    assert_eq!(dec.level_count(), 4);
    assert_eq!((dec.levels[0].width, dec.levels[0].height), (64, 48));
    assert_eq!(dec.approx_dims(), (4, 3));

    let back = dwt::inverse_multi_level(&dec, &filter).unwrap();
    for (a, b) in data.iter().zip(&back) {
        approx::assert_abs_diff_eq!(a, b, epsilon = 0.05);
    }
}

#[test]
fn test_parameter_errors() {
    let filter = FilterKernel::reversible53();
    assert!(dwt::forward_2d(&[0i32; 5], 2, 2, &filter).unwrap_err().is_parameter());
    assert!(dwt::forward_2d::<i32>(&[], 0, 4, &filter).unwrap_err().is_parameter());
    assert!(dwt::forward_multi_level(&[0i32; 12], 4, 4, None, &filter, 5).unwrap_err().is_parameter());
    assert!(
        dwt::inverse_1d(&[1i32, 2, 3], &[1], &filter)
            .unwrap_err()
            .is_parameter()
    );
}

#[test]
fn test_integer_samples_need_reversible_filter() {
    let err = dwt::forward_1d(&[1i32, 2, 3, 4], &FilterKernel::irreversible97()).unwrap_err();
    assert!(err.is_unsupported());
}
