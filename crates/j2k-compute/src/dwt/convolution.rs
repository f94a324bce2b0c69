//! Filter-bank DWT by downsampled convolution.
//!
//! Used for [`FilterKernel::Arbitrary`](j2k_core::FilterKernel::Arbitrary)
//! kernels. Taps are centred at `len / 2`; the lowpass phase starts on even
//! samples, the highpass phase on odd samples. Out-of-range reads reflect
//! about the edge samples (whole-sample symmetric extension), both when
//! analysing and when synthesising from the upsampled subbands.

use j2k_core::FirBank;

/// Mirrors `i` into `0..n` without repeating the edge sample.
///
/// `-1 -> 1`, `n -> n - 2`; far-out indices fold repeatedly, so taps longer
/// than the signal are still well defined.
#[inline]
pub(crate) fn reflect(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n as isize) - 2;
    let i = i.rem_euclid(period);
    if i >= n as isize {
        (period - i) as usize
    } else {
        i as usize
    }
}

fn correlate(x: &[f32], taps: &[f32], pos: isize) -> f32 {
    let centre = (taps.len() / 2) as isize;
    taps.iter()
        .enumerate()
        .map(|(j, &t)| t * x[reflect(pos + j as isize - centre, x.len())])
        .sum()
}

/// Splits `x` into `(lowpass, highpass)`.
pub(crate) fn analyze(x: &[f32], bank: &FirBank) -> (Vec<f32>, Vec<f32>) {
    let n = x.len();
    let low = (0..n.div_ceil(2))
        .map(|k| correlate(x, bank.analysis_low(), 2 * k as isize))
        .collect();
    let high = (0..n / 2)
        .map(|k| correlate(x, bank.analysis_high(), 2 * k as isize + 1))
        .collect();
    (low, high)
}

/// Rebuilds a line from its subbands.
pub(crate) fn synthesize(low: &[f32], high: &[f32], bank: &FirBank) -> Vec<f32> {
    let n = low.len() + high.len();
    let mut up_low = vec![0.0f32; n];
    let mut up_high = vec![0.0f32; n];
    for (k, &v) in low.iter().enumerate() {
        up_low[2 * k] = v;
    }
    for (k, &v) in high.iter().enumerate() {
        up_high[2 * k + 1] = v;
    }

    (0..n as isize)
        .map(|m| {
            correlate(&up_low, bank.synthesis_low(), m)
                + correlate(&up_high, bank.synthesis_high(), m)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use j2k_core::FilterKernel;

    fn bank(kernel: FilterKernel) -> FirBank {
        match kernel {
            FilterKernel::Arbitrary(bank) => bank,
            other => panic!("expected FIR bank, got {other:?}"),
        }
    }

    /// LeGall 5/3 written as an FIR pair.
    fn legall() -> FirBank {
        bank(
            FilterKernel::arbitrary(
                "legall-fir",
                vec![-0.125, 0.25, 0.75, 0.25, -0.125],
                vec![-0.5, 1.0, -0.5],
                vec![0.5, 1.0, 0.5],
                vec![-0.125, -0.25, 0.75, -0.25, -0.125],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_reflect() {
        assert_eq!(reflect(-1, 5), 1);
        assert_eq!(reflect(-2, 5), 2);
        assert_eq!(reflect(5, 5), 3);
        assert_eq!(reflect(6, 5), 2);
        assert_eq!(reflect(3, 5), 3);
        assert_eq!(reflect(-7, 3), 1);
        assert_eq!(reflect(4, 1), 0);
        // matches 2n - i - 2 just past the end
        for n in 2..10usize {
            assert_eq!(reflect(n as isize, n), n - 2);
        }
    }

    #[test]
    fn test_lazy_bank_is_split() {
        let lazy = bank(FilterKernel::arbitrary("lazy", vec![1.0], vec![1.0], vec![1.0], vec![1.0]).unwrap());
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let (low, high) = analyze(&x, &lazy);
        assert_eq!(low, vec![1.0, 3.0, 5.0]);
        assert_eq!(high, vec![2.0, 4.0]);
        assert_eq!(synthesize(&low, &high, &lazy), x.to_vec());
    }

    #[test]
    fn test_legall_roundtrip() {
        let bank = legall();
        for n in [2usize, 3, 8, 9, 16, 31] {
            let x: Vec<f32> = (0..n).map(|i| ((i * 7 + 3) % 11) as f32 - 4.0).collect();
            let (low, high) = analyze(&x, &bank);
            assert_eq!(low.len(), n.div_ceil(2));
            assert_eq!(high.len(), n / 2);
            let y = synthesize(&low, &high, &bank);
            for (a, b) in x.iter().zip(&y) {
                approx::assert_abs_diff_eq!(a, b, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn test_legall_ramp_highpass_zero() {
        let x: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let (_, high) = analyze(&x, &legall());
        for h in &high[..high.len() - 1] {
            approx::assert_abs_diff_eq!(*h, 0.0, epsilon = 1e-6);
        }
    }
}
