//! Scalar reference implementation of the bit-plane primitives.

use super::BitPlaneOps;

/// Bit `bit_plane` of `|c|`; zero for planes past the word.
#[inline(always)]
pub(crate) fn sig(c: i32, bit_plane: u32) -> u8 {
    (c.unsigned_abs().checked_shr(bit_plane).unwrap_or(0) & 1) as u8
}

/// Element-at-a-time reference. Every other strategy must match it bit for bit.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarBitPlane;

impl BitPlaneOps for ScalarBitPlane {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn significance(&self, coeffs: &[i32], bit_plane: u32) -> Vec<u8> {
        coeffs.iter().map(|&c| sig(c, bit_plane)).collect()
    }

    fn magnitude_sign_separate(&self, coeffs: &[i32]) -> (Vec<i32>, Vec<u8>) {
        coeffs.iter().map(|&c| (c.wrapping_abs(), u8::from(c < 0))).unzip()
    }

    fn reconstruct(&self, magnitudes: &[i32], signs: &[u8]) -> Vec<i32> {
        if magnitudes.len() != signs.len() {
            return Vec::new();
        }
        magnitudes
            .iter()
            .zip(signs)
            .map(|(&m, &s)| if s != 0 { m.wrapping_neg() } else { m })
            .collect()
    }

    fn refinement_bits(&self, coeffs: &[i32], significance_flags: &[u8], bit_plane: u32) -> Vec<u8> {
        if coeffs.len() != significance_flags.len() {
            return Vec::new();
        }
        coeffs
            .iter()
            .zip(significance_flags)
            .map(|(&c, &f)| if f != 0 { sig(c, bit_plane) } else { 0 })
            .collect()
    }

    fn vlc_pattern(&self, coeffs: &[i32], bit_plane: u32, pair_count: usize) -> Vec<u8> {
        if pair_count.checked_mul(2).is_none_or(|n| coeffs.len() < n) {
            return Vec::new();
        }
        coeffs
            .chunks_exact(2)
            .take(pair_count)
            .map(|p| sig(p[0], bit_plane) | (sig(p[1], bit_plane) << 1))
            .collect()
    }

    fn max_abs_value(&self, coeffs: &[i32]) -> u32 {
        coeffs.iter().map(|c| c.unsigned_abs()).max().unwrap_or(0)
    }

    fn significance_count(&self, coeffs: &[i32], bit_plane: u32) -> usize {
        coeffs.iter().filter(|&&c| sig(c, bit_plane) == 1).count()
    }
}
