//! Bit-plane coefficient primitives feeding the entropy coder.
//!
//! All operations take 32-bit signed coefficients. Two strategies implement
//! [`BitPlaneOps`]:
//!
//! - [`ScalarBitPlane`] - one element at a time, the reference
//! - [`SimdBitPlane`] - 8 lanes on `wide::i32x8` with a scalar tail
//!
//! The free functions in this module use the strategy picked by
//! [`strategy_for`] from the detected [`Capabilities`].
//!
//! # Conventions
//!
//! - bits, signs, significance flags and VLC patterns are `u8` (0 or 1,
//!   patterns 0..=3); any non-zero flag counts as set
//! - magnitudes use wrapping `abs`, so `|i32::MIN|` stays `i32::MIN`
//!   (its bit pattern is still `2^31`); [`max_abs_value`] returns `u32`
//! - bit planes `>= 32` are all zero
//! - `reconstruct`, `refinement_bits` and `vlc_pattern` return an empty
//!   vector on mismatched input lengths
//!
//! # Example
//!
//! ```rust
//! use j2k_compute::bitplane;
//!
//! let bits = bitplane::significance(&[8, 7, 16, -9, 0, 4, -24, 15], 3);
//! assert_eq!(bits, vec![1, 0, 0, 1, 0, 0, 1, 1]);
//! ```

mod scalar;
mod simd;

pub use scalar::ScalarBitPlane;
pub use simd::SimdBitPlane;

use crate::backend::Capabilities;

/// Batch bit-plane operations over a coefficient block.
pub trait BitPlaneOps: Send + Sync {
    /// Strategy name, for logs and benchmarks.
    fn name(&self) -> &'static str;

    /// `(|c| >> bit_plane) & 1` per coefficient.
    fn significance(&self, coeffs: &[i32], bit_plane: u32) -> Vec<u8>;

    /// Splits coefficients into magnitudes and sign bits (1 = negative).
    fn magnitude_sign_separate(&self, coeffs: &[i32]) -> (Vec<i32>, Vec<u8>);

    /// Inverse of [`BitPlaneOps::magnitude_sign_separate`].
    fn reconstruct(&self, magnitudes: &[i32], signs: &[u8]) -> Vec<i32>;

    /// Significance bits masked by `significance_flags`.
    fn refinement_bits(&self, coeffs: &[i32], significance_flags: &[u8], bit_plane: u32) -> Vec<u8>;

    /// Two-bit patterns `sig(c0) | sig(c1) << 1` over the first `pair_count` pairs.
    fn vlc_pattern(&self, coeffs: &[i32], bit_plane: u32, pair_count: usize) -> Vec<u8>;

    /// Largest magnitude, 0 for an empty block.
    fn max_abs_value(&self, coeffs: &[i32]) -> u32;

    /// Number of significant coefficients.
    fn significance_count(&self, coeffs: &[i32], bit_plane: u32) -> usize;
}

static SCALAR: ScalarBitPlane = ScalarBitPlane;
static SIMD: SimdBitPlane = SimdBitPlane;

/// Picks the bit-plane strategy for `caps`.
///
/// Hosts without a vector unit get the scalar reference; everything else gets
/// the 8-lane path.
pub fn strategy_for(caps: &Capabilities) -> &'static dyn BitPlaneOps {
    if caps.vector_width > 1 { &SIMD } else { &SCALAR }
}

fn ops() -> &'static dyn BitPlaneOps {
    strategy_for(Capabilities::detect())
}

/// See [`BitPlaneOps::significance`].
pub fn significance(coeffs: &[i32], bit_plane: u32) -> Vec<u8> {
    ops().significance(coeffs, bit_plane)
}

/// See [`BitPlaneOps::magnitude_sign_separate`].
pub fn magnitude_sign_separate(coeffs: &[i32]) -> (Vec<i32>, Vec<u8>) {
    ops().magnitude_sign_separate(coeffs)
}

/// See [`BitPlaneOps::reconstruct`].
pub fn reconstruct(magnitudes: &[i32], signs: &[u8]) -> Vec<i32> {
    ops().reconstruct(magnitudes, signs)
}

/// See [`BitPlaneOps::refinement_bits`].
pub fn refinement_bits(coeffs: &[i32], significance_flags: &[u8], bit_plane: u32) -> Vec<u8> {
    ops().refinement_bits(coeffs, significance_flags, bit_plane)
}

/// See [`BitPlaneOps::vlc_pattern`].
pub fn vlc_pattern(coeffs: &[i32], bit_plane: u32, pair_count: usize) -> Vec<u8> {
    ops().vlc_pattern(coeffs, bit_plane, pair_count)
}

/// See [`BitPlaneOps::max_abs_value`].
pub fn max_abs_value(coeffs: &[i32]) -> u32 {
    ops().max_abs_value(coeffs)
}

/// See [`BitPlaneOps::significance_count`].
pub fn significance_count(coeffs: &[i32], bit_plane: u32) -> usize {
    ops().significance_count(coeffs, bit_plane)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SimdFamily;

    #[test]
    fn test_strategy_selection() {
        assert_eq!(strategy_for(&Capabilities::scalar_only()).name(), "scalar");
        let caps = Capabilities::new(SimdFamily::Avx2, false, 8);
        assert_eq!(strategy_for(&caps).name(), "simd-i32x8");
    }

    #[test]
    fn test_free_functions() {
        let coeffs = [10, -20, 0, 30, -5];
        let (mags, signs) = magnitude_sign_separate(&coeffs);
        assert_eq!(reconstruct(&mags, &signs), coeffs.to_vec());
        assert_eq!(max_abs_value(&coeffs), 30);
        assert_eq!(significance_count(&coeffs, 2), 3); // 20, 30, 5
        assert_eq!(refinement_bits(&coeffs, &[1, 1, 1, 0, 0], 2), vec![0, 1, 0, 0, 0]);
        assert_eq!(vlc_pattern(&coeffs, 2, 2), vec![0b10, 0b10]);
    }
}
