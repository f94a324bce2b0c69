//! 8-lane bit-plane primitives on `wide::i32x8`.
//!
//! Each routine runs full 8-lane chunks, then finishes the remainder with the
//! scalar code from [`super::scalar`]. Comparisons are expressed with shifts
//! and masks:
//!
//! ```text
//! sign(v)      = (v >> 31) & 1          arithmetic shift
//! nonzero(f)   = (f | -f) >> 31         -1 if f != 0, else 0
//! abs(v)       = (v ^ s) - s            s = v >> 31, wrapping
//! umax(a, b)   = max(a ^ MIN, b ^ MIN) ^ MIN
//! ```

use wide::i32x8;

use super::BitPlaneOps;
use super::scalar::{ScalarBitPlane, sig};

const LANES: usize = 8;

#[inline(always)]
fn load(chunk: &[i32]) -> i32x8 {
    let mut a = [0i32; LANES];
    a.copy_from_slice(chunk);
    i32x8::from(a)
}

#[inline(always)]
fn load_u8(chunk: &[u8]) -> i32x8 {
    let mut a = [0i32; LANES];
    for (dst, &b) in a.iter_mut().zip(chunk) {
        *dst = b as i32;
    }
    i32x8::from(a)
}

#[inline(always)]
fn abs(v: i32x8) -> i32x8 {
    let s = v >> 31;
    (v ^ s) - s
}

#[inline(always)]
fn nonzero_mask(v: i32x8) -> i32x8 {
    (v | (i32x8::splat(0) - v)) >> 31
}

/// Bit `bit_plane` of `|v|` per lane. `bit_plane` must be below 32.
#[inline(always)]
fn sig8(v: i32x8, bit_plane: u32) -> i32x8 {
    (abs(v) >> bit_plane) & i32x8::splat(1)
}

fn push_u8(out: &mut Vec<u8>, v: i32x8) {
    out.extend(v.to_array().iter().map(|&x| x as u8));
}

/// SIMD strategy. Results are identical to [`ScalarBitPlane`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SimdBitPlane;

impl BitPlaneOps for SimdBitPlane {
    fn name(&self) -> &'static str {
        "simd-i32x8"
    }

    fn significance(&self, coeffs: &[i32], bit_plane: u32) -> Vec<u8> {
        if bit_plane >= 32 {
            return vec![0; coeffs.len()];
        }
        let mut out = Vec::with_capacity(coeffs.len());
        let chunks = coeffs.chunks_exact(LANES);
        let tail = chunks.remainder();
        for chunk in chunks {
            push_u8(&mut out, sig8(load(chunk), bit_plane));
        }
        out.extend(tail.iter().map(|&c| sig(c, bit_plane)));
        out
    }

    fn magnitude_sign_separate(&self, coeffs: &[i32]) -> (Vec<i32>, Vec<u8>) {
        let mut mags = Vec::with_capacity(coeffs.len());
        let mut signs = Vec::with_capacity(coeffs.len());
        let chunks = coeffs.chunks_exact(LANES);
        let tail = chunks.remainder();
        let one = i32x8::splat(1);
        for chunk in chunks {
            let v = load(chunk);
            mags.extend_from_slice(&abs(v).to_array());
            push_u8(&mut signs, (v >> 31) & one);
        }
        for &c in tail {
            mags.push(c.wrapping_abs());
            signs.push(u8::from(c < 0));
        }
        (mags, signs)
    }

    fn reconstruct(&self, magnitudes: &[i32], signs: &[u8]) -> Vec<i32> {
        if magnitudes.len() != signs.len() {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(magnitudes.len());
        let chunks = magnitudes.chunks_exact(LANES);
        let split = magnitudes.len() - chunks.remainder().len();
        for (m, s) in chunks.zip(signs.chunks_exact(LANES)) {
            let mask = nonzero_mask(load_u8(s));
            out.extend_from_slice(&((load(m) ^ mask) - mask).to_array());
        }
        out.extend(ScalarBitPlane.reconstruct(&magnitudes[split..], &signs[split..]));
        out
    }

    fn refinement_bits(&self, coeffs: &[i32], significance_flags: &[u8], bit_plane: u32) -> Vec<u8> {
        if coeffs.len() != significance_flags.len() {
            return Vec::new();
        }
        if bit_plane >= 32 {
            return vec![0; coeffs.len()];
        }
        let mut out = Vec::with_capacity(coeffs.len());
        let chunks = coeffs.chunks_exact(LANES);
        let split = coeffs.len() - chunks.remainder().len();
        for (c, f) in chunks.zip(significance_flags.chunks_exact(LANES)) {
            push_u8(&mut out, sig8(load(c), bit_plane) & nonzero_mask(load_u8(f)));
        }
        out.extend(ScalarBitPlane.refinement_bits(&coeffs[split..], &significance_flags[split..], bit_plane));
        out
    }

    fn vlc_pattern(&self, coeffs: &[i32], bit_plane: u32, pair_count: usize) -> Vec<u8> {
        if pair_count.checked_mul(2).is_none_or(|n| coeffs.len() < n) {
            return Vec::new();
        }
        if bit_plane >= 32 {
            return vec![0; pair_count];
        }
        let pairs = &coeffs[..2 * pair_count];
        let mut out = Vec::with_capacity(pair_count);
        let chunks = pairs.chunks_exact(2 * LANES);
        let tail = chunks.remainder();
        for chunk in chunks {
            let mut even = [0i32; LANES];
            let mut odd = [0i32; LANES];
            for k in 0..LANES {
                even[k] = chunk[2 * k];
                odd[k] = chunk[2 * k + 1];
            }
            let p = sig8(i32x8::from(even), bit_plane) | (sig8(i32x8::from(odd), bit_plane) << 1);
            push_u8(&mut out, p);
        }
        out.extend(ScalarBitPlane.vlc_pattern(tail, bit_plane, tail.len() / 2));
        out
    }

    fn max_abs_value(&self, coeffs: &[i32]) -> u32 {
        let bias = i32x8::splat(i32::MIN);
        let chunks = coeffs.chunks_exact(LANES);
        let tail = chunks.remainder();
        // lanes hold |v| ^ MIN so signed max orders them as unsigned
        let mut acc = bias;
        for chunk in chunks {
            acc = acc.max(abs(load(chunk)) ^ bias);
        }
        let vector_max = acc
            .to_array()
            .iter()
            .map(|&x| (x ^ i32::MIN) as u32)
            .max()
            .unwrap_or(0);
        vector_max.max(ScalarBitPlane.max_abs_value(tail))
    }

    fn significance_count(&self, coeffs: &[i32], bit_plane: u32) -> usize {
        if bit_plane >= 32 {
            return 0;
        }
        let chunks = coeffs.chunks_exact(LANES);
        let tail = chunks.remainder();
        let mut acc = i32x8::splat(0);
        for chunk in chunks {
            acc = acc + sig8(load(chunk), bit_plane);
        }
        let vector: usize = acc.to_array().iter().map(|&x| x as u32 as usize).sum();
        vector + ScalarBitPlane.significance_count(tail, bit_plane)
    }
}
