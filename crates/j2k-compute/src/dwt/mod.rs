//! Discrete wavelet transforms for JPEG 2000 tiles.
//!
//! Scalar reference implementation of the 1D, 2D and multi-level DWT. Every
//! other execution path (GPU kernels included) is checked against these
//! functions.
//!
//! # Architecture
//!
//! ```text
//! forward_multi_level / inverse_multi_level   (multilevel.rs)
//!     └── forward_2d / inverse_2d             (tile.rs, rayon over lines)
//!             └── Sample::lift_forward / lift_inverse
//!                     ├── i32: 5/3 integer lifting
//!                     └── f32: 5/3, 9/7, lifting schemes, FIR banks
//! ```
//!
//! # Example
//!
//! ```rust
//! use j2k_compute::dwt;
//! use j2k_core::FilterKernel;
//!
//! let x = [1, 2, 3, 4, 5, 6, 7, 8];
//! let (low, high) = dwt::forward_1d(&x, &FilterKernel::reversible53()).unwrap();
//! assert_eq!((low.len(), high.len()), (4, 4));
//! let y = dwt::inverse_1d(&low, &high, &FilterKernel::reversible53()).unwrap();
//! assert_eq!(y, x);
//! ```

mod convolution;
mod lifting;
mod multilevel;
mod tile;

pub use multilevel::{forward_multi_level, inverse_multi_level, resolve_levels};
pub use tile::{forward_2d, inverse_2d, quadrant_forward, quadrant_inverse};
pub(crate) use multilevel::{forward_levels_with, inverse_levels_with};
pub(crate) use tile::axis_pass;

use std::fmt::Debug;

use bytemuck::Pod;
use j2k_core::{Error, FilterKernel, Result, low_len};

/// Numeric type of a sample buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    /// 32-bit signed integers (reversible path).
    I32,
    /// 32-bit floats (irreversible path).
    F32,
}

/// A sample type the transforms can run on.
///
/// Implemented for `i32` and `f32`. Both are 4-byte [`Pod`] types, so buffers
/// can be handed to GPU kernels as raw words.
pub trait Sample: Pod + Default + PartialEq + Debug + Send + Sync + 'static {
    /// Runtime tag for this type.
    const KIND: SampleKind;

    /// True if `filter` can run on this sample type.
    fn supports(filter: &FilterKernel) -> bool;

    /// Forward transform of an interleaved line, in place.
    fn lift_forward(line: &mut [Self], filter: &FilterKernel) -> Result<()>;

    /// Inverse transform of an interleaved line, in place.
    fn lift_inverse(line: &mut [Self], filter: &FilterKernel) -> Result<()>;
}

impl Sample for i32 {
    const KIND: SampleKind = SampleKind::I32;

    fn supports(filter: &FilterKernel) -> bool {
        matches!(filter, FilterKernel::Reversible53)
    }

    fn lift_forward(line: &mut [Self], filter: &FilterKernel) -> Result<()> {
        match filter {
            FilterKernel::Reversible53 => lifting::forward_53(line),
            other => return Err(integer_filter_error(other)),
        }
        Ok(())
    }

    fn lift_inverse(line: &mut [Self], filter: &FilterKernel) -> Result<()> {
        match filter {
            FilterKernel::Reversible53 => lifting::inverse_53(line),
            other => return Err(integer_filter_error(other)),
        }
        Ok(())
    }
}

impl Sample for f32 {
    const KIND: SampleKind = SampleKind::F32;

    fn supports(_filter: &FilterKernel) -> bool {
        true
    }

    fn lift_forward(line: &mut [Self], filter: &FilterKernel) -> Result<()> {
        match filter {
            FilterKernel::Reversible53 => lifting::forward_53_f32(line),
            FilterKernel::Irreversible97 => lifting::forward_97(line),
            FilterKernel::Lifting(scheme) => lifting::forward_scheme(line, scheme),
            FilterKernel::Arbitrary(bank) => {
                let (low, high) = convolution::analyze(line, bank);
                interleave_into(&low, &high, line);
            }
        }
        Ok(())
    }

    fn lift_inverse(line: &mut [Self], filter: &FilterKernel) -> Result<()> {
        match filter {
            FilterKernel::Reversible53 => lifting::inverse_53_f32(line),
            FilterKernel::Irreversible97 => lifting::inverse_97(line),
            FilterKernel::Lifting(scheme) => lifting::inverse_scheme(line, scheme),
            FilterKernel::Arbitrary(bank) => {
                let (low, high) = deinterleave(line);
                let out = convolution::synthesize(&low, &high, bank);
                line.copy_from_slice(&out);
            }
        }
        Ok(())
    }
}

fn integer_filter_error(filter: &FilterKernel) -> Error {
    Error::unsupported(format!(
        "filter '{}' needs f32 samples; integer samples only support reversible53",
        filter.name()
    ))
}

/// Fails with [`Error::UnsupportedFeature`] if `T` cannot run `filter`.
pub fn ensure_supported<T: Sample>(filter: &FilterKernel) -> Result<()> {
    if T::supports(filter) {
        Ok(())
    } else {
        Err(match T::KIND {
            SampleKind::I32 => integer_filter_error(filter),
            SampleKind::F32 => Error::unsupported(format!("filter '{}' on f32", filter.name())),
        })
    }
}

/// Lifts one interleaved line, leaving short lines untouched.
///
/// Lines shorter than [`FilterKernel::min_lift_len`] get the lazy split only.
#[inline]
pub(crate) fn lift_line_forward<T: Sample>(line: &mut [T], filter: &FilterKernel) -> Result<()> {
    if line.len() < filter.min_lift_len() {
        return Ok(());
    }
    T::lift_forward(line, filter)
}

/// Inverse of [`lift_line_forward`].
#[inline]
pub(crate) fn lift_line_inverse<T: Sample>(line: &mut [T], filter: &FilterKernel) -> Result<()> {
    if line.len() < filter.min_lift_len() {
        return Ok(());
    }
    T::lift_inverse(line, filter)
}

/// Even samples, then odd samples.
pub(crate) fn deinterleave<T: Copy>(x: &[T]) -> (Vec<T>, Vec<T>) {
    let low = x.iter().step_by(2).copied().collect();
    let high = x.iter().skip(1).step_by(2).copied().collect();
    (low, high)
}

/// Writes `low` to even and `high` to odd positions of `out`.
pub(crate) fn interleave_into<T: Copy>(low: &[T], high: &[T], out: &mut [T]) {
    for (k, &v) in low.iter().enumerate() {
        out[2 * k] = v;
    }
    for (k, &v) in high.iter().enumerate() {
        out[2 * k + 1] = v;
    }
}

/// Forward 1D transform of one line.
///
/// Returns `(lowpass, highpass)` with lengths `ceil(n/2)` and `floor(n/2)`.
/// Lines shorter than four samples with the fixed filters (two for general
/// kernels) are split without lifting.
pub fn forward_1d<T: Sample>(signal: &[T], filter: &FilterKernel) -> Result<(Vec<T>, Vec<T>)> {
    ensure_supported::<T>(filter)?;
    let mut x = signal.to_vec();
    lift_line_forward(&mut x, filter)?;
    Ok(deinterleave(&x))
}

/// Inverse 1D transform.
///
/// `lowpass` must hold either as many samples as `highpass`, or one more.
pub fn inverse_1d<T: Sample>(lowpass: &[T], highpass: &[T], filter: &FilterKernel) -> Result<Vec<T>> {
    ensure_supported::<T>(filter)?;
    let n = lowpass.len() + highpass.len();
    if lowpass.len() != low_len(n) {
        return Err(Error::parameter(format!(
            "lowpass length {} and highpass length {} do not form a line",
            lowpass.len(),
            highpass.len()
        )));
    }
    let mut x = vec![T::default(); n];
    interleave_into(lowpass, highpass, &mut x);
    lift_line_inverse(&mut x, filter)?;
    Ok(x)
}
