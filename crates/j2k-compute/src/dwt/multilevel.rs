//! Multi-level (pyramid) decomposition.
//!
//! Level 0 transforms the full tile; every further level transforms the
//! previous approximation. Levels are strictly sequential.

use tracing::trace;

use j2k_core::error::check_buffer_len;
use j2k_core::{Decomposition, Error, FilterKernel, Result, SubbandSet, max_levels};

use super::{Sample, forward_2d, inverse_2d};

/// Number of levels actually run for a `width x height` tile.
///
/// `requested` falls back to `default_levels`, and the result is clamped to
/// [`max_levels`] so no subband is ever smaller than 1x1.
pub fn resolve_levels(requested: Option<u32>, default_levels: u32, width: usize, height: usize) -> u32 {
    requested.unwrap_or(default_levels).min(max_levels(width, height))
}

/// Runs `levels` forward steps, feeding each approximation to the next.
///
/// `step` receives `(input, width, height, level)` and must return the
/// subbands of that level. Shared by the scalar driver and the processor,
/// which routes every level to its own backend.
pub(crate) fn forward_levels_with<T, F>(
    data: &[T],
    width: usize,
    height: usize,
    levels: u32,
    mut step: F,
) -> Result<Decomposition<T>>
where
    T: Sample,
    F: FnMut(&[T], usize, usize, u32) -> Result<SubbandSet<T>>,
{
    let mut approximation = data.to_vec();
    let (mut w, mut h) = (width, height);
    let mut details = Vec::with_capacity(levels as usize);

    for level in 0..levels {
        trace!(level, width = w, height = h, "forward DWT level");
        let set = step(&approximation, w, h, level)?;
        let (lw, lh) = set.approx_dims();
        let (approx, detail) = set.into_parts();
        approximation = approx;
        details.push(detail);
        w = lw;
        h = lh;
    }

    Ok(Decomposition { approximation, width, height, levels: details })
}

/// Undoes a decomposition from the deepest level up.
///
/// `step` receives the reassembled subbands of one level and its index.
pub(crate) fn inverse_levels_with<T, F>(decomposition: &Decomposition<T>, mut step: F) -> Result<Vec<T>>
where
    T: Sample,
    F: FnMut(&SubbandSet<T>, u32) -> Result<Vec<T>>,
{
    if decomposition.levels.is_empty() {
        return Err(Error::parameter("decomposition has no levels to reconstruct from"));
    }
    let (aw, ah) = decomposition.approx_dims();
    check_buffer_len(decomposition.approximation.len(), aw, ah)?;

    let mut approximation = decomposition.approximation.clone();
    for (level, detail) in decomposition.levels.iter().enumerate().rev() {
        trace!(level, width = detail.width, height = detail.height, "inverse DWT level");
        let set = SubbandSet::from_parts(approximation, detail.clone());
        approximation = step(&set, level as u32)?;
    }
    Ok(approximation)
}

/// Forward multi-level decomposition.
///
/// `levels` of `None` uses `default_levels`; either way the count is clamped
/// to what the tile supports. A tile too small for even one level yields an
/// empty level list with the input as approximation.
pub fn forward_multi_level<T: Sample>(
    data: &[T],
    width: usize,
    height: usize,
    levels: Option<u32>,
    filter: &FilterKernel,
    default_levels: u32,
) -> Result<Decomposition<T>> {
    if width == 0 || height == 0 {
        return Err(Error::parameter(format!("tile dimensions must be positive, got {width}x{height}")));
    }
    check_buffer_len(data.len(), width, height)?;
    super::ensure_supported::<T>(filter)?;

    let levels = resolve_levels(levels, default_levels, width, height);
    forward_levels_with(data, width, height, levels, |input, w, h, _| forward_2d(input, w, h, filter))
}

/// Inverse multi-level decomposition.
///
/// Fails with a parameter error on an empty level list.
pub fn inverse_multi_level<T: Sample>(decomposition: &Decomposition<T>, filter: &FilterKernel) -> Result<Vec<T>> {
    super::ensure_supported::<T>(filter)?;
    inverse_levels_with(decomposition, |set, _| inverse_2d(set, filter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_levels() {
        assert_eq!(resolve_levels(None, 5, 256, 256), 5);
        assert_eq!(resolve_levels(Some(100), 5, 8, 8), 3);
        assert_eq!(resolve_levels(Some(2), 5, 8, 8), 2);
        assert_eq!(resolve_levels(None, 5, 1, 64), 0);
    }

    #[test]
    fn test_53_three_levels() {
        let data: Vec<i32> = (0..32 * 20).map(|i| (i % 37) * 3 - 50).collect();
        let filter = FilterKernel::reversible53();
        let dec = forward_multi_level(&data, 32, 20, Some(3), &filter, 5).unwrap();

        assert_eq!(dec.level_count(), 3);
        assert_eq!((dec.levels[0].width, dec.levels[0].height), (32, 20));
        assert_eq!((dec.levels[1].width, dec.levels[1].height), (16, 10));
        assert_eq!((dec.levels[2].width, dec.levels[2].height), (8, 5));
        assert_eq!(dec.approx_dims(), (4, 3));
        assert_eq!(dec.approximation.len(), 12);

        assert_eq!(inverse_multi_level(&dec, &filter).unwrap(), data);
    }

    #[test]
    fn test_zero_levels_keeps_input() {
        let data = vec![1.0f32, 2.0, 3.0];
        let dec = forward_multi_level(&data, 1, 3, None, &FilterKernel::irreversible97(), 5).unwrap();
        assert_eq!(dec.level_count(), 0);
        assert_eq!(dec.approximation, data);
        assert!(inverse_multi_level(&dec, &FilterKernel::irreversible97()).unwrap_err().is_parameter());
    }

    #[test]
    fn test_inverse_checks_approximation_size() {
        let data: Vec<i32> = (0..64).collect();
        let filter = FilterKernel::reversible53();
        let mut dec = forward_multi_level(&data, 8, 8, Some(2), &filter, 5).unwrap();
        dec.approximation.pop();
        assert!(inverse_multi_level(&dec, &filter).unwrap_err().is_parameter());
    }
}
