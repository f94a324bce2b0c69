//! Separable 2D transform of one tile.
//!
//! Rows first, then columns. Columns are transposed into contiguous lines so
//! both passes run the same line kernel under `rayon`. After the row pass
//! every row holds `[lowpass | highpass]`; after the column pass the buffer is
//! in quadrant layout (see [`SubbandSet::from_quadrants`]).

use rayon::prelude::*;

use j2k_core::error::check_buffer_len;
use j2k_core::{Error, FilterKernel, Result, SubbandSet, low_len};

use super::{Sample, ensure_supported, lift_line_forward, lift_line_inverse};

/// Row-major `width x height` to row-major `height x width`.
fn transpose<T: Copy + Send + Sync>(src: &[T], width: usize, height: usize) -> Vec<T> {
    let mut out = src.to_vec();
    out.par_chunks_mut(height).enumerate().for_each(|(x, line)| {
        for (y, v) in line.iter_mut().enumerate() {
            *v = src[y * width + x];
        }
    });
    out
}

/// Lifts every `len`-sample line of `buf` and packs it as `[low | high]`.
fn split_lines<T: Sample>(buf: &mut [T], len: usize, filter: &FilterKernel) -> Result<()> {
    let lo = low_len(len);
    buf.par_chunks_mut(len).try_for_each_init(
        || vec![T::default(); len],
        |scratch, line| {
            lift_line_forward(line, filter)?;
            for (i, &v) in line.iter().enumerate() {
                let dst = if i % 2 == 0 { i / 2 } else { lo + i / 2 };
                scratch[dst] = v;
            }
            line.copy_from_slice(scratch);
            Ok(())
        },
    )
}

/// Unpacks every `[low | high]` line of `buf` and undoes the lifting.
fn merge_lines<T: Sample>(buf: &mut [T], len: usize, filter: &FilterKernel) -> Result<()> {
    let lo = low_len(len);
    buf.par_chunks_mut(len).try_for_each_init(
        || vec![T::default(); len],
        |scratch, line| {
            for (i, v) in scratch.iter_mut().enumerate() {
                *v = if i % 2 == 0 { line[i / 2] } else { line[lo + i / 2] };
            }
            line.copy_from_slice(scratch);
            lift_line_inverse(line, filter)
        },
    )
}

/// One separable pass over every row (`axis == 0`) or column (`axis != 0`).
///
/// `forward` lifts and packs each line as `[low | high]`; otherwise the
/// packed layout is unpacked and the lifting undone.
pub(crate) fn axis_pass<T: Sample>(
    buf: &mut [T],
    width: usize,
    height: usize,
    axis: u32,
    filter: &FilterKernel,
    forward: bool,
) -> Result<()> {
    let pass = |lines: &mut [T], len: usize| {
        if forward {
            split_lines(lines, len, filter)
        } else {
            merge_lines(lines, len, filter)
        }
    };
    if axis == 0 {
        return pass(buf, width);
    }
    let mut cols = transpose(buf, width, height);
    pass(&mut cols, height)?;
    buf.copy_from_slice(&transpose(&cols, height, width));
    Ok(())
}

fn check_dims(len: usize, width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::parameter(format!("tile dimensions must be positive, got {width}x{height}")));
    }
    check_buffer_len(len, width, height)
}

/// Forward 2D transform in place, leaving the buffer in quadrant layout.
///
/// Unlike [`forward_2d`] this accepts 1-sample-wide or tall tiles (the short
/// axis is just a lazy split).
pub fn quadrant_forward<T: Sample>(buf: &mut [T], width: usize, height: usize, filter: &FilterKernel) -> Result<()> {
    ensure_supported::<T>(filter)?;
    check_dims(buf.len(), width, height)?;

    axis_pass(buf, width, height, 0, filter, true)?;
    axis_pass(buf, width, height, 1, filter, true)
}

/// Inverse of [`quadrant_forward`].
pub fn quadrant_inverse<T: Sample>(buf: &mut [T], width: usize, height: usize, filter: &FilterKernel) -> Result<()> {
    ensure_supported::<T>(filter)?;
    check_dims(buf.len(), width, height)?;

    axis_pass(buf, width, height, 1, filter, false)?;
    axis_pass(buf, width, height, 0, filter, false)
}

fn check_min_size(width: usize, height: usize) -> Result<()> {
    if width < 2 || height < 2 {
        return Err(Error::parameter(format!("2D transform needs at least 2x2 samples, got {width}x{height}")));
    }
    Ok(())
}

/// One level of the forward 2D DWT.
///
/// Fails with a parameter error unless `data.len() == width * height` and
/// both dimensions are at least 2.
pub fn forward_2d<T: Sample>(data: &[T], width: usize, height: usize, filter: &FilterKernel) -> Result<SubbandSet<T>> {
    check_min_size(width, height)?;
    check_buffer_len(data.len(), width, height)?;

    let mut buf = data.to_vec();
    quadrant_forward(&mut buf, width, height, filter)?;
    SubbandSet::from_quadrants(&buf, width, height)
}

/// One level of the inverse 2D DWT.
pub fn inverse_2d<T: Sample>(subbands: &SubbandSet<T>, filter: &FilterKernel) -> Result<Vec<T>> {
    check_min_size(subbands.width, subbands.height)?;
    let mut buf = subbands.to_quadrants()?;
    quadrant_inverse(&mut buf, subbands.width, subbands.height, filter)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(w: usize, h: usize) -> Vec<i32> {
        (0..w * h).map(|i| ((i * 31 + 7) % 255) as i32 - 128).collect()
    }

    #[test]
    fn test_transpose() {
        let src = [1, 2, 3, 4, 5, 6]; // 3x2
        assert_eq!(transpose(&src, 3, 2), vec![1, 4, 2, 5, 3, 6]);
    }

    #[test]
    fn test_53_roundtrip_odd_dims() {
        let filter = FilterKernel::reversible53();
        for (w, h) in [(2, 2), (3, 5), (8, 8), (17, 9), (64, 33)] {
            let data = pattern(w, h);
            let set = forward_2d(&data, w, h, &filter).unwrap();
            assert_eq!(set.approximation.len(), w.div_ceil(2) * h.div_ceil(2));
            assert_eq!(set.horizontal.len(), (w / 2) * h.div_ceil(2));
            assert_eq!(set.vertical.len(), w.div_ceil(2) * (h / 2));
            assert_eq!(set.diagonal.len(), (w / 2) * (h / 2));
            assert_eq!(inverse_2d(&set, &filter).unwrap(), data, "{w}x{h}");
        }
    }

    #[test]
    fn test_97_roundtrip() {
        let filter = FilterKernel::irreversible97();
        let data: Vec<f32> = pattern(24, 19).iter().map(|&v| v as f32).collect();
        let set = forward_2d(&data, 24, 19, &filter).unwrap();
        let back = inverse_2d(&set, &filter).unwrap();
        for (a, b) in data.iter().zip(&back) {
            approx::assert_abs_diff_eq!(a, b, epsilon = 0.05);
        }
    }

    #[test]
    fn test_rejects_bad_shapes() {
        let filter = FilterKernel::reversible53();
        assert!(forward_2d(&[0i32; 10], 4, 3, &filter).unwrap_err().is_parameter());
        assert!(forward_2d(&[0i32; 4], 1, 4, &filter).unwrap_err().is_parameter());
        assert!(forward_2d(&[0i32; 4], 4, 1, &filter).unwrap_err().is_parameter());
    }

    #[test]
    fn test_constant_columns_match_row_transform() {
        // Identical rows: the column pass sees constant lines, so only the row transform shows.
        let filter = FilterKernel::reversible53();
        let row = [3, 9, -2, 5, 11, 0];
        let data: Vec<i32> = row.iter().copied().cycle().take(row.len() * 4).collect();
        let set = forward_2d(&data, 6, 4, &filter).unwrap();
        let (low, high) = crate::dwt::forward_1d(&row, &filter).unwrap();

        assert!(set.vertical.iter().all(|&v| v == 0));
        assert!(set.diagonal.iter().all(|&v| v == 0));
        assert_eq!(&set.approximation[..3], low.as_slice());
        assert_eq!(&set.horizontal[..3], high.as_slice());
    }

    #[test]
    fn test_quadrant_accepts_single_column() {
        let filter = FilterKernel::reversible53();
        let mut buf = vec![1, 2, 3, 4, 5];
        quadrant_forward(&mut buf, 1, 5, &filter).unwrap();
        quadrant_inverse(&mut buf, 1, 5, &filter).unwrap();
        assert_eq!(buf, vec![1, 2, 3, 4, 5]);
    }
}
