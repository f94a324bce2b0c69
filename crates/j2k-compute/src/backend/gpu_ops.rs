//! Transform and bit-plane operations expressed over a [`KernelProvider`].
//!
//! Results match the scalar reference: bit for bit for the integer kernels,
//! within float tolerance for 9/7.

use j2k_core::error::check_buffer_len;
use j2k_core::{Error, FilterKernel, Result, SubbandSet};

use super::kernels::{GpuKernel, KernelParams, KernelProvider};
use crate::dwt::{Sample, SampleKind};

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::parameter(format!("{what} {value} exceeds the GPU addressable range")))
}

fn to_words<T: Sample>(samples: &[T]) -> Result<Vec<u32>> {
    bytemuck::try_cast_slice(samples)
        .map(<[u32]>::to_vec)
        .map_err(|e| Error::internal(format!("sample upload: {e}")))
}

fn from_words<T: Sample>(words: &[u32]) -> Result<Vec<T>> {
    bytemuck::try_cast_slice(words)
        .map(<[T]>::to_vec)
        .map_err(|e| Error::internal(format!("sample download: {e}")))
}

/// Runs `kernel` and checks the output size against the contract.
fn run_checked(provider: &dyn KernelProvider, kernel: GpuKernel, input: &[u32], params: KernelParams) -> Result<Vec<u32>> {
    let out = provider.run(kernel, input, params)?;
    let expected = kernel.output_words(&params);
    if out.len() != expected {
        return Err(Error::internal(format!(
            "{} on {}: returned {} words, expected {expected}",
            kernel.name(),
            provider.name(),
            out.len()
        )));
    }
    Ok(out)
}

/// Forward and inverse DWT kernels for a sample type and filter.
///
/// Only the fixed filters have GPU kernels: 5/3 on `i32`, 9/7 on `f32`.
/// A fixed filter on the other sample type is [`Error::NotImplemented`];
/// general kernels are [`Error::UnsupportedFeature`].
pub fn dwt_kernels<T: Sample>(filter: &FilterKernel) -> Result<(GpuKernel, GpuKernel)> {
    crate::dwt::ensure_supported::<T>(filter)?;
    match (T::KIND, filter) {
        (SampleKind::I32, FilterKernel::Reversible53) => Ok((GpuKernel::Dwt53Forward, GpuKernel::Dwt53Inverse)),
        (SampleKind::F32, FilterKernel::Irreversible97) => Ok((GpuKernel::Dwt97Forward, GpuKernel::Dwt97Inverse)),
        (kind, filter) if filter.is_gpu_capable() => Err(Error::not_implemented(
            format!("GPU '{}' kernel on {kind:?} samples", filter.name()),
            "Backend::Cpu or Backend::Auto",
        )),
        (kind, filter) => Err(Error::unsupported(format!(
            "no GPU kernel for filter '{}' on {kind:?} samples",
            filter.name()
        ))),
    }
}

/// One forward 2D level on the provider.
pub fn forward_2d<T: Sample>(
    provider: &dyn KernelProvider,
    data: &[T],
    width: usize,
    height: usize,
    filter: &FilterKernel,
) -> Result<SubbandSet<T>> {
    if width < 2 || height < 2 {
        return Err(Error::parameter(format!("2D transform needs at least 2x2 samples, got {width}x{height}")));
    }
    check_buffer_len(data.len(), width, height)?;
    let (forward, _) = dwt_kernels::<T>(filter)?;
    let (w, h) = (to_u32(width, "width")?, to_u32(height, "height")?);

    let rows = run_checked(provider, forward, &to_words(data)?, KernelParams::dwt(w, h, 0))?;
    let quads = run_checked(provider, forward, &rows, KernelParams::dwt(w, h, 1))?;
    SubbandSet::from_quadrants(&from_words::<T>(&quads)?, width, height)
}

/// One inverse 2D level on the provider.
pub fn inverse_2d<T: Sample>(
    provider: &dyn KernelProvider,
    subbands: &SubbandSet<T>,
    filter: &FilterKernel,
) -> Result<Vec<T>> {
    let (width, height) = (subbands.width, subbands.height);
    if width < 2 || height < 2 {
        return Err(Error::parameter(format!("2D transform needs at least 2x2 samples, got {width}x{height}")));
    }
    let (_, inverse) = dwt_kernels::<T>(filter)?;
    let (w, h) = (to_u32(width, "width")?, to_u32(height, "height")?);

    let quads = to_words(&subbands.to_quadrants()?)?;
    let cols = run_checked(provider, inverse, &quads, KernelParams::dwt(w, h, 1))?;
    let rows = run_checked(provider, inverse, &cols, KernelParams::dwt(w, h, 0))?;
    from_words(&rows)
}

/// Significance bits computed on the provider.
pub fn significance(provider: &dyn KernelProvider, coeffs: &[i32], bit_plane: u32) -> Result<Vec<u8>> {
    if coeffs.is_empty() || bit_plane >= 32 {
        return Ok(vec![0; coeffs.len()]);
    }
    let params = KernelParams::bitplane(to_u32(coeffs.len(), "coefficient count")?, bit_plane);
    let words = run_checked(provider, GpuKernel::Significance, bytemuck::cast_slice(coeffs), params)?;
    Ok(words.into_iter().map(|w| w as u8).collect())
}

/// Magnitudes and sign bits computed on the provider.
pub fn magnitude_sign_separate(provider: &dyn KernelProvider, coeffs: &[i32]) -> Result<(Vec<i32>, Vec<u8>)> {
    if coeffs.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }
    let params = KernelParams::bitplane(to_u32(coeffs.len(), "coefficient count")?, 0);
    let words = run_checked(provider, GpuKernel::MagnitudeSign, bytemuck::cast_slice(coeffs), params)?;
    let (mags, signs) = words.split_at(coeffs.len());
    Ok((
        bytemuck::cast_slice(mags).to_vec(),
        signs.iter().map(|&s| s as u8).collect(),
    ))
}

/// Largest magnitude; chunk maxima come back from the provider and are reduced here.
pub fn max_abs_value(provider: &dyn KernelProvider, coeffs: &[i32]) -> Result<u32> {
    if coeffs.is_empty() {
        return Ok(0);
    }
    let params = KernelParams::bitplane(to_u32(coeffs.len(), "coefficient count")?, 0);
    let partials = run_checked(provider, GpuKernel::MaxAbs, bytemuck::cast_slice(coeffs), params)?;
    Ok(partials.into_iter().max().unwrap_or(0))
}

/// Significant coefficient count, reduced from the provider's significance bits.
pub fn significance_count(provider: &dyn KernelProvider, coeffs: &[i32], bit_plane: u32) -> Result<usize> {
    Ok(significance(provider, coeffs, bit_plane)?
        .into_iter()
        .filter(|&b| b == 1)
        .count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuKernels;

    #[test]
    fn test_kernel_pick() {
        assert_eq!(dwt_kernels::<i32>(&FilterKernel::reversible53()).unwrap().0, GpuKernel::Dwt53Forward);
        assert_eq!(dwt_kernels::<f32>(&FilterKernel::irreversible97()).unwrap().1, GpuKernel::Dwt97Inverse);
        assert!(dwt_kernels::<f32>(&FilterKernel::lifting_cdf97()).unwrap_err().is_unsupported());
        assert!(matches!(
            dwt_kernels::<f32>(&FilterKernel::reversible53()),
            Err(Error::NotImplemented { .. })
        ));
        assert!(dwt_kernels::<i32>(&FilterKernel::irreversible97()).unwrap_err().is_unsupported());
    }

    #[test]
    fn test_emulated_matches_scalar() {
        let provider = CpuKernels::new();
        let data: Vec<i32> = (0..9 * 7).map(|i| (i * 13 % 29) - 14).collect();
        let filter = FilterKernel::reversible53();

        let gpu = forward_2d(&provider, &data, 9, 7, &filter).unwrap();
        let cpu = crate::dwt::forward_2d(&data, 9, 7, &filter).unwrap();
        assert_eq!(gpu, cpu);
        assert_eq!(inverse_2d(&provider, &gpu, &filter).unwrap(), data);
    }

    #[test]
    fn test_bitplane_ops() {
        let provider = CpuKernels::new();
        let coeffs = [8, 7, 16, -9, 0, 4, -24, 15];
        assert_eq!(significance(&provider, &coeffs, 3).unwrap(), vec![1, 0, 0, 1, 0, 0, 1, 1]);
        assert_eq!(significance_count(&provider, &coeffs, 3).unwrap(), 4);
        assert_eq!(max_abs_value(&provider, &coeffs).unwrap(), 24);
        assert_eq!(max_abs_value(&provider, &[]).unwrap(), 0);
        let (m, s) = magnitude_sign_separate(&provider, &[10, -20, 0, 30, -5]).unwrap();
        assert_eq!(m, vec![10, 20, 0, 30, 5]);
        assert_eq!(s, vec![0, 1, 0, 0, 1]);
    }
}
