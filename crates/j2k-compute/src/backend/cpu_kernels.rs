//! CPU emulation of the GPU kernel set.
//!
//! Serves the exact [`KernelProvider`] word-buffer contract with the scalar
//! reference code. Used as the GPU stand-in for parity tests and on hosts
//! without an adapter; capability detection never reports it as a GPU.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use j2k_core::{Error, FilterKernel, Result};

use super::kernels::{GpuKernel, KernelParams, KernelProvider, MAX_ABS_CHUNK};
use crate::bitplane::{BitPlaneOps, ScalarBitPlane};
use crate::dwt::{Sample, axis_pass};

/// Kernel provider that runs everything on the calling thread pool.
#[derive(Debug, Default)]
pub struct CpuKernels {
    compiled: Mutex<HashSet<GpuKernel>>,
}

impl CpuKernels {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

fn line_pass<T: Sample>(input: &[u32], params: &KernelParams, filter: &FilterKernel, forward: bool) -> Result<Vec<u32>> {
    let [w, h, axis, _] = params.dims;
    if w == 0 || h == 0 {
        return Ok(Vec::new());
    }
    let samples: &[T] = bytemuck::try_cast_slice(input).map_err(|e| Error::internal(format!("cast: {e}")))?;
    let mut buf = samples.to_vec();
    axis_pass(&mut buf, w as usize, h as usize, axis, filter, forward)?;
    Ok(bytemuck::cast_slice(&buf).to_vec())
}

fn emulate(kernel: GpuKernel, input: &[u32], params: &KernelParams) -> Result<Vec<u32>> {
    let coeffs: &[i32] = bytemuck::cast_slice(input);
    let words = match kernel {
        GpuKernel::Dwt53Forward => line_pass::<i32>(input, params, &FilterKernel::Reversible53, true)?,
        GpuKernel::Dwt53Inverse => line_pass::<i32>(input, params, &FilterKernel::Reversible53, false)?,
        GpuKernel::Dwt97Forward => line_pass::<f32>(input, params, &FilterKernel::Irreversible97, true)?,
        GpuKernel::Dwt97Inverse => line_pass::<f32>(input, params, &FilterKernel::Irreversible97, false)?,
        GpuKernel::Significance => ScalarBitPlane
            .significance(coeffs, params.dims[1])
            .into_iter()
            .map(u32::from)
            .collect(),
        GpuKernel::MagnitudeSign => {
            let (mags, signs) = ScalarBitPlane.magnitude_sign_separate(coeffs);
            let mut out: Vec<u32> = bytemuck::cast_slice(&mags).to_vec();
            out.extend(signs.into_iter().map(u32::from));
            out
        }
        GpuKernel::MaxAbs => coeffs
            .chunks(MAX_ABS_CHUNK)
            .map(|chunk| ScalarBitPlane.max_abs_value(chunk))
            .collect(),
    };
    Ok(words)
}

impl KernelProvider for CpuKernels {
    fn name(&self) -> &'static str {
        "cpu-emulated"
    }

    fn compile(&self, kernel: GpuKernel) -> Result<()> {
        let mut compiled = self.compiled.lock().unwrap_or_else(PoisonError::into_inner);
        if compiled.insert(kernel) {
            debug!(kernel = kernel.name(), provider = "cpu-emulated", "compiled kernel");
        }
        Ok(())
    }

    fn is_available(&self, kernel: GpuKernel) -> bool {
        self.compiled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&kernel)
    }

    fn run(&self, kernel: GpuKernel, input: &[u32], params: KernelParams) -> Result<Vec<u32>> {
        let expected = kernel.input_words(&params);
        if input.len() != expected {
            return Err(Error::internal(format!(
                "{}: input holds {} words, expected {expected}",
                kernel.name(),
                input.len()
            )));
        }
        self.compile(kernel)?;
        emulate(kernel, input, &params)
    }

    fn release_all(&self) {
        self.compiled.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
