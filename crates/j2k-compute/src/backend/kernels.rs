//! GPU kernel provider abstraction.
//!
//! The compute core never touches device handles. It asks a
//! [`KernelProvider`] to compile, query, run and release named kernels over
//! plain 32-bit word buffers; samples and coefficients are reinterpreted with
//! `bytemuck` on the way in and out.
//!
//! # Word-buffer contract
//!
//! | Kernel | `params.dims` | input | output |
//! |--------|---------------|-------|--------|
//! | DWT (all four) | `[width, height, axis, 0]` | `w*h` samples | `w*h` samples |
//! | `Significance` | `[len, bit_plane, 0, 0]` | `len` coefficients | `len` bits |
//! | `MagnitudeSign` | `[len, 0, 0, 0]` | `len` coefficients | `len` magnitudes, then `len` signs |
//! | `MaxAbs` | `[len, 0, 0, 0]` | `len` coefficients | one maximum per [`MAX_ABS_CHUNK`] |
//!
//! DWT axis 0 transforms every row, axis 1 every column. A forward pass
//! leaves each line as `[lowpass | highpass]`; an inverse pass reads that
//! layout back. Lines shorter than four samples are only split.

use j2k_core::Result;

/// Coefficients reduced per `MaxAbs` invocation.
pub const MAX_ABS_CHUNK: usize = 256;

/// Compute kernels a provider can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuKernel {
    /// 5/3 forward line pass on `i32`.
    Dwt53Forward,
    /// 5/3 inverse line pass on `i32`.
    Dwt53Inverse,
    /// 9/7 forward line pass on `f32`.
    Dwt97Forward,
    /// 9/7 inverse line pass on `f32`.
    Dwt97Inverse,
    /// Per-coefficient significance bit.
    Significance,
    /// Magnitude and sign separation.
    MagnitudeSign,
    /// Chunked maximum magnitude.
    MaxAbs,
}

impl GpuKernel {
    /// Every kernel, in declaration order.
    pub const ALL: [GpuKernel; 7] = [
        Self::Dwt53Forward,
        Self::Dwt53Inverse,
        Self::Dwt97Forward,
        Self::Dwt97Inverse,
        Self::Significance,
        Self::MagnitudeSign,
        Self::MaxAbs,
    ];

    /// Kernel name, used as pipeline label.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dwt53Forward => "dwt53_forward",
            Self::Dwt53Inverse => "dwt53_inverse",
            Self::Dwt97Forward => "dwt97_forward",
            Self::Dwt97Inverse => "dwt97_inverse",
            Self::Significance => "significance",
            Self::MagnitudeSign => "magnitude_sign",
            Self::MaxAbs => "max_abs",
        }
    }

    /// True for the four DWT line passes.
    pub fn is_dwt(&self) -> bool {
        matches!(
            self,
            Self::Dwt53Forward | Self::Dwt53Inverse | Self::Dwt97Forward | Self::Dwt97Inverse
        )
    }

    /// True if the kernel binds a work buffer the size of its input.
    pub fn uses_scratch(&self) -> bool {
        self.is_dwt()
    }

    /// Number of shader invocations for `params`.
    pub fn invocations(&self, params: &KernelParams) -> usize {
        let [a, b, c, _] = params.dims.map(|d| d as usize);
        match self {
            _ if self.is_dwt() => {
                if c == 0 {
                    b
                } else {
                    a
                }
            }
            Self::MaxAbs => a.div_ceil(MAX_ABS_CHUNK),
            _ => a,
        }
    }

    /// Words written by one run.
    pub fn output_words(&self, params: &KernelParams) -> usize {
        let [a, b, ..] = params.dims.map(|d| d as usize);
        match self {
            _ if self.is_dwt() => a * b,
            Self::MagnitudeSign => 2 * a,
            Self::MaxAbs => a.div_ceil(MAX_ABS_CHUNK),
            _ => a,
        }
    }

    /// Words the input buffer must hold.
    pub fn input_words(&self, params: &KernelParams) -> usize {
        let [a, b, ..] = params.dims.map(|d| d as usize);
        if self.is_dwt() { a * b } else { a }
    }
}

/// Uniform parameters passed to a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct KernelParams {
    /// Kernel-specific dimensions, see the module table.
    pub dims: [u32; 4],
}

impl KernelParams {
    /// DWT line pass over a `width x height` buffer; axis 0 = rows, 1 = columns.
    pub fn dwt(width: u32, height: u32, axis: u32) -> Self {
        Self { dims: [width, height, axis, 0] }
    }

    /// Bit-plane kernel over `len` coefficients.
    pub fn bitplane(len: u32, bit_plane: u32) -> Self {
        Self { dims: [len, bit_plane, 0, 0] }
    }
}

/// Owner of compiled compute kernels.
///
/// Implementations serialize access to their kernel cache internally, so one
/// provider can be shared across threads behind an `Arc`. Every failure is
/// reported as [`j2k_core::Error::Internal`] with the provider's diagnostic.
pub trait KernelProvider: Send + Sync {
    /// Provider name.
    fn name(&self) -> &'static str;

    /// Compiles and caches `kernel`. Compiling twice is a no-op.
    fn compile(&self, kernel: GpuKernel) -> Result<()>;

    /// True if `kernel` is compiled and cached.
    fn is_available(&self, kernel: GpuKernel) -> bool;

    /// Runs `kernel` over `input`, compiling it first if needed.
    fn run(&self, kernel: GpuKernel, input: &[u32], params: KernelParams) -> Result<Vec<u32>>;

    /// Drops every cached kernel.
    fn release_all(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        let p = KernelParams::dwt(10, 4, 0);
        assert_eq!(GpuKernel::Dwt53Forward.invocations(&p), 4);
        assert_eq!(GpuKernel::Dwt97Inverse.invocations(&KernelParams::dwt(10, 4, 1)), 10);
        assert_eq!(GpuKernel::Dwt53Forward.output_words(&p), 40);

        let p = KernelParams::bitplane(600, 3);
        assert_eq!(GpuKernel::Significance.output_words(&p), 600);
        assert_eq!(GpuKernel::MagnitudeSign.output_words(&p), 1200);
        assert_eq!(GpuKernel::MaxAbs.output_words(&p), 3);
        assert_eq!(GpuKernel::MaxAbs.invocations(&p), 3);
        assert!(GpuKernel::Dwt97Forward.uses_scratch());
        assert!(!GpuKernel::MaxAbs.uses_scratch());
    }

    #[test]
    fn test_params_size() {
        assert_eq!(std::mem::size_of::<KernelParams>(), 16);
    }
}
