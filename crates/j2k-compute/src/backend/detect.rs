//! Hardware capability detection.
//!
//! [`Capabilities::detect`] probes the host once per process and hands out
//! the same immutable value afterwards. Callers pass it explicitly to the
//! backend selector and bit-plane strategy picker; tests build their own with
//! [`Capabilities::new`] or [`Capabilities::scalar_only`].

use std::sync::OnceLock;

use tracing::debug;

/// Vector instruction family of the host CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimdFamily {
    /// x86 AVX2, 8 x 32-bit lanes.
    Avx2,
    /// x86 SSE2/SSE4, 4 x 32-bit lanes.
    Sse,
    /// ARM NEON, 4 x 32-bit lanes.
    Neon,
    /// No usable vector unit.
    Scalar,
}

impl SimdFamily {
    /// Number of 32-bit lanes per vector.
    pub fn vector_width(&self) -> usize {
        match self {
            Self::Avx2 => 8,
            Self::Sse | Self::Neon => 4,
            Self::Scalar => 1,
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Avx2 => "avx2",
            Self::Sse => "sse",
            Self::Neon => "neon",
            Self::Scalar => "scalar",
        }
    }
}

/// Immutable description of what the host can run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    /// Vector instruction family.
    pub family: SimdFamily,
    /// 32-bit lanes per vector register.
    pub vector_width: usize,
    /// Whether a GPU compute device is usable.
    pub gpu_available: bool,
    /// Logical CPU cores.
    pub cpu_cores: usize,
}

static DETECTED: OnceLock<Capabilities> = OnceLock::new();

impl Capabilities {
    /// Builds a descriptor explicitly.
    pub fn new(family: SimdFamily, gpu_available: bool, cpu_cores: usize) -> Self {
        Self {
            family,
            vector_width: family.vector_width(),
            gpu_available,
            cpu_cores: cpu_cores.max(1),
        }
    }

    /// Single-core, no SIMD, no GPU.
    pub fn scalar_only() -> Self {
        Self::new(SimdFamily::Scalar, false, 1)
    }

    /// Detected capabilities of this process, computed on first call.
    pub fn detect() -> &'static Capabilities {
        DETECTED.get_or_init(|| {
            let caps = Self::new(detect_simd(), detect_gpu(), detect_cores());
            debug!(
                family = caps.family.name(),
                vector_width = caps.vector_width,
                gpu = caps.gpu_available,
                cores = caps.cpu_cores,
                "detected capabilities"
            );
            caps
        })
    }

    /// Same descriptor with GPU availability overridden.
    pub fn with_gpu(mut self, gpu_available: bool) -> Self {
        self.gpu_available = gpu_available;
        self
    }
}

fn detect_simd() -> SimdFamily {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        if std::arch::is_x86_feature_detected!("avx2") {
            return SimdFamily::Avx2;
        }
        if std::arch::is_x86_feature_detected!("sse2") {
            return SimdFamily::Sse;
        }
    }
    #[cfg(target_arch = "aarch64")]
    {
        if std::arch::is_aarch64_feature_detected!("neon") {
            return SimdFamily::Neon;
        }
    }
    SimdFamily::Scalar
}

fn detect_cores() -> usize {
    match sys_info::cpu_num() {
        Ok(n) if n > 0 => n as usize,
        _ => std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
    }
}

fn detect_gpu() -> bool {
    #[cfg(feature = "wgpu")]
    {
        super::WgpuKernels::is_available()
    }
    #[cfg(not(feature = "wgpu"))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_is_stable() {
        let a = Capabilities::detect();
        let b = Capabilities::detect();
        assert_eq!(a, b);
        assert!(a.cpu_cores >= 1);
        assert_eq!(a.vector_width, a.family.vector_width());
    }

    #[test]
    fn test_explicit() {
        let caps = Capabilities::new(SimdFamily::Neon, true, 0);
        assert_eq!(caps.vector_width, 4);
        assert_eq!(caps.cpu_cores, 1);
        assert!(caps.gpu_available);
        assert!(!caps.with_gpu(false).gpu_available);

        let scalar = Capabilities::scalar_only();
        assert_eq!(scalar.vector_width, 1);
        assert!(!scalar.gpu_available);
    }
}
