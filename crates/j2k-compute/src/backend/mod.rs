//! Execution backends and their selection.
//!
//! # Architecture
//!
//! ```text
//! effective_backend(workload, &Capabilities, threshold, Backend)
//!     +-- Cpu -> dwt::* / bitplane::* (rayon, SIMD strategy)
//!     +-- Gpu -> gpu_ops::* over dyn KernelProvider
//!                  +-- CpuKernels  (emulated, tests and fallback)
//!                  +-- WgpuKernels (Vulkan/Metal/DX12, feature "wgpu")
//! ```

mod cpu_kernels;
mod detect;
pub mod gpu_ops;
mod kernels;
mod tiling;

#[cfg(feature = "wgpu")]
mod wgpu_backend;

pub use cpu_kernels::CpuKernels;
pub use detect::{Capabilities, SimdFamily};
pub use kernels::{GpuKernel, KernelParams, KernelProvider, MAX_ABS_CHUNK};
pub use tiling::compute_tile_grid;

#[cfg(feature = "wgpu")]
pub use wgpu_backend::WgpuKernels;

use std::str::FromStr;

use j2k_core::Error;

/// Requested backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Backend {
    /// GPU for workloads at or above the threshold when a GPU exists, CPU otherwise.
    #[default]
    Auto,
    /// Always CPU.
    Cpu,
    /// GPU whenever a GPU exists.
    Gpu,
}

impl Backend {
    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
        }
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "gpu" | "wgpu" => Ok(Self::Gpu),
            other => Err(Error::parameter(format!("unknown backend '{other}'"))),
        }
    }
}

/// Backend an operation actually runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectiveBackend {
    /// CPU (scalar or SIMD).
    Cpu,
    /// GPU kernel provider.
    Gpu,
}

impl EffectiveBackend {
    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
        }
    }
}

/// Resolves `choice` for a workload of `workload` samples.
///
/// Deterministic and side-effect free. A forced GPU without a GPU falls back
/// to CPU; `Auto` picks the GPU only when one exists and
/// `workload >= threshold`.
pub fn effective_backend(workload: usize, caps: &Capabilities, threshold: usize, choice: Backend) -> EffectiveBackend {
    match choice {
        Backend::Cpu => EffectiveBackend::Cpu,
        Backend::Gpu if caps.gpu_available => EffectiveBackend::Gpu,
        Backend::Auto if caps.gpu_available && workload >= threshold => EffectiveBackend::Gpu,
        _ => EffectiveBackend::Cpu,
    }
}

/// Information about one execution path.
#[derive(Debug, Clone)]
pub struct BackendInfo {
    /// Short name.
    pub name: &'static str,
    /// Whether it can run here.
    pub available: bool,
    /// Description.
    pub description: String,
}

/// Lists the execution paths for `caps`.
pub fn detect_backends(caps: &Capabilities) -> Vec<BackendInfo> {
    vec![
        BackendInfo {
            name: "cpu",
            available: true,
            description: format!("scalar reference, rayon over {} cores", caps.cpu_cores),
        },
        BackendInfo {
            name: "simd",
            available: caps.vector_width > 1,
            description: format!("{} ({} lanes)", caps.family.name(), caps.vector_width),
        },
        BackendInfo {
            name: "gpu",
            available: caps.gpu_available,
            description: "wgpu compute (Vulkan/Metal/DX12)".to_string(),
        },
    ]
}

/// One line per execution path, `[+]` available, `[-]` not.
pub fn describe_backends(caps: &Capabilities) -> String {
    let mut desc = String::new();
    for info in detect_backends(caps) {
        let status = if info.available { "+" } else { "-" };
        desc.push_str(&format!("[{status}] {}: {}\n", info.name, info.description));
    }
    desc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_table() {
        let gpu = Capabilities::new(SimdFamily::Avx2, true, 8);
        let none = Capabilities::new(SimdFamily::Avx2, false, 8);

        assert_eq!(effective_backend(1 << 20, &gpu, 1000, Backend::Cpu), EffectiveBackend::Cpu);
        assert_eq!(effective_backend(1, &gpu, 1000, Backend::Gpu), EffectiveBackend::Gpu);
        assert_eq!(effective_backend(1, &none, 1000, Backend::Gpu), EffectiveBackend::Cpu);
        assert_eq!(effective_backend(999, &gpu, 1000, Backend::Auto), EffectiveBackend::Cpu);
        assert_eq!(effective_backend(1000, &gpu, 1000, Backend::Auto), EffectiveBackend::Gpu);
        assert_eq!(effective_backend(1 << 20, &none, 1000, Backend::Auto), EffectiveBackend::Cpu);
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("CPU".parse::<Backend>().unwrap(), Backend::Cpu);
        assert_eq!(" auto ".parse::<Backend>().unwrap(), Backend::Auto);
        assert_eq!("gpu".parse::<Backend>().unwrap(), Backend::Gpu);
        assert!("cuda".parse::<Backend>().unwrap_err().is_parameter());
        assert_eq!(Backend::default(), Backend::Auto);
    }

    #[test]
    fn test_describe() {
        let desc = describe_backends(&Capabilities::scalar_only());
        assert!(desc.contains("[+] cpu"));
        assert!(desc.contains("[-] simd"));
        assert!(desc.contains("[-] gpu"));
    }
}
