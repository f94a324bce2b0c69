//! JPEG 2000 transform and bit-plane compute core.
//!
//! Provides the discrete wavelet transform (1D, 2D, multi-level, tiled) and
//! the bit-plane coefficient primitives that feed the entropy coder, with a
//! scalar reference path, a SIMD path and optional GPU kernels (wgpu).
//!
//! # Architecture
//!
//! ```text
//! Processor (routing + statistics)
//!     ├── dwt::*          scalar reference DWT, rayon over lines
//!     ├── bitplane::*     BitPlaneOps: ScalarBitPlane / SimdBitPlane
//!     └── backend::gpu_ops over dyn KernelProvider
//!             ├── CpuKernels  (emulated)
//!             └── WgpuKernels (compute shaders, feature "wgpu")
//! ```
//!
//! # Example
//!
//! ```rust
//! use j2k_compute::{Backend, FilterKernel, Processor};
//!
//! let proc = Processor::builder().backend(Backend::Cpu).build().unwrap();
//! let tile: Vec<i32> = (0..64).collect();
//! let filter = FilterKernel::reversible53();
//!
//! let dec = proc.forward_multi_level(&tile, 8, 8, Some(2), &filter).unwrap();
//! assert_eq!(proc.inverse_multi_level(&dec, &filter).unwrap(), tile);
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod bitplane;
pub mod config;
pub mod dwt;
pub mod processor;
#[cfg_attr(not(feature = "wgpu"), allow(dead_code))]
mod shaders;
pub mod stats;

pub use backend::{
    Backend, BackendInfo, Capabilities, CpuKernels, EffectiveBackend, GpuKernel, KernelParams, KernelProvider,
    SimdFamily, compute_tile_grid, describe_backends, detect_backends, effective_backend,
};
#[cfg(feature = "wgpu")]
pub use backend::WgpuKernels;
pub use bitplane::{BitPlaneOps, ScalarBitPlane, SimdBitPlane, strategy_for};
pub use config::ComputeConfig;
pub use processor::{Processor, ProcessorBuilder, TileDecomposition};
pub use stats::{OperationStats, StatsRecorder};

pub use j2k_core::{Decomposition, Error, FilterKernel, Result, SubbandSet, TileDescriptor};
