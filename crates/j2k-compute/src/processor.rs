//! Unified compute processor.
//!
//! A [`Processor`] holds the capability descriptor, the configuration, an
//! optional GPU kernel provider and the statistics recorder. Every operation
//! resolves its backend with [`effective_backend`], runs, and records one
//! statistics entry with the backend it actually ran on.
//!
//! # Configuration
//!
//! ```rust
//! use j2k_compute::{Backend, ProcessorBuilder};
//!
//! let proc = ProcessorBuilder::new()
//!     .backend(Backend::Cpu)
//!     .default_levels(3)
//!     .tile_size(128)
//!     .build()
//!     .unwrap();
//! assert_eq!(proc.config().tile_width, 128);
//! ```
//!
//! # GPU routing
//!
//! - 2D and multi-level DWT with the fixed filters, `significance`,
//!   `magnitude_sign_separate`, `max_abs_value` and `significance_count` have
//!   GPU kernels
//! - `reconstruct`, `refinement_bits` and `vlc_pattern` run on the CPU; forcing
//!   the GPU for them is [`Error::NotImplemented`]
//! - 5/3 on `f32` samples has no GPU kernel yet; forcing the GPU is
//!   [`Error::NotImplemented`]
//! - arbitrary FIR and parameterized lifting kernels never run on the GPU;
//!   forcing it is [`Error::UnsupportedFeature`]
//!
//! Under [`Backend::Auto`] every case without a GPU path falls back to CPU.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, trace, warn};

use j2k_core::error::check_buffer_len;
use j2k_core::{Decomposition, Error, FilterKernel, Result, SubbandSet, TileDescriptor};

use crate::backend::{
    Backend, Capabilities, EffectiveBackend, KernelProvider, compute_tile_grid, describe_backends, effective_backend,
    gpu_ops,
};
use crate::bitplane::{BitPlaneOps, strategy_for};
use crate::config::ComputeConfig;
use crate::dwt::{self, Sample, forward_levels_with, inverse_levels_with, resolve_levels};
use crate::stats::{OperationStats, StatsRecorder};

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`Processor`].
#[derive(Default)]
pub struct ProcessorBuilder {
    config: ComputeConfig,
    capabilities: Option<Capabilities>,
    provider: Option<Arc<dyn KernelProvider>>,
}

impl ProcessorBuilder {
    /// Builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ComputeConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the requested backend.
    pub fn backend(mut self, backend: Backend) -> Self {
        self.config.backend = backend;
        self
    }

    /// Sets the workload size at which `Auto` picks the GPU.
    pub fn gpu_threshold(mut self, samples: usize) -> Self {
        self.config.gpu_threshold = samples;
        self
    }

    /// Sets the default decomposition depth.
    pub fn default_levels(mut self, levels: u32) -> Self {
        self.config.default_levels = levels;
        self
    }

    /// Sets a square tile size for the tiled dispatcher.
    pub fn tile_size(mut self, size: usize) -> Self {
        self.config.tile_width = size;
        self.config.tile_height = size;
        self
    }

    /// Sets the tile overlap.
    pub fn tile_overlap(mut self, overlap: usize) -> Self {
        self.config.tile_overlap = overlap;
        self
    }

    /// Uses explicit capabilities instead of [`Capabilities::detect`].
    pub fn capabilities(mut self, caps: Capabilities) -> Self {
        self.capabilities = Some(caps);
        self
    }

    /// Uses `provider` for every GPU kernel.
    pub fn kernel_provider(mut self, provider: Arc<dyn KernelProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Builds the processor.
    ///
    /// Without an explicit provider, one is created when the host has a GPU
    /// and the backend is not [`Backend::Cpu`]. GPU availability of the
    /// resulting processor is exactly "has a provider". Fails with
    /// [`Error::UnsupportedFeature`] if [`Backend::Gpu`] is requested and no
    /// provider can be obtained.
    pub fn build(self) -> Result<Processor> {
        let caps = self.capabilities.unwrap_or_else(|| Capabilities::detect().clone());
        let provider = match self.provider {
            Some(p) => Some(p),
            None if caps.gpu_available && self.config.backend != Backend::Cpu => match default_provider() {
                Ok(p) => p,
                Err(e) => {
                    warn!(error = %e, "GPU detected but kernel provider creation failed");
                    None
                }
            },
            None => None,
        };

        if self.config.backend == Backend::Gpu && provider.is_none() {
            return Err(Error::unsupported("Backend::Gpu requested but no GPU kernel provider is available"));
        }

        let caps = caps.with_gpu(provider.is_some());
        debug!(
            backend = self.config.backend.name(),
            provider = provider.as_ref().map(|p| p.name()).unwrap_or("none"),
            simd = caps.family.name(),
            "created processor"
        );

        Ok(Processor {
            caps,
            config: self.config,
            provider,
            stats: StatsRecorder::new(),
        })
    }
}

#[cfg(feature = "wgpu")]
fn default_provider() -> Result<Option<Arc<dyn KernelProvider>>> {
    let kernels = crate::backend::WgpuKernels::new()?;
    Ok(Some(Arc::new(kernels)))
}

#[cfg(not(feature = "wgpu"))]
fn default_provider() -> Result<Option<Arc<dyn KernelProvider>>> {
    Ok(None)
}

// ============================================================================
// Processor
// ============================================================================

/// One tile of a tiled decomposition.
#[derive(Debug, Clone, PartialEq)]
pub struct TileDecomposition<T> {
    /// Where the tile sits in the image.
    pub tile: TileDescriptor,
    /// The tile's pyramid.
    pub decomposition: Decomposition<T>,
}

/// Transform and bit-plane operations with backend routing and statistics.
pub struct Processor {
    caps: Capabilities,
    config: ComputeConfig,
    provider: Option<Arc<dyn KernelProvider>>,
    stats: StatsRecorder,
}

impl Processor {
    /// Processor with default configuration.
    pub fn new() -> Result<Self> {
        ProcessorBuilder::new().build()
    }

    /// CPU-only processor.
    pub fn cpu() -> Result<Self> {
        ProcessorBuilder::new().backend(Backend::Cpu).build()
    }

    /// Processor configured from the environment, see [`ComputeConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        ProcessorBuilder::new().config(ComputeConfig::from_env()).build()
    }

    /// Builder.
    pub fn builder() -> ProcessorBuilder {
        ProcessorBuilder::new()
    }

    /// Capabilities the processor routes with.
    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    /// Configuration.
    pub fn config(&self) -> &ComputeConfig {
        &self.config
    }

    /// True if a GPU kernel provider is attached.
    pub fn has_gpu(&self) -> bool {
        self.provider.is_some()
    }

    /// Name of the attached kernel provider.
    pub fn provider_name(&self) -> Option<&'static str> {
        self.provider.as_ref().map(|p| p.name())
    }

    /// Available execution paths, one per line.
    pub fn describe(&self) -> String {
        describe_backends(&self.caps)
    }

    /// Current statistics.
    pub fn stats(&self) -> OperationStats {
        self.stats.snapshot()
    }

    /// Zeroes the statistics.
    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// Drops every compiled GPU kernel.
    pub fn release_gpu_kernels(&self) {
        if let Some(p) = &self.provider {
            p.release_all();
        }
    }

    /// Backend that `op` over `workload` samples will use.
    pub fn resolve_backend(&self, op: &'static str, workload: usize) -> EffectiveBackend {
        let eff = effective_backend(workload, &self.caps, self.config.gpu_threshold, self.config.backend);
        debug!(op, workload, choice = self.config.backend.name(), backend = eff.name(), "resolved backend");
        eff
    }

    fn provider(&self) -> Result<&dyn KernelProvider> {
        self.provider
            .as_deref()
            .ok_or_else(|| Error::internal("GPU path selected without a kernel provider"))
    }

    /// Resolves a DWT backend; filters without GPU kernels fall back under `Auto`.
    fn route_dwt<T: Sample>(&self, op: &'static str, workload: usize, filter: &FilterKernel) -> Result<EffectiveBackend> {
        dwt::ensure_supported::<T>(filter)?;
        let eff = self.resolve_backend(op, workload);
        if eff == EffectiveBackend::Gpu {
            if let Err(e) = gpu_ops::dwt_kernels::<T>(filter) {
                if self.config.backend == Backend::Gpu {
                    return Err(e);
                }
                trace!(op, filter = filter.name(), "no GPU kernel, running on CPU");
                return Ok(EffectiveBackend::Cpu);
            }
        }
        Ok(eff)
    }

    /// Resolves a bit-plane backend for an operation without GPU kernels.
    fn route_cpu_only(&self, op: &'static str, workload: usize) -> Result<EffectiveBackend> {
        let eff = self.resolve_backend(op, workload);
        if eff == EffectiveBackend::Gpu && self.config.backend == Backend::Gpu {
            return Err(Error::not_implemented(
                format!("GPU {op}"),
                "Backend::Cpu or Backend::Auto",
            ));
        }
        Ok(EffectiveBackend::Cpu)
    }

    fn bitplane_ops(&self) -> &'static dyn BitPlaneOps {
        strategy_for(&self.caps)
    }

    fn timed<R>(&self, backend: EffectiveBackend, samples: usize, f: impl FnOnce() -> Result<R>) -> Result<R> {
        let start = Instant::now();
        let out = f()?;
        self.stats.record(backend, samples, start.elapsed());
        Ok(out)
    }

    // ========================================================================
    // DWT
    // ========================================================================

    /// One forward 2D level, see [`dwt::forward_2d`].
    pub fn forward_2d<T: Sample>(&self, data: &[T], width: usize, height: usize, filter: &FilterKernel) -> Result<SubbandSet<T>> {
        let eff = self.route_dwt::<T>("forward_2d", data.len(), filter)?;
        self.timed(eff, data.len(), || match eff {
            EffectiveBackend::Cpu => dwt::forward_2d(data, width, height, filter),
            EffectiveBackend::Gpu => gpu_ops::forward_2d(self.provider()?, data, width, height, filter),
        })
    }

    /// One inverse 2D level, see [`dwt::inverse_2d`].
    pub fn inverse_2d<T: Sample>(&self, subbands: &SubbandSet<T>, filter: &FilterKernel) -> Result<Vec<T>> {
        let samples = subbands.width * subbands.height;
        let eff = self.route_dwt::<T>("inverse_2d", samples, filter)?;
        self.timed(eff, samples, || match eff {
            EffectiveBackend::Cpu => dwt::inverse_2d(subbands, filter),
            EffectiveBackend::Gpu => gpu_ops::inverse_2d(self.provider()?, subbands, filter),
        })
    }

    /// Multi-level forward transform; each level is routed on its own size.
    ///
    /// `levels` of `None` uses the configured default. See
    /// [`dwt::forward_multi_level`] for clamping.
    pub fn forward_multi_level<T: Sample>(
        &self,
        data: &[T],
        width: usize,
        height: usize,
        levels: Option<u32>,
        filter: &FilterKernel,
    ) -> Result<Decomposition<T>> {
        if width == 0 || height == 0 {
            return Err(Error::parameter(format!("tile dimensions must be positive, got {width}x{height}")));
        }
        check_buffer_len(data.len(), width, height)?;
        dwt::ensure_supported::<T>(filter)?;

        let levels = resolve_levels(levels, self.config.default_levels, width, height);
        forward_levels_with(data, width, height, levels, |input, w, h, _| self.forward_2d(input, w, h, filter))
    }

    /// Multi-level inverse transform; fails on an empty level list.
    pub fn inverse_multi_level<T: Sample>(&self, decomposition: &Decomposition<T>, filter: &FilterKernel) -> Result<Vec<T>> {
        dwt::ensure_supported::<T>(filter)?;
        inverse_levels_with(decomposition, |set, _| self.inverse_2d(set, filter))
    }

    /// Splits an image into configured tiles and decomposes each concurrently.
    ///
    /// Tiles too small for a single level keep their samples as approximation.
    pub fn forward_tiled<T: Sample>(
        &self,
        image: &[T],
        width: usize,
        height: usize,
        levels: Option<u32>,
        filter: &FilterKernel,
    ) -> Result<Vec<TileDecomposition<T>>> {
        let tiles = compute_tile_grid(
            width,
            height,
            self.config.tile_width,
            self.config.tile_height,
            self.config.tile_overlap,
        )?;
        check_buffer_len(image.len(), width, height)?;
        dwt::ensure_supported::<T>(filter)?;

        tiles
            .into_par_iter()
            .map(|tile| {
                trace!(x = tile.index_x, y = tile.index_y, w = tile.width, h = tile.height, "forward tile");
                let samples = tile.extract(image, width);
                let decomposition = self.forward_multi_level(&samples, tile.width, tile.height, levels, filter)?;
                Ok(TileDecomposition { tile, decomposition })
            })
            .collect()
    }

    /// Reassembles an image from tiled decompositions.
    ///
    /// Overlapping regions take the value of the later tile.
    pub fn inverse_tiled<T: Sample>(
        &self,
        tiles: &[TileDecomposition<T>],
        width: usize,
        height: usize,
        filter: &FilterKernel,
    ) -> Result<Vec<T>> {
        for t in tiles {
            let (tw, th) = (t.tile.width, t.tile.height);
            if tw == 0 || th == 0 {
                return Err(Error::parameter(format!(
                    "tile ({}, {}) has empty dimensions {tw}x{th}",
                    t.tile.index_x, t.tile.index_y
                )));
            }
            let right = t.tile.origin_x.checked_add(tw);
            let bottom = t.tile.origin_y.checked_add(th);
            if right.is_none_or(|r| r > width) || bottom.is_none_or(|b| b > height) {
                return Err(Error::parameter(format!(
                    "tile ({}, {}) extends past the {width}x{height} image",
                    t.tile.index_x, t.tile.index_y
                )));
            }
            if (t.decomposition.width, t.decomposition.height) != (tw, th) {
                return Err(Error::parameter(format!(
                    "tile ({}, {}) is {tw}x{th} but its decomposition is {}x{}",
                    t.tile.index_x, t.tile.index_y, t.decomposition.width, t.decomposition.height
                )));
            }
        }

        let blocks: Vec<Vec<T>> = tiles
            .par_iter()
            .map(|t| {
                trace!(x = t.tile.index_x, y = t.tile.index_y, "inverse tile");
                if t.decomposition.levels.is_empty() {
                    check_buffer_len(t.decomposition.approximation.len(), t.tile.width, t.tile.height)?;
                    Ok(t.decomposition.approximation.clone())
                } else {
                    self.inverse_multi_level(&t.decomposition, filter)
                }
            })
            .collect::<Result<_>>()?;

        for (t, block) in tiles.iter().zip(&blocks) {
            check_buffer_len(block.len(), t.tile.width, t.tile.height)?;
        }

        let mut image = vec![T::default(); width * height];
        for (t, block) in tiles.iter().zip(&blocks) {
            t.tile.insert(&mut image, width, block);
        }
        Ok(image)
    }

    // ========================================================================
    // Bit-plane primitives
    // ========================================================================

    /// See [`BitPlaneOps::significance`].
    pub fn significance(&self, coeffs: &[i32], bit_plane: u32) -> Result<Vec<u8>> {
        let eff = self.resolve_backend("significance", coeffs.len());
        self.timed(eff, coeffs.len(), || match eff {
            EffectiveBackend::Cpu => Ok(self.bitplane_ops().significance(coeffs, bit_plane)),
            EffectiveBackend::Gpu => gpu_ops::significance(self.provider()?, coeffs, bit_plane),
        })
    }

    /// See [`BitPlaneOps::magnitude_sign_separate`].
    pub fn magnitude_sign_separate(&self, coeffs: &[i32]) -> Result<(Vec<i32>, Vec<u8>)> {
        let eff = self.resolve_backend("magnitude_sign_separate", coeffs.len());
        self.timed(eff, coeffs.len(), || match eff {
            EffectiveBackend::Cpu => Ok(self.bitplane_ops().magnitude_sign_separate(coeffs)),
            EffectiveBackend::Gpu => gpu_ops::magnitude_sign_separate(self.provider()?, coeffs),
        })
    }

    /// See [`BitPlaneOps::max_abs_value`].
    pub fn max_abs_value(&self, coeffs: &[i32]) -> Result<u32> {
        let eff = self.resolve_backend("max_abs_value", coeffs.len());
        self.timed(eff, coeffs.len(), || match eff {
            EffectiveBackend::Cpu => Ok(self.bitplane_ops().max_abs_value(coeffs)),
            EffectiveBackend::Gpu => gpu_ops::max_abs_value(self.provider()?, coeffs),
        })
    }

    /// See [`BitPlaneOps::significance_count`].
    pub fn significance_count(&self, coeffs: &[i32], bit_plane: u32) -> Result<usize> {
        let eff = self.resolve_backend("significance_count", coeffs.len());
        self.timed(eff, coeffs.len(), || match eff {
            EffectiveBackend::Cpu => Ok(self.bitplane_ops().significance_count(coeffs, bit_plane)),
            EffectiveBackend::Gpu => gpu_ops::significance_count(self.provider()?, coeffs, bit_plane),
        })
    }

    /// See [`BitPlaneOps::reconstruct`].
    pub fn reconstruct(&self, magnitudes: &[i32], signs: &[u8]) -> Result<Vec<i32>> {
        let eff = self.route_cpu_only("reconstruct", magnitudes.len())?;
        self.timed(eff, magnitudes.len(), || Ok(self.bitplane_ops().reconstruct(magnitudes, signs)))
    }

    /// See [`BitPlaneOps::refinement_bits`].
    pub fn refinement_bits(&self, coeffs: &[i32], significance_flags: &[u8], bit_plane: u32) -> Result<Vec<u8>> {
        let eff = self.route_cpu_only("refinement_bits", coeffs.len())?;
        self.timed(eff, coeffs.len(), || {
            Ok(self.bitplane_ops().refinement_bits(coeffs, significance_flags, bit_plane))
        })
    }

    /// See [`BitPlaneOps::vlc_pattern`].
    pub fn vlc_pattern(&self, coeffs: &[i32], bit_plane: u32, pair_count: usize) -> Result<Vec<u8>> {
        let eff = self.route_cpu_only("vlc_pattern", coeffs.len())?;
        self.timed(eff, coeffs.len(), || Ok(self.bitplane_ops().vlc_pattern(coeffs, bit_plane, pair_count)))
    }
}
