//! wgpu kernel provider.
//!
//! Compiles the WGSL kernels from [`crate::shaders`] on demand and caches the
//! pipelines behind a mutex. Every run uploads the input, dispatches one
//! workgroup per 256 invocations, and reads the output back through a
//! staging buffer. Shader validation and device errors are captured with
//! error scopes and returned as [`Error::Internal`]. Error scopes are
//! per-device, so every push/pop pair runs under `scope_lock`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, trace};
use wgpu::util::DeviceExt;

use j2k_core::{Error, Result};

use super::kernels::{GpuKernel, KernelParams, KernelProvider};
use crate::shaders;

const WORKGROUP_SIZE: usize = 256;

/// GPU kernel provider on wgpu (Vulkan/Metal/DX12).
pub struct WgpuKernels {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_name: String,
    memory_budget: u64,
    pipelines: Mutex<HashMap<GpuKernel, Arc<wgpu::ComputePipeline>>>,
    scope_lock: Mutex<()>,
}

fn adapter_options() -> wgpu::RequestAdapterOptions<'static, 'static> {
    wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }
}

fn instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

impl WgpuKernels {
    /// True if a GPU adapter can be acquired.
    pub fn is_available() -> bool {
        pollster::block_on(async { instance().request_adapter(&adapter_options()).await.is_some() })
    }

    /// Acquires an adapter and device.
    pub fn new() -> Result<Self> {
        pollster::block_on(Self::new_async())
    }

    /// Async variant of [`WgpuKernels::new`].
    pub async fn new_async() -> Result<Self> {
        let adapter = instance()
            .request_adapter(&adapter_options())
            .await
            .ok_or_else(|| Error::internal("no GPU adapter found"))?;

        let adapter_limits = adapter.limits();
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("j2k_compute_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter_limits.clone(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    ..Default::default()
                },
                None,
            )
            .await
            .map_err(|e| Error::internal(format!("device creation failed: {e}")))?;

        let info = adapter.get_info();
        let memory_budget = estimate_vram(&info, adapter_limits.max_buffer_size);
        debug!(adapter = %info.name, backend = ?info.backend, memory_budget, "created wgpu kernel provider");

        Ok(Self {
            device,
            queue,
            adapter_name: info.name,
            memory_budget,
            pipelines: Mutex::new(HashMap::new()),
            scope_lock: Mutex::new(()),
        })
    }

    /// Adapter name reported by the driver.
    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Estimated usable device memory in bytes.
    pub fn memory_budget(&self) -> u64 {
        self.memory_budget
    }

    fn create_pipeline(&self, kernel: GpuKernel) -> Result<wgpu::ComputePipeline> {
        let source = shaders::kernel_source(kernel);
        let _scope = self.scope_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(kernel.name()),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let pipeline = self.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(kernel.name()),
            layout: None,
            module: &module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(Error::internal(format!("compiling {}: {err}", kernel.name())));
        }
        Ok(pipeline)
    }

    fn pipeline(&self, kernel: GpuKernel) -> Result<Arc<wgpu::ComputePipeline>> {
        let mut pipelines = self.pipelines.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(p) = pipelines.get(&kernel) {
            return Ok(Arc::clone(p));
        }
        let p = Arc::new(self.create_pipeline(kernel)?);
        debug!(kernel = kernel.name(), "compiled wgpu kernel");
        pipelines.insert(kernel, Arc::clone(&p));
        Ok(p)
    }

    fn storage(&self, label: &str, words: usize, extra: wgpu::BufferUsages) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (words.max(1) * 4) as u64,
            usage: wgpu::BufferUsages::STORAGE | extra,
            mapped_at_creation: false,
        })
    }

    fn dispatch_and_wait(&self, pipeline: &wgpu::ComputePipeline, bind_group: &wgpu::BindGroup, invocations: usize) -> Result<()> {
        let workgroups = u32::try_from(invocations.div_ceil(WORKGROUP_SIZE))
            .map_err(|_| Error::internal(format!("{invocations} invocations exceed the dispatch limit")))?;
        let _scope = self.scope_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("compute_encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("compute_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(workgroups, 1, 1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        self.device.poll(wgpu::Maintain::Wait);
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(Error::internal(format!("dispatch failed: {err}"))),
            None => Ok(()),
        }
    }

    fn download(&self, buffer: &wgpu::Buffer, words: usize) -> Result<Vec<u32>> {
        let size = (words * 4) as u64;
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging_buffer"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self.device.create_command_encoder(&Default::default());
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|_| Error::internal("map channel closed"))?
            .map_err(|e| Error::internal(format!("map failed: {e}")))?;

        let data = slice.get_mapped_range();
        let words: Vec<u32> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        staging.unmap();
        Ok(words)
    }
}

impl KernelProvider for WgpuKernels {
    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn compile(&self, kernel: GpuKernel) -> Result<()> {
        self.pipeline(kernel).map(|_| ())
    }

    fn is_available(&self, kernel: GpuKernel) -> bool {
        self.pipelines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&kernel)
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
        let out_words = kernel.output_words(&params);
        if input.is_empty() || out_words == 0 {
            return Ok(vec![0; out_words]);
        }
        let bytes = ((input.len() + out_words) * 4) as u64;
        if bytes > self.memory_budget {
            return Err(Error::internal(format!(
                "{}: {bytes} bytes exceed the GPU memory budget of {}",
                kernel.name(),
                self.memory_budget
            )));
        }

        let pipeline = self.pipeline(kernel)?;
        trace!(kernel = kernel.name(), words = input.len(), "running wgpu kernel");

        let src = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("src_buffer"),
            contents: bytemuck::cast_slice(input),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let dst = self.storage("dst_buffer", out_words, wgpu::BufferUsages::COPY_SRC);
        let dims = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("dims_uniform"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let work = kernel
            .uses_scratch()
            .then(|| self.storage("work_buffer", input.len(), wgpu::BufferUsages::empty()));

        let mut entries = vec![
            wgpu::BindGroupEntry { binding: 0, resource: src.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 1, resource: dst.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 2, resource: dims.as_entire_binding() },
        ];
        if let Some(work) = &work {
            entries.push(wgpu::BindGroupEntry { binding: 3, resource: work.as_entire_binding() });
        }
        let layout = pipeline.get_bind_group_layout(0);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(kernel.name()),
            layout: &layout,
            entries: &entries,
        });

        self.dispatch_and_wait(&pipeline, &bind_group, kernel.invocations(&params))?;
        self.download(&dst, out_words)
    }

    fn release_all(&self) {
        let mut pipelines = self.pipelines.lock().unwrap_or_else(PoisonError::into_inner);
        debug!(count = pipelines.len(), "releasing wgpu kernels");
        pipelines.clear();
    }
}

/// Usable device memory, honouring `J2K_GPU_MEMORY_MB`.
fn estimate_vram(info: &wgpu::AdapterInfo, max_buffer_bytes: u64) -> u64 {
    if let Some(mb) = std::env::var("J2K_GPU_MEMORY_MB").ok().and_then(|v| v.parse::<u64>().ok()) {
        return mb.saturating_mul(1024 * 1024);
    }

    let from_buffer = max_buffer_bytes.saturating_mul(2);
    let estimated = match info.device_type {
        wgpu::DeviceType::DiscreteGpu => from_buffer.clamp(2u64 << 30, 24u64 << 30),
        wgpu::DeviceType::IntegratedGpu => from_buffer.clamp(512u64 << 20, 4u64 << 30),
        wgpu::DeviceType::VirtualGpu => from_buffer.clamp(1u64 << 30, 8u64 << 30),
        _ => from_buffer.clamp(256u64 << 20, 2u64 << 30),
    };
    estimated.saturating_mul(80) / 100
}
