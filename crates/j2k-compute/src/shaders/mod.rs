//! WGSL compute shaders served by the wgpu kernel provider.
//!
//! DWT kernels run one invocation per line (row for axis 0, column for
//! axis 1) and follow the same boundary rules and output layout as the scalar
//! lifting code. Sample buffers are bound as raw `u32` words and bitcast per
//! filter. Bit-plane kernels run one invocation per coefficient, except
//! `MAX_ABS` which reduces 256 coefficients per invocation.
//!
//! Bindings: 0 = input, 1 = output, 2 = `dims` uniform, 3 = per-line work
//! buffer (DWT only).

use crate::backend::GpuKernel;

/// Bindings and addressing shared by every DWT kernel.
const DWT_COMMON: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<u32>;
@group(0) @binding(1) var<storage, read_write> dst: array<u32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // w, h, axis, 0
@group(0) @binding(3) var<storage, read_write> work: array<u32>;

fn line_count() -> u32 { return select(dims.x, dims.y, dims.z == 0u); }
fn line_len() -> u32 { return select(dims.y, dims.x, dims.z == 0u); }

fn idx(line: u32, i: u32) -> u32 {
    if dims.z == 0u { return line * dims.x + i; }
    return i * dims.x + line;
}

// packed [low | high] position of interleaved sample i
fn packed(i: u32, n: u32) -> u32 {
    return select((n + 1u) / 2u + i / 2u, i / 2u, (i & 1u) == 0u);
}

// mirror neighbours: x[-1] = x[1], x[n] = x[n - 2]
fn left_of(line: u32, i: u32) -> u32 {
    return work[idx(line, select(i + 1u, i - 1u, i > 0u))];
}
fn right_of(line: u32, i: u32, n: u32) -> u32 {
    return work[idx(line, select(i - 1u, i + 1u, i + 1u < n))];
}
"#;

/// Integer 5/3 lifting helpers; exact floors without 64-bit intermediates.
const DWT53_COMMON: &str = r#"
// floor((a + b) / 2)
fn predict53(a: i32, b: i32) -> i32 { return (a >> 1u) + (b >> 1u) + (a & b & 1); }
// floor((a + b + 2) / 4)
fn update53(a: i32, b: i32) -> i32 { return (a >> 2u) + (b >> 2u) + (((a & 3) + (b & 3) + 2) >> 2u); }

fn predict_at(line: u32, i: u32, n: u32) -> i32 {
    return predict53(bitcast<i32>(left_of(line, i)), bitcast<i32>(right_of(line, i, n)));
}
fn update_at(line: u32, i: u32, n: u32) -> i32 {
    return update53(bitcast<i32>(left_of(line, i)), bitcast<i32>(right_of(line, i, n)));
}
fn add_at(line: u32, i: u32, d: i32) {
    let k = idx(line, i);
    work[k] = bitcast<u32>(bitcast<i32>(work[k]) + d);
}
"#;

const DWT53_FORWARD: &str = r#"
@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let line = id.x;
    if line >= line_count() { return; }
    let n = line_len();

    for (var i = 0u; i < n; i++) { work[idx(line, i)] = src[idx(line, i)]; }
    if n >= 4u {
        for (var i = 1u; i < n; i += 2u) { add_at(line, i, -predict_at(line, i, n)); }
        for (var i = 0u; i < n; i += 2u) { add_at(line, i, update_at(line, i, n)); }
    }
    for (var i = 0u; i < n; i++) { dst[idx(line, packed(i, n))] = work[idx(line, i)]; }
}
"#;

const DWT53_INVERSE: &str = r#"
@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let line = id.x;
    if line >= line_count() { return; }
    let n = line_len();

    for (var i = 0u; i < n; i++) { work[idx(line, i)] = src[idx(line, packed(i, n))]; }
    if n >= 4u {
        for (var i = 0u; i < n; i += 2u) { add_at(line, i, -update_at(line, i, n)); }
        for (var i = 1u; i < n; i += 2u) { add_at(line, i, predict_at(line, i, n)); }
    }
    for (var i = 0u; i < n; i++) { dst[idx(line, i)] = work[idx(line, i)]; }
}
"#;

/// CDF 9/7 lifting helpers on `f32` words.
const DWT97_COMMON: &str = r#"
const ALPHA: f32 = -1.586134342;
const BETA: f32 = -0.052980118;
const GAMMA: f32 = 0.882911075;
const DELTA: f32 = 0.443506852;
const K: f32 = 1.230174105;

fn lift(line: u32, start: u32, n: u32, c: f32) {
    for (var i = start; i < n; i += 2u) {
        let k = idx(line, i);
        let s = bitcast<f32>(left_of(line, i)) + bitcast<f32>(right_of(line, i, n));
        work[k] = bitcast<u32>(bitcast<f32>(work[k]) + c * s);
    }
}

fn scale(line: u32, n: u32, low: f32, high: f32) {
    for (var i = 0u; i < n; i++) {
        let k = idx(line, i);
        let f = select(high, low, (i & 1u) == 0u);
        work[k] = bitcast<u32>(bitcast<f32>(work[k]) * f);
    }
}
"#;

const DWT97_FORWARD: &str = r#"
@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let line = id.x;
    if line >= line_count() { return; }
    let n = line_len();

    for (var i = 0u; i < n; i++) { work[idx(line, i)] = src[idx(line, i)]; }
    if n >= 4u {
        lift(line, 1u, n, ALPHA);
        lift(line, 0u, n, BETA);
        lift(line, 1u, n, GAMMA);
        lift(line, 0u, n, DELTA);
        scale(line, n, K, 1.0 / K);
    }
    for (var i = 0u; i < n; i++) { dst[idx(line, packed(i, n))] = work[idx(line, i)]; }
}
"#;

const DWT97_INVERSE: &str = r#"
@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let line = id.x;
    if line >= line_count() { return; }
    let n = line_len();

    for (var i = 0u; i < n; i++) { work[idx(line, i)] = src[idx(line, packed(i, n))]; }
    if n >= 4u {
        scale(line, n, 1.0 / K, K);
        lift(line, 0u, n, -DELTA);
        lift(line, 1u, n, -GAMMA);
        lift(line, 0u, n, -BETA);
        lift(line, 1u, n, -ALPHA);
    }
    for (var i = 0u; i < n; i++) { dst[idx(line, i)] = work[idx(line, i)]; }
}
"#;

/// Bindings shared by the bit-plane kernels.
const BITPLANE_COMMON: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<i32>;
@group(0) @binding(1) var<storage, read_write> dst: array<u32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // len, bit_plane, 0, 0

// wrapping |v|; |i32::MIN| comes out as 2^31
fn uabs(v: i32) -> u32 {
    let u = bitcast<u32>(v);
    return select(u, 0u - u, v < 0);
}
"#;

const SIGNIFICANCE: &str = r#"
@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let i = id.x;
    if i >= dims.x { return; }
    dst[i] = (uabs(src[i]) >> dims.y) & 1u;
}
"#;

const MAGNITUDE_SIGN: &str = r#"
@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let i = id.x;
    if i >= dims.x { return; }
    let v = src[i];
    dst[i] = uabs(v);
    dst[dims.x + i] = select(0u, 1u, v < 0);
}
"#;

const MAX_ABS: &str = r#"
const CHUNK: u32 = 256u;

@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let start = id.x * CHUNK;
    if start >= dims.x { return; }
    let end = min(start + CHUNK, dims.x);
    var m = 0u;
    for (var i = start; i < end; i++) { m = max(m, uabs(src[i])); }
    dst[id.x] = m;
}
"#;

/// Complete WGSL source for `kernel`.
pub fn kernel_source(kernel: GpuKernel) -> String {
    let parts: &[&str] = match kernel {
        GpuKernel::Dwt53Forward => &[DWT_COMMON, DWT53_COMMON, DWT53_FORWARD],
        GpuKernel::Dwt53Inverse => &[DWT_COMMON, DWT53_COMMON, DWT53_INVERSE],
        GpuKernel::Dwt97Forward => &[DWT_COMMON, DWT97_COMMON, DWT97_FORWARD],
        GpuKernel::Dwt97Inverse => &[DWT_COMMON, DWT97_COMMON, DWT97_INVERSE],
        GpuKernel::Significance => &[BITPLANE_COMMON, SIGNIFICANCE],
        GpuKernel::MagnitudeSign => &[BITPLANE_COMMON, MAGNITUDE_SIGN],
        GpuKernel::MaxAbs => &[BITPLANE_COMMON, MAX_ABS],
    };
    parts.concat()
}
